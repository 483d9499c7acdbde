//-
// Copyright (c) 2025, Davchain contributors
//
// This file is part of Davchain.
//
// Davchain is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Davchain is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or FITNESS
// FOR  A PARTICULAR  PURPOSE.  See the  GNU General  Public  License for  more
// details.
//
// You should have received a copy of the GNU General Public License along with
// Davchain. If not, see <http://www.gnu.org/licenses/>.

/// Determine whether the given name is safe to use as a node name in the
/// resource tree.
///
/// Names come from collaborators (user ids, calendar URIs, file names) and
/// end up as path segments, so anything that could alter the shape of a path
/// is rejected: empty names, the `.` and `..` traversal entries, either slash
/// and ASCII control characters.
///
/// Hidden names such as `.file` are allowed since chunked uploads rely on
/// them.
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name.find('/').is_none()
        // Only a path separator on Windows, but clients on Windows will
        // happily treat it as one
        && name.find('\\').is_none()
        && name.find(|c| c < ' ' || c == '\x7F').is_none()
}
