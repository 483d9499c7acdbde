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

//! CardDAV, attached for address book subtrees only.

use super::caldav::has_content_type;
use crate::dav::plugin::{Exchange, Outcome, Phase, Phases, Plugin};
use crate::dav::request::{split_path, Method};
use crate::support::error::Error;

static VCARD_TYPES: &[&str] = &["text/vcard", "text/x-vcard"];

pub struct CardDavPlugin;

impl Plugin for CardDavPlugin {
    fn identifier(&self) -> &'static str {
        "carddav"
    }

    fn phases(&self) -> Phases {
        Phases::PRE_METHOD
    }

    fn features(&self) -> &'static [&'static str] {
        &["addressbook"]
    }

    fn handle(&mut self, _: Phase, ex: &mut Exchange<'_>) -> Outcome {
        if Method::Put != ex.request.method || !is_card(&ex.request.path) {
            return Outcome::Continue;
        }

        if has_content_type(&ex.request, VCARD_TYPES) {
            Outcome::Continue
        } else {
            Outcome::fault(Error::UnsupportedMediaType(
                "address book entries must be text/vcard".to_owned(),
            ))
        }
    }
}

/// `addressbooks/users/<uid>/<book>/<card>` or
/// `addressbooks/system/system/<book>/<card>`
fn is_card(path: &str) -> bool {
    let segments = split_path(path);
    5 == segments.len() && "addressbooks" == segments[0]
}
