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

//! The concrete plugins the standard registry knows about.

pub mod acl;
pub mod browser;
pub mod bulk_upload;
pub mod caldav;
pub mod carddav;
pub mod chunking;
pub mod comments;
pub mod compression;
pub mod fake_lock;
pub mod properties;
pub mod provisioning;
pub mod quota;
pub mod search;
pub mod shares;
pub mod tags;
