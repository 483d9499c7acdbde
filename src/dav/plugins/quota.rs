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

//! Refuses uploads that cannot fit in the user's remaining quota.

use std::sync::Arc;

use log::warn;

use crate::dav::collab::{Filesystem, Storage};
use crate::dav::plugin::{Exchange, Outcome, Phase, Phases, Plugin};
use crate::dav::request::Method;
use crate::support::error::Error;

pub struct QuotaPlugin {
    storage: Arc<dyn Storage>,
}

impl QuotaPlugin {
    /// Returns `None` for users without storage; there is no quota to
    /// enforce for them.
    pub fn for_user(
        files: &dyn Filesystem,
        uid: &str,
    ) -> Result<Option<Self>, Error> {
        match files.storage(uid) {
            Ok(storage) => Ok(Some(QuotaPlugin { storage })),
            Err(Error::NoStorage) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl Plugin for QuotaPlugin {
    fn identifier(&self) -> &'static str {
        "quota"
    }

    fn phases(&self) -> Phases {
        Phases::PRE_METHOD
    }

    fn handle(&mut self, _: Phase, ex: &mut Exchange<'_>) -> Outcome {
        let into_files = match ex.request.method {
            Method::Put => ex.owned_path("files").is_some(),
            // Assembling a chunked upload
            Method::Move => ex.owned_destination("files").is_some(),
            _ => false,
        };
        if !into_files {
            return Outcome::Continue;
        }

        let length = match ex.request.declared_length() {
            Some(length) => length,
            None => return Outcome::Continue,
        };

        match self.storage.free_space() {
            Ok(Some(free)) if length > free => {
                Outcome::fault(Error::InsufficientStorage)
            }
            Ok(_) => Outcome::Continue,
            Err(e) => {
                warn!("{} Can't determine free space: {}", ex.log_prefix, e);
                Outcome::Advisory(format!("Quota not checked: {}", e))
            }
        }
    }
}
