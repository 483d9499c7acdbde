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

//! Tells the search index which files changed.

use log::warn;

use crate::dav::plugin::{Exchange, Outcome, Phase, Phases, Plugin};
use crate::dav::request::Method;
use crate::support::error::Error;

pub struct SearchPlugin;

impl Plugin for SearchPlugin {
    fn identifier(&self) -> &'static str {
        "search"
    }

    fn phases(&self) -> Phases {
        Phases::POST_METHOD
    }

    fn handle(&mut self, _: Phase, ex: &mut Exchange<'_>) -> Outcome {
        if !matches!(
            ex.request.method,
            Method::Put | Method::Delete | Method::Move | Method::Mkcol
        ) || !ex.succeeded()
        {
            return Outcome::Continue;
        }

        match mark_changes(ex) {
            Ok(()) => Outcome::Continue,
            Err(e) => {
                warn!("{} Search index not updated: {}", ex.log_prefix, e);
                Outcome::Advisory(format!("Search index not updated: {}", e))
            }
        }
    }
}

fn mark_changes(ex: &Exchange<'_>) -> Result<(), Error> {
    let uid = match ex.uid() {
        Some(uid) => uid,
        None => return Ok(()),
    };

    if let Some(path) = ex.owned_path("files") {
        ex.services.search.mark_dirty(uid, &path)?;
    }
    if Method::Move == ex.request.method {
        if let Some(destination) = ex.owned_destination("files") {
            ex.services.search.mark_dirty(uid, &destination)?;
        }
    }
    Ok(())
}
