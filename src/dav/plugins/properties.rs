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

//! Keeps custom properties attached to files as they are deleted or moved.

use crate::dav::plugin::{Exchange, Outcome, Phase, Phases, Plugin};
use crate::dav::request::Method;
use crate::support::error::Error;

pub struct PropertiesPlugin;

impl Plugin for PropertiesPlugin {
    fn identifier(&self) -> &'static str {
        "properties"
    }

    fn phases(&self) -> Phases {
        Phases::POST_METHOD
    }

    fn handle(&mut self, _: Phase, ex: &mut Exchange<'_>) -> Outcome {
        if !ex.succeeded() {
            return Outcome::Continue;
        }

        match sync_properties(ex) {
            Ok(()) => Outcome::Continue,
            Err(e) => Outcome::Advisory(format!(
                "Properties of /{} not updated: {}",
                ex.context.request_path(),
                e
            )),
        }
    }
}

fn sync_properties(ex: &Exchange<'_>) -> Result<(), Error> {
    let (uid, path) = match (ex.uid(), ex.owned_path("files")) {
        (Some(uid), Some(path)) => (uid, path),
        _ => return Ok(()),
    };

    match ex.request.method {
        Method::Delete => ex.services.properties.delete_for_path(uid, &path),
        Method::Move => match ex.owned_destination("files") {
            Some(destination) => {
                ex.services.properties.move_path(uid, &path, &destination)
            }
            // Moved out of the user's files altogether
            None if ex.destination().is_some() => {
                ex.services.properties.delete_for_path(uid, &path)
            }
            None => Err(Error::BadRequest(
                "Missing or foreign Destination".to_owned(),
            )),
        },
        _ => Ok(()),
    }
}
