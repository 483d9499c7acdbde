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

//! Drops the tag relations of deleted files.
//!
//! Files are identified to the tag manager by their storage object id, which
//! has to be looked up before the file is gone.

use crate::dav::plugin::{Exchange, Outcome, Phase, Phases, Plugin};
use crate::dav::request::{split_path, Method};
use crate::support::error::Error;

#[derive(Default)]
pub struct TagsPlugin {
    /// Object id of the file being deleted.
    object: Option<String>,
}

impl TagsPlugin {
    pub fn new() -> Self {
        TagsPlugin::default()
    }
}

impl Plugin for TagsPlugin {
    fn identifier(&self) -> &'static str {
        "tags"
    }

    fn phases(&self) -> Phases {
        Phases::PRE_METHOD | Phases::POST_METHOD
    }

    fn handle(&mut self, phase: Phase, ex: &mut Exchange<'_>) -> Outcome {
        if Method::Delete != ex.request.method {
            return Outcome::Continue;
        }

        match phase {
            Phase::PreMethod => match deleted_object(ex) {
                Ok(object) => {
                    self.object = object;
                    Outcome::Continue
                }
                Err(e) => Outcome::Advisory(format!(
                    "Tags of /{} kept: {}",
                    ex.context.request_path(),
                    e
                )),
            },

            Phase::PostMethod if ex.succeeded() => {
                let object = match self.object.take() {
                    Some(object) => object,
                    None => return Outcome::Continue,
                };
                match ex.services.tags.untag_object(&object) {
                    Ok(()) => Outcome::Continue,
                    Err(e) => Outcome::Advisory(format!(
                        "Tags of object {} kept: {}",
                        object, e
                    )),
                }
            }

            _ => Outcome::Continue,
        }
    }
}

fn deleted_object(ex: &Exchange<'_>) -> Result<Option<String>, Error> {
    let (uid, path) = match (ex.uid(), ex.owned_path("files")) {
        (Some(uid), Some(path)) if !path.is_empty() => (uid, path),
        _ => return Ok(None),
    };

    let segments: Vec<String> =
        split_path(&path).into_iter().map(str::to_owned).collect();
    ex.services.files.storage(uid)?.object_id(&segments)
}
