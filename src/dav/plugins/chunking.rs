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

//! Chunked uploads.
//!
//! A client uploads a large file as numbered chunks into
//! `uploads/<uid>/<transfer>/`, then MOVEs the `.file` pseudo-node of the
//! transfer to the final destination. Before that assembly happens, the
//! total length the client announced must match what actually arrived.

use log::warn;

use crate::dav::plugin::{Exchange, Outcome, Phase, Phases, Plugin};
use crate::dav::request::{split_path, Method};
use crate::support::error::Error;

pub struct ChunkingPlugin;

impl Plugin for ChunkingPlugin {
    fn identifier(&self) -> &'static str {
        "chunking"
    }

    fn phases(&self) -> Phases {
        Phases::PRE_METHOD
    }

    fn handle(&mut self, _: Phase, ex: &mut Exchange<'_>) -> Outcome {
        if Method::Move != ex.request.method {
            return Outcome::Continue;
        }

        let (uid, transfer) = match split_path(&ex.request.path)[..] {
            ["uploads", uid, transfer, ".file"] => {
                (uid.to_owned(), transfer.to_owned())
            }
            _ => return Outcome::Continue,
        };

        let expected = match ex.request.headers.get("OC-Total-Length") {
            None => return Outcome::Continue,
            Some(value) => match value.trim().parse::<u64>() {
                Ok(expected) => expected,
                Err(_) => {
                    return Outcome::fault(Error::BadRequest(format!(
                        "Bad OC-Total-Length: {}",
                        value
                    )))
                }
            },
        };

        let actual = match uploaded_size(ex, &uid, &transfer) {
            Ok(actual) => actual,
            Err(e) => {
                warn!(
                    "{} Can't size transfer {}: {}",
                    ex.log_prefix, transfer, e
                );
                return Outcome::fault(e);
            }
        };

        if actual == expected {
            Outcome::Continue
        } else {
            Outcome::fault(Error::BadRequest(format!(
                "Expected {} bytes in transfer, found {}",
                expected, actual
            )))
        }
    }
}

fn uploaded_size(
    ex: &Exchange<'_>,
    uid: &str,
    transfer: &str,
) -> Result<u64, Error> {
    let storage = ex.services.uploads.storage(uid)?;
    Ok(storage
        .list(&[transfer.to_owned()])?
        .iter()
        .map(|chunk| chunk.size)
        .sum())
}
