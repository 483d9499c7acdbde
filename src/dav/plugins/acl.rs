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

//! Access control vetoes, run before every other plugin.

use crate::dav::plugin::{Exchange, Outcome, Phase, Phases, Plugin};
use crate::dav::request::{split_path, Method};
use crate::support::error::Error;

/// Subtrees whose second (or third) segment names the owning user.
static OWNED_SUBTREES: &[&[&str]] = &[
    &["files"],
    &["calendars"],
    &["addressbooks", "users"],
    &["uploads"],
];

/// Top-level collections nobody may write to through DAV.
static READ_ONLY: &[&str] =
    &["principals", "system-tags", "avatars", "public-calendars"];

pub struct AclPlugin;

impl Plugin for AclPlugin {
    fn identifier(&self) -> &'static str {
        "acl"
    }

    fn phases(&self) -> Phases {
        Phases::PRE_METHOD
    }

    fn features(&self) -> &'static [&'static str] {
        &["access-control"]
    }

    fn handle(&mut self, _: Phase, ex: &mut Exchange<'_>) -> Outcome {
        let method = ex.request.method;
        if let Err(e) = check_path(&ex.request.path, method, ex.uid()) {
            return Outcome::fault(e);
        }

        if matches!(method, Method::Move | Method::Copy) {
            let destination = match ex.destination() {
                Some(destination) => destination,
                None => {
                    return Outcome::fault(Error::BadRequest(
                        "Missing or foreign Destination".to_owned(),
                    ))
                }
            };
            // Whatever lands at the destination is a write there
            if let Err(e) = check_path(&destination, Method::Put, ex.uid()) {
                return Outcome::fault(e);
            }
        }

        Outcome::Continue
    }
}

fn check_path(
    path: &str,
    method: Method,
    uid: Option<&str>,
) -> Result<(), Error> {
    let segments = split_path(path);
    let top = segments.first().copied();

    if method.is_write()
        && top.map_or(true, |top| READ_ONLY.contains(&top))
    {
        return Err(Error::Forbidden(format!(
            "{} is read-only",
            top.unwrap_or("/")
        )));
    }

    for prefix in OWNED_SUBTREES {
        if segments.len() <= prefix.len()
            || segments[..prefix.len()] != prefix[..]
        {
            continue;
        }

        let owner = segments[prefix.len()];
        return match uid {
            None if Method::Options == method => Ok(()),
            None => Err(Error::NotAuthenticated),
            Some(uid) if uid == owner => Ok(()),
            Some(_) => Err(Error::Forbidden(format!(
                "{} belongs to another user",
                path
            ))),
        };
    }

    Ok(())
}
