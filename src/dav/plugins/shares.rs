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

//! Enforces the permissions of shares the user has received.

use crate::dav::collab::{Share, ShareManager, SharePermissions};
use crate::dav::plugin::{Exchange, Outcome, Phase, Phases, Plugin};
use crate::dav::request::Method;
use crate::support::error::Error;

#[derive(Debug)]
pub struct SharesPlugin {
    shares: Vec<Share>,
}

impl SharesPlugin {
    /// Loads the shares received by `uid`. Failure here is left to the
    /// caller; the plugin is simply not attached then.
    pub fn for_user(
        shares: &dyn ShareManager,
        uid: &str,
    ) -> Result<Self, Error> {
        Ok(SharesPlugin {
            shares: shares.shares_with(uid)?,
        })
    }

    /// The share mounted exactly at `path`.
    fn mounted_at(&self, path: &str) -> Option<&Share> {
        let path = path.trim_matches('/');
        self.shares
            .iter()
            .find(|share| share.path.trim_matches('/') == path)
    }
}

impl Plugin for SharesPlugin {
    fn identifier(&self) -> &'static str {
        "shares"
    }

    fn phases(&self) -> Phases {
        Phases::PRE_METHOD
    }

    fn handle(&mut self, _: Phase, ex: &mut Exchange<'_>) -> Outcome {
        if !matches!(ex.request.method, Method::Delete | Method::Move) {
            return Outcome::Continue;
        }

        let path = match ex.owned_path("files") {
            Some(path) => path,
            None => return Outcome::Continue,
        };

        match self.mounted_at(&path) {
            Some(share)
                if !share.permissions.contains(SharePermissions::DELETE) =>
            {
                Outcome::fault(Error::Forbidden(format!(
                    "Share {} may not be removed",
                    path
                )))
            }
            _ => Outcome::Continue,
        }
    }
}
