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

//! Compresses large multistatus responses.

use log::warn;

use crate::dav::plugin::{Exchange, Outcome, Phase, Phases, Plugin};
use crate::dav::request::Method;
use crate::support::compression::Compression;

pub struct CompressionPlugin;

impl Plugin for CompressionPlugin {
    fn identifier(&self) -> &'static str {
        "compression"
    }

    fn phases(&self) -> Phases {
        Phases::POST_METHOD
    }

    fn handle(&mut self, _: Phase, ex: &mut Exchange<'_>) -> Outcome {
        if !matches!(ex.request.method, Method::Propfind | Method::Report) {
            return Outcome::Continue;
        }

        let compression = match ex
            .request
            .headers
            .get("Accept-Encoding")
            .and_then(Compression::negotiate)
        {
            Some(c) => c,
            None => return Outcome::Continue,
        };

        let threshold = ex.config.compression_threshold;
        let response = match ex.response.as_mut() {
            Some(r) => r,
            None => return Outcome::Continue,
        };
        if response.body.len() < threshold
            || response.headers.contains("Content-Encoding")
        {
            return Outcome::Continue;
        }

        match compression.compress(&response.body) {
            Ok(compressed) => {
                response.body = compressed;
                response
                    .headers
                    .set("Content-Encoding", compression.token());
                response.headers.set("Vary", "Accept-Encoding");
                Outcome::Continue
            }
            Err(e) => {
                warn!("{} Compression failed: {}", ex.log_prefix, e);
                Outcome::Advisory(format!(
                    "Sent uncompressed response: {}",
                    e
                ))
            }
        }
    }
}
