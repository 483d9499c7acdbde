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

//! Pretend locking for clients that refuse to write without it.
//!
//! Some clients (notably the Windows and macOS WebDAV redirectors) will only
//! mount a share read-only unless the server claims class 2 compliance and
//! grants their LOCK requests. The locks handed out here are never enforced.

use log::info;

use crate::dav::plugin::{Exchange, Outcome, Phase, Phases, Plugin};
use crate::dav::request::{Method, Response};
use crate::support::status;

pub struct FakeLockPlugin;

impl Plugin for FakeLockPlugin {
    fn identifier(&self) -> &'static str {
        "fake-lock"
    }

    fn phases(&self) -> Phases {
        Phases::PRE_METHOD
    }

    fn features(&self) -> &'static [&'static str] {
        &["2"]
    }

    fn handle(&mut self, _: Phase, ex: &mut Exchange<'_>) -> Outcome {
        match ex.request.method {
            Method::Lock => {
                let token = format!(
                    "opaquelocktoken:{}",
                    format_uuid(rand::random::<u128>())
                );
                let href = format!(
                    "{}/{}",
                    ex.config.base_uri.trim_end_matches('/'),
                    ex.context.request_path()
                );
                let advisory = format!(
                    "Granted fake lock {} on /{}",
                    token,
                    ex.context.request_path()
                );
                info!("{} {}", ex.log_prefix, advisory);
                ex.advisories.push(advisory);
                Outcome::Respond(
                    Response::new(status::OK)
                        .with_header("Lock-Token", &format!("<{}>", token))
                        .with_body(
                            "application/xml; charset=utf-8",
                            lock_discovery(&token, &href),
                        ),
                )
            }

            Method::Unlock => {
                Outcome::Respond(Response::new(status::NO_CONTENT))
            }

            _ => {
                let has_fake_token = ex
                    .request
                    .headers
                    .get("If")
                    .map_or(false, |v| v.contains("opaquelocktoken:"));
                if has_fake_token {
                    // The method layer would try to validate the token
                    // against a lock that does not exist
                    ex.request.headers.remove("If");
                    Outcome::Advisory("Dropped fake lock token".to_owned())
                } else {
                    Outcome::Continue
                }
            }
        }
    }
}

fn format_uuid(bits: u128) -> String {
    let hex = format!("{:032x}", bits);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

fn lock_discovery(token: &str, href: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
         <d:prop xmlns:d=\"DAV:\"><d:lockdiscovery><d:activelock>\
         <d:locktype><d:write/></d:locktype>\
         <d:lockscope><d:exclusive/></d:lockscope>\
         <d:depth>infinity</d:depth>\
         <d:timeout>Second-1800</d:timeout>\
         <d:locktoken><d:href>{}</d:href></d:locktoken>\
         <d:lockroot><d:href>{}</d:href></d:lockroot>\
         </d:activelock></d:lockdiscovery></d:prop>\n",
        token, href
    )
}
