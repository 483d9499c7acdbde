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

//! Answers to plain GET requests on collections.
//!
//! The DAV method layer has nothing to say about GET on a collection. In
//! debug mode, `BrowserPlugin` renders an HTML index so a human can poke
//! around with a web browser; otherwise `DummyGetPlugin` returns a short
//! notice so that clients probing the endpoint do not see an error.

use std::fmt::Write as _;

use crate::dav::plugin::{Exchange, Outcome, Phase, Phases, Plugin};
use crate::dav::request::{Method, Response};
use crate::dav::tree::Node;
use crate::support::status;

pub struct BrowserPlugin;

impl Plugin for BrowserPlugin {
    fn identifier(&self) -> &'static str {
        "browser"
    }

    fn phases(&self) -> Phases {
        Phases::PRE_METHOD
    }

    fn handle(&mut self, _: Phase, ex: &mut Exchange<'_>) -> Outcome {
        let node = match target_collection(ex) {
            Some(node) => node,
            None => return Outcome::Continue,
        };

        let children = match node.list_children() {
            Ok(children) => children,
            Err(e) => return Outcome::fault(e),
        };

        let base = ex.config.base_uri.trim_end_matches('/');
        let here = ex.context.request_path();
        let mut html = String::new();
        let _ = write!(
            html,
            "<!DOCTYPE html>\n<html><head><title>Index of /{}</title></head>\
             <body><h1>Index of /{}</h1><ul>\n",
            escape(here),
            escape(here),
        );
        for child in children {
            let href = if here.is_empty() {
                format!("{}/{}", base, child.name())
            } else {
                format!("{}/{}/{}", base, here, child.name())
            };
            let _ = writeln!(
                html,
                "<li><a href=\"{}\">{}{}</a></li>",
                escape(&href),
                escape(child.name()),
                if child.is_collection() { "/" } else { "" },
            );
        }
        html.push_str("</ul></body></html>\n");

        let mut response = Response::new(status::OK);
        if Method::Get == ex.request.method {
            response = response.with_body("text/html; charset=utf-8", html);
        } else {
            response.headers.set("Content-Type", "text/html; charset=utf-8");
        }
        Outcome::Respond(response)
    }
}

pub struct DummyGetPlugin;

static NOTICE: &str = "This is the WebDAV interface. \
                       It can only be accessed by WebDAV clients.\n";

impl Plugin for DummyGetPlugin {
    fn identifier(&self) -> &'static str {
        "dummy-get"
    }

    fn phases(&self) -> Phases {
        Phases::PRE_METHOD
    }

    fn handle(&mut self, _: Phase, ex: &mut Exchange<'_>) -> Outcome {
        if target_collection(ex).is_none() {
            return Outcome::Continue;
        }

        let response = if Method::Get == ex.request.method {
            Response::new(status::OK).with_body("text/plain", NOTICE)
        } else {
            Response::new(status::OK)
        };
        Outcome::Respond(response)
    }
}

/// The collection a GET or HEAD request targets, if it targets one.
fn target_collection<'a>(ex: &Exchange<'a>) -> Option<&'a Node> {
    if !matches!(ex.request.method, Method::Get | Method::Head) {
        return None;
    }

    ex.tree
        .resolve(ex.context.request_path())
        .ok()
        .flatten()
        .filter(|node| node.is_collection())
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            ch => out.push(ch),
        }
    }
    out
}
