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

//! The slice of HTTP the pipeline sees.
//!
//! Wire-level parsing and serialisation belong to the transport; requests
//! arrive here already split into method, path, headers and body.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::support::error::Error;
use crate::support::status::{self, Status};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Options,
    Get,
    Head,
    Post,
    Put,
    Delete,
    Mkcol,
    Propfind,
    Proppatch,
    Move,
    Copy,
    Lock,
    Unlock,
    Report,
}

impl Method {
    pub const ALL: &'static [Method] = &[
        Method::Options,
        Method::Get,
        Method::Head,
        Method::Post,
        Method::Put,
        Method::Delete,
        Method::Mkcol,
        Method::Propfind,
        Method::Proppatch,
        Method::Move,
        Method::Copy,
        Method::Lock,
        Method::Unlock,
        Method::Report,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Options => "OPTIONS",
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Mkcol => "MKCOL",
            Method::Propfind => "PROPFIND",
            Method::Proppatch => "PROPPATCH",
            Method::Move => "MOVE",
            Method::Copy => "COPY",
            Method::Lock => "LOCK",
            Method::Unlock => "UNLOCK",
            Method::Report => "REPORT",
        }
    }

    /// Whether the method may name a path that does not exist yet, in which
    /// case the parent collection is what has to exist.
    pub fn may_target_unmapped(self) -> bool {
        matches!(self, Method::Put | Method::Mkcol | Method::Lock)
    }

    /// Whether the method changes the resource it targets.
    pub fn is_write(self) -> bool {
        !matches!(
            self,
            Method::Options
                | Method::Get
                | Method::Head
                | Method::Propfind
                | Method::Report
        )
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        Method::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| Error::BadRequest(format!("unknown method {s}")))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Header map with case-insensitive names.
///
/// Names are stored lower-cased; a repeated header replaces the earlier
/// value, which is all the pipeline ever needs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(&name.to_ascii_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&name.to_ascii_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Clone, Debug)]
pub struct Request {
    pub method: Method,
    /// The path below the DAV endpoint, e.g. `files/alice/report.odt`.
    pub path: String,
    pub headers: Headers,
    pub body: Vec<u8>,
    pub remote: Option<String>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Request {
            method,
            path: path.into(),
            headers: Headers::new(),
            body: Vec::new(),
            remote: None,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn user_agent(&self) -> &str {
        self.headers.get("User-Agent").unwrap_or("")
    }

    /// The request path split into its non-empty segments.
    pub fn segments(&self) -> Vec<&str> {
        split_path(&self.path)
    }

    /// The declared length of the body being uploaded, preferring the
    /// chunked-upload total over `Content-Length`.
    pub fn declared_length(&self) -> Option<u64> {
        self.headers
            .get("OC-Total-Length")
            .or_else(|| self.headers.get("Content-Length"))
            .and_then(|v| v.trim().parse().ok())
    }
}

/// Split `path` into its non-empty segments.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: Status) -> Self {
        Response {
            status,
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn with_body(
        mut self,
        content_type: &str,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        self.headers.set("Content-Type", content_type);
        self.body = body.into();
        self
    }

    /// The response for a request that ended with `error`.
    pub fn from_error(error: &Error) -> Self {
        let status = error.status();
        let message = if status.is_server_error() {
            // Internals are logged, not shown
            status.reason().to_owned()
        } else {
            error.to_string()
        };

        let mut response = Response::new(status)
            .with_body("text/plain; charset=utf-8", message);
        if status == status::UNAUTHORIZED {
            response.headers.set(
                "WWW-Authenticate",
                r#"Basic realm="davchain", charset="UTF-8""#,
            );
        }
        response
    }
}
