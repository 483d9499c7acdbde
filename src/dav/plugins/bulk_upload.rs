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

//! Bulk upload: many small files in one `multipart/related` POST.
//!
//! Each part carries the destination in `X-File-Path` (relative to the
//! user's files) and must declare its `Content-Length`; boundaries are not
//! searched for inside part bodies.

use std::fmt::Write as _;
use std::str;
use std::sync::Arc;

use log::warn;

use crate::dav::collab::{Filesystem, Storage};
use crate::dav::plugin::{Exchange, Outcome, Phase, Phases, Plugin};
use crate::dav::request::{split_path, Method, Response};
use crate::support::error::Error;
use crate::support::safe_name::is_safe_name;
use crate::support::status;

pub struct BulkUploadPlugin {
    storage: Arc<dyn Storage>,
}

impl BulkUploadPlugin {
    /// `None` for users without storage, who have nowhere to upload to.
    pub fn for_user(
        files: &dyn Filesystem,
        uid: &str,
    ) -> Result<Option<Self>, Error> {
        match files.storage(uid) {
            Ok(storage) => Ok(Some(BulkUploadPlugin { storage })),
            Err(Error::NoStorage) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn upload(&self, ex: &Exchange<'_>) -> Result<Response, Error> {
        let boundary = ex
            .request
            .headers
            .get("Content-Type")
            .and_then(multipart_boundary)
            .ok_or_else(|| {
                Error::UnsupportedMediaType(
                    "bulk upload must be multipart/related".to_owned(),
                )
            })?;

        let parts = parse_multipart(&ex.request.body, &boundary)?;
        let mut destinations = Vec::with_capacity(parts.len());
        for part in &parts {
            let segments = split_path(&part.path);
            if segments.is_empty() || !segments.iter().all(|s| is_safe_name(s))
            {
                return Err(Error::BadRequest(format!(
                    "Bad X-File-Path: {}",
                    part.path
                )));
            }
            destinations.push(
                segments.into_iter().map(str::to_owned).collect::<Vec<_>>(),
            );
        }

        let total: u64 = parts.iter().map(|p| p.data.len() as u64).sum();
        if let Some(free) = self.storage.free_space()? {
            if total > free {
                return Err(Error::InsufficientStorage);
            }
        }

        let mut report = String::new();
        for (part, destination) in parts.iter().zip(&destinations) {
            match self.storage.write(destination, part.data) {
                Ok(()) => {
                    let _ = writeln!(report, "{}: ok", part.path);
                }
                Err(e) => {
                    warn!(
                        "{} Bulk upload of {} failed: {}",
                        ex.log_prefix, part.path, e
                    );
                    let _ = writeln!(report, "{}: {}", part.path, e);
                }
            }
        }

        Ok(Response::new(status::OK)
            .with_body("text/plain; charset=utf-8", report))
    }
}

impl Plugin for BulkUploadPlugin {
    fn identifier(&self) -> &'static str {
        "bulk-upload"
    }

    fn phases(&self) -> Phases {
        Phases::PRE_METHOD
    }

    fn handle(&mut self, _: Phase, ex: &mut Exchange<'_>) -> Outcome {
        if Method::Post != ex.request.method
            || ex.owned_path("files").map_or(true, |p| !p.is_empty())
        {
            return Outcome::Continue;
        }

        match self.upload(ex) {
            Ok(response) => Outcome::Respond(response),
            Err(e) => Outcome::fault(e),
        }
    }
}

#[derive(Debug)]
struct Part<'a> {
    path: String,
    data: &'a [u8],
}

fn multipart_boundary(content_type: &str) -> Option<String> {
    let mut params = content_type.split(';');
    let media_type = params.next()?.trim();
    if !media_type.eq_ignore_ascii_case("multipart/related") {
        return None;
    }

    params
        .filter_map(|param| {
            let (name, value) = param.split_once('=')?;
            if name.trim().eq_ignore_ascii_case("boundary") {
                Some(value.trim().trim_matches('"').to_owned())
            } else {
                None
            }
        })
        .find(|boundary| !boundary.is_empty())
}

fn parse_multipart<'a>(
    body: &'a [u8],
    boundary: &str,
) -> Result<Vec<Part<'a>>, Error> {
    let bad =
        |what: &str| Error::BadRequest(format!("Bad multipart: {}", what));
    let delimiter = format!("--{}", boundary);

    let mut parts = Vec::new();
    let mut rest = skip_newline(body);
    loop {
        rest = rest
            .strip_prefix(delimiter.as_bytes())
            .ok_or_else(|| bad("missing boundary"))?;
        if rest.starts_with(b"--") {
            return Ok(parts);
        }
        rest = skip_newline(rest);

        let mut path = None;
        let mut length = None;
        loop {
            let (line, after) =
                next_line(rest).ok_or_else(|| bad("truncated headers"))?;
            rest = after;
            if line.is_empty() {
                break;
            }

            let line =
                str::from_utf8(line).map_err(|_| bad("header encoding"))?;
            let (name, value) =
                line.split_once(':').ok_or_else(|| bad("header syntax"))?;
            let name = name.trim();
            if name.eq_ignore_ascii_case("X-File-Path") {
                path = Some(value.trim().to_owned());
            } else if name.eq_ignore_ascii_case("Content-Length") {
                length = Some(
                    value
                        .trim()
                        .parse::<usize>()
                        .map_err(|_| bad("Content-Length"))?,
                );
            }
        }

        let path = path.ok_or_else(|| bad("part without X-File-Path"))?;
        let length = length.ok_or_else(|| bad("part without Content-Length"))?;
        if rest.len() < length {
            return Err(bad("truncated part"));
        }

        let (data, after) = rest.split_at(length);
        parts.push(Part { path, data });
        rest = skip_newline(after);
    }
}

fn next_line(data: &[u8]) -> Option<(&[u8], &[u8])> {
    let end = memchr::memchr(b'\n', data)?;
    let line = &data[..end];
    Some((line.strip_suffix(b"\r").unwrap_or(line), &data[end + 1..]))
}

fn skip_newline(data: &[u8]) -> &[u8] {
    data.strip_prefix(b"\r\n")
        .or_else(|| data.strip_prefix(b"\n"))
        .unwrap_or(data)
}
