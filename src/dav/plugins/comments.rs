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

//! Posting comments on files.

use crate::dav::plugin::{Exchange, Outcome, Phase, Phases, Plugin};
use crate::dav::request::{split_path, Method, Response};
use crate::support::error::Error;
use crate::support::status;

/// Longest comment accepted, in characters.
const MAX_MESSAGE_LENGTH: usize = 1000;

pub struct CommentsPlugin;

impl Plugin for CommentsPlugin {
    fn identifier(&self) -> &'static str {
        "comments"
    }

    fn phases(&self) -> Phases {
        Phases::PRE_METHOD
    }

    fn handle(&mut self, _: Phase, ex: &mut Exchange<'_>) -> Outcome {
        if Method::Post != ex.request.method {
            return Outcome::Continue;
        }

        let object = match split_path(&ex.request.path)[..] {
            ["comments", "files", object] => object.to_owned(),
            _ => return Outcome::Continue,
        };

        match post_comment(ex, &object) {
            Ok(response) => Outcome::Respond(response),
            Err(e) => Outcome::fault(e),
        }
    }
}

fn post_comment(ex: &Exchange<'_>, object: &str) -> Result<Response, Error> {
    let author = ex.uid().ok_or(Error::NotAuthenticated)?;
    let message = std::str::from_utf8(&ex.request.body)
        .map_err(|_| Error::BadRequest("Comment is not UTF-8".to_owned()))?
        .trim();
    if message.is_empty() {
        return Err(Error::BadRequest("Empty comment".to_owned()));
    }
    if message.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(Error::BadRequest(format!(
            "Comments are limited to {} characters",
            MAX_MESSAGE_LENGTH
        )));
    }

    let id = ex.services.comments.create(object, author, message)?;
    let location = format!(
        "{}/comments/files/{}/{}",
        ex.config.base_uri.trim_end_matches('/'),
        object,
        id
    );
    Ok(Response::new(status::CREATED)
        .with_header("Content-Location", &location))
}
