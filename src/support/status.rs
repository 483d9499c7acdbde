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

//! HTTP status codes surfaced by the pipeline.
//!
//! The dispatch engine never invents its own codes; these are only the ones
//! that plugins, authentication and path resolution hand back.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Status(pub u16);

pub const OK: Status = Status(200);
pub const CREATED: Status = Status(201);
pub const NO_CONTENT: Status = Status(204);
pub const MULTI_STATUS: Status = Status(207);
pub const BAD_REQUEST: Status = Status(400);
pub const UNAUTHORIZED: Status = Status(401);
pub const FORBIDDEN: Status = Status(403);
pub const NOT_FOUND: Status = Status(404);
pub const METHOD_NOT_ALLOWED: Status = Status(405);
pub const CONFLICT: Status = Status(409);
pub const UNSUPPORTED_MEDIA_TYPE: Status = Status(415);
pub const LOCKED: Status = Status(423);
pub const INTERNAL_SERVER_ERROR: Status = Status(500);
pub const NOT_IMPLEMENTED: Status = Status(501);
pub const SERVICE_UNAVAILABLE: Status = Status(503);
pub const INSUFFICIENT_STORAGE: Status = Status(507);

impl Status {
    pub fn is_success(self) -> bool {
        (200..300).contains(&self.0)
    }

    pub fn is_server_error(self) -> bool {
        self.0 >= 500
    }

    pub fn reason(self) -> &'static str {
        match self.0 {
            200 => "OK",
            201 => "Created",
            204 => "No Content",
            207 => "Multi-Status",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            409 => "Conflict",
            415 => "Unsupported Media Type",
            423 => "Locked",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            503 => "Service Unavailable",
            507 => "Insufficient Storage",
            _ => "",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.0, self.reason())
    }
}
