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

use std::io;

use thiserror::Error;

use super::status::{self, Status};

#[derive(Error, Debug)]
pub enum Error {
    #[error("No such resource: {0}")]
    NotFound(String),
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error("Listing this collection is not allowed")]
    ListingDisabled,
    #[error("Parent collection does not exist")]
    Conflict,
    #[error("{0}")]
    Forbidden(String),
    #[error("Backend unavailable: {0}")]
    CollaboratorUnavailable(String),
    #[error("User has no storage")]
    NoStorage,
    #[error("Unsafe resource name")]
    UnsafeName,
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("Insufficient storage")]
    InsufficientStorage,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Config(#[from] toml::de::Error),
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl Error {
    /// The status code this error surfaces as when it terminates a request.
    pub fn status(&self) -> Status {
        match *self {
            Error::NotFound(_) => status::NOT_FOUND,
            Error::NotAuthenticated => status::UNAUTHORIZED,
            Error::ListingDisabled => status::METHOD_NOT_ALLOWED,
            Error::Conflict => status::CONFLICT,
            Error::Forbidden(_) => status::FORBIDDEN,
            Error::CollaboratorUnavailable(_) => status::SERVICE_UNAVAILABLE,
            Error::NoStorage => status::NOT_FOUND,
            Error::UnsafeName | Error::BadRequest(_) => status::BAD_REQUEST,
            Error::UnsupportedMediaType(_) => status::UNSUPPORTED_MEDIA_TYPE,
            Error::InsufficientStorage => status::INSUFFICIENT_STORAGE,
            Error::Io(_) | Error::Config(_) | Error::Logging(_) => {
                status::INTERNAL_SERVER_ERROR
            }
        }
    }
}
