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

//! Authentication backends and the order they are consulted in.

use std::str;

use log::{debug, warn};

use super::activation::is_request_for_subtree;
use super::collab::{Services, User};
use super::request::{Method, Request};
use crate::support::error::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthResult {
    /// A concrete user principal was established.
    Authenticated(User),
    /// The request may proceed without a principal.
    Anonymous,
    /// This backend has nothing to say about the request.
    NotApplicable,
}

pub trait AuthBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Backends other than the primary one must not fail just because they
    /// do not recognise the request; that is what `NotApplicable` is for.
    fn check(
        &self,
        request: &Request,
        services: &Services,
    ) -> Result<AuthResult, Error>;
}

/// `Authorization: Bearer` tokens, as used by app passwords and OAuth
/// clients.
pub struct BearerAuth;

impl AuthBackend for BearerAuth {
    fn name(&self) -> &'static str {
        "bearer"
    }

    fn check(
        &self,
        request: &Request,
        services: &Services,
    ) -> Result<AuthResult, Error> {
        let token = match request
            .headers
            .get("Authorization")
            .and_then(|h| strip_scheme(h, "Bearer"))
        {
            Some(token) => token,
            None => return Ok(AuthResult::NotApplicable),
        };

        Ok(services
            .tokens
            .verify(token)
            .and_then(|uid| services.users.get(&uid))
            .map_or(AuthResult::NotApplicable, AuthResult::Authenticated))
    }
}

/// Lets credential-less requests through where anonymous access is part of
/// the protocol: OPTIONS anywhere, and anything on a public subtree.
pub struct PublicAuth {
    subtrees: Vec<String>,
}

impl PublicAuth {
    pub fn new(subtrees: Vec<String>) -> Self {
        PublicAuth { subtrees }
    }
}

impl AuthBackend for PublicAuth {
    fn name(&self) -> &'static str {
        "public"
    }

    fn check(
        &self,
        request: &Request,
        _services: &Services,
    ) -> Result<AuthResult, Error> {
        // A client that offers credentials wants to be somebody
        if request.headers.contains("Authorization") {
            return Ok(AuthResult::NotApplicable);
        }

        if Method::Options == request.method
            || is_request_for_subtree(&request.path, self.subtrees.as_slice())
        {
            Ok(AuthResult::Anonymous)
        } else {
            Ok(AuthResult::NotApplicable)
        }
    }
}

/// HTTP Basic authentication against the user manager.
///
/// This is the primary backend. It never answers `NotApplicable`: anything
/// short of a valid login is `Error::NotAuthenticated`.
pub struct BasicAuth;

impl AuthBackend for BasicAuth {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn check(
        &self,
        request: &Request,
        services: &Services,
    ) -> Result<AuthResult, Error> {
        let remote = request.remote.as_deref();
        if services.session.is_throttled(remote) {
            warn!("Rejecting login from throttled remote {:?}", remote);
            return Err(Error::NotAuthenticated);
        }

        let header = match request.headers.get("Authorization") {
            Some(header) => header,
            None => return Err(Error::NotAuthenticated),
        };

        let (uid, password) =
            match strip_scheme(header, "Basic").and_then(decode_basic) {
                Some(credentials) => credentials,
                None => {
                    services.session.register_failure(remote);
                    return Err(Error::NotAuthenticated);
                }
            };

        if !services.users.check_password(&uid, &password)? {
            debug!("Bad password for {:?}", uid);
            services.session.register_failure(remote);
            return Err(Error::NotAuthenticated);
        }

        let user = services.users.get(&uid).ok_or(Error::NotAuthenticated)?;
        if services.session.needs_second_factor(user.uid()) {
            debug!("{} needs a second factor", user.uid());
            return Err(Error::NotAuthenticated);
        }

        Ok(AuthResult::Authenticated(user))
    }
}

fn strip_scheme<'a>(header: &'a str, scheme: &str) -> Option<&'a str> {
    let (found, rest) = header.trim().split_at(header.trim().find(' ')?);
    if found.eq_ignore_ascii_case(scheme) {
        Some(rest.trim())
    } else {
        None
    }
}

fn decode_basic(encoded: &str) -> Option<(String, String)> {
    let decoded = base64::decode(encoded).ok()?;
    let decoded = str::from_utf8(&decoded).ok()?;
    let colon = decoded.find(':')?;
    Some((decoded[..colon].to_owned(), decoded[colon + 1..].to_owned()))
}

/// The ordered authentication backends.
///
/// The primary backend signals failure by raising an error, so anything
/// after it would never be consulted. It is therefore held apart and always
/// tried last, no matter how many backends are added later.
pub struct AuthChain {
    backends: Vec<Box<dyn AuthBackend>>,
    primary: Box<dyn AuthBackend>,
}

impl AuthChain {
    pub fn new(primary: Box<dyn AuthBackend>) -> Self {
        AuthChain {
            backends: Vec::new(),
            primary,
        }
    }

    /// Bearer tokens, then public access, then Basic.
    pub fn standard(public_subtrees: Vec<String>) -> Self {
        let mut chain = AuthChain::new(Box::new(BasicAuth));
        chain.add(Box::new(BearerAuth));
        chain.add(Box::new(PublicAuth::new(public_subtrees)));
        chain
    }

    /// Add a backend to be tried after those already added, but still
    /// before the primary one.
    pub fn add(&mut self, backend: Box<dyn AuthBackend>) {
        self.backends.push(backend);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.backends
            .iter()
            .chain(std::iter::once(&self.primary))
            .map(|b| b.name())
            .collect()
    }

    /// Run the backends in order.
    ///
    /// Returns the user if one was established, `None` if anonymous access
    /// was granted, or the primary backend's error.
    pub fn authenticate(
        &self,
        request: &Request,
        services: &Services,
    ) -> Result<Option<User>, Error> {
        for backend in &self.backends {
            match backend.check(request, services)? {
                AuthResult::Authenticated(user) => {
                    debug!("{} authenticated {}", backend.name(), user.uid());
                    return Ok(Some(user));
                }
                AuthResult::Anonymous => {
                    debug!("{} allowed anonymous access", backend.name());
                    return Ok(None);
                }
                AuthResult::NotApplicable => (),
            }
        }

        match self.primary.check(request, services)? {
            AuthResult::Authenticated(user) => Ok(Some(user)),
            AuthResult::Anonymous => Ok(None),
            AuthResult::NotApplicable => Err(Error::NotAuthenticated),
        }
    }
}
