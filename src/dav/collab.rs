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

//! Interfaces of the systems the pipeline sits on top of.
//!
//! None of these are implemented here. The hosting application hands a
//! `Services` bundle to the server, and everything that needs a collaborator
//! receives it from there explicitly.

use std::sync::Arc;

use bitflags::bitflags;

use crate::support::error::Error;
use crate::support::system_config::ConfigStore;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    uid: String,
}

impl User {
    pub fn new(uid: impl Into<String>) -> Self {
        User { uid: uid.into() }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// The principal URI of this user, e.g. `principals/users/alice`.
    pub fn principal_uri(&self) -> String {
        format!("principals/users/{}", self.uid)
    }
}

pub trait UserManager: Send + Sync {
    fn get(&self, uid: &str) -> Option<User>;
    fn user_ids(&self) -> Result<Vec<String>, Error>;
    fn group_ids(&self) -> Result<Vec<String>, Error>;
    fn check_password(&self, uid: &str, password: &str) -> Result<bool, Error>;
}

/// Session-level guards around credential checks.
pub trait SessionGuard: Send + Sync {
    /// Whether requests from `remote` are currently being throttled after
    /// too many failed logins.
    fn is_throttled(&self, remote: Option<&str>) -> bool;
    fn register_failure(&self, remote: Option<&str>);
    /// Whether `uid` has a second factor that a plain DAV login cannot
    /// satisfy.
    fn needs_second_factor(&self, uid: &str) -> bool;
}

pub trait TokenVerifier: Send + Sync {
    /// Returns the uid the bearer token belongs to, if it is valid.
    fn verify(&self, token: &str) -> Option<String>;
}

pub trait CalendarBackend: Send + Sync {
    fn calendars_for_user(
        &self,
        principal_uri: &str,
    ) -> Result<Vec<String>, Error>;
    fn calendar_objects(
        &self,
        principal_uri: &str,
        calendar_uri: &str,
    ) -> Result<Vec<String>, Error>;
    fn published_calendars(&self) -> Result<Vec<String>, Error>;
    fn create_calendar(
        &self,
        principal_uri: &str,
        calendar_uri: &str,
        display_name: &str,
    ) -> Result<(), Error>;
}

pub trait CardBackend: Send + Sync {
    fn address_books_for_user(
        &self,
        principal_uri: &str,
    ) -> Result<Vec<String>, Error>;
    fn cards(
        &self,
        principal_uri: &str,
        address_book_uri: &str,
    ) -> Result<Vec<String>, Error>;
    fn create_address_book(
        &self,
        principal_uri: &str,
        address_book_uri: &str,
        display_name: &str,
    ) -> Result<(), Error>;
}

/// Constructs the database-backed groupware backends.
///
/// Construction may fail (e.g. the database is down); the tree builder
/// treats that as fatal for the request.
pub trait BackendProvider: Send + Sync {
    fn calendar_backend(&self) -> Result<Arc<dyn CalendarBackend>, Error>;
    fn card_backend(&self) -> Result<Arc<dyn CardBackend>, Error>;
}

bitflags! {
    pub struct SharePermissions: u32 {
        const READ = 1;
        const UPDATE = 2;
        const CREATE = 4;
        const DELETE = 8;
        const SHARE = 16;
    }
}

/// A share received by a user, mounted at `path` within their files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Share {
    pub path: String,
    pub permissions: SharePermissions,
}

pub trait ShareManager: Send + Sync {
    fn shares_with(&self, uid: &str) -> Result<Vec<Share>, Error>;
}

pub trait TagManager: Send + Sync {
    fn tag_ids(&self) -> Result<Vec<String>, Error>;
    fn tagged_objects(&self) -> Result<Vec<String>, Error>;
    fn untag_object(&self, object: &str) -> Result<(), Error>;
}

pub trait CommentManager: Send + Sync {
    fn commented_objects(&self) -> Result<Vec<String>, Error>;
    fn comment_ids(&self, object_id: &str) -> Result<Vec<String>, Error>;
    /// Whether `object_id` names something that may be commented on, whether
    /// or not it has comments yet.
    fn object_exists(&self, object_id: &str) -> Result<bool, Error>;
    /// Returns the id of the new comment.
    fn create(
        &self,
        object_id: &str,
        author: &str,
        message: &str,
    ) -> Result<String, Error>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub is_collection: bool,
    pub size: u64,
}

/// One user's view of the virtual filesystem.
pub trait Storage: Send + Sync {
    fn list(&self, path: &[String]) -> Result<Vec<Entry>, Error>;
    /// `None` if the user has no quota.
    fn free_space(&self) -> Result<Option<u64>, Error>;
    fn write(&self, path: &[String], data: &[u8]) -> Result<(), Error>;
    /// The stable id of the file at `path`, `None` if there is no such file.
    fn object_id(&self, path: &[String]) -> Result<Option<String>, Error>;
}

pub trait Filesystem: Send + Sync {
    /// Fails with `Error::NoStorage` for users who do not have any, which is
    /// normal for system and guest principals.
    fn storage(&self, uid: &str) -> Result<Arc<dyn Storage>, Error>;
}

pub trait PropertyStore: Send + Sync {
    fn delete_for_path(&self, uid: &str, path: &str) -> Result<(), Error>;
    fn move_path(&self, uid: &str, from: &str, to: &str) -> Result<(), Error>;
}

pub trait SearchIndex: Send + Sync {
    fn mark_dirty(&self, uid: &str, path: &str) -> Result<(), Error>;
}

/// Everything the pipeline may consult, passed explicitly to tree building
/// and plugin construction.
#[derive(Clone)]
pub struct Services {
    pub config: Arc<dyn ConfigStore>,
    pub users: Arc<dyn UserManager>,
    pub session: Arc<dyn SessionGuard>,
    pub tokens: Arc<dyn TokenVerifier>,
    pub backends: Arc<dyn BackendProvider>,
    pub shares: Arc<dyn ShareManager>,
    pub tags: Arc<dyn TagManager>,
    pub comments: Arc<dyn CommentManager>,
    pub files: Arc<dyn Filesystem>,
    pub uploads: Arc<dyn Filesystem>,
    pub properties: Arc<dyn PropertyStore>,
    pub search: Arc<dyn SearchIndex>,
}
