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

//! Per-request facts and the predicates that decide whether a plugin is
//! attached to a request.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

use super::collab::User;
use super::request::{Method, Request};
use crate::support::system_config::ConfigStore;

/// Top-level collections served by the CalDAV plugins.
pub static CALDAV_SUBTREES: &[&str] = &[
    "calendars",
    "public-calendars",
    "system-calendars",
    "principals",
];

/// Top-level collections served by the CardDAV plugins.
pub static CARDDAV_SUBTREES: &[&str] = &["addressbooks", "principals"];

pub const FLAG_SEND_INVITATIONS: &str = "send_invitations";
pub const FLAG_CALENDAR_SUBSCRIPTIONS: &str = "calendar_subscriptions";
pub const FLAG_BULK_UPLOAD: &str = "bulk_upload";
pub const FLAG_PROFILER: &str = "profiler";

/// Whether `path` lies strictly below one of `subtrees`.
///
/// Both sides are trimmed of surrounding slashes and spaces, then `path` must
/// start with `<subtree>/`. The trailing slash keeps `calendars-old/x` from
/// matching `calendars`; it also means the subtree root itself does not
/// match.
pub fn is_request_for_subtree<S: AsRef<str>>(
    path: &str,
    subtrees: &[S],
) -> bool {
    let path = trim(path);
    subtrees.iter().any(|subtree| {
        let subtree = trim(subtree.as_ref());
        !subtree.is_empty()
            && path.len() > subtree.len()
            && path.starts_with(subtree)
            && path.as_bytes()[subtree.len()] == b'/'
    })
}

fn trim(s: &str) -> &str {
    s.trim_matches(|c| c == '/' || c == ' ')
}

/// Protocol capabilities faked for clients that refuse to work without them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Emulation {
    /// Claim Class 2 (locking) compliance without doing real locking.
    Locking,
}

lazy_static! {
    static ref USER_AGENT_EMULATIONS: Vec<(Regex, Emulation)> = vec![
        (Regex::new("WebDAVFS").unwrap(), Emulation::Locking),
        (Regex::new("OneNote").unwrap(), Emulation::Locking),
        (Regex::new("^Microsoft-WebDAV").unwrap(), Emulation::Locking),
    ];
}

/// Whether a client with the given user agent needs `emulation`.
pub fn user_agent_needs(user_agent: &str, emulation: Emulation) -> bool {
    USER_AGENT_EMULATIONS
        .iter()
        .any(|&(ref rx, e)| e == emulation && rx.is_match(user_agent))
}

/// Facts about a request that activation rules are evaluated against.
///
/// Built once before any plugin runs. The only later change is at the
/// post-authentication checkpoint, which derives a new context carrying the
/// authenticated user instead of mutating this one.
#[derive(Clone, Debug)]
pub struct ActivationContext {
    request_path: String,
    request_method: Method,
    user_agent: String,
    authenticated_user: Option<User>,
    debug_mode_enabled: bool,
    feature_flags: BTreeMap<&'static str, bool>,
}

impl ActivationContext {
    pub fn new(request: &Request, config: &dyn ConfigStore) -> Self {
        let yes = |app_value: String| "yes" == app_value;

        let mut feature_flags = BTreeMap::new();
        feature_flags.insert(
            FLAG_SEND_INVITATIONS,
            yes(config.get_app_value("dav", "sendInvitations", "yes")),
        );
        feature_flags.insert(
            FLAG_CALENDAR_SUBSCRIPTIONS,
            yes(config.get_app_value(
                "dav",
                "allow_calendar_link_subscriptions",
                "yes",
            )),
        );
        feature_flags.insert(
            FLAG_BULK_UPLOAD,
            config.get_system_value_bool("bulkupload.enabled", true),
        );
        feature_flags.insert(
            FLAG_PROFILER,
            config.get_system_value_bool("profiler", false),
        );

        ActivationContext {
            request_path: trim(&request.path).to_owned(),
            request_method: request.method,
            user_agent: request.user_agent().to_owned(),
            authenticated_user: None,
            debug_mode_enabled: config.get_system_value_bool("debug", false),
            feature_flags,
        }
    }

    /// The context as it stands after authentication.
    pub fn authenticated(&self, user: Option<User>) -> Self {
        ActivationContext {
            authenticated_user: user,
            ..self.clone()
        }
    }

    pub fn request_path(&self) -> &str {
        &self.request_path
    }

    pub fn request_method(&self) -> Method {
        self.request_method
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn authenticated_user(&self) -> Option<&User> {
        self.authenticated_user.as_ref()
    }

    pub fn debug_mode_enabled(&self) -> bool {
        self.debug_mode_enabled
    }

    /// Unknown flags read as off.
    pub fn flag(&self, name: &str) -> bool {
        self.feature_flags.get(name).copied().unwrap_or(false)
    }

    pub fn is_for_subtree<S: AsRef<str>>(&self, subtrees: &[S]) -> bool {
        is_request_for_subtree(&self.request_path, subtrees)
    }
}

/// A predicate gating whether a plugin is attached to a request.
#[derive(Clone, Debug)]
pub enum Activation {
    Always,
    /// Only for requests below one of these top-level collections.
    Subtree(Vec<String>),
    /// Only when debug mode is in this state.
    DebugMode(bool),
    /// Only for user agents that need this emulation.
    Emulation(Emulation),
    /// Only when this feature flag is on.
    Flag(&'static str),
    All(Vec<Activation>),
}

impl Activation {
    pub fn subtree(subtrees: &[&str]) -> Self {
        Activation::Subtree(subtrees.iter().map(|&s| s.to_owned()).collect())
    }

    pub fn is_active(&self, cx: &ActivationContext) -> bool {
        match *self {
            Activation::Always => true,
            Activation::Subtree(ref subtrees) => {
                cx.is_for_subtree(subtrees.as_slice())
            }
            Activation::DebugMode(enabled) => {
                enabled == cx.debug_mode_enabled()
            }
            Activation::Emulation(emulation) => {
                user_agent_needs(cx.user_agent(), emulation)
            }
            Activation::Flag(flag) => cx.flag(flag),
            Activation::All(ref all) => all.iter().all(|a| a.is_active(cx)),
        }
    }

    /// Whether this predicate restricts by subtree, which places the plugin
    /// after all global ones.
    pub fn is_subtree_scoped(&self) -> bool {
        match *self {
            Activation::Subtree(_) => true,
            Activation::All(ref all) => all.iter().any(Self::is_subtree_scoped),
            _ => false,
        }
    }
}
