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

use bitflags::bitflags;
use log::info;

use super::activation::ActivationContext;
use super::collab::Services;
use super::request::{split_path, Request, Response};
use super::tree::ResourceTree;
use crate::support::error::Error;
use crate::support::log_prefix::LogPrefix;
use crate::support::system_config::DavConfig;

/// The points in request processing at which plugins are invoked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// After path resolution, before any credentials are checked.
    PreAuth,
    /// Right after the authentication backends have decided.
    Auth,
    /// Once per request, after the after-auth plugins have been attached.
    /// Only reached by authenticated requests.
    PostAuthSetup,
    /// Before the method is executed. Producing a response here means the
    /// method is never executed.
    PreMethod,
    /// After a response exists, to annotate or rewrite it.
    PostMethod,
}

bitflags! {
    pub struct Phases: u8 {
        const PRE_AUTH = 1 << 0;
        const AUTH = 1 << 1;
        const POST_AUTH_SETUP = 1 << 2;
        const PRE_METHOD = 1 << 3;
        const POST_METHOD = 1 << 4;
    }
}

impl Phase {
    fn flag(self) -> Phases {
        match self {
            Phase::PreAuth => Phases::PRE_AUTH,
            Phase::Auth => Phases::AUTH,
            Phase::PostAuthSetup => Phases::POST_AUTH_SETUP,
            Phase::PreMethod => Phases::PRE_METHOD,
            Phase::PostMethod => Phases::POST_METHOD,
        }
    }
}

/// What a plugin decided at a phase.
#[derive(Debug)]
pub enum Outcome {
    /// Nothing to say; let the next plugin run.
    Continue,
    /// Finish the request with this response.
    Respond(Response),
    /// Protocol-level failure; the request ends with this response.
    Fault(Response),
    /// Something benign but worth noting. Processing carries on.
    Advisory(String),
}

impl Outcome {
    pub fn fault(error: Error) -> Self {
        Outcome::Fault(Response::from_error(&error))
    }
}

/// Everything a plugin can see and touch while handling a request.
pub struct Exchange<'a> {
    pub request: &'a mut Request,
    pub tree: &'a dyn ResourceTree,
    pub context: &'a ActivationContext,
    pub services: &'a Services,
    pub config: &'a DavConfig,
    pub log_prefix: &'a LogPrefix,
    /// Set once the method has produced a response; this is what
    /// `PostMethod` hooks work on.
    pub response: Option<Response>,
    pub advisories: Vec<String>,
}

impl Exchange<'_> {
    /// The uid of the authenticated user, if any.
    pub fn uid(&self) -> Option<&str> {
        self.context.authenticated_user().map(|u| u.uid())
    }

    /// If the request path is inside the authenticated user's home under
    /// `subtree`, the path relative to that home (possibly empty).
    pub fn owned_path(&self, subtree: &str) -> Option<String> {
        owned_path(&self.request.path, subtree, self.uid()?)
    }

    /// Like `owned_path`, but for the `Destination` of a MOVE or COPY.
    pub fn owned_destination(&self, subtree: &str) -> Option<String> {
        owned_path(&self.destination()?, subtree, self.uid()?)
    }

    /// The `Destination` header as a path relative to the DAV endpoint.
    pub fn destination(&self) -> Option<String> {
        let destination = self.request.headers.get("Destination")?;
        // Absolute URI: drop scheme and authority
        let path = match destination.find("://") {
            Some(scheme_end) => {
                let rest = &destination[scheme_end + 3..];
                &rest[rest.find('/')?..]
            }
            None => destination,
        };

        let base = self.config.base_uri.trim_end_matches('/');
        let relative = path.strip_prefix(base)?;
        if !relative.is_empty() && !relative.starts_with('/') {
            return None;
        }
        Some(split_path(relative).join("/"))
    }

    /// Whether the response produced so far is a success.
    pub fn succeeded(&self) -> bool {
        self.response
            .as_ref()
            .map_or(false, |r| r.status.is_success())
    }
}

fn owned_path(path: &str, subtree: &str, uid: &str) -> Option<String> {
    let segments = split_path(path);
    let prefix = split_path(subtree);
    if segments.len() > prefix.len()
        && segments[..prefix.len()] == prefix[..]
        && segments[prefix.len()] == uid
    {
        Some(segments[prefix.len() + 1..].join("/"))
    } else {
        None
    }
}

pub trait Plugin {
    /// Unique per request; a second plugin with the same identifier is not
    /// attached.
    fn identifier(&self) -> &'static str;

    /// The phases this plugin wants to be called for.
    fn phases(&self) -> Phases;

    /// Compliance classes advertised in the `DAV` header.
    fn features(&self) -> &'static [&'static str] {
        &[]
    }

    fn handle(&mut self, phase: Phase, ex: &mut Exchange<'_>) -> Outcome;
}

/// Where a plugin sits in the chain. Tiers run in order; within a tier,
/// plugins run in the order they were attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Global,
    Subtree,
    AfterAuth,
}

/// `Ok(None)` if every plugin let the phase pass, `Ok(Some)` if one
/// responded, `Err` if one faulted.
pub type PhaseResult = Result<Option<Response>, Response>;

/// The effective, ordered plugins of one request.
#[derive(Default)]
pub struct PluginChain {
    entries: Vec<(Tier, Box<dyn Plugin>)>,
}

impl PluginChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `plugin` at the end of `tier`.
    ///
    /// Returns `false` and drops the plugin if one with the same identifier
    /// is already attached.
    pub fn attach(&mut self, tier: Tier, plugin: Box<dyn Plugin>) -> bool {
        if self.contains(plugin.identifier()) {
            return false;
        }

        let position = self
            .entries
            .iter()
            .position(|&(t, _)| t > tier)
            .unwrap_or(self.entries.len());
        self.entries.insert(position, (tier, plugin));
        true
    }

    pub fn remove(&mut self, identifier: &str) -> Option<Box<dyn Plugin>> {
        let position = self
            .entries
            .iter()
            .position(|(_, p)| p.identifier() == identifier)?;
        Some(self.entries.remove(position).1)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.iter().any(|(_, p)| p.identifier() == identifier)
    }

    pub fn identifiers(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(_, p)| p.identifier()).collect()
    }

    /// Compliance classes of all plugins, in chain order, without repeats.
    pub fn features(&self) -> Vec<&'static str> {
        let mut features = Vec::new();
        for feature in self.entries.iter().flat_map(|(_, p)| p.features()) {
            if !features.contains(feature) {
                features.push(*feature);
            }
        }
        features
    }

    /// Run every plugin interested in `phase`, stopping at the first one to
    /// respond or fault.
    pub fn run(&mut self, phase: Phase, ex: &mut Exchange<'_>) -> PhaseResult {
        for (_, plugin) in &mut self.entries {
            if !plugin.phases().contains(phase.flag()) {
                continue;
            }

            match plugin.handle(phase, ex) {
                Outcome::Continue => (),
                Outcome::Advisory(message) => {
                    info!(
                        "{} {} ({:?}): {}",
                        ex.log_prefix,
                        plugin.identifier(),
                        phase,
                        message
                    );
                    ex.advisories.push(message);
                }
                Outcome::Respond(response) => return Ok(Some(response)),
                Outcome::Fault(response) => {
                    info!(
                        "{} {} faulted {:?} with {}",
                        ex.log_prefix,
                        plugin.identifier(),
                        phase,
                        response.status
                    );
                    return Err(response);
                }
            }
        }

        Ok(None)
    }
}
