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

//! The dispatch engine: one request in, one response out.
//!
//! Each call to `Server::dispatch` builds its own resource tree and plugin
//! chain, walks the request through the phases, and records the states it
//! passed through. Nothing built for one request is visible to another.

use std::time::{Duration, Instant};

use log::{debug, error, info};

use super::activation::{ActivationContext, FLAG_PROFILER};
use super::auth::AuthChain;
use super::collab::{Services, User};
use super::plugin::{Exchange, Phase, PhaseResult, PluginChain};
use super::registry::{FactoryContext, PluginRegistry};
use super::request::{split_path, Method, Request, Response};
use super::tree::{ResourceTree, Tree};
use super::tree_builder::build_tree;
use crate::support::error::Error;
use crate::support::log_prefix::LogPrefix;
use crate::support::status;
use crate::support::system_config::DavConfig;

/// Compliance classes the engine itself always supports.
static BASE_COMPLIANCE: &[&str] = &["1", "3", "extended-mkcol"];

/// The WebDAV method implementations proper.
///
/// The engine decides whether and when a method runs; what PROPFIND or PUT
/// actually do is up to the executor.
pub trait MethodExecutor: Send + Sync {
    fn execute(&self, ex: &mut Exchange<'_>) -> Result<Response, Error>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchState {
    Received,
    PathResolved,
    Authenticating,
    Authenticated,
    AnonymousAllowed,
    PreMethodPluginsAttached,
    MethodExecuting,
    ResponseReady,
    Sent,
    Faulted,
}

#[derive(Clone, Copy, Debug)]
pub struct Profile {
    pub total: Duration,
    /// `None` if the method never ran.
    pub method: Option<Duration>,
}

/// Everything there is to know about how a request was handled.
#[derive(Debug)]
pub struct Dispatch {
    pub response: Response,
    /// Identifiers of the plugins that were attached, in chain order.
    pub chain: Vec<&'static str>,
    pub states: Vec<DispatchState>,
    pub advisories: Vec<String>,
    pub profile: Option<Profile>,
}

impl Dispatch {
    pub fn final_state(&self) -> Option<DispatchState> {
        self.states.last().copied()
    }
}

pub struct Server {
    services: Services,
    dav: DavConfig,
    registry: PluginRegistry,
    auth: AuthChain,
    executor: Box<dyn MethodExecutor>,
}

impl Server {
    pub fn new(
        services: Services,
        dav: DavConfig,
        registry: PluginRegistry,
        auth: AuthChain,
        executor: Box<dyn MethodExecutor>,
    ) -> Self {
        Server {
            services,
            dav,
            registry,
            auth,
            executor,
        }
    }

    /// A server with the standard plugins and authentication backends.
    pub fn standard(
        services: Services,
        dav: DavConfig,
        executor: Box<dyn MethodExecutor>,
    ) -> Self {
        let auth = AuthChain::standard(dav.public_subtrees.clone());
        Server::new(services, dav, PluginRegistry::standard(), auth, executor)
    }

    pub fn registry_mut(&mut self) -> &mut PluginRegistry {
        &mut self.registry
    }

    pub fn auth_mut(&mut self) -> &mut AuthChain {
        &mut self.auth
    }

    /// Handle one request. Always produces a response.
    pub fn dispatch(&self, request: Request) -> Dispatch {
        let start = Instant::now();
        let log_prefix = LogPrefix::new("dav".to_owned());
        if let Some(ref remote) = request.remote {
            log_prefix.set_remote(remote.clone());
        }
        if !request.user_agent().is_empty() {
            log_prefix.set_user_agent(request.user_agent().to_owned());
        }

        let context = ActivationContext::new(&request, &*self.services.config);
        let mut chain = PluginChain::new();
        self.registry.attach_pre_auth(&context, &mut chain, &log_prefix);

        let mut states = vec![DispatchState::Received];
        let built = build_tree(&self.services, context.debug_mode_enabled());
        let tree = match built {
            Ok(tree) => tree,
            Err(e) => {
                error!("{} Can't build resource tree: {}", log_prefix, e);
                states.push(DispatchState::Faulted);
                return Dispatch {
                    response: Response::from_error(&e),
                    chain: chain.identifiers(),
                    states,
                    advisories: Vec::new(),
                    profile: None,
                };
            }
        };

        let method = request.method;
        let path = context.request_path().to_owned();
        let mut pipeline = Pipeline {
            server: self,
            request,
            tree,
            context,
            chain,
            log_prefix,
            states,
            advisories: Vec::new(),
            method_time: None,
        };

        let response = match pipeline.run() {
            Ok(response) => {
                pipeline.states.push(DispatchState::ResponseReady);
                response
            }
            Err(response) => {
                pipeline.states.push(DispatchState::Faulted);
                response
            }
        };

        let profile = if pipeline.context.flag(FLAG_PROFILER) {
            let profile = Profile {
                total: start.elapsed(),
                method: pipeline.method_time,
            };
            debug!("{} Profile: {:?}", pipeline.log_prefix, profile);
            Some(profile)
        } else {
            None
        };

        info!(
            "{} {} /{} -> {}",
            pipeline.log_prefix, method, path, response.status
        );
        if Some(&DispatchState::ResponseReady) == pipeline.states.last() {
            pipeline.states.push(DispatchState::Sent);
        }

        Dispatch {
            response,
            chain: pipeline.chain.identifiers(),
            states: pipeline.states,
            advisories: pipeline.advisories,
            profile,
        }
    }
}

// A macro rather than a method since a method would borrow all of the
// `Pipeline`, leaving the chain unusable while the exchange exists.
macro_rules! exchange {
    ($this:expr, $response:expr) => {
        Exchange {
            request: &mut $this.request,
            tree: &$this.tree,
            context: &$this.context,
            services: &$this.server.services,
            config: &$this.server.dav,
            log_prefix: &$this.log_prefix,
            response: $response,
            advisories: Vec::new(),
        }
    };
}

/// The request-scoped half of dispatching.
struct Pipeline<'s> {
    server: &'s Server,
    request: Request,
    tree: Tree,
    context: ActivationContext,
    chain: PluginChain,
    log_prefix: LogPrefix,
    states: Vec<DispatchState>,
    advisories: Vec<String>,
    method_time: Option<Duration>,
}

/// `Err` carries the response of a request that faulted.
type PipelineResult = Result<Response, Response>;

/// What path resolution found at the request target.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Target {
    Mapped,
    Unmapped,
    /// Missing, but inside a default collection that post-auth setup may
    /// create. Carries the home collection to reload afterwards.
    AwaitingProvisioning(String),
}

impl Pipeline<'_> {
    fn run(&mut self) -> PipelineResult {
        let mut target = self.resolve(true).map_err(|e| self.fault(e))?;
        self.states.push(DispatchState::PathResolved);

        if let Some(response) = self.phase(Phase::PreAuth, None)? {
            return Ok(response);
        }

        self.states.push(DispatchState::Authenticating);
        let user = self
            .server
            .auth
            .authenticate(&self.request, &self.server.services)
            .map_err(|e| self.fault(e))?;
        self.context = self.context.authenticated(user.clone());
        match user {
            Some(ref user) => {
                self.log_prefix.set_user(user.uid().to_owned());
                self.states.push(DispatchState::Authenticated);
            }
            None => self.states.push(DispatchState::AnonymousAllowed),
        }

        if let Some(response) = self.phase(Phase::Auth, None)? {
            return Ok(response);
        }

        if let Some(ref user) = user {
            self.attach_after_auth(user);
            if let Some(response) = self.phase(Phase::PostAuthSetup, None)?
            {
                return Ok(response);
            }
        }

        if let Target::AwaitingProvisioning(ref home) = target {
            self.tree.reload(home);
            target = self.resolve(false).map_err(|e| self.fault(e))?;
        }

        self.states.push(DispatchState::PreMethodPluginsAttached);
        let response = match self.phase(Phase::PreMethod, None)? {
            Some(response) => response,
            None => self.execute(Target::Mapped == target)?,
        };

        match self.phase(Phase::PostMethod, Some(response))? {
            Some(response) => Ok(response),
            // A hook took the response away without replacing it
            None => Ok(Response::new(status::NO_CONTENT)),
        }
    }

    /// Missing targets are only allowed for OPTIONS and for methods that
    /// create them, the latter only inside an existing collection. With
    /// `allow_pending`, judging a target that provisioning may still create
    /// is put off.
    fn resolve(&mut self, allow_pending: bool) -> Result<Target, Error> {
        let path = self.context.request_path().to_owned();
        match self.tree.admit(&path) {
            Ok(()) | Err(Error::NoStorage) => (),
            Err(e) => return Err(e),
        }

        let found = match self.tree.resolve(&path) {
            Ok(found) => found.is_some(),
            Err(Error::NoStorage) => false,
            Err(e) => return Err(e),
        };
        if found {
            return Ok(Target::Mapped);
        }

        let method = self.request.method;
        if Method::Options == method {
            return Ok(Target::Unmapped);
        }
        if allow_pending {
            if let Some(home) = self.provisioned_home(&path) {
                return Ok(Target::AwaitingProvisioning(home));
            }
        }
        if !method.may_target_unmapped() {
            return Err(Error::NotFound(format!("/{}", path)));
        }

        let segments = split_path(&path);
        let parent = segments[..segments.len().saturating_sub(1)].join("/");
        match self.tree.resolve(&parent) {
            Ok(Some(node)) if node.is_collection() => Ok(Target::Unmapped),
            Ok(_) | Err(Error::NoStorage) => Err(Error::Conflict),
            Err(e) => Err(e),
        }
    }

    /// The home collection to reload if `path` is at or below a user's
    /// default calendar or address book.
    fn provisioned_home(&self, path: &str) -> Option<String> {
        let dav = &self.server.dav;
        match split_path(path)[..] {
            ["calendars", uid, collection, ..]
                if collection == dav.default_calendar =>
            {
                Some(format!("calendars/{}", uid))
            }
            ["addressbooks", "users", uid, collection, ..]
                if collection == dav.default_address_book =>
            {
                Some(format!("addressbooks/users/{}", uid))
            }
            _ => None,
        }
    }

    fn attach_after_auth(&mut self, user: &User) {
        let cx = FactoryContext {
            services: &self.server.services,
            user,
            config: &self.server.dav,
            context: &self.context,
        };
        let failed = self.server.registry.attach_after_auth(
            &cx,
            &mut self.chain,
            &self.log_prefix,
        );
        for (identifier, e) in failed {
            self.advisories
                .push(format!("Plugin {} omitted: {}", identifier, e));
        }
    }

    /// Run one phase of the chain. `response` is what the method produced,
    /// if it has run.
    fn phase(
        &mut self,
        phase: Phase,
        response: Option<Response>,
    ) -> PhaseResult {
        let had_response = response.is_some();
        let mut ex = exchange!(self, response);
        let result = self.chain.run(phase, &mut ex);
        self.advisories.append(&mut ex.advisories);

        match result {
            Ok(None) if had_response => Ok(ex.response),
            other => other,
        }
    }

    fn execute(&mut self, mapped: bool) -> PipelineResult {
        self.states.push(DispatchState::MethodExecuting);
        let start = Instant::now();
        let mut ex = exchange!(self, None);
        let result = self.server.executor.execute(&mut ex);
        self.advisories.append(&mut ex.advisories);
        self.method_time = Some(start.elapsed());

        let mut response = result.map_err(|e| self.fault(e))?;
        if Method::Options == self.request.method
            && response.status.is_success()
        {
            self.advertise(&mut response, mapped);
        }
        Ok(response)
    }

    /// Fill in the `DAV` and `Allow` headers of an OPTIONS response.
    fn advertise(&self, response: &mut Response, mapped: bool) {
        let features = self.chain.features();
        let mut dav: Vec<&str> = BASE_COMPLIANCE.to_vec();
        for &feature in &features {
            if !dav.contains(&feature) {
                dav.push(feature);
            }
        }
        response.headers.set("DAV", dav.join(", "));

        let locking = dav.contains(&"2");
        let allow: Vec<&str> = Method::ALL
            .iter()
            .copied()
            .filter(|&m| {
                if !mapped {
                    Method::Options == m || m.may_target_unmapped()
                } else if matches!(m, Method::Lock | Method::Unlock) {
                    locking
                } else {
                    Method::Mkcol != m
                }
            })
            .map(Method::as_str)
            .collect();
        response.headers.set("Allow", allow.join(", "));
    }

    fn fault(&self, e: Error) -> Response {
        if e.status().is_server_error() {
            error!("{} {}", self.log_prefix, e);
        } else {
            debug!("{} {}", self.log_prefix, e);
        }
        Response::from_error(&e)
    }
}
