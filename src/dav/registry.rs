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

//! Which plugins exist, and when each one is attached to a request.
//!
//! Plugins themselves are per request. The registry holds the rules for
//! making them: an `Activation` predicate plus a factory. Rules registered
//! with `register` produce their plugin before authentication; those
//! registered with `register_after_auth` produce it at the post-auth
//! checkpoint, and only for authenticated requests.

use log::{debug, warn};

use super::activation::{
    Activation, ActivationContext, Emulation, CALDAV_SUBTREES,
    CARDDAV_SUBTREES, FLAG_BULK_UPLOAD, FLAG_CALENDAR_SUBSCRIPTIONS,
};
use super::collab::{Services, User};
use super::plugin::{Plugin, PluginChain, Tier};
use super::plugins::{
    acl::AclPlugin,
    browser::{BrowserPlugin, DummyGetPlugin},
    bulk_upload::BulkUploadPlugin,
    caldav::{CalDavPlugin, PublishPlugin, SchedulePlugin, SubscriptionsPlugin},
    carddav::CardDavPlugin,
    chunking::ChunkingPlugin,
    comments::CommentsPlugin,
    compression::CompressionPlugin,
    fake_lock::FakeLockPlugin,
    properties::PropertiesPlugin,
    provisioning::{CalendarProvisioningPlugin, ContactsProvisioningPlugin},
    quota::QuotaPlugin,
    search::SearchPlugin,
    shares::SharesPlugin,
    tags::TagsPlugin,
};
use crate::support::error::Error;
use crate::support::log_prefix::LogPrefix;
use crate::support::system_config::DavConfig;

/// What an after-auth factory gets to work with.
pub struct FactoryContext<'a> {
    pub services: &'a Services,
    pub user: &'a User,
    pub config: &'a DavConfig,
    pub context: &'a ActivationContext,
}

type Construct = Box<dyn Fn() -> Box<dyn Plugin> + Send + Sync>;

/// `Ok(None)` means the plugin does not apply to this user; `Err` means it
/// should have, but could not be built.
type AfterAuthConstruct = Box<
    dyn Fn(&FactoryContext<'_>) -> AfterAuthResult + Send + Sync,
>;

type AfterAuthResult = Result<Option<Box<dyn Plugin>>, Error>;

enum Factory {
    PreAuth(Construct),
    AfterAuth(AfterAuthConstruct),
}

struct Rule {
    identifier: &'static str,
    tier: Tier,
    activation: Activation,
    factory: Factory,
}

#[derive(Default)]
pub struct PluginRegistry {
    rules: Vec<Rule>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full set of plugins, each gated the way the server expects.
    pub fn standard() -> Self {
        let mut this = Self::new();

        this.register_always("acl", || Box::new(AclPlugin));
        this.register("browser", Activation::DebugMode(true), || {
            Box::new(BrowserPlugin)
        });
        this.register("dummy-get", Activation::DebugMode(false), || {
            Box::new(DummyGetPlugin)
        });
        this.register(
            "fake-lock",
            Activation::Emulation(Emulation::Locking),
            || Box::new(FakeLockPlugin),
        );
        this.register_always("compression", || Box::new(CompressionPlugin));

        this.register_for_subtree("caldav", CALDAV_SUBTREES, || {
            Box::new(CalDavPlugin)
        });
        this.register_for_subtree("caldav-schedule", CALDAV_SUBTREES, || {
            Box::new(SchedulePlugin)
        });
        this.register(
            "caldav-subscriptions",
            Activation::All(vec![
                Activation::subtree(CALDAV_SUBTREES),
                Activation::Flag(FLAG_CALENDAR_SUBSCRIPTIONS),
            ]),
            || Box::new(SubscriptionsPlugin),
        );
        this.register_for_subtree("caldav-publish", CALDAV_SUBTREES, || {
            Box::new(PublishPlugin)
        });
        this.register_for_subtree("carddav", CARDDAV_SUBTREES, || {
            Box::new(CardDavPlugin)
        });
        this.register_for_subtree("chunking", &["uploads"], || {
            Box::new(ChunkingPlugin)
        });

        this.register_after_auth("quota", Activation::Always, |cx| {
            Ok(QuotaPlugin::for_user(&*cx.services.files, cx.user.uid())?
                .map(|p| Box::new(p) as Box<dyn Plugin>))
        });
        this.register_after_auth("properties", Activation::Always, |_| {
            Ok(Some(Box::new(PropertiesPlugin)))
        });
        this.register_after_auth("tags", Activation::Always, |_| {
            Ok(Some(Box::new(TagsPlugin::new())))
        });
        this.register_after_auth("shares", Activation::Always, |cx| {
            let plugin =
                SharesPlugin::for_user(&*cx.services.shares, cx.user.uid())?;
            Ok(Some(Box::new(plugin)))
        });
        this.register_after_auth("comments", Activation::Always, |_| {
            Ok(Some(Box::new(CommentsPlugin)))
        });
        this.register_after_auth("search", Activation::Always, |_| {
            Ok(Some(Box::new(SearchPlugin)))
        });
        this.register_after_auth(
            "bulk-upload",
            Activation::Flag(FLAG_BULK_UPLOAD),
            |cx| {
                Ok(BulkUploadPlugin::for_user(
                    &*cx.services.files,
                    cx.user.uid(),
                )?
                .map(|p| Box::new(p) as Box<dyn Plugin>))
            },
        );
        this.register_after_auth(
            "calendar-provisioning",
            Activation::subtree(CALDAV_SUBTREES),
            |_| Ok(Some(Box::new(CalendarProvisioningPlugin))),
        );
        this.register_after_auth(
            "contacts-provisioning",
            Activation::subtree(CARDDAV_SUBTREES),
            |_| Ok(Some(Box::new(ContactsProvisioningPlugin))),
        );

        this
    }

    /// Register a plugin attached before authentication whenever
    /// `activation` holds. Subtree-scoped plugins go after all global ones.
    pub fn register(
        &mut self,
        identifier: &'static str,
        activation: Activation,
        factory: impl Fn() -> Box<dyn Plugin> + Send + Sync + 'static,
    ) {
        let tier = if activation.is_subtree_scoped() {
            Tier::Subtree
        } else {
            Tier::Global
        };
        self.push(Rule {
            identifier,
            tier,
            activation,
            factory: Factory::PreAuth(Box::new(factory)),
        });
    }

    pub fn register_always(
        &mut self,
        identifier: &'static str,
        factory: impl Fn() -> Box<dyn Plugin> + Send + Sync + 'static,
    ) {
        self.register(identifier, Activation::Always, factory);
    }

    pub fn register_for_subtree(
        &mut self,
        identifier: &'static str,
        subtrees: &[&str],
        factory: impl Fn() -> Box<dyn Plugin> + Send + Sync + 'static,
    ) {
        self.register(identifier, Activation::subtree(subtrees), factory);
    }

    /// Register a plugin built at the post-auth checkpoint, for
    /// authenticated requests where `activation` holds.
    pub fn register_after_auth(
        &mut self,
        identifier: &'static str,
        activation: Activation,
        factory: impl Fn(&FactoryContext<'_>) -> AfterAuthResult
            + Send
            + Sync
            + 'static,
    ) {
        self.push(Rule {
            identifier,
            tier: Tier::AfterAuth,
            activation,
            factory: Factory::AfterAuth(Box::new(factory)),
        });
    }

    fn push(&mut self, rule: Rule) {
        // A later registration replaces an earlier one of the same name
        self.unregister(rule.identifier);
        self.rules.push(rule);
    }

    /// Forget the rule for `identifier`. Returns whether there was one.
    pub fn unregister(&mut self, identifier: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.identifier != identifier);
        before != self.rules.len()
    }

    /// Registered identifiers, in registration order.
    pub fn identifiers(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.identifier).collect()
    }

    /// Attach every pre-authentication plugin active for `cx`.
    pub fn attach_pre_auth(
        &self,
        cx: &ActivationContext,
        chain: &mut PluginChain,
        log_prefix: &LogPrefix,
    ) {
        for rule in &self.rules {
            let construct = match rule.factory {
                Factory::PreAuth(ref construct) => construct,
                Factory::AfterAuth(_) => continue,
            };

            if rule.activation.is_active(cx) {
                attach(chain, rule, construct(), log_prefix);
            }
        }
    }

    /// Build and attach the after-auth plugins active for `cx.context`.
    ///
    /// A factory failing only costs its own plugin. The identifiers of
    /// plugins that failed are returned so the caller can report them.
    pub fn attach_after_auth(
        &self,
        cx: &FactoryContext<'_>,
        chain: &mut PluginChain,
        log_prefix: &LogPrefix,
    ) -> Vec<(&'static str, Error)> {
        let mut failed = Vec::new();
        for rule in &self.rules {
            let construct = match rule.factory {
                Factory::AfterAuth(ref construct) => construct,
                Factory::PreAuth(_) => continue,
            };

            if !rule.activation.is_active(cx.context) {
                continue;
            }

            match construct(cx) {
                Ok(Some(plugin)) => attach(chain, rule, plugin, log_prefix),
                Ok(None) => debug!(
                    "{} Plugin {} does not apply",
                    log_prefix, rule.identifier
                ),
                Err(e) => {
                    warn!(
                        "{} Plugin {} unavailable: {}",
                        log_prefix, rule.identifier, e
                    );
                    failed.push((rule.identifier, e));
                }
            }
        }
        failed
    }
}

fn attach(
    chain: &mut PluginChain,
    rule: &Rule,
    plugin: Box<dyn Plugin>,
    log_prefix: &LogPrefix,
) {
    if plugin.identifier() != rule.identifier {
        warn!(
            "{} Rule {} produced plugin {}",
            log_prefix,
            rule.identifier,
            plugin.identifier()
        );
    }

    if !chain.attach(rule.tier, plugin) {
        warn!(
            "{} Plugin {} already attached",
            log_prefix, rule.identifier
        );
    }
}
