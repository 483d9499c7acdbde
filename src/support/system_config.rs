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

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::Error;

/// Read-only access to system and per-app configuration values.
///
/// Keys are those of the hosting platform (e.g. `debug`,
/// `bulkupload.enabled`), so the pipeline can be pointed at any store that
/// speaks them.
pub trait ConfigStore: Send + Sync {
    fn get_system_value_bool(&self, key: &str, default: bool) -> bool;
    fn get_app_value(&self, app: &str, key: &str, default: &str) -> String;
}

/// The system-wide configuration for Davchain.
///
/// This is stored in a file named `davchain.toml` under the system root.
#[derive(Clone, Debug, Deserialize, Serialize, Default)]
pub struct SystemConfig {
    /// Boolean system values, such as `debug` or `bulkupload.enabled`.
    #[serde(default)]
    pub system: BTreeMap<String, bool>,

    /// String values scoped to an app. The DAV app reads
    /// `sendInvitations` and `allow_calendar_link_subscriptions` from here,
    /// both of which are `"yes"` unless set otherwise.
    #[serde(default)]
    pub apps: BTreeMap<String, BTreeMap<String, String>>,

    /// Options for the DAV pipeline itself.
    #[serde(default)]
    pub dav: DavConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct DavConfig {
    /// The path under which the DAV endpoint is served. `Destination`
    /// headers are interpreted relative to this.
    pub base_uri: String,

    /// Top-level collections that may be accessed without credentials.
    ///
    /// OPTIONS is always allowed anonymously regardless of this list.
    pub public_subtrees: Vec<String>,

    /// URI of the calendar created for users who have none.
    pub default_calendar: String,

    /// URI of the address book created for users who have none.
    pub default_address_book: String,

    /// PROPFIND and REPORT bodies at least this large are gzipped when the
    /// client accepts it.
    pub compression_threshold: usize,
}

impl Default for DavConfig {
    fn default() -> Self {
        DavConfig {
            base_uri: "/remote.php/dav/".to_owned(),
            public_subtrees: vec![
                "public-calendars".to_owned(),
                "avatars".to_owned(),
            ],
            default_calendar: "personal".to_owned(),
            default_address_book: "contacts".to_owned(),
            compression_threshold: 1024,
        }
    }
}

impl SystemConfig {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let data = fs::read(path)?;
        Ok(toml::from_slice(&data)?)
    }
}

impl ConfigStore for SystemConfig {
    fn get_system_value_bool(&self, key: &str, default: bool) -> bool {
        self.system.get(key).copied().unwrap_or(default)
    }

    fn get_app_value(&self, app: &str, key: &str, default: &str) -> String {
        self.apps
            .get(app)
            .and_then(|values| values.get(key))
            .map(String::clone)
            .unwrap_or_else(|| default.to_owned())
    }
}
