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

//! Creates a user's default calendar and address book on first contact.

use log::info;

use crate::dav::plugin::{Exchange, Outcome, Phase, Phases, Plugin};
use crate::support::error::Error;

pub struct CalendarProvisioningPlugin;

impl Plugin for CalendarProvisioningPlugin {
    fn identifier(&self) -> &'static str {
        "calendar-provisioning"
    }

    fn phases(&self) -> Phases {
        Phases::POST_AUTH_SETUP
    }

    fn handle(&mut self, _: Phase, ex: &mut Exchange<'_>) -> Outcome {
        advise(ex, "calendar", provision_calendar(ex))
    }
}

pub struct ContactsProvisioningPlugin;

impl Plugin for ContactsProvisioningPlugin {
    fn identifier(&self) -> &'static str {
        "contacts-provisioning"
    }

    fn phases(&self) -> Phases {
        Phases::POST_AUTH_SETUP
    }

    fn handle(&mut self, _: Phase, ex: &mut Exchange<'_>) -> Outcome {
        advise(ex, "address book", provision_address_book(ex))
    }
}

fn advise(ex: &Exchange<'_>, what: &str, result: Result<(), Error>) -> Outcome {
    match result {
        Ok(()) => Outcome::Continue,
        Err(e) => Outcome::Advisory(format!(
            "Default {} for {} not created: {}",
            what,
            ex.uid().unwrap_or("?"),
            e
        )),
    }
}

fn provision_calendar(ex: &Exchange<'_>) -> Result<(), Error> {
    let user = match ex.context.authenticated_user() {
        Some(user) => user,
        None => return Ok(()),
    };

    let backend = ex.services.backends.calendar_backend()?;
    let principal = user.principal_uri();
    if backend.calendars_for_user(&principal)?.is_empty() {
        let uri = &ex.config.default_calendar;
        backend.create_calendar(&principal, uri, "Personal")?;
        info!("{} Created default calendar {}", ex.log_prefix, uri);
    }
    Ok(())
}

fn provision_address_book(ex: &Exchange<'_>) -> Result<(), Error> {
    let user = match ex.context.authenticated_user() {
        Some(user) => user,
        None => return Ok(()),
    };

    let backend = ex.services.backends.card_backend()?;
    let principal = user.principal_uri();
    if backend.address_books_for_user(&principal)?.is_empty() {
        let uri = &ex.config.default_address_book;
        backend.create_address_book(&principal, uri, "Contacts")?;
        info!("{} Created default address book {}", ex.log_prefix, uri);
    }
    Ok(())
}
