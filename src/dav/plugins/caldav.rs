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

//! CalDAV plugins, attached for calendar-related subtrees only.

use crate::dav::activation::FLAG_SEND_INVITATIONS;
use crate::dav::plugin::{Exchange, Outcome, Phase, Phases, Plugin};
use crate::dav::request::{split_path, Method, Request};
use crate::support::error::Error;

/// Core calendar access. Guards what may be stored as a calendar object.
pub struct CalDavPlugin;

impl Plugin for CalDavPlugin {
    fn identifier(&self) -> &'static str {
        "caldav"
    }

    fn phases(&self) -> Phases {
        Phases::PRE_METHOD
    }

    fn features(&self) -> &'static [&'static str] {
        &["calendar-access", "calendar-proxy"]
    }

    fn handle(&mut self, _: Phase, ex: &mut Exchange<'_>) -> Outcome {
        if Method::Put != ex.request.method
            || !is_calendar_object(&ex.request.path)
        {
            return Outcome::Continue;
        }

        if has_content_type(&ex.request, &["text/calendar"]) {
            Outcome::Continue
        } else {
            Outcome::fault(Error::UnsupportedMediaType(
                "calendar objects must be text/calendar".to_owned(),
            ))
        }
    }
}

/// Implicit scheduling. Invitations for stored events are mailed out by the
/// hosting application; this only announces that it will do so.
pub struct SchedulePlugin;

impl Plugin for SchedulePlugin {
    fn identifier(&self) -> &'static str {
        "caldav-schedule"
    }

    fn phases(&self) -> Phases {
        Phases::POST_METHOD
    }

    fn features(&self) -> &'static [&'static str] {
        &["calendar-auto-schedule"]
    }

    fn handle(&mut self, _: Phase, ex: &mut Exchange<'_>) -> Outcome {
        if Method::Put != ex.request.method
            || !ex.succeeded()
            || !ex.context.flag(FLAG_SEND_INVITATIONS)
            || !is_calendar_object(&ex.request.path)
            || !contains(&ex.request.body, b"\nATTENDEE")
        {
            return Outcome::Continue;
        }

        if let Some(ref mut response) = ex.response {
            response.headers.set("X-Invitations", "imip");
        }
        Outcome::Advisory(format!(
            "Invitations queued for /{}",
            ex.context.request_path()
        ))
    }
}

/// Subscriptions to external calendars by link.
///
/// Advertisement only: subscriptions are stored by the calendar backend
/// through ordinary requests, so the plugin joins no phase and exists to put
/// `calendarserver-subscribed` into OPTIONS.
pub struct SubscriptionsPlugin;

impl Plugin for SubscriptionsPlugin {
    fn identifier(&self) -> &'static str {
        "caldav-subscriptions"
    }

    fn phases(&self) -> Phases {
        Phases::empty()
    }

    fn features(&self) -> &'static [&'static str] {
        &["calendarserver-subscribed"]
    }

    fn handle(&mut self, _: Phase, _: &mut Exchange<'_>) -> Outcome {
        Outcome::Continue
    }
}

/// Publishing calendars under `public-calendars`.
///
/// Advertisement only: published calendars are served from the tree's
/// `public-calendars` collection, so the plugin joins no phase and exists to
/// put `calendarserver-sharing` into OPTIONS.
pub struct PublishPlugin;

impl Plugin for PublishPlugin {
    fn identifier(&self) -> &'static str {
        "caldav-publish"
    }

    fn phases(&self) -> Phases {
        Phases::empty()
    }

    fn features(&self) -> &'static [&'static str] {
        &["calendarserver-sharing"]
    }

    fn handle(&mut self, _: Phase, _: &mut Exchange<'_>) -> Outcome {
        Outcome::Continue
    }
}

/// `calendars/<uid>/<calendar>/<object>`
fn is_calendar_object(path: &str) -> bool {
    let segments = split_path(path);
    4 == segments.len() && "calendars" == segments[0]
}

/// Whether the request body is declared as one of `acceptable` media types.
pub(super) fn has_content_type(request: &Request, acceptable: &[&str]) -> bool {
    let content_type = match request.headers.get("Content-Type") {
        Some(ct) => ct,
        None => return false,
    };
    let media_type = content_type.split(';').next().unwrap_or("").trim();
    acceptable
        .iter()
        .any(|acceptable| acceptable.eq_ignore_ascii_case(media_type))
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
