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

use super::defs::*;

const EVENT: &str = "BEGIN:VCALENDAR\r\n\
                     BEGIN:VEVENT\r\n\
                     UID:1234\r\n\
                     ORGANIZER:mailto:alice@example.com\r\n\
                     ATTENDEE:mailto:bob@example.com\r\n\
                     END:VEVENT\r\n\
                     END:VCALENDAR\r\n";

fn put_event(world: &MemoryWorld, content_type: &str) -> Dispatch {
    server(world).dispatch(as_alice(
        Request::new(Method::Put, "calendars/alice/work/meeting.ics")
            .with_header("Content-Type", content_type)
            .with_body(EVENT.as_bytes().to_vec()),
    ))
}

fn groupware_world() -> MemoryWorld {
    set_up().with_calendar("alice", "work", &["standup.ics"])
}

#[test]
fn calendar_objects_must_be_icalendar() {
    let world = groupware_world();
    let dispatch = put_event(&world, "text/plain");
    assert_status(status::UNSUPPORTED_MEDIA_TYPE, &dispatch);
    assert!(!dispatch.states.contains(&DispatchState::MethodExecuting));
}

#[test]
fn invitations_are_announced() {
    let world = groupware_world();
    let dispatch = put_event(&world, "text/calendar; charset=utf-8");
    assert_status(status::CREATED, &dispatch);
    assert_attached(&dispatch, CALDAV_PLUGINS);
    assert_eq!(
        Some("imip"),
        dispatch.response.headers.get("X-Invitations")
    );
    assert!(dispatch
        .advisories
        .iter()
        .any(|a| a.contains("calendars/alice/work/meeting.ics")));
}

#[test]
fn invitations_can_be_disabled() {
    let world =
        groupware_world().with_app_value("dav", "sendInvitations", "no");
    let dispatch = put_event(&world, "text/calendar");
    assert_status(status::CREATED, &dispatch);
    assert_attached(&dispatch, &["caldav-schedule"]);
    assert_eq!(None, dispatch.response.headers.get("X-Invitations"));
}

#[test]
fn default_collections_are_provisioned() {
    let world = set_up();
    let server = server(&world);

    let dispatch = server
        .dispatch(as_alice(Request::new(Method::Propfind, "calendars/alice")));
    assert_status(status::MULTI_STATUS, &dispatch);
    assert_attached(&dispatch, &["calendar-provisioning"]);
    assert_not_attached(&dispatch, &["contacts-provisioning"]);
    assert_eq!(
        vec![(
            "principals/users/alice".to_owned(),
            "personal".to_owned()
        )],
        world.created_calendars()
    );
    // The method already sees the new calendar
    let body = String::from_utf8(dispatch.response.body).unwrap();
    assert!(body.contains("/calendars/alice/personal"), "{}", body);

    // Only once
    server
        .dispatch(as_alice(Request::new(Method::Propfind, "calendars/alice")));
    assert_eq!(1, world.created_calendars().len());

    let dispatch = server.dispatch(as_alice(Request::new(
        Method::Propfind,
        "addressbooks/users/alice",
    )));
    assert_status(status::MULTI_STATUS, &dispatch);
    assert_eq!(
        vec![(
            "principals/users/alice".to_owned(),
            "contacts".to_owned()
        )],
        world.created_address_books()
    );
}

#[test]
fn default_collections_can_be_addressed_on_first_contact() {
    let world = set_up();
    let server = server(&world);

    let dispatch = server.dispatch(as_alice(Request::new(
        Method::Propfind,
        "calendars/alice/personal",
    )));
    assert_status(status::MULTI_STATUS, &dispatch);
    assert_eq!(
        vec![(
            "principals/users/alice".to_owned(),
            "personal".to_owned()
        )],
        world.created_calendars()
    );

    let dispatch = server.dispatch(as_alice(Request::new(
        Method::Propfind,
        "calendars/alice/personal",
    )));
    assert_status(status::MULTI_STATUS, &dispatch);
    assert_eq!(1, world.created_calendars().len());

    let dispatch = server.dispatch(as_alice(Request::new(
        Method::Propfind,
        "addressbooks/users/alice/contacts",
    )));
    assert_status(status::MULTI_STATUS, &dispatch);
    assert_eq!(1, world.created_address_books().len());
}

#[test]
fn other_missing_calendars_are_not_found() {
    let world = set_up();
    let server = server(&world);

    let dispatch = server.dispatch(as_alice(Request::new(
        Method::Propfind,
        "calendars/alice/holidays",
    )));
    assert_status(status::NOT_FOUND, &dispatch);

    // Nothing is provisioned for anonymous requests
    let dispatch = server.dispatch(Request::new(
        Method::Propfind,
        "calendars/alice/personal",
    ));
    assert_status(status::UNAUTHORIZED, &dispatch);
}

#[test]
fn file_requests_are_not_provisioned() {
    let world = set_up();
    server(&world)
        .dispatch(as_alice(Request::new(Method::Propfind, "files/alice")));
    assert!(world.created_calendars().is_empty());
    assert!(world.created_address_books().is_empty());
}

#[test]
fn principal_requests_provision_both() {
    let world = set_up();
    let dispatch = server(&world).dispatch(as_alice(
        Request::new(Method::Propfind, "principals/users/alice")
            .with_header("Depth", "0"),
    ));
    assert_status(status::MULTI_STATUS, &dispatch);
    assert_attached(&dispatch, CALDAV_PLUGINS);
    assert_attached(&dispatch, CARDDAV_PLUGINS);
    assert_eq!(1, world.created_calendars().len());
    assert_eq!(1, world.created_address_books().len());
}

#[test]
fn vcards() {
    let world = set_up().with_address_book("alice", "contacts", &["bob.vcf"]);
    let server = server(&world);

    let put = |content_type: &str| {
        server.dispatch(as_alice(
            Request::new(Method::Put, "addressbooks/users/alice/contacts/c.vcf")
                .with_header("Content-Type", content_type)
                .with_body(b"BEGIN:VCARD\r\nEND:VCARD\r\n".to_vec()),
        ))
    };

    let dispatch = put("text/vcard");
    assert_status(status::CREATED, &dispatch);
    assert_attached(&dispatch, CARDDAV_PLUGINS);
    assert_not_attached(&dispatch, CALDAV_PLUGINS);

    assert_status(status::CREATED, &put("text/x-vcard"));
    assert_status(status::UNSUPPORTED_MEDIA_TYPE, &put("text/calendar"));
}

#[test]
fn other_users_calendars_are_forbidden() {
    let world = groupware_world();
    let dispatch = server(&world).dispatch(as_bob(Request::new(
        Method::Propfind,
        "calendars/alice/work",
    )));
    assert_status(status::FORBIDDEN, &dispatch);
}
