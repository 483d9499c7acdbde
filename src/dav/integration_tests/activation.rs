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

use proptest::prelude::*;

use super::defs::*;

#[test]
fn carddav_path_under_principals() {
    let world = set_up();
    let server = server(&world);

    // Not a real collection, but activation only looks at the path
    let dispatch = server.dispatch(as_alice(Request::new(
        Method::Propfind,
        "addressbooks/principals/users/alice",
    )));
    assert_status(status::NOT_FOUND, &dispatch);
    assert_attached(&dispatch, CARDDAV_PLUGINS);
    assert_not_attached(&dispatch, CALDAV_PLUGINS);

    let dispatch = server
        .dispatch(as_alice(Request::new(Method::Propfind, "principals/users")));
    assert_status(status::METHOD_NOT_ALLOWED, &dispatch);

    let dispatch = server.dispatch(as_alice(
        Request::new(Method::Propfind, "principals/users/alice")
            .with_header("Depth", "0"),
    ));
    assert_status(status::MULTI_STATUS, &dispatch);
}

#[test]
fn principal_listing_in_debug_mode() {
    let world = set_up().with_system_value("debug", true);
    let dispatch = server(&world)
        .dispatch(as_alice(Request::new(Method::Propfind, "principals/users")));
    assert_status(status::MULTI_STATUS, &dispatch);
    let body = String::from_utf8(dispatch.response.body).unwrap();
    assert!(body.contains("/principals/users/bob"));
}

#[test]
fn legacy_windows_client_gets_fake_locks() {
    let world = set_up();
    let server = server(&world);

    for path in &["files/alice/notes.txt", "calendars/alice", ""] {
        let dispatch = server.dispatch(
            Request::new(Method::Options, *path).with_header(
                "User-Agent",
                "Microsoft-WebDAV-MiniRedir/6.1.7601",
            ),
        );
        assert_attached(&dispatch, &["fake-lock"]);
    }

    let dispatch = server.dispatch(as_alice(
        Request::new(Method::Lock, "files/alice/notes.txt")
            .with_header("User-Agent", "Microsoft-WebDAV-MiniRedir/6.1.7601"),
    ));
    assert_status(status::OK, &dispatch);
    assert!(dispatch.response.headers.contains("Lock-Token"));
    assert_eq!(1, dispatch.advisories.len());
    assert!(!dispatch.states.contains(&DispatchState::MethodExecuting));
}

#[test]
fn lock_without_emulation_reaches_the_method() {
    let world = set_up();
    let dispatch = server(&world).dispatch(as_alice(
        Request::new(Method::Lock, "files/alice/notes.txt")
            .with_header("User-Agent", "Mozilla/5.0"),
    ));
    assert_not_attached(&dispatch, &["fake-lock"]);
    assert!(dispatch.states.contains(&DispatchState::MethodExecuting));
}

#[test]
fn browser_and_dummy_get_are_exclusive() {
    for &debug in &[false, true] {
        let world = set_up().with_system_value("debug", debug);
        let dispatch = server(&world)
            .dispatch(as_alice(Request::new(Method::Get, "files/alice/docs")));
        assert_status(status::OK, &dispatch);

        let browser = dispatch.chain.contains(&"browser");
        let dummy = dispatch.chain.contains(&"dummy-get");
        assert_eq!(debug, browser);
        assert_eq!(!debug, dummy);

        let content_type =
            dispatch.response.headers.get("Content-Type").unwrap();
        if debug {
            assert!(content_type.starts_with("text/html"));
        } else {
            assert_eq!("text/plain", content_type);
        }
    }
}

#[test]
fn tiers_are_ordered() {
    let world = set_up();
    let dispatch = server(&world).dispatch(as_alice(Request::new(
        Method::Propfind,
        "calendars/alice/",
    )));

    let position = |id: &str| {
        dispatch
            .chain
            .iter()
            .position(|&c| c == id)
            .unwrap_or_else(|| panic!("{} not in {:?}", id, dispatch.chain))
    };
    assert!(position("acl") < position("compression"));
    assert!(position("compression") < position("caldav"));
    assert!(position("caldav-publish") < position("quota"));
    assert!(position("quota") < position("calendar-provisioning"));
}

fn user_agent() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z0-9/ .;()-]{0,40}",
        "[A-Za-z/ ]{0,10}".prop_map(|s| format!("{}WebDAVFS/3.0", s)),
        "[A-Za-z/ ]{0,10}"
            .prop_map(|s| format!("Microsoft Office {}OneNote", s)),
        "[A-Za-z0-9/ .]{0,10}"
            .prop_map(|s| format!("Microsoft-WebDAV-MiniRedir{}", s)),
        "[A-Za-z/ ]{1,10}".prop_map(|s| format!("{}Microsoft-WebDAV", s)),
    ]
}

fn top_level() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("calendars".to_owned()),
        Just("public-calendars".to_owned()),
        Just("system-calendars".to_owned()),
        Just("principals".to_owned()),
        Just("addressbooks".to_owned()),
        Just("files".to_owned()),
        Just("uploads".to_owned()),
        Just("calendars-old".to_owned()),
        "[a-z-]{1,12}",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn fake_lock_follows_user_agent(ua in user_agent()) {
        let world = set_up();
        let dispatch = server(&world).dispatch(
            Request::new(Method::Options, "files/alice")
                .with_header("User-Agent", &ua),
        );

        let expected = ua.contains("WebDAVFS")
            || ua.contains("OneNote")
            || ua.starts_with("Microsoft-WebDAV");
        prop_assert_eq!(expected, dispatch.chain.contains(&"fake-lock"));
    }

    #[test]
    fn plugins_stay_in_their_subtree(
        first in top_level(),
        rest in "[a-z]{1,8}(/[a-z]{1,8}){0,2}",
    ) {
        let world = set_up();
        let path = format!("{}/{}", first, rest);
        let dispatch = server(&world)
            .dispatch(Request::new(Method::Options, path.as_str()));

        let caldav = ["calendars", "public-calendars", "system-calendars",
                      "principals"].contains(&first.as_str());
        let carddav = ["addressbooks", "principals"].contains(&first.as_str());
        for &id in CALDAV_PLUGINS {
            prop_assert_eq!(caldav, dispatch.chain.contains(&id), "{}", id);
        }
        for &id in CARDDAV_PLUGINS {
            prop_assert_eq!(carddav, dispatch.chain.contains(&id), "{}", id);
        }
        prop_assert_eq!(
            "uploads" == first,
            dispatch.chain.contains(&"chunking")
        );
    }
}
