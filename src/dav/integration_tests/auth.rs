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

fn from(remote: &str, mut request: Request) -> Request {
    request.remote = Some(remote.to_owned());
    request
}

#[test]
fn basic_login() {
    let world = set_up();
    let dispatch = server(&world)
        .dispatch(as_alice(Request::new(Method::Propfind, "files/alice")));
    assert_status(status::MULTI_STATUS, &dispatch);
    assert!(dispatch.states.contains(&DispatchState::Authenticated));
    assert_attached(&dispatch, AFTER_AUTH_PLUGINS);
}

#[test]
fn bad_password_is_counted() {
    let world = set_up();
    let dispatch = server(&world).dispatch(from(
        "198.51.100.7",
        Request::new(Method::Propfind, "files/alice")
            .with_header("Authorization", &basic("alice", "wrong")),
    ));
    assert_status(status::UNAUTHORIZED, &dispatch);
    assert_eq!(
        Some(r#"Basic realm="davchain", charset="UTF-8""#),
        dispatch.response.headers.get("WWW-Authenticate")
    );
    assert_eq!(Some(DispatchState::Faulted), dispatch.final_state());
    assert_eq!(1, world.failures("198.51.100.7"));
}

#[test]
fn throttled_remote_is_refused() {
    let world = set_up();
    world.throttle("198.51.100.8");
    let dispatch = server(&world).dispatch(from(
        "198.51.100.8",
        as_alice(Request::new(Method::Propfind, "files/alice")),
    ));
    assert_status(status::UNAUTHORIZED, &dispatch);
}

#[test]
fn second_factor_blocks_basic_login() {
    let world = set_up().with_second_factor("alice");
    let dispatch = server(&world)
        .dispatch(as_alice(Request::new(Method::Propfind, "files/alice")));
    assert_status(status::UNAUTHORIZED, &dispatch);
}

#[test]
fn bearer_token_login() {
    let world = set_up().with_token("tok-123", "alice");
    let server = server(&world);

    let dispatch = server.dispatch(
        Request::new(Method::Propfind, "files/alice")
            .with_header("Authorization", "Bearer tok-123"),
    );
    assert_status(status::MULTI_STATUS, &dispatch);

    let dispatch = server.dispatch(
        Request::new(Method::Propfind, "files/alice")
            .with_header("Authorization", "Bearer tok-456"),
    );
    assert_status(status::UNAUTHORIZED, &dispatch);
}

#[test]
fn anonymous_request_skips_checkpoint() {
    let world = set_up();
    let dispatch =
        server(&world).dispatch(Request::new(Method::Options, "files/alice"));
    assert_status(status::OK, &dispatch);
    assert!(dispatch.states.contains(&DispatchState::AnonymousAllowed));
    assert_not_attached(&dispatch, AFTER_AUTH_PLUGINS);
    assert_eq!(vec!["acl", "dummy-get", "compression"], dispatch.chain);
}

#[test]
fn anonymous_access_to_public_calendar() {
    let world = set_up().with_published_calendar("holidays");
    let server = server(&world);

    let dispatch = server
        .dispatch(Request::new(Method::Get, "public-calendars/holidays"));
    assert_status(status::OK, &dispatch);
    assert!(dispatch.states.contains(&DispatchState::AnonymousAllowed));
    assert_not_attached(&dispatch, AFTER_AUTH_PLUGINS);

    let dispatch = server
        .dispatch(Request::new(Method::Put, "public-calendars/holidays/x.ics"));
    assert_status(status::FORBIDDEN, &dispatch);

    // Credentials, when given, are still checked
    let dispatch = server.dispatch(
        Request::new(Method::Get, "public-calendars/holidays")
            .with_header("Authorization", &basic("alice", "wrong")),
    );
    assert_status(status::UNAUTHORIZED, &dispatch);
}

#[test]
fn other_users_files_are_forbidden() {
    let world = set_up();
    let server = server(&world);

    let dispatch =
        server.dispatch(as_alice(Request::new(Method::Propfind, "files/bob")));
    assert_status(status::FORBIDDEN, &dispatch);

    let dispatch = server.dispatch(as_alice(
        Request::new(Method::Move, "files/alice/notes.txt")
            .with_header("Destination", "/remote.php/dav/files/bob/notes.txt"),
    ));
    assert_status(status::FORBIDDEN, &dispatch);
}
