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

use rayon::prelude::*;

use super::defs::*;

#[test]
fn users_get_their_own_chains() {
    let world = MemoryWorld::new()
        .with_user("alice", ALICE_PASSWORD)
        .with_user("bob", BOB_PASSWORD)
        .with_storage("alice")
        .with_file("alice", "notes.txt", 12);
    let server = server(&world);

    let alice = server
        .dispatch(as_alice(Request::new(Method::Propfind, "files/alice")));
    assert_status(status::MULTI_STATUS, &alice);
    assert_attached(&alice, AFTER_AUTH_PLUGINS);

    let bob = server.dispatch(as_bob(
        Request::new(Method::Propfind, "principals/users/bob")
            .with_header("Depth", "0"),
    ));
    assert_status(status::MULTI_STATUS, &bob);
    assert_not_attached(&bob, &["quota", "bulk-upload"]);
    assert_attached(&bob, &["properties", "tags", "shares", "search"]);
    assert!(bob.advisories.is_empty());

    // Bob has no storage at all
    let bob = server
        .dispatch(as_bob(Request::new(Method::Propfind, "files/bob")));
    assert_status(status::NOT_FOUND, &bob);

    // And alice is unaffected by bob having been served
    let again = server
        .dispatch(as_alice(Request::new(Method::Propfind, "files/alice")));
    assert_eq!(alice.chain, again.chain);
}

#[test]
fn trees_are_not_reused() {
    let world = set_up();
    let server = server(&world);
    let request = || as_alice(Request::new(Method::Propfind, "files/alice"));

    let before = world.lookups();
    server.dispatch(request());
    let first = world.lookups() - before;
    assert!(first > 0);

    server.dispatch(request());
    assert_eq!(2 * first, world.lookups() - before);
}

#[test]
fn changes_are_seen_by_the_next_request() {
    let world = set_up();
    let server = server(&world);

    let dispatch = server.dispatch(as_alice(Request::new(
        Method::Propfind,
        "files/alice/later.txt",
    )));
    assert_status(status::NOT_FOUND, &dispatch);

    server.dispatch(as_alice(
        Request::new(Method::Put, "files/alice/later.txt")
            .with_body(b"now".to_vec()),
    ));

    let dispatch = server.dispatch(as_alice(Request::new(
        Method::Propfind,
        "files/alice/later.txt",
    )));
    assert_status(status::MULTI_STATUS, &dispatch);
}

#[test]
fn concurrent_dispatch() {
    let world = set_up();
    let server = server(&world);

    let dispatches: Vec<(bool, Dispatch)> = (0..64)
        .into_par_iter()
        .map(|i| {
            let is_alice = 0 == i % 2;
            let request = if is_alice {
                as_alice(Request::new(Method::Propfind, "files/alice"))
            } else {
                as_bob(Request::new(Method::Propfind, "files/bob"))
            };
            (is_alice, server.dispatch(request))
        })
        .collect();

    for (is_alice, dispatch) in dispatches {
        assert_status(status::MULTI_STATUS, &dispatch);
        let body = String::from_utf8(dispatch.response.body).unwrap();
        if is_alice {
            assert!(body.contains("/files/alice/notes.txt"));
            assert!(!body.contains("todo.txt"));
        } else {
            assert!(body.contains("/files/bob/todo.txt"));
            assert!(!body.contains("notes.txt"));
        }
    }
}
