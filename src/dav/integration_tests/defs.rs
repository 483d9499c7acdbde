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

pub use crate::dav::request::{Method, Request};
pub use crate::dav::server::{Dispatch, DispatchState, Server};
pub use crate::support::status;
pub use crate::test_data::{MemoryExecutor, MemoryWorld};

pub const ALICE_PASSWORD: &str = "hunter2";
pub const BOB_PASSWORD: &str = "swordfish";

/// Two users with a few files each.
pub fn set_up() -> MemoryWorld {
    crate::init_test_log();

    MemoryWorld::new()
        .with_user("alice", ALICE_PASSWORD)
        .with_user("bob", BOB_PASSWORD)
        .with_storage("alice")
        .with_storage("bob")
        .with_file("alice", "notes.txt", 12)
        .with_file("alice", "docs/report.odt", 300)
        .with_file("bob", "todo.txt", 3)
}

pub fn server(world: &MemoryWorld) -> Server {
    Server::standard(
        world.services(),
        world.config().dav,
        Box::new(MemoryExecutor),
    )
}

pub fn basic(uid: &str, password: &str) -> String {
    format!("Basic {}", base64::encode(format!("{}:{}", uid, password)))
}

pub fn as_alice(request: Request) -> Request {
    request.with_header("Authorization", &basic("alice", ALICE_PASSWORD))
}

pub fn as_bob(request: Request) -> Request {
    request.with_header("Authorization", &basic("bob", BOB_PASSWORD))
}

pub fn assert_attached(dispatch: &Dispatch, identifiers: &[&'static str]) {
    for identifier in identifiers {
        assert!(
            dispatch.chain.contains(identifier),
            "{} missing from {:?}",
            identifier,
            dispatch.chain
        );
    }
}

pub fn assert_not_attached(dispatch: &Dispatch, identifiers: &[&'static str]) {
    for identifier in identifiers {
        assert!(
            !dispatch.chain.contains(identifier),
            "{} unexpectedly in {:?}",
            identifier,
            dispatch.chain
        );
    }
}

pub fn assert_status(expected: status::Status, dispatch: &Dispatch) {
    assert_eq!(
        expected, dispatch.response.status,
        "Unexpected response {:?}\nstates: {:?}",
        dispatch.response, dispatch.states
    );
}

pub static CALDAV_PLUGINS: &[&str] = &[
    "caldav",
    "caldav-schedule",
    "caldav-subscriptions",
    "caldav-publish",
];

pub static CARDDAV_PLUGINS: &[&str] = &["carddav"];

pub static AFTER_AUTH_PLUGINS: &[&str] = &[
    "quota",
    "properties",
    "tags",
    "shares",
    "comments",
    "search",
    "bulk-upload",
];
