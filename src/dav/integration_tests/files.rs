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
use crate::dav::collab::SharePermissions;

#[test]
fn propfind_lists_home() {
    let world = set_up();
    let dispatch = server(&world)
        .dispatch(as_alice(Request::new(Method::Propfind, "files/alice")));
    assert_status(status::MULTI_STATUS, &dispatch);

    let body = String::from_utf8(dispatch.response.body).unwrap();
    assert!(body.contains("<d:href>/files/alice/notes.txt</d:href>"));
    assert!(body.contains("<d:href>/files/alice/docs</d:href>"));
}

#[test]
fn put_is_indexed() {
    let world = set_up();
    let dispatch = server(&world).dispatch(as_alice(
        Request::new(Method::Put, "files/alice/new.txt")
            .with_body(b"hello".to_vec()),
    ));
    assert_status(status::CREATED, &dispatch);
    assert_eq!(
        vec![("alice".to_owned(), "new.txt".to_owned(), 5)],
        world.written()
    );
    assert_eq!(vec!["alice new.txt".to_owned()], world.dirty());
    assert!(dispatch.advisories.is_empty());
}

#[test]
fn put_into_missing_collection() {
    let world = set_up();
    let dispatch = server(&world).dispatch(as_alice(Request::new(
        Method::Put,
        "files/alice/nowhere/new.txt",
    )));
    assert_status(status::CONFLICT, &dispatch);
    assert!(world.written().is_empty());
}

#[test]
fn quota_exceeded() {
    let world = set_up().with_free_space("alice", 100);
    let server = server(&world);

    let dispatch = server.dispatch(as_alice(
        Request::new(Method::Put, "files/alice/big.bin")
            .with_header("Content-Length", "500"),
    ));
    assert_status(status::INSUFFICIENT_STORAGE, &dispatch);
    assert!(!dispatch.states.contains(&DispatchState::MethodExecuting));
    assert!(world.written().is_empty());

    let dispatch = server.dispatch(as_alice(
        Request::new(Method::Put, "files/alice/small.bin")
            .with_header("Content-Length", "50")
            .with_body(vec![0u8; 50]),
    ));
    assert_status(status::CREATED, &dispatch);
}

#[test]
fn share_mounts_are_protected() {
    let world = set_up()
        .with_file("alice", "Shared/plan.txt", 10)
        .with_share("alice", "Shared", SharePermissions::READ);
    let dispatch = server(&world).dispatch(as_alice(Request::new(
        Method::Delete,
        "files/alice/Shared",
    )));
    assert_status(status::FORBIDDEN, &dispatch);
    assert!(world.property_ops().is_empty());
}

#[test]
fn broken_share_manager_is_isolated() {
    let world = set_up().with_broken_share_manager();
    let dispatch = server(&world).dispatch(as_alice(
        Request::new(Method::Put, "files/alice/new.txt")
            .with_body(b"hello".to_vec()),
    ));
    assert_status(status::CREATED, &dispatch);
    assert_not_attached(&dispatch, &["shares"]);
    assert_attached(&dispatch, &["quota", "properties", "tags", "search"]);
    assert!(
        dispatch.advisories.iter().any(|a| a.contains("shares")),
        "No advisory in {:?}",
        dispatch.advisories
    );
}

#[test]
fn delete_cleans_up_metadata() {
    let world = set_up()
        .with_file_id("alice", "notes.txt", "1001")
        .with_tag("1", &["1001"]);
    let server = server(&world);
    let dispatch = server.dispatch(as_alice(Request::new(
        Method::Propfind,
        "tag-relations/files",
    )));
    let body = String::from_utf8(dispatch.response.body).unwrap();
    assert!(body.contains("/tag-relations/files/1001"), "{}", body);

    let dispatch = server.dispatch(as_alice(Request::new(
        Method::Delete,
        "files/alice/notes.txt",
    )));
    assert_status(status::NO_CONTENT, &dispatch);
    assert_eq!(
        vec!["delete alice notes.txt".to_owned()],
        world.property_ops()
    );
    assert_eq!(vec!["1001".to_owned()], world.untagged());
    assert_eq!(vec!["alice notes.txt".to_owned()], world.dirty());

    let dispatch = server.dispatch(as_alice(Request::new(
        Method::Propfind,
        "tag-relations/files/1001",
    )));
    assert_status(status::NOT_FOUND, &dispatch);
}

#[test]
fn move_needs_a_destination_on_this_server() {
    let world = set_up();
    let server = server(&world);

    let dispatch = server.dispatch(as_alice(
        Request::new(Method::Move, "files/alice/notes.txt").with_header(
            "Destination",
            "https://cloud.example.com/dav/files/bob/notes.txt",
        ),
    ));
    assert_status(status::BAD_REQUEST, &dispatch);

    let dispatch = server.dispatch(as_alice(Request::new(
        Method::Copy,
        "files/alice/notes.txt",
    )));
    assert_status(status::BAD_REQUEST, &dispatch);

    assert!(world.property_ops().is_empty());
    assert!(world.dirty().is_empty());
}

#[test]
fn broken_search_index_is_advisory() {
    let world = set_up().with_broken_search_index();
    let dispatch = server(&world).dispatch(as_alice(Request::new(
        Method::Delete,
        "files/alice/notes.txt",
    )));
    assert_status(status::NO_CONTENT, &dispatch);
    assert_eq!(1, dispatch.advisories.len());
    assert_eq!(Some(DispatchState::Sent), dispatch.final_state());
}

#[test]
fn bulk_upload() {
    let world = set_up();
    let body = "--b1\r\n\
                X-File-Path: a.txt\r\n\
                Content-Length: 3\r\n\
                \r\n\
                abc\r\n\
                --b1\r\n\
                X-File-Path: docs/b.txt\r\n\
                Content-Length: 2\r\n\
                \r\n\
                de\r\n\
                --b1--\r\n";
    let dispatch = server(&world).dispatch(as_alice(
        Request::new(Method::Post, "files/alice")
            .with_header("Content-Type", "multipart/related; boundary=b1")
            .with_body(body.as_bytes().to_vec()),
    ));
    assert_status(status::OK, &dispatch);
    assert_eq!(
        vec![
            ("alice".to_owned(), "a.txt".to_owned(), 3),
            ("alice".to_owned(), "docs/b.txt".to_owned(), 2),
        ],
        world.written()
    );
}

#[test]
fn bulk_upload_can_be_disabled() {
    let world = set_up().with_system_value("bulkupload.enabled", false);
    let dispatch = server(&world).dispatch(as_alice(
        Request::new(Method::Post, "files/alice")
            .with_header("Content-Type", "multipart/related; boundary=b1")
            .with_body(b"--b1--\r\n".to_vec()),
    ));
    assert_not_attached(&dispatch, &["bulk-upload"]);
    assert_status(status::NOT_IMPLEMENTED, &dispatch);
}

fn assemble(world: &MemoryWorld, total: &str) -> Dispatch {
    server(world).dispatch(as_alice(
        Request::new(Method::Move, "uploads/alice/transfer-1/.file")
            .with_header("OC-Total-Length", total)
            .with_header(
                "Destination",
                "https://cloud.example.com/remote.php/dav/files/alice/big.bin",
            ),
    ))
}

fn chunked_world() -> MemoryWorld {
    set_up()
        .with_upload_chunk("alice", "transfer-1", "00001", 5)
        .with_upload_chunk("alice", "transfer-1", "00002", 7)
}

#[test]
fn chunked_upload_assembles() {
    let world = chunked_world();
    let dispatch = assemble(&world, "12");
    assert_status(status::CREATED, &dispatch);
    assert_attached(&dispatch, &["chunking"]);
    assert_eq!(vec!["alice big.bin".to_owned()], world.dirty());
}

#[test]
fn chunked_upload_length_mismatch() {
    let world = chunked_world();
    let dispatch = assemble(&world, "13");
    assert_status(status::BAD_REQUEST, &dispatch);
    assert!(world.dirty().is_empty());

    let dispatch = assemble(&world, "twelve");
    assert_status(status::BAD_REQUEST, &dispatch);
}

#[test]
fn post_comment() {
    let world = set_up().with_comment("42", "c1");
    let dispatch = server(&world).dispatch(as_bob(
        Request::new(Method::Post, "comments/files/42")
            .with_header("Content-Type", "text/plain")
            .with_body(b"  Looks good  ".to_vec()),
    ));
    assert_status(status::CREATED, &dispatch);
    assert_eq!(
        Some("/remote.php/dav/comments/files/42/c2"),
        dispatch.response.headers.get("Content-Location")
    );
    assert_eq!(
        vec![(
            "42".to_owned(),
            "bob".to_owned(),
            "Looks good".to_owned()
        )],
        world.new_comments()
    );

    let dispatch = server(&world).dispatch(as_bob(
        Request::new(Method::Post, "comments/files/42").with_body(Vec::new()),
    ));
    assert_status(status::BAD_REQUEST, &dispatch);
}

#[test]
fn first_comment_on_an_object() {
    let world = set_up().with_commentable("7");
    let dispatch = server(&world).dispatch(as_bob(
        Request::new(Method::Post, "comments/files/7")
            .with_body(b"First!".to_vec()),
    ));
    assert_status(status::CREATED, &dispatch);
    assert_eq!(
        Some("/remote.php/dav/comments/files/7/c1"),
        dispatch.response.headers.get("Content-Location")
    );
    assert_eq!(1, world.new_comments().len());

    let dispatch = server(&world).dispatch(as_bob(
        Request::new(Method::Post, "comments/files/8")
            .with_body(b"Anyone there?".to_vec()),
    ));
    assert_status(status::NOT_FOUND, &dispatch);
    assert_eq!(1, world.new_comments().len());
}

#[test]
fn large_listings_are_compressed() {
    let mut world = set_up();
    for i in 0..50 {
        world = world.with_file("alice", &format!("photo-{:04}.jpg", i), 1);
    }
    let server = server(&world);

    let dispatch = server.dispatch(as_alice(
        Request::new(Method::Propfind, "files/alice")
            .with_header("Accept-Encoding", "gzip, deflate"),
    ));
    assert_status(status::MULTI_STATUS, &dispatch);
    assert_eq!(
        Some("gzip"),
        dispatch.response.headers.get("Content-Encoding")
    );
    assert_eq!(
        Some(&[0x1f, 0x8b][..]),
        dispatch.response.body.get(..2)
    );

    // Small listings are left alone
    let dispatch = server.dispatch(as_alice(
        Request::new(Method::Propfind, "files/alice/docs")
            .with_header("Accept-Encoding", "gzip"),
    ));
    assert_status(status::MULTI_STATUS, &dispatch);
    assert_eq!(None, dispatch.response.headers.get("Content-Encoding"));

    // As are clients that don't ask
    let dispatch = server
        .dispatch(as_alice(Request::new(Method::Propfind, "files/alice")));
    assert_eq!(None, dispatch.response.headers.get("Content-Encoding"));
}
