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

//! Assembles the resource tree for one request.
//!
//! Assembly is pure composition: backends are constructed (which may fail),
//! but nothing is listed until a lookup actually walks into a collection.

use std::sync::Arc;

use super::collab::{
    CalendarBackend, CardBackend, CommentManager, Filesystem, Services,
};
use super::tree::{Node, Tree};
use crate::support::error::Error;

/// The principal that owns system-wide address books.
const SYSTEM_PRINCIPAL: &str = "principals/system/system";

/// Build the tree for a request.
///
/// Collections that would enumerate principals have listing disabled unless
/// `debug_mode_enabled`; they can still be walked into by name.
pub fn build_tree(
    services: &Services,
    debug_mode_enabled: bool,
) -> Result<Tree, Error> {
    let calendars = services.backends.calendar_backend()?;
    let cards = services.backends.card_backend()?;
    let disable_listing = !debug_mode_enabled;

    let root = Node::collection(
        "",
        vec![
            principals(services, disable_listing),
            per_user(services, "files", disable_listing, {
                let files = Arc::clone(&services.files);
                move |uid| storage_node(Arc::clone(&files), uid, Vec::new())
            }),
            per_user(services, "calendars", disable_listing, {
                let calendars = Arc::clone(&calendars);
                move |uid| calendar_home(Arc::clone(&calendars), uid)
            }),
            Node::collection("system-calendars", Vec::new())
                .with_listing_disabled(disable_listing),
            public_calendars(Arc::clone(&calendars))
                .with_listing_disabled(disable_listing),
            address_books(services, cards, disable_listing),
            system_tags(services),
            tag_relations(services),
            comments(services),
            per_user(services, "uploads", disable_listing, {
                let uploads = Arc::clone(&services.uploads);
                move |uid| upload_home(Arc::clone(&uploads), uid)
            }),
            per_user(services, "avatars", disable_listing, Node::leaf),
        ],
    );

    Ok(Tree::new(root))
}

fn principals(services: &Services, disable_listing: bool) -> Node {
    let users = Arc::clone(&services.users);
    let groups = Arc::clone(&services.users);
    Node::collection(
        "principals",
        vec![
            Node::lazy("users", move || {
                Ok(users.user_ids()?.into_iter().map(Node::leaf).collect())
            })
            .with_listing_disabled(disable_listing),
            Node::lazy("groups", move || {
                Ok(groups.group_ids()?.into_iter().map(Node::leaf).collect())
            })
            .with_listing_disabled(disable_listing),
            Node::collection("system", vec![Node::leaf("system")])
                .with_listing_disabled(disable_listing),
        ],
    )
}

/// A collection with one child per user, each produced by `child`.
fn per_user(
    services: &Services,
    name: &str,
    disable_listing: bool,
    child: impl Fn(String) -> Node + 'static,
) -> Node {
    let users = Arc::clone(&services.users);
    Node::lazy(name, move || {
        Ok(users.user_ids()?.into_iter().map(&child).collect())
    })
    .with_listing_disabled(disable_listing)
}

fn storage_node(
    fs: Arc<dyn Filesystem>,
    uid: String,
    path: Vec<String>,
) -> Node {
    let name = path.last().cloned().unwrap_or_else(|| uid.clone());
    Node::lazy(name, move || {
        let storage = fs.storage(&uid)?;
        Ok(storage
            .list(&path)?
            .into_iter()
            .map(|entry| {
                if entry.is_collection {
                    let mut child_path = path.clone();
                    child_path.push(entry.name);
                    storage_node(Arc::clone(&fs), uid.clone(), child_path)
                } else {
                    Node::leaf(entry.name)
                }
            })
            .collect())
    })
}

/// `uploads/<uid>`: one collection per transfer, holding the chunks
/// uploaded so far plus the `.file` pseudo-node that a client moves into
/// place to assemble them.
fn upload_home(fs: Arc<dyn Filesystem>, uid: String) -> Node {
    Node::lazy(uid.clone(), move || {
        let storage = fs.storage(&uid)?;
        Ok(storage
            .list(&[])?
            .into_iter()
            .filter(|entry| entry.is_collection)
            .map(|transfer| {
                let storage = Arc::clone(&storage);
                let path = vec![transfer.name.clone()];
                Node::lazy(transfer.name, move || {
                    let mut chunks: Vec<Node> = storage
                        .list(&path)?
                        .into_iter()
                        .map(|chunk| Node::leaf(chunk.name))
                        .collect();
                    chunks.push(Node::leaf(".file"));
                    Ok(chunks)
                })
            })
            .collect())
    })
}

fn calendar_home(backend: Arc<dyn CalendarBackend>, uid: String) -> Node {
    let principal = format!("principals/users/{uid}");
    Node::lazy(uid, move || {
        Ok(backend
            .calendars_for_user(&principal)?
            .into_iter()
            .map(|calendar| {
                let backend = Arc::clone(&backend);
                let principal = principal.clone();
                let uri = calendar.clone();
                Node::lazy(calendar, move || {
                    Ok(backend
                        .calendar_objects(&principal, &uri)?
                        .into_iter()
                        .map(Node::leaf)
                        .collect())
                })
            })
            .collect())
    })
}

fn public_calendars(backend: Arc<dyn CalendarBackend>) -> Node {
    Node::lazy("public-calendars", move || {
        Ok(backend
            .published_calendars()?
            .into_iter()
            .map(|uri| Node::collection(uri, Vec::new()))
            .collect())
    })
}

fn address_book_home(
    backend: Arc<dyn CardBackend>,
    name: String,
    principal: String,
) -> Node {
    Node::lazy(name, move || {
        Ok(backend
            .address_books_for_user(&principal)?
            .into_iter()
            .map(|book| {
                let backend = Arc::clone(&backend);
                let principal = principal.clone();
                let uri = book.clone();
                Node::lazy(book, move || {
                    Ok(backend
                        .cards(&principal, &uri)?
                        .into_iter()
                        .map(Node::leaf)
                        .collect())
                })
            })
            .collect())
    })
}

fn address_books(
    services: &Services,
    cards: Arc<dyn CardBackend>,
    disable_listing: bool,
) -> Node {
    let system_cards = Arc::clone(&cards);
    Node::collection(
        "addressbooks",
        vec![
            per_user(services, "users", disable_listing, move |uid| {
                let principal = format!("principals/users/{uid}");
                address_book_home(Arc::clone(&cards), uid, principal)
            }),
            Node::collection(
                "system",
                vec![address_book_home(
                    system_cards,
                    "system".to_owned(),
                    SYSTEM_PRINCIPAL.to_owned(),
                )],
            )
            .with_listing_disabled(disable_listing),
        ],
    )
}

fn system_tags(services: &Services) -> Node {
    let tags = Arc::clone(&services.tags);
    Node::lazy("system-tags", move || {
        Ok(tags.tag_ids()?.into_iter().map(Node::leaf).collect())
    })
}

fn tag_relations(services: &Services) -> Node {
    let tags = Arc::clone(&services.tags);
    Node::collection(
        "tag-relations",
        vec![Node::lazy("files", move || {
            Ok(tags
                .tagged_objects()?
                .into_iter()
                .map(|object| Node::collection(object, Vec::new()))
                .collect())
        })],
    )
}

fn comments(services: &Services) -> Node {
    let listed = Arc::clone(&services.comments);
    let looked_up = Arc::clone(&services.comments);
    Node::collection(
        "comments",
        vec![Node::lazy("files", move || {
            Ok(listed
                .commented_objects()?
                .into_iter()
                .map(|object| comment_thread(&listed, object))
                .collect())
        })
        .with_lookup(move |object: &str| -> Result<_, Error> {
            Ok(if looked_up.object_exists(object)? {
                Some(comment_thread(&looked_up, object.to_owned()))
            } else {
                None
            })
        })],
    )
}

fn comment_thread(comments: &Arc<dyn CommentManager>, object: String) -> Node {
    let comments = Arc::clone(comments);
    let id = object.clone();
    Node::lazy(object, move || {
        Ok(comments
            .comment_ids(&id)?
            .into_iter()
            .map(Node::leaf)
            .collect())
    })
}
