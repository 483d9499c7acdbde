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

//! The virtual resource tree a request is resolved against.
//!
//! A tree is built fresh for every request and dropped with it. Collections
//! backed by a collaborator carry a `ChildSource` which is only consulted the
//! first time the collection's children are needed; the result is memoised in
//! that node, which makes the cache request-scoped for free.

use std::cell::OnceCell;
use std::collections::HashSet;
use std::fmt;

use log::warn;

use super::request::split_path;
use crate::support::error::Error;
use crate::support::safe_name::is_safe_name;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Collection,
    Leaf,
}

/// Produces the children of a lazily-populated collection.
pub trait ChildSource {
    fn load(&self) -> Result<Vec<Node>, Error>;
}

impl<F: Fn() -> Result<Vec<Node>, Error>> ChildSource for F {
    fn load(&self) -> Result<Vec<Node>, Error> {
        self()
    }
}

/// Recognises a child a collection does not enumerate.
pub trait ChildLookup {
    fn lookup(&self, name: &str) -> Result<Option<Node>, Error>;
}

impl<F: Fn(&str) -> Result<Option<Node>, Error>> ChildLookup for F {
    fn lookup(&self, name: &str) -> Result<Option<Node>, Error> {
        self(name)
    }
}

enum Children {
    Leaf,
    Fixed(Vec<Node>),
    Lazy {
        source: Box<dyn ChildSource>,
        loaded: OnceCell<Vec<Node>>,
    },
}

pub struct Node {
    name: String,
    children: Children,
    lookup: Option<Box<dyn ChildLookup>>,
    listing_disabled: bool,
}

impl Node {
    pub fn leaf(name: impl Into<String>) -> Self {
        Node {
            name: name.into(),
            children: Children::Leaf,
            lookup: None,
            listing_disabled: false,
        }
    }

    pub fn collection(name: impl Into<String>, children: Vec<Node>) -> Self {
        let name = name.into();
        let children = Children::Fixed(sanitise_children(&name, children));
        Node {
            name,
            children,
            lookup: None,
            listing_disabled: false,
        }
    }

    pub fn lazy(
        name: impl Into<String>,
        source: impl ChildSource + 'static,
    ) -> Self {
        Node {
            name: name.into(),
            children: Children::Lazy {
                source: Box::new(source),
                loaded: OnceCell::new(),
            },
            lookup: None,
            listing_disabled: false,
        }
    }

    pub fn with_listing_disabled(mut self, disabled: bool) -> Self {
        self.listing_disabled = disabled;
        self
    }

    /// Let `admit` add children by name beyond what the collection lists.
    pub fn with_lookup(mut self, lookup: impl ChildLookup + 'static) -> Self {
        self.lookup = Some(Box::new(lookup));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NodeKind {
        match self.children {
            Children::Leaf => NodeKind::Leaf,
            Children::Fixed(_) | Children::Lazy { .. } => {
                NodeKind::Collection
            }
        }
    }

    pub fn is_collection(&self) -> bool {
        NodeKind::Collection == self.kind()
    }

    pub fn listing_disabled(&self) -> bool {
        self.listing_disabled
    }

    /// The children of this node, loading them if needed.
    ///
    /// This ignores `listing_disabled`; it is what lookups go through.
    fn children(&self) -> Result<&[Node], Error> {
        match self.children {
            Children::Leaf => Ok(&[][..]),
            Children::Fixed(ref children) => Ok(children.as_slice()),
            Children::Lazy {
                ref source,
                ref loaded,
            } => {
                if let Some(children) = loaded.get() {
                    return Ok(children.as_slice());
                }

                let children = sanitise_children(&self.name, source.load()?);
                Ok(loaded.get_or_init(|| children).as_slice())
            }
        }
    }

    /// List the children of this collection on behalf of a client.
    pub fn list_children(&self) -> Result<&[Node], Error> {
        if self.listing_disabled {
            return Err(Error::ListingDisabled);
        }

        self.children()
    }

    /// Look up the direct child called `name`. Lookup is case-sensitive.
    pub fn child(&self, name: &str) -> Result<Option<&Node>, Error> {
        Ok(self.children()?.iter().find(|c| c.name == name))
    }

    fn loaded_children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self.children {
            Children::Leaf => None,
            Children::Fixed(ref mut children) => Some(children),
            Children::Lazy { ref mut loaded, .. } => loaded.get_mut(),
        }
    }

    /// Find the direct child `name`, asking this node's lookup for it if it
    /// is not among the listed children.
    fn admit_child(
        &mut self,
        name: &str,
    ) -> Result<Option<&mut Node>, Error> {
        self.children()?;

        let known = self
            .loaded_children_mut()
            .and_then(|c| c.iter().position(|c| c.name == name));
        let found = match (known, self.lookup.as_ref()) {
            (Some(_), _) | (None, None) => None,
            (None, Some(lookup)) => lookup
                .lookup(name)?
                .filter(|c| c.name == name && is_safe_name(&c.name)),
        };

        let children = match self.loaded_children_mut() {
            Some(children) => children,
            None => return Ok(None),
        };
        match (known, found) {
            (Some(ix), _) => Ok(Some(&mut children[ix])),
            (None, Some(child)) => {
                children.push(child);
                Ok(children.last_mut())
            }
            (None, None) => Ok(None),
        }
    }

    /// Describe the shape of this subtree down to `depth` levels, loading
    /// lazy collections on the way.
    pub fn shape(&self, depth: usize) -> Result<Shape, Error> {
        let children = if depth == 0 || !self.is_collection() {
            Vec::new()
        } else {
            self.children()?
                .iter()
                .map(|c| c.shape(depth - 1))
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(Shape {
            name: self.name.clone(),
            kind: self.kind(),
            listing_disabled: self.listing_disabled,
            children,
        })
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("listing_disabled", &self.listing_disabled)
            .finish()
    }
}

/// A plain-data snapshot of (part of) a tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shape {
    pub name: String,
    pub kind: NodeKind,
    pub listing_disabled: bool,
    pub children: Vec<Shape>,
}

fn sanitise_children(parent: &str, children: Vec<Node>) -> Vec<Node> {
    let mut seen = HashSet::with_capacity(children.len());
    children
        .into_iter()
        .filter(|child| {
            if !is_safe_name(&child.name) {
                warn!(
                    "Dropping child of '{}' with unsafe name {:?}",
                    parent, child.name
                );
                false
            } else if !seen.insert(child.name.clone()) {
                warn!(
                    "Dropping duplicate child '{}' of '{}'",
                    child.name, parent
                );
                false
            } else {
                true
            }
        })
        .collect()
}

/// What the dispatch engine needs from a resource tree.
pub trait ResourceTree {
    /// Find the node at `path`, or `None` if nothing is there.
    fn resolve(&self, path: &str) -> Result<Option<&Node>, Error>;

    /// List the children of the collection at `path`.
    fn list_children(&self, path: &str) -> Result<&[Node], Error> {
        self.resolve(path)?
            .ok_or_else(|| Error::NotFound(path.to_owned()))?
            .list_children()
    }
}

/// A request-scoped tree rooted at an unnamed collection.
#[derive(Debug)]
pub struct Tree {
    root: Node,
}

impl Tree {
    pub fn new(root: Node) -> Self {
        Tree { root }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Walk towards `path`, letting collections with a lookup add children
    /// they did not list, so that a later `resolve` can find them.
    pub fn admit(&mut self, path: &str) -> Result<(), Error> {
        let mut node = &mut self.root;
        for segment in split_path(path) {
            match node.admit_child(segment)? {
                Some(child) => node = child,
                None => break,
            }
        }

        Ok(())
    }

    /// Forget the loaded children of the collection at `path` so that the
    /// next lookup consults its source again.
    pub fn reload(&mut self, path: &str) {
        let mut node = &mut self.root;
        for segment in split_path(path) {
            let next = node
                .loaded_children_mut()
                .and_then(|c| c.iter_mut().find(|c| c.name == segment));
            match next {
                Some(child) => node = child,
                None => return,
            }
        }

        if let Children::Lazy { ref mut loaded, .. } = node.children {
            loaded.take();
        }
    }
}

impl ResourceTree for Tree {
    fn resolve(&self, path: &str) -> Result<Option<&Node>, Error> {
        let mut node = &self.root;
        for segment in split_path(path) {
            match node.child(segment)? {
                Some(child) => node = child,
                None => return Ok(None),
            }
        }

        Ok(Some(node))
    }
}
