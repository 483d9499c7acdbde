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


//! The DAV request pipeline.
//!
//! Each request gets its own resource tree and its own plugin chain. The
//! `registry` decides which plugins a request gets, `auth` who is making
//! it, and `server` drives the request through the phases in between.

pub mod activation;
pub mod auth;
pub mod collab;
pub mod plugin;
pub mod plugins;
pub mod registry;
pub mod request;
pub mod server;
pub mod tree;
pub mod tree_builder;
