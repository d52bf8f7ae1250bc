//! Crate for reading and writing mapping files, as well as running some operations on the mappings.
//!
//! Currently this crate supports reading and writing Tiny v1 and Tiny v2 (`.tiny`) files. Use [`format::read`] if you
//! don't know which of the two dialects a file is in; see the documentation of the [`tiny_v1`] and [`tiny_v2`]
//! modules for the dialects themselves.
//!
//! The operations on a [`Mappings`][tree::mappings::Mappings] are:
//! - [switching the source namespace][tree::mappings::Mappings::switch_source],
//! - [renaming namespaces][tree::mappings::Mappings::rename_namespaces],
//! - [reordering (or dropping) namespaces][tree::mappings::Mappings::reorder],
//! - [merging two mappings on a shared namespace][tree::mappings::Mappings::merge],
//! - [filling absent names of one namespace from another][tree::mappings::Mappings::complete_namespace].

mod lines;

pub mod error;
pub mod format;
pub mod ident;

pub mod tiny_v1;
pub mod tiny_v2;

pub mod tree;
pub mod action;

pub mod remapper;
