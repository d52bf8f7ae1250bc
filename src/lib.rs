//! Preparing mappings for a build: reading and merging the mapping files into one table, caching that table on disk
//! and in memory, and handing it to the remapper.
//!
//! The mappings themselves (reading, writing, switching, merging) live in the [`tinymap`] crate. This crate adds:
//! - [`identity`]: content-hash identity of mapping sources, and the keys and identifiers derived from it,
//! - [`service`]: the in-memory table of all mappings of one build,
//! - [`provider`]: the working directory of one mappings artifact, and the pipeline filling it,
//! - [`remap`]: the view of a table the remapper consumes, and the remap session,
//! - [`java`] and [`field_names`]: running the external Java tools.

pub mod archive;
pub mod error;
pub mod field_names;
pub mod identity;
pub mod java;
pub mod provider;
pub mod remap;
pub mod service;
