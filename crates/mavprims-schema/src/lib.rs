//! Resolved message descriptors and the id-keyed message registry.
//!
//! Descriptors arrive already resolved: field names, types, array lengths,
//! wire-order permutation, numeric id and checksum salt. This crate checks
//! that each descriptor is self-consistent and indexes them by id so the
//! codec can look them up per frame.

pub mod descriptor;
pub mod error;
pub mod registry;

pub use descriptor::{DescriptorBuilder, FieldDef, MessageDescriptor};
pub use error::{Result, SchemaError};
pub use registry::MessageRegistry;
