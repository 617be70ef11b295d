//! # trellis-core
//!
//! Core types shared across all Trellis crates:
//! - Typed snapshots of catalog payloads (nodes, relationships, links, resources)
//! - Canonical column descriptors and statistical profiles
//! - Entity records handed to the emission sink
//! - Lineage edges between tables and dashboards
//! - Fully-qualified name helpers
//! - Cross-cutting error types

pub mod catalog;
pub mod column;
pub mod entities;
pub mod errors;
pub mod fqn;
pub mod lineage;
