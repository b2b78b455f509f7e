//! # vitalis-core
//!
//! Core types shared across all Vitalis crates:
//! - Entity structs for audited clinical records and audit records
//! - Action, entity-type, and ordering enums
//! - Opaque actor identity supplied by the external auth layer
//! - The `Auditable` capability and its canonical snapshot format
//! - Public ID prefixes and cross-cutting error types
//! - Read-model response types (trend summaries)

pub mod entities;
pub mod enums;
pub mod errors;
pub mod identity;
pub mod ids;
pub mod responses;
pub mod snapshot;
pub mod time;
pub mod validate;
