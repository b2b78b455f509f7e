//! Update builder types for record mutations.
//!
//! Builders produce update structs with `Option` fields. Only `Some` fields
//! change; everything else keeps its current value.

pub mod test_result;
