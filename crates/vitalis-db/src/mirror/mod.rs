//! JSONL mirror of the audit log.
//!
//! Optional, pre-commit copy of every audit record as one JSON line per
//! record in `{mirror_dir}/{entity_public_id}.jsonl`. The `audit_records`
//! table stays authoritative.

pub mod writer;
