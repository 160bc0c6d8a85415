//! Deterministic JSON for files written by the workbench.
//!
//! Output uses 2-space indentation and ends with a newline, so settings and
//! exported sessions diff cleanly.

mod json;

pub use json::{SerializationError, from_json, from_json_bytes, to_json_stable, to_json_stable_bytes};
