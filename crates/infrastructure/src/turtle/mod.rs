//! Turtle export and import of the workbench session.
//!
//! The document is a single `yasgui:Configuration` node carrying the
//! endpoint history, the active tab, saved prefixes, the auto-capture flag,
//! endpoint buttons, and one blank node per tab. N-Triples results of
//! CONSTRUCT queries are read here too.

mod ntriples;
mod reader;
mod writer;

pub use ntriples::parse_ntriples;
pub use reader::{TurtleError, parse_session};
pub use writer::serialize_session;

/// Namespace of the configuration vocabulary.
pub const WORKBENCH_NS: &str = "http://yasgui.org/ontology#";
/// RDF namespace.
pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
/// RDFS namespace.
pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
/// XSD namespace.
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";

/// Suggested file name for exports.
pub const DEFAULT_FILE_NAME: &str = "workbench-config.ttl";

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}
