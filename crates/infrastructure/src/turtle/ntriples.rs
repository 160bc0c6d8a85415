//! N-Triples results as plain triples for CONSTRUCT validation.

use oxrdf::Term;
use oxttl::NTriplesParser;
use tracing::warn;
use workbench_domain::Triple;

/// Parses N-Triples content.
///
/// IRIs lose their angle brackets, literals keep only their lexical value
/// and blank nodes keep their `_:` label. Invalid statements are logged and
/// skipped.
#[must_use]
pub fn parse_ntriples(content: &str) -> Vec<Triple> {
    NTriplesParser::new()
        .for_slice(content.as_bytes())
        .filter_map(|result| match result {
            Ok(triple) => Some(Triple::new(
                term_text(&Term::from(triple.subject)),
                triple.predicate.into_string(),
                term_text(&triple.object),
            )),
            Err(e) => {
                warn!(error = %e, "Skipping invalid N-Triples statement");
                None
            }
        })
        .collect()
}

fn term_text(term: &Term) -> String {
    match term {
        Term::NamedNode(node) => node.as_str().to_owned(),
        Term::Literal(literal) => literal.value().to_owned(),
        other => other.to_string(),
    }
}
