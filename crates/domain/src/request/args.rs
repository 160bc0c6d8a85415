//! Extra request arguments

use serde::{Deserialize, Serialize};

/// A name/value pair sent alongside the query text.
///
/// Arguments are sent in the form body for POST and in the query string for
/// GET. Names may repeat.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestArg {
    /// The argument name
    pub name: String,
    /// The argument value
    pub value: String,
}

impl RequestArg {
    /// Creates a new argument.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Returns the argument as a tuple, as expected by URL encoders.
    #[must_use]
    pub fn as_pair(&self) -> (&str, &str) {
        (&self.name, &self.value)
    }
}

/// Expands graph URIs into repeated arguments under one name.
#[must_use]
pub fn graph_args(name: &str, graphs: &[String]) -> Vec<RequestArg> {
    graphs
        .iter()
        .map(|graph| RequestArg::new(name, graph.clone()))
        .collect()
}
