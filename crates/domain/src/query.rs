//! Query classification and the editor context seen by dynamic configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{DomainError, DomainResult};

/// Query form as reported by the editor.
///
/// The text itself is opaque here; only this classification drives
/// method forcing and accept header selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryType {
    /// `SELECT` query
    #[default]
    Select,
    /// `ASK` query
    Ask,
    /// `CONSTRUCT` query
    Construct,
    /// `DESCRIBE` query
    Describe,
    /// Any SPARQL Update operation
    Update,
}

impl QueryType {
    /// Returns the keyword for this query type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::Ask => "ASK",
            Self::Construct => "CONSTRUCT",
            Self::Describe => "DESCRIBE",
            Self::Update => "UPDATE",
        }
    }

    /// Returns the mode implied by this query type.
    #[must_use]
    pub const fn mode(self) -> QueryMode {
        match self {
            Self::Update => QueryMode::Update,
            _ => QueryMode::Query,
        }
    }

    /// Returns true for query forms whose results are RDF graphs.
    #[must_use]
    pub const fn returns_graph(self) -> bool {
        matches!(self, Self::Construct | Self::Describe)
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryType {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s.trim().to_uppercase().as_str() {
            "SELECT" => Ok(Self::Select),
            "ASK" => Ok(Self::Ask),
            "CONSTRUCT" => Ok(Self::Construct),
            "DESCRIBE" => Ok(Self::Describe),
            "UPDATE" | "INSERT" | "DELETE" | "LOAD" | "CLEAR" | "CREATE" | "DROP" | "COPY"
            | "MOVE" | "ADD" => Ok(Self::Update),
            other => Err(DomainError::UnknownQueryType(other.to_string())),
        }
    }
}

/// Whether the text is a query or an update operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    /// Read-only query
    #[default]
    Query,
    /// SPARQL Update
    Update,
}

impl QueryMode {
    /// Returns the default request argument name for this mode.
    #[must_use]
    pub const fn argument_name(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Update => "update",
        }
    }
}

/// Read access to the owning editor, as needed by dynamic configuration
/// functions and the executor.
pub trait QueryContext: Send + Sync {
    /// Current query text.
    fn query_text(&self) -> String;

    /// Classification of the current query text.
    fn query_type(&self) -> QueryType;

    /// Query or update mode. Derived from the type unless overridden.
    fn query_mode(&self) -> QueryMode {
        self.query_type().mode()
    }
}

/// A fixed query with a known classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticQuery {
    text: String,
    query_type: QueryType,
}

impl StaticQuery {
    /// Creates a new static query context.
    #[must_use]
    pub fn new(text: impl Into<String>, query_type: QueryType) -> Self {
        Self {
            text: text.into(),
            query_type,
        }
    }
}

impl QueryContext for StaticQuery {
    fn query_text(&self) -> String {
        self.text.clone()
    }

    fn query_type(&self) -> QueryType {
        self.query_type
    }
}
