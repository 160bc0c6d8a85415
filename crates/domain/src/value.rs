//! Configuration values that are either plain data or computed on demand.
//!
//! Any request configuration field may be supplied by the embedding
//! application as a function of the query context instead of a literal.
//! `ConfigValue` captures both shapes and offers a single `resolve`
//! operation so callers never branch on the representation themselves.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::query::QueryContext;

/// Failure raised by a dynamic configuration function.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("dynamic configuration failed: {0}")]
pub struct DynamicValueError(pub String);

impl DynamicValueError {
    /// Creates a new error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

type ValueFn<T> = dyn Fn(&dyn QueryContext) -> Result<T, DynamicValueError> + Send + Sync;

/// A configuration field that is either static or derived from the query context.
pub enum ConfigValue<T> {
    /// A literal value.
    Static(T),
    /// A function evaluated against the owning editor at request time.
    Dynamic(Arc<ValueFn<T>>),
}

impl<T> ConfigValue<T> {
    /// Wraps an infallible function of the query context.
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&dyn QueryContext) -> T + Send + Sync + 'static,
        T: 'static,
    {
        Self::Dynamic(Arc::new(move |ctx| Ok(f(ctx))))
    }

    /// Wraps a fallible function of the query context.
    pub fn try_dynamic<F>(f: F) -> Self
    where
        F: Fn(&dyn QueryContext) -> Result<T, DynamicValueError> + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(f))
    }

    /// Returns true if the value is computed at request time.
    #[must_use]
    pub const fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic(_))
    }

    /// Returns the literal value, if this is static.
    #[must_use]
    pub const fn as_static(&self) -> Option<&T> {
        match self {
            Self::Static(value) => Some(value),
            Self::Dynamic(_) => None,
        }
    }
}

impl<T: Clone> ConfigValue<T> {
    /// Resolves the value against the given context.
    ///
    /// # Errors
    ///
    /// Returns the error produced by a dynamic function.
    pub fn resolve(&self, ctx: &dyn QueryContext) -> Result<T, DynamicValueError> {
        match self {
            Self::Static(value) => Ok(value.clone()),
            Self::Dynamic(f) => f(ctx),
        }
    }
}

impl<T> Clone for ConfigValue<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        match self {
            Self::Static(value) => Self::Static(value.clone()),
            Self::Dynamic(f) => Self::Dynamic(Arc::clone(f)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ConfigValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(<fn>)"),
        }
    }
}

impl<T> From<T> for ConfigValue<T> {
    fn from(value: T) -> Self {
        Self::Static(value)
    }
}

impl From<&str> for ConfigValue<String> {
    fn from(value: &str) -> Self {
        Self::Static(value.to_string())
    }
}

/// Rewrites the query text right before it is placed in the request.
///
/// Never persisted: tab state is plain data and cannot hold functions.
#[derive(Clone)]
pub struct QueryAdjuster(Arc<dyn Fn(&dyn QueryContext) -> String + Send + Sync>);

impl QueryAdjuster {
    /// Wraps an adjustment function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&dyn QueryContext) -> String + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Produces the query text to send.
    #[must_use]
    pub fn apply(&self, ctx: &dyn QueryContext) -> String {
        (self.0)(ctx)
    }
}

impl fmt::Debug for QueryAdjuster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("QueryAdjuster(<fn>)")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::query::{QueryType, StaticQuery};

    #[test]
    fn test_static_resolves_to_itself() {
        let value: ConfigValue<String> = "https://example.org/sparql".into();
        let ctx = StaticQuery::new("ASK {}", QueryType::Ask);
        assert_eq!(value.resolve(&ctx).unwrap(), "https://example.org/sparql");
        assert!(!value.is_dynamic());
    }

    #[test]
    fn test_dynamic_sees_context() {
        let value = ConfigValue::dynamic(|ctx: &dyn QueryContext| ctx.query_text().len());
        let ctx = StaticQuery::new("ASK {}", QueryType::Ask);
        assert_eq!(value.resolve(&ctx).unwrap(), 6);
        assert!(value.as_static().is_none());
    }

    #[test]
    fn test_dynamic_failure_is_reported() {
        let value: ConfigValue<String> =
            ConfigValue::try_dynamic(|_| Err(DynamicValueError::new("no session")));
        let ctx = StaticQuery::new("ASK {}", QueryType::Ask);
        assert_eq!(
            value.resolve(&ctx),
            Err(DynamicValueError::new("no session"))
        );
    }

    #[test]
    fn test_query_adjuster_applies() {
        let adjuster = QueryAdjuster::new(|ctx| format!("# tagged\n{}", ctx.query_text()));
        let ctx = StaticQuery::new("ASK {}", QueryType::Ask);
        assert_eq!(adjuster.apply(&ctx), "# tagged\nASK {}");
    }
}
