//! Layered request configuration resolution.
//!
//! Layers are passed outermost first: global defaults, endpoint settings,
//! the tab's persisted config, then any call-site overrides. Per field:
//!
//! | field | strategy |
//! |---|---|
//! | scalars (endpoint, method, accept headers, credentials, query argument) | last layer with a value wins |
//! | `args`, `named_graphs`, `default_graphs` | concatenated in layer order |
//! | `headers` | merged per header name, later layers win |
//! | `adjust_query_before_request` | taken from the first layer only |
//! | `auth` | per scheme, last layer with a value wins |
//!
//! Resolution never fails. A dynamic value that errors is logged and
//! treated as absent, so earlier layers or the static defaults apply.

use std::collections::BTreeMap;

use tracing::warn;
use workbench_domain::{
    AuthLayer, AuthSchemes, ConcreteRequestConfig, ConfigValue, QueryContext, RequestConfigLayer,
};

/// Flattens configuration layers into one concrete request config.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestConfigResolver;

impl RequestConfigResolver {
    /// Resolves all request fields except authentication.
    #[must_use]
    pub fn resolve(layers: &[&RequestConfigLayer], ctx: &dyn QueryContext) -> ConcreteRequestConfig {
        let defaults = ConcreteRequestConfig::default();

        ConcreteRequestConfig {
            endpoint: last_value(layers, |l| l.endpoint.as_ref(), ctx, "endpoint")
                .unwrap_or(defaults.endpoint),
            method: last_value(layers, |l| l.method.as_ref(), ctx, "method")
                .unwrap_or(defaults.method),
            accept_header_select: last_value(
                layers,
                |l| l.accept_header_select.as_ref(),
                ctx,
                "acceptHeaderSelect",
            )
            .unwrap_or(defaults.accept_header_select),
            accept_header_graph: last_value(
                layers,
                |l| l.accept_header_graph.as_ref(),
                ctx,
                "acceptHeaderGraph",
            )
            .unwrap_or(defaults.accept_header_graph),
            accept_header_update: last_value(
                layers,
                |l| l.accept_header_update.as_ref(),
                ctx,
                "acceptHeaderUpdate",
            )
            .unwrap_or(defaults.accept_header_update),
            named_graphs: concatenated(layers, |l| l.named_graphs.as_ref(), ctx, "namedGraphs"),
            default_graphs: concatenated(
                layers,
                |l| l.default_graphs.as_ref(),
                ctx,
                "defaultGraphs",
            ),
            args: concatenated(layers, |l| l.args.as_ref(), ctx, "args"),
            headers: merged_headers(layers, ctx),
            with_credentials: last_value(
                layers,
                |l| l.with_credentials.as_ref(),
                ctx,
                "withCredentials",
            )
            .unwrap_or(defaults.with_credentials),
            query_argument: last_value(layers, |l| l.query_argument.as_ref(), ctx, "queryArgument"),
            adjust_query_before_request: layers
                .first()
                .and_then(|global| global.adjust_query_before_request.clone()),
        }
    }

    /// Resolves the authentication offered by the layers.
    ///
    /// If any dynamic scheme fails, the request gets no authentication at all.
    #[must_use]
    pub fn resolve_auth(layers: &[&RequestConfigLayer], ctx: &dyn QueryContext) -> AuthSchemes {
        let combined = layers
            .iter()
            .fold(AuthLayer::default(), |acc, layer| {
                acc.overlay(layer.auth.clone())
            });
        combined.resolve(ctx).unwrap_or_else(|e| {
            warn!(error = %e, "Authentication config failed, sending request without authentication");
            AuthSchemes::default()
        })
    }
}

fn last_value<T: Clone>(
    layers: &[&RequestConfigLayer],
    pick: impl Fn(&RequestConfigLayer) -> Option<&ConfigValue<T>>,
    ctx: &dyn QueryContext,
    field: &'static str,
) -> Option<T> {
    layers
        .iter()
        .rev()
        .filter_map(|layer| pick(layer))
        .find_map(|value| match value.resolve(ctx) {
            Ok(resolved) => Some(resolved),
            Err(e) => {
                warn!(field, error = %e, "Dynamic config value failed, falling back");
                None
            }
        })
}

fn concatenated<T: Clone>(
    layers: &[&RequestConfigLayer],
    pick: impl Fn(&RequestConfigLayer) -> Option<&ConfigValue<Vec<T>>>,
    ctx: &dyn QueryContext,
    field: &'static str,
) -> Vec<T> {
    layers
        .iter()
        .filter_map(|layer| pick(layer))
        .filter_map(|value| match value.resolve(ctx) {
            Ok(items) => Some(items),
            Err(e) => {
                warn!(field, error = %e, "Dynamic config value failed, skipping layer");
                None
            }
        })
        .flatten()
        .collect()
}

fn merged_headers(layers: &[&RequestConfigLayer], ctx: &dyn QueryContext) -> BTreeMap<String, String> {
    let mut merged = BTreeMap::new();
    for value in layers.iter().filter_map(|layer| layer.headers.as_ref()) {
        match value.resolve(ctx) {
            Ok(headers) => merged.extend(headers),
            Err(e) => warn!(field = "headers", error = %e, "Dynamic config value failed, skipping layer"),
        }
    }
    merged
}
