//! Command implementations.
//!
//! Every command writes its output to the given writer and returns whether
//! it succeeded. A query that reaches the endpoint but fails, or whose
//! results miss an expected triple, is not an error: it returns `false`.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use tracing::info;
use workbench_application::{
    ApplicationError, QueryOutcome, TabSession, Workbench, WorkbenchEvent,
};
use workbench_domain::{
    AuthScheme, AuthUpdate, EndpointUpdate, ErrorSummary, Orientation, RequestArg,
    RequestConfigLayer, SessionState, ValidationPattern, ValidationResult,
};
use workbench_infrastructure::{from_json, parse_session, serialize_session, to_json_stable};

use crate::cli::{Args, Command, EndpointCommand, QueryArgs, SessionFormat};
use crate::context::{AppContext, load_settings, settings_repository};
use crate::error::AppError;

/// Accept header used when CONSTRUCT results are validated.
pub const NTRIPLES: &str = "application/n-triples,*/*;q=0.9";

/// Runs a command line.
///
/// # Errors
///
/// Returns an error if the session cannot be opened or the command cannot
/// be carried out.
pub async fn run(args: Args, out: &mut dyn Write) -> Result<bool, AppError> {
    let Args { global, command } = args;
    if let Command::Settings { save } = command {
        let repository = settings_repository(&global);
        let settings = load_settings(&repository, &global).await?;
        writeln!(out, "{}", to_json_stable(&settings)?)?;
        if save {
            repository.save(&settings).await?;
            if let Some(path) = repository.path() {
                info!(path = %path.display(), "Settings saved");
            }
        }
        return Ok(true);
    }

    let ctx = AppContext::open(&global).await?;
    let workbench = &ctx.workbench;
    match command {
        Command::Query(args) => query(&ctx, args, out).await,
        Command::Tabs => {
            list_tabs(&workbench.snapshot().await, out)?;
            Ok(true)
        }
        Command::NewTab { name, index } => {
            let tab = workbench.add_tab(index, true).await?;
            if let Some(name) = name {
                workbench.rename_tab(tab.id(), &name).await?;
            }
            writeln!(out, "{}", tab.id())?;
            Ok(true)
        }
        Command::SelectTab { id } => {
            workbench.select_tab(&id).await?;
            Ok(true)
        }
        Command::RenameTab { id, name } => {
            workbench.rename_tab(&id, &name).await?;
            Ok(true)
        }
        Command::MoveTab { id, index } => {
            move_tab(workbench, &id, index).await?;
            Ok(true)
        }
        Command::CloseTab { id } => {
            let id = match id {
                Some(id) => id,
                None => active_tab(workbench).await?.id().to_string(),
            };
            let closed = workbench.close_tab(&id).await?;
            writeln!(out, "Closed {} ({})", closed.tab.name, closed.tab.id)?;
            Ok(true)
        }
        Command::RestoreTab => match workbench.restore_last_closed_tab().await? {
            Some(tab) => {
                writeln!(out, "{}", tab.id())?;
                Ok(true)
            }
            None => {
                writeln!(out, "No closed tab to restore")?;
                Ok(false)
            }
        },
        Command::Endpoint { command } => endpoint(workbench, command, out).await,
        Command::History => {
            for endpoint in &workbench.snapshot().await.endpoint_history {
                writeln!(out, "{endpoint}")?;
            }
            Ok(true)
        }
        Command::Prefixes { set, auto_capture } => {
            if let Some(prefixes) = set {
                workbench.set_prefixes(&prefixes).await;
            }
            if let Some(enabled) = auto_capture {
                workbench.set_auto_capture(enabled).await;
            }
            write!(out, "{}", workbench.snapshot().await.prefixes)?;
            Ok(true)
        }
        Command::Preferences { theme, orientation } => {
            if let Some(theme) = theme {
                workbench.set_theme(theme.into()).await;
            }
            if let Some(orientation) = orientation {
                workbench.set_orientation(orientation.into()).await;
            }
            let state = workbench.snapshot().await;
            let settings = &workbench.config().settings;
            let theme = state.theme.unwrap_or(settings.theme);
            let orientation = state.orientation.unwrap_or(settings.orientation);
            writeln!(
                out,
                "theme: {}",
                if theme.is_dark() { "dark" } else { "light" }
            )?;
            writeln!(
                out,
                "orientation: {}",
                match orientation {
                    Orientation::Vertical => "vertical",
                    Orientation::Horizontal => "horizontal",
                }
            )?;
            Ok(true)
        }
        Command::Export { output, format } => {
            let state = workbench.snapshot().await;
            let text = match format {
                SessionFormat::Turtle => serialize_session(&state),
                SessionFormat::Json => to_json_stable(&state)?,
            };
            match output {
                Some(path) => {
                    tokio::fs::write(&path, text).await?;
                    info!(path = %path.display(), tabs = state.tabs.len(), "Session exported");
                }
                None => write!(out, "{text}")?,
            }
            Ok(true)
        }
        Command::Import { path, format } => {
            let state = read_session(&path, format).await?;
            let added = workbench.import_session(state).await?;
            writeln!(out, "Imported {} new tabs", added.len())?;
            Ok(true)
        }
        Command::Settings { .. } => Ok(true),
    }
}

async fn active_tab(workbench: &Workbench) -> Result<Arc<TabSession>, AppError> {
    workbench.active_tab().await.ok_or(AppError::NoActiveTab)
}

async fn query(ctx: &AppContext, args: QueryArgs, out: &mut dyn Write) -> Result<bool, AppError> {
    let workbench = &ctx.workbench;
    let tab = if args.new_tab {
        workbench.add_tab(None, true).await?
    } else if let Some(id) = &args.tab {
        workbench
            .tab(id)
            .ok_or_else(|| ApplicationError::TabNotFound(id.clone()))?
    } else {
        active_tab(workbench).await?
    };

    if let Some(text) = read_query(&args)? {
        tab.editor().set_value(&text);
        tab.on_editor_change();
    }
    if let Some(endpoint) = &args.endpoint {
        tab.set_endpoint(endpoint).await?;
    }
    if !args.expect.is_empty() {
        tab.set_validation_patterns(args.expect.clone()).await?;
    }

    let overrides = request_overrides(&args);
    let mut events = workbench.subscribe();
    let outcome = tab.execute(overrides.as_ref()).await?;
    if args.curl {
        while let Ok(event) = events.try_recv() {
            if let WorkbenchEvent::Query { tab_id, curl } = event
                && tab_id == tab.id()
            {
                writeln!(out, "{curl}")?;
            }
        }
    }

    match outcome {
        QueryOutcome::Success {
            response,
            duration_ms,
        } => {
            info!(tab_id = %tab.id(), status = response.status, duration_ms, "Query finished");
            write!(out, "{}", response.content)?;
            if !response.content.is_empty() && !response.content.ends_with('\n') {
                writeln!(out)?;
            }
            let validation = ctx
                .surfaces
                .renderer(tab.id())
                .and_then(|renderer| renderer.validation());
            match validation {
                Some(results) => write_validation(&results, out),
                None => Ok(true),
            }
        }
        QueryOutcome::Failed { error, duration_ms } => {
            info!(tab_id = %tab.id(), status = ?error.status, duration_ms, "Query failed");
            write_error(&error, out)?;
            Ok(false)
        }
        QueryOutcome::Aborted => {
            writeln!(out, "Query aborted")?;
            Ok(false)
        }
    }
}

fn read_query(args: &QueryArgs) -> Result<Option<String>, AppError> {
    if let Some(path) = &args.file {
        return std::fs::read_to_string(path)
            .map(Some)
            .map_err(|source| AppError::ReadFile {
                path: path.clone(),
                source,
            });
    }
    match args.query.as_deref() {
        Some("-") => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(Some(text))
        }
        Some(text) => Ok(Some(text.to_string())),
        None => Ok(None),
    }
}

/// The configuration layer built from per-run query options.
#[must_use]
pub fn request_overrides(args: &QueryArgs) -> Option<RequestConfigLayer> {
    let mut layer = RequestConfigLayer::new();
    let mut used = false;
    if let Some(method) = args.method {
        layer = layer.with_method(method);
        used = true;
    }
    let accept = args
        .accept
        .clone()
        .or_else(|| (!args.expect.is_empty()).then(|| NTRIPLES.to_string()));
    if let Some(accept) = accept {
        layer = layer
            .with_accept_header_graph(accept.clone())
            .with_accept_header_select(accept.clone())
            .with_accept_header_update(accept);
        used = true;
    }
    if !args.named_graphs.is_empty() {
        layer = layer.with_named_graphs(args.named_graphs.clone());
        used = true;
    }
    if !args.default_graphs.is_empty() {
        layer = layer.with_default_graphs(args.default_graphs.clone());
        used = true;
    }
    if !args.headers.is_empty() {
        let headers: BTreeMap<String, String> = args.headers.iter().cloned().collect();
        layer = layer.with_headers(headers);
        used = true;
    }
    if !args.args.is_empty() {
        let request_args: Vec<RequestArg> = args
            .args
            .iter()
            .map(|(name, value)| RequestArg::new(name, value))
            .collect();
        layer = layer.with_args(request_args);
        used = true;
    }
    used.then_some(layer)
}

fn write_validation(results: &[ValidationResult], out: &mut dyn Write) -> Result<bool, AppError> {
    let mut passed = true;
    for result in results {
        let label = if result.found { "PASS" } else { "FAIL" };
        passed &= result.found;
        write!(out, "{label} {}", pattern_text(&result.pattern))?;
        if let Some(description) = &result.pattern.description {
            write!(out, " ({description})")?;
        }
        writeln!(out, ": {} matching", result.matching_triples.len())?;
    }
    Ok(passed)
}

fn pattern_text(pattern: &ValidationPattern) -> String {
    let position = |value: &Option<String>| value.clone().unwrap_or_else(|| "*".to_string());
    format!(
        "{} {} {}",
        position(&pattern.subject),
        position(&pattern.predicate),
        position(&pattern.object)
    )
}

fn write_error(error: &ErrorSummary, out: &mut dyn Write) -> Result<(), AppError> {
    match (error.status, &error.status_text) {
        (Some(status), Some(text)) => writeln!(out, "Error: {status} {text}")?,
        (Some(status), None) => writeln!(out, "Error: {status}")?,
        (None, _) => writeln!(out, "Error: the endpoint could not be reached")?,
    }
    if let Some(text) = error.text.as_deref().filter(|t| !t.trim().is_empty()) {
        writeln!(out, "{}", text.trim_end())?;
    }
    if let Some(guidance) = error.guidance() {
        writeln!(out, "{}", guidance.title)?;
        for suggestion in guidance.suggestions {
            writeln!(out, "  - {suggestion}")?;
        }
    }
    Ok(())
}

fn list_tabs(state: &SessionState, out: &mut dyn Write) -> Result<(), AppError> {
    for tab in state.ordered_tabs() {
        let marker = if state.active.as_deref() == Some(tab.id.as_str()) {
            '*'
        } else {
            ' '
        };
        write!(out, "{marker} {}\t{}\t{}", tab.id, tab.name, tab.endpoint())?;
        if let Some(summary) = &tab.last_response_summary {
            write!(out, "\t{} ms", summary.duration_ms)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

async fn move_tab(workbench: &Workbench, id: &str, index: usize) -> Result<(), AppError> {
    let mut order = workbench.tab_ids().await;
    let position = order
        .iter()
        .position(|tab| tab == id)
        .ok_or_else(|| ApplicationError::TabNotFound(id.to_string()))?;
    let tab = order.remove(position);
    order.insert(index.min(order.len()), tab);
    workbench.set_tab_order(order).await?;
    Ok(())
}

async fn endpoint(
    workbench: &Workbench,
    command: EndpointCommand,
    out: &mut dyn Write,
) -> Result<bool, AppError> {
    match command {
        EndpointCommand::List => {
            for config in &workbench.snapshot().await.endpoint_configs {
                write!(out, "{}", config.endpoint)?;
                if let Some(label) = &config.label {
                    write!(out, "\t{label}")?;
                }
                if config.is_button() {
                    write!(out, "\t[button]")?;
                }
                if let Some(scheme) = &config.authentication {
                    write!(out, "\t{}", auth_kind(scheme))?;
                }
                writeln!(out)?;
            }
            Ok(true)
        }
        EndpointCommand::Set {
            endpoint,
            label,
            button,
            bearer,
            basic,
            api_key,
            no_auth,
        } => {
            let authentication = if no_auth {
                AuthUpdate::Remove
            } else if let Some(token) = bearer {
                AuthUpdate::Set(AuthScheme::bearer(token))
            } else if let Some(credentials) = basic {
                let (user, password) = split_pair(&credentials, "user:password")?;
                AuthUpdate::Set(AuthScheme::basic(user, password))
            } else if let Some(key) = api_key {
                let (header, key) = split_pair(&key, "Header-Name:key")?;
                AuthUpdate::Set(AuthScheme::api_key(header, key))
            } else {
                AuthUpdate::Keep
            };
            workbench
                .add_or_update_endpoint(
                    &endpoint,
                    EndpointUpdate {
                        label,
                        show_as_button: button,
                        authentication,
                    },
                )
                .await;
            Ok(true)
        }
        EndpointCommand::Remove { endpoint } => {
            if workbench.delete_endpoint_config(&endpoint).await {
                Ok(true)
            } else {
                writeln!(out, "{endpoint} is not registered")?;
                Ok(false)
            }
        }
    }
}

fn split_pair<'a>(value: &'a str, expected: &str) -> Result<(&'a str, &'a str), AppError> {
    value
        .split_once(':')
        .filter(|(first, _)| !first.is_empty())
        .ok_or_else(|| AppError::InvalidArgument(format!("expected `{expected}`")))
}

const fn auth_kind(scheme: &AuthScheme) -> &'static str {
    match scheme {
        AuthScheme::Basic(_) => "basic",
        AuthScheme::Bearer(_) => "bearer",
        AuthScheme::ApiKey(_) => "api-key",
        AuthScheme::OAuth2(_) => "oauth2",
    }
}

async fn read_session(path: &Path, format: Option<SessionFormat>) -> Result<SessionState, AppError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| AppError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
    let format = format.unwrap_or_else(|| {
        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
            SessionFormat::Json
        } else {
            SessionFormat::Turtle
        }
    });
    Ok(match format {
        SessionFormat::Turtle => parse_session(&text)?,
        SessionFormat::Json => from_json(&text)?,
    })
}
