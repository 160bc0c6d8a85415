//! Command line arguments.

use clap::{Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;
use workbench_domain::{HttpMethod, Orientation, ThemeMode, ValidationPattern};

#[derive(Debug, Parser)]
#[command(about, version, name = "workbench")]
/// SPARQL query workbench with persistent tabs
pub struct Args {
    /// Options shared by every command
    #[command(flatten)]
    pub global: GlobalOptions,
    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct GlobalOptions {
    /// Endpoint used by new tabs
    #[arg(long, global = true, env = "WORKBENCH_ENDPOINT", value_hint = ValueHint::Url)]
    pub default_endpoint: Option<String>,
    /// Proxy used for endpoints that do not answer CORS requests
    #[arg(long, global = true, env = "WORKBENCH_CORS_PROXY", value_hint = ValueHint::Url)]
    pub cors_proxy: Option<String>,
    /// Directory holding the persisted session
    #[arg(long, global = true, env = "WORKBENCH_DATA_DIR", value_hint = ValueHint::DirPath)]
    pub data_dir: Option<PathBuf>,
    /// Settings file to use instead of the one in the user config directory
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub settings: Option<PathBuf>,
    /// Keep the session in memory; nothing is written to disk
    #[arg(long, global = true)]
    pub ephemeral: bool,
}

/// Workbench commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a query in a tab
    Query(QueryArgs),
    /// List the open tabs
    Tabs,
    /// Open a new tab and select it
    NewTab {
        /// Name of the tab
        #[arg(long)]
        name: Option<String>,
        /// Position in the tab list
        #[arg(long)]
        index: Option<usize>,
    },
    /// Select a tab
    SelectTab {
        /// Tab id
        id: String,
    },
    /// Rename a tab
    RenameTab {
        /// Tab id
        id: String,
        /// New name
        name: String,
    },
    /// Move a tab to another position
    MoveTab {
        /// Tab id
        id: String,
        /// New position, starting at 0
        index: usize,
    },
    /// Close a tab, the active one by default
    CloseTab {
        /// Tab id
        id: Option<String>,
    },
    /// Reopen the most recently closed tab
    RestoreTab,
    /// Manage the endpoint registry
    Endpoint {
        /// Registry command
        #[command(subcommand)]
        command: EndpointCommand,
    },
    /// Print the endpoint history, most recent first
    History,
    /// Show or change the saved prefixes
    Prefixes {
        /// Replace the saved prefixes; one PREFIX declaration per line
        #[arg(long)]
        set: Option<String>,
        /// Capture prefixes from executed queries
        #[arg(long)]
        auto_capture: Option<bool>,
    },
    /// Change theme and layout preferences
    Preferences {
        /// Theme
        #[arg(long, value_enum)]
        theme: Option<ThemeArg>,
        /// Editor and results layout
        #[arg(long, value_enum)]
        orientation: Option<OrientationArg>,
    },
    /// Export the session
    Export {
        /// File to write; stdout by default
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = SessionFormat::Turtle)]
        format: SessionFormat,
    },
    /// Import tabs and settings from an exported session
    Import {
        /// Session file
        #[arg(value_hint = ValueHint::FilePath)]
        path: PathBuf,
        /// Input format, guessed from the file extension by default
        #[arg(long, value_enum)]
        format: Option<SessionFormat>,
    },
    /// Print the effective settings
    Settings {
        /// Write the effective settings to the settings file
        #[arg(long)]
        save: bool,
    },
}

/// Options of the `query` command.
#[derive(Debug, Default, clap::Args)]
pub struct QueryArgs {
    /// Query text; `-` reads stdin. Reruns the tab's query when absent
    pub query: Option<String>,
    /// Read the query from a file
    #[arg(short, long, conflicts_with = "query", value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,
    /// Tab to run in; the active tab by default
    #[arg(long)]
    pub tab: Option<String>,
    /// Run in a new tab
    #[arg(long, conflicts_with = "tab")]
    pub new_tab: bool,
    /// Switch the tab to this endpoint before running
    #[arg(short, long, value_hint = ValueHint::Url)]
    pub endpoint: Option<String>,
    /// HTTP method for this run
    #[arg(short = 'X', long, value_parser = parse_method)]
    pub method: Option<HttpMethod>,
    /// Accept header for this run
    #[arg(long)]
    pub accept: Option<String>,
    /// Named graph IRI, repeatable
    #[arg(long = "named-graph")]
    pub named_graphs: Vec<String>,
    /// Default graph IRI, repeatable
    #[arg(long = "default-graph")]
    pub default_graphs: Vec<String>,
    /// Extra request header as `Name: value`, repeatable
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
    /// Extra request argument as `name=value`, repeatable
    #[arg(long = "arg", value_parser = parse_request_arg)]
    pub args: Vec<(String, String)>,
    /// Triple a CONSTRUCT result must contain, as `subject predicate object`;
    /// `*` matches anything and a trailing `*` matches a prefix. Repeatable
    #[arg(long = "expect", value_parser = parse_pattern)]
    pub expect: Vec<ValidationPattern>,
    /// Print the request as a curl command before the results
    #[arg(long)]
    pub curl: bool,
}

/// Endpoint registry commands.
#[derive(Debug, Subcommand)]
pub enum EndpointCommand {
    /// List registered endpoints
    List,
    /// Register an endpoint or change its settings
    Set {
        /// Endpoint URL
        #[arg(value_hint = ValueHint::Url)]
        endpoint: String,
        /// Display label
        #[arg(long)]
        label: Option<String>,
        /// Offer the endpoint as a quick-select button
        #[arg(long)]
        button: Option<bool>,
        /// Bearer token
        #[arg(long, group = "auth")]
        bearer: Option<String>,
        /// Basic credentials as `user:password`
        #[arg(long, group = "auth")]
        basic: Option<String>,
        /// API key as `Header-Name:key`
        #[arg(long, group = "auth")]
        api_key: Option<String>,
        /// Remove any configured authentication
        #[arg(long, group = "auth")]
        no_auth: bool,
    },
    /// Remove an endpoint from the registry
    Remove {
        /// Endpoint URL
        endpoint: String,
    },
}

/// Session file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SessionFormat {
    /// Turtle, readable by other workbenches
    Turtle,
    /// The persisted JSON form
    Json,
}

/// Theme choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeArg {
    /// Light theme
    Light,
    /// Dark theme
    Dark,
}

impl From<ThemeArg> for ThemeMode {
    fn from(theme: ThemeArg) -> Self {
        match theme {
            ThemeArg::Light => Self::Light,
            ThemeArg::Dark => Self::Dark,
        }
    }
}

/// Layout choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrientationArg {
    /// Results below the editor
    Vertical,
    /// Results beside the editor
    Horizontal,
}

impl From<OrientationArg> for Orientation {
    fn from(orientation: OrientationArg) -> Self {
        match orientation {
            OrientationArg::Vertical => Self::Vertical,
            OrientationArg::Horizontal => Self::Horizontal,
        }
    }
}

fn parse_method(s: &str) -> Result<HttpMethod, String> {
    s.parse().map_err(|e| format!("{e}"))
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| format!("expected `Name: value`, got `{s}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in `{s}`"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn parse_request_arg(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected `name=value`, got `{s}`"))?;
    if name.is_empty() {
        return Err(format!("empty argument name in `{s}`"));
    }
    Ok((name.to_string(), value.to_string()))
}

/// Parses `subject predicate object`. IRIs may be written with or without
/// angle brackets.
pub fn parse_pattern(s: &str) -> Result<ValidationPattern, String> {
    let terms: Vec<&str> = s.split_whitespace().collect();
    let [subject, predicate, object] = terms.as_slice() else {
        return Err(format!("expected three terms, got `{s}`"));
    };
    let term = |t: &str| {
        t.strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .unwrap_or(t)
            .to_string()
    };
    Ok(ValidationPattern::default()
        .with_subject(term(subject))
        .with_predicate(term(predicate))
        .with_object(term(object)))
}
