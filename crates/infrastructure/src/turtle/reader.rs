//! Turtle to session.
//!
//! `oxttl` parses the document. Triples are grouped by subject and the
//! `Configuration` node is read back into a partial session.

use std::collections::{HashMap, HashSet};

use oxrdf::vocab::rdf;
use oxrdf::{NamedNode, NamedNodeRef, Term};
use oxttl::{TurtleParser, TurtleSyntaxError};
use tracing::warn;
use workbench_domain::{
    EndpointConfig, HttpMethod, PlainRequestConfig, SessionState, TabState,
};

use super::WORKBENCH_NS;

/// Errors while reading a Turtle session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TurtleError {
    /// The document is not valid Turtle.
    #[error("invalid Turtle: {0}")]
    Syntax(String),

    /// No `Configuration` node was found.
    #[error("no configuration node found")]
    MissingConfiguration,
}

impl From<TurtleSyntaxError> for TurtleError {
    fn from(error: TurtleSyntaxError) -> Self {
        Self::Syntax(error.to_string())
    }
}

type Properties = Vec<(NamedNode, Term)>;

/// Triples grouped by subject, each group in document order.
struct Graph {
    nodes: HashMap<Term, Properties>,
    configuration: Option<Term>,
}

impl Graph {
    fn parse(turtle: &str) -> Result<Self, TurtleError> {
        let class = NamedNode::new_unchecked(format!("{WORKBENCH_NS}Configuration"));
        let mut nodes: HashMap<Term, Properties> = HashMap::new();
        let mut configuration = None;
        for triple in TurtleParser::new().for_slice(turtle.as_bytes()) {
            let triple = triple?;
            let subject = Term::from(triple.subject);
            if configuration.is_none()
                && triple.predicate.as_ref() == rdf::TYPE
                && matches!(&triple.object, Term::NamedNode(node) if *node == class)
            {
                configuration = Some(subject.clone());
            }
            nodes
                .entry(subject)
                .or_default()
                .push((triple.predicate, triple.object));
        }
        Ok(Self {
            nodes,
            configuration,
        })
    }

    fn node<'a>(&'a self, term: &Term) -> Node<'a> {
        Node {
            graph: self,
            properties: self.nodes.get(term).map(Vec::as_slice).unwrap_or_default(),
        }
    }

    fn configuration(&self) -> Option<Node<'_>> {
        self.configuration.as_ref().map(|term| self.node(term))
    }
}

/// One subject and its outgoing properties.
#[derive(Clone, Copy)]
struct Node<'a> {
    graph: &'a Graph,
    properties: &'a [(NamedNode, Term)],
}

impl<'a> Node<'a> {
    /// Objects of a property in the configuration vocabulary.
    fn objects(self, name: &'a str) -> impl Iterator<Item = &'a Term> + 'a {
        self.properties
            .iter()
            .filter(move |(predicate, _)| {
                predicate.as_str().strip_prefix(WORKBENCH_NS) == Some(name)
            })
            .map(|(_, object)| object)
    }

    fn text(self, name: &'a str) -> Option<String> {
        self.objects(name).find_map(literal_value)
    }

    fn children(self, name: &'a str) -> impl Iterator<Item = Node<'a>> + 'a {
        let graph = self.graph;
        self.objects(name).map(move |term| graph.node(term))
    }

    fn first_object(self, predicate: NamedNodeRef<'_>) -> Option<&'a Term> {
        self.properties
            .iter()
            .find(|(candidate, _)| candidate.as_ref() == predicate)
            .map(|(_, object)| object)
    }

    /// Items of an RDF collection. A malformed or cyclic list ends early.
    fn list(self, name: &'a str) -> Vec<&'a Term> {
        let mut items = Vec::new();
        let mut visited = HashSet::new();
        let mut current = self.objects(name).next();
        while let Some(cell) = current {
            if !visited.insert(cell) {
                break;
            }
            let cell = self.graph.node(cell);
            let Some(first) = cell.first_object(rdf::FIRST) else {
                break;
            };
            items.push(first);
            current = cell.first_object(rdf::REST);
        }
        items
    }
}

fn literal_value(term: &Term) -> Option<String> {
    match term {
        Term::Literal(literal) => Some(literal.value().to_owned()),
        _ => None,
    }
}

/// Reads a session from a Turtle document.
///
/// The result is partial: only exported fields are set, everything else has
/// its default. Tabs without an id and repeated tab ids are skipped.
///
/// # Errors
///
/// Returns an error if the document is not valid Turtle or has no
/// configuration node.
pub fn parse_session(turtle: &str) -> Result<SessionState, TurtleError> {
    let graph = Graph::parse(turtle)?;
    let config = graph
        .configuration()
        .ok_or(TurtleError::MissingConfiguration)?;

    let mut state = SessionState::default();
    state.endpoint_history = config
        .list("endpointHistory")
        .into_iter()
        .filter_map(literal_value)
        .collect();
    state.prefixes = config.text("prefixes").unwrap_or_default();
    if let Some(flag) = config.text("autoCaptureEnabled") {
        state.auto_capture_enabled = flag == "true";
    }

    for button in config.children("customEndpointButton") {
        let Some(endpoint) = button.text("endpoint") else {
            warn!("Skipping endpoint button without endpoint");
            continue;
        };
        let mut entry = EndpointConfig::new(endpoint);
        entry.label = button.text("label");
        entry.show_as_button = Some(true);
        state
            .endpoint_configs
            .retain(|existing| existing.endpoint != entry.endpoint);
        state.endpoint_configs.push(entry);
    }

    for node in config.children("tab") {
        let Some(tab) = read_tab(node) else {
            warn!("Skipping tab without id");
            continue;
        };
        if let Err(e) = state.add_tab(tab, None) {
            warn!(error = %e, "Skipping tab");
        }
    }

    state.active = config
        .text("activeTab")
        .filter(|active| state.tabs.iter().any(|id| id == active));
    Ok(state)
}

fn read_tab(tab: Node<'_>) -> Option<TabState> {
    let id = tab.text("tabId")?;
    let method = tab
        .text("requestMethod")
        .and_then(|method| match method.parse::<HttpMethod>() {
            Ok(method) => Some(method),
            Err(e) => {
                warn!(tab_id = %id, error = %e, "Using default method");
                None
            }
        })
        .unwrap_or_default();
    let mut request_config =
        PlainRequestConfig::new(tab.text("endpoint").unwrap_or_default(), method);
    request_config.accept_header_select = tab.text("acceptHeaderSelect");
    request_config.accept_header_graph = tab.text("acceptHeaderGraph");
    request_config.accept_header_update = tab.text("acceptHeaderUpdate");

    let mut state = TabState::new(
        id,
        tab.text("tabName").unwrap_or_else(|| "Query".to_string()),
        tab.text("query").unwrap_or_default(),
        request_config,
    );
    state.editor_height = tab.text("editorHeight");
    Some(state)
}
