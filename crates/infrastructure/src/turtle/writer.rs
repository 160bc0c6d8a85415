//! Session to Turtle.

use workbench_domain::{SessionState, TabState};

use super::{RDF_NS, RDFS_NS, WORKBENCH_NS, XSD_NS, escape};

/// Renders the exportable part of a session as a Turtle document.
///
/// Response summaries, validation patterns, and endpoint authentication are
/// not exported.
#[must_use]
pub fn serialize_session(state: &SessionState) -> String {
    let mut properties = Vec::new();

    if !state.endpoint_history.is_empty() {
        let items: Vec<String> = state
            .endpoint_history
            .iter()
            .map(|endpoint| format!("    {}", literal(endpoint)))
            .collect();
        properties.push(format!("yasgui:endpointHistory (\n{}\n  )", items.join("\n")));
    }
    if let Some(active) = &state.active {
        properties.push(format!("yasgui:activeTab {}", literal(active)));
    }
    if !state.prefixes.is_empty() {
        properties.push(format!("yasgui:prefixes {}", literal(&state.prefixes)));
    }
    properties.push(format!(
        "yasgui:autoCaptureEnabled \"{}\"^^xsd:boolean",
        state.auto_capture_enabled
    ));

    let buttons: Vec<Vec<String>> = state
        .endpoint_buttons()
        .map(|button| {
            let mut fields = Vec::new();
            if let Some(label) = &button.label {
                fields.push(format!("yasgui:label {}", literal(label)));
            }
            fields.push(format!("yasgui:endpoint {}", literal(&button.endpoint)));
            fields
        })
        .collect();
    if !buttons.is_empty() {
        properties.push(format!("yasgui:customEndpointButton {}", blank_nodes(&buttons)));
    }

    let tabs: Vec<Vec<String>> = state.ordered_tabs().map(tab_fields).collect();
    if !tabs.is_empty() {
        properties.push(format!("yasgui:tab {}", blank_nodes(&tabs)));
    }

    let mut out = format!(
        "@prefix yasgui: <{WORKBENCH_NS}> .\n\
         @prefix rdf: <{RDF_NS}> .\n\
         @prefix rdfs: <{RDFS_NS}> .\n\
         @prefix xsd: <{XSD_NS}> .\n\n\
         [] a yasgui:Configuration"
    );
    for property in properties {
        out.push_str(" ;\n  ");
        out.push_str(&property);
    }
    out.push_str(" .\n");
    out
}

fn tab_fields(tab: &TabState) -> Vec<String> {
    let config = &tab.request_config;
    let mut fields = vec![
        format!("yasgui:tabId {}", literal(&tab.id)),
        format!("yasgui:tabName {}", literal(&tab.name)),
    ];
    if !tab.query_text.is_empty() {
        fields.push(format!("yasgui:query {}", literal(&tab.query_text)));
    }
    if let Some(height) = &tab.editor_height {
        fields.push(format!("yasgui:editorHeight {}", literal(height)));
    }
    if !config.endpoint.is_empty() {
        fields.push(format!("yasgui:endpoint {}", literal(&config.endpoint)));
    }
    fields.push(format!("yasgui:requestMethod {}", literal(config.method.as_str())));
    let accept_headers = [
        ("acceptHeaderSelect", &config.accept_header_select),
        ("acceptHeaderGraph", &config.accept_header_graph),
        ("acceptHeaderUpdate", &config.accept_header_update),
    ];
    for (name, value) in accept_headers {
        if let Some(value) = value {
            fields.push(format!("yasgui:{name} {}", literal(value)));
        }
    }
    fields
}

fn blank_nodes(nodes: &[Vec<String>]) -> String {
    let rendered: Vec<String> = nodes
        .iter()
        .map(|fields| {
            let body: Vec<String> = fields.iter().map(|field| format!("    {field}")).collect();
            format!("[\n{}\n  ]", body.join(" ;\n"))
        })
        .collect();
    rendered.join(" , ")
}

fn literal(value: &str) -> String {
    format!("\"{}\"", escape(value))
}
