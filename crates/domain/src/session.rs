//! Session-wide persisted state.
//!
//! `SessionState` is the single JSON document stored per session: the
//! ordered tab list, the active tab, every tab's state, the endpoint history
//! and registry, saved prefixes, and the one-slot undo cache for closed tabs.
//! All mutators keep `active` inside `tabs` and every listed id backed by a
//! `TabState`.

use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::endpoint::{EndpointConfig, EndpointUpdate};
use crate::error::{DomainError, DomainResult};
use crate::settings::{Orientation, ThemeMode};
use crate::tab::TabState;

/// The most recently closed tab and where it was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedTab {
    /// Position in the tab list before closing
    pub index: usize,
    /// State at the time of closing
    pub tab: TabState,
}

const fn default_true() -> bool {
    true
}

/// The persisted session document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Open tab ids in display order
    #[serde(default)]
    pub tabs: Vec<String>,
    /// Active tab id
    #[serde(default)]
    pub active: Option<String>,
    /// State of every open tab
    #[serde(default)]
    pub tab_config: BTreeMap<String, TabState>,
    /// Recently used endpoints, most recent first
    #[serde(default)]
    pub endpoint_history: Vec<String>,
    /// Endpoint registry
    #[serde(default)]
    pub endpoint_configs: Vec<EndpointConfig>,
    /// Undo slot for the last closed tab
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_closed_tab: Option<ClosedTab>,
    /// Saved `PREFIX` declarations, one per line
    #[serde(default)]
    pub prefixes: String,
    /// Whether prefixes are captured from queries automatically
    #[serde(default = "default_true")]
    pub auto_capture_enabled: bool,
    /// Theme
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeMode>,
    /// Layout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            tabs: Vec::new(),
            active: None,
            tab_config: BTreeMap::new(),
            endpoint_history: Vec::new(),
            endpoint_configs: Vec::new(),
            last_closed_tab: None,
            prefixes: String::new(),
            auto_capture_enabled: true,
            theme: None,
            orientation: None,
        }
    }
}

impl SessionState {
    /// Returns a tab by id.
    #[must_use]
    pub fn tab(&self, id: &str) -> Option<&TabState> {
        self.tab_config.get(id)
    }

    /// Returns a mutable tab by id.
    pub fn tab_mut(&mut self, id: &str) -> Option<&mut TabState> {
        self.tab_config.get_mut(id)
    }

    /// Returns the active tab.
    #[must_use]
    pub fn active_tab(&self) -> Option<&TabState> {
        self.active.as_deref().and_then(|id| self.tab(id))
    }

    /// Returns the open tabs in display order.
    pub fn ordered_tabs(&self) -> impl Iterator<Item = &TabState> {
        self.tabs.iter().filter_map(|id| self.tab_config.get(id))
    }

    /// Inserts a tab at `index`, or at the end when out of range.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty or already open.
    pub fn add_tab(&mut self, tab: TabState, index: Option<usize>) -> DomainResult<()> {
        if tab.id.trim().is_empty() {
            return Err(DomainError::InvalidIdentifier(tab.id));
        }
        if self.tab_config.contains_key(&tab.id) {
            return Err(DomainError::InvalidIdentifier(format!(
                "tab {} already exists",
                tab.id
            )));
        }
        match index {
            Some(index) if index < self.tabs.len() => self.tabs.insert(index, tab.id.clone()),
            _ => self.tabs.push(tab.id.clone()),
        }
        self.tab_config.insert(tab.id.clone(), tab);
        Ok(())
    }

    /// Replaces the stored state of an open tab.
    ///
    /// # Errors
    ///
    /// Returns an error if the tab is not open.
    pub fn update_tab(&mut self, tab: TabState) -> DomainResult<()> {
        let slot = self
            .tab_config
            .get_mut(&tab.id)
            .ok_or_else(|| DomainError::UnknownTab(tab.id.clone()))?;
        *slot = tab;
        Ok(())
    }

    /// Sets the active tab.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is not an open tab.
    pub fn set_active(&mut self, id: Option<&str>) -> DomainResult<()> {
        if let Some(id) = id
            && !self.tabs.iter().any(|open| open == id)
        {
            return Err(DomainError::UnknownTab(id.to_string()));
        }
        self.active = id.map(str::to_string);
        Ok(())
    }

    /// Closes a tab, caching it as the last closed tab.
    ///
    /// When the closed tab was active, the tab now at its position (or the
    /// one before it, if it was last) becomes active.
    ///
    /// # Errors
    ///
    /// Returns an error if the tab is not open.
    pub fn remove_tab(&mut self, id: &str) -> DomainResult<ClosedTab> {
        let index = self
            .tabs
            .iter()
            .position(|open| open == id)
            .ok_or_else(|| DomainError::UnknownTab(id.to_string()))?;
        let tab = self
            .tab_config
            .remove(id)
            .ok_or_else(|| DomainError::UnknownTab(id.to_string()))?;
        self.tabs.remove(index);

        if self.active.as_deref() == Some(id) {
            let neighbour = index.min(self.tabs.len().saturating_sub(1));
            self.active = self.tabs.get(neighbour).cloned();
        }

        let closed = ClosedTab { index, tab };
        self.last_closed_tab = Some(closed.clone());
        Ok(closed)
    }

    /// Reopens the last closed tab at its original position and activates it.
    ///
    /// The undo slot is emptied. Returns the restored tab id.
    pub fn restore_last_closed_tab(&mut self) -> Option<String> {
        let ClosedTab { index, tab } = self.last_closed_tab.take()?;
        let id = tab.id.clone();
        if self.tab_config.contains_key(&id) {
            return None;
        }
        if index <= self.tabs.len() {
            self.tabs.insert(index, id.clone());
        } else {
            self.tabs.push(id.clone());
        }
        self.tab_config.insert(id.clone(), tab);
        self.active = Some(id.clone());
        Some(id)
    }

    /// Reorders the open tabs.
    ///
    /// # Errors
    ///
    /// Returns an error if `order` is not a permutation of the open tabs.
    pub fn set_tab_order(&mut self, order: Vec<String>) -> DomainResult<()> {
        let current: HashSet<&String> = self.tabs.iter().collect();
        let requested: HashSet<&String> = order.iter().collect();
        if order.len() != self.tabs.len() || current != requested {
            return Err(DomainError::InvalidTabOrder(order.join(",")));
        }
        self.tabs = order;
        Ok(())
    }

    /// Records an endpoint as most recently used.
    ///
    /// Returns true if the history changed.
    pub fn record_endpoint(&mut self, endpoint: &str, limit: usize) -> bool {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() || self.endpoint_history.first().is_some_and(|e| e == endpoint) {
            return false;
        }
        self.endpoint_history.retain(|e| e != endpoint);
        self.endpoint_history.insert(0, endpoint.to_string());
        self.endpoint_history.truncate(limit);
        true
    }

    /// Returns the registry entry for an endpoint.
    #[must_use]
    pub fn endpoint_config(&self, endpoint: &str) -> Option<&EndpointConfig> {
        self.endpoint_configs.iter().find(|c| c.endpoint == endpoint)
    }

    /// Merges an update into the endpoint's entry, creating it if needed.
    pub fn add_or_update_endpoint(&mut self, endpoint: &str, update: EndpointUpdate) {
        if let Some(existing) = self
            .endpoint_configs
            .iter_mut()
            .find(|c| c.endpoint == endpoint)
        {
            existing.apply(update);
        } else {
            let mut config = EndpointConfig::new(endpoint);
            config.apply(update);
            self.endpoint_configs.push(config);
        }
    }

    /// Removes an endpoint's entry. Returns true if one existed.
    pub fn delete_endpoint_config(&mut self, endpoint: &str) -> bool {
        let before = self.endpoint_configs.len();
        self.endpoint_configs.retain(|c| c.endpoint != endpoint);
        before != self.endpoint_configs.len()
    }

    /// Endpoints shown as quick-select buttons.
    pub fn endpoint_buttons(&self) -> impl Iterator<Item = &EndpointConfig> {
        self.endpoint_configs.iter().filter(|c| c.is_button())
    }

    /// Returns `base`, or `base N` with the smallest free N.
    #[must_use]
    pub fn next_tab_name(&self, base: &str) -> String {
        let taken: HashSet<&str> = self.tab_config.values().map(|t| t.name.as_str()).collect();
        if !taken.contains(base) {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{base} {n}"))
            .find(|candidate| !taken.contains(candidate.as_str()))
            .unwrap_or_else(|| base.to_string())
    }

    /// Merges `PREFIX` declarations into the saved prefixes.
    ///
    /// Labels already saved are kept. Returns true if anything was added.
    pub fn capture_prefixes(&mut self, declarations: &BTreeMap<String, String>) -> bool {
        if declarations.is_empty() {
            return false;
        }
        let mut combined = self.prefixes.clone();
        for (label, iri) in declarations {
            let _ = write!(combined, "\nPREFIX {label}: <{iri}>");
        }
        let deduplicated = deduplicate_prefixes(&combined);
        let changed = deduplicated != self.prefixes;
        self.prefixes = deduplicated;
        changed
    }

    /// Restores the invariants after loading untrusted data.
    ///
    /// Drops duplicate and dangling tab ids, state of unlisted tabs, and an
    /// active id that is not open. Returns true if anything changed.
    pub fn repair(&mut self) -> bool {
        let before = self.clone();
        let mut seen = HashSet::new();
        let config = &self.tab_config;
        self.tabs
            .retain(|id| config.contains_key(id) && seen.insert(id.clone()));
        let listed: HashSet<String> = self.tabs.iter().cloned().collect();
        self.tab_config.retain(|id, _| listed.contains(id));
        if self
            .active
            .as_ref()
            .is_some_and(|active| !listed.contains(active))
        {
            self.active = self.tabs.first().cloned();
        }
        *self != before
    }
}

/// Parses one `PREFIX label: <iri>` line.
#[must_use]
pub fn parse_prefix_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    let keyword = line.get(..6)?;
    if !keyword.eq_ignore_ascii_case("PREFIX") {
        return None;
    }
    let rest = line[6..].trim_start();
    let (label, rest) = rest.split_once(':')?;
    let iri = rest.trim().strip_prefix('<')?.strip_suffix('>')?;
    let label = label.trim();
    if label.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        Some((label.to_string(), iri.to_string()))
    } else {
        None
    }
}

/// Collects the `PREFIX` declarations of a query, one per line.
#[must_use]
pub fn prefixes_in(query: &str) -> BTreeMap<String, String> {
    query.lines().filter_map(parse_prefix_line).collect()
}

fn deduplicate_prefixes(text: &str) -> String {
    let mut seen = HashSet::new();
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| {
            parse_prefix_line(line).is_none_or(|(label, _)| seen.insert(label.to_lowercase()))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
