//! Workbench events.
//!
//! Every notification the tabs and the workbench raise goes out on one
//! broadcast channel. Event names match the names renderers and settings
//! panels subscribe to.

use tokio::sync::broadcast;
use workbench_domain::NormalizedResponse;

/// A notification from a tab or the workbench.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkbenchEvent {
    /// Persisted tab state changed.
    Change {
        /// Tab id
        tab_id: String,
    },
    /// A query is about to run.
    QueryBefore {
        /// Tab id
        tab_id: String,
    },
    /// The request was built; carries it as a curl command.
    Query {
        /// Tab id
        tab_id: String,
        /// The request as a curl command line
        curl: String,
    },
    /// A running query was aborted.
    QueryAbort {
        /// Tab id
        tab_id: String,
    },
    /// A query finished with a response or an error.
    QueryResponse {
        /// Tab id
        tab_id: String,
        /// The response
        response: NormalizedResponse,
        /// Time from send to completion
        duration_ms: u64,
    },
    /// A tab closed itself.
    Close {
        /// Tab id
        tab_id: String,
    },
    /// A tab switched endpoints.
    EndpointChange {
        /// Tab id
        tab_id: String,
        /// The new endpoint
        endpoint: String,
    },
    /// A tab was added.
    TabAdd {
        /// Tab id
        tab_id: String,
    },
    /// A tab was selected.
    TabSelect {
        /// Tab id
        tab_id: String,
    },
    /// A tab was removed from the workbench.
    TabClose {
        /// Tab id
        tab_id: String,
    },
    /// Tabs were reordered.
    TabOrderChanged {
        /// New order
        tabs: Vec<String>,
    },
    /// The endpoint history changed.
    EndpointHistoryChange {
        /// History, most recent first
        history: Vec<String>,
    },
}

impl WorkbenchEvent {
    /// The event name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Change { .. } => "change",
            Self::QueryBefore { .. } => "queryBefore",
            Self::Query { .. } => "query",
            Self::QueryAbort { .. } => "queryAbort",
            Self::QueryResponse { .. } => "queryResponse",
            Self::Close { .. } => "close",
            Self::EndpointChange { .. } => "endpointChange",
            Self::TabAdd { .. } => "tabAdd",
            Self::TabSelect { .. } => "tabSelect",
            Self::TabClose { .. } => "tabClose",
            Self::TabOrderChanged { .. } => "tabOrderChanged",
            Self::EndpointHistoryChange { .. } => "endpointHistoryChange",
        }
    }

    /// The tab the event concerns, if any.
    #[must_use]
    pub fn tab_id(&self) -> Option<&str> {
        match self {
            Self::Change { tab_id }
            | Self::QueryBefore { tab_id }
            | Self::Query { tab_id, .. }
            | Self::QueryAbort { tab_id }
            | Self::QueryResponse { tab_id, .. }
            | Self::Close { tab_id }
            | Self::EndpointChange { tab_id, .. }
            | Self::TabAdd { tab_id }
            | Self::TabSelect { tab_id }
            | Self::TabClose { tab_id } => Some(tab_id),
            Self::TabOrderChanged { .. } | Self::EndpointHistoryChange { .. } => None,
        }
    }
}

/// Fan-out of workbench events.
///
/// Delivery is best effort: emitting with no subscribers is fine, and a slow
/// subscriber that lags behind loses the oldest events.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<WorkbenchEvent>,
}

impl EventBus {
    /// Creates a bus buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<WorkbenchEvent> {
        self.sender.subscribe()
    }

    /// Emits an event.
    pub fn emit(&self, event: WorkbenchEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
