use crate::{ElementRef, Position, StyleValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An editing event with timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEvent {
    pub timestamp: DateTime<Utc>,
    pub event: EventType,
}

impl GraphEvent {
    /// Create a new event with the current timestamp
    pub fn new(event: EventType) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }

    /// Create a new event with a specific timestamp
    pub fn with_timestamp(timestamp: DateTime<Utc>, event: EventType) -> Self {
        Self { timestamp, event }
    }
}

/// Types of events that can occur during an editing session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventType {
    DiagramLoaded {
        nodes: usize,
        edges: usize,
        rules: usize,
    },

    RuleAppended {
        index: usize,
        selector: String,
    },

    /// `value` is `None` when the property was cleared
    PropertyChanged {
        index: usize,
        property: String,
        value: Option<StyleValue>,
    },

    ElementSelected {
        element: ElementRef,
    },

    NodeDeleted {
        id: String,
        removed_edges: Vec<String>,
        bypass_edges: Vec<String>,
    },

    EdgeDeleted {
        id: String,
    },

    NodeMoved {
        id: String,
        position: Position,
        snapped: bool,
    },

    DocumentExported {
        bytes: usize,
    },

    ImageExported {
        bytes: usize,
    },

    DiagramTornDown,
}
