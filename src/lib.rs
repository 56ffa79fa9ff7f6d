// Graph Style Editor - Core Library

pub mod catalog;
pub mod config;
pub mod element;
pub mod error;
pub mod event;
pub mod export;
pub mod graph;
pub mod host;
pub mod loader;
pub mod selector;
pub mod session;
pub mod snap;
pub mod style;
pub mod validation;

// Re-export main types for convenience
pub use catalog::{PropertySpec, ValueDomain};
pub use config::{EditorConfig, ExportConfig, HighlightStyle};
pub use element::{
    Edge, EdgeKind, Element, ElementKind, ElementRecord, ElementRef, ElementsWire, Node, Position,
    WireClasses, ACTIVE_EDGE_CLASS, ACTIVE_NODE_CLASS,
};
pub use error::{LoadError, StyleError, LOAD_FAILURE_MESSAGE};
pub use event::{EventType, GraphEvent};
pub use graph::{DeletionReport, ElementSet};
pub use host::{HeadlessHost, HostStats, RenderHost};
pub use loader::{DiagramSource, Layout};
pub use selector::Selector;
pub use session::{
    Deletion, Handler, Interaction, InteractionOutcome, LoadSummary, PropertyField, Session,
};
pub use snap::{GridSnap, Key};
pub use style::{cascade, PropertyChange, PropertyMap, StyleRule, StyleSheet, StyleValue};
pub use validation::{
    ValidationIssue, ValidationIssueType, ValidationResult, ValidationSeverity, Validator,
};
