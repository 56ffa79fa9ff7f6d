//! Error types for loading diagrams and editing styles.

/// Text shown to the user when a diagram document cannot be loaded.
pub const LOAD_FAILURE_MESSAGE: &str =
    "Could not parse the file. Make sure it is an HTML document containing a Cytoscape diagram.";

/// Load-time failure. No state is committed when one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The document has no `cytoscape({...})` call.
    #[error("Diagram configuration not found")]
    ConfigNotFound,

    /// The configuration literal never closes.
    #[error("Diagram configuration is not terminated (opened at byte {offset})")]
    UnbalancedConfig { offset: usize },

    /// The literal is not a list of `key: value` fields.
    #[error("Malformed diagram configuration near byte {offset}: {message}")]
    MalformedConfig { offset: usize, message: String },

    /// A required field is absent.
    #[error("Diagram configuration has no `{0}` field")]
    MissingField(&'static str),

    /// A field failed schema validation.
    #[error("Invalid `{field}` field: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },

    /// The diagram parsed but is structurally invalid.
    #[error("Invalid diagram: {0}")]
    Invalid(String),

    /// The rendering host refused to construct the diagram.
    #[error("Rendering host failed: {0}")]
    Host(String),
}

impl LoadError {
    /// Single blocking notification for the user; details go to the log.
    pub fn user_message(&self) -> &'static str {
        LOAD_FAILURE_MESSAGE
    }
}

/// A style edit that was refused. The rule is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StyleError {
    #[error("`{property}` is not an editable {kind} property")]
    UnknownProperty { kind: String, property: String },

    #[error("`{value}` is not a valid `{property}` (expected one of: {allowed})")]
    InvalidChoice {
        property: String,
        value: String,
        allowed: String,
    },
}
