use crate::{catalog, Edge, Node, StyleRule};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Validation severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationSeverity {
    Info,    // loads, worth knowing
    Warning, // loads, probably unintended
    Error,   // refuses to load
}

/// Validation issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: ValidationSeverity,
    pub message: String,
    pub affected: Vec<String>,
    pub issue_type: ValidationIssueType,
}

/// Types of validation issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationIssueType {
    DanglingEdge,
    DuplicateId,
    DuplicateSelector,
    SelfLoop,
    OutOfDomainValue,
}

/// Complete validation result
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Create a new empty validation result
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Add an issue
    pub fn add_issue(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|i| i.severity == ValidationSeverity::Error)
    }

    /// Get all errors
    pub fn errors(&self) -> Vec<&ValidationIssue> {
        self.with_severity(ValidationSeverity::Error)
    }

    /// Get all warnings
    pub fn warnings(&self) -> Vec<&ValidationIssue> {
        self.with_severity(ValidationSeverity::Warning)
    }

    fn with_severity(&self, severity: ValidationSeverity) -> Vec<&ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == severity)
            .collect()
    }

    /// Check if validation passed (no errors)
    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    /// All error messages joined into one line
    pub fn error_summary(&self) -> String {
        self.errors()
            .iter()
            .map(|i| i.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Structural checks for a freshly parsed diagram
pub struct Validator;

impl Validator {
    /// Run all validations
    pub fn validate(nodes: &[Node], edges: &[Edge], rules: &[StyleRule]) -> ValidationResult {
        let mut result = ValidationResult::new();

        Self::check_duplicate_ids(nodes, edges, &mut result);
        Self::check_edges(nodes, edges, &mut result);
        Self::check_rules(rules, &mut result);

        result
    }

    fn check_duplicate_ids(nodes: &[Node], edges: &[Edge], result: &mut ValidationResult) {
        let mut seen = HashSet::new();
        let ids = nodes
            .iter()
            .map(|n| n.id.as_str())
            .chain(edges.iter().map(|e| e.id.as_str()));

        for id in ids {
            if !seen.insert(id) {
                result.add_issue(ValidationIssue {
                    severity: ValidationSeverity::Error,
                    message: format!("Element id `{}` is used more than once", id),
                    affected: vec![id.to_string()],
                    issue_type: ValidationIssueType::DuplicateId,
                });
            }
        }
    }

    fn check_edges(nodes: &[Node], edges: &[Edge], result: &mut ValidationResult) {
        let node_ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();

        for edge in edges {
            let missing: Vec<&str> = [edge.source.as_str(), edge.target.as_str()]
                .into_iter()
                .filter(|id| !node_ids.contains(id))
                .collect();

            if !missing.is_empty() {
                result.add_issue(ValidationIssue {
                    severity: ValidationSeverity::Error,
                    message: format!(
                        "Edge `{}` references missing node(s): {}",
                        edge.id,
                        missing.join(", ")
                    ),
                    affected: vec![edge.id.clone()],
                    issue_type: ValidationIssueType::DanglingEdge,
                });
            } else if edge.source == edge.target {
                result.add_issue(ValidationIssue {
                    severity: ValidationSeverity::Info,
                    message: format!("Edge `{}` loops on node `{}`", edge.id, edge.source),
                    affected: vec![edge.id.clone()],
                    issue_type: ValidationIssueType::SelfLoop,
                });
            }
        }
    }

    fn check_rules(rules: &[StyleRule], result: &mut ValidationResult) {
        let mut seen = HashSet::new();

        for rule in rules {
            let selector = rule.selector.to_string();
            if !seen.insert(selector.clone()) {
                result.add_issue(ValidationIssue {
                    severity: ValidationSeverity::Warning,
                    message: format!(
                        "Selector `{}` appears more than once; its rules are merged, later values winning",
                        selector
                    ),
                    affected: vec![selector.clone()],
                    issue_type: ValidationIssueType::DuplicateSelector,
                });
            }

            let kind = rule.selector.kind_hint();
            for (property, value) in &rule.style {
                if let Some(spec) = catalog::property(kind, property) {
                    if !spec.admits(value) {
                        result.add_issue(ValidationIssue {
                            severity: ValidationSeverity::Warning,
                            message: format!(
                                "`{}` in `{}` has value `{}` outside its allowed set",
                                property, selector, value
                            ),
                            affected: vec![selector.clone()],
                            issue_type: ValidationIssueType::OutOfDomainValue,
                        });
                    }
                }
            }
        }
    }
}
