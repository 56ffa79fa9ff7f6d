use crate::catalog;
use crate::config::HighlightStyle;
use crate::error::StyleError;
use crate::{Element, ElementKind, Selector, ACTIVE_EDGE_CLASS, ACTIVE_NODE_CLASS};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A single style property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleValue {
    Number(f64),
    Text(String),

    /// Lists, flags and anything else the editor does not edit; kept verbatim
    Other(Value),
}

impl StyleValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StyleValue::Number(value) => Some(*value),
            StyleValue::Text(text) => text.trim().trim_end_matches("px").parse().ok(),
            StyleValue::Other(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StyleValue::Text(text) => Some(text),
            StyleValue::Number(_) | StyleValue::Other(_) => None,
        }
    }
}

impl fmt::Display for StyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleValue::Number(value) => write!(f, "{}", value),
            StyleValue::Text(text) => f.write_str(text),
            StyleValue::Other(value) => write!(f, "{}", value),
        }
    }
}

impl From<f64> for StyleValue {
    fn from(value: f64) -> Self {
        StyleValue::Number(value)
    }
}

impl From<&str> for StyleValue {
    fn from(value: &str) -> Self {
        StyleValue::Text(value.to_string())
    }
}

/// Property name -> value, in authoring order
pub type PropertyMap = IndexMap<String, StyleValue>;

/// A selector and the properties it sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRule {
    pub selector: Selector,
    #[serde(default)]
    pub style: PropertyMap,
}

impl StyleRule {
    pub fn new(selector: impl Into<Selector>) -> Self {
        Self {
            selector: selector.into(),
            style: PropertyMap::new(),
        }
    }

    pub fn with(mut self, property: &str, value: impl Into<StyleValue>) -> Self {
        self.style.insert(property.to_string(), value.into());
        self
    }
}

/// Result of a successful property edit
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyChange {
    Set(StyleValue),
    /// Numeric input was empty or unparseable; the property was removed
    Cleared,
}

/// Value of `property` for `element` under `rules`: the last matching rule that
/// sets it wins, otherwise the catalog default (if the property is catalogued).
pub fn cascade(rules: &[StyleRule], element: Element<'_>, property: &str) -> Option<StyleValue> {
    rules
        .iter()
        .rev()
        .filter(|rule| rule.selector.matches(element))
        .find_map(|rule| rule.style.get(property).cloned())
        .or_else(|| catalog::property(element.kind(), property).map(|spec| spec.default_value()))
}

/// The ordered stylesheet of the loaded diagram
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    rules: Vec<StyleRule>,

    /// Indices of rules the editor appended for its own affordances
    injected: Vec<usize>,
}

impl StyleSheet {
    /// Build from loaded rules.
    ///
    /// Rules repeating a selector are merged into one rule placed where the last
    /// of them stood, later values overriding earlier ones, so the cascade
    /// resolves exactly as it did over the unmerged list.
    pub fn new(rules: Vec<StyleRule>) -> Self {
        let mut sheet = Self::default();
        for rule in rules {
            match sheet.find_rule_index(&rule.selector) {
                Some(index) => {
                    let mut merged = sheet.rules.remove(index);
                    merged.style.extend(rule.style);
                    sheet.rules.push(merged);
                }
                None => sheet.rules.push(rule),
            }
        }
        sheet
    }

    pub fn rules(&self) -> &[StyleRule] {
        &self.rules
    }

    pub fn get(&self, index: usize) -> Option<&StyleRule> {
        self.rules.get(index)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Index of the rule whose selector text equals `selector`
    pub fn find_rule_index(&self, selector: &Selector) -> Option<usize> {
        let text = selector.to_string();
        self.rules
            .iter()
            .position(|rule| rule.selector.to_string() == text)
    }

    /// Append a rule and return its index.
    ///
    /// If a rule with the same selector text exists, nothing is appended and the
    /// existing index is returned.
    pub fn append(&mut self, rule: StyleRule) -> usize {
        if let Some(index) = self.find_rule_index(&rule.selector) {
            return index;
        }
        self.rules.push(rule);
        self.rules.len() - 1
    }

    /// Append an empty rule for user-supplied selector text
    pub fn add_selector(&mut self, text: &str) -> usize {
        self.append(StyleRule::new(text))
    }

    /// Validate `raw` against the catalog and store it in rule `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` does not name an existing rule.
    pub fn set_property(
        &mut self,
        index: usize,
        property: &str,
        raw: &str,
    ) -> Result<PropertyChange, StyleError> {
        let rule_count = self.rules.len();
        let rule = self.rules.get_mut(index).unwrap_or_else(|| {
            panic!("style rule index {index} out of range ({rule_count} rules)")
        });

        let kind = rule.selector.kind_hint();
        let spec = catalog::property(kind, property).ok_or_else(|| StyleError::UnknownProperty {
            kind: kind.to_string(),
            property: property.to_string(),
        })?;

        match spec.coerce(raw)? {
            Some(value) => {
                rule.style.insert(property.to_string(), value.clone());
                Ok(PropertyChange::Set(value))
            }
            None => {
                rule.style.shift_remove(property);
                Ok(PropertyChange::Cleared)
            }
        }
    }

    /// Append the selection highlight rules unless they are already present.
    ///
    /// Returns `true` when anything was appended.
    pub fn ensure_highlight_rules(&mut self, highlight: &HighlightStyle) -> bool {
        let mut appended = false;
        for rule in highlight_rules(highlight) {
            if self.find_rule_index(&rule.selector).is_none() {
                let index = self.append(rule);
                self.injected.push(index);
                appended = true;
            }
        }
        appended
    }

    /// Effective value of `property` for `element`
    pub fn resolve(&self, element: Element<'_>, property: &str) -> Option<StyleValue> {
        cascade(&self.rules, element, property)
    }

    /// Rules as they should be written out: everything except editor affordances
    pub fn exported_rules(&self) -> Vec<StyleRule> {
        self.rules
            .iter()
            .enumerate()
            .filter(|(index, _)| !self.injected.contains(index))
            .map(|(_, rule)| rule.clone())
            .collect()
    }
}

fn highlight_rules(highlight: &HighlightStyle) -> [StyleRule; 2] {
    [
        StyleRule::new(Selector::structural(ElementKind::Node, Some(ACTIVE_NODE_CLASS)))
            .with("border-width", highlight.node_border_width)
            .with("border-color", highlight.color.as_str())
            .with("overlay-opacity", highlight.overlay_opacity)
            .with("overlay-color", highlight.overlay_color.as_str()),
        StyleRule::new(Selector::structural(ElementKind::Edge, Some(ACTIVE_EDGE_CLASS)))
            .with("line-color", highlight.color.as_str())
            .with("target-arrow-color", highlight.color.as_str())
            .with("width", highlight.edge_width),
    ]
}
