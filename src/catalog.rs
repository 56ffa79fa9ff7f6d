//! Editable style properties per element kind and the values they accept.

use crate::error::StyleError;
use crate::{ElementKind, StyleValue};

/// Value domain of an editable property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueDomain {
    Color,
    Number,
    /// Free text; also used for sizes that may be `data(...)` mappers
    Text,
    Choice(&'static [&'static str]),
}

/// One catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertySpec {
    pub name: &'static str,
    pub domain: ValueDomain,
    /// Value the rendering engine uses when no rule sets the property
    pub default: &'static str,
}

const NODE_SHAPES: &[&str] = &[
    "rectangle",
    "round-rectangle",
    "ellipse",
    "triangle",
    "pentagon",
    "hexagon",
    "heptagon",
    "octagon",
    "star",
    "barrel",
    "diamond",
    "vee",
    "rhomboid",
    "polygon",
];

const FONT_WEIGHTS: &[&str] = &["normal", "bold"];

const LINE_STYLES: &[&str] = &["solid", "dashed", "dotted"];

const CURVE_STYLES: &[&str] = &["bezier", "straight", "haystack", "unbundled-bezier"];

const ARROW_SHAPES: &[&str] = &[
    "none",
    "triangle",
    "triangle-tee",
    "circle-triangle",
    "triangle-cross",
    "triangle-backcurve",
    "vee",
    "tee",
    "square",
    "circle",
    "diamond",
];

const fn entry(name: &'static str, domain: ValueDomain, default: &'static str) -> PropertySpec {
    PropertySpec {
        name,
        domain,
        default,
    }
}

pub const NODE_PROPERTIES: &[PropertySpec] = &[
    entry("background-color", ValueDomain::Color, "#999999"),
    entry("border-color", ValueDomain::Color, "#000000"),
    entry("border-width", ValueDomain::Number, "0"),
    entry("shape", ValueDomain::Choice(NODE_SHAPES), "ellipse"),
    entry("width", ValueDomain::Text, "30"),
    entry("height", ValueDomain::Text, "30"),
    entry("font-size", ValueDomain::Number, "16"),
    entry("font-weight", ValueDomain::Choice(FONT_WEIGHTS), "normal"),
    entry("label", ValueDomain::Text, ""),
];

pub const EDGE_PROPERTIES: &[PropertySpec] = &[
    entry("line-color", ValueDomain::Color, "#999999"),
    entry("line-style", ValueDomain::Choice(LINE_STYLES), "solid"),
    entry("width", ValueDomain::Number, "3"),
    entry("curve-style", ValueDomain::Choice(CURVE_STYLES), "haystack"),
    entry("target-arrow-shape", ValueDomain::Choice(ARROW_SHAPES), "none"),
    entry("target-arrow-color", ValueDomain::Color, "#999999"),
];

/// All editable properties for an element kind, in display order
pub fn properties(kind: ElementKind) -> &'static [PropertySpec] {
    match kind {
        ElementKind::Node => NODE_PROPERTIES,
        ElementKind::Edge => EDGE_PROPERTIES,
    }
}

/// Look up a single property
pub fn property(kind: ElementKind, name: &str) -> Option<&'static PropertySpec> {
    properties(kind).iter().find(|spec| spec.name == name)
}

impl PropertySpec {
    /// Built-in value of this property, typed per its domain
    pub fn default_value(&self) -> StyleValue {
        match self.domain {
            ValueDomain::Number => self
                .default
                .parse::<f64>()
                .map(StyleValue::Number)
                .unwrap_or_else(|_| StyleValue::Text(self.default.to_string())),
            _ => StyleValue::Text(self.default.to_string()),
        }
    }

    /// Coerce raw editor input into a stored value.
    ///
    /// `Ok(None)` means "unset": numeric input that is empty or does not parse.
    pub fn coerce(&self, raw: &str) -> Result<Option<StyleValue>, StyleError> {
        match self.domain {
            ValueDomain::Number => Ok(raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .map(StyleValue::Number)),
            ValueDomain::Choice(choices) => {
                if choices.contains(&raw) {
                    Ok(Some(StyleValue::Text(raw.to_string())))
                } else {
                    Err(StyleError::InvalidChoice {
                        property: self.name.to_string(),
                        value: raw.to_string(),
                        allowed: choices.join(", "),
                    })
                }
            }
            ValueDomain::Color | ValueDomain::Text => Ok(Some(StyleValue::Text(raw.to_string()))),
        }
    }

    /// Whether an already stored value lies inside the domain
    pub fn admits(&self, value: &StyleValue) -> bool {
        match (self.domain, value) {
            (ValueDomain::Choice(choices), StyleValue::Text(text)) => choices.contains(&text.as_str()),
            (ValueDomain::Choice(_), _) => false,
            (ValueDomain::Number, StyleValue::Other(_)) => false,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_catalog_lookup() {
        assert_eq!(properties(ElementKind::Node).len(), 9);
        assert_eq!(properties(ElementKind::Edge).len(), 6);

        // `width` exists for both kinds with different domains
        assert_eq!(property(ElementKind::Node, "width").unwrap().domain, ValueDomain::Text);
        assert_eq!(property(ElementKind::Edge, "width").unwrap().domain, ValueDomain::Number);

        assert!(property(ElementKind::Edge, "shape").is_none());
    }

    #[test]
    fn test_number_coercion() {
        let spec = property(ElementKind::Node, "border-width").unwrap();
        assert_eq!(spec.coerce("3.5").unwrap(), Some(StyleValue::Number(3.5)));
        assert_eq!(spec.coerce(" 2 ").unwrap(), Some(StyleValue::Number(2.0)));
        assert_eq!(spec.coerce("").unwrap(), None);
        assert_eq!(spec.coerce("wide").unwrap(), None);
    }

    #[test]
    fn test_choice_coercion() {
        let spec = property(ElementKind::Edge, "line-style").unwrap();
        assert_eq!(
            spec.coerce("dashed").unwrap(),
            Some(StyleValue::Text("dashed".to_string()))
        );
        assert_matches!(spec.coerce("wavy"), Err(StyleError::InvalidChoice { .. }));
    }

    #[test]
    fn test_text_and_color_pass_through() {
        let label = property(ElementKind::Node, "label").unwrap();
        assert_eq!(
            label.coerce("data(name)").unwrap(),
            Some(StyleValue::Text("data(name)".to_string()))
        );

        let color = property(ElementKind::Node, "background-color").unwrap();
        assert_eq!(
            color.coerce("#abcdef").unwrap(),
            Some(StyleValue::Text("#abcdef".to_string()))
        );
    }

    #[test]
    fn test_defaults_are_typed() {
        let width = property(ElementKind::Edge, "width").unwrap();
        assert_eq!(width.default_value(), StyleValue::Number(3.0));

        let shape = property(ElementKind::Node, "shape").unwrap();
        assert_eq!(shape.default_value(), StyleValue::Text("ellipse".to_string()));
        assert!(shape.admits(&shape.default_value()));
        assert!(!shape.admits(&StyleValue::Text("blob".to_string())));
    }
}
