use crate::{Element, ElementKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Style rule selector.
///
/// Understood structurally: `kind`, `*`, class lists with or without a kind
/// (`node.a.b`, `.hot`), id singletons with or without a kind (`edge#e1`,
/// `#a`) and comma groups of those. Anything else (pseudo-classes,
/// attribute tests, combinators) is kept verbatim as [`Selector::Raw`] and
/// left for the rendering host to interpret; raw selectors never match in
/// [`Selector::matches`].
///
/// Two selectors are the same rule target exactly when their texts are equal,
/// which the derived equality guarantees because parsing is lossless.
/// Among several matching rules the one appearing later in the stylesheet wins.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Selector {
    /// Elements carrying every listed class; any kind when `kind` is `None`
    Structural {
        kind: Option<ElementKind>,
        classes: Vec<String>,
    },

    /// Exactly one element; `kind` is `None` for a bare `#id`
    Element {
        kind: Option<ElementKind>,
        id: String,
    },

    /// Comma-separated alternatives; `text` is the source as written
    Group { text: String, parts: Vec<Selector> },

    /// Host-defined syntax, stored and forwarded untouched
    Raw(String),
}

impl Selector {
    /// Parse selector text; never fails
    pub fn parse(text: &str) -> Self {
        if text.contains(',') && !text.contains(['[', '(', '"', '\'']) {
            let parts = text
                .split(',')
                .map(str::trim)
                .map(|part| parse_simple(part).unwrap_or_else(|| Selector::Raw(part.to_string())))
                .collect();
            return Selector::Group {
                text: text.to_string(),
                parts,
            };
        }

        parse_simple(text).unwrap_or_else(|| Selector::Raw(text.to_string()))
    }

    /// Singleton selector for one element
    pub fn element(kind: ElementKind, id: impl Into<String>) -> Self {
        Selector::Element {
            kind: Some(kind),
            id: id.into(),
        }
    }

    /// Kind-wide selector, optionally narrowed by one class
    pub fn structural(kind: ElementKind, class: Option<&str>) -> Self {
        Selector::Structural {
            kind: Some(kind),
            classes: class.map(|c| vec![c.to_string()]).unwrap_or_default(),
        }
    }

    /// Element kind whose catalog applies when editing this rule.
    ///
    /// Selectors without a single explicit kind count as edge rules only when
    /// their text starts with `edge`.
    pub fn kind_hint(&self) -> ElementKind {
        match self {
            Selector::Structural {
                kind: Some(kind), ..
            }
            | Selector::Element {
                kind: Some(kind), ..
            } => *kind,
            _ if self.to_string().starts_with("edge") => ElementKind::Edge,
            _ => ElementKind::Node,
        }
    }

    /// Whether this selector applies to an element
    pub fn matches(&self, element: Element<'_>) -> bool {
        match self {
            Selector::Structural { kind, classes } => {
                kind.map_or(true, |kind| kind == element.kind())
                    && classes
                        .iter()
                        .all(|class| element.classes().contains(class))
            }
            Selector::Element { kind, id } => {
                kind.map_or(true, |kind| kind == element.kind()) && id == element.id()
            }
            Selector::Group { parts, .. } => parts.iter().any(|part| part.matches(element)),
            Selector::Raw(_) => false,
        }
    }

    pub fn is_element_singleton(&self) -> bool {
        matches!(self, Selector::Element { kind: Some(_), .. })
    }
}

/// One simple selector, or `None` when the text is not one the editor models
fn parse_simple(text: &str) -> Option<Selector> {
    if text == "*" {
        return Some(Selector::Structural {
            kind: None,
            classes: Vec::new(),
        });
    }

    let (kind, rest) = if let Some(rest) = text.strip_prefix("node") {
        (Some(ElementKind::Node), rest)
    } else if let Some(rest) = text.strip_prefix("edge") {
        (Some(ElementKind::Edge), rest)
    } else {
        (None, text)
    };

    if rest.is_empty() {
        return kind.map(|kind| Selector::Structural {
            kind: Some(kind),
            classes: Vec::new(),
        });
    }

    if let Some(id) = rest.strip_prefix('#') {
        if !id.is_empty() && !id.chars().any(is_combinator_char) {
            return Some(Selector::Element {
                kind,
                id: id.to_string(),
            });
        }
        return None;
    }

    let class_list = rest.strip_prefix('.')?;
    let classes: Vec<&str> = class_list.split('.').collect();
    if classes.iter().all(|class| is_class_name(class)) {
        return Some(Selector::Structural {
            kind,
            classes: classes.into_iter().map(str::to_string).collect(),
        });
    }
    None
}

fn is_combinator_char(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | '[' | ':' | '>' | '~' | '+')
}

fn is_class_name(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Structural { kind, classes } => {
                match kind {
                    Some(kind) => f.write_str(kind.as_str())?,
                    None if classes.is_empty() => f.write_str("*")?,
                    None => {}
                }
                for class in classes {
                    write!(f, ".{}", class)?;
                }
                Ok(())
            }
            Selector::Element { kind, id } => {
                if let Some(kind) = kind {
                    f.write_str(kind.as_str())?;
                }
                write!(f, "#{}", id)
            }
            Selector::Group { text, .. } | Selector::Raw(text) => f.write_str(text),
        }
    }
}

impl From<String> for Selector {
    fn from(text: String) -> Self {
        Selector::parse(&text)
    }
}

impl From<&str> for Selector {
    fn from(text: &str) -> Self {
        Selector::parse(text)
    }
}

impl From<Selector> for String {
    fn from(selector: Selector) -> Self {
        selector.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Edge, Node, Position};

    #[test]
    fn test_parse_shapes() {
        assert_eq!(
            Selector::parse("node"),
            Selector::Structural {
                kind: Some(ElementKind::Node),
                classes: vec![]
            }
        );
        assert_eq!(
            Selector::parse("edge.active-edge"),
            Selector::structural(ElementKind::Edge, Some("active-edge"))
        );
        assert_eq!(
            Selector::parse("node#n-1"),
            Selector::element(ElementKind::Node, "n-1")
        );
        assert_eq!(
            Selector::parse("edge:selected"),
            Selector::Raw("edge:selected".to_string())
        );
        assert_eq!(
            Selector::parse("node[kind = 'x']"),
            Selector::Raw("node[kind = 'x']".to_string())
        );
        assert_eq!(Selector::parse("nodes"), Selector::Raw("nodes".to_string()));
        assert_eq!(Selector::parse(""), Selector::Raw(String::new()));
    }

    #[test]
    fn test_parse_kindless_and_grouped_shapes() {
        assert_eq!(
            Selector::parse("*"),
            Selector::Structural {
                kind: None,
                classes: vec![]
            }
        );
        assert_eq!(
            Selector::parse(".hot.big"),
            Selector::Structural {
                kind: None,
                classes: vec!["hot".to_string(), "big".to_string()]
            }
        );
        assert_eq!(
            Selector::parse("#a"),
            Selector::Element {
                kind: None,
                id: "a".to_string()
            }
        );
        assert_eq!(
            Selector::parse("node, edge.hot"),
            Selector::Group {
                text: "node, edge.hot".to_string(),
                parts: vec![
                    Selector::structural(ElementKind::Node, None),
                    Selector::structural(ElementKind::Edge, Some("hot")),
                ]
            }
        );
        assert_eq!(
            Selector::parse("node[label = 'a,b']"),
            Selector::Raw("node[label = 'a,b']".to_string())
        );
        assert!(!Selector::parse("#a").is_element_singleton());
        assert!(Selector::parse("node#a").is_element_singleton());
    }

    #[test]
    fn test_text_round_trip() {
        for text in [
            "node",
            "edge",
            "node.a.b",
            "edge#e1",
            "node#with.dot",
            "edge:selected",
            "node > node",
            "",
            "*",
            ".hot",
            "#a",
            "node,edge",
            "node ,  .x",
        ] {
            assert_eq!(Selector::parse(text).to_string(), text);
        }
    }

    #[test]
    fn test_kind_hint() {
        assert_eq!(Selector::parse("edge#x").kind_hint(), ElementKind::Edge);
        assert_eq!(Selector::parse("edge:selected").kind_hint(), ElementKind::Edge);
        assert_eq!(Selector::parse(".loose").kind_hint(), ElementKind::Node);
        assert_eq!(Selector::parse("edge, node").kind_hint(), ElementKind::Edge);
        assert_eq!(Selector::parse("*").kind_hint(), ElementKind::Node);
    }

    #[test]
    fn test_matching() {
        let mut node = Node::new("a", Position::default());
        node.classes.insert("active-node".to_string());
        let edge = Edge::new("ab", "a", "b");

        assert!(Selector::parse("node").matches(Element::Node(&node)));
        assert!(Selector::parse("node.active-node").matches(Element::Node(&node)));
        assert!(!Selector::parse("node.other").matches(Element::Node(&node)));
        assert!(Selector::parse("node#a").matches(Element::Node(&node)));
        assert!(!Selector::parse("edge#a").matches(Element::Node(&node)));

        assert!(Selector::parse("edge").matches(Element::Edge(&edge)));
        assert!(!Selector::parse("edge:selected").matches(Element::Edge(&edge)));
    }

    #[test]
    fn test_matching_without_kind() {
        let mut node = Node::new("a", Position::default());
        node.classes.insert("hot".to_string());
        let mut edge = Edge::new("ab", "a", "b");
        edge.classes.insert("hot".to_string());
        let plain = Edge::new("a", "x", "y");

        for element in [Element::Node(&node), Element::Edge(&edge), Element::Edge(&plain)] {
            assert!(Selector::parse("*").matches(element));
        }

        assert!(Selector::parse(".hot").matches(Element::Node(&node)));
        assert!(Selector::parse(".hot").matches(Element::Edge(&edge)));
        assert!(!Selector::parse(".hot").matches(Element::Edge(&plain)));

        // a bare id matches whichever kind carries it
        assert!(Selector::parse("#a").matches(Element::Node(&node)));
        assert!(Selector::parse("#a").matches(Element::Edge(&plain)));
        assert!(!Selector::parse("#a").matches(Element::Edge(&edge)));

        let group = Selector::parse("node.cold, edge.hot, edge:selected");
        assert!(!group.matches(Element::Node(&node)));
        assert!(group.matches(Element::Edge(&edge)));
        assert!(!group.matches(Element::Edge(&plain)));
    }

    #[test]
    fn test_serde_as_string() {
        let selector: Selector = serde_json::from_str("\"node#a\"").unwrap();
        assert_eq!(selector, Selector::element(ElementKind::Node, "a"));
        assert_eq!(serde_json::to_string(&selector).unwrap(), "\"node#a\"");
    }
}
