//! Observable element tree: the explicit state container the harness owns.
//!
//! The tree is pure data (roles, labels, text, values, attributes) with
//! no closures inside, so it serializes cleanly and never forms reference
//! cycles with the handlers that mutate it. Handlers live in the harness
//! registry and receive the state by reference.
//!
//! Selection is strict by default: a selector must match exactly one
//! element, and over-matching is an error rather than a silent first-pick.
//! Callers opt into first-match semantics explicitly.

use crate::result::{AsentarError, AsentarResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Internal handle of a mounted element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(u64);

impl ElementId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw handle value
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "el-{}", self.0)
    }
}

/// Semantic role of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    /// Clickable control
    Button,
    /// Editable text field
    TextBox,
    /// Urgent live message
    Alert,
    /// Non-urgent live message
    Status,
    /// Section heading
    Heading,
    /// Navigation link
    Link,
    /// No particular semantics
    #[default]
    Generic,
}

impl Role {
    /// Get the role name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::TextBox => "textbox",
            Self::Alert => "alert",
            Self::Status => "status",
            Self::Heading => "heading",
            Self::Link => "link",
            Self::Generic => "generic",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Query expression identifying zero or more elements in the tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selector {
    /// Explicit author-assigned id, matched exactly
    Id(String),
    /// Semantic role, matched exactly
    Role(Role),
    /// Label text, matched by case-insensitive containment
    LabelText(String),
    /// Rendered text content, matched by case-insensitive containment
    Text(String),
}

impl Selector {
    /// Select by explicit id
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Select by role
    #[must_use]
    pub const fn role(role: Role) -> Self {
        Self::Role(role)
    }

    /// Select by label text (case-insensitive containment)
    #[must_use]
    pub fn label(text: impl Into<String>) -> Self {
        Self::LabelText(text.into())
    }

    /// Select by rendered text content (case-insensitive containment)
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id {id:?}"),
            Self::Role(role) => write!(f, "role {role}"),
            Self::LabelText(text) => write!(f, "label {text:?}"),
            Self::Text(text) => write!(f, "text {text:?}"),
        }
    }
}

/// How selector resolution treats multiple matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Exactly one match required; more is an error
    #[default]
    Strict,
    /// Take the first match in tree order
    First,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Pure element data to mount, before a handle is assigned
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementSpec {
    /// Optional explicit id
    pub id: Option<String>,
    /// Semantic role
    pub role: Role,
    /// Optional label
    pub label: Option<String>,
    /// Rendered text content
    pub text: String,
    /// Current input value
    pub value: String,
    /// Arbitrary string attributes
    pub attributes: HashMap<String, String>,
}

impl ElementSpec {
    /// Create a spec with the given role
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            role,
            ..Self::default()
        }
    }

    /// Set the explicit id
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the label
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the input value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Add an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

/// A mounted element
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    /// Internal handle
    pub key: ElementId,
    /// Optional explicit id
    pub id: Option<String>,
    /// Semantic role
    pub role: Role,
    /// Optional label
    pub label: Option<String>,
    /// Rendered text content
    pub text: String,
    /// Current input value
    pub value: String,
    /// Arbitrary string attributes
    pub attributes: HashMap<String, String>,
}

impl Element {
    fn from_spec(key: ElementId, spec: ElementSpec) -> Self {
        Self {
            key,
            id: spec.id,
            role: spec.role,
            label: spec.label,
            text: spec.text,
            value: spec.value,
            attributes: spec.attributes,
        }
    }

    /// Whether this element matches a selector
    #[must_use]
    pub fn matches(&self, selector: &Selector) -> bool {
        match selector {
            Selector::Id(id) => self.id.as_deref() == Some(id.as_str()),
            Selector::Role(role) => self.role == *role,
            Selector::LabelText(needle) => self
                .label
                .as_deref()
                .is_some_and(|label| contains_ci(label, needle)),
            Selector::Text(needle) => contains_ci(&self.text, needle),
        }
    }

    /// Get an attribute value
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// The mutable snapshot of rendered state.
///
/// Written only by transitions drained from the scheduler (plus the
/// mount/unmount lifecycle); read by the assertion facade and wait
/// predicates between flushes, never mid-flush.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ObservableState {
    elements: Vec<Element>,
    mounted: bool,
    next_key: u64,
}

impl ObservableState {
    /// Create an empty, unmounted state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a tree is currently mounted
    #[must_use]
    pub const fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub(crate) fn mount(&mut self) {
        self.mounted = true;
    }

    pub(crate) fn unmount(&mut self) {
        self.elements.clear();
        self.mounted = false;
    }

    /// Number of mounted elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the tree has no elements
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Insert an element, assigning it a fresh handle
    pub fn insert(&mut self, spec: ElementSpec) -> ElementId {
        let key = ElementId::new(self.next_key);
        self.next_key += 1;
        self.elements.push(Element::from_spec(key, spec));
        key
    }

    /// Remove an element by handle
    pub fn remove(&mut self, key: ElementId) -> AsentarResult<()> {
        let index = self
            .elements
            .iter()
            .position(|element| element.key == key)
            .ok_or_else(|| AsentarError::NotFound {
                selector: format!("element {key}"),
            })?;
        self.elements.remove(index);
        Ok(())
    }

    /// Get an element by handle
    pub fn element(&self, key: ElementId) -> AsentarResult<&Element> {
        self.elements
            .iter()
            .find(|element| element.key == key)
            .ok_or_else(|| AsentarError::NotFound {
                selector: format!("element {key}"),
            })
    }

    /// Get an element mutably by handle
    pub fn element_mut(&mut self, key: ElementId) -> AsentarResult<&mut Element> {
        self.elements
            .iter_mut()
            .find(|element| element.key == key)
            .ok_or_else(|| AsentarError::NotFound {
                selector: format!("element {key}"),
            })
    }

    /// Replace an element's text content
    pub fn set_text(&mut self, key: ElementId, text: impl Into<String>) -> AsentarResult<()> {
        self.element_mut(key)?.text = text.into();
        Ok(())
    }

    /// Replace an element's input value
    pub fn set_value(&mut self, key: ElementId, value: impl Into<String>) -> AsentarResult<()> {
        self.element_mut(key)?.value = value.into();
        Ok(())
    }

    /// Set an attribute on an element
    pub fn set_attribute(
        &mut self,
        key: ElementId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> AsentarResult<()> {
        self.element_mut(key)?
            .attributes
            .insert(name.into(), value.into());
        Ok(())
    }

    /// All elements matching a selector, in tree order
    #[must_use]
    pub fn query_all(&self, selector: &Selector) -> Vec<&Element> {
        self.elements
            .iter()
            .filter(|element| element.matches(selector))
            .collect()
    }

    /// First element matching a selector, if any
    #[must_use]
    pub fn query(&self, selector: &Selector) -> Option<&Element> {
        self.elements.iter().find(|element| element.matches(selector))
    }

    /// Resolve a selector to a single element handle.
    ///
    /// Zero matches is [`AsentarError::NotFound`]. Multiple matches is
    /// [`AsentarError::AmbiguousMatch`] under [`MatchMode::Strict`]; under
    /// [`MatchMode::First`] the first match in tree order wins.
    pub fn resolve(&self, selector: &Selector, mode: MatchMode) -> AsentarResult<ElementId> {
        let matches = self.query_all(selector);
        match (matches.len(), mode) {
            (0, _) => Err(AsentarError::NotFound {
                selector: selector.to_string(),
            }),
            (1, _) | (_, MatchMode::First) => Ok(matches[0].key),
            (count, MatchMode::Strict) => Err(AsentarError::AmbiguousMatch {
                selector: selector.to_string(),
                count,
            }),
        }
    }
}
