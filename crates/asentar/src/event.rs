//! Interaction and primitive event types.
//!
//! A high-level [`Interaction`] is what a test asks for ("type this text
//! into that field"). The dispatcher decomposes it into [`PrimitiveEvent`]s
//! (one keypress per character) and enqueues one transition per primitive,
//! all tagged with the same origin [`EventId`].

use crate::tree::Selector;
use serde::{Deserialize, Serialize};

/// Identifier of a high-level interaction, stamped onto every transition
/// it produces.
///
/// Ids are allocated sequentially by the scheduler; the engine is
/// deterministic by contract, so ordering-friendly ids beat random ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(u64);

impl EventId {
    /// Create an event id from a raw counter value
    #[must_use]
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw counter value
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "evt-{}", self.0)
    }
}

/// Kind of a high-level interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionKind {
    /// Activate the target element
    Click,
    /// Type text into the target element, one keypress per character
    Type,
    /// Empty the target element's value
    Clear,
}

impl InteractionKind {
    /// Get the kind name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Type => "type",
            Self::Clear => "clear",
        }
    }
}

impl std::fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A primitive input event produced by decomposing an interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimitiveEvent {
    /// Activate the element
    Click,
    /// A single keystroke appending one character to the element's value
    KeyPress(char),
    /// Empty the element's value
    ClearValue,
}

/// A high-level simulated user interaction.
///
/// Transient: consumed immediately by the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    /// What to do
    pub kind: InteractionKind,
    /// Which element to do it to
    pub target: Selector,
    /// Text payload, for [`InteractionKind::Type`]
    pub payload: Option<String>,
}

impl Interaction {
    /// A click on the target
    #[must_use]
    pub const fn click(target: Selector) -> Self {
        Self {
            kind: InteractionKind::Click,
            target,
            payload: None,
        }
    }

    /// Typing `text` into the target
    #[must_use]
    pub fn type_text(target: Selector, text: impl Into<String>) -> Self {
        Self {
            kind: InteractionKind::Type,
            target,
            payload: Some(text.into()),
        }
    }

    /// Clearing the target's value
    #[must_use]
    pub const fn clear(target: Selector) -> Self {
        Self {
            kind: InteractionKind::Clear,
            target,
            payload: None,
        }
    }

    /// Decompose into primitive events, in dispatch order.
    ///
    /// `Click` and `Clear` are single primitives; `Type` yields one
    /// [`PrimitiveEvent::KeyPress`] per character of the payload, so typing
    /// an empty string yields no primitives at all.
    #[must_use]
    pub fn primitives(&self) -> Vec<PrimitiveEvent> {
        match self.kind {
            InteractionKind::Click => vec![PrimitiveEvent::Click],
            InteractionKind::Clear => vec![PrimitiveEvent::ClearValue],
            InteractionKind::Type => self
                .payload
                .as_deref()
                .unwrap_or_default()
                .chars()
                .map(PrimitiveEvent::KeyPress)
                .collect(),
        }
    }
}
