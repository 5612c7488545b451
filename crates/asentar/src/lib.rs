//! Asentar: deterministic flush-and-wait engine for UI test harnesses.
//!
//! Asentar (Spanish: "to settle") is the synchronous-update-flush plus
//! async-wait-for-condition core that UI test harnesses are built on: it
//! renders a tree description into an in-memory host, dispatches simulated
//! user interactions, settles pending state transitions synchronously
//! before every assertion, and waits for asynchronous conditions with
//! timeout and polling semantics.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     ASENTAR Architecture                         │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   enqueue   ┌────────────┐   flush  ┌─────────┐  │
//! │  │ Dispatcher │────────────►│ Scheduler  │─────────►│Observ-  │  │
//! │  │ click/type │             │ FIFO +     │          │able     │  │
//! │  └────────────┘             │ deferred   │          │State    │  │
//! │  ┌────────────┐  settle+    └────────────┘          └────┬────┘  │
//! │  │ Poller     │──each tick───────┘                       │ read  │
//! │  │ wait_for   │             ┌────────────┐               │       │
//! │  └────────────┘             │ Assertions │◄──────────────┘       │
//! │                             │ expect()   │                       │
//! │                             └────────────┘                       │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything is single-threaded and cooperative: "asynchronous" behavior
//! is deferred callbacks drained explicitly by `flush()` or implicitly by
//! the poller's tick loop, so ordering is fully deterministic.
//!
//! # Example
//!
//! ```
//! use asentar::prelude::*;
//!
//! let harness = Harness::new();
//! let view = harness
//!     .render(
//!         Tree::new()
//!             .child(Node::status().id("message").text("Current count: 0"))
//!             .child(Node::button("Increment").on_click(|state, _| {
//!                 let key = state.resolve(&Selector::id("message"), MatchMode::Strict)?;
//!                 state.set_text(key, "Current count: 1")
//!             })),
//!     )
//!     .unwrap();
//!
//! harness.user().click(&Selector::label("Increment")).unwrap();
//! expect_text(view.text_of(&Selector::id("message")).unwrap())
//!     .to_equal("Current count: 1")
//!     .unwrap();
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod assertion;
mod dispatch;
mod event;
mod harness;
mod result;
mod scheduler;
mod tree;

/// Deterministic request/response stubbing
pub mod network;

/// Wait mechanisms: condition polling with timeout
pub mod wait;

pub use assertion::{
    expect, expect_present, expect_text, PresenceExpectation, TextExpectation, TextPattern,
    ValueExpectation,
};
pub use dispatch::{Dispatcher, PendingInteraction};
pub use event::{EventId, Interaction, InteractionKind, PrimitiveEvent};
pub use harness::{Harness, Node, RenderHandle, Tree};
pub use network::{
    FixtureServer, HttpMethod, Responder, Route, StubRequest, StubResponse, UrlPattern,
};
pub use result::{AsentarError, AsentarResult};
pub use scheduler::{EffectFn, PendingTransition, Scheduler, TransitionFn};
pub use tree::{
    Element, ElementId, ElementSpec, MatchMode, ObservableState, Role, Selector,
};
pub use wait::{
    poll_until, poll_until_cancellable, poll_until_removed, wait_until, Check, WaitOptions,
    WaitOutcome, WaitResult, WaitToken, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS,
};

/// Convenience re-exports for test code
pub mod prelude {
    pub use super::assertion::*;
    pub use super::dispatch::*;
    pub use super::event::*;
    pub use super::harness::*;
    pub use super::network::*;
    pub use super::result::*;
    pub use super::scheduler::*;
    pub use super::tree::*;
    pub use super::wait::*;
}
