//! Interaction dispatcher: turn high-level user intents into queued
//! transitions.
//!
//! Each call resolves its target once, decomposes the interaction into
//! primitive events, and enqueues one transition per primitive, all
//! stamped with a single fresh origin id. The synchronous methods
//! (`click`, `type_text`, `clear`) flush immediately after enqueueing, so
//! the observable state is settled when they return. The deferred
//! `queue_*` variants skip the flush and hand back a
//! [`PendingInteraction`] that either settles or cancels.

use crate::event::{EventId, Interaction, PrimitiveEvent};
use crate::harness::Harness;
use crate::result::AsentarResult;
use crate::tree::{ElementId, MatchMode, Selector};

/// Dispatcher of simulated user interactions.
///
/// Strict target resolution by default; [`Dispatcher::first_match`] opts
/// into first-match semantics for the calls made through that handle.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'h> {
    harness: &'h Harness,
    mode: MatchMode,
}

impl<'h> Dispatcher<'h> {
    pub(crate) const fn new(harness: &'h Harness) -> Self {
        Self {
            harness,
            mode: MatchMode::Strict,
        }
    }

    /// Resolve ambiguous selectors to their first match instead of failing
    #[must_use]
    pub const fn first_match(mut self) -> Self {
        self.mode = MatchMode::First;
        self
    }

    /// Click the target and flush
    pub fn click(&self, target: &Selector) -> AsentarResult<()> {
        self.queue_click(target)?.settle()
    }

    /// Type text into the target, one keystroke per character, and flush
    pub fn type_text(&self, target: &Selector, text: &str) -> AsentarResult<()> {
        self.queue_type(target, text)?.settle()
    }

    /// Empty the target's value and flush
    pub fn clear(&self, target: &Selector) -> AsentarResult<()> {
        self.queue_clear(target)?.settle()
    }

    /// Enqueue a click without flushing
    pub fn queue_click(&self, target: &Selector) -> AsentarResult<PendingInteraction<'h>> {
        self.queue(Interaction::click(target.clone()))
    }

    /// Enqueue typing without flushing
    pub fn queue_type(
        &self,
        target: &Selector,
        text: &str,
    ) -> AsentarResult<PendingInteraction<'h>> {
        self.queue(Interaction::type_text(target.clone(), text))
    }

    /// Enqueue a clear without flushing
    pub fn queue_clear(&self, target: &Selector) -> AsentarResult<PendingInteraction<'h>> {
        self.queue(Interaction::clear(target.clone()))
    }

    fn queue(&self, interaction: Interaction) -> AsentarResult<PendingInteraction<'h>> {
        let key = self.harness.resolve(&interaction.target, self.mode)?;
        let scheduler = self.harness.scheduler();
        let origin = scheduler.next_event_id();

        let primitives = interaction.primitives();
        let enqueued = primitives.len();
        for primitive in primitives {
            self.enqueue_primitive(origin, key, primitive);
        }
        tracing::debug!(
            origin = %origin,
            kind = %interaction.kind,
            selector = %interaction.target,
            enqueued,
            "interaction queued"
        );
        Ok(PendingInteraction {
            harness: self.harness,
            origin,
            enqueued,
        })
    }

    fn enqueue_primitive(&self, origin: EventId, key: ElementId, primitive: PrimitiveEvent) {
        let scheduler = self.harness.scheduler();
        match primitive {
            PrimitiveEvent::Click => {
                let handler = self.harness.click_handler(key);
                scheduler.enqueue(origin, move |state, scheduler| {
                    // the target may have been removed between enqueue and drain
                    state.element(key)?;
                    if let Some(handler) = handler {
                        (handler.borrow_mut())(state, scheduler)?;
                    }
                    Ok(())
                });
            }
            PrimitiveEvent::KeyPress(ch) => {
                let handler = self.harness.input_handler(key);
                scheduler.enqueue(origin, move |state, scheduler| {
                    state.element_mut(key)?.value.push(ch);
                    if let Some(handler) = handler {
                        (handler.borrow_mut())(state, scheduler)?;
                    }
                    Ok(())
                });
            }
            PrimitiveEvent::ClearValue => {
                let handler = self.harness.input_handler(key);
                scheduler.enqueue(origin, move |state, scheduler| {
                    state.element_mut(key)?.value.clear();
                    if let Some(handler) = handler {
                        (handler.borrow_mut())(state, scheduler)?;
                    }
                    Ok(())
                });
            }
        }
    }
}

/// Handle for an interaction that was enqueued but not yet flushed.
///
/// Either settle it (flush, applying its transitions and anything else
/// pending) or cancel it (remove its not-yet-drained transitions; work
/// already applied stays applied).
#[derive(Debug)]
pub struct PendingInteraction<'h> {
    harness: &'h Harness,
    origin: EventId,
    enqueued: usize,
}

impl PendingInteraction<'_> {
    /// Origin id shared by this interaction's transitions
    #[must_use]
    pub const fn origin(&self) -> EventId {
        self.origin
    }

    /// How many primitive transitions this interaction enqueued
    #[must_use]
    pub const fn enqueued(&self) -> usize {
        self.enqueued
    }

    /// Flush the scheduler, applying this interaction's transitions
    pub fn settle(self) -> AsentarResult<()> {
        self.harness.flush()?;
        Ok(())
    }

    /// Remove this interaction's queued transitions; returns how many were
    /// removed
    pub fn cancel(self) -> usize {
        self.harness.scheduler().cancel_origin(self.origin)
    }
}
