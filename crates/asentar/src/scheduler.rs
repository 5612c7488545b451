//! Action scheduler: queued state transitions and the synchronous flush.
//!
//! Simulated interactions never mutate observable state directly; they
//! enqueue [`PendingTransition`]s, and `flush()` drains the queue in FIFO
//! order until it is empty. Work enqueued *by* a draining transition joins
//! the same drain (recursive settlement), so when `flush()` returns the
//! state reflects every synchronous effect of the original batch.
//!
//! Two lanes:
//!
//! - the immediate lane (`enqueue`) is drained by the current flush,
//!   including recursively;
//! - the deferred lane (`enqueue_deferred`) is promoted to the back of the
//!   immediate queue at the *start of the next* flush. This is the slot
//!   for completions that arrive after the current settlement, such as a
//!   stubbed backend response: the triggering click's flush leaves them
//!   untouched, and the first poll tick of a later wait applies them.
//!
//! A transition that fails aborts the flush; transitions applied before
//! the failure stay applied, and the un-drained remainder stays queued.

use crate::event::EventId;
use crate::result::{AsentarError, AsentarResult};
use crate::tree::ObservableState;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// Work payload of a transition.
///
/// The scheduler reference lets a draining transition enqueue follow-ups
/// onto either lane. Returning `Err` is how a transition "throws".
pub type TransitionFn = Box<dyn FnOnce(&mut ObservableState, &Scheduler) -> AsentarResult<()>>;

/// Shared handler payload registered at render time.
///
/// Handlers are `FnMut` behind `Rc<RefCell<_>>` so a single handler can be
/// invoked by many transitions over the test's lifetime.
pub type EffectFn = Rc<RefCell<dyn FnMut(&mut ObservableState, &Scheduler) -> AsentarResult<()>>>;

/// A deferred unit of state-mutating work, owned by the scheduler queue
/// until drained.
pub struct PendingTransition {
    seq: u64,
    origin: EventId,
    work: TransitionFn,
}

impl PendingTransition {
    /// Ordering sequence number, allocated at enqueue time
    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    /// Origin event this transition descends from
    #[must_use]
    pub const fn origin(&self) -> EventId {
        self.origin
    }
}

impl std::fmt::Debug for PendingTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingTransition")
            .field("seq", &self.seq)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct SchedulerInner {
    queue: RefCell<VecDeque<PendingTransition>>,
    deferred: RefCell<VecDeque<PendingTransition>>,
    next_seq: Cell<u64>,
    next_event: Cell<u64>,
    flushing: Cell<bool>,
}

/// The action scheduler.
///
/// Cheaply cloneable handle over shared single-threaded internals, so
/// handlers and transitions can hold their own copy.
#[derive(Clone, Default)]
pub struct Scheduler {
    inner: Rc<SchedulerInner>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("queued", &self.queued_len())
            .field("deferred", &self.deferred_len())
            .field("flushing", &self.is_flushing())
            .finish()
    }
}

impl Scheduler {
    /// Create an empty scheduler
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh origin id for a high-level interaction
    pub fn next_event_id(&self) -> EventId {
        let raw = self.inner.next_event.get();
        self.inner.next_event.set(raw + 1);
        EventId::new(raw)
    }

    fn make_transition(
        &self,
        origin: EventId,
        work: impl FnOnce(&mut ObservableState, &Scheduler) -> AsentarResult<()> + 'static,
    ) -> PendingTransition {
        let seq = self.inner.next_seq.get();
        self.inner.next_seq.set(seq + 1);
        PendingTransition {
            seq,
            origin,
            work: Box::new(work),
        }
    }

    /// Append a transition to the immediate lane; returns its sequence
    /// number. Drained by the current or next `flush()`.
    pub fn enqueue(
        &self,
        origin: EventId,
        work: impl FnOnce(&mut ObservableState, &Scheduler) -> AsentarResult<()> + 'static,
    ) -> u64 {
        let transition = self.make_transition(origin, work);
        let seq = transition.seq;
        self.inner.queue.borrow_mut().push_back(transition);
        seq
    }

    /// Append a transition to the deferred lane; returns its sequence
    /// number. Never drained by the flush during which it was enqueued;
    /// it joins the immediate queue when the next flush starts.
    pub fn enqueue_deferred(
        &self,
        origin: EventId,
        work: impl FnOnce(&mut ObservableState, &Scheduler) -> AsentarResult<()> + 'static,
    ) -> u64 {
        let transition = self.make_transition(origin, work);
        let seq = transition.seq;
        self.inner.deferred.borrow_mut().push_back(transition);
        seq
    }

    /// Current immediate-lane depth
    #[must_use]
    pub fn queued_len(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    /// Current deferred-lane depth
    #[must_use]
    pub fn deferred_len(&self) -> usize {
        self.inner.deferred.borrow().len()
    }

    /// Whether a flush is currently draining
    #[must_use]
    pub fn is_flushing(&self) -> bool {
        self.inner.flushing.get()
    }

    /// Remove all not-yet-drained transitions with the given origin, from
    /// both lanes; returns how many were removed. Already-applied work is
    /// untouched.
    pub fn cancel_origin(&self, origin: EventId) -> usize {
        let mut removed = 0;
        for lane in [&self.inner.queue, &self.inner.deferred] {
            let mut lane = lane.borrow_mut();
            let before = lane.len();
            lane.retain(|transition| transition.origin != origin);
            removed += before - lane.len();
        }
        if removed > 0 {
            tracing::debug!(origin = %origin, removed, "cancelled queued transitions");
        }
        removed
    }

    /// Drain and execute all queued transitions in FIFO order, recursively,
    /// until the immediate queue is empty. Returns how many were applied.
    ///
    /// A no-op on an empty queue. A failing transition aborts the drain
    /// and surfaces as [`AsentarError::Transition`]; prior transitions stay
    /// applied and the remainder stays queued. Calling `flush` from inside
    /// a draining transition is an invalid-state error.
    pub fn flush(&self, state: &mut ObservableState) -> AsentarResult<usize> {
        if self.inner.flushing.get() {
            return Err(AsentarError::invalid_state(
                "flush called re-entrantly from inside a draining transition",
            ));
        }
        self.inner.flushing.set(true);

        // Deferred work from earlier settlements joins this batch.
        {
            let mut deferred = self.inner.deferred.borrow_mut();
            let mut queue = self.inner.queue.borrow_mut();
            queue.append(&mut deferred);
        }

        let mut applied = 0;
        loop {
            // Pop with a scoped borrow so the work closure may re-enter
            // `enqueue` while it runs.
            let Some(transition) = self.inner.queue.borrow_mut().pop_front() else {
                break;
            };
            let (seq, origin) = (transition.seq, transition.origin);
            tracing::trace!(seq, origin = %origin, "applying transition");
            if let Err(source) = (transition.work)(state, self) {
                self.inner.flushing.set(false);
                return Err(AsentarError::Transition {
                    origin,
                    seq,
                    source: Box::new(source),
                });
            }
            applied += 1;
        }

        self.inner.flushing.set(false);
        if applied > 0 {
            tracing::debug!(applied, "flush settled");
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{ElementSpec, Role, Selector};
    use crate::tree::MatchMode;

    fn scheduler_and_state() -> (Scheduler, ObservableState) {
        (Scheduler::new(), ObservableState::new())
    }

    mod flush_tests {
        use super::*;

        #[test]
        fn test_flush_empty_queue_is_noop() {
            let (scheduler, mut state) = scheduler_and_state();
            assert_eq!(scheduler.flush(&mut state).unwrap(), 0);
            assert_eq!(scheduler.flush(&mut state).unwrap(), 0);
        }

        #[test]
        fn test_flush_applies_and_empties_queue() {
            let (scheduler, mut state) = scheduler_and_state();
            let origin = scheduler.next_event_id();
            scheduler.enqueue(origin, |state, _| {
                state.insert(ElementSpec::new(Role::Status).with_text("ready"));
                Ok(())
            });
            assert_eq!(scheduler.queued_len(), 1);
            assert_eq!(scheduler.flush(&mut state).unwrap(), 1);
            assert_eq!(scheduler.queued_len(), 0);
            assert!(state.query(&Selector::text("ready")).is_some());
        }

        #[test]
        fn test_nested_enqueue_settles_within_same_flush() {
            let (scheduler, mut state) = scheduler_and_state();
            let origin = scheduler.next_event_id();
            scheduler.enqueue(origin, move |state, scheduler| {
                state.insert(ElementSpec::new(Role::Status).with_text("outer"));
                scheduler.enqueue(origin, |state, _| {
                    state.insert(ElementSpec::new(Role::Status).with_text("inner"));
                    Ok(())
                });
                Ok(())
            });
            assert_eq!(scheduler.flush(&mut state).unwrap(), 2);
            assert!(state.query(&Selector::text("outer")).is_some());
            assert!(state.query(&Selector::text("inner")).is_some());
            assert_eq!(scheduler.queued_len(), 0);
        }

        #[test]
        fn test_failing_transition_aborts_and_keeps_partial_progress() {
            let (scheduler, mut state) = scheduler_and_state();
            let origin = scheduler.next_event_id();
            scheduler.enqueue(origin, |state, _| {
                state.insert(ElementSpec::new(Role::Status).with_text("applied"));
                Ok(())
            });
            scheduler.enqueue(origin, |_, _| {
                Err(AsentarError::invalid_state("handler exploded"))
            });
            scheduler.enqueue(origin, |state, _| {
                state.insert(ElementSpec::new(Role::Status).with_text("never"));
                Ok(())
            });

            let err = scheduler.flush(&mut state).unwrap_err();
            match err {
                AsentarError::Transition { origin: o, source, .. } => {
                    assert_eq!(o, origin);
                    assert!(source.to_string().contains("handler exploded"));
                }
                other => panic!("expected Transition error, got {other:?}"),
            }
            // the first transition stays applied, the third stays queued
            assert!(state.query(&Selector::text("applied")).is_some());
            assert!(state.query(&Selector::text("never")).is_none());
            assert_eq!(scheduler.queued_len(), 1);

            // the flush is retryable
            assert_eq!(scheduler.flush(&mut state).unwrap(), 1);
            assert!(state.query(&Selector::text("never")).is_some());
        }

        #[test]
        fn test_reentrant_flush_is_invalid_state() {
            let (scheduler, mut state) = scheduler_and_state();
            let origin = scheduler.next_event_id();
            scheduler.enqueue(origin, |state, scheduler| {
                let mut scratch = ObservableState::new();
                let _ = state;
                scheduler.flush(&mut scratch).map(|_| ())
            });
            let err = scheduler.flush(&mut state).unwrap_err();
            assert!(err.to_string().contains("re-entrantly"));
            assert!(!scheduler.is_flushing());
        }

        #[test]
        fn test_flushing_flag_resets_after_error() {
            let (scheduler, mut state) = scheduler_and_state();
            let origin = scheduler.next_event_id();
            scheduler.enqueue(origin, |_, _| Err(AsentarError::invalid_state("boom")));
            assert!(scheduler.flush(&mut state).is_err());
            assert!(!scheduler.is_flushing());
            assert_eq!(scheduler.flush(&mut state).unwrap(), 0);
        }
    }

    mod deferred_tests {
        use super::*;

        #[test]
        fn test_deferred_work_survives_current_flush() {
            let (scheduler, mut state) = scheduler_and_state();
            let origin = scheduler.next_event_id();
            scheduler.enqueue(origin, move |state, scheduler| {
                state.insert(ElementSpec::new(Role::Status).with_text("loading"));
                scheduler.enqueue_deferred(origin, |state, _| {
                    let key = state.resolve(&Selector::text("loading"), MatchMode::Strict)?;
                    state.remove(key)
                });
                Ok(())
            });

            assert_eq!(scheduler.flush(&mut state).unwrap(), 1);
            assert!(state.query(&Selector::text("loading")).is_some());
            assert_eq!(scheduler.deferred_len(), 1);

            assert_eq!(scheduler.flush(&mut state).unwrap(), 1);
            assert!(state.query(&Selector::text("loading")).is_none());
            assert_eq!(scheduler.deferred_len(), 0);
        }

        #[test]
        fn test_deferred_promotes_behind_queued_immediates() {
            let (scheduler, mut state) = scheduler_and_state();
            let order = Rc::new(RefCell::new(Vec::new()));
            let origin = scheduler.next_event_id();
            {
                let order = Rc::clone(&order);
                scheduler.enqueue_deferred(origin, move |_, _| {
                    order.borrow_mut().push("deferred");
                    Ok(())
                });
            }
            {
                let order = Rc::clone(&order);
                scheduler.enqueue(origin, move |_, _| {
                    order.borrow_mut().push("immediate");
                    Ok(())
                });
            }
            scheduler.flush(&mut state).unwrap();
            assert_eq!(&*order.borrow(), &["immediate", "deferred"]);
        }
    }

    mod cancel_tests {
        use super::*;

        #[test]
        fn test_cancel_origin_removes_only_that_origin() {
            let (scheduler, mut state) = scheduler_and_state();
            let kept = scheduler.next_event_id();
            let dropped = scheduler.next_event_id();
            scheduler.enqueue(kept, |state, _| {
                state.insert(ElementSpec::new(Role::Status).with_text("kept"));
                Ok(())
            });
            scheduler.enqueue(dropped, |state, _| {
                state.insert(ElementSpec::new(Role::Status).with_text("dropped"));
                Ok(())
            });
            scheduler.enqueue_deferred(dropped, |state, _| {
                state.insert(ElementSpec::new(Role::Status).with_text("dropped-late"));
                Ok(())
            });

            assert_eq!(scheduler.cancel_origin(dropped), 2);
            assert_eq!(scheduler.flush(&mut state).unwrap(), 1);
            assert!(state.query(&Selector::text("kept")).is_some());
            assert!(state.query(&Selector::text("dropped")).is_none());
        }

        #[test]
        fn test_cancel_unknown_origin_is_zero() {
            let (scheduler, _) = scheduler_and_state();
            let origin = scheduler.next_event_id();
            assert_eq!(scheduler.cancel_origin(origin), 0);
        }
    }

    mod id_tests {
        use super::*;

        #[test]
        fn test_event_ids_are_sequential() {
            let scheduler = Scheduler::new();
            let a = scheduler.next_event_id();
            let b = scheduler.next_event_id();
            assert!(a < b);
        }

        #[test]
        fn test_sequence_numbers_are_monotonic_across_lanes() {
            let scheduler = Scheduler::new();
            let origin = scheduler.next_event_id();
            let first = scheduler.enqueue(origin, |_, _| Ok(()));
            let second = scheduler.enqueue_deferred(origin, |_, _| Ok(()));
            let third = scheduler.enqueue(origin, |_, _| Ok(()));
            assert!(first < second && second < third);
        }
    }

    mod ordering_properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_flush_applies_in_fifo_order_and_empties_queue(
                labels in prop::collection::vec(any::<u8>(), 0..64)
            ) {
                let scheduler = Scheduler::new();
                let mut state = ObservableState::new();
                let seen = Rc::new(RefCell::new(Vec::new()));
                let origin = scheduler.next_event_id();
                for &label in &labels {
                    let seen = Rc::clone(&seen);
                    scheduler.enqueue(origin, move |_, _| {
                        seen.borrow_mut().push(label);
                        Ok(())
                    });
                }
                let applied = scheduler.flush(&mut state).unwrap();
                prop_assert_eq!(applied, labels.len());
                prop_assert_eq!(&*seen.borrow(), &labels);
                prop_assert_eq!(scheduler.queued_len(), 0);
            }
        }
    }
}
