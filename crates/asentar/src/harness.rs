//! Test harness: owns the observable state and the scheduler, renders
//! trees, and wires the dispatcher, poller and assertion facade together.
//!
//! The state container is explicit and pure; the handlers a tree brings
//! along are registered in a side table keyed by element handle, never
//! stored inside the state they mutate. A handler receives the state by
//! reference together with the scheduler, so it can mutate settled state
//! directly and enqueue follow-up transitions for anything that should
//! arrive later.
//!
//! Reads go through `try_borrow`: while a flush is draining, the state is
//! mutably borrowed, and any read through the harness surfaces an
//! invalid-state error instead of observing partial settlement.

use crate::dispatch::Dispatcher;
use crate::result::{AsentarError, AsentarResult};
use crate::scheduler::{EffectFn, Scheduler};
use crate::tree::{Element, ElementId, ElementSpec, MatchMode, ObservableState, Role, Selector};
use crate::wait::{self, Check, WaitOptions, WaitOutcome, WaitResult, WaitToken};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::Rc;

// =============================================================================
// TREE BUILDERS
// =============================================================================

/// One element of a tree to render: pure element data plus the handlers
/// that react to interactions with it.
pub struct Node {
    spec: ElementSpec,
    on_click: Option<EffectFn>,
    on_input: Option<EffectFn>,
}

impl Node {
    /// Create a node with the given role
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            spec: ElementSpec::new(role),
            on_click: None,
            on_input: None,
        }
    }

    /// A button with a label
    #[must_use]
    pub fn button(label: impl Into<String>) -> Self {
        Self::new(Role::Button).label(label)
    }

    /// A text input with a label
    #[must_use]
    pub fn text_box(label: impl Into<String>) -> Self {
        Self::new(Role::TextBox).label(label)
    }

    /// A non-urgent live region
    #[must_use]
    pub fn status() -> Self {
        Self::new(Role::Status)
    }

    /// An urgent live region
    #[must_use]
    pub fn alert() -> Self {
        Self::new(Role::Alert)
    }

    /// Set the explicit id
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.spec = self.spec.with_id(id);
        self
    }

    /// Set the label
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.spec = self.spec.with_label(label);
        self
    }

    /// Set the text content
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.spec = self.spec.with_text(text);
        self
    }

    /// Set the initial input value
    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.spec = self.spec.with_value(value);
        self
    }

    /// Add an attribute
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.spec = self.spec.with_attribute(name, value);
        self
    }

    /// React to clicks on this element
    #[must_use]
    pub fn on_click(
        mut self,
        handler: impl FnMut(&mut ObservableState, &Scheduler) -> AsentarResult<()> + 'static,
    ) -> Self {
        self.on_click = Some(Rc::new(RefCell::new(handler)));
        self
    }

    /// React to value changes on this element; invoked after every
    /// keystroke and after a clear
    #[must_use]
    pub fn on_input(
        mut self,
        handler: impl FnMut(&mut ObservableState, &Scheduler) -> AsentarResult<()> + 'static,
    ) -> Self {
        self.on_input = Some(Rc::new(RefCell::new(handler)));
        self
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("spec", &self.spec)
            .field("on_click", &self.on_click.is_some())
            .field("on_input", &self.on_input.is_some())
            .finish()
    }
}

/// A tree of nodes to render
#[derive(Debug, Default)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Create an empty tree
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node
    #[must_use]
    pub fn child(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Number of nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

// =============================================================================
// HARNESS
// =============================================================================

#[derive(Default)]
struct NodeHandlers {
    on_click: Option<EffectFn>,
    on_input: Option<EffectFn>,
}

/// The test harness: observable state, scheduler, and handler registry.
#[derive(Default)]
pub struct Harness {
    state: RefCell<ObservableState>,
    scheduler: Scheduler,
    handlers: RefCell<HashMap<ElementId, NodeHandlers>>,
}

impl std::fmt::Debug for Harness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harness")
            .field("mounted", &self.is_mounted())
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

impl Harness {
    /// Create an empty harness
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The action scheduler
    #[must_use]
    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Dispatcher for simulated user interactions
    #[must_use]
    pub const fn user(&self) -> Dispatcher<'_> {
        Dispatcher::new(self)
    }

    fn borrow_state(&self) -> AsentarResult<Ref<'_, ObservableState>> {
        self.state.try_borrow().map_err(|_| {
            AsentarError::invalid_state(
                "observable state is being flushed; read it after the flush settles",
            )
        })
    }

    fn borrow_state_mut(&self) -> AsentarResult<RefMut<'_, ObservableState>> {
        self.state.try_borrow_mut().map_err(|_| {
            AsentarError::invalid_state(
                "observable state is being flushed; mutate it through a transition",
            )
        })
    }

    /// Whether a tree is currently mounted
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.state
            .try_borrow()
            .map(|state| state.is_mounted())
            .unwrap_or(false)
    }

    /// Mount a tree and register its handlers.
    ///
    /// Fails if a tree is already mounted; unmount it first.
    pub fn render(&self, tree: Tree) -> AsentarResult<RenderHandle<'_>> {
        let mut state = self.borrow_state_mut()?;
        if state.is_mounted() {
            return Err(AsentarError::invalid_state(
                "a tree is already mounted; unmount it before rendering another",
            ));
        }
        state.mount();
        let mut handlers = self.handlers.borrow_mut();
        let mounted = tree.nodes.len();
        for node in tree.nodes {
            let key = state.insert(node.spec);
            handlers.insert(
                key,
                NodeHandlers {
                    on_click: node.on_click,
                    on_input: node.on_input,
                },
            );
        }
        drop(handlers);
        drop(state);
        tracing::debug!(elements = mounted, "tree mounted");
        Ok(RenderHandle { harness: self })
    }

    /// Drain the scheduler into the observable state; returns how many
    /// transitions were applied
    pub fn flush(&self) -> AsentarResult<usize> {
        let mut state = self.borrow_state_mut()?;
        self.scheduler.flush(&mut state)
    }

    pub(crate) fn resolve(&self, selector: &Selector, mode: MatchMode) -> AsentarResult<ElementId> {
        self.borrow_state()?.resolve(selector, mode)
    }

    pub(crate) fn click_handler(&self, key: ElementId) -> Option<EffectFn> {
        self.handlers
            .borrow()
            .get(&key)
            .and_then(|handlers| handlers.on_click.clone())
    }

    pub(crate) fn input_handler(&self, key: ElementId) -> Option<EffectFn> {
        self.handlers
            .borrow()
            .get(&key)
            .and_then(|handlers| handlers.on_input.clone())
    }

    fn clear_handlers(&self) {
        self.handlers.borrow_mut().clear();
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// First element matching the selector, if any
    pub fn query(&self, selector: &Selector) -> AsentarResult<Option<Element>> {
        Ok(self.borrow_state()?.query(selector).cloned())
    }

    /// All elements matching the selector, in tree order
    pub fn query_all(&self, selector: &Selector) -> AsentarResult<Vec<Element>> {
        Ok(self
            .borrow_state()?
            .query_all(selector)
            .into_iter()
            .cloned()
            .collect())
    }

    /// The single element matching the selector; ambiguity is an error
    pub fn get(&self, selector: &Selector) -> AsentarResult<Element> {
        let state = self.borrow_state()?;
        let key = state.resolve(selector, MatchMode::Strict)?;
        Ok(state.element(key)?.clone())
    }

    /// The first element matching the selector; only zero matches is an
    /// error
    pub fn get_first(&self, selector: &Selector) -> AsentarResult<Element> {
        let state = self.borrow_state()?;
        let key = state.resolve(selector, MatchMode::First)?;
        Ok(state.element(key)?.clone())
    }

    /// Number of elements matching the selector
    pub fn count(&self, selector: &Selector) -> AsentarResult<usize> {
        Ok(self.borrow_state()?.query_all(selector).len())
    }

    /// Whether any element matches the selector. Unreadable state (a
    /// draining flush) reads as absent.
    #[must_use]
    pub fn exists(&self, selector: &Selector) -> bool {
        self.state
            .try_borrow()
            .map(|state| state.query(selector).is_some())
            .unwrap_or(false)
    }

    /// Text content of the single element matching the selector
    pub fn text_of(&self, selector: &Selector) -> AsentarResult<String> {
        Ok(self.get(selector)?.text)
    }

    /// Input value of the single element matching the selector
    pub fn value_of(&self, selector: &Selector) -> AsentarResult<String> {
        Ok(self.get(selector)?.value)
    }

    // =========================================================================
    // WAITS
    // =========================================================================

    /// Wait for a condition, settling the scheduler before every
    /// evaluation. See [`wait::poll_until`].
    pub fn wait_for<C>(&self, condition: C, options: &WaitOptions) -> AsentarResult<WaitResult>
    where
        C: FnMut() -> Check,
    {
        wait::poll_until(|| self.flush().map(|_| ()), condition, options)
    }

    /// Cancellable variant of [`Harness::wait_for`]. See
    /// [`wait::poll_until_cancellable`].
    pub fn wait_for_cancellable<C>(
        &self,
        condition: C,
        options: &WaitOptions,
        token: &WaitToken,
    ) -> AsentarResult<WaitOutcome>
    where
        C: FnMut() -> Check,
    {
        wait::poll_until_cancellable(|| self.flush().map(|_| ()), condition, options, token)
    }

    /// Wait for a currently-present target to go away. The presence
    /// predicate must be `true` at call time. See
    /// [`wait::poll_until_removed`].
    pub fn wait_for_removal<P>(&self, present: P, options: &WaitOptions) -> AsentarResult<WaitResult>
    where
        P: FnMut() -> bool,
    {
        wait::poll_until_removed(|| self.flush().map(|_| ()), present, options)
    }
}

// =============================================================================
// RENDER HANDLE
// =============================================================================

/// Handle over a mounted tree: scoped query functions plus `unmount`.
///
/// Queries fail with an invalid-state error once the tree is unmounted.
#[derive(Debug, Clone, Copy)]
pub struct RenderHandle<'h> {
    harness: &'h Harness,
}

impl<'h> RenderHandle<'h> {
    /// The harness this tree is mounted in
    #[must_use]
    pub const fn harness(&self) -> &'h Harness {
        self.harness
    }

    fn ensure_mounted(&self) -> AsentarResult<()> {
        if self.harness.is_mounted() {
            Ok(())
        } else {
            Err(AsentarError::invalid_state(
                "the tree was unmounted; render again before querying",
            ))
        }
    }

    /// See [`Harness::get`]
    pub fn get(&self, selector: &Selector) -> AsentarResult<Element> {
        self.ensure_mounted()?;
        self.harness.get(selector)
    }

    /// See [`Harness::get_first`]
    pub fn get_first(&self, selector: &Selector) -> AsentarResult<Element> {
        self.ensure_mounted()?;
        self.harness.get_first(selector)
    }

    /// See [`Harness::query`]
    pub fn query(&self, selector: &Selector) -> AsentarResult<Option<Element>> {
        self.ensure_mounted()?;
        self.harness.query(selector)
    }

    /// See [`Harness::query_all`]
    pub fn query_all(&self, selector: &Selector) -> AsentarResult<Vec<Element>> {
        self.ensure_mounted()?;
        self.harness.query_all(selector)
    }

    /// See [`Harness::count`]
    pub fn count(&self, selector: &Selector) -> AsentarResult<usize> {
        self.ensure_mounted()?;
        self.harness.count(selector)
    }

    /// See [`Harness::exists`]
    #[must_use]
    pub fn exists(&self, selector: &Selector) -> bool {
        self.harness.is_mounted() && self.harness.exists(selector)
    }

    /// See [`Harness::text_of`]
    pub fn text_of(&self, selector: &Selector) -> AsentarResult<String> {
        self.ensure_mounted()?;
        self.harness.text_of(selector)
    }

    /// See [`Harness::value_of`]
    pub fn value_of(&self, selector: &Selector) -> AsentarResult<String> {
        self.ensure_mounted()?;
        self.harness.value_of(selector)
    }

    /// Unmount the tree: clear all elements and drop their handlers
    pub fn unmount(self) -> AsentarResult<()> {
        self.ensure_mounted()?;
        self.harness.borrow_state_mut()?.unmount();
        self.harness.clear_handlers();
        tracing::debug!("tree unmounted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertion::{expect, expect_present, expect_text};
    use crate::network::{FixtureServer, HttpMethod, Route, StubRequest, StubResponse, UrlPattern};
    use serde_json::{json, Value};
    use std::cell::Cell;

    fn init_tracing() {
        use tracing_subscriber::EnvFilter;
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    mod lifecycle_tests {
        use super::*;

        #[test]
        fn test_render_then_query() {
            let harness = Harness::new();
            let view = harness
                .render(Tree::new().child(Node::status().id("message").text("hello")))
                .unwrap();
            assert_eq!(view.text_of(&Selector::id("message")).unwrap(), "hello");
            assert_eq!(view.count(&Selector::role(Role::Status)).unwrap(), 1);
        }

        #[test]
        fn test_render_while_mounted_is_invalid_state() {
            let harness = Harness::new();
            harness.render(Tree::new()).unwrap();
            let err = harness.render(Tree::new()).unwrap_err();
            assert!(err.to_string().contains("already mounted"));
        }

        #[test]
        fn test_query_after_unmount_is_invalid_state() {
            let harness = Harness::new();
            let view = harness
                .render(Tree::new().child(Node::status().id("message")))
                .unwrap();
            view.unmount().unwrap();
            let err = view.get(&Selector::id("message")).unwrap_err();
            assert!(err.to_string().contains("unmounted"));
            assert!(!view.exists(&Selector::id("message")));
        }

        #[test]
        fn test_unmount_then_render_again() {
            let harness = Harness::new();
            let view = harness
                .render(Tree::new().child(Node::status().id("first")))
                .unwrap();
            view.unmount().unwrap();
            let view = harness
                .render(Tree::new().child(Node::status().id("second")))
                .unwrap();
            assert!(view.exists(&Selector::id("second")));
            assert!(!view.exists(&Selector::id("first")));
        }
    }

    mod flush_boundary_tests {
        use super::*;
        use std::rc::Rc;

        #[test]
        fn test_state_read_mid_flush_is_invalid_state() {
            let harness = Rc::new(Harness::new());
            let probe = Rc::clone(&harness);
            harness
                .render(Tree::new().child(Node::button("Probe").on_click(move |_, _| {
                    probe.text_of(&Selector::label("Probe")).map(|_| ())
                })))
                .unwrap();

            let err = harness.user().click(&Selector::label("Probe")).unwrap_err();
            match err {
                AsentarError::Transition { source, .. } => {
                    assert!(source.to_string().contains("being flushed"));
                }
                other => panic!("expected Transition error, got {other:?}"),
            }
        }

        #[test]
        fn test_handler_mutates_state_and_enqueues_follow_up() {
            let harness = Harness::new();
            harness
                .render(Tree::new().child(Node::button("Go").on_click(|state, scheduler| {
                    let origin = scheduler.next_event_id();
                    state.insert(ElementSpec::new(Role::Status).with_text("first"));
                    scheduler.enqueue(origin, |state, _| {
                        state.insert(ElementSpec::new(Role::Status).with_text("second"));
                        Ok(())
                    });
                    Ok(())
                })))
                .unwrap();

            harness.user().click(&Selector::label("Go")).unwrap();
            // the nested transition settled within the same flush
            assert!(harness.exists(&Selector::text("first")));
            assert!(harness.exists(&Selector::text("second")));
            assert_eq!(harness.scheduler().queued_len(), 0);
        }
    }

    mod integration_tests {
        use super::*;
        use std::rc::Rc;

        fn increment_handler(
            count: Rc<Cell<i64>>,
            step: i64,
        ) -> impl FnMut(&mut ObservableState, &Scheduler) -> AsentarResult<()> {
            move |state, _| {
                count.set(count.get() + step);
                let key = state.resolve(&Selector::id("message"), MatchMode::Strict)?;
                state.set_text(key, format!("Current count: {}", count.get()))
            }
        }

        #[test]
        fn test_counter_increments_and_decrements_when_buttons_clicked() {
            init_tracing();
            let harness = Harness::new();
            let count = Rc::new(Cell::new(0i64));
            let message = Selector::id("message");

            let view = harness
                .render(
                    Tree::new()
                        .child(Node::status().id("message").text("Current count: 0"))
                        .child(
                            Node::button("Decrement")
                                .on_click(increment_handler(Rc::clone(&count), -1)),
                        )
                        .child(
                            Node::button("Increment")
                                .on_click(increment_handler(Rc::clone(&count), 1)),
                        ),
                )
                .unwrap();

            expect_text(view.text_of(&message).unwrap())
                .to_equal("Current count: 0")
                .unwrap();

            harness.user().click(&Selector::label("Increment")).unwrap();
            expect_text(view.text_of(&message).unwrap())
                .to_equal("Current count: 1")
                .unwrap();

            harness.user().click(&Selector::label("Decrement")).unwrap();
            expect_text(view.text_of(&message).unwrap())
                .to_equal("Current count: 0")
                .unwrap();
        }

        fn login_server() -> Rc<FixtureServer> {
            let server = Rc::new(FixtureServer::new());
            server.respond_with(HttpMethod::Post, "/api/login", |request| {
                let body: Value = request.body_json()?;
                if body["password"].as_str().unwrap_or("").is_empty() {
                    return Ok(StubResponse::error(400, "password required"));
                }
                if body["username"].as_str().unwrap_or("").is_empty() {
                    return Ok(StubResponse::error(400, "username required"));
                }
                StubResponse::json(&json!({ "username": body["username"] }))
            });
            server
        }

        /// A login form: submitting shows a loading indicator and defers
        /// the stubbed backend response to the next settlement, the way a
        /// real response would arrive after the click's own flush.
        fn login_tree(server: Rc<FixtureServer>) -> Tree {
            Tree::new()
                .child(Node::text_box("Username").id("username"))
                .child(Node::text_box("Password").id("password"))
                .child(Node::button("Submit").on_click(move |state, scheduler| {
                    let username = {
                        let key = state.resolve(&Selector::id("username"), MatchMode::Strict)?;
                        state.element(key)?.value.clone()
                    };
                    let password = {
                        let key = state.resolve(&Selector::id("password"), MatchMode::Strict)?;
                        state.element(key)?.value.clone()
                    };
                    let loading = state.insert(
                        ElementSpec::new(Role::Status)
                            .with_label("loading")
                            .with_text("signing in"),
                    );
                    let request = StubRequest::post("https://auth.example.dev/api/login")
                        .with_json(&json!({ "username": username, "password": password }))?;
                    let response = server.dispatch(request);

                    let origin = scheduler.next_event_id();
                    scheduler.enqueue_deferred(origin, move |state, _| {
                        state.remove(loading)?;
                        let body: Value = response.body_json()?;
                        if response.is_success() {
                            let name = body["username"].as_str().unwrap_or_default().to_string();
                            state.insert(
                                ElementSpec::new(Role::Status).with_id("greeting").with_text(name),
                            );
                        } else {
                            let message =
                                body["message"].as_str().unwrap_or("unknown error").to_string();
                            state.insert(ElementSpec::new(Role::Alert).with_text(message));
                        }
                        Ok(())
                    });
                    Ok(())
                }))
        }

        #[test]
        fn test_login_without_password_shows_alert() {
            init_tracing();
            let server = login_server();
            let harness = Harness::new();
            let view = harness.render(login_tree(Rc::clone(&server))).unwrap();
            let user = harness.user();

            user.type_text(&Selector::label("Username"), "chuck").unwrap();
            user.click(&Selector::label("Submit")).unwrap();

            // the indicator survives the click's flush; the deferred
            // response removes it at the next settlement
            let loading = Selector::label("loading");
            assert!(view.exists(&loading));
            let options = WaitOptions::new().with_timeout(500).with_poll_interval(10);
            harness
                .wait_for_removal(|| view.exists(&loading), &options)
                .unwrap();

            let alert = view.get(&Selector::role(Role::Alert)).unwrap();
            expect_text(alert.text).to_contain("password required").unwrap();
            server
                .assert_requested(&UrlPattern::Contains("/api/login".into()))
                .unwrap();
        }

        #[test]
        fn test_login_success_greets_user() {
            init_tracing();
            let server = login_server();
            let harness = Harness::new();
            let view = harness.render(login_tree(Rc::clone(&server))).unwrap();
            let user = harness.user();

            user.type_text(&Selector::id("username"), "chuck").unwrap();
            user.type_text(&Selector::id("password"), "hunter2").unwrap();
            user.click(&Selector::label("Submit")).unwrap();

            // poll-based assertion: re-resolves and re-asserts every tick
            let options = WaitOptions::new().with_timeout(500).with_poll_interval(10);
            harness
                .wait_for(
                    || {
                        Check::from_result(
                            view.text_of(&Selector::id("greeting"))
                                .and_then(|text| expect_text(text).to_contain("chuck")),
                        )
                    },
                    &options,
                )
                .unwrap();

            let submitted: Value = server.captured_requests()[0].body_json().unwrap();
            expect(&submitted)
                .described_as("submitted credentials")
                .to_equal(&json!({ "username": "chuck", "password": "hunter2" }))
                .unwrap();
        }

        #[test]
        fn test_login_server_error_override_and_reset() {
            init_tracing();
            let server = login_server();
            let harness = Harness::new();
            let view = harness.render(login_tree(Rc::clone(&server))).unwrap();
            let user = harness.user();

            server.use_override(Route::fixed(
                HttpMethod::Post,
                UrlPattern::Contains("/api/login".into()),
                StubResponse::error(500, "something went wrong"),
            ));

            user.type_text(&Selector::id("username"), "chuck").unwrap();
            user.type_text(&Selector::id("password"), "hunter2").unwrap();
            user.click(&Selector::label("Submit")).unwrap();

            let options = WaitOptions::new().with_timeout(500).with_poll_interval(10);
            harness
                .wait_for_removal(|| view.exists(&Selector::label("loading")), &options)
                .unwrap();
            let alert = view.get(&Selector::role(Role::Alert)).unwrap();
            expect_text(alert.text).to_contain("something went wrong").unwrap();

            server.reset();
            assert_eq!(server.override_count(), 0);
        }

        #[test]
        fn test_wait_cancelled_by_transition_during_settle() {
            let harness = Harness::new();
            harness.render(Tree::new()).unwrap();
            let token = WaitToken::new();

            // the wait's own settle drains the transition that cancels it
            let cancel = token.clone();
            let scheduler = harness.scheduler().clone();
            let origin = scheduler.next_event_id();
            scheduler.enqueue_deferred(origin, move |_, _| {
                cancel.cancel();
                Ok(())
            });

            let options = WaitOptions::new().with_timeout(200).with_poll_interval(10);
            let outcome = harness
                .wait_for_cancellable(|| Check::not_yet("never ready"), &options, &token)
                .unwrap();
            assert!(outcome.is_cancelled());
        }

        #[test]
        fn test_absent_element_assertions() {
            let harness = Harness::new();
            let view = harness
                .render(Tree::new().child(Node::status().id("present")))
                .unwrap();
            expect_present(view.query(&Selector::id("present")).unwrap())
                .to_exist()
                .unwrap();
            expect_present(view.query(&Selector::id("missing")).unwrap())
                .described_as("missing element")
                .to_be_absent()
                .unwrap();
        }
    }
}
