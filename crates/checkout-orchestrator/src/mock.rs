//! # Mocks & Testing Guide
//!
//! Scripted stand-ins for every port, so the real checkout actor can be tested
//! without a network or a browser widget.
//!
//! | Mock | Port | Scripting |
//! |------|------|-----------|
//! | [`MockAddressBook`] | `AddressBookService` | `expect_save()` |
//! | [`MockPaymentMethods`] | `PaymentMethodService` | `expect_fetch()` |
//! | [`MockOrderSubmission`] | `OrderSubmissionService` | `expect_submit()` |
//! | [`MockWidgetFactory`] | `WidgetFactory` | `auto_mount()`, `on_submit_emit(..)`, sinks |
//!
//! Service expectations are consumed in order. Each one answers with
//! `return_ok`/`return_err`, optionally held back until a [`Notify`] gate opens
//! (`after(gate)`), which keeps a call pending for as long as a test needs.
//! A call with no expectation left fails with a transport error and is counted;
//! [`verify`](MockOrderSubmission::verify) panics on leftovers or surprises.
//!
//! ```rust,ignore
//! let mut orders = MockOrderSubmission::new();
//! let gate = Arc::new(Notify::new());
//! orders
//!     .expect_submit()
//!     .after(gate.clone())
//!     .return_ok(SubmissionReceipt::accepted(Some("00001".into())));
//!
//! // ... trigger submit twice while the gate is closed ...
//! gate.notify_one();
//! orders.verify();
//! assert_eq!(orders.call_count(), 1);
//! ```

use crate::config::WidgetConfig;
use crate::coordinator::SubmissionPayload;
use crate::error::{ServiceError, WidgetError};
use crate::model::{AddressSnapshot, MethodList, SessionToken, SubmissionReceipt};
use crate::ports::{
    AddressBookService, OrderSubmissionService, PaymentMethodService, TokenizationWidget,
    WidgetFactory, WidgetMount,
};
use crate::tokenization::{WidgetEvent, WidgetEventSink};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

struct Expectation<T> {
    response: Result<T, ServiceError>,
    gate: Option<Arc<Notify>>,
}

struct Script<T, R> {
    expectations: VecDeque<Expectation<T>>,
    requests: Vec<R>,
    unexpected: usize,
}

impl<T, R> Default for Script<T, R> {
    fn default() -> Self {
        Self {
            expectations: VecDeque::new(),
            requests: Vec::new(),
            unexpected: 0,
        }
    }
}

/// Shared expectation queue plus a log of the requests received.
struct ScriptedService<T, R> {
    script: Arc<Mutex<Script<T, R>>>,
}

impl<T, R> Clone for ScriptedService<T, R> {
    fn clone(&self) -> Self {
        Self {
            script: self.script.clone(),
        }
    }
}

impl<T, R> Default for ScriptedService<T, R> {
    fn default() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script::default())),
        }
    }
}

impl<T, R: Clone> ScriptedService<T, R> {
    fn expect(&self) -> ExpectationBuilder<T, R> {
        ExpectationBuilder {
            script: self.script.clone(),
            gate: None,
        }
    }

    async fn call(&self, request: R, operation: &str) -> Result<T, ServiceError> {
        let expectation = {
            let mut script = lock(&self.script);
            script.requests.push(request);
            let next = script.expectations.pop_front();
            if next.is_none() {
                script.unexpected += 1;
            }
            next
        };

        let Some(expectation) = expectation else {
            return Err(ServiceError::Transport(format!("unexpected {operation} call")));
        };
        if let Some(gate) = expectation.gate {
            gate.notified().await;
        }
        expectation.response
    }

    fn call_count(&self) -> usize {
        lock(&self.script).requests.len()
    }

    fn requests(&self) -> Vec<R> {
        lock(&self.script).requests.clone()
    }

    fn verify(&self, name: &str) {
        let script = lock(&self.script);
        if !script.expectations.is_empty() {
            panic!(
                "{name}: not all expectations were met. {} remaining",
                script.expectations.len()
            );
        }
        if script.unexpected > 0 {
            panic!("{name}: {} unexpected call(s)", script.unexpected);
        }
    }
}

/// Builder returned by the `expect_*` methods.
pub struct ExpectationBuilder<T, R> {
    script: Arc<Mutex<Script<T, R>>>,
    gate: Option<Arc<Notify>>,
}

impl<T, R> ExpectationBuilder<T, R> {
    /// Holds the response back until `gate` is notified.
    pub fn after(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: T) {
        self.push(Ok(value));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: ServiceError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<T, ServiceError>) {
        lock(&self.script).expectations.push_back(Expectation {
            response,
            gate: self.gate,
        });
    }
}

// =============================================================================
// SERVICE MOCKS
// =============================================================================

/// Scripted address book. Records every address it was asked to save.
#[derive(Clone, Default)]
pub struct MockAddressBook {
    inner: ScriptedService<AddressSnapshot, AddressSnapshot>,
}

impl MockAddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_save(&mut self) -> ExpectationBuilder<AddressSnapshot, AddressSnapshot> {
        self.inner.expect()
    }

    pub fn saved(&self) -> Vec<AddressSnapshot> {
        self.inner.requests()
    }

    pub fn call_count(&self) -> usize {
        self.inner.call_count()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        self.inner.verify("MockAddressBook");
    }
}

#[async_trait]
impl AddressBookService for MockAddressBook {
    async fn save_address(
        &self,
        _token: &SessionToken,
        address: &AddressSnapshot,
    ) -> Result<AddressSnapshot, ServiceError> {
        self.inner.call(address.clone(), "save_address").await
    }
}

/// Scripted payment method directory service.
#[derive(Clone, Default)]
pub struct MockPaymentMethods {
    inner: ScriptedService<MethodList, ()>,
}

impl MockPaymentMethods {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_fetch(&mut self) -> ExpectationBuilder<MethodList, ()> {
        self.inner.expect()
    }

    pub fn call_count(&self) -> usize {
        self.inner.call_count()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        self.inner.verify("MockPaymentMethods");
    }
}

#[async_trait]
impl PaymentMethodService for MockPaymentMethods {
    async fn fetch_methods(&self, _token: &SessionToken) -> Result<MethodList, ServiceError> {
        self.inner.call((), "fetch_methods").await
    }
}

/// Scripted order-submission service. Records every payload it received.
#[derive(Clone, Default)]
pub struct MockOrderSubmission {
    inner: ScriptedService<SubmissionReceipt, SubmissionPayload>,
}

impl MockOrderSubmission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_submit(&mut self) -> ExpectationBuilder<SubmissionReceipt, SubmissionPayload> {
        self.inner.expect()
    }

    pub fn payloads(&self) -> Vec<SubmissionPayload> {
        self.inner.requests()
    }

    pub fn call_count(&self) -> usize {
        self.inner.call_count()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        self.inner.verify("MockOrderSubmission");
    }
}

#[async_trait]
impl OrderSubmissionService for MockOrderSubmission {
    async fn submit_payment(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, ServiceError> {
        self.inner.call(payload.clone(), "submit_payment").await
    }
}

// =============================================================================
// WIDGET MOCK
// =============================================================================

#[derive(Default)]
struct WidgetLog {
    mounts: Vec<WidgetMount>,
    unmounts: usize,
    submits: usize,
    auto_mount: bool,
    fail_mount: Option<String>,
    fail_submit: Option<String>,
    submit_events: VecDeque<WidgetEvent>,
}

/// Widget factory that records what happens to its widgets.
///
/// With [`auto_mount`](Self::auto_mount) every widget reports `Mounted` as soon
/// as it is created. Events queued with [`on_submit_emit`](Self::on_submit_emit)
/// are emitted, one per trigger, when the bridge asks a widget to tokenize.
#[derive(Clone, Default)]
pub struct MockWidgetFactory {
    log: Arc<Mutex<WidgetLog>>,
}

impl MockWidgetFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auto_mount(self) -> Self {
        lock(&self.log).auto_mount = true;
        self
    }

    /// Emits `event` when a widget is next asked to tokenize.
    pub fn on_submit_emit(&self, event: WidgetEvent) {
        lock(&self.log).submit_events.push_back(event);
    }

    pub fn fail_next_mount(&self, reason: impl Into<String>) {
        lock(&self.log).fail_mount = Some(reason.into());
    }

    pub fn fail_next_submit(&self, reason: impl Into<String>) {
        lock(&self.log).fail_submit = Some(reason.into());
    }

    pub fn mount_count(&self) -> usize {
        lock(&self.log).mounts.len()
    }

    pub fn unmount_count(&self) -> usize {
        lock(&self.log).unmounts
    }

    pub fn submit_count(&self) -> usize {
        lock(&self.log).submits
    }

    /// Event sink of the most recently mounted widget.
    pub fn last_sink(&self) -> Option<WidgetEventSink> {
        lock(&self.log).mounts.last().map(|mount| mount.events.clone())
    }

    /// Configuration and method list of the most recent mount.
    pub fn last_mount(&self) -> Option<(WidgetConfig, MethodList)> {
        lock(&self.log)
            .mounts
            .last()
            .map(|mount| (mount.config.clone(), mount.methods.clone()))
    }
}

impl WidgetFactory for MockWidgetFactory {
    fn mount(&self, mount: WidgetMount) -> Result<Box<dyn TokenizationWidget>, WidgetError> {
        let mut log = lock(&self.log);
        if let Some(reason) = log.fail_mount.take() {
            return Err(WidgetError::Mount(reason));
        }

        let sink = mount.events.clone();
        log.mounts.push(mount);
        if log.auto_mount {
            sink.mounted();
        }

        Ok(Box::new(MockWidget {
            sink,
            log: self.log.clone(),
        }))
    }
}

struct MockWidget {
    sink: WidgetEventSink,
    log: Arc<Mutex<WidgetLog>>,
}

impl TokenizationWidget for MockWidget {
    fn submit(&mut self) -> Result<(), WidgetError> {
        let mut log = lock(&self.log);
        if let Some(reason) = log.fail_submit.take() {
            return Err(WidgetError::Trigger(reason));
        }
        log.submits += 1;
        if let Some(event) = log.submit_events.pop_front() {
            self.sink.emit(event);
        }
        Ok(())
    }

    fn unmount(&mut self) {
        lock(&self.log).unmounts += 1;
    }
}
