use super::client::CheckoutClient;
use super::message::{CheckoutRequest, Response, Settlement};
use super::payload::{PayloadBuilder, SubmissionPayload};
use crate::address::AddressResolver;
use crate::config::CheckoutConfig;
use crate::directory::{FetchPlan, PaymentMethodDirectory};
use crate::error::{CheckoutError, ServiceError};
use crate::model::{
    AddressId, AddressPatch, AddressSnapshot, CheckoutStage, Customer, FormState, MethodList,
    OrderBilling, SessionToken, SubmissionReceipt, SubmitOutcome, TokenizedPaymentState,
};
use crate::ports::{AddressBookRef, OrderSubmissionRef, PaymentMethodsRef, WidgetFactoryRef};
use crate::tokenization::{
    BridgeOutput, Projection, TaggedWidgetEvent, TokenizationBridge, TokenizationPhase,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Invoked once after the order-submission service accepted the payment.
pub type CompletionCallback = Box<dyn FnOnce(&SubmissionReceipt) + Send>;

/// Everything the checkout actor depends on, handed over when it starts.
pub struct CheckoutContext {
    pub session_token: SessionToken,
    pub order: OrderBilling,
    pub customer: Customer,
    pub address_book: AddressBookRef,
    pub payment_methods: PaymentMethodsRef,
    pub order_submission: OrderSubmissionRef,
    pub widget_factory: WidgetFactoryRef,
    pub on_complete: Option<CompletionCallback>,
}

impl CheckoutContext {
    pub fn new(
        session_token: SessionToken,
        address_book: AddressBookRef,
        payment_methods: PaymentMethodsRef,
        order_submission: OrderSubmissionRef,
        widget_factory: WidgetFactoryRef,
    ) -> Self {
        Self {
            session_token,
            order: OrderBilling::default(),
            customer: Customer::default(),
            address_book,
            payment_methods,
            order_submission,
            widget_factory,
            on_complete: None,
        }
    }

    pub fn with_order(mut self, order: OrderBilling, customer: Customer) -> Self {
        self.order = order;
        self.customer = customer;
        self
    }

    pub fn on_complete(mut self, callback: impl FnOnce(&SubmissionReceipt) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }
}

/// The submission coordinator.
///
/// Owns FormState, the address resolver, the payment method directory and the
/// tokenization bridge. Requests, widget events and the results of spawned I/O
/// are handled one at a time in [`run`](Self::run), so no state is shared and
/// no lock is needed. Network calls are spawned and report back through the
/// settlement channel; the loop itself never awaits them.
pub struct CheckoutActor {
    receiver: mpsc::Receiver<CheckoutRequest>,
    config: CheckoutConfig,
    stage: watch::Sender<CheckoutStage>,
}

impl CheckoutActor {
    /// Creates the actor, its client and the stage signal.
    pub fn new(config: CheckoutConfig) -> (Self, CheckoutClient, watch::Receiver<CheckoutStage>) {
        let (sender, receiver) = mpsc::channel(config.checkout.channel_capacity.max(1));
        let (stage, stage_rx) = watch::channel(CheckoutStage::Payment);
        let actor = Self {
            receiver,
            config,
            stage,
        };
        (actor, CheckoutClient::new(sender), stage_rx)
    }

    /// Runs the event loop until every client is dropped.
    pub async fn run(mut self, context: CheckoutContext) {
        info!("Checkout actor started");

        let (settle_tx, mut settlements) = mpsc::unbounded_channel();
        let (mut state, mut widget_events) =
            CheckoutState::new(self.config, self.stage, context, settle_tx);
        state.load_payment_methods();

        loop {
            tokio::select! {
                request = self.receiver.recv() => match request {
                    Some(request) => state.handle(request),
                    None => break,
                },
                Some(event) = widget_events.recv() => state.on_widget_event(event),
                Some(settlement) = settlements.recv() => state.settle(settlement),
            }
        }

        state.bridge.teardown();
        info!(
            submitted = state.consumed,
            phase = %state.bridge.phase(),
            "Checkout actor shutting down"
        );
    }
}

struct CheckoutState {
    config: CheckoutConfig,
    stage: watch::Sender<CheckoutStage>,
    session_token: SessionToken,
    address_book: AddressBookRef,
    order_submission: OrderSubmissionRef,
    on_complete: Option<CompletionCallback>,
    settle_tx: mpsc::UnboundedSender<Settlement>,

    form: FormState,
    resolver: AddressResolver,
    directory: PaymentMethodDirectory,
    bridge: TokenizationBridge,

    /// Reply channel of the submission in progress. Doubles as the pending flag.
    pending: Option<PendingSubmit>,
    methods_waiters: Vec<Response<MethodList>>,
    commit_waiter: Option<Response<AddressSnapshot>>,
    consumed: bool,
}

/// A submission that has been triggered and not yet resolved.
struct PendingSubmit {
    respond_to: Response<SubmitOutcome>,
    /// FormState as it was at the trigger.
    form: FormState,
    /// What "same as shipping" resolved to at the trigger.
    shipping: AddressSnapshot,
}

impl CheckoutState {
    fn new(
        config: CheckoutConfig,
        stage: watch::Sender<CheckoutStage>,
        context: CheckoutContext,
        settle_tx: mpsc::UnboundedSender<Settlement>,
    ) -> (Self, mpsc::UnboundedReceiver<TaggedWidgetEvent>) {
        let resolver = AddressResolver::new(&context.order, context.customer, &config.checkout);
        let defaults = resolver.current();
        let selector = context
            .order
            .matching_address_id
            .clone()
            .or_else(|| defaults.id.clone());
        let form = FormState::new(defaults, selector, &config.checkout.default_payment_method);

        let directory = PaymentMethodDirectory::new(context.payment_methods);
        let (bridge, widget_events) =
            TokenizationBridge::new(context.widget_factory, config.widget.clone());

        let state = Self {
            config,
            stage,
            session_token: context.session_token,
            address_book: context.address_book,
            order_submission: context.order_submission,
            on_complete: context.on_complete,
            settle_tx,
            form,
            resolver,
            directory,
            bridge,
            pending: None,
            methods_waiters: Vec::new(),
            commit_waiter: None,
            consumed: false,
        };
        (state, widget_events)
    }

    fn handle(&mut self, request: CheckoutRequest) {
        match request {
            CheckoutRequest::FormState { respond_to } => {
                let _ = respond_to.send(Ok(self.form.clone()));
            }
            CheckoutRequest::UpdateBilling { patch, respond_to } => {
                let _ = respond_to.send(Ok(self.update_billing(patch)));
            }
            CheckoutRequest::SetUseShippingAsBilling {
                enabled,
                respond_to,
            } => {
                let _ = respond_to.send(Ok(self.set_use_shipping_as_billing(enabled)));
            }
            CheckoutRequest::SelectAddress { id, respond_to } => {
                let _ = respond_to.send(self.select_address(id));
            }
            CheckoutRequest::SelectPaymentMethod { method, respond_to } => {
                let _ = respond_to.send(self.select_payment_method(method));
            }
            CheckoutRequest::PaymentMethods { respond_to } => {
                let _ = respond_to.send(Ok(self.directory.status().clone()));
            }
            CheckoutRequest::RetryPaymentMethods { respond_to } => {
                if let Some(methods) = self.directory.snapshot().cloned() {
                    if self.bridge.phase() == TokenizationPhase::Uninitialized {
                        self.on_methods_loaded(methods.clone());
                    }
                    let _ = respond_to.send(Ok(methods));
                } else {
                    self.methods_waiters.push(respond_to);
                    self.load_payment_methods();
                }
            }
            CheckoutRequest::TokenizationState { respond_to } => {
                let _ = respond_to.send(Ok(self.bridge.phase()));
            }
            CheckoutRequest::Submit { respond_to } => self.submit(respond_to),
            CheckoutRequest::BeginEdit { respond_to } => {
                let result = self.resolver.begin_edit().cloned().map_err(Into::into);
                let _ = respond_to.send(result);
            }
            CheckoutRequest::UpdateEdit { patch, respond_to } => {
                let result = self.resolver.update_edit(patch).cloned().map_err(Into::into);
                let _ = respond_to.send(result);
            }
            CheckoutRequest::CommitEdit { respond_to } => self.commit_edit(respond_to),
            CheckoutRequest::CancelEdit { respond_to } => {
                let _ = respond_to.send(self.resolver.cancel_edit().map_err(Into::into));
            }
            CheckoutRequest::EditSession { respond_to } => {
                let _ = respond_to.send(Ok(self.resolver.edit_session().cloned()));
            }
        }
    }

    // =========================================================================
    // Form
    // =========================================================================

    fn update_billing(&mut self, patch: AddressPatch) -> FormState {
        self.form.billing.apply(patch);
        self.form.clone()
    }

    fn set_use_shipping_as_billing(&mut self, enabled: bool) -> FormState {
        self.form.use_shipping_as_billing = enabled;
        if enabled {
            self.form.rederive(self.resolver.current());
        }
        debug!(enabled, "Same-as-shipping toggled");
        self.form.clone()
    }

    fn select_address(&mut self, id: AddressId) -> Result<FormState, CheckoutError> {
        let saved = self.resolver.saved_address(&id)?.clone();
        info!(address_id = %id, "Billing address selected");
        self.form.billing = saved;
        self.form.address_selector = Some(id);
        self.form.use_shipping_as_billing = false;
        Ok(self.form.clone())
    }

    fn select_payment_method(&mut self, method: String) -> Result<FormState, CheckoutError> {
        let known = match self.directory.snapshot() {
            Some(methods) => methods.contains(&method),
            None if self.directory.unavailable_reason().is_some() => {
                method == self.config.checkout.default_payment_method
                    || !self.config.checkout.is_tokenized_by_default(&method)
            }
            None => method == self.config.checkout.default_payment_method,
        };
        if !known {
            return Err(CheckoutError::UnknownPaymentMethod(method));
        }
        info!(method = %method, "Payment method selected");
        self.form.payment_method = method;
        Ok(self.form.clone())
    }

    fn apply_projection(&mut self, projection: Projection) {
        match projection {
            Projection::MaskedCardNumber(masked) => self.form.masked_card_number = Some(masked),
            Projection::CardType(brand) => self.form.card_type = Some(brand),
        }
    }

    // =========================================================================
    // Payment method directory
    // =========================================================================

    fn load_payment_methods(&mut self) {
        match self.directory.begin_fetch(&self.session_token) {
            FetchPlan::Cached(methods) => self.on_methods_loaded(methods),
            FetchPlan::InFlight => debug!("Payment methods already loading"),
            FetchPlan::Fetch(request) => {
                let settle = self.settle_tx.clone();
                tokio::spawn(async move {
                    let _ = settle.send(Settlement::MethodsFetched(request.await));
                });
            }
        }
    }

    fn on_methods_fetched(&mut self, result: Result<MethodList, ServiceError>) {
        let result = self.directory.resolve(result);
        if let Ok(methods) = &result {
            self.on_methods_loaded(methods.clone());
        }
        for waiter in self.methods_waiters.drain(..) {
            let _ = waiter.send(result.clone().map_err(Into::into));
        }
    }

    fn on_methods_loaded(&mut self, methods: MethodList) {
        if !methods.contains(&self.form.payment_method) {
            if let Some(first) = methods.first() {
                info!(
                    from = %self.form.payment_method,
                    to = %first.id,
                    "Selected payment method not offered, switching"
                );
                self.form.payment_method = first.id.clone();
            }
        }

        // The bridge ignores this when a widget is already live.
        if let Err(e) = self.bridge.initialize(&methods) {
            error!(error = %e, "Could not initialize the payment widget");
        }
    }

    // =========================================================================
    // Submission
    // =========================================================================

    fn submit(&mut self, respond_to: Response<SubmitOutcome>) {
        if self.pending.is_some() {
            info!("Submission already pending, ignoring trigger");
            let _ = respond_to.send(Ok(SubmitOutcome::AlreadyPending));
            return;
        }
        if self.consumed {
            let _ = respond_to.send(Err(CheckoutError::AlreadySubmitted));
            return;
        }
        if let Err(errors) = self.form.validate() {
            warn!(%errors, "Submission blocked by validation");
            let _ = respond_to.send(Err(errors.into()));
            return;
        }

        let method = self.form.payment_method.clone();
        if !self.directory.offers(&method) {
            warn!(method = %method, "Selected payment method is not offered");
            let _ = respond_to.send(Err(CheckoutError::UnknownPaymentMethod(method)));
            return;
        }

        let pending = PendingSubmit {
            respond_to,
            form: self.form.clone(),
            shipping: self.resolver.current().clone(),
        };
        if !self.directory.is_tokenized(&method, &self.config.checkout) {
            info!(method = %method, "Submitting non-tokenized payment");
            let payload = self.build_payload(&pending, None);
            self.pending = Some(pending);
            self.dispatch(payload);
            return;
        }

        if let Some(reason) = self.directory.unavailable_reason() {
            warn!(method = %method, reason, "Tokenized submission disabled");
            let error = CheckoutError::MethodsUnavailable(reason.to_string());
            let _ = pending.respond_to.send(Err(error));
            return;
        }

        let requires_fingerprint = self.directory.requires_fraud_signals(&method);
        match self.bridge.begin_capture(requires_fingerprint) {
            Ok(()) => self.pending = Some(pending),
            Err(e) => {
                let _ = pending.respond_to.send(Err(e.into()));
            }
        }
    }

    fn on_widget_event(&mut self, event: TaggedWidgetEvent) {
        match self.bridge.on_event(event) {
            BridgeOutput::Ignored | BridgeOutput::Mounted => {}
            BridgeOutput::Projection(projection) => self.apply_projection(projection),
            BridgeOutput::Captured => self.on_captured(),
            BridgeOutput::CaptureFailed(e) => {
                if let Some(pending) = self.pending.take() {
                    let _ = pending.respond_to.send(Err(e.into()));
                }
            }
        }
    }

    fn on_captured(&mut self) {
        let Some(payment) = self.bridge.take_payment() else {
            return;
        };
        let Some(pending) = &self.pending else {
            warn!("Captured payment without a pending submission, discarding");
            return;
        };
        let payload = self.build_payload(pending, Some(payment));
        self.dispatch(payload);
    }

    fn build_payload(
        &self,
        pending: &PendingSubmit,
        payment: Option<TokenizedPaymentState>,
    ) -> SubmissionPayload {
        let brand = self
            .directory
            .snapshot()
            .and_then(|methods| methods.get(&pending.form.payment_method))
            .map(|method| method.brand.clone());
        let builder =
            PayloadBuilder::new(self.session_token.clone(), &pending.form, &pending.shipping)
                .method_brand(brand);
        match payment {
            Some(payment) => builder.tokenized(payment).build(),
            None => builder.build(),
        }
    }

    fn dispatch(&self, payload: SubmissionPayload) {
        let service = self.order_submission.clone();
        let settle = self.settle_tx.clone();
        info!(
            method = %payload.payment_method,
            tokenized = payload.is_tokenized(),
            "Dispatching payment"
        );
        tokio::spawn(async move {
            let result = service.submit_payment(&payload).await;
            let _ = settle.send(Settlement::PaymentSubmitted(result));
        });
    }

    fn on_payment_submitted(&mut self, result: Result<SubmissionReceipt, ServiceError>) {
        let Some(pending) = self.pending.take() else {
            warn!("Submission settled with nothing pending");
            return;
        };

        match result {
            Ok(receipt) => {
                info!(order_no = ?receipt.order_no, stage = %receipt.next_stage, "Payment accepted");
                self.consumed = true;
                self.stage.send_replace(receipt.next_stage);
                if let Some(callback) = self.on_complete.take() {
                    callback(&receipt);
                }
                let _ = pending.respond_to.send(Ok(SubmitOutcome::Submitted(receipt)));
            }
            Err(e) => {
                error!(error = %e, "Payment submission failed");
                let _ = pending.respond_to.send(Err(CheckoutError::submission(e)));
            }
        }
    }

    // =========================================================================
    // Address edit
    // =========================================================================

    fn commit_edit(&mut self, respond_to: Response<AddressSnapshot>) {
        let draft = match self.resolver.begin_commit() {
            Ok(draft) => draft,
            Err(e) => {
                let _ = respond_to.send(Err(e.into()));
                return;
            }
        };
        self.commit_waiter = Some(respond_to);

        let service = self.address_book.clone();
        let token = self.session_token.clone();
        let settle = self.settle_tx.clone();
        tokio::spawn(async move {
            let result = service.save_address(&token, &draft).await;
            let _ = settle.send(Settlement::AddressSaved(result));
        });
    }

    fn on_address_saved(&mut self, result: Result<AddressSnapshot, ServiceError>) {
        let outcome = self.resolver.complete_commit(result);
        if outcome.is_ok() {
            // A saved edit starts billing over from the new defaults.
            self.form.use_shipping_as_billing = true;
            self.form.rederive(self.resolver.current());
        }
        if let Some(waiter) = self.commit_waiter.take() {
            let _ = waiter.send(outcome.map_err(Into::into));
        }
    }

    fn settle(&mut self, settlement: Settlement) {
        match settlement {
            Settlement::MethodsFetched(result) => self.on_methods_fetched(result),
            Settlement::PaymentSubmitted(result) => self.on_payment_submitted(result),
            Settlement::AddressSaved(result) => self.on_address_saved(result),
        }
    }
}
