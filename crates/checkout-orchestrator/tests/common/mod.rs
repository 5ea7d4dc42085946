#![allow(dead_code)]

use checkout_orchestrator::mock::{
    MockAddressBook, MockOrderSubmission, MockPaymentMethods, MockWidgetFactory,
};
use checkout_orchestrator::model::{
    AddressId, AddressSnapshot, CheckoutStage, Customer, MethodCapabilities, MethodDescriptor,
    MethodList, OrderBilling, SessionToken,
};
use checkout_orchestrator::tokenization::{TokenizationPhase, WidgetEvent};
use checkout_orchestrator::{CheckoutActor, CheckoutClient, CheckoutConfig, CheckoutContext};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub fn methods() -> MethodList {
    MethodList::new(vec![
        MethodDescriptor::new(
            "AdyenComponent",
            "Cards",
            MethodCapabilities {
                tokenized: true,
                fraud_signals: true,
            },
        ),
        MethodDescriptor::new("GIFT_CERTIFICATE", "Gift card", MethodCapabilities::default()),
    ])
}

pub fn address(id: &str, first_name: &str, city: &str) -> AddressSnapshot {
    AddressSnapshot {
        id: Some(AddressId::from(id)),
        first_name: first_name.into(),
        last_name: "Smith".into(),
        address1: "1 Main St".into(),
        address2: None,
        city: city.into(),
        country: "US".into(),
        state_code: "IL".into(),
        postal_code: "62701".into(),
        phone: "555-0100".into(),
    }
}

pub fn home() -> AddressSnapshot {
    address("home", "Alice", "Springfield")
}

pub fn work() -> AddressSnapshot {
    address("work", "Alice", "Chicago")
}

pub fn customer() -> Customer {
    Customer {
        addresses: vec![home(), work()],
        preferred_address: Some(work()),
    }
}

/// Order whose billing was matched against the `home` entry.
pub fn order() -> OrderBilling {
    OrderBilling {
        billing_address: None,
        matching_address_id: Some(AddressId::from("home")),
    }
}

pub fn submit_state() -> Value {
    json!({
        "isValid": true,
        "data": {
            "paymentMethod": {
                "type": "scheme",
                "holderName": "Alice Smith",
                "encryptedCardNumber": "enc_card",
                "encryptedSecurityCode": "enc_cvc",
                "brand": "visa"
            },
            "riskData": { "clientData": "fp_123" }
        }
    })
}

pub fn submit_event() -> WidgetEvent {
    WidgetEvent::Submit(submit_state())
}

/// Mocks wired into a running checkout actor.
pub struct Harness {
    pub client: CheckoutClient,
    pub stage: watch::Receiver<CheckoutStage>,
    pub handle: JoinHandle<()>,
    pub book: MockAddressBook,
    pub methods: MockPaymentMethods,
    pub orders: MockOrderSubmission,
    pub widget: MockWidgetFactory,
}

impl Harness {
    pub fn start(
        book: MockAddressBook,
        methods: MockPaymentMethods,
        orders: MockOrderSubmission,
        widget: MockWidgetFactory,
    ) -> Self {
        Self::start_with(CheckoutConfig::default(), book, methods, orders, widget, |ctx| ctx)
    }

    pub fn start_with(
        config: CheckoutConfig,
        book: MockAddressBook,
        methods: MockPaymentMethods,
        orders: MockOrderSubmission,
        widget: MockWidgetFactory,
        customize: impl FnOnce(CheckoutContext) -> CheckoutContext,
    ) -> Self {
        let (actor, client, stage) = CheckoutActor::new(config);
        let context = CheckoutContext::new(
            SessionToken::new("csrf-token"),
            Arc::new(book.clone()),
            Arc::new(methods.clone()),
            Arc::new(orders.clone()),
            Arc::new(widget.clone()),
        )
        .with_order(order(), customer());
        let handle = tokio::spawn(actor.run(customize(context)));

        Self {
            client,
            stage,
            handle,
            book,
            methods,
            orders,
            widget,
        }
    }

    /// A checkout whose directory loads `methods()` and whose widget mounts
    /// on its own.
    pub async fn ready(orders: MockOrderSubmission) -> Self {
        let mut directory = MockPaymentMethods::new();
        directory.expect_fetch().return_ok(methods());
        let harness = Self::start(
            MockAddressBook::new(),
            directory,
            orders,
            MockWidgetFactory::new().auto_mount(),
        );
        harness.wait_for_phase(TokenizationPhase::Ready).await;
        harness
    }

    pub async fn wait_for_phase(&self, phase: TokenizationPhase) {
        let client = self.client.clone();
        eventually(|| {
            let client = client.clone();
            async move { client.tokenization_state().await.ok() == Some(phase) }
        })
        .await;
    }

    pub async fn shutdown(self) {
        drop(self.client);
        self.handle.await.unwrap();
    }
}

/// Polls `condition` until it holds, failing the test after two seconds.
pub async fn eventually<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition().await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not met within 2s");
}
