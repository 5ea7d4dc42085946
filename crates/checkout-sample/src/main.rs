//! # Checkout Sample
//!
//! Runs one checkout end to end against in-memory services and a simulated
//! tokenization widget.
//!
//! 1. Load the configuration (first CLI argument, TOML) or fall back to defaults.
//! 2. Start a [`CheckoutSystem`] for a returning customer.
//! 3. Edit the billing address and submit a card payment.
//! 4. Wait for the stage to move to `placeOrder` and shut down.
//!
//! Run with `RUST_LOG=debug` to follow the actor.

use checkout_orchestrator::adapters::{
    InMemoryAddressBook, InMemoryOrderLedger, StaticPaymentMethods,
};
use checkout_orchestrator::error::WidgetError;
use checkout_orchestrator::lifecycle::tracing::setup_tracing;
use checkout_orchestrator::model::{
    AddressId, AddressPatch, AddressSnapshot, Customer, MethodCapabilities, MethodDescriptor,
    MethodList, OrderBilling, SessionToken, SubmitOutcome,
};
use checkout_orchestrator::ports::{TokenizationWidget, WidgetFactory, WidgetMount};
use checkout_orchestrator::tokenization::{TokenizationPhase, WidgetEventSink};
use checkout_orchestrator::{CheckoutConfig, CheckoutContext, CheckoutSystem, ConfigLoader};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, Instrument};

/// Stands in for the processor's card widget: mounts at once and answers every
/// submit trigger with a valid tokenization result.
struct SimulatedWidgetFactory;

struct SimulatedWidget {
    sink: WidgetEventSink,
}

impl WidgetFactory for SimulatedWidgetFactory {
    fn mount(&self, mount: WidgetMount) -> Result<Box<dyn TokenizationWidget>, WidgetError> {
        info!(
            instance = mount.events.instance(),
            methods = mount.methods.len(),
            "Simulated widget mounted"
        );
        mount.events.mounted();
        mount.events.field_valid(json!({ "endDigits": "1111" }));
        Ok(Box::new(SimulatedWidget { sink: mount.events }))
    }
}

impl TokenizationWidget for SimulatedWidget {
    fn submit(&mut self) -> Result<(), WidgetError> {
        let delivered = self.sink.submit(json!({
            "isValid": true,
            "data": {
                "paymentMethod": {
                    "type": "scheme",
                    "holderName": "Alice Smith",
                    "encryptedCardNumber": "test_4111111111111111",
                    "encryptedExpiryMonth": "test_03",
                    "encryptedExpiryYear": "test_2030",
                    "encryptedSecurityCode": "test_737",
                    "brand": "visa"
                },
                "riskData": { "clientData": "sample-device-fingerprint" }
            }
        }));
        if delivered {
            Ok(())
        } else {
            Err(WidgetError::Trigger("checkout is gone".to_string()))
        }
    }

    fn unmount(&mut self) {
        info!(instance = self.sink.instance(), "Simulated widget unmounted");
    }
}

fn home() -> AddressSnapshot {
    AddressSnapshot {
        id: Some(AddressId::from("home")),
        first_name: "Alice".to_string(),
        last_name: "Smith".to_string(),
        address1: "742 Evergreen Terrace".to_string(),
        address2: None,
        city: "Springfield".to_string(),
        country: "US".to_string(),
        state_code: "IL".to_string(),
        postal_code: "62701".to_string(),
        phone: "555-0100".to_string(),
    }
}

fn methods() -> MethodList {
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

async fn load_config() -> Result<CheckoutConfig, String> {
    match std::env::args().nth(1) {
        Some(path) => ConfigLoader::new()
            .with_file(path)
            .load()
            .await
            .map_err(|e| e.to_string()),
        None => Ok(CheckoutConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = load_config().await?;
    info!("Starting checkout sample");

    let ledger = InMemoryOrderLedger::new();
    let context = CheckoutContext::new(
        SessionToken::new("sample-csrf-token"),
        Arc::new(InMemoryAddressBook::with_addresses([home()])),
        Arc::new(StaticPaymentMethods::new(methods())),
        Arc::new(ledger.clone()),
        Arc::new(SimulatedWidgetFactory),
    )
    .with_order(
        OrderBilling {
            billing_address: None,
            matching_address_id: Some(AddressId::from("home")),
        },
        Customer {
            addresses: vec![home()],
            preferred_address: None,
        },
    )
    .on_complete(|receipt| info!(order_no = ?receipt.order_no, "Checkout completed"));

    let system = CheckoutSystem::new(config, context);
    let client = system.checkout_client.clone();
    let mut stage = system.stage();

    let span = tracing::info_span!("address_edit");
    async {
        client.begin_edit().await?;
        client
            .update_edit(AddressPatch {
                address2: Some("Apt 2".to_string()),
                ..Default::default()
            })
            .await?;
        let saved = client.commit_edit().await?;
        info!(address_id = ?saved.id, "Billing address updated");
        Ok::<_, checkout_orchestrator::CheckoutError>(())
    }
    .instrument(span)
    .await
    .map_err(|e| e.to_string())?;

    // Wait for the widget before triggering a tokenized submission.
    let ready = tokio::time::timeout(Duration::from_secs(5), async {
        while client.tokenization_state().await.ok() != Some(TokenizationPhase::Ready) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    if ready.is_err() {
        return Err("Payment widget never became ready".to_string());
    }

    let span = tracing::info_span!("payment_submission");
    let outcome = async {
        info!("Submitting payment");
        client.submit().await
    }
    .instrument(span)
    .await;

    match outcome {
        Ok(SubmitOutcome::Submitted(receipt)) => {
            info!(order_no = ?receipt.order_no, "Payment submitted successfully");
            if stage.changed().await.is_ok() {
                let current = *stage.borrow();
                info!(stage = %current, "Checkout advanced");
            }
        }
        Ok(SubmitOutcome::AlreadyPending) => info!("Submission already in flight"),
        Err(e) => error!(error = %e, "Payment submission failed"),
    }

    let recorded = ledger.submissions().await;
    info!(submissions = recorded.len(), "Order ledger");

    drop(client);
    system.shutdown().await?;

    info!("Application completed successfully");
    Ok(())
}
