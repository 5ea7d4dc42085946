mod common;

use checkout_orchestrator::address::SAVE_FAILED_MESSAGE;
use checkout_orchestrator::error::{AddressError, CheckoutError, ServiceError};
use checkout_orchestrator::mock::{
    MockAddressBook, MockOrderSubmission, MockPaymentMethods, MockWidgetFactory,
};
use checkout_orchestrator::model::{AddressId, AddressPatch, OrderBilling};
use checkout_orchestrator::CheckoutConfig;
use common::{eventually, Harness};
use std::sync::Arc;
use tokio::sync::Notify;

fn harness_with_book(book: MockAddressBook) -> Harness {
    let mut directory = MockPaymentMethods::new();
    directory.expect_fetch().return_ok(common::methods());
    Harness::start(
        book,
        directory,
        MockOrderSubmission::new(),
        MockWidgetFactory::new().auto_mount(),
    )
}

fn city(name: &str) -> AddressPatch {
    AddressPatch {
        city: Some(name.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_initial_form_uses_matching_address() {
    let harness = harness_with_book(MockAddressBook::new());

    let form = harness.client.form_state().await.unwrap();

    assert_eq!(form.billing, common::home());
    assert_eq!(form.address_selector, Some(AddressId::from("home")));
    assert!(form.use_shipping_as_billing);
    assert_eq!(form.payment_method, "AdyenComponent");
    harness.shutdown().await;
}

#[tokio::test]
async fn test_initial_form_falls_back_to_preferred_then_order_billing_wins() {
    let preferred = Harness::start_with(
        CheckoutConfig::default(),
        MockAddressBook::new(),
        MockPaymentMethods::new(),
        MockOrderSubmission::new(),
        MockWidgetFactory::new(),
        |ctx| ctx.with_order(OrderBilling::default(), common::customer()),
    );
    assert_eq!(
        preferred.client.form_state().await.unwrap().billing,
        common::work()
    );
    preferred.shutdown().await;

    let recorded = common::address("order", "Bob", "Austin");
    let explicit = recorded.clone();
    let on_order = Harness::start_with(
        CheckoutConfig::default(),
        MockAddressBook::new(),
        MockPaymentMethods::new(),
        MockOrderSubmission::new(),
        MockWidgetFactory::new(),
        move |ctx| {
            ctx.with_order(
                OrderBilling {
                    billing_address: Some(explicit),
                    matching_address_id: Some(AddressId::from("home")),
                },
                common::customer(),
            )
        },
    );
    assert_eq!(on_order.client.form_state().await.unwrap().billing, recorded);
    on_order.shutdown().await;
}

#[tokio::test]
async fn test_toggling_same_as_shipping_back_on_resets_typed_fields() {
    let harness = harness_with_book(MockAddressBook::new());

    let form = harness
        .client
        .set_use_shipping_as_billing(false)
        .await
        .unwrap();
    assert!(!form.use_shipping_as_billing);

    let form = harness.client.update_billing(city("Peoria")).await.unwrap();
    assert_eq!(form.billing.city, "Peoria");

    let form = harness
        .client
        .set_use_shipping_as_billing(true)
        .await
        .unwrap();
    assert_eq!(form.billing, common::home());
    assert_eq!(form.address_selector, Some(AddressId::from("home")));
    harness.shutdown().await;
}

#[tokio::test]
async fn test_select_address_fills_billing_from_address_book() {
    let harness = harness_with_book(MockAddressBook::new());

    let form = harness
        .client
        .select_address(AddressId::from("work"))
        .await
        .unwrap();

    assert_eq!(form.billing, common::work());
    assert_eq!(form.address_selector, Some(AddressId::from("work")));
    assert!(!form.use_shipping_as_billing);

    let unknown = harness.client.select_address(AddressId::from("cabin")).await;
    assert_eq!(
        unknown,
        Err(CheckoutError::Address(AddressError::UnknownAddress(
            "cabin".into()
        )))
    );
    harness.shutdown().await;
}

#[tokio::test]
async fn test_edit_commit_replaces_billing_snapshot() {
    let mut saved = common::home();
    saved.city = "Shelbyville".into();
    let mut book = MockAddressBook::new();
    book.expect_save().return_ok(saved.clone());
    let harness = harness_with_book(book);

    let session = harness.client.begin_edit().await.unwrap();
    assert_eq!(session.original(), &common::home());
    assert!(!session.is_dirty());

    let session = harness.client.update_edit(city("Shelbyville")).await.unwrap();
    assert!(session.is_dirty());
    assert_eq!(session.draft().city, "Shelbyville");

    // Draft changes stay in the session until committed.
    let form = harness.client.form_state().await.unwrap();
    assert_eq!(form.billing.city, "Springfield");

    let committed = harness.client.commit_edit().await.unwrap();

    assert_eq!(committed, saved);
    assert_eq!(harness.book.saved()[0].city, "Shelbyville");
    assert_eq!(harness.client.edit_session().await.unwrap(), None);
    let form = harness.client.form_state().await.unwrap();
    assert_eq!(form.billing, saved);
    harness.book.verify();
    harness.shutdown().await;
}

#[tokio::test]
async fn test_committed_edit_survives_reselection() {
    let mut saved = common::home();
    saved.city = "Shelbyville".into();
    let mut book = MockAddressBook::new();
    book.expect_save().return_ok(saved.clone());
    let harness = harness_with_book(book);

    harness.client.begin_edit().await.unwrap();
    harness.client.update_edit(city("Shelbyville")).await.unwrap();
    harness.client.commit_edit().await.unwrap();

    // Picking another entry and coming back must not restore the old copy.
    harness
        .client
        .select_address(AddressId::from("work"))
        .await
        .unwrap();
    let form = harness
        .client
        .select_address(AddressId::from("home"))
        .await
        .unwrap();

    assert_eq!(form.billing, saved);
    harness.book.verify();
    harness.shutdown().await;
}

#[tokio::test]
async fn test_commit_turns_same_as_shipping_back_on() {
    let mut saved = common::home();
    saved.city = "Shelbyville".into();
    let mut book = MockAddressBook::new();
    book.expect_save().return_ok(saved.clone());
    let harness = harness_with_book(book);

    let form = harness
        .client
        .select_address(AddressId::from("work"))
        .await
        .unwrap();
    assert!(!form.use_shipping_as_billing);

    harness.client.begin_edit().await.unwrap();
    harness.client.update_edit(city("Shelbyville")).await.unwrap();
    harness.client.commit_edit().await.unwrap();

    let form = harness.client.form_state().await.unwrap();
    assert!(form.use_shipping_as_billing);
    assert_eq!(form.billing, saved);
    assert_eq!(form.address_selector, Some(AddressId::from("home")));
    harness.shutdown().await;
}

#[tokio::test]
async fn test_failed_commit_keeps_session_open_with_error() {
    let mut book = MockAddressBook::new();
    book.expect_save()
        .return_err(ServiceError::Rejected("invalid postal code".into()));
    book.expect_save().return_ok(common::home());
    let harness = harness_with_book(book);

    harness.client.begin_edit().await.unwrap();
    harness.client.update_edit(city("Nowhere")).await.unwrap();

    let result = harness.client.commit_edit().await;

    assert_eq!(
        result,
        Err(CheckoutError::Address(AddressError::SaveFailed(
            SAVE_FAILED_MESSAGE.into()
        )))
    );
    let session = harness.client.edit_session().await.unwrap().unwrap();
    assert_eq!(session.error(), Some(SAVE_FAILED_MESSAGE));
    assert_eq!(session.draft().city, "Nowhere");
    assert!(!session.is_saving());
    assert_eq!(
        harness.client.form_state().await.unwrap().billing,
        common::home()
    );

    // The dialog is still open, so the user can try again.
    assert!(harness.client.commit_edit().await.is_ok());
    assert_eq!(harness.book.call_count(), 2);
    harness.book.verify();
    harness.shutdown().await;
}

#[tokio::test]
async fn test_session_is_locked_while_saving() {
    let gate = Arc::new(Notify::new());
    let mut book = MockAddressBook::new();
    book.expect_save().after(gate.clone()).return_ok(common::home());
    let harness = harness_with_book(book);

    harness.client.begin_edit().await.unwrap();
    let commit = tokio::spawn({
        let client = harness.client.clone();
        async move { client.commit_edit().await }
    });
    let book = harness.book.clone();
    eventually(|| {
        let book = book.clone();
        async move { book.call_count() == 1 }
    })
    .await;

    let pending = CheckoutError::Address(AddressError::CommitPending);
    assert_eq!(harness.client.commit_edit().await.unwrap_err(), pending);
    assert_eq!(
        harness.client.update_edit(city("Late")).await.unwrap_err(),
        pending
    );
    assert_eq!(harness.client.cancel_edit().await.unwrap_err(), pending);
    assert!(harness
        .client
        .edit_session()
        .await
        .unwrap()
        .unwrap()
        .is_saving());

    gate.notify_one();
    assert!(commit.await.unwrap().is_ok());
    assert_eq!(harness.book.call_count(), 1);
    harness.book.verify();
    harness.shutdown().await;
}

#[tokio::test]
async fn test_only_one_edit_session_at_a_time() {
    let harness = harness_with_book(MockAddressBook::new());

    harness.client.begin_edit().await.unwrap();
    let second = harness.client.begin_edit().await;

    assert_eq!(
        second.unwrap_err(),
        CheckoutError::Address(AddressError::EditInProgress)
    );
    harness.shutdown().await;
}

#[tokio::test]
async fn test_cancel_discards_session_without_side_effects() {
    let harness = harness_with_book(MockAddressBook::new());

    assert_eq!(
        harness.client.cancel_edit().await,
        Err(CheckoutError::Address(AddressError::NoEditSession))
    );

    harness.client.begin_edit().await.unwrap();
    harness.client.update_edit(city("Ogdenville")).await.unwrap();
    harness.client.cancel_edit().await.unwrap();

    assert_eq!(harness.client.edit_session().await.unwrap(), None);
    assert_eq!(
        harness.client.form_state().await.unwrap().billing,
        common::home()
    );
    assert_eq!(harness.book.call_count(), 0);

    // A new session starts from the untouched snapshot.
    let session = harness.client.begin_edit().await.unwrap();
    assert_eq!(session.draft(), &common::home());
    harness.shutdown().await;
}
