use super::message::{CheckoutRequest, Response};
use crate::address::EditSession;
use crate::directory::DirectoryStatus;
use crate::error::CheckoutError;
use crate::model::{
    AddressId, AddressPatch, AddressSnapshot, FormState, MethodList, SubmitOutcome,
};
use crate::tokenization::TokenizationPhase;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument};

/// Client for the checkout actor.
///
/// Cheap to clone; every clone talks to the same actor. The actor stops once
/// all clients are dropped.
#[derive(Clone)]
pub struct CheckoutClient {
    sender: mpsc::Sender<CheckoutRequest>,
}

impl CheckoutClient {
    pub fn new(sender: mpsc::Sender<CheckoutRequest>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Response<T>) -> CheckoutRequest,
    ) -> Result<T, CheckoutError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| CheckoutError::from("Checkout actor closed".to_string()))?;
        response
            .await
            .map_err(|_| CheckoutError::from("Checkout actor dropped the request".to_string()))?
    }

    #[instrument(skip(self))]
    pub async fn form_state(&self) -> Result<FormState, CheckoutError> {
        self.request(|respond_to| CheckoutRequest::FormState { respond_to })
            .await
    }

    #[instrument(skip(self, patch))]
    pub async fn update_billing(&self, patch: AddressPatch) -> Result<FormState, CheckoutError> {
        debug!(?patch, "update_billing called");
        self.request(|respond_to| CheckoutRequest::UpdateBilling { patch, respond_to })
            .await
    }

    /// Turning the toggle on resets the billing fields to the derived defaults.
    #[instrument(skip(self))]
    pub async fn set_use_shipping_as_billing(
        &self,
        enabled: bool,
    ) -> Result<FormState, CheckoutError> {
        self.request(|respond_to| CheckoutRequest::SetUseShippingAsBilling {
            enabled,
            respond_to,
        })
        .await
    }

    /// Uses a saved address-book entry as the billing address.
    #[instrument(skip(self))]
    pub async fn select_address(&self, id: AddressId) -> Result<FormState, CheckoutError> {
        self.request(|respond_to| CheckoutRequest::SelectAddress { id, respond_to })
            .await
    }

    #[instrument(skip(self))]
    pub async fn select_payment_method(
        &self,
        method: impl Into<String> + std::fmt::Debug,
    ) -> Result<FormState, CheckoutError> {
        let method = method.into();
        self.request(|respond_to| CheckoutRequest::SelectPaymentMethod { method, respond_to })
            .await
    }

    #[instrument(skip(self))]
    pub async fn payment_methods(&self) -> Result<DirectoryStatus, CheckoutError> {
        self.request(|respond_to| CheckoutRequest::PaymentMethods { respond_to })
            .await
    }

    /// Refetches the directory after a failure. Resolves with the method list
    /// once the fetch settles; returns the cache when already loaded.
    #[instrument(skip(self))]
    pub async fn retry_payment_methods(&self) -> Result<MethodList, CheckoutError> {
        info!("Retrying payment methods");
        self.request(|respond_to| CheckoutRequest::RetryPaymentMethods { respond_to })
            .await
    }

    #[instrument(skip(self))]
    pub async fn tokenization_state(&self) -> Result<TokenizationPhase, CheckoutError> {
        self.request(|respond_to| CheckoutRequest::TokenizationState { respond_to })
            .await
    }

    /// Submits the payment.
    ///
    /// Resolves once the order-submission service has answered. A trigger that
    /// arrives while another submission is pending resolves immediately with
    /// [`SubmitOutcome::AlreadyPending`].
    #[instrument(skip(self))]
    pub async fn submit(&self) -> Result<SubmitOutcome, CheckoutError> {
        info!("Sending submit to actor");
        self.request(|respond_to| CheckoutRequest::Submit { respond_to })
            .await
    }

    #[instrument(skip(self))]
    pub async fn begin_edit(&self) -> Result<EditSession, CheckoutError> {
        self.request(|respond_to| CheckoutRequest::BeginEdit { respond_to })
            .await
    }

    #[instrument(skip(self, patch))]
    pub async fn update_edit(&self, patch: AddressPatch) -> Result<EditSession, CheckoutError> {
        debug!(?patch, "update_edit called");
        self.request(|respond_to| CheckoutRequest::UpdateEdit { patch, respond_to })
            .await
    }

    #[instrument(skip(self))]
    pub async fn commit_edit(&self) -> Result<AddressSnapshot, CheckoutError> {
        self.request(|respond_to| CheckoutRequest::CommitEdit { respond_to })
            .await
    }

    #[instrument(skip(self))]
    pub async fn cancel_edit(&self) -> Result<(), CheckoutError> {
        self.request(|respond_to| CheckoutRequest::CancelEdit { respond_to })
            .await
    }

    #[instrument(skip(self))]
    pub async fn edit_session(&self) -> Result<Option<EditSession>, CheckoutError> {
        self.request(|respond_to| CheckoutRequest::EditSession { respond_to })
            .await
    }
}
