//! # Checkout Errors
//!
//! Each component gets its own error type, and [`CheckoutError`] is the union the
//! client hands back to callers. Nothing in here is retried automatically: every
//! variant describes an attempt that is over and has to be triggered again.

use std::fmt::Display;
use thiserror::Error;

/// Failure reported by one of the external services (address book, payment
/// method directory, order submission).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// The request never produced a usable HTTP response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered and refused the request.
    #[error("Rejected by server: {0}")]
    Rejected(String),

    /// The server answered with something that could not be decoded.
    #[error("Malformed response: {0}")]
    Decode(String),
}

/// Failure reported by the embedded tokenization widget.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WidgetError {
    #[error("Widget mount failed: {0}")]
    Mount(String),

    #[error("Widget refused the submit trigger: {0}")]
    Trigger(String),
}

/// Errors of the payment method directory.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectoryError {
    /// The last fetch failed; a manual retry is required.
    #[error("Payment methods unavailable: {0}")]
    Unavailable(String),

    /// A fetch is still outstanding.
    #[error("Payment methods are still loading")]
    Loading,
}

/// Errors of the tokenization bridge.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenizationError {
    /// The widget is not in a phase that accepts this operation.
    #[error("Payment widget is not ready (phase: {0})")]
    NotReady(String),

    /// The submit event could not be turned into a payment state.
    #[error("Malformed tokenization payload: {0}")]
    MalformedPayload(String),

    /// The selected method needs fraud signals and the widget sent none.
    #[error("Tokenization payload is missing the device fingerprint")]
    MissingFingerprint,

    #[error(transparent)]
    Widget(#[from] WidgetError),
}

/// Errors of the address-edit sub-flow.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("Another address edit is already open")]
    EditInProgress,

    #[error("No address edit is open")]
    NoEditSession,

    #[error("The address edit is already being saved")]
    CommitPending,

    #[error("Unknown address: {0}")]
    UnknownAddress(String),

    /// The address book refused or failed to persist the edit.
    #[error("{0}")]
    SaveFailed(String),
}

/// A single required-field violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

/// All field violations found in one validation pass.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Validation failed: {}", join_messages(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|error| error.field == field)
    }
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|error| error.message)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors returned by the checkout client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CheckoutError {
    /// Local field validation failed; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// The payment method directory could not be loaded, so tokenized
    /// submission is disabled.
    #[error("Payment methods unavailable: {0}")]
    MethodsUnavailable(String),

    #[error("Unknown payment method: {0}")]
    UnknownPaymentMethod(String),

    #[error(transparent)]
    Tokenization(#[from] TokenizationError),

    /// The order-submission service failed or refused the payment.
    #[error("Payment submission failed: {0}")]
    Submission(String),

    /// The form was already consumed by a successful submission.
    #[error("Payment was already submitted for this checkout")]
    AlreadySubmitted,

    #[error(transparent)]
    Address(#[from] AddressError),

    /// An error occurred while communicating with the checkout actor.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<String> for CheckoutError {
    fn from(msg: String) -> Self {
        CheckoutError::ActorCommunicationError(msg)
    }
}

impl From<DirectoryError> for CheckoutError {
    fn from(error: DirectoryError) -> Self {
        match error {
            DirectoryError::Unavailable(reason) => CheckoutError::MethodsUnavailable(reason),
            DirectoryError::Loading => CheckoutError::MethodsUnavailable(error.to_string()),
        }
    }
}

impl CheckoutError {
    pub(crate) fn submission(error: impl Display) -> Self {
        CheckoutError::Submission(error.to_string())
    }
}
