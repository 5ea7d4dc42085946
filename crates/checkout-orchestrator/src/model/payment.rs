//! Session, tokenized payment and submission result types.
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};

/// CSRF/session token the order session is keyed on.
///
/// `Debug` is redacted so the token never lands in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionToken(***)")
    }
}

/// Payment data produced by one tokenization attempt.
///
/// Immutable once captured and single-use: a retry must tokenize again.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenizedPaymentState {
    state_data: String,
    brand_code: String,
    holder_name: String,
    fingerprint: Option<String>,
}

impl TokenizedPaymentState {
    pub(crate) fn new(
        state_data: String,
        brand_code: String,
        holder_name: String,
        fingerprint: Option<String>,
    ) -> Self {
        Self {
            state_data,
            brand_code,
            holder_name,
            fingerprint,
        }
    }

    /// Serialized processor state blob.
    pub fn state_data(&self) -> &str {
        &self.state_data
    }

    pub fn brand_code(&self) -> &str {
        &self.brand_code
    }

    pub fn holder_name(&self) -> &str {
        &self.holder_name
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }
}

impl Debug for TokenizedPaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenizedPaymentState")
            .field("state_data_len", &self.state_data.len())
            .field("brand_code", &self.brand_code)
            .field("has_fingerprint", &self.fingerprint.is_some())
            .finish()
    }
}

/// Stage of the surrounding checkout flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckoutStage {
    Payment,
    PlaceOrder,
}

impl Display for CheckoutStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckoutStage::Payment => write!(f, "payment"),
            CheckoutStage::PlaceOrder => write!(f, "placeOrder"),
        }
    }
}

/// Acknowledgement returned by the order-submission service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    #[serde(default)]
    pub order_no: Option<String>,
    pub next_stage: CheckoutStage,
}

impl SubmissionReceipt {
    pub fn accepted(order_no: Option<String>) -> Self {
        Self {
            order_no,
            next_stage: CheckoutStage::PlaceOrder,
        }
    }
}

/// Result of a `submit` trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The payment was accepted by the order-submission service.
    Submitted(SubmissionReceipt),
    /// Another submission was already pending; this trigger did nothing.
    AlreadyPending,
}
