//! Inbound widget events and their defensive parsing.
//!
//! The widget is host-controlled code: its callbacks fire whenever it likes and
//! carry loosely-typed JSON. Events are tagged with the instance that emitted
//! them and pushed onto an unbounded channel, since a widget callback cannot
//! wait for capacity. Nothing from a payload is trusted until it has been parsed
//! here.

use crate::error::TokenizationError;
use crate::model::TokenizedPaymentState;
use serde_json::Value;
use tokio::sync::mpsc;

/// Identifies one mounted widget. Every mount gets a fresh id, so late events
/// from a torn-down instance can be recognised and dropped.
pub type WidgetInstanceId = u64;

/// Raw lifecycle events a widget can emit.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    /// Mount finished; the widget accepts input.
    Mounted,
    /// Terminal tokenization result (`onSubmit(state)`).
    Submit(Value),
    /// Field content changed (`onChange(state)`).
    Change(Value),
    /// A single field validated (`onFieldValid(data)`).
    FieldValid(Value),
    /// The widget gave up on the current tokenization attempt.
    Failed(String),
}

/// A widget event together with the instance that emitted it.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedWidgetEvent {
    pub instance: WidgetInstanceId,
    pub event: WidgetEvent,
}

/// Handle through which a mounted widget reports back to the orchestrator.
#[derive(Debug, Clone)]
pub struct WidgetEventSink {
    instance: WidgetInstanceId,
    sender: mpsc::UnboundedSender<TaggedWidgetEvent>,
}

impl WidgetEventSink {
    pub(crate) fn new(
        instance: WidgetInstanceId,
        sender: mpsc::UnboundedSender<TaggedWidgetEvent>,
    ) -> Self {
        Self { instance, sender }
    }

    pub fn instance(&self) -> WidgetInstanceId {
        self.instance
    }

    /// Forwards `event`. Returns `false` once the orchestrator has shut down.
    pub fn emit(&self, event: WidgetEvent) -> bool {
        self.sender
            .send(TaggedWidgetEvent {
                instance: self.instance,
                event,
            })
            .is_ok()
    }

    pub fn mounted(&self) -> bool {
        self.emit(WidgetEvent::Mounted)
    }

    pub fn submit(&self, state: Value) -> bool {
        self.emit(WidgetEvent::Submit(state))
    }

    pub fn change(&self, state: Value) -> bool {
        self.emit(WidgetEvent::Change(state))
    }

    pub fn field_valid(&self, data: Value) -> bool {
        self.emit(WidgetEvent::FieldValid(data))
    }

    pub fn failed(&self, reason: impl Into<String>) -> bool {
        self.emit(WidgetEvent::Failed(reason.into()))
    }
}

/// Cosmetic FormState update derived from a field-level event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Masked card number, e.g. `************1234`.
    MaskedCardNumber(String),
    /// Brand detected while typing, e.g. `visa`.
    CardType(String),
}

const CARD_MASK: &str = "************";

/// Turns an `onSubmit` state into a [`TokenizedPaymentState`].
///
/// Expected shape:
///
/// ```json
/// {
///   "isValid": true,
///   "data": {
///     "paymentMethod": { "type": "scheme", "holderName": "A. Smith", "...": "..." },
///     "riskData": { "clientData": "<fingerprint>" }
///   }
/// }
/// ```
///
/// The fingerprint is read from `riskData.clientData` only. When
/// `requires_fingerprint` is set, its absence fails the parse.
pub fn parse_submit(
    state: &Value,
    requires_fingerprint: bool,
) -> Result<TokenizedPaymentState, TokenizationError> {
    if state.get("isValid").and_then(Value::as_bool) == Some(false) {
        return Err(TokenizationError::MalformedPayload(
            "widget reported invalid card data".to_string(),
        ));
    }

    let data = state
        .get("data")
        .filter(|data| data.is_object())
        .ok_or_else(|| TokenizationError::MalformedPayload("missing data object".to_string()))?;

    let payment_method = data
        .get("paymentMethod")
        .filter(|method| method.is_object())
        .ok_or_else(|| {
            TokenizationError::MalformedPayload("missing paymentMethod object".to_string())
        })?;

    let brand_code = match payment_method.get("type") {
        None | Some(Value::Null) => "scheme".to_string(),
        Some(Value::String(kind)) if !kind.is_empty() => kind.clone(),
        Some(_) => {
            return Err(TokenizationError::MalformedPayload(
                "paymentMethod.type is not a string".to_string(),
            ))
        }
    };

    let holder_name = payment_method
        .get("holderName")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let fingerprint = data
        .get("riskData")
        .and_then(|risk| risk.get("clientData"))
        .and_then(Value::as_str)
        .filter(|fingerprint| !fingerprint.is_empty())
        .map(str::to_string);

    if requires_fingerprint && fingerprint.is_none() {
        return Err(TokenizationError::MissingFingerprint);
    }

    let state_data = serde_json::to_string(data)
        .map_err(|e| TokenizationError::MalformedPayload(e.to_string()))?;

    Ok(TokenizedPaymentState::new(
        state_data,
        brand_code,
        holder_name,
        fingerprint,
    ))
}

/// Card brand from an `onChange` state (`data.paymentMethod.brand`).
pub fn parse_change(state: &Value) -> Option<Projection> {
    state
        .pointer("/data/paymentMethod/brand")
        .and_then(Value::as_str)
        .filter(|brand| !brand.is_empty())
        .map(|brand| Projection::CardType(brand.to_string()))
}

/// Masked card number from `onFieldValid` data (`endDigits`).
pub fn parse_field_valid(data: &Value) -> Option<Projection> {
    data.get("endDigits")
        .and_then(Value::as_str)
        .filter(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
        .map(|digits| Projection::MaskedCardNumber(format!("{CARD_MASK}{digits}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn submit_state() -> Value {
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

    #[test]
    fn test_parse_submit_reads_structured_fields() {
        let state = parse_submit(&submit_state(), true).unwrap();

        assert_eq!(state.brand_code(), "scheme");
        assert_eq!(state.holder_name(), "Alice Smith");
        assert_eq!(state.fingerprint(), Some("fp_123"));

        let blob: Value = serde_json::from_str(state.state_data()).unwrap();
        assert_eq!(blob, submit_state()["data"]);
    }

    #[test]
    fn test_missing_type_and_holder_fall_back() {
        let state = json!({ "data": { "paymentMethod": {} } });
        let parsed = parse_submit(&state, false).unwrap();

        assert_eq!(parsed.brand_code(), "scheme");
        assert_eq!(parsed.holder_name(), "");
        assert_eq!(parsed.fingerprint(), None);
    }

    #[test]
    fn test_missing_fingerprint_when_required() {
        let mut state = submit_state();
        state["data"]["riskData"] = json!({});
        assert_eq!(
            parse_submit(&state, true).unwrap_err(),
            TokenizationError::MissingFingerprint
        );
        assert!(parse_submit(&state, false).is_ok());
    }

    #[test]
    fn test_fingerprint_is_never_scraped_from_the_blob() {
        let mut state = submit_state();
        state["data"]["riskData"] = Value::Null;
        state["data"]["paymentMethod"]["note"] = json!("fingerprint\":\"scraped");

        assert_eq!(
            parse_submit(&state, true).unwrap_err(),
            TokenizationError::MissingFingerprint
        );
    }

    #[test]
    fn test_garbage_is_rejected() {
        for garbage in [
            json!(null),
            json!("state"),
            json!({ "data": "oops" }),
            json!({ "data": { "paymentMethod": 42 } }),
            json!({ "data": { "paymentMethod": { "type": 7 } } }),
            json!({ "isValid": false, "data": { "paymentMethod": {} } }),
        ] {
            assert!(
                matches!(
                    parse_submit(&garbage, false),
                    Err(TokenizationError::MalformedPayload(_))
                ),
                "accepted {garbage}"
            );
        }
    }

    #[test]
    fn test_projections() {
        assert_eq!(
            parse_field_valid(&json!({ "endDigits": "1111" })),
            Some(Projection::MaskedCardNumber("************1111".into()))
        );
        assert_eq!(parse_field_valid(&json!({ "endDigits": "<b>" })), None);
        assert_eq!(parse_field_valid(&json!({ "fieldType": "encryptedExpiryDate" })), None);

        assert_eq!(
            parse_change(&json!({ "data": { "paymentMethod": { "brand": "mc" } } })),
            Some(Projection::CardType("mc".into()))
        );
        assert_eq!(parse_change(&json!({ "data": {} })), None);
    }
}
