//! The in-progress billing submission.
use crate::error::{FieldError, ValidationErrors};
use crate::model::{AddressId, AddressSnapshot};
use serde::{Deserialize, Serialize};

/// The orchestrator's in-progress submission.
///
/// Created with defaults derived from the authoritative billing address, mutated
/// by user input and by widget projections, and consumed once by a successful
/// submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    /// Saved address the billing fields were taken from, if any.
    pub address_selector: Option<AddressId>,
    /// Editable billing fields.
    pub billing: AddressSnapshot,
    pub use_shipping_as_billing: bool,
    /// Selected payment method id.
    pub payment_method: String,
    /// Cosmetic projection of the widget's card suffix (`************1234`).
    pub masked_card_number: Option<String>,
    /// Cosmetic projection of the brand detected by the widget.
    pub card_type: Option<String>,
}

impl FormState {
    pub fn new(
        defaults: &AddressSnapshot,
        address_selector: Option<AddressId>,
        payment_method: impl Into<String>,
    ) -> Self {
        Self {
            address_selector,
            billing: defaults.clone(),
            use_shipping_as_billing: true,
            payment_method: payment_method.into(),
            masked_card_number: None,
            card_type: None,
        }
    }

    /// Drops whatever was typed into the billing fields and takes `defaults`.
    pub fn rederive(&mut self, defaults: &AddressSnapshot) {
        self.billing = defaults.clone();
        self.address_selector = defaults.id.clone();
    }

    /// Required-field check run before anything reaches the network.
    ///
    /// Address fields are only checked when billing is entered explicitly.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();

        if self.payment_method.trim().is_empty() {
            errors.push(FieldError {
                field: "paymentMethod",
                message: "Please select a payment method",
            });
        }

        if !self.use_shipping_as_billing {
            let billing = &self.billing;
            let required = [
                ("firstName", &billing.first_name, "First name is required"),
                ("lastName", &billing.last_name, "Last name is required"),
                ("address1", &billing.address1, "Address is required"),
                ("country", &billing.country, "Country is required"),
                ("stateCode", &billing.state_code, "State is required"),
                ("city", &billing.city, "City is required"),
                ("postalCode", &billing.postal_code, "Postal code is required"),
                ("phone", &billing.phone, "Phone number is required"),
            ];
            for (field, value, message) in required {
                if value.trim().is_empty() {
                    errors.push(FieldError { field, message });
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(errors))
        }
    }
}
