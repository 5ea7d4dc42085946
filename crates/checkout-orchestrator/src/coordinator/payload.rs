//! The merged submission payload.
//!
//! Three asynchronous sources feed one request: the billing address, the
//! selected payment method, and (for tokenized methods) the captured payment
//! state. [`PayloadBuilder`] starts from a form snapshot and folds the
//! payment in.

use crate::model::{AddressId, AddressSnapshot, FormState, SessionToken, TokenizedPaymentState};

/// Where the billing address comes from. Exactly one source applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingSource {
    /// Billing equals the shipping-derived defaults.
    SameAsShipping(AddressSnapshot),
    /// The shopper entered or selected a billing address.
    Explicit {
        address: AddressSnapshot,
        selector: Option<AddressId>,
    },
}

impl BillingSource {
    pub fn address(&self) -> &AddressSnapshot {
        match self {
            BillingSource::SameAsShipping(address) => address,
            BillingSource::Explicit { address, .. } => address,
        }
    }
}

/// One consolidated request for the order-submission service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPayload {
    pub session_token: SessionToken,
    pub billing: BillingSource,
    pub payment_method: String,
    /// Display brand of the method (`Cards`), when the directory knows it.
    pub method_brand: Option<String>,
    /// Present exactly when the method is tokenized.
    pub payment: Option<TokenizedPaymentState>,
    pub masked_card_number: Option<String>,
    pub card_type: Option<String>,
}

impl SubmissionPayload {
    pub fn is_tokenized(&self) -> bool {
        self.payment.is_some()
    }

    /// Flattens the payload into the checkout form's field names.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let (use_shipping, selector) = match &self.billing {
            BillingSource::SameAsShipping(address) => (true, address.id.clone()),
            BillingSource::Explicit { selector, .. } => (false, selector.clone()),
        };

        let mut fields = vec![(
            "addressSelector",
            selector.map(|id| id.0).unwrap_or_default(),
        )];
        fields.extend(address_fields(self.billing.address()));
        fields.extend([
            ("csrf_token", self.session_token.as_str().to_string()),
            ("dwfrm_billing_paymentMethod", self.payment_method.clone()),
            ("adyenPaymentMethod", self.method_brand.clone().unwrap_or_default()),
            (
                "dwfrm_billing_shippingAddressUseAsBillingAddress",
                use_shipping.to_string(),
            ),
            (
                "dwfrm_billing_creditCardFields_cardNumber",
                self.masked_card_number.clone().unwrap_or_default(),
            ),
            (
                "dwfrm_billing_creditCardFields_cardType",
                self.card_type.clone().unwrap_or_default(),
            ),
        ]);

        let (state_data, brand_code, holder_name, fingerprint) = match &self.payment {
            Some(payment) => (
                payment.state_data().to_string(),
                payment.brand_code().to_string(),
                payment.holder_name().to_string(),
                payment.fingerprint().unwrap_or_default().to_string(),
            ),
            None => Default::default(),
        };
        fields.extend([
            ("dwfrm_billing_adyenPaymentFields_adyenStateData", state_data),
            ("brandCode", brand_code),
            ("holderName", holder_name),
            ("dwfrm_billing_adyenPaymentFields_adyenFingerprint", fingerprint),
        ]);

        fields
    }
}

/// Address fields as the address book and the billing form name them.
pub(crate) fn address_fields(address: &AddressSnapshot) -> Vec<(&'static str, String)> {
    vec![
        ("dwfrm_billing_addressFields_firstName", address.first_name.clone()),
        ("dwfrm_billing_addressFields_lastName", address.last_name.clone()),
        ("dwfrm_billing_addressFields_address1", address.address1.clone()),
        (
            "dwfrm_billing_addressFields_address2",
            address.address2.clone().unwrap_or_default(),
        ),
        ("dwfrm_billing_addressFields_country", address.country.clone()),
        ("dwfrm_billing_addressFields_states_stateCode", address.state_code.clone()),
        ("dwfrm_billing_addressFields_city", address.city.clone()),
        ("dwfrm_billing_addressFields_postalCode", address.postal_code.clone()),
        ("dwfrm_billing_contactInfoFields_phone", address.phone.clone()),
    ]
}

/// Accumulates the parts of a [`SubmissionPayload`].
///
/// Billing, method selection and card projections come from the FormState
/// handed to [`new`](Self::new), so a payload never lacks an address.
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    session_token: SessionToken,
    billing: BillingSource,
    payment_method: String,
    method_brand: Option<String>,
    payment: Option<TokenizedPaymentState>,
    masked_card_number: Option<String>,
    card_type: Option<String>,
}

impl PayloadBuilder {
    /// `shipping_defaults` is what "same as shipping" resolves to; typed
    /// billing fields are ignored in that case.
    pub fn new(
        session_token: SessionToken,
        form: &FormState,
        shipping_defaults: &AddressSnapshot,
    ) -> Self {
        let billing = if form.use_shipping_as_billing {
            BillingSource::SameAsShipping(shipping_defaults.clone())
        } else {
            BillingSource::Explicit {
                address: form.billing.clone(),
                selector: form.address_selector.clone(),
            }
        };
        Self {
            session_token,
            billing,
            payment_method: form.payment_method.clone(),
            method_brand: None,
            payment: None,
            masked_card_number: form.masked_card_number.clone(),
            card_type: form.card_type.clone(),
        }
    }

    pub fn method_brand(mut self, brand: Option<String>) -> Self {
        self.method_brand = brand;
        self
    }

    pub fn tokenized(mut self, payment: TokenizedPaymentState) -> Self {
        self.payment = Some(payment);
        self
    }

    pub fn build(self) -> SubmissionPayload {
        SubmissionPayload {
            billing: self.billing,
            session_token: self.session_token,
            payment_method: self.payment_method,
            method_brand: self.method_brand,
            payment: self.payment,
            masked_card_number: self.masked_card_number,
            card_type: self.card_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shipping() -> AddressSnapshot {
        AddressSnapshot {
            id: Some(AddressId::from("home")),
            first_name: "Alice".into(),
            last_name: "Smith".into(),
            address1: "1 Main St".into(),
            address2: None,
            city: "Springfield".into(),
            country: "US".into(),
            state_code: "IL".into(),
            postal_code: "62701".into(),
            phone: "555-0100".into(),
        }
    }

    fn field<'a>(fields: &'a [(&'static str, String)], name: &str) -> &'a str {
        fields
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
            .unwrap_or_else(|| panic!("missing field {name}"))
    }

    #[test]
    fn test_same_as_shipping_ignores_typed_fields() {
        let mut form = FormState::new(&shipping(), shipping().id, "GIFT_CERTIFICATE");
        form.billing.first_name = "Typed".into();

        let payload = PayloadBuilder::new(SessionToken::new("csrf"), &form, &shipping())
            .build();
        let fields = payload.form_fields();

        assert_eq!(field(&fields, "dwfrm_billing_addressFields_firstName"), "Alice");
        assert_eq!(field(&fields, "dwfrm_billing_shippingAddressUseAsBillingAddress"), "true");
        assert_eq!(field(&fields, "addressSelector"), "home");
        assert_eq!(field(&fields, "dwfrm_billing_adyenPaymentFields_adyenStateData"), "");
        assert!(!payload.is_tokenized());
    }

    #[test]
    fn test_tokenized_explicit_billing() {
        let mut form = FormState::new(&shipping(), None, "AdyenComponent");
        form.use_shipping_as_billing = false;
        form.billing.city = "Shelbyville".into();
        form.masked_card_number = Some("************1111".into());

        let payment = TokenizedPaymentState::new(
            "{\"paymentMethod\":{}}".into(),
            "scheme".into(),
            "Alice Smith".into(),
            Some("fp".into()),
        );
        let payload = PayloadBuilder::new(SessionToken::new("csrf"), &form, &shipping())
            .method_brand(Some("Cards".into()))
            .tokenized(payment)
            .build();
        let fields = payload.form_fields();

        assert_eq!(field(&fields, "dwfrm_billing_addressFields_city"), "Shelbyville");
        assert_eq!(field(&fields, "dwfrm_billing_shippingAddressUseAsBillingAddress"), "false");
        assert_eq!(field(&fields, "csrf_token"), "csrf");
        assert_eq!(field(&fields, "dwfrm_billing_paymentMethod"), "AdyenComponent");
        assert_eq!(field(&fields, "adyenPaymentMethod"), "Cards");
        assert_eq!(field(&fields, "brandCode"), "scheme");
        assert_eq!(field(&fields, "holderName"), "Alice Smith");
        assert_eq!(field(&fields, "dwfrm_billing_adyenPaymentFields_adyenFingerprint"), "fp");
        assert_eq!(
            field(&fields, "dwfrm_billing_creditCardFields_cardNumber"),
            "************1111"
        );
    }
}
