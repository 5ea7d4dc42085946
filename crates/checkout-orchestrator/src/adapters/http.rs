//! HTTP adapter for the storefront's checkout controllers.
//!
//! Every call is a form-encoded `POST` carrying `csrf_token`; responses are
//! JSON. Paths, base URL and timeout come from [`ServiceConfig`].
//!
//! | Port | Endpoint (default) | Response |
//! |------|--------------------|----------|
//! | [`AddressBookService`] | `/Address-SaveAddress` | `{ "success": true, "address": {..} }` |
//! | [`PaymentMethodService`] | `/Adyen-GetPaymentMethods` | `{ "paymentMethods": [..] }` |
//! | [`OrderSubmissionService`] | `/CheckoutServices-SubmitPayment` | `{ "error": false, "orderNo": ".." }` |

use crate::config::ServiceConfig;
use crate::coordinator::payload::address_fields;
use crate::coordinator::SubmissionPayload;
use crate::error::ServiceError;
use crate::model::{AddressSnapshot, MethodList, SessionToken, SubmissionReceipt};
use crate::ports::{AddressBookService, OrderSubmissionService, PaymentMethodService};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct SaveAddressResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    address: Option<AddressSnapshot>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitPaymentResponse {
    #[serde(default)]
    error: bool,
    #[serde(default)]
    server_errors: Vec<String>,
    #[serde(default)]
    order_no: Option<String>,
}

/// Talks to the storefront over HTTP. One instance serves all three ports.
#[derive(Debug, Clone)]
pub struct HttpCheckoutServices {
    client: reqwest::Client,
    config: ServiceConfig,
}

impl HttpCheckoutServices {
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ServiceError::Transport(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        fields: &[(&'static str, String)],
    ) -> Result<T, ServiceError> {
        let url = self.url(path);
        debug!(url = %url, fields = fields.len(), "POST");

        let response = self
            .client
            .post(&url)
            .form(fields)
            .send()
            .await
            .map_err(|e| ServiceError::Transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, %status, "Request rejected");
            return Err(ServiceError::Rejected(format!(
                "HTTP request failed with status: {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ServiceError::Decode(format!("Failed to parse JSON response: {}", e)))
    }
}

#[async_trait]
impl AddressBookService for HttpCheckoutServices {
    async fn save_address(
        &self,
        token: &SessionToken,
        address: &AddressSnapshot,
    ) -> Result<AddressSnapshot, ServiceError> {
        let mut fields = vec![
            (
                "addressId",
                address.id.as_ref().map(|id| id.0.clone()).unwrap_or_default(),
            ),
            ("csrf_token", token.as_str().to_string()),
        ];
        fields.extend(address_fields(address));

        let response: SaveAddressResponse = self
            .post_form(&self.config.save_address_path, &fields)
            .await?;

        if !response.success {
            return Err(ServiceError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "address was not saved".to_string()),
            ));
        }
        Ok(response.address.unwrap_or_else(|| address.clone()))
    }
}

#[async_trait]
impl PaymentMethodService for HttpCheckoutServices {
    async fn fetch_methods(&self, token: &SessionToken) -> Result<MethodList, ServiceError> {
        let fields = [("csrf_token", token.as_str().to_string())];
        self.post_form(&self.config.payment_methods_path, &fields)
            .await
    }
}

#[async_trait]
impl OrderSubmissionService for HttpCheckoutServices {
    async fn submit_payment(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, ServiceError> {
        let response: SubmitPaymentResponse = self
            .post_form(&self.config.submit_payment_path, &payload.form_fields())
            .await?;

        if response.error {
            let reason = if response.server_errors.is_empty() {
                "payment was refused".to_string()
            } else {
                response.server_errors.join("; ")
            };
            return Err(ServiceError::Rejected(reason));
        }
        Ok(SubmissionReceipt::accepted(response.order_no))
    }
}
