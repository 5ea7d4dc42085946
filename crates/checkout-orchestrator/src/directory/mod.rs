//! # Payment Method Directory
//!
//! Fetches and caches the processor's payment-method list for the current order
//! session. The cache has no TTL: once loaded, the snapshot lives as long as the
//! directory. A failed fetch leaves the directory `Unavailable` until someone
//! retries by hand.
//!
//! Fetching is split in two so the checkout actor never awaits the network:
//! [`begin_fetch`](PaymentMethodDirectory::begin_fetch) hands out a future to
//! run elsewhere, and [`resolve`](PaymentMethodDirectory::resolve) stores its
//! result. [`fetch`](PaymentMethodDirectory::fetch) does both in one call.

use crate::config::CheckoutSettings;
use crate::error::{DirectoryError, ServiceError};
use crate::model::{MethodList, SessionToken};
use crate::ports::PaymentMethodsRef;
use futures::future::BoxFuture;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "camelCase")]
pub enum DirectoryStatus {
    NotLoaded,
    Loading,
    Loaded(MethodList),
    /// The last fetch failed with this reason.
    Unavailable(String),
}

/// Outcome of [`PaymentMethodDirectory::begin_fetch`].
pub enum FetchPlan {
    /// The snapshot is already cached.
    Cached(MethodList),
    /// Another fetch is outstanding; wait for its resolution.
    InFlight,
    /// Run this future and pass its output to `resolve`.
    Fetch(BoxFuture<'static, Result<MethodList, ServiceError>>),
}

impl std::fmt::Debug for FetchPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchPlan::Cached(methods) => f.debug_tuple("Cached").field(methods).finish(),
            FetchPlan::InFlight => f.write_str("InFlight"),
            FetchPlan::Fetch(_) => f.write_str("Fetch(..)"),
        }
    }
}

pub struct PaymentMethodDirectory {
    service: PaymentMethodsRef,
    status: DirectoryStatus,
}

impl std::fmt::Debug for PaymentMethodDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentMethodDirectory")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl PaymentMethodDirectory {
    pub fn new(service: PaymentMethodsRef) -> Self {
        Self {
            service,
            status: DirectoryStatus::NotLoaded,
        }
    }

    pub fn status(&self) -> &DirectoryStatus {
        &self.status
    }

    /// The cached snapshot, once loaded.
    pub fn snapshot(&self) -> Option<&MethodList> {
        match &self.status {
            DirectoryStatus::Loaded(methods) => Some(methods),
            _ => None,
        }
    }

    /// Reason of the last failure while the directory is unavailable.
    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.status {
            DirectoryStatus::Unavailable(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn begin_fetch(&mut self, token: &SessionToken) -> FetchPlan {
        match &self.status {
            DirectoryStatus::Loaded(methods) => {
                debug!(methods = methods.len(), "Payment methods served from cache");
                FetchPlan::Cached(methods.clone())
            }
            DirectoryStatus::Loading => FetchPlan::InFlight,
            DirectoryStatus::NotLoaded | DirectoryStatus::Unavailable(_) => {
                info!("Fetching payment methods");
                self.status = DirectoryStatus::Loading;
                let service = self.service.clone();
                let token = token.clone();
                FetchPlan::Fetch(Box::pin(async move { service.fetch_methods(&token).await }))
            }
        }
    }

    /// Stores the result of a fetch started with `begin_fetch`.
    pub fn resolve(
        &mut self,
        result: Result<MethodList, ServiceError>,
    ) -> Result<MethodList, DirectoryError> {
        match result {
            Ok(methods) => {
                info!(methods = methods.len(), "Payment methods loaded");
                self.status = DirectoryStatus::Loaded(methods.clone());
                Ok(methods)
            }
            Err(e) => {
                warn!(error = %e, "Payment methods unavailable");
                let reason = e.to_string();
                self.status = DirectoryStatus::Unavailable(reason.clone());
                Err(DirectoryError::Unavailable(reason))
            }
        }
    }

    /// Fetches (or returns the cached) method list. Safe to call again after a
    /// failure.
    pub async fn fetch(&mut self, token: &SessionToken) -> Result<MethodList, DirectoryError> {
        match self.begin_fetch(token) {
            FetchPlan::Cached(methods) => Ok(methods),
            FetchPlan::InFlight => Err(DirectoryError::Loading),
            FetchPlan::Fetch(request) => {
                let result = request.await;
                self.resolve(result)
            }
        }
    }

    /// Whether `method` goes through the tokenization widget.
    ///
    /// Once loaded, only the snapshot decides; a method it does not list is
    /// not tokenized. Before loading, or after a failure, the configured list
    /// does.
    pub fn is_tokenized(&self, method: &str, settings: &CheckoutSettings) -> bool {
        match self.snapshot() {
            Some(methods) => methods
                .get(method)
                .is_some_and(|descriptor| descriptor.capabilities.tokenized),
            None => settings.is_tokenized_by_default(method),
        }
    }

    /// Whether `method` may be submitted: listed in the snapshot once loaded,
    /// anything while no snapshot exists.
    pub fn offers(&self, method: &str) -> bool {
        self.snapshot().map_or(true, |methods| methods.contains(method))
    }

    /// Whether the processor wants a device fingerprint with `method`.
    pub fn requires_fraud_signals(&self, method: &str) -> bool {
        self.snapshot()
            .and_then(|methods| methods.get(method))
            .is_some_and(|descriptor| descriptor.capabilities.fraud_signals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPaymentMethods;
    use crate::model::{MethodCapabilities, MethodDescriptor};
    use std::sync::Arc;

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

    #[tokio::test]
    async fn test_fetch_is_cached() {
        let mut service = MockPaymentMethods::new();
        service.expect_fetch().return_ok(methods());
        let mut directory = PaymentMethodDirectory::new(Arc::new(service.clone()));
        let token = SessionToken::new("csrf");

        assert_eq!(directory.fetch(&token).await.unwrap(), methods());
        assert_eq!(directory.fetch(&token).await.unwrap(), methods());

        assert_eq!(service.call_count(), 1);
        service.verify();
    }

    #[tokio::test]
    async fn test_failure_then_manual_retry() {
        let mut service = MockPaymentMethods::new();
        service
            .expect_fetch()
            .return_err(ServiceError::Transport("timeout".into()));
        service.expect_fetch().return_ok(methods());
        let mut directory = PaymentMethodDirectory::new(Arc::new(service.clone()));
        let token = SessionToken::new("csrf");

        let error = directory.fetch(&token).await.unwrap_err();
        assert!(matches!(error, DirectoryError::Unavailable(_)));
        assert!(directory.unavailable_reason().is_some());

        assert_eq!(directory.fetch(&token).await.unwrap(), methods());
        assert_eq!(directory.status(), &DirectoryStatus::Loaded(methods()));
        service.verify();
    }

    #[tokio::test]
    async fn test_second_begin_fetch_while_loading() {
        let service = MockPaymentMethods::new();
        let mut directory = PaymentMethodDirectory::new(Arc::new(service));
        let token = SessionToken::new("csrf");

        let first = directory.begin_fetch(&token);
        assert!(matches!(first, FetchPlan::Fetch(_)));
        assert!(matches!(directory.begin_fetch(&token), FetchPlan::InFlight));
        assert_eq!(directory.status(), &DirectoryStatus::Loading);
    }

    #[test]
    fn test_classification() {
        let settings = CheckoutSettings::default();
        let mut directory = PaymentMethodDirectory::new(Arc::new(MockPaymentMethods::new()));

        assert!(directory.is_tokenized("CREDIT_CARD", &settings));
        assert!(!directory.is_tokenized("GIFT_CERTIFICATE", &settings));
        assert!(!directory.requires_fraud_signals("AdyenComponent"));

        directory.resolve(Ok(methods())).unwrap();

        assert!(directory.is_tokenized("AdyenComponent", &settings));
        assert!(directory.requires_fraud_signals("AdyenComponent"));
        assert!(!directory.is_tokenized("GIFT_CERTIFICATE", &settings));
        assert!(!directory.is_tokenized("CREDIT_CARD", &settings));
        assert!(!directory.offers("CREDIT_CARD"));
    }

    #[test]
    fn test_empty_snapshot_offers_nothing() {
        let settings = CheckoutSettings::default();
        let mut directory = PaymentMethodDirectory::new(Arc::new(MockPaymentMethods::new()));
        assert!(directory.offers("AdyenComponent"));

        directory.resolve(Ok(MethodList::new(vec![]))).unwrap();

        assert!(!directory.offers("AdyenComponent"));
        assert!(!directory.is_tokenized("AdyenComponent", &settings));
    }
}
