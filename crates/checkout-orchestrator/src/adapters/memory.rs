//! In-process implementations of the service ports, for the sample binary and
//! for tests that want real behaviour rather than scripted answers.

use crate::coordinator::SubmissionPayload;
use crate::error::ServiceError;
use crate::model::{AddressId, AddressSnapshot, MethodList, SessionToken, SubmissionReceipt};
use crate::ports::{AddressBookService, OrderSubmissionService, PaymentMethodService};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// A thread-safe in-memory address book.
///
/// Saving an address without an id assigns one (`address_N`).
#[derive(Debug, Default, Clone)]
pub struct InMemoryAddressBook {
    addresses: Arc<RwLock<HashMap<AddressId, AddressSnapshot>>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryAddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the book with existing entries.
    pub fn with_addresses(addresses: impl IntoIterator<Item = AddressSnapshot>) -> Self {
        let entries = addresses
            .into_iter()
            .filter_map(|address| address.id.clone().map(|id| (id, address)))
            .collect();
        Self {
            addresses: Arc::new(RwLock::new(entries)),
            next_id: Arc::default(),
        }
    }

    pub async fn get(&self, id: &AddressId) -> Option<AddressSnapshot> {
        self.addresses.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.addresses.read().await.len()
    }
}

#[async_trait]
impl AddressBookService for InMemoryAddressBook {
    async fn save_address(
        &self,
        _token: &SessionToken,
        address: &AddressSnapshot,
    ) -> Result<AddressSnapshot, ServiceError> {
        let mut saved = address.clone();
        let id = saved
            .id
            .get_or_insert_with(|| {
                let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                AddressId(format!("address_{n}"))
            })
            .clone();

        let mut addresses = self.addresses.write().await;
        addresses.insert(id.clone(), saved.clone());
        debug!(address_id = %id, size = addresses.len(), "Address saved");
        Ok(saved)
    }
}

/// Serves a fixed method list.
#[derive(Debug, Clone)]
pub struct StaticPaymentMethods {
    methods: MethodList,
}

impl StaticPaymentMethods {
    pub fn new(methods: MethodList) -> Self {
        Self { methods }
    }
}

#[async_trait]
impl PaymentMethodService for StaticPaymentMethods {
    async fn fetch_methods(&self, _token: &SessionToken) -> Result<MethodList, ServiceError> {
        Ok(self.methods.clone())
    }
}

/// Accepts every payment and keeps the payloads it received.
#[derive(Debug, Default, Clone)]
pub struct InMemoryOrderLedger {
    submissions: Arc<RwLock<Vec<SubmissionPayload>>>,
}

impl InMemoryOrderLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn submissions(&self) -> Vec<SubmissionPayload> {
        self.submissions.read().await.clone()
    }
}

#[async_trait]
impl OrderSubmissionService for InMemoryOrderLedger {
    async fn submit_payment(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, ServiceError> {
        let mut submissions = self.submissions.write().await;
        submissions.push(payload.clone());
        let order_no = format!("{:05}", submissions.len());
        debug!(order_no = %order_no, "Payment recorded");
        Ok(SubmissionReceipt::accepted(Some(order_no)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_addresses_get_ids() {
        let book = InMemoryAddressBook::new();
        let token = SessionToken::new("csrf");

        let first = book
            .save_address(&token, &AddressSnapshot::empty("US", "AL"))
            .await
            .unwrap();
        let second = book
            .save_address(&token, &AddressSnapshot::empty("US", "AK"))
            .await
            .unwrap();

        assert_eq!(first.id, Some(AddressId::from("address_1")));
        assert_eq!(second.id, Some(AddressId::from("address_2")));
        assert_eq!(book.len().await, 2);
    }

    #[tokio::test]
    async fn test_existing_address_is_overwritten() {
        let mut address = AddressSnapshot::empty("US", "AL");
        address.id = Some(AddressId::from("home"));
        let book = InMemoryAddressBook::with_addresses([address.clone()]);

        address.city = "Mobile".into();
        book.save_address(&SessionToken::new("csrf"), &address)
            .await
            .unwrap();

        assert_eq!(book.len().await, 1);
        assert_eq!(book.get(&AddressId::from("home")).await.unwrap().city, "Mobile");
    }
}
