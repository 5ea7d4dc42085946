//! # Ports
//!
//! Contracts for the collaborators the checkout core talks to. The core only ever
//! holds these as `Arc<dyn …>`, so production adapters ([`crate::adapters`]) and
//! test doubles ([`crate::mock`]) are interchangeable.
//!
//! Every boundary crossing passes owned or borrowed snapshots; nothing mutable is
//! shared with a collaborator.

use crate::config::WidgetConfig;
use crate::coordinator::SubmissionPayload;
use crate::error::{ServiceError, WidgetError};
use crate::model::{AddressSnapshot, MethodList, SessionToken, SubmissionReceipt};
use crate::tokenization::WidgetEventSink;
use async_trait::async_trait;
use std::sync::Arc;

/// Persists address edits.
#[async_trait]
pub trait AddressBookService: Send + Sync {
    /// Saves `address` and returns the persisted record. New addresses
    /// (without an id) come back with the id the address book assigned.
    async fn save_address(
        &self,
        token: &SessionToken,
        address: &AddressSnapshot,
    ) -> Result<AddressSnapshot, ServiceError>;
}

/// Lists the payment methods the processor accepts for this session.
#[async_trait]
pub trait PaymentMethodService: Send + Sync {
    async fn fetch_methods(&self, token: &SessionToken) -> Result<MethodList, ServiceError>;
}

/// Accepts the final, merged payment payload.
#[async_trait]
pub trait OrderSubmissionService: Send + Sync {
    async fn submit_payment(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, ServiceError>;
}

/// A live, mounted tokenization widget.
///
/// Owned exclusively by the tokenization bridge. Results of [`submit`](Self::submit)
/// arrive later as events on the sink the widget was mounted with.
pub trait TokenizationWidget: Send {
    /// Asks the widget to tokenize what the shopper typed.
    fn submit(&mut self) -> Result<(), WidgetError>;

    /// Releases the widget. Events emitted afterwards are ignored.
    fn unmount(&mut self);
}

/// Everything a widget needs at mount time.
#[derive(Debug, Clone)]
pub struct WidgetMount {
    pub config: WidgetConfig,
    /// Directory snapshot the widget is initialized with.
    pub methods: MethodList,
    pub events: WidgetEventSink,
}

/// Creates widget instances. Mount completion is reported asynchronously with a
/// `Mounted` event on the sink.
pub trait WidgetFactory: Send + Sync {
    fn mount(&self, mount: WidgetMount) -> Result<Box<dyn TokenizationWidget>, WidgetError>;
}

pub type AddressBookRef = Arc<dyn AddressBookService>;
pub type PaymentMethodsRef = Arc<dyn PaymentMethodService>;
pub type OrderSubmissionRef = Arc<dyn OrderSubmissionService>;
pub type WidgetFactoryRef = Arc<dyn WidgetFactory>;
