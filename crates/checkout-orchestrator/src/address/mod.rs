//! # Address Resolver
//!
//! Decides which address is authoritative for billing and runs the address-edit
//! sub-flow.
//!
//! ## Precedence
//!
//! [`resolve_default_billing`] is deterministic:
//!
//! 1. the billing address already recorded on the order;
//! 2. the address-book entry matching the order's billing-match id;
//! 3. the customer's preferred address;
//! 4. an empty address with the configured default country and region.
//!
//! ## Edit sessions
//!
//! The resolver holds at most one [`EditSession`]. A session works on its own copy
//! of the address, so nothing typed into it reaches the authoritative snapshot
//! until a commit succeeds. A failed commit keeps the session open with an error
//! message; cancelling drops it without side effects.

mod session;

pub use session::EditSession;

use crate::config::CheckoutSettings;
use crate::error::{AddressError, ServiceError};
use crate::model::{AddressId, AddressPatch, AddressSnapshot, Customer, OrderBilling, SessionToken};
use crate::ports::AddressBookService;
use tracing::{debug, info, warn};

/// Message stored in the edit session when the address book refuses a save.
pub const SAVE_FAILED_MESSAGE: &str = "Failed to update address. Please try again.";

/// Picks the authoritative billing address for an order.
pub fn resolve_default_billing(
    order: &OrderBilling,
    customer: &Customer,
    settings: &CheckoutSettings,
) -> AddressSnapshot {
    if let Some(billing) = &order.billing_address {
        return billing.clone();
    }

    if let Some(matched) = order
        .matching_address_id
        .as_ref()
        .and_then(|id| customer.address(id))
    {
        return matched.clone();
    }

    if let Some(preferred) = &customer.preferred_address {
        return preferred.clone();
    }

    AddressSnapshot::empty(&settings.default_country, &settings.default_state_code)
}

#[derive(Debug)]
pub struct AddressResolver {
    customer: Customer,
    current: AddressSnapshot,
    edit: Option<EditSession>,
}

impl AddressResolver {
    pub fn new(order: &OrderBilling, customer: Customer, settings: &CheckoutSettings) -> Self {
        let current = resolve_default_billing(order, &customer, settings);
        debug!(address_id = ?current.id, "Resolved default billing address");
        Self {
            customer,
            current,
            edit: None,
        }
    }

    /// The authoritative billing address.
    pub fn current(&self) -> &AddressSnapshot {
        &self.current
    }

    /// Looks up a saved address for the address selector.
    pub fn saved_address(&self, id: &AddressId) -> Result<&AddressSnapshot, AddressError> {
        self.customer
            .address(id)
            .ok_or_else(|| AddressError::UnknownAddress(id.to_string()))
    }

    pub fn edit_session(&self) -> Option<&EditSession> {
        self.edit.as_ref()
    }

    /// Opens an edit session on a copy of the authoritative address.
    pub fn begin_edit(&mut self) -> Result<&EditSession, AddressError> {
        if self.edit.is_some() {
            return Err(AddressError::EditInProgress);
        }
        info!(address_id = ?self.current.id, "Edit session opened");
        Ok(self.edit.insert(EditSession::new(self.current.clone())))
    }

    pub fn update_edit(&mut self, patch: AddressPatch) -> Result<&EditSession, AddressError> {
        let session = self.edit.as_mut().ok_or(AddressError::NoEditSession)?;
        session.apply(patch)?;
        Ok(session)
    }

    /// Closes the session without saving anything.
    pub fn cancel_edit(&mut self) -> Result<(), AddressError> {
        match &self.edit {
            None => Err(AddressError::NoEditSession),
            Some(session) if session.is_saving() => Err(AddressError::CommitPending),
            Some(_) => {
                self.edit = None;
                info!("Edit session discarded");
                Ok(())
            }
        }
    }

    /// Marks the session as saving and returns the address to persist.
    ///
    /// Pair with [`complete_commit`](Self::complete_commit) once the address book
    /// has answered.
    pub fn begin_commit(&mut self) -> Result<AddressSnapshot, AddressError> {
        let session = self.edit.as_mut().ok_or(AddressError::NoEditSession)?;
        session.begin_save()
    }

    /// Applies the address book's answer to the open session.
    ///
    /// On success the saved address becomes authoritative and the session is
    /// closed. On failure the snapshot is untouched and the session stays open
    /// with a retryable message.
    pub fn complete_commit(
        &mut self,
        result: Result<AddressSnapshot, ServiceError>,
    ) -> Result<AddressSnapshot, AddressError> {
        let session = self.edit.as_mut().ok_or(AddressError::NoEditSession)?;
        match result {
            Ok(saved) => {
                info!(address_id = ?saved.id, "Billing address saved");
                self.customer.upsert(saved.clone());
                self.current = saved.clone();
                self.edit = None;
                Ok(saved)
            }
            Err(e) => {
                warn!(error = %e, "Saving billing address failed");
                session.fail_save(SAVE_FAILED_MESSAGE);
                Err(AddressError::SaveFailed(SAVE_FAILED_MESSAGE.to_string()))
            }
        }
    }

    /// Persists the open session through `address_book` in one step.
    pub async fn commit_edit(
        &mut self,
        address_book: &dyn AddressBookService,
        token: &SessionToken,
    ) -> Result<AddressSnapshot, AddressError> {
        let draft = self.begin_commit()?;
        let result = address_book.save_address(token, &draft).await;
        self.complete_commit(result)
    }
}
