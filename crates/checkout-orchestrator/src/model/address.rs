//! Postal addresses used for billing.
//!
//! An [`AddressSnapshot`] is either the customer's existing billing address on the
//! order, an address-book entry, or a candidate edit. It is a plain value: every
//! component that receives one gets its own copy.
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Type-safe identifier for address-book entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressId(pub String);

impl From<&str> for AddressId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl Display for AddressId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSnapshot {
    /// Absent for an address that has not been persisted yet.
    #[serde(rename = "addressId", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AddressId>,
    pub first_name: String,
    pub last_name: String,
    pub address1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    pub city: String,
    pub country: String,
    pub state_code: String,
    pub postal_code: String,
    pub phone: String,
}

impl AddressSnapshot {
    /// An address with every field blank except the country and region.
    pub fn empty(country: impl Into<String>, state_code: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            state_code: state_code.into(),
            ..Self::default()
        }
    }

    /// Applies every populated field of `patch` to this address.
    pub fn apply(&mut self, patch: AddressPatch) {
        if let Some(first_name) = patch.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            self.last_name = last_name;
        }
        if let Some(address1) = patch.address1 {
            self.address1 = address1;
        }
        if let Some(address2) = patch.address2 {
            self.address2 = if address2.is_empty() { None } else { Some(address2) };
        }
        if let Some(city) = patch.city {
            self.city = city;
        }
        if let Some(country) = patch.country {
            self.country = country;
        }
        if let Some(state_code) = patch.state_code {
            self.state_code = state_code;
        }
        if let Some(postal_code) = patch.postal_code {
            self.postal_code = postal_code;
        }
        if let Some(phone) = patch.phone {
            self.phone = phone;
        }
    }
}

/// Partial update of an address, one optional value per field.
///
/// An empty `address2` clears the second street line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub state_code: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
}

/// The billing-related part of the order being checked out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBilling {
    /// Billing address already recorded on the order, if any.
    pub billing_address: Option<AddressSnapshot>,
    /// Address-book entry the order's billing address was matched against.
    pub matching_address_id: Option<AddressId>,
}

/// The shopper's address book.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub addresses: Vec<AddressSnapshot>,
    pub preferred_address: Option<AddressSnapshot>,
}

impl Customer {
    /// Looks up an address-book entry by id.
    pub fn address(&self, id: &AddressId) -> Option<&AddressSnapshot> {
        self.addresses
            .iter()
            .find(|address| address.id.as_ref() == Some(id))
    }

    /// Records a saved address, replacing the entry with the same id.
    ///
    /// Addresses without an id are not part of the address book and are
    /// ignored.
    pub fn upsert(&mut self, address: AddressSnapshot) {
        let Some(id) = address.id.clone() else {
            return;
        };
        if let Some(preferred) = &mut self.preferred_address {
            if preferred.id.as_ref() == Some(&id) {
                *preferred = address.clone();
            }
        }
        match self
            .addresses
            .iter_mut()
            .find(|entry| entry.id.as_ref() == Some(&id))
        {
            Some(entry) => *entry = address,
            None => self.addresses.push(address),
        }
    }
}
