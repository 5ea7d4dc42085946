//! Implementations of the service ports.
//!
//! - [`memory`]: in-process address book, method list and order ledger.
//! - [`http`]: the storefront's HTTP controllers via `reqwest`.

pub mod http;
pub mod memory;

pub use http::HttpCheckoutServices;
pub use memory::{InMemoryAddressBook, InMemoryOrderLedger, StaticPaymentMethods};
