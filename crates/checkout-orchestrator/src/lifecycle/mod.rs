//! Runtime orchestration: starting and stopping the checkout, and tracing setup.

pub mod checkout_system;
pub mod tracing;

pub use checkout_system::CheckoutSystem;
