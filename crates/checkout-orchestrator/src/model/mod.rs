//! Plain data structures shared by every checkout component.

pub mod address;
pub mod form;
pub mod method;
pub mod payment;

pub use address::*;
pub use form::*;
pub use method::*;
pub use payment::*;
