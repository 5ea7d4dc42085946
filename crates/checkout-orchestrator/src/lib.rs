//! # Checkout Orchestrator
//!
//! The payment step of a checkout: pick or edit a billing address, capture card
//! details through an embedded tokenization widget, and send exactly one
//! consolidated payment request.
//!
//! ## Architecture Notes
//!
//! ### 1. One actor, three inputs
//! [`CheckoutActor`](coordinator::CheckoutActor) owns all checkout state and
//! processes, one at a time, requests from [`CheckoutClient`], events from the
//! widget, and the results of the network calls it spawned. Nothing is shared,
//! so nothing is locked.
//!
//! ### 2. Late-bound context
//! Services, the widget factory and the completion callback are injected through
//! `run(context)`, not at construction time.
//!
//! ### 3. Errors per component
//! Each component has its own `thiserror` enum; [`CheckoutError`] is what the
//! client returns. Nothing is retried automatically.
//!
//! ### 4. Observability
//! `tracing` everywhere; see [`lifecycle::tracing`].
//!
//! ## Module Tour
//!
//! - [`model`]: plain data (addresses, methods, FormState, payment state).
//! - [`address`]: the Address Resolver and edit sessions.
//! - [`directory`]: the Payment Method Directory.
//! - [`tokenization`]: the Tokenization Bridge state machine and widget events.
//! - [`coordinator`]: the Submission Coordinator (actor, client, payload).
//! - [`ports`] / [`adapters`]: service contracts and their implementations.
//! - [`mock`]: scripted ports for tests.
//! - [`config`], [`error`], [`lifecycle`].

pub mod adapters;
pub mod address;
pub mod config;
pub mod coordinator;
pub mod directory;
pub mod error;
pub mod lifecycle;
pub mod mock;
pub mod model;
pub mod ports;
pub mod tokenization;

pub use config::{CheckoutConfig, ConfigLoader};
pub use coordinator::{CheckoutActor, CheckoutClient, CheckoutContext};
pub use error::CheckoutError;
pub use lifecycle::CheckoutSystem;
