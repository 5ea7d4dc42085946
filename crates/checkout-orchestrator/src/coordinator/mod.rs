//! # Submission Coordinator
//!
//! The checkout actor merges address state, method selection and tokenized
//! payment state into one [`SubmissionPayload`] and sends it at most once per
//! trigger.
//!
//! ## Submit flow
//!
//! - **Non-tokenized method**: the FormState is validated and dispatched
//!   straight to the order-submission service.
//! - **Tokenized method**: the bridge moves `Ready → Capturing` and asks the
//!   widget to tokenize. The order is only sent once the widget's submit event
//!   has been parsed into a payment state (`Captured`).
//!
//! While a submission is pending, further triggers answer
//! [`SubmitOutcome::AlreadyPending`](crate::model::SubmitOutcome::AlreadyPending)
//! and send nothing. On success the stage signal moves to `PlaceOrder`, the
//! completion callback runs, and the FormState is consumed. On failure the
//! error is returned and the next trigger starts over, re-tokenizing where
//! needed.
//!
//! ## Example
//!
//! ```ignore
//! let (actor, client, stage) = CheckoutActor::new(config);
//! tokio::spawn(actor.run(context));
//!
//! client.select_payment_method("AdyenComponent").await?;
//! match client.submit().await? {
//!     SubmitOutcome::Submitted(receipt) => println!("order {:?}", receipt.order_no),
//!     SubmitOutcome::AlreadyPending => {}
//! }
//! ```

pub mod actor;
pub mod client;
pub mod message;
pub mod payload;

pub use actor::{CheckoutActor, CheckoutContext, CompletionCallback};
pub use client::CheckoutClient;
pub use message::CheckoutRequest;
pub use payload::{BillingSource, PayloadBuilder, SubmissionPayload};
