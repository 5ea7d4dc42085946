//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a `tracing-subscriber` formatter filtered by
//! `RUST_LOG`, in compact form and without module targets.
//!
//! ```bash
//! RUST_LOG=info cargo run -p checkout-sample
//! RUST_LOG=checkout_orchestrator=debug cargo run -p checkout-sample
//! ```
//!
//! With `info` a checkout reads roughly like:
//!
//! ```text
//! INFO Checkout actor started
//! INFO Fetching payment methods
//! INFO Payment methods loaded methods=2
//! INFO Widget initializing instance=1 methods=2
//! INFO Widget ready instance=1
//! INFO submit: Sending submit to actor
//! INFO Capturing payment instance=1 requires_fingerprint=true
//! INFO Payment captured instance=1 payment=TokenizedPaymentState { state_data_len: 212, brand_code: "scheme", has_fingerprint: true }
//! INFO Dispatching payment method=AdyenComponent tokenized=true
//! INFO Payment accepted order_no=Some("00001") stage=placeOrder
//! ```
//!
//! Token blobs, fingerprints and session tokens never appear in the output; their
//! `Debug` implementations only report lengths and flags.

pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
