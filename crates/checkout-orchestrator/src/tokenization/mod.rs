//! # Tokenization Bridge
//!
//! Owns the embedded tokenization widget and turns its event stream into
//! explicit state transitions:
//!
//! ```text
//! Uninitialized ──initialize──▶ Initializing ──Mounted──▶ Ready
//!                                                        │  ▲
//!                                         begin_capture  │  │ parse failure / widget failure
//!                                                        ▼  │
//!                                                     Capturing ──Submit──▶ Captured
//!                                                                              │
//!                                                  take_payment (back to Ready)┘
//! ```
//!
//! The live widget only exists inside the `Initializing`, `Ready`, `Capturing`
//! and `Captured` states, so nothing outside the bridge can reach it and a
//! second capture cannot start while one is running. Dropping the live widget
//! unmounts it.
//!
//! Field-level events (`Change`, `FieldValid`) only yield cosmetic
//! [`Projection`]s; they never move the state machine.

pub mod events;

pub use events::{
    parse_change, parse_field_valid, parse_submit, Projection, TaggedWidgetEvent, WidgetEvent,
    WidgetEventSink, WidgetInstanceId,
};

use crate::config::WidgetConfig;
use crate::error::{TokenizationError, WidgetError};
use crate::model::{MethodList, TokenizedPaymentState};
use crate::ports::{TokenizationWidget, WidgetFactoryRef, WidgetMount};
use serde::Serialize;
use std::fmt::Display;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Externally visible phase of the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenizationPhase {
    Uninitialized,
    Initializing,
    Ready,
    Capturing,
    Captured,
}

impl Display for TokenizationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenizationPhase::Uninitialized => "uninitialized",
            TokenizationPhase::Initializing => "initializing",
            TokenizationPhase::Ready => "ready",
            TokenizationPhase::Capturing => "capturing",
            TokenizationPhase::Captured => "captured",
        };
        f.write_str(name)
    }
}

/// What the orchestrator has to do after an event went through the bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeOutput {
    /// Nothing; the event was stale or not valid in the current phase.
    Ignored,
    /// The widget finished mounting.
    Mounted,
    /// Update a cosmetic FormState field.
    Projection(Projection),
    /// A payment state is waiting in [`TokenizationBridge::take_payment`].
    Captured,
    /// The capture attempt is over and the bridge is back in `Ready`.
    CaptureFailed(TokenizationError),
}

struct LiveWidget {
    instance: WidgetInstanceId,
    handle: Box<dyn TokenizationWidget>,
}

impl Drop for LiveWidget {
    fn drop(&mut self) {
        self.handle.unmount();
        debug!(instance = self.instance, "Widget unmounted");
    }
}

impl std::fmt::Debug for LiveWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveWidget")
            .field("instance", &self.instance)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
enum BridgeState {
    #[default]
    Uninitialized,
    Initializing(LiveWidget),
    Ready(LiveWidget),
    Capturing {
        widget: LiveWidget,
        requires_fingerprint: bool,
    },
    Captured {
        widget: LiveWidget,
        payment: TokenizedPaymentState,
    },
}

impl BridgeState {
    fn phase(&self) -> TokenizationPhase {
        match self {
            BridgeState::Uninitialized => TokenizationPhase::Uninitialized,
            BridgeState::Initializing(_) => TokenizationPhase::Initializing,
            BridgeState::Ready(_) => TokenizationPhase::Ready,
            BridgeState::Capturing { .. } => TokenizationPhase::Capturing,
            BridgeState::Captured { .. } => TokenizationPhase::Captured,
        }
    }

    fn instance(&self) -> Option<WidgetInstanceId> {
        match self {
            BridgeState::Uninitialized => None,
            BridgeState::Initializing(widget) | BridgeState::Ready(widget) => Some(widget.instance),
            BridgeState::Capturing { widget, .. } | BridgeState::Captured { widget, .. } => {
                Some(widget.instance)
            }
        }
    }
}

pub struct TokenizationBridge {
    state: BridgeState,
    factory: WidgetFactoryRef,
    config: WidgetConfig,
    events: mpsc::UnboundedSender<TaggedWidgetEvent>,
    next_instance: WidgetInstanceId,
}

impl std::fmt::Debug for TokenizationBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenizationBridge")
            .field("state", &self.state)
            .field("next_instance", &self.next_instance)
            .finish_non_exhaustive()
    }
}

impl TokenizationBridge {
    /// Creates an uninitialized bridge and the receiving end of its event stream.
    pub fn new(
        factory: WidgetFactoryRef,
        config: WidgetConfig,
    ) -> (Self, mpsc::UnboundedReceiver<TaggedWidgetEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let bridge = Self {
            state: BridgeState::Uninitialized,
            factory,
            config,
            events,
            next_instance: 1,
        };
        (bridge, receiver)
    }

    pub fn phase(&self) -> TokenizationPhase {
        self.state.phase()
    }

    /// Id of the live widget, if one is mounted.
    pub fn instance(&self) -> Option<WidgetInstanceId> {
        self.state.instance()
    }

    /// Mounts a widget with the resolved directory snapshot.
    ///
    /// Returns `Ok(false)` without touching anything when a live widget already
    /// exists; a repeated directory resolution never re-initializes it.
    pub fn initialize(&mut self, methods: &MethodList) -> Result<bool, TokenizationError> {
        if !matches!(self.state, BridgeState::Uninitialized) {
            debug!(phase = %self.phase(), "Widget already live, skipping initialization");
            return Ok(false);
        }

        let instance = self.next_instance;
        self.next_instance += 1;

        let mount = WidgetMount {
            config: self.config.clone(),
            methods: methods.clone(),
            events: WidgetEventSink::new(instance, self.events.clone()),
        };
        let handle = self.factory.mount(mount).map_err(|e| {
            warn!(instance, error = %e, "Widget mount failed");
            TokenizationError::from(e)
        })?;

        info!(instance, methods = methods.len(), "Widget initializing");
        self.state = BridgeState::Initializing(LiveWidget { instance, handle });
        Ok(true)
    }

    /// Releases the live widget, if any, and returns to `Uninitialized`.
    pub fn teardown(&mut self) {
        if let Some(instance) = self.instance() {
            info!(instance, "Tearing down widget");
        }
        self.state = BridgeState::Uninitialized;
    }

    /// Asks the widget to tokenize. Only valid in `Ready`.
    pub fn begin_capture(&mut self, requires_fingerprint: bool) -> Result<(), TokenizationError> {
        match std::mem::take(&mut self.state) {
            BridgeState::Ready(mut widget) => match widget.handle.submit() {
                Ok(()) => {
                    info!(instance = widget.instance, requires_fingerprint, "Capturing payment");
                    self.state = BridgeState::Capturing {
                        widget,
                        requires_fingerprint,
                    };
                    Ok(())
                }
                Err(e) => {
                    warn!(instance = widget.instance, error = %e, "Widget refused submit");
                    self.state = BridgeState::Ready(widget);
                    Err(e.into())
                }
            },
            other => {
                let phase = other.phase();
                self.state = other;
                Err(TokenizationError::NotReady(phase.to_string()))
            }
        }
    }

    /// Feeds one widget event through the state machine.
    pub fn on_event(&mut self, tagged: TaggedWidgetEvent) -> BridgeOutput {
        if self.instance() != Some(tagged.instance) {
            debug!(instance = tagged.instance, "Dropping event from stale widget");
            return BridgeOutput::Ignored;
        }

        match tagged.event {
            WidgetEvent::Mounted => self.on_mounted(),
            WidgetEvent::Change(state) => self.project(parse_change(&state)),
            WidgetEvent::FieldValid(data) => self.project(parse_field_valid(&data)),
            WidgetEvent::Submit(state) => self.on_submit(&state),
            WidgetEvent::Failed(reason) => {
                self.abort_capture(TokenizationError::Widget(WidgetError::Trigger(reason)))
            }
        }
    }

    /// Hands out the captured payment state and returns to `Ready`.
    ///
    /// Each captured state is handed out once.
    pub fn take_payment(&mut self) -> Option<TokenizedPaymentState> {
        match std::mem::take(&mut self.state) {
            BridgeState::Captured { widget, payment } => {
                self.state = BridgeState::Ready(widget);
                Some(payment)
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    fn on_mounted(&mut self) -> BridgeOutput {
        match std::mem::take(&mut self.state) {
            BridgeState::Initializing(widget) => {
                info!(instance = widget.instance, "Widget ready");
                self.state = BridgeState::Ready(widget);
                BridgeOutput::Mounted
            }
            other => {
                self.state = other;
                BridgeOutput::Ignored
            }
        }
    }

    fn project(&self, projection: Option<Projection>) -> BridgeOutput {
        match (&self.state, projection) {
            (BridgeState::Ready(_) | BridgeState::Capturing { .. }, Some(projection)) => {
                BridgeOutput::Projection(projection)
            }
            _ => BridgeOutput::Ignored,
        }
    }

    fn on_submit(&mut self, state: &serde_json::Value) -> BridgeOutput {
        match std::mem::take(&mut self.state) {
            BridgeState::Capturing {
                widget,
                requires_fingerprint,
            } => match parse_submit(state, requires_fingerprint) {
                Ok(payment) => {
                    info!(instance = widget.instance, ?payment, "Payment captured");
                    self.state = BridgeState::Captured { widget, payment };
                    BridgeOutput::Captured
                }
                Err(e) => {
                    warn!(instance = widget.instance, error = %e, "Rejected submit event");
                    self.state = BridgeState::Ready(widget);
                    BridgeOutput::CaptureFailed(e)
                }
            },
            other => {
                warn!(phase = %other.phase(), "Submit event outside of a capture, ignoring");
                self.state = other;
                BridgeOutput::Ignored
            }
        }
    }

    fn abort_capture(&mut self, error: TokenizationError) -> BridgeOutput {
        match std::mem::take(&mut self.state) {
            BridgeState::Capturing { widget, .. } => {
                warn!(instance = widget.instance, error = %error, "Capture aborted by widget");
                self.state = BridgeState::Ready(widget);
                BridgeOutput::CaptureFailed(error)
            }
            other => {
                self.state = other;
                BridgeOutput::Ignored
            }
        }
    }
}
