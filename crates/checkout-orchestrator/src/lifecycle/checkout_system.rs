use crate::config::CheckoutConfig;
use crate::coordinator::{CheckoutActor, CheckoutClient, CheckoutContext};
use crate::model::CheckoutStage;
use tokio::sync::watch;
use tracing::{error, info};

/// Runtime wrapper around one checkout.
///
/// `CheckoutSystem` spawns the checkout actor with its injected context, hands
/// out the client and the stage signal, and shuts the actor down again.
///
/// # Example
///
/// ```ignore
/// let system = CheckoutSystem::new(config, context);
/// let mut stage = system.stage();
///
/// system.checkout_client.submit().await?;
/// stage.changed().await?;
/// assert_eq!(*stage.borrow(), CheckoutStage::PlaceOrder);
///
/// system.shutdown().await?;
/// ```
pub struct CheckoutSystem {
    /// Client for interacting with the checkout actor
    pub checkout_client: CheckoutClient,

    stage: watch::Receiver<CheckoutStage>,

    /// Task handle of the running actor (used for graceful shutdown)
    handle: tokio::task::JoinHandle<()>,
}

impl CheckoutSystem {
    /// Creates the checkout actor and starts it with `context`.
    ///
    /// Must be called from within a Tokio runtime. The payment method fetch
    /// starts right away.
    pub fn new(config: CheckoutConfig, context: CheckoutContext) -> Self {
        let (actor, checkout_client, stage) = CheckoutActor::new(config);
        let handle = tokio::spawn(actor.run(context));

        Self {
            checkout_client,
            stage,
            handle,
        }
    }

    /// Signal for the surrounding flow: `Payment` until a submission succeeds,
    /// then `PlaceOrder`.
    pub fn stage(&self) -> watch::Receiver<CheckoutStage> {
        self.stage.clone()
    }

    /// Gracefully shuts down the checkout.
    ///
    /// Drops this system's client, which closes the command channel once no
    /// other clones remain, then waits for the actor to unmount the widget and
    /// exit.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down checkout...");

        drop(self.checkout_client);

        if let Err(e) = self.handle.await {
            error!("Checkout actor failed: {:?}", e);
            return Err(format!("Checkout actor failed: {:?}", e));
        }

        info!("Checkout shutdown complete.");
        Ok(())
    }
}
