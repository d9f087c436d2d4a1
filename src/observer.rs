//! Live sample reporting.
//!
//! The sweep controller never renders anything itself. Each recorded sample
//! is handed to a [`SampleObserver`] synchronously and best-effort: an
//! observer failure is logged by the controller and swallowed, so a broken
//! display can never abort a sweep.

use crate::sweep::Sample;
use anyhow::Result;
use tokio::sync::mpsc;

/// Receives each recorded sample, in sweep order.
///
/// # Contract
/// - Called synchronously from within the sweep; must not block.
/// - Errors are logged and swallowed by the controller, never propagated.
/// - The sample recorded at the trip voltage is retained in the result but
///   not delivered here.
pub trait SampleObserver: Send + Sync {
    /// Handle one recorded sample.
    fn on_sample(&self, sample: &Sample) -> Result<()>;
}

/// Observer that drops every sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl SampleObserver for NullObserver {
    fn on_sample(&self, _sample: &Sample) -> Result<()> {
        Ok(())
    }
}

/// Bridges samples to an async consumer over an unbounded channel.
///
/// The send never blocks the sweep; once the receiver is dropped, further
/// samples surface as observer errors, which the controller logs and ignores.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<Sample>,
}

impl ChannelObserver {
    /// Create an observer plus the receiving half for the consumer.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Sample>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl SampleObserver for ChannelObserver {
    fn on_sample(&self, sample: &Sample) -> Result<()> {
        self.tx
            .send(*sample)
            .map_err(|_| anyhow::anyhow!("sample channel closed"))
    }
}
