//! Realtime channel with bounded-backoff reconnects.
//!
//! The channel owns one logical connection at a time and feeds parsed
//! topics into the [`EventBus`]. Dropped connections reconnect after a
//! delay that grows by half each attempt up to a cap and snaps back to the
//! base once a connection opens. Two closes never reconnect: a close the
//! owner initiated, and a close carrying an auth-rejection code.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use api_types::realtime::RealtimeEvent;
use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::Result;
use crate::events::EventBus;

/// Close codes the server uses to refuse the presented token. Reconnecting
/// with the same token would just loop, so the channel exits instead.
pub const AUTH_REJECT_CODES: [u16; 2] = [4401, 4403];

const BASE_DELAY: Duration = Duration::from_millis(2000);
const MAX_DELAY: Duration = Duration::from_millis(15_000);
const GROWTH: f64 = 1.5;

/// Reconnect delay schedule. Pure state machine, no clock of its own.
#[derive(Clone, Copy, Debug)]
pub struct ReconnectPolicy {
    base: Duration,
    cap: Duration,
    current: Duration,
}

impl ReconnectPolicy {
    #[must_use]
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self {
            base,
            cap,
            current: base,
        }
    }

    /// Returns the delay to wait before the next attempt and grows the
    /// schedule for the one after.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.mul_f64(GROWTH).min(self.cap);
        delay
    }

    /// Snaps back to the base delay. Called when a connection opens.
    pub fn reset(&mut self) {
        self.current = self.base;
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(BASE_DELAY, MAX_DELAY)
    }
}

/// One frame from the transport.
#[derive(Clone, Debug)]
pub enum ChannelEvent {
    Message(serde_json::Value),
    Closed { code: Option<u16> },
}

/// Port for opening realtime connections.
#[async_trait]
pub trait RealtimeConnector: Send + Sync {
    async fn connect(&self, token: &str) -> Result<Box<dyn RealtimeConnection>>;
}

/// One open connection. `None` means the transport is gone without a close
/// frame and the channel treats it as a drop.
#[async_trait]
pub trait RealtimeConnection: Send {
    async fn next_event(&mut self) -> Option<ChannelEvent>;
}

#[derive(Debug, Default)]
struct ChannelFlags {
    stopped: AtomicBool,
    ignore_next_close: AtomicBool,
    wake: Notify,
}

/// Remote control for a running channel.
#[derive(Clone)]
pub struct ChannelHandle {
    flags: Arc<ChannelFlags>,
}

impl ChannelHandle {
    /// Tears the channel down. The close this produces is the channel's
    /// own doing and never schedules a reconnect.
    pub fn shutdown(&self) {
        self.flags.ignore_next_close.store(true, Ordering::SeqCst);
        self.flags.stopped.store(true, Ordering::SeqCst);
        self.flags.wake.notify_one();
    }
}

/// Why [`RealtimeChannel::run`] returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelExit {
    /// The owner shut the channel down.
    Stopped,
    /// The server refused the token. The owner should come back with a
    /// fresh one rather than retry this one.
    AuthRejected { code: u16 },
}

pub struct RealtimeChannel<C> {
    connector: C,
    bus: EventBus,
    policy: ReconnectPolicy,
    flags: Arc<ChannelFlags>,
}

impl<C: RealtimeConnector> RealtimeChannel<C> {
    #[must_use]
    pub fn new(connector: C, bus: EventBus) -> Self {
        Self::with_policy(connector, bus, ReconnectPolicy::default())
    }

    #[must_use]
    pub fn with_policy(connector: C, bus: EventBus, policy: ReconnectPolicy) -> Self {
        Self {
            connector,
            bus,
            policy,
            flags: Arc::new(ChannelFlags::default()),
        }
    }

    #[must_use]
    pub fn handle(&self) -> ChannelHandle {
        ChannelHandle {
            flags: self.flags.clone(),
        }
    }

    /// Drives the channel until the owner stops it or the server rejects
    /// the token. Intended to run as its own task.
    pub async fn run(mut self, token: &str) -> ChannelExit {
        loop {
            if self.flags.stopped.load(Ordering::SeqCst) {
                return ChannelExit::Stopped;
            }
            match self.connector.connect(token).await {
                Ok(mut connection) => {
                    self.policy.reset();
                    tracing::debug!("realtime connection open");
                    if let Some(exit) = self.pump(connection.as_mut()).await {
                        return exit;
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "realtime connect failed");
                }
            }
            if self.flags.stopped.load(Ordering::SeqCst) {
                return ChannelExit::Stopped;
            }
            let delay = self.policy.next_delay();
            tracing::debug!(delay_ms = delay.as_millis() as u64, "reconnecting");
            tokio::time::sleep(delay).await;
        }
    }

    /// Pumps one connection. `None` asks the outer loop to reconnect.
    async fn pump(&self, connection: &mut dyn RealtimeConnection) -> Option<ChannelExit> {
        loop {
            tokio::select! {
                event = connection.next_event() => match event {
                    Some(ChannelEvent::Message(payload)) => self.dispatch(&payload),
                    Some(ChannelEvent::Closed { code }) => {
                        if self.flags.ignore_next_close.swap(false, Ordering::SeqCst) {
                            return Some(ChannelExit::Stopped);
                        }
                        if let Some(code) = code
                            && AUTH_REJECT_CODES.contains(&code)
                        {
                            tracing::warn!(code, "realtime token rejected, not reconnecting");
                            return Some(ChannelExit::AuthRejected { code });
                        }
                        tracing::debug!(code, "realtime connection dropped");
                        return None;
                    }
                    None => return None,
                },
                _ = self.flags.wake.notified() => {
                    self.flags.ignore_next_close.store(false, Ordering::SeqCst);
                    return Some(ChannelExit::Stopped);
                }
            }
        }
    }

    fn dispatch(&self, payload: &serde_json::Value) {
        match serde_json::from_value::<RealtimeEvent>(payload.clone()) {
            Ok(event) => {
                if !self.bus.publish_raw(&event.topic) {
                    tracing::trace!(topic = %event.topic, "unknown realtime topic dropped");
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "realtime payload parse error");
            }
        }
    }
}
