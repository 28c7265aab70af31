//! Boundary collaborators around the ledger engine.
//!
//! HTTP access with coalesced token refresh, the realtime channel with its
//! bounded reconnect policy, the typed refresh-signal bus, and the
//! stale-response guard. The engine itself stays pure; everything that
//! touches a network or a clock lives here.

pub mod api;
pub mod convert;
pub mod epoch;
pub mod error;
pub mod events;
pub mod realtime;
pub mod session;

pub use api::{ApiClient, HttpAuthApi};
pub use epoch::{Epoch, RequestEpoch};
pub use error::{ClientError, Result, resolve_error_message};
pub use events::{EventBus, Topic};
pub use realtime::{
    AUTH_REJECT_CODES, ChannelEvent, ChannelExit, ChannelHandle, RealtimeChannel,
    RealtimeConnection, RealtimeConnector, ReconnectPolicy,
};
pub use session::{AuthApi, MemoryTokenStore, Session, TokenStore};
