//! Broadcast session negotiation with the coordinator.
//!
//! [`HandshakeClient`] runs the retrying start negotiation and the live/end
//! beacons over any [`CoordinatorTransport`](anchordesk_core::CoordinatorTransport).
//! [`connect_coordinator`] picks the HTTP transport when the coordinator
//! answers its status probe and the local mock otherwise.

pub mod client;
pub mod log;
pub mod transport;

pub use client::{
    BEACON_FAILED, HandshakeAck, HandshakeClient, HandshakeConfig, HandshakeRequest,
    NO_ACTIVE_BROADCAST, SessionSnapshot, SessionState, generate_broadcast_id,
};
pub use log::{HANDSHAKE_LOG_CAPACITY, HandshakeLog, LogEntry, LogEvent};
pub use transport::{HttpCoordinator, MockCoordinator, connect_coordinator};
