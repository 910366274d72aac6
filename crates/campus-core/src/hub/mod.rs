//! Real-time chat hub: session registry, fan-out, and per-session pumps.
//!
//! - `registry` -- `Hub` owning the live session set, with register,
//!   unregister, and drop-on-overflow broadcast under one lock
//! - `session` -- `Session` handle and the `OutboundQueue` consumer half
//! - `transport` -- `TransportReader` / `TransportWriter` boundary traits
//! - `pump` -- inbound/outbound pumps and `spawn_session`

pub mod pump;
pub mod registry;
pub mod session;
pub mod transport;

pub use pump::{
    spawn_session, InboundExit, OutboundExit, PumpOptions, SessionTasks, WriterLost,
};
pub use registry::{BroadcastReport, Hub, HubError};
pub use session::{OutboundFrame, OutboundQueue, Session};
pub use transport::{TransportError, TransportReader, TransportWriter};
