//! Network Layer
//!
//! Host-authoritative sync between two peers, plus the async frame loop.
//! This layer is **non-deterministic** - all game logic runs through `game/`.

pub mod protocol;
pub mod dispatch;
pub mod transport;
pub mod sync;
pub mod session;
pub mod driver;

pub use protocol::{NetMessage, InputPayload, StateSnapshot, BodySnapshot, ProtocolError};
pub use dispatch::{Dispatcher, MessageListener};
pub use transport::{ChannelTransport, MessageQueue, Transport, TransportError};
pub use sync::{ClientMirror, HostSync};
pub use session::{FrameReport, MatchSession, NetMode, SessionError};
pub use driver::{DriverConfig, FrameSink, InputSource, StopReason};
