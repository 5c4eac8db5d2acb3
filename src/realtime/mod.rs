//! # Realtime
//!
//! The WebSocket surface of the scoreboard.
//!
//! - **Messages**: tagged JSON frames in both directions
//! - **Session**: per-socket reader and writer tasks bridging frames to the
//!   [`Scoreboard`](crate::engine::Scoreboard)
//!
//! Every connection receives the full ranked snapshot on join and after
//! every debounced broadcast, plus direct replies to its own updates and
//! pings.

mod messages;
mod session;

pub use messages::{ClientMessage, Outbox, OutboxReceiver, ServerMessage};
pub use session::{run_session, INVALID_MESSAGE};
