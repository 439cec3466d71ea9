//! Per-client request queues for the HTTP transport.
//!
//! A session owns a FIFO of pending requests and an outbox of responses
//! (events). Sessions expire once they are older than the configured
//! maximum age, measured from creation.

pub mod manager;
pub mod state;
pub mod store;

pub use manager::SessionManager;
pub use state::{Session, SessionEvent};
pub use store::{MemorySessionStore, SessionHandle, SessionStore};
