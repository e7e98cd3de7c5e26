//! Process-wide interrupt detection and broadcast.
//!
//! An `InterruptHandler` listens for `SIGINT`/`SIGTERM` on a background
//! thread. Each signal marks the shared state interrupted, prints the
//! configured message with a dump of every thread's stack, and wakes every
//! thread waiting on the current `Notifier`.

pub mod err;

mod handler;
pub use handler::InterruptHandler;

mod listener;
pub use listener::*;

mod notifier;
pub use notifier::Notifier;

pub mod stack;

mod state;
pub use state::*;
