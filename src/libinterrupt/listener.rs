use std::{
    os::raw::c_int,
    sync::{mpsc::Receiver, Arc},
    thread::{self, JoinHandle},
};

use libc::{SIGINT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};
use tracing::{debug, info};

use crate::{err::InterruptResult, state::InterruptState};

/// Name of the background thread driving interrupt transitions.
pub const LISTENER_THREAD_NAME: &str = "interrupt-listener";

/// Signals that trigger an interrupt transition.
pub const INTERRUPT_SIGNALS: [c_int; 2] = [SIGINT, SIGTERM];

/// A source of asynchronous interrupt requests.
pub trait SignalSource: Send + 'static {
    /// Block until the next signal arrives and return it, or return `None`
    /// once the source is closed.
    fn next_signal(&mut self) -> Option<c_int>;
}

/// Interrupt and termination requests delivered by the operating system.
pub struct OsSignals {
    signals: Signals,
}

impl OsSignals {
    /// Subscribe to `SIGINT` and `SIGTERM`.
    pub fn register() -> InterruptResult<Self> {
        let signals = Signals::new(INTERRUPT_SIGNALS)?;
        debug!(signals = ?INTERRUPT_SIGNALS, "registered signal handlers");
        Ok(Self { signals })
    }

    /// Return a handle that can close this source from another thread.
    pub fn handle(&self) -> Handle {
        self.signals.handle()
    }
}

impl SignalSource for OsSignals {
    fn next_signal(&mut self) -> Option<c_int> {
        self.signals.forever().next()
    }
}

/// Signals fed in by the embedding program instead of the OS.
impl SignalSource for Receiver<c_int> {
    fn next_signal(&mut self) -> Option<c_int> {
        self.recv().ok()
    }
}

/// Background thread bridging a `SignalSource` into `InterruptState`.
///
/// The thread runs until its source closes, which for `OsSignals` without a
/// closed handle means the life of the process.
pub struct SignalListener {
    thread: JoinHandle<()>,
}

impl SignalListener {
    /// Start listening on `source`, running a transition on `state` for
    /// every signal received.
    pub fn spawn<S: SignalSource>(
        state: Arc<InterruptState>,
        mut source: S,
    ) -> InterruptResult<Self> {
        let thread = thread::Builder::new()
            .name(LISTENER_THREAD_NAME.to_string())
            .spawn(move || {
                while let Some(signal) = source.next_signal() {
                    info!(signal, "received interrupt signal");
                    state.handle_signal();
                }
                debug!("signal source closed, listener exiting");
            })?;
        Ok(Self { thread })
    }

    /// Return whether the listener thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the listener thread to exit.
    ///
    /// This only returns once the source has been closed.
    pub fn join(self) -> InterruptResult<()> {
        self.thread
            .join()
            .map_err(|_| "interrupt listener panicked".into())
    }
}
