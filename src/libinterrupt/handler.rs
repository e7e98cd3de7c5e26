use std::{io::Write, sync::Arc};

use signal_hook::iterator::Handle;
use tracing::debug;

use crate::{
    err::InterruptResult,
    listener::{OsSignals, SignalListener, SignalSource},
    state::{InterruptMonitor, InterruptState, InterruptStatus},
};

/// Owns the interrupt state and the listener feeding it.
///
/// Create one at program start and pass it (or `monitor()`) by reference to
/// whatever needs to observe interruption.
pub struct InterruptHandler {
    state: Arc<InterruptState>,
    listener: SignalListener,
    os_handle: Option<Handle>,
}

impl InterruptHandler {
    /// Create a handler listening for `SIGINT` and `SIGTERM` and printing
    /// its message to standard output.
    pub fn new() -> InterruptResult<Self> {
        let source = OsSignals::register()?;
        let os_handle = source.handle();
        let state = InterruptState::stdout();
        let listener = SignalListener::spawn(Arc::clone(&state), source)?;
        Ok(Self {
            state,
            listener,
            os_handle: Some(os_handle),
        })
    }

    /// Create a handler fed by an arbitrary signal source and printing to
    /// `sink`.
    pub fn with_source<S: SignalSource>(
        source: S,
        sink: impl Write + Send + 'static,
    ) -> InterruptResult<Self> {
        let state = Arc::new(InterruptState::new(sink));
        let listener = SignalListener::spawn(Arc::clone(&state), source)?;
        Ok(Self {
            state,
            listener,
            os_handle: None,
        })
    }

    /// Return a shared reference to the underlying state.
    pub fn monitor(&self) -> Arc<InterruptState> {
        Arc::clone(&self.state)
    }

    /// Stop listening and wait for the listener to exit.
    ///
    /// For handlers built with `new()` this unregisters from the OS signals.
    /// Handlers built with `with_source()` wait until their source closes.
    /// Not calling this keeps the listener alive until the process exits.
    pub fn shutdown(self) -> InterruptResult<()> {
        if let Some(handle) = &self.os_handle {
            handle.close();
        }
        debug!("waiting for interrupt listener to exit");
        self.listener.join()
    }
}

impl InterruptMonitor for InterruptHandler {
    fn status(&self) -> InterruptStatus {
        self.state.status()
    }

    fn set_message(&self, message: &str) {
        self.state.set_message(message)
    }
}

