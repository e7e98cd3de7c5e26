use std::{
    fmt,
    io::Write,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tracing::{debug, warn};

use crate::{notifier::Notifier, stack::interrupt_report};

/// Point-in-time snapshot of the interrupt state.
///
/// `notifier` fires on the next transition after the snapshot was taken. Once
/// a transition has happened the state holds a fresh, un-fired notifier, so
/// code that only cares whether an interrupt happened at all should use
/// `wait()`/`wait_timeout()`, which return at once if `interrupted` is set.
#[derive(Clone, Debug)]
pub struct InterruptStatus {
    pub interrupted: bool,
    pub notifier: Notifier,
}

impl InterruptStatus {
    /// Block until the process has been interrupted.
    pub fn wait(&self) {
        if !self.interrupted {
            self.notifier.wait();
        }
    }

    /// Wait up to `timeout` for the process to be interrupted and return
    /// whether it was.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.interrupted || self.notifier.wait_timeout(timeout)
    }
}

/// The capability handed to the rest of a framework: query interruption and
/// choose what gets printed when it happens.
pub trait InterruptMonitor: Send + Sync {
    /// Return the current status and the notifier for the next transition.
    fn status(&self) -> InterruptStatus;

    /// Set the message printed on the next interruption. An empty message
    /// suppresses printing.
    fn set_message(&self, message: &str);

    /// Suppress printing on the next interruption.
    fn clear_message(&self) {
        self.set_message("");
    }
}

struct Inner {
    interrupted: bool,
    message: String,
    notifier: Notifier,
    sink: Box<dyn Write + Send>,
}

/// The shared interrupt record.
///
/// All fields sit behind one lock, so a reader that sees the flag set also
/// sees that the notifier current before the transition has fired.
pub struct InterruptState {
    inner: Mutex<Inner>,
}

impl InterruptState {
    /// Create a not-yet-interrupted state that prints its message to `sink`.
    pub fn new(sink: impl Write + Send + 'static) -> Self {
        Self {
            inner: Mutex::new(Inner {
                interrupted: false,
                message: String::new(),
                notifier: Notifier::new(),
                sink: Box::new(sink),
            }),
        }
    }

    /// Create a shared state that prints to standard output.
    pub fn stdout() -> Arc<Self> {
        Arc::new(Self::new(std::io::stdout()))
    }

    // Every critical section leaves the record consistent before any call
    // that could panic, so a poisoned lock still guards valid data.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one interrupt transition.
    ///
    /// Under the lock: print the message and the stack report if a message is
    /// set, mark the state interrupted, fire the current notifier and install
    /// a fresh one. Every call runs the full transition, including repeats.
    pub fn handle_signal(&self) {
        let mut inner = self.lock();

        if !inner.message.is_empty() {
            let out = format!("{}\n{}", inner.message, interrupt_report());
            let sink = &mut inner.sink;
            let written =
                sink.write_all(out.as_bytes()).and_then(|_| sink.flush());
            if let Err(error) = written {
                warn!(%error, "failed to write interrupt message");
            }
        }

        inner.interrupted = true;
        inner.notifier.fire();
        inner.notifier = Notifier::new();
        debug!("interrupt transition complete");
    }
}

impl InterruptMonitor for InterruptState {
    fn status(&self) -> InterruptStatus {
        let inner = self.lock();
        InterruptStatus {
            interrupted: inner.interrupted,
            notifier: inner.notifier.clone(),
        }
    }

    fn set_message(&self, message: &str) {
        let mut inner = self.lock();
        inner.message.clear();
        inner.message.push_str(message);
    }
}

impl<T: InterruptMonitor + ?Sized> InterruptMonitor for Arc<T> {
    fn status(&self) -> InterruptStatus {
        (**self).status()
    }

    fn set_message(&self, message: &str) {
        (**self).set_message(message)
    }

    fn clear_message(&self) {
        (**self).clear_message()
    }
}

impl fmt::Debug for InterruptState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("InterruptState")
            .field("interrupted", &inner.interrupted)
            .field("message", &inner.message)
            .field("notifier", &inner.notifier)
            .finish()
    }
}
