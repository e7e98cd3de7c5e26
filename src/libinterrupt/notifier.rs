use std::{
    fmt,
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

struct Inner {
    fired: Mutex<bool>,
    cond: Condvar,
}

impl Inner {
    // The guarded value is a plain flag, a panicking holder cannot leave it
    // half-written.
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.fired.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle onto a one-shot broadcast primitive.
///
/// A `Notifier` starts un-fired. Firing it releases every thread blocked in
/// `wait()` at once, and any later `wait()` returns immediately. It never
/// un-fires.
///
/// Clones share the same primitive; two handles compare equal only when they
/// refer to the same one.
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<Inner>,
}

impl Notifier {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                fired: Mutex::new(false),
                cond: Condvar::new(),
            }),
        }
    }

    /// Fire this notifier, waking all current waiters.
    pub(crate) fn fire(&self) {
        let mut fired = self.inner.lock();
        *fired = true;
        self.inner.cond.notify_all();
    }

    /// Return whether this notifier has fired.
    pub fn is_fired(&self) -> bool {
        *self.inner.lock()
    }

    /// Block until this notifier fires.
    pub fn wait(&self) {
        let mut fired = self.inner.lock();
        while !*fired {
            fired = self
                .inner
                .cond
                .wait(fired)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block until this notifier fires or `timeout` elapses and return
    /// whether it fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let fired = self.inner.lock();
        let (fired, _) = self
            .inner
            .cond
            .wait_timeout_while(fired, timeout, |fired| !*fired)
            .unwrap_or_else(PoisonError::into_inner);
        *fired
    }
}

impl PartialEq for Notifier {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Notifier {}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("id", &Arc::as_ptr(&self.inner))
            .field("fired", &self.is_fired())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Instant};

    use super::*;

    #[test]
    fn new_notifier_is_not_fired() {
        let n = Notifier::new();
        assert!(!n.is_fired());
        assert!(!n.wait_timeout(Duration::from_millis(20)));
    }

    #[test]
    fn fire_releases_all_waiters() {
        let n = Notifier::new();
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let n = n.clone();
                thread::spawn(move || n.wait())
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        n.fire();

        for w in waiters {
            w.join().unwrap();
        }
        assert!(n.is_fired());
    }

    #[test]
    fn wait_after_fire_returns_immediately() {
        let n = Notifier::new();
        n.fire();
        n.fire();

        let start = Instant::now();
        n.wait();
        assert!(n.wait_timeout(Duration::from_secs(10)));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn clones_share_identity() {
        let a = Notifier::new();
        let b = a.clone();
        let c = Notifier::new();
        assert_eq!(a, b);
        assert_ne!(a, c);

        b.fire();
        assert!(a.is_fired());
        assert!(!c.is_fired());
    }
}
