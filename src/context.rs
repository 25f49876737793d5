//! Context provides cancellation and wakeups for the render loop,
//! similar to Golang's Context plus a doorbell.

use std::{
    ops::Deref,
    sync::{Arc, Condvar, Mutex, MutexGuard},
    time::Duration,
};

#[derive(Clone, Debug)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    /// Create a new Context.
    pub fn new() -> Self {
        Context {
            inner: Arc::new(ContextInner::new()),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Context {
    type Target = ContextInner;

    fn deref(&self) -> &Self::Target {
        self.inner.deref()
    }
}

#[derive(Debug, Default)]
struct Signals {
    cancelled: bool,
    woken: bool,
}

#[derive(Debug)]
pub struct ContextInner {
    signals: Mutex<Signals>,
    cv: Condvar,
}

impl ContextInner {
    fn new() -> Self {
        ContextInner {
            signals: Mutex::new(Signals::default()),
            cv: Condvar::new(),
        }
    }

    // A panicking holder can't leave the flags inconsistent, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, Signals> {
        self.signals.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cancel the context.
    pub fn cancel(&self) {
        self.lock().cancelled = true;
        self.cv.notify_all();
    }

    /// Returns true iff the context has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.lock().cancelled
    }

    /// Wake one pending [ContextInner::wait_timeout] early, e.g. because new data arrived.
    pub fn notify(&self) {
        self.lock().woken = true;
        self.cv.notify_all();
    }

    /// Wait until the duration expires, the context is notified, or it is cancelled.
    /// Returns true if the context has been cancelled.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let g = self.lock();
        let (mut v, _) = self
            .cv
            .wait_timeout_while(g, duration, |s| !s.cancelled && !s.woken)
            .unwrap_or_else(|e| e.into_inner());
        v.woken = false;
        v.cancelled
    }
}
