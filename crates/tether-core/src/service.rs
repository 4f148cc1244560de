use std::{
    net::SocketAddr,
    sync::atomic::{AtomicBool, Ordering},
};

use parking_lot::{Mutex, MutexGuard};

use crate::error::Result;

/// Lifecycle of a thread-driven server.
///
/// `start` blocks the calling thread running the server loop; `stop` is safe
/// to call from any other thread and causes the blocked `start` to return
/// within a bounded number of loop iterations. Starting an already running
/// server performs an implicit stop of the previous run before binding anew.
pub trait Service: Send + Sync {
    /// Binds to `port` and runs the server loop, blocking until stopped.
    fn start(&self, port: u16) -> Result<()>;

    /// Requests the running loop, if any, to shut down. Idempotent.
    fn stop(&self);

    /// Returns true while a server loop is active.
    fn is_running(&self) -> bool;

    /// The bound address while running (useful when binding port 0), None
    /// otherwise.
    fn local_addr(&self) -> Option<SocketAddr>;
}

/// Shared run state for a thread-driven server loop.
///
/// One thread blocks inside the loop while any other thread may request a
/// stop; the flags are atomics checked between loop iterations. The gate
/// mutex serializes consecutive runs, so a restarting `start` cannot bind
/// before the previous loop has released its socket.
#[derive(Debug, Default)]
pub struct RunState {
    running: AtomicBool,
    stop_requested: AtomicBool,
    local_addr: Mutex<Option<SocketAddr>>,
    gate: Mutex<()>,
}

impl RunState {
    /// Creates state for a stopped server.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flags the current run, if any, to shut down.
    ///
    /// A stale request is cleared by the next [`RunState::enter`], so an
    /// unconditional store keeps stop idempotent while stopped.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    /// True once a stop has been requested for the current run.
    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    /// Waits for the previous run to finish, then claims the gate for a new
    /// one and clears any stale stop request.
    pub fn enter(&self) -> MutexGuard<'_, ()> {
        let guard = self.gate.lock();
        self.stop_requested.store(false, Ordering::SeqCst);
        guard
    }

    /// Records the bound address and flips the server to Running.
    pub fn mark_running(&self, addr: SocketAddr) {
        *self.local_addr.lock() = Some(addr);
        self.running.store(true, Ordering::SeqCst);
    }

    /// Flips the server back to Stopped and forgets the bound address.
    pub fn mark_stopped(&self) {
        self.running.store(false, Ordering::SeqCst);
        *self.local_addr.lock() = None;
    }

    /// True while a server loop is active.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The bound address while running, None otherwise.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_addr() -> SocketAddr {
        "127.0.0.1:4000".parse().unwrap()
    }

    #[test]
    fn test_initial_state() {
        let state = RunState::new();
        assert!(!state.is_running());
        assert!(!state.stop_requested());
        assert_eq!(state.local_addr(), None);
    }

    #[test]
    fn test_enter_clears_stale_stop() {
        let state = RunState::new();
        state.request_stop();
        assert!(state.stop_requested());

        let _gate = state.enter();
        assert!(!state.stop_requested());
    }

    #[test]
    fn test_running_transitions() {
        let state = RunState::new();
        state.mark_running(fake_addr());
        assert!(state.is_running());
        assert_eq!(state.local_addr(), Some(fake_addr()));

        state.mark_stopped();
        assert!(!state.is_running());
        assert_eq!(state.local_addr(), None);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let state = RunState::new();
        state.request_stop();
        state.request_stop();
        assert!(state.stop_requested());
    }
}
