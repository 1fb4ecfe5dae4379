//! Operator controls shared between the coordinator and a front end

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct ControlFlags {
    paused: AtomicBool,
    stop: AtomicBool,
    reset: AtomicBool,
}

/// Cloneable handle for pause, reset and stop requests
///
/// The coordinator checks the flags between rounds; a round in flight is
/// never interrupted.
#[derive(Debug, Clone, Default)]
pub struct ControlHandle {
    flags: Arc<ControlFlags>,
}

impl ControlHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&self) {
        self.flags.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.flags.paused.store(false, Ordering::SeqCst);
    }

    /// Flip pause; returns whether the run is now paused
    pub fn toggle_pause(&self) -> bool {
        !self.flags.paused.fetch_xor(true, Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.flags.paused.load(Ordering::SeqCst)
    }

    /// Ask the coordinator to restart its step counter
    pub fn request_reset(&self) {
        self.flags.reset.store(true, Ordering::SeqCst);
    }

    /// Consume a pending reset request
    pub fn take_reset(&self) -> bool {
        self.flags.reset.swap(false, Ordering::SeqCst)
    }

    pub fn request_stop(&self) {
        self.flags.stop.store(true, Ordering::SeqCst);
    }

    pub fn stop_requested(&self) -> bool {
        self.flags.stop.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_pause() {
        let control = ControlHandle::new();
        assert!(!control.is_paused());
        assert!(control.toggle_pause());
        assert!(control.is_paused());
        assert!(!control.toggle_pause());
        control.pause();
        control.resume();
        assert!(!control.is_paused());
    }

    #[test]
    fn test_reset_is_consumed_once() {
        let control = ControlHandle::new();
        let front_end = control.clone();
        front_end.request_reset();
        assert!(control.take_reset());
        assert!(!control.take_reset());
    }

    #[test]
    fn test_stop_visible_through_clones() {
        let control = ControlHandle::new();
        control.clone().request_stop();
        assert!(control.stop_requested());
    }
}
