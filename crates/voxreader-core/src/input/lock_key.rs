//! The lock key, re-purposed as the engine's modifier.
//!
//! A single tap must not change the OS lock state: the monitor forces the
//! state back on every press and only commits a toggle when a second press
//! lands inside the double-tap window. While the key is held, the modal
//! gate is open and tap events are captured.

use super::keys::{hid, HidEvent};

/// The one handle allowed to touch the OS lock-state bit. Owned exclusively
/// by the input subsystem; nothing else in the process may toggle it.
pub trait LockState: Send {
    fn get(&mut self) -> bool;
    fn set(&mut self, on: bool);
    /// Post a synthesized key event so OS consumers observe the toggle too.
    fn synthesize_toggle(&mut self, on: bool);
}

/// Host-clock tick to nanosecond conversion (the mach timebase ratio).
#[derive(Debug, Clone, Copy)]
pub struct TimebaseRatio {
    pub numer: u64,
    pub denom: u64,
}

impl TimebaseRatio {
    pub const IDENTITY: TimebaseRatio = TimebaseRatio { numer: 1, denom: 1 };

    pub fn to_nanos(self, ticks: u64) -> u64 {
        ticks * self.numer / self.denom
    }
}

/// What a lock-key press amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockKeyOutcome {
    /// Nothing user-visible (single tap absorbed, or key released).
    Absorbed,
    /// A committed double-tap toggle; the new state should be announced.
    Toggled(bool),
    /// Not a lock-key event.
    NotLockKey,
}

pub struct LockKeyMonitor {
    os_lock: Box<dyn LockState>,
    timebase: TimebaseRatio,
    window_ns: u64,
    last_press_ns: u64,
    tracked_state: bool,
    held: bool,
}

impl LockKeyMonitor {
    pub fn new(mut os_lock: Box<dyn LockState>, timebase: TimebaseRatio, window_ms: u64) -> Self {
        let tracked_state = os_lock.get();
        LockKeyMonitor {
            os_lock,
            timebase,
            window_ns: window_ms * 1_000_000,
            last_press_ns: 0,
            tracked_state,
            held: false,
        }
    }

    /// Feed one HID transition.
    pub fn handle(&mut self, event: &HidEvent) -> LockKeyOutcome {
        if event.usage != hid::CAPS_LOCK {
            return LockKeyOutcome::NotLockKey;
        }
        if !event.pressed {
            self.held = false;
            return LockKeyOutcome::Absorbed;
        }

        self.held = true;
        // The press already flipped the OS bit; put it back so a lone tap is
        // state-neutral.
        self.os_lock.set(self.tracked_state);

        let now_ns = self.timebase.to_nanos(event.timestamp);
        if self.last_press_ns != 0 && now_ns.saturating_sub(self.last_press_ns) <= self.window_ns {
            self.tracked_state = !self.tracked_state;
            self.os_lock.set(self.tracked_state);
            self.os_lock.synthesize_toggle(self.tracked_state);
            // Zeroing the stamp keeps a third tap from chaining into another
            // toggle.
            self.last_press_ns = 0;
            log::debug!("lock state toggled to {}", self.tracked_state);
            return LockKeyOutcome::Toggled(self.tracked_state);
        }

        self.last_press_ns = now_ns;
        LockKeyOutcome::Absorbed
    }

    /// The lock key is currently held down (the modal gate's first input).
    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn lock_state(&self) -> bool {
        self.tracked_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Scriptable lock bit that logs every write.
    #[derive(Clone, Default)]
    struct FakeLock {
        state: Arc<Mutex<bool>>,
        writes: Arc<Mutex<Vec<bool>>>,
        synthesized: Arc<Mutex<Vec<bool>>>,
    }

    impl LockState for FakeLock {
        fn get(&mut self) -> bool {
            *self.state.lock().unwrap()
        }

        fn set(&mut self, on: bool) {
            *self.state.lock().unwrap() = on;
            self.writes.lock().unwrap().push(on);
        }

        fn synthesize_toggle(&mut self, on: bool) {
            self.synthesized.lock().unwrap().push(on);
        }
    }

    fn press(ts_ms: u64) -> HidEvent {
        HidEvent { usage: hid::CAPS_LOCK, pressed: true, timestamp: ts_ms * 1_000_000 }
    }

    fn release(ts_ms: u64) -> HidEvent {
        HidEvent { usage: hid::CAPS_LOCK, pressed: false, timestamp: ts_ms * 1_000_000 }
    }

    fn monitor(lock: &FakeLock) -> LockKeyMonitor {
        LockKeyMonitor::new(Box::new(lock.clone()), TimebaseRatio::IDENTITY, 250)
    }

    #[test]
    fn single_tap_does_not_toggle() {
        let lock = FakeLock::default();
        let mut mon = monitor(&lock);
        assert_eq!(mon.handle(&press(0)), LockKeyOutcome::Absorbed);
        assert_eq!(mon.handle(&release(50)), LockKeyOutcome::Absorbed);
        assert!(!*lock.state.lock().unwrap(), "OS state must be forced back");
        assert!(lock.synthesized.lock().unwrap().is_empty());
    }

    #[test]
    fn double_tap_within_window_toggles_once() {
        let lock = FakeLock::default();
        let mut mon = monitor(&lock);
        mon.handle(&press(0));
        mon.handle(&release(50));
        assert_eq!(mon.handle(&press(200)), LockKeyOutcome::Toggled(true));
        mon.handle(&release(230));
        assert!(*lock.state.lock().unwrap(), "toggle must commit to the OS");
        assert_eq!(*lock.synthesized.lock().unwrap(), vec![true]);
    }

    #[test]
    fn slow_second_tap_does_not_toggle() {
        let lock = FakeLock::default();
        let mut mon = monitor(&lock);
        mon.handle(&press(0));
        mon.handle(&release(50));
        assert_eq!(mon.handle(&press(400)), LockKeyOutcome::Absorbed);
        assert!(!*lock.state.lock().unwrap());
    }

    #[test]
    fn triple_tap_does_not_chain() {
        let lock = FakeLock::default();
        let mut mon = monitor(&lock);
        mon.handle(&press(0));
        mon.handle(&release(40));
        assert_eq!(mon.handle(&press(100)), LockKeyOutcome::Toggled(true));
        mon.handle(&release(140));
        // Third tap inside 250 ms of the second: stamp was zeroed, so this
        // starts a fresh window instead of toggling back.
        assert_eq!(mon.handle(&press(200)), LockKeyOutcome::Absorbed);
        assert!(*lock.state.lock().unwrap());
    }

    #[test]
    fn held_state_follows_press_and_release() {
        let lock = FakeLock::default();
        let mut mon = monitor(&lock);
        assert!(!mon.is_held());
        mon.handle(&press(0));
        assert!(mon.is_held());
        mon.handle(&release(10));
        assert!(!mon.is_held());
    }

    #[test]
    fn timebase_ratio_scales_timestamps() {
        let ratio = TimebaseRatio { numer: 125, denom: 3 };
        assert_eq!(ratio.to_nanos(24), 1000);

        // With a non-identity ratio, raw ticks 250 ms apart still count as a
        // double tap.
        let lock = FakeLock::default();
        let mut mon = LockKeyMonitor::new(Box::new(lock.clone()), ratio, 250);
        let tick_for = |ns: u64| ns * 3 / 125;
        mon.handle(&HidEvent { usage: hid::CAPS_LOCK, pressed: true, timestamp: tick_for(0) });
        let outcome = mon.handle(&HidEvent {
            usage: hid::CAPS_LOCK,
            pressed: true,
            timestamp: tick_for(200_000_000),
        });
        assert_eq!(outcome, LockKeyOutcome::Toggled(true));
    }

    #[test]
    fn non_lock_usages_pass_through() {
        let lock = FakeLock::default();
        let mut mon = monitor(&lock);
        let ev = HidEvent { usage: hid::CONTROL_LEFT, pressed: true, timestamp: 0 };
        assert_eq!(mon.handle(&ev), LockKeyOutcome::NotLockKey);
    }
}
