//! Input capture: two ingress streams, the modal gate, and shortcut dispatch.
//!
//! The HID modifier stream carries the lock key reliably (the window-server
//! tap gates it behind the lock state itself) and the dangling-Control
//! speech interrupt. The window-server tap carries everything the shortcut
//! table dispatches on. The modal gate decides, per tap event, whether the
//! engine consumes it or the focused application sees it.

pub mod keys;
pub mod lock_key;
pub mod shortcuts;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::speech::SpeechScheduler;
use crate::tokens::OutputToken;

use self::keys::{hid, HidEvent, KeyCode, KeyStateProbe, Modifiers, TapEvent};
use self::lock_key::{LockKeyMonitor, LockKeyOutcome, LockState, TimebaseRatio};
use self::shortcuts::{ShortcutKey, ShortcutTable};

/// What happened to a tap event: consumed by the engine, or handed through
/// to the focused application unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapDisposition {
    Captured,
    PassThrough,
}

/// Handle for re-enabling the window-server tap after the OS disables it
/// for being slow.
pub trait TapControl: Send {
    fn reenable(&mut self);
}

/// Tap control for environments without a real tap (tests, mock runs).
pub struct NullTapControl;

impl TapControl for NullTapControl {
    fn reenable(&mut self) {}
}

#[derive(Default)]
struct ProbeState {
    keys: HashSet<KeyCode>,
    mods: Modifiers,
}

/// Shared, live view of key state. The input subsystem writes it; the
/// semantic reader consults it from the accessibility thread.
#[derive(Clone, Default)]
pub struct KeyStateHandle {
    inner: Arc<Mutex<ProbeState>>,
}

impl KeyStateProbe for KeyStateHandle {
    fn is_key_down(&self, code: KeyCode) -> bool {
        self.inner.lock().unwrap().keys.contains(&code)
    }

    fn modifiers(&self) -> Modifiers {
        self.inner.lock().unwrap().mods
    }
}

/// The input subsystem: owns the shortcut table, the lock-key monitor, and
/// the modal gate. Generic over the action type the table dispatches.
pub struct InputSubsystem<A: Clone> {
    table: ShortcutTable<A>,
    browse_mode: bool,
    lock: LockKeyMonitor,
    scheduler: SpeechScheduler,
    tap: Box<dyn TapControl>,
    /// HID usage of a Control key pressed with nothing else down; a release
    /// while still armed interrupts speech.
    armed_control: Option<u32>,
    hid_modifiers_down: HashSet<u32>,
    probe: KeyStateHandle,
}

impl<A: Clone> InputSubsystem<A> {
    pub fn new(
        scheduler: SpeechScheduler,
        os_lock: Box<dyn LockState>,
        tap: Box<dyn TapControl>,
        timebase: TimebaseRatio,
        double_tap_window_ms: u64,
    ) -> Self {
        InputSubsystem {
            table: ShortcutTable::new(),
            browse_mode: false,
            lock: LockKeyMonitor::new(os_lock, timebase, double_tap_window_ms),
            scheduler,
            tap,
            armed_control: None,
            hid_modifiers_down: HashSet::new(),
            probe: KeyStateHandle::default(),
        }
    }

    pub fn bind_key(&mut self, chord: ShortcutKey, action: A) -> Result<()> {
        self.table.bind(chord, action)
    }

    pub fn set_browse_mode(&mut self, on: bool) {
        self.browse_mode = on;
    }

    pub fn browse_mode(&self) -> bool {
        self.browse_mode
    }

    /// A clone of the live key-state view for the reader.
    pub fn probe(&self) -> KeyStateHandle {
        self.probe.clone()
    }

    pub fn lock_held(&self) -> bool {
        self.lock.is_held()
    }

    /// Feed one event from the HID modifier stream.
    pub fn handle_hid(&mut self, event: &HidEvent) {
        match self.lock.handle(event) {
            LockKeyOutcome::Toggled(state) => {
                self.armed_control = None;
                if let Some(text) = OutputToken::CapsLockStatusChanged(state).render() {
                    self.scheduler.announce(text);
                }
            }
            LockKeyOutcome::Absorbed => {
                // A lock-key transition is an intervening event for the
                // dangling-Control chord.
                self.armed_control = None;
            }
            LockKeyOutcome::NotLockKey => {
                if hid::is_modifier(event.usage) {
                    self.handle_hid_modifier(event);
                }
            }
        }
    }

    fn handle_hid_modifier(&mut self, event: &HidEvent) {
        if event.pressed {
            let alone = self.hid_modifiers_down.is_empty()
                && self.probe.inner.lock().unwrap().keys.is_empty();
            self.armed_control =
                if alone && hid::is_control(event.usage) { Some(event.usage) } else { None };
            self.hid_modifiers_down.insert(event.usage);
        } else {
            self.hid_modifiers_down.remove(&event.usage);
            if self.armed_control == Some(event.usage) {
                log::debug!("dangling Control tap: interrupting speech");
                self.scheduler.interrupt();
            }
            self.armed_control = None;
        }
    }

    /// Feed one event from the window-server tap. Returns the gate decision
    /// and, for a captured key-down, the bound action if any.
    pub fn handle_tap(&mut self, event: &TapEvent) -> (TapDisposition, Option<A>) {
        match *event {
            TapEvent::DisabledByTimeout => {
                log::warn!("event tap disabled by timeout; re-enabling");
                self.tap.reenable();
                (TapDisposition::Captured, None)
            }
            TapEvent::FlagsChanged { flags, .. } => {
                self.probe.inner.lock().unwrap().mods = flags;
                (TapDisposition::PassThrough, None)
            }
            TapEvent::KeyDown { code, flags } => {
                // Any real key press breaks a pending dangling-Control tap.
                self.armed_control = None;
                {
                    let mut probe = self.probe.inner.lock().unwrap();
                    probe.keys.insert(code);
                    probe.mods = flags;
                }
                if !self.gate_open() {
                    return (TapDisposition::PassThrough, None);
                }
                let chord = ShortcutKey::with_flags(
                    self.browse_mode && !self.lock.is_held(),
                    flags,
                    code,
                );
                let action = self.table.lookup(&chord).cloned();
                if action.is_none() {
                    log::debug!("captured unbound chord {chord:?}");
                }
                (TapDisposition::Captured, action)
            }
            TapEvent::KeyUp { code, flags } => {
                {
                    let mut probe = self.probe.inner.lock().unwrap();
                    probe.keys.remove(&code);
                    probe.mods = flags;
                }
                if self.gate_open() {
                    (TapDisposition::Captured, None)
                } else {
                    (TapDisposition::PassThrough, None)
                }
            }
        }
    }

    /// The modal gate: captured iff the lock key is held or browse mode is
    /// enabled.
    fn gate_open(&self) -> bool {
        self.lock.is_held() || self.browse_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::keys::key;
    use crate::speech::TtsDevice;

    #[derive(Clone, Default)]
    struct RecordingTts {
        spoken: Arc<Mutex<Vec<String>>>,
    }

    impl TtsDevice for RecordingTts {
        fn speak(&mut self, text: &str) {
            self.spoken.lock().unwrap().push(text.to_string());
        }
        fn stop(&mut self) {}
    }

    #[derive(Clone, Default)]
    struct FakeLock {
        state: Arc<Mutex<bool>>,
    }

    impl LockState for FakeLock {
        fn get(&mut self) -> bool {
            *self.state.lock().unwrap()
        }
        fn set(&mut self, on: bool) {
            *self.state.lock().unwrap() = on;
        }
        fn synthesize_toggle(&mut self, _on: bool) {}
    }

    #[derive(Clone, Default)]
    struct CountingTap {
        reenabled: Arc<Mutex<usize>>,
    }

    impl TapControl for CountingTap {
        fn reenable(&mut self) {
            *self.reenabled.lock().unwrap() += 1;
        }
    }

    fn subsystem() -> (InputSubsystem<&'static str>, RecordingTts, CountingTap) {
        let tts = RecordingTts::default();
        let tap = CountingTap::default();
        let scheduler = SpeechScheduler::new(Box::new(tts.clone()));
        let input = InputSubsystem::new(
            scheduler,
            Box::new(FakeLock::default()),
            Box::new(tap.clone()),
            TimebaseRatio::IDENTITY,
            250,
        );
        (input, tts, tap)
    }

    fn lock_press(ts_ms: u64) -> HidEvent {
        HidEvent { usage: hid::CAPS_LOCK, pressed: true, timestamp: ts_ms * 1_000_000 }
    }

    fn lock_release(ts_ms: u64) -> HidEvent {
        HidEvent { usage: hid::CAPS_LOCK, pressed: false, timestamp: ts_ms * 1_000_000 }
    }

    fn key_down(code: KeyCode) -> TapEvent {
        TapEvent::KeyDown { code, flags: Modifiers::NONE }
    }

    #[test]
    fn gate_passes_through_when_closed() {
        let (mut input, _, _) = subsystem();
        let (disposition, action) = input.handle_tap(&key_down(key::TAB));
        assert_eq!(disposition, TapDisposition::PassThrough);
        assert!(action.is_none());
    }

    #[test]
    fn lock_held_captures_and_dispatches() {
        let (mut input, _, _) = subsystem();
        input.bind_key(ShortcutKey::plain(key::TAB), "read").unwrap();
        input.handle_hid(&lock_press(0));
        let (disposition, action) = input.handle_tap(&key_down(key::TAB));
        assert_eq!(disposition, TapDisposition::Captured);
        assert_eq!(action, Some("read"));
        // Release closes the gate again.
        input.handle_tap(&TapEvent::KeyUp { code: key::TAB, flags: Modifiers::NONE });
        input.handle_hid(&lock_release(100));
        let (disposition, _) = input.handle_tap(&key_down(key::TAB));
        assert_eq!(disposition, TapDisposition::PassThrough);
    }

    #[test]
    fn browse_mode_captures_with_browse_qualified_chord() {
        let (mut input, _, _) = subsystem();
        let browse_chord = ShortcutKey { browse: true, ..ShortcutKey::plain(key::TAB) };
        input.bind_key(browse_chord, "browse-read").unwrap();
        input.set_browse_mode(true);
        let (disposition, action) = input.handle_tap(&key_down(key::TAB));
        assert_eq!(disposition, TapDisposition::Captured);
        assert_eq!(action, Some("browse-read"));
    }

    #[test]
    fn browse_mode_with_lock_held_uses_lock_chord() {
        let (mut input, _, _) = subsystem();
        input.bind_key(ShortcutKey::plain(key::TAB), "lock-read").unwrap();
        input.set_browse_mode(true);
        input.handle_hid(&lock_press(0));
        let (_, action) = input.handle_tap(&key_down(key::TAB));
        assert_eq!(action, Some("lock-read"));
    }

    #[test]
    fn double_tap_lock_announces_once() {
        let (mut input, tts, _) = subsystem();
        input.handle_hid(&lock_press(0));
        input.handle_hid(&lock_release(40));
        input.handle_hid(&lock_press(200));
        input.handle_hid(&lock_release(240));
        assert_eq!(*tts.spoken.lock().unwrap(), vec!["CapsLock On"]);
    }

    #[test]
    fn single_tap_lock_announces_nothing() {
        let (mut input, tts, _) = subsystem();
        input.handle_hid(&lock_press(0));
        input.handle_hid(&lock_release(40));
        assert!(tts.spoken.lock().unwrap().is_empty());
    }

    #[test]
    fn solo_control_tap_interrupts_speech() {
        let (mut input, _, _) = subsystem();
        input.scheduler.announce("Hello world");
        assert!(!input.scheduler.is_idle());
        input.handle_hid(&HidEvent { usage: hid::CONTROL_LEFT, pressed: true, timestamp: 0 });
        input.handle_hid(&HidEvent { usage: hid::CONTROL_LEFT, pressed: false, timestamp: 1 });
        assert!(input.scheduler.is_idle());
    }

    #[test]
    fn intervening_key_disarms_control_tap() {
        let (mut input, _, _) = subsystem();
        input.scheduler.announce("Hello");
        input.handle_hid(&HidEvent { usage: hid::CONTROL_LEFT, pressed: true, timestamp: 0 });
        input.handle_tap(&key_down(key::TAB));
        input.handle_hid(&HidEvent { usage: hid::CONTROL_LEFT, pressed: false, timestamp: 1 });
        assert!(!input.scheduler.is_idle(), "speech must keep playing");
    }

    #[test]
    fn intervening_modifier_disarms_control_tap() {
        let (mut input, _, _) = subsystem();
        input.scheduler.announce("Hello");
        input.handle_hid(&HidEvent { usage: hid::CONTROL_LEFT, pressed: true, timestamp: 0 });
        input.handle_hid(&HidEvent { usage: hid::SHIFT_LEFT, pressed: true, timestamp: 1 });
        input.handle_hid(&HidEvent { usage: hid::CONTROL_LEFT, pressed: false, timestamp: 2 });
        assert!(!input.scheduler.is_idle());
    }

    #[test]
    fn control_pressed_with_another_modifier_down_never_arms() {
        let (mut input, _, _) = subsystem();
        input.scheduler.announce("Hello");
        input.handle_hid(&HidEvent { usage: hid::COMMAND_LEFT, pressed: true, timestamp: 0 });
        input.handle_hid(&HidEvent { usage: hid::CONTROL_LEFT, pressed: true, timestamp: 1 });
        input.handle_hid(&HidEvent { usage: hid::CONTROL_LEFT, pressed: false, timestamp: 2 });
        assert!(!input.scheduler.is_idle());
    }

    #[test]
    fn disabled_tap_is_reenabled_and_swallowed() {
        let (mut input, _, tap) = subsystem();
        let (disposition, action) = input.handle_tap(&TapEvent::DisabledByTimeout);
        assert_eq!(disposition, TapDisposition::Captured);
        assert!(action.is_none());
        assert_eq!(*tap.reenabled.lock().unwrap(), 1);
    }

    #[test]
    fn probe_tracks_keys_and_modifiers() {
        let (mut input, _, _) = subsystem();
        let probe = input.probe();
        input.handle_hid(&lock_press(0));
        input.handle_tap(&TapEvent::KeyDown {
            code: key::DOWN,
            flags: Modifiers { shift: true, ..Modifiers::NONE },
        });
        assert!(probe.is_key_down(key::DOWN));
        assert!(probe.vertical_arrow_down());
        assert!(probe.modifiers().shift);
        input.handle_tap(&TapEvent::KeyUp { code: key::DOWN, flags: Modifiers::NONE });
        assert!(!probe.any_arrow_down());
    }
}
