//! Key codes, modifier state, and the two ingress event shapes.

/// Window-server virtual key code.
pub type KeyCode = u16;

/// Virtual key codes the engine binds or inspects.
pub mod key {
    use super::KeyCode;

    pub const TAB: KeyCode = 48;
    pub const COMMA: KeyCode = 43;
    pub const SLASH: KeyCode = 44;
    pub const PERIOD: KeyCode = 47;
    pub const LEFT: KeyCode = 123;
    pub const RIGHT: KeyCode = 124;
    pub const DOWN: KeyCode = 125;
    pub const UP: KeyCode = 126;
    pub const CAPS_LOCK: KeyCode = 57;
    pub const CONTROL_LEFT: KeyCode = 59;
    pub const CONTROL_RIGHT: KeyCode = 62;
}

/// HID usage codes seen on the low-level modifier stream.
pub mod hid {
    pub const CAPS_LOCK: u32 = 0x39;
    pub const CONTROL_LEFT: u32 = 0xE0;
    pub const SHIFT_LEFT: u32 = 0xE1;
    pub const OPTION_LEFT: u32 = 0xE2;
    pub const COMMAND_LEFT: u32 = 0xE3;
    pub const CONTROL_RIGHT: u32 = 0xE4;
    pub const SHIFT_RIGHT: u32 = 0xE5;
    pub const OPTION_RIGHT: u32 = 0xE6;
    pub const COMMAND_RIGHT: u32 = 0xE7;

    pub fn is_modifier(usage: u32) -> bool {
        (CONTROL_LEFT..=COMMAND_RIGHT).contains(&usage)
    }

    pub fn is_control(usage: u32) -> bool {
        usage == CONTROL_LEFT || usage == CONTROL_RIGHT
    }
}

/// Modifier flags as carried on window-server events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub control: bool,
    pub option: bool,
    pub command: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Modifiers =
        Modifiers { control: false, option: false, command: false, shift: false };

    pub fn any(self) -> bool {
        self.control || self.option || self.command || self.shift
    }
}

/// A resolved window-server keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapEvent {
    KeyDown { code: KeyCode, flags: Modifiers },
    KeyUp { code: KeyCode, flags: Modifiers },
    FlagsChanged { code: KeyCode, flags: Modifiers },
    /// The OS disabled the tap for being slow; it must be re-enabled.
    DisabledByTimeout,
}

/// A raw HID modifier transition with a host-clock timestamp (raw ticks;
/// multiply by the timebase ratio for nanoseconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HidEvent {
    pub usage: u32,
    pub pressed: bool,
    pub timestamp: u64,
}

/// Live key state, shared with the reader so it can disambiguate
/// text-selection changes by what the user's hands are doing.
pub trait KeyStateProbe: Send + Sync {
    fn is_key_down(&self, code: KeyCode) -> bool;
    fn modifiers(&self) -> Modifiers;

    fn any_arrow_down(&self) -> bool {
        self.is_key_down(key::LEFT)
            || self.is_key_down(key::RIGHT)
            || self.is_key_down(key::UP)
            || self.is_key_down(key::DOWN)
    }

    fn vertical_arrow_down(&self) -> bool {
        self.is_key_down(key::UP) || self.is_key_down(key::DOWN)
    }
}
