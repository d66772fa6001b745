//! The shortcut table: one action per resolved chord.

use std::collections::HashMap;

use anyhow::Result;

use super::keys::{KeyCode, Modifiers};

/// A fully-resolved chord. `browse` distinguishes bindings that require
/// browse mode from bindings that require the lock key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShortcutKey {
    pub browse: bool,
    pub control: bool,
    pub option: bool,
    pub command: bool,
    pub shift: bool,
    pub code: KeyCode,
}

impl ShortcutKey {
    /// A lock-held chord with no extra modifiers.
    pub fn plain(code: KeyCode) -> Self {
        ShortcutKey { browse: false, control: false, option: false, command: false, shift: false, code }
    }

    pub fn with_flags(browse: bool, flags: Modifiers, code: KeyCode) -> Self {
        ShortcutKey {
            browse,
            control: flags.control,
            option: flags.option,
            command: flags.command,
            shift: flags.shift,
            code,
        }
    }
}

/// Chord → action map. At most one action per chord; rebinding an occupied
/// chord is an error, never an overwrite.
pub struct ShortcutTable<A> {
    bindings: HashMap<ShortcutKey, A>,
}

impl<A> ShortcutTable<A> {
    pub fn new() -> Self {
        ShortcutTable { bindings: HashMap::new() }
    }

    pub fn bind(&mut self, chord: ShortcutKey, action: A) -> Result<()> {
        if self.bindings.contains_key(&chord) {
            anyhow::bail!("duplicate shortcut binding for {chord:?}");
        }
        self.bindings.insert(chord, action);
        Ok(())
    }

    pub fn lookup(&self, chord: &ShortcutKey) -> Option<&A> {
        self.bindings.get(chord)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<A> Default for ShortcutTable<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::keys::key;

    #[test]
    fn bind_and_lookup() {
        let mut table = ShortcutTable::new();
        table.bind(ShortcutKey::plain(key::TAB), "read").unwrap();
        assert_eq!(table.lookup(&ShortcutKey::plain(key::TAB)), Some(&"read"));
        assert_eq!(table.lookup(&ShortcutKey::plain(key::LEFT)), None);
    }

    #[test]
    fn duplicate_binding_is_rejected() {
        let mut table = ShortcutTable::new();
        table.bind(ShortcutKey::plain(key::TAB), 1).unwrap();
        let err = table.bind(ShortcutKey::plain(key::TAB), 2).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
        // The original binding survives.
        assert_eq!(table.lookup(&ShortcutKey::plain(key::TAB)), Some(&1));
    }

    #[test]
    fn browse_flag_distinguishes_chords() {
        let mut table = ShortcutTable::new();
        table.bind(ShortcutKey::plain(key::TAB), "lock").unwrap();
        let browse = ShortcutKey { browse: true, ..ShortcutKey::plain(key::TAB) };
        table.bind(browse, "browse").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup(&browse), Some(&"browse"));
    }
}
