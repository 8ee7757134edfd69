use std::borrow::Cow;
use std::collections::HashMap;

/// A named entry point into ROM code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Routine {
    pub name: Cow<'static, str>,
    pub entry: u16,
}

impl Routine {
    #[must_use]
    pub const fn new(name: &'static str, entry: u16) -> Self {
        Self { name: Cow::Borrowed(name), entry }
    }
}

/// Entry points in Super Mario Bros. (NROM-256, PRG ROM at $8000-$FFFF).
pub mod smb {
    use super::Routine;

    pub const PAUSE_ROUTINE: Routine = Routine::new("pauseRoutine", 0x8182);
    pub const MOVE_ALL_SPRITES_OFFSCREEN: Routine = Routine::new("moveAllSpritesOffscreen", 0x8220);
    pub const SET_VRAM_OFFSET: Routine = Routine::new("setVRAMOffset", 0x863F);

    pub const ALL: &[Routine] = &[PAUSE_ROUTINE, MOVE_ALL_SPRITES_OFFSCREEN, SET_VRAM_OFFSET];
}

/// Two-way lookup between routine names and entry addresses.
#[derive(Debug, Clone, Default)]
pub struct RoutineTable {
    by_name: HashMap<Cow<'static, str>, u16>,
    by_entry: HashMap<u16, Cow<'static, str>>,
}

impl RoutineTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn super_mario_bros() -> Self {
        smb::ALL.iter().cloned().collect()
    }

    /// Add a routine, replacing any existing routine with the same name. If two names share an
    /// entry address, reverse lookup returns the most recently inserted name.
    pub fn insert(&mut self, routine: Routine) {
        if let Some(old_entry) = self.by_name.insert(routine.name.clone(), routine.entry)
            && self.by_entry.get(&old_entry) == Some(&routine.name)
        {
            self.by_entry.remove(&old_entry);
        }
        self.by_entry.insert(routine.entry, routine.name);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Routine> {
        self.by_name
            .get_key_value(name)
            .map(|(name, &entry)| Routine { name: name.clone(), entry })
    }

    #[must_use]
    pub fn name_of(&self, entry: u16) -> Option<&str> {
        self.by_entry.get(&entry).map(AsRef::as_ref)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Routines sorted by entry address.
    #[must_use]
    pub fn routines(&self) -> Vec<Routine> {
        let mut routines: Vec<_> = self
            .by_name
            .iter()
            .map(|(name, &entry)| Routine { name: name.clone(), entry })
            .collect();
        routines.sort_by(|a, b| a.entry.cmp(&b.entry).then_with(|| a.name.cmp(&b.name)));
        routines
    }
}

impl FromIterator<Routine> for RoutineTable {
    fn from_iter<T: IntoIterator<Item = Routine>>(iter: T) -> Self {
        let mut table = Self::new();
        for routine in iter {
            table.insert(routine);
        }
        table
    }
}
