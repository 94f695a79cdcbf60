use crate::error::{ConfigError, ScaleError};
use crate::storage::{load_value, PersistentStore, StorageKey, MEMORY_SLOT_COUNT};

pub const EMPTY_SLOT: f32 = 0.0;

/// Stored weight readings, M0 to M7, mirrored to persistent storage.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryBank {
    slots: [f32; MEMORY_SLOT_COUNT],
}

impl MemoryBank {
    pub const fn new() -> Self {
        Self {
            slots: [EMPTY_SLOT; MEMORY_SLOT_COUNT],
        }
    }

    /// Read every slot from the store. Slots that fail to load are empty, nothing is
    /// written back. The last failure is returned alongside the bank.
    pub fn load<S: PersistentStore>(store: &mut S) -> (Self, Option<ConfigError>) {
        let mut bank = Self::new();
        let mut failure = None;

        for (slot, value) in bank.slots.iter_mut().enumerate() {
            match load_value(store, StorageKey::memory_slot(slot)) {
                Ok(Some(v)) => *value = v,
                Ok(None) => {}
                Err(e) => {
                    warn!("Memory slot {} unusable, treating as empty", slot);
                    failure = Some(e);
                }
            }
        }

        (bank, failure)
    }

    pub fn get(&self, slot: usize) -> Option<f32> {
        self.slots.get(slot).copied()
    }

    pub fn values(&self) -> &[f32; MEMORY_SLOT_COUNT] {
        &self.slots
    }

    /// Put `pounds` in a slot and persist it. The slot keeps the new value even when the
    /// write fails.
    pub fn store<S: PersistentStore>(
        &mut self,
        store: &mut S,
        slot: usize,
        pounds: f32,
    ) -> Result<(), ScaleError> {
        let Some(value) = self.slots.get_mut(slot) else {
            warn!("No memory slot {}", slot);
            return Ok(());
        };
        *value = pounds;
        Self::persist(store, slot, pounds)?;

        // read it back so what is shown is what survives a power cycle
        if let Ok(Some(stored)) = load_value(store, StorageKey::memory_slot(slot)) {
            *value = stored;
        }
        debug!("M{} = {}", slot, *value);
        Ok(())
    }

    pub fn clear<S: PersistentStore>(
        &mut self,
        store: &mut S,
        slot: usize,
    ) -> Result<(), ScaleError> {
        let Some(value) = self.slots.get_mut(slot) else {
            warn!("No memory slot {}", slot);
            return Ok(());
        };
        *value = EMPTY_SLOT;
        debug!("M{} cleared", slot);
        Self::persist(store, slot, EMPTY_SLOT)
    }

    /// Empty every slot. All writes are attempted, the first failure is reported.
    pub fn clear_all<S: PersistentStore>(&mut self, store: &mut S) -> Result<(), ScaleError> {
        let mut result = Ok(());
        for slot in 0..MEMORY_SLOT_COUNT {
            self.slots[slot] = EMPTY_SLOT;
            if let Err(e) = Self::persist(store, slot, EMPTY_SLOT) {
                result = result.and(Err(e));
            }
        }
        debug!("All memory cleared");
        result
    }

    fn persist<S: PersistentStore>(
        store: &mut S,
        slot: usize,
        value: f32,
    ) -> Result<(), ScaleError> {
        let key = StorageKey::memory_slot(slot);
        store.put(key, value).map_err(|_| {
            warn!("Failed to persist memory slot {}", slot);
            ScaleError::StorageWrite(key)
        })
    }
}

impl Default for MemoryBank {
    fn default() -> Self {
        Self::new()
    }
}
