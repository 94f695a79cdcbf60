// Copyright (C) 2025 Paul Hampson
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License version 3 as  published by the
// Free Software Foundation.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <https://www.gnu.org/licenses/>.

use crate::error::ConfigError;
use core::fmt::Debug;
use heapless::FnvIndexMap;

pub const MEMORY_SLOT_COUNT: usize = 8;

const VALUE_SIZE: u16 = core::mem::size_of::<f32>() as u16;

/// Stable offset of a persisted `f32`. Offsets are four bytes apart, one per value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StorageKey(pub u16);

impl StorageKey {
    pub const CALIBRATION_CONSTANT: StorageKey = StorageKey(0);

    /// Key of memory slot `slot`, M0 sits right after the calibration constant.
    pub const fn memory_slot(slot: usize) -> StorageKey {
        StorageKey(VALUE_SIZE + slot as u16 * VALUE_SIZE)
    }
}

/// Durable key indexed storage for the calibration constant and the memory slots.
///
/// Writes are synchronous and unbatched: `put` returns once the value is durable.
pub trait PersistentStore {
    type Error: Debug;

    /// Read a value. `Ok(None)` means the key has never been written.
    fn get(&mut self, key: StorageKey) -> Result<Option<f32>, Self::Error>;

    fn put(&mut self, key: StorageKey, value: f32) -> Result<(), Self::Error>;
}

/// Load a persisted value, rejecting anything that would not survive arithmetic.
///
/// A key that was never written is not an error, the caller picks its default.
pub fn load_value<S: PersistentStore>(
    store: &mut S,
    key: StorageKey,
) -> Result<Option<f32>, ConfigError> {
    let value = store.get(key).map_err(|_| {
        warn!("Unable to read key {}", key.0);
        ConfigError::Unreadable(key)
    })?;

    match value {
        Some(v) if !v.is_finite() => Err(ConfigError::Corrupt(key)),
        other => Ok(other),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RamStoreError {
    Full,
    Unavailable,
}

/// Volatile store, used on the host and as a stand-in while flash is unavailable.
pub struct RamStore {
    values: FnvIndexMap<u16, f32, 16>,
    available: bool,
}

impl RamStore {
    pub fn new() -> Self {
        Self {
            values: FnvIndexMap::new(),
            available: true,
        }
    }

    /// Make every subsequent access fail, as a detached storage device would.
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Write without going through the trait, e.g. to seed garbage for first-boot tests.
    pub fn insert_raw(&mut self, key: StorageKey, value: f32) -> Result<(), RamStoreError> {
        self.values
            .insert(key.0, value)
            .map(|_| ())
            .map_err(|_| RamStoreError::Full)
    }
}

impl Default for RamStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PersistentStore for RamStore {
    type Error = RamStoreError;

    fn get(&mut self, key: StorageKey) -> Result<Option<f32>, Self::Error> {
        if !self.available {
            return Err(RamStoreError::Unavailable);
        }
        Ok(self.values.get(&key.0).copied())
    }

    fn put(&mut self, key: StorageKey, value: f32) -> Result<(), Self::Error> {
        if !self.available {
            return Err(RamStoreError::Unavailable);
        }
        self.insert_raw(key, value)
    }
}
