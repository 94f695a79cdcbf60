//! Key/value persistence in the tail of the program flash, on top of `sequential-storage`.
//!
//! Values are `f32` keyed by [`StorageKey`]. The map does its own wear levelling across
//! the pages of the range, so repeated saves of the same key are fine.

use benchscale_core::{PersistentStore, StorageKey};
use core::ops::Range;
use defmt::{debug, trace, warn, Format};
use embassy_embedded_hal::adapter::BlockingAsync;
use embassy_futures::block_on;
use embassy_rp::flash::{self, Flash};
use embassy_rp::peripherals::FLASH;
use embedded_storage_async::nor_flash::MultiwriteNorFlash;
use sequential_storage::cache::NoCache;
use sequential_storage::map;

/// Big enough for a `u16` key and an `f32`, rounded up to the flash word size.
const DATA_BUFFER_SIZE: usize = 32;

pub type BlockingAsyncFlash =
    BlockingAsync<Flash<'static, FLASH, flash::Blocking, { crate::FLASH_SIZE }>>;

#[derive(Debug, Format, Clone, Copy, PartialEq, Eq)]
pub enum FlashStoreError {
    RetrieveError,
    SaveError,
}

pub struct FlashStore<F> {
    flash: F,
    storage_range: Range<u32>,
    flash_cache: NoCache,
}

impl<F, E> FlashStore<F>
where
    E: Format,
    F: MultiwriteNorFlash<Error = E>,
{
    pub fn new(flash: F, storage_range: Range<u32>) -> Self {
        debug!(
            "Storage flash address range: 0x{:x} to 0x{:x}",
            storage_range.start, storage_range.end
        );
        Self {
            flash,
            storage_range,
            flash_cache: NoCache::new(),
        }
    }
}

impl<F, E> PersistentStore for FlashStore<F>
where
    E: Format,
    F: MultiwriteNorFlash<Error = E>,
{
    type Error = FlashStoreError;

    // The flash is blocking underneath, so the futures complete on their first poll.
    fn get(&mut self, key: StorageKey) -> Result<Option<f32>, Self::Error> {
        let mut data_buffer = [0; DATA_BUFFER_SIZE];
        let value: Option<f32> = block_on(map::fetch_item(
            &mut self.flash,
            self.storage_range.clone(),
            &mut self.flash_cache,
            &mut data_buffer,
            &key.0,
        ))
        .map_err(|e| {
            warn!("Unable to read key {}. Error: {:?}", key.0, e);
            FlashStoreError::RetrieveError
        })?;
        trace!("Read key {}: {:?}", key.0, value);
        Ok(value)
    }

    fn put(&mut self, key: StorageKey, value: f32) -> Result<(), Self::Error> {
        let mut data_buffer = [0; DATA_BUFFER_SIZE];
        block_on(map::store_item(
            &mut self.flash,
            self.storage_range.clone(),
            &mut self.flash_cache,
            &mut data_buffer,
            &key.0,
            &value,
        ))
        .map_err(|e| {
            warn!("Unable to save key {}. Error {:?}", key.0, e);
            FlashStoreError::SaveError
        })?;
        trace!("Saved key {} = {}", key.0, value);
        Ok(())
    }
}
