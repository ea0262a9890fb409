//! Per-chip register cache.
//!
//! Holds the last value set for every register of one chip. Values survive
//! while the chip is unpowered and are replayed by [`RegisterCache::flush`]
//! once the rail comes back.

use heapless::Vec;

use crate::chip::ChipHandle;
use crate::error::{ConfigError, TransportError};
use crate::transport::RegisterTransport;

/// Distinct registers one cache can hold (the PCM1792A has five writable).
pub const CACHE_CAPACITY: usize = 8;

/// Shadow of one chip's writable registers.
#[derive(Debug, Clone)]
pub struct RegisterCache {
    chip: ChipHandle,
    entries: Vec<(u8, u8), CACHE_CAPACITY>,
    flush_order: &'static [u8],
    dirty: bool,
}

impl RegisterCache {
    /// Empty cache for `chip`, replaying registers in address order.
    pub const fn new(chip: ChipHandle) -> Self {
        Self::with_flush_order(chip, &[])
    }

    /// Empty cache whose flush writes `order` first, then any other cached
    /// register in address order.
    pub const fn with_flush_order(chip: ChipHandle, order: &'static [u8]) -> Self {
        Self {
            chip,
            entries: Vec::new(),
            flush_order: order,
            dirty: false,
        }
    }

    /// Chip this cache shadows.
    pub fn chip(&self) -> ChipHandle {
        self.chip
    }

    /// Record `value` for `reg` and mark the cache dirty.
    ///
    /// # Errors
    ///
    /// [`ConfigError::CacheFull`] if `reg` is new and every slot is taken.
    pub fn set(&mut self, reg: u8, value: u8) -> Result<(), ConfigError> {
        self.insert(reg, value)?;
        self.dirty = true;
        Ok(())
    }

    /// Record a value that has already reached the chip. Does not dirty.
    pub fn store(&mut self, reg: u8, value: u8) -> Result<(), ConfigError> {
        self.insert(reg, value)
    }

    fn insert(&mut self, reg: u8, value: u8) -> Result<(), ConfigError> {
        if let Some(entry) = self.entries.iter_mut().find(|(r, _)| *r == reg) {
            entry.1 = value;
            return Ok(());
        }
        self.entries
            .push((reg, value))
            .map_err(|_| ConfigError::CacheFull { chip: self.chip.role })
    }

    /// Last value set for `reg`.
    pub fn get(&self, reg: u8) -> Option<u8> {
        self.entries.iter().find(|(r, _)| *r == reg).map(|&(_, v)| v)
    }

    /// Flag the chip as out of sync with the cache (it lost power).
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether a flush is pending.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of cached registers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write every cached register to the chip.
    ///
    /// Registers named in the flush order go first, in that order; the rest
    /// follow by ascending address. The first failing write stops the flush
    /// and its error names the register. The cache stays dirty on failure.
    /// Flushing a clean cache writes the same bytes again.
    pub fn flush<T: RegisterTransport>(&mut self, transport: &mut T) -> Result<(), TransportError> {
        debug!("flush {} ({} registers)", self.chip.role, self.entries.len());
        for &reg in self.flush_order {
            if let Some(value) = self.get(reg) {
                transport.write(self.chip, reg, value)?;
            }
        }
        let mut rest: Vec<(u8, u8), CACHE_CAPACITY> = self
            .entries
            .iter()
            .copied()
            .filter(|(r, _)| !self.flush_order.contains(r))
            .collect();
        rest.sort_unstable_by_key(|&(r, _)| r);
        for (reg, value) in rest {
            transport.write(self.chip, reg, value)?;
        }
        self.dirty = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::ChipRole;

    const DAC: ChipHandle = ChipHandle::new(ChipRole::DacRight, 0x4C);

    #[test]
    fn set_overwrites_and_dirties() {
        let mut cache = RegisterCache::new(DAC);
        assert!(!cache.is_dirty());
        assert_eq!(cache.set(0x10, 1), Ok(()));
        assert_eq!(cache.set(0x10, 2), Ok(()));
        assert_eq!(cache.get(0x10), Some(2));
        assert_eq!(cache.len(), 1);
        assert!(cache.is_dirty());
    }

    #[test]
    fn store_does_not_dirty() {
        let mut cache = RegisterCache::new(DAC);
        assert_eq!(cache.store(0x31, 1), Ok(()));
        assert_eq!(cache.get(0x31), Some(1));
        assert!(!cache.is_dirty());
    }

    #[test]
    fn missing_register_is_none() {
        assert_eq!(RegisterCache::new(DAC).get(0x12), None);
    }

    #[test]
    fn full_cache_rejects_new_register() {
        let mut cache = RegisterCache::new(DAC);
        for reg in 0..8u8 {
            assert_eq!(cache.set(reg, reg), Ok(()));
        }
        assert_eq!(
            cache.set(0x40, 0),
            Err(ConfigError::CacheFull { chip: ChipRole::DacRight })
        );
        // existing registers still update
        assert_eq!(cache.set(3, 9), Ok(()));
    }
}
