//! Audio domain newtypes.
//!
//! - `AttenuationDb`: 0 (loudest) ..= 80 (mute), the core's volume scale
//! - `MixerVolume`: 0 (mute) ..= 80 (loudest), the mixer control's scale
//! - `RateFamily`: clock family and multiplier bits for one sample rate

use crate::config::MAX_ATTENUATION_DB;
use crate::error::ConfigError;
use crate::fpga::{GPO0_BASE48KHZ, GPO0_CLKRATE_SHIFT};

// ── AttenuationDb ────────────────────────────────────────────────────────────

/// Attenuation in dB, clamped to `0..=MAX_ATTENUATION_DB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct AttenuationDb(u8);

impl AttenuationDb {
    /// Full volume.
    pub const ZERO: Self = Self(0);
    /// Mute.
    pub const MUTE: Self = Self(MAX_ATTENUATION_DB);

    /// Clamp `db` into range.
    #[must_use]
    pub const fn new(db: u8) -> Self {
        if db > MAX_ATTENUATION_DB {
            Self::MUTE
        } else {
            Self(db)
        }
    }

    /// Inner value in dB.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Whether this is the mute level.
    #[must_use]
    pub const fn is_mute(self) -> bool {
        self.0 >= MAX_ATTENUATION_DB
    }
}

impl From<MixerVolume> for AttenuationDb {
    fn from(vol: MixerVolume) -> Self {
        Self(MAX_ATTENUATION_DB.saturating_sub(vol.get()))
    }
}

// ── MixerVolume ──────────────────────────────────────────────────────────────

/// Mixer-control volume, 0 = mute, `MAX_ATTENUATION_DB` = loudest.
///
/// The mirror image of [`AttenuationDb`]; conversions flip the orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct MixerVolume(u8);

impl MixerVolume {
    /// Highest control value.
    pub const MAX: u8 = MAX_ATTENUATION_DB;

    /// Clamp `value` into range.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        if value > Self::MAX {
            Self(Self::MAX)
        } else {
            Self(value)
        }
    }

    /// Inner control value.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl From<AttenuationDb> for MixerVolume {
    fn from(att: AttenuationDb) -> Self {
        Self(MAX_ATTENUATION_DB.saturating_sub(att.get()))
    }
}

// ── RateFamily ───────────────────────────────────────────────────────────────

/// Oscillator family and multiplier for a supported sample rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RateFamily {
    /// 48 kHz family (48/96/192 k) rather than 44.1 kHz family.
    pub base_48k: bool,
    /// 1 for 44.1/48 k, 2 for 88.2/96 k, 3 for 176.4/192 k.
    pub multiplier: u8,
}

impl RateFamily {
    /// Classify `hz`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnsupportedSampleRate`] for anything other than the six
    /// rates the clock tree can produce.
    pub const fn from_hz(hz: u32) -> Result<Self, ConfigError> {
        let (base_48k, multiplier) = match hz {
            44_100 => (false, 1),
            48_000 => (true, 1),
            88_200 => (false, 2),
            96_000 => (true, 2),
            176_400 => (false, 3),
            192_000 => (true, 3),
            _ => return Err(ConfigError::UnsupportedSampleRate(hz)),
        };
        Ok(Self {
            base_48k,
            multiplier,
        })
    }

    /// GPO0 clock bits (excluding the clock-master bit).
    #[must_use]
    pub const fn gpo0_bits(self) -> u8 {
        let base = if self.base_48k { GPO0_BASE48KHZ } else { 0 };
        base | self.multiplier.wrapping_shl(GPO0_CLKRATE_SHIFT)
    }
}
