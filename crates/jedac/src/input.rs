//! Input and clock selection in FPGA GPO0.
//!
//! Selection 0 is the I2S input with the DAC as clock master; selection
//! `n` in `1..=inputs` is S/PDIF input `n - 1` with the DAC slaved to the
//! receiver's recovered clock. Both share the low nibble of GPO0.

use core::fmt;

use crate::audio_types::RateFamily;
use crate::error::ConfigError;
use crate::fpga::{GPO0_CLKMASK, GPO0_CLKMASTER, GPO0_CLKRATE, GPO0_CLKRATE_SHIFT};

/// Active audio input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputSelection {
    /// I2S from the host, DAC is clock master.
    I2s,
    /// S/PDIF input with zero-based index, DAC is clock slave.
    Spdif(u8),
}

impl InputSelection {
    /// Selection for mixer index `index` on a board with `inputs` S/PDIF
    /// inputs.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InputOutOfRange`] if `index > inputs`.
    pub fn from_index(index: u8, inputs: u8) -> Result<Self, ConfigError> {
        match index {
            0 => Ok(Self::I2s),
            n if n <= inputs => Ok(Self::Spdif(n.saturating_sub(1))),
            _ => Err(ConfigError::InputOutOfRange { index, inputs }),
        }
    }

    /// Mixer index: 0 for I2S, 1.. for S/PDIF.
    pub const fn index(self) -> u8 {
        match self {
            Self::I2s => 0,
            Self::Spdif(n) => n.saturating_add(1),
        }
    }

    /// Selection encoded in a GPO0 value.
    pub const fn decode(gpo0: u8) -> Self {
        if gpo0 & GPO0_CLKMASTER != 0 {
            Self::I2s
        } else {
            Self::Spdif((gpo0 & GPO0_CLKRATE).wrapping_shr(GPO0_CLKRATE_SHIFT))
        }
    }

    /// Clock nibble of GPO0 for this selection.
    ///
    /// In master mode the nibble also carries the rate family; `rate` is
    /// ignored in slave mode, where bits 3:2 hold the input index.
    pub const fn clock_bits(self, rate: Option<RateFamily>) -> u8 {
        match self {
            Self::I2s => {
                let rate_bits = match rate {
                    Some(r) => r.gpo0_bits(),
                    None => 0,
                };
                (GPO0_CLKMASTER | rate_bits) & GPO0_CLKMASK
            }
            Self::Spdif(n) => n.wrapping_shl(GPO0_CLKRATE_SHIFT) & GPO0_CLKRATE,
        }
    }

    /// Replace the clock nibble of `gpo0`, keeping the power bit and others.
    ///
    /// I2S with no known rate leaves a GPO0 that is already in master mode
    /// alone, so the rate bits programmed earlier survive.
    pub const fn apply(self, gpo0: u8, rate: Option<RateFamily>) -> u8 {
        match (self, rate) {
            (Self::I2s, None) if gpo0 & GPO0_CLKMASTER != 0 => gpo0,
            _ => (gpo0 & !GPO0_CLKMASK) | self.clock_bits(rate),
        }
    }
}

impl fmt::Display for InputSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I2s => f.write_str("I2S"),
            Self::Spdif(n) => write!(f, "Spdif {}", u16::from(*n).saturating_add(1)),
        }
    }
}
