//! Chip roles and the directory that resolves them to bus handles.
//!
//! The board logic never hard-codes addresses: it asks a [`ChipDirectory`]
//! for each role once, at attach time, and keeps the resulting
//! [`ChipHandle`]s for the life of the board.

use core::fmt;

use crate::config::{DAC_LEFT_I2C_ADDR, DAC_RIGHT_I2C_ADDR, FPGA_I2C_ADDR};

/// The three register-addressable chips on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChipRole {
    /// FPGA control block (or CS8416 receiver on the same address).
    Fpga,
    /// PCM1792A driving the left channel.
    DacLeft,
    /// PCM1792A driving the right channel.
    DacRight,
}

impl ChipRole {
    /// Short lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fpga => "fpga",
            Self::DacLeft => "dac-left",
            Self::DacRight => "dac-right",
        }
    }
}

impl fmt::Display for ChipRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolved bus identity of one chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChipHandle {
    /// Role the handle was resolved for.
    pub role: ChipRole,
    /// 7-bit I2C address.
    pub address: u8,
}

impl ChipHandle {
    /// Construct a handle.
    pub const fn new(role: ChipRole, address: u8) -> Self {
        Self { role, address }
    }
}

/// Source of chip handles (device tree, board file, test fixture...).
pub trait ChipDirectory {
    /// Handle for `role`, or `None` if the chip is not registered.
    fn chip(&self, role: ChipRole) -> Option<ChipHandle>;
}

/// Static address table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardTopology {
    /// FPGA / receiver address.
    pub fpga: Option<u8>,
    /// Left DAC address.
    pub dac_left: Option<u8>,
    /// Right DAC address.
    pub dac_right: Option<u8>,
}

impl BoardTopology {
    /// Addresses used by every JEDAC revision so far.
    pub const fn standard() -> Self {
        Self {
            fpga: Some(FPGA_I2C_ADDR),
            dac_left: Some(DAC_LEFT_I2C_ADDR),
            dac_right: Some(DAC_RIGHT_I2C_ADDR),
        }
    }
}

impl Default for BoardTopology {
    fn default() -> Self {
        Self::standard()
    }
}

impl ChipDirectory for BoardTopology {
    fn chip(&self, role: ChipRole) -> Option<ChipHandle> {
        let address = match role {
            ChipRole::Fpga => self.fpga,
            ChipRole::DacLeft => self.dac_left,
            ChipRole::DacRight => self.dac_right,
        }?;
        Some(ChipHandle::new(role, address))
    }
}
