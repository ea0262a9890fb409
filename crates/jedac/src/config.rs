//! Board configuration and constants
//!
//! Fixed timing and attenuation constants shared by every board revision,
//! plus the capability descriptor that tells the revisions apart. Timing is
//! deliberately not caller-configurable.

use crate::error::ConfigError;

/// Loudest-to-mute span of the volume control, in dB (1 dB per step).
///
/// Attenuation `0` is full volume, `MAX_ATTENUATION_DB` is mute.
pub const MAX_ATTENUATION_DB: u8 = 80;

/// Attenuation at and above which the analog 20 dB pad takes over part of
/// the attenuation.
pub const PAD_THRESHOLD_DB: u8 = 20;

/// Delay between two reads of the rail-confirmation status bit.
pub const POWER_POLL_INTERVAL_MS: u32 = 50;

/// Status reads before power-up is declared timed out (3 s at 50 ms).
///
/// A healthy board confirms the rail after about 6 polls.
pub const POWER_POLL_MAX: u32 = 60;

/// Extra wait after a rail that was not already up gets confirmed.
///
/// Covers the crystal oscillator ramp (2 ms) and the PCM1792A internal
/// reset (1024 clocks). Half the poll interval, at least 1 ms.
pub const POWER_SETTLE_MS: u32 = if POWER_POLL_INTERVAL_MS / 2 < 1 {
    1
} else {
    POWER_POLL_INTERVAL_MS / 2
};

/// 7-bit I2C address of the FPGA register block (shared with the CS8416).
pub const FPGA_I2C_ADDR: u8 = 0x20;
/// 7-bit I2C address of the left-channel PCM1792A (bus address 0x9A / 2).
pub const DAC_LEFT_I2C_ADDR: u8 = 0x4D;
/// 7-bit I2C address of the right-channel PCM1792A (bus address 0x98 / 2).
pub const DAC_RIGHT_I2C_ADDR: u8 = 0x4C;

/// Widest S/PDIF input set the 2-bit slave-input field can address.
pub const MAX_SPDIF_INPUTS: u8 = 4;

/// Which chip receives S/PDIF and hosts the shared control registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReceiverKind {
    /// Receiver and control registers implemented in the MACH XO2 FPGA.
    Fpga,
    /// CS8416 receiver in software mode (5th-generation board).
    ///
    /// `default_input` is the receiver channel (0..=3) selected at init.
    Cs8416 {
        /// Receiver input channel selected by [`crate::Board::init`].
        default_input: u8,
    },
}

impl ReceiverKind {
    /// Register and value that switch the analog 20 dB pad on.
    ///
    /// The FPGA drives the pad relay from GPO1 bit 0; on the CS8416 board it
    /// hangs off the receiver's GPO pins in control register 3.
    pub const fn pad_register(self) -> (u8, u8) {
        match self {
            Self::Fpga => (crate::fpga::REG_GPO1, crate::fpga::GPO1_ATT20DB),
            Self::Cs8416 { .. } => (crate::cs8416::REG_CONTROL3, crate::cs8416::CONTROL3_PAD_ON),
        }
    }
}

/// Capability descriptor for one board revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoardVariant {
    /// A UI-sync GPIO line towards the front-panel controller is wired.
    pub has_ui_sync: bool,
    /// Receiver implementation.
    pub receiver: ReceiverKind,
    /// Number of selectable S/PDIF inputs (1..=4).
    pub spdif_inputs: u8,
}

impl BoardVariant {
    /// Current board: FPGA receiver, UI-sync line to the ESPHome controller.
    pub const fn jedac() -> Self {
        Self {
            has_ui_sync: true,
            receiver: ReceiverKind::Fpga,
            spdif_inputs: MAX_SPDIF_INPUTS,
        }
    }

    /// 5th-generation board: CS8416 receiver, no UI-sync line.
    pub const fn jedac5() -> Self {
        Self {
            has_ui_sync: false,
            receiver: ReceiverKind::Cs8416 { default_input: 3 },
            spdif_inputs: MAX_SPDIF_INPUTS,
        }
    }

    /// Reject descriptors the register layout cannot express.
    ///
    /// # Errors
    ///
    /// [`ConfigError::TooManyInputs`] if `spdif_inputs` is 0 or above 4.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spdif_inputs == 0 || self.spdif_inputs > MAX_SPDIF_INPUTS {
            return Err(ConfigError::TooManyInputs(self.spdif_inputs));
        }
        if let ReceiverKind::Cs8416 { default_input } = self.receiver {
            if default_input >= MAX_SPDIF_INPUTS {
                return Err(ConfigError::TooManyInputs(default_input));
            }
        }
        Ok(())
    }
}

impl Default for BoardVariant {
    fn default() -> Self {
        Self::jedac()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settle_delay_is_half_the_poll_interval() {
        assert_eq!(POWER_SETTLE_MS, 25);
    }

    #[test]
    fn poll_budget_is_three_seconds() {
        assert_eq!(POWER_POLL_INTERVAL_MS * POWER_POLL_MAX, 3_000);
    }

    #[test]
    fn presets_validate() {
        assert!(BoardVariant::jedac().validate().is_ok());
        assert!(BoardVariant::jedac5().validate().is_ok());
    }

    #[test]
    fn zero_or_five_inputs_rejected() {
        let mut v = BoardVariant::jedac();
        v.spdif_inputs = 0;
        assert_eq!(v.validate(), Err(ConfigError::TooManyInputs(0)));
        v.spdif_inputs = 5;
        assert_eq!(v.validate(), Err(ConfigError::TooManyInputs(5)));
    }

    #[test]
    fn pad_register_differs_per_receiver() {
        assert_eq!(ReceiverKind::Fpga.pad_register(), (0x31, 0x01));
        assert_eq!(
            ReceiverKind::Cs8416 { default_input: 3 }.pad_register(),
            (0x03, 0xC0)
        );
    }
}
