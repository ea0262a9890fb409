//! Error types
//!
//! Transport failures always name the chip and register they hit, so a
//! partially applied burst can be diagnosed from the error alone.

use thiserror_no_std::Error as ThisError;

use crate::chip::ChipRole;

/// Whether a bus failure is worth repeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportErrorKind {
    /// Remote side did not acknowledge, or the bus was busy.
    Transient,
    /// Anything else (bus fault, overrun, unsupported transfer).
    Permanent,
}

/// One register access failed after the retry budget was used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("{kind:?} transport error on {chip} register {reg:#04x}")]
pub struct TransportError {
    /// Chip the access was addressed to.
    pub chip: ChipRole,
    /// Register address.
    pub reg: u8,
    /// Classification of the last underlying bus error.
    pub kind: TransportErrorKind,
}

impl TransportError {
    /// Build a transport error for `chip`/`reg`.
    pub const fn new(chip: ChipRole, reg: u8, kind: TransportErrorKind) -> Self {
        Self { chip, reg, kind }
    }
}

/// Configuration that the board cannot operate with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A required chip handle could not be resolved from the topology.
    #[error("chip {0} not present in board topology")]
    MissingChip(ChipRole),
    /// The board variant has a UI-sync line but no pin was supplied.
    #[error("board variant requires a UI-sync line")]
    MissingUiSync,
    /// Input index outside `0..=inputs`.
    #[error("input {index} out of range (0..={inputs})")]
    InputOutOfRange {
        /// Requested index.
        index: u8,
        /// Number of S/PDIF inputs on this board.
        inputs: u8,
    },
    /// Sample rate outside the 44.1k/48k families up to 192 kHz.
    #[error("unsupported sample rate {0} Hz")]
    UnsupportedSampleRate(u32),
    /// A register cache has no room for another distinct register.
    #[error("register cache for {chip} is full")]
    CacheFull {
        /// Owner of the full cache.
        chip: ChipRole,
    },
    /// Board descriptor declares an input count the hardware cannot address.
    #[error("invalid S/PDIF input count {0}")]
    TooManyInputs(u8),
}

/// Top-level error returned by [`crate::Board`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A register access failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The request was rejected before touching the bus.
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    /// The analog rail was not confirmed within the polling budget.
    #[error("analog rail not confirmed after {polls} polls")]
    Timeout {
        /// Status reads performed before giving up.
        polls: u32,
    },
}
