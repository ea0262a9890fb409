//! Board control core for the JEDAC DAC
//!
//! The JEDAC board carries an S/PDIF receiver (an FPGA register block, or a
//! CS8416 on the older 5th-generation board), a low-jitter clock and a pair
//! of PCM1792A DAC chips in dual-mono configuration. This crate owns the
//! parts of the driver that carry real invariants:
//!
//! - bringing the switched analog rail up and waiting for confirmation
//! - caching DAC register state while the rail is down and replaying it on
//!   power-up
//! - stereo attenuation across three chips, with the analog 20 dB pad
//! - input / clock selection in the shared FPGA control register
//! - the UI-sync GPIO pulse bracketing audible register bursts
//!
//! # Architecture Layers
//!
//! ```text
//! Mixer controls / stream events (kernel, ESPHome, test rig)
//!         ↓
//! Board (this crate: power, attenuation, input selection)
//!         ↓
//! RegisterTransport + RegisterCache
//!         ↓
//! embedded-hal I2C / GPIO / delay
//! ```
//!
//! # Features
//!
//! - `std`: `std::error::Error` impls for the error types
//! - `defmt`: target logging and `defmt::Format` derives
//! - `tracing`: host logging
//!
//! # Example
//!
//! ```no_run
//! use jedac::{Board, BoardTopology, BoardVariant, I2cTransport};
//! # fn run<I, P, D>(i2c: I, uisync: P, delay: D) -> Result<(), jedac::Error>
//! # where
//! #     I: embedded_hal::i2c::I2c,
//! #     P: embedded_hal::digital::StatefulOutputPin,
//! #     D: embedded_hal::delay::DelayNs,
//! # {
//! let mut board = Board::attach(
//!     &BoardTopology::standard(),
//!     BoardVariant::jedac(),
//!     I2cTransport::new(i2c),
//!     Some(uisync),
//!     delay,
//! )?;
//! board.init()?;
//! board.set_volume(30, 30)?; // staged in the DAC caches
//! board.stream_start()?; // rail up, caches flushed
//! # Ok(())
//! # }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)]
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this register-level driver crate:
#![allow(clippy::doc_markdown)] // register names in doc comments
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

#[macro_use]
mod log;

pub mod audio_types;
pub mod board;
pub mod cache;
pub mod chip;
pub mod config;
pub mod cs8416;
pub mod error;
pub mod fpga;
pub mod input;
pub mod mixer;
pub mod pcm1792a;
pub mod power;
pub mod transport;
pub mod ui_sync;
pub mod volume;

// Re-export the board aggregate and its collaborators
pub use board::Board;
pub use cache::RegisterCache;
pub use chip::{BoardTopology, ChipDirectory, ChipHandle, ChipRole};
pub use config::{BoardVariant, ReceiverKind};
pub use error::{ConfigError, Error, TransportError, TransportErrorKind};
pub use input::InputSelection;
pub use power::{PowerSequencer, PowerState};
pub use transport::{I2cTransport, RegisterTransport};
pub use ui_sync::{NoUiSync, UiSync, UiSyncGuard};
pub use volume::{AttenuationController, AttenuationPlan, VolumeState};

// Re-export domain newtypes
pub use audio_types::{AttenuationDb, MixerVolume, RateFamily};
