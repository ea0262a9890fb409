//! FPGA register map.
//!
//! The MACH XO2 sits on the same I2C address as the CS8416 receiver and
//! exposes two read/write output registers (GPO*) and two read-only input
//! registers (GPI*). The FPGA runs from the always-on standby supply, so it
//! answers on the bus even while the analog rail is down.

/// GPO0: clock configuration and rail power (read/write).
pub const REG_GPO0: u8 = 0x30;
/// GPO1: analog pad relay (read/write).
pub const REG_GPO1: u8 = 0x31;
/// GPI0: run-time FPGA status sample (read-only, volatile).
pub const REG_GPI0: u8 = 0x34;
/// GPI1: measured supply status (read-only, volatile).
pub const REG_GPI1: u8 = 0x35;

// ── GPO0 bitfields ───────────────────────────────────────────────────────────

/// Clock master: set selects the I2S input with the DAC as clock master,
/// clear selects one of the S/PDIF inputs with the DAC as clock slave.
pub const GPO0_CLKMASTER: u8 = 0x01;
/// Base oscillator select: set for the 48 kHz family crystal.
pub const GPO0_BASE48KHZ: u8 = 0x02;
/// Bits 3:2. Master mode: rate multiplier (1 = 44.1/48, 2 = 88.2/96,
/// 3 = 176.4/192 kHz). Slave mode: S/PDIF input index 0..=3.
pub const GPO0_CLKRATE: u8 = 0x0C;
/// Shift of the [`GPO0_CLKRATE`] field.
pub const GPO0_CLKRATE_SHIFT: u32 = 2;
/// All bits that concern clock configuration.
pub const GPO0_CLKMASK: u8 = 0x0F;
/// Analog rail relay: 1 switches the Vana supply on.
pub const GPO0_POWERUP: u8 = 0x80;

// ── GPO1 bitfields ───────────────────────────────────────────────────────────

/// 20 dB analog attenuation pad engaged.
pub const GPO1_ATT20DB: u8 = 0x01;

// ── GPI1 bitfields ───────────────────────────────────────────────────────────

/// Measured Vana present (follows GPO0_POWERUP after roughly 0.1 s).
pub const GPI1_ANAPWR: u8 = 0x01;
