//! PCM1792A DAC register addresses, encodings and a standalone driver.
//!
//! Reference: TI PCM1792A datasheet (SLES105), "Mode control registers".
//!
//! On the JEDAC board two PCM1792A chips run in dual-mono: each carries a
//! single channel but both of its internal attenuation registers are
//! written with the same value. The board core reaches them through
//! [`crate::RegisterCache`]; [`Pcm1792a`] drives one chip directly, the way
//! the front-panel microcontroller does on boards without a kernel driver.

use core::fmt;

use embedded_hal::i2c::I2c;

use crate::config::MAX_ATTENUATION_DB;

/// Register 16: left-channel digital attenuation (255 = 0 dB, 0 = mute).
pub const REG_VOL_LEFT: u8 = 0x10;
/// Register 17: right-channel digital attenuation (same encoding).
pub const REG_VOL_RIGHT: u8 = 0x11;
/// Register 18: audio format, attenuation load, soft mute.
pub const REG_FORMAT: u8 = 0x12;
/// Register 19: roll-off filter, attenuation rate, DAC operation.
pub const REG_MODE: u8 = 0x13;
/// Register 20: mono / channel select / oversampling.
pub const REG_STEREO: u8 = 0x14;

/// Format control at init: 24-bit left-justified, ATLD set (attenuation
/// registers take effect).
pub const FORMAT_INIT: u8 = 0xB0;
/// Mode control at init: slow roll-off, attenuation rate LRCK/8.
pub const MODE_INIT: u8 = 0x62;
/// Stereo control for the left chip: mono, left channel.
pub const STEREO_INIT_LEFT: u8 = 0x08;
/// Stereo control for the right chip: mono, right channel (CHSL).
pub const STEREO_INIT_RIGHT: u8 = 0x0C;

/// Register replay order after power-up.
///
/// Format goes before mode and stereo: re-initialising mode with a stale
/// format is audible.
pub const FLUSH_ORDER: [u8; 5] = [REG_FORMAT, REG_MODE, REG_STEREO, REG_VOL_LEFT, REG_VOL_RIGHT];

/// Encode a digital attenuation (dB) as a PCM1792A volume register value.
///
/// 0 dB → 255, each dB is two register steps, `MAX_ATTENUATION_DB` and
/// above → 0 (mute).
#[must_use]
pub const fn encode_attenuation(db: u8) -> u8 {
    if db >= MAX_ATTENUATION_DB {
        0
    } else {
        u8::MAX.saturating_sub(db.saturating_mul(2))
    }
}

/// Top of the 0..=64 volume scale used by [`Pcm1792a::set_volume64`].
pub const VOLUME64_MAX: u8 = 64;

/// Encode a 0..=64 volume (0 silent, 64 loudest, 1 dB steps).
///
/// Levels above 64 are clamped.
#[must_use]
pub const fn encode_volume64(level: u8) -> u8 {
    let level = if level > VOLUME64_MAX { VOLUME64_MAX } else { level };
    if level == 0 {
        0
    } else {
        // 2*64 + 127 = 255
        level.saturating_mul(2).saturating_add(127)
    }
}

// ── Mode word ────────────────────────────────────────────────────────────────

/// 32-bit operating mode covering registers 18 (LSB) to 21 (MSB).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mode(pub u32);

#[allow(missing_docs)]
impl Mode {
    pub const MUTE: u32 = 0x00_0001;
    pub const DME: u32 = 0x00_0002;
    pub const DMF: u32 = 0x00_000c;
    pub const DMF_NO: u32 = 0x00_0000;
    pub const DMF_48: u32 = 0x00_0004;
    pub const DMF_44: u32 = 0x00_0008;
    pub const DMF_32: u32 = 0x00_000c;
    pub const FMT: u32 = 0x00_0070;
    pub const FMT_16R: u32 = 0x00_0000;
    pub const FMT_20R: u32 = 0x00_0010;
    pub const FMT_24R: u32 = 0x00_0020;
    pub const FMT_24L: u32 = 0x00_0030;
    pub const FMT_16I: u32 = 0x00_0040;
    pub const FMT_24I: u32 = 0x00_0050;
    pub const ATLD: u32 = 0x00_0080;
    pub const INZD: u32 = 0x00_0100;
    pub const FLT: u32 = 0x00_0200;
    pub const DFMS: u32 = 0x00_0400;
    pub const OPE: u32 = 0x00_1000;
    pub const ATS: u32 = 0x00_6000;
    pub const ATS_LR1: u32 = 0x00_0000;
    pub const ATS_LR2: u32 = 0x00_2000;
    pub const ATS_LR4: u32 = 0x00_4000;
    pub const ATS_LR8: u32 = 0x00_6000;
    pub const OS: u32 = 0x03_0000;
    pub const OS_64: u32 = 0x00_0000;
    pub const OS_32: u32 = 0x01_0000;
    pub const OS_128: u32 = 0x02_0000;
    pub const CHSL: u32 = 0x04_0000;
    pub const MONO: u32 = 0x08_0000;
    pub const DFTH: u32 = 0x10_0000;
    pub const DSD: u32 = 0x20_0000;
    pub const SRST: u32 = 0x40_0000;
    pub const RSV: u32 = 0x80_0000;
}

impl Mode {
    /// Raw mode word.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Mode word as the four register bytes 18..=21.
    pub const fn to_registers(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

/// Multi-bit fields: mask, name when zero, names of the non-zero values.
const FIELDS: [(u32, &str, &[(u32, &str)]); 4] = [
    (
        Mode::DMF,
        "DmfNo",
        &[(Mode::DMF_48, "Dmf48"), (Mode::DMF_44, "Dmf44"), (Mode::DMF_32, "Dmf32")],
    ),
    (
        Mode::FMT,
        "Fmt16R",
        &[
            (Mode::FMT_20R, "Fmt20R"),
            (Mode::FMT_24R, "Fmt24R"),
            (Mode::FMT_24L, "Fmt24L"),
            (Mode::FMT_16I, "Fmt16I"),
            (Mode::FMT_24I, "Fmt24I"),
        ],
    ),
    (
        Mode::ATS,
        "AtsLr1",
        &[(Mode::ATS_LR2, "AtsLr2"), (Mode::ATS_LR4, "AtsLr4"), (Mode::ATS_LR8, "AtsLr8")],
    ),
    (Mode::OS, "Os64", &[(Mode::OS_32, "Os32"), (Mode::OS_128, "Os128")]),
];

/// Single-bit flags, ascending.
const FLAGS: [(u32, &str); 13] = [
    (Mode::MUTE, "Mute"),
    (Mode::DME, "Dme"),
    (Mode::ATLD, "Atld"),
    (Mode::INZD, "Inzd"),
    (Mode::FLT, "Flt"),
    (Mode::DFMS, "Dfms"),
    (Mode::OPE, "Ope"),
    (Mode::CHSL, "Right"),
    (Mode::MONO, "Mono"),
    (Mode::DFTH, "Dfth"),
    (Mode::DSD, "Dsd"),
    (Mode::SRST, "Srst"),
    (Mode::RSV, "Rsv"),
];

impl fmt::Display for Mode {
    /// Comma-separated field names, multi-bit fields first.
    ///
    /// Every multi-bit field is always named (its zero value has a name too);
    /// a field value with no name is skipped.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        for (mask, zero_name, values) in FIELDS {
            let field = self.0 & mask;
            if field == 0 {
                write!(f, "{sep}{zero_name}")?;
            } else if let Some((_, name)) = values.iter().find(|(v, _)| *v == field) {
                write!(f, "{sep}{name}")?;
            }
            sep = ",";
        }
        for (bit, name) in FLAGS {
            if self.0 & bit != 0 {
                write!(f, "{sep}{name}")?;
            }
        }
        Ok(())
    }
}

// ── Standalone driver ────────────────────────────────────────────────────────

/// One PCM1792A on a bus owned by this driver.
///
/// Uses the chip's register auto-increment: one transaction covers the whole
/// mode word, another both volume registers.
#[derive(Debug)]
pub struct Pcm1792a<I> {
    i2c: I,
    address: u8,
    mode: Mode,
}

impl<I: I2c> Pcm1792a<I> {
    /// Wrap `i2c` for the chip at 7-bit `address`. Nothing is written.
    pub fn new(i2c: I, address: u8) -> Self {
        Self {
            i2c,
            address,
            mode: Mode::default(),
        }
    }

    /// Write the full mode word to registers 18..=21.
    ///
    /// The mode is remembered even if the bus write fails.
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), I::Error> {
        self.mode = mode;
        info!("pcm1792a {}: mode {}", self.address, mode.bits());
        let [b0, b1, b2, b3] = mode.to_registers();
        self.i2c.write(self.address, &[REG_FORMAT, b0, b1, b2, b3])
    }

    /// Set both channels to `level` on the 0..=64 scale (clamped).
    pub fn set_volume64(&mut self, level: u8) -> Result<(), I::Error> {
        let value = encode_volume64(level);
        info!("pcm1792a {}: volume64 {}", self.address, level.min(VOLUME64_MAX));
        self.i2c.write(self.address, &[REG_VOL_LEFT, value, value])
    }

    /// Last mode passed to [`Self::set_mode`].
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// 7-bit bus address.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Give the bus back.
    pub fn release(self) -> I {
        self.i2c
    }
}
