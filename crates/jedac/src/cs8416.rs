//! CS8416 S/PDIF receiver register map (software mode).
//!
//! Only the 5th-generation board runs the receiver in software mode; the
//! current board leaves S/PDIF decoding to the FPGA.

/// Control 1: mute on error, RMCK ratio.
pub const REG_CONTROL1: u8 = 0x01;
/// Control 2: GPO0 source selection.
pub const REG_CONTROL2: u8 = 0x02;
/// Control 3: GPO1/GPO2 source selection (drives the pad relay).
pub const REG_CONTROL3: u8 = 0x03;
/// Control 4: RUN bit, receiver mux and TX mux.
pub const REG_CONTROL4: u8 = 0x04;
/// Serial audio data format.
pub const REG_SERIAL_AUDIO_FORMAT: u8 = 0x05;
/// Receiver error mask.
pub const REG_RECEIVER_ERROR_MASK: u8 = 0x06;

/// Control 1: mute on receiver error, RMCK = 128 Fs.
pub const CONTROL1_INIT: u8 = 0x06;
/// Control 2: route RERR (unlock) to GPO0.
pub const CONTROL2_INIT: u8 = 0x05;
/// Control 3 value that drives GPO1/GPO2 high, closing the pad relay.
pub const CONTROL3_PAD_ON: u8 = 0xC0;
/// Serial format: 24-bit, left justified, master.
pub const SERIAL_AUDIO_FORMAT_INIT: u8 = 0x80;
/// Error mask: unmask the LOCK error only.
pub const RECEIVER_ERROR_MASK_INIT: u8 = 0x10;
/// Control 4 RUN bit.
pub const CONTROL4_RUN: u8 = 0x80;

/// Control 4 value: RUN with receiver mux and TX mux both on `channel`.
#[must_use]
pub const fn control4(channel: u8) -> u8 {
    let ch = channel & 0x07;
    CONTROL4_RUN | ch.wrapping_shl(3) | ch
}

/// Receiver channel selected by a Control 4 value.
#[must_use]
pub const fn control4_channel(value: u8) -> u8 {
    value & 0x07
}

/// Receiver init writes, in bus order. Control 4 goes last: it starts RUN.
#[must_use]
pub const fn init_sequence(channel: u8) -> [(u8, u8); 5] {
    [
        (REG_CONTROL1, CONTROL1_INIT),
        (REG_CONTROL2, CONTROL2_INIT),
        (REG_SERIAL_AUDIO_FORMAT, SERIAL_AUDIO_FORMAT_INIT),
        (REG_RECEIVER_ERROR_MASK, RECEIVER_ERROR_MASK_INIT),
        (REG_CONTROL4, control4(channel)),
    ]
}
