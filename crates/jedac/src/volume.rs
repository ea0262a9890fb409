//! Stereo attenuation across the pad relay and the two mono DACs.
//!
//! A requested attenuation is split between the analog 20 dB pad and the
//! DACs' digital attenuators. With both channels at or below -20 dB the pad
//! takes 20 dB and the DACs get the remainder, so the digital stage keeps its
//! resolution at low listening levels. Full mute bypasses the pad.

use crate::audio_types::AttenuationDb;
use crate::cache::RegisterCache;
use crate::chip::ChipHandle;
use crate::config::{MAX_ATTENUATION_DB, PAD_THRESHOLD_DB};
use crate::error::Error;
use crate::pcm1792a::{encode_attenuation, REG_VOL_LEFT, REG_VOL_RIGHT};
use crate::transport::RegisterTransport;

/// How one stereo attenuation is realised in hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AttenuationPlan {
    /// Analog 20 dB pad engaged.
    pub pad: bool,
    /// Digital attenuation for the left DAC, in dB.
    pub digital_left: u8,
    /// Digital attenuation for the right DAC, in dB.
    pub digital_right: u8,
}

impl AttenuationPlan {
    /// Split `left`/`right` between pad and DACs.
    pub const fn new(left: AttenuationDb, right: AttenuationDb) -> Self {
        let (l, r) = (left.get(), right.get());
        let pad = l >= PAD_THRESHOLD_DB
            && r >= PAD_THRESHOLD_DB
            && !(l >= MAX_ATTENUATION_DB && r >= MAX_ATTENUATION_DB);
        if pad {
            Self {
                pad,
                digital_left: l.saturating_sub(PAD_THRESHOLD_DB),
                digital_right: r.saturating_sub(PAD_THRESHOLD_DB),
            }
        } else {
            Self {
                pad,
                digital_left: l,
                digital_right: r,
            }
        }
    }

    /// PCM1792A register value for the left DAC.
    pub const fn left_register(&self) -> u8 {
        encode_attenuation(self.digital_left)
    }

    /// PCM1792A register value for the right DAC.
    pub const fn right_register(&self) -> u8 {
        encode_attenuation(self.digital_right)
    }
}

/// Requested and last fully applied attenuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VolumeState {
    /// Requested left attenuation.
    pub left: AttenuationDb,
    /// Requested right attenuation.
    pub right: AttenuationDb,
    /// Pair whose dispatch last completed without error.
    pub applied: Option<(AttenuationDb, AttenuationDb)>,
}

impl VolumeState {
    /// Whether the pad is part of the requested attenuation.
    pub const fn pad_enabled(&self) -> bool {
        AttenuationPlan::new(self.left, self.right).pad
    }
}

impl Default for VolumeState {
    fn default() -> Self {
        Self {
            left: AttenuationDb::MUTE,
            right: AttenuationDb::MUTE,
            applied: None,
        }
    }
}

/// Owns [`VolumeState`]; decides when a dispatch is needed.
#[derive(Debug, Clone, Default)]
pub struct AttenuationController {
    state: VolumeState,
}

impl AttenuationController {
    /// Both channels muted, nothing applied yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> &VolumeState {
        &self.state
    }

    /// Requested attenuation, `(left_db, right_db)`.
    pub fn get_volume(&self) -> (u8, u8) {
        (self.state.left.get(), self.state.right.get())
    }

    /// Plan for the current request, whether or not it was applied.
    pub fn plan(&self) -> AttenuationPlan {
        AttenuationPlan::new(self.state.left, self.state.right)
    }

    /// Record a request (values clamped) and return what to dispatch, or
    /// `None` if exactly this pair is already applied.
    pub fn prepare(&mut self, left: u8, right: u8) -> Option<AttenuationPlan> {
        let (left, right) = (AttenuationDb::new(left), AttenuationDb::new(right));
        self.state.left = left;
        self.state.right = right;
        if self.state.applied == Some((left, right)) {
            return None;
        }
        Some(AttenuationPlan::new(left, right))
    }

    /// Mark the current request as applied.
    pub fn commit(&mut self) {
        self.state.applied = Some((self.state.left, self.state.right));
    }
}

/// Register that switches the analog pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadSwitch {
    /// Chip holding the pad register.
    pub chip: ChipHandle,
    /// Pad register address.
    pub reg: u8,
    /// Value written to engage the pad (0 disengages).
    pub on: u8,
}

/// Write `plan` to the hardware: pad first, then left DAC, then right DAC.
///
/// Each DAC gets its channel value in both volume registers (dual-mono).
/// A failing write does not stop the remaining ones; the first failure is
/// returned. Without `powered` the DAC values only go to their caches and
/// reach the chips on the next flush. A DAC write that fails is kept in the
/// cache as dirty.
pub fn dispatch<T: RegisterTransport>(
    plan: &AttenuationPlan,
    transport: &mut T,
    pad: PadSwitch,
    shadow: &mut RegisterCache,
    [left, right]: [&mut RegisterCache; 2],
    powered: bool,
) -> Result<(), Error> {
    let mut first: Option<Error> = None;
    let mut note = |r: Result<(), Error>| {
        if let Err(e) = r {
            first.get_or_insert(e);
        }
    };

    let pad_value = if plan.pad { pad.on } else { 0 };
    debug!("pad {}", plan.pad);
    note(
        transport
            .write(pad.chip, pad.reg, pad_value)
            .map_err(Error::from)
            .and_then(|()| shadow.store(pad.reg, pad_value).map_err(Error::from)),
    );

    for (cache, value) in [(left, plan.left_register()), (right, plan.right_register())] {
        for reg in [REG_VOL_LEFT, REG_VOL_RIGHT] {
            note(write_dac(transport, cache, reg, value, powered));
        }
    }

    first.map_or(Ok(()), Err)
}

fn write_dac<T: RegisterTransport>(
    transport: &mut T,
    cache: &mut RegisterCache,
    reg: u8,
    value: u8,
    powered: bool,
) -> Result<(), Error> {
    if !powered {
        return cache.set(reg, value).map_err(Error::from);
    }
    match transport.write(cache.chip(), reg, value) {
        Ok(()) => cache.store(reg, value).map_err(Error::from),
        Err(e) => {
            cache.set(reg, value)?;
            Err(Error::Transport(e))
        }
    }
}
