//! Board aggregate.
//!
//! [`Board`] owns everything one JEDAC card needs: the register transport,
//! the per-chip caches, the power sequencer, the volume model, the optional
//! UI-sync line and a delay provider. Every control-surface call goes
//! through it; callers serialise access (one `&mut Board` at a time).
//!
//! ## Lifecycle
//!
//! ```text
//! attach() ──> init() ──> stream_start() ──> ... ──> power_down() ──> detach()
//!                 │             │
//!                 │             └─ rail up, DAC caches flushed
//!                 └─ FPGA / receiver programmed, DAC settings staged
//! ```
//!
//! DAC registers written while the rail is not confirmed only land in the
//! caches. The FPGA is always powered and is written straight through; its
//! cache is a shadow of what the chip holds.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::StatefulOutputPin;

use crate::audio_types::RateFamily;
use crate::cache::RegisterCache;
use crate::chip::{ChipDirectory, ChipHandle, ChipRole};
use crate::config::{BoardVariant, ReceiverKind};
use crate::cs8416;
use crate::error::{ConfigError, Error};
use crate::fpga::{GPO0_CLKMASTER, REG_GPI0, REG_GPO0};
use crate::input::InputSelection;
use crate::pcm1792a::{
    FLUSH_ORDER, FORMAT_INIT, MODE_INIT, REG_FORMAT, REG_MODE, REG_STEREO, REG_VOL_LEFT,
    REG_VOL_RIGHT, STEREO_INIT_LEFT, STEREO_INIT_RIGHT,
};
use crate::power::{PowerSequencer, PowerState};
use crate::transport::RegisterTransport;
use crate::ui_sync::UiSync;
use crate::volume::{self, AttenuationController, PadSwitch};

/// Bus-facing half of the board, split out so the UI-sync guard can be held
/// while it is borrowed.
#[derive(Debug)]
struct Chipset<T> {
    transport: T,
    fpga: RegisterCache,
    dac_left: RegisterCache,
    dac_right: RegisterCache,
    power: PowerSequencer,
}

impl<T: RegisterTransport> Chipset<T> {
    /// Write an FPGA register and record it in the shadow.
    fn write_fpga(&mut self, reg: u8, value: u8) -> Result<(), Error> {
        self.transport.write(self.fpga.chip(), reg, value)?;
        self.fpga.store(reg, value)?;
        Ok(())
    }

    /// Current GPO0 as read from the FPGA. Refreshes the shadow.
    fn read_gpo0(&mut self) -> Result<u8, Error> {
        let value = self.transport.read(self.fpga.chip(), REG_GPO0)?;
        self.fpga.store(REG_GPO0, value)?;
        Ok(value)
    }

    /// Replay both DAC caches, left first.
    fn flush_dacs(&mut self) -> Result<(), Error> {
        self.dac_left.flush(&mut self.transport)?;
        self.dac_right.flush(&mut self.transport)?;
        Ok(())
    }
}

/// One JEDAC card.
///
/// - `T`: register transport (usually [`crate::I2cTransport`])
/// - `P`: UI-sync pin ([`crate::NoUiSync`] on boards without one)
/// - `D`: delay provider
#[derive(Debug)]
pub struct Board<T, P, D> {
    chips: Chipset<T>,
    ui_sync: Option<UiSync<P>>,
    delay: D,
    volume: AttenuationController,
    variant: BoardVariant,
    rate: Option<RateFamily>,
}

impl<T, P, D> Board<T, P, D>
where
    T: RegisterTransport,
    P: StatefulOutputPin,
    D: DelayNs,
{
    /// Resolve the chips and take ownership of the board resources.
    ///
    /// No register is touched; the UI-sync line (if any) is driven idle.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::TooManyInputs`] for an invalid `variant`
    /// - [`ConfigError::MissingChip`] if `directory` lacks a chip
    /// - [`ConfigError::MissingUiSync`] if the variant has a UI-sync line
    ///   but `ui_sync` is `None`
    pub fn attach<C: ChipDirectory + ?Sized>(
        directory: &C,
        variant: BoardVariant,
        transport: T,
        ui_sync: Option<P>,
        delay: D,
    ) -> Result<Self, Error> {
        variant.validate()?;
        let resolve = |role| directory.chip(role).ok_or(ConfigError::MissingChip(role));
        let fpga = resolve(ChipRole::Fpga)?;
        let dac_left = resolve(ChipRole::DacLeft)?;
        let dac_right = resolve(ChipRole::DacRight)?;
        if variant.has_ui_sync && ui_sync.is_none() {
            return Err(ConfigError::MissingUiSync.into());
        }

        debug!(
            "attach: fpga {} dac-left {} dac-right {}",
            fpga.address,
            dac_left.address,
            dac_right.address
        );
        Ok(Self {
            chips: Chipset {
                transport,
                fpga: RegisterCache::new(fpga),
                dac_left: RegisterCache::with_flush_order(dac_left, &FLUSH_ORDER),
                dac_right: RegisterCache::with_flush_order(dac_right, &FLUSH_ORDER),
                power: PowerSequencer::new(fpga),
            },
            ui_sync: ui_sync.map(UiSync::new),
            delay,
            volume: AttenuationController::new(),
            variant,
            rate: None,
        })
    }

    /// Program the FPGA / receiver and stage the DAC settings.
    ///
    /// GPO0 is set to the I2S input with the rail off, the receiver (if a
    /// CS8416) is started, the pad follows the current volume, and the DAC
    /// format, mode, stereo and volume registers are staged in the caches.
    /// They reach the DACs on the next [`Self::stream_start`].
    pub fn init(&mut self) -> Result<(), Error> {
        self.chips.write_fpga(REG_GPO0, GPO0_CLKMASTER)?;
        self.chips.power.reset();
        self.chips.dac_left.mark_dirty();
        self.chips.dac_right.mark_dirty();

        if let ReceiverKind::Cs8416 { default_input } = self.variant.receiver {
            for (reg, value) in cs8416::init_sequence(default_input) {
                self.chips.write_fpga(reg, value)?;
            }
        }

        let plan = self.volume.plan();
        let (pad_reg, pad_on) = self.variant.receiver.pad_register();
        self.chips.write_fpga(pad_reg, if plan.pad { pad_on } else { 0 })?;

        for (cache, stereo, value) in [
            (&mut self.chips.dac_left, STEREO_INIT_LEFT, plan.left_register()),
            (&mut self.chips.dac_right, STEREO_INIT_RIGHT, plan.right_register()),
        ] {
            cache.set(REG_FORMAT, FORMAT_INIT)?;
            cache.set(REG_MODE, MODE_INIT)?;
            cache.set(REG_STEREO, stereo)?;
            cache.set(REG_VOL_LEFT, value)?;
            cache.set(REG_VOL_RIGHT, value)?;
        }
        self.volume.commit();
        info!("board initialised");
        Ok(())
    }

    /// Bring the rail up and bring the DACs in line with their caches.
    ///
    /// The flush runs on the transition to `Confirmed`, or later if a cache
    /// is still dirty (an earlier flush failed).
    ///
    /// # Errors
    ///
    /// Power-up errors ([`Error::Timeout`], [`Error::Transport`]) and the
    /// first failing flush write.
    pub fn stream_start(&mut self) -> Result<(), Error> {
        self.stream_start_until(|| false)
    }

    /// [`Self::stream_start`] with a cancel check between power polls.
    pub fn stream_start_until<C: FnMut() -> bool>(&mut self, cancel: C) -> Result<(), Error> {
        let was_confirmed = self.chips.power.state().is_confirmed();
        let Chipset {
            transport,
            fpga,
            power,
            ..
        } = &mut self.chips;
        power.request_power_up_until(transport, fpga, &mut self.delay, cancel)?;

        if !was_confirmed || self.chips.dac_left.is_dirty() || self.chips.dac_right.is_dirty() {
            let _busy = self.ui_sync.as_mut().map(UiSync::engage);
            self.chips.flush_dacs()?;
        }
        Ok(())
    }

    /// Switch the rail off. The DACs lose their registers, so both caches
    /// are marked for replay on the next [`Self::stream_start`].
    pub fn power_down(&mut self) -> Result<(), Error> {
        self.chips.dac_left.mark_dirty();
        self.chips.dac_right.mark_dirty();
        let Chipset {
            transport,
            fpga,
            power,
            ..
        } = &mut self.chips;
        power.power_down(transport, fpga)
    }

    /// Power down and hand back the transport, UI-sync pin and delay.
    ///
    /// A failing power-down is logged; the resources are returned anyway.
    pub fn detach(mut self) -> (T, Option<P>, D) {
        if let Err(e) = self.power_down() {
            warn!("detach: power down failed: {}", e);
        }
        let pin = self.ui_sync.map(UiSync::release);
        (self.chips.transport, pin, self.delay)
    }

    /// Set the attenuation of both channels, in dB (0 loudest, 80 mute).
    ///
    /// Values above 80 are clamped. Repeating the pair that was last applied
    /// successfully does nothing. Otherwise the pad and all four DAC volume
    /// registers are written with the UI-sync line held busy; a failing write
    /// does not stop the others and the first failure is returned.
    pub fn set_volume(&mut self, left_db: u8, right_db: u8) -> Result<(), Error> {
        let Some(plan) = self.volume.prepare(left_db, right_db) else {
            return Ok(());
        };
        let (reg, on) = self.variant.receiver.pad_register();
        let pad = PadSwitch {
            chip: self.chips.fpga.chip(),
            reg,
            on,
        };
        let powered = self.chips.power.state().is_confirmed();

        let result = {
            let _busy = self.ui_sync.as_mut().map(UiSync::engage);
            let Chipset {
                transport,
                fpga,
                dac_left,
                dac_right,
                ..
            } = &mut self.chips;
            volume::dispatch(&plan, transport, pad, fpga, [dac_left, dac_right], powered)
        };
        if result.is_ok() {
            self.volume.commit();
        }
        result
    }

    /// Requested attenuation `(left_db, right_db)`.
    pub fn get_volume(&self) -> (u8, u8) {
        self.volume.get_volume()
    }

    /// Whether the analog pad is part of the requested attenuation.
    pub fn pad_enabled(&self) -> bool {
        self.volume.state().pad_enabled()
    }

    /// Select input `index`: 0 is I2S, `1..=spdif_inputs` the S/PDIF inputs.
    ///
    /// GPO0 is read back from the FPGA; only the clock nibble changes and
    /// nothing is written if it already matches. On a CS8416 board an
    /// S/PDIF selection also moves the receiver mux (Control 4) when it is
    /// on another channel.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InputOutOfRange`] (before any bus access) or the
    /// failing transport access.
    pub fn select_input(&mut self, index: u8) -> Result<(), Error> {
        self.switch_input(index).map(|_| ())
    }

    /// [`Self::select_input`], reporting whether any register was written.
    ///
    /// `false` means the hardware already had the input selected, even if
    /// [`Self::get_input`] said otherwise before the call.
    pub fn switch_input(&mut self, index: u8) -> Result<bool, Error> {
        let selection = InputSelection::from_index(index, self.variant.spdif_inputs)?;
        let current = self.chips.read_gpo0()?;
        let target = selection.apply(current, self.rate);
        let mux = self.receiver_mux(selection);
        if target == current && mux.is_none() {
            return Ok(false);
        }

        let _busy = self.ui_sync.as_mut().map(UiSync::engage);
        if let Some(value) = mux {
            self.chips.write_fpga(cs8416::REG_CONTROL4, value)?;
        }
        if target != current {
            self.chips.write_fpga(REG_GPO0, target)?;
        }
        info!("input {}", selection);
        Ok(true)
    }

    /// Control 4 value to write for `selection`, if the receiver mux has to
    /// move.
    fn receiver_mux(&self, selection: InputSelection) -> Option<u8> {
        match (self.variant.receiver, selection) {
            (ReceiverKind::Cs8416 { .. }, InputSelection::Spdif(channel)) => {
                let value = cs8416::control4(channel);
                (self.chips.fpga.get(cs8416::REG_CONTROL4) != Some(value)).then_some(value)
            }
            _ => None,
        }
    }

    /// Channel the CS8416 receiver mux is on, if the board has one and it
    /// was programmed.
    ///
    /// Independent of [`Self::get_input`]: after [`Self::init`] the receiver
    /// sits on its default channel while GPO0 still selects I2S.
    pub fn receiver_input(&self) -> Option<u8> {
        match self.variant.receiver {
            ReceiverKind::Cs8416 { .. } => self
                .chips
                .fpga
                .get(cs8416::REG_CONTROL4)
                .map(cs8416::control4_channel),
            ReceiverKind::Fpga => None,
        }
    }

    /// Input selected in the FPGA, as last written or read.
    pub fn get_input(&self) -> InputSelection {
        InputSelection::decode(self.chips.fpga.get(REG_GPO0).unwrap_or(GPO0_CLKMASTER))
    }

    /// Program the clock family for `hz`.
    ///
    /// In I2S master mode the rate bits go into GPO0 (no write if
    /// unchanged); in S/PDIF slave mode the rate is only remembered for the
    /// next switch to I2S. The FPGA status register is read back and logged.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnsupportedSampleRate`] or the failing transport access.
    pub fn set_sample_rate(&mut self, hz: u32) -> Result<(), Error> {
        let family = RateFamily::from_hz(hz)?;
        self.rate = Some(family);

        let current = self.chips.read_gpo0()?;
        let selection = InputSelection::decode(current);
        if selection == InputSelection::I2s {
            let target = selection.apply(current, self.rate);
            if target != current {
                let _busy = self.ui_sync.as_mut().map(UiSync::engage);
                self.chips.write_fpga(REG_GPO0, target)?;
            }
        }
        info!("sample rate {} Hz ({})", hz, selection);

        match self.chips.transport.read(self.chips.fpga.chip(), REG_GPI0) {
            Ok(status) => debug!("fpga status {}", status),
            Err(e) => warn!("fpga status read failed: {}", e),
        }
        Ok(())
    }

    /// Rail state.
    pub fn power_state(&self) -> PowerState {
        self.chips.power.state()
    }

    /// Cache of `role` (the FPGA one is a write-through shadow).
    pub fn cache(&self, role: ChipRole) -> &RegisterCache {
        match role {
            ChipRole::Fpga => &self.chips.fpga,
            ChipRole::DacLeft => &self.chips.dac_left,
            ChipRole::DacRight => &self.chips.dac_right,
        }
    }

    /// Handle of `role` as resolved at attach.
    pub fn chip(&self, role: ChipRole) -> ChipHandle {
        self.cache(role).chip()
    }

    /// UI-sync line, if the board has one.
    pub fn ui_sync(&self) -> Option<&UiSync<P>> {
        self.ui_sync.as_ref()
    }

    /// Board capabilities.
    pub fn variant(&self) -> &BoardVariant {
        &self.variant
    }

    /// Current sample-rate family, if one was set.
    pub fn rate(&self) -> Option<RateFamily> {
        self.rate
    }

    /// Transport, for inspection.
    pub fn transport(&self) -> &T {
        &self.chips.transport
    }

    /// Transport, for direct access to chips outside the core.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.chips.transport
    }
}
