//! Analog rail power sequencing.
//!
//! The DAC chips sit on a switched analog supply. The FPGA (on the always-on
//! supply) switches it with GPO0 bit 7 and reports the measured rail in GPI1
//! bit 0, roughly 0.1 s later.
//!
//! ```text
//!                  request_power_up()
//! [Standby] ───────────────────────────> [Requested] ──bit set──> [Confirmed]
//!     ^     write fails                      │   │
//!     │  ┌─────────────> [TransportError] <──┘   └──60 polls / cancel──> [TimedOut]
//!     │  │                                                                   │
//!     └──┴──────────────── power_down() (from any state) ───────────────────┘
//! ```
//!
//! `TimedOut` and `TransportError` are left by calling `request_power_up()`
//! again; `Confirmed` stays until `power_down()`. A call never returns with
//! the state still `Requested`.

use embedded_hal::delay::DelayNs;

use crate::cache::RegisterCache;
use crate::chip::ChipHandle;
use crate::config::{POWER_POLL_INTERVAL_MS, POWER_POLL_MAX, POWER_SETTLE_MS};
use crate::error::{Error, TransportError};
use crate::fpga::{GPI1_ANAPWR, GPO0_POWERUP, REG_GPI1, REG_GPO0};
use crate::transport::RegisterTransport;

/// Rail state as last observed by the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    /// Rail off (or never requested).
    #[default]
    Standby,
    /// Rail requested, confirmation pending.
    Requested,
    /// Rail measured present.
    Confirmed,
    /// Rail not confirmed within the poll budget, or polling was cancelled.
    TimedOut,
    /// A bus access failed while requesting or polling.
    TransportError,
}

impl PowerState {
    /// Whether DAC registers may be written directly.
    pub const fn is_confirmed(self) -> bool {
        matches!(self, Self::Confirmed)
    }
}

/// One per board: drives the rail bit and tracks [`PowerState`].
///
/// GPO0 also carries the clock configuration, so every write goes through
/// the FPGA shadow cache to keep those bits intact.
#[derive(Debug, Clone)]
pub struct PowerSequencer {
    fpga: ChipHandle,
    state: PowerState,
}

impl PowerSequencer {
    /// Sequencer for the rail controlled by `fpga`, starting in `Standby`.
    pub const fn new(fpga: ChipHandle) -> Self {
        Self {
            fpga,
            state: PowerState::Standby,
        }
    }

    /// Current state.
    pub fn state(&self) -> PowerState {
        self.state
    }

    /// Request the rail and poll until it is confirmed.
    ///
    /// Returns the number of status reads it took (0 if the rail was already
    /// confirmed, in which case nothing touches the bus). When more than one
    /// read was needed a settle delay follows the confirmation.
    ///
    /// # Errors
    ///
    /// - [`Error::Transport`] if the request write or a status read fails,
    ///   or GPO0 had to be read back (empty shadow) and that read failed
    /// - [`Error::Timeout`] after `POWER_POLL_MAX` reads without confirmation
    pub fn request_power_up<T, D>(
        &mut self,
        transport: &mut T,
        shadow: &mut RegisterCache,
        delay: &mut D,
    ) -> Result<u32, Error>
    where
        T: RegisterTransport,
        D: DelayNs,
    {
        self.request_power_up_until(transport, shadow, delay, || false)
    }

    /// [`Self::request_power_up`] with a cancel check before every poll
    /// after the first.
    ///
    /// Cancellation resolves to `TimedOut` and reports [`Error::Timeout`]
    /// with the reads done so far.
    pub fn request_power_up_until<T, D, C>(
        &mut self,
        transport: &mut T,
        shadow: &mut RegisterCache,
        delay: &mut D,
        mut cancel: C,
    ) -> Result<u32, Error>
    where
        T: RegisterTransport,
        D: DelayNs,
        C: FnMut() -> bool,
    {
        if self.state.is_confirmed() {
            return Ok(0);
        }

        let value = match self
            .current_gpo0(transport, shadow)
            .and_then(|gpo0| {
                let value = gpo0 | GPO0_POWERUP;
                transport.write(self.fpga, REG_GPO0, value).map(|()| value)
            }) {
            Ok(value) => value,
            Err(e) => {
                self.state = PowerState::TransportError;
                return Err(e.into());
            }
        };
        shadow.store(REG_GPO0, value)?;
        self.state = PowerState::Requested;

        let mut polls: u32 = 0;
        while polls < POWER_POLL_MAX {
            if polls > 0 {
                if cancel() {
                    warn!("power-up cancelled after {} polls", polls);
                    self.state = PowerState::TimedOut;
                    return Err(Error::Timeout { polls });
                }
                delay.delay_ms(POWER_POLL_INTERVAL_MS);
            }
            polls = polls.saturating_add(1);
            let status = match transport.read(self.fpga, REG_GPI1) {
                Ok(status) => status,
                Err(e) => {
                    self.state = PowerState::TransportError;
                    return Err(e.into());
                }
            };
            if status & GPI1_ANAPWR != 0 {
                self.state = PowerState::Confirmed;
                if polls > 1 {
                    delay.delay_ms(POWER_SETTLE_MS);
                }
                info!("analog rail confirmed after {} polls", polls);
                return Ok(polls);
            }
        }

        warn!("analog rail not confirmed after {} polls", polls);
        self.state = PowerState::TimedOut;
        Err(Error::Timeout { polls })
    }

    /// Return to `Standby` after the rail bit was cleared by a direct GPO0
    /// write.
    pub fn reset(&mut self) {
        self.state = PowerState::Standby;
    }

    /// Switch the rail off. The state becomes `Standby` even if the write
    /// fails.
    pub fn power_down<T: RegisterTransport>(
        &mut self,
        transport: &mut T,
        shadow: &mut RegisterCache,
    ) -> Result<(), Error> {
        self.state = PowerState::Standby;
        let value = self.current_gpo0(transport, shadow)? & !GPO0_POWERUP;
        transport.write(self.fpga, REG_GPO0, value)?;
        shadow.store(REG_GPO0, value)?;
        info!("analog rail off");
        Ok(())
    }

    /// GPO0 as held in the shadow, or read from the FPGA if the shadow has
    /// not seen it yet. The other bits of GPO0 must survive a rail change.
    fn current_gpo0<T: RegisterTransport>(
        &self,
        transport: &mut T,
        shadow: &RegisterCache,
    ) -> Result<u8, TransportError> {
        match shadow.get(REG_GPO0) {
            Some(value) => Ok(value),
            None => transport.read(self.fpga, REG_GPO0),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::arithmetic_side_effects)]

    use super::*;
    use crate::chip::ChipRole;
    use crate::error::{TransportError, TransportErrorKind};

    const FPGA: ChipHandle = ChipHandle::new(ChipRole::Fpga, 0x20);

    /// Rail status that turns on at the `confirm_at`-th read.
    struct Rail {
        confirm_at: Option<u32>,
        reads: u32,
        writes: std::vec::Vec<(u8, u8)>,
        fail_write: bool,
    }

    impl Rail {
        fn new(confirm_at: Option<u32>) -> Self {
            Self {
                confirm_at,
                reads: 0,
                writes: std::vec::Vec::new(),
                fail_write: false,
            }
        }
    }

    impl RegisterTransport for Rail {
        fn write(&mut self, chip: ChipHandle, reg: u8, value: u8) -> Result<(), TransportError> {
            if self.fail_write {
                return Err(TransportError::new(chip.role, reg, TransportErrorKind::Transient));
            }
            self.writes.push((reg, value));
            Ok(())
        }

        fn read(&mut self, _chip: ChipHandle, reg: u8) -> Result<u8, TransportError> {
            if reg != REG_GPI1 {
                return Ok(0);
            }
            self.reads += 1;
            Ok(u8::from(self.confirm_at.is_some_and(|n| self.reads >= n)))
        }
    }

    #[derive(Default)]
    struct Sleeps(std::vec::Vec<u32>);

    impl DelayNs for Sleeps {
        fn delay_ns(&mut self, ns: u32) {
            self.0.push(ns / 1_000_000);
        }
        fn delay_ms(&mut self, ms: u32) {
            self.0.push(ms);
        }
    }

    #[test]
    fn already_up_needs_no_settle() {
        let mut rail = Rail::new(Some(1));
        let mut shadow = RegisterCache::new(FPGA);
        let mut sleeps = Sleeps::default();
        let mut seq = PowerSequencer::new(FPGA);
        assert_eq!(seq.request_power_up(&mut rail, &mut shadow, &mut sleeps), Ok(1));
        assert!(sleeps.0.is_empty());
        assert_eq!(seq.state(), PowerState::Confirmed);
    }

    #[test]
    fn confirmed_is_sticky_and_silent() {
        let mut rail = Rail::new(Some(1));
        let mut shadow = RegisterCache::new(FPGA);
        let mut sleeps = Sleeps::default();
        let mut seq = PowerSequencer::new(FPGA);
        assert!(seq.request_power_up(&mut rail, &mut shadow, &mut sleeps).is_ok());
        assert_eq!(seq.request_power_up(&mut rail, &mut shadow, &mut sleeps), Ok(0));
        assert_eq!(rail.writes.len(), 1);
        assert_eq!(rail.reads, 1);
    }

    #[test]
    fn request_preserves_clock_bits() {
        let mut rail = Rail::new(Some(1));
        let mut shadow = RegisterCache::new(FPGA);
        assert_eq!(shadow.store(REG_GPO0, 0x0B), Ok(()));
        let mut seq = PowerSequencer::new(FPGA);
        assert!(seq
            .request_power_up(&mut rail, &mut shadow, &mut Sleeps::default())
            .is_ok());
        assert_eq!(rail.writes, [(REG_GPO0, 0x8B)]);
        assert_eq!(shadow.get(REG_GPO0), Some(0x8B));
    }

    #[test]
    fn failed_request_write_skips_polling() {
        let mut rail = Rail::new(Some(1));
        rail.fail_write = true;
        let mut seq = PowerSequencer::new(FPGA);
        let r = seq.request_power_up(&mut rail, &mut RegisterCache::new(FPGA), &mut Sleeps::default());
        assert!(matches!(r, Err(Error::Transport(_))));
        assert_eq!(rail.reads, 0);
        assert_eq!(seq.state(), PowerState::TransportError);
    }

    #[test]
    fn cancel_resolves_to_timed_out() {
        let mut rail = Rail::new(None);
        let mut seq = PowerSequencer::new(FPGA);
        let mut checks = 0;
        let r = seq.request_power_up_until(
            &mut rail,
            &mut RegisterCache::new(FPGA),
            &mut Sleeps::default(),
            || {
                checks += 1;
                checks >= 4
            },
        );
        assert_eq!(r, Err(Error::Timeout { polls: 4 }));
        assert_eq!(rail.reads, 4);
        assert_eq!(seq.state(), PowerState::TimedOut);
    }

    #[test]
    fn power_down_clears_only_rail_bit() {
        let mut rail = Rail::new(Some(1));
        let mut shadow = RegisterCache::new(FPGA);
        assert_eq!(shadow.store(REG_GPO0, 0x87), Ok(()));
        let mut seq = PowerSequencer::new(FPGA);
        assert_eq!(seq.power_down(&mut rail, &mut shadow), Ok(()));
        assert_eq!(rail.writes, [(REG_GPO0, 0x07)]);
        assert_eq!(seq.state(), PowerState::Standby);
    }
}
