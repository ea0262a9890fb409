//! UI-sync GPIO line.
//!
//! Open-drain line towards the front-panel controller: high (released) when
//! idle, pulled low while a burst of audible register changes is on the bus
//! so the controller can hold off its own DAC traffic and mute glitches.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin, StatefulOutputPin};

/// Owner of the UI-sync pin.
#[derive(Debug)]
pub struct UiSync<P> {
    pin: P,
    busy_at_entry: u32,
}

impl<P: StatefulOutputPin> UiSync<P> {
    /// Take the pin and drive it idle.
    pub fn new(mut pin: P) -> Self {
        if pin.set_high().is_err() {
            warn!("ui-sync: cannot drive line idle");
        }
        Self {
            pin,
            busy_at_entry: 0,
        }
    }

    /// Drive the line busy until the returned guard is dropped.
    ///
    /// A line already busy at entry is reported and counted, not fatal.
    pub fn engage(&mut self) -> UiSyncGuard<'_, P> {
        let was_busy = self.pin.is_set_low().unwrap_or(false);
        if was_busy {
            warn!("ui-sync: line already busy");
            self.busy_at_entry = self.busy_at_entry.saturating_add(1);
        }
        if self.pin.set_low().is_err() {
            warn!("ui-sync: cannot drive line busy");
        }
        UiSyncGuard {
            pin: &mut self.pin,
            was_busy,
        }
    }

    /// How many times [`Self::engage`] found the line already busy.
    pub fn busy_at_entry(&self) -> u32 {
        self.busy_at_entry
    }

    /// Run `body` with the line busy. The line returns to idle on every
    /// exit path, including early returns and errors inside `body`.
    pub fn with_ui_mute<R>(&mut self, body: impl FnOnce() -> R) -> R {
        let _busy = self.engage();
        body()
    }

    /// Give the pin back, idle.
    pub fn release(mut self) -> P {
        if self.pin.set_high().is_err() {
            warn!("ui-sync: cannot drive line idle");
        }
        self.pin
    }
}

/// Holds the UI-sync line busy; releases it on drop.
#[derive(Debug)]
#[must_use = "the line returns to idle as soon as the guard is dropped"]
pub struct UiSyncGuard<'a, P: StatefulOutputPin> {
    pin: &'a mut P,
    was_busy: bool,
}

impl<P: StatefulOutputPin> UiSyncGuard<'_, P> {
    /// The line was already busy when this guard engaged it.
    pub fn was_busy(&self) -> bool {
        self.was_busy
    }
}

impl<P: StatefulOutputPin> Drop for UiSyncGuard<'_, P> {
    fn drop(&mut self) {
        if self.pin.set_high().is_err() {
            warn!("ui-sync: cannot drive line idle");
        }
    }
}

/// Placeholder pin for boards without a UI-sync line.
///
/// Lets a `Board` without the line be named, e.g. `None::<NoUiSync>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUiSync;

impl ErrorType for NoUiSync {
    type Error = Infallible;
}

impl OutputPin for NoUiSync {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl StatefulOutputPin for NoUiSync {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }
}
