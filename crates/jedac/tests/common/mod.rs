//! Recording fakes shared by the integration tests.
#![allow(dead_code)]
#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin, StatefulOutputPin};
use jedac::fpga::{GPI1_ANAPWR, GPO0_POWERUP, REG_GPI1, REG_GPO0};
use jedac::{
    Board, BoardTopology, BoardVariant, ChipHandle, ChipRole, RegisterTransport, TransportError,
    TransportErrorKind,
};

/// One bus access that reached the chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Write { chip: ChipRole, reg: u8, value: u8 },
    Read { chip: ChipRole, reg: u8 },
}

/// Register-level model of the board's chips.
///
/// The GPI1 rail bit reads set from the `confirm_at`-th status read on, as
/// long as GPO0 requests power.
#[derive(Debug, Default)]
pub struct FakeBus {
    pub ops: Vec<Op>,
    pub failed: Vec<Op>,
    regs: HashMap<(ChipRole, u8), u8>,
    confirm_at: Option<u32>,
    status_reads: u32,
    fail_writes: Vec<(ChipRole, u8)>,
    fail_reads: Vec<(ChipRole, u8)>,
}

impl FakeBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rail confirms on the `n`-th status read.
    pub fn confirming_at(n: u32) -> Self {
        Self {
            confirm_at: Some(n),
            ..Self::default()
        }
    }

    /// Rail never confirms.
    pub fn never_confirming() -> Self {
        Self::default()
    }

    pub fn fail_write(&mut self, chip: ChipRole, reg: u8) {
        self.fail_writes.push((chip, reg));
    }

    pub fn fail_read(&mut self, chip: ChipRole, reg: u8) {
        self.fail_reads.push((chip, reg));
    }

    pub fn heal(&mut self) {
        self.fail_writes.clear();
        self.fail_reads.clear();
    }

    pub fn set_reg(&mut self, chip: ChipRole, reg: u8, value: u8) {
        self.regs.insert((chip, reg), value);
    }

    pub fn reg(&self, chip: ChipRole, reg: u8) -> Option<u8> {
        self.regs.get(&(chip, reg)).copied()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
        self.failed.clear();
    }

    /// Successful writes, in bus order.
    pub fn writes(&self) -> Vec<(ChipRole, u8, u8)> {
        self.ops
            .iter()
            .filter_map(|op| match *op {
                Op::Write { chip, reg, value } => Some((chip, reg, value)),
                Op::Read { .. } => None,
            })
            .collect()
    }

    /// Successful writes to `chip`, as `(reg, value)`.
    pub fn writes_to(&self, chip: ChipRole) -> Vec<(u8, u8)> {
        self.writes()
            .into_iter()
            .filter(|(c, _, _)| *c == chip)
            .map(|(_, r, v)| (r, v))
            .collect()
    }

    pub fn reads_of(&self, chip: ChipRole, reg: u8) -> usize {
        self.ops
            .iter()
            .filter(|op| **op == Op::Read { chip, reg })
            .count()
    }
}

impl RegisterTransport for FakeBus {
    fn write(&mut self, chip: ChipHandle, reg: u8, value: u8) -> Result<(), TransportError> {
        let op = Op::Write {
            chip: chip.role,
            reg,
            value,
        };
        if self.fail_writes.contains(&(chip.role, reg)) {
            self.failed.push(op);
            return Err(TransportError::new(chip.role, reg, TransportErrorKind::Transient));
        }
        self.ops.push(op);
        self.regs.insert((chip.role, reg), value);
        Ok(())
    }

    fn read(&mut self, chip: ChipHandle, reg: u8) -> Result<u8, TransportError> {
        let op = Op::Read {
            chip: chip.role,
            reg,
        };
        if self.fail_reads.contains(&(chip.role, reg)) {
            self.failed.push(op);
            return Err(TransportError::new(chip.role, reg, TransportErrorKind::Permanent));
        }
        self.ops.push(op);
        if chip.role == ChipRole::Fpga && reg == REG_GPI1 {
            self.status_reads += 1;
            let requested = self.reg(ChipRole::Fpga, REG_GPO0).unwrap_or(0) & GPO0_POWERUP != 0;
            let up = requested && self.confirm_at.is_some_and(|n| self.status_reads >= n);
            return Ok(if up { GPI1_ANAPWR } else { 0 });
        }
        Ok(self.reg(chip.role, reg).unwrap_or(0))
    }
}

/// Delay that only records what was asked of it, in ms.
#[derive(Debug, Default, Clone)]
pub struct RecordingDelay {
    pub ms: Vec<u32>,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.ms.push(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.ms.push(ms);
    }
}

/// Level history of a pin, shared with the test body.
#[derive(Debug, Default)]
pub struct PinLog {
    pub low: bool,
    /// `true` for every transition to high, `false` for low.
    pub edges: Vec<bool>,
}

/// Output pin whose levels stay observable after the board took it.
#[derive(Debug, Clone, Default)]
pub struct RecordingPin(pub Rc<RefCell<PinLog>>);

impl RecordingPin {
    pub fn is_low(&self) -> bool {
        self.0.borrow().low
    }

    pub fn edges(&self) -> Vec<bool> {
        self.0.borrow().edges.clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().edges.clear();
    }

    pub fn force_low(&self) {
        self.0.borrow_mut().low = true;
    }
}

impl ErrorType for RecordingPin {
    type Error = Infallible;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        let mut log = self.0.borrow_mut();
        log.low = true;
        log.edges.push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        let mut log = self.0.borrow_mut();
        log.low = false;
        log.edges.push(true);
        Ok(())
    }
}

impl StatefulOutputPin for RecordingPin {
    fn is_set_high(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0.borrow().low)
    }

    fn is_set_low(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.borrow().low)
    }
}

pub type TestBoard = Board<FakeBus, RecordingPin, RecordingDelay>;

/// Attached (not initialised) JEDAC board on `bus`, plus its UI-sync pin.
pub fn attach(bus: FakeBus) -> (TestBoard, RecordingPin) {
    let pin = RecordingPin::default();
    let board = Board::attach(
        &BoardTopology::standard(),
        BoardVariant::jedac(),
        bus,
        Some(pin.clone()),
        RecordingDelay::default(),
    )
    .unwrap();
    (board, pin)
}

/// Initialised board with the rail confirmed on the first poll and the
/// bus log cleared.
pub fn running() -> (TestBoard, RecordingPin) {
    let (mut board, pin) = attach(FakeBus::confirming_at(1));
    board.init().unwrap();
    board.stream_start().unwrap();
    board.transport_mut().clear();
    pin.clear();
    (board, pin)
}
