//! Input and sample-rate selection through FPGA GPO0.
#![allow(clippy::unwrap_used)]

mod common;

use common::{attach, running, FakeBus, RecordingDelay};
use jedac::cs8416;
use jedac::fpga::{REG_GPI0, REG_GPO0};
use jedac::mixer::{get_input_source, put_input_source};
use jedac::{
    Board, BoardTopology, BoardVariant, ChipRole, ConfigError, Error, InputSelection, NoUiSync,
};

fn jedac5() -> Board<FakeBus, NoUiSync, RecordingDelay> {
    let mut board = Board::attach(
        &BoardTopology::standard(),
        BoardVariant::jedac5(),
        FakeBus::new(),
        None,
        RecordingDelay::default(),
    )
    .unwrap();
    board.init().unwrap();
    board.transport_mut().clear();
    board
}

#[test]
fn selecting_current_input_writes_nothing() {
    let (mut board, pin) = running();

    board.select_input(0).unwrap();

    assert!(board.transport().writes().is_empty());
    assert_eq!(board.transport().reads_of(ChipRole::Fpga, REG_GPO0), 1);
    assert!(pin.edges().is_empty());
}

#[test]
fn spdif_selection_keeps_power_bit() {
    let (mut board, _pin) = running();

    board.select_input(2).unwrap();

    // rail on, clock slave, slave input 1
    assert_eq!(board.transport().writes(), [(ChipRole::Fpga, REG_GPO0, 0x84)]);
    assert_eq!(board.get_input(), InputSelection::Spdif(1));
}

#[test]
fn out_of_range_index_touches_nothing() {
    let (mut board, _pin) = running();

    assert_eq!(
        board.select_input(5),
        Err(Error::Configuration(ConfigError::InputOutOfRange { index: 5, inputs: 4 }))
    );
    assert!(board.transport().ops.is_empty());
}

#[test]
fn selection_follows_hardware_readback() {
    let (mut board, _pin) = running();
    // someone else switched the FPGA to S/PDIF 3
    board.transport_mut().set_reg(ChipRole::Fpga, REG_GPO0, 0x88);

    board.select_input(3).unwrap();

    assert!(board.transport().writes().is_empty());
    assert_eq!(board.get_input(), InputSelection::Spdif(2));
}

#[test]
fn sample_rate_programs_master_clock() {
    let (mut board, _pin) = running();

    board.set_sample_rate(96_000).unwrap();

    // rail | base 48k | x2 | clock master
    assert_eq!(board.transport().writes(), [(ChipRole::Fpga, REG_GPO0, 0x8B)]);
    assert_eq!(board.transport().reads_of(ChipRole::Fpga, REG_GPI0), 1);
}

#[test]
fn sample_rate_in_slave_mode_is_deferred() {
    let (mut board, _pin) = running();
    board.select_input(1).unwrap();
    board.transport_mut().clear();

    board.set_sample_rate(176_400).unwrap();
    assert!(board.transport().writes().is_empty());

    board.select_input(0).unwrap();
    assert_eq!(board.transport().writes(), [(ChipRole::Fpga, REG_GPO0, 0x8D)]);
}

#[test]
fn unsupported_sample_rate_is_rejected() {
    let (mut board, _pin) = running();

    assert_eq!(
        board.set_sample_rate(32_000),
        Err(Error::Configuration(ConfigError::UnsupportedSampleRate(32_000)))
    );
    assert!(board.transport().ops.is_empty());
}

#[test]
fn mixer_reports_change() {
    let (mut board, _pin) = running();

    assert!(put_input_source(&mut board, 4).unwrap());
    assert!(!put_input_source(&mut board, 4).unwrap());
    assert_eq!(get_input_source(&board), 4);
}

#[test]
fn mixer_reports_no_change_when_hardware_already_matches() {
    let mut bus = FakeBus::confirming_at(1);
    // rail on, slave, S/PDIF input 4
    bus.set_reg(ChipRole::Fpga, REG_GPO0, 0x8C);
    let (mut board, pin) = attach(bus);

    assert!(!put_input_source(&mut board, 4).unwrap());

    assert!(board.transport().writes().is_empty());
    assert_eq!(get_input_source(&board), 4);
    assert!(!pin.edges().contains(&false));
}

#[test]
fn switch_input_reports_writes() {
    let (mut board, _pin) = running();

    assert!(board.switch_input(1).unwrap());
    assert!(!board.switch_input(1).unwrap());
}

#[test]
fn receiver_mux_follows_spdif_selection() {
    let mut board = jedac5();
    assert_eq!(board.receiver_input(), Some(3));
    assert_eq!(board.get_input(), InputSelection::I2s);

    board.select_input(2).unwrap();

    assert_eq!(
        board.transport().writes_to(ChipRole::Fpga),
        [(cs8416::REG_CONTROL4, cs8416::control4(1)), (REG_GPO0, 0x04)]
    );
    assert_eq!(board.receiver_input(), Some(1));
    assert_eq!(board.get_input(), InputSelection::Spdif(1));
}

#[test]
fn receiver_already_on_channel_only_switches_gpo0() {
    let mut board = jedac5();

    board.select_input(4).unwrap();

    assert_eq!(board.transport().writes_to(ChipRole::Fpga), [(REG_GPO0, 0x0C)]);
    assert_eq!(board.receiver_input(), Some(3));
}

#[test]
fn i2s_selection_leaves_receiver_alone() {
    let mut board = jedac5();
    board.select_input(2).unwrap();
    board.transport_mut().clear();

    board.select_input(0).unwrap();

    assert_eq!(board.transport().writes_to(ChipRole::Fpga), [(REG_GPO0, 0x01)]);
    assert_eq!(board.receiver_input(), Some(1));
}

#[test]
fn fpga_board_has_no_receiver_mux() {
    let (mut board, _pin) = running();

    board.select_input(3).unwrap();

    assert_eq!(board.receiver_input(), None);
    assert!(board
        .transport()
        .writes_to(ChipRole::Fpga)
        .iter()
        .all(|&(reg, _)| reg == REG_GPO0));
}
