//! Integration tests for the serial port and link-cable seam.

mod common;

use common::boot_with;
use ferroboy_core::serial::{LinkPort, NullLinkPort, Serial};
use std::collections::VecDeque;

/// A link port that records all bytes sent and returns pre-programmed
/// responses.
struct RecordingLinkPort {
    sent: Vec<u8>,
    responses: VecDeque<u8>,
}

impl RecordingLinkPort {
    fn new(responses: impl IntoIterator<Item = u8>) -> Self {
        Self {
            sent: Vec::new(),
            responses: responses.into_iter().collect(),
        }
    }
}

impl LinkPort for RecordingLinkPort {
    fn transfer(&mut self, byte: u8) -> u8 {
        self.sent.push(byte);
        self.responses.pop_front().unwrap_or(0xFF)
    }
}

#[test]
fn null_link_port_returns_ff_by_default() {
    let mut port = NullLinkPort::new(false);
    assert_eq!(port.transfer(0x42), 0xFF);
    assert_eq!(port.transfer(0x00), 0xFF);
}

#[test]
fn null_link_port_loopback_echoes_byte() {
    let mut port = NullLinkPort::new(true);
    assert_eq!(port.transfer(0x42), 0x42);
    assert_eq!(port.transfer(0xAB), 0xAB);
}

#[test]
fn serial_sb_readable_writable() {
    let mut serial = Serial::new();
    let mut if_reg = 0u8;

    serial.write(0xFF01, 0x42, &mut if_reg);
    assert_eq!(serial.read(0xFF01), 0x42);

    serial.write(0xFF01, 0xAB, &mut if_reg);
    assert_eq!(serial.read(0xFF01), 0xAB);
}

#[test]
fn transfer_exchanges_bytes_with_partner() {
    let mut serial = Serial::new();
    serial.connect(Box::new(RecordingLinkPort::new([0x99])));

    let mut if_reg = 0u8;
    serial.write(0xFF01, 0x42, &mut if_reg);
    serial.write(0xFF02, 0x81, &mut if_reg);

    // SB now holds the partner's byte, the transfer flag dropped, and
    // the Serial interrupt was requested.
    assert_eq!(serial.read(0xFF01), 0x99);
    assert_eq!(serial.read(0xFF02) & 0x80, 0);
    assert_eq!(if_reg & 0x08, 0x08);
    assert_eq!(serial.take_output(), vec![0x42]);
    assert!(serial.take_output().is_empty());
}

#[test]
fn cpu_writes_drive_serial_output() {
    // LD A,'F'; LDH (SB),A; LD A,0x81; LDH (SC),A
    let mut gb = boot_with(&[0x3E, b'F', 0xE0, 0x01, 0x3E, 0x81, 0xE0, 0x02]);
    for _ in 0..4 {
        gb.step();
    }
    assert_eq!(gb.take_serial(), vec![b'F']);
    assert_ne!(gb.mmu.read_byte(0xFF0F) & 0x08, 0);
    // The dead line shifts in all ones.
    assert_eq!(gb.mmu.read_byte(0xFF01), 0xFF);
}

#[test]
fn serial_interrupt_dispatches_when_enabled() {
    let mut gb = boot_with(&[0x3E, 0x42, 0xE0, 0x01, 0x3E, 0x81, 0xE0, 0x02, 0x00]);
    gb.cpu.ime = true;
    gb.mmu.write_byte(0xFFFF, 0x08);
    for _ in 0..4 {
        gb.step();
    }
    assert_eq!(gb.cpu.regs.pc, 0x0058);
    assert_eq!(gb.mmu.read_byte(0xFF0F) & 0x08, 0);
}

#[test]
fn loopback_port_round_trips_sb() {
    let mut serial = Serial::new();
    serial.connect(Box::new(NullLinkPort::new(true)));

    let mut if_reg = 0u8;
    serial.write(0xFF01, 0x5A, &mut if_reg);
    serial.write(0xFF02, 0x81, &mut if_reg);
    assert_eq!(serial.read(0xFF01), 0x5A);
}
