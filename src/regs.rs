//! Register-level bus adapter
//!
//! [`RegisterBus`] implements [`BusAdapter`] on top of the register interface of the classic
//! two-status-register I2C master (control register CR1, status registers SR1 and SR2, data
//! register DR). Implement [`I2cRegisters`] for your peripheral's register block, typically as a
//! thin wrapper over its PAC, and wrap it in a `RegisterBus`.
//!
//! Event checks follow the peripheral's clearing rules:
//!
//! * reading SR1 and then SR2 clears the ADDR flag, so [`BusAdapter::event_ready`] consumes
//!   address events;
//! * [`BusAdapter::address_flag_set`] reads SR1 alone and leaves ADDR latched;
//! * AF (acknowledge failure) is cleared by writing 0 to it.

use crate::bus::{BusAdapter, BusEvent, Direction};
use bitflags::bitflags;

bitflags! {
    /// Control register 1 bits used by the adapter.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Cr1: u16 {
        /// Peripheral enable
        const PE = 1 << 0;
        /// Start generation
        const START = 1 << 8;
        /// Stop generation
        const STOP = 1 << 9;
        /// Acknowledge enable
        const ACK = 1 << 10;
        /// Acknowledge/PEC position
        const POS = 1 << 11;
        /// Software reset
        const SWRST = 1 << 15;
    }
}

bitflags! {
    /// Status register 1.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Sr1: u16 {
        /// Start bit generated
        const SB = 1 << 0;
        /// Address sent and matched
        const ADDR = 1 << 1;
        /// Byte transfer finished
        const BTF = 1 << 2;
        /// 10-bit header sent
        const ADD10 = 1 << 3;
        /// Stop detected (slave)
        const STOPF = 1 << 4;
        /// Data register not empty
        const RXNE = 1 << 6;
        /// Data register empty
        const TXE = 1 << 7;
        /// Bus error
        const BERR = 1 << 8;
        /// Arbitration lost
        const ARLO = 1 << 9;
        /// Acknowledge failure
        const AF = 1 << 10;
        /// Overrun/underrun
        const OVR = 1 << 11;
        /// PEC error in reception
        const PECERR = 1 << 12;
        /// Timeout or Tlow error
        const TIMEOUT = 1 << 14;
        /// SMBus alert
        const SMBALERT = 1 << 15;
    }
}

bitflags! {
    /// Status register 2.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Sr2: u16 {
        /// Master mode
        const MSL = 1 << 0;
        /// Bus busy
        const BUSY = 1 << 1;
        /// Transmitter (as opposed to receiver)
        const TRA = 1 << 2;
        /// General call address received
        const GENCALL = 1 << 4;
        /// SMBus device default address
        const SMBDEFAULT = 1 << 5;
        /// SMBus host header
        const SMBHOST = 1 << 6;
        /// Dual flag
        const DUALF = 1 << 7;
    }
}

bitflags! {
    /// Both status registers as one word: SR1 in the low half, SR2 in the high half.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Status: u32 {
        /// SR1.SB
        const SB = 1 << 0;
        /// SR1.ADDR
        const ADDR = 1 << 1;
        /// SR1.BTF
        const BTF = 1 << 2;
        /// SR1.RXNE
        const RXNE = 1 << 6;
        /// SR1.TXE
        const TXE = 1 << 7;
        /// SR2.MSL
        const MSL = 1 << 16;
        /// SR2.BUSY
        const BUSY = 1 << 17;
        /// SR2.TRA
        const TRA = 1 << 18;

        /// Start condition generated, now bus master.
        const MODE_SELECT = Self::BUSY.bits() | Self::MSL.bits() | Self::SB.bits();
        /// Write address acknowledged.
        const TRANSMITTER_MODE_SELECTED = Self::BUSY.bits()
            | Self::MSL.bits()
            | Self::ADDR.bits()
            | Self::TXE.bits()
            | Self::TRA.bits();
        /// Read address acknowledged.
        const RECEIVER_MODE_SELECTED = Self::BUSY.bits() | Self::MSL.bits() | Self::ADDR.bits();
        /// Transmit register free while the previous byte shifts out.
        const BYTE_TRANSMITTING =
            Self::TRA.bits() | Self::BUSY.bits() | Self::MSL.bits() | Self::TXE.bits();
        /// Previous byte fully shifted out.
        const BYTE_TRANSMITTED = Self::TRA.bits()
            | Self::BUSY.bits()
            | Self::MSL.bits()
            | Self::TXE.bits()
            | Self::BTF.bits();
        /// Byte waiting in the data register.
        const BYTE_RECEIVED = Self::BUSY.bits() | Self::MSL.bits() | Self::RXNE.bits();
    }
}

impl Status {
    /// Combine raw SR1 and SR2 values.
    #[inline(always)]
    pub fn from_registers(sr1: u16, sr2: u16) -> Self {
        Status::from_bits_truncate(((sr2 as u32) << 16) | sr1 as u32)
    }
}

impl From<BusEvent> for Status {
    fn from(event: BusEvent) -> Status {
        match event {
            BusEvent::ModeSelected => Status::MODE_SELECT,
            BusEvent::TransmitterModeSelected => Status::TRANSMITTER_MODE_SELECTED,
            BusEvent::ReceiverModeSelected => Status::RECEIVER_MODE_SELECTED,
            BusEvent::ByteTransmitting => Status::BYTE_TRANSMITTING,
            BusEvent::ByteTransmitted => Status::BYTE_TRANSMITTED,
            BusEvent::ByteReceived => Status::BYTE_RECEIVED,
        }
    }
}

/// Raw access to an I2C master's registers.
///
/// Register reads may have side effects (reading SR2 right after SR1 clears ADDR); the adapter
/// relies on the peripheral doing exactly that.
pub trait I2cRegisters {
    /// Read CR1.
    fn cr1_rd(&self) -> u16;

    /// Write CR1.
    fn cr1_wr(&self, bits: u16);

    /// Read SR1.
    fn sr1_rd(&self) -> u16;

    /// Write SR1. Only the write-0-to-clear error flags are affected.
    fn sr1_wr(&self, bits: u16);

    /// Read SR2.
    fn sr2_rd(&self) -> u16;

    /// Read DR.
    fn dr_rd(&self) -> u8;

    /// Write DR.
    fn dr_wr(&self, bits: u8);
}

/// [`BusAdapter`] over an [`I2cRegisters`] implementation.
pub struct RegisterBus<R: I2cRegisters> {
    regs: R,
}

impl<R: I2cRegisters> RegisterBus<R> {
    /// Wrap a register block. The peripheral must already be clocked, timed and enabled.
    #[inline]
    pub fn new(regs: R) -> Self {
        RegisterBus { regs }
    }

    /// Give the register block back.
    #[inline]
    pub fn free(self) -> R {
        self.regs
    }

    /// Borrow the register block.
    #[inline]
    pub fn registers(&self) -> &R {
        &self.regs
    }

    #[inline(always)]
    fn cr1_set(&self, bits: Cr1) {
        let cr1 = Cr1::from_bits_retain(self.regs.cr1_rd());
        self.regs.cr1_wr((cr1 | bits).bits());
    }

    #[inline(always)]
    fn cr1_clear(&self, bits: Cr1) {
        let cr1 = Cr1::from_bits_retain(self.regs.cr1_rd());
        self.regs.cr1_wr((cr1 - bits).bits());
    }

    // SR1 then SR2, in that order.
    #[inline(always)]
    fn status(&self) -> Status {
        let sr1 = self.regs.sr1_rd();
        let sr2 = self.regs.sr2_rd();
        Status::from_registers(sr1, sr2)
    }
}

impl<R: I2cRegisters> BusAdapter for RegisterBus<R> {
    #[inline]
    fn generate_start(&mut self) {
        self.cr1_set(Cr1::START);
    }

    #[inline]
    fn send_address(&mut self, address: u8, direction: Direction) {
        self.regs.dr_wr(direction.apply(address));
    }

    #[inline]
    fn send_byte(&mut self, value: u8) {
        self.regs.dr_wr(value);
    }

    #[inline]
    fn event_ready(&mut self, event: BusEvent) -> bool {
        self.status().contains(Status::from(event))
    }

    #[inline]
    fn address_flag_set(&mut self) -> bool {
        Sr1::from_bits_retain(self.regs.sr1_rd()).contains(Sr1::ADDR)
    }

    #[inline]
    fn set_ack_enabled(&mut self, enabled: bool) {
        if enabled {
            self.cr1_set(Cr1::ACK);
        } else {
            self.cr1_clear(Cr1::ACK);
        }
    }

    #[inline]
    fn generate_stop(&mut self) {
        self.cr1_set(Cr1::STOP);
    }

    #[inline]
    fn receive_byte(&mut self) -> u8 {
        self.regs.dr_rd()
    }

    fn acknowledge_failed(&mut self) -> bool {
        let sr1 = Sr1::from_bits_retain(self.regs.sr1_rd());
        if sr1.contains(Sr1::AF) {
            self.regs.sr1_wr((Sr1::all() - Sr1::AF).bits());
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    // Register block with the peripheral's read side effects: SR2 read after SR1 clears ADDR.
    #[derive(Default)]
    struct Regs {
        cr1: Cell<u16>,
        sr1: Cell<u16>,
        sr2: Cell<u16>,
        dr_in: Cell<u8>,
        dr_out: Cell<Option<u8>>,
        sr1_read: Cell<bool>,
    }

    impl I2cRegisters for Regs {
        fn cr1_rd(&self) -> u16 {
            self.cr1.get()
        }
        fn cr1_wr(&self, bits: u16) {
            self.cr1.set(bits)
        }
        fn sr1_rd(&self) -> u16 {
            self.sr1_read.set(true);
            self.sr1.get()
        }
        fn sr1_wr(&self, bits: u16) {
            // error flags are rc_w0
            self.sr1.set(self.sr1.get() & bits)
        }
        fn sr2_rd(&self) -> u16 {
            if self.sr1_read.replace(false) {
                self.sr1.set(self.sr1.get() & !Sr1::ADDR.bits());
            }
            self.sr2.get()
        }
        fn dr_rd(&self) -> u8 {
            self.dr_in.get()
        }
        fn dr_wr(&self, bits: u8) {
            self.dr_out.set(Some(bits))
        }
    }

    fn bus(sr1: Sr1, sr2: Sr2) -> RegisterBus<Regs> {
        let regs = Regs::default();
        regs.sr1.set(sr1.bits());
        regs.sr2.set(sr2.bits());
        RegisterBus::new(regs)
    }

    #[test]
    fn mode_select_needs_master_and_start_bit() {
        let mut b = bus(Sr1::SB, Sr2::MSL | Sr2::BUSY);
        assert!(b.event_ready(BusEvent::ModeSelected));

        let mut b = bus(Sr1::empty(), Sr2::MSL | Sr2::BUSY);
        assert!(!b.event_ready(BusEvent::ModeSelected));
    }

    #[test]
    fn transmitter_mode_requires_tra() {
        let mut b = bus(Sr1::ADDR | Sr1::TXE, Sr2::MSL | Sr2::BUSY);
        assert!(!b.event_ready(BusEvent::TransmitterModeSelected));

        let mut b = bus(Sr1::ADDR | Sr1::TXE, Sr2::MSL | Sr2::BUSY | Sr2::TRA);
        assert!(b.event_ready(BusEvent::TransmitterModeSelected));
    }

    #[test]
    fn byte_transmitting_is_a_subset_of_transmitted() {
        let mut b = bus(Sr1::TXE, Sr2::MSL | Sr2::BUSY | Sr2::TRA);
        assert!(b.event_ready(BusEvent::ByteTransmitting));
        assert!(!b.event_ready(BusEvent::ByteTransmitted));

        let mut b = bus(Sr1::TXE | Sr1::BTF, Sr2::MSL | Sr2::BUSY | Sr2::TRA);
        assert!(b.event_ready(BusEvent::ByteTransmitting));
        assert!(b.event_ready(BusEvent::ByteTransmitted));
    }

    #[test]
    fn address_flag_survives_peek_but_not_event() {
        let mut b = bus(Sr1::ADDR, Sr2::MSL | Sr2::BUSY);
        assert!(b.address_flag_set());
        assert!(b.address_flag_set());

        assert!(b.event_ready(BusEvent::ReceiverModeSelected));
        assert!(!b.address_flag_set());
        assert!(!b.event_ready(BusEvent::ReceiverModeSelected));
    }

    #[test]
    fn control_bits() {
        let mut b = bus(Sr1::empty(), Sr2::empty());
        b.registers().cr1.set(Cr1::PE.bits());

        b.set_ack_enabled(true);
        b.generate_start();
        assert_eq!(
            b.registers().cr1.get(),
            (Cr1::PE | Cr1::ACK | Cr1::START).bits()
        );

        b.set_ack_enabled(false);
        b.generate_stop();
        assert_eq!(
            b.registers().cr1.get(),
            (Cr1::PE | Cr1::START | Cr1::STOP).bits()
        );
    }

    #[test]
    fn address_direction_bit() {
        let mut b = bus(Sr1::empty(), Sr2::empty());
        b.send_address(0x98, Direction::Read);
        assert_eq!(b.registers().dr_out.get(), Some(0x99));
        b.send_address(0x99, Direction::Write);
        assert_eq!(b.registers().dr_out.get(), Some(0x98));
    }

    #[test]
    fn acknowledge_failure_is_cleared() {
        let mut b = bus(Sr1::AF | Sr1::TXE, Sr2::MSL | Sr2::BUSY | Sr2::TRA);
        assert!(b.acknowledge_failed());
        assert!(!b.acknowledge_failed());
        assert_eq!(b.registers().sr1.get(), Sr1::TXE.bits());
    }

    #[test]
    fn received_byte_comes_from_dr() {
        let mut b = bus(Sr1::RXNE, Sr2::MSL | Sr2::BUSY);
        b.registers().dr_in.set(0x5A);
        assert!(b.event_ready(BusEvent::ByteReceived));
        assert_eq!(b.receive_byte(), 0x5A);
    }
}
