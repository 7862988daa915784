//! Bus adapter
//!
//! The primitive operations a transaction needs from the I2C master peripheral. None of them may
//! block: each one either kicks off a bus action and returns, or reports a status bit.
//!
//! A ready-made implementation for register-mapped peripherals lives in [`crate::regs`].

/// Direction bit sent along with the 7-bit device address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Master transmits (R/W bit cleared)
    Write,
    /// Master receives (R/W bit set)
    Read,
}

impl Direction {
    /// Apply this direction to an address already shifted into the upper seven bits.
    #[inline(always)]
    pub fn apply(self, address: u8) -> u8 {
        match self {
            Direction::Write => address & !0x01,
            Direction::Read => address | 0x01,
        }
    }
}

/// Protocol milestones a transaction waits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusEvent {
    /// A start (or repeated start) condition went out and this device is now bus master.
    ModeSelected,
    /// The addressed device acknowledged a write-direction address.
    TransmitterModeSelected,
    /// The addressed device acknowledged a read-direction address. Observing this event is what
    /// releases the latched address-match flag.
    ReceiverModeSelected,
    /// The transmit register accepted the previous byte and a new one can be queued.
    ByteTransmitting,
    /// The previous byte has been fully shifted out.
    ByteTransmitted,
    /// A byte is waiting in the receive register.
    ByteReceived,
}

/// Non-blocking primitive access to an I2C master.
///
/// Whether [`event_ready`](BusAdapter::event_ready) consumes the event it reports is up to the
/// implementation, but it must be consistent: a physical event that was reported once must not
/// be reported again.
pub trait BusAdapter {
    /// Emit a start condition. Also used for repeated starts.
    fn generate_start(&mut self);

    /// Emit a device address with the given direction bit.
    ///
    /// `address` is the 7-bit device address already shifted into the upper seven bits; the
    /// lowest bit is overwritten by `direction`.
    fn send_address(&mut self, address: u8, direction: Direction);

    /// Queue one data byte for transmission.
    fn send_byte(&mut self, value: u8);

    /// Test whether `event` has happened.
    fn event_ready(&mut self, event: BusEvent) -> bool;

    /// Test the latched address-match flag without clearing it.
    ///
    /// This must never consume the flag: the acknowledge policy for the next received byte has
    /// to be fixed while the flag is still set.
    fn address_flag_set(&mut self) -> bool;

    /// Enable or disable acknowledgement of subsequently received bytes.
    fn set_ack_enabled(&mut self, enabled: bool);

    /// Emit a stop condition.
    fn generate_stop(&mut self);

    /// Read the last received byte.
    fn receive_byte(&mut self) -> u8;

    /// Test, and clear, a failed acknowledge from the addressed device.
    ///
    /// Adapters that cannot detect a NACK keep the default, which never reports one.
    #[inline(always)]
    fn acknowledge_failed(&mut self) -> bool {
        false
    }
}

impl<B: BusAdapter + ?Sized> BusAdapter for &mut B {
    #[inline(always)]
    fn generate_start(&mut self) {
        B::generate_start(self)
    }

    #[inline(always)]
    fn send_address(&mut self, address: u8, direction: Direction) {
        B::send_address(self, address, direction)
    }

    #[inline(always)]
    fn send_byte(&mut self, value: u8) {
        B::send_byte(self, value)
    }

    #[inline(always)]
    fn event_ready(&mut self, event: BusEvent) -> bool {
        B::event_ready(self, event)
    }

    #[inline(always)]
    fn address_flag_set(&mut self) -> bool {
        B::address_flag_set(self)
    }

    #[inline(always)]
    fn set_ack_enabled(&mut self, enabled: bool) {
        B::set_ack_enabled(self, enabled)
    }

    #[inline(always)]
    fn generate_stop(&mut self) {
        B::generate_stop(self)
    }

    #[inline(always)]
    fn receive_byte(&mut self) -> u8 {
        B::receive_byte(self)
    }

    #[inline(always)]
    fn acknowledge_failed(&mut self) -> bool {
        B::acknowledge_failed(self)
    }
}
