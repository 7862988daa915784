//! Transactions
//!
//! Four single-byte register transactions, each available two ways:
//!
//! * as a free function over a caller-owned [`TransactionState`] cell, to be called once per
//!   scheduling tick until the returned state is terminal;
//! * as an owned [`Transaction`], which adds a stall budget and an [`nb`] polling interface.
//!
//! Device addresses are 7-bit addresses already shifted into the upper seven bits, e.g. `0x98`
//! for a device strapped to `0x4C`.
//!
//! ```
//! use max6692_nb::{read_byte, BusAdapter, TransactionState};
//!
//! fn poll_temperature<B: BusAdapter>(
//!     bus: &mut B,
//!     state: &mut TransactionState,
//!     raw: &mut u8,
//! ) -> Option<u8> {
//!     // one step per call; other work happens between calls
//!     match read_byte(bus, 0x00, 0x98, state, raw) {
//!         TransactionState::Done => {
//!             state.reset();
//!             Some(*raw)
//!         }
//!         _ => None,
//!     }
//! }
//! ```

use crate::bus::BusAdapter;
use crate::config::PollConfig;
use crate::engine::{self, Kind, Params};
use crate::error::Error;
use crate::state::TransactionState;

/// Write `data` to `register` on `device`.
///
/// Advancing calls issue, in order: start, write address, register byte, data byte, stop.
#[inline]
pub fn write_byte<B: BusAdapter>(
    bus: &mut B,
    data: u8,
    register: u8,
    device: u8,
    state: &mut TransactionState,
) -> TransactionState {
    let params = Params {
        device,
        register,
        data,
    };
    engine::advance(bus, Kind::WriteByte, &params, state, &mut 0)
}

/// Read `register` on `device` into `received`.
///
/// Writes the register address, then switches direction with a repeated start and reads one
/// byte. `received` is written only by the call that returns [`TransactionState::Done`].
#[inline]
pub fn read_byte<B: BusAdapter>(
    bus: &mut B,
    register: u8,
    device: u8,
    state: &mut TransactionState,
    received: &mut u8,
) -> TransactionState {
    let params = Params {
        device,
        register,
        data: 0,
    };
    engine::advance(bus, Kind::ReadByte, &params, state, received)
}

/// Point the register pointer of `device` at `register` without writing any data.
///
/// Follow with [`read_previously_addressed_byte`] to read that register, possibly many times.
#[inline]
pub fn send_address_only<B: BusAdapter>(
    bus: &mut B,
    register: u8,
    device: u8,
    state: &mut TransactionState,
) -> TransactionState {
    let params = Params {
        device,
        register,
        data: 0,
    };
    engine::advance(bus, Kind::SendAddressOnly, &params, state, &mut 0)
}

/// Read one byte from `device` at whatever register its pointer was last set to.
///
/// `received` is written only by the call that returns [`TransactionState::Done`].
#[inline]
pub fn read_previously_addressed_byte<B: BusAdapter>(
    bus: &mut B,
    device: u8,
    state: &mut TransactionState,
    received: &mut u8,
) -> TransactionState {
    let params = Params {
        device,
        register: 0,
        data: 0,
    };
    engine::advance(bus, Kind::ReadPreviouslyAddressed, &params, state, received)
}

/// An owned single-byte transaction with an optional stall budget.
///
/// Build one with a variant constructor, optionally attach a [`PollConfig`], and call
/// [`poll`](Transaction::poll) (or [`step`](Transaction::step)) until it finishes. The bus is
/// only borrowed for the duration of each call, so one bus can serve many transactions as long
/// as they run one after another.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transaction {
    kind: Kind,
    params: Params,
    state: TransactionState,
    config: PollConfig,
    stalls: u32,
    stalled_at: Option<TransactionState>,
    received: u8,
    unclaimed: bool,
}

impl Transaction {
    fn new(kind: Kind, params: Params) -> Self {
        Transaction {
            kind,
            params,
            state: TransactionState::Start,
            config: PollConfig::new(),
            stalls: 0,
            stalled_at: None,
            received: 0,
            unclaimed: false,
        }
    }

    /// Transaction writing `data` to `register` on `device`.
    pub fn write_byte(device: u8, register: u8, data: u8) -> Self {
        Self::new(
            Kind::WriteByte,
            Params {
                device,
                register,
                data,
            },
        )
    }

    /// Transaction reading `register` on `device`.
    pub fn read_byte(device: u8, register: u8) -> Self {
        Self::new(
            Kind::ReadByte,
            Params {
                device,
                register,
                data: 0,
            },
        )
    }

    /// Transaction setting the register pointer of `device` to `register`.
    pub fn send_address_only(device: u8, register: u8) -> Self {
        Self::new(
            Kind::SendAddressOnly,
            Params {
                device,
                register,
                data: 0,
            },
        )
    }

    /// Transaction reading from `device` at its current register pointer.
    pub fn read_previously_addressed_byte(device: u8) -> Self {
        Self::new(
            Kind::ReadPreviouslyAddressed,
            Params {
                device,
                register: 0,
                data: 0,
            },
        )
    }

    /// Attach a polling configuration.
    #[inline]
    pub fn with_config(mut self, config: PollConfig) -> Self {
        self.config = config;
        self
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Returns `true` once the transaction is done or failed.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    /// The state the transaction was waiting in when its stall budget ran out.
    #[inline]
    pub fn stalled_at(&self) -> Option<TransactionState> {
        self.stalled_at
    }

    /// Target device address.
    #[inline]
    pub fn device(&self) -> u8 {
        self.params.device
    }

    /// Run one step and return the resulting state.
    ///
    /// Calls on a finished transaction return its terminal state and do nothing.
    pub fn step<B: BusAdapter>(&mut self, bus: &mut B) -> TransactionState {
        if self.state.is_terminal() {
            return self.state;
        }

        let before = self.state;
        let after = engine::advance(
            bus,
            self.kind,
            &self.params,
            &mut self.state,
            &mut self.received,
        );

        if after != before {
            self.stalls = 0;
            if after == TransactionState::Done && self.kind.reads() {
                self.unclaimed = true;
            }
            return after;
        }

        self.stalls = self.stalls.saturating_add(1);
        if self.config.exhausted(self.stalls) {
            debug!(
                "device {}: stalled {} polls in {:?}",
                self.params.device, self.stalls, before
            );
            self.stalled_at = Some(before);
            self.state = TransactionState::Failed(Error::Timeout);
        }
        self.state
    }

    /// Run one step, reporting completion the [`nb`] way.
    ///
    /// * `Err(WouldBlock)` while the transaction is in flight.
    /// * `Ok(Some(byte))` from the poll that completes a read, and never again after that.
    /// * `Ok(None)` once a write, an address-only transaction, or an already reported read is done.
    /// * `Err(Other(error))` once the transaction has failed.
    ///
    /// ```
    /// # use max6692_nb::{BusAdapter, Error, PollConfig, Transaction};
    /// fn read_status<B: BusAdapter>(bus: &mut B) -> Result<u8, Error> {
    ///     let mut read = Transaction::read_byte(0x98, 0x02)
    ///         .with_config(PollConfig::new().max_stalled_polls(1_000));
    ///     Ok(nb::block!(read.poll(bus))?.unwrap_or_default())
    /// }
    /// ```
    pub fn poll<B: BusAdapter>(&mut self, bus: &mut B) -> nb::Result<Option<u8>, Error> {
        match self.step(bus) {
            TransactionState::Done => Ok(self.take_received()),
            TransactionState::Failed(err) => Err(nb::Error::Other(err)),
            _ => Err(nb::Error::WouldBlock),
        }
    }

    /// Take the byte captured by a completed read. Returns it at most once.
    #[inline]
    pub fn take_received(&mut self) -> Option<u8> {
        if self.unclaimed {
            self.unclaimed = false;
            Some(self.received)
        } else {
            None
        }
    }

    /// Return to [`TransactionState::Start`] for reuse, keeping parameters and configuration.
    ///
    /// Resetting a transaction that is mid-flight does not undo the bus actions already issued.
    pub fn reset(&mut self) {
        if self.state.is_in_flight() {
            warn!(
                "device {}: reset while in flight at {:?}",
                self.params.device, self.state
            );
        }
        self.state.reset();
        self.stalls = 0;
        self.stalled_at = None;
        self.unclaimed = false;
    }
}
