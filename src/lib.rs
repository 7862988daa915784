//! Non-blocking, poll-driven I2C register transactions for single-byte sensor access.
//!
//! Written for the MAX6692 remote temperature sensor, but nothing here is specific to it: any
//! device that exposes 8-bit registers behind a register-pointer byte can be driven.
//!
//! Every transaction is a small state machine. Each call inspects the bus, performs the current
//! step's bus action if its precondition holds, and returns immediately with
//! the (possibly advanced) [`TransactionState`]. The caller keeps calling until the state is
//! terminal, doing other work in between.
//!
//! # Usage
//!
//! The bus is injected as anything implementing [`BusAdapter`]. For the classic two-status-register
//! I2C peripheral, implement [`regs::I2cRegisters`] for your register block and wrap it in
//! [`regs::RegisterBus`].
//!
//! There are two ways to drive a transaction:
//!
//! * The free functions [`write_byte`], [`read_byte`], [`send_address_only`] and
//!   [`read_previously_addressed_byte`] take a caller-owned state cell and return the state after
//!   each call. Without a budget, a transaction whose awaited event never arrives stalls forever.
//! * [`Transaction`] owns its parameters and state, can be given a stall budget through
//!   [`PollConfig`], and exposes an [`nb`] style [`Transaction::poll`], so `nb::block!` works.
//!
//! Only one transaction may be mid-flight on a bus at a time. Nothing in this crate enforces
//! that; run one to completion before starting the next.
//!
//! # Features
//!
//! * `defmt`: derive `defmt::Format` on public types and emit trace logging through `defmt`.

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

#[macro_use]
mod fmt;

pub mod bus;
pub mod config;
mod engine;
pub mod error;
pub mod prelude;
pub mod regs;
pub mod state;
pub mod transaction;

pub use bus::{BusAdapter, BusEvent, Direction};
pub use config::PollConfig;
pub use error::Error;
pub use state::TransactionState;
pub use transaction::{
    read_byte, read_previously_addressed_byte, send_address_only, write_byte, Transaction,
};
