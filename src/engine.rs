//! Table-driven transition function shared by every transaction variant.
//!
//! A variant is a table from the current state to a precondition on the bus, the single action to
//! take once the precondition holds, and the state that follows. One call to [`advance`] looks up
//! the row for the current state, tests the precondition, and either does nothing or performs
//! the action and moves to the next state.

use crate::bus::{BusAdapter, BusEvent, Direction};
use crate::error::Error;
use crate::state::TransactionState;
use crate::state::TransactionState as S;

/// The four transaction variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum Kind {
    /// Register address then data byte.
    WriteByte,
    /// Register address only, positioning the device's register pointer.
    SendAddressOnly,
    /// Register address, repeated start, one byte back.
    ReadByte,
    /// One byte back from wherever the register pointer already is.
    ReadPreviouslyAddressed,
}

/// Parameters of one transaction. Fields a variant does not use are ignored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) struct Params {
    pub device: u8,
    pub register: u8,
    pub data: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Precondition {
    Always,
    Event(BusEvent),
    // Either transmit event: the byte is in flight or already out.
    ByteSent,
    // Latched address match, tested without clearing it.
    AddressFlag,
}

impl Precondition {
    #[inline]
    fn holds<B: BusAdapter>(self, bus: &mut B) -> bool {
        match self {
            Precondition::Always => true,
            Precondition::Event(event) => bus.event_ready(event),
            Precondition::ByteSent => {
                bus.event_ready(BusEvent::ByteTransmitting)
                    || bus.event_ready(BusEvent::ByteTransmitted)
            }
            Precondition::AddressFlag => bus.address_flag_set(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    Start,
    // Read variants re-enable acknowledge before every start, since the previous read left it off.
    AckAndStart,
    SendAddress(Direction),
    SendRegister,
    SendData,
    DisableAck,
    Stop,
    Receive,
}

impl Action {
    #[inline]
    fn perform<B: BusAdapter>(self, bus: &mut B, params: &Params, received: &mut u8) {
        match self {
            Action::Start => bus.generate_start(),
            Action::AckAndStart => {
                bus.set_ack_enabled(true);
                bus.generate_start();
            }
            Action::SendAddress(direction) => bus.send_address(params.device, direction),
            Action::SendRegister => bus.send_byte(params.register),
            Action::SendData => bus.send_byte(params.data),
            Action::DisableAck => bus.set_ack_enabled(false),
            Action::Stop => bus.generate_stop(),
            Action::Receive => *received = bus.receive_byte(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Step {
    when: Precondition,
    then: Action,
    next: TransactionState,
}

#[inline(always)]
const fn step(when: Precondition, then: Action, next: TransactionState) -> Option<Step> {
    Some(Step { when, then, next })
}

// Start, write address, register byte. Shared by every variant that names a register.
fn register_prefix(state: TransactionState, start: Action) -> Option<Step> {
    match state {
        S::Start => step(Precondition::Always, start, S::AwaitModeSelected),
        S::AwaitModeSelected => step(
            Precondition::Event(BusEvent::ModeSelected),
            Action::SendAddress(Direction::Write),
            S::AwaitAddressAcked,
        ),
        S::AwaitAddressAcked => step(
            Precondition::Event(BusEvent::TransmitterModeSelected),
            Action::SendRegister,
            S::AwaitRegisterByteSent,
        ),
        S::AwaitRegisterByteSent
        | S::AwaitDataByteSent
        | S::AwaitRepeatedStart
        | S::AwaitAddressFlagSet
        | S::AwaitReceiverModeSelected
        | S::AwaitByteReceived
        | S::Done
        | S::Failed(_) => None,
    }
}

// Single-byte receive after a read address went out. Acknowledge must be turned off while the
// address flag is still latched; the receiver-mode event then clears the flag.
fn receive_suffix(state: TransactionState) -> Option<Step> {
    match state {
        S::AwaitAddressFlagSet => step(
            Precondition::AddressFlag,
            Action::DisableAck,
            S::AwaitReceiverModeSelected,
        ),
        S::AwaitReceiverModeSelected => step(
            Precondition::Event(BusEvent::ReceiverModeSelected),
            Action::Stop,
            S::AwaitByteReceived,
        ),
        S::AwaitByteReceived => step(
            Precondition::Event(BusEvent::ByteReceived),
            Action::Receive,
            S::Done,
        ),
        S::Start
        | S::AwaitModeSelected
        | S::AwaitAddressAcked
        | S::AwaitRegisterByteSent
        | S::AwaitDataByteSent
        | S::AwaitRepeatedStart
        | S::Done
        | S::Failed(_) => None,
    }
}

impl Kind {
    /// Whether the variant captures a byte.
    #[inline]
    pub(crate) fn reads(self) -> bool {
        matches!(self, Kind::ReadByte | Kind::ReadPreviouslyAddressed)
    }

    /// Row of this variant's table for `state`, or `None` if the variant never visits it.
    fn table(self, state: TransactionState) -> Option<Step> {
        match self {
            Kind::WriteByte => match state {
                S::Start | S::AwaitModeSelected | S::AwaitAddressAcked => {
                    register_prefix(state, Action::Start)
                }
                S::AwaitRegisterByteSent => {
                    step(Precondition::ByteSent, Action::SendData, S::AwaitDataByteSent)
                }
                S::AwaitDataByteSent => step(Precondition::ByteSent, Action::Stop, S::Done),
                S::AwaitRepeatedStart
                | S::AwaitAddressFlagSet
                | S::AwaitReceiverModeSelected
                | S::AwaitByteReceived
                | S::Done
                | S::Failed(_) => None,
            },
            Kind::SendAddressOnly => match state {
                S::Start | S::AwaitModeSelected | S::AwaitAddressAcked => {
                    register_prefix(state, Action::Start)
                }
                S::AwaitRegisterByteSent => step(Precondition::ByteSent, Action::Stop, S::Done),
                S::AwaitDataByteSent
                | S::AwaitRepeatedStart
                | S::AwaitAddressFlagSet
                | S::AwaitReceiverModeSelected
                | S::AwaitByteReceived
                | S::Done
                | S::Failed(_) => None,
            },
            Kind::ReadByte => match state {
                S::Start | S::AwaitModeSelected | S::AwaitAddressAcked => {
                    register_prefix(state, Action::AckAndStart)
                }
                S::AwaitRegisterByteSent => {
                    step(Precondition::ByteSent, Action::Start, S::AwaitRepeatedStart)
                }
                S::AwaitRepeatedStart => step(
                    Precondition::Event(BusEvent::ModeSelected),
                    Action::SendAddress(Direction::Read),
                    S::AwaitAddressFlagSet,
                ),
                S::AwaitAddressFlagSet | S::AwaitReceiverModeSelected | S::AwaitByteReceived => {
                    receive_suffix(state)
                }
                S::AwaitDataByteSent | S::Done | S::Failed(_) => None,
            },
            Kind::ReadPreviouslyAddressed => match state {
                S::Start => step(
                    Precondition::Always,
                    Action::AckAndStart,
                    S::AwaitModeSelected,
                ),
                S::AwaitModeSelected => step(
                    Precondition::Event(BusEvent::ModeSelected),
                    Action::SendAddress(Direction::Read),
                    S::AwaitAddressFlagSet,
                ),
                S::AwaitAddressFlagSet | S::AwaitReceiverModeSelected | S::AwaitByteReceived => {
                    receive_suffix(state)
                }
                S::AwaitAddressAcked
                | S::AwaitRegisterByteSent
                | S::AwaitDataByteSent
                | S::AwaitRepeatedStart
                | S::Done
                | S::Failed(_) => None,
            },
        }
    }
}

/// Run one step of `kind` against `bus`.
///
/// Returns the state after the call, which is also stored in `state`. A call whose precondition
/// does not hold touches nothing but the bus status. `received` is only written by the final
/// step of a read.
pub(crate) fn advance<B: BusAdapter>(
    bus: &mut B,
    kind: Kind,
    params: &Params,
    state: &mut TransactionState,
    received: &mut u8,
) -> TransactionState {
    let current = *state;
    let Some(step) = kind.table(current) else {
        if !current.is_terminal() {
            warn!("{:?} polled in foreign state {:?}", kind, current);
        }
        return current;
    };

    if current.awaits_device_ack() && bus.acknowledge_failed() {
        debug!(
            "{:?}: device {} nacked in {:?}",
            kind, params.device, current
        );
        bus.generate_stop();
        *state = S::Failed(Error::Nack);
        return *state;
    }

    if !step.when.holds(bus) {
        return current;
    }

    step.then.perform(bus, params, received);
    trace!("{:?}: {:?} -> {:?}", kind, current, step.next);
    *state = step.next;
    step.next
}
