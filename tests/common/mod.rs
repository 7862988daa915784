#![allow(dead_code)]

use max6692_nb::{BusAdapter, BusEvent, Direction, TransactionState};

/// Everything the simulated bus saw, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Start,
    Address(u8, Direction),
    Byte(u8),
    Ack(bool),
    Stop,
    Receive(u8),
    AddressFlagSeen,
    Consumed(BusEvent),
}

/// A single register-mapped device behind a bus adapter.
///
/// Each primitive arms the event the real peripheral would raise next. An armed event is reported
/// once, after `latency` unsuccessful checks for it.
pub struct FakeBus {
    pub device: u8,
    pub registers: [u8; 256],
    pub log: Vec<Op>,
    pub latency: u32,
    pub stall_on: Option<BusEvent>,
    /// Byte value the device refuses to acknowledge.
    pub nack_on_byte: Option<u8>,
    /// Acknowledge setting at the moment the address flag was released.
    pub ack_at_address_clear: Option<bool>,
    pointer: u8,
    pending: Option<(BusEvent, u32)>,
    address_flag: bool,
    awaiting_register: bool,
    nack: bool,
    ack_enabled: bool,
}

impl FakeBus {
    pub fn new(device: u8) -> Self {
        FakeBus {
            device,
            registers: [0; 256],
            log: Vec::new(),
            latency: 0,
            stall_on: None,
            nack_on_byte: None,
            ack_at_address_clear: None,
            pointer: 0,
            pending: None,
            address_flag: false,
            awaiting_register: false,
            nack: false,
            ack_enabled: false,
        }
    }

    pub fn with_latency(mut self, latency: u32) -> Self {
        self.latency = latency;
        self
    }

    pub fn pointer(&self) -> u8 {
        self.pointer
    }

    /// Bus-side operations only, without event observations.
    pub fn actions(&self) -> Vec<Op> {
        self.log
            .iter()
            .copied()
            .filter(|op| !matches!(op, Op::Consumed(_) | Op::AddressFlagSeen))
            .collect()
    }

    pub fn position(&self, op: Op) -> Option<usize> {
        self.log.iter().position(|o| *o == op)
    }

    fn arm(&mut self, event: BusEvent) {
        self.pending = Some((event, self.latency));
    }
}

impl BusAdapter for FakeBus {
    fn generate_start(&mut self) {
        self.log.push(Op::Start);
        self.arm(BusEvent::ModeSelected);
    }

    fn send_address(&mut self, address: u8, direction: Direction) {
        self.log.push(Op::Address(address, direction));
        if direction.apply(address) & !0x01 != self.device {
            self.nack = true;
            self.pending = None;
            return;
        }
        match direction {
            Direction::Write => {
                self.awaiting_register = true;
                self.arm(BusEvent::TransmitterModeSelected);
            }
            Direction::Read => {
                self.address_flag = true;
                self.arm(BusEvent::ReceiverModeSelected);
            }
        }
    }

    fn send_byte(&mut self, value: u8) {
        self.log.push(Op::Byte(value));
        if self.nack_on_byte == Some(value) {
            self.nack = true;
            self.pending = None;
            return;
        }
        if self.awaiting_register {
            self.pointer = value;
            self.awaiting_register = false;
        } else {
            self.registers[self.pointer as usize] = value;
        }
        self.arm(BusEvent::ByteTransmitted);
    }

    fn event_ready(&mut self, event: BusEvent) -> bool {
        if self.stall_on == Some(event) {
            return false;
        }
        match self.pending {
            Some((armed, 0)) if armed == event => {
                self.pending = None;
                self.log.push(Op::Consumed(event));
                if event == BusEvent::ReceiverModeSelected {
                    self.address_flag = false;
                    self.ack_at_address_clear = Some(self.ack_enabled);
                    self.arm(BusEvent::ByteReceived);
                }
                true
            }
            Some((armed, left)) if armed == event => {
                self.pending = Some((armed, left - 1));
                false
            }
            _ => false,
        }
    }

    fn address_flag_set(&mut self) -> bool {
        if self.address_flag {
            self.log.push(Op::AddressFlagSeen);
        }
        self.address_flag
    }

    fn set_ack_enabled(&mut self, enabled: bool) {
        self.log.push(Op::Ack(enabled));
        self.ack_enabled = enabled;
    }

    fn generate_stop(&mut self) {
        self.log.push(Op::Stop);
    }

    fn receive_byte(&mut self) -> u8 {
        let value = self.registers[self.pointer as usize];
        self.log.push(Op::Receive(value));
        value
    }

    fn acknowledge_failed(&mut self) -> bool {
        core::mem::replace(&mut self.nack, false)
    }
}

/// Call `f` until it returns a terminal state or `max_calls` is reached, collecting every
/// returned state.
pub fn drive<F>(bus: &mut FakeBus, max_calls: usize, mut f: F) -> Vec<TransactionState>
where
    F: FnMut(&mut FakeBus) -> TransactionState,
{
    let mut history = Vec::new();
    for _ in 0..max_calls {
        let state = f(bus);
        history.push(state);
        if state.is_terminal() {
            break;
        }
    }
    history
}

/// Number of calls in `history` that changed the state.
pub fn advances(history: &[TransactionState]) -> usize {
    let mut previous = TransactionState::Start;
    let mut count = 0;
    for &state in history {
        if state != previous {
            count += 1;
            previous = state;
        }
    }
    count
}
