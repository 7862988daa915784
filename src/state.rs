//! Transaction state

use crate::error::Error;

/// One step of an in-flight transaction.
///
/// Declaration order is the progress order shared by every transaction variant: no variant visits
/// both [`AwaitDataByteSent`](Self::AwaitDataByteSent) and
/// [`AwaitRepeatedStart`](Self::AwaitRepeatedStart), so comparing two states tells which one is
/// further along. [`Done`](Self::Done) and [`Failed`](Self::Failed) are terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransactionState {
    /// Not started. Fresh and reset cells hold this.
    #[default]
    Start,
    /// Start condition issued, waiting to become bus master.
    AwaitModeSelected,
    /// Write address sent, waiting for the device to acknowledge it.
    AwaitAddressAcked,
    /// Register address byte sent.
    AwaitRegisterByteSent,
    /// Data byte sent.
    AwaitDataByteSent,
    /// Repeated start issued, waiting to become bus master again.
    AwaitRepeatedStart,
    /// Read address sent, waiting for the latched address-match flag.
    AwaitAddressFlagSet,
    /// Acknowledge disabled, waiting for receiver mode to be selected.
    AwaitReceiverModeSelected,
    /// Stop scheduled, waiting for the single byte to arrive.
    AwaitByteReceived,
    /// Transaction complete.
    Done,
    /// Transaction abandoned.
    Failed(Error),
}

impl TransactionState {
    /// Returns `true` for [`Done`](Self::Done) and [`Failed`](Self::Failed).
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, TransactionState::Done | TransactionState::Failed(_))
    }

    /// Returns `true` if this state holds the bus, i.e. it is past `Start` but not terminal.
    #[inline]
    pub fn is_in_flight(self) -> bool {
        !matches!(self, TransactionState::Start) && !self.is_terminal()
    }

    /// The failure reason, if any.
    #[inline]
    pub fn error(self) -> Option<Error> {
        match self {
            TransactionState::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Put the cell back to [`Start`](Self::Start) for reuse.
    ///
    /// Resetting a cell that [`is_in_flight`](Self::is_in_flight) does not undo the bus actions
    /// already issued, and will likely leave the device mid-transfer.
    #[inline]
    pub fn reset(&mut self) {
        *self = TransactionState::Start;
    }

    // States in which the device is expected to acknowledge something we sent.
    #[inline]
    pub(crate) fn awaits_device_ack(self) -> bool {
        matches!(
            self,
            TransactionState::AwaitAddressAcked
                | TransactionState::AwaitRegisterByteSent
                | TransactionState::AwaitDataByteSent
                | TransactionState::AwaitAddressFlagSet
        )
    }
}
