//! Transaction errors

use core::fmt;
use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

/// Why a transaction ended in [`TransactionState::Failed`](crate::TransactionState::Failed).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The awaited bus event did not occur within the configured stall budget. The device may be
    /// absent or holding the bus. No stop condition was issued.
    Timeout,
    /// The device did not acknowledge its address or a transmitted byte. A stop condition was
    /// issued to release the bus.
    Nack,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Timeout => f.write_str("bus event did not occur within the stall budget"),
            Error::Nack => f.write_str("device did not acknowledge"),
        }
    }
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Error::Timeout => ErrorKind::Other,
            Error::Nack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown),
        }
    }
}
