//! Prelude

pub use crate::bus::BusAdapter as _max6692_nb_BusAdapter;
pub use crate::regs::I2cRegisters as _max6692_nb_I2cRegisters;
