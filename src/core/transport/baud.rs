//! Supported line speeds

use super::TransportError;
use std::fmt;

/// Speeds accepted by [`BaudRate::new`], lowest first
pub const SUPPORTED_BAUD_RATES: &[u32] = &[
    300, 600, 1200, 1800, 2400, 4800, 9600, 19200, 38400, 57600, 115_200, 230_400, 460_800,
    500_000, 576_000, 921_600,
];

/// A baud rate from the supported table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BaudRate(u32);

impl BaudRate {
    /// Default line speed
    pub const DEFAULT: Self = Self(9600);

    /// Accept `bps` only on an exact table match; there is no rounding.
    pub fn new(bps: u32) -> Result<Self, TransportError> {
        if SUPPORTED_BAUD_RATES.binary_search(&bps).is_ok() {
            Ok(Self(bps))
        } else {
            Err(TransportError::UnsupportedBaudRate(bps))
        }
    }

    /// Bits per second
    pub fn bps(self) -> u32 {
        self.0
    }
}

impl Default for BaudRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = TransportError;

    fn try_from(bps: u32) -> Result<Self, Self::Error> {
        Self::new(bps)
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} baud", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_sorted() {
        assert!(SUPPORTED_BAUD_RATES.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_accepts_every_table_entry() {
        for &bps in SUPPORTED_BAUD_RATES {
            assert_eq!(BaudRate::new(bps).unwrap().bps(), bps);
        }
    }

    #[test]
    fn test_rejects_off_table_values() {
        for bps in [0, 9601, 14400, 28800, 1_000_000] {
            assert!(matches!(
                BaudRate::new(bps),
                Err(TransportError::UnsupportedBaudRate(v)) if v == bps
            ));
        }
    }

    #[test]
    fn test_default() {
        assert_eq!(BaudRate::default().bps(), 9600);
        assert_eq!(BaudRate::DEFAULT.to_string(), "9600 baud");
    }
}
