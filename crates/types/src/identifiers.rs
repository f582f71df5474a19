//! Identifier newtypes.

use std::fmt;

/// Bit position of the application index inside a [`TransactionId`].
///
/// The simulator packs the issuing application into the high byte of every
/// transaction identifier.
pub const APPLICATION_SHIFT: u32 = 56;

/// Application-scoped transaction identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// Index of the application that issued this transaction.
    pub fn application(self) -> u32 {
        (self.0 >> APPLICATION_SHIFT) as u32
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! u32_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

u32_id!(
    /// Message identifier, unique within its transaction.
    MessageId
);
u32_id!(
    /// Packet identifier, unique within its message.
    PacketId
);
u32_id!(
    /// Flit index within its packet. Index 0 is the head flit.
    FlitId
);
u32_id!(
    /// Network terminal (message source or destination).
    TerminalId
);

impl FlitId {
    /// The head flit defines a packet's head timing.
    pub const HEAD: Self = Self(0);

    pub fn is_head(self) -> bool {
        self == Self::HEAD
    }
}
