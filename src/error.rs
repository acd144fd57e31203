use crate::classify::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The byte transport reported an I/O failure
    Transport,
    /// A formatted command did not fit the outgoing command buffer
    CommandTooLong,
    /// Data was addressed to the unset connection id
    InvalidCid,
    /// Bulk payload does not fit the four digit length field
    PayloadTooLong,
    /// A response could not be parsed
    Parse,
    /// The module answered with something other than `OK`
    Outcome(Outcome),
}

impl From<core::fmt::Error> for Error {
    fn from(_: core::fmt::Error) -> Self {
        Self::CommandTooLong
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Transport => f.write_str("transport failure"),
            Self::CommandTooLong => f.write_str("command does not fit the command buffer"),
            Self::InvalidCid => f.write_str("invalid connection id"),
            Self::PayloadTooLong => f.write_str("payload too long for bulk transfer"),
            Self::Parse => f.write_str("unable to parse response"),
            Self::Outcome(o) => write!(f, "module responded {:?}", o),
        }
    }
}
