//! Mapping of completed response lines onto module outcome codes.

use crate::error::Error;

/// Result of feeding input to the engine or waiting for a response.
///
/// `None` means "nothing conclusive yet". Everything else is terminal: a
/// command response or an unsolicited module event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Outcome {
    None = 0,
    Ok = 1,
    InvalidInput = 2,
    Error = 3,
    ErrorIpConfigFail = 4,
    ErrorSocketFail = 5,
    Disconnect = 6,
    DisassociationEvent = 7,
    AppReset = 8,
    OutOfStandbyAlarm = 9,
    OutOfStandbyTimer = 10,
    UnexpectedWarmBoot = 11,
    OutOfDeepSleep = 12,
    WelcomeMessage = 13,
    StandbyCmdEcho = 14,
    TcpConnectionDone = 15,
    ResponseTimeout = 16,
    BulkDataRx = 17,
    DataRx = 18,
    RawDataRx = 19,
    EscCmdOk = 20,
    EscCmdFail = 21,
    HttpResponseDataRx = 22,
}

impl Outcome {
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::None)
    }

    pub const fn is_success(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// `Ok(())` for [`Outcome::Ok`], the outcome wrapped in an error otherwise.
    pub fn into_result(self) -> Result<(), Error> {
        match self {
            Self::Ok => Ok(()),
            other => Err(Error::Outcome(other)),
        }
    }

    /// Numeric message id as used by the module firmware.
    pub const fn id(self) -> u8 {
        self as u8
    }
}

/// Substring patterns and the outcome they map to. The first match wins, so
/// the more specific `ERROR: ...` forms come before the bare `ERROR`.
const PATTERNS: &[(&[u8], Outcome)] = &[
    (b"OK", Outcome::Ok),
    (b"ERROR: IP CONFIG FAIL", Outcome::ErrorIpConfigFail),
    (b"ERROR: SOCKET FAILURE", Outcome::ErrorSocketFail),
    (b"ERROR", Outcome::Error),
    (b"INVALID INPUT", Outcome::InvalidInput),
    (b"DISASSOCIATED", Outcome::DisassociationEvent),
    (b"APP Reset-APP SW Reset", Outcome::AppReset),
    (b"DISCONNECT", Outcome::Disconnect),
    (b"Disassociation Event", Outcome::DisassociationEvent),
    (b"Out of StandBy-Alarm", Outcome::OutOfStandbyAlarm),
    (b"Out of StandBy-Timer", Outcome::OutOfStandbyTimer),
    (b"UnExpected Warm Boot", Outcome::UnexpectedWarmBoot),
    (b"Out of Deep Sleep", Outcome::OutOfDeepSleep),
    (b"Serial2WiFi APP", Outcome::WelcomeMessage),
];

const COMMAND_ECHO: &[u8] = b"AT+";

/// Classify the text received so far.
///
/// Lines that match none of the known patterns, including the echo of a
/// command, are not conclusive and yield [`Outcome::None`].
pub fn classify(line: &[u8]) -> Outcome {
    for (pattern, outcome) in PATTERNS {
        if contains(line, pattern) {
            return *outcome;
        }
    }

    if line.starts_with(COMMAND_ECHO) {
        trace!("Command echo {:?}", lossy!(line));
    }
    Outcome::None
}

pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

pub(crate) fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    find(haystack, needle).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_responses() {
        assert_eq!(classify(b"OK\r\n"), Outcome::Ok);
        assert_eq!(classify(b"ERROR\r\n"), Outcome::Error);
        assert_eq!(classify(b"ERROR: INVALID INPUT\r\n"), Outcome::Error);
        assert_eq!(classify(b"INVALID INPUT\r\n"), Outcome::InvalidInput);
    }

    #[test]
    fn specific_errors_win_over_generic_error() {
        assert_eq!(
            classify(b"ERROR: IP CONFIG FAIL\r\n"),
            Outcome::ErrorIpConfigFail
        );
        assert_eq!(
            classify(b"ERROR: SOCKET FAILURE 1\r\n"),
            Outcome::ErrorSocketFail
        );
    }

    #[test]
    fn unsolicited_events() {
        assert_eq!(
            classify(b"\r\nDISASSOCIATED\r\n"),
            Outcome::DisassociationEvent
        );
        assert_eq!(
            classify(b"Disassociation Event\r\n"),
            Outcome::DisassociationEvent
        );
        assert_eq!(classify(b"APP Reset-APP SW Reset\r\n"), Outcome::AppReset);
        assert_eq!(classify(b"DISCONNECT 1\r\n"), Outcome::Disconnect);
        assert_eq!(
            classify(b"Out of StandBy-Alarm\r\n"),
            Outcome::OutOfStandbyAlarm
        );
        assert_eq!(
            classify(b"Out of StandBy-Timer\r\n"),
            Outcome::OutOfStandbyTimer
        );
        assert_eq!(
            classify(b"UnExpected Warm Boot\r\n"),
            Outcome::UnexpectedWarmBoot
        );
        assert_eq!(classify(b"Out of Deep Sleep\r\n"), Outcome::OutOfDeepSleep);
        assert_eq!(
            classify(b"Serial2WiFi APP\r\n"),
            Outcome::WelcomeMessage
        );
    }

    #[test]
    fn inconclusive_lines() {
        assert_eq!(classify(b"AT+NSTAT=?\r\n"), Outcome::None);
        assert_eq!(classify(b"IP addr=192.168.1.5\r\n"), Outcome::None);
        assert_eq!(classify(b"CONNECT 0\r\n"), Outcome::None);
        assert_eq!(classify(b""), Outcome::None);
    }

    #[test]
    fn accumulated_text_is_classified_as_a_whole() {
        let text = b"MAC=00:1d:c9:01:02:03\r\nIP addr=192.168.1.5\r\nOK\r\n";
        assert_eq!(classify(text), Outcome::Ok);
    }

    #[test]
    fn outcome_helpers() {
        assert!(Outcome::Ok.is_success());
        assert!(Outcome::Ok.is_terminal());
        assert!(Outcome::ResponseTimeout.is_terminal());
        assert!(!Outcome::None.is_terminal());
        assert_eq!(Outcome::Ok.into_result(), Ok(()));
        assert_eq!(
            Outcome::Error.into_result(),
            Err(Error::Outcome(Outcome::Error))
        );
        assert_eq!(Outcome::HttpResponseDataRx.id(), 22);
    }

    #[test]
    fn substring_search() {
        assert_eq!(find(b"abcOKdef", b"OK"), Some(3));
        assert_eq!(find(b"O", b"OK"), None);
        assert!(contains(b"xx", b""));
    }
}
