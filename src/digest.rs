//! Receive state machine for the Serial2WiFi byte stream.
//!
//! The stream interleaves CR/LF terminated text lines (command responses and
//! asynchronous events) with escape framed data. Text is collected into a
//! bounded buffer and classified on every line feed. Framed payload bytes
//! are handed to a [`DataSink`] and never touch the response buffer.
//!
//! Escape sequences start with `ESC` (0x1B) followed by a type letter:
//!
//! | Letter     | Layout                               |
//! |------------|--------------------------------------|
//! | `S`        | cid, data..., `ESC` `E`              |
//! | `Z` / `K`  | 4 digit length, data                 |
//! | `H`        | cid, 4 digit length, data            |
//! | `:`        | 1 to 4 digit length, `:`, data       |
//! | `O` / `F`  | escape command acknowledged / failed |

use heapless::Vec;

use crate::classify::{classify, Outcome};
use crate::sink::DataSink;

pub const ESC: u8 = 0x1B;
pub const CR: u8 = b'\r';
pub const LF: u8 = b'\n';

/// Default capacity of the response buffer.
pub const RX_BUFFER_SIZE: usize = 512;

const FIXED_LENGTH_DIGITS: u8 = 4;
const RAW_LENGTH_MAX_DIGITS: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxState {
    /// Waiting for the first byte of a line or escape sequence
    Start,
    /// Collecting response text
    LineAccumulate,
    /// `ESC` seen, waiting for the type letter
    EscapeStart,
    /// `ESC S` data, terminated by `ESC E`
    InlineDataEscaped,
    /// `ESC Z` / `ESC K` bulk data with a 4 digit length
    BinaryLengthPrefixed,
    /// `ESC H` data with a cid and a 4 digit length
    BinaryLengthPrefixedHttp,
    /// `ESC :` data with a colon terminated length
    RawLengthDelimited,
}

/// Position inside a framed data state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Cid,
    Length,
    Payload,
}

/// Incremental decoder for the Serial2WiFi receive stream.
///
/// Bytes are fed one at a time. The text of the current response stays in
/// the buffer after a terminal outcome so that response parsers can inspect
/// it; it is discarded when the next line or escape sequence begins.
#[derive(Debug, Clone)]
pub struct Digester<const N: usize = RX_BUFFER_SIZE> {
    state: RxState,
    phase: Phase,
    buf: Vec<u8, N>,
    cid: u8,
    pending: u32,
    digits: u8,
    held_escape: bool,
    /// The last collected text byte was a line feed
    line_complete: bool,
}

impl<const N: usize> Default for Digester<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Digester<N> {
    pub const fn new() -> Self {
        Self {
            state: RxState::Start,
            phase: Phase::Cid,
            buf: Vec::new(),
            cid: crate::session::INVALID_CID,
            pending: 0,
            digits: 0,
            held_escape: false,
            line_complete: false,
        }
    }

    pub fn state(&self) -> RxState {
        self.state
    }

    /// Whether the decoder is inside framed data, where more bytes are
    /// required before any text can be recognised again.
    pub fn in_framed_data(&self) -> bool {
        matches!(
            self.state,
            RxState::InlineDataEscaped
                | RxState::BinaryLengthPrefixed
                | RxState::BinaryLengthPrefixedHttp
                | RxState::RawLengthDelimited
        )
    }

    /// Response text collected so far.
    pub fn buffer(&self) -> &[u8] {
        &self.buf
    }

    /// Connection id of the current, or most recent, framed data.
    pub fn current_cid(&self) -> u8 {
        self.cid
    }

    /// Discard collected response text.
    ///
    /// A partial line or frame keeps its state. After a completed line the
    /// decoder returns to [`RxState::Start`], so the next byte opens a new
    /// message.
    pub fn flush(&mut self) {
        self.buf.clear();
        if self.state == RxState::LineAccumulate && self.line_complete {
            self.state = RxState::Start;
            self.line_complete = false;
        }
    }

    /// Drop any partial frame and return to [`RxState::Start`].
    pub fn abort(&mut self) {
        self.state = RxState::Start;
        self.phase = Phase::Cid;
        self.pending = 0;
        self.digits = 0;
        self.held_escape = false;
        self.line_complete = false;
    }

    /// Return to the power-on state.
    pub fn reset(&mut self) {
        self.abort();
        self.flush();
        self.cid = crate::session::INVALID_CID;
    }

    /// Feed a single received byte.
    pub fn feed<S: DataSink + ?Sized>(&mut self, byte: u8, sink: &mut S) -> Outcome {
        match self.state {
            RxState::Start => self.on_start(byte),
            RxState::LineAccumulate => return self.on_line(byte),
            RxState::EscapeStart => self.on_escape(byte),
            RxState::InlineDataEscaped => self.on_inline(byte, sink),
            RxState::BinaryLengthPrefixed | RxState::BinaryLengthPrefixedHttp => {
                self.on_length_prefixed(byte, sink)
            }
            RxState::RawLengthDelimited => self.on_raw(byte, sink),
        }
        Outcome::None
    }

    /// Feed a chunk of received bytes, stopping after the first terminal
    /// outcome.
    ///
    /// Returns the outcome and the number of bytes consumed. The remainder
    /// of the chunk should be fed again by the caller.
    pub fn feed_slice<S: DataSink + ?Sized>(
        &mut self,
        bytes: &[u8],
        sink: &mut S,
    ) -> (Outcome, usize) {
        for (i, byte) in bytes.iter().enumerate() {
            let outcome = self.feed(*byte, sink);
            if outcome.is_terminal() {
                return (outcome, i + 1);
            }
        }
        (Outcome::None, bytes.len())
    }

    fn on_start(&mut self, byte: u8) {
        match byte {
            CR | LF => {}
            ESC => {
                self.buf.clear();
                self.pending = 0;
                self.digits = 0;
                self.state = RxState::EscapeStart;
            }
            _ => {
                self.buf.clear();
                self.state = RxState::LineAccumulate;
                self.line_complete = false;
                // Capacity is at least one byte for any usable digester
                if self.buf.push(byte).is_err() {
                    self.overflow();
                }
            }
        }
    }

    fn on_line(&mut self, byte: u8) -> Outcome {
        if byte == ESC {
            if self.line_complete {
                // Escape data following a completed line
                self.on_start(byte);
            } else {
                warn!("Escape inside response line, dropping line");
                self.abort();
            }
            return Outcome::None;
        }

        if self.buf.push(byte).is_err() {
            self.overflow();
            return Outcome::None;
        }
        self.line_complete = byte == LF;

        if byte != LF {
            if self.buf.len() >= N {
                self.overflow();
            }
            return Outcome::None;
        }

        let outcome = classify(&self.buf);
        if outcome.is_terminal() {
            debug!("Response {:?}: {:?}", outcome, lossy!(&self.buf));
            self.state = RxState::Start;
            self.line_complete = false;
        }
        outcome
    }

    fn on_escape(&mut self, byte: u8) {
        self.state = match byte {
            b'S' => {
                self.phase = Phase::Cid;
                self.held_escape = false;
                RxState::InlineDataEscaped
            }
            b'H' => {
                self.phase = Phase::Cid;
                RxState::BinaryLengthPrefixedHttp
            }
            b'Z' | b'K' => {
                // Bulk frames carry no cid, data goes to the last one seen
                self.phase = Phase::Length;
                RxState::BinaryLengthPrefixed
            }
            b':' => {
                self.phase = Phase::Length;
                RxState::RawLengthDelimited
            }
            b'O' => {
                debug!("Escape command accepted");
                RxState::Start
            }
            b'F' => {
                warn!("Escape command failed");
                RxState::Start
            }
            other => {
                warn!("Unknown escape sequence type {:?}", other);
                RxState::Start
            }
        };
    }

    fn on_inline<S: DataSink + ?Sized>(&mut self, byte: u8, sink: &mut S) {
        if self.phase == Phase::Cid {
            self.cid = byte;
            self.phase = Phase::Payload;
            return;
        }

        if self.held_escape {
            self.held_escape = false;
            if byte == b'E' {
                self.finish_frame();
                return;
            }
            sink.deliver(self.cid, ESC);
        }

        if byte == ESC {
            self.held_escape = true;
        } else {
            sink.deliver(self.cid, byte);
        }
    }

    fn on_length_prefixed<S: DataSink + ?Sized>(&mut self, byte: u8, sink: &mut S) {
        match self.phase {
            Phase::Cid => {
                self.cid = byte;
                self.phase = Phase::Length;
            }
            Phase::Length => {
                if !self.push_digit(byte) {
                    return self.abort_frame(byte);
                }
                if self.digits == FIXED_LENGTH_DIGITS {
                    self.begin_payload();
                }
            }
            Phase::Payload => self.deliver_payload(byte, sink),
        }
    }

    fn on_raw<S: DataSink + ?Sized>(&mut self, byte: u8, sink: &mut S) {
        match self.phase {
            Phase::Length => match byte {
                // A separator ahead of the first digit is tolerated
                b':' if self.digits == 0 => {}
                b':' => self.begin_payload(),
                _ if self.digits == RAW_LENGTH_MAX_DIGITS => self.abort_frame(byte),
                _ => {
                    if !self.push_digit(byte) {
                        self.abort_frame(byte);
                    }
                }
            },
            Phase::Payload => self.deliver_payload(byte, sink),
            Phase::Cid => self.abort_frame(byte),
        }
    }

    fn push_digit(&mut self, byte: u8) -> bool {
        if !byte.is_ascii_digit() {
            return false;
        }
        self.pending = self.pending * 10 + u32::from(byte - b'0');
        self.digits += 1;
        true
    }

    fn begin_payload(&mut self) {
        if self.pending == 0 {
            self.finish_frame();
        } else {
            self.phase = Phase::Payload;
        }
    }

    fn deliver_payload<S: DataSink + ?Sized>(&mut self, byte: u8, sink: &mut S) {
        sink.deliver(self.cid, byte);
        self.pending -= 1;
        if self.pending == 0 {
            self.finish_frame();
        }
    }

    fn finish_frame(&mut self) {
        trace!("Frame complete in {:?}", self.state);
        self.abort();
    }

    fn abort_frame(&mut self, byte: u8) {
        warn!("Malformed length byte {:?} in {:?}", byte, self.state);
        self.abort();
    }

    fn overflow(&mut self) {
        warn!("Response buffer overflow, dropping line");
        self.buf.clear();
        self.abort();
    }
}
