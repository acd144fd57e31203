//! Mocks shared by the unit tests.

extern crate std;

use std::collections::VecDeque;
use std::sync::Once;
use std::vec::Vec;

use embassy_time::{Duration, Instant};
use env_logger::Env;

use crate::clock::Clock;
use crate::sink::DataSink;

static INIT: Once = Once::new();

pub fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
            .is_test(true)
            .try_init();
    });
}

/// Byte transport with a scripted receive side and a captured transmit side.
///
/// A `None` entry in the receive script is one poll with nothing available.
#[derive(Debug, Default)]
pub struct MockTransport {
    pub rx: VecDeque<Option<u8>>,
    pub tx: Vec<u8>,
    /// Receive script released after every transmitted chunk
    pub replies: VecDeque<Vec<u8>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rx(bytes: &[u8]) -> Self {
        let mut transport = Self::new();
        transport.push_rx(bytes);
        transport
    }

    pub fn push_rx(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied().map(Some));
    }

    pub fn push_idle(&mut self, polls: usize) {
        self.rx.extend(core::iter::repeat(None).take(polls));
    }

    /// Queue a reply that only becomes readable after the next write.
    pub fn reply(&mut self, bytes: &[u8]) {
        self.replies.push_back(bytes.to_vec());
    }

    pub fn tx_str(&self) -> &str {
        core::str::from_utf8(&self.tx).unwrap()
    }
}

impl embedded_io::ErrorType for MockTransport {
    type Error = core::convert::Infallible;
}

impl embedded_io::Read for MockTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut n = 0;
        while n < buf.len() {
            match self.rx.front() {
                Some(Some(byte)) => {
                    buf[n] = *byte;
                    self.rx.pop_front();
                    n += 1;
                }
                _ => break,
            }
        }
        Ok(n)
    }
}

impl embedded_io::ReadReady for MockTransport {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        match self.rx.front() {
            Some(Some(_)) => Ok(true),
            Some(None) => {
                self.rx.pop_front();
                Ok(false)
            }
            None => Ok(false),
        }
    }
}

impl embedded_io::Write for MockTransport {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.tx.extend_from_slice(buf);
        if let Some(reply) = self.replies.pop_front() {
            self.push_rx(&reply);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Clock that moves forward by a fixed step every time it is read.
#[derive(Debug, Clone)]
pub struct MockClock {
    now: Instant,
    step: Duration,
}

impl MockClock {
    pub fn new(step: Duration) -> Self {
        Self {
            now: Instant::from_ticks(0),
            step,
        }
    }

    pub fn elapsed_total(&self) -> Duration {
        self.now.duration_since(Instant::from_ticks(0))
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new(Duration::from_millis(1))
    }
}

impl Clock for MockClock {
    fn now(&mut self) -> Instant {
        let now = self.now;
        self.now += self.step;
        now
    }
}

/// Sink remembering every delivered byte with its connection id.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordingSink {
    pub deliveries: Vec<(u8, u8)>,
}

impl RecordingSink {
    pub fn bytes_for(&self, cid: u8) -> Vec<u8> {
        self.deliveries
            .iter()
            .filter(|(c, _)| *c == cid)
            .map(|(_, b)| *b)
            .collect()
    }

    pub fn all_bytes(&self) -> Vec<u8> {
        self.deliveries.iter().map(|(_, b)| *b).collect()
    }
}

impl DataSink for RecordingSink {
    fn deliver(&mut self, cid: u8, byte: u8) {
        self.deliveries.push((cid, byte));
    }
}
