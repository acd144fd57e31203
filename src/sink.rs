//! Destinations for payload bytes received inside escape-framed data.

use heapless::Vec;

use crate::session::INVALID_CID;

/// Receives every payload byte of incoming framed data together with the
/// connection id it arrived on. Framing bytes are never delivered.
pub trait DataSink {
    fn deliver(&mut self, cid: u8, byte: u8);
}

impl<F> DataSink for F
where
    F: FnMut(u8, u8),
{
    fn deliver(&mut self, cid: u8, byte: u8) {
        self(cid, byte)
    }
}

/// Sink that drops all payload bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl DataSink for Discard {
    fn deliver(&mut self, _cid: u8, _byte: u8) {}
}

/// Bounded receive buffer for incoming data.
///
/// Bytes past the capacity are dropped and counted.
#[derive(Debug, Clone)]
pub struct ReceivedData<const N: usize> {
    cid: u8,
    data: Vec<u8, N>,
    dropped: usize,
}

impl<const N: usize> Default for ReceivedData<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ReceivedData<N> {
    pub const fn new() -> Self {
        Self {
            cid: INVALID_CID,
            data: Vec::new(),
            dropped: 0,
        }
    }

    /// Empty the buffer ahead of data expected on `cid`.
    pub fn prepare(&mut self, cid: u8) {
        self.cid = cid;
        self.data.clear();
        self.dropped = 0;
    }

    /// Connection id of the last delivered byte, or [`INVALID_CID`].
    pub fn cid(&self) -> u8 {
        self.cid
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn clear(&mut self) {
        self.prepare(INVALID_CID);
    }
}

impl<const N: usize> DataSink for ReceivedData<N> {
    fn deliver(&mut self, cid: u8, byte: u8) {
        self.cid = cid;
        if self.data.push(byte).is_err() {
            if self.dropped == 0 {
                warn!("Receive buffer full, dropping data on cid {}", cid);
            }
            self.dropped += 1;
        }
    }
}
