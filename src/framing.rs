//! Outbound escape framing of connection data.
//!
//! | Frame        | Layout                                            |
//! |--------------|---------------------------------------------------|
//! | TCP / client | `ESC S` cid data `ESC E`                          |
//! | UDP server   | `ESC U` cid `ip:port:` data `ESC E`               |
//! | Bulk         | `ESC Z` cid 4 digit length, settle delay, data    |
//!
//! Inline frames cannot carry the byte pair `ESC E` in their payload; use a
//! bulk frame for arbitrary binary data.

use core::fmt::Write as _;

use heapless::{String, Vec};
use no_std_net::SocketAddrV4;

use crate::digest::ESC;
use crate::error::Error;

/// Largest payload a bulk frame can announce.
pub const BULK_MAX_LEN: usize = 9999;

/// Capacity of the longest frame header, `ESC U cid 255.255.255.255:65535:`.
pub const HEADER_CAPACITY: usize = 32;

/// Capacity of the widest text [`encode_bulk_length`] can produce.
pub const BULK_LENGTH_CAPACITY: usize = 20;

const INLINE_TRAILER: &[u8] = &[ESC, b'E'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    Inline {
        cid: u8,
        payload: &'a [u8],
    },
    UdpServer {
        cid: u8,
        peer: SocketAddrV4,
        payload: &'a [u8],
    },
    Bulk {
        cid: u8,
        payload: &'a [u8],
    },
}

impl<'a> Frame<'a> {
    pub fn cid(&self) -> u8 {
        match self {
            Self::Inline { cid, .. } | Self::UdpServer { cid, .. } | Self::Bulk { cid, .. } => *cid,
        }
    }

    pub fn payload(&self) -> &'a [u8] {
        match self {
            Self::Inline { payload, .. }
            | Self::UdpServer { payload, .. }
            | Self::Bulk { payload, .. } => payload,
        }
    }

    pub fn header(&self) -> Result<Vec<u8, HEADER_CAPACITY>, Error> {
        let mut header = Vec::new();
        match self {
            Self::Inline { cid, .. } => {
                extend(&mut header, &[ESC, b'S', *cid])?;
            }
            Self::UdpServer { cid, peer, .. } => {
                extend(&mut header, &[ESC, b'U', *cid])?;
                let mut addr: String<24> = String::new();
                write!(addr, "{}:{}:", peer.ip(), peer.port())?;
                extend(&mut header, addr.as_bytes())?;
            }
            Self::Bulk { cid, payload } => {
                if payload.len() > BULK_MAX_LEN {
                    return Err(Error::PayloadTooLong);
                }
                extend(&mut header, &[ESC, b'Z', *cid])?;
                extend(&mut header, encode_bulk_length(payload.len())?.as_bytes())?;
            }
        }
        Ok(header)
    }

    pub fn trailer(&self) -> &'static [u8] {
        match self {
            Self::Inline { .. } | Self::UdpServer { .. } => INLINE_TRAILER,
            Self::Bulk { .. } => &[],
        }
    }

    /// Whether the module needs a pause between header and payload.
    pub fn needs_settle_time(&self) -> bool {
        matches!(self, Self::Bulk { .. })
    }

    /// Encode the complete frame into a single buffer.
    pub fn encode<const N: usize>(&self) -> Result<Vec<u8, N>, Error> {
        let mut out = Vec::new();
        extend(&mut out, &self.header()?)?;
        extend(&mut out, self.payload())?;
        extend(&mut out, self.trailer())?;
        Ok(out)
    }
}

/// Four character decimal length used by bulk frames.
///
/// Each position is printed as a number on its own, so lengths above 9999
/// widen the leading position instead of wrapping. Frames never announce
/// such lengths, see [`BULK_MAX_LEN`].
pub fn encode_bulk_length(len: usize) -> Result<String<BULK_LENGTH_CAPACITY>, Error> {
    let mut digits = String::new();
    write!(
        digits,
        "{}{}{}{}",
        len / 1000,
        (len % 1000) / 100,
        (len % 100) / 10,
        len % 10
    )?;
    Ok(digits)
}

fn extend<const N: usize>(out: &mut Vec<u8, N>, bytes: &[u8]) -> Result<(), Error> {
    out.extend_from_slice(bytes)
        .map_err(|_| Error::PayloadTooLong)
}
