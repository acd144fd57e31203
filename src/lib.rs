//! Host side driver for GainSpan Serial2WiFi modules.
//!
//! The module speaks a line based AT protocol with data for open connections
//! interleaved as escape framed blocks. [`Client`] sends commands, runs every
//! received byte through the [`Digester`](digest::Digester) state machine and
//! hands connection data to a [`DataSink`]. Any blocking
//! [`embedded_io`] stream can carry the protocol; [`spi::SpiTransport`]
//! provides one over the SPI host interface.
#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod classify;
pub mod client;
pub mod clock;
pub mod command;
pub mod config;
pub mod digest;
pub mod error;
pub mod framing;
mod hex;
mod module_timing;
pub mod session;
pub mod shared;
pub mod sink;
pub mod spi;
pub mod transport;

#[cfg(test)]
mod test_helpers;

pub use classify::{classify, Outcome};
pub use client::Client;
pub use clock::{Clock, EmbassyClock};
pub use command::responses::MacAddress;
pub use command::Command;
pub use config::{DefaultConfig, NoPin, S2wConfig};
pub use error::Error;
pub use session::{Session, INVALID_CID};
pub use shared::SharedClient;
pub use sink::{DataSink, Discard, ReceivedData};
pub use transport::Transport;

pub use embassy_time::Duration;
pub use heapless;
pub use no_std_net::{Ipv4Addr, SocketAddrV4};
