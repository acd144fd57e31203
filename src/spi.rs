//! Byte stream over the GainSpan SPI host interface.
//!
//! SPI is full duplex: every byte clocked out clocks one byte in. Both sides
//! reserve a set of control bytes, and a data byte that collides with one of
//! them is sent as `ESC`, `byte ^ 0x20`. When the host has nothing to send
//! but the module raises its data-ready line, `IDLE` bytes are clocked out to
//! collect the pending data.

use embedded_hal::digital::InputPin;
use embedded_hal::spi::SpiDevice;
use embedded_io::{ErrorKind, ErrorType, Read, ReadReady, Write};
use heapless::{Deque, Vec};

pub const SPI_IDLE: u8 = 0xF5;
pub const SPI_ESC: u8 = 0xFB;
pub const SPI_XON: u8 = 0xFD;
pub const SPI_XOFF: u8 = 0xFA;
pub const SPI_INACTIVE_LINK: u8 = 0x00;
pub const SPI_INACTIVE_LINK2: u8 = 0xFF;
pub const SPI_LINK_READY: u8 = 0xF3;

const STUFF_MASK: u8 = 0x20;

/// Default depth of the receive and transmit FIFOs.
pub const SPI_FIFO_SIZE: usize = 256;

pub fn needs_stuffing(byte: u8) -> bool {
    matches!(
        byte,
        SPI_IDLE
            | SPI_ESC
            | SPI_XON
            | SPI_XOFF
            | SPI_INACTIVE_LINK
            | SPI_INACTIVE_LINK2
            | SPI_LINK_READY
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiLinkError<S, P> {
    Spi(S),
    DataReady(P),
}

impl<S: core::fmt::Debug, P: core::fmt::Debug> embedded_io::Error for SpiLinkError<S, P> {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// SPI link to the module, usable as a blocking [`embedded_io`] stream.
pub struct SpiTransport<SPI, DR, const N: usize = SPI_FIFO_SIZE> {
    spi: SPI,
    data_ready: DR,
    tx: Deque<u8, N>,
    rx: Deque<u8, N>,
    escaped: bool,
    paused: bool,
}

impl<SPI, DR, const N: usize> SpiTransport<SPI, DR, N>
where
    SPI: SpiDevice,
    DR: InputPin,
{
    pub fn new(spi: SPI, data_ready: DR) -> Self {
        Self {
            spi,
            data_ready,
            tx: Deque::new(),
            rx: Deque::new(),
            escaped: false,
            paused: false,
        }
    }

    pub fn release(self) -> (SPI, DR) {
        (self.spi, self.data_ready)
    }

    /// Whether the module asked the host to stop sending.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Queue one data byte, stuffing it when needed. Returns `false` when
    /// the transmit FIFO has no room.
    fn queue(&mut self, byte: u8) -> bool {
        if !needs_stuffing(byte) {
            return self.tx.push_back(byte).is_ok();
        }
        if N - self.tx.len() < 2 {
            return false;
        }
        self.tx.push_back(SPI_ESC).is_ok() && self.tx.push_back(byte ^ STUFF_MASK).is_ok()
    }

    /// Run one SPI transfer, if there is anything to exchange.
    fn pump(&mut self) -> Result<(), SpiLinkError<SPI::Error, DR::Error>> {
        let mut chunk: Vec<u8, N> = Vec::new();
        if !self.paused {
            while !chunk.is_full() {
                match self.tx.pop_front() {
                    Some(byte) => {
                        let _ = chunk.push(byte);
                    }
                    None => break,
                }
            }
        }

        if chunk.is_empty() {
            // While paused, keep polling so the resume request is seen
            let ready = self.paused
                || self
                    .data_ready
                    .is_high()
                    .map_err(SpiLinkError::DataReady)?;
            if !ready {
                return Ok(());
            }
            let _ = chunk.push(SPI_IDLE);
        }

        self.spi
            .transfer_in_place(&mut chunk)
            .map_err(SpiLinkError::Spi)?;

        for byte in chunk {
            self.receive(byte);
        }
        Ok(())
    }

    fn receive(&mut self, byte: u8) {
        if self.escaped {
            self.escaped = false;
            self.store(byte ^ STUFF_MASK);
            return;
        }
        match byte {
            SPI_ESC => self.escaped = true,
            SPI_XOFF => {
                trace!("Module paused transmission");
                self.paused = true;
            }
            SPI_XON => {
                trace!("Module resumed transmission");
                self.paused = false;
            }
            SPI_IDLE | SPI_INACTIVE_LINK | SPI_INACTIVE_LINK2 | SPI_LINK_READY => {}
            _ => self.store(byte),
        }
    }

    fn store(&mut self, byte: u8) {
        if self.rx.push_back(byte).is_err() {
            warn!("SPI receive FIFO full, dropping byte");
        }
    }
}

impl<SPI, DR, const N: usize> ErrorType for SpiTransport<SPI, DR, N>
where
    SPI: SpiDevice,
    DR: InputPin,
{
    type Error = SpiLinkError<SPI::Error, DR::Error>;
}

impl<SPI, DR, const N: usize> Write for SpiTransport<SPI, DR, N>
where
    SPI: SpiDevice,
    DR: InputPin,
{
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let mut written = 0;
        for byte in buf {
            while !self.queue(*byte) {
                if written > 0 {
                    return Ok(written);
                }
                self.pump()?;
            }
            written += 1;
        }
        Ok(written)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        while !self.tx.is_empty() {
            self.pump()?;
        }
        Ok(())
    }
}

impl<SPI, DR, const N: usize> Read for SpiTransport<SPI, DR, N>
where
    SPI: SpiDevice,
    DR: InputPin,
{
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.rx.is_empty() {
            self.pump()?;
        }
        let mut n = 0;
        while n < buf.len() {
            match self.rx.pop_front() {
                Some(byte) => {
                    buf[n] = byte;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

impl<SPI, DR, const N: usize> ReadReady for SpiTransport<SPI, DR, N>
where
    SPI: SpiDevice,
    DR: InputPin,
{
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        if self.rx.is_empty() {
            self.pump()?;
        }
        Ok(!self.rx.is_empty())
    }
}
