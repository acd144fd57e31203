use embedded_io::{Read, ReadReady, Write};

/// Byte stream to the module.
///
/// Implemented for every blocking [`embedded_io`] device that can report
/// read readiness, such as a UART driver or the [`SpiTransport`].
///
/// [`SpiTransport`]: crate::spi::SpiTransport
pub trait Transport {
    type Error: core::fmt::Debug;

    /// Write all of `bytes` and flush them out.
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Read one byte if one is available, without blocking.
    fn try_read_byte(&mut self) -> Result<Option<u8>, Self::Error>;
}

impl<T> Transport for T
where
    T: Read + ReadReady + Write,
{
    type Error = T::Error;

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        Write::write_all(self, bytes)?;
        self.flush()
    }

    fn try_read_byte(&mut self) -> Result<Option<u8>, Self::Error> {
        if !self.read_ready()? {
            return Ok(None);
        }
        let mut byte = [0];
        match self.read(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }
}
