use core::{fmt, num::ParseIntError};
use heapless::Vec;

pub fn decode_hex<const N: usize>(s: &str) -> Result<Vec<u8, N>, DecodeHexError> {
    if s.len() % 2 != 0 {
        return Err(DecodeHexError::OddLength);
    }
    if s.len() / 2 > N {
        return Err(DecodeHexError::TooLong);
    }
    let mut out = Vec::new();
    for i in (0..s.len()).step_by(2) {
        let pair = s.get(i..i + 2).ok_or(DecodeHexError::OddLength)?;
        let byte = u8::from_str_radix(pair, 16).map_err(DecodeHexError::ParseInt)?;
        out.push(byte).map_err(|_| DecodeHexError::TooLong)?;
    }
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeHexError {
    OddLength,
    TooLong,
    ParseInt(ParseIntError),
}

impl fmt::Display for DecodeHexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodeHexError::OddLength => "input string has an odd number of bytes".fmt(f),
            DecodeHexError::TooLong => "input string does not fit the output".fmt(f),
            DecodeHexError::ParseInt(e) => e.fmt(f),
        }
    }
}
