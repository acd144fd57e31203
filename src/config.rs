use embassy_time::Duration;
use embedded_hal::digital::{ErrorType, InputPin};

use crate::module_timing;

/// Placeholder for a data-ready line that is not wired up. Reads as always
/// asserted, so the SPI link polls the module on every transfer.
pub struct NoPin;

impl ErrorType for NoPin {
    type Error = core::convert::Infallible;
}

impl InputPin for NoPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }
}

/// Compile time tuning of the command engine.
pub trait S2wConfig {
    const RESPONSE_TIMEOUT: Duration = module_timing::response_timeout();
    const FLUSH_QUIET_TIME: Duration = module_timing::flush_quiet_time();
    const BULK_SETTLE_TIME: Duration = module_timing::bulk_settle_time();
    const ESCAPE_GUARD_TIME: Duration = module_timing::escape_guard_time();
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultConfig;

impl S2wConfig for DefaultConfig {}
