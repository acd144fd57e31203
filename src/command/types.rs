//! Argument types for Serial2WiFi commands

/// Authentication mode for WEP security, `AT+WAUTH`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum AuthMode {
    None = 0,
    Open = 1,
    Shared = 2,
}

/// Security type used when associating, `AT+WSEC`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SecurityType {
    /// Detect security from the access point beacon
    Auto = 0,
    Open = 1,
    Wep = 2,
    WpaPsk = 4,
    Wpa2Psk = 8,
    WpaEnterprise = 16,
    Wpa2Enterprise = 32,
}

/// Wireless operating mode, `AT+WM`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum WirelessMode {
    Infrastructure = 0,
    AdHoc = 1,
    LimitedAccessPoint = 2,
}

/// Stored configuration profile, `AT&W` / `ATZ`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Profile {
    Zero = 0,
    One = 1,
}

/// Auto connect timing parameter, `ATS`. Values are in 10 ms units unless
/// noted otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum TimingParam {
    /// Network connection timeout, default 1000 (10 s)
    NetworkConnectionTimeout = 0,
    /// Maximum time to associate, default 1000 (10 s)
    AutoAssociateTimeout = 1,
    /// Maximum time to establish a TCP client connection, default 500 (5 s)
    TcpConnectionTimeout = 2,
    AssociationRetryCount = 3,
    /// Buffering time for serial data in auto connect mode, default 10
    NagleWaitTime = 4,
    /// Scan time per radio channel in milliseconds, default 20
    ScanTime = 5,
}

/// Polarity of a standby wake-up alarm pin, `AT+PSSTBY`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum AlarmPolarity {
    ActiveLow = 0,
    ActiveHigh = 1,
}
