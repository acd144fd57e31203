//! Serial2WiFi AT commands
//!
//! Every command knows its wire syntax and the set of outcomes the module is
//! expected to answer it with. Commands are formatted into the engine's
//! outgoing buffer with a trailing CR LF.

pub mod responses;
pub mod types;

use core::fmt::Write;

use heapless::String;
use no_std_net::{Ipv4Addr, SocketAddrV4};

use crate::classify::Outcome;
use crate::error::Error;
use types::*;

/// Capacity of the outgoing command buffer.
pub const TX_BUFFER_SIZE: usize = 256;

const BASIC: &[Outcome] = &[Outcome::Ok, Outcome::Error, Outcome::InvalidInput];

const NETWORK: &[Outcome] = &[
    Outcome::Ok,
    Outcome::Error,
    Outcome::InvalidInput,
    Outcome::ErrorIpConfigFail,
    Outcome::DisassociationEvent,
];

const CONNECTION: &[Outcome] = &[
    Outcome::Ok,
    Outcome::Error,
    Outcome::InvalidInput,
    Outcome::ErrorSocketFail,
    Outcome::ErrorIpConfigFail,
    Outcome::DisassociationEvent,
];

const RESTART: &[Outcome] = &[
    Outcome::Ok,
    Outcome::Error,
    Outcome::InvalidInput,
    Outcome::AppReset,
    Outcome::WelcomeMessage,
];

const STANDBY: &[Outcome] = &[
    Outcome::Ok,
    Outcome::Error,
    Outcome::InvalidInput,
    Outcome::OutOfStandbyAlarm,
    Outcome::OutOfStandbyTimer,
];

const DEEP_SLEEP: &[Outcome] = &[
    Outcome::Ok,
    Outcome::Error,
    Outcome::InvalidInput,
    Outcome::OutOfDeepSleep,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    /// Check that the module responds, `AT`
    At,
    /// Enable or disable local echo, `ATE<n>`
    SetEcho { enabled: bool },
    /// Set the station MAC address, `AT+NMAC=<mac>`
    SetMac { mac: &'a str },
    /// Read the station MAC address, `AT+NMAC=?`
    ///
    /// Parse with [`responses::parse_mac`].
    GetMac,
    /// Start auto connect using the stored parameters, `ATA`
    AutoConnect,
    /// Load a stored profile, `ATZ<n>`
    LoadProfile(Profile),
    /// Save the current settings into a profile, `AT&W<n>`
    SaveProfile(Profile),
    /// Restore factory defaults, `AT&F`
    FactoryDefaults,
    /// Compute and store the WPA pre-shared key, `AT+WPAPSK=<ssid>,<passphrase>`
    ComputePsk {
        ssid: &'a str,
        passphrase: &'a str,
    },
    /// Set WEP key 1, `AT+WWEP1=<key>`
    SetWepKey { key: &'a str },
    /// Set the WPA passphrase, `AT+WWPA=<passphrase>`
    SetPassphrase { passphrase: &'a str },
    /// Network status report, `AT+NSTAT=?`
    NetworkStatus,
    /// `AT+WAUTH=<mode>`
    SetAuthMode(AuthMode),
    /// `AT+WSEC=<type>`
    SetSecurity(SecurityType),
    /// `AT+NDHCP=<n>`
    SetDhcp { enabled: bool },
    /// Associate with a network, `AT+WA=<ssid>[,<bssid>,<channel>]`
    ///
    /// The BSSID is only sent together with a channel.
    Associate {
        ssid: &'a str,
        bssid: Option<&'a str>,
        channel: Option<u8>,
    },
    /// Leave the current network, `AT+WD`
    Disassociate,
    /// Open a TCP client connection, `AT+NCTCP=<ip>,<port>`
    TcpClientStart { remote: SocketAddrV4 },
    /// Open a UDP client connection, `AT+NCUDP=<ip>,<port>,<local port>`
    UdpClientStart {
        remote: SocketAddrV4,
        local_port: u16,
    },
    /// `AT+NSTCP=<port>`
    TcpServerStart { port: u16 },
    /// `AT+NSUDP=<port>`
    UdpServerStart { port: u16 },
    /// Close one connection, `AT+NCLOSE=<cid>`
    Close { cid: u8 },
    /// `AT+NCLOSEALL`
    CloseAll,
    /// Static network configuration, `AT+NSET=<ip>,<subnet>,<gateway>`
    SetNetworkAddress {
        ip: Ipv4Addr,
        subnet: Ipv4Addr,
        gateway: Ipv4Addr,
    },
    /// `AT+DNSSET=<primary>[,<secondary>]`
    SetDnsServers {
        primary: Ipv4Addr,
        secondary: Option<Ipv4Addr>,
    },
    /// Resolve a host name, `AT+DNSLOOKUP=<host>`
    DnsLookup { host: &'a str },
    /// `AT+WRSSI=?`
    GetRssi,
    /// `AT+VER=?`
    Version,
    /// `AT+ERRCOUNT=?`
    GetErrorCount,
    /// `AT+WM=<mode>`
    SetWirelessMode(WirelessMode),
    /// `AT+MCSTSET=<n>`
    SetMulticast { enabled: bool },
    /// Association retry count, `AT+WRETRY=<n>`
    SetRetryCount { count: u32 },
    /// Keep the radio always on, `AT+WRXACTIVE=<n>`
    SetRadioActive { enabled: bool },
    /// 802.11 power save, `AT+WRXPS=<n>`
    SetRadioPowerSave { enabled: bool },
    /// `AT+EXTPA=<n>`
    SetExternalPa { enabled: bool },
    /// Sync loss interval in beacon intervals, `AT+WSYNCINTRL=<n>`
    SetSyncLossInterval { interval: u16 },
    /// `AT+PSPOLLINTRL=<n>`
    SetPsPollInterval { interval: u16 },
    /// Transmit power level, `AT+WP=<n>`
    SetTxPower { power: u32 },
    /// `AT+SETTIME=<date>,<time>`, date as `dd/mm/yyyy` and time as `HH:MM:SS`
    SetTime { date: &'a str, time: &'a str },
    /// Start periodic battery checks, `AT+BCHKSTRT=<interval>`
    BatteryCheckStart { interval: u32 },
    /// `AT+BCHKSTOP`
    BatteryCheckStop,
    /// Enter standby, `AT+PSSTBY=<duration>,<delay>,<alarm1>,<alarm2>`
    ///
    /// The module answers with an `Out of StandBy` event when it wakes up.
    Standby {
        duration_ms: u32,
        delay_ms: u32,
        alarm1: AlarmPolarity,
        alarm2: AlarmPolarity,
    },
    /// `AT+PSDPSLEEP`
    DeepSleep,
    /// Store the network context before standby, `AT+STORENWCONN`
    StoreNetworkContext,
    /// `AT+RESTORENWCONN`
    RestoreNetworkContext,
    /// Upgrade the firmware over the air, `AT+FWUP=<server>,<port>,<src port>,<src ip>`
    FirmwareUpgrade {
        server: Ipv4Addr,
        server_port: u16,
        src_port: u16,
        src_ip: Ipv4Addr,
    },
    /// `ATC<n>`
    SetAutoConnect { enabled: bool },
    /// Store wireless auto connect parameters, `AT+WAUTO=0,<ssid>,,<channel>`
    StoreWirelessAutoConnect { ssid: &'a str, channel: u8 },
    /// Store network auto connect parameters, `AT+NAUTO=0,0,<ip>,<port>`
    StoreNetworkAutoConnect { remote: SocketAddrV4 },
    /// `ATS<param>=<value>`
    SetTiming { param: TimingParam, value: u8 },
    /// Bulk data mode, `AT+BDATA=<n>`
    SetBulkData { enabled: bool },
    /// WPS push button method, `AT+WWPS=1`
    ///
    /// Parse with [`responses::parse_wps`].
    WpsPushButton,
    /// WPS pin method, `AT+WWPS=2,<pin>`
    WpsPin { pin: &'a str },
}

impl Command<'_> {
    /// Command name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::At => "AT",
            Self::SetEcho { .. } => "ATE",
            Self::SetMac { .. } | Self::GetMac => "AT+NMAC",
            Self::AutoConnect => "ATA",
            Self::LoadProfile(_) => "ATZ",
            Self::SaveProfile(_) => "AT&W",
            Self::FactoryDefaults => "AT&F",
            Self::ComputePsk { .. } => "AT+WPAPSK",
            Self::SetWepKey { .. } => "AT+WWEP1",
            Self::SetPassphrase { .. } => "AT+WWPA",
            Self::NetworkStatus => "AT+NSTAT",
            Self::SetAuthMode(_) => "AT+WAUTH",
            Self::SetSecurity(_) => "AT+WSEC",
            Self::SetDhcp { .. } => "AT+NDHCP",
            Self::Associate { .. } => "AT+WA",
            Self::Disassociate => "AT+WD",
            Self::TcpClientStart { .. } => "AT+NCTCP",
            Self::UdpClientStart { .. } => "AT+NCUDP",
            Self::TcpServerStart { .. } => "AT+NSTCP",
            Self::UdpServerStart { .. } => "AT+NSUDP",
            Self::Close { .. } => "AT+NCLOSE",
            Self::CloseAll => "AT+NCLOSEALL",
            Self::SetNetworkAddress { .. } => "AT+NSET",
            Self::SetDnsServers { .. } => "AT+DNSSET",
            Self::DnsLookup { .. } => "AT+DNSLOOKUP",
            Self::GetRssi => "AT+WRSSI",
            Self::Version => "AT+VER",
            Self::GetErrorCount => "AT+ERRCOUNT",
            Self::SetWirelessMode(_) => "AT+WM",
            Self::SetMulticast { .. } => "AT+MCSTSET",
            Self::SetRetryCount { .. } => "AT+WRETRY",
            Self::SetRadioActive { .. } => "AT+WRXACTIVE",
            Self::SetRadioPowerSave { .. } => "AT+WRXPS",
            Self::SetExternalPa { .. } => "AT+EXTPA",
            Self::SetSyncLossInterval { .. } => "AT+WSYNCINTRL",
            Self::SetPsPollInterval { .. } => "AT+PSPOLLINTRL",
            Self::SetTxPower { .. } => "AT+WP",
            Self::SetTime { .. } => "AT+SETTIME",
            Self::BatteryCheckStart { .. } => "AT+BCHKSTRT",
            Self::BatteryCheckStop => "AT+BCHKSTOP",
            Self::Standby { .. } => "AT+PSSTBY",
            Self::DeepSleep => "AT+PSDPSLEEP",
            Self::StoreNetworkContext => "AT+STORENWCONN",
            Self::RestoreNetworkContext => "AT+RESTORENWCONN",
            Self::FirmwareUpgrade { .. } => "AT+FWUP",
            Self::SetAutoConnect { .. } => "ATC",
            Self::StoreWirelessAutoConnect { .. } => "AT+WAUTO",
            Self::StoreNetworkAutoConnect { .. } => "AT+NAUTO",
            Self::SetTiming { .. } => "ATS",
            Self::SetBulkData { .. } => "AT+BDATA",
            Self::WpsPushButton | Self::WpsPin { .. } => "AT+WWPS",
        }
    }

    /// Outcomes the module normally answers this command with.
    pub fn expected_outcomes(&self) -> &'static [Outcome] {
        match self {
            Self::NetworkStatus
            | Self::SetDhcp { .. }
            | Self::Associate { .. }
            | Self::SetNetworkAddress { .. }
            | Self::DnsLookup { .. }
            | Self::AutoConnect
            | Self::WpsPushButton
            | Self::WpsPin { .. } => NETWORK,
            Self::TcpClientStart { .. }
            | Self::UdpClientStart { .. }
            | Self::TcpServerStart { .. }
            | Self::UdpServerStart { .. } => CONNECTION,
            Self::LoadProfile(_) | Self::FactoryDefaults | Self::FirmwareUpgrade { .. } => RESTART,
            Self::Standby { .. } => STANDBY,
            Self::DeepSleep => DEEP_SLEEP,
            _ => BASIC,
        }
    }

    pub fn is_expected(&self, outcome: Outcome) -> bool {
        self.expected_outcomes().contains(&outcome)
    }

    /// Format the command, including its line terminator, into `buffer`.
    pub fn write_to<const N: usize>(&self, buffer: &mut String<N>) -> Result<(), Error> {
        buffer.clear();
        match self {
            Self::At => buffer.push_str("\r\nAT").map_err(|_| Error::CommandTooLong)?,
            Self::SetEcho { enabled } => write!(buffer, "ATE{}", u8::from(*enabled))?,
            Self::SetMac { mac } => write!(buffer, "AT+NMAC={}", mac)?,
            Self::GetMac => write!(buffer, "AT+NMAC=?")?,
            Self::AutoConnect => write!(buffer, "ATA")?,
            Self::LoadProfile(profile) => write!(buffer, "ATZ{}", *profile as u8)?,
            Self::SaveProfile(profile) => write!(buffer, "AT&W{}", *profile as u8)?,
            Self::FactoryDefaults => write!(buffer, "AT&F")?,
            Self::ComputePsk { ssid, passphrase } => {
                write!(buffer, "AT+WPAPSK={},{}", ssid, passphrase)?
            }
            Self::SetWepKey { key } => write!(buffer, "AT+WWEP1={}", key)?,
            Self::SetPassphrase { passphrase } => write!(buffer, "AT+WWPA={}", passphrase)?,
            Self::NetworkStatus => write!(buffer, "AT+NSTAT=?")?,
            Self::SetAuthMode(mode) => write!(buffer, "AT+WAUTH={}", *mode as u8)?,
            Self::SetSecurity(security) => write!(buffer, "AT+WSEC={}", *security as u8)?,
            Self::SetDhcp { enabled } => write!(buffer, "AT+NDHCP={}", u8::from(*enabled))?,
            Self::Associate {
                ssid,
                bssid,
                channel,
            } => match channel {
                Some(channel) => write!(
                    buffer,
                    "AT+WA={},{},{}",
                    ssid,
                    bssid.unwrap_or(""),
                    channel
                )?,
                None => write!(buffer, "AT+WA={}", ssid)?,
            },
            Self::Disassociate => write!(buffer, "AT+WD")?,
            Self::TcpClientStart { remote } => {
                write!(buffer, "AT+NCTCP={},{}", remote.ip(), remote.port())?
            }
            Self::UdpClientStart { remote, local_port } => write!(
                buffer,
                "AT+NCUDP={},{},{}",
                remote.ip(),
                remote.port(),
                local_port
            )?,
            Self::TcpServerStart { port } => write!(buffer, "AT+NSTCP={}", port)?,
            Self::UdpServerStart { port } => write!(buffer, "AT+NSUDP={}", port)?,
            Self::Close { cid } => write!(buffer, "AT+NCLOSE={}", *cid as char)?,
            Self::CloseAll => write!(buffer, "AT+NCLOSEALL")?,
            Self::SetNetworkAddress {
                ip,
                subnet,
                gateway,
            } => write!(buffer, "AT+NSET={},{},{}", ip, subnet, gateway)?,
            Self::SetDnsServers { primary, secondary } => {
                write!(buffer, "AT+DNSSET={}", primary)?;
                if let Some(secondary) = secondary {
                    write!(buffer, ",{}", secondary)?;
                }
            }
            Self::DnsLookup { host } => write!(buffer, "AT+DNSLOOKUP={}", host)?,
            Self::GetRssi => write!(buffer, "AT+WRSSI=?")?,
            Self::Version => write!(buffer, "AT+VER=?")?,
            Self::GetErrorCount => write!(buffer, "AT+ERRCOUNT=?")?,
            Self::SetWirelessMode(mode) => write!(buffer, "AT+WM={}", *mode as u8)?,
            Self::SetMulticast { enabled } => {
                write!(buffer, "AT+MCSTSET={}", u8::from(*enabled))?
            }
            Self::SetRetryCount { count } => write!(buffer, "AT+WRETRY={}", count)?,
            Self::SetRadioActive { enabled } => {
                write!(buffer, "AT+WRXACTIVE={}", u8::from(*enabled))?
            }
            Self::SetRadioPowerSave { enabled } => {
                write!(buffer, "AT+WRXPS={}", u8::from(*enabled))?
            }
            Self::SetExternalPa { enabled } => write!(buffer, "AT+EXTPA={}", u8::from(*enabled))?,
            Self::SetSyncLossInterval { interval } => {
                write!(buffer, "AT+WSYNCINTRL={}", interval)?
            }
            Self::SetPsPollInterval { interval } => write!(buffer, "AT+PSPOLLINTRL={}", interval)?,
            Self::SetTxPower { power } => write!(buffer, "AT+WP={}", power)?,
            Self::SetTime { date, time } => write!(buffer, "AT+SETTIME={},{}", date, time)?,
            Self::BatteryCheckStart { interval } => write!(buffer, "AT+BCHKSTRT={}", interval)?,
            Self::BatteryCheckStop => write!(buffer, "AT+BCHKSTOP")?,
            Self::Standby {
                duration_ms,
                delay_ms,
                alarm1,
                alarm2,
            } => write!(
                buffer,
                "AT+PSSTBY={},{},{},{}",
                duration_ms, delay_ms, *alarm1 as u8, *alarm2 as u8
            )?,
            Self::DeepSleep => write!(buffer, "AT+PSDPSLEEP")?,
            Self::StoreNetworkContext => write!(buffer, "AT+STORENWCONN")?,
            Self::RestoreNetworkContext => write!(buffer, "AT+RESTORENWCONN")?,
            Self::FirmwareUpgrade {
                server,
                server_port,
                src_port,
                src_ip,
            } => write!(
                buffer,
                "AT+FWUP={},{},{},{}",
                server, server_port, src_port, src_ip
            )?,
            Self::SetAutoConnect { enabled } => write!(buffer, "ATC{}", u8::from(*enabled))?,
            Self::StoreWirelessAutoConnect { ssid, channel } => {
                write!(buffer, "AT+WAUTO=0,{},,{}", ssid, channel)?
            }
            Self::StoreNetworkAutoConnect { remote } => write!(
                buffer,
                "AT+NAUTO=0,0,{},{}",
                remote.ip(),
                remote.port()
            )?,
            Self::SetTiming { param, value } => write!(buffer, "ATS{}={}", *param as u8, value)?,
            Self::SetBulkData { enabled } => write!(buffer, "AT+BDATA={}", u8::from(*enabled))?,
            Self::WpsPushButton => write!(buffer, "AT+WWPS=1")?,
            Self::WpsPin { pin } => write!(buffer, "AT+WWPS=2,{}", pin)?,
        }
        buffer.push_str("\r\n").map_err(|_| Error::CommandTooLong)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(cmd: &Command<'_>) -> String<TX_BUFFER_SIZE> {
        let mut buffer = String::new();
        cmd.write_to(&mut buffer).unwrap();
        buffer
    }

    #[test]
    fn simple_commands() {
        assert_eq!(format(&Command::At), "\r\nAT\r\n");
        assert_eq!(format(&Command::SetEcho { enabled: false }), "ATE0\r\n");
        assert_eq!(format(&Command::NetworkStatus), "AT+NSTAT=?\r\n");
        assert_eq!(format(&Command::LoadProfile(Profile::One)), "ATZ1\r\n");
        assert_eq!(format(&Command::SetSecurity(SecurityType::Wpa2Psk)), "AT+WSEC=8\r\n");
        assert_eq!(format(&Command::DeepSleep), "AT+PSDPSLEEP\r\n");
    }

    #[test]
    fn associate_with_and_without_channel() {
        assert_eq!(
            format(&Command::Associate {
                ssid: "lab",
                bssid: None,
                channel: None
            }),
            "AT+WA=lab\r\n"
        );
        assert_eq!(
            format(&Command::Associate {
                ssid: "lab",
                bssid: None,
                channel: Some(6)
            }),
            "AT+WA=lab,,6\r\n"
        );
        assert_eq!(
            format(&Command::Associate {
                ssid: "lab",
                bssid: Some("00:11:22:33:44:55"),
                channel: Some(11)
            }),
            "AT+WA=lab,00:11:22:33:44:55,11\r\n"
        );
    }

    #[test]
    fn connection_commands() {
        let remote = SocketAddrV4::new(Ipv4Addr::new(192, 168, 1, 10), 8080);
        assert_eq!(
            format(&Command::TcpClientStart { remote }),
            "AT+NCTCP=192.168.1.10,8080\r\n"
        );
        assert_eq!(
            format(&Command::UdpClientStart {
                remote,
                local_port: 9000
            }),
            "AT+NCUDP=192.168.1.10,8080,9000\r\n"
        );
        assert_eq!(format(&Command::Close { cid: b'3' }), "AT+NCLOSE=3\r\n");
    }

    #[test]
    fn optional_dns_server() {
        let primary = Ipv4Addr::new(8, 8, 8, 8);
        assert_eq!(
            format(&Command::SetDnsServers {
                primary,
                secondary: None
            }),
            "AT+DNSSET=8.8.8.8\r\n"
        );
        assert_eq!(
            format(&Command::SetDnsServers {
                primary,
                secondary: Some(Ipv4Addr::new(1, 1, 1, 1))
            }),
            "AT+DNSSET=8.8.8.8,1.1.1.1\r\n"
        );
    }

    #[test]
    fn standby_and_timing() {
        assert_eq!(
            format(&Command::Standby {
                duration_ms: 60_000,
                delay_ms: 100,
                alarm1: AlarmPolarity::ActiveLow,
                alarm2: AlarmPolarity::ActiveHigh,
            }),
            "AT+PSSTBY=60000,100,0,1\r\n"
        );
        assert_eq!(
            format(&Command::SetTiming {
                param: TimingParam::TcpConnectionTimeout,
                value: 50
            }),
            "ATS2=50\r\n"
        );
        assert_eq!(
            format(&Command::WpsPin { pin: "12345670" }),
            "AT+WWPS=2,12345670\r\n"
        );
    }

    #[test]
    fn too_long_for_buffer() {
        let mut buffer: String<8> = String::new();
        assert_eq!(
            Command::DnsLookup {
                host: "example.com"
            }
            .write_to(&mut buffer),
            Err(Error::CommandTooLong)
        );
    }

    #[test]
    fn expected_outcomes() {
        let connect = Command::TcpClientStart {
            remote: SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 1), 80),
        };
        assert_eq!(connect.name(), "AT+NCTCP");
        assert!(connect.is_expected(Outcome::ErrorSocketFail));
        assert!(!Command::At.is_expected(Outcome::ErrorSocketFail));
        assert!(Command::Standby {
            duration_ms: 1,
            delay_ms: 0,
            alarm1: AlarmPolarity::ActiveLow,
            alarm2: AlarmPolarity::ActiveLow,
        }
        .is_expected(Outcome::OutOfStandbyTimer));
    }
}
