//! Parsers for the text of completed command responses.
//!
//! All parsers work on the raw response buffer, which may hold several
//! lines (command echo, information lines and the final `OK`).

use core::str::FromStr;

use heapless::String;
use no_std_net::Ipv4Addr;

use crate::classify::{contains, find};
use crate::error::Error;
use crate::hex::decode_hex;
use crate::session::INVALID_CID;

const CONNECT: &[u8] = b"CONNECT";
/// Offset of the connection id from the start of `CONNECT`, as in `CONNECT 0`
const CID_OFFSET: usize = 8;

const NOT_ASSOCIATED: &[u8] = b"BSSID=00:00:00:00:00:00";
const IP_ADDRESS: &[u8] = b"IP addr=";
const DNS_ADDRESS: &[u8] = b"IP:";
const WPS_SSID: &[u8] = b"SSID=";

/// Length of `xx:xx:xx:xx:xx:xx`
const MAC_TEXT_LEN: usize = 17;

fn connect_cid(response: &[u8]) -> Option<u8> {
    let start = find(response, CONNECT)?;
    response.get(start + CID_OFFSET).copied()
}

/// Connection id from the answer to `AT+NCTCP`, or [`INVALID_CID`].
pub fn parse_tcp_client_cid(response: &[u8]) -> u8 {
    connect_cid(response).unwrap_or(INVALID_CID)
}

/// Connection id from the answer to `AT+NCUDP`, or [`INVALID_CID`].
pub fn parse_udp_client_cid(response: &[u8]) -> u8 {
    connect_cid(response).unwrap_or(INVALID_CID)
}

/// Connection id from the answer to `AT+NSTCP` or `AT+NSUDP`.
pub fn parse_server_start_cid(response: &[u8]) -> Option<u8> {
    connect_cid(response)
}

/// Whether an `AT+NSTAT=?` report shows an association.
pub fn parse_wlan_conn_stat(response: &[u8]) -> bool {
    !contains(response, NOT_ASSOCIATED)
}

/// MAC address text around the first `:`, with the colons removed.
pub fn parse_mac(response: &[u8]) -> Option<String<12>> {
    let colon = find(response, b":")?;
    let start = colon.checked_sub(2)?;
    let text = response.get(start..start + MAC_TEXT_LEN)?;

    let mut mac = String::new();
    for byte in text.iter().filter(|b| **b != b':') {
        mac.push(*byte as char).ok()?;
    }
    Some(mac)
}

/// Station IP address from an `AT+NSTAT=?` report.
///
/// An address starting with `0` means none has been assigned yet.
pub fn parse_node_ip_address(response: &[u8]) -> Option<Ipv4Addr> {
    let start = find(response, IP_ADDRESS)? + IP_ADDRESS.len();
    let token = token(&response[start..], |b| matches!(b, b':' | b' ' | b'\r' | b'\n'))?;
    if token.starts_with('0') {
        return None;
    }
    Ipv4Addr::from_str(token).ok()
}

/// Signal strength in dBm from the answer to `AT+WRSSI=?`.
pub fn parse_rssi(response: &[u8]) -> Option<i16> {
    let start = find(response, b"-")?;
    let digits = response[start + 1..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits == 0 {
        return Some(0);
    }
    let text = core::str::from_utf8(&response[start..start + 1 + digits]).ok()?;
    i16::from_str(text).ok()
}

/// Resolved address from the answer to `AT+DNSLOOKUP`.
pub fn parse_dns_lookup(response: &[u8]) -> Option<Ipv4Addr> {
    let start = find(response, DNS_ADDRESS)? + DNS_ADDRESS.len();
    let token = token(&response[start..], |b| matches!(b, b' ' | b'\r' | b'\n'))?;
    Ipv4Addr::from_str(token).ok()
}

/// Whether a WPS attempt reported the network it joined.
pub fn parse_wps(response: &[u8]) -> bool {
    contains(response, WPS_SSID)
}

/// First non-empty run of bytes between delimiters.
fn token(bytes: &[u8], is_delimiter: impl Fn(u8) -> bool) -> Option<&str> {
    let start = bytes.iter().position(|b| !is_delimiter(*b))?;
    let rest = &bytes[start..];
    let end = rest
        .iter()
        .position(|b| is_delimiter(*b))
        .unwrap_or(rest.len());
    core::str::from_utf8(&rest[..end]).ok()
}

/// Station MAC address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// Decode the twelve hex characters produced by [`parse_mac`].
    pub fn from_hex(text: &str) -> Result<Self, Error> {
        let bytes = decode_hex::<6>(text).map_err(|_| Error::Parse)?;
        let octets: [u8; 6] = bytes.as_slice().try_into().map_err(|_| Error::Parse)?;
        Ok(Self(octets))
    }
}

impl core::fmt::Display for MacAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            a, b, c, d, e, g
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NSTAT: &[u8] = b"MAC=00:1d:c9:01:02:03    WSTATE=CONNECTED     MODE=NONE\r\n\
BSSID=00:24:a5:11:22:33   SSID=\"lab\"   CHANNEL=6   SECURITY=WPA2-PERSONAL\r\n\
RSSI=-52\r\n\
IP addr=192.168.1.5   SubNet=255.255.255.0  Gateway=192.168.1.1\r\n\
DNS1=192.168.1.1       DNS2=0.0.0.0\r\n\
OK\r\n";

    #[test]
    fn client_cid() {
        assert_eq!(parse_tcp_client_cid(b"\r\nCONNECT 0\r\nOK\r\n"), b'0');
        assert_eq!(parse_udp_client_cid(b"CONNECT 3\r\nOK\r\n"), b'3');
        assert_eq!(parse_tcp_client_cid(b"ERROR\r\n"), INVALID_CID);
        assert_eq!(parse_tcp_client_cid(b"CONNECT"), INVALID_CID);
    }

    #[test]
    fn server_cid() {
        assert_eq!(parse_server_start_cid(b"CONNECT 1\r\nOK\r\n"), Some(b'1'));
        assert_eq!(
            parse_server_start_cid(b"ERROR: SOCKET FAILURE\r\n"),
            None
        );
    }

    #[test]
    fn association_status() {
        assert!(parse_wlan_conn_stat(NSTAT));
        assert!(!parse_wlan_conn_stat(
            b"MAC=00:1d:c9:01:02:03 WSTATE=NOT CONNECTED\r\nBSSID=00:00:00:00:00:00 SSID=\"\"\r\nOK\r\n"
        ));
    }

    #[test]
    fn mac_address() {
        let mac = parse_mac(b"00:1D:C9:01:02:03\r\nOK\r\n").unwrap();
        assert_eq!(mac, "001DC9010203");
        assert_eq!(
            MacAddress::from_hex(&mac),
            Ok(MacAddress([0x00, 0x1d, 0xc9, 0x01, 0x02, 0x03]))
        );

        assert_eq!(parse_mac(b"OK\r\n"), None);
        assert_eq!(parse_mac(b"0:1\r\n"), None);
        assert_eq!(MacAddress::from_hex("00112233"), Err(Error::Parse));
    }

    #[test]
    fn mac_display() {
        let mac = MacAddress([0x00, 0x1d, 0xc9, 0x01, 0x02, 0x03]);
        let mut text: String<17> = String::new();
        core::fmt::Write::write_fmt(&mut text, format_args!("{}", mac)).unwrap();
        assert_eq!(text, "00:1d:c9:01:02:03");
    }

    #[test]
    fn node_ip_address() {
        assert_eq!(
            parse_node_ip_address(NSTAT),
            Some(Ipv4Addr::new(192, 168, 1, 5))
        );
        assert_eq!(
            parse_node_ip_address(b"IP addr=0.0.0.0   SubNet=0.0.0.0\r\n"),
            None
        );
        assert_eq!(parse_node_ip_address(b"OK\r\n"), None);
    }

    #[test]
    fn rssi() {
        assert_eq!(parse_rssi(b"-67\r\nOK\r\n"), Some(-67));
        // The first dash wins, even when it is not followed by a number
        assert_eq!(parse_rssi(b"WPA2-PERSONAL RSSI=-52\r\n"), Some(0));
        assert_eq!(parse_rssi(b"OK\r\n"), None);
    }

    #[test]
    fn dns_lookup() {
        assert_eq!(
            parse_dns_lookup(b"IP:93.184.216.34\r\nOK\r\n"),
            Some(Ipv4Addr::new(93, 184, 216, 34))
        );
        assert_eq!(parse_dns_lookup(b"ERROR\r\n"), None);
    }

    #[test]
    fn wps() {
        assert!(parse_wps(b"SSID=lab\r\nCHANNEL=6\r\nOK\r\n"));
        assert!(!parse_wps(b"ERROR\r\n"));
    }
}
