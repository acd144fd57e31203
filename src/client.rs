use core::marker::PhantomData;

use embassy_time::{Duration, Instant};
use heapless::String;
use no_std_net::{Ipv4Addr, SocketAddrV4};

use crate::classify::Outcome;
use crate::clock::Clock;
use crate::command::responses::{
    parse_dns_lookup, parse_mac, parse_node_ip_address, parse_rssi, parse_tcp_client_cid,
    parse_udp_client_cid, parse_wlan_conn_stat, MacAddress,
};
use crate::command::{Command, TX_BUFFER_SIZE};
use crate::config::{DefaultConfig, S2wConfig};
use crate::digest::{Digester, RX_BUFFER_SIZE};
use crate::error::Error;
use crate::framing::Frame;
use crate::session::{Session, INVALID_CID};
use crate::sink::DataSink;
use crate::transport::Transport;

const ESCAPE_SEQUENCE: &[u8] = b"+++";
const LINE_END: &[u8] = b"\r\n";

/// Command and response engine for a Serial2WiFi module.
///
/// The client owns the transport, the receive state machine and the session
/// state. All methods block until their exchange with the module is done.
/// Only one command can be outstanding at a time; use
/// [`SharedClient`](crate::shared::SharedClient) to share a client between
/// execution contexts.
pub struct Client<T, C, S, Cfg = DefaultConfig>
where
    T: Transport,
    C: Clock,
    S: DataSink,
{
    transport: T,
    clock: C,
    sink: S,
    digester: Digester<RX_BUFFER_SIZE>,
    session: Session,
    tx: String<TX_BUFFER_SIZE>,
    _config: PhantomData<Cfg>,
}

impl<T, C, S, Cfg> Client<T, C, S, Cfg>
where
    T: Transport,
    C: Clock,
    S: DataSink,
    Cfg: S2wConfig,
{
    pub fn new(transport: T, clock: C, sink: S) -> Self {
        Self {
            transport,
            clock,
            sink,
            digester: Digester::new(),
            session: Session::new(),
            tx: String::new(),
            _config: PhantomData,
        }
    }

    /// Reset the receive state machine and forget all session state.
    pub fn init(&mut self) {
        self.digester.reset();
        self.session = Session::new();
    }

    pub fn release(self) -> (T, C, S) {
        (self.transport, self.clock, self.sink)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Text of the most recent response, for the parsers in
    /// [`command::responses`](crate::command::responses).
    pub fn response(&self) -> &[u8] {
        self.digester.buffer()
    }

    pub fn flush_response(&mut self) {
        self.digester.flush();
    }

    /// Send a command and wait for its outcome.
    ///
    /// A silent module yields `Ok(Outcome::ResponseTimeout)`; `Err` is only
    /// returned for local failures.
    pub fn send_command(&mut self, cmd: &Command<'_>) -> Result<Outcome, Error> {
        cmd.write_to(&mut self.tx)?;
        let outcome = self.send_buffered()?;
        if !cmd.is_expected(outcome) {
            warn!("Unexpected outcome {:?} for {}", outcome, cmd.name());
        }
        Ok(outcome)
    }

    /// Send preformatted command text, which must include its line
    /// terminator, and wait for the outcome.
    pub fn send_raw(&mut self, text: &str) -> Result<Outcome, Error> {
        self.tx.clear();
        self.tx
            .push_str(text)
            .map_err(|_| Error::CommandTooLong)?;
        self.send_buffered()
    }

    fn send_buffered(&mut self) -> Result<Outcome, Error> {
        debug!("Sending command: {:?}", lossy!(self.tx.as_bytes()));
        self.transport
            .write_all(self.tx.as_bytes())
            .map_err(|_e| Error::Transport)?;
        self.wait_for_response()
    }

    /// Read and process bytes until a terminal outcome arrives.
    ///
    /// The response buffer is cleared first. The timeout restarts on every
    /// received byte, so a slow but steady response never times out.
    pub fn wait_for_response(&mut self) -> Result<Outcome, Error> {
        self.digester.flush();
        loop {
            let Some(byte) = self.read_byte_within(Cfg::RESPONSE_TIMEOUT)? else {
                warn!("No response within {} ms", Cfg::RESPONSE_TIMEOUT.as_millis());
                return Ok(Outcome::ResponseTimeout);
            };
            let outcome = self.process_byte(byte)?;
            if outcome.is_terminal() {
                return Ok(outcome);
            }
        }
    }

    /// Run one received byte through the receive state machine.
    ///
    /// When the byte opens framed data, the rest of the frame is read from
    /// the transport before returning, so the caller never sees a partial
    /// frame.
    pub fn process_byte(&mut self, byte: u8) -> Result<Outcome, Error> {
        let outcome = self.digester.feed(byte, &mut self.sink);
        self.complete_frame()?;
        self.session.observe(outcome);
        Ok(outcome)
    }

    /// Run a received chunk through the receive state machine, stopping at
    /// the first terminal outcome.
    ///
    /// Returns the outcome and the number of bytes consumed. A chunk may end
    /// in the middle of framed data; the next chunk continues it.
    pub fn process_chunk(&mut self, chunk: &[u8]) -> Result<(Outcome, usize), Error> {
        let (outcome, consumed) = self.digester.feed_slice(chunk, &mut self.sink);
        self.session.observe(outcome);
        Ok((outcome, consumed))
    }

    /// Process every byte that is currently available, without waiting.
    ///
    /// Returns the last terminal outcome seen, such as an asynchronous
    /// `DISCONNECT`.
    pub fn poll(&mut self) -> Result<Option<Outcome>, Error> {
        let mut last = None;
        while let Some(byte) = self.try_read_byte()? {
            let outcome = self.process_byte(byte)?;
            if outcome.is_terminal() {
                last = Some(outcome);
            }
        }
        Ok(last)
    }

    /// Discard incoming bytes until the line has been quiet for
    /// [`S2wConfig::FLUSH_QUIET_TIME`].
    pub fn flush_incoming(&mut self) -> Result<(), Error> {
        let mut discarded = 0usize;
        while self.read_byte_within(Cfg::FLUSH_QUIET_TIME)?.is_some() {
            discarded += 1;
        }
        if discarded > 0 {
            debug!("Flushed {} incoming bytes", discarded);
        }
        self.digester.reset();
        Ok(())
    }

    /// Send data on a TCP connection, or a UDP client connection.
    pub fn send_tcp_data(&mut self, cid: u8, data: &[u8]) -> Result<(), Error> {
        self.send_frame(&Frame::Inline { cid, payload: data })
    }

    /// Send data on a UDP connection. A UDP server connection needs the
    /// address of the peer to answer.
    pub fn send_udp_data(
        &mut self,
        cid: u8,
        data: &[u8],
        peer: Option<SocketAddrV4>,
    ) -> Result<(), Error> {
        match peer {
            Some(peer) => self.send_frame(&Frame::UdpServer {
                cid,
                peer,
                payload: data,
            }),
            None => self.send_frame(&Frame::Inline { cid, payload: data }),
        }
    }

    /// Send arbitrary binary data as a length prefixed bulk frame.
    pub fn send_bulk_data(&mut self, cid: u8, data: &[u8]) -> Result<(), Error> {
        self.send_frame(&Frame::Bulk { cid, payload: data })
    }

    fn send_frame(&mut self, frame: &Frame<'_>) -> Result<(), Error> {
        if frame.cid() == INVALID_CID {
            return Err(Error::InvalidCid);
        }
        let header = frame.header()?;
        trace!(
            "Sending {} bytes on cid {}",
            frame.payload().len(),
            frame.cid()
        );

        self.write(&header)?;
        if frame.needs_settle_time() {
            self.clock.block_for(Cfg::BULK_SETTLE_TIME);
        }
        self.write(frame.payload())?;
        self.write(frame.trailer())
    }

    /// Leave data mode with the `+++` escape.
    pub fn switch_to_command_mode(&mut self) -> Result<(), Error> {
        self.write(ESCAPE_SEQUENCE)?;
        self.clock.block_for(Cfg::ESCAPE_GUARD_TIME);
        self.write(LINE_END)
    }

    pub fn check(&mut self) -> Result<(), Error> {
        self.send_command(&Command::At)?.into_result()
    }

    /// Associate with a network, marking the session associated on success.
    pub fn associate(
        &mut self,
        ssid: &str,
        bssid: Option<&str>,
        channel: Option<u8>,
    ) -> Result<(), Error> {
        self.send_command(&Command::Associate {
            ssid,
            bssid,
            channel,
        })?
        .into_result()?;
        info!("Associated with {}", ssid);
        self.session.set_associated();
        Ok(())
    }

    pub fn disassociate(&mut self) -> Result<(), Error> {
        self.send_command(&Command::Disassociate)?.into_result()?;
        self.session.clear_associated();
        self.session.clear_all_cids();
        Ok(())
    }

    /// Open a TCP client connection and return its connection id.
    pub fn connect_tcp(&mut self, remote: SocketAddrV4) -> Result<u8, Error> {
        self.send_command(&Command::TcpClientStart { remote })?
            .into_result()?;
        let cid = parse_tcp_client_cid(self.response());
        if cid == INVALID_CID {
            return Err(Error::Parse);
        }
        self.session.save_tcp_cid(cid);
        Ok(cid)
    }

    /// Open a UDP client connection and return its connection id.
    pub fn connect_udp(&mut self, remote: SocketAddrV4, local_port: u16) -> Result<u8, Error> {
        self.send_command(&Command::UdpClientStart { remote, local_port })?
            .into_result()?;
        let cid = parse_udp_client_cid(self.response());
        if cid == INVALID_CID {
            return Err(Error::Parse);
        }
        self.session.save_udp_cid(cid);
        Ok(cid)
    }

    pub fn close(&mut self, cid: u8) -> Result<(), Error> {
        self.send_command(&Command::Close { cid })?.into_result()?;
        self.session.forget_cid(cid);
        Ok(())
    }

    pub fn close_all(&mut self) -> Result<(), Error> {
        self.send_command(&Command::CloseAll)?.into_result()?;
        self.session.clear_all_cids();
        Ok(())
    }

    /// Ask the module whether it is associated and update the session.
    pub fn query_association(&mut self) -> Result<bool, Error> {
        self.send_command(&Command::NetworkStatus)?.into_result()?;
        let associated = parse_wlan_conn_stat(self.response());
        if associated {
            self.session.set_associated();
        } else {
            self.session.clear_associated();
        }
        Ok(associated)
    }

    pub fn ip_address(&mut self) -> Result<Ipv4Addr, Error> {
        self.send_command(&Command::NetworkStatus)?.into_result()?;
        parse_node_ip_address(self.response()).ok_or(Error::Parse)
    }

    pub fn rssi(&mut self) -> Result<i16, Error> {
        self.send_command(&Command::GetRssi)?.into_result()?;
        parse_rssi(self.response()).ok_or(Error::Parse)
    }

    pub fn mac_address(&mut self) -> Result<MacAddress, Error> {
        self.send_command(&Command::GetMac)?.into_result()?;
        let text = parse_mac(self.response()).ok_or(Error::Parse)?;
        MacAddress::from_hex(&text)
    }

    pub fn dns_lookup(&mut self, host: &str) -> Result<Ipv4Addr, Error> {
        self.send_command(&Command::DnsLookup { host })?
            .into_result()?;
        parse_dns_lookup(self.response()).ok_or(Error::Parse)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.transport
            .write_all(bytes)
            .map_err(|_e| Error::Transport)
    }

    fn try_read_byte(&mut self) -> Result<Option<u8>, Error> {
        self.transport.try_read_byte().map_err(|_e| {
            error!("Transport read failed");
            Error::Transport
        })
    }

    /// Wait up to `timeout` for the next byte.
    fn read_byte_within(&mut self, timeout: Duration) -> Result<Option<u8>, Error> {
        let start: Instant = self.clock.now();
        loop {
            if let Some(byte) = self.try_read_byte()? {
                return Ok(Some(byte));
            }
            if self.clock.elapsed_since(start) >= timeout {
                return Ok(None);
            }
        }
    }

    /// Keep reading while the receive state machine is inside framed data.
    fn complete_frame(&mut self) -> Result<(), Error> {
        while self.digester.in_framed_data() {
            match self.read_byte_within(Cfg::RESPONSE_TIMEOUT)? {
                Some(byte) => {
                    self.digester.feed(byte, &mut self.sink);
                }
                None => {
                    warn!(
                        "Framed data on cid {} stalled, dropping frame",
                        self.digester.current_cid()
                    );
                    self.digester.abort();
                }
            }
        }
        Ok(())
    }
}
