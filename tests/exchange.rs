//! End to end exchanges with a scripted module over the public API.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::Once;

use embassy_time::{Duration, Instant};
use env_logger::Env;
use gainspan_s2w::{
    Client, Clock, Command, Error, Ipv4Addr, Outcome, ReceivedData, SocketAddrV4, INVALID_CID,
};

static INIT: Once = Once::new();

fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
            .is_test(true)
            .try_init();
    });
}

/// Stream that answers every write with the next scripted reply.
#[derive(Default)]
struct Module {
    sent: Vec<u8>,
    pending: VecDeque<u8>,
    replies: VecDeque<&'static [u8]>,
}

impl Module {
    fn answering(replies: &[&'static [u8]]) -> Self {
        Self {
            replies: replies.iter().copied().collect(),
            ..Default::default()
        }
    }
}

impl embedded_io::ErrorType for Module {
    type Error = Infallible;
}

impl embedded_io::Write for Module {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Infallible> {
        self.sent.extend_from_slice(buf);
        if let Some(reply) = self.replies.pop_front() {
            self.pending.extend(reply.iter().copied());
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

impl embedded_io::Read for Module {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Infallible> {
        let mut n = 0;
        while n < buf.len() {
            let Some(byte) = self.pending.pop_front() else {
                break;
            };
            buf[n] = byte;
            n += 1;
        }
        Ok(n)
    }
}

impl embedded_io::ReadReady for Module {
    fn read_ready(&mut self) -> Result<bool, Infallible> {
        Ok(!self.pending.is_empty())
    }
}

/// Clock that moves forward a fixed step on every reading.
struct SteppingClock {
    now: Instant,
    step: Duration,
}

impl SteppingClock {
    fn new(step: Duration) -> Self {
        Self {
            now: Instant::from_ticks(0),
            step,
        }
    }
}

impl Clock for SteppingClock {
    fn now(&mut self) -> Instant {
        self.now += self.step;
        self.now
    }
}

type TestClient = Client<Module, SteppingClock, ReceivedData<64>>;

fn client(replies: &[&'static [u8]]) -> TestClient {
    init_logging();
    Client::new(
        Module::answering(replies),
        SteppingClock::new(Duration::from_millis(1)),
        ReceivedData::new(),
    )
}

#[test]
fn network_status_reports_address() {
    let mut client = client(&[
        b"AT+NSTAT=?\r\n\r\nMAC=00:1d:c9:01:02:03    WSTATE=CONNECTED\r\n\
BSSID=00:24:a5:11:22:33   SSID=\"lab\"   CHANNEL=6\r\n\
IP addr=192.168.1.5   SubNet=255.255.255.0  Gateway=192.168.1.1\r\nOK\r\n",
    ]);

    assert_eq!(client.ip_address(), Ok(Ipv4Addr::new(192, 168, 1, 5)));

    let (module, _, _) = client.release();
    assert_eq!(module.sent, b"AT+NSTAT=?\r\n");
}

#[test]
fn tcp_session_lifecycle() {
    let mut client = client(&[b"\r\nCONNECT 0\r\n\r\nOK\r\n"]);
    let remote = SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 2), 4000);

    let cid = client.connect_tcp(remote).unwrap();
    assert_eq!(cid, b'0');
    assert_eq!(client.session().tcp_cid(), Some(b'0'));

    client.send_tcp_data(cid, b"ping").unwrap();

    client.sink_mut().prepare(cid);
    client
        .transport_mut()
        .pending
        .extend(b"\x1bS0pong\x1bE\r\nDISCONNECT 0\r\n".iter().copied());
    assert_eq!(client.poll(), Ok(Some(Outcome::Disconnect)));
    assert_eq!(client.sink().data(), b"pong");
    assert_eq!(client.session().tcp_cid(), None);

    let (module, _, _) = client.release();
    assert_eq!(module.sent, b"AT+NCTCP=10.0.0.2,4000\r\n\x1bS0ping\x1bE");
}

#[test]
fn module_reset_is_reported() {
    let mut client = client(&[]);
    client.session_mut().set_associated();
    client
        .transport_mut()
        .pending
        .extend(b"\r\nSerial2WiFi APP\r\n".iter().copied());

    assert_eq!(client.poll(), Ok(Some(Outcome::WelcomeMessage)));
    assert!(client.session().is_reset_detected());
    assert!(!client.session().is_associated());
}

#[test]
fn error_response_is_surfaced() {
    let mut client = client(&[b"\r\nERROR: SOCKET FAILURE\r\n"]);

    assert_eq!(
        client.send_command(&Command::TcpServerStart { port: 80 }),
        Ok(Outcome::ErrorSocketFail)
    );
    assert_eq!(
        client.check(),
        Err(Error::Outcome(Outcome::ResponseTimeout))
    );
}

#[test]
fn data_needs_a_connection() {
    let mut client = client(&[]);
    let cid = client.session().tcp_cid().unwrap_or(INVALID_CID);

    assert_eq!(client.send_tcp_data(cid, b"x"), Err(Error::InvalidCid));
    assert_eq!(client.send_bulk_data(b'1', &[0; 10_000]), Err(Error::PayloadTooLong));
}
