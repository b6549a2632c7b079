//! Network plumbing
//!
//! Blocking implementations of the core HTTP and radio traits on top
//! of esp-radio and embassy-net. The net stack runner lives on the
//! interrupt executor, so blocking on socket futures from the
//! dashboard task is safe.
//!
//! The client speaks plain HTTP/1.0. TLS is not terminated on the
//! device; `https` URLs are rewritten through the LAN metrics proxy
//! configured at construction, and rejected if there is none.

use core::cell::RefCell;
use core::net::Ipv4Addr;

use embassy_futures::block_on;
use embassy_net::dns::DnsQueryType;
use embassy_net::tcp::TcpSocket;
use embassy_net::{IpAddress, Stack};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_time::{Duration, WithTimeout};
use embedded_io_async::{Read as _, Write as _};
use esp_radio::wifi::{ClientConfig, ModeConfig, WifiController};
use heapless::String;
use log::{debug, warn};

use tally_core::config::MAX_URL_LEN;
use tally_core::traits::http::{HttpClient, HttpError, HttpResponse};
use tally_core::traits::radio::{RadioError, WifiRadio};

/// Socket buffer sizes; one socket serves the whole dashboard
pub const RX_BUFFER_BYTES: usize = 4096;
pub const TX_BUFFER_BYTES: usize = 1024;

/// Response headers larger than this are rejected
const MAX_HEADER_BYTES: usize = 2048;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DHCP_TIMEOUT: Duration = Duration::from_secs(15);

/// The one TCP socket, parked here between a response being dropped
/// and the next request.
static PARKED_SOCKET: BlockingMutex<CriticalSectionRawMutex, RefCell<Option<TcpSocket<'static>>>> =
    BlockingMutex::new(RefCell::new(None));

struct ParsedUrl<'a> {
    host: &'a str,
    port: u16,
    path: &'a str,
}

fn parse_url(url: &str) -> Result<ParsedUrl<'_>, HttpError> {
    let rest = url.strip_prefix("http://").ok_or(HttpError::Protocol)?;
    let (host_port, path) = match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, "/"),
    };
    let (host, port) = match host_port.rsplit_once(':') {
        Some((host, port)) => (host, port.parse().map_err(|_| HttpError::Protocol)?),
        None => (host_port, 80),
    };
    if host.is_empty() {
        return Err(HttpError::Protocol);
    }
    Ok(ParsedUrl { host, port, path })
}

/// Blocking HTTP/1.0 client over one reusable TCP socket
pub struct TcpHttpClient {
    stack: Stack<'static>,
    socket: Option<TcpSocket<'static>>,
    proxy_base: Option<String<MAX_URL_LEN>>,
}

impl TcpHttpClient {
    pub fn new(
        stack: Stack<'static>,
        rx_buffer: &'static mut [u8],
        tx_buffer: &'static mut [u8],
        proxy_base: Option<String<MAX_URL_LEN>>,
    ) -> Self {
        let mut socket = TcpSocket::new(stack, rx_buffer, tx_buffer);
        socket.set_timeout(Some(CONNECT_TIMEOUT));
        Self {
            stack,
            socket: Some(socket),
            proxy_base,
        }
    }

    /// `https` cannot terminate on the device; route it through the
    /// proxy, which expects the original URL appended to its base.
    fn rewrite<'u>(
        &self,
        url: &'u str,
        rewritten: &'u mut String<{ 2 * MAX_URL_LEN }>,
    ) -> Result<&'u str, HttpError> {
        if url.starts_with("http://") {
            return Ok(url);
        }
        if !url.starts_with("https://") {
            return Err(HttpError::Protocol);
        }
        let base = self.proxy_base.as_ref().ok_or(HttpError::Protocol)?;
        rewritten
            .push_str(base.as_str())
            .and_then(|_| rewritten.push_str(url))
            .map_err(|_| HttpError::Protocol)?;
        Ok(rewritten.as_str())
    }

    fn reclaim_socket(&mut self) -> Result<TcpSocket<'static>, HttpError> {
        if let Some(socket) = self.socket.take() {
            return Ok(socket);
        }
        PARKED_SOCKET
            .lock(|slot| slot.borrow_mut().take())
            .ok_or(HttpError::Connect)
    }

    async fn resolve(&self, host: &str) -> Result<IpAddress, HttpError> {
        if let Ok(addr) = host.parse::<Ipv4Addr>() {
            return Ok(IpAddress::Ipv4(addr));
        }
        let addrs = self
            .stack
            .dns_query(host, DnsQueryType::A)
            .await
            .map_err(|_| HttpError::Connect)?;
        addrs.first().copied().ok_or(HttpError::Connect)
    }
}

impl HttpClient for TcpHttpClient {
    type Response = TcpHttpResponse;

    fn get(&mut self, url: &str) -> Result<TcpHttpResponse, HttpError> {
        let mut rewritten = String::new();
        let url = self.rewrite(url, &mut rewritten)?;
        let target = parse_url(url)?;

        let mut socket = self.reclaim_socket()?;
        let result = block_on(async {
            let addr = self.resolve(target.host).await?;
            socket
                .connect((addr, target.port))
                .await
                .map_err(|_| HttpError::Connect)?;

            let mut request: String<{ MAX_HEADER_BYTES }> = String::new();
            core::fmt::Write::write_fmt(
                &mut request,
                format_args!(
                    "GET {} HTTP/1.0\r\nHost: {}\r\nUser-Agent: tally/0.1\r\nConnection: close\r\n\r\n",
                    target.path, target.host
                ),
            )
            .map_err(|_| HttpError::Protocol)?;
            socket
                .write_all(request.as_bytes())
                .await
                .map_err(|_| HttpError::Io)?;
            socket.flush().await.map_err(|_| HttpError::Io)?;

            read_header(&mut socket).await
        });

        match result {
            Ok(header) => {
                debug!("GET {} -> {}", url, header.status);
                Ok(TcpHttpResponse {
                    socket: Some(socket),
                    status: header.status,
                    content_length: header.content_length,
                    leftover: header.leftover,
                    leftover_pos: 0,
                })
            }
            Err(e) => {
                warn!("GET {} failed: {:?}", url, e);
                socket.abort();
                self.socket = Some(socket);
                Err(e)
            }
        }
    }
}

struct Header {
    status: u16,
    content_length: Option<u64>,
    leftover: heapless::Vec<u8, MAX_HEADER_BYTES>,
}

/// Read until the blank line, keeping any body bytes that arrived in
/// the same reads.
async fn read_header(socket: &mut TcpSocket<'static>) -> Result<Header, HttpError> {
    let mut buf: heapless::Vec<u8, MAX_HEADER_BYTES> = heapless::Vec::new();
    let terminator = loop {
        if let Some(pos) = find_terminator(&buf) {
            break pos;
        }
        if buf.is_full() {
            return Err(HttpError::Protocol);
        }
        let start = buf.len();
        let capacity = buf.capacity();
        buf.resize_default(capacity).ok();
        let n = socket
            .read(&mut buf[start..])
            .await
            .map_err(|_| HttpError::Io)?;
        buf.truncate(start + n);
        if n == 0 {
            return Err(HttpError::Protocol);
        }
    };

    let header_text = core::str::from_utf8(&buf[..terminator]).map_err(|_| HttpError::Protocol)?;
    let mut lines = header_text.split("\r\n");
    let status_line = lines.next().ok_or(HttpError::Protocol)?;
    let status: u16 = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .ok_or(HttpError::Protocol)?;

    let mut content_length = None;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse::<u64>().ok();
            }
        }
    }

    let mut leftover = heapless::Vec::new();
    leftover
        .extend_from_slice(&buf[terminator + 4..])
        .map_err(|_| HttpError::Protocol)?;
    Ok(Header {
        status,
        content_length,
        leftover,
    })
}

fn find_terminator(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Response body stream; dropping it closes the connection and parks
/// the socket for the next request.
pub struct TcpHttpResponse {
    socket: Option<TcpSocket<'static>>,
    status: u16,
    content_length: Option<u64>,
    leftover: heapless::Vec<u8, MAX_HEADER_BYTES>,
    leftover_pos: usize,
}

impl HttpResponse for TcpHttpResponse {
    fn status(&self) -> u16 {
        self.status
    }

    fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, HttpError> {
        if self.leftover_pos < self.leftover.len() {
            let n = buf.len().min(self.leftover.len() - self.leftover_pos);
            buf[..n].copy_from_slice(&self.leftover[self.leftover_pos..self.leftover_pos + n]);
            self.leftover_pos += n;
            return Ok(n);
        }
        let socket = self.socket.as_mut().ok_or(HttpError::Io)?;
        block_on(socket.read(buf)).map_err(|_| HttpError::Io)
    }
}

impl Drop for TcpHttpResponse {
    fn drop(&mut self) {
        if let Some(mut socket) = self.socket.take() {
            socket.abort();
            PARKED_SOCKET.lock(|slot| slot.borrow_mut().replace(socket));
        }
    }
}

/// Core radio trait over the esp-radio Wi-Fi controller
pub struct EspRadio {
    controller: WifiController<'static>,
    stack: Stack<'static>,
    started: bool,
}

impl EspRadio {
    pub fn new(controller: WifiController<'static>, stack: Stack<'static>) -> Self {
        Self {
            controller,
            stack,
            started: false,
        }
    }
}

impl WifiRadio for EspRadio {
    fn probe(&mut self) -> Result<(), RadioError> {
        self.controller
            .capabilities()
            .map(|_| ())
            .map_err(|_| RadioError::Unresponsive)
    }

    fn reset(&mut self) {
        let _ = block_on(self.controller.stop_async());
        self.started = false;
    }

    fn join(&mut self, ssid: &str, password: &str) -> Result<(), RadioError> {
        block_on(async {
            let client_config = ClientConfig::default()
                .with_ssid(ssid.into())
                .with_password(password.into());
            self.controller
                .set_config(&ModeConfig::Client(client_config))
                .map_err(|_| RadioError::JoinFailed)?;

            if !self.started {
                self.controller
                    .start_async()
                    .await
                    .map_err(|_| RadioError::JoinFailed)?;
                self.started = true;
            }

            self.controller
                .connect_async()
                .await
                .map_err(|_| RadioError::JoinFailed)?;

            // Joined is not usable until DHCP hands out a lease
            self.stack
                .wait_config_up()
                .with_timeout(DHCP_TIMEOUT)
                .await
                .map_err(|_| RadioError::JoinFailed)
        })
    }

    fn is_connected(&self) -> bool {
        self.controller.is_connected().unwrap_or(false)
    }
}
