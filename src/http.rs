//! # HTTP over the AT socket
//!
//! Builds literal GET/POST request bytes, runs them through the socket
//! lifecycle and hands the returned bytes to a response parser. One-shot
//! exchanges only: no chunked transfer-encoding, no redirects, no
//! persistent connections.
//!
//! Caller-supplied header blocks are sent verbatim and must carry their own
//! line terminators. No header injection validation is performed.
//!
//! ## Example
//!
//! ````
//! use esp_at_client::example::{ExampleSerial, ExampleTimer};
//! use esp_at_client::http::TextParser;
//! use esp_at_client::wifi::Adapter;
//!
//! let mut adapter: Adapter<_, _, 1_000_000, 1024, 1024> =
//!     Adapter::new(ExampleSerial::default(), ExampleTimer::default());
//!
//! let outcome = adapter
//!     .get::<TextParser>("httpbin.org", "/ip", 80, "esp-at-client", "")
//!     .unwrap();
//! assert_eq!(200, outcome.status);
//! ````
use crate::responses::{self, CommandError};
use crate::stack::StackError;
use crate::wifi::Adapter;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write as FmtWrite;
use embedded_io::{Read, ReadReady, Write};
use fugit_timer::Timer;

/// Parser collaborator consuming the raw bytes a socket transfer returned
///
/// A fresh instance is created for every request, so no state leaks between
/// unrelated exchanges.
pub trait ResponseParser: Default {
    /// Structured response representation
    type Response;

    /// Consumes the raw transfer bytes and returns the HTTP status code, or
    /// 0 if no status line was found
    fn parse(&mut self, raw: &[u8]) -> u16;

    /// Structured response. None unless the status code was 200.
    fn into_response(self) -> Option<Self::Response>;
}

/// Status code and structured response of one exchange
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpOutcome<R> {
    /// HTTP status code, 0 if the response carried no status line
    pub status: u16,

    /// Parsed response, present only for status 200
    pub response: Option<R>,
}

/// HTTP exchange errors
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HttpError {
    /// Assembled request exceeds the transmit buffer capacity
    RequestTooLarge,

    /// Socket open failed
    ConnectFailed(CommandError),

    /// Socket transfer failed
    TransferFailed(StackError),
}

#[cfg(feature = "defmt")]
impl defmt::Format for HttpError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            HttpError::RequestTooLarge => defmt::write!(f, "HttpError::RequestTooLarge"),
            HttpError::ConnectFailed(e) => defmt::write!(f, "HttpError::ConnectFailed({})", e),
            HttpError::TransferFailed(e) => defmt::write!(f, "HttpError::TransferFailed({})", e),
        }
    }
}

impl<S: Read + Write + ReadReady, T: Timer<TIMER_HZ>, const TIMER_HZ: u32, const TX_SIZE: usize, const RX_SIZE: usize>
    Adapter<S, T, TIMER_HZ, TX_SIZE, RX_SIZE>
{
    /// Performs a one-shot GET exchange
    pub fn get<P: ResponseParser>(
        &mut self,
        host: &str,
        path: &str,
        port: u16,
        user_agent: &str,
        headers: &str,
    ) -> Result<HttpOutcome<P::Response>, HttpError> {
        let request = assemble_get::<TX_SIZE>(host, path, user_agent, headers)?;
        self.exchange::<P>(host, port, &request)
    }

    /// Performs a one-shot POST exchange. The Content-Length header is
    /// always derived from the assembled body bytes, never caller-supplied.
    pub fn post<P: ResponseParser>(
        &mut self,
        host: &str,
        path: &str,
        port: u16,
        user_agent: &str,
        headers: &str,
        content_type: &str,
        content: &str,
    ) -> Result<HttpOutcome<P::Response>, HttpError> {
        let request = assemble_post::<TX_SIZE>(host, path, user_agent, headers, content_type, content)?;
        self.exchange::<P>(host, port, &request)
    }

    fn exchange<P: ResponseParser>(
        &mut self,
        host: &str,
        port: u16,
        request: &[u8],
    ) -> Result<HttpOutcome<P::Response>, HttpError> {
        if let Err(error) = self.connect(host, port) {
            let _ = self.close();
            return Err(HttpError::ConnectFailed(error));
        }

        let raw = self.transfer(request).map_err(HttpError::TransferFailed)?;

        let mut parser = P::default();
        let status = parser.parse(&raw);

        Ok(HttpOutcome {
            status,
            response: parser.into_response(),
        })
    }
}

/// Assembles the literal GET request byte sequence
pub fn assemble_get<const N: usize>(
    host: &str,
    path: &str,
    user_agent: &str,
    headers: &str,
) -> Result<heapless::Vec<u8, N>, HttpError> {
    let mut request = heapless::Vec::new();

    push_str(&mut request, "GET ")?;
    push_str(&mut request, path)?;
    push_str(&mut request, " HTTP/1.1\r\n")?;
    push_str(&mut request, headers)?;
    push_str(&mut request, "Host: ")?;
    push_str(&mut request, host)?;
    push_str(&mut request, "\r\nUser-Agent: ")?;
    push_str(&mut request, user_agent)?;
    push_str(&mut request, "\r\n\r\n")?;

    Ok(request)
}

/// Assembles the literal POST request byte sequence with a derived
/// Content-Length header
pub fn assemble_post<const N: usize>(
    host: &str,
    path: &str,
    user_agent: &str,
    headers: &str,
    content_type: &str,
    content: &str,
) -> Result<heapless::Vec<u8, N>, HttpError> {
    let mut length: heapless::String<10> = heapless::String::new();
    write!(length, "{}", content.len()).map_err(|_| HttpError::RequestTooLarge)?;

    let mut request = heapless::Vec::new();

    push_str(&mut request, "POST ")?;
    push_str(&mut request, path)?;
    push_str(&mut request, " HTTP/1.1\r\n")?;
    push_str(&mut request, headers)?;
    push_str(&mut request, "Host: ")?;
    push_str(&mut request, host)?;
    push_str(&mut request, "\r\nUser-Agent: ")?;
    push_str(&mut request, user_agent)?;
    push_str(&mut request, "\r\nContent-Type: ")?;
    push_str(&mut request, content_type)?;
    push_str(&mut request, "\r\nContent-Length: ")?;
    push_str(&mut request, &length)?;
    push_str(&mut request, "\r\n\r\n")?;
    push_str(&mut request, content)?;
    push_str(&mut request, "\r\n")?;

    Ok(request)
}

fn push_str<const N: usize>(request: &mut heapless::Vec<u8, N>, part: &str) -> Result<(), HttpError> {
    request
        .extend_from_slice(part.as_bytes())
        .map_err(|_| HttpError::RequestTooLarge)
}

/// Minimal line-based parser for the bytes a transfer returns. Scans for
/// the first HTTP status line, then splits headers and body; the body is
/// cut to Content-Length when that header is present.
#[derive(Default)]
pub struct TextParser {
    response: Option<TextResponse>,
}

/// Structured response of [TextParser]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextResponse {
    /// Response headers in received order
    pub headers: Vec<(String, String)>,

    /// Body bytes
    pub body: Vec<u8>,
}

impl ResponseParser for TextParser {
    type Response = TextResponse;

    fn parse(&mut self, raw: &[u8]) -> u16 {
        let Some(start) = responses::find(raw, b"HTTP/") else {
            return 0;
        };
        let message = &raw[start..];

        let Some(status) = parse_status_line(message) else {
            return 0;
        };

        if status == 200 {
            self.response = parse_message(message);
        }

        status
    }

    fn into_response(self) -> Option<TextResponse> {
        self.response
    }
}

/// Status code of the `HTTP/<version> <code> <reason>` line
fn parse_status_line(message: &[u8]) -> Option<u16> {
    let line = responses::lines(message).next()?;
    let text = core::str::from_utf8(line).ok()?;
    text.split(' ').nth(1)?.parse().ok()
}

/// Splits the message into headers and body
fn parse_message(message: &[u8]) -> Option<TextResponse> {
    let split = responses::find(message, b"\r\n\r\n")?;
    let header_block = &message[..split];
    let rest = &message[split + 4..];

    let mut headers = Vec::new();
    for line in responses::lines(header_block).skip(1) {
        let Ok(text) = core::str::from_utf8(line) else {
            continue;
        };
        let Some((name, value)) = text.split_once(':') else {
            continue;
        };
        headers.push((String::from(name.trim()), String::from(value.trim())));
    }

    let length = headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("Content-Length"))
        .and_then(|(_, value)| value.parse::<usize>().ok());

    let body = match length {
        Some(length) if length <= rest.len() => &rest[..length],
        _ => rest,
    };

    Some(TextResponse {
        headers,
        body: body.to_vec(),
    })
}
