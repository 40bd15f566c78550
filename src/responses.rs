//! # Response classification
//!
//! Every transaction drains one raw response buffer which is classified into
//! exactly one [Outcome]. Classification scans the CRLF-separated lines for
//! the fixed terminator literals, in priority order: OK first, then ERROR,
//! FAIL and the busy marker. Whole lines are matched, so an `OK` embedded in
//! unrelated content (`SEND OK`, an IP address digit) never counts as a
//! terminator.
use crate::link::LinkError;
use heapless::Vec;

/// OK terminator line
pub(crate) const OK_STATUS: &[u8] = b"OK";

/// ERROR terminator line
pub(crate) const ERROR_STATUS: &[u8] = b"ERROR";

/// FAIL terminator line
pub(crate) const FAIL_STATUS: &[u8] = b"FAIL";

/// Marker line sent while the peer is still processing a previous command
pub(crate) const BUSY_STATUS: &[u8] = b"busy p...";

/// Classified result of a single transaction
///
/// RX_SIZE: Receive buffer capacity in bytes, matching the owning link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome<const RX_SIZE: usize> {
    /// Response terminated by OK
    Ok(Vec<u8, RX_SIZE>),

    /// Response terminated by ERROR
    PeerError(Vec<u8, RX_SIZE>),

    /// Response terminated by FAIL
    PeerFail(Vec<u8, RX_SIZE>),

    /// Peer is still busy processing a previous command
    Busy,

    /// Response arrived without any recognized terminator
    Unrecognized(Vec<u8, RX_SIZE>),

    /// No data arrived before the response deadline
    Timeout,
}

impl<const RX_SIZE: usize> Outcome<RX_SIZE> {
    /// Classifies a drained response buffer. The first terminator match
    /// wins. OK is checked before the failure markers, so a success echo
    /// containing other markers still counts as success.
    pub(crate) fn classify(raw: Vec<u8, RX_SIZE>) -> Self {
        if contains_line(&raw, OK_STATUS) {
            Self::Ok(raw)
        } else if contains_line(&raw, ERROR_STATUS) {
            Self::PeerError(raw)
        } else if contains_line(&raw, FAIL_STATUS) {
            Self::PeerFail(raw)
        } else if contains_line(&raw, BUSY_STATUS) {
            Self::Busy
        } else {
            Self::Unrecognized(raw)
        }
    }

    /// Raw response bytes, for the outcomes which carry them
    pub fn raw(&self) -> Option<&[u8]> {
        match self {
            Self::Ok(raw) | Self::PeerError(raw) | Self::PeerFail(raw) | Self::Unrecognized(raw) => Some(raw),
            Self::Busy | Self::Timeout => None,
        }
    }

    /// Consumes the outcome and yields the raw response bytes, if any
    pub fn into_raw(self) -> Option<Vec<u8, RX_SIZE>> {
        match self {
            Self::Ok(raw) | Self::PeerError(raw) | Self::PeerFail(raw) | Self::Unrecognized(raw) => Some(raw),
            Self::Busy | Self::Timeout => None,
        }
    }

    /// Maps every non-OK outcome to its [CommandError] tag
    pub fn require_ok(self) -> Result<Vec<u8, RX_SIZE>, CommandError> {
        match self {
            Self::Ok(raw) => Ok(raw),
            Self::PeerError(_) => Err(CommandError::PeerError),
            Self::PeerFail(_) => Err(CommandError::PeerFail),
            Self::Busy => Err(CommandError::PeerBusy),
            Self::Unrecognized(_) => Err(CommandError::Unrecognized),
            Self::Timeout => Err(CommandError::Timeout),
        }
    }
}

/// Closed failure taxonomy shared by all session operations
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CommandError {
    /// Serial link failure
    Link(LinkError),

    /// Peer answered with the ERROR terminator
    PeerError,

    /// Peer answered with the FAIL terminator
    PeerFail,

    /// Peer is busy processing a previous command
    PeerBusy,

    /// Peer stayed silent until the response deadline
    Timeout,

    /// A response arrived without any recognized terminator
    Unrecognized,

    /// Response present but not decodable for the requested operation
    Mismatch,

    /// Encoded command exceeds the transmit buffer capacity
    Overflow,
}

impl From<LinkError> for CommandError {
    fn from(error: LinkError) -> Self {
        Self::Link(error)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CommandError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            CommandError::Link(e) => defmt::write!(f, "CommandError::Link({})", e),
            CommandError::PeerError => defmt::write!(f, "CommandError::PeerError"),
            CommandError::PeerFail => defmt::write!(f, "CommandError::PeerFail"),
            CommandError::PeerBusy => defmt::write!(f, "CommandError::PeerBusy"),
            CommandError::Timeout => defmt::write!(f, "CommandError::Timeout"),
            CommandError::Unrecognized => defmt::write!(f, "CommandError::Unrecognized"),
            CommandError::Mismatch => defmt::write!(f, "CommandError::Mismatch"),
            CommandError::Overflow => defmt::write!(f, "CommandError::Overflow"),
        }
    }
}

/// Iterator over response lines: every CRLF-terminated line, plus a trailing
/// unterminated remainder if present
pub(crate) struct Lines<'a> {
    buffer: &'a [u8],
}

pub(crate) fn lines(raw: &[u8]) -> Lines<'_> {
    Lines { buffer: raw }
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        if self.buffer.is_empty() {
            return None;
        }

        match find(self.buffer, b"\r\n") {
            Some(at) => {
                let line = &self.buffer[..at];
                self.buffer = &self.buffer[at + 2..];
                Some(line)
            }
            None => {
                let line = self.buffer;
                self.buffer = &[];
                Some(line)
            }
        }
    }
}

/// Returns true if any line equals the given token
pub(crate) fn contains_line(raw: &[u8], token: &[u8]) -> bool {
    lines(raw).any(|line| line == token)
}

/// Payload of the first line starting with the given prefix, with everything
/// up to and including the first colon stripped
pub(crate) fn prefixed_field<'a>(raw: &'a [u8], prefix: &[u8]) -> Option<&'a [u8]> {
    let line = lines(raw).find(|line| line.starts_with(prefix))?;
    let colon = line.iter().position(|&byte| byte == b':')?;
    Some(&line[colon + 1..])
}

/// First index of the needle in the haystack
pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }

    haystack.windows(needle.len()).position(|window| window == needle)
}
