//! # Socket lifecycle
//!
//! One-shot socket exchanges layered on the transaction engine: open the
//! socket, announce the payload length, wait for the transmission prompt,
//! send the payload and close. The module handles DNS and TLS internally,
//! so the remote end is addressed by hostname and port.
use crate::commands;
use crate::link::LinkError;
use crate::responses::{CommandError, Outcome};
use crate::wifi::Adapter;
use embedded_io::{Read, ReadReady, Write};
use fugit::TimerDurationU32;
use fugit_timer::Timer;
use heapless::Vec;

/// Extended settle delay for payload transmission, which takes longer than
/// a short command
const PAYLOAD_SETTLE_DELAY_MS: u32 = 2_000;

/// Transmission prompt byte sent by the peer after a length announcement
const PROMPT: u8 = b'>';

/// Socket transfer errors
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StackError {
    /// Length announcement was not answered
    AnnounceFailed(CommandError),

    /// The transmission prompt never appeared
    PromptMissing,

    /// The peer returned no data for the transmitted payload
    NoResponse,

    /// Serial link failure
    Link(LinkError),
}

#[cfg(feature = "defmt")]
impl defmt::Format for StackError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            StackError::AnnounceFailed(e) => defmt::write!(f, "StackError::AnnounceFailed({})", e),
            StackError::PromptMissing => defmt::write!(f, "StackError::PromptMissing"),
            StackError::NoResponse => defmt::write!(f, "StackError::NoResponse"),
            StackError::Link(e) => defmt::write!(f, "StackError::Link({})", e),
        }
    }
}

impl<S: Read + Write + ReadReady, T: Timer<TIMER_HZ>, const TIMER_HZ: u32, const TX_SIZE: usize, const RX_SIZE: usize>
    Adapter<S, T, TIMER_HZ, TX_SIZE, RX_SIZE>
{
    /// Opens the single socket to the given remote. SSL transport is
    /// selected for port 443, TCP for every other port.
    pub fn connect(&mut self, host: &str, port: u16) -> Result<(), CommandError> {
        let command = commands::open_socket(host, port)?;
        self.link.execute(command.as_bytes())?.require_ok()?;
        self.socket_open = true;
        Ok(())
    }

    /// Closes the socket. Safe to call defensively: without an open socket
    /// the peer answers ERROR, which is surfaced like any other outcome.
    pub fn close(&mut self) -> Result<(), CommandError> {
        self.socket_open = false;
        self.link.execute(commands::CLOSE_SOCKET)?.require_ok()?;
        Ok(())
    }

    /// Announces the payload length, awaits the prompt, transmits the
    /// payload and closes the socket unconditionally. Returns the raw bytes
    /// the peer produced in reply to the payload.
    pub(crate) fn transfer(&mut self, payload: &[u8]) -> Result<Vec<u8, RX_SIZE>, StackError> {
        let announce = commands::announce_payload(payload.len()).map_err(StackError::AnnounceFailed)?;
        let outcome = self.link.execute(announce.as_bytes()).map_err(StackError::Link)?;

        let reply = match &outcome {
            Outcome::Ok(raw) | Outcome::PeerError(raw) | Outcome::PeerFail(raw) | Outcome::Unrecognized(raw) => raw,
            Outcome::Busy => return Err(StackError::AnnounceFailed(CommandError::PeerBusy)),
            Outcome::Timeout => return Err(StackError::AnnounceFailed(CommandError::Timeout)),
        };

        if !reply.contains(&PROMPT) {
            return Err(StackError::PromptMissing);
        }

        let response = self
            .link
            .execute_with_delay(payload, TimerDurationU32::millis(PAYLOAD_SETTLE_DELAY_MS))
            .map_err(StackError::Link)?;
        let _ = self.close();

        response.into_raw().ok_or(StackError::NoResponse)
    }
}
