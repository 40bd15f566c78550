//! # AT transaction engine
//!
//! One transaction is a full write, settle, poll, drain and classify cycle
//! against the serial peer: the command bytes are written verbatim, a fixed
//! settle delay gives the peer time to start answering, then the channel is
//! polled for the first pending byte until the response deadline and drained
//! in chunks while it reports data. The drained buffer is classified into
//! exactly one [Outcome].
//!
//! At most one transaction is ever outstanding. The link exclusively owns
//! the serial handle and blocks the calling thread for the whole cycle.
use crate::responses::Outcome;
use embedded_io::{Read, ReadReady, Write};
use fugit::{ExtU32, TimerDurationU32};
use fugit_timer::Timer;
use heapless::Vec;

/// Chunk size in bytes for draining the receive channel
const READ_CHUNK_SIZE: usize = 64;

/// Serial link errors
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LinkError {
    /// Writing command bytes to the serial channel failed
    WriteFailed,

    /// Reading pending bytes from the serial channel failed
    ReadFailed,

    /// Upstream timer error
    TimerError,

    /// Response exceeded the receive buffer capacity
    ReceiveOverflow,
}

#[cfg(feature = "defmt")]
impl defmt::Format for LinkError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            LinkError::WriteFailed => defmt::write!(f, "LinkError::WriteFailed"),
            LinkError::ReadFailed => defmt::write!(f, "LinkError::ReadFailed"),
            LinkError::TimerError => defmt::write!(f, "LinkError::TimerError"),
            LinkError::ReceiveOverflow => defmt::write!(f, "LinkError::ReceiveOverflow"),
        }
    }
}

/// Transaction engine over one exclusively owned serial handle
///
/// RX_SIZE: Receive buffer capacity in bytes. One full response, including
/// its terminator lines, must fit.
pub struct Link<S: Read + Write + ReadReady, T: Timer<TIMER_HZ>, const TIMER_HZ: u32, const RX_SIZE: usize> {
    /// Byte-oriented duplex channel to the peer, owned by the host platform
    pub(crate) serial: S,

    /// Timer used for settle delays and the response deadline
    timer: T,

    /// Fixed wait after writing a command, before polling for the reply
    settle_delay: TimerDurationU32<TIMER_HZ>,

    /// Deadline for the first response byte, counted after the settle delay
    response_timeout: TimerDurationU32<TIMER_HZ>,
}

impl<S: Read + Write + ReadReady, T: Timer<TIMER_HZ>, const TIMER_HZ: u32, const RX_SIZE: usize>
    Link<S, T, TIMER_HZ, RX_SIZE>
{
    pub fn new(serial: S, timer: T) -> Self {
        Self {
            serial,
            timer,
            settle_delay: 1_000.millis(),
            response_timeout: 5_000.millis(),
        }
    }

    /// Executes one transaction with the session default settle delay
    pub fn execute(&mut self, command: &[u8]) -> Result<Outcome<RX_SIZE>, LinkError> {
        self.execute_with_delay(command, self.settle_delay)
    }

    /// Executes one transaction with the given settle delay
    ///
    /// The drain phase assumes the response arrives in one burst once the
    /// first byte is pending. Data trickling in after the channel reports
    /// empty is not captured by this transaction.
    pub fn execute_with_delay(
        &mut self,
        command: &[u8],
        settle_delay: TimerDurationU32<TIMER_HZ>,
    ) -> Result<Outcome<RX_SIZE>, LinkError> {
        self.serial.write_all(command).map_err(|_| LinkError::WriteFailed)?;
        self.serial.flush().map_err(|_| LinkError::WriteFailed)?;

        self.pause(settle_delay)?;

        if !self.poll_pending(self.response_timeout)? {
            return Ok(Outcome::Timeout);
        }

        Ok(Outcome::classify(self.drain()?))
    }

    /// Captures unsolicited data without writing a command. Returns None if
    /// nothing arrived before the given deadline.
    pub fn listen(&mut self, timeout: TimerDurationU32<TIMER_HZ>) -> Result<Option<Vec<u8, RX_SIZE>>, LinkError> {
        if !self.poll_pending(timeout)? {
            return Ok(None);
        }

        Ok(Some(self.drain()?))
    }

    /// Blocks until the first byte is pending or the deadline expires
    fn poll_pending(&mut self, timeout: TimerDurationU32<TIMER_HZ>) -> Result<bool, LinkError> {
        self.timer.start(timeout).map_err(|_| LinkError::TimerError)?;

        loop {
            if self.serial.read_ready().map_err(|_| LinkError::ReadFailed)? {
                return Ok(true);
            }

            match self.timer.wait() {
                Ok(()) => return Ok(false),
                Err(nb::Error::WouldBlock) => {}
                Err(nb::Error::Other(_)) => return Err(LinkError::TimerError),
            }
        }
    }

    /// Reads pending bytes in fixed chunks until the channel reports empty
    fn drain(&mut self) -> Result<Vec<u8, RX_SIZE>, LinkError> {
        let mut response = Vec::new();
        let mut chunk = [0x0; READ_CHUNK_SIZE];

        while self.serial.read_ready().map_err(|_| LinkError::ReadFailed)? {
            let length = self.serial.read(&mut chunk).map_err(|_| LinkError::ReadFailed)?;
            if length == 0 {
                break;
            }

            response
                .extend_from_slice(&chunk[..length])
                .map_err(|_| LinkError::ReceiveOverflow)?;
        }

        Ok(response)
    }

    /// Blocks for the given duration
    pub(crate) fn pause(&mut self, duration: TimerDurationU32<TIMER_HZ>) -> Result<(), LinkError> {
        self.timer.start(duration).map_err(|_| LinkError::TimerError)?;
        nb::block!(self.timer.wait()).map_err(|_| LinkError::TimerError)
    }

    /// Sets the session default settle delay in ms
    pub fn set_settle_delay_ms(&mut self, delay: u32) {
        self.settle_delay = TimerDurationU32::millis(delay);
    }

    /// Sets the response deadline in ms
    pub fn set_response_timeout_ms(&mut self, timeout: u32) {
        self.response_timeout = TimerDurationU32::millis(timeout);
    }
}
