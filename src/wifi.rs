//! # WiFi session controller
//!
//! The [Adapter] owns the serial link and drives the module lifecycle:
//! liveness probing, reset, echo control, mode selection, access point scan
//! and association. Socket and MQTT operations are layered on the same
//! adapter in [stack](crate::stack), [http](crate::http) and
//! [mqtt](crate::mqtt).
//!
//! ## Example
//!
//! ````
//! use esp_at_client::example::{ExampleSerial, ExampleTimer};
//! use esp_at_client::wifi::{Adapter, JoinStatus};
//!
//! let mut adapter: Adapter<_, _, 1_000_000, 1024, 1024> =
//!     Adapter::new(ExampleSerial::default(), ExampleTimer::default());
//!
//! adapter.startup().unwrap();
//! assert!(adapter.is_ready());
//!
//! let status = adapter.join("test_wifi", "secret").unwrap();
//! assert_eq!(JoinStatus::Connected, status);
//! ````
use crate::commands;
use crate::link::Link;
use crate::responses::{self, CommandError};
use alloc::string::String;
use alloc::vec::Vec;
use embedded_io::{Read, ReadReady, Write};
use fugit::TimerDurationU32;
use fugit_timer::Timer;

/// Settle delay while the module scans for access points
const SCAN_SETTLE_DELAY_MS: u32 = 10_000;

/// Settle delay while the module negotiates with an access point
const JOIN_SETTLE_DELAY_MS: u32 = 15_000;

/// Module reboot time after a reset, before the liveness re-probe
const REBOOT_DELAY_MS: u32 = 5_000;

/// Central session controller owning the serial link
///
/// TX_SIZE: Transmit buffer capacity in bytes for assembled request payloads.
///
/// RX_SIZE: Receive buffer capacity in bytes for one drained response.
pub struct Adapter<
    S: Read + Write + ReadReady,
    T: Timer<TIMER_HZ>,
    const TIMER_HZ: u32,
    const TX_SIZE: usize,
    const RX_SIZE: usize,
> {
    /// Transaction engine
    pub(crate) link: Link<S, T, TIMER_HZ, RX_SIZE>,

    /// True once a liveness probe was answered with OK
    ready: bool,

    /// Result of the most recent join attempt
    join_status: JoinStatus,

    /// True while the single socket is open
    pub(crate) socket_open: bool,
}

/// WiFi operating mode
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WifiMode {
    /// Station mode
    Station,

    /// Software access point mode
    SoftAp,

    /// Station and software access point simultaneously
    Both,
}

impl WifiMode {
    /// Numeric mode code used on the wire
    pub fn code(&self) -> u8 {
        match self {
            Self::Station => 1,
            Self::SoftAp => 2,
            Self::Both => 3,
        }
    }

    /// Decodes a wire mode code. Any unknown code yields None.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Station),
            2 => Some(Self::SoftAp),
            3 => Some(Self::Both),
            _ => None,
        }
    }
}

/// Result of an access point association attempt
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum JoinStatus {
    /// Joined the access point and an IP was assigned
    Connected,

    /// Not joined to any access point
    Disconnected,

    /// The access point rejected the password
    WrongPassword,

    /// The target access point was not found
    ApNotFound,
}

/// Errors when joining an access point
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum JoinError {
    /// Given SSID is longer than the max. size of 32 bytes
    InvalidSsidLength,

    /// Given password is longer than the max. size of 63 bytes
    InvalidPasswordLength,

    /// Join command could not be executed
    CommandFailed(CommandError),
}

/// One scanned access point as raw comma-split fields (signal, ssid, ...)
pub type ScanRecord = Vec<String>;

impl<S: Read + Write + ReadReady, T: Timer<TIMER_HZ>, const TIMER_HZ: u32, const TX_SIZE: usize, const RX_SIZE: usize>
    Adapter<S, T, TIMER_HZ, TX_SIZE, RX_SIZE>
{
    pub fn new(serial: S, timer: T) -> Self {
        Self {
            link: Link::new(serial, timer),
            ready: false,
            join_status: JoinStatus::Disconnected,
            socket_open: false,
        }
    }

    /// Probes the module with a bare AT command
    pub fn startup(&mut self) -> Result<(), CommandError> {
        self.link.execute(commands::PROBE)?.require_ok()?;
        self.ready = true;
        Ok(())
    }

    /// Resets the module, waits out the reboot and re-probes liveness
    pub fn restart(&mut self) -> Result<(), CommandError> {
        self.ready = false;
        self.link.execute(commands::RESET)?.require_ok()?;
        self.link.pause(TimerDurationU32::millis(REBOOT_DELAY_MS))?;
        self.startup()
    }

    /// Resets the module to factory defaults, dropping stored configuration
    pub fn factory_restore(&mut self) -> Result<(), CommandError> {
        self.link.execute(commands::RESTORE)?.require_ok()?;
        Ok(())
    }

    /// Enables or disables command echo
    pub fn set_echo(&mut self, enabled: bool) -> Result<(), CommandError> {
        let command = if enabled { commands::ECHO_ON } else { commands::ECHO_OFF };
        self.link.execute(command)?.require_ok()?;
        Ok(())
    }

    /// Firmware version banner, without the trailing status lines
    pub fn firmware_version(&mut self) -> Result<String, CommandError> {
        let raw = self.link.execute(commands::VERSION)?.require_ok()?;
        Ok(decode_version(&raw))
    }

    /// Current WiFi mode
    pub fn mode(&mut self) -> Result<WifiMode, CommandError> {
        self.query_mode(false)
    }

    /// WiFi mode persisted in module flash
    pub fn default_mode(&mut self) -> Result<WifiMode, CommandError> {
        self.query_mode(true)
    }

    /// Sets the current WiFi mode
    pub fn set_mode(&mut self, mode: WifiMode) -> Result<(), CommandError> {
        self.apply_mode(mode, false)
    }

    /// Sets the WiFi mode persisted in module flash
    pub fn set_default_mode(&mut self, mode: WifiMode) -> Result<(), CommandError> {
        self.apply_mode(mode, true)
    }

    /// Scans for access points. Scanning is slow, so an extended settle
    /// delay is applied.
    pub fn scan(&mut self) -> Result<Vec<ScanRecord>, CommandError> {
        let outcome = self
            .link
            .execute_with_delay(commands::SCAN, TimerDurationU32::millis(SCAN_SETTLE_DELAY_MS))?;
        let raw = outcome.require_ok()?;
        Ok(decode_scan(&raw))
    }

    /// Associates with an access point and returns the decoded join status.
    /// Protocol-level failures map to a status, not an error: a silent or
    /// busy peer reads as [JoinStatus::Disconnected].
    pub fn join(&mut self, ssid: &str, password: &str) -> Result<JoinStatus, JoinError> {
        if ssid.len() > 32 {
            return Err(JoinError::InvalidSsidLength);
        }

        if password.len() > 63 {
            return Err(JoinError::InvalidPasswordLength);
        }

        let command = commands::join_access_point(ssid, password).map_err(JoinError::CommandFailed)?;
        let outcome = self
            .link
            .execute_with_delay(command.as_bytes(), TimerDurationU32::millis(JOIN_SETTLE_DELAY_MS))
            .map_err(|error| JoinError::CommandFailed(CommandError::Link(error)))?;

        let status = decode_join_status(outcome.raw());
        self.join_status = status;
        Ok(status)
    }

    /// Quits the joined access point
    pub fn leave(&mut self) -> Result<(), CommandError> {
        self.link.execute(commands::QUIT_ACCESS_POINT)?.require_ok()?;
        self.join_status = JoinStatus::Disconnected;
        Ok(())
    }

    /// True once a liveness probe succeeded
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Result of the most recent join attempt
    pub fn join_status(&self) -> JoinStatus {
        self.join_status
    }

    /// True while the single socket is open
    pub fn is_socket_open(&self) -> bool {
        self.socket_open
    }

    /// Sets the session default settle delay in ms, applied between writing
    /// a command and polling for its reply
    pub fn set_settle_delay_ms(&mut self, delay: u32) {
        self.link.set_settle_delay_ms(delay);
    }

    /// Sets the response deadline in ms for every transaction
    pub fn set_response_timeout_ms(&mut self, timeout: u32) {
        self.link.set_response_timeout_ms(timeout);
    }

    fn query_mode(&mut self, persisted: bool) -> Result<WifiMode, CommandError> {
        let raw = self.link.execute(commands::query_wifi_mode(persisted))?.require_ok()?;
        decode_mode(&raw).ok_or(CommandError::Mismatch)
    }

    fn apply_mode(&mut self, mode: WifiMode, persisted: bool) -> Result<(), CommandError> {
        let command = commands::set_wifi_mode(mode, persisted)?;
        self.link.execute(command.as_bytes())?.require_ok()?;
        Ok(())
    }
}

/// Join outcome decision table over the raw response. Association status
/// codes take priority over the connection banner lines.
fn decode_join_status(raw: Option<&[u8]>) -> JoinStatus {
    let Some(raw) = raw else {
        return JoinStatus::Disconnected;
    };

    if let Some(code) = join_status_code(raw) {
        return match code {
            2 => JoinStatus::WrongPassword,
            3 => JoinStatus::ApNotFound,
            _ => JoinStatus::Disconnected,
        };
    }

    if responses::contains_line(raw, b"WIFI CONNECTED") && responses::contains_line(raw, b"WIFI GOT IP") {
        return JoinStatus::Connected;
    }

    JoinStatus::Disconnected
}

/// Status code of a `+CWJAP:<code>` or `+CWJAP_CUR:<code>` line
fn join_status_code(raw: &[u8]) -> Option<u8> {
    let field = responses::prefixed_field(raw, b"+CWJAP")?;
    let digit = *field.first()?;
    digit.is_ascii_digit().then(|| digit - b'0')
}

/// Mode code of a `+CWMODE:<code>` or `+CWMODE_DEF:<code>` line
fn decode_mode(raw: &[u8]) -> Option<WifiMode> {
    let field = responses::prefixed_field(raw, b"+CWMODE")?;
    let digit = *field.first()?;
    WifiMode::from_code(digit.wrapping_sub(b'0'))
}

/// Splits `+CWLAP:(...)` records into field lists. Malformed records are
/// kept as a best-effort split rather than dropped.
fn decode_scan(raw: &[u8]) -> Vec<ScanRecord> {
    let mut records = Vec::new();

    for line in responses::lines(raw) {
        let Some(record) = line.strip_prefix(b"+CWLAP:".as_slice()) else {
            continue;
        };

        let record = record.strip_prefix(b"(".as_slice()).unwrap_or(record);
        let record = record.strip_suffix(b")".as_slice()).unwrap_or(record);

        let fields = record.split(|&byte| byte == b',').map(decode_field).collect();
        records.push(fields);
    }

    records
}

/// Lossy text decode of one field, with surrounding quotes removed
fn decode_field(field: &[u8]) -> String {
    let field = field.strip_prefix(b"\"".as_slice()).unwrap_or(field);
    let field = field.strip_suffix(b"\"".as_slice()).unwrap_or(field);
    String::from_utf8_lossy(field).into_owned()
}

/// Joins the banner lines preceding the OK terminator
fn decode_version(raw: &[u8]) -> String {
    let mut banner = String::new();

    for line in responses::lines(raw) {
        if line == responses::OK_STATUS {
            break;
        }

        if line.is_empty() {
            continue;
        }

        if !banner.is_empty() {
            banner.push_str("\r\n");
        }

        banner.push_str(&String::from_utf8_lossy(line));
    }

    banner
}
