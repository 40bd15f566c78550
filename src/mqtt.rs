//! # MQTT session configuration
//!
//! Stateless configuration calls, each a single transaction mapped through
//! the response classifier. Incoming traffic is captured as raw fields
//! only; interpreting the event type is the caller's job.
//!
//! ## Example
//!
//! ````
//! use esp_at_client::example::{ExampleSerial, ExampleTimer};
//! use esp_at_client::mqtt::{MqttQos, MqttScheme};
//! use esp_at_client::wifi::Adapter;
//!
//! let mut adapter: Adapter<_, _, 1_000_000, 1024, 1024> =
//!     Adapter::new(ExampleSerial::default(), ExampleTimer::default());
//!
//! adapter.mqtt_configure_user(MqttScheme::Tcp, "client", "user", "secret").unwrap();
//! adapter.mqtt_connect("broker.local", 1883, true).unwrap();
//! adapter.mqtt_publish("sensors/temp", "21.5", MqttQos::AtLeastOnce, false).unwrap();
//! adapter.mqtt_close().unwrap();
//! ````
use crate::commands;
use crate::responses::CommandError;
use crate::wifi::Adapter;
use alloc::string::String;
use alloc::vec::Vec;
use embedded_io::{Read, ReadReady, Write};
use fugit::TimerDurationU32;
use fugit_timer::Timer;

/// Transport and security scheme of an MQTT session, wire codes 1 to 10
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MqttScheme {
    /// MQTT over plain TCP
    Tcp,

    /// MQTT over TLS without certificate verification
    Tls,

    /// MQTT over TLS, verifying the server certificate
    TlsVerifyServer,

    /// MQTT over TLS, providing a client certificate
    TlsClientCert,

    /// MQTT over TLS with mutual verification
    TlsMutual,

    /// MQTT over WebSocket
    WebSocket,

    /// MQTT over secure WebSocket without certificate verification
    WebSocketTls,

    /// MQTT over secure WebSocket, verifying the server certificate
    WebSocketTlsVerifyServer,

    /// MQTT over secure WebSocket, providing a client certificate
    WebSocketTlsClientCert,

    /// MQTT over secure WebSocket with mutual verification
    WebSocketTlsMutual,
}

impl MqttScheme {
    /// Numeric scheme code used on the wire
    pub(crate) fn code(&self) -> u8 {
        match self {
            Self::Tcp => 1,
            Self::Tls => 2,
            Self::TlsVerifyServer => 3,
            Self::TlsClientCert => 4,
            Self::TlsMutual => 5,
            Self::WebSocket => 6,
            Self::WebSocketTls => 7,
            Self::WebSocketTlsVerifyServer => 8,
            Self::WebSocketTlsClientCert => 9,
            Self::WebSocketTlsMutual => 10,
        }
    }
}

/// MQTT quality of service level
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MqttQos {
    /// QoS 0, fire and forget
    AtMostOnce,

    /// QoS 1, acknowledged delivery
    AtLeastOnce,

    /// QoS 2, assured delivery
    ExactlyOnce,
}

impl MqttQos {
    /// Numeric QoS code used on the wire
    pub(crate) fn code(&self) -> u8 {
        match self {
            Self::AtMostOnce => 0,
            Self::AtLeastOnce => 1,
            Self::ExactlyOnce => 2,
        }
    }
}

impl<S: Read + Write + ReadReady, T: Timer<TIMER_HZ>, const TIMER_HZ: u32, const TX_SIZE: usize, const RX_SIZE: usize>
    Adapter<S, T, TIMER_HZ, TX_SIZE, RX_SIZE>
{
    /// Configures client identity and transport scheme. The configuration
    /// is not persisted and is re-sent in full on every call.
    pub fn mqtt_configure_user(
        &mut self,
        scheme: MqttScheme,
        client_id: &str,
        username: &str,
        password: &str,
    ) -> Result<(), CommandError> {
        let command = commands::mqtt_user_config::<TX_SIZE>(scheme, client_id, username, password)?;
        self.link.execute(command.as_bytes())?.require_ok()?;
        Ok(())
    }

    /// Connects to the broker. With reconnect enabled the module
    /// re-establishes the session on its own after a connection loss.
    pub fn mqtt_connect(&mut self, host: &str, port: u16, reconnect: bool) -> Result<(), CommandError> {
        let command = commands::mqtt_connect(host, port, reconnect)?;
        self.link.execute(command.as_bytes())?.require_ok()?;
        Ok(())
    }

    /// Publishes one message
    pub fn mqtt_publish(&mut self, topic: &str, data: &str, qos: MqttQos, retain: bool) -> Result<(), CommandError> {
        let command = commands::mqtt_publish::<TX_SIZE>(topic, data, qos, retain)?;
        self.link.execute(command.as_bytes())?.require_ok()?;
        Ok(())
    }

    /// Subscribes to one topic
    pub fn mqtt_subscribe(&mut self, topic: &str, qos: MqttQos) -> Result<(), CommandError> {
        let command = commands::mqtt_subscribe(topic, qos)?;
        self.link.execute(command.as_bytes())?.require_ok()?;
        Ok(())
    }

    /// Releases the MQTT session
    pub fn mqtt_close(&mut self) -> Result<(), CommandError> {
        self.link.execute(commands::MQTT_CLEAN)?.require_ok()?;
        Ok(())
    }

    /// Captures pending unsolicited traffic within the given deadline and
    /// returns the raw comma-split fields with line terminators stripped.
    /// No structured decoding is applied.
    pub fn mqtt_listen(&mut self, timeout_ms: u32) -> Result<Vec<String>, CommandError> {
        let raw = self
            .link
            .listen(TimerDurationU32::millis(timeout_ms))?
            .ok_or(CommandError::Timeout)?;
        decode_fields(&raw)
    }
}

/// Strips line terminators and splits the remaining text on commas
fn decode_fields(raw: &[u8]) -> Result<Vec<String>, CommandError> {
    let text = core::str::from_utf8(raw).map_err(|_| CommandError::Mismatch)?;
    let text = text.replace("\r\n", "");
    Ok(text.split(',').map(String::from).collect())
}
