//! AT command line encoding. Commands are literal CRLF-terminated byte
//! sequences, formatted per call and sent verbatim.
use crate::mqtt::{MqttQos, MqttScheme};
use crate::responses::CommandError;
use crate::wifi::WifiMode;
use core::fmt::Write;
use heapless::String;

/// Liveness probe
pub(crate) const PROBE: &[u8] = b"AT\r\n";

/// Module reset
pub(crate) const RESET: &[u8] = b"AT+RST\r\n";

/// Factory restore, dropping stored configuration
pub(crate) const RESTORE: &[u8] = b"AT+RESTORE\r\n";

/// Firmware version banner
pub(crate) const VERSION: &[u8] = b"AT+GMR\r\n";

/// Command echo off
pub(crate) const ECHO_OFF: &[u8] = b"ATE0\r\n";

/// Command echo on
pub(crate) const ECHO_ON: &[u8] = b"ATE1\r\n";

/// Access point scan
pub(crate) const SCAN: &[u8] = b"AT+CWLAP\r\n";

/// Quit the joined access point
pub(crate) const QUIT_ACCESS_POINT: &[u8] = b"AT+CWQAP\r\n";

/// Close the single socket
pub(crate) const CLOSE_SOCKET: &[u8] = b"AT+CIPCLOSE\r\n";

/// Release the MQTT session
pub(crate) const MQTT_CLEAN: &[u8] = b"AT+MQTTCLEAN=0\r\n";

/// Queries the current or flash-persisted WiFi mode
pub(crate) fn query_wifi_mode(persisted: bool) -> &'static [u8] {
    if persisted {
        b"AT+CWMODE_DEF?\r\n"
    } else {
        b"AT+CWMODE?\r\n"
    }
}

/// Sets the current or flash-persisted WiFi mode
pub(crate) fn set_wifi_mode(mode: WifiMode, persisted: bool) -> Result<String<24>, CommandError> {
    let suffix = if persisted { "_DEF" } else { "" };
    let mut command = String::new();
    write!(command, "AT+CWMODE{}={}\r\n", suffix, mode.code()).map_err(|_| CommandError::Overflow)?;
    Ok(command)
}

/// Joins an access point with the given credentials
pub(crate) fn join_access_point(ssid: &str, password: &str) -> Result<String<128>, CommandError> {
    let mut command = String::new();
    write!(command, "AT+CWJAP_CUR=\"{}\",\"{}\"\r\n", ssid, password).map_err(|_| CommandError::Overflow)?;
    Ok(command)
}

/// Opens the single socket. SSL transport is selected for port 443, TCP for
/// every other port.
pub(crate) fn open_socket(host: &str, port: u16) -> Result<String<128>, CommandError> {
    let transport = if port == 443 { "SSL" } else { "TCP" };
    let mut command = String::new();
    write!(command, "AT+CIPSTART=\"{}\",\"{}\",{}\r\n", transport, host, port).map_err(|_| CommandError::Overflow)?;
    Ok(command)
}

/// Announces the payload byte length ahead of a socket transmission
pub(crate) fn announce_payload(length: usize) -> Result<String<24>, CommandError> {
    let mut command = String::new();
    write!(command, "AT+CIPSEND={}\r\n", length).map_err(|_| CommandError::Overflow)?;
    Ok(command)
}

/// Configures MQTT client identity and transport scheme
pub(crate) fn mqtt_user_config<const N: usize>(
    scheme: MqttScheme,
    client_id: &str,
    username: &str,
    password: &str,
) -> Result<String<N>, CommandError> {
    let mut command = String::new();
    write!(
        command,
        "AT+MQTTUSERCFG=0,{},\"{}\",\"{}\",\"{}\",0,0,\"\"\r\n",
        scheme.code(),
        client_id,
        username,
        password
    )
    .map_err(|_| CommandError::Overflow)?;
    Ok(command)
}

/// Connects to an MQTT broker
pub(crate) fn mqtt_connect(host: &str, port: u16, reconnect: bool) -> Result<String<160>, CommandError> {
    let mut command = String::new();
    write!(command, "AT+MQTTCONN=0,\"{}\",{},{}\r\n", host, port, reconnect as u8).map_err(|_| CommandError::Overflow)?;
    Ok(command)
}

/// Publishes one MQTT message
pub(crate) fn mqtt_publish<const N: usize>(
    topic: &str,
    data: &str,
    qos: MqttQos,
    retain: bool,
) -> Result<String<N>, CommandError> {
    let mut command = String::new();
    write!(
        command,
        "AT+MQTTPUB=0,\"{}\",\"{}\",{},{}\r\n",
        topic,
        data,
        qos.code(),
        retain as u8
    )
    .map_err(|_| CommandError::Overflow)?;
    Ok(command)
}

/// Subscribes to one MQTT topic
pub(crate) fn mqtt_subscribe(topic: &str, qos: MqttQos) -> Result<String<256>, CommandError> {
    let mut command = String::new();
    write!(command, "AT+MQTTSUB=0,\"{}\",{}\r\n", topic, qos.code()).map_err(|_| CommandError::Overflow)?;
    Ok(command)
}
