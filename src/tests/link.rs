use crate::link::{Link, LinkError};
use crate::responses::Outcome;
use crate::tests::mock::{MockSerial, MockTimer};
use alloc::string::ToString;
use heapless::Vec;
use mockall::predicate::eq;
use mockall::Sequence;

type LinkType = Link<MockSerial, MockTimer, 1_000_000, 256>;

fn raw(data: &[u8]) -> Vec<u8, 256> {
    Vec::from_slice(data).unwrap()
}

#[test]
fn test_execute_ok() {
    let mut serial = MockSerial::new();
    serial.add_response(b"\r\nOK\r\n");

    let mut link: LinkType = Link::new(serial, MockTimer::lenient());
    let outcome = link.execute(b"AT\r\n").unwrap();

    assert_eq!(Outcome::Ok(raw(b"\r\nOK\r\n")), outcome);

    let commands = link.serial.get_commands_as_strings();
    assert_eq!(1, commands.len());
    assert_eq!("AT\r\n".to_string(), commands[0]);
}

#[test]
fn test_execute_ok_with_trailing_garbage() {
    let mut serial = MockSerial::new();
    serial.add_response(b"OK\r\n\x02\xff garbage");

    let mut link: LinkType = Link::new(serial, MockTimer::lenient());
    let outcome = link.execute(b"AT\r\n").unwrap();

    assert!(matches!(outcome, Outcome::Ok(_)));
}

#[test]
fn test_execute_ok_checked_before_busy() {
    let mut serial = MockSerial::new();
    serial.add_response(b"busy p...\r\nOK\r\n");

    let mut link: LinkType = Link::new(serial, MockTimer::lenient());
    let outcome = link.execute(b"AT\r\n").unwrap();

    assert!(matches!(outcome, Outcome::Ok(_)));
}

#[test]
fn test_execute_error() {
    let mut serial = MockSerial::new();
    serial.add_error_response();

    let mut link: LinkType = Link::new(serial, MockTimer::lenient());
    let outcome = link.execute(b"AT+CWQAP\r\n").unwrap();

    assert_eq!(Outcome::PeerError(raw(b"ERROR\r\n")), outcome);
}

#[test]
fn test_execute_fail() {
    let mut serial = MockSerial::new();
    serial.add_fail_response();

    let mut link: LinkType = Link::new(serial, MockTimer::lenient());
    let outcome = link.execute(b"AT\r\n").unwrap();

    assert_eq!(Outcome::PeerFail(raw(b"FAIL\r\n")), outcome);
}

#[test]
fn test_execute_busy() {
    let mut serial = MockSerial::new();
    serial.add_busy_response();

    let mut link: LinkType = Link::new(serial, MockTimer::lenient());
    let outcome = link.execute(b"AT\r\n").unwrap();

    assert_eq!(Outcome::Busy, outcome);
}

#[test]
fn test_execute_unrecognized() {
    let mut serial = MockSerial::new();
    serial.add_response(b"+CWMODE:1\r\n");

    let mut link: LinkType = Link::new(serial, MockTimer::lenient());
    let outcome = link.execute(b"AT+CWMODE?\r\n").unwrap();

    assert_eq!(Outcome::Unrecognized(raw(b"+CWMODE:1\r\n")), outcome);
}

#[test]
fn test_execute_send_ok_line_is_not_a_terminator() {
    let mut serial = MockSerial::new();
    serial.add_response(b"SEND OK\r\n");

    let mut link: LinkType = Link::new(serial, MockTimer::lenient());
    let outcome = link.execute(b"AT\r\n").unwrap();

    assert_eq!(Outcome::Unrecognized(raw(b"SEND OK\r\n")), outcome);
}

#[test]
fn test_execute_timeout_on_silent_peer() {
    let serial = MockSerial::new();

    let mut link: LinkType = Link::new(serial, MockTimer::lenient());
    let outcome = link.execute(b"AT\r\n").unwrap();

    assert_eq!(Outcome::Timeout, outcome);
}

#[test]
fn test_execute_write_failure() {
    let mut serial = MockSerial::new();
    serial.fail_writes();

    let mut link: LinkType = Link::new(serial, MockTimer::lenient());
    let error = link.execute(b"AT\r\n").unwrap_err();

    assert_eq!(LinkError::WriteFailed, error);
}

#[test]
fn test_execute_receive_overflow() {
    let mut serial = MockSerial::new();
    serial.add_response(b"a response larger than the receive buffer\r\nOK\r\n");

    let mut link: Link<MockSerial, MockTimer, 1_000_000, 8> = Link::new(serial, MockTimer::lenient());
    let error = link.execute(b"AT\r\n").unwrap_err();

    assert_eq!(LinkError::ReceiveOverflow, error);
}

#[test]
fn test_execute_settle_and_deadline_durations() {
    let mut serial = MockSerial::new();
    serial.add_ok_response();

    let mut timer = MockTimer::new();
    let mut sequence = Sequence::new();
    timer
        .expect_start()
        .with(eq(MockTimer::duration_ms(1_000)))
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_| Ok(()));
    timer
        .expect_start()
        .with(eq(MockTimer::duration_ms(5_000)))
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_| Ok(()));
    timer.expect_wait().returning(|| Ok(()));

    let mut link: LinkType = Link::new(serial, timer);
    let outcome = link.execute(b"AT\r\n").unwrap();

    assert!(matches!(outcome, Outcome::Ok(_)));
}

#[test]
fn test_execute_configured_delays() {
    let mut serial = MockSerial::new();
    serial.add_ok_response();

    let mut timer = MockTimer::new();
    let mut sequence = Sequence::new();
    timer
        .expect_start()
        .with(eq(MockTimer::duration_ms(100)))
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_| Ok(()));
    timer
        .expect_start()
        .with(eq(MockTimer::duration_ms(750)))
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_| Ok(()));
    timer.expect_wait().returning(|| Ok(()));

    let mut link: LinkType = Link::new(serial, timer);
    link.set_settle_delay_ms(100);
    link.set_response_timeout_ms(750);

    let outcome = link.execute(b"AT\r\n").unwrap();
    assert!(matches!(outcome, Outcome::Ok(_)));
}

#[test]
fn test_listen_captures_pending_data() {
    let mut serial = MockSerial::new();
    serial.inject(b"+MQTTSUBRECV:0,\"topic\",2,on\r\n");

    let mut link: LinkType = Link::new(serial, MockTimer::lenient());
    let data = link.listen(MockTimer::duration_ms(50)).unwrap();

    assert_eq!(Some(raw(b"+MQTTSUBRECV:0,\"topic\",2,on\r\n")), data);
    assert!(link.serial.get_commands_as_strings().is_empty());
}

#[test]
fn test_listen_deadline_with_silent_peer() {
    let serial = MockSerial::new();

    let mut link: LinkType = Link::new(serial, MockTimer::lenient());
    let data = link.listen(MockTimer::duration_ms(50)).unwrap();

    assert_eq!(None, data);
}
