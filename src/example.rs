//! Mocks for doc examples
use alloc::collections::VecDeque;
use core::convert::Infallible;
use embedded_io::{ErrorType, Read, ReadReady, Write};
use fugit::{TimerDurationU32, TimerInstantU32};
use fugit_timer::Timer;

/// Serial mock scripting the peer side of the doc examples. Every written
/// command queues a canned response in a single burst.
#[derive(Default)]
pub struct ExampleSerial {
    rx: VecDeque<u8>,
}

impl ExampleSerial {
    fn respond(&mut self, response: &[u8]) {
        self.rx.extend(response.iter().copied());
    }

    fn script(&mut self, command: &[u8]) {
        if command.starts_with(b"AT+CWJAP_CUR=\"test_wifi\"") {
            self.respond(b"WIFI CONNECTED\r\nWIFI GOT IP\r\n\r\nOK\r\n");
        } else if command.starts_with(b"AT+CIPSEND=") {
            self.respond(b"OK\r\n> ");
        } else if command.starts_with(b"GET ") || command.starts_with(b"POST ") {
            self.respond(
                b"\r\nRecv 52 bytes\r\nSEND OK\r\n\r\n+IPD,81:HTTP/1.1 200 OK\r\nContent-Length: 21\r\n\r\n{\"origin\": \"1.2.3.4\"}",
            );
        } else {
            self.respond(b"OK\r\n");
        }
    }
}

impl ErrorType for ExampleSerial {
    type Error = Infallible;
}

impl Write for ExampleSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Infallible> {
        self.script(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

impl Read for ExampleSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Infallible> {
        let mut length = 0;

        while length < buf.len() {
            let Some(byte) = self.rx.pop_front() else {
                break;
            };
            buf[length] = byte;
            length += 1;
        }

        Ok(length)
    }
}

impl ReadReady for ExampleSerial {
    fn read_ready(&mut self) -> Result<bool, Infallible> {
        Ok(!self.rx.is_empty())
    }
}

/// Timer mock with instantly elapsing durations
#[derive(Default)]
pub struct ExampleTimer {}

impl Timer<1_000_000> for ExampleTimer {
    type Error = u32;

    fn now(&mut self) -> TimerInstantU32<1_000_000> {
        TimerInstantU32::from_ticks(0)
    }

    fn start(&mut self, _duration: TimerDurationU32<1_000_000>) -> Result<(), Self::Error> {
        Ok(())
    }

    fn cancel(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn wait(&mut self) -> nb::Result<(), Self::Error> {
        Ok(())
    }
}
