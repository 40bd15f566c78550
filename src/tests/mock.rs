use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use embedded_io::{ErrorKind, ErrorType, Read, ReadReady, Write};
use fugit::{TimerDurationU32, TimerInstantU32};
use fugit_timer::Timer as FugitTimer;
use mockall::mock;

/// Serial mock recording every written command and replaying one canned
/// response per write, like a peer answering in a single burst
pub struct MockSerial {
    /// Sent commands
    commands: Vec<Vec<u8>>,

    /// Canned responses, consumed in insertion order, one per write
    responses: VecDeque<&'static [u8]>,

    /// Pending receive bytes
    rx: VecDeque<u8>,

    /// Simulates a write failure
    fail_writes: bool,
}

impl MockSerial {
    pub fn new() -> Self {
        Self {
            commands: vec![],
            responses: VecDeque::new(),
            rx: VecDeque::new(),
            fail_writes: false,
        }
    }

    /// Queues a canned response for the next write
    pub fn add_response(&mut self, response: &'static [u8]) {
        self.responses.push_back(response);
    }

    /// Simulates an OK response
    pub fn add_ok_response(&mut self) {
        self.add_response(b"OK\r\n");
    }

    /// Simulates a general error response
    pub fn add_error_response(&mut self) {
        self.add_response(b"ERROR\r\n");
    }

    /// Simulates a FAIL response
    pub fn add_fail_response(&mut self) {
        self.add_response(b"FAIL\r\n");
    }

    /// Simulates a busy marker response
    pub fn add_busy_response(&mut self) {
        self.add_response(b"busy p...\r\n");
    }

    /// Leaves the peer silent for the next write
    pub fn add_silence(&mut self) {
        self.add_response(b"");
    }

    /// Injects unsolicited bytes, as if the peer sent them on its own
    pub fn inject(&mut self, data: &[u8]) {
        self.rx.extend(data.iter().copied());
    }

    /// Makes every following write fail
    pub fn fail_writes(&mut self) {
        self.fail_writes = true;
    }

    /// Returns a copy of the sent commands
    pub fn get_commands_as_strings(&self) -> Vec<String> {
        let mut commands = vec![];

        for command in &self.commands {
            commands.push(String::from_utf8(command.clone()).unwrap());
        }

        commands
    }
}

impl ErrorType for MockSerial {
    type Error = ErrorKind;
}

impl Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, ErrorKind> {
        if self.fail_writes {
            return Err(ErrorKind::Other);
        }

        self.commands.push(buf.to_vec());

        if let Some(response) = self.responses.pop_front() {
            self.rx.extend(response.iter().copied());
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), ErrorKind> {
        Ok(())
    }
}

impl Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ErrorKind> {
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

impl ReadReady for MockSerial {
    fn read_ready(&mut self) -> Result<bool, ErrorKind> {
        Ok(!self.rx.is_empty())
    }
}

mock! {
    pub Timer{}

    impl FugitTimer<1_000_000> for Timer {
        type Error = u32;

        fn now(&mut self) -> TimerInstantU32<1000000>;
        fn start(&mut self, duration: TimerDurationU32<1000000>) -> Result<(), u32>;
        fn cancel(&mut self) -> Result<(), u32>;
        fn wait(&mut self) -> nb::Result<(), u32>;
    }
}

impl MockTimer {
    /// Short hand helper for returning a milliseconds duration
    pub fn duration_ms(duration: u32) -> TimerDurationU32<1_000_000> {
        TimerDurationU32::millis(duration)
    }

    /// Timer accepting any duration and elapsing instantly
    pub fn lenient() -> MockTimer {
        let mut timer = MockTimer::new();
        timer.expect_start().returning(|_| Ok(()));
        timer.expect_wait().returning(|| Ok(()));
        timer
    }
}
