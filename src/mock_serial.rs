//! We use this mocking module in unit tests to emulate the serial link to an HV chip.

/// Our mock type used to emulate a serial port.
///
/// Reads drain the queued response bytes; once they run out every read reports
/// `WouldBlock` the way a serial port with a short read timeout does.
pub struct MockSerial {
    /// Everything written to the port.
    write_buffer: heapless::Vec<u8, 512>,
    /// Queued responses to be read.
    read_buffer: heapless::Vec<u8, 512>,
    read_position: usize,
    /// Bytes handed out per read call. The session reads one at a time, but this lets a
    /// test check it copes with short reads.
    max_read: usize,
    should_error_on_write: bool,
    should_error_on_read: bool,
    disconnected: bool,
}

#[derive(thiserror::Error, Debug)]
pub enum MockSerialError {
    #[error("mock buffer full")]
    BufferOverflow,
    #[error("simulated port failure")]
    SimulatedError,
    /// The far end went away.
    #[error("port disconnected")]
    Disconnected,
    /// No data available.
    #[error("no data available")]
    WouldBlock,
}

impl embedded_io::Error for MockSerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            MockSerialError::BufferOverflow => embedded_io::ErrorKind::OutOfMemory,
            MockSerialError::SimulatedError => embedded_io::ErrorKind::BrokenPipe,
            MockSerialError::Disconnected => embedded_io::ErrorKind::Other,
            MockSerialError::WouldBlock => embedded_io::ErrorKind::TimedOut,
        }
    }
}

impl embedded_io::ErrorType for MockSerial {
    type Error = MockSerialError;
}

impl embedded_io::Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }
        self.write_buffer
            .extend_from_slice(buf)
            .map_err(|_| MockSerialError::BufferOverflow)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }
        Ok(())
    }
}

impl embedded_io::Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_read {
            return Err(MockSerialError::SimulatedError);
        }
        if self.disconnected {
            return Err(MockSerialError::Disconnected);
        }
        if self.read_position >= self.read_buffer.len() {
            return Err(MockSerialError::WouldBlock);
        }

        let available = &self.read_buffer[self.read_position..];
        let count = buf.len().min(available.len()).min(self.max_read);
        buf[..count].copy_from_slice(&available[..count]);
        self.read_position += count;
        Ok(count)
    }
}

impl MockSerial {
    pub fn new() -> Self {
        Self {
            write_buffer: heapless::Vec::new(),
            read_buffer: heapless::Vec::new(),
            read_position: 0,
            max_read: usize::MAX,
            should_error_on_write: false,
            should_error_on_read: false,
            disconnected: false,
        }
    }

    /// Queue bytes after anything already queued.
    pub fn queue_read_data(&mut self, data: &[u8]) -> Result<(), MockSerialError> {
        self.read_buffer
            .extend_from_slice(data)
            .map_err(|_| MockSerialError::BufferOverflow)
    }

    /// Get a reference to the data that was written to this mock serial port
    pub fn written_data(&self) -> &[u8] {
        &self.write_buffer
    }

    /// Number of queued bytes nobody has read yet.
    pub fn unread(&self) -> usize {
        self.read_buffer.len() - self.read_position
    }

    pub fn set_max_read(&mut self, max_read: usize) {
        self.max_read = max_read.max(1);
    }

    pub fn set_write_error(&mut self, should_error: bool) {
        self.should_error_on_write = should_error;
    }

    pub fn set_read_error(&mut self, should_error: bool) {
        self.should_error_on_read = should_error;
    }

    /// Make every read fail with a generic (`Other`) error, like a pulled USB adapter.
    pub fn set_disconnected(&mut self, disconnected: bool) {
        self.disconnected = disconnected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{Error, Read, Write};

    #[test]
    fn test_write_data() {
        let mut mock = MockSerial::new();
        mock.write_all(b"\x02HGV").unwrap();
        mock.write_all(b"\x03EA\r").unwrap();
        assert_eq!(mock.written_data(), b"\x02HGV\x03EA\r");
    }

    #[test]
    fn test_queued_reads_are_appended() {
        let mut mock = MockSerial::new();
        mock.queue_read_data(b"first").unwrap();
        mock.queue_read_data(b"second").unwrap();

        let mut buffer = [0u8; 16];
        let count = mock.read(&mut buffer).unwrap();
        assert_eq!(&buffer[..count], b"firstsecond");
        assert_eq!(mock.unread(), 0);
    }

    #[test]
    fn test_short_reads() {
        let mut mock = MockSerial::new();
        mock.queue_read_data(b"abc").unwrap();
        mock.set_max_read(1);

        let mut buffer = [0u8; 8];
        assert_eq!(mock.read(&mut buffer).unwrap(), 1);
        assert_eq!(mock.unread(), 2);
    }

    #[test]
    fn test_would_block_when_drained() {
        let mut mock = MockSerial::new();
        let mut buffer = [0u8; 4];
        let err = mock.read(&mut buffer).unwrap_err();
        assert!(matches!(err, MockSerialError::WouldBlock));
        assert_eq!(err.kind(), embedded_io::ErrorKind::TimedOut);
    }

    #[test]
    fn test_error_simulation() {
        let mut mock = MockSerial::new();
        mock.set_write_error(true);
        assert!(mock.write(b"x").is_err());
        assert!(mock.flush().is_err());
        assert!(mock.written_data().is_empty());

        mock.queue_read_data(b"data").unwrap();
        mock.set_read_error(true);
        let mut buffer = [0u8; 4];
        assert!(matches!(
            mock.read(&mut buffer),
            Err(MockSerialError::SimulatedError)
        ));
    }

    #[test]
    fn test_disconnected_reports_other() {
        let mut mock = MockSerial::new();
        mock.queue_read_data(b"data").unwrap();
        mock.set_disconnected(true);
        let mut buffer = [0u8; 4];
        let err = mock.read(&mut buffer).unwrap_err();
        assert_eq!(err.kind(), embedded_io::ErrorKind::Other);
        assert_eq!(err.to_string(), "port disconnected");
    }
}
