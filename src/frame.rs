//! Wire framing for the HV chip.
//!
//! Every request and response has the same shape:
//!
//! ```text
//! STX | CMD (3 ASCII) | DATA (ASCII hex words) | ETX | CHK (2 upper case hex) | CR
//! ```
//!
//! The checksum is the sum of every byte from STX up to and including ETX, truncated to
//! one byte.

use crate::{
    command::{CODE_LEN, Command, FRAME_OVERHEAD},
    error::FrameError,
};

pub const STX: u8 = 0x02;
pub const ETX: u8 = 0x03;
pub const CR: u8 = 0x0D;

/// Enough room for the largest request or response the chip deals in.
pub const FRAME_CAPACITY: usize = 64;

/// Room left for DATA once the framing bytes are accounted for.
pub const MAX_DATA: usize = FRAME_CAPACITY - FRAME_OVERHEAD;

/// The largest catalog payload is 24 bytes, i.e. six words.
pub const MAX_WORDS: usize = 6;

/// Number of ASCII characters used for one data word.
pub const WORD_CHARS: usize = 4;

pub type Frame = heapless::Vec<u8, FRAME_CAPACITY>;
pub type Words = heapless::Vec<u16, MAX_WORDS>;

/// Request payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload<'a> {
    Empty,
    /// Passed through untouched. Used for the single byte compensation mode flag.
    Raw(&'a [u8]),
    /// One word, rendered as four upper case hex digits.
    Word(u16),
    Words(&'a [u16]),
}

impl Payload<'_> {
    /// Number of DATA bytes this payload occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        match self {
            Payload::Empty => 0,
            Payload::Raw(bytes) => bytes.len(),
            Payload::Word(_) => WORD_CHARS,
            Payload::Words(words) => words.len() * WORD_CHARS,
        }
    }
}

fn overrun<E>(_: E) -> FrameError {
    FrameError::Overrun {
        capacity: FRAME_CAPACITY,
    }
}

/// One byte modular sum.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, byte| sum.wrapping_add(*byte))
}

fn push_upper_hex(frame: &mut Frame, bytes: &[u8]) -> Result<(), FrameError> {
    let mut digits = [0u8; 2];
    for byte in bytes {
        hex::encode_to_slice([*byte], &mut digits)?;
        digits.make_ascii_uppercase();
        frame.extend_from_slice(&digits).map_err(overrun)?;
    }
    Ok(())
}

/// Wrap `len` bytes of DATA, written by `fill`, in the frame delimiters and checksum.
///
/// This is the only place the DATA size is checked against [`MAX_DATA`].
fn assemble(
    code: &[u8; CODE_LEN],
    len: usize,
    fill: impl FnOnce(&mut Frame) -> Result<(), FrameError>,
) -> Result<Frame, FrameError> {
    if len > MAX_DATA {
        return Err(FrameError::PayloadTooLarge {
            len,
            capacity: MAX_DATA,
        });
    }

    let mut frame = Frame::new();
    frame.push(STX).map_err(overrun)?;
    frame.extend_from_slice(code).map_err(overrun)?;
    fill(&mut frame)?;
    frame.push(ETX).map_err(overrun)?;
    let sum = checksum(&frame);
    push_upper_hex(&mut frame, &[sum])?;
    frame.push(CR).map_err(overrun)?;
    Ok(frame)
}

/// Assemble a frame around an already rendered DATA segment.
pub(crate) fn build(code: &[u8; CODE_LEN], data: &[u8]) -> Result<Frame, FrameError> {
    assemble(code, data.len(), |frame| frame.extend_from_slice(data).map_err(overrun))
}

/// Build a request frame for `command`.
pub fn encode(command: Command, payload: Payload<'_>) -> Result<Frame, FrameError> {
    assemble(&command.code_bytes(), payload.encoded_len(), |frame| {
        match payload {
            Payload::Empty => {}
            Payload::Raw(bytes) => frame.extend_from_slice(bytes).map_err(overrun)?,
            Payload::Word(word) => push_upper_hex(frame, &word.to_be_bytes())?,
            Payload::Words(words) => {
                for word in words {
                    push_upper_hex(frame, &word.to_be_bytes())?;
                }
            }
        }
        Ok(())
    })
}

/// Validate a complete frame and split its DATA segment into words.
///
/// The command is matched against the catalog in either case, so this accepts requests as
/// well as the chip's lower case responses.
pub fn decode(raw: &[u8]) -> Result<(Command, Words), FrameError> {
    let len = raw.len();
    let (Some(&first), Some(&last)) = (raw.first(), raw.last()) else {
        return Err(FrameError::Truncated { len });
    };
    if first != STX {
        return Err(FrameError::MissingStart { found: first });
    }
    if last != CR {
        return Err(FrameError::MissingTerminator { found: last });
    }
    if len < FRAME_OVERHEAD {
        return Err(FrameError::Truncated { len });
    }
    if raw[len - 4] != ETX {
        return Err(FrameError::MissingEnd {
            found: raw[len - 4],
        });
    }

    let mut code = [0u8; CODE_LEN];
    code.copy_from_slice(&raw[1..=CODE_LEN]);
    let command = Command::from_code(&code).ok_or(FrameError::UnknownCommand { code })?;

    if len != command.frame_size() {
        return Err(FrameError::LengthMismatch {
            command,
            expected: command.frame_size(),
            actual: len,
        });
    }

    let mut received = [0u8; 1];
    hex::decode_to_slice(&raw[len - 3..len - 1], &mut received)?;
    let calculated = checksum(&raw[..len - 3]);
    if calculated != received[0] {
        return Err(FrameError::ChecksumMismatch {
            expected: calculated,
            received: received[0],
        });
    }

    let mut words = Words::new();
    for chunk in raw[1 + CODE_LEN..len - 4].chunks(WORD_CHARS) {
        let mut word = [0u8; 2];
        hex::decode_to_slice(chunk, &mut word)?;
        words.push(u16::from_be_bytes(word)).map_err(overrun)?;
    }

    Ok((command, words))
}

/// Where a [`FrameRecognizer`] is in the byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecognizerState {
    #[default]
    AwaitingStart,
    AwaitingEnd,
    AwaitingTerminator,
}

/// Collects bytes until STX, ETX and CR have been seen in that order.
///
/// Every byte is kept, including anything received before STX, so that [`decode`] can
/// reject a stream which didn't start on a frame boundary.
#[derive(Debug, Default)]
pub struct FrameRecognizer {
    state: RecognizerState,
    buffer: Frame,
}

impl FrameRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RecognizerState {
        self.state
    }

    /// Bytes accumulated so far.
    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Feed one byte. Returns `true` once the terminator has arrived.
    pub fn push(&mut self, byte: u8) -> Result<bool, FrameError> {
        self.buffer.push(byte).map_err(overrun)?;

        use RecognizerState as RS;
        match (self.state, byte) {
            (RS::AwaitingStart, STX) => self.state = RS::AwaitingEnd,
            (RS::AwaitingEnd, ETX) => self.state = RS::AwaitingTerminator,
            (RS::AwaitingTerminator, CR) => return Ok(true),
            _ => {}
        }
        Ok(false)
    }

    pub fn into_frame(self) -> Frame {
        self.buffer
    }
}
