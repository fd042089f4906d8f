//! Stream framing for the `~`-separated record protocol.
//!
//! The middleware sends a plain byte stream: several records may arrive in
//! one read and a record may be split across reads, including mid-field.
//! [`WireFramer`] accumulates bytes and yields each complete record text.
//! Bytes after the last separator stay buffered until a later push completes
//! them, so no record is ever lost or corrupted by read-boundary placement.

use bytes::{Buf, BytesMut};

use crate::constants::{DEFAULT_MAX_FRAME_LEN, FRAME_SEPARATOR};
use crate::error::ProtocolError;
use crate::message::Message;

const SEPARATOR_BYTE: u8 = FRAME_SEPARATOR as u8;

/// A codec for reassembling separator-delimited records from a byte stream.
///
/// The buffered trailing fragment is capped: if it grows past the configured
/// maximum without a separator, the oversized record is discarded and the
/// framer resynchronizes at the next separator.
#[derive(Debug)]
pub struct WireFramer {
    /// Buffer for accumulating incoming data.
    buffer: BytesMut,
    /// Maximum length of a single record, in bytes.
    max_frame_len: usize,
    /// Whether we are discarding an oversized record up to its separator.
    discarding: bool,
}

impl Default for WireFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl WireFramer {
    /// Create a framer with the default frame size cap.
    pub fn new() -> Self {
        Self::with_max_frame_len(DEFAULT_MAX_FRAME_LEN)
    }

    /// Create a framer with an explicit frame size cap.
    pub fn with_max_frame_len(max_frame_len: usize) -> Self {
        WireFramer {
            buffer: BytesMut::with_capacity(1024),
            max_frame_len,
            discarding: false,
        }
    }

    /// Add received data to the buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to extract the next complete record text from the buffer.
    ///
    /// Returns `Ok(Some(text))` for each complete record, `Ok(None)` when
    /// more data is needed. Empty records (consecutive separators) are
    /// skipped, not emitted. Errors consume the offending bytes, so the
    /// caller can report them and keep reading.
    pub fn next_frame(&mut self) -> Result<Option<String>, ProtocolError> {
        loop {
            let separator = self.buffer.iter().position(|&b| b == SEPARATOR_BYTE);

            if self.discarding {
                match separator {
                    Some(pos) => {
                        log::debug!("discarded {} trailing bytes of oversized frame", pos + 1);
                        self.buffer.advance(pos + 1);
                        self.discarding = false;
                        continue;
                    }
                    None => {
                        self.buffer.clear();
                        return Ok(None);
                    }
                }
            }

            match separator {
                Some(pos) => {
                    let frame = self.buffer.split_to(pos);
                    self.buffer.advance(1);
                    if frame.is_empty() {
                        continue;
                    }
                    match std::str::from_utf8(&frame) {
                        Ok(text) => return Ok(Some(text.to_string())),
                        Err(_) => return Err(ProtocolError::InvalidUtf8),
                    }
                }
                None => {
                    if self.buffer.len() > self.max_frame_len {
                        let actual = self.buffer.len();
                        self.buffer.clear();
                        self.discarding = true;
                        return Err(ProtocolError::FrameTooLarge {
                            max: self.max_frame_len,
                            actual,
                        });
                    }
                    return Ok(None);
                }
            }
        }
    }

    /// Get the number of buffered bytes (the trailing fragment).
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Clear all buffered state.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.discarding = false;
    }

    /// Encode a message into wire bytes: record text plus the separator.
    pub fn encode_frame(message: &Message) -> Vec<u8> {
        Self::encode_text_frame(&message.encode())
    }

    /// Encode raw record text into wire bytes with the separator appended.
    pub fn encode_text_frame(text: &str) -> Vec<u8> {
        let mut buf = Vec::with_capacity(text.len() + 1);
        buf.extend_from_slice(text.as_bytes());
        buf.push(SEPARATOR_BYTE);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(framer: &mut WireFramer) -> Vec<String> {
        let mut frames = Vec::new();
        while let Ok(Some(frame)) = framer.next_frame() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn test_encode_frame_appends_separator() {
        let bytes = WireFramer::encode_frame(&Message::StartCalibration);
        assert_eq!(bytes, b"START_CALIBRATION~");
    }

    #[test]
    fn test_two_frames_one_push() {
        let mut framer = WireFramer::new();
        framer.push(b"A~B~");
        assert_eq!(drain(&mut framer), vec!["A", "B"]);
        assert_eq!(framer.buffered_len(), 0);
    }

    #[test]
    fn test_partial_frame_carries_over() {
        let mut framer = WireFramer::new();
        framer.push(b"A~B");
        assert_eq!(drain(&mut framer), vec!["A"]);
        assert_eq!(framer.buffered_len(), 1);

        framer.push(b"~");
        assert_eq!(drain(&mut framer), vec!["B"]);
    }

    #[test]
    fn test_empty_frames_are_skipped() {
        let mut framer = WireFramer::new();
        framer.push(b"~~A~~~B~");
        assert_eq!(drain(&mut framer), vec!["A", "B"]);
    }

    #[test]
    fn test_arbitrary_chunking_preserves_frames() {
        let records = ["MW_STATUS;status=RUNNING;code=0", "A", "TRACKING;hand=LEFT", "zz"];
        let mut blob = Vec::new();
        for record in &records {
            blob.extend_from_slice(&WireFramer::encode_text_frame(record));
        }

        for chunk_size in 1..=blob.len() {
            let mut framer = WireFramer::new();
            let mut frames = Vec::new();
            for chunk in blob.chunks(chunk_size) {
                framer.push(chunk);
                frames.extend(drain(&mut framer));
            }
            assert_eq!(frames, records, "chunk size {chunk_size}");
        }
    }

    #[test]
    fn test_split_mid_utf8_sequence() {
        let text = "MW_STATUS;error=è guasto";
        let blob = WireFramer::encode_text_frame(text);

        for chunk_size in 1..=blob.len() {
            let mut framer = WireFramer::new();
            let mut frames = Vec::new();
            for chunk in blob.chunks(chunk_size) {
                framer.push(chunk);
                frames.extend(drain(&mut framer));
            }
            assert_eq!(frames, vec![text], "chunk size {chunk_size}");
        }
    }

    #[test]
    fn test_invalid_utf8_frame_reports_and_continues() {
        let mut framer = WireFramer::new();
        framer.push(&[0xFF, 0xFE, SEPARATOR_BYTE]);
        framer.push(b"A~");

        assert_eq!(framer.next_frame(), Err(ProtocolError::InvalidUtf8));
        assert_eq!(framer.next_frame(), Ok(Some("A".to_string())));
    }

    #[test]
    fn test_oversized_frame_is_discarded() {
        let mut framer = WireFramer::with_max_frame_len(8);
        framer.push(b"0123456789");

        let err = framer.next_frame().unwrap_err();
        assert_eq!(err, ProtocolError::FrameTooLarge { max: 8, actual: 10 });

        // Rest of the oversized record is still dropped after the error.
        framer.push(b"garbage~OK~");
        assert_eq!(drain(&mut framer), vec!["OK"]);
    }

    #[test]
    fn test_no_separator_accumulates_quietly() {
        let mut framer = WireFramer::new();
        framer.push(b"MW_STA");
        assert_eq!(framer.next_frame(), Ok(None));
        framer.push(b"TUS~");
        assert_eq!(framer.next_frame(), Ok(Some("MW_STATUS".to_string())));
    }
}
