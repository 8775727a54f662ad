//! Line framing for the bridge's stdout.
//!
//! Each inbound event is one `\n`-terminated JSON object. Lines longer than
//! [`MAX_EVENT_LINE`] are rejected so a runaway bridge cannot make the bot
//! buffer without bound.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, LinesCodec, LinesCodecError};

use crate::{AppError, Result};

/// Longest accepted inbound event line, in bytes (1 MiB).
pub const MAX_EVENT_LINE: usize = 1 << 20;

/// Event-line decoder for [`tokio_util::codec::FramedRead`].
///
/// An over-long line surfaces as [`AppError::Bridge`] once; decoding then
/// resumes after the next newline. Read failures surface as [`AppError::Io`].
#[derive(Debug)]
pub struct BridgeCodec {
    lines: LinesCodec,
}

impl BridgeCodec {
    /// Codec bounded by [`MAX_EVENT_LINE`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: LinesCodec::new_with_max_length(MAX_EVENT_LINE),
        }
    }
}

impl Default for BridgeCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for BridgeCodec {
    type Item = String;
    type Error = AppError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<String>> {
        self.lines.decode(buf).map_err(framing_error)
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<String>> {
        self.lines.decode_eof(buf).map_err(framing_error)
    }
}

fn framing_error(err: LinesCodecError) -> AppError {
    match err {
        LinesCodecError::MaxLineLengthExceeded => AppError::Bridge(format!(
            "line too long: event lines are limited to {MAX_EVENT_LINE} bytes"
        )),
        LinesCodecError::Io(err) => AppError::Io(format!("bridge stdout: {err}")),
    }
}
