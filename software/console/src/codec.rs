// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Filename: <codec.rs>

//! Newline-delimited text framing for the serial link.

use std::io;

use tokio_util::bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

const DELIMITER: u8 = b'\n';

/// One line of text per frame. Invalid UTF-8 is replaced, never rejected.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineCodec;

impl LineCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, io::Error> {
        match src.iter().position(|&b| b == DELIMITER) {
            Some(idx) => {
                let line = src.split_to(idx + 1);
                Ok(Some(decode(&line)))
            }
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>, io::Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if src.is_empty() {
            return Ok(None);
        }
        // Unterminated tail before the peer went away.
        let rest = src.split();
        Ok(Some(decode(&rest)))
    }
}

impl<T: AsRef<str>> Encoder<T> for LineCodec {
    type Error = io::Error;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), io::Error> {
        let text = item.as_ref().as_bytes();
        dst.reserve(text.len() + 1);
        dst.extend_from_slice(text);
        dst.extend_from_slice(&[DELIMITER]);
        Ok(())
    }
}

/// Wire bytes for one outbound message. Embedded newlines are not escaped.
pub fn encode(text: &str) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(text.len() + 1);
    // Encoding into a growable buffer cannot fail.
    let _ = LineCodec.encode(text, &mut buf);
    buf.to_vec()
}

/// Text of one inbound line with trailing whitespace removed.
///
/// An empty result means "no message"; callers cannot tell it apart from a
/// timeout that delivered nothing.
pub fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_appends_single_newline() {
        assert_eq!(encode("Hello"), b"Hello\n");
        assert_eq!(encode(""), b"\n");
        assert_eq!(encode("ä").last(), Some(&b'\n'));
        assert_eq!(encode("ä").iter().filter(|&&b| b == b'\n').count(), 1);
    }

    #[test]
    fn decode_trims_line_ending() {
        assert_eq!(decode(b"Test Message\n"), "Test Message");
        assert_eq!(decode(b"Test Message\r\n"), "Test Message");
        assert_eq!(decode(b"\n"), "");
        assert_eq!(decode(b""), "");
    }

    #[test]
    fn decode_keeps_leading_whitespace() {
        assert_eq!(decode(b"  indented\n"), "  indented");
    }

    #[test]
    fn decode_replaces_invalid_utf8() {
        assert_eq!(decode(b"ok \xff\xfe end\n"), "ok \u{FFFD}\u{FFFD} end");
    }

    #[test]
    fn round_trip_plain_text() {
        for msg in ["Hello", "", "{\"gameMode\": 2}", "Grüße"] {
            assert_eq!(decode(&encode(msg)), msg);
        }
    }

    #[test]
    fn decoder_splits_lines_across_chunks() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"Hel"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b"lo\nWorld\n");
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("Hello"));
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("World"));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn decoder_flushes_tail_at_eof() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"partial"[..]);
        assert_eq!(codec.decode_eof(&mut buf).unwrap().as_deref(), Some("partial"));
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
    }
}
