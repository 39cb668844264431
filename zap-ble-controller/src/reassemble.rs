//! Client-side reassembly of offset-chunked responses
//!
//! The gateway reports the full body length in `Content-Length` on
//! every frame; the client advances its request offset by whatever
//! each read returned until the full body has arrived. This type holds
//! that loop's state and checks the gateway is actually honoring the
//! contract.

use zap_proto::ResponseHead;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ReassembleError {
    #[error("Content-Length changed mid-transfer: {was} then {now}")]
    LengthChanged { was: usize, now: usize },
    #[error("frame offset {got} does not match requested offset {expected}")]
    OffsetMismatch { expected: usize, got: usize },
    #[error("empty chunk before the body was complete")]
    Stalled,
}

#[derive(Debug, Default)]
pub struct Reassembler {
    buf: Vec<u8>,
    total: Option<usize>,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset to put in the next request frame.
    pub fn next_offset(&self) -> usize {
        self.buf.len()
    }

    /// Feed one response frame. Returns the complete body once
    /// `Content-Length` bytes have arrived.
    pub fn feed(
        &mut self,
        head: &ResponseHead,
        chunk: &[u8],
    ) -> Result<Option<Vec<u8>>, ReassembleError> {
        let total = match self.total {
            None => {
                self.total = Some(head.content_length);
                head.content_length
            }
            Some(total) if total != head.content_length => {
                return Err(ReassembleError::LengthChanged {
                    was: total,
                    now: head.content_length,
                });
            }
            Some(total) => total,
        };

        if head.offset != self.buf.len() {
            return Err(ReassembleError::OffsetMismatch {
                expected: self.buf.len(),
                got: head.offset,
            });
        }

        self.buf.extend_from_slice(chunk);

        if self.buf.len() >= total {
            let mut body = std::mem::take(&mut self.buf);
            body.truncate(total);
            self.total = None;
            Ok(Some(body))
        } else if chunk.is_empty() {
            Err(ReassembleError::Stalled)
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zap_proto::egwttp::{encode_response, parse_response};

    #[test]
    fn single_frame_body_completes_immediately() {
        let frame = encode_response("/api/name", "GET", b"{\"name\":\"zap\"}", 0, 512).unwrap();
        let (head, chunk) = parse_response(&frame).unwrap();

        let mut r = Reassembler::new();
        assert_eq!(r.feed(&head, &chunk).unwrap().unwrap(), b"{\"name\":\"zap\"}");
    }

    #[test]
    fn empty_body_completes_on_first_frame() {
        let frame = encode_response("/x", "GET", b"", 0, 512).unwrap();
        let (head, chunk) = parse_response(&frame).unwrap();

        let mut r = Reassembler::new();
        assert_eq!(r.feed(&head, &chunk).unwrap().unwrap(), b"");
    }

    #[test]
    fn chunked_transfer_reassembles() {
        let body: Vec<u8> = (0..700u32).map(|i| (i % 256) as u8).collect();
        let mut r = Reassembler::new();

        loop {
            let frame =
                encode_response("/api/big", "GET", &body, r.next_offset(), 256).unwrap();
            let (head, chunk) = parse_response(&frame).unwrap();
            if let Some(full) = r.feed(&head, &chunk).unwrap() {
                assert_eq!(full, body);
                break;
            }
        }
    }

    #[test]
    fn detects_offset_mismatch() {
        let body = vec![b'a'; 600];
        let mut r = Reassembler::new();

        let frame = encode_response("/x", "GET", &body, 0, 256).unwrap();
        let (head, chunk) = parse_response(&frame).unwrap();
        assert!(r.feed(&head, &chunk).unwrap().is_none());

        // Replay of the first frame instead of the requested offset.
        let err = r.feed(&head, &chunk).unwrap_err();
        assert!(matches!(err, ReassembleError::OffsetMismatch { .. }));
    }

    #[test]
    fn detects_length_change() {
        let mut r = Reassembler::new();

        let frame = encode_response("/x", "GET", &vec![b'a'; 600], 0, 256).unwrap();
        let (head, chunk) = parse_response(&frame).unwrap();
        r.feed(&head, &chunk).unwrap();

        let offset = r.next_offset();
        let frame = encode_response("/x", "GET", &vec![b'a'; 999], offset, 256).unwrap();
        let (head, chunk) = parse_response(&frame).unwrap();
        assert!(matches!(
            r.feed(&head, &chunk),
            Err(ReassembleError::LengthChanged { .. })
        ));
    }

    #[test]
    fn detects_stall() {
        let mut r = Reassembler::new();
        let head = ResponseHead {
            location: "/x".to_string(),
            method: "GET".to_string(),
            content_type: "text/json".to_string(),
            content_length: 10,
            offset: 0,
        };
        assert_eq!(r.feed(&head, b""), Err(ReassembleError::Stalled));
    }
}
