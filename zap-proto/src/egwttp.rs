//! EGWTTP framing - the text request/response format shared by both
//! transports.
//!
//! A request frame looks like:
//!
//! ```text
//! GET /api/system/info EGWTTP/1.1\r\n
//! Offset: 200\r\n
//! \r\n
//! <body>
//! ```
//!
//! A response frame looks like:
//!
//! ```text
//! EGWTP/1.1 200 OK\r\n
//! Location: /api/system/info\r\n
//! Method: GET\r\n
//! Content-Type: text/json\r\n
//! Content-Length: 500\r\n
//! Offset: 200\r\n          (only when offset > 0)
//! \r\n
//! <body[offset..], truncated to the transport frame limit>
//! ```
//!
//! `Content-Length` always counts the full untruncated body. A client
//! that receives a truncated frame re-issues the request with the
//! offset advanced by the chunk it got; that is the whole chunking
//! contract and must not change.
//!
//! Note the request line says `EGWTTP/1.1` while the response status
//! line says `EGWTP/1.1`. Deployed clients match both literals exactly,
//! so the asymmetry is kept as-is.

/// Trailing literal every request line must carry.
pub const REQUEST_PROTO_SUFFIX: &str = " EGWTTP/1.1";

/// Response status line (one T, see module docs).
pub const RESPONSE_STATUS_LINE: &str = "EGWTP/1.1 200 OK";

/// A decoded request frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Raw method token from the request line ("GET", "POST", ...).
    pub method: String,
    pub path: String,
    /// Byte offset into the full response body the client wants.
    pub offset: usize,
    pub body: Vec<u8>,
}

/// A decoded response header block (client side).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub location: String,
    pub method: String,
    pub content_type: String,
    /// Length of the full untruncated body.
    pub content_length: usize,
    /// Offset this chunk starts at.
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// No `\r\n\r\n` header/body separator.
    MissingSeparator,
    /// Wrong protocol literal or non-text header block.
    BadProtocol,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MissingSeparator => write!(f, "missing header/body separator"),
            ParseError::BadProtocol => write!(f, "bad protocol literal"),
        }
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// The header block alone exceeds the transport frame limit.
    /// Truncation must never split a header, so this is rejected.
    HeaderTooLarge,
}

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodeError::HeaderTooLarge => write!(f, "header exceeds transport frame limit"),
        }
    }
}

impl std::error::Error for EncodeError {}

fn find_separator(raw: &[u8]) -> Option<usize> {
    raw.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Parse an Offset header value leading-digits-first, so `Offset: 12x`
/// reads as 12 and pure garbage reads as 0.
fn parse_offset(value: &str) -> usize {
    let digits: String = value
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

/// Decode a request frame.
///
/// A malformed method token is not an error (the router maps it to its
/// unknown sentinel); only a missing separator or a wrong protocol
/// literal fail the parse.
pub fn parse_request(raw: &[u8]) -> Result<Request, ParseError> {
    let sep = find_separator(raw).ok_or(ParseError::MissingSeparator)?;
    let header = std::str::from_utf8(&raw[..sep]).map_err(|_| ParseError::BadProtocol)?;
    let body = raw[sep + 4..].to_vec();

    let first_line = header.split("\r\n").next().unwrap_or("");
    let rest = first_line
        .strip_suffix(REQUEST_PROTO_SUFFIX)
        .ok_or(ParseError::BadProtocol)?;

    let (method, path) = match rest.find(' ') {
        Some(i) => (&rest[..i], &rest[i + 1..]),
        None => (rest, ""),
    };

    let mut offset = 0;
    for line in header.split("\r\n").skip(1) {
        if let Some(value) = line.strip_prefix("Offset:") {
            offset = parse_offset(value);
        }
    }

    Ok(Request {
        method: method.to_string(),
        path: path.trim().to_string(),
        offset,
        body,
    })
}

/// Encode a request frame (client side).
pub fn encode_request(method: &str, path: &str, offset: usize, body: &[u8]) -> Vec<u8> {
    let mut header = format!("{} {}{}\r\n", method, path, REQUEST_PROTO_SUFFIX);
    if offset > 0 {
        header.push_str(&format!("Offset: {}\r\n", offset));
    }
    header.push_str("\r\n");

    let mut frame = header.into_bytes();
    frame.extend_from_slice(body);
    frame
}

/// Encode a response frame.
///
/// `Content-Length` is the full body length even when the frame is
/// truncated to `max_frame`; the body slice starts at `offset` and an
/// `Offset` header echoes it when non-zero. Offsets past the end of
/// the body yield an empty slice.
pub fn encode_response(
    location: &str,
    method: &str,
    body: &[u8],
    offset: usize,
    max_frame: usize,
) -> Result<Vec<u8>, EncodeError> {
    let mut header = String::new();
    header.push_str(RESPONSE_STATUS_LINE);
    header.push_str("\r\n");
    header.push_str("Location: ");
    header.push_str(location);
    header.push_str("\r\n");
    header.push_str("Method: ");
    header.push_str(method);
    header.push_str("\r\n");
    header.push_str("Content-Type: text/json\r\n");
    header.push_str(&format!("Content-Length: {}\r\n", body.len()));
    if offset > 0 {
        header.push_str(&format!("Offset: {}\r\n", offset));
    }
    header.push_str("\r\n");

    if header.len() > max_frame {
        return Err(EncodeError::HeaderTooLarge);
    }

    let mut frame = header.into_bytes();
    frame.extend_from_slice(&body[offset.min(body.len())..]);
    frame.truncate(max_frame);
    Ok(frame)
}

/// Decode a response frame into its header block and body chunk
/// (client side).
pub fn parse_response(raw: &[u8]) -> Result<(ResponseHead, Vec<u8>), ParseError> {
    let sep = find_separator(raw).ok_or(ParseError::MissingSeparator)?;
    let header = std::str::from_utf8(&raw[..sep]).map_err(|_| ParseError::BadProtocol)?;
    let chunk = raw[sep + 4..].to_vec();

    let mut lines = header.split("\r\n");
    let status = lines.next().unwrap_or("");
    if !status.starts_with("EGWTP/1.1") {
        return Err(ParseError::BadProtocol);
    }

    let mut head = ResponseHead {
        location: String::new(),
        method: String::new(),
        content_type: String::new(),
        content_length: 0,
        offset: 0,
    };

    for line in lines {
        if let Some(v) = line.strip_prefix("Location:") {
            head.location = v.trim().to_string();
        } else if let Some(v) = line.strip_prefix("Method:") {
            head.method = v.trim().to_string();
        } else if let Some(v) = line.strip_prefix("Content-Type:") {
            head.content_type = v.trim().to_string();
        } else if let Some(v) = line.strip_prefix("Content-Length:") {
            head.content_length = parse_offset(v);
        } else if let Some(v) = line.strip_prefix("Offset:") {
            head.offset = parse_offset(v);
        }
    }

    Ok((head, chunk))
}
