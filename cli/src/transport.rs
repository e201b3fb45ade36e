//! Content-Length-framed DAP message transport, the same header shape the
//! teacher's TCP handler speaks: `Content-Length: N\r\n\r\n<N bytes of JSON>`.

use std::io::{self, BufRead, Read, Write};

use adapter_core::dap::ProtocolMessage;

/// Reads one framed message, or `Ok(None)` on a clean EOF before any header
/// byte arrives.
pub fn read_message<R: BufRead>(reader: &mut R) -> io::Result<Option<ProtocolMessage>> {
    let mut header = String::new();
    loop {
        header.clear();
        if reader.read_line(&mut header)? == 0 {
            return Ok(None);
        }
        if header.trim().is_empty() {
            continue;
        }
        break;
    }

    let content_length: usize = header
        .trim()
        .strip_prefix("Content-Length:")
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, format!("bad header: {header}")))?;

    let mut empty = String::new();
    reader.read_line(&mut empty)?;

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body)?;

    let message = serde_json::from_slice(&body)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(Some(message))
}

pub fn write_message<W: Write>(writer: &mut W, message: &ProtocolMessage) -> io::Result<()> {
    let body = serde_json::to_string(message).expect("DAP messages are always serializable");
    write!(writer, "Content-Length: {}\r\n\r\n{}", body.len(), body)?;
    writer.flush()
}
