// Length-delimited message framing over TCP.
//
// Wire format for `message.rs` types: a 4-byte big-endian length prefix
// followed by a JSON-serialized message payload. `write_frame` and
// `read_frame` operate on raw `&[u8]` / `Vec<u8>` — the caller handles JSON
// serialization separately, keeping this module format-agnostic.
//
// `MAX_FRAME_SIZE` bounds allocation from malformed or malicious length
// prefixes. The largest legitimate frames are chat lines; 64 KB is generous.

use std::io::{self, Read, Write};

/// Maximum allowed frame size (64 KB). Protects against unbounded allocation
/// from malformed length prefixes.
pub const MAX_FRAME_SIZE: u32 = 64 * 1024;

/// Write a length-delimited frame: 4-byte big-endian length, then payload.
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> io::Result<()> {
    let len = payload.len();
    if len > MAX_FRAME_SIZE as usize {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("frame too large: {len} bytes (max {MAX_FRAME_SIZE})"),
        ));
    }
    #[expect(clippy::cast_possible_truncation)]
    let len_bytes = (len as u32).to_be_bytes();
    writer.write_all(&len_bytes)?;
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(())
}

/// Read a length-delimited frame: 4-byte big-endian length, then payload.
///
/// Returns `UnexpectedEof` if the stream closes cleanly before or during a
/// frame. Returns `InvalidData` if the length exceeds `MAX_FRAME_SIZE`.
pub fn read_frame<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame too large: {len} bytes (max {MAX_FRAME_SIZE})"),
        ));
    }
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}
