//! Tagged-binary event content.
//!
//! Layout: a u32 little-endian entry count, then for each entry a
//! varint-length-prefixed UTF-8 key followed by a varint-length-prefixed
//! UTF-8 value. The whole buffer is rendered as uppercase hex because the
//! transport carries content in a single text field.

use std::collections::HashMap;

use gamebus_domain::GameEvent;

use crate::error::ClientError;

/// Lengths are 7-bit groups, low group first, high bit = continuation.
const VARINT_MAX_BYTES: usize = 5;

pub(crate) fn serialize(event: &GameEvent) -> String {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(event.len() as u32).to_le_bytes());
    for (key, value) in event.iter() {
        write_string(&mut buf, key);
        write_string(&mut buf, value);
    }
    hex::encode_upper(buf)
}

pub(crate) fn deserialize(content: &str) -> Result<GameEvent, ClientError> {
    let bytes = hex::decode(content.trim())
        .map_err(|e| ClientError::decode(format!("invalid hex content: {e}")))?;

    let mut cursor = 0usize;
    let count = read_u32(&bytes, &mut cursor)? as usize;

    // each entry carries at least two one-byte length prefixes, so a count
    // the remaining bytes cannot hold is malformed before reading any entry
    if count > (bytes.len() - cursor) / 2 {
        return Err(ClientError::decode("entry count exceeds buffer length"));
    }

    let mut properties = HashMap::with_capacity(count);
    for _ in 0..count {
        let key = read_string(&bytes, &mut cursor)?;
        let value = read_string(&bytes, &mut cursor)?;
        properties.insert(key, value);
    }

    if cursor != bytes.len() {
        return Err(ClientError::decode("trailing bytes after final entry"));
    }

    Ok(GameEvent::from(properties))
}

fn write_string(buf: &mut Vec<u8>, s: &str) {
    let mut remaining = s.len() as u32;
    loop {
        let mut byte = (remaining & 0x7f) as u8;
        remaining >>= 7;
        if remaining != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if remaining == 0 {
            break;
        }
    }
    buf.extend_from_slice(s.as_bytes());
}

fn read_u32(bytes: &[u8], cursor: &mut usize) -> Result<u32, ClientError> {
    let end = cursor
        .checked_add(4)
        .filter(|end| *end <= bytes.len())
        .ok_or_else(|| ClientError::decode("truncated entry count"))?;
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[*cursor..end]);
    *cursor = end;
    Ok(u32::from_le_bytes(raw))
}

fn read_varint(bytes: &[u8], cursor: &mut usize) -> Result<u32, ClientError> {
    let mut value = 0u32;
    for shift_index in 0..VARINT_MAX_BYTES {
        let byte = *bytes
            .get(*cursor)
            .ok_or_else(|| ClientError::decode("truncated length prefix"))?;
        *cursor += 1;
        value |= u32::from(byte & 0x7f) << (7 * shift_index);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(ClientError::decode("length prefix too long"))
}

fn read_string(bytes: &[u8], cursor: &mut usize) -> Result<String, ClientError> {
    let len = read_varint(bytes, cursor)? as usize;
    let end = cursor
        .checked_add(len)
        .filter(|end| *end <= bytes.len())
        .ok_or_else(|| ClientError::decode("truncated string entry"))?;
    let s = std::str::from_utf8(&bytes[*cursor..end])
        .map_err(|e| ClientError::decode(format!("invalid UTF-8 in entry: {e}")))?
        .to_string();
    *cursor = end;
    Ok(s)
}
