//! Wire primitives
//!
//! Big-endian integers and length-prefixed strings, maps and multi-maps.
//!
//! Writers append to any [`BufMut`]; readers consume from any [`Buf`] and
//! fail with [`CqlError::TruncatedRead`] instead of panicking when the
//! source runs dry.
//!
//! ```text
//! [short string]  len:u16 | bytes
//! [long string]   len:u32 | bytes
//! [string map]    n:u16   | ([short string] key, [short string] value) * n
//! [string list]   n:u16   | [short string] * n
//! [multi-map]     n:u16   | ([short string] key, [string list] values) * n
//! ```

use std::collections::BTreeMap;

use bytes::{Buf, BufMut};

use crate::error::{CqlError, Result};

/// Largest string encodable with a 2-byte length prefix
pub const MAX_SHORT_STRING: usize = u16::MAX as usize;

/// Largest string encodable with a 4-byte length prefix
pub const MAX_LONG_STRING: usize = u32::MAX as usize;

/// Ordered `string -> string` mapping (STARTUP options)
pub type StringMap = BTreeMap<String, String>;

/// Ordered `string -> [string]` mapping (SUPPORTED options)
pub type StringMultiMap = BTreeMap<String, Vec<String>>;

// =============================================================================
// Integers
// =============================================================================

pub fn write_u16<B: BufMut>(buf: &mut B, value: u16) {
    buf.put_u16(value);
}

pub fn write_u32<B: BufMut>(buf: &mut B, value: u32) {
    buf.put_u32(value);
}

pub fn write_i32<B: BufMut>(buf: &mut B, value: i32) {
    buf.put_i32(value);
}

#[inline]
fn ensure(available: usize, needed: usize) -> Result<()> {
    if available < needed {
        return Err(CqlError::TruncatedRead { needed, available });
    }
    Ok(())
}

pub fn read_u16<B: Buf>(buf: &mut B) -> Result<u16> {
    ensure(buf.remaining(), 2)?;
    Ok(buf.get_u16())
}

pub fn read_u32<B: Buf>(buf: &mut B) -> Result<u32> {
    ensure(buf.remaining(), 4)?;
    Ok(buf.get_u32())
}

pub fn read_i32<B: Buf>(buf: &mut B) -> Result<i32> {
    ensure(buf.remaining(), 4)?;
    Ok(buf.get_i32())
}

// =============================================================================
// Strings
// =============================================================================

/// Write a 2-byte length followed by the raw bytes of `s`.
///
/// Nothing is written when `s` is longer than [`MAX_SHORT_STRING`].
pub fn write_short_string<B: BufMut>(buf: &mut B, s: &str) -> Result<()> {
    if s.len() > MAX_SHORT_STRING {
        return Err(CqlError::StringTooLong {
            len: s.len(),
            max: MAX_SHORT_STRING,
        });
    }
    buf.put_u16(s.len() as u16);
    buf.put_slice(s.as_bytes());
    Ok(())
}

/// Write a 4-byte length followed by the raw bytes of `s`.
pub fn write_long_string<B: BufMut>(buf: &mut B, s: &str) -> Result<()> {
    if s.len() > MAX_LONG_STRING {
        return Err(CqlError::StringTooLong {
            len: s.len(),
            max: MAX_LONG_STRING,
        });
    }
    buf.put_u32(s.len() as u32);
    buf.put_slice(s.as_bytes());
    Ok(())
}

fn read_utf8<B: Buf>(buf: &mut B, len: usize) -> Result<String> {
    ensure(buf.remaining(), len)?;
    let raw = buf.copy_to_bytes(len);
    String::from_utf8(raw.to_vec())
        .map_err(|e| CqlError::ProtocolViolation(format!("invalid UTF-8 in string: {}", e)))
}

pub fn read_short_string<B: Buf>(buf: &mut B) -> Result<String> {
    let len = read_u16(buf)? as usize;
    read_utf8(buf, len)
}

pub fn read_long_string<B: Buf>(buf: &mut B) -> Result<String> {
    let len = read_u32(buf)? as usize;
    read_utf8(buf, len)
}

// =============================================================================
// Collections
// =============================================================================

fn write_count<B: BufMut>(buf: &mut B, len: usize) -> Result<()> {
    if len > u16::MAX as usize {
        return Err(CqlError::CollectionTooLarge {
            len,
            max: u16::MAX as usize,
        });
    }
    buf.put_u16(len as u16);
    Ok(())
}

pub fn write_string_list<B: BufMut>(buf: &mut B, list: &[String]) -> Result<()> {
    write_count(buf, list.len())?;
    for item in list {
        write_short_string(buf, item)?;
    }
    Ok(())
}

pub fn read_string_list<B: Buf>(buf: &mut B) -> Result<Vec<String>> {
    let n = read_u16(buf)?;
    // Each item needs at least its 2-byte length, so a bogus count cannot
    // trigger a huge allocation.
    let mut list = Vec::with_capacity((n as usize).min(buf.remaining() / 2));
    for _ in 0..n {
        list.push(read_short_string(buf)?);
    }
    Ok(list)
}

pub fn write_string_map<B: BufMut>(buf: &mut B, map: &StringMap) -> Result<()> {
    write_count(buf, map.len())?;
    for (key, value) in map {
        write_short_string(buf, key)?;
        write_short_string(buf, value)?;
    }
    Ok(())
}

/// Read a string map. A repeated key keeps the last value.
pub fn read_string_map<B: Buf>(buf: &mut B) -> Result<StringMap> {
    let n = read_u16(buf)?;
    let mut map = StringMap::new();
    for _ in 0..n {
        let key = read_short_string(buf)?;
        let value = read_short_string(buf)?;
        map.insert(key, value);
    }
    Ok(map)
}

pub fn write_string_multimap<B: BufMut>(buf: &mut B, map: &StringMultiMap) -> Result<()> {
    write_count(buf, map.len())?;
    for (key, values) in map {
        write_short_string(buf, key)?;
        write_string_list(buf, values)?;
    }
    Ok(())
}

pub fn read_string_multimap<B: Buf>(buf: &mut B) -> Result<StringMultiMap> {
    let n = read_u16(buf)?;
    let mut map = StringMultiMap::new();
    for _ in 0..n {
        let key = read_short_string(buf)?;
        let values = read_string_list(buf)?;
        map.insert(key, values);
    }
    Ok(map)
}
