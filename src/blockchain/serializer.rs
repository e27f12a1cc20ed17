//! Canonical binary encoding used for transaction ids and signing digests.
//!
//! Integers are little-endian, collection and string lengths are unsigned
//! LEB128 varints, timestamps are u32 seconds since the Unix epoch.

use chrono::NaiveDateTime;

/// Types with a canonical on-chain byte representation.
pub trait HiveSerialize {
    fn write_to(&self, out: &mut Vec<u8>);

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_to(&mut out);
        out
    }
}

pub fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

pub fn write_u8(out: &mut Vec<u8>, value: u8) {
    out.push(value);
}

pub fn write_bool(out: &mut Vec<u8>, value: bool) {
    out.push(value as u8);
}

pub fn write_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn write_i16(out: &mut Vec<u8>, value: i16) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn write_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn write_i64(out: &mut Vec<u8>, value: i64) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn write_string(out: &mut Vec<u8>, value: &str) {
    write_varint(out, value.len() as u64);
    out.extend_from_slice(value.as_bytes());
}

pub fn write_string_list<'a, I>(out: &mut Vec<u8>, values: I)
where
    I: IntoIterator<Item = &'a String>,
    I::IntoIter: ExactSizeIterator,
{
    let values = values.into_iter();
    write_varint(out, values.len() as u64);
    for value in values {
        write_string(out, value);
    }
}

/// Timestamps before the epoch or past 2106 are clamped into u32 range.
pub fn write_time(out: &mut Vec<u8>, value: &NaiveDateTime) {
    let secs = value.and_utc().timestamp().clamp(0, u32::MAX as i64) as u32;
    write_u32(out, secs);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::TIME_FORMAT;

    #[test]
    fn test_varint() {
        let encode = |v: u64| {
            let mut out = Vec::new();
            write_varint(&mut out, v);
            out
        };
        assert_eq!(encode(0), vec![0x00]);
        assert_eq!(encode(127), vec![0x7f]);
        assert_eq!(encode(128), vec![0x80, 0x01]);
        assert_eq!(encode(300), vec![0xac, 0x02]);
    }

    #[test]
    fn test_string_is_length_prefixed() {
        let mut out = Vec::new();
        write_string(&mut out, "alice");
        assert_eq!(out, b"\x05alice");

        let mut out = Vec::new();
        write_string_list(&mut out, &["ab".to_string(), "c".to_string()]);
        assert_eq!(out, b"\x02\x02ab\x01c");
    }

    #[test]
    fn test_time_encoding() {
        let time = NaiveDateTime::parse_from_str("1970-01-01T00:01:40", TIME_FORMAT).unwrap();
        let mut out = Vec::new();
        write_time(&mut out, &time);
        assert_eq!(out, 100u32.to_le_bytes().to_vec());
    }
}
