//! Tag, zigzag and varint helpers for the auxiliary streaming wire format.
//!
//! This is a protobuf-style encoding kept alongside the vtable-based format for
//! small messages where paying the cost of a vtable is not worth it; it is not
//! used by the info/struct/vector/string reader and builder.

/// Wire types that can appear in a [`make_tag`]-encoded tag byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
    Fixed32 = 5,
}

impl WireType {
    fn from_u32(v: u32) -> Option<WireType> {
        match v {
            0 => Some(WireType::Varint),
            1 => Some(WireType::Fixed64),
            2 => Some(WireType::LengthDelimited),
            5 => Some(WireType::Fixed32),
            _ => None,
        }
    }
}

const TAG_TYPE_BITS: u32 = 3;
const TAG_TYPE_MASK: u32 = (1 << TAG_TYPE_BITS) - 1;

pub fn make_tag(field_number: u32, wire_type: WireType) -> u32 {
    (field_number << TAG_TYPE_BITS) | wire_type as u32
}

pub fn tag_wire_type(tag: u32) -> Option<WireType> {
    WireType::from_u32(tag & TAG_TYPE_MASK)
}

pub fn tag_field_number(tag: u32) -> u32 {
    tag >> TAG_TYPE_BITS
}

pub fn zigzag_encode32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

pub fn zigzag_decode32(n: u32) -> i32 {
    ((n >> 1) as i32) ^ -((n & 1) as i32)
}

pub fn zigzag_encode64(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

pub fn zigzag_decode64(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

/// Appends `value` to `out` as a base-128 varint, least significant group first.
pub fn write_varint_u32(out: &mut Vec<u8>, mut value: u32) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            break;
        }
        out.push(byte | 0x80);
    }
}

pub fn write_varint_u64(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            break;
        }
        out.push(byte | 0x80);
    }
}

/// Reads a varint from the front of `data`, returning the value and the number of
/// bytes consumed, or `None` if `data` runs out before a terminating byte.
pub fn read_varint_u32(data: &[u8]) -> Option<(u32, usize)> {
    let mut value: u32 = 0;
    for (i, &byte) in data.iter().enumerate().take(5) {
        value |= ((byte & 0x7F) as u32) << (i * 7);
        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
    }
    None
}

pub fn read_varint_u64(data: &[u8]) -> Option<(u64, usize)> {
    let mut value: u64 = 0;
    for (i, &byte) in data.iter().enumerate().take(10) {
        value |= ((byte & 0x7F) as u64) << (i * 7);
        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
    }
    None
}

pub fn varint_size32(value: u32) -> usize {
    match value {
        v if v < (1 << 7) => 1,
        v if v < (1 << 14) => 2,
        v if v < (1 << 21) => 3,
        v if v < (1 << 28) => 4,
        _ => 5,
    }
}

pub fn varint_size64(value: u64) -> usize {
    match value {
        v if v < (1 << 35) => match v {
            v if v < (1 << 7) => 1,
            v if v < (1 << 14) => 2,
            v if v < (1 << 21) => 3,
            v if v < (1 << 28) => 4,
            _ => 5,
        },
        v => match v {
            v if v < (1 << 42) => 6,
            v if v < (1 << 49) => 7,
            v if v < (1 << 56) => 8,
            v if v < (1 << 63) => 9,
            _ => 10,
        },
    }
}

pub fn encode_float(value: f32) -> u32 {
    value.to_bits()
}

pub fn decode_float(value: u32) -> f32 {
    f32::from_bits(value)
}

pub fn encode_double(value: f64) -> u64 {
    value.to_bits()
}

pub fn decode_double(value: u64) -> f64 {
    f64::from_bits(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_roundtrip() {
        let tag = make_tag(5, WireType::LengthDelimited);
        assert_eq!(5, tag_field_number(tag));
        assert_eq!(Some(WireType::LengthDelimited), tag_wire_type(tag));
    }

    #[test]
    fn test_zigzag32_roundtrip() {
        for n in [-2i32, -1, 0, 1, 2, i32::MIN, i32::MAX] {
            assert_eq!(n, zigzag_decode32(zigzag_encode32(n)));
        }
        assert_eq!(0, zigzag_encode32(0));
        assert_eq!(1, zigzag_encode32(-1));
        assert_eq!(2, zigzag_encode32(1));
    }

    #[test]
    fn test_zigzag64_roundtrip() {
        for n in [-2i64, -1, 0, 1, 2, i64::MIN, i64::MAX] {
            assert_eq!(n, zigzag_decode64(zigzag_encode64(n)));
        }
    }

    #[test]
    fn test_varint_u32_roundtrip() {
        for value in [0u32, 1, 127, 128, 16384, u32::MAX] {
            let mut buf = Vec::new();
            write_varint_u32(&mut buf, value);
            assert_eq!(varint_size32(value), buf.len());
            assert_eq!(Some((value, buf.len())), read_varint_u32(&buf));
        }
    }

    #[test]
    fn test_varint_u64_roundtrip() {
        for value in [0u64, 1, 127, 128, 1 << 40, u64::MAX] {
            let mut buf = Vec::new();
            write_varint_u64(&mut buf, value);
            assert_eq!(varint_size64(value), buf.len());
            assert_eq!(Some((value, buf.len())), read_varint_u64(&buf));
        }
    }

    #[test]
    fn test_float_double_bitcast() {
        assert_eq!(1.5f32, decode_float(encode_float(1.5f32)));
        assert_eq!(1.5f64, decode_double(encode_double(1.5f64)));
    }

    #[test]
    fn test_read_varint_incomplete() {
        assert_eq!(None, read_varint_u32(&[0x80, 0x80, 0x80, 0x80, 0x80]));
    }
}
