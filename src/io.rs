use byteorder::{ByteOrder, LittleEndian};

pub trait Read {
    fn read<T: AsRef<[u8]>>(buf: &T, pos: usize) -> Self;
}

impl Read for bool {
    fn read<T: AsRef<[u8]>>(buf: &T, pos: usize) -> Self {
        buf.as_ref()[pos] != 0
    }
}

impl Read for u8 {
    fn read<T: AsRef<[u8]>>(buf: &T, pos: usize) -> Self {
        buf.as_ref()[pos]
    }
}

impl Read for i8 {
    fn read<T: AsRef<[u8]>>(buf: &T, pos: usize) -> Self {
        buf.as_ref()[pos] as i8
    }
}

macro_rules! impl_read_via_byteorder {
    ($ty:ident, $func:ident) => {
        impl Read for $ty {
            fn read<T: AsRef<[u8]>>(buf: &T, pos: usize) -> Self {
                LittleEndian::$func(&buf.as_ref()[pos..])
            }
        }
    };
}

impl_read_via_byteorder!(u16, read_u16);
impl_read_via_byteorder!(i16, read_i16);
impl_read_via_byteorder!(u32, read_u32);
impl_read_via_byteorder!(i32, read_i32);
impl_read_via_byteorder!(u64, read_u64);
impl_read_via_byteorder!(i64, read_i64);
impl_read_via_byteorder!(f32, read_f32);
impl_read_via_byteorder!(f64, read_f64);

/// Symmetric counterpart to `Read`: stores `self` little-endian at `pos`.
///
/// Used by the builder to write scalars in place of a raw `memcpy` + endian
/// swap, the same way `Read` replaces a raw unaligned load.
pub trait Write {
    fn write(&self, buf: &mut [u8], pos: usize);
}

impl Write for bool {
    fn write(&self, buf: &mut [u8], pos: usize) {
        buf[pos] = *self as u8;
    }
}

impl Write for u8 {
    fn write(&self, buf: &mut [u8], pos: usize) {
        buf[pos] = *self;
    }
}

impl Write for i8 {
    fn write(&self, buf: &mut [u8], pos: usize) {
        buf[pos] = *self as u8;
    }
}

macro_rules! impl_write_via_byteorder {
    ($ty:ident, $func:ident) => {
        impl Write for $ty {
            fn write(&self, buf: &mut [u8], pos: usize) {
                LittleEndian::$func(&mut buf[pos..], *self);
            }
        }
    };
}

impl_write_via_byteorder!(u16, write_u16);
impl_write_via_byteorder!(i16, write_i16);
impl_write_via_byteorder!(u32, write_u32);
impl_write_via_byteorder!(i32, write_i32);
impl_write_via_byteorder!(u64, write_u64);
impl_write_via_byteorder!(i64, write_i64);
impl_write_via_byteorder!(f32, write_f32);
impl_write_via_byteorder!(f64, write_f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read() {
        assert_eq!(4, <u16>::read(&[4u8, 0, 0, 0, 1], 0));
    }

    #[test]
    fn test_write_roundtrip() {
        let mut buf = [0u8; 8];
        42u32.write(&mut buf, 2);
        assert_eq!(42u32, <u32>::read(&buf, 2));

        let mut buf = [0u8; 4];
        true.write(&mut buf, 1);
        assert_eq!(true, <bool>::read(&buf, 1));
    }
}
