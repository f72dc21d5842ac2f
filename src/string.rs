use crate::position::StringPosition;
use std::ops::Deref;

/// String wraps the buffer and the string position.
///
/// # Example
///
/// ```
/// use megrez::{String, position::StringPosition};
///
/// let buf = &[03u8, 0, 0, 0, 'a' as u8, 'b' as u8, 'c' as u8, 0][..];
/// let string = String::new(buf, StringPosition::new(0));
///
/// assert_eq!("abc", string.as_str());
/// ```
#[derive(Copy, Clone, Debug, PartialOrd, PartialEq)]
pub struct String<T> {
    buf: T,
    pos: StringPosition,
}

impl<T> String<T> {
    pub fn new(buf: T, pos: StringPosition) -> String<T> {
        String { buf, pos }
    }

    pub fn buffer(&self) -> &T {
        &self.buf
    }

    pub fn position(&self) -> &StringPosition {
        &self.pos
    }
}

impl<'a, T: Clone> String<&'a T> {
    /// Clones the underlying buffer to create an owned string.
    pub fn into_owned(self) -> String<T> {
        String {
            buf: self.buf.clone(),
            pos: self.pos,
        }
    }
}

impl<T: AsRef<[u8]>> String<T> {
    /// Returns the serialized string in buffer.
    pub fn as_str(&self) -> &str {
        self.pos.as_str(&self.buf)
    }

    /// Returns the length of the string in bytes, not counting the trailing NUL.
    pub fn len(&self) -> usize {
        self.pos.bytes_len(&self.buf)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the string bytes followed by the builder-guaranteed NUL terminator,
    /// for interop with C-string consumers.
    pub fn c_str(&self) -> &[u8] {
        let buf = self.buf.as_ref();
        let start = self.pos.into_inner() + crate::types::SIZE_LEN;
        &buf[start..start + self.len() + 1]
    }
}

impl<T: AsRef<[u8]>> AsRef<str> for String<T> {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl<T: AsRef<[u8]>> Deref for String<T> {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}
