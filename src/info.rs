use crate::io::Read;
use crate::position::{InfoPosition, VTablePosition};
use std::mem::size_of;
use crate::types::VOffset;

/// Info wraps the buffer and the info position, so fields can be fetched without other
/// dependencies.
///
/// See usage in `InfoWithVTable::read_field`.
#[derive(Copy, Clone, Debug, PartialOrd, PartialEq)]
pub struct Info<T> {
    buf: T,
    pos: InfoPosition,
}

/// InfoWithVTable does not only wrap the buffer and the info position, it also caches the
/// vtable position, which can speed up field lookup, since the vtable position does not need to
/// be read from the buffer each time.
#[derive(Copy, Clone, Debug, PartialOrd, PartialEq)]
pub struct InfoWithVTable<T> {
    info: Info<T>,
    vpos: VTablePosition,
}

impl<T> Info<T> {
    pub fn new(buf: T, pos: InfoPosition) -> Info<T> {
        Info { buf, pos }
    }

    pub fn buffer(&self) -> &T {
        &self.buf
    }

    pub fn position(&self) -> &InfoPosition {
        &self.pos
    }
}

impl<'a, T: Clone> Info<&'a T> {
    /// Clones the underlying buffer to create an owned info.
    pub fn into_owned(self) -> Info<T> {
        Info {
            buf: self.buf.clone(),
            pos: self.pos,
        }
    }
}

impl<'a, T: Clone> InfoWithVTable<&'a T> {
    /// Clones the underlying buffer to create an owned info.
    pub fn into_owned(self) -> InfoWithVTable<T> {
        InfoWithVTable {
            info: self.info.into_owned(),
            vpos: self.vpos,
        }
    }
}

impl<T> InfoWithVTable<T> {
    pub fn buffer(&self) -> &T {
        &self.info.buf
    }

    pub fn info(&self) -> &Info<T> {
        &self.info
    }

    pub fn position(&self) -> &VTablePosition {
        &self.vpos
    }
}

impl<T: AsRef<[u8]>> From<Info<T>> for InfoWithVTable<T> {
    fn from(v: Info<T>) -> Self {
        let vpos = v.pos.vtable(&v.buf.as_ref());
        InfoWithVTable { vpos, info: v }
    }
}

impl<T: AsRef<[u8]>> Info<T> {
    /// Reads the vtable position and creates an InfoWithVTable.
    pub fn into_with_vtable(self) -> InfoWithVTable<T> {
        self.into()
    }
}

impl<T: AsRef<[u8]>> InfoWithVTable<T> {
    fn buf_bytes(&self) -> &[u8] {
        self.info.buf.as_ref()
    }

    /// Reads the size of the vtable in bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use megrez::{Info, position::InfoPosition};
    ///
    /// let buf = &[4u8, 0, 6, 0, 4, 0, 0, 0][..];
    /// let info = Info::new(&buf, InfoPosition::new(4)).into_with_vtable();
    ///
    /// assert_eq!(6, info.vtable_bytes_len());
    /// ```
    pub fn vtable_bytes_len(&self) -> usize {
        self.vpos.vtable_bytes_len(&self.buf_bytes())
    }

    /// Reads the field offset.
    ///
    /// Parameter `pos_in_vtable` is the position of the voffset inside vtable bytes. For example
    /// 4 means the offset for the first field in the schema.
    ///
    /// Offset 0 indicates the field is absent in the info bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use megrez::{Info, position::InfoPosition};
    ///
    /// // Field offsets are 20, 0, 4
    /// let buf = &[40u8, 0, 10, 0, 20, 0, 0, 0, 4, 0, 10, 0, 0, 0][..];
    /// let info = Info::new(&buf, InfoPosition::new(10)).into_with_vtable();
    ///
    /// assert_eq!(20, info.field_offset(4));
    /// assert_eq!(0, info.field_offset(6));
    /// assert_eq!(4, info.field_offset(8));
    /// // Returns 0 when pos_in_vtable is out of range.
    /// assert_eq!(0, info.field_offset(10));
    /// ```
    pub fn field_offset(&self, pos_in_vtable: usize) -> VOffset {
        self.vpos.field_offset(&self.buf_bytes(), pos_in_vtable)
    }

    /// Seeks the position for a field.
    ///
    /// The field index is specified using `pos_in_vtable`, which is the offset inside vtable
    /// bytes. For example, 4 means the first field, 6 is the second.
    ///
    /// # Examples
    ///
    /// ```
    /// use megrez::{Info, position::InfoPosition};
    /// //       [vtable 40|    10|    20|    0|    4] [info    10]
    /// let buf = &[40u8, 0, 10, 0, 20, 0, 0, 0, 4, 0, 10, 0, 0, 0][..];
    /// let info = Info::new(&buf, InfoPosition::new(10)).into_with_vtable();
    ///
    /// assert_eq!(Some(20 + 10), info.field_position(4));
    /// assert_eq!(None, info.field_position(6));
    /// assert_eq!(Some(4 + 10), info.field_position(8));
    /// assert_eq!(None, info.field_position(10));
    /// ```
    pub fn field_position(&self, pos_in_vtable: usize) -> Option<usize> {
        let offset = self.field_offset(pos_in_vtable);
        if offset != 0 {
            Some(self.info.pos.position() + offset as usize)
        } else {
            None
        }
    }

    /// Reads a scalar field from the buffer and converts it to native endian.
    ///
    /// Returns `None` (rather than a schema default) when the field is absent — the default
    /// is a codegen-time concern, since it is carried as constant text in the schema, not
    /// something the runtime can know.
    ///
    /// # Examples
    ///
    /// ```
    /// use megrez::{Info, position::InfoPosition};
    /// //       [vtable 6|    6|    4] [info    6|,   1]
    /// let buf = &[6u8, 0, 6, 0, 4, 0, 6, 0, 0, 0, 1, 0][..];
    /// let info = Info::new(&buf, InfoPosition::new(6)).into_with_vtable();
    ///
    /// assert_eq!(Some(1), info.read_field::<u16>(4));
    /// assert_eq!(None, info.read_field::<u16>(6));
    /// ```
    pub fn read_field<F: Read>(&self, pos_in_vtable: usize) -> Option<F> {
        self.field_position(pos_in_vtable)
            .map(|pos| <F>::read(&self.buf_bytes(), pos))
    }

    /// Reads a scalar field, substituting `default` when the field is absent.
    pub fn get_field<F: Read>(&self, pos_in_vtable: usize, default: F) -> F {
        self.read_field(pos_in_vtable).unwrap_or(default)
    }

    /// Follows a field that stores a forward uoffset (string, vector, nested info), returning
    /// the absolute byte position of the referent, or `None` when absent.
    pub fn get_pointer(&self, pos_in_vtable: usize) -> Option<usize> {
        use crate::types::UOffset;
        self.field_position(pos_in_vtable)
            .map(|pos| pos + <UOffset>::read(&self.buf_bytes(), pos) as usize)
    }

    /// Returns the absolute byte position of an inline struct field, or `None` when absent.
    /// Unlike `get_pointer`, no indirection is followed: structs are always stored inline.
    pub fn get_struct(&self, pos_in_vtable: usize) -> Option<usize> {
        self.field_position(pos_in_vtable)
    }

    /// Gets reference to a field by directly casting the pointer into the buffer.
    ///
    /// # Examples
    ///
    /// ```
    /// use megrez::{Info, position::InfoPosition, Scalar};
    /// //       [vtable 6|    6|    4] [info    6|,   1]
    /// let buf = &[6u8, 0, 6, 0, 4, 0, 6, 0, 0, 0, 1, 0][..];
    /// let info = Info::new(&buf, InfoPosition::new(6)).into_with_vtable();
    ///
    /// #[repr(C, align(1))]
    /// #[derive(Debug, PartialOrd, PartialEq)]
    /// struct Wrapper {
    ///     pub inner: Scalar<u16>
    /// }
    ///
    /// assert_eq!(1u16, info.cast_field_ref::<Wrapper>(4).unwrap().inner.into());
    /// assert_eq!(None, info.cast_field_ref::<Wrapper>(6));
    /// ```
    pub fn cast_field_ref<F: Sized>(&self, pos_in_vtable: usize) -> Option<&F> {
        self.field_position(pos_in_vtable).map(|pos| {
            let buf = &self.buf_bytes()[pos..pos + size_of::<F>()];
            let ptr = buf.as_ptr() as *const F;
            unsafe { &*ptr }
        })
    }

    /// Returns the field bytes directly. The bytes are in little endian form.
    pub fn field_slice<F: Sized>(&self, pos_in_vtable: usize) -> Option<&[u8]> {
        self.field_position(pos_in_vtable)
            .map(|pos| &self.buf_bytes()[pos..pos + size_of::<F>()])
    }

    /// Tells whether the field has a value present in the vtable.
    pub fn check_field(&self, pos_in_vtable: usize) -> bool {
        self.field_offset(pos_in_vtable) != 0
    }
}

/// Reads the root uoffset at the start of a finished buffer and returns an `InfoWithVTable`
/// pointing at the referent.
pub fn get_root<T: AsRef<[u8]>>(buf: T) -> InfoWithVTable<T> {
    let pos = <InfoPosition>::read(&buf, 0);
    Info::new(buf, pos).into_with_vtable()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_field_default() {
        let buf = &[6u8, 0, 6, 0, 4, 0, 6, 0, 0, 0, 1, 0][..];
        let info = Info::new(&buf, InfoPosition::new(6)).into_with_vtable();

        assert_eq!(1u16, info.get_field(4, 0u16));
        assert_eq!(99u16, info.get_field(6, 99u16));
    }

    #[test]
    fn test_get_root() {
        // root uoffset of 4 -> info at byte 4; vtable soffset of -4 at byte 4 -> vtable at 0.
        let buf = &[4u8, 0, 0, 0, 252, 255, 255, 255, 4, 0, 4, 0][..];
        let info = get_root(buf);
        assert_eq!(4, info.info().position().position());
    }
}
