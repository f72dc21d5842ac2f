//! Assembles a megrez buffer bottom-up: children are always finished before the
//! objects that refer to them, which is what lets every reference be a plain
//! backwards-pointing offset instead of a pointer fixed up after the fact.

use std::marker::PhantomData;
use std::mem::size_of;

use crate::buffer::VectorDownward;
use crate::error::BuilderError;
use crate::io::Write;
use crate::types::{
    field_index_to_offset, padding_bytes, SIZE_LARGEST_SCALAR, SIZE_UOFFSET, SIZE_VOFFSET, VOffset,
};

/// A not-yet-dereferenced reference to an object written earlier in the buffer.
///
/// `T` only marks what the offset points at; it is never stored in the bytes written
/// to the buffer, which is why it only needs `PhantomData<fn() -> T>`: the marker
/// does not own a `T`, it just remembers which reader type this offset is meant for.
#[derive(Debug)]
pub struct Offset<T> {
    value: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Offset<T> {
    /// Wraps a raw distance-from-end location, such as one returned by
    /// [`Builder::end_info`] or [`Builder::start_struct`]/[`Builder::end_struct`],
    /// as an `Offset<T>` for use with [`Builder::add_offset`]/[`Builder::finish`].
    pub fn new(value: u32) -> Offset<T> {
        Offset {
            value,
            _marker: PhantomData,
        }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    /// Erases the pointee type, for storing a union's value field alongside its
    /// discriminator.
    pub fn as_union_value(&self) -> Offset<UnionMarker> {
        Offset::new(self.value)
    }
}

impl<T> Clone for Offset<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Offset<T> {}

/// Placeholder pointee for [`Offset::as_union_value`].
#[derive(Debug)]
pub struct UnionMarker;

struct FieldLoc {
    /// Distance-from-end of the field's pushed data, as captured right after writing it.
    off: usize,
    /// Byte offset of this field's slot within the vtable, i.e. `field_index_to_offset(id)`.
    id: VOffset,
}

/// Builds a megrez buffer one info/struct/vector/string at a time.
///
/// Objects must be fully built bottom-up: finish every child (string, vector, nested
/// info) before starting the object that refers to it.
pub struct Builder {
    buf: VectorDownward,
    field_locs: Vec<FieldLoc>,
    vtables: Vec<usize>,
    min_align: usize,
    force_defaults: bool,
}

impl Default for Builder {
    fn default() -> Self {
        Builder::new(1024)
    }
}

impl Builder {
    pub fn new(initial_size: usize) -> Builder {
        let rounded = initial_size.max(SIZE_LARGEST_SCALAR) & !(SIZE_LARGEST_SCALAR - 1);
        Builder {
            buf: VectorDownward::new(rounded.max(SIZE_LARGEST_SCALAR)),
            field_locs: Vec::with_capacity(16),
            vtables: Vec::with_capacity(16),
            min_align: 1,
            force_defaults: false,
        }
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.field_locs.clear();
        self.vtables.clear();
        self.min_align = 1;
    }

    pub fn size(&self) -> usize {
        self.buf.size()
    }

    /// When set, scalar fields are written even when they equal the schema default.
    pub fn force_defaults(&mut self, force: bool) {
        self.force_defaults = force;
    }

    fn not_nested(&self) -> Result<(), BuilderError> {
        if self.field_locs.is_empty() {
            Ok(())
        } else {
            Err(BuilderError::UnfinishedNesting)
        }
    }

    fn pad(&mut self, num_bytes: usize) -> Result<(), BuilderError> {
        self.buf.fill(num_bytes)
    }

    fn align(&mut self, elem_size: usize) -> Result<(), BuilderError> {
        if elem_size > self.min_align {
            self.min_align = elem_size;
        }
        let pad = padding_bytes(self.buf.size(), elem_size);
        self.pad(pad)
    }

    fn pre_align(&mut self, len: usize, alignment: usize) -> Result<(), BuilderError> {
        let pad = padding_bytes(self.buf.size() + len, alignment);
        self.pad(pad)
    }

    /// Writes `value` and returns the new distance-from-end of the buffer, i.e. the
    /// logical uoffset of the just-written value, not `VectorDownward::push`'s
    /// physical array index.
    fn push_element<T: Write>(&mut self, value: T) -> Result<usize, BuilderError> {
        self.align(size_of::<T>())?;
        let mut tmp = vec![0u8; size_of::<T>()];
        value.write(&mut tmp, 0);
        self.buf.push(&tmp)?;
        Ok(self.buf.size())
    }

    fn track_field(&mut self, field: VOffset, off: usize) {
        self.field_locs.push(FieldLoc { off, id: field });
    }

    /// Writes `value` and tracks it as `field`, unless it equals `default` and
    /// `force_defaults` is off, in which case the field is simply omitted.
    pub fn add_element<T: Write + PartialEq + Copy>(
        &mut self,
        field: VOffset,
        value: T,
        default: T,
    ) -> Result<(), BuilderError> {
        if value == default && !self.force_defaults {
            return Ok(());
        }
        let off = self.push_element(value)?;
        self.track_field(field, off);
        Ok(())
    }

    /// Converts an absolute "distance from end" location into the forward uoffset a
    /// reader should see once aligned at the current write position.
    fn refer_to(&mut self, off: usize) -> Result<usize, BuilderError> {
        self.align(SIZE_UOFFSET)?;
        debug_assert!(off <= self.buf.size());
        Ok(self.buf.size() - off + SIZE_UOFFSET)
    }

    pub fn add_offset<T>(&mut self, field: VOffset, off: Offset<T>) -> Result<(), BuilderError> {
        if off.value() == 0 {
            return Ok(());
        }
        let referred = self.refer_to(off.value() as usize)?;
        self.add_element(field, referred as u32, 0u32)
    }

    /// Writes a fixed-layout struct inline and tracks its location as `field`.
    pub fn add_struct(
        &mut self,
        field: VOffset,
        bytes: &[u8],
        alignment: usize,
    ) -> Result<(), BuilderError> {
        self.align(alignment)?;
        self.buf.push(bytes)?;
        self.track_field(field, self.buf.size());
        Ok(())
    }

    pub fn start_info(&mut self) -> Result<usize, BuilderError> {
        self.not_nested()?;
        Ok(self.buf.size())
    }

    /// Finishes the info object started at `start`, writes its vtable (deduplicating
    /// against every vtable finished so far in this builder), and returns the info's
    /// distance-from-end location for use with [`Builder::add_offset`] or
    /// [`Builder::finish`].
    pub fn end_info(&mut self, start: usize, numfields: VOffset) -> Result<usize, BuilderError> {
        let vinfo_offset_loc = self.push_element::<u32>(0)?;
        self.pad(numfields as usize * SIZE_VOFFSET)?;
        let info_object_size = (vinfo_offset_loc - start) as VOffset;
        let vtable_total_size = field_index_to_offset(numfields);
        // Vtable's first voffset is the info's byte size, the second is the
        // vtable's own byte size; pushing onto a downward buffer lands the
        // second push at the lower address, so push vtable size first.
        self.push_element::<VOffset>(vtable_total_size)?;
        self.push_element::<VOffset>(info_object_size)?;
        let vtable_start = self.buf.size();

        let field_locs = std::mem::take(&mut self.field_locs);
        for loc in &field_locs {
            let slot = vtable_start - loc.id as usize;
            let pos = (vinfo_offset_loc - loc.off) as VOffset;
            debug_assert_eq!(0u16, self.buf.read_scalar_at::<VOffset>(slot));
            self.buf.write_scalar_at(slot, &pos);
        }

        let vtable_len = vtable_total_size as usize;
        let new_vtable = self.buf.bytes_at(vtable_start, vtable_len).to_vec();
        let mut reused = None;
        for &existing in &self.vtables {
            if self.buf.bytes_at(existing, vtable_len) == new_vtable.as_slice() {
                reused = Some(existing);
                break;
            }
        }

        let vtable_use = if let Some(existing) = reused {
            self.buf.pop(self.buf.size() - vinfo_offset_loc);
            existing
        } else {
            self.vtables.push(vtable_start);
            vtable_start
        };

        let soffset = vtable_use as i64 - vinfo_offset_loc as i64;
        self.buf.write_scalar_at(vinfo_offset_loc, &(soffset as i32));
        Ok(vinfo_offset_loc)
    }

    pub fn start_struct(&mut self, alignment: usize) -> Result<usize, BuilderError> {
        self.align(alignment)?;
        Ok(self.buf.size())
    }

    pub fn end_struct(&self) -> usize {
        self.buf.size()
    }

    pub fn create_string(&mut self, s: &str) -> Result<Offset<crate::String<()>>, BuilderError> {
        self.not_nested()?;
        let bytes = s.as_bytes();
        let len = bytes.len();
        if len > u32::MAX as usize - 1 {
            return Err(BuilderError::LengthOverflow(len));
        }
        self.pre_align(len + 1, SIZE_UOFFSET)?;
        self.pad(1)?;
        self.buf.push(bytes)?;
        self.push_element::<u32>(len as u32)?;
        Ok(Offset::new(self.buf.size() as u32))
    }

    fn start_vector(&mut self, len: usize, elem_size: usize) -> Result<(), BuilderError> {
        self.pre_align(len * elem_size, SIZE_UOFFSET)?;
        self.pre_align(len * elem_size, elem_size)
    }

    fn end_vector(&mut self, len: usize) -> Result<usize, BuilderError> {
        self.push_element::<u32>(len as u32)
    }

    /// Writes a vector of little-endian scalars, in the order given in `items`.
    pub fn create_vector<T: Write + Copy>(
        &mut self,
        items: &[T],
    ) -> Result<Offset<crate::Vector<(), T>>, BuilderError> {
        self.not_nested()?;
        self.start_vector(items.len(), size_of::<T>())?;
        for item in items.iter().rev() {
            self.push_element(*item)?;
        }
        let off = self.end_vector(items.len())?;
        Ok(Offset::new(off as u32))
    }

    /// Writes a vector of already-packed, fixed-size struct elements.
    ///
    /// `bytes` must already hold `count` consecutive structs in their final wire
    /// layout (front to back); unlike scalar vectors, struct elements keep
    /// declaration order since they have no indirection to reverse around.
    pub fn create_vector_of_structs<T>(
        &mut self,
        bytes: &[u8],
        count: usize,
        alignment: usize,
    ) -> Result<Offset<crate::Vector<(), T>>, BuilderError> {
        self.not_nested()?;
        self.start_vector(count, alignment)?;
        self.buf.push(bytes)?;
        let off = self.end_vector(count)?;
        Ok(Offset::new(off as u32))
    }

    /// Finishes the buffer with `root` as its top-level object.
    pub fn finish<T>(&mut self, root: Offset<T>) -> Result<(), BuilderError> {
        self.pre_align(SIZE_UOFFSET, self.min_align)?;
        let referred = self.refer_to(root.value() as usize)?;
        self.push_element::<u32>(referred as u32)?;
        Ok(())
    }

    /// The finished buffer, ready to hand to a reader. Only meaningful after [`Builder::finish`].
    pub fn finished_data(&self) -> &[u8] {
        self.buf.finished_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::get_root;

    #[test]
    fn test_trivial_info_roundtrip() {
        let mut b = Builder::new(64);
        let start = b.start_info().unwrap();
        b.add_element::<u16>(0, 7u16, 0u16).unwrap();
        let info_loc = b.end_info(start, 1).unwrap();
        b.finish(Offset::<()>::new(info_loc as u32)).unwrap();

        let info = get_root(b.finished_data());
        assert_eq!(7u16, info.get_field(field_index_to_offset(0) as usize, 0u16));
    }

    #[test]
    fn test_string_roundtrip() {
        let mut b = Builder::new(64);
        let s = b.create_string("megrez").unwrap();
        let start = b.start_info().unwrap();
        b.add_offset(0, s).unwrap();
        let info_loc = b.end_info(start, 1).unwrap();
        b.finish(Offset::<()>::new(info_loc as u32)).unwrap();

        let info = get_root(b.finished_data());
        let ptr = info
            .get_pointer(field_index_to_offset(0) as usize)
            .unwrap();
        let string = crate::String::new(b.finished_data(), crate::position::StringPosition::new(ptr));
        assert_eq!("megrez", string.as_str());
    }

    #[test]
    fn test_vtable_deduplication() {
        let mut b = Builder::new(64);

        let start1 = b.start_info().unwrap();
        b.add_element::<u16>(0, 1u16, 0u16).unwrap();
        let info1 = b.end_info(start1, 1).unwrap();

        let start2 = b.start_info().unwrap();
        b.add_element::<u16>(0, 2u16, 0u16).unwrap();
        let info2 = b.end_info(start2, 1).unwrap();

        let cur = b.size();
        let data = b.finished_data();
        let r1 = crate::Info::new(data, crate::position::InfoPosition::new(cur - info1))
            .into_with_vtable();
        let r2 = crate::Info::new(data, crate::position::InfoPosition::new(cur - info2))
            .into_with_vtable();

        assert_eq!(1u16, r1.get_field(field_index_to_offset(0) as usize, 0u16));
        assert_eq!(2u16, r2.get_field(field_index_to_offset(0) as usize, 0u16));
        assert_eq!(
            r1.position().position(),
            r2.position().position(),
            "identical vtables should be shared"
        );
    }

    #[test]
    fn test_vector_of_scalars_roundtrip() {
        let mut b = Builder::new(64);
        let vec_off = b.create_vector(&[1u16, 2, 3]).unwrap();
        let start = b.start_info().unwrap();
        b.add_offset(0, vec_off).unwrap();
        let info_loc = b.end_info(start, 1).unwrap();
        b.finish(Offset::<()>::new(info_loc as u32)).unwrap();

        let info = get_root(b.finished_data());
        let ptr = info
            .get_pointer(field_index_to_offset(0) as usize)
            .unwrap();
        let vector = crate::Vector::<_, u16>::new(
            b.finished_data(),
            crate::position::VectorPosition::<u16>::new(ptr),
        );
        assert_eq!(&[1u16, 2, 3], vector.as_slice());
    }
}
