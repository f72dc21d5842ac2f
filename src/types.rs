use std::mem::size_of;

/// Unsigned forward byte distance from the location holding it to the referent.
pub type UOffset = u32;
/// Signed byte distance from an info's data pointer to its vtable.
pub type SOffset = i32;
/// Unsigned offset used for field offset stored in vtable.
pub type VOffset = u16;
/// Length of vector and string.
pub type Len = u32;

pub const SIZE_UOFFSET: usize = size_of::<UOffset>();
pub const SIZE_SOFFSET: usize = size_of::<SOffset>();
pub const SIZE_VOFFSET: usize = size_of::<VOffset>();
pub const SIZE_LEN: usize = size_of::<Len>();

/// Largest scalar size the format ever aligns to (an `u64`/`f64`).
pub const SIZE_LARGEST_SCALAR: usize = 8;

/// Buffers must stay strictly below this so `SOffset` differences between
/// any two positions remain representable.
pub const MAX_BUFFER_SIZE: usize = (1usize << (size_of::<SOffset>() * 8 - 1)) - 1;

/// The two fixed header fields every vtable carries ahead of its field slots.
pub const VTABLE_FIXED_FIELDS: VOffset = 2;

/// Maps a declaration-order field id to its byte offset inside a vtable.
pub fn field_index_to_offset(field_id: VOffset) -> VOffset {
    (field_id + VTABLE_FIXED_FIELDS) * (SIZE_VOFFSET as VOffset)
}

/// Number of padding bytes needed so that `size` becomes a multiple of `alignment`.
///
/// `alignment` must be a power of two.
pub fn padding_bytes(size: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two(), "alignment must be a power of two");
    (!size).wrapping_add(1) & (alignment - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_index_to_offset() {
        assert_eq!(4, field_index_to_offset(0));
        assert_eq!(6, field_index_to_offset(1));
        assert_eq!(8, field_index_to_offset(2));
    }

    #[test]
    fn test_padding_bytes() {
        assert_eq!(0, padding_bytes(8, 8));
        assert_eq!(4, padding_bytes(4, 8));
        assert_eq!(7, padding_bytes(1, 8));
        assert_eq!(1, padding_bytes(7, 4));
    }
}
