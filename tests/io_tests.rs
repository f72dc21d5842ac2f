//! End-to-end coverage of the builder/reader pair against the wire format
//! directly, without going through generated code.

use megrez::position::{InfoPosition, StringPosition, VectorPosition};
use megrez::types::field_index_to_offset;
use megrez::{get_root, Builder, Info, Offset, Scalar};

#[test]
fn trivial_info_roundtrip() {
    let mut b = Builder::new(64);
    let start = b.start_info().unwrap();
    b.add_element::<i32>(0, 100, 0).unwrap();
    let loc = b.end_info(start, 1).unwrap();
    b.finish(Offset::<()>::new(loc as u32)).unwrap();

    let info = get_root(b.finished_data());
    assert_eq!(100, info.get_field(field_index_to_offset(0) as usize, 0i32));
    assert_eq!(0i32, info.get_field(field_index_to_offset(1) as usize, 0i32));
}

#[test]
fn string_field_roundtrip() {
    let mut b = Builder::new(64);
    let name = b.create_string("Megrez Bearing").unwrap();
    let start = b.start_info().unwrap();
    b.add_offset(0, name).unwrap();
    let loc = b.end_info(start, 1).unwrap();
    b.finish(Offset::<()>::new(loc as u32)).unwrap();

    let data = b.finished_data();
    let info = get_root(data);
    let ptr = info.get_pointer(field_index_to_offset(0) as usize).unwrap();
    let s = megrez::String::new(data, StringPosition::new(ptr));
    assert_eq!("Megrez Bearing", s.as_str());
}

#[test]
fn nested_fixed_struct_field_roundtrip() {
    #[repr(C, align(2))]
    #[derive(Debug, PartialEq)]
    struct Point {
        x: Scalar<i16>,
        y: Scalar<i16>,
    }

    let mut bytes = [0u8; 4];
    megrez::io::Write::write(&3i16, &mut bytes, 0);
    megrez::io::Write::write(&4i16, &mut bytes, 2);

    let mut b = Builder::new(64);
    let start = b.start_info().unwrap();
    b.add_struct(0, &bytes, 2).unwrap();
    let loc = b.end_info(start, 1).unwrap();
    b.finish(Offset::<()>::new(loc as u32)).unwrap();

    let info = get_root(b.finished_data());
    let point = info.cast_field_ref::<Point>(field_index_to_offset(0) as usize).unwrap();
    assert_eq!(3i16, point.x.into());
    assert_eq!(4i16, point.y.into());
}

#[test]
fn vector_of_scalars_roundtrip() {
    let mut b = Builder::new(64);
    let items = b.create_vector(&[10u32, 20, 30, 40]).unwrap();
    let start = b.start_info().unwrap();
    b.add_offset(0, items).unwrap();
    let loc = b.end_info(start, 1).unwrap();
    b.finish(Offset::<()>::new(loc as u32)).unwrap();

    let data = b.finished_data();
    let info = get_root(data);
    let ptr = info.get_pointer(field_index_to_offset(0) as usize).unwrap();
    let vector = megrez::Vector::<_, u32>::new(data, VectorPosition::<u32>::new(ptr));
    assert_eq!(&[10u32, 20, 30, 40], vector.as_slice());
}

#[test]
fn union_field_roundtrip_via_discriminator_and_offset() {
    const WEAPON: u8 = 1;

    let mut b = Builder::new(64);

    let weapon_start = b.start_info().unwrap();
    b.add_element::<i16>(0, 25, 0).unwrap();
    let weapon_loc = b.end_info(weapon_start, 1).unwrap();
    let weapon_offset = Offset::<()>::new(weapon_loc as u32);

    let start = b.start_info().unwrap();
    b.add_element::<u8>(0, WEAPON, 0).unwrap();
    b.add_offset(1, weapon_offset.as_union_value()).unwrap();
    let loc = b.end_info(start, 2).unwrap();
    b.finish(Offset::<()>::new(loc as u32)).unwrap();

    let data = b.finished_data();
    let info = get_root(data);
    assert_eq!(WEAPON, info.get_field(field_index_to_offset(0) as usize, 0u8));

    let value_ptr = info.get_pointer(field_index_to_offset(1) as usize).unwrap();
    let weapon = Info::new(data, InfoPosition::new(value_ptr)).into_with_vtable();
    assert_eq!(25i16, weapon.get_field(field_index_to_offset(0) as usize, 0i16));
}

#[test]
fn identical_vtables_are_shared_distinct_layouts_are_not() {
    let mut b = Builder::new(128);

    let start_a1 = b.start_info().unwrap();
    b.add_element::<u16>(0, 1u16, 0).unwrap();
    let a1 = b.end_info(start_a1, 1).unwrap();

    let start_a2 = b.start_info().unwrap();
    b.add_element::<u16>(0, 2u16, 0).unwrap();
    let a2 = b.end_info(start_a2, 1).unwrap();

    let start_b = b.start_info().unwrap();
    b.add_element::<u16>(0, 1u16, 0).unwrap();
    b.add_element::<u16>(1, 2u16, 0).unwrap();
    let b_loc = b.end_info(start_b, 2).unwrap();

    let end = b.size();
    let data = b.finished_data();
    let ra1 = Info::new(data, InfoPosition::new(end - a1)).into_with_vtable();
    let ra2 = Info::new(data, InfoPosition::new(end - a2)).into_with_vtable();
    let rb = Info::new(data, InfoPosition::new(end - b_loc)).into_with_vtable();

    assert_eq!(
        ra1.position().position(),
        ra2.position().position(),
        "same field layout should reuse one vtable"
    );
    assert_ne!(
        ra1.position().position(),
        rb.position().position(),
        "different field counts must not share a vtable"
    );
}
