use crate::idl::{BaseType, EnumDef, FieldDef, SchemaDef, StructDef, Type};

pub fn emit(schema: &SchemaDef) -> String {
    let mut out = String::new();
    out.push_str("// Generated by megrezc. Do not edit by hand.\n\n");
    out.push_str("#![allow(dead_code, clippy::all)]\n\n");

    let depth = schema.namespace.len();
    for part in &schema.namespace {
        out.push_str(&format!("pub mod {} {{\n", part));
    }

    for enum_def in schema.enums.iter() {
        emit_enum(&mut out, enum_def);
    }
    for struct_def in schema.structs.iter() {
        if struct_def.fixed {
            emit_fixed_struct(&mut out, struct_def, schema);
        } else {
            emit_info(&mut out, struct_def, schema);
        }
    }

    if let Some(root) = &schema.root_type {
        let lower = to_snake_case(root);
        out.push_str(&format!(
            "pub fn get_root_as_{lower}<'a>(buf: &'a [u8]) -> {root}<'a> {{\n    {root}::init(megrez::get_root(buf))\n}}\n\n",
            lower = lower,
            root = root,
        ));
    }

    for _ in 0..depth {
        out.push_str("}\n");
    }
    out
}

fn emit_doc(out: &mut String, doc_comment: &[String], indent: &str) {
    for line in doc_comment {
        out.push_str(&format!("{}/// {}\n", indent, line));
    }
}

fn emit_enum(out: &mut String, e: &EnumDef) {
    let repr = rust_scalar_type(e.underlying_type);
    emit_doc(out, &e.doc_comment, "");
    if e.is_union {
        out.push_str(&format!("/// Discriminator values for the `{}` union.\n", e.name));
    }
    out.push_str(&format!("pub type {} = {};\n", e.name, repr));
    out.push_str(&format!("pub const {}_NONE: {} = 0;\n", to_upper_snake(&e.name), repr));
    for val in &e.vals {
        emit_doc(out, &val.doc_comment, "");
        out.push_str(&format!(
            "pub const {}_{}: {} = {};\n",
            to_upper_snake(&e.name),
            to_upper_snake(&val.name),
            repr,
            val.value
        ));
    }

    if e.is_sparse() {
        out.push_str(&format!("pub fn {}_name(v: {}) -> Option<&'static str> {{\n", to_snake_case(&e.name), repr));
        out.push_str("    match v {\n");
        for val in &e.vals {
            out.push_str(&format!(
                "        {} => Some(\"{}\"),\n",
                to_upper_snake_const(&e.name, &val.name),
                val.name
            ));
        }
        out.push_str("        _ => None,\n    }\n}\n\n");
    } else {
        out.push_str(&format!(
            "pub const {}_NAMES: &[&str] = &[{}];\n",
            to_upper_snake(&e.name),
            e.vals.iter().map(|v| format!("\"{}\"", v.name)).collect::<Vec<_>>().join(", ")
        ));
        out.push_str(&format!(
            "pub fn {}_name(v: {}) -> Option<&'static str> {{\n    let min = {};\n    let idx = (v as i64) - min;\n    if idx < 0 || idx as usize >= {}_NAMES.len() {{\n        None\n    }} else {{\n        Some({}_NAMES[idx as usize])\n    }}\n}}\n\n",
            to_snake_case(&e.name),
            repr,
            e.vals.iter().map(|v| v.value).min().unwrap(),
            to_upper_snake(&e.name),
            to_upper_snake(&e.name),
        ));
    }
}

fn to_upper_snake_const(enum_name: &str, val_name: &str) -> String {
    format!("{}_{}", to_upper_snake(enum_name), to_upper_snake(val_name))
}

fn emit_fixed_struct(out: &mut String, s: &StructDef, schema: &SchemaDef) {
    emit_doc(out, &s.doc_comment, "");
    out.push_str(&format!(
        "#[repr(transparent)]\n#[derive(Copy, Clone, Debug, PartialEq)]\npub struct {}(pub [u8; {}]);\n\n",
        s.name, s.bytesize
    ));
    out.push_str(&format!("impl {} {{\n", s.name));

    let args: Vec<String> = s
        .fields
        .iter()
        .map(|f| format!("{}: {}", f.name, rust_field_type(&f.value.the_type, None)))
        .collect();
    out.push_str(&format!("    pub fn new({}) -> {} {{\n", args.join(", "), s.name));
    out.push_str(&format!("        let mut s = {}([0; {}]);\n", s.name, s.bytesize));
    for f in &s.fields {
        out.push_str(&format!("        s.set_{}({});\n", f.name, f.name));
    }
    out.push_str("        s\n    }\n\n");

    let mut offset = 0usize;
    for f in &s.fields {
        offset += f.padding;
        let ty = rust_field_type(&f.value.the_type, None);
        emit_doc(out, &f.doc_comment, "    ");
        out.push_str(&format!(
            "    pub fn {field}(&self) -> {ty} {{\n        <{ty} as megrez::io::Read>::read(&self.0, {off})\n    }}\n\n",
            field = f.name,
            ty = ty,
            off = offset,
        ));
        out.push_str(&format!(
            "    pub fn set_{field}(&mut self, value: {ty}) {{\n        megrez::io::Write::write(&value, &mut self.0, {off});\n    }}\n\n",
            field = f.name,
            ty = ty,
            off = offset,
        ));
        offset += field_inline_size(&f.value.the_type, schema);
    }
    out.push_str("}\n\n");
    out.push_str(&format!(
        "const _: () = assert!(core::mem::size_of::<{}>() == {});\n\n",
        s.name, s.bytesize
    ));

    out.push_str(&format!(
        "impl megrez::io::Read for {name} {{\n    fn read<T: AsRef<[u8]>>(buf: &T, pos: usize) -> Self {{\n        let mut out = [0u8; {size}];\n        out.copy_from_slice(&buf.as_ref()[pos..pos + {size}]);\n        {name}(out)\n    }}\n}}\n\n",
        name = s.name,
        size = s.bytesize,
    ));
    out.push_str(&format!(
        "impl megrez::io::Write for {name} {{\n    fn write(&self, buf: &mut [u8], pos: usize) {{\n        buf[pos..pos + {size}].copy_from_slice(&self.0);\n    }}\n}}\n\n",
        name = s.name,
        size = s.bytesize,
    ));
}

fn emit_info(out: &mut String, s: &StructDef, schema: &SchemaDef) {
    let indexed: Vec<(u16, &FieldDef)> =
        s.fields.iter().enumerate().map(|(i, f)| (i as u16, f)).collect();

    out.push_str(&format!("pub enum {}Offset {{}}\n\n", s.name));
    let mut doc_buf = String::new();
    emit_doc(&mut doc_buf, &s.doc_comment, "");

    for (id, f) in &indexed {
        out.push_str(&format!(
            "const VT_{}: u16 = megrez::types::field_index_to_offset({});\n",
            to_upper_snake(&f.name),
            id
        ));
    }
    out.push('\n');

    out.push_str(&doc_buf);
    out.push_str(&format!(
        "#[derive(Copy, Clone, Debug)]\npub struct {}<'a> {{\n    pub info: megrez::InfoWithVTable<&'a [u8]>,\n}}\n\n",
        s.name
    ));
    out.push_str(&format!("impl<'a> {}<'a> {{\n", s.name));
    out.push_str(&format!(
        "    pub fn init(info: megrez::InfoWithVTable<&'a [u8]>) -> {}<'a> {{\n        {} {{ info }}\n    }}\n\n",
        s.name, s.name
    ));

    for (id, f) in &indexed {
        emit_info_accessor(out, *id, f, schema);
    }
    out.push_str("}\n\n");

    emit_union_variant_accessors(out, s, schema, &indexed);

    out.push_str(&format!("pub struct {name}Builder<'b> {{\n    builder: &'b mut megrez::Builder,\n    start: usize,\n}}\n\n", name = s.name));
    out.push_str(&format!("impl<'b> {name}Builder<'b> {{\n", name = s.name));
    out.push_str(&format!(
        "    pub fn new(builder: &'b mut megrez::Builder) -> {name}Builder<'b> {{\n        let start = builder.start_info().unwrap();\n        {name}Builder {{ builder, start }}\n    }}\n\n",
        name = s.name
    ));

    for (id, f) in &indexed {
        emit_builder_setter(out, *id, f, schema);
    }

    out.push_str(&format!(
        "    pub fn finish(self) -> megrez::Offset<{name}Offset> {{\n        let loc = self.builder.end_info(self.start, {n}).unwrap();\n        megrez::Offset::new(loc as u32)\n    }}\n}}\n\n",
        name = s.name,
        n = indexed.len(),
    ));

    emit_args_struct_and_create_fn(out, s, schema, &indexed);
}

fn emit_info_accessor(out: &mut String, id: u16, f: &FieldDef, schema: &SchemaDef) {
    let vt = format!("VT_{}", to_upper_snake(&f.name));
    emit_doc(out, &f.doc_comment, "    ");
    if f.deprecated {
        out.push_str("    #[deprecated]\n");
    }
    let _ = id;
    match &f.value.the_type {
        t if t.base_type.is_scalar() => {
            let ty = rust_field_type(t, None);
            let default = default_literal(t, &f.value.constant);
            out.push_str(&format!(
                "    pub fn {field}(&self) -> {ty} {{\n        self.info.get_field({vt} as usize, {default})\n    }}\n\n",
                field = f.name,
                ty = ty,
                vt = vt,
                default = default,
            ));
        }
        t if t.base_type == BaseType::String => {
            out.push_str(&format!(
                "    pub fn {field}(&self) -> Option<megrez::String<&'a [u8]>> {{\n        self.info.get_pointer({vt} as usize).map(|p| megrez::String::new(*self.info.buffer(), megrez::position::StringPosition::new(p)))\n    }}\n\n",
                field = f.name,
                vt = vt,
            ));
        }
        t if t.base_type == BaseType::Struct => {
            let name = t.struct_name.as_ref().unwrap();
            let referent = schema.structs.lookup(name);
            if referent.map(|r| r.fixed).unwrap_or(true) {
                out.push_str(&format!(
                    "    pub fn {field}(&self) -> Option<&'a {ty}> {{\n        self.info.cast_field_ref::<{ty}>({vt} as usize)\n    }}\n\n",
                    field = f.name,
                    ty = name,
                    vt = vt,
                ));
            } else {
                out.push_str(&format!(
                    "    pub fn {field}(&self) -> Option<{ty}<'a>> {{\n        self.info.get_pointer({vt} as usize).map(|p| {ty}::init(megrez::Info::new(*self.info.buffer(), megrez::position::InfoPosition::new(p)).into_with_vtable()))\n    }}\n\n",
                    field = f.name,
                    ty = name,
                    vt = vt,
                ));
            }
        }
        t if t.base_type == BaseType::Vector => {
            let elem = t.element.as_ref().unwrap();
            let elem_ty = rust_field_type(elem, Some(schema));
            out.push_str(&format!(
                "    pub fn {field}(&self) -> Option<megrez::Vector<&'a [u8], {ety}>> {{\n        self.info.get_pointer({vt} as usize).map(|p| megrez::Vector::new(*self.info.buffer(), megrez::position::VectorPosition::new(p)))\n    }}\n\n",
                field = f.name,
                ety = elem_ty,
                vt = vt,
            ));
        }
        t if t.base_type == BaseType::Union => {
            out.push_str(&format!(
                "    /// Absolute byte position of this union's active value; interpret using\n    /// the preceding `_type` discriminator and the matching `{field}_as_*` accessor.\n    pub fn {field}(&self) -> Option<usize> {{\n        self.info.get_pointer({vt} as usize)\n    }}\n\n",
                field = f.name,
                vt = vt,
            ));
        }
        _ => {}
    }
}

fn emit_union_variant_accessors(
    out: &mut String,
    s: &StructDef,
    schema: &SchemaDef,
    indexed: &[(u16, &FieldDef)],
) {
    for (_, f) in indexed {
        if f.value.the_type.base_type != BaseType::Union {
            continue;
        }
        let enum_name = f.value.the_type.enum_name.as_ref().unwrap();
        let Some(enum_def) = schema.enums.lookup(enum_name) else {
            continue;
        };
        let type_field = format!("{}_type", f.name);
        out.push_str(&format!("impl<'a> {}<'a> {{\n", s.name));
        for val in &enum_def.vals {
            let Some(variant) = &val.struct_name else { continue };
            let Some(referent) = schema.structs.lookup(variant) else { continue };
            if referent.fixed {
                continue;
            }
            out.push_str(&format!(
                "    pub fn {field}_as_{variant_lower}(&self) -> Option<{variant}<'a>> {{\n        if self.{type_field}() == {const_name} {{\n            self.{field}().map(|p| {variant}::init(megrez::Info::new(*self.info.buffer(), megrez::position::InfoPosition::new(p)).into_with_vtable()))\n        }} else {{\n            None\n        }}\n    }}\n\n",
                field = f.name,
                variant_lower = to_snake_case(variant),
                variant = variant,
                type_field = type_field,
                const_name = to_upper_snake_const(enum_name, &val.name),
            ));
        }
        out.push_str("}\n\n");
    }
}

fn emit_builder_setter(out: &mut String, id: u16, f: &FieldDef, schema: &SchemaDef) {
    let vt = format!("VT_{}", to_upper_snake(&f.name));
    let _ = id;
    match &f.value.the_type {
        t if t.base_type.is_scalar() => {
            let ty = rust_field_type(t, None);
            let default = default_literal(t, &f.value.constant);
            out.push_str(&format!(
                "    pub fn add_{field}(&mut self, value: {ty}) {{\n        self.builder.add_element({vt}, value, {default}).unwrap();\n    }}\n\n",
                field = f.name,
                ty = ty,
                vt = vt,
                default = default,
            ));
        }
        t if t.base_type == BaseType::String => {
            out.push_str(&format!(
                "    pub fn add_{field}(&mut self, value: megrez::Offset<megrez::String<()>>) {{\n        self.builder.add_offset({vt}, value).unwrap();\n    }}\n\n",
                field = f.name,
                vt = vt,
            ));
        }
        t if t.base_type == BaseType::Struct => {
            let name = t.struct_name.as_ref().unwrap();
            let referent = schema.structs.lookup(name);
            if referent.map(|r| r.fixed).unwrap_or(true) {
                out.push_str(&format!(
                    "    pub fn add_{field}(&mut self, value: &{ty}) {{\n        self.builder.add_struct({vt}, &value.0, core::mem::size_of::<{ty}>()).unwrap();\n    }}\n\n",
                    field = f.name,
                    ty = name,
                    vt = vt,
                ));
            } else {
                out.push_str(&format!(
                    "    pub fn add_{field}(&mut self, value: megrez::Offset<{ty}Offset>) {{\n        self.builder.add_offset({vt}, value).unwrap();\n    }}\n\n",
                    field = f.name,
                    ty = name,
                    vt = vt,
                ));
            }
        }
        t if t.base_type == BaseType::Vector => {
            let elem = t.element.as_ref().unwrap();
            let elem_ty = rust_field_type(elem, Some(schema));
            out.push_str(&format!(
                "    pub fn add_{field}(&mut self, value: megrez::Offset<megrez::Vector<(), {ety}>>) {{\n        self.builder.add_offset({vt}, value).unwrap();\n    }}\n\n",
                field = f.name,
                ety = elem_ty,
                vt = vt,
            ));
        }
        t if t.base_type == BaseType::Union => {
            out.push_str(&format!(
                "    pub fn add_{field}(&mut self, value: megrez::Offset<megrez::UnionMarker>) {{\n        self.builder.add_offset({vt}, value).unwrap();\n    }}\n\n",
                field = f.name,
                vt = vt,
            ));
        }
        _ => {}
    }
}

/// `FooArgs` plus `create_foo`, mirroring the original compiler's convention of
/// taking already-built child offsets since children must be finished before
/// the info that refers to them starts.
fn emit_args_struct_and_create_fn(
    out: &mut String,
    s: &StructDef,
    schema: &SchemaDef,
    indexed: &[(u16, &FieldDef)],
) {
    out.push_str(&format!("pub struct {}Args {{\n", s.name));
    for (_, f) in indexed {
        out.push_str(&format!("    pub {}: {},\n", f.name, arg_field_type(&f.value.the_type, schema)));
    }
    out.push_str("}\n\n");

    out.push_str(&format!(
        "pub fn create_{fname}(builder: &mut megrez::Builder, args: &{sname}Args) -> megrez::Offset<{sname}Offset> {{\n",
        fname = to_snake_case(&s.name),
        sname = s.name,
    ));
    out.push_str(&format!("    let mut b = {}Builder::new(builder);\n", s.name));

    let mut write_order: Vec<&(u16, &FieldDef)> = indexed.iter().rev().collect();
    if s.sortbysize {
        write_order.sort_by(|a, b| {
            let sa = field_inline_size(&a.1.value.the_type, schema);
            let sb = field_inline_size(&b.1.value.the_type, schema);
            sb.cmp(&sa)
        });
    }
    for (_, f) in write_order {
        if f.value.the_type.base_type == BaseType::Struct
            && schema
                .structs
                .lookup(f.value.the_type.struct_name.as_ref().unwrap())
                .map(|r| r.fixed)
                .unwrap_or(true)
        {
            out.push_str(&format!("    b.add_{field}(&args.{field});\n", field = f.name));
        } else {
            out.push_str(&format!("    b.add_{field}(args.{field});\n", field = f.name));
        }
    }
    out.push_str("    b.finish()\n}\n\n");
}

fn arg_field_type(t: &Type, schema: &SchemaDef) -> String {
    match t.base_type {
        BaseType::String => "megrez::Offset<megrez::String<()>>".to_string(),
        BaseType::Vector => {
            let elem_ty = rust_field_type(t.element.as_ref().unwrap(), Some(schema));
            format!("megrez::Offset<megrez::Vector<(), {}>>", elem_ty)
        }
        BaseType::Struct => {
            let name = t.struct_name.as_ref().unwrap();
            if schema.structs.lookup(name).map(|r| r.fixed).unwrap_or(true) {
                name.clone()
            } else {
                format!("megrez::Offset<{}Offset>", name)
            }
        }
        BaseType::Union => "megrez::Offset<megrez::UnionMarker>".to_string(),
        _ => rust_field_type(t, None),
    }
}

fn field_inline_size(t: &Type, schema: &SchemaDef) -> usize {
    match t.base_type {
        BaseType::Struct => t
            .struct_name
            .as_ref()
            .and_then(|n| schema.structs.lookup(n))
            .map(|r| if r.fixed { r.bytesize } else { 4 })
            .unwrap_or(4),
        _ => t.base_type.size_of(),
    }
}

fn rust_field_type(t: &Type, schema: Option<&SchemaDef>) -> String {
    if t.base_type != BaseType::Vector {
        if let Some(name) = &t.enum_name {
            return name.clone();
        }
    }
    match t.base_type {
        BaseType::Struct => t.struct_name.clone().unwrap_or_default(),
        BaseType::Vector => {
            let elem_ty = rust_field_type(t.element.as_ref().unwrap(), schema);
            format!("Vec<{}>", elem_ty)
        }
        BaseType::String => "String".to_string(),
        _ => rust_scalar_type(t.base_type).to_string(),
    }
}

fn rust_scalar_type(b: BaseType) -> &'static str {
    match b {
        BaseType::Bool => "bool",
        BaseType::Char => "i8",
        BaseType::UChar => "u8",
        BaseType::Short => "i16",
        BaseType::UShort => "u16",
        BaseType::Int => "i32",
        BaseType::UInt => "u32",
        BaseType::Long => "i64",
        BaseType::ULong => "u64",
        BaseType::Float => "f32",
        BaseType::Double => "f64",
        BaseType::UType => "u8",
        BaseType::String | BaseType::Vector | BaseType::Struct | BaseType::Union => "u32",
    }
}

fn default_literal(t: &Type, constant: &str) -> String {
    if t.base_type == BaseType::Bool {
        return if constant == "0" { "false".to_string() } else { "true".to_string() };
    }
    let ty = rust_scalar_type(t.base_type);
    if t.base_type.is_float() {
        if constant.contains('.') {
            format!("{}{}", constant, ty)
        } else {
            format!("{}.0{}", constant, ty)
        }
    } else {
        format!("{}{}", constant, ty)
    }
}

fn to_snake_case(name: &str) -> String {
    let mut out = String::new();
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i != 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn to_upper_snake(name: &str) -> String {
    to_snake_case(name).to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idl::Parser;

    #[test]
    fn test_snake_case() {
        assert_eq!("monster_hp", to_snake_case("MonsterHp"));
        assert_eq!("hp", to_snake_case("hp"));
    }

    #[test]
    fn test_emit_fixed_struct_has_size_assert() {
        let schema = Parser::parse("struct Vec3 {\n x:float;\n y:float;\n z:float;\n}").unwrap();
        let source = emit(&schema);
        assert!(source.contains("pub struct Vec3(pub [u8; 12]);"));
        assert!(source.contains("core::mem::size_of::<Vec3>() == 12"));
    }

    #[test]
    fn test_emit_fixed_struct_respects_alignment_padding() {
        let schema = Parser::parse("struct Padded {\n a:byte;\n b:long;\n}").unwrap();
        let source = emit(&schema);
        assert!(source.contains("pub struct Padded(pub [u8; 16]);"));
        assert!(source.contains("<i8 as megrez::io::Read>::read(&self.0, 0)"));
        assert!(source.contains("<i64 as megrez::io::Read>::read(&self.0, 8)"));
    }

    #[test]
    fn test_emit_fixed_struct_nested_struct_field_uses_real_size() {
        let schema = Parser::parse(
            "struct Vec3 {\n x:float;\n y:float;\n z:float;\n}\nstruct Wrapper {\n v:Vec3;\n tag:byte;\n}",
        )
        .unwrap();
        let source = emit(&schema);
        assert!(source.contains("<Vec3 as megrez::io::Read>::read(&self.0, 0)"));
        assert!(source.contains("<i8 as megrez::io::Read>::read(&self.0, 12)"));
    }

    #[test]
    fn test_emit_create_fn_uses_declaration_reverse_order_when_unsorted() {
        let schema = Parser::parse(
            "info M (original_order) {\n a:byte;\n b:byte;\n c:byte;\n}",
        )
        .unwrap();
        let source = emit(&schema);
        let pos_a = source.find("b.add_a(args.a);").unwrap();
        let pos_b = source.find("b.add_b(args.b);").unwrap();
        let pos_c = source.find("b.add_c(args.c);").unwrap();
        assert!(pos_c < pos_b && pos_b < pos_a);
    }

    #[test]
    fn test_emit_info_with_vector_and_string() {
        let schema = Parser::parse(
            "info Bag {\n items:[int];\n label:string;\n}",
        )
        .unwrap();
        let source = emit(&schema);
        assert!(source.contains("pub struct BagBuilder"));
        assert!(source.contains("pub struct BagArgs"));
        assert!(source.contains("megrez::Vector<&'a [u8], i32>"));
    }

    #[test]
    fn test_emit_sparse_enum_uses_match() {
        let schema = Parser::parse("enum Flags:int { A = 0, B = 100 }").unwrap();
        let source = emit(&schema);
        assert!(source.contains("pub fn flags_name"));
        assert!(source.contains("match v {"));
    }

    #[test]
    fn test_emit_dense_enum_uses_table() {
        let schema = Parser::parse("enum Side:byte { Left, Right }").unwrap();
        let source = emit(&schema);
        assert!(source.contains("SIDE_NAMES"));
    }

    #[test]
    fn test_emit_carries_doc_comments() {
        let schema = Parser::parse(
            "/// A friendly monster.\ninfo Monster {\n  /// Hit points.\n  hp:short;\n}",
        )
        .unwrap();
        let source = emit(&schema);
        assert!(source.contains("/// A friendly monster."));
        assert!(source.contains("/// Hit points."));
    }

    #[test]
    fn test_emit_carries_enum_value_doc_comments() {
        let schema = Parser::parse("enum Color:byte {\n  /// The default.\n  Red,\n}").unwrap();
        let source = emit(&schema);
        assert!(source.contains("/// The default.\npub const COLOR_RED"));
    }

    #[test]
    fn test_emit_root_helper() {
        let schema =
            Parser::parse("info Monster {\n hp:short;\n}\nroot_type Monster;").unwrap();
        let source = emit(&schema);
        assert!(source.contains("pub fn get_root_as_monster"));
    }
}
