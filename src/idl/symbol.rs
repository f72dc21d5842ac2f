use std::collections::HashMap;

/// The primitive and pointer kinds a schema field can hold.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BaseType {
    Bool,
    Char,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Float,
    Double,
    String,
    Vector,
    Struct,
    Union,
    UType,
}

impl BaseType {
    pub fn is_scalar(self) -> bool {
        !matches!(
            self,
            BaseType::String | BaseType::Vector | BaseType::Struct | BaseType::Union
        )
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            BaseType::UType
                | BaseType::Bool
                | BaseType::Char
                | BaseType::UChar
                | BaseType::Short
                | BaseType::UShort
                | BaseType::Int
                | BaseType::UInt
                | BaseType::Long
                | BaseType::ULong
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, BaseType::Float | BaseType::Double)
    }

    /// Size in bytes when stored inline (scalars, or a fixed struct's own size is
    /// looked up separately since it depends on the struct's fields).
    pub fn size_of(self) -> usize {
        match self {
            BaseType::Bool | BaseType::Char | BaseType::UChar | BaseType::UType => 1,
            BaseType::Short | BaseType::UShort => 2,
            BaseType::Int | BaseType::UInt | BaseType::Float => 4,
            BaseType::Long | BaseType::ULong | BaseType::Double => 8,
            BaseType::String | BaseType::Vector | BaseType::Struct | BaseType::Union => 4,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            BaseType::Bool => "bool",
            BaseType::Char => "byte",
            BaseType::UChar => "ubyte",
            BaseType::Short => "short",
            BaseType::UShort => "ushort",
            BaseType::Int => "int",
            BaseType::UInt => "uint",
            BaseType::Long => "long",
            BaseType::ULong => "ulong",
            BaseType::Float => "float",
            BaseType::Double => "double",
            BaseType::String => "string",
            BaseType::Vector | BaseType::Struct | BaseType::Union | BaseType::UType => "",
        }
    }

    pub fn from_keyword(kw: &str) -> Option<BaseType> {
        Some(match kw {
            "bool" => BaseType::Bool,
            "byte" => BaseType::Char,
            "ubyte" => BaseType::UChar,
            "short" => BaseType::Short,
            "ushort" => BaseType::UShort,
            "int" => BaseType::Int,
            "uint" => BaseType::UInt,
            "long" => BaseType::Long,
            "ulong" => BaseType::ULong,
            "float" => BaseType::Float,
            "double" => BaseType::Double,
            "string" => BaseType::String,
            _ => return None,
        })
    }
}

/// A field or vector element's full type.
///
/// Struct, union and enum references are resolved by name rather than pointer:
/// the name is looked up again in the owning [`SchemaDef`]'s symbol tables when
/// the codegen stage needs the referent's definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Type {
    pub base_type: BaseType,
    /// Element type, set only when `base_type` is `Vector`.
    pub element: Option<Box<Type>>,
    /// Name of the referenced struct/table, set when `base_type` is `Struct`.
    pub struct_name: Option<String>,
    /// Name of the referenced enum/union, set when `base_type` is `Union` or `UType`.
    pub enum_name: Option<String>,
}

impl Type {
    pub fn scalar(base_type: BaseType) -> Type {
        Type {
            base_type,
            element: None,
            struct_name: None,
            enum_name: None,
        }
    }

    pub fn string() -> Type {
        Type::scalar(BaseType::String)
    }

    pub fn vector_of(element: Type) -> Type {
        Type {
            base_type: BaseType::Vector,
            element: Some(Box::new(element)),
            struct_name: None,
            enum_name: None,
        }
    }

    pub fn struct_ref(name: impl Into<String>) -> Type {
        Type {
            base_type: BaseType::Struct,
            element: None,
            struct_name: Some(name.into()),
            enum_name: None,
        }
    }

    pub fn union_ref(name: impl Into<String>) -> Type {
        Type {
            base_type: BaseType::Union,
            element: None,
            struct_name: None,
            enum_name: Some(name.into()),
        }
    }
}

/// A parsed default/constant value for a field.
#[derive(Clone, Debug, PartialEq)]
pub struct Value {
    pub the_type: Type,
    pub constant: String,
}

impl Value {
    pub fn new(the_type: Type, constant: impl Into<String>) -> Value {
        Value {
            the_type,
            constant: constant.into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FieldDef {
    pub name: String,
    pub doc_comment: Vec<String>,
    pub value: Value,
    pub deprecated: bool,
    /// Bytes of alignment padding inserted immediately before this field inside
    /// a fixed-size struct's byte layout; unused for info (table) fields.
    pub padding: usize,
}

#[derive(Clone, Debug)]
pub struct StructDef {
    pub name: String,
    pub doc_comment: Vec<String>,
    pub fields: Vec<FieldDef>,
    /// `true` for a fixed-layout `struct`, `false` for a variable-layout `info` (table).
    pub fixed: bool,
    pub sortbysize: bool,
    pub minalign: usize,
    /// Byte size of the struct layout; only meaningful when `fixed` is `true`.
    pub bytesize: usize,
}

impl StructDef {
    pub fn new(name: impl Into<String>, fixed: bool) -> StructDef {
        StructDef {
            name: name.into(),
            doc_comment: Vec::new(),
            fields: Vec::new(),
            fixed,
            sortbysize: true,
            minalign: 1,
            bytesize: 0,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields in the order they should be written: descending by inline size when
    /// `sortbysize` is set (ties broken by declaration-reverse order), declaration-
    /// reverse order otherwise. Smaller fields trailing larger ones minimizes padding.
    pub fn fields_in_write_order(&self) -> Vec<&FieldDef> {
        let mut ordered: Vec<&FieldDef> = self.fields.iter().rev().collect();
        if !self.sortbysize {
            return ordered;
        }
        ordered.sort_by(|a, b| {
            let size_a = inline_size(&a.value.the_type, None);
            let size_b = inline_size(&b.value.the_type, None);
            size_b.cmp(&size_a)
        });
        ordered
    }
}

/// Resolves a type's inline (in-place) byte size. `lookup_struct` is needed only
/// when `the_type` refers to a fixed struct, to find its own `bytesize`.
pub fn inline_size(the_type: &Type, lookup_struct: Option<&StructDef>) -> usize {
    match the_type.base_type {
        BaseType::Struct => lookup_struct.map(|s| s.bytesize).unwrap_or(4),
        _ => the_type.base_type.size_of(),
    }
}

#[derive(Clone, Debug)]
pub struct EnumVal {
    pub name: String,
    pub doc_comment: Vec<String>,
    pub value: i64,
    /// Set when this value names a union member's struct/table.
    pub struct_name: Option<String>,
}

#[derive(Clone, Debug)]
pub struct EnumDef {
    pub name: String,
    pub doc_comment: Vec<String>,
    pub vals: Vec<EnumVal>,
    pub is_union: bool,
    pub underlying_type: BaseType,
}

impl EnumDef {
    pub fn new(name: impl Into<String>, underlying_type: BaseType, is_union: bool) -> EnumDef {
        EnumDef {
            name: name.into(),
            doc_comment: Vec::new(),
            vals: Vec::new(),
            is_union,
            underlying_type,
        }
    }

    /// Values are sparse enough to warrant a name lookup table rather than a plain
    /// array index, mirroring the range/count heuristic of enum-to-string codegen.
    pub fn is_sparse(&self) -> bool {
        if self.vals.len() < 2 {
            return false;
        }
        let min = self.vals.iter().map(|v| v.value).min().unwrap();
        let max = self.vals.iter().map(|v| v.value).max().unwrap();
        let range = (max - min + 1) as f64;
        range / self.vals.len() as f64 >= 5.0
    }
}

/// Owns a set of named definitions, preserving declaration order while allowing
/// name lookup -- the adaptation of the original pointer-keyed symbol table to
/// Rust's ownership model.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable<T> {
    order: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> SymbolTable<T> {
    pub fn new() -> SymbolTable<T> {
        SymbolTable {
            order: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Adds `item` under `name`. Returns `true` if `name` was already present (the
    /// new item still gets appended, matching the original's "duplicate symbol"
    /// detection being a caller-checked error rather than a silent overwrite).
    pub fn add(&mut self, name: &str, item: T) -> bool {
        let duplicate = self.index.contains_key(name);
        self.index.entry(name.to_string()).or_insert(self.order.len());
        self.order.push(item);
        duplicate
    }

    pub fn lookup(&self, name: &str) -> Option<&T> {
        self.index.get(name).map(|&i| &self.order[i])
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut T> {
        match self.index.get(name) {
            Some(&i) => Some(&mut self.order[i]),
            None => None,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<T> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// The fully parsed contents of one schema file.
#[derive(Clone, Debug, Default)]
pub struct SchemaDef {
    pub structs: SymbolTable<StructDef>,
    pub enums: SymbolTable<EnumDef>,
    pub root_type: Option<String>,
    pub namespace: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_table_add_lookup() {
        let mut t = SymbolTable::new();
        assert!(!t.add("a", 1));
        assert!(!t.add("b", 2));
        assert!(t.add("a", 3));
        assert_eq!(Some(&1), t.lookup("a"));
        assert_eq!(3, t.len());
    }

    #[test]
    fn test_enum_sparseness() {
        let mut dense = EnumDef::new("Side", BaseType::Short, false);
        dense.vals.push(EnumVal {
            name: "Left".into(),
            doc_comment: Vec::new(),
            value: 0,
            struct_name: None,
        });
        dense.vals.push(EnumVal {
            name: "Right".into(),
            doc_comment: Vec::new(),
            value: 1,
            struct_name: None,
        });
        assert!(!dense.is_sparse());

        let mut sparse = EnumDef::new("Flags".into(), BaseType::Int, false);
        sparse.vals.push(EnumVal {
            name: "A".into(),
            doc_comment: Vec::new(),
            value: 0,
            struct_name: None,
        });
        sparse.vals.push(EnumVal {
            name: "B".into(),
            doc_comment: Vec::new(),
            value: 100,
            struct_name: None,
        });
        assert!(sparse.is_sparse());
    }

    #[test]
    fn test_fields_in_write_order_descending_size() {
        let mut s = StructDef::new("Mixed", true);
        s.fields.push(FieldDef {
            name: "a".into(),
            doc_comment: Vec::new(),
            value: Value::new(Type::scalar(BaseType::Char), "0"),
            deprecated: false,
            padding: 0,
        });
        s.fields.push(FieldDef {
            name: "b".into(),
            doc_comment: Vec::new(),
            value: Value::new(Type::scalar(BaseType::Long), "0"),
            deprecated: false,
            padding: 0,
        });
        let order: Vec<&str> = s
            .fields_in_write_order()
            .into_iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(vec!["b", "a"], order);
    }
}
