use crate::error::ParseError;
use crate::idl::lexer::{LexedToken, Lexer, Token};
use crate::idl::symbol::{BaseType, EnumDef, EnumVal, FieldDef, SchemaDef, StructDef, Type, Value};
use crate::types::padding_bytes;

/// Recursive-descent parser over a pre-tokenized schema.
///
/// Structs and infos (tables) may reference each other regardless of declaration
/// order: every `struct`/`info`/`enum` name is registered with a predeclared stub
/// the moment its header is seen, so a forward reference just resolves to a stub
/// that gets filled in once its own declaration is reached.
pub struct Parser {
    tokens: Vec<LexedToken>,
    pos: usize,
    schema: SchemaDef,
}

impl Parser {
    pub fn parse(source: &str) -> Result<SchemaDef, ParseError> {
        let tokens = Lexer::tokenize(source)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            schema: SchemaDef::default(),
        };
        parser.parse_schema()?;
        parser.assign_offsets()?;
        Ok(parser.schema)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos].token
    }

    fn line(&self) -> usize {
        self.tokens[self.pos].line
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].token.clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn expect_symbol(&mut self, c: char) -> Result<(), ParseError> {
        match self.peek() {
            Token::Symbol(s) if *s == c => {
                self.advance();
                Ok(())
            }
            other => Err(ParseError::UnexpectedToken {
                line: self.line(),
                expected: symbol_name(c),
                found: format!("{:?}", other),
            }),
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.peek().clone() {
            Token::Ident(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(ParseError::UnexpectedToken {
                line: self.line(),
                expected: "identifier",
                found: format!("{:?}", other),
            }),
        }
    }

    fn is_next_symbol(&mut self, c: char) -> bool {
        if matches!(self.peek(), Token::Symbol(s) if *s == c) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes any run of consecutive `///` lines immediately before the cursor,
    /// returning their text in source order for attachment to the declaration
    /// that follows.
    fn collect_doc_comments(&mut self) -> Vec<String> {
        let mut docs = Vec::new();
        while let Token::DocComment(text) = self.peek().clone() {
            docs.push(text);
            self.advance();
        }
        docs
    }

    fn parse_schema(&mut self) -> Result<(), ParseError> {
        loop {
            let doc_comment = self.collect_doc_comments();
            match self.peek().clone() {
                Token::Eof => break,
                Token::Ident(kw) => match kw.as_str() {
                    "namespace" => self.parse_namespace()?,
                    "struct" => self.parse_struct_like(true, doc_comment)?,
                    "info" => self.parse_struct_like(false, doc_comment)?,
                    "enum" => self.parse_enum(false, doc_comment)?,
                    "union" => self.parse_enum(true, doc_comment)?,
                    "root_type" => self.parse_root_type()?,
                    "file_extension" => self.parse_file_extension()?,
                    _ => {
                        return Err(ParseError::UnexpectedToken {
                            line: self.line(),
                            expected: "a declaration (struct, info, enum, union, namespace, root_type)",
                            found: format!("{:?}", kw),
                        })
                    }
                },
                other => {
                    return Err(ParseError::UnexpectedToken {
                        line: self.line(),
                        expected: "a declaration",
                        found: format!("{:?}", other),
                    })
                }
            }
        }
        Ok(())
    }

    fn parse_namespace(&mut self) -> Result<(), ParseError> {
        self.advance();
        let mut parts = vec![self.expect_ident()?];
        while self.is_next_symbol('.') {
            parts.push(self.expect_ident()?);
        }
        self.expect_symbol(';')?;
        self.schema.namespace = parts;
        Ok(())
    }

    fn parse_root_type(&mut self) -> Result<(), ParseError> {
        self.advance();
        let name = self.expect_ident()?;
        self.expect_symbol(';')?;
        self.schema.root_type = Some(name);
        Ok(())
    }

    fn parse_file_extension(&mut self) -> Result<(), ParseError> {
        self.advance();
        match self.advance() {
            Token::StringLiteral(_) => {}
            other => {
                return Err(ParseError::UnexpectedToken {
                    line: self.line(),
                    expected: "a string literal",
                    found: format!("{:?}", other),
                })
            }
        }
        self.expect_symbol(';')?;
        Ok(())
    }

    fn parse_struct_like(&mut self, fixed: bool, doc_comment: Vec<String>) -> Result<(), ParseError> {
        let line = self.line();
        self.advance();
        let name = self.expect_ident()?;
        if self.schema.structs.lookup(&name).is_some() {
            return Err(ParseError::DuplicateSymbol { line, name });
        }
        let metadata = self.parse_metadata()?;
        self.expect_symbol('{')?;

        let mut def = StructDef::new(&name, fixed);
        def.doc_comment = doc_comment;
        def.sortbysize = !metadata.iter().any(|k| k == "original_order");
        while !self.is_next_symbol('}') {
            let field_doc = self.collect_doc_comments();
            let field = self.parse_field(fixed, field_doc)?;
            if field.value.the_type.base_type == BaseType::Union {
                def.fields.push(self.union_discriminator_field(&field)?);
            }
            def.fields.push(field);
            self.expect_symbol(';')?;
        }
        self.schema.structs.add(&name, def);
        Ok(())
    }

    /// Every union-typed field gets a hidden leading `<field>_type` discriminator
    /// field carrying the enum's underlying type, so a reader can tell which
    /// variant the value field's offset actually points at before following it.
    fn union_discriminator_field(&self, field: &FieldDef) -> Result<FieldDef, ParseError> {
        let enum_name = field.value.the_type.enum_name.clone().unwrap();
        let underlying_type = self.schema.enums.lookup(&enum_name).unwrap().underlying_type;
        let mut discriminator_type = Type::scalar(underlying_type);
        discriminator_type.enum_name = Some(enum_name);
        Ok(FieldDef {
            name: format!("{}_type", field.name),
            doc_comment: Vec::new(),
            value: Value::new(discriminator_type, "0"),
            deprecated: false,
            padding: 0,
        })
    }

    /// Parses an optional `(key [: value], ...)` metadata list, returning the bare
    /// attribute names seen (values are accepted but not otherwise interpreted).
    fn parse_metadata(&mut self) -> Result<Vec<String>, ParseError> {
        let mut names = Vec::new();
        if !self.is_next_symbol('(') {
            return Ok(names);
        }
        loop {
            let key = self.expect_ident()?;
            names.push(key);
            if self.is_next_symbol(':') {
                self.parse_constant()?;
            }
            if !self.is_next_symbol(',') {
                break;
            }
        }
        self.expect_symbol(')')?;
        Ok(names)
    }

    fn parse_field(&mut self, in_fixed_struct: bool, doc_comment: Vec<String>) -> Result<FieldDef, ParseError> {
        let field_name = self.expect_ident()?;
        self.expect_symbol(':')?;
        let the_type = self.parse_type()?;

        if in_fixed_struct && !(the_type.base_type.is_scalar() || the_type.base_type == BaseType::Struct)
        {
            return Err(ParseError::InvalidStructField(field_name));
        }

        let constant = if self.is_next_symbol('=') {
            let raw = self.parse_constant()?;
            self.resolve_enum_constant(&the_type, raw)
        } else {
            default_constant(&the_type)
        };

        let metadata = self.parse_metadata()?;
        let deprecated = metadata.iter().any(|k| k == "deprecated");

        Ok(FieldDef {
            name: field_name,
            doc_comment,
            value: Value::new(the_type, constant),
            deprecated,
            padding: 0,
        })
    }

    /// Default values for named enum fields may be written as the value's name
    /// (`color:Color = Red;`); resolve that name to its integer constant so
    /// codegen never has to re-derive it.
    fn resolve_enum_constant(&self, the_type: &Type, raw: String) -> String {
        if raw.parse::<f64>().is_ok() {
            return raw;
        }
        if let Some(enum_name) = &the_type.enum_name {
            if let Some(enum_def) = self.schema.enums.lookup(enum_name) {
                if let Some(val) = enum_def.vals.iter().find(|v| v.name == raw) {
                    return val.value.to_string();
                }
            }
        }
        raw
    }

    fn parse_type(&mut self) -> Result<Type, ParseError> {
        if self.is_next_symbol('[') {
            let element = self.parse_type()?;
            self.expect_symbol(']')?;
            return Ok(Type::vector_of(element));
        }

        let line = self.line();
        let name = self.expect_ident()?;
        if let Some(base_type) = BaseType::from_keyword(&name) {
            return Ok(Type::scalar(base_type));
        }
        if self.schema.structs.lookup(&name).is_some() {
            return Ok(Type::struct_ref(name));
        }
        if let Some(enum_def) = self.schema.enums.lookup(&name) {
            return Ok(if enum_def.is_union {
                Type::union_ref(name)
            } else {
                let mut t = Type::scalar(enum_def.underlying_type);
                t.enum_name = Some(name);
                t
            });
        }
        Err(ParseError::UnknownType { line, name })
    }

    fn parse_constant(&mut self) -> Result<String, ParseError> {
        match self.advance() {
            Token::IntLiteral(n) => Ok(n.to_string()),
            Token::FloatLiteral(f) => Ok(f.to_string()),
            Token::Ident(name) => Ok(name),
            other => Err(ParseError::UnexpectedToken {
                line: self.line(),
                expected: "a constant",
                found: format!("{:?}", other),
            }),
        }
    }

    fn parse_enum(&mut self, is_union: bool, doc_comment: Vec<String>) -> Result<(), ParseError> {
        let line = self.line();
        self.advance();
        let name = self.expect_ident()?;
        if self.schema.enums.lookup(&name).is_some() {
            return Err(ParseError::DuplicateSymbol { line, name });
        }

        let underlying_type = if self.is_next_symbol(':') {
            let type_name = self.expect_ident()?;
            BaseType::from_keyword(&type_name).unwrap_or(BaseType::Int)
        } else if is_union {
            BaseType::UType
        } else {
            BaseType::Int
        };

        self.expect_symbol('{')?;
        let mut def = EnumDef::new(&name, underlying_type, is_union);
        def.doc_comment = doc_comment;
        let mut next_value: i64 = 0;
        while !self.is_next_symbol('}') {
            let val_doc_comment = self.collect_doc_comments();
            let val_name = self.expect_ident()?;
            let struct_name = if is_union {
                if self.schema.structs.lookup(&val_name).is_none() {
                    return Err(ParseError::UndeclaredSymbol {
                        line: self.line(),
                        name: val_name.clone(),
                    });
                }
                Some(val_name.clone())
            } else {
                None
            };
            if self.is_next_symbol('=') {
                next_value = match self.advance() {
                    Token::IntLiteral(n) => n,
                    other => {
                        return Err(ParseError::UnexpectedToken {
                            line: self.line(),
                            expected: "an integer",
                            found: format!("{:?}", other),
                        })
                    }
                };
            }
            def.vals.push(EnumVal {
                name: val_name,
                doc_comment: val_doc_comment,
                value: next_value,
                struct_name,
            });
            next_value += 1;
            if !self.is_next_symbol(',') {
                self.expect_symbol('}')?;
                break;
            }
        }
        if def.vals.is_empty() {
            return Err(ParseError::EmptyEnum { name: def.name });
        }
        self.schema.enums.add(&name, def);
        Ok(())
    }

    /// Computes each fixed struct's `minalign`/`bytesize` and trailing padding.
    ///
    /// Runs once the whole schema is parsed, so that a struct referencing another
    /// struct declared later in the file already sees its final layout.
    fn assign_offsets(&mut self) -> Result<(), ParseError> {
        let names: Vec<String> = self.schema.structs.iter().map(|s| s.name.clone()).collect();
        for name in &names {
            self.assign_struct_offsets(name)?;
        }
        Ok(())
    }

    fn assign_struct_offsets(&mut self, name: &str) -> Result<(), ParseError> {
        if !self
            .schema
            .structs
            .lookup(name)
            .map(|s| s.fixed && s.bytesize == 0)
            .unwrap_or(false)
        {
            return Ok(());
        }

        let field_types: Vec<Type> = self
            .schema
            .structs
            .lookup(name)
            .unwrap()
            .fields
            .iter()
            .map(|f| f.value.the_type.clone())
            .collect();

        for field_type in &field_types {
            if let Some(struct_name) = &field_type.struct_name {
                let struct_name = struct_name.clone();
                self.assign_struct_offsets(&struct_name)?;
            }
        }

        let mut size = 0usize;
        let mut minalign = 1usize;
        let mut paddings = Vec::with_capacity(field_types.len());
        for field_type in &field_types {
            let (field_size, field_align) = match field_type.struct_name.as_deref() {
                Some(struct_name) => {
                    let referent = self.schema.structs.lookup(struct_name).unwrap();
                    (referent.bytesize, referent.minalign)
                }
                None => {
                    let s = field_type.base_type.size_of();
                    (s, s)
                }
            };
            minalign = minalign.max(field_align);
            let pad = padding_bytes(size, field_align);
            paddings.push(pad);
            size += pad + field_size;
        }
        size += padding_bytes(size, minalign);

        let def = self.schema.structs.lookup_mut(name).unwrap();
        def.bytesize = size;
        def.minalign = minalign;
        for (field, pad) in def.fields.iter_mut().zip(paddings) {
            field.padding = pad;
        }
        Ok(())
    }
}

fn default_constant(the_type: &Type) -> String {
    if the_type.base_type.is_float() {
        "0.0".to_string()
    } else {
        "0".to_string()
    }
}

fn symbol_name(c: char) -> &'static str {
    match c {
        '{' => "'{'",
        '}' => "'}'",
        '(' => "'('",
        ')' => "')'",
        '[' => "'['",
        ']' => "']'",
        ':' => "':'",
        ';' => "';'",
        ',' => "','",
        '=' => "'='",
        '.' => "'.'",
        _ => "a symbol",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_struct_with_fields() {
        let schema = Parser::parse("struct Vec3 {\n x:float;\n y:float;\n z:float;\n}").unwrap();
        let def = schema.structs.lookup("Vec3").unwrap();
        assert_eq!(3, def.fields.len());
        assert_eq!(12, def.bytesize);
        assert_eq!(4, def.minalign);
    }

    #[test]
    fn test_parse_info_with_default() {
        let schema = Parser::parse("info Monster {\n hp:short = 100;\n name:string;\n}").unwrap();
        let def = schema.structs.lookup("Monster").unwrap();
        assert_eq!("100", def.fields[0].value.constant);
        assert_eq!("0", def.fields[1].value.constant);
        assert!(!def.fixed);
    }

    #[test]
    fn test_named_enum_default_resolves_to_value() {
        let schema = Parser::parse(
            "enum Color:byte { Red, Green, Blue }\ninfo Pony { color:Color = Green; }",
        )
        .unwrap();
        let pony = schema.structs.lookup("Pony").unwrap();
        assert_eq!("1", pony.fields[0].value.constant);
    }

    #[test]
    fn test_parse_vector_field() {
        let schema = Parser::parse("info Bag {\n items:[int];\n}").unwrap();
        let def = schema.structs.lookup("Bag").unwrap();
        assert_eq!(BaseType::Vector, def.fields[0].value.the_type.base_type);
    }

    #[test]
    fn test_parse_enum_and_use_as_field() {
        let schema =
            Parser::parse("enum Color:byte { Red, Green, Blue }\ninfo Pony { color:Color; }").unwrap();
        let color = schema.enums.lookup("Color").unwrap();
        assert_eq!(3, color.vals.len());
        assert_eq!(1, color.vals[1].value);
        let pony = schema.structs.lookup("Pony").unwrap();
        assert_eq!(BaseType::Char, pony.fields[0].value.the_type.base_type);
    }

    #[test]
    fn test_forward_reference_between_structs() {
        let schema = Parser::parse(
            "info Node {\n next:Leaf;\n}\ninfo Leaf {\n value:int;\n}\nroot_type Node;",
        )
        .unwrap();
        assert_eq!(Some("Node".to_string()), schema.root_type);
        let node = schema.structs.lookup("Node").unwrap();
        assert_eq!(BaseType::Struct, node.fields[0].value.the_type.base_type);
    }

    #[test]
    fn test_duplicate_struct_is_an_error() {
        let err = Parser::parse("struct A { x:int; }\nstruct A { y:int; }").unwrap_err();
        assert!(matches!(err, ParseError::DuplicateSymbol { name, .. } if name == "A"));
    }

    #[test]
    fn test_invalid_struct_field_rejects_string() {
        let err = Parser::parse("struct A { x:string; }").unwrap_err();
        assert!(matches!(err, ParseError::InvalidStructField(_)));
    }

    #[test]
    fn test_empty_enum_is_an_error() {
        let err = Parser::parse("enum Empty:byte {}").unwrap_err();
        assert!(matches!(err, ParseError::EmptyEnum { .. }));
    }

    #[test]
    fn test_deprecated_metadata_marks_field() {
        let schema = Parser::parse("info M {\n old:int (deprecated);\n cur:int;\n}").unwrap();
        let def = schema.structs.lookup("M").unwrap();
        assert!(def.fields[0].deprecated);
        assert!(!def.fields[1].deprecated);
    }

    #[test]
    fn test_original_order_metadata_disables_sorting() {
        let schema =
            Parser::parse("struct M (original_order) {\n a:byte;\n b:long;\n}").unwrap();
        let def = schema.structs.lookup("M").unwrap();
        assert!(!def.sortbysize);
        let order: Vec<&str> = def
            .fields_in_write_order()
            .into_iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(vec!["b", "a"], order);
    }

    #[test]
    fn test_file_extension_directive_is_accepted() {
        let schema = Parser::parse("file_extension \"mgz\";\nstruct A { x:int; }").unwrap();
        assert!(schema.structs.lookup("A").is_some());
    }

    #[test]
    fn test_doc_comments_attach_to_struct_and_field() {
        let schema = Parser::parse(
            "/// A monster.\ninfo Monster {\n  /// Hit points.\n  hp:short;\n}",
        )
        .unwrap();
        let def = schema.structs.lookup("Monster").unwrap();
        assert_eq!(vec!["A monster.".to_string()], def.doc_comment);
        assert_eq!(vec!["Hit points.".to_string()], def.fields[0].doc_comment);
    }

    #[test]
    fn test_doc_comments_attach_to_enum_values() {
        let schema = Parser::parse(
            "enum Color:byte {\n  /// The default.\n  Red,\n  Green,\n}",
        )
        .unwrap();
        let def = schema.enums.lookup("Color").unwrap();
        assert_eq!(vec!["The default.".to_string()], def.vals[0].doc_comment);
        assert!(def.vals[1].doc_comment.is_empty());
    }

    #[test]
    fn test_union_field_resolves_to_utype() {
        let schema = Parser::parse(
            "struct Circle { r:float; }\nstruct Square { s:float; }\nunion Shape { Circle, Square }",
        )
        .unwrap();
        let shape = schema.enums.lookup("Shape").unwrap();
        assert!(shape.is_union);
        assert_eq!(Some("Circle".to_string()), shape.vals[0].struct_name);
    }
}
