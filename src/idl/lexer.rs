use crate::error::ParseError;

/// A single lexical token, tagged with the source line it started on.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Ident(String),
    IntLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(String),
    /// Single-character punctuation: `{ } ( ) [ ] : ; , = .`
    Symbol(char),
    /// Text following a `///` doc comment marker, leading space trimmed.
    DocComment(String),
    Eof,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LexedToken {
    pub token: Token,
    pub line: usize,
}

/// Tokenizes an entire schema source string up front, rather than character by
/// character as the parser consumes it -- simpler to reason about in Rust, and the
/// whole schema source is tiny compared to the buffers it describes.
pub struct Lexer;

impl Lexer {
    pub fn tokenize(source: &str) -> Result<Vec<LexedToken>, ParseError> {
        let mut tokens = Vec::new();
        let mut line = 1usize;
        let chars: Vec<char> = source.chars().collect();
        let mut i = 0usize;

        while i < chars.len() {
            let c = chars[i];
            match c {
                '\n' => {
                    line += 1;
                    i += 1;
                }
                c if c.is_whitespace() => {
                    i += 1;
                }
                '/' if chars.get(i + 1) == Some(&'/') && chars.get(i + 2) == Some(&'/') => {
                    let start_line = line;
                    i += 3;
                    if chars.get(i) == Some(&' ') {
                        i += 1;
                    }
                    let start = i;
                    while i < chars.len() && chars[i] != '\n' {
                        i += 1;
                    }
                    let text: String = chars[start..i].iter().collect();
                    tokens.push(LexedToken {
                        token: Token::DocComment(text),
                        line: start_line,
                    });
                }
                '/' if chars.get(i + 1) == Some(&'/') => {
                    while i < chars.len() && chars[i] != '\n' {
                        i += 1;
                    }
                }
                '{' | '}' | '(' | ')' | '[' | ']' | ':' | ';' | ',' | '=' | '.' => {
                    tokens.push(LexedToken {
                        token: Token::Symbol(c),
                        line,
                    });
                    i += 1;
                }
                '"' => {
                    let start_line = line;
                    i += 1;
                    let mut s = String::new();
                    loop {
                        match chars.get(i) {
                            None => return Err(ParseError::UnterminatedString { line: start_line }),
                            Some('"') => {
                                i += 1;
                                break;
                            }
                            Some('\n') => {
                                return Err(ParseError::UnterminatedString { line: start_line })
                            }
                            Some(&ch) => {
                                s.push(ch);
                                i += 1;
                            }
                        }
                    }
                    tokens.push(LexedToken {
                        token: Token::StringLiteral(s),
                        line: start_line,
                    });
                }
                c if c.is_ascii_digit() || (c == '-' && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit())) =>
                {
                    let start = i;
                    if c == '-' {
                        i += 1;
                    }
                    while chars.get(i).is_some_and(|d| d.is_ascii_digit()) {
                        i += 1;
                    }
                    let mut is_float = false;
                    if chars.get(i) == Some(&'.') {
                        is_float = true;
                        i += 1;
                        while chars.get(i).is_some_and(|d| d.is_ascii_digit()) {
                            i += 1;
                        }
                    }
                    let text: String = chars[start..i].iter().collect();
                    let token = if is_float {
                        Token::FloatLiteral(text.parse().unwrap())
                    } else {
                        Token::IntLiteral(text.parse().unwrap())
                    };
                    tokens.push(LexedToken { token, line });
                }
                c if c.is_alphabetic() || c == '_' => {
                    let start = i;
                    while chars.get(i).is_some_and(|d| d.is_alphanumeric() || *d == '_') {
                        i += 1;
                    }
                    let text: String = chars[start..i].iter().collect();
                    tokens.push(LexedToken {
                        token: Token::Ident(text),
                        line,
                    });
                }
                _ => return Err(ParseError::UnexpectedChar { line, ch: c }),
            }
        }

        tokens.push(LexedToken {
            token: Token::Eof,
            line,
        });
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenizes_struct_decl() {
        let tokens = Lexer::tokenize("struct Vec3 {\n  x: float;\n}").unwrap();
        let kinds: Vec<&Token> = tokens.iter().map(|t| &t.token).collect();
        assert_eq!(
            kinds,
            vec![
                &Token::Ident("struct".into()),
                &Token::Ident("Vec3".into()),
                &Token::Symbol('{'),
                &Token::Ident("x".into()),
                &Token::Symbol(':'),
                &Token::Ident("float".into()),
                &Token::Symbol(';'),
                &Token::Symbol('}'),
                &Token::Eof,
            ]
        );
    }

    #[test]
    fn test_skips_line_comments() {
        let tokens = Lexer::tokenize("// comment\nint").unwrap();
        assert_eq!(Token::Ident("int".into()), tokens[0].token);
        assert_eq!(2, tokens[0].line);
    }

    #[test]
    fn test_doc_comment_is_a_distinct_token() {
        let tokens = Lexer::tokenize("/// Health points.\nhp:short;").unwrap();
        assert_eq!(Token::DocComment("Health points.".into()), tokens[0].token);
        assert_eq!(1, tokens[0].line);
        assert_eq!(Token::Ident("hp".into()), tokens[1].token);
    }

    #[test]
    fn test_negative_and_float_literals() {
        let tokens = Lexer::tokenize("-5 3.25").unwrap();
        assert_eq!(Token::IntLiteral(-5), tokens[0].token);
        assert_eq!(Token::FloatLiteral(3.25), tokens[1].token);
    }

    #[test]
    fn test_unterminated_string_errors() {
        let err = Lexer::tokenize("\"abc").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedString { line: 1 }));
    }

    #[test]
    fn test_unexpected_char_errors() {
        let err = Lexer::tokenize("int x $ 5;").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedChar { line: 1, ch: '$' }));
    }
}
