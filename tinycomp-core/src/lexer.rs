//! Lexer for tinycomp source text.
//!
//! Whitespace and `/* ... */` comments are dropped here, so the parser only
//! ever sees significant tokens. Every token records the position of its
//! first character.

use crate::error::CoreError;
use crate::span::Position;

/// Kind of a token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Special
    Eof,

    // Identifiers and literals
    Ident(String),
    Str(String),
    Number(f64),

    // Punctuation
    LParen,     // (
    RParen,     // )
    LBrace,     // {
    RBrace,     // }
    LBracket,   // [
    RBracket,   // ]
    Less,       // <
    Greater,    // >
    Comma,      // ,
    Semi,       // ;
    Dot,        // .
    Equal,      // =
    EqualEqual, // ==
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Amp,        // &

    // Keywords
    Export,
    If,
    While,
    Return,
    True,
    False,
    Struct,
    Void,
    Ref,
}

impl TokenKind {
    /// Human readable form used in diagnostics.
    pub fn describe(&self) -> String {
        let text = match self {
            TokenKind::Eof => return "end of file".to_string(),
            TokenKind::Ident(name) => return format!("identifier \"{name}\""),
            TokenKind::Str(_) => return "string literal".to_string(),
            TokenKind::Number(_) => return "numeric literal".to_string(),
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Less => "<",
            TokenKind::Greater => ">",
            TokenKind::Comma => ",",
            TokenKind::Semi => ";",
            TokenKind::Dot => ".",
            TokenKind::Equal => "=",
            TokenKind::EqualEqual => "==",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Amp => "&",
            TokenKind::Export => "export",
            TokenKind::If => "if",
            TokenKind::While => "while",
            TokenKind::Return => "return",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Struct => "struct",
            TokenKind::Void => "void",
            TokenKind::Ref => "ref",
        };
        format!("\"{text}\"")
    }
}

/// A single token and the position of its first character.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Position,
}

/// Lex a whole source string. The last token is always `Eof`.
pub fn lex(source: &str) -> Result<Vec<Token>, CoreError> {
    let mut lexer = Lexer {
        chars: source.chars().collect(),
        index: 0,
        pos: Position::START,
    };
    lexer.run()
}

struct Lexer {
    chars: Vec<char>,
    index: usize,
    pos: Position,
}

impl Lexer {
    fn run(&mut self) -> Result<Vec<Token>, CoreError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_trivia()?;
            let start = self.pos;
            let Some(ch) = self.peek_char() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    pos: start,
                });
                return Ok(tokens);
            };

            let kind = match ch {
                '(' => self.single(TokenKind::LParen),
                ')' => self.single(TokenKind::RParen),
                '{' => self.single(TokenKind::LBrace),
                '}' => self.single(TokenKind::RBrace),
                '[' => self.single(TokenKind::LBracket),
                ']' => self.single(TokenKind::RBracket),
                '<' => self.single(TokenKind::Less),
                '>' => self.single(TokenKind::Greater),
                ',' => self.single(TokenKind::Comma),
                ';' => self.single(TokenKind::Semi),
                '.' => self.single(TokenKind::Dot),
                '+' => self.single(TokenKind::Plus),
                '-' => self.single(TokenKind::Minus),
                '*' => self.single(TokenKind::Star),
                '/' => self.single(TokenKind::Slash),
                '&' => self.single(TokenKind::Amp),
                '=' => {
                    self.consume_char();
                    if self.peek_char() == Some('=') {
                        self.consume_char();
                        TokenKind::EqualEqual
                    } else {
                        TokenKind::Equal
                    }
                }
                '"' => self.lex_string()?,
                '0'..='9' => self.lex_number(start)?,
                _ if is_ident_start(ch) => self.lex_ident_or_keyword(),
                _ => {
                    return Err(CoreError::parse(
                        start,
                        format!("unexpected character \"{ch}\""),
                    ));
                }
            };

            tokens.push(Token { kind, pos: start });
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.consume_char();
        kind
    }

    fn skip_trivia(&mut self) -> Result<(), CoreError> {
        loop {
            match self.peek_char() {
                Some(' ' | '\t' | '\n' | '\r') => self.consume_char(),
                Some('/') if self.peek_next() == Some('*') => {
                    self.consume_char();
                    self.consume_char();
                    loop {
                        match self.peek_char() {
                            None => {
                                return Err(CoreError::parse(
                                    self.pos,
                                    "unexpected end of file within comment",
                                ));
                            }
                            Some('*') if self.peek_next() == Some('/') => {
                                self.consume_char();
                                self.consume_char();
                                break;
                            }
                            Some(_) => self.consume_char(),
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn lex_string(&mut self) -> Result<TokenKind, CoreError> {
        // opening quote
        self.consume_char();

        let mut value = String::new();
        loop {
            match self.peek_char() {
                None => {
                    return Err(CoreError::parse(
                        self.pos,
                        "reached end of file within a string literal",
                    ));
                }
                Some('\n') => {
                    return Err(CoreError::parse(
                        self.pos,
                        "invalid newline within a string literal",
                    ));
                }
                Some('"') => {
                    self.consume_char();
                    return Ok(TokenKind::Str(value));
                }
                Some('\\') => {
                    self.consume_char();
                    let escaped = self.peek_char().ok_or_else(|| {
                        CoreError::parse(self.pos, "reached end of file within a string literal")
                    })?;
                    value.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        other => other,
                    });
                    self.consume_char();
                }
                Some(ch) => {
                    value.push(ch);
                    self.consume_char();
                }
            }
        }
    }

    fn lex_number(&mut self, start: Position) -> Result<TokenKind, CoreError> {
        // digits with at most one decimal marker
        let mut text = String::new();
        let mut seen_dot = false;
        while let Some(ch) = self.peek_char() {
            match ch {
                '0'..='9' => text.push(ch),
                '.' if seen_dot => {
                    return Err(CoreError::parse(
                        self.pos,
                        "cannot have 2 decimal markers in number literal",
                    ));
                }
                '.' => {
                    seen_dot = true;
                    text.push(ch);
                }
                _ => break,
            }
            self.consume_char();
        }

        let digits = text.trim_end_matches('.');
        digits
            .parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| CoreError::parse(start, format!("invalid number literal \"{text}\"")))
    }

    fn lex_ident_or_keyword(&mut self) -> TokenKind {
        let mut text = String::new();
        while let Some(ch) = self.peek_char() {
            if is_ident_continue(ch) {
                text.push(ch);
                self.consume_char();
            } else {
                break;
            }
        }

        match text.as_str() {
            "export" => TokenKind::Export,
            "if" => TokenKind::If,
            "while" => TokenKind::While,
            "return" => TokenKind::Return,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "struct" => TokenKind::Struct,
            "void" => TokenKind::Void,
            "ref" => TokenKind::Ref,
            _ => TokenKind::Ident(text),
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.index + 1).copied()
    }

    fn consume_char(&mut self) {
        if let Some(&ch) = self.chars.get(self.index) {
            self.pos.advance(ch);
            self.index += 1;
        }
    }
}

fn is_ident_start(ch: char) -> bool {
    ch == '_' || ch.is_alphabetic()
}

fn is_ident_continue(ch: char) -> bool {
    ch == '_' || ch.is_alphanumeric()
}
