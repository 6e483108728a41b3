use std::fmt::{self, Display};

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::cursor::{Cursor, CursorError, Unit};

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum LexError {
    #[error("Unexpected character '{ch}'")]
    #[diagnostic(
        code(lex::unexpected_character),
        help("remove or correct the character: `{ch}`")
    )]
    UnexpectedCharacter {
        ch: char,
        #[label("this character")]
        span: SourceSpan,
    },

    #[error("character literal must contain exactly one character")]
    #[diagnostic(code(lex::malformed_character))]
    MalformedCharacter {
        #[label("this literal")]
        span: SourceSpan,
    },

    #[error("unterminated {what} literal")]
    #[diagnostic(code(lex::unterminated), help("add the closing `{quote}`"))]
    Unterminated {
        what: &'static str,
        quote: char,
        #[label("literal starts here")]
        span: SourceSpan,
    },

    #[error("'{ch}' is not a valid {base} digit")]
    #[diagnostic(code(lex::invalid_digit))]
    InvalidDigit {
        ch: char,
        base: DigitBase,
        #[label("invalid digit")]
        span: SourceSpan,
    },

    #[error("exponent sign appears twice")]
    #[diagnostic(code(lex::repeated_sign), help("an exponent takes at most one `+` or `-`"))]
    RepeatedExponentSign {
        #[label("second sign")]
        span: SourceSpan,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Cursor(#[from] CursorError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Keyword(Keyword),
    Punctuator(Punctuator),
    Literal(Literal),
    Identifier(String),
}

impl TokenKind {
    /// The token as it would be written in source.
    pub fn lexeme(&self) -> String {
        match self {
            TokenKind::Keyword(keyword) => keyword.as_str().to_string(),
            TokenKind::Punctuator(punctuator) => punctuator.as_char().to_string(),
            TokenKind::Identifier(ident) => ident.clone(),
            TokenKind::Literal(Literal { kind, text }) => match kind {
                LiteralKind::Character => format!("'{text}'"),
                LiteralKind::String => format!("\"{text}\""),
                LiteralKind::Integer(_) | LiteralKind::Float(_) => text.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Val,
    Var,
}

impl Keyword {
    pub fn from_ident(ident: &str) -> Option<Self> {
        match ident {
            "val" => Some(Keyword::Val),
            "var" => Some(Keyword::Var),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Val => "val",
            Keyword::Var => "var",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punctuator {
    Plus,
    Minus,
    Asterisk,
    Slash,
    Caret,
    Ampersand,
    VerticalLine,
    Percent,
    Greater,
    Less,
    Equal,
    Bang,
    Question,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Comma,
    Semicolon,
    Dot,
    Colon,
}

impl Punctuator {
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c {
            '+' => Punctuator::Plus,
            '-' => Punctuator::Minus,
            '*' => Punctuator::Asterisk,
            '/' => Punctuator::Slash,
            '^' => Punctuator::Caret,
            '&' => Punctuator::Ampersand,
            '|' => Punctuator::VerticalLine,
            '%' => Punctuator::Percent,
            '>' => Punctuator::Greater,
            '<' => Punctuator::Less,
            '=' => Punctuator::Equal,
            '!' => Punctuator::Bang,
            '?' => Punctuator::Question,
            '(' => Punctuator::LeftParen,
            ')' => Punctuator::RightParen,
            '[' => Punctuator::LeftBracket,
            ']' => Punctuator::RightBracket,
            '{' => Punctuator::LeftBrace,
            '}' => Punctuator::RightBrace,
            ',' => Punctuator::Comma,
            ';' => Punctuator::Semicolon,
            '.' => Punctuator::Dot,
            ':' => Punctuator::Colon,
            _ => return None,
        })
    }

    pub fn as_char(self) -> char {
        match self {
            Punctuator::Plus => '+',
            Punctuator::Minus => '-',
            Punctuator::Asterisk => '*',
            Punctuator::Slash => '/',
            Punctuator::Caret => '^',
            Punctuator::Ampersand => '&',
            Punctuator::VerticalLine => '|',
            Punctuator::Percent => '%',
            Punctuator::Greater => '>',
            Punctuator::Less => '<',
            Punctuator::Equal => '=',
            Punctuator::Bang => '!',
            Punctuator::Question => '?',
            Punctuator::LeftParen => '(',
            Punctuator::RightParen => ')',
            Punctuator::LeftBracket => '[',
            Punctuator::RightBracket => ']',
            Punctuator::LeftBrace => '{',
            Punctuator::RightBrace => '}',
            Punctuator::Comma => ',',
            Punctuator::Semicolon => ';',
            Punctuator::Dot => '.',
            Punctuator::Colon => ':',
        }
    }
}

/// A literal as it appeared in the source. Numeric conversion happens later,
/// so `text` keeps digit separators and base prefixes.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub kind: LiteralKind,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Integer(DigitBase),
    Float(DigitBase),
    Character,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigitBase {
    Decimal,
    Binary,
    Octal,
    Hexadecimal,
}

impl DigitBase {
    pub fn radix(self) -> u32 {
        match self {
            DigitBase::Decimal => 10,
            DigitBase::Binary => 2,
            DigitBase::Octal => 8,
            DigitBase::Hexadecimal => 16,
        }
    }

    /// The base selected by the character following a leading `0`.
    pub fn from_prefix(c: char) -> Option<Self> {
        match c {
            'b' => Some(DigitBase::Binary),
            'o' => Some(DigitBase::Octal),
            'x' => Some(DigitBase::Hexadecimal),
            _ => None,
        }
    }

    pub fn is_exponent_marker(self, c: char) -> bool {
        match self {
            DigitBase::Decimal => matches!(c, 'e' | 'E'),
            DigitBase::Hexadecimal => matches!(c, 'p' | 'P'),
            DigitBase::Binary | DigitBase::Octal => false,
        }
    }

    pub fn accepts(self, c: char) -> bool {
        c.is_digit(self.radix())
    }
}

impl Display for DigitBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DigitBase::Decimal => write!(f, "decimal"),
            DigitBase::Binary => write!(f, "binary"),
            DigitBase::Octal => write!(f, "octal"),
            DigitBase::Hexadecimal => write!(f, "hexadecimal"),
        }
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Display for Punctuator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TokenKind::Keyword(keyword) => write!(f, "KEYWORD {keyword}"),
            TokenKind::Punctuator(punctuator) => write!(f, "PUNCTUATOR {punctuator}"),
            TokenKind::Identifier(ident) => write!(f, "IDENTIFIER {ident}"),
            TokenKind::Literal(Literal { kind, text }) => match kind {
                LiteralKind::Integer(base) => write!(f, "INTEGER {base} {text}"),
                LiteralKind::Float(base) => write!(f, "FLOAT {base} {text}"),
                LiteralKind::Character => write!(f, "CHARACTER '{text}'"),
                LiteralKind::String => write!(f, "STRING \"{text}\""),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberPart {
    Integer,
    Fraction,
    Exponent,
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

/// Turns one line of source into tokens.
pub fn lex(line: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(line).tokenize()
}

pub struct Lexer {
    chars: Cursor<char>,
    byte: usize,
    buffer: String,
    buffer_start: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    pub fn new(line: &str) -> Self {
        Lexer {
            chars: Cursor::new(line.chars()),
            byte: 0,
            buffer: String::new(),
            buffer_start: 0,
            tokens: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        while let Some(c) = self.bump() {
            let start = self.byte - c.len_utf8();
            match c {
                c if is_whitespace(c) => self.flush(),
                c if c.is_alphabetic() || c == '_' => self.accumulate(c, start),
                // digits only continue an identifier, they never start one
                '0'..='9' if !self.buffer.is_empty() => self.accumulate(c, start),
                '0'..='9' => self.lex_number(c, start)?,
                '\'' => {
                    self.flush();
                    self.lex_character(start)?;
                }
                '"' => {
                    self.flush();
                    self.lex_string(start)?;
                }
                c => match Punctuator::from_char(c) {
                    Some(punctuator) => {
                        self.flush();
                        self.emit(TokenKind::Punctuator(punctuator), start);
                    }
                    None => {
                        return Err(LexError::UnexpectedCharacter {
                            ch: c,
                            span: SourceSpan::from(start..self.byte),
                        });
                    }
                },
            }
        }
        self.flush();
        Ok(self.tokens)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.advance().element()?;
        self.byte += c.len_utf8();
        Some(c)
    }

    fn unbump(&mut self, c: char) -> Result<(), LexError> {
        self.chars.push_back(Unit::Element(c))?;
        self.byte -= c.len_utf8();
        Ok(())
    }

    fn accumulate(&mut self, c: char, start: usize) {
        if self.buffer.is_empty() {
            self.buffer_start = start;
        }
        self.buffer.push(c);
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.buffer);
        let span = SourceSpan::from(self.buffer_start..self.buffer_start + text.len());
        let kind = match Keyword::from_ident(&text) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Identifier(text),
        };
        self.tokens.push(Token { kind, span });
    }

    fn emit(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token {
            kind,
            span: SourceSpan::from(start..self.byte),
        });
    }

    fn lex_number(&mut self, first: char, start: usize) -> Result<(), LexError> {
        let mut text = String::from(first);
        let mut base = DigitBase::Decimal;

        if first == '0' {
            if let Some(next) = self.bump() {
                match DigitBase::from_prefix(next) {
                    Some(prefixed) => {
                        base = prefixed;
                        text.push(next);
                    }
                    None => self.unbump(next)?,
                }
            }
        }

        let mut part = NumberPart::Integer;
        let mut exponent_signed = false;
        let mut exponent_digits = false;

        while let Some(c) = self.bump() {
            let at = self.byte - c.len_utf8();
            match c {
                '.' if part == NumberPart::Integer => {
                    part = NumberPart::Fraction;
                    text.push(c);
                }
                c if part != NumberPart::Exponent && base.is_exponent_marker(c) => {
                    part = NumberPart::Exponent;
                    text.push(c);
                }
                '+' | '-' if part == NumberPart::Exponent && !exponent_digits => {
                    if exponent_signed {
                        return Err(LexError::RepeatedExponentSign {
                            span: SourceSpan::from(at..self.byte),
                        });
                    }
                    exponent_signed = true;
                    text.push(c);
                }
                // separators are checked by the literal parser
                '_' => text.push(c),
                c if is_whitespace(c) || (c != '.' && Punctuator::from_char(c).is_some()) => {
                    self.unbump(c)?;
                    break;
                }
                c => {
                    let digits = match part {
                        NumberPart::Exponent => DigitBase::Decimal,
                        NumberPart::Integer | NumberPart::Fraction => base,
                    };
                    if !digits.accepts(c) {
                        return Err(LexError::InvalidDigit {
                            ch: c,
                            base: digits,
                            span: SourceSpan::from(at..self.byte),
                        });
                    }
                    if part == NumberPart::Exponent {
                        exponent_digits = true;
                    }
                    text.push(c);
                }
            }
        }

        let kind = match part {
            NumberPart::Integer => LiteralKind::Integer(base),
            NumberPart::Fraction | NumberPart::Exponent => LiteralKind::Float(base),
        };
        self.emit(TokenKind::Literal(Literal { kind, text }), start);
        Ok(())
    }

    fn lex_character(&mut self, start: usize) -> Result<(), LexError> {
        let content = self.lex_quoted('\'', "character", start)?;
        if content.chars().count() != 1 {
            return Err(LexError::MalformedCharacter {
                span: SourceSpan::from(start..self.byte),
            });
        }
        let literal = Literal {
            kind: LiteralKind::Character,
            text: content,
        };
        self.emit(TokenKind::Literal(literal), start);
        Ok(())
    }

    fn lex_string(&mut self, start: usize) -> Result<(), LexError> {
        let content = self.lex_quoted('"', "string", start)?;
        let literal = Literal {
            kind: LiteralKind::String,
            text: content,
        };
        self.emit(TokenKind::Literal(literal), start);
        Ok(())
    }

    fn lex_quoted(
        &mut self,
        quote: char,
        what: &'static str,
        start: usize,
    ) -> Result<String, LexError> {
        let mut content = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(content),
                Some(c) => content.push(c),
                None => {
                    return Err(LexError::Unterminated {
                        what,
                        quote,
                        span: SourceSpan::from(start..self.byte),
                    });
                }
            }
        }
    }
}
