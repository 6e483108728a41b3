use miette::SourceSpan;

use crate::{
    cursor::{Cursor, Unit},
    lex::DigitBase,
    tree::{Node, NodeKind},
};

use super::{Parser, SyntaxError};

impl Parser {
    /// Re-reads an integer literal's text into digit-level nodes, validating
    /// digit separators on the way.
    pub(super) fn parse_integer_literal(
        &mut self,
        text: &str,
        base: DigitBase,
        span: SourceSpan,
    ) -> Result<Node, SyntaxError> {
        let mut chars = LiteralParser::new(text, span);
        let integer = match base {
            DigitBase::Decimal => chars.decimal_integer()?,
            DigitBase::Binary => chars.prefixed("0b", base, NodeKind::BinaryLiteral)?,
            DigitBase::Octal => chars.prefixed("0o", base, NodeKind::OctalLiteral)?,
            DigitBase::Hexadecimal => {
                chars.prefixed("0x", base, NodeKind::HexadecimalLiteral)?
            }
        };
        chars.finish()?;
        Ok(basic_literal(Node::wrap(NodeKind::IntegerLiteral, integer)))
    }

    pub(super) fn parse_float_literal(
        &mut self,
        text: &str,
        base: DigitBase,
        span: SourceSpan,
    ) -> Result<Node, SyntaxError> {
        let mut chars = LiteralParser::new(text, span);
        let float = match base {
            DigitBase::Decimal => chars.decimal_float()?,
            DigitBase::Hexadecimal => chars.hexadecimal_float()?,
            DigitBase::Binary | DigitBase::Octal => {
                return Err(SyntaxError::UnsupportedFloatBase { base, span });
            }
        };
        chars.finish()?;
        Ok(basic_literal(Node::wrap(NodeKind::FloatLiteral, float)))
    }
}

fn basic_literal(literal: Node) -> Node {
    Node::wrap(
        NodeKind::Literal,
        Node::wrap(NodeKind::BasicLiteral, literal),
    )
}

fn digit_kind(base: DigitBase) -> NodeKind {
    match base {
        DigitBase::Decimal => NodeKind::DecimalDigit,
        DigitBase::Binary => NodeKind::BinaryDigit,
        DigitBase::Octal => NodeKind::OctalDigit,
        DigitBase::Hexadecimal => NodeKind::HexadecimalDigit,
    }
}

fn digits_kind(base: DigitBase) -> NodeKind {
    match base {
        DigitBase::Decimal => NodeKind::DecimalDigits,
        DigitBase::Binary => NodeKind::BinaryDigits,
        DigitBase::Octal => NodeKind::OctalDigits,
        DigitBase::Hexadecimal => NodeKind::HexadecimalDigits,
    }
}

fn never(_: char) -> bool {
    false
}

/// Literal text only ever holds ASCII, so a char index is also a byte offset.
struct LiteralParser {
    chars: Cursor<char>,
    span: SourceSpan,
}

impl LiteralParser {
    fn new(text: &str, span: SourceSpan) -> Self {
        LiteralParser {
            chars: Cursor::new(text.chars()),
            span,
        }
    }

    fn decimal_integer(&mut self) -> Result<Node, SyntaxError> {
        let mut children = vec![self.digit(DigitBase::Decimal)?];
        if let Unit::Element(c) = self.chars.peek() {
            if c == '_' {
                self.separator(never)?;
                children.push(Node::terminal("_"));
            }
            children.push(self.digits(DigitBase::Decimal, never)?);
        }
        Ok(Node::new(NodeKind::DecimalLiteral, children))
    }

    fn prefixed(
        &mut self,
        prefix: &'static str,
        base: DigitBase,
        kind: NodeKind,
    ) -> Result<Node, SyntaxError> {
        let mut children = vec![self.prefix(prefix)?];
        if self.peek_is('_') {
            self.chars.advance();
            children.push(Node::terminal("_"));
        }
        children.push(self.digits(base, never)?);
        Ok(Node::new(kind, children))
    }

    fn decimal_float(&mut self) -> Result<Node, SyntaxError> {
        let base = DigitBase::Decimal;
        let mut children = vec![self.digits(base, |c| c == '.' || base.is_exponent_marker(c))?];
        if self.peek_is('.') {
            self.chars.advance();
            children.push(Node::terminal("."));
            children.push(self.digits(base, |c| base.is_exponent_marker(c))?);
        }
        if let Some(exponent) = self.exponent(base, NodeKind::DecimalExponent)? {
            children.push(exponent);
        }
        Ok(Node::new(NodeKind::DecimalFloatLiteral, children))
    }

    fn hexadecimal_float(&mut self) -> Result<Node, SyntaxError> {
        let base = DigitBase::Hexadecimal;
        let prefix = self.prefix("0x")?;

        let mut mantissa = Vec::new();
        if self.peek_is('_') {
            self.chars.advance();
            mantissa.push(Node::terminal("_"));
        }
        mantissa.push(self.digits(base, |c| c == '.' || base.is_exponent_marker(c))?);
        if self.peek_is('.') {
            self.chars.advance();
            mantissa.push(Node::terminal("."));
            mantissa.push(self.digits(base, |c| base.is_exponent_marker(c))?);
        }

        let Some(exponent) = self.exponent(base, NodeKind::HexadecimalExponent)? else {
            return Err(SyntaxError::MissingExponent { span: self.span });
        };

        Ok(Node::new(
            NodeKind::HexadecimalFloatLiteral,
            vec![
                prefix,
                Node::new(NodeKind::HexadecimalMantissa, mantissa),
                exponent,
            ],
        ))
    }

    fn exponent(&mut self, base: DigitBase, kind: NodeKind) -> Result<Option<Node>, SyntaxError> {
        let marker = match self.chars.peek() {
            Unit::Element(c) if base.is_exponent_marker(c) => c,
            _ => return Ok(None),
        };
        self.chars.advance();

        let mut children = vec![Node::terminal(marker)];
        if let Unit::Element(sign @ ('+' | '-')) = self.chars.peek() {
            self.chars.advance();
            children.push(Node::terminal(sign));
        }
        children.push(self.digits(DigitBase::Decimal, never)?);
        Ok(Some(Node::new(kind, children)))
    }

    fn prefix(&mut self, prefix: &'static str) -> Result<Node, SyntaxError> {
        for _ in prefix.chars() {
            if self.chars.advance().element().is_none() {
                return Err(SyntaxError::MissingDigits { span: self.here() });
            }
        }
        Ok(Node::terminal(prefix))
    }

    /// A run of digits, possibly split by single separators, ending at the
    /// end of the text or before a character accepted by `stop`.
    fn digits(
        &mut self,
        base: DigitBase,
        stop: impl Fn(char) -> bool + Copy,
    ) -> Result<Node, SyntaxError> {
        let mut children = vec![self.digit(base)?];
        loop {
            match self.chars.peek() {
                Unit::Element(c) if !stop(c) => {
                    if c == '_' {
                        self.separator(stop)?;
                        children.push(Node::terminal("_"));
                    }
                    children.push(self.digit(base)?);
                }
                _ => break,
            }
        }
        Ok(Node::new(digits_kind(base), children))
    }

    fn digit(&mut self, base: DigitBase) -> Result<Node, SyntaxError> {
        match self.chars.advance() {
            Unit::Element('_') => Err(SyntaxError::MisplacedSeparator { span: self.here() }),
            Unit::Element(c) if base.accepts(c) => {
                Ok(Node::wrap(digit_kind(base), Node::terminal(c)))
            }
            Unit::Element(c) => Err(SyntaxError::InvalidDigit {
                ch: c,
                base,
                span: self.here(),
            }),
            Unit::Begin | Unit::End => Err(SyntaxError::MissingDigits { span: self.here() }),
        }
    }

    /// Consumes a `_`, which must be followed by another digit.
    fn separator(&mut self, stop: impl Fn(char) -> bool) -> Result<(), SyntaxError> {
        self.chars.advance();
        let span = self.here();
        match self.chars.peek() {
            Unit::Element(c) if c != '_' && !stop(c) => Ok(()),
            _ => Err(SyntaxError::MisplacedSeparator { span }),
        }
    }

    fn finish(&mut self) -> Result<(), SyntaxError> {
        match self.chars.advance() {
            Unit::Element(ch) => Err(SyntaxError::InvalidDigit {
                ch,
                base: DigitBase::Decimal,
                span: self.here(),
            }),
            Unit::Begin | Unit::End => Ok(()),
        }
    }

    fn peek_is(&self, expected: char) -> bool {
        self.chars.peek() == Unit::Element(expected)
    }

    /// Span of the character most recently consumed, or an empty span at the
    /// end of the literal.
    fn here(&self) -> SourceSpan {
        let origin = self.span.offset();
        match self.chars.offset() {
            Some(index) if index < self.chars.len() => SourceSpan::from((origin + index, 1)),
            _ => SourceSpan::from((origin + self.chars.len(), 0)),
        }
    }
}
