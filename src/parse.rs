mod expression;
mod identifier;
mod literal;
mod operator;

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

pub use operator::{Operator, PrecedenceGroup};

use crate::{
    cursor::{Cursor, CursorError, Unit},
    lex::{DigitBase, Keyword, Punctuator, Token, TokenKind},
    tree::{Node, NodeKind},
};

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum SyntaxError {
    #[error("expected {expected}, found `{found}`")]
    #[diagnostic(code(syntax::unexpected_token))]
    UnexpectedToken {
        found: String,
        expected: &'static str,
        #[label("expected {expected}")]
        span: SourceSpan,
    },

    #[error("expected {expected}, but the statement ended")]
    #[diagnostic(code(syntax::unexpected_end))]
    UnexpectedEnd {
        expected: &'static str,
        #[label("statement ends here")]
        span: SourceSpan,
    },

    #[error("unbalanced parentheses")]
    #[diagnostic(code(syntax::unbalanced_parentheses))]
    UnbalancedParentheses {
        #[label("this parenthesis has no partner")]
        span: SourceSpan,
    },

    #[error("unexpected `{found}` after the end of the statement")]
    #[diagnostic(code(syntax::trailing_token), help("one statement per line"))]
    TrailingToken {
        found: String,
        #[label("not part of the statement")]
        span: SourceSpan,
    },

    #[error("misplaced digit separator")]
    #[diagnostic(
        code(syntax::misplaced_separator),
        help("`_` may only appear between two digits, one at a time")
    )]
    MisplacedSeparator {
        #[label("this underscore")]
        span: SourceSpan,
    },

    #[error("'{ch}' is not a valid {base} digit")]
    #[diagnostic(code(syntax::invalid_digit))]
    InvalidDigit {
        ch: char,
        base: DigitBase,
        #[label("invalid digit")]
        span: SourceSpan,
    },

    #[error("literal is missing its digits")]
    #[diagnostic(code(syntax::missing_digits))]
    MissingDigits {
        #[label("digits expected here")]
        span: SourceSpan,
    },

    #[error("hexadecimal float literal requires an exponent")]
    #[diagnostic(code(syntax::missing_exponent), help("add a binary exponent, e.g. `p0`"))]
    MissingExponent {
        #[label("this literal")]
        span: SourceSpan,
    },

    #[error("{base} float literals are not supported")]
    #[diagnostic(code(syntax::unsupported_float_base))]
    UnsupportedFloatBase {
        base: DigitBase,
        #[label("this literal")]
        span: SourceSpan,
    },

    #[error("{what} literals cannot be used in expressions")]
    #[diagnostic(code(syntax::non_numeric_literal))]
    NonNumericLiteral {
        what: &'static str,
        #[label("this literal")]
        span: SourceSpan,
    },

    #[error("'{ch}' cannot appear in an identifier")]
    #[diagnostic(code(syntax::invalid_identifier))]
    InvalidIdentifier {
        ch: char,
        #[label("this identifier")]
        span: SourceSpan,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Cursor(#[from] CursorError),
}

/// Builds the concrete syntax tree of one statement.
pub fn parse(tokens: Vec<Token>) -> Result<Node, SyntaxError> {
    Parser::new(tokens).parse()
}

pub struct Parser {
    tokens: Cursor<Token>,
    end: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let end = tokens
            .last()
            .map_or(0, |token| token.span.offset() + token.span.len());
        Parser::with_end(tokens, end)
    }

    /// `end` is the byte offset reported when the tokens run out.
    fn with_end(tokens: Vec<Token>, end: usize) -> Self {
        Parser {
            tokens: Cursor::new(tokens),
            end,
        }
    }

    pub fn parse(mut self) -> Result<Node, SyntaxError> {
        let statement = self.parse_statement()?;
        self.expect_exhausted()?;
        Ok(statement)
    }

    fn parse_statement(&mut self) -> Result<Node, SyntaxError> {
        let child = match self.peek() {
            Some(Token {
                kind: TokenKind::Keyword(_),
                ..
            }) => self.parse_declaration()?,
            Some(Token {
                kind: TokenKind::Identifier(_),
                ..
            }) => self.parse_simple_statement()?,
            Some(token) => return Err(unexpected(&token, "a declaration or an assignment")),
            None => return Err(self.unexpected_end("a declaration or an assignment")),
        };
        Ok(Node::wrap(NodeKind::Statement, child))
    }

    fn parse_declaration(&mut self) -> Result<Node, SyntaxError> {
        let token = self.expect_next("`val` or `var`")?;
        let TokenKind::Keyword(keyword) = token.kind else {
            let error = unexpected(&token, "`val` or `var`");
            self.put_back(token)?;
            return Err(error);
        };

        let (declaration, specification) = match keyword {
            Keyword::Val => (
                NodeKind::ConstantDeclaration,
                NodeKind::ConstantSpecification,
            ),
            Keyword::Var => (
                NodeKind::VariableDeclaration,
                NodeKind::VariableSpecification,
            ),
        };
        let specification = self.parse_specification(specification)?;
        let declaration = Node::new(
            declaration,
            vec![Node::terminal(keyword.as_str()), specification],
        );
        Ok(Node::wrap(NodeKind::Declaration, declaration))
    }

    fn parse_specification(&mut self, kind: NodeKind) -> Result<Node, SyntaxError> {
        let mut children = vec![self.parse_identifier_list()?];

        if self.eat(Punctuator::Colon)?.is_some() {
            children.push(Node::terminal(":"));
            children.push(self.parse_type()?);
        }
        if self.eat(Punctuator::Equal)?.is_some() {
            children.push(Node::terminal("="));
            children.push(self.parse_expression()?);
        }

        Ok(Node::new(kind, children))
    }

    fn parse_simple_statement(&mut self) -> Result<Node, SyntaxError> {
        let assignment = self.parse_assignment()?;
        Ok(Node::wrap(NodeKind::SimpleStatement, assignment))
    }

    fn parse_assignment(&mut self) -> Result<Node, SyntaxError> {
        let identifier = self.parse_identifier()?;
        let operator = self.parse_assign_operator()?;
        let expression = self.parse_expression()?;
        Ok(Node::new(
            NodeKind::AssignmentStatement,
            vec![identifier, operator, expression],
        ))
    }

    fn next(&mut self) -> Option<Token> {
        self.tokens.advance().element()
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.peek().element()
    }

    fn put_back(&mut self, token: Token) -> Result<(), SyntaxError> {
        self.tokens.push_back(Unit::Element(token))?;
        Ok(())
    }

    fn expect_next(&mut self, expected: &'static str) -> Result<Token, SyntaxError> {
        self.next().ok_or_else(|| self.unexpected_end(expected))
    }

    /// Consumes the next token only if it is `punctuator`.
    fn eat(&mut self, punctuator: Punctuator) -> Result<Option<Token>, SyntaxError> {
        let Some(token) = self.next() else {
            self.tokens.push_back(Unit::End)?;
            return Ok(None);
        };
        if token.kind == TokenKind::Punctuator(punctuator) {
            Ok(Some(token))
        } else {
            self.put_back(token)?;
            Ok(None)
        }
    }

    fn expect_exhausted(&mut self) -> Result<(), SyntaxError> {
        match self.next() {
            None => Ok(()),
            Some(token) if token.kind == TokenKind::Punctuator(Punctuator::RightParen) => {
                Err(SyntaxError::UnbalancedParentheses { span: token.span })
            }
            Some(token) => Err(SyntaxError::TrailingToken {
                found: token.kind.lexeme(),
                span: token.span,
            }),
        }
    }

    fn unexpected_end(&self, expected: &'static str) -> SyntaxError {
        SyntaxError::UnexpectedEnd {
            expected,
            span: SourceSpan::from((self.end, 0)),
        }
    }
}

fn unexpected(token: &Token, expected: &'static str) -> SyntaxError {
    SyntaxError::UnexpectedToken {
        found: token.kind.lexeme(),
        expected,
        span: token.span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lex::lex, tree::DisplayTree};

    pub(super) fn parse_line(line: &str) -> Result<Node, SyntaxError> {
        parse(lex(line).expect("line should lex"))
    }

    #[test]
    fn terminals_reproduce_the_statement() {
        for line in [
            "val value: Integer = 1",
            "var x = 1 + 2 * (3 - y)",
            "val a, b: Double",
            "x = -0x1F + 0b1_0 / 0o7",
            "var f = 0xF.Fp+1 * 1.5e-3",
        ] {
            let tree = parse_line(line).unwrap();
            let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
            assert_eq!(tree.joined(), compact, "{line}");
        }
    }

    #[test]
    fn constant_declaration_shape() {
        let tree = parse_line("val v: Integer").unwrap();
        let expected = "\
Statement
└─ Declaration
   └─ ConstantDeclaration
      ├─ Terminal \"val\"
      └─ ConstantSpecification
         ├─ IdentifierList
         │  └─ Identifier
         │     └─ Letter
         │        └─ UnicodeLetter
         │           └─ Terminal \"v\"
         ├─ Terminal \":\"
         └─ Type
            └─ TypeName
               └─ Identifier
                  ├─ Letter
                  │  └─ UnicodeLetter
                  │     └─ Terminal \"I\"
                  ├─ Letter
                  │  └─ UnicodeLetter
                  │     └─ Terminal \"n\"
                  ├─ Letter
                  │  └─ UnicodeLetter
                  │     └─ Terminal \"t\"
                  ├─ Letter
                  │  └─ UnicodeLetter
                  │     └─ Terminal \"e\"
                  ├─ Letter
                  │  └─ UnicodeLetter
                  │     └─ Terminal \"g\"
                  ├─ Letter
                  │  └─ UnicodeLetter
                  │     └─ Terminal \"e\"
                  └─ Letter
                     └─ UnicodeLetter
                        └─ Terminal \"r\"";
        assert_eq!(DisplayTree(&tree).to_string(), expected);
    }

    #[test]
    fn variable_declaration_kinds() {
        let tree = parse_line("var v = 1").unwrap();
        let declaration = tree.child(NodeKind::Declaration).unwrap();
        let variable = declaration.child(NodeKind::VariableDeclaration).unwrap();
        let specification = variable.child(NodeKind::VariableSpecification).unwrap();
        assert!(specification.child(NodeKind::Type).is_none());
        assert_eq!(
            specification.child(NodeKind::Expression).unwrap().joined(),
            "1"
        );
    }

    #[test]
    fn declaration_without_annotation_or_initializer_parses() {
        assert!(parse_line("val v").is_ok());
    }

    #[test]
    fn identifier_list() {
        let tree = parse_line("val x, y, z: Integer").unwrap();
        let mut identifiers = Vec::new();
        tree.walk(&mut |node| {
            if node.kind() == NodeKind::IdentifierList {
                identifiers.extend(
                    node.children()
                        .iter()
                        .filter(|child| child.kind() == NodeKind::Identifier)
                        .map(Node::joined),
                );
            }
        });
        assert_eq!(identifiers, ["x", "y", "z"]);
    }

    #[test]
    fn assignment_shape() {
        let tree = parse_line("x = 2").unwrap();
        let assignment = tree
            .child(NodeKind::SimpleStatement)
            .and_then(|simple| simple.child(NodeKind::AssignmentStatement))
            .unwrap();
        let kinds: Vec<_> = assignment.children().iter().map(Node::kind).collect();
        assert_eq!(
            kinds,
            [
                NodeKind::Identifier,
                NodeKind::AssignOperator,
                NodeKind::Expression
            ]
        );
    }

    #[test]
    fn statement_must_start_with_keyword_or_identifier() {
        assert!(matches!(
            parse_line("1 = x"),
            Err(SyntaxError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            parse(Vec::new()),
            Err(SyntaxError::UnexpectedEnd { .. })
        ));
    }

    #[test]
    fn missing_pieces() {
        assert!(matches!(
            parse_line("x ="),
            Err(SyntaxError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            parse_line("x 1"),
            Err(SyntaxError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            parse_line("val : Integer"),
            Err(SyntaxError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            parse_line("val x:"),
            Err(SyntaxError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            parse_line("val x, = 1"),
            Err(SyntaxError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn trailing_tokens() {
        assert!(matches!(
            parse_line("val x = 1 2"),
            Err(SyntaxError::TrailingToken { .. })
        ));
        assert!(matches!(
            parse_line("val x: Integer;"),
            Err(SyntaxError::TrailingToken { .. })
        ));
        assert!(matches!(
            parse_line("x = 1)"),
            Err(SyntaxError::UnbalancedParentheses { .. })
        ));
    }

    #[test]
    fn unexpected_token_points_at_the_token() {
        let Err(SyntaxError::UnexpectedToken { found, span, .. }) = parse_line("val x = *") else {
            panic!("expected an unexpected token error");
        };
        assert_eq!(found, "*");
        assert_eq!(span, SourceSpan::from(8..9));
    }
}
