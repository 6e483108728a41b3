use crate::{
    lex::{Punctuator, Token, TokenKind},
    tree::{Node, NodeKind},
};

use super::{Parser, SyntaxError, unexpected};

impl Parser {
    pub(super) fn parse_identifier_list(&mut self) -> Result<Node, SyntaxError> {
        let mut children = vec![self.parse_identifier()?];
        while self.eat(Punctuator::Comma)?.is_some() {
            children.push(Node::terminal(","));
            children.push(self.parse_identifier()?);
        }
        Ok(Node::new(NodeKind::IdentifierList, children))
    }

    pub(super) fn parse_identifier(&mut self) -> Result<Node, SyntaxError> {
        let token = self.expect_next("an identifier")?;
        let Token {
            kind: TokenKind::Identifier(name),
            span,
        } = &token
        else {
            let error = unexpected(&token, "an identifier");
            self.put_back(token)?;
            return Err(error);
        };

        let children = name
            .chars()
            .map(|c| match c {
                '_' => Ok(Node::wrap(NodeKind::Letter, Node::terminal("_"))),
                c if c.is_alphabetic() => Ok(Node::wrap(
                    NodeKind::Letter,
                    Node::wrap(NodeKind::UnicodeLetter, Node::terminal(c)),
                )),
                c if c.is_ascii_digit() => Ok(Node::wrap(NodeKind::UnicodeDigit, Node::terminal(c))),
                c => Err(SyntaxError::InvalidIdentifier { ch: c, span: *span }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Node::new(NodeKind::Identifier, children))
    }

    pub(super) fn parse_type(&mut self) -> Result<Node, SyntaxError> {
        let name = self.parse_identifier()?;
        Ok(Node::wrap(
            NodeKind::Type,
            Node::wrap(NodeKind::TypeName, name),
        ))
    }

    pub(super) fn parse_assign_operator(&mut self) -> Result<Node, SyntaxError> {
        let token = self.expect_next("`=`")?;
        if token.kind != TokenKind::Punctuator(Punctuator::Equal) {
            let error = unexpected(&token, "`=`");
            self.put_back(token)?;
            return Err(error);
        }
        Ok(Node::wrap(NodeKind::AssignOperator, Node::terminal("=")))
    }
}

#[cfg(test)]
mod tests {
    use miette::SourceSpan;

    use super::super::tests::parse_line;
    use crate::{
        lex::{Punctuator, Token, TokenKind},
        parse::{SyntaxError, parse},
        tree::{DisplayTree, NodeKind},
    };

    #[test]
    fn identifier_characters() {
        let tree = parse_line("_a1 = 0").unwrap();
        let mut identifier = None;
        tree.walk(&mut |node| {
            if node.kind() == NodeKind::Identifier && identifier.is_none() {
                identifier = Some(node);
            }
        });
        let expected = "\
Identifier
├─ Letter
│  └─ Terminal \"_\"
├─ Letter
│  └─ UnicodeLetter
│     └─ Terminal \"a\"
└─ UnicodeDigit
   └─ Terminal \"1\"";
        assert_eq!(DisplayTree(identifier.unwrap()).to_string(), expected);
    }

    #[test]
    fn unicode_identifiers() {
        let tree = parse_line("val größe = 1").unwrap();
        assert_eq!(tree.joined(), "valgröße=1");
    }

    #[test]
    fn only_ascii_digits_continue_an_identifier() {
        let tokens = vec![
            Token {
                kind: TokenKind::Identifier("a٣".into()),
                span: SourceSpan::from(0..3),
            },
            Token {
                kind: TokenKind::Punctuator(Punctuator::Equal),
                span: SourceSpan::from(4..5),
            },
        ];
        assert!(matches!(
            parse(tokens),
            Err(SyntaxError::InvalidIdentifier { ch: '٣', .. })
        ));
    }

    #[test]
    fn list_keeps_separators() {
        let tree = parse_line("var a, b").unwrap();
        let mut list = None;
        tree.walk(&mut |node| {
            if node.kind() == NodeKind::IdentifierList {
                list = Some(node.joined());
            }
        });
        assert_eq!(list.as_deref(), Some("a,b"));
    }
}
