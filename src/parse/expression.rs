use crate::{
    lex::{LiteralKind, Punctuator, Token, TokenKind},
    tree::{Node, NodeKind},
};

use super::{Operator, Parser, PrecedenceGroup, SyntaxError, unexpected};

impl Parser {
    pub(super) fn parse_expression(&mut self) -> Result<Node, SyntaxError> {
        self.parse_expression_within(0)
    }

    fn parse_expression_within(&mut self, min_bp: u8) -> Result<Node, SyntaxError> {
        let unary = self.parse_unary_expression()?;
        let mut lhs = Node::wrap(NodeKind::Expression, unary);

        loop {
            let Some(op) = self.peek_binary_operator() else {
                break;
            };
            let (l_bp, r_bp) = op.precedence_group().binding_power();
            if l_bp < min_bp {
                break;
            }
            self.next();

            let rhs = self.parse_expression_within(r_bp)?;
            lhs = Node::new(
                NodeKind::Expression,
                vec![lhs, binary_operator(op), rhs],
            );
        }

        Ok(lhs)
    }

    fn peek_binary_operator(&self) -> Option<Operator> {
        match self.peek()?.kind {
            TokenKind::Punctuator(punctuator) => Operator::from_punctuator(punctuator),
            _ => None,
        }
    }

    fn parse_unary_expression(&mut self) -> Result<Node, SyntaxError> {
        let mut children = Vec::new();
        if let Some(op) = self.peek_binary_operator() {
            if op.is_unary() {
                self.next();
                children.push(Node::wrap(
                    NodeKind::UnaryOperator,
                    Node::terminal(op.symbol()),
                ));
            }
        }

        let operand = self.parse_operand()?;
        children.push(Node::wrap(NodeKind::PrimaryExpression, operand));
        Ok(Node::new(NodeKind::UnaryExpression, children))
    }

    fn parse_operand(&mut self) -> Result<Node, SyntaxError> {
        let token = self.expect_next("an operand")?;
        match token.kind {
            TokenKind::Literal(ref literal) => match literal.kind {
                LiteralKind::Integer(base) => {
                    let literal = self.parse_integer_literal(&literal.text, base, token.span)?;
                    Ok(Node::wrap(NodeKind::Operand, literal))
                }
                LiteralKind::Float(base) => {
                    let literal = self.parse_float_literal(&literal.text, base, token.span)?;
                    Ok(Node::wrap(NodeKind::Operand, literal))
                }
                LiteralKind::Character => Err(SyntaxError::NonNumericLiteral {
                    what: "character",
                    span: token.span,
                }),
                LiteralKind::String => Err(SyntaxError::NonNumericLiteral {
                    what: "string",
                    span: token.span,
                }),
            },
            TokenKind::Identifier(_) => {
                self.put_back(token)?;
                let name = self.parse_identifier()?;
                Ok(Node::wrap(
                    NodeKind::Operand,
                    Node::wrap(NodeKind::OperandName, name),
                ))
            }
            TokenKind::Punctuator(Punctuator::LeftParen) => self.parse_parenthesized(token),
            TokenKind::Punctuator(Punctuator::RightParen) => {
                Err(SyntaxError::UnbalancedParentheses { span: token.span })
            }
            _ => {
                let error = unexpected(&token, "an operand");
                self.put_back(token)?;
                Err(error)
            }
        }
    }

    /// `open` has been consumed. The enclosed tokens are parsed on their own
    /// and must form exactly one expression.
    fn parse_parenthesized(&mut self, open: Token) -> Result<Node, SyntaxError> {
        let mut inner = Vec::new();
        let mut depth = 0usize;
        let close = loop {
            let Some(token) = self.next() else {
                return Err(SyntaxError::UnbalancedParentheses { span: open.span });
            };
            match token.kind {
                TokenKind::Punctuator(Punctuator::LeftParen) => depth += 1,
                TokenKind::Punctuator(Punctuator::RightParen) if depth == 0 => break token,
                TokenKind::Punctuator(Punctuator::RightParen) => depth -= 1,
                _ => {}
            }
            inner.push(token);
        };

        let mut enclosed = Parser::with_end(inner, close.span.offset());
        let expression = enclosed.parse_expression()?;
        enclosed.expect_exhausted()?;

        Ok(Node::new(
            NodeKind::Operand,
            vec![Node::terminal("("), expression, Node::terminal(")")],
        ))
    }
}

fn binary_operator(op: Operator) -> Node {
    let group = match op.precedence_group() {
        PrecedenceGroup::Addition => NodeKind::AdditionGroupOperator,
        PrecedenceGroup::Multiplication => NodeKind::MultiplicationGroupOperator,
    };
    Node::wrap(
        NodeKind::BinaryOperator,
        Node::wrap(group, Node::terminal(op.symbol())),
    )
}

#[cfg(test)]
mod tests {
    use super::super::tests::parse_line;
    use crate::tree::{Node, NodeKind};
    use crate::parse::SyntaxError;

    fn expression(line: &str) -> Node {
        let tree = parse_line(line).unwrap();
        let mut found = None;
        tree.walk(&mut |node| {
            if node.kind() == NodeKind::Expression && found.is_none() {
                found = Some(node.clone());
            }
        });
        found.unwrap()
    }

    /// Fully parenthesized rendering of the binary structure.
    fn grouping(node: &Node) -> String {
        match node.children() {
            [lhs, op, rhs] if op.kind() == NodeKind::BinaryOperator => {
                format!("({} {} {})", grouping(lhs), op.joined(), grouping(rhs))
            }
            _ => node.joined(),
        }
    }

    #[test]
    fn multiplication_groups_first() {
        assert_eq!(grouping(&expression("x = 1 + 2 * 3")), "(1 + (2 * 3))");
        assert_eq!(grouping(&expression("x = 1 * 2 + 3")), "((1 * 2) + 3)");
    }

    #[test]
    fn same_precedence_is_left_associative() {
        assert_eq!(grouping(&expression("x = 1 - 2 - 3")), "((1 - 2) - 3)");
        assert_eq!(grouping(&expression("x = 8 / 4 / 2")), "((8 / 4) / 2)");
    }

    #[test]
    fn mixed_chain() {
        assert_eq!(
            grouping(&expression("x = 1 * 2 + 3 + 4 * 5 + 6 * 7")),
            "((((1 * 2) + 3) + (4 * 5)) + (6 * 7))"
        );
    }

    #[test]
    fn parentheses_are_one_operand() {
        assert_eq!(
            grouping(&expression("x = 1 * (2 + 3) + 4 * 5")),
            "((1 * (2+3)) + (4 * 5))"
        );
    }

    #[test]
    fn operator_groups() {
        let tree = expression("x = a * b");
        let operator = tree.child(NodeKind::BinaryOperator).unwrap();
        assert!(operator.child(NodeKind::MultiplicationGroupOperator).is_some());

        let tree = expression("x = a - b");
        let operator = tree.child(NodeKind::BinaryOperator).unwrap();
        assert!(operator.child(NodeKind::AdditionGroupOperator).is_some());
    }

    #[test]
    fn unary_operator() {
        let tree = expression("x = -a");
        let unary = tree.child(NodeKind::UnaryExpression).unwrap();
        assert_eq!(unary.child(NodeKind::UnaryOperator).unwrap().joined(), "-");
        assert!(unary.child(NodeKind::PrimaryExpression).is_some());
    }

    #[test]
    fn unary_operators_do_not_chain() {
        assert!(matches!(
            parse_line("x = --1"),
            Err(SyntaxError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            parse_line("x = *1"),
            Err(SyntaxError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn nested_parentheses() {
        let tree = expression("x = ((1))");
        assert_eq!(tree.joined(), "((1))");
    }

    #[test]
    fn unbalanced_parentheses() {
        for line in ["x = (1", "x = ((1)", "x = 1 + (2 * (3)", "x = )"] {
            assert!(
                matches!(
                    parse_line(line),
                    Err(SyntaxError::UnbalancedParentheses { .. })
                ),
                "{line}"
            );
        }
    }

    #[test]
    fn empty_parentheses() {
        assert!(matches!(
            parse_line("x = ()"),
            Err(SyntaxError::UnexpectedEnd { .. })
        ));
    }

    #[test]
    fn parenthesized_must_be_one_expression() {
        assert!(matches!(
            parse_line("x = (1 2)"),
            Err(SyntaxError::TrailingToken { .. })
        ));
    }

    #[test]
    fn text_literals_are_not_operands() {
        assert!(matches!(
            parse_line("x = 'a'"),
            Err(SyntaxError::NonNumericLiteral { what: "character", .. })
        ));
        assert!(matches!(
            parse_line("x = 1 + \"s\""),
            Err(SyntaxError::NonNumericLiteral { what: "string", .. })
        ));
    }

    #[test]
    fn missing_right_operand() {
        assert!(matches!(
            parse_line("x = 1 +"),
            Err(SyntaxError::UnexpectedEnd { .. })
        ));
    }
}
