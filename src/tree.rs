use std::fmt::{self, Display};

/// Grammar rule a [`Node`] was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    // statements
    Statement,
    SimpleStatement,
    AssignmentStatement,
    // declarations
    Declaration,
    ConstantDeclaration,
    ConstantSpecification,
    VariableDeclaration,
    VariableSpecification,
    // types
    Type,
    TypeName,
    // expressions
    Expression,
    UnaryExpression,
    PrimaryExpression,
    Operand,
    OperandName,
    // operators
    BinaryOperator,
    UnaryOperator,
    AdditionGroupOperator,
    MultiplicationGroupOperator,
    AssignOperator,
    // identifiers
    IdentifierList,
    Identifier,
    // literals
    Literal,
    BasicLiteral,
    IntegerLiteral,
    FloatLiteral,
    DecimalLiteral,
    BinaryLiteral,
    OctalLiteral,
    HexadecimalLiteral,
    DecimalDigits,
    BinaryDigits,
    OctalDigits,
    HexadecimalDigits,
    DecimalFloatLiteral,
    DecimalExponent,
    HexadecimalFloatLiteral,
    HexadecimalMantissa,
    HexadecimalExponent,
    // characters
    Letter,
    DecimalDigit,
    BinaryDigit,
    OctalDigit,
    HexadecimalDigit,
    UnicodeLetter,
    UnicodeDigit,
    /// Raw source text; the only kind that carries text.
    Terminal,
}

impl NodeKind {
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Statement => "Statement",
            NodeKind::SimpleStatement => "SimpleStatement",
            NodeKind::AssignmentStatement => "AssignmentStatement",
            NodeKind::Declaration => "Declaration",
            NodeKind::ConstantDeclaration => "ConstantDeclaration",
            NodeKind::ConstantSpecification => "ConstantSpecification",
            NodeKind::VariableDeclaration => "VariableDeclaration",
            NodeKind::VariableSpecification => "VariableSpecification",
            NodeKind::Type => "Type",
            NodeKind::TypeName => "TypeName",
            NodeKind::Expression => "Expression",
            NodeKind::UnaryExpression => "UnaryExpression",
            NodeKind::PrimaryExpression => "PrimaryExpression",
            NodeKind::Operand => "Operand",
            NodeKind::OperandName => "OperandName",
            NodeKind::BinaryOperator => "BinaryOperator",
            NodeKind::UnaryOperator => "UnaryOperator",
            NodeKind::AdditionGroupOperator => "AdditionGroupOperator",
            NodeKind::MultiplicationGroupOperator => "MultiplicationGroupOperator",
            NodeKind::AssignOperator => "AssignOperator",
            NodeKind::IdentifierList => "IdentifierList",
            NodeKind::Identifier => "Identifier",
            NodeKind::Literal => "Literal",
            NodeKind::BasicLiteral => "BasicLiteral",
            NodeKind::IntegerLiteral => "IntegerLiteral",
            NodeKind::FloatLiteral => "FloatLiteral",
            NodeKind::DecimalLiteral => "DecimalLiteral",
            NodeKind::BinaryLiteral => "BinaryLiteral",
            NodeKind::OctalLiteral => "OctalLiteral",
            NodeKind::HexadecimalLiteral => "HexadecimalLiteral",
            NodeKind::DecimalDigits => "DecimalDigits",
            NodeKind::BinaryDigits => "BinaryDigits",
            NodeKind::OctalDigits => "OctalDigits",
            NodeKind::HexadecimalDigits => "HexadecimalDigits",
            NodeKind::DecimalFloatLiteral => "DecimalFloatLiteral",
            NodeKind::DecimalExponent => "DecimalExponent",
            NodeKind::HexadecimalFloatLiteral => "HexadecimalFloatLiteral",
            NodeKind::HexadecimalMantissa => "HexadecimalMantissa",
            NodeKind::HexadecimalExponent => "HexadecimalExponent",
            NodeKind::Letter => "Letter",
            NodeKind::DecimalDigit => "DecimalDigit",
            NodeKind::BinaryDigit => "BinaryDigit",
            NodeKind::OctalDigit => "OctalDigit",
            NodeKind::HexadecimalDigit => "HexadecimalDigit",
            NodeKind::UnicodeLetter => "UnicodeLetter",
            NodeKind::UnicodeDigit => "UnicodeDigit",
            NodeKind::Terminal => "Terminal",
        }
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Concrete syntax tree node. Children are owned; a finished subtree is never
/// mutated again.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    kind: NodeKind,
    text: Option<String>,
    children: Vec<Node>,
}

impl Node {
    pub fn new(kind: NodeKind, children: Vec<Node>) -> Self {
        Node {
            kind,
            text: None,
            children,
        }
    }

    pub fn wrap(kind: NodeKind, child: Node) -> Self {
        Node::new(kind, vec![child])
    }

    pub fn terminal(text: impl Into<String>) -> Self {
        Node {
            kind: NodeKind::Terminal,
            text: Some(text.into()),
            children: Vec::new(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// First direct child of the given kind.
    pub fn child(&self, kind: NodeKind) -> Option<&Node> {
        self.children.iter().find(|child| child.kind == kind)
    }

    /// Last direct child of the given kind.
    pub fn last_child(&self, kind: NodeKind) -> Option<&Node> {
        self.children.iter().rev().find(|child| child.kind == kind)
    }

    /// Pre-order traversal.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            visit(node);
            pending.extend(node.children.iter().rev());
        }
    }

    /// The source text this node was derived from.
    pub fn joined(&self) -> String {
        let mut joined = String::new();
        self.walk(&mut |node| {
            if let Some(text) = node.text() {
                joined.push_str(text);
            }
        });
        joined
    }
}

// Long operator chains nest deeply; dropping them recursively would overflow
// the stack.
impl Drop for Node {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.text {
            Some(text) => write!(f, "{} \"{text}\"", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// Renders a whole subtree, one node per line:
///
/// ```text
/// Statement
/// └─ Declaration
///    ├─ ...
/// ```
pub struct DisplayTree<'a>(pub &'a Node);

impl Display for DisplayTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        write_children(self.0, "", f)
    }
}

fn write_children(node: &Node, indent: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let count = node.children.len();
    for (index, child) in node.children.iter().enumerate() {
        let last = index + 1 == count;
        let mark = if last { "└─ " } else { "├─ " };
        write!(f, "\n{indent}{mark}{child}")?;

        let guide = if last { "   " } else { "│  " };
        write_children(child, &format!("{indent}{guide}"), f)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joined_concatenates_terminals_in_order() {
        let node = Node::new(
            NodeKind::DecimalLiteral,
            vec![
                Node::wrap(NodeKind::DecimalDigit, Node::terminal("1")),
                Node::terminal("_"),
                Node::new(
                    NodeKind::DecimalDigits,
                    vec![
                        Node::wrap(NodeKind::DecimalDigit, Node::terminal("0")),
                        Node::wrap(NodeKind::DecimalDigit, Node::terminal("0")),
                    ],
                ),
            ],
        );
        assert_eq!(node.joined(), "1_00");
    }

    #[test]
    fn child_lookup() {
        let node = Node::new(
            NodeKind::Expression,
            vec![
                Node::new(NodeKind::Expression, vec![Node::terminal("a")]),
                Node::new(NodeKind::BinaryOperator, vec![Node::terminal("+")]),
                Node::new(NodeKind::Expression, vec![Node::terminal("b")]),
            ],
        );
        assert_eq!(node.child(NodeKind::Expression).unwrap().joined(), "a");
        assert_eq!(node.last_child(NodeKind::Expression).unwrap().joined(), "b");
        assert!(node.child(NodeKind::Literal).is_none());
    }

    #[test]
    fn walk_is_pre_order() {
        let node = Node::new(
            NodeKind::Expression,
            vec![
                Node::wrap(NodeKind::Operand, Node::terminal("a")),
                Node::terminal("+"),
                Node::terminal("b"),
            ],
        );
        let mut kinds = Vec::new();
        node.walk(&mut |node| kinds.push(node.kind()));
        assert_eq!(
            kinds,
            [
                NodeKind::Expression,
                NodeKind::Operand,
                NodeKind::Terminal,
                NodeKind::Terminal,
                NodeKind::Terminal,
            ]
        );
    }

    #[test]
    fn deep_trees_drop() {
        let mut node = Node::terminal("1");
        for _ in 0..200_000 {
            node = Node::wrap(NodeKind::Expression, node);
        }
        drop(node);
    }

    #[test]
    fn dump_single_node() {
        let node = Node::new(NodeKind::Statement, Vec::new());
        assert_eq!(DisplayTree(&node).to_string(), "Statement");
    }

    #[test]
    fn dump_nested() {
        let node = Node::new(
            NodeKind::Statement,
            vec![
                Node::wrap(NodeKind::Declaration, Node::new(NodeKind::Type, Vec::new())),
                Node::wrap(NodeKind::Expression, Node::terminal("1")),
            ],
        );
        let expected = "\
Statement
├─ Declaration
│  └─ Type
└─ Expression
   └─ Terminal \"1\"";
        assert_eq!(DisplayTree(&node).to_string(), expected);
    }
}
