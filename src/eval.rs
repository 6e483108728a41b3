use std::fmt::{self, Display};

use miette::Diagnostic;
use thiserror::Error;

use crate::{
    parse::Operator,
    scope::{BaseType, Mutability, Symbol},
    tree::{Node, NodeKind},
};

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum SemanticError {
    #[error("`{id}` is already declared")]
    #[diagnostic(code(semantic::redeclared))]
    Redeclared { id: String },

    #[error("`{id}` is not declared")]
    #[diagnostic(code(semantic::undeclared), help("declare it first with `val` or `var`"))]
    Undeclared { id: String },

    #[error("`{id}` is used before it has a value")]
    #[diagnostic(code(semantic::unassigned))]
    Unassigned { id: String },

    #[error("cannot assign to constant `{id}`")]
    #[diagnostic(code(semantic::assign_to_constant), help("declare it with `var` to allow assignment"))]
    AssignToConstant { id: String },

    #[error("`{id}` is {expected}, but the value is {found}")]
    #[diagnostic(code(semantic::type_mismatch), help("values are never converted implicitly"))]
    TypeMismatch {
        id: String,
        expected: BaseType,
        found: BaseType,
    },

    #[error("unknown type `{name}`")]
    #[diagnostic(code(semantic::unknown_type), help("the known types are `Integer` and `Double`"))]
    UnknownType { name: String },

    #[error("`{id}` needs a type annotation or an initial value")]
    #[diagnostic(code(semantic::missing_type_and_value))]
    MissingTypeAndValue { id: String },

    #[error("integer overflow in `{expression}`")]
    #[diagnostic(code(semantic::overflow))]
    Overflow { expression: String },

    #[error("integer division by zero in `{expression}`")]
    #[diagnostic(code(semantic::division_by_zero))]
    DivisionByZero { expression: String },

    #[error("malformed syntax tree: expected {expected} under {within}")]
    #[diagnostic(code(semantic::malformed))]
    Malformed { expected: NodeKind, within: NodeKind },
}

/// Result of evaluating an expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Integer(i64),
    Double(f64),
}

impl Value {
    pub fn base_type(self) -> BaseType {
        match self {
            Value::Integer(_) => BaseType::Integer,
            Value::Double(_) => BaseType::Double,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Value::Integer(n) => n as f64,
            Value::Double(n) => n,
        }
    }

    /// Two integers stay integer; anything else is widened to double.
    pub fn apply(self, op: Operator, rhs: Value) -> Result<Value, SemanticError> {
        let (Value::Integer(l), Value::Integer(r)) = (self, rhs) else {
            let (l, r) = (self.as_f64(), rhs.as_f64());
            return Ok(Value::Double(match op {
                Operator::Addition => l + r,
                Operator::Subtraction => l - r,
                Operator::Multiplication => l * r,
                Operator::Division => l / r,
            }));
        };

        let expression = || format!("{l} {op} {r}");
        let result = match op {
            Operator::Addition => l.checked_add(r),
            Operator::Subtraction => l.checked_sub(r),
            Operator::Multiplication => l.checked_mul(r),
            Operator::Division if r == 0 => {
                return Err(SemanticError::DivisionByZero {
                    expression: expression(),
                });
            }
            Operator::Division => l.checked_div(r),
        };
        result.map(Value::Integer).ok_or_else(|| SemanticError::Overflow {
            expression: expression(),
        })
    }

    pub fn negate(self) -> Result<Value, SemanticError> {
        match self {
            Value::Integer(n) => n
                .checked_neg()
                .map(Value::Integer)
                .ok_or_else(|| SemanticError::Overflow {
                    expression: format!("-{n}"),
                }),
            Value::Double(n) => Ok(Value::Double(-n)),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::Double(n) if n.is_finite() && *n == n.trunc() => write!(f, "{n}.0"),
            Value::Double(n) => write!(f, "{n}"),
        }
    }
}

/// What the evaluator may do to the symbols it runs against.
pub trait Scope {
    /// Fails if a symbol with the same id exists.
    fn declare(&mut self, symbol: Symbol) -> Result<(), SemanticError>;

    /// Fails if `id` is absent or has no value yet.
    fn read(&self, id: &str) -> Result<Value, SemanticError>;

    /// Fails if `id` is absent or constant.
    fn mutate(&mut self, id: &str, value: Value) -> Result<(), SemanticError>;
}

/// Executes one statement against `scope`.
pub fn evaluate(tree: &Node, scope: &mut impl Scope) -> Result<(), SemanticError> {
    if tree.kind() != NodeKind::Statement {
        return Err(malformed(NodeKind::Statement, tree));
    }
    if let Some(declaration) = tree.child(NodeKind::Declaration) {
        declare(declaration, scope)
    } else {
        let simple = required(tree, NodeKind::SimpleStatement)?;
        assign(required(simple, NodeKind::AssignmentStatement)?, scope)
    }
}

fn declare(declaration: &Node, scope: &mut impl Scope) -> Result<(), SemanticError> {
    let (mutability, specification) =
        if let Some(constant) = declaration.child(NodeKind::ConstantDeclaration) {
            (
                Mutability::Constant,
                required(constant, NodeKind::ConstantSpecification)?,
            )
        } else {
            let variable = required(declaration, NodeKind::VariableDeclaration)?;
            (
                Mutability::Variable,
                required(variable, NodeKind::VariableSpecification)?,
            )
        };

    // only the first identifier of a list is bound
    let list = required(specification, NodeKind::IdentifierList)?;
    let id = required(list, NodeKind::Identifier)?.joined();

    let annotation = specification
        .child(NodeKind::Type)
        .map(resolve_type)
        .transpose()?;
    let value = specification
        .child(NodeKind::Expression)
        .map(|expression| evaluate_expression(expression, &*scope))
        .transpose()?;

    let base_type = match (annotation, value) {
        (Some(expected), Some(value)) if value.base_type() != expected => {
            return Err(SemanticError::TypeMismatch {
                id,
                expected,
                found: value.base_type(),
            });
        }
        (Some(expected), _) => expected,
        (None, Some(value)) => value.base_type(),
        (None, None) => return Err(SemanticError::MissingTypeAndValue { id }),
    };

    scope.declare(Symbol {
        id,
        base_type,
        mutability,
        value,
    })
}

fn assign(assignment: &Node, scope: &mut impl Scope) -> Result<(), SemanticError> {
    let id = required(assignment, NodeKind::Identifier)?.joined();
    let value = evaluate_expression(required(assignment, NodeKind::Expression)?, &*scope)?;
    scope.mutate(&id, value)
}

fn resolve_type(ty: &Node) -> Result<BaseType, SemanticError> {
    let name = required(required(ty, NodeKind::TypeName)?, NodeKind::Identifier)?.joined();
    BaseType::from_name(&name).ok_or(SemanticError::UnknownType { name })
}

/// Left operands nest, so the left spine is walked with a loop and folded
/// back up in source order.
fn evaluate_expression(expression: &Node, scope: &impl Scope) -> Result<Value, SemanticError> {
    let mut pending = Vec::new();
    let mut node = expression;
    let unary = loop {
        match node.children() {
            [lhs, op, rhs] => {
                pending.push((node, op, rhs));
                node = lhs;
            }
            [unary] if unary.kind() == NodeKind::UnaryExpression => break unary,
            _ => return Err(malformed(NodeKind::UnaryExpression, node)),
        }
    };

    let mut value = evaluate_unary(unary, scope)?;
    for (node, op, rhs) in pending.into_iter().rev() {
        let rhs = evaluate_expression(rhs, scope)?;
        let op = Operator::from_symbol(&op.joined())
            .ok_or_else(|| malformed(NodeKind::BinaryOperator, node))?;
        value = value.apply(op, rhs)?;
    }
    Ok(value)
}

fn evaluate_unary(unary: &Node, scope: &impl Scope) -> Result<Value, SemanticError> {
    let primary = required(unary, NodeKind::PrimaryExpression)?;
    let value = evaluate_operand(required(primary, NodeKind::Operand)?, scope)?;

    let Some(op) = unary.child(NodeKind::UnaryOperator) else {
        return Ok(value);
    };
    match Operator::from_symbol(&op.joined()) {
        Some(Operator::Addition) => Ok(value),
        Some(Operator::Subtraction) => value.negate(),
        _ => Err(malformed(NodeKind::UnaryOperator, unary)),
    }
}

fn evaluate_operand(operand: &Node, scope: &impl Scope) -> Result<Value, SemanticError> {
    if let Some(literal) = operand.child(NodeKind::Literal) {
        let basic = required(literal, NodeKind::BasicLiteral)?;
        return match basic.child(NodeKind::IntegerLiteral) {
            Some(integer) => integer_value(integer),
            None => float_value(required(basic, NodeKind::FloatLiteral)?),
        };
    }
    if let Some(name) = operand.child(NodeKind::OperandName) {
        let id = required(name, NodeKind::Identifier)?.joined();
        return scope.read(&id);
    }
    // parenthesized
    evaluate_expression(required(operand, NodeKind::Expression)?, scope)
}

fn integer_value(integer: &Node) -> Result<Value, SemanticError> {
    let literal = integer
        .children()
        .first()
        .ok_or_else(|| malformed(NodeKind::DecimalLiteral, integer))?;
    let (radix, digits) = match literal.kind() {
        NodeKind::DecimalLiteral => (10, literal.joined()),
        NodeKind::BinaryLiteral => (2, required(literal, NodeKind::BinaryDigits)?.joined()),
        NodeKind::OctalLiteral => (8, required(literal, NodeKind::OctalDigits)?.joined()),
        NodeKind::HexadecimalLiteral => (
            16,
            required(literal, NodeKind::HexadecimalDigits)?.joined(),
        ),
        _ => return Err(malformed(NodeKind::DecimalLiteral, integer)),
    };

    let mut value: i64 = 0;
    for c in digits.chars().filter(|&c| c != '_') {
        let digit = c
            .to_digit(radix)
            .ok_or_else(|| malformed(NodeKind::DecimalDigit, literal))?;
        value = value
            .checked_mul(i64::from(radix))
            .and_then(|value| value.checked_add(i64::from(digit)))
            .ok_or_else(|| SemanticError::Overflow {
                expression: integer.joined(),
            })?;
    }
    Ok(Value::Integer(value))
}

fn float_value(float: &Node) -> Result<Value, SemanticError> {
    if let Some(decimal) = float.child(NodeKind::DecimalFloatLiteral) {
        let text: String = decimal.joined().chars().filter(|&c| c != '_').collect();
        return text
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|_| malformed(NodeKind::DecimalFloatLiteral, float));
    }

    let hexadecimal = required(float, NodeKind::HexadecimalFloatLiteral)?;
    let mantissa = required(hexadecimal, NodeKind::HexadecimalMantissa)?;
    let mut parts = mantissa
        .children()
        .iter()
        .filter(|child| child.kind() == NodeKind::HexadecimalDigits)
        .map(hex_digits);
    let whole = parts
        .next()
        .ok_or_else(|| malformed(NodeKind::HexadecimalDigits, mantissa))??;
    let fraction = parts.next().transpose()?.unwrap_or_default();

    let mut value = whole.iter().fold(0.0, |acc, &d| acc * 16.0 + f64::from(d));
    let mut scale = 1.0 / 16.0;
    for d in fraction {
        value += f64::from(d) * scale;
        scale /= 16.0;
    }

    let exponent = required(hexadecimal, NodeKind::HexadecimalExponent)?;
    let digits: String = required(exponent, NodeKind::DecimalDigits)?
        .joined()
        .chars()
        .filter(|&c| c != '_')
        .collect();
    let magnitude = digits.parse::<i32>().map_err(|_| SemanticError::Overflow {
        expression: hexadecimal.joined(),
    })?;
    let negative = exponent
        .children()
        .iter()
        .any(|child| child.text() == Some("-"));
    let exponent = if negative { -magnitude } else { magnitude };

    Ok(Value::Double(value * 2f64.powi(exponent)))
}

fn hex_digits(digits: &Node) -> Result<Vec<u32>, SemanticError> {
    digits
        .joined()
        .chars()
        .filter(|&c| c != '_')
        .map(|c| {
            c.to_digit(16)
                .ok_or_else(|| malformed(NodeKind::HexadecimalDigit, digits))
        })
        .collect()
}

fn required(node: &Node, kind: NodeKind) -> Result<&Node, SemanticError> {
    node.child(kind).ok_or_else(|| malformed(kind, node))
}

fn malformed(expected: NodeKind, within: &Node) -> SemanticError {
    SemanticError::Malformed {
        expected,
        within: within.kind(),
    }
}
