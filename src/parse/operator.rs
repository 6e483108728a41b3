use std::fmt::{self, Display};

use crate::lex::Punctuator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Addition,
    Subtraction,
    Multiplication,
    Division,
}

/// Operators of one group share a precedence level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecedenceGroup {
    Addition,
    Multiplication,
}

impl PrecedenceGroup {
    /// Left and right binding power. Left is lower, so equal precedence
    /// associates to the left.
    pub fn binding_power(self) -> (u8, u8) {
        match self {
            PrecedenceGroup::Addition => (1, 2),
            PrecedenceGroup::Multiplication => (3, 4),
        }
    }
}

impl Operator {
    pub fn from_punctuator(punctuator: Punctuator) -> Option<Self> {
        match punctuator {
            Punctuator::Plus => Some(Operator::Addition),
            Punctuator::Minus => Some(Operator::Subtraction),
            Punctuator::Asterisk => Some(Operator::Multiplication),
            Punctuator::Slash => Some(Operator::Division),
            _ => None,
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Operator::Addition),
            "-" => Some(Operator::Subtraction),
            "*" => Some(Operator::Multiplication),
            "/" => Some(Operator::Division),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Addition => "+",
            Operator::Subtraction => "-",
            Operator::Multiplication => "*",
            Operator::Division => "/",
        }
    }

    pub fn precedence_group(self) -> PrecedenceGroup {
        match self {
            Operator::Addition | Operator::Subtraction => PrecedenceGroup::Addition,
            Operator::Multiplication | Operator::Division => PrecedenceGroup::Multiplication,
        }
    }

    /// Only the additive operators double as prefix operators.
    pub fn is_unary(self) -> bool {
        self.precedence_group() == PrecedenceGroup::Addition
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
