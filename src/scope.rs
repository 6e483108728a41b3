use std::fmt::{self, Display};

use crate::eval::{Scope, SemanticError, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseType {
    Integer,
    Double,
}

impl BaseType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Integer" => Some(BaseType::Integer),
            "Double" => Some(BaseType::Double),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BaseType::Integer => "Integer",
            BaseType::Double => "Double",
        }
    }
}

impl Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    /// Declared with `val`.
    Constant,
    /// Declared with `var`.
    Variable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub id: String,
    pub base_type: BaseType,
    pub mutability: Mutability,
    pub value: Option<Value>,
}

impl Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.base_type)?;
        if let Some(value) = self.value {
            write!(f, " = {value}")?;
        }
        Ok(())
    }
}

/// Symbols in declaration order.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn get(&self, id: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|symbol| symbol.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Symbol> {
        self.symbols.iter_mut().find(|symbol| symbol.id == id)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl Scope for SymbolTable {
    fn declare(&mut self, symbol: Symbol) -> Result<(), SemanticError> {
        if self.get(&symbol.id).is_some() {
            return Err(SemanticError::Redeclared { id: symbol.id });
        }
        self.symbols.push(symbol);
        Ok(())
    }

    fn read(&self, id: &str) -> Result<Value, SemanticError> {
        let symbol = self.get(id).ok_or_else(|| SemanticError::Undeclared {
            id: id.to_string(),
        })?;
        symbol.value.ok_or_else(|| SemanticError::Unassigned {
            id: id.to_string(),
        })
    }

    fn mutate(&mut self, id: &str, value: Value) -> Result<(), SemanticError> {
        let symbol = self.get_mut(id).ok_or_else(|| SemanticError::Undeclared {
            id: id.to_string(),
        })?;
        if symbol.mutability == Mutability::Constant {
            return Err(SemanticError::AssignToConstant {
                id: id.to_string(),
            });
        }
        symbol.value = Some(value);
        Ok(())
    }
}

impl Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symbol in &self.symbols {
            writeln!(f, "{symbol}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(id: &str, mutability: Mutability, value: Option<Value>) -> Symbol {
        Symbol {
            id: id.to_string(),
            base_type: value.map_or(BaseType::Integer, Value::base_type),
            mutability,
            value,
        }
    }

    #[test]
    fn keeps_declaration_order() {
        let mut table = SymbolTable::new();
        for id in ["c", "a", "b"] {
            table
                .declare(symbol(id, Mutability::Constant, Some(Value::Integer(1))))
                .unwrap();
        }
        let ids: Vec<_> = table.symbols().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn declare_twice() {
        let mut table = SymbolTable::new();
        table.declare(symbol("x", Mutability::Variable, None)).unwrap();
        assert_eq!(
            table.declare(symbol("x", Mutability::Constant, None)),
            Err(SemanticError::Redeclared { id: "x".into() })
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn read_requires_a_value() {
        let mut table = SymbolTable::new();
        assert!(table.is_empty());
        table.declare(symbol("x", Mutability::Variable, None)).unwrap();
        assert_eq!(
            table.read("x"),
            Err(SemanticError::Unassigned { id: "x".into() })
        );
        assert_eq!(
            table.read("y"),
            Err(SemanticError::Undeclared { id: "y".into() })
        );
        table.mutate("x", Value::Integer(4)).unwrap();
        assert_eq!(table.read("x"), Ok(Value::Integer(4)));
    }

    #[test]
    fn constants_reject_mutation() {
        let mut table = SymbolTable::new();
        table
            .declare(symbol("x", Mutability::Constant, Some(Value::Integer(1))))
            .unwrap();
        assert_eq!(
            table.mutate("x", Value::Integer(2)),
            Err(SemanticError::AssignToConstant { id: "x".into() })
        );
        assert_eq!(table.read("x"), Ok(Value::Integer(1)));
    }

    #[test]
    fn mutation_stores_any_numeric_value() {
        let mut table = SymbolTable::new();
        table
            .declare(symbol("x", Mutability::Variable, Some(Value::Double(1.5))))
            .unwrap();
        assert_eq!(table.mutate("x", Value::Integer(2)), Ok(()));
        assert_eq!(table.read("x"), Ok(Value::Integer(2)));
        assert_eq!(table.get("x").map(|s| s.base_type), Some(BaseType::Double));
    }

    #[test]
    fn display() {
        let mut table = SymbolTable::new();
        table
            .declare(symbol("a", Mutability::Constant, Some(Value::Integer(5))))
            .unwrap();
        table
            .declare(symbol("b", Mutability::Variable, Some(Value::Double(2.0))))
            .unwrap();
        table.declare(symbol("c", Mutability::Constant, None)).unwrap();
        assert_eq!(table.to_string(), "a: Integer = 5\nb: Double = 2.0\nc: Integer\n");
    }
}
