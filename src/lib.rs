pub mod compile;
pub mod cursor;
pub mod eval;
pub mod lex;
pub mod parse;
pub mod scope;
pub mod tree;

use miette::Diagnostic;
use thiserror::Error;

pub use compile::Program;
pub use eval::{Scope, SemanticError, Value, evaluate};
pub use lex::{LexError, Lexer, Token, lex};
pub use parse::{Parser, SyntaxError, parse};
pub use scope::{BaseType, Mutability, Symbol, SymbolTable};
pub use tree::{DisplayTree, Node, NodeKind};

/// Anything that can stop a single statement.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Semantic(#[from] SemanticError),
}

/// Lexes, parses and evaluates one line against `scope`.
pub fn run_line(line: &str, scope: &mut impl Scope) -> Result<(), Error> {
    let tokens = lex(line)?;
    let tree = parse(tokens)?;
    evaluate(&tree, scope)?;
    Ok(())
}
