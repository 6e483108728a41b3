use miette::{NamedSource, Report};

use crate::{Error, run_line, scope::SymbolTable};

/// Non-blank lines of `source` with their 1-based line numbers.
pub fn source_lines(source: &str) -> impl Iterator<Item = (usize, &str)> {
    source
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line))
        .filter(|(_, line)| !line.trim().is_empty())
}

/// Attaches the offending line to `error` so the labels render against it.
pub fn line_report(filename: &str, number: usize, line: &str, error: impl Into<Error>) -> Report {
    Report::new(error.into())
        .with_source_code(NamedSource::new(
            format!("{filename}:{number}"),
            line.to_string(),
        ))
        .wrap_err(format!("line {number}"))
}

/// Runs a source file one line at a time against a single symbol table.
///
/// Each call to `next` handles one non-blank line; a failing line leaves the
/// table as it was before that line.
pub struct Program<'src> {
    filename: String,
    lines: Box<dyn Iterator<Item = (usize, &'src str)> + 'src>,
    table: SymbolTable,
}

impl<'src> Program<'src> {
    pub fn new(filename: impl Into<String>, source: &'src str) -> Self {
        Program {
            filename: filename.into(),
            lines: Box::new(source_lines(source)),
            table: SymbolTable::new(),
        }
    }

    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    pub fn into_table(self) -> SymbolTable {
        self.table
    }

    /// Runs every remaining line, stopping at the first failure.
    pub fn compile(mut self) -> Result<SymbolTable, Report> {
        for result in self.by_ref() {
            result?;
        }
        Ok(self.table)
    }
}

impl Iterator for Program<'_> {
    type Item = Result<(), Report>;

    fn next(&mut self) -> Option<Self::Item> {
        let (number, line) = self.lines.next()?;

        Some(
            run_line(line, &mut self.table)
                .map_err(|error| line_report(&self.filename, number, line, error)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{Scope, Value};

    #[test]
    fn shares_one_table_across_lines() {
        let source = "val a = 1\n\nvar b = a + 1\n   \nb = b * 10\n";
        let table = Program::new("test.ace", source).compile().unwrap();
        assert_eq!(table.read("a"), Ok(Value::Integer(1)));
        assert_eq!(table.read("b"), Ok(Value::Integer(20)));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let mut program = Program::new("test.ace", "\n \t\n");
        assert!(program.next().is_none());
        assert!(program.table().is_empty());
    }

    #[test]
    fn stops_at_the_first_error() {
        let source = "val a = 1\nval a = 2\nval b = 3\n";
        let report = Program::new("test.ace", source).compile().unwrap_err();
        assert_eq!(report.to_string(), "line 2");
    }

    #[test]
    fn keeps_going_after_an_error() {
        let source = "val a = 1\nval b = @\nval c = a\n";
        let mut program = Program::new("test.ace", source);
        let results: Vec<_> = program.by_ref().map(|result| result.is_ok()).collect();
        assert_eq!(results, [true, false, true]);

        let table = program.into_table();
        assert!(table.get("b").is_none());
        assert_eq!(table.read("c"), Ok(Value::Integer(1)));
    }

    #[test]
    fn report_carries_the_cause() {
        let report = Program::new("test.ace", "val x = y")
            .compile()
            .unwrap_err();
        assert_eq!(report.to_string(), "line 1");
        assert_eq!(report.root_cause().to_string(), "`y` is not declared");
    }

    #[test]
    fn reports_the_file_line_after_blanks() {
        let report = Program::new("test.ace", "\n  \nval x = y\n")
            .compile()
            .unwrap_err();
        assert_eq!(report.to_string(), "line 3");
    }

    #[test]
    fn numbered_lines() {
        let lines: Vec<_> = source_lines("a\n\nb\n").collect();
        assert_eq!(lines, [(1, "a"), (3, "b")]);
    }
}
