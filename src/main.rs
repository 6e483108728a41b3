use std::fs;
use std::path::{Path, PathBuf};

use ace_interpreter::{DisplayTree, Program, compile, lex, parse};
use clap::Parser;
use clap::Subcommand;
use miette::IntoDiagnostic;
use miette::WrapErr;

#[derive(Parser, Debug)]
#[command(version, about = "Compiles Ace source into a table of symbols")]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compile a file and print its symbols
    Run {
        filename: PathBuf,
        /// Report every failing line instead of stopping at the first one
        #[arg(long)]
        keep_going: bool,
    },
    /// Print the tokens of every line
    Tokenize { filename: PathBuf },
    /// Print the syntax tree of every line
    Parse { filename: PathBuf },
}

fn main() -> miette::Result<()> {
    let args = Args::parse();

    match args.command {
        Commands::Run {
            filename,
            keep_going,
        } => {
            let file_contents = read(&filename)?;
            let mut program = Program::new(filename.display().to_string(), &file_contents);

            let mut failed = false;
            for result in program.by_ref() {
                if let Err(e) = result {
                    eprintln!("{e:?}");
                    failed = true;
                    if !keep_going {
                        std::process::exit(65);
                    }
                }
            }

            print!("{}", program.table());
            if failed {
                std::process::exit(65);
            }
        }
        Commands::Tokenize { filename } => {
            let file_contents = read(&filename)?;
            let name = filename.display().to_string();

            for (number, line) in compile::source_lines(&file_contents) {
                let tokens = match lex(line) {
                    Ok(tokens) => tokens,
                    Err(e) => {
                        eprintln!("{:?}", compile::line_report(&name, number, line, e));
                        std::process::exit(65);
                    }
                };
                for token in tokens {
                    println!("{number}: {token}");
                }
            }
        }
        Commands::Parse { filename } => {
            let file_contents = read(&filename)?;
            let name = filename.display().to_string();

            for (number, line) in compile::source_lines(&file_contents) {
                let tree = match lex(line).map_err(ace_interpreter::Error::from).and_then(
                    |tokens| parse(tokens).map_err(ace_interpreter::Error::from),
                ) {
                    Ok(tree) => tree,
                    Err(e) => {
                        eprintln!("{:?}", compile::line_report(&name, number, line, e));
                        std::process::exit(65);
                    }
                };
                println!("{}", DisplayTree(&tree));
            }
        }
    }
    Ok(())
}

fn read(filename: &Path) -> miette::Result<String> {
    fs::read_to_string(filename)
        .into_diagnostic()
        .wrap_err_with(|| format!("reading `{}` failed", filename.display()))
}
