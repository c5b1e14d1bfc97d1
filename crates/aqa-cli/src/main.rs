mod repl;
mod suggestions;

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser as CliParser;
use owo_colors::OwoColorize;

use aqa_interpreter::{eval_program, Environment, Value};
use aqa_lexer::Lexer;
use aqa_parser::Parser;
use aqa_syntax::error::Error;
use aqa_syntax::token::TokenKind;

/// An interpreter for AQA pseudocode.
#[derive(CliParser, Debug)]
#[command(name = "aqa-cli", version, about = "An interpreter for AQA pseudocode")]
struct Cli {
    /// Source file to run (conventionally `.aqa`); starts the REPL when
    /// omitted.
    file: Option<PathBuf>,

    /// Evaluate an inline snippet instead of a file.
    #[arg(short = 'c', long = "command")]
    command: Option<String>,

    /// Dump the positioned token stream instead of evaluating.
    #[arg(long)]
    lex: bool,
}

fn main() {
    let cli = Cli::parse();

    let source = if let Some(snippet) = cli.command {
        snippet
    } else if let Some(path) = cli.file {
        match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(err) => {
                eprintln!(
                    "{}: {}",
                    "error".red().bold(),
                    format!("failed to read {}: {}", path.display(), err).red()
                );
                process::exit(1);
            }
        }
    } else {
        repl::start();
        return;
    };

    if cli.lex {
        dump_tokens(&source);
        return;
    }

    run_source(&source);
}

fn dump_tokens(source: &str) {
    let mut lexer = Lexer::new(source);
    loop {
        let tok = lexer.next_token();
        println!("{}", tok);
        if tok.kind == TokenKind::Eof {
            break;
        }
    }
}

fn run_source(source: &str) {
    let mut parser = Parser::new(Lexer::new(source));
    let program = parser.parse_program();

    if !parser.errors().is_empty() {
        for err in parser.errors() {
            render_error("Parse error", source, &err.to_error());
        }
        process::exit(1);
    }

    let env = Environment::new();
    if let Value::Error(msg) = eval_program(&program, &env) {
        render_error("Runtime error", source, &Error::new(msg));
        process::exit(1);
    }
}

/// Renders an error to stderr, echoing the offending source line with a
/// caret when the error carries a position.
pub(crate) fn render_error(kind: &str, source: &str, err: &Error) {
    eprintln!("{}: {}", kind.red().bold(), err.msg.red());

    if let (Some(line), Some(col)) = (err.line, err.col) {
        if let Some(src_line) = source.lines().nth(line) {
            eprintln!("  {}", src_line.bright_black());
            let mut marker = " ".repeat(col);
            marker.push('^');
            eprintln!("  {}", marker.red());
        } else {
            eprintln!("  at {}:{}", line + 1, col + 1);
        }
    }
}
