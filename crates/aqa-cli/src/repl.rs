use std::io::{self, Write};

use owo_colors::OwoColorize;

use aqa_interpreter::{eval_string, EnvRef, Environment, Value};
use aqa_lexer::Lexer;
use aqa_syntax::token::TokenKind;

use crate::render_error;
use crate::suggestions::provide_error_suggestions;

pub fn start() {
    println!(
        "{}",
        "AQA pseudocode REPL. Type :help for help, :quit to exit."
            .bold()
            .green()
    );

    let mut env = Environment::new();
    let mut buffer = String::new();

    loop {
        let prompt = if buffer.is_empty() {
            "aqa> ".cyan().to_string()
        } else {
            "...> ".cyan().to_string()
        };
        print!("{}", prompt);
        let _ = io::stdout().flush();

        let mut line = String::new();
        let n = match io::stdin().read_line(&mut line) {
            Ok(n) => n,
            Err(_) => {
                println!("<input error>");
                break;
            }
        };
        if n == 0 {
            // EOF
            println!("\nGoodbye.");
            break;
        }
        let trimmed = line.trim_end();

        if buffer.is_empty() && trimmed.starts_with(':') {
            match trimmed {
                ":quit" | ":q" | ":exit" => {
                    println!("Goodbye.");
                    break;
                }
                ":help" | ":h" => {
                    print_help();
                    continue;
                }
                ":vars" => {
                    print_vars(&env);
                    continue;
                }
                ":reset" => {
                    env = Environment::new();
                    println!("{}", "State reset.".yellow());
                    continue;
                }
                _ => {
                    println!("{}", "Unknown command. Type :help.".red());
                    continue;
                }
            }
        }

        buffer.push_str(&line);

        if !is_complete(&buffer) {
            continue;
        }

        let (value, errors) = eval_string(&buffer, &env);
        if errors.is_empty() {
            if value != Value::Null {
                println!("{}", value.to_string().bright_blue());
            }
        } else {
            for err in &errors {
                render_error("Error", &buffer, err);
                provide_error_suggestions(&err.msg);
            }
        }

        buffer.clear();
    }
}

fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  {}   Show this help", ":help".yellow());
    println!("  {}   Exit the REPL", ":quit".yellow());
    println!("  {}   List top-level variables", ":vars".yellow());
    println!("  {}  Clear all state", ":reset".yellow());
    println!("Type code to evaluate. Multi-line blocks (IF … ENDIF, SUBROUTINE … ENDSUBROUTINE) are supported.");
}

fn print_vars(env: &EnvRef) {
    let mut vars = env.borrow().snapshot();
    vars.sort_by(|a, b| a.0.cmp(&b.0));

    if vars.is_empty() {
        println!("{}", "<no vars>".dimmed());
        return;
    }
    for (name, value) in vars {
        println!("{} = {}", name.yellow(), value.to_string().bright_blue());
    }
}

/// Whether the buffered input forms a submittable chunk: every block opener
/// has its closer and parens, brackets and braces balance.
fn is_complete(input: &str) -> bool {
    let mut lexer = Lexer::new(input);
    let mut depth = 0i32;
    let mut opens = 0i32;
    let mut closes = 0i32;

    loop {
        let tok = lexer.next_token();
        match tok.kind {
            TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => depth -= 1,
            TokenKind::If
            | TokenKind::While
            | TokenKind::For
            | TokenKind::Repeat
            | TokenKind::Subroutine => opens += 1,
            TokenKind::EndIf
            | TokenKind::EndWhile
            | TokenKind::EndFor
            | TokenKind::Until
            | TokenKind::EndSubroutine => closes += 1,
            TokenKind::Eof => break,
            _ => {}
        }
    }

    depth <= 0 && opens <= closes
}
