use owo_colors::OwoColorize;

/// Prints a heuristic hint for common mistakes, keyed off the error text.
/// Used by the REPL after rendering an error.
pub fn provide_error_suggestions(msg: &str) {
    if msg.contains("identifier not found") {
        eprintln!(
            "{}",
            "hint: assign with '<-' before use, e.g. x <- 42".yellow()
        );
    } else if msg.contains("cannot assign to constant") {
        eprintln!(
            "{}",
            "hint: CONSTANT bindings are write-once; use a plain variable if it needs to change"
                .yellow()
        );
    } else if msg.contains("cannot assign to builtin") {
        eprintln!(
            "{}",
            "hint: built-in names like LEN and OUTPUT cannot be reassigned".yellow()
        );
    } else if msg.contains("expected next token to be 'THEN'") {
        eprintln!(
            "{}",
            "hint: IF conditions end with THEN, e.g. IF x > 0 THEN".yellow()
        );
    } else if msg.contains("expected next token to be '<-'") {
        eprintln!(
            "{}",
            "hint: assignment uses '<-'; '=' compares for equality".yellow()
        );
    } else if msg.contains("wrong number of arguments") {
        eprintln!(
            "{}",
            "hint: check the subroutine's parameter list against the call".yellow()
        );
    } else if msg.contains("division by zero") {
        eprintln!(
            "{}",
            "hint: guard the divisor, e.g. IF d != 0 THEN … ENDIF".yellow()
        );
    } else if msg.contains("need a boolean") {
        eprintln!(
            "{}",
            "hint: WHILE and REPEAT UNTIL conditions must evaluate to true or false".yellow()
        );
    }
}
