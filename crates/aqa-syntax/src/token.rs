//! Token definitions for the AQA pseudocode lexer.

use std::fmt;

/// Kinds of tokens produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Illegal,
    Eof,
    // identifiers and literals
    Ident,
    Int,
    Float,
    String,
    // operators
    Assign,    // <-
    Plus,      // +
    Minus,     // -
    Bang,      // !
    Asterisk,  // *
    Slash,     // /
    Div,       // DIV
    Mod,       // MOD
    Lshift,    // <<
    Rshift,    // >>
    Lt,        // <
    Gt,        // >
    LtEq,      // <=
    GtEq,      // >=
    Eq,        // == (a lone = is accepted as equality too)
    NotEq,     // !=
    Dot,       // .
    Not,
    And,
    Or,
    Xor,
    // delimiters
    Comma,
    Newline,
    Colon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    // keywords
    Subroutine,
    Constant,
    True,
    False,
    If,
    Else,
    Return,
    While,
    Repeat,
    Until,
    For,
    To,
    EndWhile,
    EndFor,
    EndIf,
    EndSubroutine,
    Then,
    Map,
    Import,
    As,
    From,
    Output,
    Userinput,
}

impl TokenKind {
    /// The display name of the token kind, as used in error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Illegal => "ILLEGAL",
            TokenKind::Eof => "EOF",
            TokenKind::Ident => "IDENT",
            TokenKind::Int => "INT",
            TokenKind::Float => "FLOAT",
            TokenKind::String => "STRING",
            TokenKind::Assign => "<-",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Bang => "!",
            TokenKind::Asterisk => "*",
            TokenKind::Slash => "/",
            TokenKind::Div => "DIV",
            TokenKind::Mod => "MOD",
            TokenKind::Lshift => "<<",
            TokenKind::Rshift => ">>",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::LtEq => "<=",
            TokenKind::GtEq => ">=",
            TokenKind::Eq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Dot => ".",
            TokenKind::Not => "NOT",
            TokenKind::And => "AND",
            TokenKind::Or => "OR",
            TokenKind::Xor => "XOR",
            TokenKind::Comma => ",",
            TokenKind::Newline => "\\n",
            TokenKind::Colon => ":",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Subroutine => "SUBROUTINE",
            TokenKind::Constant => "CONSTANT",
            TokenKind::True => "TRUE",
            TokenKind::False => "FALSE",
            TokenKind::If => "IF",
            TokenKind::Else => "ELSE",
            TokenKind::Return => "RETURN",
            TokenKind::While => "WHILE",
            TokenKind::Repeat => "REPEAT",
            TokenKind::Until => "UNTIL",
            TokenKind::For => "FOR",
            TokenKind::To => "TO",
            TokenKind::EndWhile => "ENDWHILE",
            TokenKind::EndFor => "ENDFOR",
            TokenKind::EndIf => "ENDIF",
            TokenKind::EndSubroutine => "ENDSUBROUTINE",
            TokenKind::Then => "THEN",
            TokenKind::Map => "MAP",
            TokenKind::Import => "IMPORT",
            TokenKind::As => "AS",
            TokenKind::From => "FROM",
            TokenKind::Output => "OUTPUT",
            TokenKind::Userinput => "USERINPUT",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A token with its literal text and source position.
///
/// Lines are 0-based; `start_col` and `end_col` are the columns of the first
/// and last character of the token, resetting on every newline.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub line: usize,
    pub start_col: usize,
    pub end_col: usize,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        literal: impl Into<String>,
        line: usize,
        start_col: usize,
        end_col: usize,
    ) -> Self {
        Self {
            kind,
            literal: literal.into(),
            line,
            start_col,
            end_col,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lit = if self.literal == "\n" {
            "\\n"
        } else {
            &self.literal
        };
        write!(
            f,
            "(Lit: '{}', Type: '{}', line={}, startcol={}, endcol={})",
            lit, self.kind, self.line, self.start_col, self.end_col
        )
    }
}

/// Looks up the keyword kind for a spelling that is already known to be
/// eligible (wholly lowercase or wholly uppercase).
fn lookup_keyword(ident: &str) -> Option<TokenKind> {
    let kind = match ident {
        "constant" => TokenKind::Constant,
        "return" => TokenKind::Return,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "subroutine" => TokenKind::Subroutine,
        "while" => TokenKind::While,
        "endwhile" => TokenKind::EndWhile,
        "repeat" => TokenKind::Repeat,
        "until" => TokenKind::Until,
        "for" => TokenKind::For,
        "endfor" => TokenKind::EndFor,
        "to" => TokenKind::To,
        "then" => TokenKind::Then,
        "endif" => TokenKind::EndIf,
        "endsubroutine" => TokenKind::EndSubroutine,
        "output" => TokenKind::Output,
        "userinput" => TokenKind::Userinput,
        "div" => TokenKind::Div,
        "mod" => TokenKind::Mod,
        "not" => TokenKind::Not,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "xor" => TokenKind::Xor,
        "import" => TokenKind::Import,
        "as" => TokenKind::As,
        "from" => TokenKind::From,
        "map" => TokenKind::Map,
        _ => return None,
    };
    Some(kind)
}

/// Classifies an identifier spelling as a keyword kind or a plain IDENT.
///
/// Only spellings that are wholly lowercase or wholly uppercase are eligible
/// for keyword status; mixed case is always an identifier, even when its
/// letters spell a keyword.
pub fn lookup_ident(ident: &str) -> TokenKind {
    let lower = ident.to_ascii_lowercase();
    let upper = ident.to_ascii_uppercase();

    if lower != ident && upper != ident {
        return TokenKind::Ident;
    }

    lookup_keyword(&lower).unwrap_or(TokenKind::Ident)
}

/// Parses the literal text of an INT token, accepting decimal, `0x…` hex and
/// `0b…` binary spellings. Also used when string operands are re-dispatched
/// through integer arithmetic.
pub fn parse_int_literal(text: &str) -> Option<i64> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let value = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(bin) = body.strip_prefix("0b").or_else(|| body.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2).ok()?
    } else {
        body.parse::<i64>().ok()?
    };

    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_match_any_single_case() {
        assert_eq!(lookup_ident("while"), TokenKind::While);
        assert_eq!(lookup_ident("WHILE"), TokenKind::While);
        assert_eq!(lookup_ident("endsubroutine"), TokenKind::EndSubroutine);
        assert_eq!(lookup_ident("ENDSUBROUTINE"), TokenKind::EndSubroutine);
        assert_eq!(lookup_ident("constant"), TokenKind::Constant);
        assert_eq!(lookup_ident("userinput"), TokenKind::Userinput);
    }

    #[test]
    fn mixed_case_is_always_an_identifier() {
        assert_eq!(lookup_ident("While"), TokenKind::Ident);
        assert_eq!(lookup_ident("wHiLe"), TokenKind::Ident);
        assert_eq!(lookup_ident("Output"), TokenKind::Ident);
        assert_eq!(lookup_ident("EndIf"), TokenKind::Ident);
    }

    #[test]
    fn non_keywords_are_identifiers() {
        assert_eq!(lookup_ident("total"), TokenKind::Ident);
        assert_eq!(lookup_ident("_tmp"), TokenKind::Ident);
        assert_eq!(lookup_ident("X"), TokenKind::Ident);
    }

    #[test]
    fn int_literals_in_every_base() {
        assert_eq!(parse_int_literal("123"), Some(123));
        assert_eq!(parse_int_literal("-7"), Some(-7));
        assert_eq!(parse_int_literal("0x1F"), Some(31));
        assert_eq!(parse_int_literal("0b101"), Some(5));
        assert_eq!(parse_int_literal("12abc"), None);
        assert_eq!(parse_int_literal(""), None);
    }
}
