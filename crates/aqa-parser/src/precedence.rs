//! Operator precedence ladder for the Pratt parser.

use aqa_syntax::token::TokenKind;

/// Binding strengths, lowest to highest. `Boolean` sits above `Prefix` so
/// that `NOT a OR b` parses as `NOT (a OR b)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Precedence {
    Lowest,
    Equals,
    Shift,
    Compare,
    Sum,
    Product,
    DivMod,
    Prefix,
    Boolean,
    Call,
    Index,
}

/// The infix binding strength of a token kind; `Lowest` for tokens that
/// cannot continue an expression.
pub(crate) fn precedence_of(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::Eq | TokenKind::NotEq => Precedence::Equals,
        TokenKind::Lshift | TokenKind::Rshift => Precedence::Shift,
        TokenKind::Lt | TokenKind::Gt | TokenKind::LtEq | TokenKind::GtEq => Precedence::Compare,
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Asterisk | TokenKind::Slash => Precedence::Product,
        TokenKind::Div | TokenKind::Mod => Precedence::DivMod,
        TokenKind::And | TokenKind::Or | TokenKind::Xor => Precedence::Boolean,
        TokenKind::LParen => Precedence::Call,
        TokenKind::LBracket | TokenKind::Dot => Precedence::Index,
        _ => Precedence::Lowest,
    }
}
