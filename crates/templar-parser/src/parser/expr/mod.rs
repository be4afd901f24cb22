//! Expression parser using Pratt parsing (precedence climbing).
//!
//! ## Precedence Levels (lowest to highest)
//!
//! 1. `if c a else b` (prefix conditional)
//! 2. `c ? a : b` - right associative
//! 3. `??` - right associative
//! 4. `||`, `or`
//! 5. `&&`, `and`
//! 6. `|`
//! 7. `^`
//! 8. `&`
//! 9. `==`, `!=`, `=`, `=~`, `!~`
//! 10. `<`, `<=`, `>`, `>=`
//! 11. `+`, `-`
//! 12. `*`, `/`, `%`
//! 13. Unary `!`, `not`, `-`, `+`, `~`
//! 14. Postfix: `.member`, `(args)`, `[index]`

mod atoms;
mod pratt;
mod special;

use super::{ParseError, TokenStream};
use templar_ast::Expr;
use templar_lexer::Token;

/// Parse a full expression, including both conditional forms.
pub fn parse_expr(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    if stream.check(&Token::If) {
        special::parse_if(stream)
    } else {
        special::parse_conditional(stream)
    }
}
