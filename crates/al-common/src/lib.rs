pub mod diagnostic;
pub mod span;
pub mod token;

pub use diagnostic::{Diagnostic, Severity};
pub use span::{LineIndex, Span};
pub use token::{keyword_from_str, Literal, Token, TokenKind, Trivia, TriviaKind};
