#[derive(Debug, Clone, thiserror::Error)]
pub enum JsonError {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("unexpected character '{0}' at byte {1}")]
    UnexpectedChar(char, usize),

    #[error("unterminated string literal starting at byte {0}")]
    UnterminatedString(usize),

    #[error("invalid escape sequence '\\{0}'")]
    InvalidEscape(char),

    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),

    #[error("trailing data after the top-level value")]
    TrailingData,

    #[error("input was empty")]
    EmptyInput,
}
