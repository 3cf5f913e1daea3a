use thiserror::Error;
use crate::lexer::Token;

#[derive(Error, Debug, Clone)]
pub enum MjError {
    #[error("Lexer error at line {line}, column {column}: {message}")]
    Lexer { line: usize, column: usize, message: String },

    #[error("Parser error: {0}")]
    Parser(String),

    #[error("Semantic error: {0}")]
    Semantic(String),

    #[error("Code generation error: {0}")]
    CodeGen(String),

    #[error("IO error: {0}")]
    Io(String),
}

pub type MjResult<T> = Result<T, MjError>;

/// 给诊断信息附加出错处的令牌
fn with_token(message: impl Into<String>, token: Option<&Token>) -> String {
    match token {
        Some(token) => format!("{} at {}", message.into(), token),
        None => message.into(),
    }
}

pub fn lexer_error(line: usize, column: usize, message: impl Into<String>) -> MjError {
    MjError::Lexer {
        line,
        column,
        message: message.into(),
    }
}

pub fn parser_error(message: impl Into<String>, token: Option<&Token>) -> MjError {
    MjError::Parser(with_token(message, token))
}

pub fn semantic_error(message: impl Into<String>) -> MjError {
    MjError::Semantic(message.into())
}

pub fn semantic_error_at(message: impl Into<String>, token: &Token) -> MjError {
    MjError::Semantic(with_token(message, Some(token)))
}

pub fn codegen_error(message: impl Into<String>) -> MjError {
    MjError::CodeGen(message.into())
}
