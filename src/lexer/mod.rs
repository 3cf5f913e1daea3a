//! 词法分析器
//!
//! 基于 logos 的 DFA 扫描。换行与块注释作为令牌参与匹配以便精确跟踪
//! 行列号, 随后被过滤掉; 关键字在扫描后从单词令牌中分类出来。

use std::fmt;

use logos::Logos;

use crate::error::{MjResult, lexer_error};

/// 语言关键字 ("String" 与 "main" 是普通标识符)
const KEYWORDS: &[&str] = &[
    "class", "extends", "public", "static", "void", "int", "boolean",
    "if", "else", "while", "do", "for", "return", "break", "continue",
    "new", "this", "true", "false",
];

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\f]+")]
#[logos(skip r"//[^\n]*")]
enum RawToken {
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*")]
    Word,

    #[regex(r"0[xX][0-9a-fA-F][0-9a-fA-F_]*")]
    HexNumber,

    #[regex(r"0[bB][01][01_]*")]
    BinaryNumber,

    #[regex(r"[0-9][0-9_]*")]
    Number,

    #[regex(r">>>|<<|>>|<=|>=|==|!=|&&|\|\||\+=|-=|\*=|/=|%=|&=|\|=|\^=|\+\+|--|[+\-*/%&|^!~=<>]")]
    Operator,

    #[regex(r"[(){}\[\];,.]")]
    Punctuation,

    // 块注释作为令牌匹配, 其中的换行在扫描循环里计数
    #[regex(r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/")]
    BlockComment,

    #[token("\n")]
    Newline,
}

/// 令牌类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Number,
    HexNumber,
    BinaryNumber,
    Keyword,
    Operator,
    Punctuation,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Number => "NUMBER",
            TokenKind::HexNumber => "HEX_NUMBER",
            TokenKind::BinaryNumber => "BINARY_NUMBER",
            TokenKind::Keyword => "KEYWORD",
            TokenKind::Operator => "OPERATOR",
            TokenKind::Punctuation => "PUNCTUATION",
        };
        write!(f, "{}", name)
    }
}

/// 带位置信息的令牌
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: usize, column: usize) -> Self {
        Self { kind, lexeme: lexeme.into(), line, column }
    }

    pub fn is_identifier(&self) -> bool {
        self.kind == TokenKind::Identifier
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Keyword && self.lexeme == keyword
    }

    pub fn is_lexeme(&self, lexeme: &str) -> bool {
        self.lexeme == lexeme
    }

    pub fn is_number(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Number | TokenKind::HexNumber | TokenKind::BinaryNumber
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token{{Type: {}, Position: {}:{}, Lexeme: '{}'}}",
            self.kind, self.line, self.column, self.lexeme
        )
    }
}

/// 扫描整个源文件
pub fn lex(source: &str) -> MjResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut lexer = RawToken::lexer(source);
    let mut line = 1usize;
    let mut line_start = 0usize;

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let column = span.start - line_start + 1;
        let raw = match result {
            Ok(raw) => raw,
            Err(_) => {
                return Err(lexer_error(
                    line,
                    column,
                    format!("Unexpected character: '{}'", &source[span]),
                ));
            }
        };

        match raw {
            RawToken::Newline => {
                line += 1;
                line_start = span.end;
            }
            RawToken::BlockComment => {
                for (offset, byte) in source[span.clone()].bytes().enumerate() {
                    if byte == b'\n' {
                        line += 1;
                        line_start = span.start + offset + 1;
                    }
                }
            }
            RawToken::Word => {
                let lexeme = &source[span];
                let kind = if KEYWORDS.contains(&lexeme) {
                    TokenKind::Keyword
                } else {
                    TokenKind::Identifier
                };
                tokens.push(Token::new(kind, lexeme, line, column));
            }
            RawToken::Number => {
                tokens.push(Token::new(TokenKind::Number, &source[span], line, column));
            }
            RawToken::HexNumber => {
                tokens.push(Token::new(TokenKind::HexNumber, &source[span], line, column));
            }
            RawToken::BinaryNumber => {
                tokens.push(Token::new(TokenKind::BinaryNumber, &source[span], line, column));
            }
            RawToken::Operator => {
                tokens.push(Token::new(TokenKind::Operator, &source[span], line, column));
            }
            RawToken::Punctuation => {
                tokens.push(Token::new(TokenKind::Punctuation, &source[span], line, column));
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_and_identifiers() {
        let tokens = lex("class Foo extends Bar").unwrap();
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0].kind, TokenKind::Keyword);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[2].kind, TokenKind::Keyword);
        assert_eq!(tokens[3].lexeme, "Bar");
    }

    #[test]
    fn test_string_and_main_are_identifiers() {
        let tokens = lex("String main").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
    }

    #[test]
    fn test_compound_operators() {
        let tokens = lex("a >>> 2 >= 1 >> 0").unwrap();
        let ops: Vec<&str> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Operator)
            .map(|t| t.lexeme.as_str())
            .collect();
        assert_eq!(ops, vec![">>>", ">=", ">>"]);
    }

    #[test]
    fn test_number_kinds() {
        let tokens = lex("42 0xFF_0 0b10_01 1_000").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[1].kind, TokenKind::HexNumber);
        assert_eq!(tokens[2].kind, TokenKind::BinaryNumber);
        assert_eq!(tokens[3].lexeme, "1_000");
    }

    #[test]
    fn test_line_and_column_tracking() {
        let tokens = lex("int a;\n  int b;").unwrap();
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[0].column, 1);
        assert_eq!(tokens[3].line, 2);
        assert_eq!(tokens[3].column, 3);
    }

    #[test]
    fn test_block_comment_counts_lines() {
        let tokens = lex("/* a\n * b\n */ int x;").unwrap();
        assert_eq!(tokens[0].lexeme, "int");
        assert_eq!(tokens[0].line, 3);
        assert_eq!(tokens[0].column, 5);
    }

    #[test]
    fn test_unexpected_character() {
        let err = lex("int #").unwrap_err();
        assert!(err.to_string().contains("Unexpected character"));
    }

    #[test]
    fn test_token_display_format() {
        let token = Token::new(TokenKind::Identifier, "foo", 3, 7);
        assert_eq!(
            token.to_string(),
            "Token{Type: IDENTIFIER, Position: 3:7, Lexeme: 'foo'}"
        );
    }
}
