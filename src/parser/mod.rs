//! 语法分析器
//!
//! 递归下降, 支持 save/restore 位置回溯 (类型转换与局部变量声明的
//! 二义性消解依赖它)。按职责拆分为多个 impl 子模块。

mod classes;
mod statements;
mod expressions;

use crate::error::{MjError, MjResult, parser_error};
use crate::lexer::Token;
use crate::types::Project;

/// 可作为赋值语句运算符的词素
pub(crate) const ASSIGNMENT_OPERATORS: &[&str] = &["=", "+=", "-=", "*=", "/=", "&=", "|=", "^="];

pub struct Parser {
    /// 令牌流
    pub tokens: Vec<Token>,
    /// 当前解析位置
    pub pos: usize,
    saved: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0, saved: 0 }
    }

    /// 解析整个编译单元
    pub fn parse(&mut self) -> MjResult<Project> {
        let mut project = Project::new();
        while self.read_until("class").is_some() {
            self.parse_class(&mut project)?;
        }
        Ok(project)
    }

    // ---- 令牌流辅助 ----

    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    pub(crate) fn read(&mut self) -> MjResult<Token> {
        match self.tokens.get(self.pos) {
            Some(token) => {
                self.pos += 1;
                Ok(token.clone())
            }
            None => Err(parser_error("Unexpected end of input", self.tokens.last())),
        }
    }

    pub(crate) fn unread(&mut self) {
        if self.pos > 0 {
            self.pos -= 1;
        }
    }

    pub(crate) fn save(&mut self) {
        self.saved = self.pos;
    }

    pub(crate) fn restore(&mut self) {
        self.pos = self.saved;
    }

    /// 消费令牌直到遇到指定词素
    pub(crate) fn read_until(&mut self, lexeme: &str) -> Option<Token> {
        while let Some(token) = self.tokens.get(self.pos) {
            self.pos += 1;
            if token.lexeme == lexeme {
                return Some(token.clone());
            }
        }
        None
    }

    /// 读取下一个令牌并要求其词素匹配
    pub(crate) fn expect_lexeme(&mut self, lexeme: &str, message: &str) -> MjResult<Token> {
        let token = self.read()?;
        if token.lexeme != lexeme {
            return Err(parser_error(message, Some(&token)));
        }
        Ok(token)
    }

    pub(crate) fn error(&self, message: impl Into<String>, token: Option<&Token>) -> MjError {
        parser_error(message, token)
    }
}

/// 解析令牌流生成程序结构
pub fn parse(tokens: Vec<Token>) -> MjResult<Project> {
    let mut parser = Parser::new(tokens);
    parser.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn parse_source(source: &str) -> MjResult<Project> {
        parse(lex(source).unwrap())
    }

    #[test]
    fn test_parse_empty_class() {
        let project = parse_source("class A { }").unwrap();
        assert_eq!(project.classes.len(), 1);
        assert_eq!(project.classes[0].name, "A");
        assert!(project.classes[0].extends.is_none());
    }

    #[test]
    fn test_parse_extends() {
        let project = parse_source("class A { } class B extends A { }").unwrap();
        assert_eq!(project.classes[1].extends.as_deref(), Some("A"));
    }

    #[test]
    fn test_parse_fields_and_methods() {
        let project =
            parse_source("class A { int x; boolean ok; public int get(int y) { return y; } }")
                .unwrap();
        let class = &project.classes[0];
        assert_eq!(class.fields.len(), 2);
        assert_eq!(class.fields[1].ty.lexeme, "boolean");
        assert_eq!(class.methods.len(), 1);
        assert_eq!(class.methods[0].params.len(), 1);
    }

    #[test]
    fn test_parse_main_method() {
        let project = parse_source(
            "class A { public static void main(String[] args) { int x; } }",
        )
        .unwrap();
        let method = &project.classes[0].methods[0];
        assert!(method.is_main);
        assert_eq!(method.params.len(), 1);
        assert_eq!(method.params[0].name, "args");
    }

    #[test]
    fn test_duplicate_class_rejected() {
        let err = parse_source("class A { } class A { }").unwrap_err();
        assert!(err.to_string().contains("Class A already exists!"));
    }

    #[test]
    fn test_self_extension_rejected() {
        let err = parse_source("class A extends A { }").unwrap_err();
        assert!(err.to_string().contains("can not extend itself"));
    }

    #[test]
    fn test_static_field_rejected() {
        let err = parse_source("class A { static int x; }").unwrap_err();
        assert!(err.to_string().contains("Field can not be static"));
    }

    #[test]
    fn test_static_helper_method_rejected() {
        let err = parse_source("class A { public static int f() { return 1; } }").unwrap_err();
        assert!(err.to_string().contains("Only main method can be static"));
    }
}
