//! 表达式解析
//!
//! 按优先级阶梯下降; `(Ident)` 形式的类型转换通过 save/restore 试探
//! 消解: 右括号后紧跟运算符或 `;` 时视为括号表达式回退重解。

use crate::ast::{
    ArrayCall, Ast, BinaryExpression, BooleanLiteral, CastExpression, ChainNode, MethodCall,
    NewObject, NotExpression, NumberLiteral, ReferenceChain,
};
use crate::error::MjResult;
use crate::lexer::{Token, TokenKind};

use super::Parser;

/// 从低到高的二元运算符优先级, 末层是前缀一元运算符
const OPERATOR_PRECEDENCE: &[&[&str]] = &[
    &["||"],
    &["&&"],
    &["|"],
    &["^"],
    &["&"],
    &["==", "!="],
    &["<", "<=", ">", ">="],
    &["<<", ">>", ">>>"],
    &["+", "-"],
    &["*", "/", "%"],
    &["!", "~"],
];

impl Parser {
    pub(super) fn parse_expression(&mut self) -> MjResult<Ast> {
        if let Some(token) = self.peek() {
            if token.is_lexeme("!") || token.is_lexeme("~") {
                let op = self.read()?;
                let expr = self.parse_expression()?;
                return Ok(Ast::Not(NotExpression {
                    op,
                    expr: Box::new(expr),
                    ty: String::new(),
                }));
            }
            if token.is_lexeme("(") {
                if let Some(cast) = self.try_parse_cast()? {
                    return Ok(cast);
                }
            }
        }
        self.parse_expression_with_precedence(0)
    }

    /// 试探 `(<Class>) expr`; 不成立则回退
    fn try_parse_cast(&mut self) -> MjResult<Option<Ast>> {
        self.save();
        self.read()?; // (
        if self.peek().is_some_and(|t| t.is_identifier()) {
            let cast = self.read()?;
            if self.peek().is_some_and(|t| t.is_lexeme(")")) {
                self.read()?;
                let commit = self
                    .peek()
                    .is_some_and(|t| t.kind != TokenKind::Operator && !t.is_lexeme(";"));
                if commit {
                    let expr = self.parse_expression()?;
                    return Ok(Some(Ast::Cast(CastExpression {
                        cast,
                        expr: Box::new(expr),
                        ty: String::new(),
                    })));
                }
            }
        }
        self.restore();
        Ok(None)
    }

    fn parse_expression_with_precedence(&mut self, level: usize) -> MjResult<Ast> {
        if level + 1 == OPERATOR_PRECEDENCE.len() {
            // 最深层处理前缀 ! / ~
            if let Some(token) = self.peek() {
                if token.is_lexeme("!") || token.is_lexeme("~") {
                    let op = self.read()?;
                    let expr = self.parse_expression_with_precedence(level)?;
                    return Ok(Ast::Not(NotExpression {
                        op,
                        expr: Box::new(expr),
                        ty: String::new(),
                    }));
                }
            }
            return self.parse_primary();
        }

        let mut left = self.parse_expression_with_precedence(level + 1)?;
        while let Some(token) = self.peek() {
            let matches = token.kind == TokenKind::Operator
                && OPERATOR_PRECEDENCE[level].contains(&token.lexeme.as_str());
            if !matches {
                break;
            }
            let op = self.read()?;
            let right = self.parse_expression_with_precedence(level + 1)?;
            left = Ast::Binary(BinaryExpression::new(op, left, right));
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> MjResult<Ast> {
        let token = self.read()?;
        if token.is_number() {
            return Ok(Ast::Number(NumberLiteral::new(token)));
        }
        if token.is_keyword("true") || token.is_keyword("false") {
            return Ok(Ast::Boolean(BooleanLiteral { token, ty: String::new() }));
        }
        if token.is_identifier() || token.is_keyword("this") || token.is_keyword("new") {
            let chain = self.parse_reference_chain(token)?;
            return Ok(Ast::Reference(chain));
        }
        if token.is_lexeme("(") {
            let expr = self.parse_expression()?;
            self.expect_lexeme(")", "Failed to parse expression, Expected )")?;
            return Ok(expr);
        }
        Err(self.error("Expected a primary expression", Some(&token)))
    }

    /// 解析以标识符 / `this` / `new` 打头的引用链
    pub(super) fn parse_reference_chain(&mut self, first: Token) -> MjResult<ReferenceChain> {
        let mut chain = ReferenceChain::new();
        let mut pending: Option<Token> = None;

        if first.is_keyword("new") {
            let type_token = self.read()?;
            let node = if type_token.is_keyword("int") {
                self.expect_lexeme("[", "Failed to parse new expression, Expected [")?;
                let size = self.parse_expression()?;
                self.expect_lexeme("]", "Failed to parse bracket, expected ]")?;
                NewObject::new(type_token, Some(size))
            } else {
                if !type_token.is_identifier() {
                    return Err(self.error(
                        "Failed to parse new expression, Expected identifier",
                        Some(&type_token),
                    ));
                }
                self.expect_lexeme("(", "Failed to parse new expression, Expected (")?;
                self.expect_lexeme(")", "Failed to parse new expression, Expected )")?;
                NewObject::new(type_token, None)
            };
            if self.peek().is_none() {
                return Err(self.error("Expected ';'", Some(&first)));
            }
            chain.add_node(first, ChainNode::NewObject(node));
            if self.peek().is_some_and(|t| t.is_lexeme(";")) {
                return Ok(chain);
            }
        } else {
            pending = Some(first);
        }

        loop {
            let token = self.read()?;
            if token.is_lexeme(".") {
                if let Some(field) = pending.take() {
                    chain.add_field(field);
                }
                let name = self.read()?;
                if !name.is_identifier() {
                    return Err(self.error(
                        "Failed to parse reference chain, Expected identifier",
                        Some(&name),
                    ));
                }
                pending = Some(name);
            } else if token.is_lexeme("[") {
                let name = pending.take().ok_or_else(|| {
                    self.error("Failed to parse reference chain, Expected identifier", Some(&token))
                })?;
                let bracket = self.parse_expression()?;
                self.expect_lexeme("]", "Failed to parse bracket, expected ]")?;
                let call = ArrayCall::new(name.clone(), bracket);
                chain.add_node(name, ChainNode::ArrayCall(call));
            } else if token.is_lexeme("(") {
                let name = pending.take().ok_or_else(|| {
                    self.error("Failed to parse reference chain, Expected identifier", Some(&token))
                })?;
                let mut call = MethodCall::new(name.clone());
                if self.peek().is_some_and(|t| t.is_lexeme(")")) {
                    self.read()?;
                } else {
                    loop {
                        call.arguments.push(self.parse_expression()?);
                        let sep = self.read()?;
                        if sep.is_lexeme(",") {
                            continue;
                        }
                        if sep.is_lexeme(")") {
                            break;
                        }
                        return Err(
                            self.error("Failed to parse method call, expected , or )", Some(&sep))
                        );
                    }
                }
                chain.add_node(name, ChainNode::MethodCall(call));
            } else {
                if let Some(field) = pending.take() {
                    chain.add_field(field);
                }
                self.unread();
                return Ok(chain);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn expression_of(source: &str) -> Ast {
        let tokens = lex(source).unwrap();
        let mut parser = Parser::new(tokens);
        parser.parse_expression().unwrap()
    }

    #[test]
    fn test_precedence_mul_over_add() {
        let expr = expression_of("1 + 2 * 3");
        match expr {
            Ast::Binary(add) => {
                assert_eq!(add.op.lexeme, "+");
                assert!(matches!(*add.right, Ast::Binary(ref mul) if mul.op.lexeme == "*"));
            }
            other => panic!("expected binary, got {:?}", other),
        }
    }

    #[test]
    fn test_shift_binds_tighter_than_relational() {
        let expr = expression_of("a >> 1 < b;");
        match expr {
            Ast::Binary(rel) => {
                assert_eq!(rel.op.lexeme, "<");
                assert!(matches!(*rel.left, Ast::Binary(ref shift) if shift.op.lexeme == ">>"));
            }
            other => panic!("expected binary, got {:?}", other),
        }
    }

    #[test]
    fn test_cast_disambiguation_commits_on_identifier() {
        let expr = expression_of("(Animal) pet;");
        assert!(matches!(expr, Ast::Cast(ref c) if c.cast.lexeme == "Animal"));
    }

    #[test]
    fn test_cast_disambiguation_falls_back_on_operator() {
        let expr = expression_of("(a) + b;");
        assert!(matches!(expr, Ast::Binary(ref add) if add.op.lexeme == "+"));
    }

    #[test]
    fn test_reference_chain_links() {
        let expr = expression_of("a.b[i].m(x, y);");
        let chain = match expr {
            Ast::Reference(chain) => chain,
            other => panic!("expected reference, got {:?}", other),
        };
        assert_eq!(chain.chain.len(), 3);
        assert!(chain.chain[0].node.is_none());
        assert!(matches!(chain.chain[1].node, Some(ChainNode::ArrayCall(_))));
        match &chain.chain[2].node {
            Some(ChainNode::MethodCall(call)) => assert_eq!(call.arguments.len(), 2),
            other => panic!("expected method call, got {:?}", other),
        }
    }

    #[test]
    fn test_new_int_array() {
        let expr = expression_of("new int[n + 1];");
        let chain = match expr {
            Ast::Reference(chain) => chain,
            other => panic!("expected reference, got {:?}", other),
        };
        match &chain.chain[0].node {
            Some(ChainNode::NewObject(obj)) => {
                assert_eq!(obj.class_type.lexeme, "int");
                assert!(obj.array_size.is_some());
            }
            other => panic!("expected new object, got {:?}", other),
        }
    }

    #[test]
    fn test_not_applies_to_whole_expression() {
        let expr = expression_of("!a && b;");
        assert!(matches!(expr, Ast::Not(_)));
    }
}
