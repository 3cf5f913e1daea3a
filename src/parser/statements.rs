//! 语句解析
//!
//! 语句的首令牌由调用方读出后传入, 便于在块解析循环中统一分发。
//! `++` / `--` 在此处直接脱糖为 `+= 1` / `-= 1` 赋值。

use crate::ast::{
    Assignment, Ast, CodeBlock, ForStatement, IfStatement, LocalVariable, NumberLiteral,
    ReferenceChain, ReturnStatement, WhileStatement,
};
use crate::error::MjResult;
use crate::lexer::{Token, TokenKind};

use super::classes::is_valid_type;
use super::{ASSIGNMENT_OPERATORS, Parser};

impl Parser {
    /// 解析直到配对的 `}` 为止的语句序列
    pub(super) fn parse_code_block(&mut self, block: &mut CodeBlock) -> MjResult<()> {
        loop {
            let token = self.read()?;
            if token.is_lexeme(";") {
                continue;
            }
            if token.is_lexeme("}") {
                return Ok(());
            }
            self.parse_statement(token, block)?;
        }
    }

    /// 解析单条语句, `token` 为其首令牌
    pub(super) fn parse_statement(&mut self, token: Token, block: &mut CodeBlock) -> MjResult<()> {
        if token.is_lexeme("++") || token.is_lexeme("--") {
            self.parse_unary(token, None, block)?;
            return self.consume_optional_semicolon();
        }

        // 局部变量声明与表达式语句的消解: 类型样令牌后跟标识符
        // (或 `int` 后跟 `[`) 才是声明
        if is_valid_type(&token, false) {
            let is_declaration = match self.peek() {
                Some(next) => {
                    next.is_identifier() || (token.is_keyword("int") && next.is_lexeme("["))
                }
                None => false,
            };
            if is_declaration {
                self.unread();
                self.parse_local_variable(block)?;
                return self.consume_optional_semicolon();
            }
        }

        if token.is_keyword("if") {
            let stmt = self.parse_if_statement()?;
            block.codes.push(stmt);
        } else if token.is_keyword("while") {
            self.parse_while_statement(block)?;
        } else if token.is_keyword("do") {
            self.parse_do_while_statement(block)?;
        } else if token.is_keyword("for") {
            self.parse_for_statement(block)?;
        } else if token.is_keyword("return") {
            self.parse_return_statement(block)?;
        } else if token.is_keyword("break") {
            block.codes.push(Ast::Break(token));
        } else if token.is_keyword("continue") {
            block.codes.push(Ast::Continue(token));
        } else if token.is_lexeme("{") {
            let mut inner = CodeBlock::new();
            self.parse_code_block(&mut inner)?;
            block.codes.push(Ast::Block(inner));
        } else if token.is_identifier() || token.is_keyword("this") || token.is_keyword("new") {
            self.parse_assignment(token, block)?;
        } else {
            return Err(self.error("Failed to parse statement", Some(&token)));
        }

        self.consume_optional_semicolon()
    }

    fn consume_optional_semicolon(&mut self) -> MjResult<()> {
        if self.peek().is_some_and(|t| t.is_lexeme(";")) {
            self.read()?;
        }
        Ok(())
    }

    /// for 循环初始化槽位接受的简单语句
    pub(super) fn parse_simple_statement(
        &mut self,
        token: Token,
        block: &mut CodeBlock,
    ) -> MjResult<()> {
        if token.is_lexeme("++") || token.is_lexeme("--") {
            return self.parse_unary(token, None, block);
        }
        if is_valid_type(&token, false) {
            let is_declaration = match self.peek() {
                Some(next) => {
                    next.is_identifier() || (token.is_keyword("int") && next.is_lexeme("["))
                }
                None => false,
            };
            if is_declaration {
                self.unread();
                return self.parse_local_variable(block);
            }
        }
        self.parse_assignment(token, block)
    }

    /// `;` 是空块, `{` 开启块, 其余按单条语句处理
    fn parse_code_block_or_statement(&mut self, token: Token) -> MjResult<CodeBlock> {
        let mut block = CodeBlock::new();
        if token.is_lexeme(";") {
            return Ok(block);
        }
        if token.is_lexeme("{") {
            self.parse_code_block(&mut block)?;
            return Ok(block);
        }
        self.parse_statement(token, &mut block)?;
        Ok(block)
    }

    fn parse_local_variable(&mut self, block: &mut CodeBlock) -> MjResult<()> {
        let (field, name_token) = self.parse_param()?;
        block.codes.push(Ast::LocalVariable(LocalVariable::new(field)));

        let next = self.read()?;
        if next.is_lexeme(";") {
            self.unread();
            return Ok(());
        }
        if next.kind == TokenKind::Operator && ASSIGNMENT_OPERATORS.contains(&next.lexeme.as_str())
        {
            let mut chain = ReferenceChain::new();
            chain.add_field(name_token);
            let expression = self.parse_expression()?;
            block.codes.push(Ast::Assignment(Assignment::new(chain, next, expression)));
            return Ok(());
        }
        Err(self.error("Failed to parse local variable code, Expected ; or assignment", Some(&next)))
    }

    fn parse_return_statement(&mut self, block: &mut CodeBlock) -> MjResult<()> {
        if self.peek().is_some_and(|t| t.is_lexeme(";")) {
            self.read()?;
            block.codes.push(Ast::Return(ReturnStatement { expr: None, ty: String::new() }));
            return Ok(());
        }
        let expression = self.parse_expression()?;
        let semi = self.read()?;
        if !semi.is_lexeme(";") {
            return Err(self.error("Failed to parse return statement, Expected ;", Some(&semi)));
        }
        block.codes.push(Ast::Return(ReturnStatement {
            expr: Some(Box::new(expression)),
            ty: String::new(),
        }));
        Ok(())
    }

    fn parse_if_statement(&mut self) -> MjResult<Ast> {
        self.expect_lexeme("(", "Failed to parse if statement, Expected (")?;
        let condition = self.parse_expression()?;
        self.expect_lexeme(")", "Failed to parse if statement, Expected )")?;

        let token = self.read()?;
        let body = self.parse_code_block_or_statement(token)?;

        let mut else_body = None;
        if self.peek().is_some_and(|t| t.is_keyword("else")) {
            self.read()?;
            let token = self.read()?;
            if token.is_keyword("if") {
                else_body = Some(Box::new(self.parse_if_statement()?));
            } else {
                else_body = Some(Box::new(Ast::Block(self.parse_code_block_or_statement(token)?)));
            }
        }

        Ok(Ast::If(IfStatement {
            condition: Box::new(condition),
            body,
            else_body,
            ty: String::new(),
        }))
    }

    fn parse_while_statement(&mut self, block: &mut CodeBlock) -> MjResult<()> {
        self.expect_lexeme("(", "Failed to parse while statement, Expected (")?;
        let condition = self.parse_expression()?;
        self.expect_lexeme(")", "Failed to parse while statement, Expected )")?;

        let token = self.read()?;
        let body = self.parse_code_block_or_statement(token)?;
        block.codes.push(Ast::While(WhileStatement {
            condition: Box::new(condition),
            body,
            is_do_while: false,
            ty: String::new(),
        }));
        Ok(())
    }

    fn parse_do_while_statement(&mut self, block: &mut CodeBlock) -> MjResult<()> {
        let token = self.read()?;
        let body = self.parse_code_block_or_statement(token)?;

        let while_token = self.read()?;
        if !while_token.is_keyword("while") {
            return Err(self.error("Failed to parse do-while, Expected while", Some(&while_token)));
        }
        self.expect_lexeme("(", "Failed to parse do-while, Expected (")?;
        let condition = self.parse_expression()?;
        self.expect_lexeme(")", "Failed to parse do-while, Expected )")?;
        self.expect_lexeme(";", "Failed to parse do-while, Expected ;")?;

        block.codes.push(Ast::While(WhileStatement {
            condition: Box::new(condition),
            body,
            is_do_while: true,
            ty: String::new(),
        }));
        Ok(())
    }

    fn parse_for_statement(&mut self, block: &mut CodeBlock) -> MjResult<()> {
        self.expect_lexeme("(", "Failed to parse for statement, Expected (")?;

        let mut initialization = None;
        let token = self.read()?;
        if !token.is_lexeme(";") {
            let mut init = CodeBlock::new();
            self.parse_simple_statement(token, &mut init)?;
            initialization = Some(init);
            self.expect_lexeme(";", "Failed to parse for statement, Expected ;")?;
        }

        let mut condition = None;
        let token = self.read()?;
        if !token.is_lexeme(";") {
            self.unread();
            condition = Some(Box::new(self.parse_expression()?));
            self.expect_lexeme(";", "Failed to parse for statement, Expected ;")?;
        }

        let mut update = None;
        let token = self.read()?;
        if !token.is_lexeme(")") {
            let mut update_block = CodeBlock::new();
            if token.is_lexeme("++") || token.is_lexeme("--") {
                self.parse_unary(token, None, &mut update_block)?;
            } else {
                self.parse_assignment(token, &mut update_block)?;
            }
            update = Some(update_block);
            self.expect_lexeme(")", "Failed to parse for statement, Expected )")?;
        }

        let token = self.read()?;
        let body = if token.is_lexeme(";") {
            None
        } else {
            Some(self.parse_code_block_or_statement(token)?)
        };

        block.codes.push(Ast::For(ForStatement {
            initialization,
            condition,
            update,
            body,
            ty: String::new(),
        }));
        Ok(())
    }

    /// `++x` / `x--` 脱糖为 `x += 1` / `x -= 1`
    pub(super) fn parse_unary(
        &mut self,
        op: Token,
        chain: Option<ReferenceChain>,
        block: &mut CodeBlock,
    ) -> MjResult<()> {
        let chain = match chain {
            Some(chain) => chain,
            None => {
                let token = self.read()?;
                self.parse_reference_chain(token)?
            }
        };
        let lexeme = if op.is_lexeme("++") { "+=" } else { "-=" };
        let op_token = Token::new(TokenKind::Operator, lexeme, op.line, op.column);
        let one = Token::new(TokenKind::Number, "1", op.line, op.column);
        block.codes.push(Ast::Assignment(Assignment::new(
            chain,
            op_token,
            Ast::Number(NumberLiteral::new(one)),
        )));
        Ok(())
    }

    /// 引用链打头的语句: 赋值、自增自减或裸方法调用
    pub(super) fn parse_assignment(&mut self, token: Token, block: &mut CodeBlock) -> MjResult<()> {
        let chain = self.parse_reference_chain(token)?;
        let next = self.read()?;

        if next.kind == TokenKind::Operator && ASSIGNMENT_OPERATORS.contains(&next.lexeme.as_str())
        {
            let expression = self.parse_expression()?;
            block.codes.push(Ast::Assignment(Assignment::new(chain, next, expression)));
            return Ok(());
        }
        if next.is_lexeme("++") || next.is_lexeme("--") {
            return self.parse_unary(next, Some(chain), block);
        }
        if next.is_lexeme(";") {
            self.unread();
            block.codes.push(Ast::Reference(chain));
            return Ok(());
        }
        Err(self.error("Failed to parse assignment code, Expected assignment", Some(&next)))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::Ast;
    use crate::lexer::lex;
    use crate::parser::parse;

    fn body_of(statements: &str) -> Vec<Ast> {
        let source = format!("class A {{ public void f(int x) {{ {} }} }}", statements);
        let project = parse(lex(&source).unwrap()).unwrap();
        project.classes[0].methods[0].body.codes.clone()
    }

    #[test]
    fn test_braceless_if_else_bodies() {
        let codes = body_of("if (x > 0) x = 1; else x = 2;");
        assert_eq!(codes.len(), 1);
        let stmt = match &codes[0] {
            Ast::If(stmt) => stmt,
            other => panic!("expected if, got {:?}", other),
        };
        assert_eq!(stmt.body.codes.len(), 1);
        assert!(matches!(stmt.body.codes[0], Ast::Assignment(_)));
        match stmt.else_body.as_deref() {
            Some(Ast::Block(block)) => assert_eq!(block.codes.len(), 1),
            other => panic!("expected else block, got {:?}", other),
        }
    }

    #[test]
    fn test_braceless_while_body() {
        let codes = body_of("while (x > 0) x -= 1;");
        let stmt = match &codes[0] {
            Ast::While(stmt) => stmt,
            other => panic!("expected while, got {:?}", other),
        };
        assert!(!stmt.is_do_while);
        assert_eq!(stmt.body.codes.len(), 1);
    }

    #[test]
    fn test_braceless_do_while_body() {
        let codes = body_of("do x -= 1; while (x > 0);");
        let stmt = match &codes[0] {
            Ast::While(stmt) => stmt,
            other => panic!("expected do-while, got {:?}", other),
        };
        assert!(stmt.is_do_while);
        assert_eq!(stmt.body.codes.len(), 1);
        assert!(matches!(stmt.body.codes[0], Ast::Assignment(_)));
    }

    #[test]
    fn test_braceless_for_body() {
        let codes = body_of("for (int i = 0; i < 3; i++) x = i;");
        let stmt = match &codes[0] {
            Ast::For(stmt) => stmt,
            other => panic!("expected for, got {:?}", other),
        };
        let body = stmt.body.as_ref().unwrap();
        assert_eq!(body.codes.len(), 1);
        assert!(matches!(body.codes[0], Ast::Assignment(_)));
    }

    #[test]
    fn test_else_if_chain() {
        let codes = body_of("if (x > 2) x = 2; else if (x > 1) x = 1; else x = 0;");
        let stmt = match &codes[0] {
            Ast::If(stmt) => stmt,
            other => panic!("expected if, got {:?}", other),
        };
        match stmt.else_body.as_deref() {
            Some(Ast::If(inner)) => assert!(inner.else_body.is_some()),
            other => panic!("expected else-if, got {:?}", other),
        }
    }
}
