//! 类、成员与类型解析

use crate::ast::CodeBlock;
use crate::error::MjResult;
use crate::lexer::Token;
use crate::types::{Class, Field, Method, Project, Type};

use super::Parser;

/// 类型位置上合法的令牌: int / boolean / (可选 void) / 类名标识符
pub(super) fn is_valid_type(token: &Token, can_be_void: bool) -> bool {
    token.is_keyword("int")
        || token.is_keyword("boolean")
        || (can_be_void && token.is_keyword("void"))
        || token.is_identifier()
}

impl Parser {
    /// 解析一个类声明 (调用前 `class` 关键字已被消费)
    pub(super) fn parse_class(&mut self, project: &mut Project) -> MjResult<()> {
        let name = self.read()?;
        if !name.is_identifier() {
            return Err(self.error("Failed to parse class name, Expected identifier", Some(&name)));
        }
        if project.contains_class(&name.lexeme) {
            return Err(self.error(format!("Class {} already exists!", name.lexeme), Some(&name)));
        }

        let mut clazz = Class::new(name.lexeme.clone());
        if self.peek().is_some_and(|t| t.is_keyword("extends")) {
            self.read()?;
            let parent = self.read()?;
            if !parent.is_identifier() {
                return Err(self.error("Failed to parse class, Expected identifier", Some(&parent)));
            }
            if parent.lexeme == name.lexeme {
                return Err(
                    self.error("Failed to parse class, class can not extend itself", Some(&parent))
                );
            }
            clazz.extends = Some(parent.lexeme);
        }

        let brace = self.read()?;
        if !brace.is_lexeme("{") {
            return Err(self.error(
                format!("Failed to parse class {}, Expected {{", name.lexeme),
                Some(&brace),
            ));
        }

        self.parse_class_scope(&mut clazz)?;
        project.classes.push(clazz);
        Ok(())
    }

    fn parse_class_scope(&mut self, clazz: &mut Class) -> MjResult<()> {
        loop {
            let token = self.read()?;
            if token.is_lexeme("}") {
                return Ok(());
            }
            self.unread();
            self.parse_field_or_method(clazz)?;
        }
    }

    fn parse_field_or_method(&mut self, clazz: &mut Class) -> MjResult<()> {
        let (ty, is_static) = self.parse_member_type()?;
        let name = self.read()?;
        if !name.is_identifier() {
            return Err(self.error("Failed to parse field, Expected identifier", Some(&name)));
        }

        let next = self.read()?;
        if next.is_lexeme(";") {
            if is_static {
                return Err(self.error("Failed to parse field, Field can not be static", Some(&name)));
            }
            if clazz.contains_field(&name.lexeme) {
                return Err(self.error(
                    format!("Field {} already exists in {}", name.lexeme, clazz.name),
                    Some(&name),
                ));
            }
            clazz.fields.push(Field::new(ty, name.lexeme));
            return Ok(());
        }

        if next.is_lexeme("(") {
            if is_static && !(ty.lexeme == "void" && name.lexeme == "main") {
                return Err(self.error(
                    "Failed to parse method, Only main method can be static",
                    Some(&name),
                ));
            }
            if clazz.contains_method(&name.lexeme) {
                return Err(self.error(
                    format!("Method {} already exists in {}", name.lexeme, clazz.name),
                    Some(&name),
                ));
            }
            let mut method = Method::new(ty, name.lexeme, is_static);
            self.parse_method_params(&mut method)?;
            self.parse_method_body(&mut method)?;
            clazz.methods.push(method);
            return Ok(());
        }

        Err(self.error("Failed to parse field, Expected ;", Some(&next)))
    }

    /// 成员声明前缀: 可选 public, 可选 static, 然后是类型
    fn parse_member_type(&mut self) -> MjResult<(Type, bool)> {
        let mut token = self.read()?;
        if token.is_keyword("public") {
            token = self.read()?;
        }
        let mut is_static = false;
        if token.is_keyword("static") {
            is_static = true;
            token = self.read()?;
        }
        let ty = self.finish_type(token, true)?;
        Ok((ty, is_static))
    }

    /// 从已读取的首令牌完成类型解析 (`int` 后可跟 `[]`)
    pub(super) fn finish_type(&mut self, token: Token, can_be_void: bool) -> MjResult<Type> {
        if !is_valid_type(&token, can_be_void) {
            return Err(self.error("Failed to parse type, Expected a type", Some(&token)));
        }
        if token.is_keyword("int") {
            if self.peek().is_some_and(|t| t.is_lexeme("[")) {
                self.read()?;
                let close = self.read()?;
                if !close.is_lexeme("]") {
                    return Err(self.error("Failed to parse type, Expected int[]", Some(&close)));
                }
                return Ok(Type::int_array());
            }
            return Ok(Type::int());
        }
        if token.is_keyword("boolean") {
            return Ok(Type::boolean());
        }
        if token.is_keyword("void") {
            return Ok(Type::void());
        }
        Ok(Type::class(token.lexeme))
    }

    /// 解析 `<type> <name>`; 也接受 `String[] args` 形式的形参
    pub(super) fn parse_param(&mut self) -> MjResult<(Field, Token)> {
        let first = self.read()?;
        let ty = self.finish_type(first, false)?;
        let mut name = self.read()?;
        if name.is_lexeme("[") {
            let close = self.read()?;
            if !close.is_lexeme("]") {
                return Err(self.error("Failed to parse param, Expected ]", Some(&close)));
            }
            name = self.read()?;
        }
        if !name.is_identifier() {
            return Err(self.error("Failed to parse param, Expected identifier", Some(&name)));
        }
        Ok((Field::new(ty, name.lexeme.clone()), name))
    }

    fn parse_method_params(&mut self, method: &mut Method) -> MjResult<()> {
        if self.peek().is_some_and(|t| t.is_lexeme(")")) {
            self.read()?;
            return Ok(());
        }
        loop {
            let (param, name_token) = self.parse_param()?;
            if method.contains_param(&param.name) {
                return Err(self.error(
                    format!("Param {} already exists in {}", param.name, method.name),
                    Some(&name_token),
                ));
            }
            method.params.push(param);

            let sep = self.read()?;
            if sep.is_lexeme(",") {
                continue;
            }
            if sep.is_lexeme(")") {
                return Ok(());
            }
            return Err(self.error("Failed to parse method, expected , or )", Some(&sep)));
        }
    }

    fn parse_method_body(&mut self, method: &mut Method) -> MjResult<()> {
        let brace = self.read()?;
        if !brace.is_lexeme("{") {
            return Err(self.error(
                format!("Failed to parse method {}, Expected {{", method.name),
                Some(&brace),
            ));
        }
        let mut body = CodeBlock::new();
        self.parse_code_block(&mut body)?;
        method.body = body;
        Ok(())
    }
}
