//! 逐节点的语义检查
//!
//! 对每个节点递归分析并把规范化类型字符串写回 `ty` 槽位。块分析跟踪
//! 终止语句: 返回之后的语句是不可达错误, 两个分支都返回的 if 也算
//! 终止。

use crate::ast::{
    ArrayCall, Assignment, Ast, ChainNode, CodeBlock, ForStatement, IfStatement, MethodCall,
    NewObject, ReferenceChain, ReturnStatement, WhileStatement,
};
use crate::error::{MjResult, semantic_error, semantic_error_at};

use super::symbol_table::{Scope, Symbol};

const ARITHMETIC_OPERATORS: &[&str] =
    &["+", "-", "*", "/", "%", "&", "^", "|", "<<", ">>", ">>>"];
const RELATIONAL_OPERATORS: &[&str] = &["<", ">", "<=", ">="];

fn is_primitive(ty: &str) -> bool {
    matches!(ty, "int" | "boolean" | "int[]")
}

/// 在新帧中分析一个语句块
pub(super) fn analyse_block(block: &mut CodeBlock, scope: &mut Scope) -> MjResult<()> {
    scope.push_frame();
    let result = analyse_block_statements(block, scope);
    scope.pop_frame();
    result
}

fn analyse_block_statements(block: &mut CodeBlock, scope: &mut Scope) -> MjResult<()> {
    block.ty = "void".to_string();
    let mut returns = false;
    for code in &mut block.codes {
        if returns {
            return Err(semantic_error("Unreachable statement"));
        }
        analyse(code, scope)?;
        match code {
            Ast::Return(_) => {
                block.ty = if scope.return_type == "void" {
                    "return-void".to_string()
                } else {
                    scope.return_type.clone()
                };
                returns = true;
            }
            Ast::If(stmt) if stmt.ty != "void" => {
                block.ty = stmt.ty.clone();
                returns = true;
            }
            _ => {}
        }
    }
    Ok(())
}

/// for 初始化槽位: 在外层帧中直接分析
fn analyse_block_same_scope(block: &mut CodeBlock, scope: &mut Scope) -> MjResult<()> {
    block.ty = "void".to_string();
    for code in &mut block.codes {
        analyse(code, scope)?;
    }
    Ok(())
}

pub(super) fn analyse(node: &mut Ast, scope: &mut Scope) -> MjResult<()> {
    match node {
        Ast::Block(block) => analyse_block(block, scope),
        Ast::LocalVariable(var) => {
            if !var.field.ty.is_primitive() && !scope.tables.contains(&var.field.ty.lexeme) {
                return Err(semantic_error(format!(
                    "Invalid type in variable declaration: '{}'",
                    var.field.ty.lexeme
                )));
            }
            scope.add_symbol(Symbol::variable(&var.field.name, &var.field.ty.lexeme))?;
            var.ty = var.field.ty.lexeme.clone();
            Ok(())
        }
        Ast::Assignment(assign) => analyse_assignment(assign, scope),
        Ast::Reference(chain) => analyse_chain(chain, scope),
        Ast::If(stmt) => analyse_if(stmt, scope),
        Ast::While(stmt) => analyse_while(stmt, scope),
        Ast::For(stmt) => analyse_for(stmt, scope),
        Ast::Return(stmt) => analyse_return(stmt, scope),
        Ast::Break(_) | Ast::Continue(_) => Ok(()),
        Ast::Binary(expr) => {
            analyse(&mut expr.left, scope)?;
            analyse(&mut expr.right, scope)?;
            let left = expr.left.ty().to_string();
            let right = expr.right.ty().to_string();
            if left != right {
                return Err(semantic_error(format!(
                    "Type mismatch in BinaryExpression: '{}' and '{}'",
                    left, right
                )));
            }
            let op = expr.op.lexeme.as_str();
            if ARITHMETIC_OPERATORS.contains(&op) {
                if left != "int" {
                    return Err(semantic_error(format!(
                        "Arithmetic operators require 'int', found '{}'",
                        left
                    )));
                }
                expr.ty = "int".to_string();
            } else if op == "&&" || op == "||" {
                if left != "boolean" {
                    return Err(semantic_error(format!(
                        "Logical operators require 'boolean', found '{}'",
                        left
                    )));
                }
                expr.ty = "boolean".to_string();
            } else if RELATIONAL_OPERATORS.contains(&op) {
                if left != "int" {
                    return Err(semantic_error(format!(
                        "Relational operators require 'int', found '{}'",
                        left
                    )));
                }
                expr.ty = "boolean".to_string();
            } else if op == "==" || op == "!=" {
                expr.ty = "boolean".to_string();
            } else {
                return Err(semantic_error(format!("Unsupported relational operator: {}", op)));
            }
            Ok(())
        }
        Ast::Not(expr) => {
            analyse(&mut expr.expr, scope)?;
            let inner = expr.expr.ty();
            if expr.op.is_lexeme("!") {
                if inner != "boolean" {
                    return Err(semantic_error(format!(
                        "Operator '!' requires 'boolean', found '{}'",
                        inner
                    )));
                }
                expr.ty = "boolean".to_string();
            } else {
                if inner != "int" {
                    return Err(semantic_error(format!(
                        "Operator '~' requires 'int', found '{}'",
                        inner
                    )));
                }
                expr.ty = "int".to_string();
            }
            Ok(())
        }
        Ast::Cast(expr) => {
            analyse(&mut expr.expr, scope)?;
            let target = expr.cast.lexeme.clone();
            if !scope.tables.contains(&target) {
                return Err(semantic_error(format!(
                    "Undefined type in CastExpression: '{}'",
                    target
                )));
            }
            let from = expr.expr.ty().to_string();
            if !scope.tables.can_cast(&from, &target) && !scope.tables.can_cast(&target, &from) {
                return Err(semantic_error(format!("Cannot cast '{}' to '{}'", from, target)));
            }
            expr.ty = target;
            Ok(())
        }
        Ast::Number(literal) => {
            literal.ty = "int".to_string();
            Ok(())
        }
        Ast::Boolean(literal) => {
            literal.ty = "boolean".to_string();
            Ok(())
        }
    }
}

fn analyse_assignment(assign: &mut Assignment, scope: &mut Scope) -> MjResult<()> {
    analyse_chain(&mut assign.reference, scope)?;
    if assign.reference.is_array_length {
        let index = assign.reference.chain.len().saturating_sub(2);
        let name = assign
            .reference
            .chain
            .get(index)
            .map(|link| link.token.lexeme.clone())
            .unwrap_or_default();
        return Err(semantic_error(format!("You can not set length of array '{}'", name)));
    }

    analyse(&mut assign.expression, scope)?;
    let lhs = assign.reference.ty.clone();
    let rhs = assign.expression.ty().to_string();

    if assign.op.is_lexeme("=") {
        if lhs == "void" || rhs == "void" {
            return Err(semantic_error(
                "Type mismatch in assignment: Cannot assign value of type void",
            ));
        }
        if lhs != rhs && (is_primitive(&lhs) || !scope.tables.can_cast(&rhs, &lhs)) {
            return Err(semantic_error(format!(
                "Type mismatch in assignment: Cannot assign value of type '{}' to variable/field of type '{}'",
                rhs, lhs
            )));
        }
    } else {
        if lhs != "int" {
            return Err(semantic_error(format!(
                "Compound assignment requires 'int' on the left, found '{}'",
                lhs
            )));
        }
        if rhs != "int" {
            return Err(semantic_error(format!(
                "Compound assignment requires 'int' on the right, found '{}'",
                rhs
            )));
        }
    }
    assign.ty = "void".to_string();
    Ok(())
}

fn analyse_return(stmt: &mut ReturnStatement, scope: &mut Scope) -> MjResult<()> {
    stmt.ty = "void".to_string();
    let expected = scope.return_type.clone();
    match &mut stmt.expr {
        Some(expr) => {
            analyse(expr, scope)?;
            let got = expr.ty().to_string();
            if got == "void" {
                return Err(semantic_error("Return expression can not be of type 'void'"));
            }
            if got != expected && (is_primitive(&expected) || !scope.tables.can_cast(&got, &expected))
            {
                return Err(semantic_error(format!(
                    "Return type expression expected to be '{}' but got '{}'",
                    expected, got
                )));
            }
            Ok(())
        }
        None => {
            if expected != "void" {
                return Err(semantic_error(format!(
                    "Return type expression expected to be '{}' but got 'void'",
                    expected
                )));
            }
            Ok(())
        }
    }
}

fn analyse_if(stmt: &mut IfStatement, scope: &mut Scope) -> MjResult<()> {
    analyse(&mut stmt.condition, scope)?;
    if stmt.condition.ty() != "boolean" {
        return Err(semantic_error(format!(
            "Condition in 'if' statement must be of type 'boolean', but got '{}'.",
            stmt.condition.ty()
        )));
    }
    analyse_block(&mut stmt.body, scope)?;
    stmt.ty = "void".to_string();
    if let Some(else_body) = &mut stmt.else_body {
        analyse(else_body, scope)?;
        // 两个分支都终止时, if 本身算作终止语句
        if stmt.body.ty != "void" && else_body.ty() != "void" {
            stmt.ty = stmt.body.ty.clone();
        }
    }
    Ok(())
}

fn analyse_while(stmt: &mut WhileStatement, scope: &mut Scope) -> MjResult<()> {
    analyse(&mut stmt.condition, scope)?;
    if stmt.condition.ty() != "boolean" {
        return Err(semantic_error(format!(
            "Condition in 'while' statement must be of type 'boolean', but got '{}'.",
            stmt.condition.ty()
        )));
    }
    analyse_block(&mut stmt.body, scope)?;
    stmt.ty = "void".to_string();
    Ok(())
}

fn analyse_for(stmt: &mut ForStatement, scope: &mut Scope) -> MjResult<()> {
    scope.push_frame();
    let result = analyse_for_parts(stmt, scope);
    scope.pop_frame();
    result
}

fn analyse_for_parts(stmt: &mut ForStatement, scope: &mut Scope) -> MjResult<()> {
    if let Some(init) = &mut stmt.initialization {
        analyse_block_same_scope(init, scope)?;
    }
    if let Some(condition) = &mut stmt.condition {
        analyse(condition, scope)?;
        if condition.ty() != "boolean" {
            return Err(semantic_error(format!(
                "The condition in a for-loop must evaluate to 'boolean', found '{}'.",
                condition.ty()
            )));
        }
    }
    if let Some(update) = &mut stmt.update {
        analyse_block(update, scope)?;
    }
    if let Some(body) = &mut stmt.body {
        analyse_block(body, scope)?;
    }
    stmt.ty = "void".to_string();
    Ok(())
}

pub(super) fn analyse_chain(chain: &mut ReferenceChain, scope: &mut Scope) -> MjResult<()> {
    chain.is_array_length = false;
    if chain.chain.is_empty() {
        return Err(semantic_error("Empty reference chain"));
    }

    let mut ty: String;
    let first_is_this = chain.chain[0].token.is_keyword("this");
    if first_is_this || chain.chain[0].node.is_some() {
        let table = scope
            .current_class()
            .ok_or_else(|| semantic_error("Failed to get current class symbol table"))?;
        ty = table.class_name.clone();
    } else {
        let token = chain.chain[0].token.clone();
        let symbol = scope.lookup(&token.lexeme).ok_or_else(|| {
            semantic_error_at(format!("Undefined reference: '{}'", token.lexeme), &token)
        })?;
        ty = symbol.ty.clone();
    }

    if let Some(node) = &mut chain.chain[0].node {
        match node {
            ChainNode::MethodCall(call) => call.caller_type = ty.clone(),
            ChainNode::ArrayCall(call) => call.caller_type = String::new(),
            ChainNode::NewObject(_) => {}
        }
        analyse_chain_node(node, scope)?;
        ty = node.ty().to_string();
    }

    for i in 1..chain.chain.len() {
        if chain.chain[i].node.is_some() {
            let caller_type = ty.clone();
            if let Some(node) = &mut chain.chain[i].node {
                match node {
                    ChainNode::MethodCall(call) => call.caller_type = caller_type,
                    ChainNode::ArrayCall(call) => call.caller_type = caller_type,
                    ChainNode::NewObject(_) => {}
                }
                analyse_chain_node(node, scope)?;
                ty = node.ty().to_string();
            }
        } else {
            let token = chain.chain[i].token.clone();
            let member = token.lexeme.as_str();
            if ty == "int[]" && member == "length" {
                chain.is_array_length = true;
            }
            if !scope.tables.contains(&ty) {
                return Err(semantic_error(format!(
                    "Type '{}' has no members. Cannot access '{}'",
                    ty, member
                )));
            }
            let symbol = scope.tables.lookup(&ty, member).ok_or_else(|| {
                semantic_error_at(format!("Undefined member '{}'", member), &token)
            })?;
            ty = symbol.ty.clone();
        }
    }

    chain.ty = ty;
    Ok(())
}

fn analyse_chain_node(node: &mut ChainNode, scope: &mut Scope) -> MjResult<()> {
    match node {
        ChainNode::MethodCall(call) => analyse_method_call(call, scope),
        ChainNode::ArrayCall(call) => analyse_array_call(call, scope),
        ChainNode::NewObject(obj) => analyse_new_object(obj, scope),
    }
}

fn analyse_method_call(call: &mut MethodCall, scope: &mut Scope) -> MjResult<()> {
    let caller = call.caller_type.clone();
    if !scope.tables.contains(&caller) {
        return Err(semantic_error(format!(
            "Type error: Object of type '{}' is not a valid class or does not exist.",
            caller
        )));
    }
    let name = call.name.lexeme.clone();
    let symbol = scope
        .tables
        .lookup(&caller, &name)
        .cloned()
        .ok_or_else(|| {
            semantic_error(format!("Undefined method: '{}' in type '{}'.", name, caller))
        })?;
    if !symbol.is_method {
        return Err(semantic_error(format!("'{}' is not a method.", name)));
    }
    if symbol.params.len() != call.arguments.len() {
        return Err(semantic_error(format!(
            "Argument mismatch in method call to '{}': expected {} arguments, but got {}.",
            name,
            symbol.params.len(),
            call.arguments.len()
        )));
    }
    for (i, argument) in call.arguments.iter_mut().enumerate() {
        analyse(argument, scope)?;
        if argument.ty() != symbol.params[i] {
            return Err(semantic_error(format!(
                "Type mismatch for argument {} in method call to '{}': expected '{}', but got '{}'.",
                i + 1,
                name,
                symbol.params[i],
                argument.ty()
            )));
        }
    }
    call.ty = symbol.return_type;
    Ok(())
}

fn analyse_array_call(call: &mut ArrayCall, scope: &mut Scope) -> MjResult<()> {
    let name = call.name.lexeme.clone();
    let symbol = if call.caller_type.is_empty() {
        scope.lookup(&name).cloned()
    } else {
        scope.tables.lookup(&call.caller_type, &name).cloned()
    };
    let symbol = symbol
        .ok_or_else(|| semantic_error_at(format!("Undefined array: '{}'", name), &call.name))?;
    if symbol.ty != "int[]" {
        return Err(semantic_error(format!("'{}' is not an array.", name)));
    }
    analyse(&mut call.bracket, scope)?;
    if call.bracket.ty() != "int" {
        return Err(semantic_error(format!(
            "Array index must be of type 'int', but got '{}'",
            call.bracket.ty()
        )));
    }
    call.ty = "int".to_string();
    Ok(())
}

fn analyse_new_object(obj: &mut NewObject, scope: &mut Scope) -> MjResult<()> {
    match &mut obj.array_size {
        Some(size) => {
            analyse(size, scope)?;
            if size.ty() != "int" {
                return Err(semantic_error(format!(
                    "Array size must be type of 'int' but got '{}'",
                    size.ty()
                )));
            }
            obj.ty = "int[]".to_string();
        }
        None => {
            let name = obj.class_type.lexeme.clone();
            if !scope.tables.contains(&name) {
                return Err(semantic_error(format!(
                    "Undefined class type in NewObject: '{}'",
                    name
                )));
            }
            obj.ty = name;
        }
    }
    Ok(())
}
