//! 三地址码式的语句下译
//!
//! 方法体被压平为临时变量赋值、标签与 goto。`TacGen` 按方法重置临时
//! 变量计数, 标签计数按前缀独立; 深度控制缩进与嵌套块的花括号,
//! for 循环的初始化块以冻结方式并入循环自身的块。

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::ast::Ast;
use crate::error::{MjResult, codegen_error};
use crate::semantic::ClassTables;
use crate::types::{Class, Project};

use super::chains::generate_chain;
use super::classes::c_type;

pub struct TacGen<'a> {
    pub project: &'a Project,
    pub class: &'a Class,
    pub tables: &'a ClassTables,
    pub code: String,
    /// 方法体中用到的类型, 决定源文件的附加 include
    pub types_used: &'a mut BTreeSet<String>,
    temp_counter: usize,
    label_counters: BTreeMap<String, usize>,
    depth: i32,
    block_freeze: bool,
    local_variables: Vec<HashMap<String, String>>,
    /// 内层循环的 (continue 目标, break 目标)
    label_stack: Vec<(String, String)>,
}

impl<'a> TacGen<'a> {
    pub fn new(
        project: &'a Project,
        class: &'a Class,
        tables: &'a ClassTables,
        types_used: &'a mut BTreeSet<String>,
    ) -> Self {
        Self {
            project,
            class,
            tables,
            code: String::new(),
            types_used,
            temp_counter: 0,
            label_counters: BTreeMap::new(),
            depth: -1,
            block_freeze: false,
            local_variables: Vec::new(),
            label_stack: Vec::new(),
        }
    }

    pub fn open_block(&mut self) {
        if self.block_freeze {
            return;
        }
        if self.depth >= 1 {
            self.emit("{");
        }
        self.depth += 1;
        self.local_variables.push(HashMap::new());
    }

    pub fn close_block(&mut self) {
        if self.block_freeze {
            return;
        }
        self.depth -= 1;
        if self.depth >= 1 {
            self.emit("}");
        }
        self.local_variables.pop();
    }

    pub fn freeze(&mut self, frozen: bool) {
        self.block_freeze = frozen;
    }

    pub fn push_label(&mut self, start: String, end: String) {
        self.label_stack.push((start, end));
    }

    pub fn pop_label(&mut self) {
        self.label_stack.pop();
    }

    pub fn break_now(&mut self) -> MjResult<()> {
        let target = match self.label_stack.last() {
            Some((_, end)) => end.clone(),
            None => {
                return Err(codegen_error(
                    "Failed to call break, break statement must be called inside a loop",
                ));
            }
        };
        self.emit(&format!("goto {}", target));
        Ok(())
    }

    pub fn continue_now(&mut self) -> MjResult<()> {
        let target = match self.label_stack.last() {
            Some((start, _)) => start.clone(),
            None => {
                return Err(codegen_error(
                    "Failed to call continue, continue statement must be called inside a loop",
                ));
            }
        };
        self.emit(&format!("goto {}", target));
        Ok(())
    }

    /// 单字符行 (花括号) 不加分号
    pub fn emit(&mut self, line: &str) {
        let tabs = if self.depth > 0 { self.depth as usize } else { 0 };
        self.code.push_str(&"\t".repeat(tabs));
        self.code.push_str(line);
        self.code.push_str(if line.len() > 1 { ";\n" } else { "\n" });
    }

    pub fn new_line(&mut self) {
        self.code.push('\n');
    }

    pub fn emit_label(&mut self, label: &str) {
        let tabs = if self.depth > 0 { self.depth as usize } else { 0 };
        self.code.push_str(&"\t".repeat(tabs));
        self.code.push_str(label);
        self.code.push_str(":;\n");
    }

    /// 局部变量记入当前块的帧, 块结束随帧弹出
    pub fn add_variable(&mut self, name: &str, ty: &str) {
        if let Some(frame) = self.local_variables.last_mut() {
            frame.insert(name.to_string(), ty.to_string());
        }
        self.types_used.insert(ty.to_string());
    }

    pub fn record_type(&mut self, ty: &str) {
        self.types_used.insert(ty.to_string());
    }

    /// 局部变量的类型, 内层帧优先, 找不到返回空串
    pub fn lookup(&self, name: &str) -> String {
        for frame in self.local_variables.iter().rev() {
            if let Some(ty) = frame.get(name) {
                return ty.clone();
            }
        }
        String::new()
    }

    /// 字段位于继承链上第几层 (1 = 本类), 以及其类型; 0 表示不是字段
    pub fn lookup_class_nested_count(&self, name: &str) -> (usize, String) {
        let mut count = 1;
        let mut class = Some(self.class);
        while let Some(current) = class {
            if let Some(field) = current.fields.iter().find(|f| f.name == name) {
                return (count, field.ty.lexeme.clone());
            }
            match &current.extends {
                Some(parent) => {
                    class = self.project.class_by_name(parent);
                    count += 1;
                }
                None => break,
            }
        }
        (0, String::new())
    }

    pub fn new_temp(&mut self) -> String {
        let temp = format!("$_t_{}", self.temp_counter);
        self.temp_counter += 1;
        temp
    }

    pub fn new_label(&mut self, prefix: &str) -> String {
        let counter = self.label_counters.entry(prefix.to_string()).or_insert(0);
        let label = format!("{}_{}", prefix, counter);
        *counter += 1;
        label
    }
}

fn not_condition(condition: &str) -> String {
    match condition {
        "true" => "false".to_string(),
        "false" => "true".to_string(),
        _ => format!("!({})", condition),
    }
}

pub fn generate_block(tgen: &mut TacGen, block: &crate::ast::CodeBlock) -> MjResult<()> {
    tgen.open_block();
    let last = block.codes.len().saturating_sub(1);
    for (i, code) in block.codes.iter().enumerate() {
        generate_node(tgen, code)?;
        let compact = matches!(code, Ast::LocalVariable(_) | Ast::Assignment(_));
        if i != last && !compact {
            tgen.new_line();
        }
    }
    tgen.close_block();
    Ok(())
}

/// 下译一个节点, 返回其值的 C 表达式 (语句返回空串)
pub fn generate_node(tgen: &mut TacGen, node: &Ast) -> MjResult<String> {
    match node {
        Ast::Block(block) => {
            generate_block(tgen, block)?;
            Ok(String::new())
        }
        Ast::LocalVariable(var) => {
            tgen.emit(&format!("{}{}", c_type(&var.field.ty.lexeme), var.field.name));
            tgen.add_variable(&var.field.name, &var.field.ty.lexeme);
            Ok(String::new())
        }
        Ast::Assignment(assign) => {
            // 先右值后左值
            let value = generate_node(tgen, &assign.expression)?;
            let reference = generate_chain(tgen, &assign.reference)?;
            tgen.emit(&format!("{} {} {}", reference, assign.op.lexeme, value));
            Ok(value)
        }
        Ast::Reference(chain) => generate_chain(tgen, chain),
        Ast::Return(stmt) => {
            match &stmt.expr {
                Some(expr) => {
                    let value = generate_node(tgen, expr)?;
                    tgen.emit(&format!("return {}", value));
                }
                None => tgen.emit("return"),
            }
            Ok(String::new())
        }
        Ast::Break(_) => {
            tgen.break_now()?;
            Ok(String::new())
        }
        Ast::Continue(_) => {
            tgen.continue_now()?;
            Ok(String::new())
        }
        Ast::Number(literal) => Ok(literal.token.lexeme.replace('_', "")),
        Ast::Boolean(literal) => Ok(literal.token.lexeme.clone()),
        Ast::Binary(expr) => {
            let left = generate_node(tgen, &expr.left)?;
            let right = generate_node(tgen, &expr.right)?;
            let result = tgen.new_temp();
            if expr.op.is_lexeme(">>>") {
                // C 没有无符号右移, 借道 unsigned int
                tgen.emit(&format!(
                    "{}{} = (int) ((unsigned int) ({}) >> {})",
                    c_type(&expr.ty),
                    result,
                    left,
                    right
                ));
            } else {
                tgen.emit(&format!(
                    "{}{} = {} {} {}",
                    c_type(&expr.ty),
                    result,
                    left,
                    expr.op.lexeme,
                    right
                ));
            }
            Ok(result)
        }
        Ast::Not(expr) => {
            let value = generate_node(tgen, &expr.expr)?;
            let result = tgen.new_temp();
            tgen.emit(&format!("{}{} = {}{}", c_type(&expr.ty), result, expr.op.lexeme, value));
            Ok(result)
        }
        Ast::Cast(expr) => {
            let value = generate_node(tgen, &expr.expr)?;
            let result = tgen.new_temp();
            tgen.emit(&format!(
                "{}{} = ({}) {}",
                c_type(&expr.ty),
                result,
                c_type(&expr.ty).trim_end(),
                value
            ));
            Ok(result)
        }
        Ast::If(stmt) => {
            let condition = generate_node(tgen, &stmt.condition)?;
            let then_label = tgen.new_label("if_then");
            let end_label = tgen.new_label("if_end");
            let else_label = if stmt.else_body.is_some() {
                Some(tgen.new_label("if_else"))
            } else {
                None
            };
            let miss_target = else_label.clone().unwrap_or_else(|| end_label.clone());
            tgen.emit(&format!("if ({}) goto {}", not_condition(&condition), miss_target));
            tgen.emit_label(&then_label);
            generate_block(tgen, &stmt.body)?;
            tgen.emit(&format!("goto {}", end_label));
            if let (Some(else_label), Some(else_body)) = (&else_label, &stmt.else_body) {
                tgen.emit_label(else_label);
                generate_node(tgen, else_body)?;
            }
            tgen.emit_label(&end_label);
            Ok(String::new())
        }
        Ast::While(stmt) => {
            let start = tgen.new_label("while_start");
            let end = tgen.new_label("while_end");
            tgen.push_label(start.clone(), end.clone());
            tgen.emit_label(&start);
            if stmt.is_do_while {
                generate_block(tgen, &stmt.body)?;
                let condition = generate_node(tgen, &stmt.condition)?;
                tgen.emit(&format!("if ({}) goto {}", not_condition(&condition), end));
            } else {
                let condition = generate_node(tgen, &stmt.condition)?;
                tgen.emit(&format!("if ({}) goto {}", not_condition(&condition), end));
                generate_block(tgen, &stmt.body)?;
            }
            tgen.emit(&format!("goto {}", start));
            tgen.emit_label(&end);
            tgen.pop_label();
            Ok(String::new())
        }
        Ast::For(stmt) => {
            // 归纳变量的作用域是循环自身的块
            tgen.open_block();
            if let Some(init) = &stmt.initialization {
                tgen.freeze(true);
                generate_block(tgen, init)?;
                tgen.freeze(false);
            }
            let start = tgen.new_label("for_start");
            let body_label = tgen.new_label("for_body");
            let update_label = tgen.new_label("for_update");
            let end = tgen.new_label("for_end");
            tgen.push_label(update_label.clone(), end.clone());
            tgen.emit_label(&start);
            if let Some(condition) = &stmt.condition {
                let value = generate_node(tgen, condition)?;
                tgen.emit(&format!("if ({}) goto {}", not_condition(&value), end));
            }
            tgen.emit_label(&body_label);
            if let Some(body) = &stmt.body {
                generate_block(tgen, body)?;
            }
            tgen.emit_label(&update_label);
            if let Some(update) = &stmt.update {
                generate_block(tgen, update)?;
            }
            tgen.emit(&format!("goto {}", start));
            tgen.emit_label(&end);
            tgen.pop_label();
            tgen.close_block();
            Ok(String::new())
        }
    }
}
