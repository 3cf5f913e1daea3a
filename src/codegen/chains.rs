//! 引用链下译
//!
//! 局部变量按名输出; 字段按其在继承链上的深度展开为 `super->super.…`
//! 前缀; 方法调用经函数指针成员分发, 上爬后用 `.` 连接; 数组访问落到
//! `->data[…]`; `System.out` 的打印调用特化为 printf。

use crate::ast::{ArrayCall, ChainNode, MethodCall, NewObject, ReferenceChain};
use crate::error::{MjResult, codegen_error};
use crate::semantic::{Symbol, SymbolTable};

use super::classes::c_type;
use super::tac::{TacGen, generate_node};

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// `System.out.print/printf/println(int)` 的特化; 命中返回 true
fn generate_print(tgen: &mut TacGen, chain: &ReferenceChain) -> MjResult<bool> {
    if chain.chain.len() != 3 {
        return Ok(false);
    }
    if chain.chain[0].token.lexeme != "System" || chain.chain[0].node.is_some() {
        return Ok(false);
    }
    if chain.chain[1].token.lexeme != "out" || chain.chain[1].node.is_some() {
        return Ok(false);
    }
    let call = match &chain.chain[2].node {
        Some(ChainNode::MethodCall(call)) => call,
        _ => return Ok(false),
    };
    if !matches!(call.name.lexeme.as_str(), "print" | "printf" | "println") {
        return Ok(false);
    }
    if call.arguments.len() != 1 || call.arguments[0].ty() != "int" {
        return Ok(false);
    }

    let format = if call.name.lexeme == "println" { "%d\\n" } else { "%d" };
    let value = generate_node(tgen, &call.arguments[0])?;
    tgen.emit(&format!("printf(\"{}\", {})", format, value));
    Ok(true)
}

fn generate_new_object(tgen: &mut TacGen, obj: &NewObject) -> MjResult<String> {
    let temp = tgen.new_temp();
    match &obj.array_size {
        Some(size) => {
            let value = generate_node(tgen, size)?;
            tgen.emit(&format!("__int_array *{} = $_new___int_array({})", temp, value));
        }
        None => {
            let name = obj.class_type.lexeme.clone();
            tgen.record_type(&name);
            tgen.emit(&format!("{0} *{1} = $_new_{0}()", name, temp));
        }
    }
    Ok(temp)
}

fn generate_array_call(tgen: &mut TacGen, call: &ArrayCall, caller: &str) -> MjResult<String> {
    let index = generate_node(tgen, &call.bracket)?;
    Ok(format!("{}{}->data[{}]", caller, call.name.lexeme, index))
}

/// 非标识符形式的接收者先落到临时变量; 上爬过的接收者用 `.` 分发,
/// 实参里传上爬前的指针
fn generate_method_call(
    tgen: &mut TacGen,
    call: &MethodCall,
    climbed: bool,
    caller: &str,
    caller_org: &str,
) -> MjResult<String> {
    let (receiver, receiver_arg) = if is_identifier(caller) || climbed {
        (caller.to_string(), caller_org.to_string())
    } else {
        let temp = tgen.new_temp();
        tgen.emit(&format!("{}{} = {}", c_type(&call.caller_type), temp, caller));
        (temp.clone(), temp)
    };

    let mut arguments = vec![receiver_arg];
    for argument in &call.arguments {
        arguments.push(generate_node(tgen, argument)?);
    }
    let argument_list = arguments.join(", ");
    let separator = if climbed { "." } else { "->" };
    let method = format!("{}{}$_function_{}", receiver, separator, call.name.lexeme);

    if call.ty != "void" {
        let result = tgen.new_temp();
        tgen.emit(&format!("{}{} = {}({})", c_type(&call.ty), result, method, argument_list));
        Ok(result)
    } else {
        tgen.emit(&format!("{}({})", method, argument_list));
        Ok(String::new())
    }
}

pub(super) fn generate_chain(tgen: &mut TacGen, chain: &ReferenceChain) -> MjResult<String> {
    if generate_print(tgen, chain)? {
        return Ok(String::new());
    }

    let tables = tgen.tables;
    let clazz = tgen.class;
    let mut current_table: Option<&SymbolTable> = None;
    let mut current_type = String::new();
    let mut output = String::new();
    let mut is_pointer = true;

    for (i, entry) in chain.chain.iter().enumerate() {
        let lexeme = entry.token.lexeme.as_str();

        if i == 0 {
            if entry.token.is_keyword("this") && entry.node.is_none() {
                output.push_str("super");
                current_type = clazz.name.clone();
                current_table = tables.get(&current_type);
                continue;
            }
            match &entry.node {
                Some(ChainNode::MethodCall(_)) => {
                    // 对自身的调用, 走下方的成员处理
                    output.push_str("super");
                    current_type = clazz.name.clone();
                }
                Some(ChainNode::ArrayCall(call)) => {
                    let local_type = tgen.lookup(lexeme);
                    if local_type.is_empty() {
                        let (count, field_type) = tgen.lookup_class_nested_count(lexeme);
                        for j in 0..count {
                            output.push_str(if j == 0 { "super->" } else { "super." });
                        }
                        current_type = field_type;
                    } else {
                        current_type = local_type;
                    }
                    output = generate_array_call(tgen, call, &output)?;
                    continue;
                }
                Some(ChainNode::NewObject(obj)) => {
                    output = generate_new_object(tgen, obj)?;
                    current_type = obj.ty.clone();
                    if current_type != "int[]" {
                        current_table = Some(tables.get(&current_type).ok_or_else(|| {
                            codegen_error(format!("Type '{}' is not a valid class.", current_type))
                        })?);
                    }
                    continue;
                }
                None => {
                    let local_type = tgen.lookup(lexeme);
                    if local_type.is_empty() {
                        let (count, field_type) = tgen.lookup_class_nested_count(lexeme);
                        for j in 0..count {
                            output.push_str(if j == 0 { "super->" } else { "super." });
                        }
                        output.push_str(lexeme);
                        current_type = field_type;
                    } else {
                        output = lexeme.to_string();
                        current_type = local_type;
                    }
                }
            }

            if !matches!(current_type.as_str(), "int" | "int[]" | "boolean") {
                current_table = Some(tables.get(&current_type).ok_or_else(|| {
                    codegen_error(format!("Type '{}' is not a valid class.", current_type))
                })?);
            }
            if entry.node.is_none() {
                continue;
            }
            // 链首方法调用落入成员处理
        }

        let member = lexeme;
        if current_type == "int[]" && member == "length" && entry.node.is_none() {
            current_type = "int".to_string();
            output.push_str("->length");
            continue;
        }

        // 沿继承链找成员, 同时在输出里上爬
        let before_climb = output.clone();
        let mut climbed = false;
        let mut found: Option<Symbol> = None;
        loop {
            let table = match current_table {
                Some(table) => table,
                None => break,
            };
            if let Some(symbol) = table.find(member) {
                found = Some(symbol.clone());
                break;
            }
            if table.parent.is_empty() {
                current_table = None;
                break;
            }
            current_table = tables.get(&table.parent);
            if let Some(parent_table) = current_table {
                output.push_str(if is_pointer { "->" } else { "." });
                output.push_str("super");
                current_type = parent_table.class_name.clone();
                is_pointer = false;
                climbed = true;
            }
        }
        let found = found.ok_or_else(|| {
            codegen_error(format!("Field '{}' not found in class hierarchy.", member))
        })?;

        match &entry.node {
            None => {
                output.push_str(if is_pointer { "->" } else { "." });
                output.push_str(member);
                is_pointer = true;
                current_type = found.ty.clone();
                current_table = tables.get(&current_type);
            }
            Some(ChainNode::MethodCall(call)) => {
                output = generate_method_call(tgen, call, climbed, &output, &before_climb)?;
                current_type = call.ty.clone();
                is_pointer = true;
                current_table = tables.get(&current_type);
            }
            Some(ChainNode::ArrayCall(call)) => {
                output.push_str(if is_pointer { "->" } else { "." });
                output = generate_array_call(tgen, call, &output)?;
                current_type = call.ty.clone();
                is_pointer = true;
                current_table = tables.get(&current_type);
            }
            Some(ChainNode::NewObject(obj)) => {
                output = generate_new_object(tgen, obj)?;
                current_type = obj.ty.clone();
                is_pointer = true;
                current_table = tables.get(&current_type);
            }
        }
    }

    Ok(output)
}
