//! 类的头文件、源文件与构造函数生成
//!
//! 继承用嵌套结构体表达: `super` 字段放在最前, 方法以每实例函数指针
//! 成员分发, 构造函数递归初始化字段默认值并安装函数指针 (从具体类向
//! 上解析方法名, 覆写生效)。

use std::collections::BTreeSet;

use crate::error::{MjResult, codegen_error};
use crate::semantic::ClassTables;
use crate::types::{Class, Field, Method, Project, TypeKind};

use super::Artifact;
use super::tac::{TacGen, generate_block};

/// C 类型映射; 基础类型带尾随空格便于直接拼接变量名
pub(super) fn c_type(ty: &str) -> String {
    match ty {
        "boolean" => "bool ".to_string(),
        "int[]" => "__int_array *".to_string(),
        "int" => "int ".to_string(),
        "void" => "void ".to_string(),
        name => format!("{} *", name),
    }
}

fn should_include_header(name: &str) -> bool {
    !matches!(name, "int" | "boolean" | "bool" | "int[]" | "void")
}

/// 方法签名; main 固定为 `int main()`, 其余带 `void *$this` 首参
pub(super) fn get_method_sign(
    method: &Method,
    class: &Class,
    included: &mut BTreeSet<String>,
) -> String {
    if method.is_main {
        return "int main()".to_string();
    }
    included.insert(method.return_type.lexeme.clone());
    let mut sign = format!("{}{}_{}", c_type(&method.return_type.lexeme), class.name, method.name);
    if method.params.is_empty() {
        sign.push_str("(\n\tvoid *$this\n)");
    } else {
        sign.push_str("(\n\tvoid *$this,\n\t");
        for (i, param) in method.params.iter().enumerate() {
            included.insert(param.ty.lexeme.clone());
            sign.push_str(&c_type(&param.ty.lexeme));
            sign.push_str(&param.name);
            if i + 1 == method.params.len() {
                sign.push_str("\n)");
            } else {
                sign.push_str(",\n\t");
            }
        }
    }
    sign
}

/// 结构体里的函数指针成员声明
fn get_method_as_param_sign(method: &Method, included: &mut BTreeSet<String>) -> String {
    let mut sign =
        format!("\t{}(*$_function_{})", c_type(&method.return_type.lexeme), method.name);
    if method.params.is_empty() {
        sign.push_str("(void *)");
    } else {
        sign.push_str("(void *, ");
        let types: Vec<String> = method
            .params
            .iter()
            .map(|param| {
                if param.ty.kind == TypeKind::Class {
                    included.insert(param.ty.lexeme.clone());
                }
                c_type(&param.ty.lexeme).trim_end().to_string()
            })
            .collect();
        sign.push_str(&types.join(", "));
        sign.push(')');
    }
    sign
}

fn write_fields(out: &mut String, class: &Class, included: &mut BTreeSet<String>) {
    if let Some(parent) = &class.extends {
        out.push_str(&format!("\t{} super;\n", parent));
        included.insert(parent.clone());
    }
    for field in &class.fields {
        if field.ty.lexeme == class.name {
            // 自引用字段还没见到 typedef
            out.push_str(&format!("\tstruct {} *{};\n", class.name, field.name));
        } else {
            out.push_str(&format!("\t{}{};\n", c_type(&field.ty.lexeme), field.name));
        }
        if field.ty.kind == TypeKind::Class {
            included.insert(field.ty.lexeme.clone());
        }
    }
    out.push('\n');
    for method in &class.methods {
        if method.is_main {
            continue;
        }
        out.push_str(&get_method_as_param_sign(method, included));
        out.push_str(";\n");
    }
}

pub(super) fn generate_class_header(
    class: &Class,
    included: &mut BTreeSet<String>,
) -> MjResult<Artifact> {
    let mut header = format!("#ifndef COMPILED_{0}_H\n#define COMPILED_{0}_H\n\n", class.name);
    header.push_str("#include <stdbool.h>\n#include \"__int_array.h\"\n");
    let include_start = header.len();

    header.push_str(&format!("struct {} {{\n", class.name));
    write_fields(&mut header, class, included);
    header.push_str("};\n\n");
    header.push_str(&format!("typedef struct {0} {0};\n\n", class.name));

    for method in &class.methods {
        if method.is_main {
            continue;
        }
        header.push_str(&get_method_sign(method, class, included));
        header.push_str(";\n\n");
    }
    header.push_str(&format!("{0} *$_new_{0}();\n\n", class.name));
    header.push_str(&format!("#endif //COMPILED_{}_H\n", class.name));

    // 依赖的类头文件回填到固定位置
    let mut includes = String::new();
    for name in included.iter() {
        if name == &class.name || !should_include_header(name) {
            continue;
        }
        includes.push_str(&format!("#include \"{}.h\"\n", name));
    }
    includes.push('\n');
    header.insert_str(include_start, &includes);

    Ok(Artifact { filename: format!("{}.h", class.name), contents: header })
}

/// 方法实现取最靠近具体类的版本
fn get_method_reference_name(project: &Project, class: &Class, method_name: &str) -> String {
    if class.contains_method(method_name) {
        return format!("{}_{}", class.name, method_name);
    }
    match &class.extends {
        Some(parent) => match project.class_by_name(parent) {
            Some(parent_class) => get_method_reference_name(project, parent_class, method_name),
            None => String::new(),
        },
        None => String::new(),
    }
}

fn field_default(field: &Field) -> &'static str {
    match field.ty.kind {
        TypeKind::Int => "0",
        TypeKind::Boolean => "false",
        _ => "NULL",
    }
}

fn parent_of<'a>(project: &'a Project, class: &Class) -> MjResult<Option<&'a Class>> {
    match &class.extends {
        Some(parent) => {
            let parent_class = project
                .class_by_name(parent)
                .ok_or_else(|| codegen_error(format!("Class '{}' not found", parent)))?;
            Ok(Some(parent_class))
        }
        None => Ok(None),
    }
}

fn write_field_defaults(
    out: &mut String,
    project: &Project,
    class: &Class,
    starter: &str,
) -> MjResult<()> {
    for field in &class.fields {
        out.push_str(&format!("\t{}{} = {};\n", starter, field.name, field_default(field)));
    }
    if let Some(parent_class) = parent_of(project, class)? {
        write_field_defaults(out, project, parent_class, &format!("{}super.", starter))?;
    }
    Ok(())
}

fn write_function_installs(
    out: &mut String,
    project: &Project,
    root: &Class,
    class: &Class,
    starter: &str,
) -> MjResult<()> {
    for method in &class.methods {
        if method.is_main {
            continue;
        }
        out.push_str(&format!(
            "\t{}$_function_{} = {};\n",
            starter,
            method.name,
            get_method_reference_name(project, root, &method.name)
        ));
    }
    if let Some(parent_class) = parent_of(project, class)? {
        write_function_installs(out, project, root, parent_class, &format!("{}super.", starter))?;
    }
    Ok(())
}

fn generate_constructor(project: &Project, class: &Class) -> MjResult<String> {
    let mut out = format!("{0} *$_new_{0}() {{\n", class.name);
    out.push_str(&format!("\t{0} *self = ({0} *) malloc(sizeof({0}));\n\n", class.name));
    write_field_defaults(&mut out, project, class, "self->")?;
    out.push('\n');
    write_function_installs(&mut out, project, class, class, "self->")?;
    out.push_str("\treturn self;\n}\n\n");
    Ok(out)
}

pub(super) fn generate_class_source(
    project: &Project,
    class: &Class,
    tables: &ClassTables,
    included: &mut BTreeSet<String>,
) -> MjResult<Artifact> {
    let mut source =
        format!("#include <stdlib.h>\n#include <stdio.h>\n#include \"{}.h\"\n", class.name);
    let include_start = source.len();
    source.push('\n');

    source.push_str(&generate_constructor(project, class)?);

    let mut types_used = BTreeSet::new();
    for method in &class.methods {
        source.push_str(&get_method_sign(method, class, included));
        source.push_str(" {\n");
        if !method.is_main {
            source.push_str(&format!("\t{0} *super = ({0} *) $this;\n\n", class.name));
        }
        let mut tgen = TacGen::new(project, class, tables, &mut types_used);
        tgen.open_block();
        if !method.is_main {
            for param in &method.params {
                tgen.add_variable(&param.name, &param.ty.lexeme);
            }
        }
        generate_block(&mut tgen, &method.body)?;
        tgen.close_block();
        source.push_str(&tgen.code);
        source.push_str("}\n\n");
    }

    // 方法体里用到但头文件没引的类型
    let mut includes = String::new();
    for name in &types_used {
        if name == &class.name || included.contains(name) || !should_include_header(name) {
            continue;
        }
        includes.push_str(&format!("#include \"{}.h\"\n", name));
    }
    if !includes.is_empty() {
        includes.push('\n');
        source.insert_str(include_start, &includes);
    }

    Ok(Artifact { filename: format!("{}.c", class.name), contents: source })
}
