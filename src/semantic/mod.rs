//! 语义分析器
//!
//! 按继承关系的拓扑序做两遍分析: 第一遍为每个类注册符号表,
//! 第二遍逐方法建立作用域并检查方法体、写回节点类型。

mod check;
pub mod symbol_table;

pub use symbol_table::{ClassTables, Scope, Symbol, SymbolTable};

use crate::error::{MjResult, semantic_error};
use crate::types::Project;

pub struct SemanticAnalyzer {
    tables: ClassTables,
}

impl SemanticAnalyzer {
    /// 创建分析器并注册内建类 (System 与 int[])
    pub fn new() -> Self {
        let mut tables = ClassTables::new();

        let mut system = SymbolTable::new("System", "");
        system
            .symbols
            .insert("out".to_string(), Symbol::variable("out", "System"));
        for name in ["println", "print", "printf"] {
            system.symbols.insert(
                name.to_string(),
                Symbol::method(name, "void", vec!["int".to_string()], "void"),
            );
        }
        tables.insert(system);

        let mut int_array = SymbolTable::new("int[]", "");
        int_array
            .symbols
            .insert("length".to_string(), Symbol::variable("length", "int"));
        tables.insert(int_array);

        Self { tables }
    }

    pub fn tables(&self) -> &ClassTables {
        &self.tables
    }

    pub fn analyze(&mut self, project: &mut Project) -> MjResult<()> {
        // 第一遍: 拓扑排序, 父类在前, 逐类注册符号表
        let order = project.topological_sort()?;
        for name in &order {
            let class = project
                .class_by_name(name)
                .ok_or_else(|| semantic_error(format!("Class '{}' not found", name)))?;
            let parent = class.extends.clone().unwrap_or_default();
            let mut table = SymbolTable::new(&class.name, parent);
            for field in &class.fields {
                table.add_symbol(Symbol::variable(&field.name, &field.ty.lexeme))?;
            }
            table.add_symbol(Symbol::variable("System", "System"))?;
            for method in &class.methods {
                let params = method.params.iter().map(|p| p.ty.lexeme.clone()).collect();
                table.add_symbol(Symbol::method(
                    &method.name,
                    &method.return_type.lexeme,
                    params,
                    &method.return_type.lexeme,
                ))?;
            }
            self.tables.add(table)?;
        }

        // 第二遍: 逐方法检查
        for name in &order {
            let index = project
                .classes
                .iter()
                .position(|c| c.name == *name)
                .ok_or_else(|| semantic_error(format!("Class '{}' not found", name)))?;
            let class_name = name.clone();
            for method in &mut project.classes[index].methods {
                if method.is_main {
                    // main 在独立的 System 作用域中检查
                    let mut scope = Scope::new(&self.tables, "System", "void");
                    scope.add_symbol(Symbol::variable("System", "System"))?;
                    check::analyse_block(&mut method.body, &mut scope)?;
                } else {
                    let mut scope =
                        Scope::new(&self.tables, &class_name, &method.return_type.lexeme);
                    for param in &method.params {
                        scope.add_symbol(Symbol::variable(&param.name, &param.ty.lexeme))?;
                    }
                    check::analyse_block(&mut method.body, &mut scope)?;
                }
            }
        }
        Ok(())
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::parser::parse;

    fn analyse_source(source: &str) -> MjResult<Project> {
        let mut project = parse(lex(source).unwrap())?;
        let mut analyzer = SemanticAnalyzer::new();
        analyzer.analyze(&mut project)?;
        Ok(project)
    }

    #[test]
    fn test_simple_class_passes() {
        let project = analyse_source(
            "class A { int x; public int get() { return x; } }",
        )
        .unwrap();
        assert_eq!(project.classes.len(), 1);
    }

    #[test]
    fn test_inherited_field_resolves() {
        analyse_source(
            "class A { int x; }
             class B extends A { public int get() { return x; } }",
        )
        .unwrap();
    }

    #[test]
    fn test_undefined_reference() {
        let err = analyse_source("class A { public void f() { y = 1; } }").unwrap_err();
        assert!(err.to_string().contains("Undefined reference: 'y'"));
    }

    #[test]
    fn test_mixed_binary_operands_rejected() {
        let err = analyse_source(
            "class A { public void f() { int x; x = 1 + true; } }",
        )
        .unwrap_err();
        assert!(err.to_string().contains("Type mismatch in BinaryExpression: 'int' and 'boolean'"));
    }

    #[test]
    fn test_condition_must_be_boolean() {
        let err =
            analyse_source("class A { public void f() { if (1) { } } }").unwrap_err();
        assert!(err.to_string().contains("must be of type 'boolean'"));
    }

    #[test]
    fn test_unreachable_statement() {
        let err = analyse_source(
            "class A { public int f() { return 1; int x; } }",
        )
        .unwrap_err();
        assert!(err.to_string().contains("Unreachable statement"));
    }

    #[test]
    fn test_returning_if_terminates_block() {
        let err = analyse_source(
            "class A { public int f(boolean b) {
                 if (b) { return 1; } else { return 2; }
                 int x;
             } }",
        )
        .unwrap_err();
        assert!(err.to_string().contains("Unreachable statement"));
    }

    #[test]
    fn test_subclass_assignment_allowed() {
        analyse_source(
            "class Animal { int legs; }
             class Dog extends Animal { }
             class Main {
                 public void f() {
                     Animal a;
                     a = new Dog();
                 }
             }",
        )
        .unwrap();
    }

    #[test]
    fn test_unrelated_assignment_rejected() {
        let err = analyse_source(
            "class A { }
             class B { }
             class Main { public void f() { A a; a = new B(); } }",
        )
        .unwrap_err();
        assert!(err.to_string().contains("Cannot assign value of type 'B'"));
    }

    #[test]
    fn test_unrelated_cast_rejected() {
        let err = analyse_source(
            "class A { }
             class B { }
             class Main { public void f() { A a; B b; b = new B(); a = (A) b; } }",
        )
        .unwrap_err();
        assert!(err.to_string().contains("Cannot cast 'B' to 'A'"));
    }

    #[test]
    fn test_downcast_of_related_classes_allowed() {
        analyse_source(
            "class Animal { }
             class Dog extends Animal { }
             class Main {
                 public void f() {
                     Animal a;
                     Dog d;
                     a = new Dog();
                     d = (Dog) a;
                 }
             }",
        )
        .unwrap();
    }

    #[test]
    fn test_array_length_read_only() {
        let err = analyse_source(
            "class A { int[] arr; public void f() { arr.length = 3; } }",
        )
        .unwrap_err();
        assert!(err.to_string().contains("You can not set length of array 'arr'"));
    }

    #[test]
    fn test_method_argument_mismatch() {
        let err = analyse_source(
            "class A { public int f(int x) { return x; }
                       public void g() { int y; y = f(true); } }",
        )
        .unwrap_err();
        assert!(err.to_string().contains("Type mismatch for argument 1"));
    }

    #[test]
    fn test_println_accepts_int_only() {
        let err = analyse_source(
            "class A { public void f() { System.out.println(true); } }",
        )
        .unwrap_err();
        assert!(err.to_string().contains("argument 1"));
    }

    #[test]
    fn test_main_checks_in_system_scope() {
        analyse_source(
            "class A { public static void main(String[] args) {
                 System.out.println(42);
             } }",
        )
        .unwrap();
    }
}
