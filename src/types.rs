//! 类型与顶层程序结构
//!
//! 类型以规范化字符串表示: "int"、"boolean"、"int[]"、"void"、类名,
//! 以及块分析使用的 "return-void" 哨兵值。

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use crate::ast::CodeBlock;
use crate::error::{MjResult, semantic_error};

/// 类型类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Int,
    Boolean,
    IntArray,
    Void,
    Class,
}

/// 声明中出现的类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    pub kind: TypeKind,
    pub lexeme: String,
}

impl Type {
    pub fn int() -> Self {
        Self { kind: TypeKind::Int, lexeme: "int".to_string() }
    }

    pub fn boolean() -> Self {
        Self { kind: TypeKind::Boolean, lexeme: "boolean".to_string() }
    }

    pub fn int_array() -> Self {
        Self { kind: TypeKind::IntArray, lexeme: "int[]".to_string() }
    }

    pub fn void() -> Self {
        Self { kind: TypeKind::Void, lexeme: "void".to_string() }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self { kind: TypeKind::Class, lexeme: name.into() }
    }

    pub fn is_primitive(&self) -> bool {
        self.kind != TypeKind::Class
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lexeme)
    }
}

/// 字段或参数声明
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub ty: Type,
    pub name: String,
}

impl Field {
    pub fn new(ty: Type, name: impl Into<String>) -> Self {
        Self { ty, name: name.into() }
    }
}

/// 方法声明
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub return_type: Type,
    pub name: String,
    pub params: Vec<Field>,
    pub body: CodeBlock,
    pub is_main: bool,
}

impl Method {
    pub fn new(return_type: Type, name: impl Into<String>, is_main: bool) -> Self {
        Self {
            return_type,
            name: name.into(),
            params: Vec::new(),
            body: CodeBlock::new(),
            is_main,
        }
    }

    pub fn contains_param(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name == name)
    }
}

/// 类声明
#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub name: String,
    pub extends: Option<String>,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
}

impl Class {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extends: None,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn contains_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn contains_method(&self, name: &str) -> bool {
        self.methods.iter().any(|m| m.name == name)
    }
}

/// 整个编译单元
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Project {
    pub classes: Vec<Class>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_class(&self, name: &str) -> bool {
        self.classes.iter().any(|c| c.name == name)
    }

    pub fn class_by_name(&self, name: &str) -> Option<&Class> {
        self.classes.iter().find(|c| c.name == name)
    }

    /// 按继承关系对类名做拓扑排序 (Kahn 算法, 父类在前)
    pub fn topological_sort(&self) -> MjResult<Vec<String>> {
        let mut in_degree: BTreeMap<&str, usize> = BTreeMap::new();
        let mut children: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

        for class in &self.classes {
            in_degree.entry(class.name.as_str()).or_insert(0);
        }
        for class in &self.classes {
            if let Some(parent) = &class.extends {
                if !in_degree.contains_key(parent.as_str()) {
                    return Err(semantic_error(format!("Class '{}' not found", parent)));
                }
                *in_degree.entry(class.name.as_str()).or_insert(0) += 1;
                children.entry(parent.as_str()).or_default().push(class.name.as_str());
            }
        }

        let mut queue: VecDeque<&str> = self
            .classes
            .iter()
            .map(|c| c.name.as_str())
            .filter(|name| in_degree[name] == 0)
            .collect();
        let mut order = Vec::new();

        while let Some(name) = queue.pop_front() {
            order.push(name.to_string());
            if let Some(subclasses) = children.get(name) {
                for &sub in subclasses {
                    let degree = in_degree.entry(sub).or_insert(0);
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(sub);
                    }
                }
            }
        }

        if order.len() != self.classes.len() {
            return Err(semantic_error("Cyclic inheritance detected"));
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str, extends: Option<&str>) -> Class {
        let mut c = Class::new(name);
        c.extends = extends.map(str::to_string);
        c
    }

    #[test]
    fn test_topological_sort_parents_first() {
        let project = Project {
            classes: vec![
                class("C", Some("B")),
                class("B", Some("A")),
                class("A", None),
            ],
        };
        let order = project.topological_sort().unwrap();
        assert_eq!(order, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_topological_sort_detects_cycle() {
        let project = Project {
            classes: vec![class("A", Some("B")), class("B", Some("A"))],
        };
        let err = project.topological_sort().unwrap_err();
        assert!(err.to_string().contains("Cyclic inheritance detected"));
    }

    #[test]
    fn test_topological_sort_missing_parent() {
        let project = Project {
            classes: vec![class("A", Some("Ghost"))],
        };
        let err = project.topological_sort().unwrap_err();
        assert!(err.to_string().contains("Class 'Ghost' not found"));
    }
}
