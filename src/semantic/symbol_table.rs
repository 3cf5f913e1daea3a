//! 符号表
//!
//! 类符号表以类名注册在 `ClassTables` 中, 父类通过名字链接, 查找沿
//! 继承链上爬。方法与块级作用域是 `Scope` 中的临时帧。

use std::collections::HashMap;

use crate::error::{MjResult, semantic_error};

/// 变量、字段或方法符号
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub ty: String,
    pub is_method: bool,
    /// 方法形参类型列表
    pub params: Vec<String>,
    pub return_type: String,
}

impl Symbol {
    pub fn variable(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            is_method: false,
            params: Vec::new(),
            return_type: String::new(),
        }
    }

    pub fn method(
        name: impl Into<String>,
        ty: impl Into<String>,
        params: Vec<String>,
        return_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            is_method: true,
            params,
            return_type: return_type.into(),
        }
    }
}

/// 一个类的符号表
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    pub class_name: String,
    /// 父类名, 空串表示没有
    pub parent: String,
    pub symbols: HashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new(class_name: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            parent: parent.into(),
            symbols: HashMap::new(),
        }
    }

    pub fn add_symbol(&mut self, symbol: Symbol) -> MjResult<()> {
        if self.symbols.contains_key(&symbol.name) {
            return Err(semantic_error(format!(
                "Symbol '{}' is already declared in this scope.",
                symbol.name
            )));
        }
        self.symbols.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }
}

/// 按类名注册的符号表集合, 每次编译独立一份
#[derive(Debug, Clone, Default)]
pub struct ClassTables {
    tables: HashMap<String, SymbolTable>,
}

impl ClassTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册用户类表, 重名报错
    pub fn add(&mut self, table: SymbolTable) -> MjResult<()> {
        if self.tables.contains_key(&table.class_name) {
            return Err(semantic_error(format!(
                "Class '{}' is already declared.",
                table.class_name
            )));
        }
        self.insert(table);
        Ok(())
    }

    /// 注册内建类表
    pub fn insert(&mut self, table: SymbolTable) {
        self.tables.insert(table.class_name.clone(), table);
    }

    pub fn get(&self, class_name: &str) -> Option<&SymbolTable> {
        self.tables.get(class_name)
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.tables.contains_key(class_name)
    }

    /// 沿继承链查找成员
    pub fn lookup(&self, class_name: &str, symbol: &str) -> Option<&Symbol> {
        let mut table = self.get(class_name);
        while let Some(current) = table {
            if let Some(found) = current.find(symbol) {
                return Some(found);
            }
            if current.parent.is_empty() {
                return None;
            }
            table = self.get(&current.parent);
        }
        None
    }

    /// `from` 是否等于 `to` 或是其子类
    pub fn can_cast(&self, from: &str, to: &str) -> bool {
        if from == to {
            return true;
        }
        let mut table = self.get(from);
        while let Some(current) = table {
            if current.class_name == to {
                return true;
            }
            if current.parent.is_empty() {
                return false;
            }
            table = self.get(&current.parent);
        }
        false
    }
}

/// 方法体分析时的词法作用域: 帧栈叠在类符号表之上
#[derive(Debug)]
pub struct Scope<'a> {
    pub tables: &'a ClassTables,
    /// 当前类名; `main` 在独立的 System 作用域中分析
    pub class_name: String,
    pub return_type: String,
    frames: Vec<HashMap<String, Symbol>>,
}

impl<'a> Scope<'a> {
    pub fn new(
        tables: &'a ClassTables,
        class_name: impl Into<String>,
        return_type: impl Into<String>,
    ) -> Self {
        Self {
            tables,
            class_name: class_name.into(),
            return_type: return_type.into(),
            frames: vec![HashMap::new()],
        }
    }

    pub fn push_frame(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// 在最内层帧中声明符号, 同帧重名报错
    pub fn add_symbol(&mut self, symbol: Symbol) -> MjResult<()> {
        let frame = match self.frames.last_mut() {
            Some(frame) => frame,
            None => return Err(semantic_error("No active scope")),
        };
        if frame.contains_key(&symbol.name) {
            return Err(semantic_error(format!(
                "Symbol '{}' is already declared in this scope.",
                symbol.name
            )));
        }
        frame.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    /// 先查帧栈, 再沿类继承链查字段与方法
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        for frame in self.frames.iter().rev() {
            if let Some(symbol) = frame.get(name) {
                return Some(symbol);
            }
        }
        if self.class_name.is_empty() {
            return None;
        }
        self.tables.lookup(&self.class_name, name)
    }

    pub fn current_class(&self) -> Option<&SymbolTable> {
        if self.class_name.is_empty() {
            return None;
        }
        self.tables.get(&self.class_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables_with_chain() -> ClassTables {
        let mut tables = ClassTables::new();
        let mut animal = SymbolTable::new("Animal", "");
        animal.add_symbol(Symbol::variable("legs", "int")).unwrap();
        tables.insert(animal);
        let mut dog = SymbolTable::new("Dog", "Animal");
        dog.add_symbol(Symbol::variable("name", "int")).unwrap();
        tables.insert(dog);
        tables
    }

    #[test]
    fn test_lookup_climbs_inheritance() {
        let tables = tables_with_chain();
        assert!(tables.lookup("Dog", "legs").is_some());
        assert!(tables.lookup("Animal", "name").is_none());
    }

    #[test]
    fn test_can_cast_subclass_to_parent() {
        let tables = tables_with_chain();
        assert!(tables.can_cast("Dog", "Animal"));
        assert!(tables.can_cast("Dog", "Dog"));
        assert!(!tables.can_cast("Animal", "Dog"));
    }

    #[test]
    fn test_scope_shadowing_across_frames() {
        let tables = tables_with_chain();
        let mut scope = Scope::new(&tables, "Dog", "void");
        scope.add_symbol(Symbol::variable("x", "int")).unwrap();
        scope.push_frame();
        scope.add_symbol(Symbol::variable("x", "boolean")).unwrap();
        assert_eq!(scope.lookup("x").map(|s| s.ty.as_str()), Some("boolean"));
        scope.pop_frame();
        assert_eq!(scope.lookup("x").map(|s| s.ty.as_str()), Some("int"));
    }

    #[test]
    fn test_duplicate_in_same_frame_rejected() {
        let tables = tables_with_chain();
        let mut scope = Scope::new(&tables, "Dog", "void");
        scope.add_symbol(Symbol::variable("x", "int")).unwrap();
        let err = scope.add_symbol(Symbol::variable("x", "int")).unwrap_err();
        assert!(err.to_string().contains("already declared"));
    }

    #[test]
    fn test_scope_falls_through_to_fields() {
        let tables = tables_with_chain();
        let scope = Scope::new(&tables, "Dog", "void");
        assert!(scope.lookup("legs").is_some());
    }
}
