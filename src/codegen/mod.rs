//! C 代码生成
//!
//! 每个类生成一对头文件与源文件, 方法体压平为三地址码式的 C 语句;
//! 另附 `__int_array` 运行时与 CMakeLists。产物只是内存中的文件,
//! 由调用方决定写到哪里。

mod chains;
pub mod classes;
mod runtime;
pub mod tac;

use std::collections::BTreeSet;

use crate::error::MjResult;
use crate::semantic::ClassTables;
use crate::types::Project;

/// 一份待写出的生成文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub contents: String,
}

pub fn generate(project: &Project, tables: &ClassTables) -> MjResult<Vec<Artifact>> {
    let mut artifacts = Vec::new();
    for class in &project.classes {
        let mut included = BTreeSet::new();
        artifacts.push(classes::generate_class_header(class, &mut included)?);
        artifacts.push(classes::generate_class_source(project, class, tables, &mut included)?);
    }
    artifacts.push(runtime::int_array_header());
    artifacts.push(runtime::int_array_source());
    artifacts.push(runtime::cmake_lists());
    Ok(artifacts)
}
