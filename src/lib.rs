pub mod error;
pub mod types;
pub mod ast;
pub mod lexer;
pub mod parser;
pub mod semantic;
pub mod codegen;
pub mod output;

use std::path::Path;

pub use codegen::Artifact;
use error::MjResult;

pub struct Compiler;

impl Compiler {
    pub fn new() -> Self {
        Self
    }

    /// 完整流水线: 源码进, 生成的 C 工程文件出
    pub fn compile(&self, source: &str) -> MjResult<Vec<Artifact>> {
        // 1. 词法分析
        let tokens = lexer::lex(source)?;

        // 2. 语法分析
        let mut project = parser::parse(tokens)?;

        // 3. 语义分析
        let mut analyzer = semantic::SemanticAnalyzer::new();
        analyzer.analyze(&mut project)?;

        // 4. 代码生成
        codegen::generate(&project, analyzer.tables())
    }

    pub fn compile_to_dir(&self, source: &str, output_dir: &Path) -> MjResult<()> {
        let artifacts = self.compile(source)?;
        output::write_artifacts(output_dir, &artifacts)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hello_lexer() {
        let source = r#"class Hello {
    public static void main(String[] args) {
        System.out.println(42);
    }
}"#;
        let tokens = lexer::lex(source).unwrap();
        assert!(tokens.iter().any(|t| t.is_keyword("class")));
        assert!(tokens.iter().any(|t| t.is_lexeme("println")));
    }

    #[test]
    fn test_hello_parser() {
        let source = r#"class Hello {
    public static void main(String[] args) {
        System.out.println(42);
    }
}"#;
        let tokens = lexer::lex(source).unwrap();
        let project = parser::parse(tokens).unwrap();
        assert!(project.contains_class("Hello"));
    }

    #[test]
    fn test_hello_compile() {
        let source = r#"class Hello {
    public static void main(String[] args) {
        System.out.println(42);
    }
}"#;
        let artifacts = Compiler::new().compile(source).unwrap();
        assert!(artifacts.iter().any(|a| a.filename == "Hello.c"));
        assert!(artifacts.iter().any(|a| a.filename == "Hello.h"));
        assert!(artifacts.iter().any(|a| a.filename == "__int_array.h"));
        assert!(artifacts.iter().any(|a| a.filename == "CMakeLists.txt"));
    }
}
