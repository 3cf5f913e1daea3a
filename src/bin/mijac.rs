use std::env;
use std::fs;
use std::path::Path;
use std::process;

use anyhow::{Context, Result};
use mijac::Compiler;

fn print_usage() {
    println!("Usage: mijac <source_file.java> [output_dir]");
    println!();
    println!("MiniJava to C Compiler");
    println!("Compiles a .java source file to a portable C99 project");
    println!("(default output directory: ./compile)");
}

fn run(source_path: &str, output_dir: &Path) -> Result<()> {
    let source = fs::read_to_string(source_path)
        .with_context(|| format!("错误读取源文件 '{}'", source_path))?;

    let compiler = Compiler::new();
    compiler
        .compile_to_dir(&source, output_dir)
        .with_context(|| format!("编译 '{}' 失败", source_path))?;
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let source_path = &args[1];
    let output_dir = if args.len() >= 3 {
        args[2].clone()
    } else {
        // 默认输出目录
        "compile".to_string()
    };

    println!("MiniJava 编译器");
    println!("源文件: {}", source_path);
    println!("输出目录: {}", output_dir);
    println!();

    match run(source_path, Path::new(&output_dir)) {
        Ok(()) => {
            println!("[+] 编译完成!");
            println!("生成: {}", output_dir);
        }
        Err(e) => {
            eprintln!("[-] 编译失败: {:#}", e);
            process::exit(1);
        }
    }
}
