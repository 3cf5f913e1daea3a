//! 抽象语法树
//!
//! 语句与表达式节点统一在 `Ast` 枚举中; 引用链 (如 `a.b[i].m(x)`) 以
//! 令牌加可选嵌套节点的链节序列表示。每个节点带一个 `ty` 槽位, 由
//! 语义分析阶段写入规范化类型字符串。

use crate::lexer::Token;
use crate::types::Field;

#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    Block(CodeBlock),
    LocalVariable(LocalVariable),
    Assignment(Assignment),
    Reference(ReferenceChain),
    If(IfStatement),
    While(WhileStatement),
    For(ForStatement),
    Return(ReturnStatement),
    Break(Token),
    Continue(Token),
    Binary(BinaryExpression),
    Not(NotExpression),
    Cast(CastExpression),
    Number(NumberLiteral),
    Boolean(BooleanLiteral),
}

impl Ast {
    /// 语义分析写入的类型 (分析前为空串)
    pub fn ty(&self) -> &str {
        match self {
            Ast::Block(n) => &n.ty,
            Ast::LocalVariable(n) => &n.ty,
            Ast::Assignment(n) => &n.ty,
            Ast::Reference(n) => &n.ty,
            Ast::If(n) => &n.ty,
            Ast::While(n) => &n.ty,
            Ast::For(n) => &n.ty,
            Ast::Return(n) => &n.ty,
            Ast::Break(_) | Ast::Continue(_) => "void",
            Ast::Binary(n) => &n.ty,
            Ast::Not(n) => &n.ty,
            Ast::Cast(n) => &n.ty,
            Ast::Number(n) => &n.ty,
            Ast::Boolean(n) => &n.ty,
        }
    }

    /// 调试用的树形打印
    pub fn print_tree(&self, depth: usize) -> String {
        let pad = "  ".repeat(depth);
        match self {
            Ast::Block(block) => {
                let mut out = format!("{}Block\n", pad);
                for code in &block.codes {
                    out += &code.print_tree(depth + 1);
                }
                out
            }
            Ast::LocalVariable(var) => {
                format!("{}LocalVariable {} {}\n", pad, var.field.ty, var.field.name)
            }
            Ast::Assignment(assign) => {
                let mut out = format!("{}Assignment {}\n", pad, assign.op.lexeme);
                out += &format!("{}\n", assign.reference.print_tree(depth + 1));
                out += &assign.expression.print_tree(depth + 1);
                out
            }
            Ast::Reference(chain) => format!("{}\n", chain.print_tree(depth)),
            Ast::If(stmt) => {
                let mut out = format!("{}If\n", pad);
                out += &stmt.condition.print_tree(depth + 1);
                out += &Ast::Block(stmt.body.clone()).print_tree(depth + 1);
                if let Some(else_body) = &stmt.else_body {
                    out += &format!("{}Else\n", pad);
                    out += &else_body.print_tree(depth + 1);
                }
                out
            }
            Ast::While(stmt) => {
                let kind = if stmt.is_do_while { "DoWhile" } else { "While" };
                let mut out = format!("{}{}\n", pad, kind);
                out += &stmt.condition.print_tree(depth + 1);
                out += &Ast::Block(stmt.body.clone()).print_tree(depth + 1);
                out
            }
            Ast::For(stmt) => {
                let mut out = format!("{}For\n", pad);
                if let Some(init) = &stmt.initialization {
                    out += &Ast::Block(init.clone()).print_tree(depth + 1);
                }
                if let Some(cond) = &stmt.condition {
                    out += &cond.print_tree(depth + 1);
                }
                if let Some(update) = &stmt.update {
                    out += &Ast::Block(update.clone()).print_tree(depth + 1);
                }
                if let Some(body) = &stmt.body {
                    out += &Ast::Block(body.clone()).print_tree(depth + 1);
                }
                out
            }
            Ast::Return(stmt) => {
                let mut out = format!("{}Return\n", pad);
                if let Some(expr) = &stmt.expr {
                    out += &expr.print_tree(depth + 1);
                }
                out
            }
            Ast::Break(_) => format!("{}Break\n", pad),
            Ast::Continue(_) => format!("{}Continue\n", pad),
            Ast::Binary(expr) => {
                let mut out = format!("{}Binary {}\n", pad, expr.op.lexeme);
                out += &expr.left.print_tree(depth + 1);
                out += &expr.right.print_tree(depth + 1);
                out
            }
            Ast::Not(expr) => {
                format!("{}Not {}\n{}", pad, expr.op.lexeme, expr.expr.print_tree(depth + 1))
            }
            Ast::Cast(expr) => {
                format!("{}Cast {}\n{}", pad, expr.cast.lexeme, expr.expr.print_tree(depth + 1))
            }
            Ast::Number(n) => format!("{}Number {}\n", pad, n.token.lexeme),
            Ast::Boolean(b) => format!("{}Boolean {}\n", pad, b.token.lexeme),
        }
    }
}

/// 语句块
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeBlock {
    pub codes: Vec<Ast>,
    pub ty: String,
}

impl CodeBlock {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalVariable {
    pub field: Field,
    pub ty: String,
}

impl LocalVariable {
    pub fn new(field: Field) -> Self {
        Self { field, ty: String::new() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub reference: ReferenceChain,
    pub op: Token,
    pub expression: Box<Ast>,
    pub ty: String,
}

impl Assignment {
    pub fn new(reference: ReferenceChain, op: Token, expression: Ast) -> Self {
        Self {
            reference,
            op,
            expression: Box::new(expression),
            ty: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub condition: Box<Ast>,
    pub body: CodeBlock,
    /// else 分支: 语句块或链式 else-if
    pub else_body: Option<Box<Ast>>,
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    pub condition: Box<Ast>,
    pub body: CodeBlock,
    pub is_do_while: bool,
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStatement {
    pub initialization: Option<CodeBlock>,
    pub condition: Option<Box<Ast>>,
    pub update: Option<CodeBlock>,
    pub body: Option<CodeBlock>,
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    pub expr: Option<Box<Ast>>,
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    pub op: Token,
    pub left: Box<Ast>,
    pub right: Box<Ast>,
    pub ty: String,
}

impl BinaryExpression {
    pub fn new(op: Token, left: Ast, right: Ast) -> Self {
        Self {
            op,
            left: Box::new(left),
            right: Box::new(right),
            ty: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotExpression {
    pub op: Token,
    pub expr: Box<Ast>,
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CastExpression {
    pub cast: Token,
    pub expr: Box<Ast>,
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberLiteral {
    pub token: Token,
    pub ty: String,
}

impl NumberLiteral {
    pub fn new(token: Token) -> Self {
        Self { token, ty: String::new() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BooleanLiteral {
    pub token: Token,
    pub ty: String,
}

/// 引用链中的嵌套节点
#[derive(Debug, Clone, PartialEq)]
pub enum ChainNode {
    MethodCall(MethodCall),
    ArrayCall(ArrayCall),
    NewObject(NewObject),
}

impl ChainNode {
    pub fn ty(&self) -> &str {
        match self {
            ChainNode::MethodCall(n) => &n.ty,
            ChainNode::ArrayCall(n) => &n.ty,
            ChainNode::NewObject(n) => &n.ty,
        }
    }
}

/// 链节: 一个令牌, 可选地带方法调用 / 数组下标 / new 节点
#[derive(Debug, Clone, PartialEq)]
pub struct ChainLink {
    pub token: Token,
    pub node: Option<ChainNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceChain {
    pub chain: Vec<ChainLink>,
    pub ty: String,
    /// 链以 `arr.length` 结束时置位, 赋值检查用
    pub is_array_length: bool,
}

impl ReferenceChain {
    pub fn new() -> Self {
        Self {
            chain: Vec::new(),
            ty: String::new(),
            is_array_length: false,
        }
    }

    pub fn add_field(&mut self, token: Token) {
        self.chain.push(ChainLink { token, node: None });
    }

    pub fn add_node(&mut self, token: Token, node: ChainNode) {
        self.chain.push(ChainLink { token, node: Some(node) });
    }

    pub fn print_tree(&self, depth: usize) -> String {
        let pad = "  ".repeat(depth);
        let path: Vec<&str> = self.chain.iter().map(|l| l.token.lexeme.as_str()).collect();
        format!("{}Reference {}", pad, path.join("."))
    }
}

impl Default for ReferenceChain {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub name: Token,
    pub arguments: Vec<Ast>,
    /// 接收者类型, 语义分析写入
    pub caller_type: String,
    pub ty: String,
}

impl MethodCall {
    pub fn new(name: Token) -> Self {
        Self {
            name,
            arguments: Vec::new(),
            caller_type: String::new(),
            ty: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayCall {
    pub name: Token,
    pub bracket: Box<Ast>,
    /// 接收者类型; 空串表示当前作用域中的数组
    pub caller_type: String,
    pub ty: String,
}

impl ArrayCall {
    pub fn new(name: Token, bracket: Ast) -> Self {
        Self {
            name,
            bracket: Box::new(bracket),
            caller_type: String::new(),
            ty: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewObject {
    pub class_type: Token,
    /// `new int[size]` 时的元素个数表达式
    pub array_size: Option<Box<Ast>>,
    pub ty: String,
}

impl NewObject {
    pub fn new(class_type: Token, array_size: Option<Ast>) -> Self {
        Self {
            class_type,
            array_size: array_size.map(Box::new),
            ty: String::new(),
        }
    }
}
