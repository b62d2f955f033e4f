// ABOUTME: The closed set of expression and statement nodes produced by the parser

use crate::token::Token;
use crate::value::ScriptValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarQualifier {
    Var,
    Let,
    Const,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal {
        value: ScriptValue,
        token: Token,
    },
    ArrayLiteral {
        elements: Vec<Expr>,
    },
    ObjectLiteral {
        keys: Vec<String>,
        values: Vec<Expr>,
    },
    VarAccess {
        name: Token,
    },
    MemberAccess {
        object: Box<Expr>,
        member: String,
    },
    ArrayIndex {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    FunctionCall {
        callee: Box<Expr>,
        args: Vec<Expr>,
        return_this: bool,
    },
    NewExpression {
        call: Box<Expr>,
    },
    BinaryOp {
        op: Token,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    UnaryOp {
        op: Token,
        operand: Box<Expr>,
    },
    /// An anonymous `function(args) { ... }` expression. Carries only the
    /// static template; the evaluator binds it to a closure environment at
    /// the point it is visited, producing a `ScriptValue::Function`.
    FunctionExpr {
        arg_names: Vec<String>,
        body: Vec<Stmt>,
    },
}

#[derive(Debug, Clone)]
pub struct VarDeclarator {
    pub name: String,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Block {
        statements: Vec<Stmt>,
        line: usize,
    },
    VarDeclaration {
        qualifier: VarQualifier,
        decls: Vec<VarDeclarator>,
        line: usize,
    },
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
        line: usize,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
        label: Option<String>,
        line: usize,
    },
    DoWhile {
        body: Box<Stmt>,
        cond: Expr,
        label: Option<String>,
        line: usize,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Expr,
        incr: Option<Expr>,
        body: Box<Stmt>,
        label: Option<String>,
        line: usize,
    },
    ForOf {
        /// `None` for the bare-identifier form (`for (k of obj)`, no
        /// declaration keyword); `Some(_)` for a qualified declaration
        /// (`for (let k of obj)` / `for (const k of obj)`).
        qualifier: Option<VarQualifier>,
        names: Vec<String>,
        iterable: Expr,
        body: Box<Stmt>,
        label: Option<String>,
        line: usize,
    },
    Break {
        label: Option<String>,
        line: usize,
    },
    Continue {
        label: Option<String>,
        line: usize,
    },
    Return {
        expr: Option<Expr>,
        line: usize,
    },
    FunctionDeclaration {
        name: String,
        arg_names: Vec<String>,
        body: Vec<Stmt>,
        line: usize,
    },
    Throw {
        expr: Expr,
        line: usize,
    },
    TryCatch {
        try_block: Box<Stmt>,
        exception_name: String,
        catch_block: Box<Stmt>,
        line: usize,
    },
    Delete {
        access: Expr,
        line: usize,
    },
    ExpressionStatement {
        expr: Option<Expr>,
        line: usize,
    },
}

impl Stmt {
    pub fn line(&self) -> usize {
        match self {
            Stmt::Block { line, .. }
            | Stmt::VarDeclaration { line, .. }
            | Stmt::If { line, .. }
            | Stmt::While { line, .. }
            | Stmt::DoWhile { line, .. }
            | Stmt::For { line, .. }
            | Stmt::ForOf { line, .. }
            | Stmt::Break { line, .. }
            | Stmt::Continue { line, .. }
            | Stmt::Return { line, .. }
            | Stmt::FunctionDeclaration { line, .. }
            | Stmt::Throw { line, .. }
            | Stmt::TryCatch { line, .. }
            | Stmt::Delete { line, .. }
            | Stmt::ExpressionStatement { line, .. } => *line,
        }
    }
}
