// ABOUTME: Tree-walking evaluator executing the AST against an environment chain

use crate::ast::{Expr, Stmt, VarQualifier};
use crate::env::{Environment, Reassign};
use crate::error::{NativeFnError, RuntimeError};
use crate::token::{Token, TokenType};
use crate::value::{ScriptFunction, ScriptFunctionData, ScriptValue};
use indexmap::IndexMap;
use std::rc::Rc;

/// What an expression's evaluation denotes as an assignment target. Purely
/// rvalue evaluations carry `None`.
#[derive(Debug, Clone)]
pub enum AccessType {
    None,
    Var(String),
    Array(crate::value::ScriptArray, usize),
    Object(crate::value::ScriptObject, String),
}

/// The uniform return record from evaluating an expression node: its
/// value, and (for l-value expressions) the slot an enclosing assignment
/// would rewrite.
#[derive(Debug, Clone)]
pub struct VisitResult {
    pub value: ScriptValue,
    pub access: AccessType,
}

impl VisitResult {
    fn rvalue(value: ScriptValue) -> Self {
        VisitResult {
            value,
            access: AccessType::None,
        }
    }
}

/// A statement's control-flow outcome: ordinary completion, or a signal
/// unwinding to the nearest loop/function boundary that handles it.
#[derive(Debug, Clone)]
pub enum Flow {
    Normal,
    Break(Option<String>),
    Continue(Option<String>),
    Return(ScriptValue),
}

/// A statement's completion: the control-flow signal it produced, plus its
/// completion value (the value of the last expression it ran, mirroring how
/// a REPL reports the value of a top-level program).
#[derive(Debug, Clone)]
pub struct Completion {
    pub flow: Flow,
    pub value: ScriptValue,
}

impl Completion {
    fn normal(value: ScriptValue) -> Self {
        Completion {
            flow: Flow::Normal,
            value,
        }
    }
}

/// Evaluates a statement, appending a traceback frame (its own line, the
/// enclosing frame's name) to any error that unwinds through it.
pub fn eval_stmt(env: &Rc<Environment>, stmt: &Stmt) -> Result<Completion, RuntimeError> {
    eval_stmt_inner(env, stmt).map_err(|e| e.push_frame(stmt.line(), env.name().to_string()))
}

fn matches_label(signal_label: &Option<String>, loop_label: &Option<String>) -> bool {
    signal_label.is_none() || signal_label.as_deref() == loop_label.as_deref()
}

fn eval_stmt_inner(env: &Rc<Environment>, stmt: &Stmt) -> Result<Completion, RuntimeError> {
    match stmt {
        Stmt::Block { statements, .. } => {
            let frame = Environment::with_parent(env.clone(), "<scope>");
            let mut value = ScriptValue::Undefined;
            for s in statements {
                let c = eval_stmt(&frame, s)?;
                value = c.value;
                if !matches!(c.flow, Flow::Normal) {
                    return Ok(Completion { flow: c.flow, value });
                }
            }
            Ok(Completion::normal(value))
        }

        Stmt::VarDeclaration {
            qualifier, decls, ..
        } => {
            let is_const = *qualifier == VarQualifier::Const;
            for d in decls {
                let value = match &d.init {
                    Some(e) => eval_expr(env, e)?.value,
                    None => ScriptValue::Undefined,
                };
                let result = if *qualifier == VarQualifier::Var {
                    env.declare_var(&d.name, value)
                } else {
                    env.declare(&d.name, value, is_const)
                };
                result.map_err(RuntimeError::new)?;
            }
            Ok(Completion::normal(ScriptValue::Undefined))
        }

        Stmt::If {
            cond,
            then_branch,
            else_branch,
            ..
        } => {
            if eval_expr(env, cond)?.value.is_truthy() {
                eval_stmt(env, then_branch)
            } else if let Some(else_branch) = else_branch {
                eval_stmt(env, else_branch)
            } else {
                Ok(Completion::normal(ScriptValue::Undefined))
            }
        }

        Stmt::While {
            cond, body, label, ..
        } => {
            let mut value = ScriptValue::Undefined;
            while eval_expr(env, cond)?.value.is_truthy() {
                let c = eval_stmt(env, body)?;
                value = c.value;
                match c.flow {
                    Flow::Normal => {}
                    Flow::Continue(l) if matches_label(&l, label) => {}
                    Flow::Break(l) if matches_label(&l, label) => break,
                    other => return Ok(Completion { flow: other, value }),
                }
            }
            Ok(Completion::normal(value))
        }

        Stmt::DoWhile {
            body, cond, label, ..
        } => {
            let mut value = ScriptValue::Undefined;
            loop {
                let c = eval_stmt(env, body)?;
                value = c.value;
                match c.flow {
                    Flow::Normal => {}
                    Flow::Continue(l) if matches_label(&l, label) => {}
                    Flow::Break(l) if matches_label(&l, label) => break,
                    other => return Ok(Completion { flow: other, value }),
                }
                if !eval_expr(env, cond)?.value.is_truthy() {
                    break;
                }
            }
            Ok(Completion::normal(value))
        }

        Stmt::For {
            init,
            cond,
            incr,
            body,
            label,
            ..
        } => {
            let frame = Environment::with_parent(env.clone(), "<outer_for_loop>");
            if let Some(init) = init {
                eval_stmt(&frame, init)?;
            }
            let mut value = ScriptValue::Undefined;
            loop {
                if !eval_expr(&frame, cond)?.value.is_truthy() {
                    break;
                }
                let c = eval_stmt(&frame, body)?;
                value = c.value;
                match c.flow {
                    Flow::Normal => {}
                    Flow::Continue(l) if matches_label(&l, label) => {}
                    Flow::Break(l) if matches_label(&l, label) => break,
                    other => return Ok(Completion { flow: other, value }),
                }
                if let Some(incr) = incr {
                    eval_expr(&frame, incr)?;
                }
            }
            Ok(Completion::normal(value))
        }

        Stmt::ForOf {
            names,
            iterable,
            body,
            label,
            ..
        } => eval_for_of(env, names, iterable, body, label),

        Stmt::Break { label, .. } => Ok(Completion {
            flow: Flow::Break(label.clone()),
            value: ScriptValue::Undefined,
        }),

        Stmt::Continue { label, .. } => Ok(Completion {
            flow: Flow::Continue(label.clone()),
            value: ScriptValue::Undefined,
        }),

        Stmt::Return { expr, .. } => {
            let value = match expr {
                Some(e) => eval_expr(env, e)?.value,
                None => ScriptValue::Undefined,
            };
            Ok(Completion {
                flow: Flow::Return(value.clone()),
                value,
            })
        }

        Stmt::FunctionDeclaration {
            name,
            arg_names,
            body,
            ..
        } => {
            let data = Rc::new(ScriptFunctionData {
                name: name.clone(),
                arg_names: arg_names.clone(),
                body: Rc::new(body.clone()),
                closure: env.clone(),
            });
            let func = ScriptValue::Function(ScriptFunction::Script(data));
            env.declare(name, func, false).map_err(RuntimeError::new)?;
            Ok(Completion::normal(ScriptValue::Undefined))
        }

        Stmt::Throw { expr, .. } => {
            let value = eval_expr(env, expr)?.value;
            Err(RuntimeError::thrown(value))
        }

        Stmt::TryCatch {
            try_block,
            exception_name,
            catch_block,
            ..
        } => match eval_stmt(env, try_block) {
            Ok(c) => Ok(c),
            Err(err) => {
                let frame = Environment::with_parent(env.clone(), "<catch>");
                let bound = err
                    .thrown_value
                    .clone()
                    .unwrap_or_else(|| ScriptValue::string(err.message.clone()));
                frame.force_set(exception_name, bound, false);
                eval_stmt(&frame, catch_block)
            }
        },

        Stmt::Delete { access, .. } => {
            let vr = eval_expr(env, access)?;
            match vr.access {
                AccessType::Object(obj, key) => {
                    obj.borrow_mut().shift_remove(&key);
                    Ok(Completion::normal(ScriptValue::Undefined))
                }
                _ => Err(RuntimeError::new(
                    "'delete' is only legal on an object property",
                )),
            }
        }

        Stmt::ExpressionStatement { expr, .. } => {
            let value = match expr {
                Some(e) => eval_expr(env, e)?.value,
                None => ScriptValue::Undefined,
            };
            Ok(Completion::normal(value))
        }
    }
}

fn eval_for_of(
    env: &Rc<Environment>,
    names: &[String],
    iterable: &Expr,
    body: &Stmt,
    label: &Option<String>,
) -> Result<Completion, RuntimeError> {
    let iterable_value = eval_expr(env, iterable)?.value;
    let mut value = ScriptValue::Undefined;
    match iterable_value {
        ScriptValue::Object(obj) => {
            let entries: Vec<(String, ScriptValue)> = obj
                .borrow()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            for (key, entry_value) in entries {
                let frame = Environment::with_parent(env.clone(), "<for_of_loop>");
                if names.len() == 1 {
                    frame
                        .declare(&names[0], ScriptValue::string(key), false)
                        .map_err(RuntimeError::new)?;
                } else {
                    frame
                        .declare(&names[0], ScriptValue::string(key), false)
                        .map_err(RuntimeError::new)?;
                    frame
                        .declare(&names[1], entry_value, false)
                        .map_err(RuntimeError::new)?;
                }
                let c = eval_stmt(&frame, body)?;
                value = c.value;
                match c.flow {
                    Flow::Normal => {}
                    Flow::Continue(l) if matches_label(&l, label) => {}
                    Flow::Break(l) if matches_label(&l, label) => break,
                    other => return Ok(Completion { flow: other, value }),
                }
            }
        }
        ScriptValue::Array(arr) => {
            let items: Vec<ScriptValue> = arr.borrow().clone();
            for (index, item) in items.into_iter().enumerate() {
                let frame = Environment::with_parent(env.clone(), "<for_of_loop>");
                if names.len() == 1 {
                    frame.declare(&names[0], item, false).map_err(RuntimeError::new)?;
                } else {
                    frame
                        .declare(&names[0], ScriptValue::Integer(index as i64), false)
                        .map_err(RuntimeError::new)?;
                    frame.declare(&names[1], item, false).map_err(RuntimeError::new)?;
                }
                let c = eval_stmt(&frame, body)?;
                value = c.value;
                match c.flow {
                    Flow::Normal => {}
                    Flow::Continue(l) if matches_label(&l, label) => {}
                    Flow::Break(l) if matches_label(&l, label) => break,
                    other => return Ok(Completion { flow: other, value }),
                }
            }
        }
        other => {
            return Err(RuntimeError::new(format!(
                "for-of requires an array or object, found a {} value",
                other.type_name()
            )))
        }
    }
    Ok(Completion::normal(value))
}

// ---- expressions ----

pub fn eval_expr(env: &Rc<Environment>, expr: &Expr) -> Result<VisitResult, RuntimeError> {
    match expr {
        Expr::Literal { value, .. } => Ok(VisitResult::rvalue(value.clone())),

        Expr::ArrayLiteral { elements } => {
            let mut items = Vec::with_capacity(elements.len());
            for e in elements {
                items.push(eval_expr(env, e)?.value);
            }
            Ok(VisitResult::rvalue(ScriptValue::array(items)))
        }

        Expr::ObjectLiteral { keys, values } => {
            let mut map = IndexMap::with_capacity(keys.len());
            for (k, v) in keys.iter().zip(values.iter()) {
                let value = eval_expr(env, v)?.value;
                map.insert(k.clone(), value);
            }
            Ok(VisitResult::rvalue(ScriptValue::object(map)))
        }

        Expr::VarAccess { name } => {
            let (value, _is_const) = env
                .lookup(&name.text)
                .ok_or_else(|| RuntimeError::new(format!("'{}' is not defined", name.text)))?;
            Ok(VisitResult {
                value,
                access: AccessType::Var(name.text.clone()),
            })
        }

        Expr::MemberAccess { object, member } => {
            let object_value = eval_expr(env, object)?.value;
            match object_value {
                ScriptValue::Object(obj) => {
                    let value = obj.borrow().get(member).cloned().unwrap_or(ScriptValue::Undefined);
                    Ok(VisitResult {
                        value,
                        access: AccessType::Object(obj, member.clone()),
                    })
                }
                other => Err(RuntimeError::new(format!(
                    "Cannot read property '{}' of a {} value",
                    member,
                    other.type_name()
                ))),
            }
        }

        Expr::ArrayIndex { object, index } => {
            let object_value = eval_expr(env, object)?.value;
            let index_value = eval_expr(env, index)?.value;
            match index_value {
                ScriptValue::String(key) => match object_value {
                    ScriptValue::Object(obj) => {
                        let value = obj.borrow().get(&*key).cloned().unwrap_or(ScriptValue::Undefined);
                        Ok(VisitResult {
                            value,
                            access: AccessType::Object(obj, (*key).clone()),
                        })
                    }
                    other => Err(RuntimeError::new(format!(
                        "Cannot index a {} value with a string key",
                        other.type_name()
                    ))),
                },
                ScriptValue::Integer(i) => match object_value {
                    ScriptValue::Array(arr) => {
                        if i < 0 {
                            return Err(RuntimeError::new("Array index must not be negative"));
                        }
                        let idx = i as usize;
                        let value = arr.borrow().get(idx).cloned().unwrap_or(ScriptValue::Undefined);
                        Ok(VisitResult {
                            value,
                            access: AccessType::Array(arr, idx),
                        })
                    }
                    other => Err(RuntimeError::new(format!(
                        "Cannot index a {} value with a numeric key",
                        other.type_name()
                    ))),
                },
                other => Err(RuntimeError::new(format!(
                    "Array/object index must be a string or an integer, found a {} value",
                    other.type_name()
                ))),
            }
        }

        Expr::FunctionCall {
            callee,
            args,
            return_this,
        } => {
            let callee_vr = eval_expr(env, callee)?;
            let mut arg_values = Vec::with_capacity(args.len());
            for a in args {
                arg_values.push(eval_expr(env, a)?.value);
            }
            let line = match callee {
                Expr::VarAccess { name } => name.position.line,
                _ => 0,
            };
            call_function(env, callee_vr, arg_values, *return_this, line)
        }

        Expr::NewExpression { call } => eval_expr(env, call),

        Expr::BinaryOp { op, left, right } => eval_binary(env, op, left, right),

        Expr::UnaryOp { op, operand } => {
            let value = eval_expr(env, operand)?.value;
            Ok(VisitResult::rvalue(eval_unary(op, &value)?))
        }

        Expr::FunctionExpr { arg_names, body } => {
            let data = Rc::new(ScriptFunctionData {
                name: String::new(),
                arg_names: arg_names.clone(),
                body: Rc::new(body.clone()),
                closure: env.clone(),
            });
            Ok(VisitResult::rvalue(ScriptValue::Function(ScriptFunction::Script(data))))
        }
    }
}

fn call_function(
    env: &Rc<Environment>,
    callee: VisitResult,
    args: Vec<ScriptValue>,
    return_this: bool,
    line: usize,
) -> Result<VisitResult, RuntimeError> {
    let this_value = if return_this {
        ScriptValue::object(IndexMap::new())
    } else {
        match &callee.access {
            AccessType::Object(obj, _) => ScriptValue::Object(obj.clone()),
            AccessType::Array(arr, _) => ScriptValue::Array(arr.clone()),
            _ => ScriptValue::Undefined,
        }
    };

    match callee.value {
        ScriptValue::Function(ScriptFunction::Script(data)) => {
            let frame_name = if data.name.is_empty() {
                "<anonymous>".to_string()
            } else {
                data.name.clone()
            };
            let frame = Environment::with_parent(data.closure.clone(), frame_name.clone());
            for (i, name) in data.arg_names.iter().enumerate() {
                let v = args.get(i).cloned().unwrap_or(ScriptValue::Undefined);
                frame.force_set(name, v, false);
            }
            frame.force_set("this", this_value.clone(), true);

            let mut returned = ScriptValue::Undefined;
            for stmt in data.body.iter() {
                let c = eval_stmt(&frame, stmt)?;
                match c.flow {
                    Flow::Return(v) => {
                        returned = v;
                        break;
                    }
                    Flow::Break(_) | Flow::Continue(_) => break,
                    Flow::Normal => {}
                }
            }

            let value = if return_this { this_value } else { returned };
            Ok(VisitResult::rvalue(value))
        }

        ScriptValue::Function(ScriptFunction::Native(f)) => {
            let mut this_mut = this_value.clone();
            let mut nfe = NativeFnError::None;
            let mut scratch = (**env).clone();
            let result = f(&mut scratch, &mut this_mut, &args, &mut nfe);
            match nfe {
                NativeFnError::None => {
                    let value = if return_this { this_mut } else { result };
                    Ok(VisitResult::rvalue(value))
                }
                NativeFnError::WrongNumberOfArgs => Err(RuntimeError::new("Wrong number of arguments")
                    .push_frame(line, "<native>")),
                NativeFnError::WrongTypeOfArg => {
                    Err(RuntimeError::new("Wrong type of argument").push_frame(line, "<native>"))
                }
                NativeFnError::ReturnValueIsException => {
                    Err(RuntimeError::thrown(result).push_frame(line, "<native>"))
                }
            }
        }

        other => Err(RuntimeError::new(format!(
            "{} is not a function",
            other.type_name()
        ))),
    }
}

fn eval_binary(
    env: &Rc<Environment>,
    op: &Token,
    left: &Expr,
    right: &Expr,
) -> Result<VisitResult, RuntimeError> {
    match op.kind {
        TokenType::And => {
            let l = eval_expr(env, left)?;
            if !l.value.is_truthy() {
                return Ok(VisitResult::rvalue(l.value));
            }
            Ok(VisitResult::rvalue(eval_expr(env, right)?.value))
        }
        TokenType::Or => {
            let l = eval_expr(env, left)?;
            if l.value.is_truthy() {
                return Ok(VisitResult::rvalue(l.value));
            }
            Ok(VisitResult::rvalue(eval_expr(env, right)?.value))
        }
        TokenType::Assign | TokenType::PlusAssign | TokenType::DashAssign => {
            eval_assignment(env, op, left, right)
        }
        _ => {
            let l = eval_expr(env, left)?.value;
            let r = eval_expr(env, right)?.value;
            Ok(VisitResult::rvalue(apply_binary_op(op, &l, &r)?))
        }
    }
}

fn eval_assignment(
    env: &Rc<Environment>,
    op: &Token,
    left: &Expr,
    right: &Expr,
) -> Result<VisitResult, RuntimeError> {
    let lhs = eval_expr(env, left)?;
    let rhs_value = eval_expr(env, right)?.value;
    let new_value = match op.kind {
        TokenType::Assign => rhs_value,
        TokenType::PlusAssign => {
            let plus = Token::with_text(TokenType::Plus, op.position, "+");
            apply_binary_op(&plus, &lhs.value, &rhs_value)?
        }
        TokenType::DashAssign => {
            let dash = Token::with_text(TokenType::Dash, op.position, "-");
            apply_binary_op(&dash, &lhs.value, &rhs_value)?
        }
        _ => unreachable!("eval_assignment only handles assignment operators"),
    };

    match lhs.access {
        AccessType::Var(name) => match env.reassign(&name, new_value.clone()) {
            Reassign::Ok => {}
            Reassign::Const => {
                return Err(RuntimeError::new(format!(
                    "Assignment to constant variable '{name}'"
                )))
            }
            Reassign::NotFound => {
                return Err(RuntimeError::new(format!("'{name}' is not defined")))
            }
        },
        AccessType::Array(arr, idx) => {
            let mut items = arr.borrow_mut();
            if idx >= items.len() {
                return Err(RuntimeError::new("Array index out of bounds"));
            }
            items[idx] = new_value.clone();
        }
        AccessType::Object(obj, key) => {
            obj.borrow_mut().insert(key, new_value.clone());
        }
        AccessType::None => return Err(RuntimeError::new("Invalid assignment target")),
    }

    Ok(VisitResult::rvalue(new_value))
}

enum Num {
    I(i64),
    D(f64),
}

impl Num {
    fn as_f64(&self) -> f64 {
        match self {
            Num::I(i) => *i as f64,
            Num::D(d) => *d,
        }
    }
}

fn to_num(v: &ScriptValue) -> Option<Num> {
    match v {
        ScriptValue::Integer(i) => Some(Num::I(*i)),
        ScriptValue::Double(d) => Some(Num::D(*d)),
        _ => None,
    }
}

fn require_num(v: &ScriptValue, op_text: &str) -> Result<Num, RuntimeError> {
    to_num(v).ok_or_else(|| {
        RuntimeError::new(format!(
            "'{op_text}' requires a numeric operand, found a {} value",
            v.type_name()
        ))
    })
}

fn require_int(v: &ScriptValue, op_text: &str) -> Result<i64, RuntimeError> {
    match v {
        ScriptValue::Integer(i) => Ok(*i),
        _ => Err(RuntimeError::new(format!(
            "'{op_text}' requires an integer operand, found a {} value",
            v.type_name()
        ))),
    }
}

/// Dispatches every non-assignment, non-short-circuit binary operator on
/// two already-evaluated operands.
fn apply_binary_op(op: &Token, l: &ScriptValue, r: &ScriptValue) -> Result<ScriptValue, RuntimeError> {
    use TokenType::*;
    match op.kind {
        Plus => {
            if matches!(l, ScriptValue::String(_)) || matches!(r, ScriptValue::String(_)) {
                return Ok(ScriptValue::string(format!(
                    "{}{}",
                    l.to_display_string(),
                    r.to_display_string()
                )));
            }
            let (ln, rn) = (require_num(l, "+")?, require_num(r, "+")?);
            Ok(match (ln, rn) {
                (Num::I(a), Num::I(b)) => ScriptValue::Integer(a.wrapping_add(b)),
                (a, b) => ScriptValue::Double(a.as_f64() + b.as_f64()),
            })
        }
        Dash => {
            let (ln, rn) = (require_num(l, "-")?, require_num(r, "-")?);
            Ok(match (ln, rn) {
                (Num::I(a), Num::I(b)) => ScriptValue::Integer(a.wrapping_sub(b)),
                (a, b) => ScriptValue::Double(a.as_f64() - b.as_f64()),
            })
        }
        Star => {
            let (ln, rn) = (require_num(l, "*")?, require_num(r, "*")?);
            Ok(match (ln, rn) {
                (Num::I(a), Num::I(b)) => ScriptValue::Integer(a.wrapping_mul(b)),
                (a, b) => ScriptValue::Double(a.as_f64() * b.as_f64()),
            })
        }
        FSlash => {
            let (ln, rn) = (require_num(l, "/")?, require_num(r, "/")?);
            match (ln, rn) {
                (Num::I(a), Num::I(b)) => {
                    if b == 0 {
                        return Err(RuntimeError::new("Division by zero"));
                    }
                    if a % b == 0 {
                        Ok(ScriptValue::Integer(a / b))
                    } else {
                        Ok(ScriptValue::Double(a as f64 / b as f64))
                    }
                }
                (a, b) => Ok(ScriptValue::Double(a.as_f64() / b.as_f64())),
            }
        }
        Percent => {
            let (ln, rn) = (require_num(l, "%")?, require_num(r, "%")?);
            match (ln, rn) {
                (Num::I(a), Num::I(b)) => {
                    if b == 0 {
                        return Err(RuntimeError::new("Division by zero"));
                    }
                    Ok(ScriptValue::Integer(a.wrapping_rem(b)))
                }
                (a, b) => Ok(ScriptValue::Double(a.as_f64() % b.as_f64())),
            }
        }
        Pow => {
            let (ln, rn) = (require_num(l, "**")?, require_num(r, "**")?);
            Ok(ScriptValue::Double(ln.as_f64().powf(rn.as_f64())))
        }
        BitLShift => {
            let (a, b) = (require_int(l, "<<")?, require_int(r, "<<")?);
            Ok(ScriptValue::Integer(a.wrapping_shl((b as u32) & 63)))
        }
        BitRShift => {
            let (a, b) = (require_int(l, ">>")?, require_int(r, ">>")?);
            Ok(ScriptValue::Integer(a.wrapping_shr((b as u32) & 63)))
        }
        BitURShift => {
            let (a, b) = (require_int(l, ">>>")?, require_int(r, ">>>")?);
            Ok(ScriptValue::Integer(((a as u64).wrapping_shr((b as u32) & 63)) as i64))
        }
        BitAnd => Ok(ScriptValue::Integer(require_int(l, "&")? & require_int(r, "&")?)),
        BitXor => Ok(ScriptValue::Integer(require_int(l, "^")? ^ require_int(r, "^")?)),
        BitOr => Ok(ScriptValue::Integer(require_int(l, "|")? | require_int(r, "|")?)),
        Lt | Le | Gt | Ge => compare(op.kind, l, r),
        Equals => Ok(ScriptValue::Boolean(l.loose_equals(r))),
        NEquals => Ok(ScriptValue::Boolean(!l.loose_equals(r))),
        StrictEquals => Ok(ScriptValue::Boolean(l.strict_equals(r))),
        StrictNEquals => Ok(ScriptValue::Boolean(!l.strict_equals(r))),
        other => Err(RuntimeError::new(format!("Unsupported binary operator {other:?}"))),
    }
}

fn compare(kind: TokenType, l: &ScriptValue, r: &ScriptValue) -> Result<ScriptValue, RuntimeError> {
    use std::cmp::Ordering;
    let ordering = match (l, r) {
        (ScriptValue::String(a), ScriptValue::String(b)) => a.cmp(b),
        _ => {
            let (ln, rn) = (require_num(l, "comparison")?, require_num(r, "comparison")?);
            ln.as_f64()
                .partial_cmp(&rn.as_f64())
                .ok_or_else(|| RuntimeError::new("Cannot compare NaN"))?
        }
    };
    let result = match kind {
        TokenType::Lt => ordering == Ordering::Less,
        TokenType::Le => ordering != Ordering::Greater,
        TokenType::Gt => ordering == Ordering::Greater,
        TokenType::Ge => ordering != Ordering::Less,
        _ => unreachable!(),
    };
    Ok(ScriptValue::Boolean(result))
}

fn eval_unary(op: &Token, value: &ScriptValue) -> Result<ScriptValue, RuntimeError> {
    if op.kind == TokenType::Keyword && op.text == "typeof" {
        return Ok(ScriptValue::string(value.type_name()));
    }
    match op.kind {
        TokenType::Not => Ok(ScriptValue::Boolean(!value.is_truthy())),
        TokenType::BitNot => Ok(ScriptValue::Integer(!require_int(value, "~")?)),
        TokenType::Plus => match require_num(value, "unary +")? {
            Num::I(i) => Ok(ScriptValue::Integer(i)),
            Num::D(d) => Ok(ScriptValue::Double(d)),
        },
        TokenType::Dash => match require_num(value, "unary -")? {
            Num::I(i) => Ok(ScriptValue::Integer(i.wrapping_neg())),
            Num::D(d) => Ok(ScriptValue::Double(-d)),
        },
        other => Err(RuntimeError::new(format!("Unsupported unary operator {other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn run(src: &str) -> Result<ScriptValue, RuntimeError> {
        let tokens = Lexer::tokenize(src).unwrap();
        let ast = Parser::parse(tokens).unwrap();
        let env = Environment::new_global();
        Ok(eval_stmt(&env, &ast)?.value)
    }

    #[test]
    fn arithmetic_precedence_matches_expected_value() {
        assert!(matches!(run("var x = 2 + 3 * 4; x;").unwrap(), ScriptValue::Integer(14)));
    }

    #[test]
    fn recursive_function_call() {
        let src = "function fact(n){ if(n<=1) return 1; return n*fact(n-1); } fact(6);";
        assert!(matches!(run(src).unwrap(), ScriptValue::Integer(720)));
    }

    #[test]
    fn array_indexing_and_loop_accumulation() {
        let src = "var a = [1,2,3]; var s = 0; for(var i=0; i<3; i+=1) s = s + a[i]; s;";
        assert!(matches!(run(src).unwrap(), ScriptValue::Integer(6)));
    }

    #[test]
    fn for_of_over_object_keys_in_insertion_order() {
        let src = "var o = {x:1, y:2}; var k = ''; for(key of o) k = k + key; k;";
        match run(src).unwrap() {
            ScriptValue::String(s) => assert_eq!(&*s, "xy"),
            other => panic!("expected string, got {other:?}"),
        }
    }

    #[test]
    fn try_catch_binds_thrown_string_value() {
        let src = "try { throw 'boom'; } catch(e) { e + '!'; }";
        match run(src).unwrap() {
            ScriptValue::String(s) => assert_eq!(&*s, "boom!"),
            other => panic!("expected string, got {other:?}"),
        }
    }

    #[test]
    fn reassigning_a_const_is_a_runtime_error() {
        let err = run("const c = 5; c = 6;").unwrap_err();
        assert!(err.render().contains("const"));
        assert!(err.render().contains('c'));
    }

    #[test]
    fn empty_program_evaluates_to_undefined() {
        assert!(matches!(run("").unwrap(), ScriptValue::Undefined));
    }

    #[test]
    fn for_ever_breaks_immediately_yields_undefined() {
        assert!(matches!(run("for (;;) break;").unwrap(), ScriptValue::Undefined));
    }

    #[test]
    fn delete_removes_an_object_property() {
        let src = "var o = {k: 1}; delete o.k; o.k;";
        assert!(matches!(run(src).unwrap(), ScriptValue::Undefined));
    }

    #[test]
    fn strict_equality_rejects_cross_type_numbers() {
        assert!(matches!(run("1 === 1.0;").unwrap(), ScriptValue::Boolean(false)));
        assert!(matches!(run("1 == 1.0;").unwrap(), ScriptValue::Boolean(true)));
    }

    #[test]
    fn string_concatenation_with_plus() {
        match run("'a' + 'b' + 'c';").unwrap() {
            ScriptValue::String(s) => assert_eq!(&*s, "abc"),
            other => panic!("expected string, got {other:?}"),
        }
    }

    #[test]
    fn logical_and_short_circuits_without_evaluating_right_side() {
        // If && evaluated the right side, calling a function on `false` would error.
        let src = "function boom() { return undefinedVar; } false && boom();";
        assert!(matches!(run(src).unwrap(), ScriptValue::Boolean(false)));
    }

    #[test]
    fn labeled_break_exits_the_correct_outer_loop() {
        let src = "
            var hits = 0;
            outer: for (var i = 0; i < 3; i += 1) {
                for (var j = 0; j < 3; j += 1) {
                    if (j == 1) { break outer; }
                    hits = hits + 1;
                }
            }
            hits;
        ";
        assert!(matches!(run(src).unwrap(), ScriptValue::Integer(1)));
    }

    #[test]
    fn new_expression_ignores_return_value_and_yields_this() {
        let src = "function Point(x) { this.x = x; return 999; } var p = new Point(3); p.x;";
        assert!(matches!(run(src).unwrap(), ScriptValue::Integer(3)));
    }

    #[test]
    fn closures_capture_their_defining_environment() {
        let src = "
            function makeAdder(n) { return function(x) { return x + n; }; }
            var add5 = makeAdder(5);
            add5(10);
        ";
        assert!(matches!(run(src).unwrap(), ScriptValue::Integer(15)));
    }

    #[test]
    fn break_outside_of_labeled_loop_propagates_up() {
        let src = "
            var count = 0;
            for (var i = 0; i < 2; i += 1) {
                outer: while (true) {
                    count = count + 1;
                    break;
                }
            }
            count;
        ";
        assert!(matches!(run(src).unwrap(), ScriptValue::Integer(2)));
    }
}
