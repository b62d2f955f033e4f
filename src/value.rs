// ABOUTME: The dynamically-typed value model shared by the AST and evaluator

use crate::ast::Stmt;
use crate::env::Environment;
use crate::error::NativeFnError;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A script-defined function: its declared name (empty for anonymous
/// function expressions), formal argument names, its body statements, and
/// the environment frame it closes over.
#[derive(Debug, Clone)]
pub struct ScriptFunctionData {
    pub name: String,
    pub arg_names: Vec<String>,
    pub body: Rc<Vec<Stmt>>,
    pub closure: Rc<Environment>,
}

/// The exact ABI the host must implement to inject a callable into script
/// code: receives the calling environment, the bound `this`, the evaluated
/// arguments, and an out-parameter for signaling failure.
pub type NativeCallable =
    fn(&mut Environment, &mut ScriptValue, &[ScriptValue], &mut NativeFnError) -> ScriptValue;

#[derive(Debug, Clone)]
pub enum ScriptFunction {
    Script(Rc<ScriptFunctionData>),
    Native(NativeCallable),
}

pub type ScriptArray = Rc<RefCell<Vec<ScriptValue>>>;
pub type ScriptObject = Rc<RefCell<IndexMap<String, ScriptValue>>>;

#[derive(Debug, Clone)]
pub enum ScriptValue {
    Undefined,
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(Rc<String>),
    Array(ScriptArray),
    Object(ScriptObject),
    Function(ScriptFunction),
}

impl ScriptValue {
    pub fn string(s: impl Into<String>) -> Self {
        ScriptValue::String(Rc::new(s.into()))
    }

    pub fn array(items: Vec<ScriptValue>) -> Self {
        ScriptValue::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object(entries: IndexMap<String, ScriptValue>) -> Self {
        ScriptValue::Object(Rc::new(RefCell::new(entries)))
    }

    /// The string `typeof` returns for this value's variant tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            ScriptValue::Undefined => "undefined",
            ScriptValue::Null => "null",
            ScriptValue::Boolean(_) => "boolean",
            ScriptValue::Integer(_) => "integer",
            ScriptValue::Double(_) => "double",
            ScriptValue::String(_) => "string",
            ScriptValue::Array(_) => "array",
            ScriptValue::Object(_) => "object",
            ScriptValue::Function(_) => "function",
        }
    }

    /// Truthiness per the data model: `undefined`, `null`, `false`, numeric
    /// zero, and the empty string are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            ScriptValue::Undefined | ScriptValue::Null => false,
            ScriptValue::Boolean(b) => *b,
            ScriptValue::Integer(n) => *n != 0,
            ScriptValue::Double(n) => *n != 0.0,
            ScriptValue::String(s) => !s.is_empty(),
            ScriptValue::Array(_) | ScriptValue::Object(_) | ScriptValue::Function(_) => true,
        }
    }

    /// Strict equality: same variant tag, same value, no coercion. `NaN` is
    /// never strictly equal to anything, including itself.
    pub fn strict_equals(&self, other: &ScriptValue) -> bool {
        match (self, other) {
            (ScriptValue::Undefined, ScriptValue::Undefined) => true,
            (ScriptValue::Null, ScriptValue::Null) => true,
            (ScriptValue::Boolean(a), ScriptValue::Boolean(b)) => a == b,
            (ScriptValue::Integer(a), ScriptValue::Integer(b)) => a == b,
            (ScriptValue::Double(a), ScriptValue::Double(b)) => a == b,
            (ScriptValue::String(a), ScriptValue::String(b)) => a == b,
            (ScriptValue::Array(a), ScriptValue::Array(b)) => Rc::ptr_eq(a, b),
            (ScriptValue::Object(a), ScriptValue::Object(b)) => Rc::ptr_eq(a, b),
            (ScriptValue::Function(ScriptFunction::Native(a)), ScriptValue::Function(ScriptFunction::Native(b))) => {
                std::ptr::eq(*a as *const (), *b as *const ())
            }
            (ScriptValue::Function(ScriptFunction::Script(a)), ScriptValue::Function(ScriptFunction::Script(b))) => {
                Rc::ptr_eq(a, b)
            }
            _ => false,
        }
    }

    /// Type-coercing equality (`==`): numeric tags compare numerically,
    /// everything else falls back to strict equality.
    pub fn loose_equals(&self, other: &ScriptValue) -> bool {
        use ScriptValue::*;
        match (self, other) {
            (Integer(a), Double(b)) | (Double(b), Integer(a)) => (*a as f64) == *b,
            _ => self.strict_equals(other),
        }
    }

    /// Rendering used both for script-visible coercion to string (`+`
    /// concatenation) and for the message of a thrown non-string value.
    pub fn to_display_string(&self) -> String {
        match self {
            ScriptValue::Undefined => "undefined".to_string(),
            ScriptValue::Null => "null".to_string(),
            ScriptValue::Boolean(b) => b.to_string(),
            ScriptValue::Integer(n) => n.to_string(),
            ScriptValue::Double(n) => format_double(*n),
            ScriptValue::String(s) => (**s).clone(),
            ScriptValue::Array(items) => {
                let items = items.borrow();
                let parts: Vec<String> = items.iter().map(|v| v.to_display_string()).collect();
                format!("[{}]", parts.join(", "))
            }
            ScriptValue::Object(map) => {
                let map = map.borrow();
                let parts: Vec<String> = map
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.to_display_string()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
            ScriptValue::Function(ScriptFunction::Script(f)) => {
                if f.name.is_empty() {
                    "[function (anonymous)]".to_string()
                } else {
                    format!("[function {}]", f.name)
                }
            }
            ScriptValue::Function(ScriptFunction::Native(_)) => "[native function]".to_string(),
        }
    }
}

fn format_double(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else {
        n.to_string()
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_is_not_null() {
        assert!(!ScriptValue::Undefined.strict_equals(&ScriptValue::Null));
    }

    #[test]
    fn strict_equals_requires_same_tag() {
        assert!(!ScriptValue::Integer(1).strict_equals(&ScriptValue::Double(1.0)));
        assert!(ScriptValue::Integer(1).strict_equals(&ScriptValue::Integer(1)));
    }

    #[test]
    fn nan_is_never_strictly_equal() {
        let nan = ScriptValue::Double(f64::NAN);
        assert!(!nan.strict_equals(&nan));
    }

    #[test]
    fn loose_equals_coerces_numeric_tags() {
        assert!(ScriptValue::Integer(2).loose_equals(&ScriptValue::Double(2.0)));
    }

    #[test]
    fn truthiness_matches_data_model() {
        assert!(!ScriptValue::Undefined.is_truthy());
        assert!(!ScriptValue::Null.is_truthy());
        assert!(!ScriptValue::Boolean(false).is_truthy());
        assert!(!ScriptValue::Integer(0).is_truthy());
        assert!(!ScriptValue::Double(0.0).is_truthy());
        assert!(!ScriptValue::string("").is_truthy());
        assert!(ScriptValue::string("a").is_truthy());
        assert!(ScriptValue::Integer(-1).is_truthy());
    }

    #[test]
    fn type_name_is_bijective_for_primitives() {
        assert_eq!(ScriptValue::Undefined.type_name(), "undefined");
        assert_eq!(ScriptValue::Null.type_name(), "null");
        assert_eq!(ScriptValue::Boolean(true).type_name(), "boolean");
        assert_eq!(ScriptValue::Integer(1).type_name(), "integer");
        assert_eq!(ScriptValue::Double(1.0).type_name(), "double");
        assert_eq!(ScriptValue::string("x").type_name(), "string");
        assert_eq!(ScriptValue::array(vec![]).type_name(), "array");
    }

    #[test]
    fn arrays_and_objects_share_reference_semantics() {
        let arr = ScriptValue::array(vec![ScriptValue::Integer(1)]);
        let arr2 = arr.clone();
        if let (ScriptValue::Array(a), ScriptValue::Array(b)) = (&arr, &arr2) {
            a.borrow_mut().push(ScriptValue::Integer(2));
            assert_eq!(b.borrow().len(), 2);
        } else {
            panic!("expected arrays");
        }
    }
}
