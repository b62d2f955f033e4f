// ABOUTME: The library's external entry point binding lexer, parser, and evaluator together

use crate::env::Environment;
use crate::error::Error;
use crate::eval::eval_stmt;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::value::ScriptValue;
use std::rc::Rc;

/// Owns the root environment and drives a source string through the full
/// lex -> parse -> evaluate pipeline. Each `Interpreter` is an independent
/// evaluation; nothing here is shared across instances.
pub struct Interpreter {
    global: Rc<Environment>,
}

impl Interpreter {
    /// Constructs an evaluator with an empty global frame.
    pub fn new() -> Self {
        Interpreter {
            global: Environment::new_global(),
        }
    }

    /// Installs a global binding, bypassing the normal redeclaration check.
    /// This is how a host exposes native functions and constants to script
    /// code before calling `evaluate`.
    pub fn force_set_global(&self, name: &str, value: ScriptValue, is_const: bool) {
        self.global.force_set(name, value, is_const);
    }

    /// Lexes, parses, and runs a program against this interpreter's global
    /// frame, returning the value of the last executed expression statement
    /// or the error that stopped it.
    pub fn evaluate(&self, source: &str) -> Result<ScriptValue, Error> {
        let tokens = Lexer::tokenize(source)?;
        let program = Parser::parse(tokens)?;
        let completion = eval_stmt(&self.global, &program)?;
        Ok(completion.value)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
