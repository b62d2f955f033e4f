// ABOUTME: Compile-time and run-time error carriers threaded through the pipeline

use crate::token::Token;
use crate::value::ScriptValue;
use thiserror::Error;

/// Raised by the lexer or parser. Fatal to the enclosing `evaluate` call;
/// never caught by script-level `try`/`catch`.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message} at {}", token.position)]
pub struct CompileError {
    pub message: String,
    pub token: Token,
}

impl CompileError {
    pub fn new(message: impl Into<String>, token: Token) -> Self {
        CompileError {
            message: message.into(),
            token,
        }
    }
}

/// One frame of the accumulated script traceback, recorded as a statement
/// unwinds past an exception.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceFrame {
    pub line: usize,
    pub function_name: String,
}

/// Raised by the evaluator or by native callbacks. Catchable by script
/// `try`/`catch`; an uncaught instance surfaces from `evaluate` with its
/// accumulated traceback.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct RuntimeError {
    pub message: String,
    pub thrown_value: Option<ScriptValue>,
    pub script_traceback: Vec<TraceFrame>,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        RuntimeError {
            message: message.into(),
            thrown_value: None,
            script_traceback: Vec::new(),
        }
    }

    pub fn thrown(value: ScriptValue) -> Self {
        let message = value.to_display_string();
        RuntimeError {
            message,
            thrown_value: Some(value),
            script_traceback: Vec::new(),
        }
    }

    /// Appends a frame as this error unwinds through a statement.
    pub fn push_frame(mut self, line: usize, function_name: impl Into<String>) -> Self {
        self.script_traceback.push(TraceFrame {
            line,
            function_name: function_name.into(),
        });
        self
    }

    /// Renders the `"<message>\n  at <line> in <function-name>"` chain from
    /// innermost to outermost frame, per the user-visible failure format.
    pub fn render(&self) -> String {
        let mut out = self.message.clone();
        for frame in &self.script_traceback {
            out.push_str(&format!("\n  at {} in {}", frame.line, frame.function_name));
        }
        out
    }
}

/// The two top-level error kinds a host sees from `Interpreter::evaluate`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Out-parameter codes a native callable uses to signal failure, mapped by
/// the evaluator onto script-visible `RuntimeError`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NativeFnError {
    #[default]
    None,
    WrongNumberOfArgs,
    WrongTypeOfArg,
    ReturnValueIsException,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Position, TokenType};

    #[test]
    fn runtime_error_render_chains_frames() {
        let err = RuntimeError::new("boom")
            .push_frame(3, "inner")
            .push_frame(7, "outer");
        assert_eq!(err.render(), "boom\n  at 3 in inner\n  at 7 in outer");
    }

    #[test]
    fn compile_error_carries_token_position() {
        let tok = Token::with_text(TokenType::Invalid, Position { line: 2, column: 5 }, "@");
        let err = CompileError::new("bad char", tok);
        assert_eq!(err.token.position, Position { line: 2, column: 5 });
    }
}
