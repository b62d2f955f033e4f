// ABOUTME: Hand-rolled, token-based, precedence-climbing parser producing the AST

use crate::ast::{Expr, Stmt, VarDeclarator, VarQualifier};
use crate::error::CompileError;
use crate::token::{Token, TokenType};
use crate::value::ScriptValue;

/// Binding power for a prefix unary operator (`!`, `~`, `+`, `-`, `typeof`).
/// Higher than every binary operator so `-a + b` parses as `(-a) + b`, but
/// lower than postfix member/index/call so `!obj.prop` parses as `!(obj.prop)`.
const UNARY_PREC: u8 = 17;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    loop_depth: usize,
}

impl Parser {
    /// Parses the full token stream into the `Block` statement covering the
    /// whole program.
    pub fn parse(tokens: Vec<Token>) -> Result<Stmt, CompileError> {
        let mut parser = Parser {
            tokens,
            pos: 0,
            loop_depth: 0,
        };
        let mut statements = Vec::new();
        while !parser.check_eof() {
            statements.push(parser.parse_statement()?);
        }
        Ok(Stmt::Block {
            statements,
            line: 1,
        })
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn check_eof(&self) -> bool {
        self.current().kind == TokenType::Eof
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn is(&self, kind: TokenType) -> bool {
        self.current().kind == kind
    }

    fn is_keyword(&self, word: &str) -> bool {
        self.current().kind == TokenType::Keyword && self.current().text == word
    }

    fn expect(&mut self, kind: TokenType, what: &str) -> Result<Token, CompileError> {
        if self.is(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(format!("Expected {what}, found {}", self.current())))
        }
    }

    fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::new(message, self.current().clone())
    }

    /// A statement's trailing `;` is optional when the next token is `EOF`.
    fn expect_terminator(&mut self) -> Result<(), CompileError> {
        if self.is(TokenType::Semicolon) {
            self.advance();
            Ok(())
        } else if self.check_eof() {
            Ok(())
        } else {
            Err(self.error(format!("Expected ';', found {}", self.current())))
        }
    }

    // ---- statements ----

    fn parse_statement(&mut self) -> Result<Stmt, CompileError> {
        if self.is(TokenType::Label) {
            return self.parse_labeled_statement();
        }
        if self.is(TokenType::Keyword) {
            match self.current().text.as_str() {
                "var" | "let" | "const" => return self.parse_var_declaration(),
                "if" => return self.parse_if(),
                "while" => return self.parse_while(None),
                "do" => return self.parse_do_while(None),
                "for" => return self.parse_for(None),
                "break" => return self.parse_break(),
                "continue" => return self.parse_continue(),
                "return" => return self.parse_return(),
                "function" => return self.parse_function_declaration(),
                "throw" => return self.parse_throw(),
                "try" => return self.parse_try_catch(),
                "delete" => return self.parse_delete(),
                _ => {}
            }
        }
        if self.is(TokenType::LBrace) {
            return self.parse_block();
        }
        if self.is(TokenType::Semicolon) {
            let line = self.current().position.line;
            self.advance();
            return Ok(Stmt::ExpressionStatement { expr: None, line });
        }
        self.parse_expression_statement()
    }

    fn parse_labeled_statement(&mut self) -> Result<Stmt, CompileError> {
        let label_tok = self.advance();
        let label = label_tok.text.clone();
        if self.is_keyword("while") {
            return self.parse_while(Some(label));
        }
        if self.is_keyword("do") {
            return self.parse_do_while(Some(label));
        }
        if self.is_keyword("for") {
            return self.parse_for(Some(label));
        }
        Err(CompileError::new(
            "Labels may only be applied to loop statements",
            label_tok,
        ))
    }

    fn parse_block(&mut self) -> Result<Stmt, CompileError> {
        let line = self.current().position.line;
        self.expect(TokenType::LBrace, "'{'")?;
        let mut statements = Vec::new();
        while !self.is(TokenType::RBrace) && !self.check_eof() {
            statements.push(self.parse_statement()?);
        }
        self.expect(TokenType::RBrace, "'}'")?;
        Ok(Stmt::Block { statements, line })
    }

    fn parse_var_declaration(&mut self) -> Result<Stmt, CompileError> {
        let line = self.current().position.line;
        let qualifier = match self.advance().text.as_str() {
            "var" => VarQualifier::Var,
            "let" => VarQualifier::Let,
            "const" => VarQualifier::Const,
            _ => unreachable!(),
        };
        let mut decls = Vec::new();
        loop {
            let name_tok = self.expect(TokenType::Identifier, "an identifier")?;
            let init = if self.is(TokenType::Assign) {
                self.advance();
                Some(self.parse_expr(3)?)
            } else {
                None
            };
            decls.push(VarDeclarator {
                name: name_tok.text,
                init,
            });
            if self.is(TokenType::Comma) {
                self.advance();
                continue;
            }
            break;
        }
        self.expect_terminator()?;
        Ok(Stmt::VarDeclaration {
            qualifier,
            decls,
            line,
        })
    }

    fn parse_if(&mut self) -> Result<Stmt, CompileError> {
        let line = self.current().position.line;
        self.advance();
        self.expect(TokenType::LParen, "'('")?;
        let cond = self.parse_expr(3)?;
        self.expect(TokenType::RParen, "')'")?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.is_keyword("else") {
            self.advance();
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_branch,
            else_branch,
            line,
        })
    }

    fn parse_while(&mut self, label: Option<String>) -> Result<Stmt, CompileError> {
        let line = self.current().position.line;
        self.advance();
        self.expect(TokenType::LParen, "'('")?;
        let cond = self.parse_expr(3)?;
        self.expect(TokenType::RParen, "')'")?;
        self.loop_depth += 1;
        let body = self.parse_statement();
        self.loop_depth -= 1;
        Ok(Stmt::While {
            cond,
            body: Box::new(body?),
            label,
            line,
        })
    }

    fn parse_do_while(&mut self, label: Option<String>) -> Result<Stmt, CompileError> {
        let line = self.current().position.line;
        self.advance();
        self.loop_depth += 1;
        let body = self.parse_statement();
        self.loop_depth -= 1;
        let body = body?;
        if !self.is_keyword("while") {
            return Err(self.error(format!("Expected 'while', found {}", self.current())));
        }
        self.advance();
        self.expect(TokenType::LParen, "'('")?;
        let cond = self.parse_expr(3)?;
        self.expect(TokenType::RParen, "')'")?;
        self.expect_terminator()?;
        Ok(Stmt::DoWhile {
            body: Box::new(body),
            cond,
            label,
            line,
        })
    }

    /// Peeks past a `var`/`let`/`const` declaration head, or a bare
    /// identifier list with no declaration keyword at all, to see if it is
    /// followed by the `of` keyword, without consuming anything. Returns
    /// the qualifier (`None` for the bare form), the declared names, and
    /// the index of the `of` token.
    fn peek_for_of_head(&self) -> Option<(Option<VarQualifier>, Vec<String>, usize)> {
        let mut idx = self.pos;
        let qualifier = match self.tokens.get(idx)? {
            t if t.kind == TokenType::Keyword && t.text == "var" => Some(VarQualifier::Var),
            t if t.kind == TokenType::Keyword && t.text == "let" => Some(VarQualifier::Let),
            t if t.kind == TokenType::Keyword && t.text == "const" => Some(VarQualifier::Const),
            t if t.kind == TokenType::Identifier => None,
            _ => return None,
        };
        if qualifier.is_some() {
            idx += 1;
        }
        let mut names = Vec::new();
        loop {
            let tok = self.tokens.get(idx)?;
            if tok.kind != TokenType::Identifier {
                return None;
            }
            names.push(tok.text.clone());
            idx += 1;
            if matches!(self.tokens.get(idx), Some(t) if t.kind == TokenType::Comma) {
                idx += 1;
                continue;
            }
            break;
        }
        let of_tok = self.tokens.get(idx)?;
        if of_tok.kind == TokenType::Keyword && of_tok.text == "of" {
            Some((qualifier, names, idx))
        } else {
            None
        }
    }

    fn parse_for(&mut self, label: Option<String>) -> Result<Stmt, CompileError> {
        let line = self.current().position.line;
        self.advance();
        self.expect(TokenType::LParen, "'('")?;

        if let Some((qualifier, names, of_idx)) = self.peek_for_of_head() {
            if qualifier == Some(VarQualifier::Var) {
                return Err(self.error("for-of loops require a 'let' or 'const' declaration"));
            }
            self.pos = of_idx + 1;
            let iterable = self.parse_expr(3)?;
            self.expect(TokenType::RParen, "')'")?;
            self.loop_depth += 1;
            let body = self.parse_statement();
            self.loop_depth -= 1;
            return Ok(Stmt::ForOf {
                qualifier,
                names,
                iterable,
                body: Box::new(body?),
                label,
                line,
            });
        }

        let init = if self.is(TokenType::Semicolon) {
            self.advance();
            None
        } else if self.is(TokenType::Keyword)
            && matches!(self.current().text.as_str(), "var" | "let" | "const")
        {
            Some(Box::new(self.parse_var_declaration()?))
        } else {
            Some(Box::new(self.parse_expression_statement()?))
        };

        let cond = if self.is(TokenType::Semicolon) {
            self.advance();
            Expr::Literal {
                value: ScriptValue::Boolean(true),
                token: self.current().clone(),
            }
        } else {
            let cond = self.parse_expr(3)?;
            self.expect(TokenType::Semicolon, "';'")?;
            cond
        };

        let incr = if self.is(TokenType::RParen) {
            None
        } else {
            Some(self.parse_expr(3)?)
        };
        self.expect(TokenType::RParen, "')'")?;

        self.loop_depth += 1;
        let body = self.parse_statement();
        self.loop_depth -= 1;
        Ok(Stmt::For {
            init,
            cond,
            incr,
            body: Box::new(body?),
            label,
            line,
        })
    }

    fn parse_break(&mut self) -> Result<Stmt, CompileError> {
        let line = self.current().position.line;
        self.advance();
        if self.loop_depth == 0 {
            return Err(self.error("'break' outside of a loop"));
        }
        let label = if self.is(TokenType::Identifier) {
            Some(self.advance().text)
        } else {
            None
        };
        self.expect_terminator()?;
        Ok(Stmt::Break { label, line })
    }

    fn parse_continue(&mut self) -> Result<Stmt, CompileError> {
        let line = self.current().position.line;
        self.advance();
        if self.loop_depth == 0 {
            return Err(self.error("'continue' outside of a loop"));
        }
        let label = if self.is(TokenType::Identifier) {
            Some(self.advance().text)
        } else {
            None
        };
        self.expect_terminator()?;
        Ok(Stmt::Continue { label, line })
    }

    fn parse_return(&mut self) -> Result<Stmt, CompileError> {
        let line = self.current().position.line;
        self.advance();
        let expr = if self.is(TokenType::Semicolon) || self.check_eof() {
            None
        } else {
            Some(self.parse_expr(3)?)
        };
        self.expect_terminator()?;
        Ok(Stmt::Return { expr, line })
    }

    fn parse_ident_list(&mut self) -> Result<Vec<String>, CompileError> {
        let mut names = Vec::new();
        if self.is(TokenType::RParen) {
            return Ok(names);
        }
        loop {
            names.push(self.expect(TokenType::Identifier, "an identifier")?.text);
            if self.is(TokenType::Comma) {
                self.advance();
                continue;
            }
            break;
        }
        Ok(names)
    }

    fn parse_function_body(&mut self) -> Result<Vec<Stmt>, CompileError> {
        self.expect(TokenType::LBrace, "'{'")?;
        let mut statements = Vec::new();
        while !self.is(TokenType::RBrace) && !self.check_eof() {
            statements.push(self.parse_statement()?);
        }
        self.expect(TokenType::RBrace, "'}'")?;
        Ok(statements)
    }

    fn parse_function_declaration(&mut self) -> Result<Stmt, CompileError> {
        let line = self.current().position.line;
        self.advance();
        let name = self.expect(TokenType::Identifier, "a function name")?.text;
        self.expect(TokenType::LParen, "'('")?;
        let arg_names = self.parse_ident_list()?;
        self.expect(TokenType::RParen, "')'")?;
        let body = self.parse_function_body()?;
        Ok(Stmt::FunctionDeclaration {
            name,
            arg_names,
            body,
            line,
        })
    }

    fn parse_throw(&mut self) -> Result<Stmt, CompileError> {
        let line = self.current().position.line;
        self.advance();
        let expr = self.parse_expr(3)?;
        self.expect_terminator()?;
        Ok(Stmt::Throw { expr, line })
    }

    fn parse_try_catch(&mut self) -> Result<Stmt, CompileError> {
        let line = self.current().position.line;
        self.advance();
        let try_block = Box::new(self.parse_block()?);
        if !self.is_keyword("catch") {
            return Err(self.error(format!("Expected 'catch', found {}", self.current())));
        }
        self.advance();
        self.expect(TokenType::LParen, "'('")?;
        let exception_name = self.expect(TokenType::Identifier, "an identifier")?.text;
        self.expect(TokenType::RParen, "')'")?;
        let catch_block = Box::new(self.parse_block()?);
        Ok(Stmt::TryCatch {
            try_block,
            exception_name,
            catch_block,
            line,
        })
    }

    fn parse_delete(&mut self) -> Result<Stmt, CompileError> {
        let line = self.current().position.line;
        self.advance();
        let access = self.parse_expr(3)?;
        self.expect_terminator()?;
        Ok(Stmt::Delete { access, line })
    }

    fn parse_expression_statement(&mut self) -> Result<Stmt, CompileError> {
        let line = self.current().position.line;
        let expr = self.parse_expr(3)?;
        self.expect_terminator()?;
        Ok(Stmt::ExpressionStatement {
            expr: Some(expr),
            line,
        })
    }

    // ---- expressions ----

    /// Binding power and associativity (`true` = right-associative) of a
    /// binary operator token, or `None` if the token is not a binary
    /// operator.
    fn binop_binding(kind: TokenType) -> Option<(u8, bool)> {
        use TokenType::*;
        match kind {
            Assign | PlusAssign | DashAssign => Some((3, true)),
            Or => Some((6, false)),
            And => Some((7, false)),
            BitOr => Some((8, false)),
            BitXor => Some((9, false)),
            BitAnd => Some((10, false)),
            Equals | NEquals | StrictEquals | StrictNEquals => Some((11, false)),
            Lt | Le | Gt | Ge => Some((12, false)),
            BitLShift | BitRShift | BitURShift => Some((13, false)),
            Plus | Dash => Some((14, false)),
            Star | FSlash | Percent => Some((15, false)),
            Pow => Some((16, true)),
            _ => None,
        }
    }

    fn is_unary_op(kind: TokenType) -> bool {
        matches!(
            kind,
            TokenType::Not | TokenType::BitNot | TokenType::Plus | TokenType::Dash
        )
    }

    /// Precedence-climbing expression parser. `min_prec` is the lowest
    /// binding power a binary operator must have to be consumed at this
    /// call depth; a right-associative operator recurses at its own
    /// binding power, a left-associative one at one more than it.
    fn parse_expr(&mut self, min_prec: u8) -> Result<Expr, CompileError> {
        let mut left = self.parse_unary(min_prec)?;
        loop {
            let kind = self.current().kind;
            let (prec, right_assoc) = match Self::binop_binding(kind) {
                Some(p) => p,
                None => break,
            };
            if prec < min_prec {
                break;
            }
            let op = self.advance();
            let next_min = if right_assoc { prec } else { prec + 1 };
            let right = self.parse_expr(next_min)?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    /// A prefix unary operator binds to the postfix chain of its operand,
    /// not to the whole expression: `!obj.prop` parses as `!(obj.prop)`.
    /// This falls out naturally here because the operand is parsed by
    /// recursing into `parse_unary`, which bottoms out at
    /// `parse_postfix(parse_primary())` before any wrapping happens.
    fn parse_unary(&mut self, min_prec: u8) -> Result<Expr, CompileError> {
        let kind = self.current().kind;
        let is_typeof = self.is(TokenType::Keyword) && self.current().text == "typeof";
        if (Self::is_unary_op(kind) || is_typeof) && UNARY_PREC >= min_prec {
            let op = self.advance();
            let operand = self.parse_unary(UNARY_PREC)?;
            return Ok(Expr::UnaryOp {
                op,
                operand: Box::new(operand),
            });
        }
        let primary = self.parse_primary()?;
        self.parse_postfix(primary)
    }

    fn parse_postfix(&mut self, mut expr: Expr) -> Result<Expr, CompileError> {
        loop {
            if self.is(TokenType::Dot) {
                self.advance();
                let member = self.expect(TokenType::Identifier, "a member name")?.text;
                expr = Expr::MemberAccess {
                    object: Box::new(expr),
                    member,
                };
            } else if self.is(TokenType::LBracket) {
                self.advance();
                let index = self.parse_expr(3)?;
                self.expect(TokenType::RBracket, "']'")?;
                expr = Expr::ArrayIndex {
                    object: Box::new(expr),
                    index: Box::new(index),
                };
            } else if self.is(TokenType::LParen) {
                self.advance();
                let args = self.parse_arg_list()?;
                self.expect(TokenType::RParen, "')'")?;
                expr = Expr::FunctionCall {
                    callee: Box::new(expr),
                    args,
                    return_this: false,
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_arg_list(&mut self) -> Result<Vec<Expr>, CompileError> {
        let mut args = Vec::new();
        if self.is(TokenType::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr(3)?);
            if self.is(TokenType::Comma) {
                self.advance();
                continue;
            }
            break;
        }
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, CompileError> {
        let tok = self.current().clone();
        match tok.kind {
            TokenType::LParen => {
                self.advance();
                let inner = self.parse_expr(3)?;
                self.expect(TokenType::RParen, "')'")?;
                Ok(inner)
            }
            TokenType::LBrace => self.parse_object_literal(),
            TokenType::LBracket => self.parse_array_literal(),
            TokenType::Integer => {
                self.advance();
                let n: i64 = tok
                    .text
                    .parse()
                    .map_err(|_| CompileError::new("Integer literal out of range", tok.clone()))?;
                Ok(Expr::Literal {
                    value: ScriptValue::Integer(n),
                    token: tok,
                })
            }
            TokenType::Double => {
                self.advance();
                let n: f64 = tok
                    .text
                    .parse()
                    .map_err(|_| CompileError::new("Malformed double literal", tok.clone()))?;
                Ok(Expr::Literal {
                    value: ScriptValue::Double(n),
                    token: tok,
                })
            }
            TokenType::String => {
                self.advance();
                Ok(Expr::Literal {
                    value: ScriptValue::string(tok.text.clone()),
                    token: tok,
                })
            }
            TokenType::Identifier => {
                self.advance();
                Ok(Expr::VarAccess { name: tok })
            }
            TokenType::Keyword => match tok.text.as_str() {
                "true" => {
                    self.advance();
                    Ok(Expr::Literal {
                        value: ScriptValue::Boolean(true),
                        token: tok,
                    })
                }
                "false" => {
                    self.advance();
                    Ok(Expr::Literal {
                        value: ScriptValue::Boolean(false),
                        token: tok,
                    })
                }
                "null" => {
                    self.advance();
                    Ok(Expr::Literal {
                        value: ScriptValue::Null,
                        token: tok,
                    })
                }
                "undefined" => {
                    self.advance();
                    Ok(Expr::Literal {
                        value: ScriptValue::Undefined,
                        token: tok,
                    })
                }
                "function" => self.parse_function_expr(),
                "new" => self.parse_new_expr(),
                _ => Err(self.error(format!("Unexpected keyword '{}'", tok.text))),
            },
            _ => Err(self.error(format!("Unexpected token {}", tok))),
        }
    }

    fn parse_function_expr(&mut self) -> Result<Expr, CompileError> {
        self.advance();
        self.expect(TokenType::LParen, "'('")?;
        let arg_names = self.parse_ident_list()?;
        self.expect(TokenType::RParen, "')'")?;
        let body = self.parse_function_body()?;
        Ok(Expr::FunctionExpr { arg_names, body })
    }

    fn parse_new_expr(&mut self) -> Result<Expr, CompileError> {
        let new_tok = self.advance();
        let primary = self.parse_primary()?;
        let call = self.parse_postfix(primary)?;
        match call {
            Expr::FunctionCall { callee, args, .. } => Ok(Expr::NewExpression {
                call: Box::new(Expr::FunctionCall {
                    callee,
                    args,
                    return_this: true,
                }),
            }),
            _ => Err(CompileError::new(
                "'new' requires a function-call expression",
                new_tok,
            )),
        }
    }

    fn parse_array_literal(&mut self) -> Result<Expr, CompileError> {
        self.advance();
        let mut elements = Vec::new();
        if self.is(TokenType::RBracket) {
            self.advance();
            return Ok(Expr::ArrayLiteral { elements });
        }
        loop {
            elements.push(self.parse_expr(3)?);
            if self.is(TokenType::Comma) {
                self.advance();
                if self.is(TokenType::RBracket) {
                    break;
                }
                continue;
            }
            break;
        }
        self.expect(TokenType::RBracket, "']'")?;
        Ok(Expr::ArrayLiteral { elements })
    }

    fn parse_object_literal(&mut self) -> Result<Expr, CompileError> {
        self.advance();
        let mut keys = Vec::new();
        let mut values = Vec::new();
        if self.is(TokenType::RBrace) {
            self.advance();
            return Ok(Expr::ObjectLiteral { keys, values });
        }
        loop {
            let key = if self.is(TokenType::Label) {
                // The lexer already consumed the trailing ':' for us.
                self.advance().text
            } else if self.is(TokenType::Identifier) || self.is(TokenType::String) {
                let text = self.advance().text;
                self.expect(TokenType::Colon, "':'")?;
                text
            } else {
                return Err(self.error(format!(
                    "Expected an object key, found {}",
                    self.current()
                )));
            };
            let value = self.parse_expr(3)?;
            keys.push(key);
            values.push(value);
            if self.is(TokenType::Comma) {
                self.advance();
                if self.is(TokenType::RBrace) {
                    break;
                }
                continue;
            }
            break;
        }
        self.expect(TokenType::RBrace, "'}'")?;
        Ok(Expr::ObjectLiteral { keys, values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(src: &str) -> Result<Stmt, CompileError> {
        let tokens = Lexer::tokenize(src).unwrap();
        Parser::parse(tokens)
    }

    fn first_expr(block: &Stmt) -> &Expr {
        match block {
            Stmt::Block { statements, .. } => match &statements[0] {
                Stmt::ExpressionStatement { expr: Some(e), .. } => e,
                other => panic!("expected expression statement, got {other:?}"),
            },
            other => panic!("expected block, got {other:?}"),
        }
    }

    #[test]
    fn precedence_multiplication_binds_tighter_than_addition() {
        let block = parse("2 + 3 * 4;").unwrap();
        match first_expr(&block) {
            Expr::BinaryOp { op, left, right } => {
                assert_eq!(op.kind, TokenType::Plus);
                assert!(matches!(**left, Expr::Literal { value: ScriptValue::Integer(2), .. }));
                assert!(matches!(**right, Expr::BinaryOp { .. }));
            }
            other => panic!("expected BinaryOp, got {other:?}"),
        }
    }

    #[test]
    fn pow_is_right_associative() {
        let block = parse("2 ** 3 ** 2;").unwrap();
        match first_expr(&block) {
            Expr::BinaryOp { left, right, .. } => {
                assert!(matches!(**left, Expr::Literal { value: ScriptValue::Integer(2), .. }));
                assert!(matches!(**right, Expr::BinaryOp { .. }));
            }
            other => panic!("expected BinaryOp, got {other:?}"),
        }
    }

    #[test]
    fn assignment_is_right_associative_and_low_precedence() {
        let block = parse("a = b = 1 + 2;").unwrap();
        match first_expr(&block) {
            Expr::BinaryOp { op, right, .. } => {
                assert_eq!(op.kind, TokenType::Assign);
                assert!(matches!(**right, Expr::BinaryOp { .. }));
            }
            other => panic!("expected BinaryOp, got {other:?}"),
        }
    }

    #[test]
    fn unary_binds_to_postfix_chain_not_whole_expression() {
        let block = parse("!obj.prop;").unwrap();
        match first_expr(&block) {
            Expr::UnaryOp { op, operand } => {
                assert_eq!(op.kind, TokenType::Not);
                assert!(matches!(**operand, Expr::MemberAccess { .. }));
            }
            other => panic!("expected UnaryOp, got {other:?}"),
        }
    }

    #[test]
    fn object_literal_accepts_identifier_string_and_label_keys() {
        let block = parse("({a: 1, \"b\": 2, c: 3});").unwrap();
        match first_expr(&block) {
            Expr::ObjectLiteral { keys, .. } => {
                assert_eq!(keys, &vec!["a".to_string(), "b".to_string(), "c".to_string()]);
            }
            other => panic!("expected ObjectLiteral, got {other:?}"),
        }
    }

    #[test]
    fn new_requires_a_function_call_operand() {
        assert!(parse("new Foo;").is_err());
        let block = parse("new Foo();").unwrap();
        match first_expr(&block) {
            Expr::NewExpression { call } => match &**call {
                Expr::FunctionCall { return_this, .. } => assert!(*return_this),
                other => panic!("expected FunctionCall, got {other:?}"),
            },
            other => panic!("expected NewExpression, got {other:?}"),
        }
    }

    #[test]
    fn classical_for_parses_all_three_clauses() {
        let block = parse("for (var i = 0; i < 10; i = i + 1) { i; }").unwrap();
        match block {
            Stmt::Block { statements, .. } => match &statements[0] {
                Stmt::For { init, incr, .. } => {
                    assert!(init.is_some());
                    assert!(incr.is_some());
                }
                other => panic!("expected For, got {other:?}"),
            },
            _ => unreachable!(),
        }
    }

    #[test]
    fn empty_for_clauses_default_correctly() {
        let block = parse("for (;;) { break; }").unwrap();
        match block {
            Stmt::Block { statements, .. } => match &statements[0] {
                Stmt::For { init, cond, incr, .. } => {
                    assert!(init.is_none());
                    assert!(incr.is_none());
                    assert!(matches!(cond, Expr::Literal { value: ScriptValue::Boolean(true), .. }));
                }
                other => panic!("expected For, got {other:?}"),
            },
            _ => unreachable!(),
        }
    }

    #[test]
    fn for_of_form_is_detected_with_single_name() {
        let block = parse("for (const k of obj) { k; }").unwrap();
        match block {
            Stmt::Block { statements, .. } => match &statements[0] {
                Stmt::ForOf { qualifier, names, .. } => {
                    assert_eq!(*qualifier, Some(VarQualifier::Const));
                    assert_eq!(names, &vec!["k".to_string()]);
                }
                other => panic!("expected ForOf, got {other:?}"),
            },
            _ => unreachable!(),
        }
    }

    #[test]
    fn for_of_form_accepts_two_names() {
        let block = parse("for (const k, v of obj) { k; }").unwrap();
        match block {
            Stmt::Block { statements, .. } => match &statements[0] {
                Stmt::ForOf { names, .. } => {
                    assert_eq!(names, &vec!["k".to_string(), "v".to_string()]);
                }
                other => panic!("expected ForOf, got {other:?}"),
            },
            _ => unreachable!(),
        }
    }

    #[test]
    fn for_of_rejects_var_qualifier() {
        assert!(parse("for (var k of obj) { k; }").is_err());
    }

    #[test]
    fn for_of_form_accepts_bare_identifier_with_no_qualifier() {
        let block = parse("for (key of obj) { key; }").unwrap();
        match block {
            Stmt::Block { statements, .. } => match &statements[0] {
                Stmt::ForOf { qualifier, names, .. } => {
                    assert_eq!(*qualifier, None);
                    assert_eq!(names, &vec!["key".to_string()]);
                }
                other => panic!("expected ForOf, got {other:?}"),
            },
            _ => unreachable!(),
        }
    }

    #[test]
    fn bare_identifier_for_of_is_distinguished_from_classical_for_init() {
        let block = parse("for (i = 0; i < 3; i += 1) { i; }").unwrap();
        match block {
            Stmt::Block { statements, .. } => match &statements[0] {
                Stmt::For { .. } => {}
                other => panic!("expected classical For, got {other:?}"),
            },
            _ => unreachable!(),
        }
    }

    #[test]
    fn break_outside_loop_is_compile_error() {
        assert!(parse("break;").is_err());
        assert!(parse("while (true) { break; }").is_ok());
    }

    #[test]
    fn labeled_loop_parses_and_break_can_carry_a_label() {
        let block = parse("outer: while (true) { break outer; }").unwrap();
        match block {
            Stmt::Block { statements, .. } => match &statements[0] {
                Stmt::While { label, body, .. } => {
                    assert_eq!(label.as_deref(), Some("outer"));
                    match &**body {
                        Stmt::Block { statements, .. } => match &statements[0] {
                            Stmt::Break { label, .. } => assert_eq!(label.as_deref(), Some("outer")),
                            other => panic!("expected Break, got {other:?}"),
                        },
                        _ => unreachable!(),
                    }
                }
                other => panic!("expected While, got {other:?}"),
            },
            _ => unreachable!(),
        }
    }

    #[test]
    fn label_on_non_loop_statement_is_compile_error() {
        assert!(parse("foo: var x = 1;").is_err());
    }

    #[test]
    fn anonymous_function_expression_parses() {
        let block = parse("var f = function(a, b) { return a + b; };").unwrap();
        match block {
            Stmt::Block { statements, .. } => match &statements[0] {
                Stmt::VarDeclaration { decls, .. } => match decls[0].init.as_ref().unwrap() {
                    Expr::FunctionExpr { arg_names, .. } => {
                        assert_eq!(arg_names, &vec!["a".to_string(), "b".to_string()]);
                    }
                    other => panic!("expected FunctionExpr, got {other:?}"),
                },
                other => panic!("expected VarDeclaration, got {other:?}"),
            },
            _ => unreachable!(),
        }
    }

    #[test]
    fn var_declaration_requires_plain_identifier_names() {
        assert!(parse("var 1 = 2;").is_err());
    }

    #[test]
    fn try_catch_requires_block_bodies() {
        let block = parse("try { throw 1; } catch (e) { e; }").unwrap();
        assert!(matches!(block, Stmt::Block { .. }));
    }
}
