// ABOUTME: Position-tracked tokenizer turning source text into a flat token stream

use crate::error::CompileError;
use crate::token::{is_keyword, Position, Token, TokenType};

pub struct Lexer {
    chars: Vec<char>,
    index: usize,
    pos: Position,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            chars: source.chars().collect(),
            index: 0,
            pos: Position::start(),
        }
    }

    /// Scans the entire source into a token stream terminated by `Eof`.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, CompileError> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token()?;
            let is_eof = token.kind == TokenType::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.index + offset).copied()
    }

    /// Advances past the current character, updating position bookkeeping.
    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos.advance(c);
        self.index += 1;
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn next_token(&mut self) -> Result<Token, CompileError> {
        self.skip_whitespace();
        let start = self.pos;
        let c = match self.peek() {
            None => return Ok(Token::new(TokenType::Eof, start)),
            Some(c) => c,
        };

        if is_ident_start(c) {
            return self.lex_identifier_or_keyword(start);
        }
        if c.is_ascii_digit() {
            return self.lex_number(start);
        }
        if c == '\'' || c == '"' {
            return self.lex_string(start);
        }

        self.lex_punctuation(start)
    }

    fn lex_identifier_or_keyword(&mut self, start: Position) -> Result<Token, CompileError> {
        let mut text = String::new();
        while matches!(self.peek(), Some(c) if is_ident_continue(c)) {
            text.push(self.bump().unwrap());
        }

        if is_keyword(&text) {
            return Ok(Token::with_text(TokenType::Keyword, start, text));
        }

        if self.peek() == Some(':') {
            self.bump();
            return Ok(Token::with_text(TokenType::Label, start, text));
        }

        Ok(Token::with_text(TokenType::Identifier, start, text))
    }

    fn lex_number(&mut self, start: Position) -> Result<Token, CompileError> {
        let mut text = String::new();
        let mut seen_dot = false;
        let mut seen_exp = false;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(self.bump().unwrap());
            } else if c == '.' {
                if seen_dot {
                    return Err(CompileError::new(
                        "Too many decimals",
                        Token::with_text(TokenType::Invalid, start, text),
                    ));
                }
                seen_dot = true;
                text.push(self.bump().unwrap());
            } else if (c == 'e' || c == 'E') && !seen_exp {
                seen_exp = true;
                text.push(self.bump().unwrap());
                if matches!(self.peek(), Some('+') | Some('-')) {
                    text.push(self.bump().unwrap());
                }
                if !matches!(self.peek(), Some(d) if d.is_ascii_digit()) {
                    return Err(CompileError::new(
                        "Exponent specifier must be followed by number",
                        Token::with_text(TokenType::Invalid, start, text),
                    ));
                }
            } else if c == 'e' || c == 'E' {
                return Err(CompileError::new(
                    "Too many exponent specifiers",
                    Token::with_text(TokenType::Invalid, start, text),
                ));
            } else {
                break;
            }
        }

        let kind = if seen_dot || seen_exp {
            TokenType::Double
        } else {
            TokenType::Integer
        };
        Ok(Token::with_text(kind, start, text))
    }

    fn lex_string(&mut self, start: Position) -> Result<Token, CompileError> {
        let quote = self.bump().unwrap();
        let mut text = String::new();

        loop {
            match self.peek() {
                None => {
                    return Err(CompileError::new(
                        "Unterminated string literal",
                        Token::with_text(TokenType::Invalid, start, text),
                    ))
                }
                Some('\n') => {
                    return Err(CompileError::new(
                        "Unterminated string literal",
                        Token::with_text(TokenType::Invalid, start, text),
                    ))
                }
                Some(c) if c == quote => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    self.bump();
                    let escaped = self.bump().ok_or_else(|| {
                        CompileError::new(
                            "Unterminated string literal",
                            Token::with_text(TokenType::Invalid, start, text.clone()),
                        )
                    })?;
                    let resolved = match escaped {
                        'b' => '\u{8}',
                        'f' => '\u{c}',
                        'n' => '\n',
                        'r' => '\r',
                        't' => '\t',
                        'v' => '\u{b}',
                        '0' => '\0',
                        '\'' => '\'',
                        '"' => '"',
                        '\\' => '\\',
                        other => {
                            return Err(CompileError::new(
                                format!("Unknown escape sequence '\\{other}'"),
                                Token::with_text(TokenType::Invalid, start, text),
                            ))
                        }
                    };
                    text.push(resolved);
                }
                Some(c) => {
                    text.push(c);
                    self.bump();
                }
            }
        }

        Ok(Token::with_text(TokenType::String, start, text))
    }

    fn lex_punctuation(&mut self, start: Position) -> Result<Token, CompileError> {
        let c = self.bump().unwrap();
        let kind = match c {
            '>' => {
                if self.peek() == Some('>') && self.peek_at(1) == Some('>') {
                    self.bump();
                    self.bump();
                    TokenType::BitURShift
                } else if self.peek() == Some('>') {
                    self.bump();
                    TokenType::BitRShift
                } else if self.peek() == Some('=') {
                    self.bump();
                    TokenType::Ge
                } else {
                    TokenType::Gt
                }
            }
            '<' => {
                if self.peek() == Some('<') {
                    self.bump();
                    TokenType::BitLShift
                } else if self.peek() == Some('=') {
                    self.bump();
                    TokenType::Le
                } else {
                    TokenType::Lt
                }
            }
            '=' => {
                if self.peek() == Some('=') && self.peek_at(1) == Some('=') {
                    self.bump();
                    self.bump();
                    TokenType::StrictEquals
                } else if self.peek() == Some('=') {
                    self.bump();
                    TokenType::Equals
                } else {
                    TokenType::Assign
                }
            }
            '!' => {
                if self.peek() == Some('=') && self.peek_at(1) == Some('=') {
                    self.bump();
                    self.bump();
                    TokenType::StrictNEquals
                } else if self.peek() == Some('=') {
                    self.bump();
                    TokenType::NEquals
                } else {
                    TokenType::Not
                }
            }
            '&' => {
                if self.peek() == Some('&') {
                    self.bump();
                    TokenType::And
                } else {
                    TokenType::BitAnd
                }
            }
            '|' => {
                if self.peek() == Some('|') {
                    self.bump();
                    TokenType::Or
                } else {
                    TokenType::BitOr
                }
            }
            '+' => {
                if self.peek() == Some('+') {
                    self.bump();
                    TokenType::Inc
                } else if self.peek() == Some('=') {
                    self.bump();
                    TokenType::PlusAssign
                } else {
                    TokenType::Plus
                }
            }
            '-' => {
                if self.peek() == Some('-') {
                    self.bump();
                    TokenType::Dec
                } else if self.peek() == Some('=') {
                    self.bump();
                    TokenType::DashAssign
                } else {
                    TokenType::Dash
                }
            }
            '*' => {
                if self.peek() == Some('*') {
                    self.bump();
                    TokenType::Pow
                } else {
                    TokenType::Star
                }
            }
            '/' => {
                if self.peek() == Some('/') {
                    while !matches!(self.peek(), None | Some('\n')) {
                        self.bump();
                    }
                    return self.next_token();
                } else if self.peek() == Some('*') {
                    self.bump();
                    loop {
                        match self.peek() {
                            None => {
                                return Err(CompileError::new(
                                    "Unterminated block comment",
                                    Token::new(TokenType::Invalid, start),
                                ))
                            }
                            Some('*') if self.peek_at(1) == Some('/') => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            Some(_) => {
                                self.bump();
                            }
                        }
                    }
                    return self.next_token();
                } else {
                    TokenType::FSlash
                }
            }
            '%' => TokenType::Percent,
            '.' => TokenType::Dot,
            '^' => TokenType::BitXor,
            '~' => TokenType::BitNot,
            '(' => TokenType::LParen,
            ')' => TokenType::RParen,
            '{' => TokenType::LBrace,
            '}' => TokenType::RBrace,
            '[' => TokenType::LBracket,
            ']' => TokenType::RBracket,
            ';' => TokenType::Semicolon,
            ',' => TokenType::Comma,
            ':' => TokenType::Colon,
            other => {
                return Err(CompileError::new(
                    format!("Unexpected character '{other}'"),
                    Token::with_text(TokenType::Invalid, start, other.to_string()),
                ))
            }
        };
        Ok(Token::new(kind, start))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}
