use switchyard_core::Diagnostic;

use crate::token::{Span, Token, TokenKind};

/// Tokenizer for route class sources.
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            diagnostics: Vec::new(),
        }
    }

    /// Tokenizes the whole input. The token list always ends with `Eof`.
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        (tokens, self.diagnostics)
    }

    fn pos(&mut self) -> usize {
        self.chars.peek().map_or(self.source.len(), |(i, _)| *i)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next().map(|(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        self.chars.next().map(|(_, c)| c)
    }

    fn error(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::at(self.source, span, message));
    }

    fn skip_trivia(&mut self) {
        loop {
            match (self.peek(), self.peek_second()) {
                (Some(c), _) if c.is_whitespace() => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                (Some('/'), Some('*')) => {
                    let start = self.pos();
                    self.bump();
                    self.bump();
                    let mut closed = false;
                    while let Some(c) = self.bump() {
                        if c == '*' && self.peek() == Some('/') {
                            self.bump();
                            closed = true;
                            break;
                        }
                    }
                    if !closed {
                        let end = self.pos();
                        self.error(start..end, "unterminated comment");
                    }
                }
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> Token {
        self.skip_trivia();
        let start = self.pos();

        let Some(ch) = self.bump() else {
            return Token::new(TokenKind::Eof, start..start);
        };

        let kind = match ch {
            '"' => self.read_string(start),
            '\'' => self.read_char(start),
            '0'..='9' => self.read_number(ch, start),
            c if c.is_alphabetic() || c == '_' || c == '$' => self.read_word(start),
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ';' => TokenKind::Semi,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '@' => TokenKind::At,
            '+' => TokenKind::Plus,
            '=' => TokenKind::Eq,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            '*' => TokenKind::Star,
            other => {
                let end = self.pos();
                self.error(start..end, format!("illegal character '{}'", other));
                return self.next_token();
            }
        };

        let end = self.pos();
        Token::new(kind, start..end)
    }

    fn read_word(&mut self, start: usize) -> TokenKind {
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                self.bump();
            } else {
                break;
            }
        }
        let end = self.pos();
        let word = &self.source[start..end];
        TokenKind::keyword(word).unwrap_or_else(|| TokenKind::Ident(word.to_string()))
    }

    fn read_number(&mut self, first: char, start: usize) -> TokenKind {
        let mut digits = String::from(first);
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '_' {
                if c != '_' {
                    digits.push(c);
                }
                self.bump();
            } else {
                break;
            }
        }

        if self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
            let end = self.pos();
            self.error(start..end, "floating point literals are not supported");
            return TokenKind::Int(0);
        }

        if matches!(self.peek(), Some('l') | Some('L')) {
            self.bump();
        }

        match digits.parse::<i64>() {
            Ok(value) => TokenKind::Int(value),
            Err(_) => {
                let end = self.pos();
                self.error(start..end, "integer number too large");
                TokenKind::Int(0)
            }
        }
    }

    fn read_escape(&mut self, start: usize) -> Option<char> {
        let escaped = match self.bump() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('b') => '\u{0008}',
            Some('f') => '\u{000C}',
            Some('0') => '\0',
            Some('\\') => '\\',
            Some('\'') => '\'',
            Some('"') => '"',
            Some('u') => {
                let mut hex = String::new();
                for _ in 0..4 {
                    match self.peek() {
                        Some(c) if c.is_ascii_hexdigit() => {
                            hex.push(c);
                            self.bump();
                        }
                        _ => break,
                    }
                }
                match u32::from_str_radix(&hex, 16).ok().filter(|_| hex.len() == 4).and_then(char::from_u32) {
                    Some(c) => c,
                    None => {
                        let end = self.pos();
                        self.error(start..end, "illegal unicode escape");
                        return None;
                    }
                }
            }
            _ => {
                let end = self.pos();
                self.error(start..end, "illegal escape character");
                return None;
            }
        };
        Some(escaped)
    }

    fn read_string(&mut self, start: usize) -> TokenKind {
        let mut value = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    let end = self.pos();
                    self.error(start..end, "unclosed string literal");
                    break;
                }
                Some('"') => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    let escape_start = self.pos();
                    self.bump();
                    if let Some(c) = self.read_escape(escape_start) {
                        value.push(c);
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.bump();
                }
            }
        }
        TokenKind::Str(value)
    }

    fn read_char(&mut self, start: usize) -> TokenKind {
        let value = match self.bump() {
            Some('\\') => self.read_escape(start).unwrap_or('\0'),
            Some('\'') | Some('\n') | None => {
                let end = self.pos();
                self.error(start..end, "empty character literal");
                return TokenKind::Char('\0');
            }
            Some(c) => c,
        };
        if self.peek() == Some('\'') {
            self.bump();
        } else {
            let end = self.pos();
            self.error(start..end, "unclosed character literal");
        }
        TokenKind::Char(value)
    }
}
