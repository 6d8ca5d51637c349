//! Lexer for constant initializer expressions

use super::EvaluationError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Integer(i64),
    Float(f64),
    /// A quoted string with escapes already applied
    String(String),
    /// A name, possibly namespaced (`Foo\Bar`, `\PHP_EOL`, `self`)
    Name(String),
    LeftBracket,
    RightBracket,
    LeftParen,
    RightParen,
    Comma,
    /// =>
    DoubleArrow,
    /// ::
    DoubleColon,
    Question,
    Colon,
    /// ??
    Coalesce,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    /// **
    Pow,
    Dot,
    /// ...
    Ellipsis,
    Bang,
    Tilde,
    Ampersand,
    Pipe,
    Caret,
    ShiftLeft,
    ShiftRight,
    /// &&
    And,
    /// ||
    Or,
    Equal,
    NotEqual,
    Identical,
    NotIdentical,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset in the expression
    pub offset: usize,
}

pub struct Lexer<'a> {
    input: &'a str,
    chars: Vec<(usize, char)>,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().collect(),
            position: 0,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, EvaluationError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let offset = self.offset();
            let Some(ch) = self.peek() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    offset,
                });
                return Ok(tokens);
            };

            let kind = match ch {
                '0'..='9' => self.read_number()?,
                '.' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => self.read_number()?,
                '\'' => {
                    self.advance();
                    TokenKind::String(self.read_single_quoted()?)
                }
                '"' => {
                    self.advance();
                    TokenKind::String(self.read_double_quoted()?)
                }
                '<' if self.input[offset..].starts_with("<<<") => {
                    return Err(EvaluationError::Unsupported(
                        "heredoc strings".to_string(),
                    ));
                }
                c if c == '\\' || c == '_' || c.is_alphabetic() => self.read_name(),
                _ => self.read_operator()?,
            };
            tokens.push(Token { kind, offset });
        }
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.position)
            .map(|(i, _)| *i)
            .unwrap_or(self.input.len())
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.position + n).map(|(_, c)| *c)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.position += 1;
        }
        ch
    }

    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else if ch == '/' && self.peek_at(1) == Some('*') {
                self.advance();
                self.advance();
                while let Some(c) = self.advance() {
                    if c == '*' && self.peek() == Some('/') {
                        self.advance();
                        break;
                    }
                }
            } else if (ch == '/' && self.peek_at(1) == Some('/')) || ch == '#' {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn read_name(&mut self) -> TokenKind {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if ch == '\\' || ch == '_' || ch.is_alphanumeric() {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        TokenKind::Name(name)
    }

    fn read_number(&mut self) -> Result<TokenKind, EvaluationError> {
        let start = self.offset();
        let mut text = String::new();

        let radix = match (self.peek(), self.peek_at(1)) {
            (Some('0'), Some('x' | 'X')) => Some(16),
            (Some('0'), Some('b' | 'B')) => Some(2),
            (Some('0'), Some('o' | 'O')) => Some(8),
            _ => None,
        };

        if let Some(radix) = radix {
            self.advance();
            self.advance();
            while let Some(ch) = self.peek() {
                if ch == '_' {
                    self.advance();
                } else if ch.is_digit(radix) {
                    text.push(ch);
                    self.advance();
                } else {
                    break;
                }
            }
            return parse_integer(&text, radix, start);
        }

        let mut is_float = false;
        while let Some(ch) = self.peek() {
            match ch {
                '0'..='9' => text.push(ch),
                '_' => {}
                '.' if !is_float && self.peek_at(1).map_or(true, |c| c.is_ascii_digit()) => {
                    is_float = true;
                    text.push(ch);
                }
                'e' | 'E' => {
                    let next = self.peek_at(1);
                    let next2 = self.peek_at(2);
                    let has_exponent = next.is_some_and(|c| c.is_ascii_digit())
                        || (matches!(next, Some('+' | '-'))
                            && next2.is_some_and(|c| c.is_ascii_digit()));
                    if !has_exponent {
                        break;
                    }
                    is_float = true;
                    text.push('e');
                    self.advance();
                    if let Some(sign @ ('+' | '-')) = self.peek() {
                        text.push(sign);
                        self.advance();
                    }
                    continue;
                }
                _ => break,
            }
            self.advance();
        }

        if is_float {
            return text
                .parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|_| EvaluationError::Syntax {
                    offset: start,
                    message: format!("invalid number '{}'", text),
                });
        }

        // Legacy octal literal: 0755
        if text.len() > 1 && text.starts_with('0') {
            return parse_integer(&text[1..], 8, start);
        }
        parse_integer(&text, 10, start)
    }

    fn read_single_quoted(&mut self) -> Result<String, EvaluationError> {
        let start = self.offset();
        let mut result = String::new();
        loop {
            match self.advance() {
                Some('\'') => return Ok(result),
                Some('\\') => match self.peek() {
                    Some(c @ ('\'' | '\\')) => {
                        result.push(c);
                        self.advance();
                    }
                    _ => result.push('\\'),
                },
                Some(c) => result.push(c),
                None => return Err(unterminated(start)),
            }
        }
    }

    fn read_double_quoted(&mut self) -> Result<String, EvaluationError> {
        let start = self.offset();
        let mut result = String::new();
        loop {
            match self.advance() {
                Some('"') => return Ok(result),
                Some('$') => {
                    if self
                        .peek()
                        .is_some_and(|c| c == '{' || c == '_' || c.is_alphabetic())
                    {
                        return Err(EvaluationError::Unsupported(
                            "string interpolation".to_string(),
                        ));
                    }
                    result.push('$');
                }
                Some('{') if self.peek() == Some('$') => {
                    return Err(EvaluationError::Unsupported(
                        "string interpolation".to_string(),
                    ));
                }
                Some('\\') => self.read_escape(&mut result),
                Some(c) => result.push(c),
                None => return Err(unterminated(start)),
            }
        }
    }

    fn read_escape(&mut self, out: &mut String) {
        let Some(c) = self.peek() else {
            out.push('\\');
            return;
        };
        let simple = match c {
            'n' => Some('\n'),
            't' => Some('\t'),
            'r' => Some('\r'),
            'v' => Some('\x0B'),
            'e' => Some('\x1B'),
            'f' => Some('\x0C'),
            '\\' => Some('\\'),
            '$' => Some('$'),
            '"' => Some('"'),
            _ => None,
        };
        if let Some(s) = simple {
            self.advance();
            out.push(s);
            return;
        }

        match c {
            '0'..='7' => {
                let mut digits = String::new();
                while digits.len() < 3 {
                    match self.peek() {
                        Some(d @ '0'..='7') => {
                            digits.push(d);
                            self.advance();
                        }
                        _ => break,
                    }
                }
                let code = u32::from_str_radix(&digits, 8).unwrap_or(0) & 0xFF;
                out.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
            }
            'x' if self.peek_at(1).is_some_and(|d| d.is_ascii_hexdigit()) => {
                self.advance();
                let mut digits = String::new();
                while digits.len() < 2 {
                    match self.peek() {
                        Some(d) if d.is_ascii_hexdigit() => {
                            digits.push(d);
                            self.advance();
                        }
                        _ => break,
                    }
                }
                let code = u32::from_str_radix(&digits, 16).unwrap_or(0);
                out.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
            }
            'u' if self.peek_at(1) == Some('{') => {
                self.advance();
                self.advance();
                let mut digits = String::new();
                while let Some(d) = self.advance() {
                    if d == '}' {
                        break;
                    }
                    digits.push(d);
                }
                let code = u32::from_str_radix(&digits, 16).unwrap_or(0xFFFD);
                out.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
            }
            _ => out.push('\\'),
        }
    }

    fn read_operator(&mut self) -> Result<TokenKind, EvaluationError> {
        let offset = self.offset();
        let rest = &self.input[offset..];

        // Longest match first
        let table: &[(&str, TokenKind)] = &[
            ("===", TokenKind::Identical),
            ("!==", TokenKind::NotIdentical),
            ("...", TokenKind::Ellipsis),
            ("**", TokenKind::Pow),
            ("=>", TokenKind::DoubleArrow),
            ("::", TokenKind::DoubleColon),
            ("??", TokenKind::Coalesce),
            ("&&", TokenKind::And),
            ("||", TokenKind::Or),
            ("==", TokenKind::Equal),
            ("!=", TokenKind::NotEqual),
            ("<>", TokenKind::NotEqual),
            ("<=", TokenKind::LessEqual),
            (">=", TokenKind::GreaterEqual),
            ("<<", TokenKind::ShiftLeft),
            (">>", TokenKind::ShiftRight),
            ("[", TokenKind::LeftBracket),
            ("]", TokenKind::RightBracket),
            ("(", TokenKind::LeftParen),
            (")", TokenKind::RightParen),
            (",", TokenKind::Comma),
            ("?", TokenKind::Question),
            (":", TokenKind::Colon),
            ("+", TokenKind::Plus),
            ("-", TokenKind::Minus),
            ("*", TokenKind::Star),
            ("/", TokenKind::Slash),
            ("%", TokenKind::Percent),
            (".", TokenKind::Dot),
            ("!", TokenKind::Bang),
            ("~", TokenKind::Tilde),
            ("&", TokenKind::Ampersand),
            ("|", TokenKind::Pipe),
            ("^", TokenKind::Caret),
            ("<", TokenKind::Less),
            (">", TokenKind::Greater),
        ];

        for (text, kind) in table {
            if rest.starts_with(text) {
                for _ in 0..text.chars().count() {
                    self.advance();
                }
                return Ok(kind.clone());
            }
        }

        let ch = rest.chars().next().unwrap_or(' ');
        Err(EvaluationError::Syntax {
            offset,
            message: format!("unexpected character '{}'", ch),
        })
    }
}

fn parse_integer(digits: &str, radix: u32, offset: usize) -> Result<TokenKind, EvaluationError> {
    if digits.is_empty() {
        return Err(EvaluationError::Syntax {
            offset,
            message: "invalid number literal".to_string(),
        });
    }
    if let Some(c) = digits.chars().find(|c| !c.is_digit(radix)) {
        return Err(EvaluationError::Syntax {
            offset,
            message: format!("invalid digit '{}' in base {} literal", c, radix),
        });
    }
    if let Ok(n) = i64::from_str_radix(digits, radix) {
        return Ok(TokenKind::Integer(n));
    }

    // Integer overflow turns into a float, rounded once
    if radix == 10 {
        return digits
            .parse::<f64>()
            .map(TokenKind::Float)
            .map_err(|e| EvaluationError::Syntax {
                offset,
                message: e.to_string(),
            });
    }
    let value = match u128::from_str_radix(digits, radix) {
        Ok(n) => n as f64,
        Err(_) => digits
            .chars()
            .filter_map(|c| c.to_digit(radix))
            .fold(0f64, |acc, d| acc * radix as f64 + d as f64),
    };
    Ok(TokenKind::Float(value))
}

fn unterminated(offset: usize) -> EvaluationError {
    EvaluationError::Syntax {
        offset,
        message: "unterminated string".to_string(),
    }
}
