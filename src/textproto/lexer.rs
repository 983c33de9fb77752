//! protoascii 词法分析
//! 注释在此处直接丢弃，字符串转义在此处解码

use crate::error::{AmpGenError, GenResult};

/// 词法单元
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Str(String),
    Int(i64),
    Float(f64),
    Colon,
    Comma,
    Semicolon,
    Minus,
    LBrace,
    RBrace,
    LAngle,
    RAngle,
    LBracket,
    RBracket,
}

/// 带行号的词法单元（行号从1开始，用于错误提示）
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
}

/// 词法分析器
pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src: src.as_bytes(),
            pos: 0,
            line: 1,
        }
    }

    /// 一次性切分全部词法单元
    pub fn tokenize(mut self) -> GenResult<Vec<Spanned>> {
        let mut tokens = Vec::new();
        while let Some(spanned) = self.next_token()? {
            tokens.push(spanned);
        }
        Ok(tokens)
    }

    fn error(&self, message: impl Into<String>) -> AmpGenError {
        AmpGenError::SyntaxError {
            line: self.line,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
        }
        Some(b)
    }

    fn skip_trivia(&mut self) {
        while let Some(b) = self.peek() {
            match b {
                b'#' => {
                    while let Some(c) = self.peek() {
                        if c == b'\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                b if b.is_ascii_whitespace() => {
                    self.bump();
                }
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> GenResult<Option<Spanned>> {
        self.skip_trivia();
        let line = self.line;
        let Some(b) = self.peek() else {
            return Ok(None);
        };

        let token = match b {
            b':' => self.single(Token::Colon),
            b',' => self.single(Token::Comma),
            b';' => self.single(Token::Semicolon),
            b'-' => self.single(Token::Minus),
            b'{' => self.single(Token::LBrace),
            b'}' => self.single(Token::RBrace),
            b'<' => self.single(Token::LAngle),
            b'>' => self.single(Token::RAngle),
            b'[' => self.single(Token::LBracket),
            b']' => self.single(Token::RBracket),
            b'"' | b'\'' => self.string(b)?,
            b'0'..=b'9' => self.number()?,
            b'.' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => self.number()?,
            b if b == b'_' || b.is_ascii_alphabetic() => self.ident(),
            other => {
                return Err(self.error(format!("unexpected character {:?}", other as char)));
            }
        };

        Ok(Some(Spanned { token, line }))
    }

    fn single(&mut self, token: Token) -> Token {
        self.pos += 1;
        token
    }

    fn ident(&mut self) -> Token {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == b'_' || b.is_ascii_alphanumeric() {
                self.pos += 1;
            } else {
                break;
            }
        }
        Token::Ident(String::from_utf8_lossy(&self.src[start..self.pos]).into_owned())
    }

    fn number(&mut self) -> GenResult<Token> {
        let start = self.pos;

        // 十六进制
        if self.peek() == Some(b'0') && matches!(self.peek_at(1), Some(b'x' | b'X')) {
            self.pos += 2;
            let digits_start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.pos += 1;
            }
            let digits = std::str::from_utf8(&self.src[digits_start..self.pos]).unwrap_or_default();
            return i64::from_str_radix(digits, 16)
                .map(Token::Int)
                .map_err(|e| self.error(format!("invalid hex integer: {}", e)));
        }

        let mut is_float = false;
        while let Some(b) = self.peek() {
            match b {
                b'0'..=b'9' => self.pos += 1,
                b'.' => {
                    is_float = true;
                    self.pos += 1;
                }
                b'e' | b'E' => {
                    is_float = true;
                    self.pos += 1;
                    if matches!(self.peek(), Some(b'+' | b'-')) {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
        let text = std::str::from_utf8(&self.src[start..self.pos])
            .unwrap_or_default()
            .to_string();

        // 浮点后缀 f/F
        if matches!(self.peek(), Some(b'f' | b'F')) {
            self.pos += 1;
            is_float = true;
        }

        if is_float {
            return text
                .parse::<f64>()
                .map(Token::Float)
                .map_err(|e| self.error(format!("invalid float {:?}: {}", text, e)));
        }

        // 前导0按八进制处理
        let parsed = if text.len() > 1 && text.starts_with('0') {
            i64::from_str_radix(&text[1..], 8)
        } else {
            text.parse::<i64>()
        };
        parsed
            .map(Token::Int)
            .map_err(|e| self.error(format!("invalid integer {:?}: {}", text, e)))
    }

    fn string(&mut self, quote: u8) -> GenResult<Token> {
        self.pos += 1;
        let mut bytes = Vec::new();

        loop {
            let Some(b) = self.peek() else {
                return Err(self.error("unterminated string literal"));
            };
            match b {
                b'\n' => return Err(self.error("newline in string literal")),
                b if b == quote => {
                    self.pos += 1;
                    break;
                }
                b'\\' => {
                    self.pos += 1;
                    self.escape(&mut bytes)?;
                }
                _ => {
                    bytes.push(b);
                    self.pos += 1;
                }
            }
        }

        String::from_utf8(bytes)
            .map(Token::Str)
            .map_err(|_| self.error("string literal is not valid UTF-8"))
    }

    fn escape(&mut self, out: &mut Vec<u8>) -> GenResult<()> {
        let Some(b) = self.peek() else {
            return Err(self.error("unterminated escape sequence"));
        };
        self.pos += 1;
        match b {
            b'n' => out.push(b'\n'),
            b't' => out.push(b'\t'),
            b'r' => out.push(b'\r'),
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'v' => out.push(0x0b),
            b'\\' | b'\'' | b'"' | b'?' => out.push(b),
            b'0'..=b'7' => {
                let mut value = u32::from(b - b'0');
                for _ in 0..2 {
                    match self.peek() {
                        Some(d @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(d - b'0');
                            self.pos += 1;
                        }
                        _ => break,
                    }
                }
                let byte = u8::try_from(value).map_err(|_| self.error("octal escape out of range"))?;
                out.push(byte);
            }
            b'x' | b'X' => {
                let value = self.hex_digits(1, 2)?;
                out.push(value as u8);
            }
            b'u' => self.unicode_escape(4, out)?,
            b'U' => self.unicode_escape(8, out)?,
            other => {
                return Err(self.error(format!("invalid escape \\{}", other as char)));
            }
        }
        Ok(())
    }

    fn unicode_escape(&mut self, width: usize, out: &mut Vec<u8>) -> GenResult<()> {
        let code = self.hex_digits(width, width)?;
        let ch = char::from_u32(code).ok_or_else(|| self.error(format!("invalid code point U+{:X}", code)))?;
        let mut buf = [0u8; 4];
        out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
        Ok(())
    }

    fn hex_digits(&mut self, min: usize, max: usize) -> GenResult<u32> {
        let mut value = 0u32;
        let mut count = 0;
        while count < max {
            match self.peek().and_then(|c| (c as char).to_digit(16)) {
                Some(d) => {
                    value = value * 16 + d;
                    self.pos += 1;
                    count += 1;
                }
                None => break,
            }
        }
        if count < min {
            return Err(self.error("truncated hex escape"));
        }
        Ok(value)
    }
}
