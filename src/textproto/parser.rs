//! protoascii 语法分析：词法单元 → 通用消息树

use super::lexer::{Lexer, Spanned, Token};
use super::message::{FieldValue, Scalar, TextField, TextMessage};
use crate::error::{AmpGenError, GenResult};

/// 文本格式解析器
pub struct TextFormatParser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl TextFormatParser {
    /// 解析完整文档为顶层消息
    pub fn parse(src: &str) -> GenResult<TextMessage> {
        let tokens = Lexer::new(src).tokenize()?;
        let mut parser = Self { tokens, pos: 0 };
        let message = parser.message(None)?;
        if let Some(extra) = parser.peek() {
            return Err(parser.error_at(extra.line, format!("unexpected token {:?}", extra.token)));
        }
        Ok(message)
    }

    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn peek_token(&self) -> Option<&Token> {
        self.peek().map(|s| &s.token)
    }

    fn next(&mut self) -> Option<Spanned> {
        let spanned = self.tokens.get(self.pos).cloned();
        if spanned.is_some() {
            self.pos += 1;
        }
        spanned
    }

    fn current_line(&self) -> usize {
        self.peek()
            .or_else(|| self.tokens.last())
            .map_or(1, |s| s.line)
    }

    fn error_at(&self, line: usize, message: impl Into<String>) -> AmpGenError {
        AmpGenError::SyntaxError {
            line,
            message: message.into(),
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek_token() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> GenResult<()> {
        if self.eat(token) {
            return Ok(());
        }
        let line = self.current_line();
        match self.peek_token() {
            Some(found) => Err(self.error_at(line, format!("expected {:?}, found {:?}", token, found))),
            None => Err(self.error_at(line, format!("expected {:?}, found end of input", token))),
        }
    }

    /// 解析字段序列，直到遇到结束符（None 表示顶层，直到输入结束）
    fn message(&mut self, terminator: Option<&Token>) -> GenResult<TextMessage> {
        let mut message = TextMessage::default();
        loop {
            match (self.peek_token(), terminator) {
                (None, None) => break,
                (None, Some(t)) => {
                    let line = self.current_line();
                    return Err(self.error_at(line, format!("unexpected end of input, expected {:?}", t)));
                }
                (Some(tok), Some(t)) if tok == t => break,
                _ => {}
            }
            self.field(&mut message.fields)?;
            // 字段间可选分隔符
            if !self.eat(&Token::Comma) {
                self.eat(&Token::Semicolon);
            }
        }
        Ok(message)
    }

    fn field(&mut self, out: &mut Vec<TextField>) -> GenResult<()> {
        let Some(Spanned { token, line }) = self.next() else {
            return Err(self.error_at(self.current_line(), "expected field name"));
        };
        let name = match token {
            Token::Ident(name) => name,
            Token::LBracket => {
                return Err(self.error_at(line, "extension fields are not supported"));
            }
            other => {
                return Err(self.error_at(line, format!("expected field name, found {:?}", other)));
            }
        };

        if self.eat(&Token::Colon) {
            if self.eat(&Token::LBracket) {
                // 列表语法：name: [v1, v2, ...] 展开为多个同名字段
                if self.eat(&Token::RBracket) {
                    return Ok(());
                }
                loop {
                    let value = self.value()?;
                    out.push(TextField {
                        name: name.clone(),
                        value,
                        line,
                    });
                    if self.eat(&Token::RBracket) {
                        break;
                    }
                    self.expect(&Token::Comma)?;
                }
                return Ok(());
            }
            let value = self.value()?;
            out.push(TextField { name, value, line });
            return Ok(());
        }

        // 无冒号时只能是子消息
        match self.peek_token() {
            Some(Token::LBrace) | Some(Token::LAngle) => {
                let value = self.value()?;
                out.push(TextField { name, value, line });
                Ok(())
            }
            _ => Err(self.error_at(line, format!("expected ':' or '{{' after field {:?}", name))),
        }
    }

    fn value(&mut self) -> GenResult<FieldValue> {
        let line = self.current_line();
        let Some(Spanned { token, .. }) = self.next() else {
            return Err(self.error_at(line, "expected a value, found end of input"));
        };

        let scalar = match token {
            Token::LBrace => {
                let msg = self.message(Some(&Token::RBrace))?;
                self.expect(&Token::RBrace)?;
                return Ok(FieldValue::Message(msg));
            }
            Token::LAngle => {
                let msg = self.message(Some(&Token::RAngle))?;
                self.expect(&Token::RAngle)?;
                return Ok(FieldValue::Message(msg));
            }
            Token::Str(first) => {
                // 相邻字符串字面量拼接
                let mut text = first;
                while let Some(Token::Str(next)) = self.peek_token() {
                    text.push_str(next);
                    self.pos += 1;
                }
                Scalar::Str(text)
            }
            Token::Int(v) => Scalar::Int(v),
            Token::Float(v) => Scalar::Float(v),
            Token::Ident(id) => Scalar::Ident(id),
            Token::Minus => match self.next().map(|s| s.token) {
                Some(Token::Int(v)) => Scalar::Int(-v),
                Some(Token::Float(v)) => Scalar::Float(-v),
                Some(Token::Ident(id)) if id.eq_ignore_ascii_case("inf") || id.eq_ignore_ascii_case("infinity") => {
                    Scalar::Float(f64::NEG_INFINITY)
                }
                other => {
                    return Err(self.error_at(line, format!("expected a number after '-', found {:?}", other)));
                }
            },
            other => {
                return Err(self.error_at(line, format!("expected a value, found {:?}", other)));
            }
        };
        Ok(FieldValue::Scalar(scalar))
    }
}
