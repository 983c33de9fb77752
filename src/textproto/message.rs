//! 通用消息树与 schema 解码接口
//! 解码语义与 protobuf text_format.Merge 保持一致：
//! 单值标量重复出现取最后一个，单值消息重复出现合并字段

use std::str::FromStr;

use tracing::debug;

use crate::error::{AmpGenError, GenResult};

/// 标量值（原样保留词法形态，由 schema 决定如何解释）
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
    Ident(String),
}

impl Scalar {
    fn kind(&self) -> &'static str {
        match self {
            Scalar::Str(_) => "string",
            Scalar::Int(_) => "integer",
            Scalar::Float(_) => "float",
            Scalar::Ident(_) => "identifier",
        }
    }
}

/// 字段值
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(Scalar),
    Message(TextMessage),
}

/// 单个字段（保留出现顺序与行号）
#[derive(Debug, Clone, PartialEq)]
pub struct TextField {
    pub name: String,
    pub value: FieldValue,
    pub line: usize,
}

/// 未绑定 schema 的消息
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextMessage {
    pub fields: Vec<TextField>,
}

/// 可从通用消息树解码的 schema 类型
pub trait FromTextMessage: Sized {
    /// schema 中的消息名（用于错误提示）
    const MESSAGE_NAME: &'static str;
    /// 本消息识别的字段，其余字段解码时跳过
    const KNOWN_FIELDS: &'static [&'static str];

    fn from_message(msg: &TextMessage) -> GenResult<Self>;

    /// 解码并记录被跳过的未知字段
    fn decode(msg: &TextMessage) -> GenResult<Self> {
        for field in &msg.fields {
            if !Self::KNOWN_FIELDS.contains(&field.name.as_str()) {
                debug!(
                    "跳过未识别字段 {}.{}（第{}行）",
                    Self::MESSAGE_NAME,
                    field.name,
                    field.line
                );
            }
        }
        Self::from_message(msg)
    }
}

/// 可由标识符或整数表示的枚举
pub trait TextEnum: Sized + FromStr {
    fn from_number(value: i64) -> Option<Self>;
}

impl TextMessage {
    /// 按名称遍历字段
    pub fn fields_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a TextField> {
        self.fields.iter().filter(move |f| f.name == name)
    }

    fn last_named(&self, name: &str) -> Option<&TextField> {
        self.fields_named(name).last()
    }

    fn scalar_of<'a, M: FromTextMessage>(field: &'a TextField) -> GenResult<&'a Scalar> {
        match &field.value {
            FieldValue::Scalar(s) => Ok(s),
            FieldValue::Message(_) => Err(schema_error::<M>(field, "expected a scalar, found a message")),
        }
    }

    pub fn optional_string<M: FromTextMessage>(&self, name: &str) -> GenResult<Option<String>> {
        self.last_named(name).map(|f| string_of::<M>(f)).transpose()
    }

    pub fn required_string<M: FromTextMessage>(&self, name: &str) -> GenResult<String> {
        self.optional_string::<M>(name)?.ok_or_else(|| {
            AmpGenError::SchemaDecode(format!("{} is missing required field {:?}", M::MESSAGE_NAME, name))
        })
    }

    pub fn repeated_strings<M: FromTextMessage>(&self, name: &str) -> GenResult<Vec<String>> {
        self.fields_named(name).map(|f| string_of::<M>(f)).collect()
    }

    pub fn optional_int<M: FromTextMessage>(&self, name: &str) -> GenResult<Option<i64>> {
        self.last_named(name)
            .map(|f| -> GenResult<i64> {
                match Self::scalar_of::<M>(f)? {
                    Scalar::Int(v) => Ok(*v),
                    other => Err(schema_error::<M>(f, &format!("expected an integer, found {}", other.kind()))),
                }
            })
            .transpose()
    }

    pub fn optional_float<M: FromTextMessage>(&self, name: &str) -> GenResult<Option<f64>> {
        self.last_named(name)
            .map(|f| -> GenResult<f64> {
                match Self::scalar_of::<M>(f)? {
                    Scalar::Float(v) => Ok(*v),
                    Scalar::Int(v) => Ok(*v as f64),
                    Scalar::Ident(id) if id.eq_ignore_ascii_case("inf") || id.eq_ignore_ascii_case("infinity") => {
                        Ok(f64::INFINITY)
                    }
                    Scalar::Ident(id) if id.eq_ignore_ascii_case("nan") => Ok(f64::NAN),
                    other => Err(schema_error::<M>(f, &format!("expected a number, found {}", other.kind()))),
                }
            })
            .transpose()
    }

    pub fn optional_bool<M: FromTextMessage>(&self, name: &str) -> GenResult<Option<bool>> {
        self.last_named(name)
            .map(|f| -> GenResult<bool> {
                match Self::scalar_of::<M>(f)? {
                    Scalar::Ident(id) => match id.as_str() {
                        "true" | "True" | "t" => Ok(true),
                        "false" | "False" | "f" => Ok(false),
                        _ => Err(schema_error::<M>(f, &format!("invalid boolean {:?}", id))),
                    },
                    Scalar::Int(0) => Ok(false),
                    Scalar::Int(1) => Ok(true),
                    other => Err(schema_error::<M>(f, &format!("expected a boolean, found {}", other.kind()))),
                }
            })
            .transpose()
    }

    /// 未建模的枚举字段：保留标识符文本
    pub fn optional_ident<M: FromTextMessage>(&self, name: &str) -> GenResult<Option<String>> {
        self.last_named(name)
            .map(|f| -> GenResult<String> {
                match Self::scalar_of::<M>(f)? {
                    Scalar::Ident(id) => Ok(id.clone()),
                    Scalar::Int(v) => Ok(v.to_string()),
                    other => Err(schema_error::<M>(f, &format!("expected an enum, found {}", other.kind()))),
                }
            })
            .transpose()
    }

    pub fn optional_enum<M: FromTextMessage, E: TextEnum>(&self, name: &str) -> GenResult<Option<E>> {
        self.last_named(name).map(|f| enum_of::<M, E>(f)).transpose()
    }

    pub fn repeated_enums<M: FromTextMessage, E: TextEnum>(&self, name: &str) -> GenResult<Vec<E>> {
        self.fields_named(name).map(|f| enum_of::<M, E>(f)).collect()
    }

    /// 单值子消息：多次出现时按出现顺序合并字段后解码
    pub fn optional_message<M: FromTextMessage, T: FromTextMessage>(&self, name: &str) -> GenResult<Option<T>> {
        let mut merged: Option<TextMessage> = None;
        for field in self.fields_named(name) {
            let sub = message_of::<M>(field)?;
            merged.get_or_insert_with(TextMessage::default).fields.extend(sub.fields.iter().cloned());
        }
        merged.as_ref().map(T::decode).transpose()
    }

    pub fn repeated_messages<M: FromTextMessage, T: FromTextMessage>(&self, name: &str) -> GenResult<Vec<T>> {
        self.fields_named(name)
            .map(|f| message_of::<M>(f).and_then(T::decode))
            .collect()
    }
}

fn schema_error<M: FromTextMessage>(field: &TextField, detail: &str) -> AmpGenError {
    AmpGenError::SchemaDecode(format!(
        "{}.{} (line {}): {}",
        M::MESSAGE_NAME,
        field.name,
        field.line,
        detail
    ))
}

fn string_of<M: FromTextMessage>(field: &TextField) -> GenResult<String> {
    match TextMessage::scalar_of::<M>(field)? {
        Scalar::Str(s) => Ok(s.clone()),
        other => Err(schema_error::<M>(field, &format!("expected a string, found {}", other.kind()))),
    }
}

fn message_of<M: FromTextMessage>(field: &TextField) -> GenResult<&TextMessage> {
    match &field.value {
        FieldValue::Message(m) => Ok(m),
        FieldValue::Scalar(s) => Err(schema_error::<M>(
            field,
            &format!("expected a message, found {}", s.kind()),
        )),
    }
}

fn enum_of<M: FromTextMessage, E: TextEnum>(field: &TextField) -> GenResult<E> {
    match TextMessage::scalar_of::<M>(field)? {
        Scalar::Ident(id) => id
            .parse::<E>()
            .map_err(|_| schema_error::<M>(field, &format!("unknown enum value {:?}", id))),
        Scalar::Int(v) => {
            E::from_number(*v).ok_or_else(|| schema_error::<M>(field, &format!("unknown enum number {}", v)))
        }
        other => Err(schema_error::<M>(field, &format!("expected an enum, found {}", other.kind()))),
    }
}
