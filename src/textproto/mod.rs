//! protobuf 文本格式（protoascii）读取模块
//! 先解析为通用消息树，再由 schema 类型通过 FromTextMessage 解码
pub mod lexer;
pub mod message;
pub mod parser;

pub use self::message::{FieldValue, FromTextMessage, Scalar, TextEnum, TextField, TextMessage};
pub use self::parser::TextFormatParser;
