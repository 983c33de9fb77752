//! 全局错误类型定义
//! 所有错误均为致命错误：生成流程一次性执行，不做重试或部分恢复

use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AmpGenError {
    // ===================== 预检错误 =====================
    /// 输出目录名包含非法字符（只允许字母、数字、下划线、连字符）
    #[error("Invalid output directory name: {0:?}")]
    InvalidOutputDirName(String),

    /// 主规则文件不存在
    #[error("Missing input file: {}", .0.display())]
    MissingInput(PathBuf),

    // ===================== 解析相关错误 =====================
    /// protoascii 文本语法错误
    #[error("Text format syntax error at line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    /// 文本与规则 schema 不符（字段类型错误、缺少必填字段、未知枚举值）
    #[error("Schema decode failed: {0}")]
    SchemaDecode(String),

    // ===================== 展平相关错误 =====================
    /// 标签引用了不存在的属性列表
    #[error("Tag {tag:?} references unknown attribute list {list:?}")]
    UnknownAttrList { tag: String, list: String },

    // ===================== 输出相关错误 =====================
    /// 输出文件写入失败
    #[error("Failed to write {}: {source}", .path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: IoError,
    },

    // ===================== 基础错误 =====================
    #[error("IO operation failed: {0}")]
    IoError(#[from] IoError),
    #[error("JSON parse failed: {0}")]
    JsonError(#[from] SerdeJsonError),
}

// 全局Result类型
pub type GenResult<T> = Result<T, AmpGenError>;
