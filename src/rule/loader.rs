//! 规则加载
//! 负责拼接规则文档并按 schema 解码为 RuleDocument

use tracing::debug;

use super::assembler::{AssembledSpec, SpecAssembler};
use super::model::RuleDocument;
use crate::config::GenConfig;
use crate::error::GenResult;
use crate::textproto::{FromTextMessage, TextFormatParser};

/// 规则加载管理器
pub struct RuleLoader;

impl RuleLoader {
    /// 拼接并解码（一次拼接，结果同时返回供落盘）
    pub fn load(config: &GenConfig) -> GenResult<(AssembledSpec, RuleDocument)> {
        let assembled = SpecAssembler::assemble(config)?;
        let document = Self::parse(&assembled.content)?;
        Ok((assembled, document))
    }

    /// 解码 protoascii 文本，语法或 schema 错误直接终止
    pub fn parse(content: &str) -> GenResult<RuleDocument> {
        let message = TextFormatParser::parse(content)?;
        debug!("文本解析完成，顶层字段{}个", message.fields.len());

        let document = RuleDocument::decode(&message)?;
        debug!(
            "规则解码完成：标签规则{}条，属性列表{}个，spec_file_revision={:?}",
            document.tags.len(),
            document.attr_lists.len(),
            document.spec_file_revision
        );
        Ok(document)
    }
}
