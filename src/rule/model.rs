//! 规则数据模型定义
//! 对应 AMP validator.proto 中本工具消费的消息与字段，仅存储规则数据，无任何业务逻辑
//! 未列出的字段在解码时跳过

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 页面格式（validator.proto: HtmlFormat.Code）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HtmlFormat {
    UnknownCode,
    #[serde(rename = "AMP")]
    Amp,
    #[serde(rename = "AMP4ADS")]
    Amp4Ads,
    #[serde(rename = "AMP4EMAIL")]
    Amp4Email,
    Actions,
}

impl HtmlFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            HtmlFormat::UnknownCode => "UNKNOWN_CODE",
            HtmlFormat::Amp => "AMP",
            HtmlFormat::Amp4Ads => "AMP4ADS",
            HtmlFormat::Amp4Email => "AMP4EMAIL",
            HtmlFormat::Actions => "ACTIONS",
        }
    }

    pub fn from_number(value: i64) -> Option<Self> {
        match value {
            0 => Some(HtmlFormat::UnknownCode),
            1 => Some(HtmlFormat::Amp),
            2 => Some(HtmlFormat::Amp4Ads),
            3 => Some(HtmlFormat::Amp4Email),
            4 => Some(HtmlFormat::Actions),
            _ => None,
        }
    }
}

impl fmt::Display for HtmlFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HtmlFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNKNOWN_CODE" => Ok(HtmlFormat::UnknownCode),
            "AMP" => Ok(HtmlFormat::Amp),
            "AMP4ADS" => Ok(HtmlFormat::Amp4Ads),
            "AMP4EMAIL" => Ok(HtmlFormat::Amp4Email),
            "ACTIONS" => Ok(HtmlFormat::Actions),
            other => Err(format!("unknown html format {:?}", other)),
        }
    }
}

/// 属性分派键（validator.proto: AttrSpec.DispatchKeyType）
/// 输出时只透传数值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchKey(pub i64);

impl FromStr for DispatchKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE_DISPATCH" => Ok(DispatchKey(0)),
            "NAME_DISPATCH" => Ok(DispatchKey(1)),
            "NAME_VALUE_DISPATCH" => Ok(DispatchKey(2)),
            "NAME_VALUE_PARENT_DISPATCH" => Ok(DispatchKey(3)),
            // 旧版规则中 dispatch_key 为布尔值
            "true" | "True" => Ok(DispatchKey(1)),
            "false" | "False" => Ok(DispatchKey(0)),
            other => Err(format!("unknown dispatch key {:?}", other)),
        }
    }
}

/// 完整规则文档（validator.proto: ValidatorRules）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleDocument {
    pub tags: Vec<TagSpec>,
    pub attr_lists: Vec<AttrList>,
    pub spec_file_revision: Option<i64>,
    pub min_validator_revision_required: Option<i64>,
}

/// 单条标签规则（同一标签名可出现多次，各自代表一种合法形态）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagSpec {
    pub tag_name: String,
    pub spec_name: Option<String>,
    pub spec_url: Option<String>,
    pub mandatory: Option<bool>,
    pub mandatory_alternatives: Option<String>,
    pub mandatory_parent: Option<String>,
    pub mandatory_ancestor: Option<String>,
    pub mandatory_ancestor_suggested_alternative: Option<String>,
    pub unique: Option<bool>,
    pub unique_warning: Option<bool>,
    pub also_requires_tag: Vec<String>,
    pub also_requires_tag_warning: Vec<String>,
    pub requires_extension: Vec<String>,
    pub disallowed_ancestor: Vec<String>,
    pub html_format: Vec<HtmlFormat>,
    pub deprecation: Option<String>,
    pub extension_spec: Option<ExtensionSpec>,
    pub attrs: Vec<AttrSpec>,
    pub attr_lists: Vec<String>,
    pub cdata: Option<CdataSpec>,
}

/// 具名属性列表，被多个标签按名称引用
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttrList {
    pub name: String,
    pub attrs: Vec<AttrSpec>,
}

/// 单条属性规则
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttrSpec {
    pub name: String,
    pub alternative_names: Vec<String>,
    pub mandatory: Option<bool>,
    pub value: Option<String>,
    pub value_casei: Option<String>,
    pub value_regex: Option<String>,
    pub value_regex_casei: Option<String>,
    pub blacklisted_value_regex: Option<String>,
    pub dispatch_key: Option<DispatchKey>,
    pub value_properties: Option<PropertySpecList>,
    pub value_url: Option<UrlSpec>,
}

/// 属性值内的键值约束列表（如 viewport 的 content）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertySpecList {
    pub properties: Vec<PropertySpec>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertySpec {
    pub name: String,
    pub mandatory: Option<bool>,
    pub value: Option<String>,
    pub value_double: Option<f64>,
}

/// URL 类属性值约束
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UrlSpec {
    pub allowed_protocol: Vec<String>,
    pub allow_relative: Option<bool>,
    pub allow_empty: Option<bool>,
}

/// 标签文本内容约束
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CdataSpec {
    pub max_bytes: Option<i64>,
    pub max_bytes_spec_url: Option<String>,
    pub mandatory_cdata: Option<String>,
    pub cdata_regex: Option<String>,
    pub whitespace_only: Option<bool>,
    pub blacklisted_cdata_regex: Vec<BlacklistedCdataRegex>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlacklistedCdataRegex {
    pub regex: Option<String>,
    pub error_message: Option<String>,
}

/// 扩展脚本声明
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtensionSpec {
    pub name: Option<String>,
    pub version: Vec<String>,
    pub deprecated_version: Vec<String>,
    pub deprecated_allow_duplicates: Option<bool>,
    /// 枚举标识符原样保留
    pub requires_usage: Option<String>,
}
