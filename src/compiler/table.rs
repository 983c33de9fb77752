//! 展平后的规则表定义
//! 所有映射均为 BTreeMap，遍历顺序即输出顺序

use std::collections::BTreeMap;

use serde::Serialize;

/// 规则值：封闭的变体集合，序列化时穷举匹配
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RuleValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Map(RuleMap),
    List(Vec<String>),
}

/// 有序规则映射
pub type RuleMap = BTreeMap<String, RuleValue>;

impl RuleValue {
    pub fn as_map(&self) -> Option<&RuleMap> {
        match self {
            RuleValue::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl From<String> for RuleValue {
    fn from(v: String) -> Self {
        RuleValue::Str(v)
    }
}

impl From<&str> for RuleValue {
    fn from(v: &str) -> Self {
        RuleValue::Str(v.to_string())
    }
}

impl From<i64> for RuleValue {
    fn from(v: i64) -> Self {
        RuleValue::Int(v)
    }
}

impl From<f64> for RuleValue {
    fn from(v: f64) -> Self {
        RuleValue::Float(v)
    }
}

impl From<bool> for RuleValue {
    fn from(v: bool) -> Self {
        RuleValue::Bool(v)
    }
}

impl From<RuleMap> for RuleValue {
    fn from(v: RuleMap) -> Self {
        RuleValue::Map(v)
    }
}

impl From<Vec<String>> for RuleValue {
    fn from(v: Vec<String>) -> Self {
        RuleValue::List(v)
    }
}

/// 标签的一种合法形态
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TagVariant {
    /// 属性名（小写）→ 属性值约束，已合并引用的属性列表
    pub attr_spec_list: RuleMap,
    /// 文本内容约束（无约束时为 None）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cdata: Option<RuleMap>,
    /// 标签级约束
    pub tag_spec: RuleMap,
}

impl TagVariant {
    /// 转为输出用映射，键按字典序：attr_spec_list、cdata、tag_spec
    pub fn to_rule_map(&self) -> RuleMap {
        let mut map = RuleMap::new();
        map.insert("attr_spec_list".to_string(), RuleValue::Map(self.attr_spec_list.clone()));
        if let Some(cdata) = &self.cdata {
            map.insert("cdata".to_string(), RuleValue::Map(cdata.clone()));
        }
        map.insert("tag_spec".to_string(), RuleValue::Map(self.tag_spec.clone()));
        map
    }
}

/// 规则文件版本信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SpecVersions {
    pub spec_file_revision: Option<i64>,
    pub min_validator_revision_required: Option<i64>,
}

/// 展平结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlattenedRules {
    /// 小写标签名 → 按声明顺序排列的形态列表
    pub allowed_tags: BTreeMap<String, Vec<TagVariant>>,
    /// 属性列表名 → 属性映射
    pub attr_lists: BTreeMap<String, RuleMap>,
    pub versions: SpecVersions,
}

impl FlattenedRules {
    /// 形态总数
    pub fn variant_count(&self) -> usize {
        self.allowed_tags.values().map(Vec::len).sum()
    }
}
