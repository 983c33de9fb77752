//! 规则展平器核心
//! 过滤无关标签，将类型化规则树展平为有序嵌套映射，并内联引用的属性列表

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::debug;

use super::table::{FlattenedRules, RuleMap, RuleValue, SpecVersions, TagVariant};
use crate::config::GenConfig;
use crate::error::{AmpGenError, GenResult};
use crate::rule::{AttrSpec, CdataSpec, ExtensionSpec, PropertySpecList, RuleDocument, TagSpec, UrlSpec};

/// 标签保留判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    Retained,
    /// mandatory_parent 位于排除集合（页面 body 之外）
    ExcludedParent,
    /// 参考点占位标签
    ReferencePoint,
    /// 已废弃
    Deprecated,
    /// 声明的页面格式不含目标格式
    FormatMismatch,
}

/// 规则展平器
pub struct RuleFlattener;

impl RuleFlattener {
    /// 展平规则文档
    pub fn flatten(document: &RuleDocument, config: &GenConfig) -> GenResult<FlattenedRules> {
        let start = Instant::now();
        let mut stats = FlattenStats::default();
        debug!("目标页面格式：{}", config.target_format);

        // 1. 先构建所有具名属性列表，标签按名称引用
        let mut attr_lists = BTreeMap::new();
        for attr_list in &document.attr_lists {
            attr_lists.insert(attr_list.name.clone(), Self::attr_map(&attr_list.attrs));
        }

        // 2. 按文档顺序处理标签，同名标签各自成为独立形态
        let mut allowed_tags: BTreeMap<String, Vec<TagVariant>> = BTreeMap::new();
        for tag in &document.tags {
            let verdict = Self::retention(tag, config);
            stats.record(verdict);
            if verdict != Retention::Retained {
                debug!("跳过标签 {}：{:?}", tag.tag_name, verdict);
                continue;
            }

            let variant = Self::tag_variant(tag, &attr_lists)?;
            allowed_tags.entry(tag.tag_name.to_lowercase()).or_default().push(variant);
        }

        debug!("✅ 规则展平完成，总耗时{:?}", start.elapsed());
        debug!(
            "📊 展平统计：保留{}条、排除父节点{}条、参考点{}条、废弃{}条、格式不符{}条，属性列表{}个",
            stats.retained,
            stats.excluded_parent,
            stats.reference_point,
            stats.deprecated,
            stats.format_mismatch,
            attr_lists.len()
        );

        Ok(FlattenedRules {
            allowed_tags,
            attr_lists,
            versions: SpecVersions {
                spec_file_revision: document.spec_file_revision,
                min_validator_revision_required: document.min_validator_revision_required,
            },
        })
    }

    /// 标签保留判定
    /// 祖先排除只检查直接 mandatory_parent，不追溯 mandatory_ancestor
    pub fn retention(tag: &TagSpec, config: &GenConfig) -> Retention {
        let excluded_parent = tag
            .mandatory_parent
            .as_ref()
            .is_some_and(|parent| config.excluded_parents.contains(parent));
        if excluded_parent && tag.tag_name != config.root_tag {
            return Retention::ExcludedParent;
        }
        if tag.tag_name == config.reference_point_tag {
            return Retention::ReferencePoint;
        }
        if tag.deprecation.is_some() {
            return Retention::Deprecated;
        }
        // 未声明格式视为适用于所有格式
        if !tag.html_format.is_empty() && !tag.html_format.contains(&config.target_format) {
            return Retention::FormatMismatch;
        }
        Retention::Retained
    }

    /// 构建单个标签形态：标签约束 + 属性映射（先内联属性，后应用引用列表，同名以列表为准）
    fn tag_variant(tag: &TagSpec, attr_lists: &BTreeMap<String, RuleMap>) -> GenResult<TagVariant> {
        let mut attr_spec_list = Self::attr_map(&tag.attrs);
        for list_name in &tag.attr_lists {
            let list = attr_lists.get(list_name).ok_or_else(|| AmpGenError::UnknownAttrList {
                tag: tag.tag_name.clone(),
                list: list_name.clone(),
            })?;
            attr_spec_list.extend(list.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        Ok(TagVariant {
            attr_spec_list,
            cdata: tag.cdata.as_ref().and_then(Self::cdata_map),
            tag_spec: Self::tag_rules(tag),
        })
    }

    fn tag_rules(tag: &TagSpec) -> RuleMap {
        let mut rules = RuleMap::new();
        // 标签级引用列表与 DOM 节点名比较，统一小写
        put_lowercase_list(&mut rules, "also_requires_tag", &tag.also_requires_tag);
        put_lowercase_list(&mut rules, "also_requires_tag_warning", &tag.also_requires_tag_warning);
        put_lowercase_list(&mut rules, "requires_extension", &tag.requires_extension);
        put_lowercase_list(&mut rules, "disallowed_ancestor", &tag.disallowed_ancestor);
        if let Some(extension_spec) = &tag.extension_spec {
            rules.insert("extension_spec".to_string(), Self::extension_spec_map(extension_spec).into());
        }
        put(&mut rules, "mandatory", tag.mandatory);
        put(&mut rules, "mandatory_alternatives", tag.mandatory_alternatives.clone());
        put(&mut rules, "mandatory_ancestor", tag.mandatory_ancestor.clone());
        put(
            &mut rules,
            "mandatory_ancestor_suggested_alternative",
            tag.mandatory_ancestor_suggested_alternative.clone(),
        );
        put(&mut rules, "mandatory_parent", tag.mandatory_parent.clone());
        put(&mut rules, "spec_name", tag.spec_name.clone());
        put(&mut rules, "spec_url", tag.spec_url.clone());
        put(&mut rules, "unique", tag.unique);
        put(&mut rules, "unique_warning", tag.unique_warning);
        rules
    }

    fn extension_spec_map(spec: &ExtensionSpec) -> RuleMap {
        let mut map = RuleMap::new();
        put(&mut map, "name", spec.name.clone());
        put_list(&mut map, "version", &spec.version);
        put_list(&mut map, "deprecated_version", &spec.deprecated_version);
        put(&mut map, "deprecated_allow_duplicates", spec.deprecated_allow_duplicates);
        put(&mut map, "requires_usage", spec.requires_usage.clone());
        map
    }

    /// 属性名（小写）→ 属性值约束
    fn attr_map(attrs: &[AttrSpec]) -> RuleMap {
        attrs
            .iter()
            .map(|attr| (attr.name.to_lowercase(), RuleValue::Map(Self::attr_values(attr))))
            .collect()
    }

    fn attr_values(attr: &AttrSpec) -> RuleMap {
        let mut values = RuleMap::new();
        put_list(&mut values, "alternative_names", &attr.alternative_names);
        put(&mut values, "blacklisted_value_regex", attr.blacklisted_value_regex.clone());
        put(&mut values, "dispatch_key", attr.dispatch_key.map(|k| k.0));
        put(&mut values, "mandatory", attr.mandatory);
        put(&mut values, "value", attr.value.clone());
        put(&mut values, "value_casei", attr.value_casei.clone());
        put(&mut values, "value_regex", attr.value_regex.clone());
        put(&mut values, "value_regex_casei", attr.value_regex_casei.clone());
        if let Some(properties) = &attr.value_properties {
            values.insert("value_properties".to_string(), Self::value_properties_map(properties).into());
        }
        if let Some(url) = &attr.value_url {
            values.insert("value_url".to_string(), Self::value_url_map(url).into());
        }
        values
    }

    /// 属性名（小写）→ 除 name 外的约束字段
    fn value_properties_map(list: &PropertySpecList) -> RuleMap {
        list.properties
            .iter()
            .map(|property| {
                let mut fields = RuleMap::new();
                put(&mut fields, "mandatory", property.mandatory);
                put(&mut fields, "value", property.value.clone());
                put(&mut fields, "value_double", property.value_double);
                (property.name.to_lowercase(), RuleValue::Map(fields))
            })
            .collect()
    }

    fn value_url_map(url: &UrlSpec) -> RuleMap {
        let mut map = RuleMap::new();
        put_list(&mut map, "allowed_protocol", &url.allowed_protocol);
        put(&mut map, "allow_relative", url.allow_relative);
        put(&mut map, "allow_empty", url.allow_empty);
        map
    }

    /// 文本内容约束；blacklisted_cdata_regex 多条时合并为一个映射，后出现的覆盖先出现的
    fn cdata_map(cdata: &CdataSpec) -> Option<RuleMap> {
        let mut map = RuleMap::new();
        put(&mut map, "max_bytes", cdata.max_bytes);
        put(&mut map, "max_bytes_spec_url", cdata.max_bytes_spec_url.clone());
        put(&mut map, "mandatory_cdata", cdata.mandatory_cdata.clone());
        put(&mut map, "cdata_regex", cdata.cdata_regex.clone());
        put(&mut map, "whitespace_only", cdata.whitespace_only);

        if !cdata.blacklisted_cdata_regex.is_empty() {
            let mut merged = RuleMap::new();
            for entry in &cdata.blacklisted_cdata_regex {
                put(&mut merged, "regex", entry.regex.clone());
                put(&mut merged, "error_message", entry.error_message.clone());
            }
            map.insert("blacklisted_cdata_regex".to_string(), merged.into());
        }

        (!map.is_empty()).then_some(map)
    }
}

fn put<V: Into<RuleValue>>(map: &mut RuleMap, key: &str, value: Option<V>) {
    if let Some(value) = value {
        map.insert(key.to_string(), value.into());
    }
}

fn put_list(map: &mut RuleMap, key: &str, items: &[String]) {
    if !items.is_empty() {
        map.insert(key.to_string(), RuleValue::List(items.to_vec()));
    }
}

fn put_lowercase_list(map: &mut RuleMap, key: &str, items: &[String]) {
    if !items.is_empty() {
        map.insert(key.to_string(), RuleValue::List(items.iter().map(|item| item.to_lowercase()).collect()));
    }
}

/// 展平统计信息
#[derive(Debug, Clone, Default)]
struct FlattenStats {
    retained: usize,
    excluded_parent: usize,
    reference_point: usize,
    deprecated: usize,
    format_mismatch: usize,
}

impl FlattenStats {
    fn record(&mut self, verdict: Retention) {
        match verdict {
            Retention::Retained => self.retained += 1,
            Retention::ExcludedParent => self.excluded_parent += 1,
            Retention::ReferencePoint => self.reference_point += 1,
            Retention::Deprecated => self.deprecated += 1,
            Retention::FormatMismatch => self.format_mismatch += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{AttrList, HtmlFormat, RuleLoader};

    fn flatten_src(src: &str) -> FlattenedRules {
        let doc = RuleLoader::parse(src).unwrap();
        RuleFlattener::flatten(&doc, &GenConfig::default()).unwrap()
    }

    fn tag(name: &str) -> TagSpec {
        TagSpec {
            tag_name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_retention_predicate() {
        let config = GenConfig::default();

        let mut head_child = tag("META");
        head_child.mandatory_parent = Some("$ROOT".to_string());
        assert_eq!(RuleFlattener::retention(&head_child, &config), Retention::ExcludedParent);

        // 根元素不受父节点排除影响
        let mut html = tag("HTML");
        html.mandatory_parent = Some("!DOCTYPE".to_string());
        assert_eq!(RuleFlattener::retention(&html, &config), Retention::Retained);

        assert_eq!(RuleFlattener::retention(&tag("$REFERENCE_POINT"), &config), Retention::ReferencePoint);

        let mut old = tag("AMP-OLD");
        old.deprecation = Some("amp-new".to_string());
        assert_eq!(RuleFlattener::retention(&old, &config), Retention::Deprecated);

        let mut email_only = tag("AMP-EMAIL-ONLY");
        email_only.html_format = vec![HtmlFormat::Amp4Email];
        assert_eq!(RuleFlattener::retention(&email_only, &config), Retention::FormatMismatch);

        let mut both = tag("AMP-BOTH");
        both.html_format = vec![HtmlFormat::Amp4Email, HtmlFormat::Amp];
        assert_eq!(RuleFlattener::retention(&both, &config), Retention::Retained);

        // 只检查直接父节点，mandatory_ancestor 命中排除集合不影响保留
        let mut ancestor_only = tag("NOSCRIPT");
        ancestor_only.mandatory_ancestor = Some("$ROOT".to_string());
        assert_eq!(RuleFlattener::retention(&ancestor_only, &config), Retention::Retained);
    }

    #[test]
    fn test_img_with_mandatory_src() {
        let rules = flatten_src(
            r#"tags: { tag_name: "Img" attrs: { name: "Src" mandatory: true value_url: { allowed_protocol: "https" } } }"#,
        );
        assert_eq!(rules.allowed_tags.len(), 1);
        let variants = &rules.allowed_tags["img"];
        assert_eq!(variants.len(), 1);
        let src = variants[0].attr_spec_list["src"].as_map().unwrap();
        assert_eq!(src["mandatory"], RuleValue::Bool(true));
        let url = src["value_url"].as_map().unwrap();
        assert_eq!(url["allowed_protocol"], RuleValue::List(vec!["https".to_string()]));
    }

    #[test]
    fn test_root_parent_tag_dropped() {
        let rules = flatten_src(
            r#"
            tags: { tag_name: "HEAD" mandatory_parent: "$ROOT" }
            tags: { tag_name: "HTML" mandatory_parent: "!DOCTYPE" }
            tags: { tag_name: "$REFERENCE_POINT" }
            tags: { tag_name: "P" }
            "#,
        );
        let names: Vec<&str> = rules.allowed_tags.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["html", "p"]);
    }

    #[test]
    fn test_repeated_tag_names_keep_declaration_order() {
        let rules = flatten_src(
            r#"
            tags: { tag_name: "META" spec_name: "meta name=" attrs: { name: "name" } }
            tags: { tag_name: "META" spec_name: "meta charset=utf-8" attrs: { name: "charset" } }
            "#,
        );
        let variants = &rules.allowed_tags["meta"];
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].tag_spec["spec_name"], RuleValue::from("meta name="));
        assert_eq!(variants[1].tag_spec["spec_name"], RuleValue::from("meta charset=utf-8"));
    }

    #[test]
    fn test_attr_list_inlined_and_overrides_inline() {
        let rules = flatten_src(
            r#"
            attr_lists: { name: "common" attrs: { name: "ID" value_regex: "[a-z]+" } attrs: { name: "title" } }
            tags: { tag_name: "DIV" attrs: { name: "id" mandatory: true } attrs: { name: "role" } attr_lists: "common" }
            "#,
        );
        let attrs = &rules.allowed_tags["div"][0].attr_spec_list;
        let keys: Vec<&str> = attrs.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["id", "role", "title"]);
        // 列表中的同名属性覆盖内联定义
        let id = attrs["id"].as_map().unwrap();
        assert!(!id.contains_key("mandatory"));
        assert_eq!(id["value_regex"], RuleValue::from("[a-z]+"));
        assert!(rules.attr_lists.contains_key("common"));
    }

    #[test]
    fn test_unknown_attr_list_is_error() {
        let doc = RuleLoader::parse(r#"tags: { tag_name: "DIV" attr_lists: "missing" }"#).unwrap();
        let err = RuleFlattener::flatten(&doc, &GenConfig::default()).unwrap_err();
        assert!(matches!(err, AmpGenError::UnknownAttrList { ref list, .. } if list == "missing"));
    }

    #[test]
    fn test_later_attr_list_definition_wins() {
        let mut doc = RuleDocument::default();
        doc.attr_lists.push(AttrList {
            name: "dup".to_string(),
            attrs: vec![AttrSpec {
                name: "a".to_string(),
                ..Default::default()
            }],
        });
        doc.attr_lists.push(AttrList {
            name: "dup".to_string(),
            attrs: vec![AttrSpec {
                name: "b".to_string(),
                ..Default::default()
            }],
        });
        let rules = RuleFlattener::flatten(&doc, &GenConfig::default()).unwrap();
        let keys: Vec<&String> = rules.attr_lists["dup"].keys().collect();
        assert_eq!(keys, vec!["b"]);
    }

    #[test]
    fn test_tag_rules_and_value_properties() {
        let rules = flatten_src(
            r#"
            tags: {
              tag_name: "AMP-AD"
              also_requires_tag: "amp-ad extension .js script"
              disallowed_ancestor: "AMP-SIDEBAR"
              unique: false
              extension_spec: { name: "amp-ad" version: "0.1" version: "latest" requires_usage: EXEMPTED }
              attrs: {
                name: "content"
                value_properties: { properties: { name: "Width" value: "device-width" mandatory: true } properties: { name: "minimum-scale" value_double: 1.0 } }
              }
            }
            "#,
        );
        let variant = &rules.allowed_tags["amp-ad"][0];
        assert_eq!(
            variant.tag_spec["also_requires_tag"],
            RuleValue::List(vec!["amp-ad extension .js script".to_string()])
        );
        assert_eq!(
            variant.tag_spec["disallowed_ancestor"],
            RuleValue::List(vec!["amp-sidebar".to_string()])
        );
        assert_eq!(variant.tag_spec["unique"], RuleValue::Bool(false));
        let ext = variant.tag_spec["extension_spec"].as_map().unwrap();
        assert_eq!(ext["name"], RuleValue::from("amp-ad"));
        assert_eq!(ext["requires_usage"], RuleValue::from("EXEMPTED"));
        let props = variant.attr_spec_list["content"].as_map().unwrap()["value_properties"]
            .as_map()
            .unwrap();
        let width = props["width"].as_map().unwrap();
        assert_eq!(width["value"], RuleValue::from("device-width"));
        assert_eq!(width["mandatory"], RuleValue::Bool(true));
        assert!(!width.contains_key("name"));
        assert_eq!(props["minimum-scale"].as_map().unwrap()["value_double"], RuleValue::Float(1.0));
    }

    #[test]
    fn test_cdata_flattening() {
        let rules = flatten_src(
            r#"
            tags: {
              tag_name: "STYLE"
              cdata: {
                max_bytes: 75000
                blacklisted_cdata_regex: { regex: "!important" error_message: "CSS !important" }
                blacklisted_cdata_regex: { regex: "<!--" error_message: "html comments" }
              }
            }
            tags: { tag_name: "SCRIPT" cdata: { } }
            "#,
        );
        let cdata = rules.allowed_tags["style"][0].cdata.as_ref().unwrap();
        assert_eq!(cdata["max_bytes"], RuleValue::Int(75000));
        let blacklisted = cdata["blacklisted_cdata_regex"].as_map().unwrap();
        assert_eq!(blacklisted["regex"], RuleValue::from("<!--"));
        // 空的 cdata 不输出
        assert!(rules.allowed_tags["script"][0].cdata.is_none());
    }

    #[test]
    fn test_versions_carried_through() {
        let rules = flatten_src("spec_file_revision: 7");
        assert_eq!(rules.versions.spec_file_revision, Some(7));
        assert_eq!(rules.versions.min_validator_revision_required, None);
    }
}
