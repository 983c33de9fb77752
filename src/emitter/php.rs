//! PHP 源码生成
//! 将展平后的规则表按固定布局输出为 PHP 类，所有映射按键排序，输出与输入顺序无关

use std::time::Instant;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::template;
use crate::compiler::{FlattenedRules, RuleMap, RuleValue, TagVariant};
use crate::config::GenConfig;

/// 字符串值需转为小写的键
const LOWERCASE_VALUE_KEYS: &[&str] = &[
    "mandatory_parent",
    "mandatory_ancestor",
    "mandatory_ancestor_suggested_alternative",
];

/// PHP 代码生成器
pub struct PhpEmitter;

impl PhpEmitter {
    /// 生成完整 PHP 文件内容（以换行结尾）
    pub fn emit(rules: &FlattenedRules, config: &GenConfig) -> String {
        let start = Instant::now();
        let mut out = PhpWriter::default();

        out.lines.extend(template::header_lines(&config.generator_name, &config.class_name));
        Self::emit_versions(&mut out, rules);
        Self::emit_allowed_tags(&mut out, rules);
        Self::emit_attr_table(&mut out, "layout_allowed_attrs", rules, &config.layout_attr_list);
        Self::emit_attr_table(&mut out, "globally_allowed_attrs", rules, &config.global_attr_list);
        out.lines.push(template::FOOTER.to_string());
        out.lines.push(String::new());
        out.lines.push("}".to_string());
        out.lines.push(String::new());

        let output = collapse_empty_arrays(&out.lines.join("\n"));
        debug!("✅ PHP 生成完成：{}行，总耗时{:?}", out.lines.len(), start.elapsed());
        output
    }

    fn emit_versions(out: &mut PhpWriter, rules: &FlattenedRules) {
        if let Some(revision) = rules.versions.spec_file_revision {
            out.lines.push(format!("\tprivate static $spec_file_revision = {};", revision));
        }
        if let Some(revision) = rules.versions.min_validator_revision_required {
            out.lines
                .push(format!("\tprivate static $minimum_validator_revision_required = {};", revision));
        }
    }

    /// 标签按名称排序，同名形态保持声明顺序
    fn emit_allowed_tags(out: &mut PhpWriter, rules: &FlattenedRules) {
        out.lines.push(String::new());
        out.lines.push("\tprivate static $allowed_tags = array(".to_string());
        for (tag_name, variants) in &rules.allowed_tags {
            out.open(2, tag_name);
            for variant in variants {
                Self::emit_variant(out, variant);
            }
            out.close(2);
        }
        out.lines.push("\t);".to_string());
    }

    fn emit_variant(out: &mut PhpWriter, variant: &TagVariant) {
        out.lines.push(format!("{}array(", indent(3)));
        out.write_map(4, &variant.to_rule_map());
        out.lines.push(String::new());
        out.close(3);
    }

    fn emit_attr_table(out: &mut PhpWriter, field: &str, rules: &FlattenedRules, list_name: &str) {
        out.lines.push(String::new());
        out.lines.push(format!("\tprivate static ${} = array(", field));
        match rules.attr_lists.get(list_name) {
            Some(attrs) => out.write_map(2, attrs),
            None => warn!("属性列表 {} 不存在，${} 输出为空表", list_name, field),
        }
        out.lines.push(String::new());
        out.lines.push("\t);".to_string());
        out.lines.push(String::new());
    }
}

/// 按行累积输出
#[derive(Debug, Default)]
struct PhpWriter {
    lines: Vec<String>,
}

impl PhpWriter {
    fn open(&mut self, depth: usize, key: &str) {
        self.lines.push(format!("{}{} => array(", indent(depth), php_string(key)));
    }

    fn close(&mut self, depth: usize) {
        self.lines.push(format!("{}),", indent(depth)));
    }

    /// 映射：每个键一行，嵌套映射/列表缩进加一层
    fn write_map(&mut self, depth: usize, map: &RuleMap) {
        for (key, value) in map {
            match value {
                RuleValue::Map(nested) => {
                    self.open(depth, key);
                    self.write_map(depth + 1, nested);
                    self.close(depth);
                }
                RuleValue::List(items) => {
                    self.open(depth, key);
                    let mut sorted: Vec<&String> = items.iter().collect();
                    sorted.sort();
                    for item in sorted {
                        self.lines.push(format!("{}{},", indent(depth + 1), php_string(item)));
                    }
                    self.close(depth);
                }
                scalar => {
                    let literal = scalar_literal(key, scalar);
                    self.lines.push(format!("{}{} => {},", indent(depth), php_string(key), literal));
                }
            }
        }
    }
}

fn scalar_literal(key: &str, value: &RuleValue) -> String {
    match value {
        RuleValue::Str(s) if LOWERCASE_VALUE_KEYS.contains(&key) => php_string(&s.to_lowercase()),
        RuleValue::Str(s) => php_string(s),
        RuleValue::Int(i) => i.to_string(),
        RuleValue::Float(f) => php_float(*f),
        RuleValue::Bool(b) => b.to_string(),
        // 容器类型由 write_map 处理
        RuleValue::Map(_) | RuleValue::List(_) => "array()".to_string(),
    }
}

fn indent(depth: usize) -> String {
    "\t".repeat(depth)
}

/// PHP 单引号字符串字面量：仅 `\` 与 `'` 需要转义，其余字符原样保留
pub fn php_string(value: &str) -> String {
    let mut literal = String::with_capacity(value.len() + 2);
    literal.push('\'');
    for ch in value.chars() {
        if ch == '\\' || ch == '\'' {
            literal.push('\\');
        }
        literal.push(ch);
    }
    literal.push('\'');
    literal
}

/// PHP 浮点字面量，整数值保留小数点
pub fn php_float(value: f64) -> String {
    if value.is_nan() {
        "NAN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "INF".to_string() } else { "-INF".to_string() }
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// 折叠空数组：`array(` 与 `)` 之间只有空白时合并为 `array()`
fn collapse_empty_arrays(text: &str) -> String {
    static EMPTY_ARRAY_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(\s*\)").unwrap());
    EMPTY_ARRAY_REGEX.replace_all(text, "()").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::RuleFlattener;
    use crate::config::ConfigManager;
    use crate::rule::RuleLoader;

    fn emit_src(src: &str) -> String {
        let config = ConfigManager::custom().generator_name("test-gen").build();
        let doc = RuleLoader::parse(src).unwrap();
        let rules = RuleFlattener::flatten(&doc, &config).unwrap();
        PhpEmitter::emit(&rules, &config)
    }

    #[test]
    fn test_php_string_escaping() {
        assert_eq!(php_string("plain"), "'plain'");
        assert_eq!(php_string("it's"), r"'it\'s'");
        assert_eq!(php_string(r"^\d+$"), r"'^\\d+$'");
        assert_eq!(php_string("é"), "'é'");
    }

    #[test]
    fn test_php_float_literals() {
        assert_eq!(php_float(1.0), "1.0");
        assert_eq!(php_float(0.5), "0.5");
        assert_eq!(php_float(-2.0), "-2.0");
        assert_eq!(php_float(f64::INFINITY), "INF");
    }

    #[test]
    fn test_empty_document_layout() {
        let php = emit_src("");
        assert!(php.starts_with("<?php\n/**\n * Generated by test-gen - do not edit.\n"));
        assert!(php.contains("class AMP_Allowed_Tags_Generated {\n\n\n\tprivate static $allowed_tags = array();"));
        assert!(php.contains("\tprivate static $layout_allowed_attrs = array();"));
        assert!(php.contains("\tprivate static $globally_allowed_attrs = array();"));
        assert!(!php.contains("$spec_file_revision"));
        assert!(php.contains("public static function get_allowed_tag( $node_name ) {"));
        assert!(php.ends_with("\t}\n\n}\n"));
    }

    #[test]
    fn test_img_variant_layout() {
        let php = emit_src(
            r#"
            spec_file_revision: 42
            tags: { tag_name: "Img" attrs: { name: "Src" mandatory: true } }
            "#,
        );
        assert!(php.contains("\tprivate static $spec_file_revision = 42;\n"));
        assert!(!php.contains("$minimum_validator_revision_required"));
        let expected = "\tprivate static $allowed_tags = array(\n\
                        \t\t'img' => array(\n\
                        \t\t\tarray(\n\
                        \t\t\t\t'attr_spec_list' => array(\n\
                        \t\t\t\t\t'src' => array(\n\
                        \t\t\t\t\t\t'mandatory' => true,\n\
                        \t\t\t\t\t),\n\
                        \t\t\t\t),\n\
                        \t\t\t\t'tag_spec' => array(),\n\
                        \n\
                        \t\t\t),\n\
                        \t\t),\n\
                        \t);\n";
        assert!(php.contains(expected), "unexpected layout:\n{}", php);
    }

    #[test]
    fn test_sorted_keys_and_lists() {
        let php = emit_src(
            r#"
            tags: { tag_name: "B" requires_extension: "zeta" requires_extension: "alpha" }
            tags: { tag_name: "A" attrs: { name: "z" } attrs: { name: "m" } }
            "#,
        );
        let a = php.find("'a' => array(").unwrap();
        let b = php.find("'b' => array(").unwrap();
        assert!(a < b);
        assert!(php.find("'m' => array()").unwrap() < php.find("'z' => array()").unwrap());
        assert!(php.contains("'requires_extension' => array(\n\t\t\t\t\t\t'alpha',\n\t\t\t\t\t\t'zeta',\n"));
    }

    #[test]
    fn test_lowercased_parent_values_and_booleans() {
        let php = emit_src(
            r#"tags: { tag_name: "SOURCE" mandatory_parent: "AMP-VIDEO" spec_name: "Source In Video" unique: false }"#,
        );
        assert!(php.contains("'mandatory_parent' => 'amp-video',"));
        assert!(php.contains("'spec_name' => 'Source In Video',"));
        assert!(php.contains("'unique' => false,"));
        assert!(!php.contains("'False'"));
    }

    #[test]
    fn test_tag_level_references_lowercased() {
        let php = emit_src(
            r#"
            tags: {
              tag_name: "AMP-AD"
              mandatory_parent: "BODY"
              mandatory_ancestor: "FORM"
              mandatory_ancestor_suggested_alternative: "AMP-FORM"
              disallowed_ancestor: "AMP-SIDEBAR"
              also_requires_tag: "AMP-AD extension .js script"
              also_requires_tag_warning: "AMP-ANALYTICS extension .js script"
              requires_extension: "AMP-ZZ"
              requires_extension: "amp-aa"
              attrs: { name: "src" alternative_names: "[SRC]" value_url: { allowed_protocol: "HTTPS" } }
            }
            "#,
        );
        assert!(php.contains("'mandatory_parent' => 'body',"));
        assert!(php.contains("'mandatory_ancestor' => 'form',"));
        assert!(php.contains("'mandatory_ancestor_suggested_alternative' => 'amp-form',"));
        assert!(php.contains("'disallowed_ancestor' => array(\n\t\t\t\t\t\t'amp-sidebar',\n"));
        assert!(php.contains("'also_requires_tag' => array(\n\t\t\t\t\t\t'amp-ad extension .js script',\n"));
        assert!(php.contains(
            "'also_requires_tag_warning' => array(\n\t\t\t\t\t\t'amp-analytics extension .js script',\n"
        ));
        // 先转小写再排序
        assert!(php.contains("'requires_extension' => array(\n\t\t\t\t\t\t'amp-aa',\n\t\t\t\t\t\t'amp-zz',\n"));
        assert!(!php.contains("AMP-SIDEBAR"));
        // 属性级列表保持原样
        assert!(php.contains("'[SRC]',"));
        assert!(php.contains("'HTTPS',"));
    }

    #[test]
    fn test_global_and_layout_tables() {
        let php = emit_src(
            r#"
            attr_lists: { name: "$GLOBAL_ATTRS" attrs: { name: "class" } }
            attr_lists: { name: "$AMP_LAYOUT_ATTRS" attrs: { name: "height" value_regex: "\\d+" } }
            "#,
        );
        assert!(php.contains("\tprivate static $globally_allowed_attrs = array(\n\t\t'class' => array(),\n\n\t);\n"));
        assert!(php.contains("\t\t'height' => array(\n\t\t\t'value_regex' => '\\\\d+',\n\t\t),\n"));
    }
}
