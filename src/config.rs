//! 全局配置管理，存储生成流程的所有可配置项
//! 默认值即标准生成流程的固定行为：无需任何配置文件即可运行

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::GenResult;
use crate::rule::HtmlFormat;

/// 生成器配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenConfig {
    /// 工作目录（主规则文件与输出目录均相对于此目录）
    pub work_dir: PathBuf,
    /// 主规则文件名
    pub main_spec_file: String,
    /// 扩展规则候选目录，按顺序尝试，首个有匹配的目录生效
    pub extension_dirs: Vec<PathBuf>,
    /// 扩展规则文件名前缀
    pub extension_prefix: String,
    /// 扩展规则文件名后缀
    pub extension_suffix: String,
    /// 输出目录名（每次运行前清空重建）
    pub out_dir: String,
    /// 拼接后规则文件名
    pub assembled_file_name: String,
    /// 生成的 PHP 文件名
    pub output_file_name: String,
    /// 生成的 PHP 类名
    pub class_name: String,
    /// 写入文件头的生成器名称
    pub generator_name: String,
    /// mandatory_parent 命中这些值的标签不输出（根元素除外）
    pub excluded_parents: Vec<String>,
    /// 根元素标签名
    pub root_tag: String,
    /// 参考点占位标签名
    pub reference_point_tag: String,
    /// 目标页面格式
    pub target_format: HtmlFormat,
    /// 布局属性列表名
    pub layout_attr_list: String,
    /// 全局属性列表名
    pub global_attr_list: String,
    /// 是否额外输出展平结果 JSON（调试用）
    pub dump_json: bool,
    /// 是否启用详细日志
    pub verbose: bool,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            main_spec_file: "validator-main.protoascii".to_string(),
            extension_dirs: vec![PathBuf::from("extensions"), PathBuf::from("../extensions")],
            extension_prefix: "validator-".to_string(),
            extension_suffix: ".protoascii".to_string(),
            out_dir: "amp_wp".to_string(),
            assembled_file_name: "validator.protoascii".to_string(),
            output_file_name: "class-amp-allowed-tags-generated.php".to_string(),
            class_name: "AMP_Allowed_Tags_Generated".to_string(),
            generator_name: env!("CARGO_PKG_NAME").to_string(),
            excluded_parents: vec!["$ROOT".to_string(), "!DOCTYPE".to_string()],
            root_tag: "HTML".to_string(),
            reference_point_tag: "$REFERENCE_POINT".to_string(),
            target_format: HtmlFormat::Amp,
            layout_attr_list: "$AMP_LAYOUT_ATTRS".to_string(),
            global_attr_list: "$GLOBAL_ATTRS".to_string(),
            dump_json: false,
            verbose: false,
        }
    }
}

impl GenConfig {
    /// 主规则文件完整路径
    pub fn main_spec_path(&self) -> PathBuf {
        self.work_dir.join(&self.main_spec_file)
    }

    /// 输出目录完整路径
    pub fn out_dir_path(&self) -> PathBuf {
        self.work_dir.join(&self.out_dir)
    }

    /// 判断文件名是否符合扩展规则命名约定
    pub fn is_extension_file_name(&self, file_name: &str) -> bool {
        file_name.len() >= self.extension_prefix.len() + self.extension_suffix.len()
            && file_name.starts_with(&self.extension_prefix)
            && file_name.ends_with(&self.extension_suffix)
    }
}

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 获取默认配置
    pub fn get_default() -> GenConfig {
        GenConfig::default()
    }

    /// 从 JSON 文件加载配置（缺省字段取默认值）
    pub fn from_json_file(path: &Path) -> GenResult<GenConfig> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// 从 JSON 字符串加载配置
    pub fn from_json_str(content: &str) -> GenResult<GenConfig> {
        Ok(serde_json::from_str(content)?)
    }

    /// 自定义配置
    pub fn custom() -> CustomConfigBuilder {
        CustomConfigBuilder::new()
    }
}

/// 配置构建器（便于自定义配置）
#[derive(Debug, Clone, Default)]
pub struct CustomConfigBuilder {
    config: GenConfig,
}

impl CustomConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: GenConfig::default(),
        }
    }

    /// 以已有配置为基础继续修改
    pub fn from_config(config: GenConfig) -> Self {
        Self { config }
    }

    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.work_dir = dir.into();
        self
    }

    pub fn out_dir(mut self, name: impl Into<String>) -> Self {
        self.config.out_dir = name.into();
        self
    }

    pub fn extension_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.config.extension_dirs = dirs;
        self
    }

    pub fn class_name(mut self, name: impl Into<String>) -> Self {
        self.config.class_name = name.into();
        self
    }

    pub fn generator_name(mut self, name: impl Into<String>) -> Self {
        self.config.generator_name = name.into();
        self
    }

    pub fn target_format(mut self, format: HtmlFormat) -> Self {
        self.config.target_format = format;
        self
    }

    pub fn dump_json(mut self, dump_json: bool) -> Self {
        self.config.dump_json = dump_json;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    pub fn build(self) -> GenConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_config_fills_defaults() {
        // 测试场景：仅覆盖部分字段，其余取默认值
        let config = ConfigManager::from_json_str(r#"{"out_dir": "build_out", "target_format": "AMP4EMAIL"}"#)
            .unwrap();
        assert_eq!(config.out_dir, "build_out");
        assert_eq!(config.target_format, HtmlFormat::Amp4Email);
        assert_eq!(config.main_spec_file, "validator-main.protoascii");
        assert_eq!(config.excluded_parents, vec!["$ROOT", "!DOCTYPE"]);
    }

    #[test]
    fn test_extension_file_name_matching() {
        let config = GenConfig::default();
        assert!(config.is_extension_file_name("validator-amp-ad.protoascii"));
        assert!(!config.is_extension_file_name("validator-main.txt"));
        assert!(!config.is_extension_file_name("amp-ad.protoascii"));
        // 通配部分允许为空
        assert!(config.is_extension_file_name("validator-.protoascii"));
    }

    #[test]
    fn test_builder_overrides() {
        let config = ConfigManager::custom()
            .work_dir("/tmp/amp")
            .out_dir("gen")
            .class_name("My_Tags")
            .verbose(true)
            .build();
        assert_eq!(config.out_dir_path(), PathBuf::from("/tmp/amp/gen"));
        assert_eq!(config.main_spec_path(), PathBuf::from("/tmp/amp/validator-main.protoascii"));
        assert_eq!(config.class_name, "My_Tags");
        assert!(config.verbose);
    }
}
