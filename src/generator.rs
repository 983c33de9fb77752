//! 生成流程编排
//! 固定顺序：校验并重建输出目录 → 拼接规则（仅一次）→ 落盘拼接结果 → 解码 → 展平 → 生成 PHP → 落盘

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::compiler::{FlattenedRules, RuleFlattener};
use crate::config::GenConfig;
use crate::emitter::PhpEmitter;
use crate::error::{AmpGenError, GenResult};
use crate::rule::RuleLoader;

/// 调试用展平结果文件名
pub const JSON_DUMP_FILE_NAME: &str = "allowed-tags.json";

static OUT_DIR_NAME_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z_\-0-9]+$").unwrap());

/// 输出目录名只允许字母、数字、下划线与连字符（不含路径分隔符与点）
pub fn validate_out_dir_name(name: &str) -> GenResult<()> {
    if OUT_DIR_NAME_REGEX.is_match(name) {
        Ok(())
    } else {
        Err(AmpGenError::InvalidOutputDirName(name.to_string()))
    }
}

/// 纯函数形式：protoascii 文本 → PHP 文本（不涉及文件系统）
pub fn render(content: &str, config: &GenConfig) -> GenResult<String> {
    let document = RuleLoader::parse(content)?;
    let rules = RuleFlattener::flatten(&document, config)?;
    Ok(PhpEmitter::emit(&rules, config))
}

/// 一次生成的结果摘要
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub assembled_path: PathBuf,
    pub output_path: PathBuf,
    pub json_path: Option<PathBuf>,
    pub extension_count: usize,
    pub tag_count: usize,
    pub variant_count: usize,
    pub attr_list_count: usize,
}

/// 允许标签表生成器
pub struct AllowedTagsGenerator {
    config: GenConfig,
}

impl AllowedTagsGenerator {
    pub fn new(config: GenConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GenConfig {
        &self.config
    }

    /// 执行完整生成流程，任一步失败即终止
    pub fn run(&self) -> GenResult<GenerationReport> {
        let start = Instant::now();
        let out_dir = self.prepare_out_dir()?;

        let (assembled, document) = RuleLoader::load(&self.config)?;
        debug!(
            "规则来源：{}，扩展片段{}个",
            assembled.main_source.display(),
            assembled.extension_sources.len()
        );
        let assembled_path = out_dir.join(&self.config.assembled_file_name);
        write_file(&assembled_path, &assembled.content)?;
        debug!("拼接规则已写入：{}", assembled_path.display());

        let rules = RuleFlattener::flatten(&document, &self.config)?;
        let php = PhpEmitter::emit(&rules, &self.config);
        let output_path = out_dir.join(&self.config.output_file_name);
        write_file(&output_path, &php)?;

        let json_path = if self.config.dump_json {
            Some(self.dump_json(&out_dir, &rules)?)
        } else {
            None
        };

        let report = GenerationReport {
            assembled_path,
            output_path,
            json_path,
            extension_count: assembled.extension_sources.len(),
            tag_count: rules.allowed_tags.len(),
            variant_count: rules.variant_count(),
            attr_list_count: rules.attr_lists.len(),
        };
        info!(
            "✅ 生成完成：{}（标签{}个，形态{}条，属性列表{}个，扩展片段{}个），总耗时{:?}",
            report.output_path.display(),
            report.tag_count,
            report.variant_count,
            report.attr_list_count,
            report.extension_count,
            start.elapsed()
        );
        Ok(report)
    }

    /// 校验目录名后清空重建输出目录
    fn prepare_out_dir(&self) -> GenResult<PathBuf> {
        validate_out_dir_name(&self.config.out_dir)?;
        let out_dir = self.config.out_dir_path();
        if out_dir.exists() {
            debug!("清空已有输出目录：{}", out_dir.display());
            fs::remove_dir_all(&out_dir)?;
        }
        fs::create_dir_all(&out_dir)?;
        Ok(out_dir)
    }

    fn dump_json(&self, out_dir: &Path, rules: &FlattenedRules) -> GenResult<PathBuf> {
        let path = out_dir.join(JSON_DUMP_FILE_NAME);
        let json = serde_json::to_string_pretty(rules)?;
        write_file(&path, &json)?;
        debug!("展平结果已导出：{}", path.display());
        Ok(path)
    }
}

fn write_file(path: &Path, content: &str) -> GenResult<()> {
    fs::write(path, content).map_err(|source| AmpGenError::WriteError {
        path: path.to_path_buf(),
        source,
    })
}
