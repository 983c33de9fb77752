//! 规则文档拼接
//! 主规则文件 + 扩展规则片段（按路径字符串排序）拼接为单一文档

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::config::GenConfig;
use crate::error::{AmpGenError, GenResult};

/// 拼接结果
#[derive(Debug, Clone)]
pub struct AssembledSpec {
    /// 拼接后的完整文本
    pub content: String,
    /// 主规则文件路径
    pub main_source: PathBuf,
    /// 参与拼接的扩展片段（已排序）
    pub extension_sources: Vec<PathBuf>,
}

/// 规则拼接器
pub struct SpecAssembler;

impl SpecAssembler {
    /// 读取主规则文件并追加所有扩展片段
    pub fn assemble(config: &GenConfig) -> GenResult<AssembledSpec> {
        let main_source = config.main_spec_path();
        if !main_source.is_file() {
            return Err(AmpGenError::MissingInput(main_source));
        }

        let mut content = fs::read_to_string(&main_source)?;
        let extension_sources = Self::discover_extensions(config)?;
        for extension in &extension_sources {
            content.push_str(&fs::read_to_string(extension)?);
        }

        debug!(
            "规则拼接完成：主文件 {}，扩展片段{}个，共{}字节",
            main_source.display(),
            extension_sources.len(),
            content.len()
        );

        Ok(AssembledSpec {
            content,
            main_source,
            extension_sources,
        })
    }

    /// 查找扩展片段：依次尝试候选目录，首个有匹配的目录生效
    /// 匹配规则等价于 `<dir>/*/<prefix>*<suffix>`
    pub fn discover_extensions(config: &GenConfig) -> GenResult<Vec<PathBuf>> {
        for candidate in &config.extension_dirs {
            let dir = config.work_dir.join(candidate);
            if !dir.is_dir() {
                debug!("扩展目录不存在，跳过：{}", dir.display());
                continue;
            }

            let mut found = Self::scan_extension_dir(&dir, config)?;
            if found.is_empty() {
                debug!("扩展目录无匹配文件：{}", dir.display());
                continue;
            }

            // 按路径字符串排序，与文件系统枚举顺序无关
            found.sort_by_cached_key(|path| path.to_string_lossy().into_owned());
            debug!("在 {} 发现扩展片段{}个", dir.display(), found.len());
            return Ok(found);
        }

        Ok(Vec::new())
    }

    fn scan_extension_dir(dir: &Path, config: &GenConfig) -> GenResult<Vec<PathBuf>> {
        let mut found = Vec::new();
        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(2)
            .follow_links(true)
            .into_iter()
            // 与 shell 通配一致：`*` 不匹配以点开头的目录
            .filter_entry(|entry| entry.depth() != 1 || !is_hidden(entry.file_name().to_str()));

        for entry in walker {
            let entry = entry.map_err(|e| match e.into_io_error() {
                Some(io) => AmpGenError::IoError(io),
                None => AmpGenError::IoError(std::io::Error::other("filesystem loop while scanning extensions")),
            })?;
            if entry.depth() != 2 || !entry.file_type().is_file() {
                continue;
            }
            let matches = entry
                .file_name()
                .to_str()
                .is_some_and(|name| config.is_extension_file_name(name));
            if matches {
                found.push(entry.into_path());
            }
        }

        Ok(found)
    }
}

fn is_hidden(name: Option<&str>) -> bool {
    name.is_some_and(|n| n.starts_with('.'))
}
