//! amp-allowed-tags - 由 AMP validator protoascii 规则生成 WordPress AMP 插件使用的允许标签 PHP 类

// 导出全局错误类型
pub use self::error::{AmpGenError, GenResult};

// 导出配置模块
pub use self::config::{ConfigManager, CustomConfigBuilder, GenConfig};

// 导出文本格式解析核心接口
pub use self::textproto::{FromTextMessage, TextFormatParser, TextMessage};

// 导出规则模块核心接口
pub use self::rule::{AssembledSpec, HtmlFormat, RuleDocument, RuleLoader, SpecAssembler, TagSpec};

// 导出编译模块核心接口
pub use self::compiler::{FlattenedRules, Retention, RuleFlattener, RuleMap, RuleValue, TagVariant};

// 导出输出模块核心接口
pub use self::emitter::PhpEmitter;

// 导出生成流程
pub use self::generator::{AllowedTagsGenerator, GenerationReport, render, validate_out_dir_name};

// 声明所有子模块
pub mod config;
pub mod error;
pub mod textproto;
pub mod rule;
pub mod compiler;
pub mod emitter;
pub mod generator;
