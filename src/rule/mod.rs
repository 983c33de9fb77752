//! 规则模块：负责规则文档的拼接、解码与数据模型定义
pub mod assembler;
pub mod loader;
pub mod model;
pub mod schema;

// 导出核心接口
pub use self::assembler::{AssembledSpec, SpecAssembler};
pub use self::loader::RuleLoader;
pub use self::model::{
    AttrList, AttrSpec, BlacklistedCdataRegex, CdataSpec, DispatchKey, ExtensionSpec, HtmlFormat, PropertySpec,
    PropertySpecList, RuleDocument, TagSpec, UrlSpec,
};
