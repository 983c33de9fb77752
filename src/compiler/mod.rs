//! 编译模块：将类型化规则文档过滤并展平为有序规则表
pub mod flattener;
pub mod table;

pub use self::flattener::{Retention, RuleFlattener};
pub use self::table::{FlattenedRules, RuleMap, RuleValue, SpecVersions, TagVariant};
