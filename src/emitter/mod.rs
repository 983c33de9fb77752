//! 输出模块：将展平后的规则表序列化为 PHP 类
pub mod php;
mod template;

pub use self::php::PhpEmitter;
