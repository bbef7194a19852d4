/// 缓存键模块
/// 提供各种缓存键生成函数

// 笔记缓存键模块
pub mod notes_keys;

// 限流计数器键模块
pub mod rate_limit_keys;

// 重新导出常用的键生成函数
pub use notes_keys::{notes_key, notes_pattern};
pub use rate_limit_keys::rate_limit_key;
