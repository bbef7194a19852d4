/// 笔记缓存键前缀
const NOTES_PREFIX: &str = "notes:";

/// 生成笔记查询结果缓存键（属主 + 查询形状）
pub fn notes_key(owner_id: i64, shape: &str) -> String {
    format!("{}{}:{}", NOTES_PREFIX, owner_id, shape)
}

/// 生成匹配某属主全部笔记缓存条目的通配模式，仅用于批量失效
pub fn notes_pattern(owner_id: i64) -> String {
    format!("{}{}:*", NOTES_PREFIX, owner_id)
}
