// 缓存模块
// 共享键值存储契约、读穿透缓存与缓存键生成

pub mod keys;
pub mod read_through;
pub mod store;

// 重新导出常用类型，方便其他模块使用
pub use read_through::ReadCache;
pub use store::{KeyValueStore, RedisStore, StoreError};
