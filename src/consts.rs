//! 常量定义
//!
//! 私有目录名称、记录格式、目录偏移等常量

// ===== 私有命名空间 =====

/// 私有根目录名称（位于文件系统根目录下）
pub const PRIVROOT_NAME: &str = ".xastore_priv";

/// 私有根目录下的 xattr 根目录名称
pub const XAROOT_NAME: &str = "xattrs";

// ===== 记录格式 =====

/// 属性记录 magic（"AXFR" 小端）
pub const XATTR_MAGIC: u32 = 0x5246_5841;

/// 属性记录头大小（magic + hash）
pub const XATTR_HEADER_SIZE: usize = 8;

/// 属性名最大长度
pub const XATTR_NAME_MAX: usize = 255;

/// 目录项名最大长度（超过的目录项在遍历时跳过）
pub const NAME_MAX: usize = 255;

// ===== 文件模式 =====

/// 文件类型掩码
pub const S_IFMT: u32 = 0o170000;
/// 目录
pub const S_IFDIR: u32 = 0o040000;
/// 普通文件
pub const S_IFREG: u32 = 0o100000;

/// 私有目录/文件的权限（仅所有者）
pub const XATTR_MODE: u32 = 0o700;

// ===== 目录偏移 =====

/// "." 的逻辑偏移
pub const DOT_OFFSET: u64 = 1;

/// ".." 的逻辑偏移
pub const DOT_DOT_OFFSET: u64 = 2;

/// 第一个普通目录项可用的逻辑偏移
pub const FIRST_ENTRY_OFFSET: u64 = 3;

/// 最大逻辑偏移（反向遍历的起点）
pub const MAX_OFFSET: u64 = u64::MAX >> 1;

// ===== 存储 =====

/// 默认页大小
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// 默认属性目录缓存容量
pub const DEFAULT_DIR_CACHE_SIZE: usize = 64;
