//! 错误类型定义
//!
//! 提供扩展属性存储操作的错误类型。

use core::fmt;

/// 扩展属性操作错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: &'static str,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// 不支持的操作（旧格式对象、功能关闭、私有根目录不可用）
    Unsupported,
    /// 属性或属性目录不存在
    NoAttribute,
    /// 已存在
    AlreadyExists,
    /// 缓冲区太小
    RangeTooSmall,
    /// 数据损坏（magic/校验和不匹配，或删除目标不在私有命名空间）
    Corrupted,
    /// handler 前缀已注册
    AlreadyRegistered,
    /// handler 未注册 / 对象不存在
    NotFound,
    /// 无效参数
    InvalidInput,
    /// I/O 错误
    Io,
    /// 空间不足
    NoSpace,
    /// 目录非空
    NotEmpty,
    /// 不是目录
    NotDirectory,
    /// 是目录
    IsDirectory,
}

impl Error {
    /// 创建新错误
    pub const fn new(kind: ErrorKind, message: &'static str) -> Self {
        Self { kind, message }
    }

    /// 获取错误类型
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// 获取错误消息
    pub const fn message(&self) -> &'static str {
        self.message
    }

    /// 对应的 POSIX errno（正值）
    pub const fn errno(&self) -> i32 {
        match self.kind {
            ErrorKind::Unsupported => 95,      // EOPNOTSUPP
            ErrorKind::NoAttribute => 61,      // ENODATA
            ErrorKind::AlreadyExists => 17,    // EEXIST
            ErrorKind::RangeTooSmall => 34,    // ERANGE
            ErrorKind::Corrupted => 5,         // EIO
            ErrorKind::AlreadyRegistered => 16, // EBUSY
            ErrorKind::NotFound => 2,          // ENOENT
            ErrorKind::InvalidInput => 22,     // EINVAL
            ErrorKind::Io => 5,                // EIO
            ErrorKind::NoSpace => 28,          // ENOSPC
            ErrorKind::NotEmpty => 39,         // ENOTEMPTY
            ErrorKind::NotDirectory => 20,     // ENOTDIR
            ErrorKind::IsDirectory => 21,      // EISDIR
        }
    }

    /// 是否为 "属性不存在"
    pub fn is_no_attribute(&self) -> bool {
        self.kind == ErrorKind::NoAttribute
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result 类型别名
pub type Result<T> = core::result::Result<T, Error>;
