//! 挂载选项、标志与配置

use crate::consts::DEFAULT_DIR_CACHE_SIZE;
use bitflags::bitflags;

bitflags! {
    /// 扩展属性相关挂载选项
    ///
    /// `NO_*` 变体与对应的启用位互斥，挂载时由禁用位胜出并清除两者。
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MountOptions: u32 {
        /// 扩展属性总开关（由可选类别推导，不应直接设置）
        const XATTRS         = 0x01;
        /// 启用 user. 命名空间属性
        const XATTRS_USER    = 0x02;
        /// 禁用 user. 命名空间属性
        const NO_XATTRS_USER = 0x04;
        /// 启用 POSIX ACL
        const POSIXACL       = 0x08;
        /// 禁用 POSIX ACL
        const NO_POSIXACL    = 0x10;
    }
}

impl MountOptions {
    /// 可选的属性类别（任一启用则开启扩展属性）
    pub const OPTIONAL: Self = Self::XATTRS_USER.union(Self::POSIXACL);

    /// 扩展属性全部相关位
    pub const ALL_XATTR: Self = Self::XATTRS.union(Self::OPTIONAL);
}

bitflags! {
    /// 挂载标志
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MountFlags: u32 {
        /// 只读挂载
        const RDONLY = 0x01;
    }
}

bitflags! {
    /// 对外可见的文件系统标志
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SuperFlags: u32 {
        /// 文件系统支持 POSIX ACL
        const POSIXACL = 0x01;
    }
}

bitflags! {
    /// 设置属性的标志
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct XattrFlags: u32 {
        /// 只允许创建（已存在则失败）
        const CREATE   = 0x1;
        /// 只允许替换（不存在则失败）
        const REPLACE  = 0x2;
        /// 只读查找，从不创建
        const READONLY = 0x80;
    }
}

impl XattrFlags {
    /// 是否允许创建属性目录
    ///
    /// 无标志或显式 CREATE 时允许；REPLACE / READONLY 不允许
    pub fn allows_create(self) -> bool {
        !self.contains(Self::READONLY) && (self.is_empty() || self.contains(Self::CREATE))
    }
}

/// 扩展属性层配置
#[derive(Debug, Clone, Copy)]
pub struct XattrConfig {
    /// 挂载选项
    pub options: MountOptions,
    /// 属性目录缓存大小（条目数，0 表示不缓存）
    pub dir_cache_size: usize,
}

impl Default for XattrConfig {
    fn default() -> Self {
        Self {
            options: MountOptions::empty(),
            dir_cache_size: DEFAULT_DIR_CACHE_SIZE,
        }
    }
}
