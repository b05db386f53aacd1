//! 属性记录校验和计算
//!
//! 为属性 payload 提供 CRC32 校验和。写入时一次性计算，
//! 读取时随页拷贝流式累加。

use crc32fast::Hasher;

/// 计算 payload 校验和（一次性计算）
///
/// 空 payload 不参与哈希，固定为 0
#[inline]
pub fn xattr_hash(data: &[u8]) -> u32 {
    if data.is_empty() {
        return 0;
    }
    crc32fast::hash(data)
}

/// 流式校验和
///
/// 按页读取记录时逐块喂入，结果与 [`xattr_hash`] 一致
pub struct XattrHasher {
    inner: Hasher,
    len: usize,
}

impl XattrHasher {
    /// 创建新的流式校验器
    pub fn new() -> Self {
        Self {
            inner: Hasher::new(),
            len: 0,
        }
    }

    /// 追加数据
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
        self.len += data.len();
    }

    /// 结束并返回校验和
    pub fn finalize(self) -> u32 {
        if self.len == 0 {
            return 0;
        }
        self.inner.finalize()
    }
}

impl Default for XattrHasher {
    fn default() -> Self {
        Self::new()
    }
}
