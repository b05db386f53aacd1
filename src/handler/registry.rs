//! handler 注册表
//!
//! 按注册顺序保存 handler，查找时返回第一个前缀匹配的条目
//! （先注册者优先，不是最长前缀匹配）。

use super::{AclKind, NamespaceHandler, PosixAclHandler, UserHandler, XattrHandler};
use crate::{
    error::{Error, ErrorKind, Result},
    store::ObjectStore,
};
use alloc::{string::String, sync::Arc, vec::Vec};
use spin::RwLock;

/// handler 注册表
///
/// 读写锁保护：`resolve` 取读锁，`register`/`unregister` 取写锁。
/// 锁只在查表期间持有，返回的 `Arc` 可以在锁外使用。
pub struct HandlerRegistry<S: ObjectStore> {
    handlers: RwLock<Vec<Arc<dyn XattrHandler<S>>>>,
}

fn same_handler<S: ObjectStore>(a: &Arc<dyn XattrHandler<S>>, b: &Arc<dyn XattrHandler<S>>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

impl<S: ObjectStore> HandlerRegistry<S> {
    /// 创建空注册表
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// 创建并注册全部内置 handler
    ///
    /// 顺序：`user.`、`trusted.`、`security.`、
    /// `system.posix_acl_access`、`system.posix_acl_default`
    pub fn with_default_handlers() -> Self {
        let registry = Self::new();
        let defaults: [Arc<dyn XattrHandler<S>>; 5] = [
            Arc::new(UserHandler),
            Arc::new(NamespaceHandler::trusted()),
            Arc::new(NamespaceHandler::security()),
            Arc::new(PosixAclHandler::new(AclKind::Access)),
            Arc::new(PosixAclHandler::new(AclKind::Default)),
        ];
        registry.handlers.write().extend(defaults);
        registry
    }

    /// 注册 handler
    ///
    /// 同一 handler 已在表中，或已有相同前缀的 handler 时返回 `AlreadyRegistered`
    pub fn register(&self, handler: Arc<dyn XattrHandler<S>>) -> Result<()> {
        if handler.prefix().is_empty() {
            return Err(Error::new(ErrorKind::InvalidInput, "empty handler prefix"));
        }

        let mut handlers = self.handlers.write();
        if handlers.iter().any(|h| same_handler(h, &handler)) {
            return Err(Error::new(ErrorKind::AlreadyRegistered, "handler already linked"));
        }
        if handlers.iter().any(|h| h.prefix() == handler.prefix()) {
            return Err(Error::new(ErrorKind::AlreadyRegistered, "handler prefix already registered"));
        }

        log::debug!("[XATTR] registered handler for {}", handler.prefix());
        handlers.push(handler);
        Ok(())
    }

    /// 注销 handler
    pub fn unregister(&self, handler: &Arc<dyn XattrHandler<S>>) -> Result<()> {
        let mut handlers = self.handlers.write();
        let index = handlers
            .iter()
            .position(|h| same_handler(h, handler))
            .ok_or(Error::new(ErrorKind::NotFound, "handler not registered"))?;
        handlers.remove(index);
        log::debug!("[XATTR] unregistered handler for {}", handler.prefix());
        Ok(())
    }

    /// 按属性名查找 handler（第一个前缀匹配者）
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn XattrHandler<S>>> {
        self.handlers
            .read()
            .iter()
            .find(|h| name.starts_with(h.prefix()))
            .cloned()
    }

    /// 已注册的前缀（按注册顺序）
    pub fn prefixes(&self) -> Vec<String> {
        self.handlers
            .read()
            .iter()
            .map(|h| String::from(h.prefix()))
            .collect()
    }

    /// 已注册 handler 数量
    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }
}

impl<S: ObjectStore> Default for HandlerRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}
