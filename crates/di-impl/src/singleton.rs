//! 单例实例缓存
//!
//! 每个实例标识对应一个独立的一次性初始化单元：同一标识的并发解析者
//! 等待首个构造者完成，不同标识之间互不阻塞。
//!
//! 缓存同时维护一张跨线程的等待图：记录每个初始化单元由哪个线程构造、
//! 每个线程正在等待哪个单元。若即将等待的单元最终又在等待当前线程，
//! 说明单例之间存在跨线程的循环依赖，立即返回 [`ResolveError::Cycle`]
//! 而不是永久阻塞。

use autowire_common::{ResolveError, ResolveResult};
use dashmap::DashMap;
use di_abstractions::{Instance, InstanceKey};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::warn;

#[derive(Debug, Default)]
pub struct SingletonCache {
    cells: DashMap<InstanceKey, Arc<OnceCell<Instance>>>,
    waits: Mutex<WaitGraph>,
}

/// 正在构造的单元与等待中的线程
#[derive(Debug, Default)]
struct WaitGraph {
    owners: HashMap<InstanceKey, ThreadId>,
    waiting: HashMap<ThreadId, InstanceKey>,
}

impl WaitGraph {
    /// 登记当前线程将等待 `key`，等待会形成环时返回错误
    fn enter(&mut self, me: ThreadId, key: &InstanceKey) -> ResolveResult<()> {
        let mut chain = vec![key.to_string()];
        let mut current = key;
        // 每个线程至多等待一个单元，链长不会超过等待线程数
        for _ in 0..=self.waiting.len() {
            let Some(owner) = self.owners.get(current) else {
                break;
            };
            if *owner == me {
                return Err(ResolveError::Cycle {
                    chain: chain.join(" -> "),
                });
            }
            let Some(next) = self.waiting.get(owner) else {
                break;
            };
            chain.push(next.to_string());
            current = next;
        }
        self.waiting.insert(me, key.clone());
        Ok(())
    }

    fn own(&mut self, me: ThreadId, key: &InstanceKey) {
        self.waiting.remove(&me);
        self.owners.insert(key.clone(), me);
    }

    fn leave(&mut self, me: ThreadId) {
        self.waiting.remove(&me);
    }
}

/// 构造期间持有单元的所有权，结束时释放
struct Ownership<'a> {
    waits: &'a Mutex<WaitGraph>,
    key: &'a InstanceKey,
}

impl Drop for Ownership<'_> {
    fn drop(&mut self) {
        self.waits.lock().owners.remove(self.key);
    }
}

impl SingletonCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已构造完成的实例
    pub fn get(&self, key: &InstanceKey) -> Option<Instance> {
        self.cells.get(key).and_then(|cell| cell.get().cloned())
    }

    /// 获取实例，不存在时由当前调用者构造
    ///
    /// 构造失败不会被缓存，之后的调用会重新尝试；正在等待该单元的其他
    /// 线程会接手构造。
    pub fn get_or_try_init<F>(&self, key: InstanceKey, init: F) -> ResolveResult<Instance>
    where
        F: FnOnce() -> ResolveResult<Instance>,
    {
        // 分片锁只在取出初始化单元时持有，构造期间不持有
        let cell = self
            .cells
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();
        if let Some(instance) = cell.get() {
            return Ok(instance.clone());
        }

        let me = thread::current().id();
        self.waits.lock().enter(me, &key).map_err(|e| {
            warn!("单例跨线程循环等待: {}", e);
            e
        })?;
        let result = cell
            .get_or_try_init(|| {
                self.waits.lock().own(me, &key);
                let _ownership = Ownership {
                    waits: &self.waits,
                    key: &key,
                };
                init()
            })
            .cloned();
        self.waits.lock().leave(me);
        result
    }

    /// 已构造完成的实例数量
    pub fn len(&self) -> usize {
        self.cells
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
