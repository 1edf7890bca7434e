//! 读模型仓储（ReadModelRepository）
//!
//! 读模型是由事件处理器维护的单文档视图：`get` 读取当前文档（可能尚不存在），
//! `save` 整体覆盖（后写者胜出）。
//!
use crate::error::DomainResult;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

#[async_trait]
pub trait ReadModelRepository<M>: Send + Sync
where
    M: Send + Sync + 'static,
{
    async fn get(&self) -> DomainResult<Option<M>>;

    async fn save(&self, model: M) -> DomainResult<()>;
}

#[async_trait]
impl<M, T> ReadModelRepository<M> for Arc<T>
where
    M: Send + Sync + 'static,
    T: ReadModelRepository<M> + ?Sized,
{
    async fn get(&self) -> DomainResult<Option<M>> {
        (**self).get().await
    }

    async fn save(&self, model: M) -> DomainResult<()> {
        (**self).save(model).await
    }
}

/// 内存版读模型仓储
#[derive(Debug)]
pub struct InMemoryReadModelRepository<M> {
    model: RwLock<Option<M>>,
}

impl<M> Default for InMemoryReadModelRepository<M> {
    fn default() -> Self {
        Self {
            model: RwLock::new(None),
        }
    }
}

impl<M> InMemoryReadModelRepository<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(model: M) -> Self {
        Self {
            model: RwLock::new(Some(model)),
        }
    }
}

#[async_trait]
impl<M> ReadModelRepository<M> for InMemoryReadModelRepository<M>
where
    M: Clone + Send + Sync + 'static,
{
    async fn get(&self) -> DomainResult<Option<M>> {
        Ok(self.model.read().await.clone())
    }

    async fn save(&self, model: M) -> DomainResult<()> {
        *self.model.write().await = Some(model);
        Ok(())
    }
}
