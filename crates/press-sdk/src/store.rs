use std::collections::BTreeSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use press_cache::{FileCache, LocalCache};
use press_registry::{
    Confirmation, LedgerConnector, RegistryClient, RegistryEntry, RegistryLedger,
};
use press_store::{ContentStore, FsConnector};
use press_types::{Address, Article, ArticleDraft, ContentId, Timestamp};
use tracing::{debug, info, warn};

use crate::config::PressConfig;
use crate::error::{ArticleError, ArticleResult};
use crate::policy::ReconciliationPolicy;

/// One read/write path for articles across the content store, the local
/// cache, and the registry.
///
/// - Publishing stores the payload, mirrors it into the cache, then
///   registers the id. Only the store step is fatal before an id exists.
/// - Single reads are cache-first and write through on a miss.
/// - The feed skips entries that cannot be retrieved and reports
///   [`FeedDegraded`](ArticleError::FeedDegraded) only when nothing could be.
pub struct ArticleStore {
    content: ContentStore,
    cache: Arc<dyn LocalCache>,
    registry: RegistryClient,
    reconciliation: ReconciliationPolicy,
    fetch_concurrency: usize,
}

impl ArticleStore {
    pub fn new(
        content: ContentStore,
        cache: Arc<dyn LocalCache>,
        registry: RegistryClient,
        config: &PressConfig,
    ) -> Self {
        Self {
            content,
            cache,
            registry,
            reconciliation: config.reconciliation,
            fetch_concurrency: config.fetch_concurrency.max(1),
        }
    }

    /// Build a store over the filesystem layout under `config.data_dir`,
    /// registering on behalf of `publisher`.
    ///
    /// A data directory first opened on one network refuses every other
    /// network with [`NetworkMismatch`](ArticleError::NetworkMismatch).
    pub fn open(config: &PressConfig, publisher: Address) -> ArticleResult<Self> {
        let timeout = config.network_timeout();
        let chain_id = config.network.chain_id();

        let ledger = RegistryLedger::open_on_chain(&config.registry_path(), chain_id)
            .map_err(ArticleError::RegistryUnavailable)?;
        if ledger.chain_id() != chain_id {
            return Err(ArticleError::NetworkMismatch {
                expected: config.network.name().to_string(),
                actual: ledger.chain_id(),
            });
        }
        let content = ContentStore::new(FsConnector::new(config.content_dir())).with_timeout(timeout);
        let cache = FileCache::open(config.cache_dir()).map_err(ArticleError::Cache)?;
        let registry = RegistryClient::new(
            LedgerConnector::new(Arc::new(ledger), publisher).expect_chain(chain_id),
        )
        .with_timeout(timeout);

        Ok(Self::new(content, Arc::new(cache), registry, config))
    }

    pub fn reconciliation(&self) -> ReconciliationPolicy {
        self.reconciliation
    }

    /// Compose `draft` as an article by `author`, stamped now, and publish it.
    pub async fn publish(&self, draft: ArticleDraft, author: Address) -> ArticleResult<Article> {
        let mut article =
            Article::compose(draft, author, Timestamp::now()).map_err(ArticleError::InvalidDraft)?;
        self.publish_article(&mut article).await?;
        Ok(article)
    }

    /// Publish an already composed article.
    ///
    /// Sets `article.cid` as soon as the content store accepts the payload,
    /// so the id is known even when registration then fails.
    pub async fn publish_article(&self, article: &mut Article) -> ArticleResult<ContentId> {
        article.validate().map_err(ArticleError::InvalidDraft)?;
        let payload = article.to_payload().map_err(ArticleError::Serialization)?;

        let cid = self
            .content
            .put(&payload)
            .await
            .map_err(ArticleError::StoreUnavailable)?;
        article.cid = Some(cid);
        debug!(cid = %cid, bytes = payload.len(), "article stored");

        if let Err(e) = self.cache.write(&cid, &payload) {
            warn!(cid = %cid, error = %e, "cache write failed after publish");
        }

        let confirmation = self
            .registry
            .append(&cid)
            .await
            .map_err(|source| ArticleError::RegistrationFailed { cid, source })?;
        info!(
            cid = %cid,
            seq = confirmation.entry.seq,
            already_registered = confirmation.already_registered,
            "article published"
        );
        Ok(cid)
    }

    /// Register an id whose content is already stored, typically after
    /// [`RegistrationFailed`](ArticleError::RegistrationFailed).
    pub async fn retry_registration(&self, cid: &ContentId) -> ArticleResult<Confirmation> {
        let confirmation = self
            .registry
            .append(cid)
            .await
            .map_err(|source| ArticleError::RegistrationFailed { cid: *cid, source })?;
        info!(cid = %cid, seq = confirmation.entry.seq, "registration retried");
        Ok(confirmation)
    }

    /// Read one article, preferring the local cache.
    pub async fn fetch_one(&self, cid: &ContentId) -> ArticleResult<Article> {
        match self.cache.read(cid) {
            Ok(Some(bytes)) => match Article::from_payload(*cid, &bytes) {
                Ok(article) => {
                    debug!(cid = %cid, "cache hit");
                    return Ok(article);
                }
                Err(e) => warn!(cid = %cid, error = %e, "cached payload undecodable; refetching"),
            },
            Ok(None) => debug!(cid = %cid, "cache miss"),
            Err(e) => warn!(cid = %cid, error = %e, "cache read failed; refetching"),
        }

        let bytes = self
            .content
            .get(cid)
            .await
            .map_err(|source| ArticleError::ArticleUnavailable { cid: *cid, source })?;
        let article = Article::from_payload(*cid, &bytes)
            .map_err(|source| ArticleError::Undecodable { cid: *cid, source })?;

        if let Err(e) = self.cache.write(cid, &bytes) {
            warn!(cid = %cid, error = %e, "cache write-through failed");
        }
        Ok(article)
    }

    /// Every retrievable article in the feed, newest first.
    ///
    /// Entries that fail to load are skipped. An empty listing yields an
    /// empty feed; a non-empty registry listing with nothing retrievable is
    /// [`FeedDegraded`](ArticleError::FeedDegraded) under either policy.
    pub async fn fetch_all(&self) -> ArticleResult<Vec<Article>> {
        let (ids, registered) = self.feed_listing().await?;
        let listed = registered.max(ids.len());
        if listed == 0 {
            return Ok(Vec::new());
        }

        let mut articles: Vec<Article> = stream::iter(ids)
            .map(|cid| async move { (cid, self.fetch_one(&cid).await) })
            .buffered(self.fetch_concurrency)
            .filter_map(|(cid, result)| async move {
                match result {
                    Ok(article) => Some(article),
                    Err(e) => {
                        warn!(cid = %cid, error = %e, "skipping feed entry");
                        None
                    }
                }
            })
            .collect()
            .await;

        if articles.is_empty() {
            warn!(listed, "no listed article could be retrieved");
            return Err(ArticleError::FeedDegraded { listed });
        }

        // Stable: equal timestamps keep listing order.
        articles.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        debug!(listed, returned = articles.len(), "feed assembled");
        Ok(articles)
    }

    /// The ids the feed is built from, per the reconciliation policy.
    pub async fn feed_ids(&self) -> ArticleResult<Vec<ContentId>> {
        Ok(self.feed_listing().await?.0)
    }

    /// Feed ids along with how many ids the registry itself listed.
    async fn feed_listing(&self) -> ArticleResult<(Vec<ContentId>, usize)> {
        match (self.registry.list_all().await, self.reconciliation) {
            (Ok(chain), ReconciliationPolicy::ChainOnly) => {
                let registered = chain.len();
                Ok((chain, registered))
            }
            (Ok(chain), policy) => {
                let registered = chain.len();
                let local = self.local_ids_or_empty();
                Ok((policy.merge(chain, &local), registered))
            }
            (Err(e), ReconciliationPolicy::ChainPlusLocalAdditive) => {
                warn!(error = %e, "registry listing failed; using cached ids");
                Ok((self.local_ids_or_empty().into_iter().collect(), 0))
            }
            (Err(e), ReconciliationPolicy::ChainOnly) => Err(ArticleError::RegistryUnavailable(e)),
        }
    }

    /// Registry attribution for `cid`.
    pub async fn registry_entry(&self, cid: &ContentId) -> ArticleResult<Option<RegistryEntry>> {
        self.registry
            .entry(cid)
            .await
            .map_err(ArticleError::RegistryUnavailable)
    }

    /// Ids currently held in the local cache.
    pub fn cached_ids(&self) -> ArticleResult<BTreeSet<ContentId>> {
        self.cache.list_keys().map_err(ArticleError::Cache)
    }

    /// Release the content store and registry connections.
    pub async fn shutdown(&self) -> ArticleResult<()> {
        self.registry.shutdown();
        self.content
            .shutdown()
            .await
            .map_err(ArticleError::StoreUnavailable)
    }

    fn local_ids_or_empty(&self) -> BTreeSet<ContentId> {
        self.cache.list_keys().unwrap_or_else(|e| {
            warn!(error = %e, "cache listing failed");
            BTreeSet::new()
        })
    }
}

impl std::fmt::Debug for ArticleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArticleStore")
            .field("content", &self.content)
            .field("registry", &self.registry)
            .field("reconciliation", &self.reconciliation)
            .field("fetch_concurrency", &self.fetch_concurrency)
            .finish()
    }
}
