//! Trade Orchestrator Use Case
//!
//! Entry point for the four trade operations. Writes go to the store first,
//! then the cache; every successful write is handed to the publication
//! dispatcher without waiting for delivery.
//!
//! The store write, cache refresh and dispatch of a mutation run in a
//! spawned task. A caller that goes away mid-write does not leave the cache
//! behind the store or skip the event.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::application::dto::TradeMutationRequest;
use crate::application::errors::TradeError;
use crate::application::services::{CacheState, KeyedLocks, PublicationDispatcher, TradeCache};
use crate::domain::shared::TradeId;
use crate::domain::trade_lifecycle::{RepositoryError, Trade, TradeRepository};
use crate::observability;

/// Use case coordinating the trade store, cache and event publication.
pub struct TradeOrchestrator<R>
where
    R: TradeRepository,
{
    repository: Arc<R>,
    dispatcher: Arc<PublicationDispatcher>,
    cache: Arc<TradeCache>,
    update_locks: Arc<KeyedLocks<TradeId>>,
}

impl<R> TradeOrchestrator<R>
where
    R: TradeRepository,
{
    /// Create a new TradeOrchestrator with a cold cache.
    pub fn new(repository: Arc<R>, dispatcher: Arc<PublicationDispatcher>) -> Self {
        Self {
            repository,
            dispatcher,
            cache: Arc::new(TradeCache::new()),
            update_locks: Arc::new(KeyedLocks::new()),
        }
    }

    /// Record a new trade.
    ///
    /// A caller-supplied id is ignored; the trade gets a fresh one, status
    /// `Initiated` and the current time as its execution timestamp.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an unparseable trade type, `Storage` if the insert
    /// fails. Nothing is cached or published on error.
    pub async fn add(&self, request: TradeMutationRequest) -> Result<Trade, TradeError> {
        if let Some(supplied) = request.target_id() {
            tracing::debug!(supplied_id = %supplied, "Ignoring caller-supplied id on add");
        }

        let trade = Trade::open(request.to_terms()?);
        let trade_id = trade.id().clone();

        let repository = Arc::clone(&self.repository);
        let dispatcher = Arc::clone(&self.dispatcher);
        let cache = Arc::clone(&self.cache);
        let commit = tokio::spawn(async move {
            repository
                .insert(&trade)
                .await
                .map_err(|e| store_failure("insert", trade.id(), e))?;

            tracing::info!(
                trade_id = %trade.id(),
                instrument = %trade.instrument(),
                trade_type = %trade.trade_type(),
                "Trade created"
            );
            observability::record_trade_created();

            dispatcher.dispatch(trade.clone());
            cache.put(trade.clone());
            Ok(trade)
        });

        join_commit("insert", &trade_id, commit).await
    }

    /// Amend an existing trade in place.
    ///
    /// The trade must already be cached by this process. Id, status and
    /// execution timestamp are kept. Updates to the same id run one at a time.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the id is missing, unknown or the trade type does
    /// not parse; `Storage` if the replace fails, in which case the cached
    /// trade is left as it was and nothing is published.
    pub async fn update(&self, request: TradeMutationRequest) -> Result<Trade, TradeError> {
        let id = request.target_id().ok_or_else(|| TradeError::InvalidInput {
            field: "id".to_string(),
            message: "a trade id is required for update".to_string(),
        })?;
        let terms = request.to_terms()?;

        let guard = self.update_locks.lock(id.clone()).await;

        let mut trade = self.cache.get(&id).ok_or_else(|| TradeError::InvalidInput {
            field: "id".to_string(),
            message: format!("trade {id} is not known to this instance"),
        })?;
        trade.amend(terms);

        let repository = Arc::clone(&self.repository);
        let dispatcher = Arc::clone(&self.dispatcher);
        let cache = Arc::clone(&self.cache);
        let commit = tokio::spawn(async move {
            // Held until the cache reflects the write.
            let _guard = guard;

            repository
                .replace(&trade)
                .await
                .map_err(|e| store_failure("replace", trade.id(), e))?;

            tracing::info!(
                trade_id = %trade.id(),
                instrument = %trade.instrument(),
                "Trade updated"
            );
            observability::record_trade_updated();

            dispatcher.dispatch(trade.clone());
            cache.put(trade.clone());
            Ok(trade)
        });

        join_commit("replace", &id, commit).await
    }

    /// Look up one trade, loading the cache from the store if it is cold.
    ///
    /// # Errors
    ///
    /// `NotFound` if no trade has this id; `Storage` if the load fails.
    pub async fn get(&self, id: &TradeId) -> Result<Trade, TradeError> {
        self.ensure_loaded().await?;

        self.cache.get(id).ok_or_else(|| TradeError::NotFound {
            trade_id: id.clone(),
        })
    }

    /// All trades, ordered by execution timestamp then id.
    ///
    /// # Errors
    ///
    /// `Storage` if the cache is cold and the load fails.
    pub async fn get_all(&self) -> Result<Vec<Trade>, TradeError> {
        self.ensure_loaded().await?;
        Ok(self.cache.snapshot())
    }

    /// Current cache load state.
    pub fn cache_state(&self) -> CacheState {
        self.cache.state()
    }

    async fn ensure_loaded(&self) -> Result<(), TradeError> {
        let repository = &self.repository;
        self.cache
            .ensure_loaded(|| repository.load_all())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to load trades from store");
                observability::record_store_error("load_all");
                TradeError::Storage(e)
            })?;
        Ok(())
    }
}

/// Wait for a spawned write; a panic in it is re-raised here.
async fn join_commit(
    operation: &'static str,
    trade_id: &TradeId,
    commit: JoinHandle<Result<Trade, TradeError>>,
) -> Result<Trade, TradeError> {
    match commit.await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => {
            tracing::error!(
                trade_id = %trade_id,
                operation,
                error = %e,
                "Trade write task cancelled"
            );
            Err(TradeError::Interrupted {
                operation,
                trade_id: trade_id.clone(),
            })
        }
    }
}

fn store_failure(operation: &'static str, trade_id: &TradeId, error: RepositoryError) -> TradeError {
    tracing::error!(
        trade_id = %trade_id,
        operation,
        error = %error,
        "Trade store operation failed"
    );
    observability::record_store_error(operation);
    TradeError::Storage(error)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::application::ports::{EventPublishError, EventPublisherPort};
    use crate::application::services::DispatcherConfig;
    use crate::domain::shared::{CustomerId, Timestamp};
    use crate::domain::trade_lifecycle::repository::MockTradeRepository;
    use crate::domain::trade_lifecycle::{
        ReconstitutedTradeParams, TradeStatus, TradeTerms, TradeType,
    };

    #[derive(Default)]
    struct RecordingPublisher {
        published: Mutex<Vec<Trade>>,
    }

    #[async_trait]
    impl EventPublisherPort for RecordingPublisher {
        async fn publish_trade(&self, trade: &Trade) -> Result<(), EventPublishError> {
            self.published.lock().push(trade.clone());
            Ok(())
        }
    }

    struct Harness {
        orchestrator: Arc<TradeOrchestrator<MockTradeRepository>>,
        dispatcher: Arc<PublicationDispatcher>,
        publisher: Arc<RecordingPublisher>,
    }

    impl Harness {
        fn new(repository: MockTradeRepository) -> Self {
            let publisher = Arc::new(RecordingPublisher::default());
            let dispatcher = Arc::new(PublicationDispatcher::spawn(
                Arc::clone(&publisher) as Arc<dyn EventPublisherPort>,
                DispatcherConfig::default(),
            ));
            let orchestrator = Arc::new(TradeOrchestrator::new(
                Arc::new(repository),
                Arc::clone(&dispatcher),
            ));
            Self {
                orchestrator,
                dispatcher,
                publisher,
            }
        }

        async fn published(&self) -> Vec<Trade> {
            assert!(self.dispatcher.shutdown(Duration::from_secs(1)).await);
            self.publisher.published.lock().clone()
        }
    }

    fn request() -> TradeMutationRequest {
        TradeMutationRequest {
            id: None,
            customer_id: "user01".to_string(),
            instrument: "ABC".to_string(),
            trade_type: "buy".to_string(),
            quantity: dec!(15),
            price: dec!(100),
            settlement_timestamp: None,
            currency: "USD".to_string(),
            counterparty: "broker".to_string(),
            fees: None,
        }
    }

    fn amendment(id: &TradeId) -> TradeMutationRequest {
        TradeMutationRequest {
            id: Some(id.to_string()),
            instrument: "XYZ".to_string(),
            trade_type: "SELL".to_string(),
            quantity: dec!(10),
            price: dec!(55),
            fees: Some(dec!(1.25)),
            ..request()
        }
    }

    fn stored_trade(id: &str, executed_at: &str) -> Trade {
        Trade::reconstitute(ReconstitutedTradeParams {
            id: TradeId::new(id),
            status: TradeStatus::Initiated,
            execution_timestamp: Timestamp::parse(executed_at).unwrap(),
            terms: TradeTerms {
                customer_id: CustomerId::new("user01"),
                instrument: "ABC".to_string(),
                trade_type: TradeType::Buy,
                quantity: dec!(1),
                price: dec!(1),
                settlement_timestamp: None,
                currency: "USD".to_string(),
                counterparty: "broker".to_string(),
                fees: Decimal::ZERO,
            },
        })
    }

    #[tokio::test]
    async fn add_persists_caches_and_publishes() {
        let mut repo = MockTradeRepository::new();
        repo.expect_insert().times(1).returning(|_| Ok(()));
        repo.expect_load_all().times(1).returning(|| Ok(Vec::new()));
        let h = Harness::new(repo);

        let trade = h.orchestrator.add(request()).await.unwrap();

        assert_eq!(trade.status(), TradeStatus::Initiated);
        assert_eq!(trade.trade_type(), TradeType::Buy);
        assert_eq!(trade.fees(), Decimal::ZERO);
        assert!(trade.settlement_timestamp().is_none());

        let fetched = h.orchestrator.get(trade.id()).await.unwrap();
        assert_eq!(fetched, trade);

        let published = h.published().await;
        assert_eq!(published, vec![trade]);
    }

    #[tokio::test]
    async fn add_ignores_supplied_id() {
        let mut repo = MockTradeRepository::new();
        repo.expect_insert().times(1).returning(|_| Ok(()));
        let h = Harness::new(repo);

        let req = TradeMutationRequest {
            id: Some("caller-chosen".to_string()),
            ..request()
        };
        let trade = h.orchestrator.add(req).await.unwrap();

        assert_ne!(trade.id().as_str(), "caller-chosen");
    }

    #[tokio::test]
    async fn add_with_invalid_trade_type_touches_nothing() {
        let mut repo = MockTradeRepository::new();
        repo.expect_insert().times(0);
        let h = Harness::new(repo);

        let req = TradeMutationRequest {
            trade_type: "hold".to_string(),
            ..request()
        };
        let err = h.orchestrator.add(req).await.unwrap_err();

        assert!(err.is_input_error());
        assert!(h.published().await.is_empty());
    }

    #[tokio::test]
    async fn add_store_failure_skips_cache_and_publish() {
        let mut repo = MockTradeRepository::new();
        repo.expect_insert()
            .times(1)
            .returning(|_| Err(RepositoryError::Connection("refused".to_string())));
        repo.expect_load_all().times(1).returning(|| Ok(Vec::new()));
        let h = Harness::new(repo);

        let err = h.orchestrator.add(request()).await.unwrap_err();
        assert!(matches!(err, TradeError::Storage(_)));

        assert!(h.orchestrator.get_all().await.unwrap().is_empty());
        assert!(h.published().await.is_empty());
    }

    #[tokio::test]
    async fn update_applies_terms_and_keeps_identity() {
        let mut repo = MockTradeRepository::new();
        repo.expect_insert().times(1).returning(|_| Ok(()));
        repo.expect_replace()
            .withf(|t| t.instrument() == "XYZ" && t.trade_type() == TradeType::Sell)
            .times(1)
            .returning(|_| Ok(()));
        let h = Harness::new(repo);

        let created = h.orchestrator.add(request()).await.unwrap();
        let updated = h.orchestrator.update(amendment(created.id())).await.unwrap();

        assert_eq!(updated.id(), created.id());
        assert_eq!(updated.execution_timestamp(), created.execution_timestamp());
        assert_eq!(updated.status(), TradeStatus::Initiated);
        assert_eq!(updated.instrument(), "XYZ");
        assert_eq!(updated.quantity(), dec!(10));
        assert_eq!(updated.fees(), dec!(1.25));

        let published = h.published().await;
        assert_eq!(published.len(), 2);
        assert_eq!(published[1], updated);
    }

    #[tokio::test]
    async fn update_without_id_is_input_error() {
        let mut repo = MockTradeRepository::new();
        repo.expect_replace().times(0);
        let h = Harness::new(repo);

        let err = h.orchestrator.update(request()).await.unwrap_err();
        assert!(err.is_input_error());

        let blank = TradeMutationRequest {
            id: Some(" ".to_string()),
            ..request()
        };
        assert!(h.orchestrator.update(blank).await.unwrap_err().is_input_error());
    }

    #[tokio::test]
    async fn update_of_uncached_trade_is_input_error() {
        let mut repo = MockTradeRepository::new();
        repo.expect_replace().times(0);
        repo.expect_load_all().times(0);
        let h = Harness::new(repo);

        let err = h
            .orchestrator
            .update(amendment(&TradeId::new("missing")))
            .await
            .unwrap_err();

        assert!(err.is_input_error());
        assert!(err.to_string().contains("missing"));
        assert!(h.published().await.is_empty());
    }

    #[tokio::test]
    async fn update_with_invalid_trade_type_leaves_trade_untouched() {
        let mut repo = MockTradeRepository::new();
        repo.expect_insert().times(1).returning(|_| Ok(()));
        repo.expect_replace().times(0);
        repo.expect_load_all().times(1).returning(|| Ok(Vec::new()));
        let h = Harness::new(repo);

        let created = h.orchestrator.add(request()).await.unwrap();
        let req = TradeMutationRequest {
            trade_type: "short".to_string(),
            ..amendment(created.id())
        };
        assert!(h.orchestrator.update(req).await.unwrap_err().is_input_error());

        assert_eq!(h.orchestrator.get(created.id()).await.unwrap(), created);
    }

    #[tokio::test]
    async fn update_store_failure_keeps_cached_version() {
        let mut repo = MockTradeRepository::new();
        repo.expect_insert().times(1).returning(|_| Ok(()));
        repo.expect_replace()
            .times(1)
            .returning(|t| Err(RepositoryError::NotFound {
                trade_id: t.id().to_string(),
            }));
        repo.expect_load_all().times(1).returning(|| Ok(Vec::new()));
        let h = Harness::new(repo);

        let created = h.orchestrator.add(request()).await.unwrap();
        let err = h.orchestrator.update(amendment(created.id())).await.unwrap_err();
        assert!(matches!(err, TradeError::Storage(_)));

        assert_eq!(h.orchestrator.get(created.id()).await.unwrap(), created);
        assert_eq!(h.published().await, vec![created]);
    }

    #[tokio::test]
    async fn concurrent_updates_to_one_trade_all_apply() {
        let mut repo = MockTradeRepository::new();
        repo.expect_insert().times(1).returning(|_| Ok(()));
        repo.expect_replace().times(10).returning(|_| Ok(()));
        let h = Harness::new(repo);

        let created = h.orchestrator.add(request()).await.unwrap();

        let mut handles = Vec::new();
        for qty in 1..=10_i64 {
            let orchestrator = Arc::clone(&h.orchestrator);
            let req = TradeMutationRequest {
                quantity: Decimal::from(qty),
                ..amendment(created.id())
            };
            handles.push(tokio::spawn(async move { orchestrator.update(req).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let published = h.published().await;
        assert_eq!(published.len(), 11);
        assert!(published.iter().all(|t| t.id() == created.id()));
    }

    #[tokio::test]
    async fn get_all_loads_store_once_and_sorts() {
        let mut repo = MockTradeRepository::new();
        repo.expect_load_all().times(1).returning(|| {
            Ok(vec![
                stored_trade("b", "2026-01-02T00:00:00Z"),
                stored_trade("a", "2026-01-01T00:00:00Z"),
            ])
        });
        let h = Harness::new(repo);
        assert_eq!(h.orchestrator.cache_state(), CacheState::Uninitialized);

        let first = h.orchestrator.get_all().await.unwrap();
        let second = h.orchestrator.get_all().await.unwrap();

        let ids: Vec<&str> = first.iter().map(|t| t.id().as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(first, second);
        assert_eq!(h.orchestrator.cache_state(), CacheState::Loaded);
    }

    #[tokio::test]
    async fn concurrent_cold_reads_share_one_load() {
        let mut repo = MockTradeRepository::new();
        repo.expect_load_all()
            .times(1)
            .returning(|| Ok(vec![stored_trade("a", "2026-01-01T00:00:00Z")]));
        let h = Harness::new(repo);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let orchestrator = Arc::clone(&h.orchestrator);
            handles.push(tokio::spawn(async move { orchestrator.get_all().await }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().len(), 1);
        }
    }

    #[tokio::test]
    async fn get_of_unknown_id_is_not_found() {
        let mut repo = MockTradeRepository::new();
        repo.expect_load_all().times(1).returning(|| Ok(Vec::new()));
        let h = Harness::new(repo);

        let err = h.orchestrator.get(&TradeId::new("nope")).await.unwrap_err();
        assert!(matches!(err, TradeError::NotFound { .. }));
    }

    #[tokio::test]
    async fn failed_load_is_retried_by_next_read() {
        let mut repo = MockTradeRepository::new();
        let mut first = true;
        repo.expect_load_all().times(2).returning(move || {
            if std::mem::take(&mut first) {
                Err(RepositoryError::Connection("down".to_string()))
            } else {
                Ok(vec![stored_trade("a", "2026-01-01T00:00:00Z")])
            }
        });
        let h = Harness::new(repo);

        let err = h.orchestrator.get_all().await.unwrap_err();
        assert!(matches!(err, TradeError::Storage(_)));
        assert_eq!(h.orchestrator.cache_state(), CacheState::Uninitialized);

        assert_eq!(h.orchestrator.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn add_before_first_load_survives_merge() {
        let mut repo = MockTradeRepository::new();
        repo.expect_insert().times(1).returning(|_| Ok(()));
        repo.expect_load_all()
            .times(1)
            .returning(|| Ok(vec![stored_trade("old", "2020-01-01T00:00:00Z")]));
        let h = Harness::new(repo);

        let created = h.orchestrator.add(request()).await.unwrap();
        let all = h.orchestrator.get_all().await.unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id().as_str(), "old");
        assert_eq!(&all[1], &created);
    }

    /// Store whose writes land immediately but whose calls return late.
    #[derive(Default)]
    struct StallingStore {
        trades: Mutex<HashMap<TradeId, Trade>>,
        stall: Duration,
    }

    impl StallingStore {
        fn new(stall: Duration) -> Self {
            Self {
                stall,
                ..Self::default()
            }
        }

        fn stored(&self, id: &TradeId) -> Option<Trade> {
            self.trades.lock().get(id).cloned()
        }
    }

    #[async_trait]
    impl TradeRepository for StallingStore {
        async fn insert(&self, trade: &Trade) -> Result<(), RepositoryError> {
            self.trades.lock().insert(trade.id().clone(), trade.clone());
            tokio::time::sleep(self.stall).await;
            Ok(())
        }

        async fn replace(&self, trade: &Trade) -> Result<(), RepositoryError> {
            self.trades.lock().insert(trade.id().clone(), trade.clone());
            tokio::time::sleep(self.stall).await;
            Ok(())
        }

        async fn load_all(&self) -> Result<Vec<Trade>, RepositoryError> {
            Ok(self.trades.lock().values().cloned().collect())
        }
    }

    fn stalling_orchestrator(
        store: &Arc<StallingStore>,
    ) -> (
        TradeOrchestrator<StallingStore>,
        Arc<PublicationDispatcher>,
        Arc<RecordingPublisher>,
    ) {
        let publisher = Arc::new(RecordingPublisher::default());
        let dispatcher = Arc::new(PublicationDispatcher::spawn(
            Arc::clone(&publisher) as Arc<dyn EventPublisherPort>,
            DispatcherConfig::default(),
        ));
        let orchestrator = TradeOrchestrator::new(Arc::clone(store), Arc::clone(&dispatcher));
        (orchestrator, dispatcher, publisher)
    }

    #[tokio::test]
    async fn abandoned_update_still_refreshes_cache_and_publishes() {
        let store = Arc::new(StallingStore::new(Duration::from_millis(100)));
        let (orchestrator, dispatcher, publisher) = stalling_orchestrator(&store);

        let created = tokio::time::timeout(Duration::from_secs(2), orchestrator.add(request()))
            .await
            .unwrap()
            .unwrap();
        orchestrator.get_all().await.unwrap();
        assert_eq!(orchestrator.cache_state(), CacheState::Loaded);

        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            orchestrator.update(amendment(created.id())),
        )
        .await;
        assert!(abandoned.is_err());

        // The next update on the id waits for the abandoned one to finish.
        let follow_up = TradeMutationRequest {
            counterparty: "dealer".to_string(),
            ..amendment(created.id())
        };
        orchestrator.update(follow_up).await.unwrap();

        let cached = orchestrator.get(created.id()).await.unwrap();
        assert_eq!(cached.instrument(), "XYZ");
        assert_eq!(cached.counterparty(), "dealer");
        assert_eq!(store.stored(created.id()).unwrap(), cached);

        assert!(dispatcher.shutdown(Duration::from_secs(1)).await);
        let published = publisher.published.lock().clone();
        assert_eq!(published.len(), 3);
        assert_eq!(published[1].instrument(), "XYZ");
        assert_eq!(published[1].counterparty(), "broker");
    }

    #[tokio::test]
    async fn abandoned_add_still_reaches_warm_cache() {
        let store = Arc::new(StallingStore::new(Duration::from_millis(50)));
        let (orchestrator, dispatcher, publisher) = stalling_orchestrator(&store);
        orchestrator.get_all().await.unwrap();

        let abandoned =
            tokio::time::timeout(Duration::from_millis(5), orchestrator.add(request())).await;
        assert!(abandoned.is_err());

        let mut cached = Vec::new();
        for _ in 0..100 {
            cached = orchestrator.get_all().await.unwrap();
            if !cached.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(cached.len(), 1);
        assert_eq!(store.stored(cached[0].id()).unwrap(), cached[0]);

        assert!(dispatcher.shutdown(Duration::from_secs(1)).await);
        assert_eq!(publisher.published.lock().len(), 1);
    }
}
