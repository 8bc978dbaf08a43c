use crate::core::{normalize, Matcher};
use crate::error::MatchError;
use crate::models::{
    PersonRecord, RawRecord, RetryPolicy, SearchCriteria, SearchOptions, SearchOutcome,
    SearchSummary, SourceFailure, SourceId,
};
use crate::services::provider::{ProviderRegistry, SourceError, SourceProvider};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use validator::Validate;

/// Outcome of one source task: registration index, source, fetched records
type SourceBatch = (usize, SourceId, Result<Vec<RawRecord>, MatchError>);

/// Fans a search out over registered providers and ranks the merged records
#[derive(Debug, Clone)]
pub struct SearchCoordinator {
    registry: ProviderRegistry,
}

impl SearchCoordinator {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Search the selected sources; an empty selection means every registered source
    pub async fn search(
        &self,
        criteria: &SearchCriteria,
        sources: &[SourceId],
        options: &SearchOptions,
    ) -> Result<SearchOutcome, MatchError> {
        self.search_with_cancel(criteria, sources, options, &CancellationToken::new())
            .await
    }

    /// Search with cooperative cancellation
    ///
    /// When `cancel` fires, in-flight fetches are aborted, no matching is
    /// done and the call returns [`MatchError::Cancelled`].
    pub async fn search_with_cancel(
        &self,
        criteria: &SearchCriteria,
        sources: &[SourceId],
        options: &SearchOptions,
        cancel: &CancellationToken,
    ) -> Result<SearchOutcome, MatchError> {
        options.validate()?;
        criteria.check()?;
        if cancel.is_cancelled() {
            return Err(MatchError::Cancelled);
        }

        let started = Instant::now();
        let mut summary = SearchSummary {
            started_at: Some(chrono::Utc::now()),
            ..Default::default()
        };

        let selected = self.select(sources);
        info!(
            "Starting search across {} sources: {:?}",
            selected.len(),
            selected.iter().map(SourceId::as_str).collect::<Vec<_>>()
        );

        // Stage 1: fan out, one task per source
        let shared_criteria = Arc::new(criteria.clone());
        let mut tasks: JoinSet<SourceBatch> = JoinSet::new();
        let mut pending: HashSet<SourceId> = HashSet::new();

        for (index, id) in selected.iter().enumerate() {
            summary.sources_queried.push(id.clone());

            let provider = match self.registry.get(id) {
                Some(provider) if provider.is_available() => provider,
                Some(_) => {
                    warn!("Source {} is not available", id);
                    summary.sources_failed.push(failure(id, "source is not available"));
                    continue;
                }
                None => {
                    warn!("Source {} is not registered", id);
                    summary.sources_failed.push(failure(id, "source is not registered"));
                    continue;
                }
            };

            pending.insert(id.clone());
            let id = id.clone();
            let criteria = Arc::clone(&shared_criteria);
            let timeout = options.source_timeout;
            let retry = options.retry;

            tasks.spawn(async move {
                let fetched =
                    tokio::time::timeout(timeout, fetch_with_retry(provider.as_ref(), &criteria, retry))
                        .await;
                let result = match fetched {
                    Ok(Ok(records)) => Ok(records),
                    Ok(Err(err)) => Err(MatchError::SourceUnavailable {
                        source_id: id.clone(),
                        reason: err.to_string(),
                    }),
                    Err(_) => Err(MatchError::SourceUnavailable {
                        source_id: id.clone(),
                        reason: format!("timed out after {:?}", timeout),
                    }),
                };
                (index, id, result)
            });
        }

        // Stage 2: collect; merged by this task only
        let mut batches: Vec<SourceBatch> = Vec::with_capacity(tasks.len());
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tasks.abort_all();
                    info!("Search cancelled with {} sources in flight", tasks.len());
                    return Err(MatchError::Cancelled);
                }
                joined = tasks.join_next() => match joined {
                    Some(Ok(batch)) => {
                        pending.remove(&batch.1);
                        batches.push(batch);
                    }
                    Some(Err(err)) => warn!("Source task failed: {}", err),
                    None => break,
                },
            }
        }

        // Tasks that panicked never reported back
        for id in &selected {
            if pending.contains(id) {
                summary.sources_failed.push(failure(id, "source task failed"));
            }
        }

        // Stage 3: normalize in registration order
        batches.sort_by_key(|(index, _, _)| *index);
        let mut candidates: Vec<PersonRecord> = Vec::new();
        for (_, id, result) in batches {
            match result {
                Ok(raw_records) => {
                    debug!("Source {} returned {} records", id, raw_records.len());
                    for raw in raw_records {
                        match normalize(raw, &id) {
                            Ok(record) => candidates.push(record),
                            Err(err) => {
                                warn!("Dropping record: {}", err);
                                summary.records_dropped += 1;
                            }
                        }
                    }
                    summary.sources_succeeded.push(id);
                }
                Err(err) => {
                    warn!("{}", err);
                    let reason = match err {
                        MatchError::SourceUnavailable { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    summary.sources_failed.push(SourceFailure { source: id, reason });
                }
            }
        }

        if cancel.is_cancelled() {
            return Err(MatchError::Cancelled);
        }

        // Stage 4: match, filter, rank
        let matcher = Matcher::new(options.scoring);
        let ranked = matcher.rank(criteria, candidates, options)?;

        summary.total_candidates = ranked.total_candidates;
        summary.duplicates_removed = ranked.duplicates_removed;
        summary.candidates_skipped = ranked.skipped;
        summary.candidates_above_threshold = ranked.above_threshold;
        summary.elapsed_ms = started.elapsed().as_millis() as u64;

        if summary.all_sources_failed() {
            warn!("All {} selected sources failed", summary.sources_queried.len());
        }
        info!(
            "Search finished in {}ms: {} results, {}/{} sources ok, {} candidates",
            summary.elapsed_ms,
            ranked.matches.len(),
            summary.sources_succeeded.len(),
            summary.sources_queried.len(),
            summary.total_candidates
        );

        Ok(SearchOutcome {
            results: ranked.matches,
            summary,
        })
    }

    /// Fetch one case from one source and normalize it
    ///
    /// `Ok(None)` when the source does not hold the case.
    pub async fn get_record(
        &self,
        source: &SourceId,
        case_id: &str,
        options: &SearchOptions,
    ) -> Result<Option<PersonRecord>, MatchError> {
        options.validate()?;
        let unavailable = |reason: String| MatchError::SourceUnavailable {
            source_id: source.clone(),
            reason,
        };

        let provider = match self.registry.get(source) {
            Some(provider) if provider.is_available() => provider,
            Some(_) => return Err(unavailable("source is not available".to_string())),
            None => return Err(unavailable("source is not registered".to_string())),
        };

        let raw = tokio::time::timeout(options.source_timeout, provider.get_record(case_id))
            .await
            .map_err(|_| unavailable(format!("timed out after {:?}", options.source_timeout)))?
            .map_err(|err| unavailable(err.to_string()))?;

        debug!("Lookup of {}/{} found: {}", source, case_id, raw.is_some());
        raw.map(|raw| normalize(raw, source)).transpose()
    }

    fn select(&self, sources: &[SourceId]) -> Vec<SourceId> {
        // Unavailable providers are still selected so they are reported as failed
        if sources.is_empty() {
            return self.registry.ids();
        }
        let mut seen = HashSet::new();
        sources
            .iter()
            .filter(|id| seen.insert((*id).clone()))
            .cloned()
            .collect()
    }
}

fn failure(id: &SourceId, reason: &str) -> SourceFailure {
    SourceFailure {
        source: id.clone(),
        reason: reason.to_string(),
    }
}

/// Fetch with bounded retries on transient errors
async fn fetch_with_retry(
    provider: &dyn SourceProvider,
    criteria: &SearchCriteria,
    retry: RetryPolicy,
) -> Result<Vec<RawRecord>, SourceError> {
    let mut attempt = 0;
    loop {
        match provider.fetch_candidates(criteria).await {
            Ok(records) => return Ok(records),
            Err(err) if err.is_transient() && attempt < retry.max_retries => {
                attempt += 1;
                let delay = retry.backoff_for(attempt);
                warn!(
                    "Source {} failed ({}), retry {}/{} in {:?}",
                    provider.source_id(),
                    err,
                    attempt,
                    retry.max_retries,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CanonicalCase, Sex};
    use crate::services::sources::StaticSource;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn case(id: &str, sex: &str) -> RawRecord {
        RawRecord::Canonical(CanonicalCase {
            case_id: Some(id.to_string()),
            sex: Some(sex.to_string()),
            ..Default::default()
        })
    }

    /// Fails with a transient error a fixed number of times, then succeeds
    struct FlakySource {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl SourceProvider for FlakySource {
        fn source_id(&self) -> SourceId {
            SourceId::from("Flaky")
        }

        async fn fetch_candidates(
            &self,
            _criteria: &SearchCriteria,
        ) -> Result<Vec<RawRecord>, SourceError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(SourceError::Timeout)
            } else {
                Ok(vec![case("F-1", "Female")])
            }
        }
    }

    fn criteria() -> SearchCriteria {
        SearchCriteria::new().with_sex(Sex::Female)
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_failures() {
        let flaky = Arc::new(FlakySource {
            failures: 2,
            calls: AtomicU32::new(0),
        });
        let coordinator = SearchCoordinator::new(ProviderRegistry::new().with(flaky.clone()));

        let outcome = coordinator
            .search(&criteria(), &[], &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.summary.sources_succeeded, vec![SourceId::from("Flaky")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let flaky = Arc::new(FlakySource {
            failures: 10,
            calls: AtomicU32::new(0),
        });
        let coordinator = SearchCoordinator::new(ProviderRegistry::new().with(flaky.clone()));

        let outcome = coordinator
            .search(&criteria(), &[], &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
        assert!(outcome.results.is_empty());
        assert!(outcome.summary.all_sources_failed());
    }

    #[tokio::test]
    async fn test_unregistered_and_unavailable_sources_reported() {
        let registry = ProviderRegistry::new()
            .with(Arc::new(StaticSource::new("NamUs", vec![case("UP1", "Female")])))
            .with(Arc::new(StaticSource::unavailable("FBIJaneDoe")));
        let coordinator = SearchCoordinator::new(registry);

        let selected = [
            SourceId::from("NamUs"),
            SourceId::from("FBIJaneDoe"),
            SourceId::from("Nowhere"),
            SourceId::from("NamUs"),
        ];
        let outcome = coordinator
            .search(&criteria(), &selected, &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.summary.sources_queried.len(), 3);
        assert_eq!(outcome.summary.sources_succeeded, vec![SourceId::from("NamUs")]);
        assert_eq!(outcome.summary.sources_failed.len(), 2);
        assert_eq!(outcome.results.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_selection_uses_every_registered_source() {
        let registry = ProviderRegistry::new()
            .with(Arc::new(StaticSource::new("NamUs", vec![case("UP1", "Female")])))
            .with(Arc::new(StaticSource::unavailable("FBIJaneDoe")));
        let coordinator = SearchCoordinator::new(registry);

        let outcome = coordinator
            .search(&criteria(), &[], &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(
            outcome.summary.sources_queried,
            vec![SourceId::from("NamUs"), SourceId::from("FBIJaneDoe")]
        );
        assert_eq!(outcome.summary.sources_succeeded, vec![SourceId::from("NamUs")]);
        assert_eq!(outcome.summary.sources_failed.len(), 1);
        assert_eq!(outcome.summary.sources_failed[0].source, SourceId::from("FBIJaneDoe"));
        assert!(!outcome.summary.all_sources_failed());
    }

    #[tokio::test]
    async fn test_empty_registry_is_total_failure() {
        let coordinator = SearchCoordinator::new(ProviderRegistry::new());

        let outcome = coordinator
            .search(&criteria(), &[], &SearchOptions::default())
            .await
            .unwrap();

        assert!(outcome.summary.sources_queried.is_empty());
        assert!(outcome.summary.all_sources_failed());
    }

    #[tokio::test]
    async fn test_get_record_normalizes_single_case() {
        let registry = ProviderRegistry::new()
            .with(Arc::new(StaticSource::new("NamUs", vec![case("UP1", "Female")])))
            .with(Arc::new(StaticSource::unavailable("FBIJaneDoe")));
        let coordinator = SearchCoordinator::new(registry);
        let options = SearchOptions::default();
        let namus = SourceId::from("NamUs");

        let record = coordinator.get_record(&namus, "UP1", &options).await.unwrap().unwrap();
        assert_eq!(record.key(), (namus.clone(), "UP1".to_string()));
        assert_eq!(record.sex, Sex::Female);

        assert!(coordinator.get_record(&namus, "UP2", &options).await.unwrap().is_none());

        for source in ["FBIJaneDoe", "Nowhere"] {
            let err = coordinator
                .get_record(&SourceId::from(source), "UP1", &options)
                .await
                .unwrap_err();
            assert!(matches!(err, MatchError::SourceUnavailable { .. }));
        }
    }

    #[tokio::test]
    async fn test_records_without_case_id_are_dropped() {
        let registry = ProviderRegistry::new().with(Arc::new(StaticSource::new(
            "NamUs",
            vec![case("UP1", "Female"), RawRecord::Canonical(CanonicalCase::default())],
        )));
        let coordinator = SearchCoordinator::new(registry);

        let outcome = coordinator
            .search(&criteria(), &[], &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.summary.records_dropped, 1);
        assert_eq!(outcome.summary.total_candidates, 1);
    }

    #[tokio::test]
    async fn test_invalid_options_rejected() {
        let coordinator = SearchCoordinator::new(ProviderRegistry::new());
        let options = SearchOptions {
            max_results: 0,
            ..SearchOptions::default()
        };

        let err = coordinator.search(&criteria(), &[], &options).await.unwrap_err();
        assert!(matches!(err, MatchError::InvalidOptions(_)));
    }
}
