use crate::compiler::{compile_list, CompiledRule, RuleIdAllocator};
use crate::config::Config;
use crate::error::SyncError;
use crate::fetch::FilterFetcher;
use crate::state::{now_millis, CustomFilter, ListSource, SyncState, Timestamp};
use crate::store::RuleStore;
use futures::{stream, StreamExt};
use std::ops::Range;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    FetchingAndCompiling,
    Committing,
}

/// Result of one completed pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Metadata of every source touched this pass. Empty on the disable path.
    pub lists: Vec<ListSource>,
    pub committed_rules: usize,
    pub synced_at: Timestamp,
}

/// Runs one fetch-compile-commit pass against the rule store.
///
/// Passes must not overlap; [`super::SyncService`] serializes them.
pub struct SyncOrchestrator {
    fetcher: Arc<dyn FilterFetcher>,
    rules: Arc<dyn RuleStore>,
    max_rules: usize,
    first_rule_id: u32,
    concurrent_downloads: usize,
    phase: watch::Sender<SyncPhase>,
}

struct SourceSlot {
    list: ListSource,
    range: Option<Range<usize>>,
}

impl SyncOrchestrator {
    pub fn new(
        config: &Config,
        fetcher: Arc<dyn FilterFetcher>,
        rules: Arc<dyn RuleStore>,
    ) -> Self {
        let (phase, _) = watch::channel(SyncPhase::Idle);
        Self {
            fetcher,
            rules,
            max_rules: config.rules.max_rules,
            first_rule_id: config.rules.first_rule_id,
            concurrent_downloads: config.updates.concurrent_downloads.max(1),
            phase,
        }
    }

    pub fn phase(&self) -> SyncPhase {
        *self.phase.borrow()
    }

    pub async fn run(&self, state: &SyncState) -> Result<SyncOutcome, SyncError> {
        let result = if state.protection_enabled {
            self.sync(state).await
        } else {
            self.clear().await
        };
        self.phase.send_replace(SyncPhase::Idle);
        result
    }

    async fn clear(&self) -> Result<SyncOutcome, SyncError> {
        info!("Protection disabled, clearing all rules");
        self.phase.send_replace(SyncPhase::Committing);
        self.commit(&[]).await?;
        Ok(SyncOutcome {
            lists: Vec::new(),
            committed_rules: 0,
            synced_at: now_millis(),
        })
    }

    async fn sync(&self, state: &SyncState) -> Result<SyncOutcome, SyncError> {
        self.phase.send_replace(SyncPhase::FetchingAndCompiling);
        let mut ids = RuleIdAllocator::new(self.first_rule_id);

        let (mut aggregate, mut slots) = self.compile_sources(state, &mut ids).await;
        self.compile_custom_filters(&state.custom_filters, &mut ids, &mut aggregate);

        if aggregate.len() > self.max_rules {
            warn!(
                "Compiled {} rules, truncating to the ceiling of {}",
                aggregate.len(),
                self.max_rules
            );
            aggregate.truncate(self.max_rules);
        }

        // Sources cut by truncation report what they actually contributed
        for slot in &mut slots {
            if let Some(range) = &slot.range {
                let kept = range.end.min(aggregate.len()).saturating_sub(range.start);
                slot.list.rule_count = kept;
            }
        }

        self.phase.send_replace(SyncPhase::Committing);
        self.commit(&aggregate).await?;

        info!("Updated dynamic rules: {}", aggregate.len());
        Ok(SyncOutcome {
            lists: slots.into_iter().map(|slot| slot.list).collect(),
            committed_rules: aggregate.len(),
            synced_at: now_millis(),
        })
    }

    /// Fetches enabled sources concurrently and compiles them one at a time in stored order.
    async fn compile_sources(
        &self,
        state: &SyncState,
        ids: &mut RuleIdAllocator,
    ) -> (Vec<CompiledRule>, Vec<SourceSlot>) {
        let mut aggregate = Vec::new();
        let mut slots = Vec::new();

        let enabled: Vec<ListSource> = state
            .lists
            .iter()
            .filter(|list| list.enabled)
            .cloned()
            .collect();

        let fetches = stream::iter(enabled)
            .map(|list| {
                let fetcher = self.fetcher.clone();
                async move {
                    debug!("Fetching list '{}' from {}", list.key, list.url);
                    let result = fetcher.fetch_text(&list.url).await;
                    (list, result)
                }
            })
            .buffered(self.concurrent_downloads);
        futures::pin_mut!(fetches);

        while let Some((list, result)) = fetches.next().await {
            let mut updated = list;
            let range = match result {
                Ok(text) => {
                    let compiled = compile_list(&text, ids, self.max_rules);
                    info!(
                        "Parsed {} rules from '{}' (next id {})",
                        compiled.rules.len(),
                        updated.key,
                        compiled.next_id
                    );
                    updated.record_success(compiled.rules.len(), now_millis());
                    let start = aggregate.len();
                    aggregate.extend(compiled.rules);
                    Some(start..aggregate.len())
                }
                Err(e) => {
                    error!("List refresh failed: {}: {}", updated.key, e);
                    updated.record_failure(e.to_string());
                    None
                }
            };
            let at_ceiling = aggregate.len() >= self.max_rules;
            if at_ceiling {
                warn!(
                    "Rule ceiling of {} reached after '{}', skipping remaining lists",
                    self.max_rules, updated.key
                );
            }
            slots.push(SourceSlot {
                list: updated,
                range,
            });
            if at_ceiling {
                break;
            }
        }

        (aggregate, slots)
    }

    fn compile_custom_filters(
        &self,
        filters: &[CustomFilter],
        ids: &mut RuleIdAllocator,
        aggregate: &mut Vec<CompiledRule>,
    ) {
        let mut compiled = 0;
        for filter in filters.iter().filter(|f| f.enabled) {
            if aggregate.len() >= self.max_rules {
                warn!("Rule ceiling reached, skipping remaining custom filters");
                break;
            }
            // The filter's type decides the action; an `@@` marker is only stripped.
            let expression = filter.expression.trim();
            let body = expression.strip_prefix("@@").unwrap_or(expression);
            let rule = if body.is_empty() {
                None
            } else {
                ids.compile(body, filter.is_allow())
            };
            match rule {
                Some(rule) => {
                    aggregate.push(rule);
                    compiled += 1;
                }
                None => debug!("Skipping unsupported custom filter '{}'", filter.id),
            }
        }
        if compiled > 0 {
            info!("Compiled {} custom filter rules", compiled);
        }
    }

    /// Replaces every live rule with `rules` in one store operation.
    async fn commit(&self, rules: &[CompiledRule]) -> Result<(), SyncError> {
        let existing = self
            .rules
            .current_rule_ids()
            .await
            .map_err(SyncError::StoreCommit)?;
        if existing.is_empty() && rules.is_empty() {
            return Ok(());
        }
        self.rules
            .replace_rules(&existing, rules)
            .await
            .map_err(SyncError::StoreCommit)
    }
}
