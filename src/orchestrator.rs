use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::task::AbortHandle;

use broadcast_cache::PartnerCache;
use broadcast_client::PartnerHttpClient;
use broadcast_types::{BroadcastReport, PartnerResponse};

use crate::pool::WorkerPool;

/// The global broadcast budget, independent of per-partner `timeout_ms`.
pub const GLOBAL_DEADLINE: Duration = Duration::from_millis(5000);

/// Fans one UID out to every active partner under a global deadline,
/// racing their responses and terminating as soon as one succeeds.
pub struct Orchestrator {
    cache: Arc<PartnerCache>,
    client: Arc<PartnerHttpClient>,
    pool: Arc<WorkerPool>,
    deadline: Duration,
}

impl Orchestrator {
    pub fn new(cache: Arc<PartnerCache>, client: Arc<PartnerHttpClient>, pool: Arc<WorkerPool>) -> Self {
        Self {
            cache,
            client,
            pool,
            deadline: GLOBAL_DEADLINE,
        }
    }

    #[cfg(test)]
    fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub async fn broadcast(&self, uid: &str) -> BroadcastReport {
        let started = Instant::now();
        let partners = self.cache.active_partners().await;
        if partners.is_empty() {
            return BroadcastReport::no_active_partners(elapsed_ms(started));
        }

        let deadline_at = started + self.deadline;

        let mut pending: FuturesUnordered<tokio::task::JoinHandle<PartnerResponse>> =
            FuturesUnordered::new();
        let mut abort_handles: Vec<AbortHandle> = Vec::with_capacity(partners.len());
        for partner in partners.iter() {
            let partner = partner.clone();
            let client = Arc::clone(&self.client);
            let pool = Arc::clone(&self.pool);
            let uid = uid.to_string();
            let handle = tokio::spawn(async move {
                let _permit = pool.acquire().await;
                client.send(&partner, &uid).await
            });
            abort_handles.push(handle.abort_handle());
            pending.push(handle);
        }

        let mut collected = Vec::with_capacity(partners.len());
        let mut responding_partner: Option<String> = None;

        loop {
            if Instant::now() >= deadline_at || pending.is_empty() {
                break;
            }
            let remaining = deadline_at.saturating_duration_since(Instant::now());
            tokio::select! {
                outcome = pending.next() => {
                    match outcome {
                        None => break,
                        Some(Ok(response)) => {
                            let is_success = response.success;
                            let partner_id = response.partner_id.clone();
                            collected.push(response);
                            if is_success && responding_partner.is_none() {
                                responding_partner = Some(partner_id);
                                break;
                            }
                        }
                        Some(Err(join_error)) => {
                            // Never a partner fault: a panic or abort inside our
                            // own spawned task. Logged and skipped.
                            tracing::error!(error = %join_error, "internal fault polling a partner task");
                        }
                    }
                }
                _ = tokio::time::sleep(remaining) => {
                    break;
                }
            }
        }

        for handle in &abort_handles {
            handle.abort();
        }

        let total_time_ms = elapsed_ms(started);
        match responding_partner {
            Some(id) => BroadcastReport::success(id, collected, total_time_ms),
            None => BroadcastReport::no_success(collected, total_time_ms),
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
