//! Replays queued field updates against the works API.
//!
//! A pass snapshots the queue, then delivers each update one at a time in
//! insertion order. Delivered updates are removed before the next request is
//! sent; failed ones stay queued untouched for the next pass. Delivery is
//! at-least-once: if the process dies between the server accepting an update
//! and its local removal, the next pass sends it again.

use crate::api::{InspectionPayload, WorksApi};
use crate::models::{PendingUpdate, SyncFailure, SyncReport, WorkListRefresh};
use crate::services::OfflineQueue;
use crate::Result;

/// Drains the offline queue against a [`WorksApi`].
pub struct SyncCoordinator<A> {
    queue: OfflineQueue,
    api: A,
}

impl<A: WorksApi> SyncCoordinator<A> {
    pub const fn new(queue: OfflineQueue, api: A) -> Self {
        Self { queue, api }
    }

    pub const fn queue(&self) -> &OfflineQueue {
        &self.queue
    }

    /// Attempt delivery of every update queued at call time.
    ///
    /// Only a failure to read the queue is returned as an error; per-update
    /// delivery failures are collected in the report. Updates enqueued while
    /// the pass runs are left for the next call.
    pub async fn sync_all(&self) -> Result<SyncReport> {
        let snapshot = self.queue.list_pending().await?;
        let mut report = SyncReport {
            total: snapshot.len(),
            ..SyncReport::default()
        };

        if snapshot.is_empty() {
            tracing::debug!("No pending updates to sync");
            return Ok(report);
        }

        tracing::info!(total = report.total, "Starting offline queue sync");

        for update in &snapshot {
            match self.deliver(update).await {
                Ok(()) => report.delivered += 1,
                Err(failure) => {
                    tracing::warn!(
                        update_id = %failure.update_id,
                        work_id = failure.work_id,
                        detail = %failure.detail,
                        "Pending update not delivered"
                    );
                    report.failures.push(failure);
                }
            }
        }

        report.refresh = self.refresh_works().await;

        tracing::info!(
            delivered = report.delivered,
            total = report.total,
            failed = report.failures.len(),
            "{report}"
        );
        Ok(report)
    }

    /// Send one update and remove it once the server has accepted it.
    async fn deliver(&self, update: &PendingUpdate) -> std::result::Result<(), SyncFailure> {
        let failure = |detail: String| SyncFailure {
            update_id: update.id,
            work_id: update.work_id,
            detail,
        };

        self.api
            .submit_inspection(&InspectionPayload::from_pending(update))
            .await
            .map_err(|error| failure(error.to_string()))?;

        // Still queued after an accepted upload, so the next pass resends it.
        self.queue.remove(update.id).await.map_err(|error| {
            failure(format!(
                "Delivered, but could not be removed from the offline queue and may be sent again: {error}"
            ))
        })
    }

    async fn refresh_works(&self) -> WorkListRefresh {
        match self.api.list_works().await {
            Ok(works) => {
                tracing::debug!(count = works.len(), "Refreshed work list after sync");
                WorkListRefresh::Refreshed(works)
            }
            Err(error) => {
                tracing::warn!("Work list refresh after sync failed: {error}");
                WorkListRefresh::Failed(error.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Coordinates, NewPendingUpdate, PendingUpdateId, Photo, WorkStatus, WorkSummary,
    };
    use crate::Error;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Scripted works API recording every delivered payload.
    #[derive(Default)]
    struct FakeWorksApi {
        failing_work_ids: HashSet<i64>,
        fail_refresh: bool,
        delivered: Mutex<Vec<(i64, WorkStatus, String)>>,
        enqueue_during_submit: Mutex<Option<(OfflineQueue, NewPendingUpdate)>>,
    }

    impl FakeWorksApi {
        fn failing(work_ids: &[i64]) -> Self {
            Self {
                failing_work_ids: work_ids.iter().copied().collect(),
                ..Self::default()
            }
        }

        fn delivered_work_ids(&self) -> Vec<i64> {
            self.delivered
                .lock()
                .unwrap()
                .iter()
                .map(|(work_id, _, _)| *work_id)
                .collect()
        }
    }

    impl WorksApi for FakeWorksApi {
        async fn submit_inspection(&self, payload: &InspectionPayload<'_>) -> crate::Result<()> {
            let late = self.enqueue_during_submit.lock().unwrap().take();
            if let Some((queue, update)) = late {
                queue.enqueue(&update).await?;
            }
            if self.failing_work_ids.contains(&payload.work_id) {
                return Err(Error::Api {
                    status: 500,
                    detail: format!("cannot record inspection for work {}", payload.work_id),
                });
            }
            self.delivered.lock().unwrap().push((
                payload.work_id,
                payload.status,
                payload.remarks.to_string(),
            ));
            Ok(())
        }

        async fn list_works(&self) -> crate::Result<Vec<WorkSummary>> {
            if self.fail_refresh {
                return Err(Error::Network("offline".into()));
            }
            Ok(vec![serde_json::from_str(r#"{"id": 42, "current_status": "Completed"}"#)
                .unwrap()])
        }
    }

    fn sample_update(work_id: i64) -> NewPendingUpdate {
        NewPendingUpdate::new(
            work_id,
            WorkStatus::Completed,
            Coordinates::new(18.9, 81.35),
            Photo::new("site.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF]),
        )
    }

    async fn queue_with(work_ids: &[i64]) -> OfflineQueue {
        let queue = OfflineQueue::open_in_memory().await.unwrap();
        for work_id in work_ids {
            queue.enqueue(&sample_update(*work_id)).await.unwrap();
        }
        queue
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delivers_single_queued_update() {
        let queue = OfflineQueue::open_in_memory().await.unwrap();
        let id = queue.enqueue(&sample_update(42)).await.unwrap();
        assert_eq!(id, PendingUpdateId::new(1));

        let api = FakeWorksApi::default();
        let coordinator = SyncCoordinator::new(queue.clone(), &api);
        let report = coordinator.sync_all().await.unwrap();

        assert_eq!(report.delivered, 1);
        assert_eq!(report.total, 1);
        assert!(report.failures.is_empty());
        assert!(queue.list_pending().await.unwrap().is_empty());
        assert_eq!(
            api.delivered.lock().unwrap().clone(),
            vec![(42, WorkStatus::Completed, String::new())]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delivers_all_when_server_accepts_everything() {
        let queue = queue_with(&[1, 2, 3, 4]).await;
        let api = FakeWorksApi::default();

        let report = SyncCoordinator::new(queue.clone(), &api)
            .sync_all()
            .await
            .unwrap();

        assert_eq!((report.delivered, report.total), (4, 4));
        assert!(report.is_complete());
        assert_eq!(queue.pending_count().await.unwrap(), 0);
        assert_eq!(api.delivered_work_ids(), vec![1, 2, 3, 4]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn partial_failure_keeps_failed_update_and_continues() {
        let queue = queue_with(&[1, 2, 3]).await;
        let before = queue.list_pending().await.unwrap();
        let api = FakeWorksApi::failing(&[2]);

        let coordinator = SyncCoordinator::new(queue, &api);
        let report = coordinator.sync_all().await.unwrap();

        assert_eq!((report.delivered, report.total), (2, 3));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].work_id, 2);
        assert_eq!(report.failures[0].update_id, before[1].id);
        assert!(report.failures[0].detail.contains("HTTP 500"));
        assert_eq!(api.delivered_work_ids(), vec![1, 3]);

        let remaining = coordinator.queue().list_pending().await.unwrap();
        assert_eq!(remaining, vec![before[1].clone()]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_update_is_delivered_on_later_pass() {
        let queue = queue_with(&[7]).await;

        let failing = FakeWorksApi::failing(&[7]);
        let first = SyncCoordinator::new(queue.clone(), &failing)
            .sync_all()
            .await
            .unwrap();
        assert_eq!(first.delivered, 0);
        assert_eq!(queue.pending_count().await.unwrap(), 1);

        let healthy = FakeWorksApi::default();
        let second = SyncCoordinator::new(queue.clone(), &healthy)
            .sync_all()
            .await
            .unwrap();
        assert_eq!((second.delivered, second.total), (1, 1));
        assert_eq!(queue.pending_count().await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn update_enqueued_mid_pass_waits_for_next_pass() {
        let queue = queue_with(&[1]).await;
        let api = FakeWorksApi {
            enqueue_during_submit: Mutex::new(Some((queue.clone(), sample_update(99)))),
            ..FakeWorksApi::default()
        };
        let coordinator = SyncCoordinator::new(queue.clone(), &api);

        let report = coordinator.sync_all().await.unwrap();
        assert_eq!((report.delivered, report.total), (1, 1));

        let pending = queue.list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].work_id, 99);

        let next = coordinator.sync_all().await.unwrap();
        assert_eq!((next.delivered, next.total), (1, 1));
        assert!(queue.list_pending().await.unwrap().is_empty());
        assert_eq!(api.delivered_work_ids(), vec![1, 99]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn empty_queue_skips_refresh() {
        let queue = OfflineQueue::open_in_memory().await.unwrap();
        let api = FakeWorksApi::default();

        let report = SyncCoordinator::new(queue, &api).sync_all().await.unwrap();

        assert_eq!((report.delivered, report.total), (0, 0));
        assert_eq!(report.refresh, WorkListRefresh::Skipped);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn refreshes_work_list_even_when_all_fail() {
        let queue = queue_with(&[1, 2]).await;
        let api = FakeWorksApi::failing(&[1, 2]);

        let report = SyncCoordinator::new(queue, &api).sync_all().await.unwrap();

        assert_eq!(report.delivered, 0);
        assert_eq!(report.failures.len(), 2);
        assert!(matches!(report.refresh, WorkListRefresh::Refreshed(ref works) if works.len() == 1));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn refresh_failure_does_not_fail_sync() {
        let queue = queue_with(&[1]).await;
        let api = FakeWorksApi {
            fail_refresh: true,
            ..FakeWorksApi::default()
        };

        let report = SyncCoordinator::new(queue, &api).sync_all().await.unwrap();

        assert_eq!(report.delivered, 1);
        assert!(matches!(report.refresh, WorkListRefresh::Failed(_)));
    }
}
