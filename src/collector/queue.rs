//! Build queue depth, waits and blocking reasons.

use std::collections::BTreeMap;

use crate::api::{Queue, QueueItem};
use crate::client::JenkinsClient;
use crate::client::html::UNKNOWN;
use crate::collector::{Collector, CollectorError};
use crate::format::format_wait;

/// Items listed individually by default.
const DEFAULT_ITEM_LIMIT: usize = 10;

/// One waiting queue item.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub job_name: String,
    pub wait_time: String,
    pub why_blocked: String,
    pub cause: String,
}

impl QueueEntry {
    pub fn from_item(item: &QueueItem, now_ms: i64) -> Self {
        // The last action carrying causes wins.
        let cause = item
            .actions
            .iter()
            .filter_map(|a| a.causes.first())
            .last()
            .map(|c| {
                c.short_description
                    .clone()
                    .unwrap_or_else(|| UNKNOWN.to_string())
            })
            .unwrap_or_else(|| UNKNOWN.to_string());

        Self {
            job_name: item
                .task
                .as_ref()
                .and_then(|t| t.name.clone())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            wait_time: format_wait((now_ms - item.in_queue_since) as f64),
            why_blocked: item.why.clone().unwrap_or_else(|| "Not blocked".to_string()),
            cause,
        }
    }
}

/// Queue summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueReport {
    pub items_in_queue: usize,
    pub avg_wait_time: String,
    pub blocking_reasons: BTreeMap<String, usize>,
    pub items: Vec<QueueEntry>,
}

impl QueueReport {
    pub fn from_queue(queue: &Queue, now_ms: i64, limit: usize) -> Self {
        let waits: Vec<f64> = queue
            .items
            .iter()
            .map(|i| (now_ms - i.in_queue_since) as f64)
            .collect();
        let avg = if waits.is_empty() {
            0.0
        } else {
            waits.iter().sum::<f64>() / waits.len() as f64
        };

        let mut blocking_reasons = BTreeMap::new();
        for why in queue.items.iter().filter_map(|i| i.why.as_deref()) {
            if !why.is_empty() {
                *blocking_reasons.entry(why.to_string()).or_default() += 1;
            }
        }

        Self {
            items_in_queue: queue.items.len(),
            avg_wait_time: format_wait(avg),
            blocking_reasons,
            items: queue
                .items
                .iter()
                .take(limit)
                .map(|i| QueueEntry::from_item(i, now_ms))
                .collect(),
        }
    }
}

/// Collects [`QueueReport`].
#[derive(Debug, Clone, Copy)]
pub struct QueueCollector {
    item_limit: usize,
}

impl QueueCollector {
    pub fn new() -> Self {
        Self {
            item_limit: DEFAULT_ITEM_LIMIT,
        }
    }

    pub fn with_item_limit(mut self, limit: usize) -> Self {
        self.item_limit = limit;
        self
    }
}

impl Default for QueueCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Collector for QueueCollector {
    type Report = QueueReport;

    fn name(&self) -> &'static str {
        "queue"
    }

    async fn collect(&self, client: &JenkinsClient) -> Result<QueueReport, CollectorError> {
        let queue: Queue = client
            .get_json("queue/api/json")
            .await
            .map_err(|e| CollectorError::context("queue", e))?;
        let now = chrono::Utc::now().timestamp_millis();
        Ok(QueueReport::from_queue(&queue, now, self.item_limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: i64 = 10_000_000;

    fn queue() -> Queue {
        serde_json::from_value(json!({
            "items": [
                {"inQueueSince": NOW - 30_000, "why": "Waiting for next available executor",
                 "task": {"name": "build"},
                 "actions": [{}, {"causes": [{"shortDescription": "Started by user admin"}]}]},
                {"inQueueSince": NOW - 90_000, "why": "Waiting for next available executor",
                 "task": {"name": "deploy"}},
                {"inQueueSince": NOW - 7_200_000, "why": "Build #3 is already in progress"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_from_queue() {
        let report = QueueReport::from_queue(&queue(), NOW, 2);
        assert_eq!(report.items_in_queue, 3);
        assert_eq!(report.avg_wait_time, "40.7 minutes");
        assert_eq!(report.blocking_reasons["Waiting for next available executor"], 2);
        assert_eq!(report.items.len(), 2);

        let first = &report.items[0];
        assert_eq!(first.job_name, "build");
        assert_eq!(first.wait_time, "30.0 seconds");
        assert_eq!(first.cause, "Started by user admin");
        assert_eq!(report.items[1].wait_time, "1.5 minutes");
        assert_eq!(report.items[1].cause, UNKNOWN);
    }

    #[test]
    fn test_empty_queue() {
        let report = QueueReport::from_queue(&Queue::default(), NOW, 10);
        assert_eq!(report.items_in_queue, 0);
        assert_eq!(report.avg_wait_time, "0.0 seconds");
        assert!(report.items.is_empty());
    }

    #[test]
    fn test_entry_defaults() {
        let entry = QueueEntry::from_item(&QueueItem::default(), 0);
        assert_eq!(entry.job_name, UNKNOWN);
        assert_eq!(entry.why_blocked, "Not blocked");
    }
}
