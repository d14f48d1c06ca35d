//! In-memory record of searches and result clicks for the running server.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};

const RECENT_QUERIES: usize = 100;

#[derive(Debug, Clone, Serialize)]
pub struct LoggedQuery {
    pub search_id: u64,
    pub query: String,
    pub terms: usize,
    pub model: String,
    pub hits: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClickedDoc {
    pub pid: String,
    pub clicks: u64,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSnapshot {
    pub total_queries: u64,
    pub total_clicks: u64,
    /// Most clicked first.
    pub clicks: Vec<ClickedDoc>,
    pub recent_queries: Vec<LoggedQuery>,
}

#[derive(Default)]
struct Inner {
    next_search_id: u64,
    total_clicks: u64,
    clicks: HashMap<String, u64>,
    recent: VecDeque<LoggedQuery>,
}

#[derive(Default)]
pub struct SearchLog {
    inner: Mutex<Inner>,
}

impl SearchLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the query and hand out its search id (1-based, sequential).
    pub fn record_query(&self, query: &str, terms: usize, model: &str, hits: usize) -> u64 {
        let mut inner = self.inner.lock();
        inner.next_search_id += 1;
        let search_id = inner.next_search_id;
        if inner.recent.len() == RECENT_QUERIES {
            inner.recent.pop_front();
        }
        inner.recent.push_back(LoggedQuery { search_id, query: query.to_string(), terms, model: model.to_string(), hits });
        search_id
    }

    pub fn record_click(&self, search_id: Option<u64>, pid: &str, rank: Option<usize>) {
        let mut inner = self.inner.lock();
        inner.total_clicks += 1;
        *inner.clicks.entry(pid.to_string()).or_insert(0) += 1;
        tracing::info!(?search_id, pid, ?rank, "result clicked");
    }

    pub fn snapshot(&self) -> AnalyticsSnapshot {
        let inner = self.inner.lock();
        let mut clicks: Vec<ClickedDoc> = inner
            .clicks
            .iter()
            .map(|(pid, &clicks)| ClickedDoc { pid: pid.clone(), clicks })
            .collect();
        clicks.sort_by(|a, b| b.clicks.cmp(&a.clicks).then_with(|| a.pid.cmp(&b.pid)));
        AnalyticsSnapshot {
            total_queries: inner.next_search_id,
            total_clicks: inner.total_clicks,
            clicks,
            recent_queries: inner.recent.iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_ids_are_sequential() {
        let log = SearchLog::new();
        assert_eq!(log.record_query("red shoe", 2, "bm25", 3), 1);
        assert_eq!(log.record_query("shirt", 1, "tfidf", 0), 2);
        let snap = log.snapshot();
        assert_eq!(snap.total_queries, 2);
        assert_eq!(snap.recent_queries[1].query, "shirt");
    }

    #[test]
    fn clicks_are_counted_per_pid() {
        let log = SearchLog::new();
        log.record_click(Some(1), "a", Some(1));
        log.record_click(None, "b", None);
        log.record_click(Some(2), "b", Some(3));
        let snap = log.snapshot();
        assert_eq!(snap.total_clicks, 3);
        assert_eq!(snap.clicks[0].pid, "b");
        assert_eq!(snap.clicks[0].clicks, 2);
    }

    #[test]
    fn recent_queries_are_bounded() {
        let log = SearchLog::new();
        for i in 0..(RECENT_QUERIES + 5) {
            log.record_query(&format!("q{i}"), 1, "bm25", 0);
        }
        let snap = log.snapshot();
        assert_eq!(snap.recent_queries.len(), RECENT_QUERIES);
        assert_eq!(snap.recent_queries[0].search_id, 6);
    }
}
