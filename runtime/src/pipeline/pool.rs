//! Bounded-concurrency execution of several runs.

use super::{Pipeline, RunReport};
use crate::feeds::FeedId;
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};

/// Run every feed, at most `max_concurrent` at a time.
///
/// Each run opens its own browser context. Reports come back in the order
/// of `feeds`, whatever order the runs finish in.
pub async fn run_many(
    pipeline: &Pipeline,
    feeds: &[FeedId],
    today: NaiveDate,
    max_concurrent: usize,
) -> Vec<RunReport> {
    let mut reports: Vec<(usize, RunReport)> = stream::iter(feeds.iter().copied().enumerate())
        .map(|(index, feed)| async move { (index, pipeline.run(feed, today).await) })
        .buffer_unordered(max_concurrent.max(1))
        .collect()
        .await;

    reports.sort_by_key(|(index, _)| *index);
    reports.into_iter().map(|(_, report)| report).collect()
}
