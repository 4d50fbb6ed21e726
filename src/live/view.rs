//! View loops
//!
//! Each view owns its aggregator and consumes exactly one feed, so the
//! window it renders has a single writer. A view ends when its feed stops;
//! its window is dropped with it.

use chrono::{DateTime, Local};
use tracing::{debug, error, info};

use super::aggregator::{IngestOutcome, LiveAggregator, LiveTotals};
use super::poller::FeedHandle;
use super::selection::SelectionStore;
use super::summary::FleetSummary;
use crate::render::LiveSink;

/// Name of the total-energy view (30 points by default)
pub const TOTAL_VIEW: &str = "total";

/// Name of the solar/grid trend view (60 points by default)
pub const TREND_VIEW: &str = "trend";

type Clock = Box<dyn Fn() -> DateTime<Local> + Send>;

pub struct WindowView {
    name: String,
    aggregator: LiveAggregator,
    clock: Clock,
}

impl WindowView {
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self::with_clock(name, capacity, Local::now)
    }

    pub fn with_clock<F>(name: impl Into<String>, capacity: usize, clock: F) -> Self
    where
        F: Fn() -> DateTime<Local> + Send + 'static,
    {
        Self {
            name: name.into(),
            aggregator: LiveAggregator::new(capacity),
            clock: Box::new(clock),
        }
    }

    pub fn aggregator(&self) -> &LiveAggregator {
        &self.aggregator
    }

    /// Fold snapshots from `feed` until it stops, rendering every appended point.
    ///
    /// Ticks that leave the window alone still render their totals when they
    /// differ from the last rendered ones.
    ///
    /// Returns the number of points appended over the view's lifetime.
    pub async fn run<S: LiveSink + ?Sized>(&mut self, mut feed: FeedHandle, sink: &S) -> u64 {
        info!("View '{}' started on feed '{}'", self.name, feed.name());
        let mut appended = 0;
        let mut last_totals: Option<LiveTotals> = None;

        while let Some(snapshot) = feed.next().await {
            let outcome = self.aggregator.ingest_at(&snapshot, (self.clock)());
            let Some(totals) = self.aggregator.totals().copied() else {
                continue;
            };

            let rendered = match outcome {
                IngestOutcome::Appended => {
                    appended += 1;
                    sink.window_updated(
                        &self.name,
                        self.aggregator.window(),
                        &totals,
                        last_totals.as_ref(),
                    )
                }
                IngestOutcome::Duplicate | IngestOutcome::Empty => {
                    debug!("View '{}' window unchanged ({:?})", self.name, outcome);
                    if last_totals == Some(totals) {
                        continue;
                    }
                    sink.totals_updated(&self.name, &totals, last_totals.as_ref())
                }
            };
            if let Err(e) = rendered {
                error!("View '{}' failed to render: {}", self.name, e);
            }
            last_totals = Some(totals);
        }

        info!(
            "View '{}' stopped after {} points",
            self.name, appended
        );
        appended
    }
}

/// Render the fleet summary for every snapshot and every selection change.
///
/// Unchanged summaries are not rendered again.
pub async fn run_fleet_view<S: LiveSink + ?Sized>(
    mut feed: FeedHandle,
    selection: SelectionStore,
    sink: &S,
) {
    info!("Fleet view started on feed '{}'", feed.name());
    let mut selection_rx = selection.subscribe();
    let mut last_fleet: Option<FleetSummary> = None;

    loop {
        let snapshot = tokio::select! {
            next = feed.next() => match next {
                Some(snapshot) => snapshot,
                None => break,
            },
            Ok(()) = selection_rx.changed() => match feed.latest() {
                Some(snapshot) => snapshot,
                None => continue,
            },
        };

        let current = selection_rx.borrow_and_update().clone();
        let fleet = FleetSummary::from_sensors(&snapshot, &current);
        if last_fleet.as_ref() == Some(&fleet) {
            continue;
        }

        if let Err(e) = sink.fleet_updated(&fleet, last_fleet.as_ref()) {
            error!("Fleet view failed to render: {}", e);
        }
        last_fleet = Some(fleet);
    }

    info!("Fleet view stopped");
}
