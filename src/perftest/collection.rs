//! Performance metrics, the `DataCollection` interface, and the registered
//! collector factory map (`g_dataCollectionMap` in the original).

use crate::error::ApiCallErr;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

/// The fixed set of measurable performance metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(i32)]
pub enum PerfMetric {
    /// Wall-clock elapsed time of the action callback.
    Duration = 0,
    /// Average CPU load over the round.
    CpuLoad = 1,
    /// CPU time fraction used by the target process.
    CpuUsage = 2,
    /// Resident set size.
    MemoryRss = 3,
    /// Proportional set size.
    MemoryPss = 4,
    /// Time to first frame of a cold app start.
    AppStartResponseTime = 5,
    /// Time to fully rendered state of a cold app start.
    AppStartCompleteTime = 6,
    /// Time for a page navigation to settle.
    PageSwitchCompleteTime = 7,
    /// Average frames-per-second during a list swipe.
    ListSwipeFps = 8,
    /// Not a real metric; the count of defined variants.
    MetricCount = 9,
}

impl PerfMetric {
    /// All real metrics (excludes [`PerfMetric::MetricCount`]).
    pub const ALL: [Self; 9] = [
        Self::Duration,
        Self::CpuLoad,
        Self::CpuUsage,
        Self::MemoryRss,
        Self::MemoryPss,
        Self::AppStartResponseTime,
        Self::AppStartCompleteTime,
        Self::PageSwitchCompleteTime,
        Self::ListSwipeFps,
    ];

    /// Converts a wire-level integer to a metric, rejecting
    /// [`PerfMetric::MetricCount`] and anything outside `[0, METRIC_COUNT)`.
    #[must_use]
    pub fn from_i32(value: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|m| *m as i32 == value)
    }
}

/// The minimum valid round value; a round below this sentinel is excluded
/// from aggregation.
pub const INVALID_VALUE: f64 = -1.00;
/// The value a freshly-created result slot starts at.
pub const INITIAL_VALUE: f64 = 0.00;

/// The out-of-process collector contract: start timing/sampling, then stop
/// and report one round's value (or [`INVALID_VALUE`] to mark the round
/// invalid without failing the run).
pub trait DataCollection: Send {
    /// Begins collection for one round.
    ///
    /// # Errors
    /// `DataCollectionFailed` if the collector cannot start.
    fn start_collection(&mut self) -> Result<(), ApiCallErr>;

    /// Ends collection for one round and reports its value.
    ///
    /// # Errors
    /// `DataCollectionFailed` if the collector cannot be read.
    fn stop_collection(&mut self) -> Result<f64, ApiCallErr>;
}

/// Reference collector: wall-clock milliseconds between start and stop.
/// The only concrete collector this crate ships, since it needs no
/// platform access.
#[derive(Default)]
pub struct DurationCollection {
    started_at: Option<Instant>,
}

impl DataCollection for DurationCollection {
    fn start_collection(&mut self) -> Result<(), ApiCallErr> {
        self.started_at = Some(Instant::now());
        Ok(())
    }

    fn stop_collection(&mut self) -> Result<f64, ApiCallErr> {
        let started = self
            .started_at
            .take()
            .ok_or_else(|| ApiCallErr::data_collection_failed("stop_collection called before start"))?;
        Ok(started.elapsed().as_secs_f64() * 1000.0)
    }
}

/// A collector with no platform backing: fails `start_collection` and
/// never yields a value. Registered for every metric this crate does not
/// itself implement, so a host can swap in a real collector without
/// changing the map's shape.
struct UnimplementedCollection {
    metric: PerfMetric,
}

impl DataCollection for UnimplementedCollection {
    fn start_collection(&mut self) -> Result<(), ApiCallErr> {
        Err(ApiCallErr::data_collection_failed(format!(
            "no collector registered for {:?}",
            self.metric
        )))
    }

    fn stop_collection(&mut self) -> Result<f64, ApiCallErr> {
        Err(ApiCallErr::data_collection_failed(format!(
            "no collector registered for {:?}",
            self.metric
        )))
    }
}

/// A registration map from metric to a factory producing a fresh collector
/// instance, mirroring the original's `g_dataCollectionMap`.
pub struct CollectionFactory {
    factories: HashMap<PerfMetric, Box<dyn Fn() -> Box<dyn DataCollection> + Send + Sync>>,
}

impl Default for CollectionFactory {
    fn default() -> Self {
        Self::with_reference_collectors()
    }
}

impl CollectionFactory {
    /// An empty factory map with no registrations.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// The default map: [`DurationCollection`] for [`PerfMetric::Duration`],
    /// and a failing stub for every other metric, matching the original's
    /// tolerant "missing collector degrades that metric" behavior.
    #[must_use]
    pub fn with_reference_collectors() -> Self {
        let mut factory = Self::empty();
        factory.register(PerfMetric::Duration, || Box::new(DurationCollection::default()));
        for metric in PerfMetric::ALL {
            if metric != PerfMetric::Duration {
                factory.register(metric, move || Box::new(UnimplementedCollection { metric }));
            }
        }
        factory
    }

    /// Registers (or overwrites) the factory for `metric`.
    pub fn register<F>(&mut self, metric: PerfMetric, factory: F)
    where
        F: Fn() -> Box<dyn DataCollection> + Send + Sync + 'static,
    {
        self.factories.insert(metric, Box::new(factory));
    }

    /// Builds a fresh collector instance for `metric`, if one is
    /// registered.
    #[must_use]
    pub fn build(&self, metric: PerfMetric) -> Option<Box<dyn DataCollection>> {
        self.factories.get(&metric).map(|f| f())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_numbering_matches_abi() {
        assert_eq!(PerfMetric::Duration as i32, 0);
        assert_eq!(PerfMetric::ListSwipeFps as i32, 8);
        assert_eq!(PerfMetric::MetricCount as i32, 9);
    }

    #[test]
    fn from_i32_rejects_metric_count_and_out_of_range() {
        assert_eq!(PerfMetric::from_i32(0), Some(PerfMetric::Duration));
        assert_eq!(PerfMetric::from_i32(9), None);
        assert_eq!(PerfMetric::from_i32(-1), None);
    }

    #[test]
    fn duration_collection_reports_nonnegative_elapsed() {
        let mut collector = DurationCollection::default();
        collector.start_collection().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let value = collector.stop_collection().unwrap();
        assert!(value >= 0.0);
    }

    #[test]
    fn default_factory_has_a_collector_for_every_metric() {
        let factory = CollectionFactory::default();
        for metric in PerfMetric::ALL {
            assert!(factory.build(metric).is_some());
        }
    }

    #[test]
    fn unimplemented_collector_fails_on_start() {
        let factory = CollectionFactory::default();
        let mut collector = factory.build(PerfMetric::CpuLoad).unwrap();
        assert!(collector.start_collection().is_err());
    }
}
