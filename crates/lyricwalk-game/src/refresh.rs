//! Daily marker refresh.
//!
//! Once a day, at a configured local time, every marker is regenerated from
//! the current uncollected counts. Transient store failures are retried with
//! exponential backoff. Anything else is logged and the loop carries on to
//! the next day.

use backon::{ExponentialBuilder, Retryable};
use chrono::{DateTime, Local, NaiveTime, TimeDelta, TimeZone};
use lyricwalk_core::schema::RepopulateReport;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::error::{GameError, GameResult};
use crate::store::CatalogStore;

const MIN_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Wall-clock time of the daily refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSchedule {
    time: NaiveTime,
}

impl Default for RefreshSchedule {
    fn default() -> Self {
        Self {
            time: NaiveTime::MIN,
        }
    }
}

impl RefreshSchedule {
    pub fn new(hour: u32, minute: u32) -> GameResult<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(|time| Self { time })
            .ok_or(GameError::InvalidSchedule { hour, minute })
    }

    pub const fn time(&self) -> NaiveTime {
        self.time
    }

    /// The first refresh strictly after `now`, in `now`'s time zone.
    ///
    /// A refresh time that falls in a DST gap runs an hour later that day.
    pub fn next_run_after<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        let today = now.date_naive().and_time(self.time);
        let candidate = if today > now.naive_local() {
            today
        } else {
            today + TimeDelta::days(1)
        };

        let tz = now.timezone();
        tz.from_local_datetime(&candidate)
            .earliest()
            .or_else(|| {
                tz.from_local_datetime(&(candidate + TimeDelta::hours(1)))
                    .earliest()
            })
            .unwrap_or_else(|| now.clone() + TimeDelta::days(1))
    }

    /// Every refresh after `now`, each computed from the one before it.
    ///
    /// Stepping from the previous scheduled instant rather than the clock
    /// means a timer that fires a little early cannot repeat a slot.
    pub fn runs_after<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
    ) -> impl Iterator<Item = DateTime<Tz>> {
        let schedule = *self;
        std::iter::successors(Some(self.next_run_after(now)), move |previous| {
            Some(schedule.next_run_after(previous))
        })
    }

    /// How long to sleep from `now` until the next refresh.
    pub fn duration_until_next<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Duration {
        (self.next_run_after(now) - now.clone())
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

/// Regenerate every marker, retrying transient failures up to `retries`
/// times.
pub async fn refresh_markers(
    store: &CatalogStore,
    retries: usize,
) -> GameResult<RepopulateReport> {
    let backoff = ExponentialBuilder::default()
        .with_min_delay(MIN_RETRY_DELAY)
        .with_max_times(retries);

    (|| async { store.repopulate_markers().await })
        .retry(backoff)
        .when(GameError::is_transient)
        .notify(|err: &GameError, delay: Duration| {
            log::warn!("Marker refresh failed ({}), retrying in {:?}", err, delay);
        })
        .await
}

/// Spawn the daily refresh loop on the current tokio runtime.
///
/// The task never ends on its own. Failures are logged and the next day's
/// run is scheduled as usual.
pub fn spawn_daily_refresh(
    store: CatalogStore,
    schedule: RefreshSchedule,
    retries: usize,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        for run_at in schedule.runs_after(&Local::now()) {
            log::info!("Next marker refresh at {}", run_at);
            let wait = (run_at - Local::now()).to_std().unwrap_or(Duration::ZERO);
            tokio::time::sleep(wait).await;

            match refresh_markers(&store, retries).await {
                Ok(report) => {
                    for category in &report.exhausted {
                        log::warn!("No {} markers placed, sampling exhausted", category);
                    }
                    log::info!("Daily refresh placed {} markers", report.total());
                }
                Err(e) => log::warn!("Daily marker refresh failed: {}", e),
            }
        }
    })
}
