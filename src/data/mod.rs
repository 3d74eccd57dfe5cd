//! Weekday buckets of daily purchase counts and the sources that supply them
mod demo;
mod history;

pub use history::{group_by_weekday, HistoryLoadError, PurchaseHistory};

use std::collections::BTreeMap;
use std::ops::Index;

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The days of the week in bucket order, Monday first
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Errors that can arise when a source cannot supply a user's buckets
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The source has no history for the user
    #[error("no purchase history for user '{0}'")]
    UnknownUser(String),
    /// A window of zero weeks holds no observations
    #[error("the trailing window must span at least one week")]
    EmptyWindow,
    /// The window reaches outside the representable calendar
    #[error("trailing window of {0} weeks is out of the calendar range")]
    WindowOutOfRange(usize),
    /// The source holds fewer weeks than requested
    #[error("requested {requested} weeks but only {available} are available")]
    NotEnoughWeeks { requested: usize, available: usize },
}

/// Observed daily counts grouped by day of week.
///
/// Bucket `i` holds the counts of weekday `i` (Monday = 0) in chronological
/// order, one per week of the window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayBuckets([Vec<u32>; 7]);

impl WeekdayBuckets {
    pub fn new(buckets: [Vec<u32>; 7]) -> Self {
        Self(buckets)
    }

    /// The counts observed on `weekday`
    pub fn get(&self, weekday: Weekday) -> &[u32] {
        &self.0[weekday.num_days_from_monday() as usize]
    }

    /// Iterate over `(weekday, counts)` from Monday to Sunday
    pub fn iter(&self) -> impl Iterator<Item = (Weekday, &[u32])> {
        WEEKDAYS
            .iter()
            .zip(self.0.iter())
            .map(|(&weekday, counts)| (weekday, counts.as_slice()))
    }

    /// Keep only the last `n_weeks` counts of every bucket
    pub fn trailing(&self, n_weeks: usize) -> Result<Self, FetchError> {
        if n_weeks == 0 {
            return Err(FetchError::EmptyWindow);
        }
        let available = self.0.iter().map(Vec::len).min().unwrap_or(0);
        if n_weeks > available {
            return Err(FetchError::NotEnoughWeeks {
                requested: n_weeks,
                available,
            });
        }

        let mut buckets = self.0.clone();
        buckets.iter_mut().for_each(|counts| {
            counts.drain(..counts.len() - n_weeks);
        });
        Ok(Self(buckets))
    }
}

impl Index<Weekday> for WeekdayBuckets {
    type Output = [u32];

    fn index(&self, weekday: Weekday) -> &Self::Output {
        self.get(weekday)
    }
}

/// Supplies a user's daily counts grouped into weekday buckets
pub trait BucketSource {
    /// The buckets for `user_id` over the trailing `trailing_weeks` weeks.
    /// Days without a record count as zero.
    fn weekday_buckets(
        &self,
        user_id: &str,
        trailing_weeks: usize,
    ) -> Result<WeekdayBuckets, FetchError>;
}

/// Pre-bucketed counts keyed by user. The trailing window keeps the most
/// recent weeks of each bucket.
impl BucketSource for BTreeMap<String, WeekdayBuckets> {
    fn weekday_buckets(
        &self,
        user_id: &str,
        trailing_weeks: usize,
    ) -> Result<WeekdayBuckets, FetchError> {
        self.get(user_id)
            .ok_or_else(|| FetchError::UnknownUser(user_id.to_owned()))
            .and_then(|buckets| buckets.trailing(trailing_weeks))
    }
}
