use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::Path;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{BucketSource, FetchError, WeekdayBuckets};

/// Errors that can arise when reading a purchase history file
#[derive(Debug, Error)]
pub enum HistoryLoadError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Daily purchase counts per user, seen from a fixed reference date.
///
/// Windows end on the last Sunday strictly before `as_of`, so the current,
/// incomplete week is never used.
///
/// # Example
///
/// ```rust
/// # use shoprate::data::{BucketSource, PurchaseHistory};
/// use chrono::{NaiveDate, Weekday};
///
/// let as_of = NaiveDate::from_ymd_opt(2023, 3, 20).unwrap();
/// let mut history = PurchaseHistory::new(as_of);
/// // Monday two weeks back
/// history.insert("123", NaiveDate::from_ymd_opt(2023, 3, 6).unwrap(), 4);
///
/// let buckets = history.weekday_buckets("123", 2).unwrap();
/// assert_eq!(&buckets[Weekday::Mon], &[4, 0]);
/// assert_eq!(&buckets[Weekday::Sun], &[0, 0]);
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PurchaseHistory {
    pub as_of: NaiveDate,
    #[serde(default)]
    pub users: BTreeMap<String, BTreeMap<NaiveDate, u32>>,
}

impl PurchaseHistory {
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            users: BTreeMap::new(),
        }
    }

    /// Record `count` purchases by `user_id` on `date`, replacing any
    /// existing record for that day
    pub fn insert(&mut self, user_id: &str, date: NaiveDate, count: u32) {
        self.users
            .entry(user_id.to_owned())
            .or_default()
            .insert(date, count);
    }

    pub fn user_ids(&self) -> impl Iterator<Item = &str> {
        self.users.keys().map(String::as_str)
    }

    /// Read a history from a `.json` file, or YAML otherwise
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, HistoryLoadError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let is_json = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Ok(serde_json::from_reader(file)?)
        } else {
            Ok(serde_yaml::from_reader(file)?)
        }
    }
}

impl BucketSource for PurchaseHistory {
    fn weekday_buckets(
        &self,
        user_id: &str,
        trailing_weeks: usize,
    ) -> Result<WeekdayBuckets, FetchError> {
        let days = self
            .users
            .get(user_id)
            .ok_or_else(|| FetchError::UnknownUser(user_id.to_owned()))?;
        group_by_weekday(self.as_of, days, trailing_weeks)
    }
}

/// Bucket the `7 * n_weeks` days ending on the last Sunday before `as_of` by
/// weekday. Days missing from `days` count as zero.
pub fn group_by_weekday(
    as_of: NaiveDate,
    days: &BTreeMap<NaiveDate, u32>,
    n_weeks: usize,
) -> Result<WeekdayBuckets, FetchError> {
    if n_weeks == 0 {
        return Err(FetchError::EmptyWindow);
    }

    let out_of_range = FetchError::WindowOutOfRange(n_weeks);
    let n_days = u64::try_from(n_weeks)
        .ok()
        .and_then(|w| w.checked_mul(7))
        .ok_or_else(|| out_of_range.clone())?;
    let back_to_sunday = match as_of.weekday().num_days_from_sunday() {
        0 => 7,
        n => u64::from(n),
    };
    let start = back_to_sunday
        .checked_add(n_days - 1)
        .and_then(|offset| as_of.checked_sub_days(Days::new(offset)))
        .ok_or(out_of_range)?;

    let mut buckets: [Vec<u32>; 7] = Default::default();
    start.iter_days().take(n_days as usize).for_each(|date| {
        let ix = date.weekday().num_days_from_monday() as usize;
        buckets[ix].push(days.get(&date).copied().unwrap_or(0));
    });

    Ok(WeekdayBuckets::new(buckets))
}
