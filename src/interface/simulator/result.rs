use chrono::Weekday;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use shoprate_stats::PosteriorSummary;
use shoprate_utils::round_to;

/// Posterior summaries of one simulation run, one per weekday from Monday to
/// Sunday
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeekdayResult {
    user_id: String,
    trailing_weeks: usize,
    summaries: IndexMap<Weekday, PosteriorSummary>,
}

impl WeekdayResult {
    pub(crate) fn new(
        user_id: &str,
        trailing_weeks: usize,
        summaries: IndexMap<Weekday, PosteriorSummary>,
    ) -> Self {
        Self {
            user_id: user_id.to_owned(),
            trailing_weeks,
            summaries,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn trailing_weeks(&self) -> usize {
        self.trailing_weeks
    }

    pub fn summaries(&self) -> &IndexMap<Weekday, PosteriorSummary> {
        &self.summaries
    }

    pub fn get(&self, weekday: Weekday) -> Option<&PosteriorSummary> {
        self.summaries.get(&weekday)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Weekday, &PosteriorSummary)> {
        self.summaries.iter()
    }

    /// Posterior median purchase count of each weekday rounded to
    /// `precision` decimals
    pub fn medians(&self, precision: u32) -> IndexMap<Weekday, f64> {
        self.summaries
            .iter()
            .map(|(&weekday, summary)| {
                (weekday, round_to(summary.median(), precision))
            })
            .collect()
    }
}
