use chrono::NaiveDate;

use super::PurchaseHistory;

const DEMO_USERS: [&str; 3] = ["123", "456", "789"];

/// Four weeks of daily purchases starting on Sunday 2023-02-19
const DEMO_COUNTS: [u32; 28] = [
    5, 3, 2, 6, 5, 3, 7, 3, 8, 1, 4, 6, 3, 9, 2, 4, 5, 6, 7, 2, 3, 5, 8, 9, 3,
    5, 6, 7,
];

impl PurchaseHistory {
    /// A small fixed history shared by users "123", "456" and "789", viewed
    /// from Monday 2023-03-20.
    pub fn demo() -> Self {
        let first_day = NaiveDate::from_ymd_opt(2023, 2, 19).unwrap();
        let as_of = NaiveDate::from_ymd_opt(2023, 3, 20).unwrap();

        let mut history = Self::new(as_of);
        for user_id in DEMO_USERS {
            first_day
                .iter_days()
                .zip(DEMO_COUNTS.iter())
                .for_each(|(date, &count)| history.insert(user_id, date, count));
        }
        history
    }
}
