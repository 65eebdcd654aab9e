//! Derived views for the doctor dashboard: the patient roster and the
//! reviews list. Both take rows as they come from the API and never mutate
//! them.

pub mod patients;
pub mod reviews;

pub use patients::{
    my_patients, AppointmentStatus, RosterEntry, RosterPage, RosterQuery, RosterSortKey,
    RosterSummary,
};
pub use reviews::{
    review_dashboard, Review, ReviewPage, ReviewQuery, ReviewSortKey, ReviewSummary, Visibility,
};

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Order optional keys with missing values last in either direction.
pub(crate) fn compare_optional<T: Ord>(a: &Option<T>, b: &Option<T>, order: SortOrder) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => order.apply(a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
