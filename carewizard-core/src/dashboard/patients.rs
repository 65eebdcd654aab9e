use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{compare_optional, SortOrder};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub last_visit: Option<NaiveDate>,
    #[serde(default)]
    pub next_appointment: Option<NaiveDate>,
    #[serde(default)]
    pub registered_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AppointmentStatus {
    /// Has an appointment today or later.
    Upcoming,
    /// Has been seen, nothing scheduled.
    Seen,
    /// Never seen, nothing scheduled.
    New,
}

impl RosterEntry {
    pub fn status(&self, today: NaiveDate) -> AppointmentStatus {
        match (self.next_appointment, self.last_visit) {
            (Some(next), _) if next >= today => AppointmentStatus::Upcoming,
            (_, Some(_)) => AppointmentStatus::Seen,
            _ => AppointmentStatus::New,
        }
    }

    fn matches_search(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.email.to_lowercase().contains(needle)
            || self.phone.contains(needle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RosterSortKey {
    #[default]
    Name,
    LastVisit,
    NextAppointment,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RosterQuery {
    /// Case-insensitive match on name, email or phone.
    pub search: String,
    pub gender: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub sort: RosterSortKey,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterSummary {
    pub total: usize,
    pub upcoming: usize,
    pub new_this_month: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterPage {
    pub patients: Vec<RosterEntry>,
    /// Counts over the whole roster, not the filtered page.
    pub summary: RosterSummary,
}

pub fn my_patients(roster: &[RosterEntry], query: &RosterQuery, today: NaiveDate) -> RosterPage {
    let needle = query.search.trim().to_lowercase();
    let gender = query
        .gender
        .as_deref()
        .map(str::trim)
        .filter(|g| !g.is_empty() && *g != "all");

    let mut patients: Vec<RosterEntry> = roster
        .iter()
        .filter(|p| needle.is_empty() || p.matches_search(&needle))
        .filter(|p| gender.is_none_or(|g| p.gender.eq_ignore_ascii_case(g)))
        .filter(|p| query.status.is_none_or(|s| p.status(today) == s))
        .cloned()
        .collect();

    patients.sort_by(|a, b| match query.sort {
        RosterSortKey::Name => query
            .order
            .apply(a.name.to_lowercase().cmp(&b.name.to_lowercase())),
        RosterSortKey::LastVisit => compare_optional(&a.last_visit, &b.last_visit, query.order),
        RosterSortKey::NextAppointment => {
            compare_optional(&a.next_appointment, &b.next_appointment, query.order)
        }
    });

    RosterPage {
        patients,
        summary: summarize(roster, today),
    }
}

fn summarize(roster: &[RosterEntry], today: NaiveDate) -> RosterSummary {
    RosterSummary {
        total: roster.len(),
        upcoming: roster
            .iter()
            .filter(|p| p.status(today) == AppointmentStatus::Upcoming)
            .count(),
        new_this_month: roster
            .iter()
            .filter_map(|p| p.registered_on)
            .filter(|d| d.year() == today.year() && d.month() == today.month())
            .count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn roster() -> Vec<RosterEntry> {
        serde_json::from_value(json!([
            {"id": "p-1", "name": "Asha Rao", "email": "asha@example.com", "phone": "9876543210",
             "gender": "female", "lastVisit": "2026-09-01", "nextAppointment": "2026-10-25",
             "registeredOn": "2026-10-02"},
            {"id": "p-2", "name": "vikram Shah", "email": "vik@example.com", "phone": "9123456780",
             "gender": "male", "lastVisit": "2026-10-10", "registeredOn": "2025-01-15"},
            {"id": "p-3", "name": "Lina Joseph", "gender": "female", "registeredOn": "2026-10-18"},
            {"id": "p-4", "name": "Omar Khan", "gender": "male", "nextAppointment": "2026-10-01"}
        ]))
        .unwrap()
    }

    fn ids(page: &RosterPage) -> Vec<&str> {
        page.patients.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_default_query_sorts_by_name() {
        let page = my_patients(&roster(), &RosterQuery::default(), today());
        assert_eq!(ids(&page), vec!["p-1", "p-3", "p-4", "p-2"]);
        assert_eq!(
            page.summary,
            RosterSummary {
                total: 4,
                upcoming: 1,
                new_this_month: 2
            }
        );
    }

    #[test]
    fn test_search_gender_and_status_filters() {
        let roster = roster();
        let query = RosterQuery {
            search: "EXAMPLE.com".into(),
            ..Default::default()
        };
        assert_eq!(ids(&my_patients(&roster, &query, today())), vec!["p-1", "p-2"]);

        let query = RosterQuery {
            search: "91234".into(),
            ..Default::default()
        };
        assert_eq!(ids(&my_patients(&roster, &query, today())), vec!["p-2"]);

        let query = RosterQuery {
            gender: Some("Female".into()),
            status: Some(AppointmentStatus::New),
            ..Default::default()
        };
        assert_eq!(ids(&my_patients(&roster, &query, today())), vec!["p-3"]);

        // A past appointment is not upcoming.
        let query = RosterQuery {
            status: Some(AppointmentStatus::Upcoming),
            ..Default::default()
        };
        assert_eq!(ids(&my_patients(&roster, &query, today())), vec!["p-1"]);
    }

    #[test]
    fn test_sort_by_last_visit_desc_puts_missing_last() {
        let query = RosterQuery {
            sort: RosterSortKey::LastVisit,
            order: SortOrder::Desc,
            ..Default::default()
        };
        let page = my_patients(&roster(), &query, today());
        assert_eq!(&ids(&page)[..2], &["p-2", "p-1"]);
    }
}
