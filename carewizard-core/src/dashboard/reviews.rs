use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::SortOrder;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    #[serde(default)]
    pub patient_name: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    pub created_at: NaiveDate,
    #[serde(default = "visible_by_default")]
    pub visible: bool,
}

fn visible_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    All,
    Visible,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewSortKey {
    #[default]
    Date,
    Rating,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReviewQuery {
    pub rating: Option<u8>,
    pub visibility: Visibility,
    pub sort: ReviewSortKey,
    /// Newest first unless asked otherwise.
    pub order: Option<SortOrder>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub total: usize,
    /// Rounded to one decimal; 0 without reviews.
    pub average_rating: f64,
    /// Count per star, index 0 is one star.
    pub distribution: [usize; 5],
    /// Percentage of 4 and 5 star reviews, rounded.
    pub positive_share: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPage {
    pub reviews: Vec<Review>,
    pub summary: ReviewSummary,
}

pub fn review_dashboard(reviews: &[Review], query: &ReviewQuery) -> ReviewPage {
    let mut page: Vec<Review> = reviews
        .iter()
        .filter(|r| query.rating.is_none_or(|rating| r.rating == rating))
        .filter(|r| match query.visibility {
            Visibility::All => true,
            Visibility::Visible => r.visible,
            Visibility::Hidden => !r.visible,
        })
        .cloned()
        .collect();

    let order = query.order.unwrap_or(SortOrder::Desc);
    page.sort_by(|a, b| match query.sort {
        ReviewSortKey::Date => order.apply(a.created_at.cmp(&b.created_at)),
        ReviewSortKey::Rating => order.apply(
            a.rating
                .cmp(&b.rating)
                .then_with(|| a.created_at.cmp(&b.created_at)),
        ),
    });

    ReviewPage {
        reviews: page,
        summary: summarize(reviews),
    }
}

/// Ratings outside 1..=5 are not counted.
fn summarize(reviews: &[Review]) -> ReviewSummary {
    let mut distribution = [0usize; 5];
    for review in reviews.iter().filter(|r| (1..=5).contains(&r.rating)) {
        distribution[usize::from(review.rating) - 1] += 1;
    }

    let total: usize = distribution.iter().sum();
    if total == 0 {
        return ReviewSummary {
            total,
            average_rating: 0.0,
            distribution,
            positive_share: 0,
        };
    }

    let stars: usize = distribution
        .iter()
        .enumerate()
        .map(|(i, count)| (i + 1) * count)
        .sum();
    let average = stars as f64 / total as f64;
    let positive = (distribution[3] + distribution[4]) as f64 / total as f64;

    ReviewSummary {
        total,
        average_rating: (average * 10.0).round() / 10.0,
        distribution,
        positive_share: (positive * 100.0).round() as u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reviews() -> Vec<Review> {
        serde_json::from_value(json!([
            {"id": "r-1", "patientName": "Asha", "rating": 5, "comment": "Great", "createdAt": "2026-10-01"},
            {"id": "r-2", "patientName": "Vikram", "rating": 4, "createdAt": "2026-10-05", "visible": false},
            {"id": "r-3", "patientName": "Lina", "rating": 2, "createdAt": "2026-09-20"}
        ]))
        .unwrap()
    }

    fn ids(page: &ReviewPage) -> Vec<&str> {
        page.reviews.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_summary() {
        let page = review_dashboard(&reviews(), &ReviewQuery::default());
        assert_eq!(page.summary.total, 3);
        assert_eq!(page.summary.average_rating, 3.7);
        assert_eq!(page.summary.distribution, [0, 1, 0, 1, 1]);
        assert_eq!(page.summary.positive_share, 67);
    }

    #[test]
    fn test_default_is_newest_first() {
        let page = review_dashboard(&reviews(), &ReviewQuery::default());
        assert_eq!(ids(&page), vec!["r-2", "r-1", "r-3"]);
    }

    #[test]
    fn test_filters_and_rating_sort() {
        let reviews = reviews();
        let visible = ReviewQuery {
            visibility: Visibility::Visible,
            sort: ReviewSortKey::Rating,
            order: Some(SortOrder::Asc),
            ..Default::default()
        };
        assert_eq!(ids(&review_dashboard(&reviews, &visible)), vec!["r-3", "r-1"]);

        let five = ReviewQuery {
            rating: Some(5),
            ..Default::default()
        };
        assert_eq!(ids(&review_dashboard(&reviews, &five)), vec!["r-1"]);
    }

    #[test]
    fn test_empty_summary() {
        let page = review_dashboard(&[], &ReviewQuery::default());
        assert_eq!(page.summary.average_rating, 0.0);
        assert_eq!(page.summary.positive_share, 0);
    }
}
