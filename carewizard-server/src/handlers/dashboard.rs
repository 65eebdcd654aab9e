//! Doctor dashboard derivations over posted rows.

use axum::response::Json;
use carewizard_core::dashboard::{
    self, Review, ReviewPage, ReviewQuery, RosterEntry, RosterPage, RosterQuery,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterRequest {
    pub patients: Vec<RosterEntry>,
    #[serde(default)]
    pub query: RosterQuery,
    /// Reference date for "upcoming" and "new this month"; defaults to today.
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewsRequest {
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub query: ReviewQuery,
}

/// POST /dashboard/patients
pub async fn my_patients(Json(request): Json<RosterRequest>) -> Json<RosterPage> {
    let today = request.today.unwrap_or_else(|| Local::now().date_naive());
    Json(dashboard::my_patients(&request.patients, &request.query, today))
}

/// POST /dashboard/reviews
pub async fn reviews(Json(request): Json<ReviewsRequest>) -> Json<ReviewPage> {
    Json(dashboard::review_dashboard(&request.reviews, &request.query))
}
