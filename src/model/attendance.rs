use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, Display,
    EnumString, ToSchema,
)]
pub enum AttendanceStatus {
    Present,
    #[default]
    Absent,
    Late,
    #[serde(rename = "Half Day")]
    #[sqlx(rename = "Half Day")]
    #[strum(serialize = "Half Day")]
    HalfDay,
    Holiday,
    Leave,
}

/// One attendance row per (employee, calendar day); the pair is unique in
/// the store.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    pub hr_id: u64,
    #[schema(example = "2026-03-16", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "2026-03-16T09:00:00", value_type = Option<String>, format = "date-time")]
    pub check_in: Option<NaiveDateTime>,
    #[schema(example = "2026-03-16T17:30:00", value_type = Option<String>, format = "date-time")]
    pub check_out: Option<NaiveDateTime>,
    pub status: AttendanceStatus,
    /// Derived from the check-in/check-out pair, never set directly.
    #[schema(example = 8.5)]
    pub working_hours: Option<f64>,
    #[schema(example = 0.5)]
    pub overtime_hours: f64,
    pub notes: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
}
