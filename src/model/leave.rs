use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Display, EnumString,
    ToSchema,
)]
pub enum LeaveType {
    #[serde(rename = "Sick Leave")]
    #[sqlx(rename = "Sick Leave")]
    #[strum(serialize = "Sick Leave")]
    SickLeave,
    #[serde(rename = "Casual Leave")]
    #[sqlx(rename = "Casual Leave")]
    #[strum(serialize = "Casual Leave")]
    CasualLeave,
    #[serde(rename = "Annual Leave")]
    #[sqlx(rename = "Annual Leave")]
    #[strum(serialize = "Annual Leave")]
    AnnualLeave,
    #[serde(rename = "Emergency Leave")]
    #[sqlx(rename = "Emergency Leave")]
    #[strum(serialize = "Emergency Leave")]
    EmergencyLeave,
    #[serde(rename = "Maternity Leave")]
    #[sqlx(rename = "Maternity Leave")]
    #[strum(serialize = "Maternity Leave")]
    MaternityLeave,
    #[serde(rename = "Paternity Leave")]
    #[sqlx(rename = "Paternity Leave")]
    #[strum(serialize = "Paternity Leave")]
    PaternityLeave,
    #[serde(rename = "Unpaid Leave")]
    #[sqlx(rename = "Unpaid Leave")]
    #[strum(serialize = "Unpaid Leave")]
    UnpaidLeave,
}

/// Pending is the only state the approval actions accept; the rest are
/// terminal.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, Display,
    EnumString, ToSchema,
)]
pub enum LeaveStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    pub hr_id: u64,
    pub leave_type: LeaveType,
    #[schema(example = "2026-03-10", value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(example = "2026-03-12", value_type = String, format = "date")]
    pub end_date: NaiveDate,
    /// Inclusive day count of [start_date, end_date], kept in sync with the
    /// dates.
    #[schema(example = 3)]
    pub total_days: i64,
    pub reason: String,
    pub status: LeaveStatus,
    pub approved_by: Option<u64>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub approved_at: Option<NaiveDateTime>,
    pub rejection_reason: Option<String>,
}
