use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, Display,
    EnumString, ToSchema,
)]
pub enum EmploymentStatus {
    #[default]
    Active,
    #[serde(rename = "On Leave")]
    #[sqlx(rename = "On Leave")]
    #[strum(serialize = "On Leave")]
    OnLeave,
    Suspended,
    Terminated,
    Resigned,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,
    pub hr_id: u64,
    #[schema(example = "EMP-00001")]
    pub employee_code: String,
    #[schema(example = "John")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "john.doe@company.com")]
    pub email: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub job_title: Option<String>,
    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub hire_date: NaiveDate,
    #[schema(example = 3000.0)]
    pub salary: f64,
    pub employment_status: EmploymentStatus,
}
