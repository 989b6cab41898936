use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, Display,
    EnumString, ToSchema,
)]
pub enum PayrollStatus {
    #[default]
    Draft,
    Generated,
    Paid,
    Cancelled,
}

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, Display,
    EnumString, ToSchema,
)]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "Bank Transfer")]
    #[sqlx(rename = "Bank Transfer")]
    #[strum(serialize = "Bank Transfer")]
    BankTransfer,
    Cash,
    Cheque,
    Online,
}

/// One statement per (employee, month, year); the triple is unique in the
/// store.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PayrollStatement {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    pub hr_id: u64,
    #[schema(example = 3)]
    pub month: u32,
    #[schema(example = 2026)]
    pub year: u32,
    pub basic_salary: f64,
    pub allowances: f64,
    pub bonuses: f64,
    pub overtime_pay: f64,
    pub total_earnings: f64,
    pub tax: f64,
    pub provident_fund: f64,
    pub insurance: f64,
    pub leave_deductions: f64,
    pub other_deductions: f64,
    pub total_deductions: f64,
    /// total_earnings minus total_deductions, recomputed whenever either
    /// side changes.
    pub net_salary: f64,
    pub status: PayrollStatus,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub paid_date: Option<NaiveDateTime>,
    pub payment_method: Option<PaymentMethod>,
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
}
