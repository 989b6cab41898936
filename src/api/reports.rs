use crate::{
    auth::auth::AuthUser,
    domain::time::{month_bounds, round2},
    error::ApiError,
    model::attendance::AttendanceStatus,
    model::employee::EmploymentStatus,
    model::leave::LeaveStatus,
    model::payroll::PayrollStatus,
};
use actix_web::{HttpResponse, web};
use chrono::{Datelike, Local};
use serde::Serialize;
use sqlx::MySqlPool;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Default, Serialize, ToSchema)]
pub struct EmployeeHeadcount {
    pub total: i64,
    pub active: i64,
    pub on_leave: i64,
    pub terminated: i64,
}

#[derive(Default, Serialize, ToSchema)]
pub struct AttendanceSnapshot {
    pub present: i64,
    pub absent: i64,
}

#[derive(Default, Serialize, ToSchema)]
pub struct LeaveSnapshot {
    pub pending: i64,
    pub approved: i64,
}

#[derive(Default, Serialize, ToSchema)]
pub struct PayrollSnapshot {
    pub total: i64,
    pub paid: i64,
    pub total_salary_paid: f64,
}

/// Read-only roll-up across the three ledgers and the directory. Attendance
/// and payroll sections cover the current calendar month.
#[derive(Serialize, ToSchema)]
pub struct DashboardReport {
    pub employees: EmployeeHeadcount,
    pub attendance: AttendanceSnapshot,
    pub leaves: LeaveSnapshot,
    pub payroll: PayrollSnapshot,
}

/// HR dashboard
#[utoipa::path(
    get,
    path = "/api/v1/reports/dashboard",
    responses(
        (status = 200, description = "Cross-ledger summary for the scope", body = DashboardReport)
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn dashboard(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;
    let hr_id = auth.user_id;

    let today = Local::now().date_naive();
    // today always carries a valid month, so the bounds exist
    let (month_start, month_end) = month_bounds(today.year(), today.month())
        .ok_or_else(|| ApiError::Validation("Month must be between 1 and 12".into()))?;

    let mut employees = EmployeeHeadcount::default();
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT employment_status, COUNT(*) FROM employees WHERE hr_id = ? GROUP BY employment_status",
    )
    .bind(hr_id)
    .fetch_all(pool.get_ref())
    .await?;
    for (status, count) in rows {
        employees.total += count;
        match EmploymentStatus::from_str(&status) {
            Ok(EmploymentStatus::Active) => employees.active = count,
            Ok(EmploymentStatus::OnLeave) => employees.on_leave = count,
            Ok(EmploymentStatus::Terminated) => employees.terminated = count,
            _ => {}
        }
    }

    let mut attendance = AttendanceSnapshot::default();
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT status, COUNT(*) FROM attendance WHERE hr_id = ? AND date BETWEEN ? AND ? GROUP BY status",
    )
    .bind(hr_id)
    .bind(month_start)
    .bind(month_end)
    .fetch_all(pool.get_ref())
    .await?;
    for (status, count) in rows {
        match AttendanceStatus::from_str(&status) {
            Ok(AttendanceStatus::Present) => attendance.present = count,
            Ok(AttendanceStatus::Absent) => attendance.absent = count,
            _ => {}
        }
    }

    let mut leaves = LeaveSnapshot::default();
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT status, COUNT(*) FROM leave_requests WHERE hr_id = ? GROUP BY status",
    )
    .bind(hr_id)
    .fetch_all(pool.get_ref())
    .await?;
    for (status, count) in rows {
        match LeaveStatus::from_str(&status) {
            Ok(LeaveStatus::Pending) => leaves.pending = count,
            Ok(LeaveStatus::Approved) => leaves.approved = count,
            _ => {}
        }
    }

    let mut payroll = PayrollSnapshot::default();
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT status, COUNT(*) FROM payrolls WHERE hr_id = ? AND month = ? AND year = ? GROUP BY status",
    )
    .bind(hr_id)
    .bind(today.month())
    .bind(today.year())
    .fetch_all(pool.get_ref())
    .await?;
    for (status, count) in rows {
        payroll.total += count;
        if status == PayrollStatus::Paid.to_string() {
            payroll.paid = count;
        }
    }

    let paid_sum: f64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(net_salary), 0) FROM payrolls \
         WHERE hr_id = ? AND month = ? AND year = ? AND status = ?",
    )
    .bind(hr_id)
    .bind(today.month())
    .bind(today.year())
    .bind(PayrollStatus::Paid)
    .fetch_one(pool.get_ref())
    .await?;
    payroll.total_salary_paid = round2(paid_sum);

    Ok(HttpResponse::Ok().json(DashboardReport {
        employees,
        attendance,
        leaves,
        payroll,
    }))
}
