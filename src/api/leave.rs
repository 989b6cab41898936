use crate::{
    api::employee,
    auth::auth::AuthUser,
    domain::time::{day_count_inclusive, overlap_days},
    error::ApiError,
    model::employee::EmploymentStatus,
    model::leave::{LeaveRequest, LeaveStatus, LeaveType},
    utils::db_utils::QueryArg,
};
use actix_web::{HttpResponse, web};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use std::str::FromStr;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = 1000)]
    pub employee_id: u64,
    pub leave_type: LeaveType,
    #[schema(example = "2026-03-10", value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(example = "2026-03-12", value_type = String, format = "date")]
    pub end_date: NaiveDate,
    #[schema(example = "Family emergency")]
    pub reason: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RejectLeave {
    pub rejection_reason: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateLeave {
    pub leave_type: Option<LeaveType>,
    #[schema(value_type = Option<String>, format = "date")]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
    pub reason: Option<String>,
    /// Approved/Rejected are only reachable through the approve/reject
    /// actions
    pub status: Option<LeaveStatus>,
}

#[derive(Deserialize, IntoParams)]
pub struct LeaveFilter {
    pub employee_id: Option<u64>,
    pub status: Option<LeaveStatus>,
    /// Matches requests whose interval overlaps [start_date, end_date]
    #[param(value_type = Option<String>, format = "date")]
    pub start_date: Option<NaiveDate>,
    #[param(value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[derive(Deserialize, IntoParams)]
pub struct LeaveStatsQuery {
    pub employee_id: Option<u64>,
    pub year: Option<i32>,
}

#[derive(Default, Serialize, ToSchema)]
pub struct LeaveStats {
    pub total_requests: i64,
    pub pending_count: i64,
    pub approved_count: i64,
    pub rejected_count: i64,
    pub cancelled_count: i64,
    /// Sum of total_days over Approved requests
    pub total_approved_days: i64,
}

async fn fetch_request(
    pool: &MySqlPool,
    id: u64,
    hr_id: u64,
) -> Result<Option<LeaveRequest>, sqlx::Error> {
    sqlx::query_as::<_, LeaveRequest>("SELECT * FROM leave_requests WHERE id = ? AND hr_id = ?")
        .bind(id)
        .bind(hr_id)
        .fetch_optional(pool)
        .await
}

/// Approved leave days of one employee clamped to a period; feeds payroll
/// generation.
pub(crate) async fn approved_days_overlapping(
    pool: &MySqlPool,
    employee_id: u64,
    hr_id: u64,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> Result<i64, sqlx::Error> {
    let intervals: Vec<(NaiveDate, NaiveDate)> = sqlx::query_as(
        r#"
        SELECT start_date, end_date
        FROM leave_requests
        WHERE employee_id = ? AND hr_id = ? AND status = ?
          AND start_date <= ? AND end_date >= ?
        "#,
    )
    .bind(employee_id)
    .bind(hr_id)
    .bind(LeaveStatus::Approved)
    .bind(period_end)
    .bind(period_start)
    .fetch_all(pool)
    .await?;

    Ok(intervals
        .iter()
        .map(|(start, end)| overlap_days(*start, *end, period_start, period_end))
        .sum())
}

/// Apply for leave
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body = CreateLeave,
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveRequest),
        (status = 400, description = "Missing fields or end date before start date"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn apply_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;
    let hr_id = auth.user_id;

    if payload.reason.trim().is_empty() {
        return Err(ApiError::Validation("Reason is required".into()));
    }
    if payload.end_date < payload.start_date {
        return Err(ApiError::Validation(
            "End date must be after start date".into(),
        ));
    }

    let employee = employee::find_scoped(pool.get_ref(), payload.employee_id, hr_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Employee not found".into()))?;

    let total_days = day_count_inclusive(payload.start_date, payload.end_date);

    let result = sqlx::query(
        r#"
        INSERT INTO leave_requests
        (employee_id, hr_id, leave_type, start_date, end_date, total_days, reason, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee.id)
    .bind(hr_id)
    .bind(payload.leave_type)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(total_days)
    .bind(&payload.reason)
    .bind(LeaveStatus::Pending)
    .execute(pool.get_ref())
    .await?;

    let leave = fetch_request(pool.get_ref(), result.last_insert_id(), hr_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Leave request not found".into()))?;

    info!(employee_id = employee.id, total_days, "Leave request submitted");
    Ok(HttpResponse::Created().json(json!({
        "message": "Leave request submitted",
        "data": leave
    })))
}

/// List leave requests
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;
    let hr_id = auth.user_id;

    let per_page = query.per_page.unwrap_or(15).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE hr_id = ?");
    let mut args: Vec<QueryArg> = vec![QueryArg::U64(hr_id)];

    if let Some(employee_id) = query.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(QueryArg::U64(employee_id));
    }
    if let Some(status) = query.status {
        where_sql.push_str(" AND status = ?");
        args.push(QueryArg::Str(status.to_string()));
    }
    // interval-overlap semantics: a request matches when it intersects the
    // queried window
    if let Some(end) = query.end_date {
        where_sql.push_str(" AND start_date <= ?");
        args.push(QueryArg::Date(end));
    }
    if let Some(start) = query.start_date {
        where_sql.push_str(" AND end_date >= ?");
        args.push(QueryArg::Date(start));
    }

    let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            QueryArg::U64(v) => count_q.bind(*v),
            QueryArg::Str(s) => count_q.bind(s.clone()),
            QueryArg::Date(d) => count_q.bind(*d),
        };
    }
    let total = count_q.fetch_one(pool.get_ref()).await?;

    let data_sql = format!(
        "SELECT * FROM leave_requests{} ORDER BY id DESC LIMIT ? OFFSET ?",
        where_sql
    );
    let mut data_q = sqlx::query_as::<_, LeaveRequest>(&data_sql);
    for arg in &args {
        data_q = match arg {
            QueryArg::U64(v) => data_q.bind(*v),
            QueryArg::Str(s) => data_q.bind(s.clone()),
            QueryArg::Date(d) => data_q.bind(*d),
        };
    }
    let leaves = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data: leaves,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/// Get leave request
#[utoipa::path(
    get,
    path = "/api/v1/leave/{id}",
    params(("id" = u64, Path, description = "Leave request ID")),
    responses(
        (status = 200, description = "Leave request", body = LeaveRequest),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let leave = fetch_request(pool.get_ref(), path.into_inner(), auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Leave request not found".into()))?;

    Ok(HttpResponse::Ok().json(leave))
}

/// Zero rows from the guarded approve/reject update means either an unknown
/// id or a request that already left Pending; tell the two apart.
async fn processed_or_missing(pool: &MySqlPool, id: u64, hr_id: u64) -> Result<ApiError, ApiError> {
    Ok(match fetch_request(pool, id, hr_id).await? {
        Some(_) => ApiError::Conflict("Leave request already processed".into()),
        None => ApiError::NotFound("Leave request not found".into()),
    })
}

/// Approve leave
#[utoipa::path(
    put,
    path = "/api/v1/leave/{id}/approve",
    params(("id" = u64, Path, description = "Leave request ID")),
    responses(
        (status = 200, description = "Leave approved", body = LeaveRequest),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;
    let hr_id = auth.user_id;
    let leave_id = path.into_inner();

    let now = Local::now().naive_local();
    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?, approved_by = ?, approved_at = ?
        WHERE id = ? AND hr_id = ? AND status = ?
        "#,
    )
    .bind(LeaveStatus::Approved)
    .bind(auth.user_id)
    .bind(now)
    .bind(leave_id)
    .bind(hr_id)
    .bind(LeaveStatus::Pending)
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(processed_or_missing(pool.get_ref(), leave_id, hr_id).await?);
    }

    let leave = fetch_request(pool.get_ref(), leave_id, hr_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Leave request not found".into()))?;

    // the directory only flips to On Leave when the leave is already running
    let today = Local::now().date_naive();
    if leave.start_date <= today && today <= leave.end_date {
        employee::set_employment_status(pool.get_ref(), leave.employee_id, EmploymentStatus::OnLeave)
            .await?;
    }

    info!(leave_id, employee_id = leave.employee_id, "Leave approved");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave approved successfully",
        "data": leave
    })))
}

/// Reject leave
#[utoipa::path(
    put,
    path = "/api/v1/leave/{id}/reject",
    params(("id" = u64, Path, description = "Leave request ID")),
    request_body = RejectLeave,
    responses(
        (status = 200, description = "Leave rejected", body = LeaveRequest),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: Option<web::Json<RejectLeave>>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;
    let hr_id = auth.user_id;
    let leave_id = path.into_inner();

    let rejection_reason = payload
        .as_ref()
        .and_then(|p| p.rejection_reason.clone())
        .unwrap_or_else(|| "No reason provided".to_string());

    let now = Local::now().naive_local();
    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?, approved_by = ?, approved_at = ?, rejection_reason = ?
        WHERE id = ? AND hr_id = ? AND status = ?
        "#,
    )
    .bind(LeaveStatus::Rejected)
    .bind(auth.user_id)
    .bind(now)
    .bind(&rejection_reason)
    .bind(leave_id)
    .bind(hr_id)
    .bind(LeaveStatus::Pending)
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(processed_or_missing(pool.get_ref(), leave_id, hr_id).await?);
    }

    let leave = fetch_request(pool.get_ref(), leave_id, hr_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Leave request not found".into()))?;

    info!(leave_id, employee_id = leave.employee_id, "Leave rejected");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave rejected",
        "data": leave
    })))
}

/// Update leave request
#[utoipa::path(
    put,
    path = "/api/v1/leave/{id}",
    params(("id" = u64, Path, description = "Leave request ID")),
    request_body = UpdateLeave,
    responses(
        (status = 200, description = "Leave request updated", body = LeaveRequest),
        (status = 400, description = "Invalid patch"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn update_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateLeave>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;
    let hr_id = auth.user_id;
    let leave_id = path.into_inner();

    if matches!(
        payload.status,
        Some(LeaveStatus::Approved | LeaveStatus::Rejected)
    ) {
        return Err(ApiError::Validation(
            "Use the approve/reject actions to change leave status".into(),
        ));
    }

    let current = fetch_request(pool.get_ref(), leave_id, hr_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Leave request not found".into()))?;

    let leave_type = payload.leave_type.unwrap_or(current.leave_type);
    let start_date = payload.start_date.unwrap_or(current.start_date);
    let end_date = payload.end_date.unwrap_or(current.end_date);
    let reason = payload.reason.clone().unwrap_or(current.reason);
    let status = payload.status.unwrap_or(current.status);

    if end_date < start_date {
        return Err(ApiError::Validation(
            "End date must be after start date".into(),
        ));
    }
    if reason.trim().is_empty() {
        return Err(ApiError::Validation("Reason is required".into()));
    }

    // dates changed, so the derived count changes with them
    let total_days = day_count_inclusive(start_date, end_date);

    sqlx::query(
        r#"
        UPDATE leave_requests
        SET leave_type = ?, start_date = ?, end_date = ?, total_days = ?, reason = ?, status = ?
        WHERE id = ? AND hr_id = ?
        "#,
    )
    .bind(leave_type)
    .bind(start_date)
    .bind(end_date)
    .bind(total_days)
    .bind(&reason)
    .bind(status)
    .bind(leave_id)
    .bind(hr_id)
    .execute(pool.get_ref())
    .await?;

    let leave = fetch_request(pool.get_ref(), leave_id, hr_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Leave request not found".into()))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave request updated successfully",
        "data": leave
    })))
}

/// Delete leave request
#[utoipa::path(
    delete,
    path = "/api/v1/leave/{id}",
    params(("id" = u64, Path, description = "Leave request ID")),
    responses(
        (status = 200, description = "Leave request deleted"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn delete_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let result = sqlx::query("DELETE FROM leave_requests WHERE id = ? AND hr_id = ?")
        .bind(path.into_inner())
        .bind(auth.user_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Leave request not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Leave request deleted successfully" })))
}

/// Leave statistics
#[utoipa::path(
    get,
    path = "/api/v1/leave/statistics",
    params(LeaveStatsQuery),
    responses(
        (status = 200, description = "Counts per status and approved day total", body = LeaveStats)
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_statistics(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveStatsQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;
    let hr_id = auth.user_id;

    let mut where_sql = String::from(" WHERE hr_id = ?");
    let mut args: Vec<QueryArg> = vec![QueryArg::U64(hr_id)];

    if let Some(employee_id) = query.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(QueryArg::U64(employee_id));
    }
    if let Some(year) = query.year {
        where_sql.push_str(" AND start_date BETWEEN ? AND ?");
        args.push(QueryArg::Str(format!("{year}-01-01")));
        args.push(QueryArg::Str(format!("{year}-12-31")));
    }

    let counts_sql = format!(
        "SELECT status, COUNT(*) FROM leave_requests{} GROUP BY status",
        where_sql
    );
    let mut counts_q = sqlx::query_as::<_, (String, i64)>(&counts_sql);
    for arg in &args {
        counts_q = match arg {
            QueryArg::U64(v) => counts_q.bind(*v),
            QueryArg::Str(s) => counts_q.bind(s.clone()),
            QueryArg::Date(d) => counts_q.bind(*d),
        };
    }
    let rows = counts_q.fetch_all(pool.get_ref()).await?;

    let mut stats = LeaveStats::default();
    for (status, count) in rows {
        stats.total_requests += count;
        match LeaveStatus::from_str(&status) {
            Ok(LeaveStatus::Pending) => stats.pending_count = count,
            Ok(LeaveStatus::Approved) => stats.approved_count = count,
            Ok(LeaveStatus::Rejected) => stats.rejected_count = count,
            Ok(LeaveStatus::Cancelled) => stats.cancelled_count = count,
            Err(_) => {}
        }
    }

    let days_sql = format!(
        "SELECT CAST(COALESCE(SUM(total_days), 0) AS SIGNED) FROM leave_requests{} AND status = ?",
        where_sql
    );
    let mut days_q = sqlx::query_scalar::<_, i64>(&days_sql);
    for arg in &args {
        days_q = match arg {
            QueryArg::U64(v) => days_q.bind(*v),
            QueryArg::Str(s) => days_q.bind(s.clone()),
            QueryArg::Date(d) => days_q.bind(*d),
        };
    }
    stats.total_approved_days = days_q
        .bind(LeaveStatus::Approved)
        .fetch_one(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(stats))
}
