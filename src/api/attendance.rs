use crate::{
    api::employee,
    auth::auth::AuthUser,
    domain::attendance::{MINIMUM_SHIFT_MINUTES, checkout_wait_minutes, derive_hours},
    domain::time::{month_bounds, round2},
    error::{ApiError, is_duplicate_entry},
    model::attendance::{AttendanceRecord, AttendanceStatus},
    utils::db_utils::{QueryArg, build_scoped_update_sql, execute_update},
};
use actix_web::{HttpResponse, web};
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use std::str::FromStr;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CheckInRequest {
    #[schema(example = 1000)]
    pub employee_id: u64,
    pub location: Option<GeoLocation>,
}

#[derive(Deserialize, ToSchema)]
pub struct CheckOutRequest {
    #[schema(example = 1000)]
    pub employee_id: u64,
}

#[derive(Deserialize, IntoParams)]
pub struct AttendanceFilter {
    pub employee_id: Option<u64>,
    pub status: Option<AttendanceStatus>,
    #[param(value_type = Option<String>, format = "date")]
    pub start_date: Option<NaiveDate>,
    #[param(value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<AttendanceRecord>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[derive(Deserialize, IntoParams)]
pub struct AttendanceStatsQuery {
    pub employee_id: Option<u64>,
    /// 1-12; requires `year`
    pub month: Option<u32>,
    pub year: Option<i32>,
}

#[derive(Default, Serialize, ToSchema)]
pub struct AttendanceStats {
    pub total_records: i64,
    pub present_count: i64,
    pub absent_count: i64,
    pub late_count: i64,
    pub half_day_count: i64,
    pub holiday_count: i64,
    pub leave_count: i64,
    pub total_working_hours: f64,
    pub total_overtime_hours: f64,
}

async fn fetch_record(
    pool: &MySqlPool,
    id: u64,
    hr_id: u64,
) -> Result<Option<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>("SELECT * FROM attendance WHERE id = ? AND hr_id = ?")
        .bind(id)
        .bind(hr_id)
        .fetch_optional(pool)
        .await
}

async fn fetch_today(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
    hr_id: u64,
) -> Result<Option<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(
        "SELECT * FROM attendance WHERE employee_id = ? AND date = ? AND hr_id = ?",
    )
    .bind(employee_id)
    .bind(date)
    .bind(hr_id)
    .fetch_optional(pool)
    .await
}

/// Check-in
#[utoipa::path(
    post,
    path = "/api/v1/attendance/check-in",
    request_body = CheckInRequest,
    responses(
        (status = 200, description = "Checked in successfully", body = AttendanceRecord),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Already checked in for today")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CheckInRequest>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;
    let hr_id = auth.user_id;

    let employee = employee::find_scoped(pool.get_ref(), payload.employee_id, hr_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Employee not found".into()))?;

    let now = Local::now().naive_local();
    let today = now.date();

    let (latitude, longitude, address) = match &payload.location {
        Some(l) => (Some(l.latitude), Some(l.longitude), l.address.clone()),
        None => (None, None, None),
    };

    let record_id = match fetch_today(pool.get_ref(), employee.id, today, hr_id).await? {
        Some(rec) if rec.check_in.is_some() => {
            return Err(ApiError::Conflict("Already checked in for today".into()));
        }
        Some(rec) => {
            // a row pre-created by a manual edit; fill in the check-in.
            // The check_in IS NULL guard closes the race with a concurrent
            // check-in hitting the same row.
            let result = sqlx::query(
                r#"
                UPDATE attendance
                SET check_in = ?, status = ?,
                    latitude = COALESCE(?, latitude),
                    longitude = COALESCE(?, longitude),
                    address = COALESCE(?, address)
                WHERE id = ? AND check_in IS NULL
                "#,
            )
            .bind(now)
            .bind(AttendanceStatus::Present)
            .bind(latitude)
            .bind(longitude)
            .bind(address)
            .bind(rec.id)
            .execute(pool.get_ref())
            .await?;

            if result.rows_affected() == 0 {
                return Err(ApiError::Conflict("Already checked in for today".into()));
            }
            rec.id
        }
        None => {
            let result = sqlx::query(
                r#"
                INSERT INTO attendance
                (employee_id, hr_id, date, check_in, status, latitude, longitude, address)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(employee.id)
            .bind(hr_id)
            .bind(today)
            .bind(now)
            .bind(AttendanceStatus::Present)
            .bind(latitude)
            .bind(longitude)
            .bind(address)
            .execute(pool.get_ref())
            .await;

            match result {
                Ok(r) => r.last_insert_id(),
                // the (employee_id, date) unique key serializes concurrent
                // first check-ins
                Err(e) if is_duplicate_entry(&e) => {
                    return Err(ApiError::Conflict("Already checked in for today".into()));
                }
                Err(e) => return Err(e.into()),
            }
        }
    };

    let record = fetch_record(pool.get_ref(), record_id, hr_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Attendance record not found".into()))?;

    info!(employee_id = employee.id, "Employee checked in");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Checked in successfully",
        "data": record
    })))
}

/// Check-out
#[utoipa::path(
    post,
    path = "/api/v1/attendance/check-out",
    request_body = CheckOutRequest,
    responses(
        (status = 200, description = "Checked out successfully", body = AttendanceRecord),
        (status = 404, description = "No check-in found for today"),
        (status = 409, description = "Already checked out for today"),
        (status = 422, description = "Minimum shift duration not met")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CheckOutRequest>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;
    let hr_id = auth.user_id;

    let now = Local::now().naive_local();
    let today = now.date();

    let record = fetch_today(pool.get_ref(), payload.employee_id, today, hr_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No check-in found for today".into()))?;

    if record.check_out.is_some() {
        return Err(ApiError::Conflict("Already checked out for today".into()));
    }

    let check_in = record
        .check_in
        .ok_or_else(|| ApiError::NotFound("No check-in found for today".into()))?;

    if let Some(wait) = checkout_wait_minutes(check_in, now) {
        return Err(ApiError::PolicyViolation(format!(
            "You must work for at least {MINIMUM_SHIFT_MINUTES} minutes before checking out. \
             Please wait {wait} more minute(s)."
        )));
    }

    let (working_hours, overtime_hours) = derive_hours(check_in, now);

    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET check_out = ?, working_hours = ?, overtime_hours = ?
        WHERE id = ? AND check_out IS NULL
        "#,
    )
    .bind(now)
    .bind(working_hours)
    .bind(overtime_hours)
    .bind(record.id)
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::Conflict("Already checked out for today".into()));
    }

    let record = fetch_record(pool.get_ref(), record.id, hr_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Attendance record not found".into()))?;

    info!(employee_id = payload.employee_id, working_hours, "Employee checked out");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Checked out successfully",
        "data": record
    })))
}

/// List attendance records
#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    params(AttendanceFilter),
    responses(
        (status = 200, description = "Paginated attendance list", body = AttendanceListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceFilter>,
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
    if let Some(start) = query.start_date {
        where_sql.push_str(" AND date >= ?");
        args.push(QueryArg::Date(start));
    }
    if let Some(end) = query.end_date {
        where_sql.push_str(" AND date <= ?");
        args.push(QueryArg::Date(end));
    }

    let count_sql = format!("SELECT COUNT(*) FROM attendance{}", where_sql);
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
        "SELECT * FROM attendance{} ORDER BY date DESC LIMIT ? OFFSET ?",
        where_sql
    );
    let mut data_q = sqlx::query_as::<_, AttendanceRecord>(&data_sql);
    for arg in &args {
        data_q = match arg {
            QueryArg::U64(v) => data_q.bind(*v),
            QueryArg::Str(s) => data_q.bind(s.clone()),
            QueryArg::Date(d) => data_q.bind(*d),
        };
    }
    let records = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        data: records,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/// Get attendance record
#[utoipa::path(
    get,
    path = "/api/v1/attendance/{id}",
    params(("id" = u64, Path, description = "Attendance record ID")),
    responses(
        (status = 200, description = "Attendance record", body = AttendanceRecord),
        (status = 404, description = "Attendance record not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn get_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let record = fetch_record(pool.get_ref(), path.into_inner(), auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Attendance record not found".into()))?;

    Ok(HttpResponse::Ok().json(record))
}

const ATTENDANCE_PATCH_COLUMNS: &[&str] = &[
    "date",
    "check_in",
    "check_out",
    "status",
    "notes",
    "latitude",
    "longitude",
    "address",
    "working_hours",
    "overtime_hours",
];

fn merge_instant(
    patched: Option<&Value>,
    current: Option<NaiveDateTime>,
    field: &str,
) -> Result<Option<NaiveDateTime>, ApiError> {
    match patched {
        None => Ok(current),
        Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .map(Some)
            .map_err(|_| {
                ApiError::Validation(format!("{} must be formatted as YYYY-MM-DDTHH:MM:SS", field))
            }),
        Some(_) => Err(ApiError::Validation(format!(
            "{} must be a date-time string",
            field
        ))),
    }
}

/// Manually correct an attendance record
#[utoipa::path(
    put,
    path = "/api/v1/attendance/{id}",
    params(("id" = u64, Path, description = "Attendance record ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Attendance record updated", body = AttendanceRecord),
        (status = 400, description = "Invalid patch"),
        (status = 404, description = "Attendance record not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn update_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;
    let hr_id = auth.user_id;
    let record_id = path.into_inner();

    let record = fetch_record(pool.get_ref(), record_id, hr_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Attendance record not found".into()))?;

    let mut patch = body.into_inner();
    let obj = patch
        .as_object_mut()
        .ok_or_else(|| ApiError::Validation("Payload must be a JSON object".into()))?;

    // derived columns are never accepted from the caller
    obj.remove("working_hours");
    obj.remove("overtime_hours");

    if let Some(status) = obj.get("status") {
        let s = status
            .as_str()
            .ok_or_else(|| ApiError::Validation("status must be a string".into()))?;
        AttendanceStatus::from_str(s)
            .map_err(|_| ApiError::Validation(format!("Invalid attendance status '{}'", s)))?;
    }

    if obj.contains_key("check_in") || obj.contains_key("check_out") {
        let check_in = merge_instant(obj.get("check_in"), record.check_in, "check_in")?;
        let check_out = merge_instant(obj.get("check_out"), record.check_out, "check_out")?;

        match (check_in, check_out) {
            (Some(ci), Some(co)) => {
                if checkout_wait_minutes(ci, co).is_some() {
                    return Err(ApiError::Validation(format!(
                        "check_out must be at least {MINIMUM_SHIFT_MINUTES} minutes after check_in"
                    )));
                }
                let (working_hours, overtime_hours) = derive_hours(ci, co);
                obj.insert("working_hours".into(), json!(working_hours));
                obj.insert("overtime_hours".into(), json!(overtime_hours));
            }
            _ => {
                // pair incomplete after the edit; hours are unknown again
                obj.insert("working_hours".into(), Value::Null);
                obj.insert("overtime_hours".into(), json!(0.0));
            }
        }
    }

    let update =
        build_scoped_update_sql("attendance", &patch, ATTENDANCE_PATCH_COLUMNS, record_id, hr_id)?;
    execute_update(pool.get_ref(), update).await?;

    let record = fetch_record(pool.get_ref(), record_id, hr_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Attendance record not found".into()))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance record updated successfully",
        "data": record
    })))
}

/// Delete attendance record
#[utoipa::path(
    delete,
    path = "/api/v1/attendance/{id}",
    params(("id" = u64, Path, description = "Attendance record ID")),
    responses(
        (status = 200, description = "Attendance record deleted"),
        (status = 404, description = "Attendance record not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn delete_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let result = sqlx::query("DELETE FROM attendance WHERE id = ? AND hr_id = ?")
        .bind(path.into_inner())
        .bind(auth.user_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Attendance record not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Attendance record deleted successfully" })))
}

/// Attendance statistics
#[utoipa::path(
    get,
    path = "/api/v1/attendance/statistics",
    params(AttendanceStatsQuery),
    responses(
        (status = 200, description = "Counts per status and hour totals", body = AttendanceStats),
        (status = 400, description = "Invalid month")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn attendance_statistics(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceStatsQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;
    let hr_id = auth.user_id;

    let mut where_sql = String::from(" WHERE hr_id = ?");
    let mut args: Vec<QueryArg> = vec![QueryArg::U64(hr_id)];

    if let Some(employee_id) = query.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(QueryArg::U64(employee_id));
    }
    if let (Some(month), Some(year)) = (query.month, query.year) {
        let (start, end) = month_bounds(year, month)
            .ok_or_else(|| ApiError::Validation("Month must be between 1 and 12".into()))?;
        where_sql.push_str(" AND date BETWEEN ? AND ?");
        args.push(QueryArg::Date(start));
        args.push(QueryArg::Date(end));
    }

    let counts_sql = format!(
        "SELECT status, COUNT(*) FROM attendance{} GROUP BY status",
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

    let mut stats = AttendanceStats::default();
    for (status, count) in rows {
        stats.total_records += count;
        match AttendanceStatus::from_str(&status) {
            Ok(AttendanceStatus::Present) => stats.present_count = count,
            Ok(AttendanceStatus::Absent) => stats.absent_count = count,
            Ok(AttendanceStatus::Late) => stats.late_count = count,
            Ok(AttendanceStatus::HalfDay) => stats.half_day_count = count,
            Ok(AttendanceStatus::Holiday) => stats.holiday_count = count,
            Ok(AttendanceStatus::Leave) => stats.leave_count = count,
            Err(_) => {}
        }
    }

    let sums_sql = format!(
        "SELECT COALESCE(SUM(working_hours), 0), COALESCE(SUM(overtime_hours), 0) \
         FROM attendance{} AND status = ?",
        where_sql
    );
    let mut sums_q = sqlx::query_as::<_, (f64, f64)>(&sums_sql);
    for arg in &args {
        sums_q = match arg {
            QueryArg::U64(v) => sums_q.bind(*v),
            QueryArg::Str(s) => sums_q.bind(s.clone()),
            QueryArg::Date(d) => sums_q.bind(*d),
        };
    }
    let (working_sum, overtime_sum) = sums_q
        .bind(AttendanceStatus::Present)
        .fetch_one(pool.get_ref())
        .await?;

    stats.total_working_hours = round2(working_sum);
    stats.total_overtime_hours = round2(overtime_sum);

    Ok(HttpResponse::Ok().json(stats))
}
