use crate::{
    api::{employee, leave},
    auth::auth::AuthUser,
    domain::payroll::{PayrollInputs, compute},
    domain::time::{month_bounds, round2},
    error::{ApiError, is_duplicate_entry},
    model::attendance::AttendanceStatus,
    model::payroll::{PaymentMethod, PayrollStatement, PayrollStatus},
    utils::db_utils::QueryArg,
};
use actix_web::{HttpResponse, web};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct GeneratePayroll {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = 3)]
    pub month: u32,
    #[schema(example = 2026)]
    pub year: u32,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdatePayroll {
    pub basic_salary: Option<f64>,
    pub allowances: Option<f64>,
    pub bonuses: Option<f64>,
    pub overtime_pay: Option<f64>,
    pub total_earnings: Option<f64>,
    pub tax: Option<f64>,
    pub provident_fund: Option<f64>,
    pub insurance: Option<f64>,
    pub leave_deductions: Option<f64>,
    pub other_deductions: Option<f64>,
    pub total_deductions: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct MarkPaid {
    /// Defaults to Bank Transfer
    pub payment_method: Option<PaymentMethod>,
    pub transaction_id: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct PayrollFilter {
    pub employee_id: Option<u64>,
    pub month: Option<u32>,
    pub year: Option<u32>,
    pub status: Option<PayrollStatus>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct PayrollListResponse {
    pub data: Vec<PayrollStatement>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[derive(Deserialize, IntoParams)]
pub struct PayrollStatsQuery {
    pub year: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct PayrollStats {
    pub total_payrolls: i64,
    pub paid_payrolls: i64,
    pub pending_payrolls: i64,
    pub total_salary_paid: f64,
}

async fn fetch_statement(
    pool: &MySqlPool,
    id: u64,
    hr_id: u64,
) -> Result<Option<PayrollStatement>, sqlx::Error> {
    sqlx::query_as::<_, PayrollStatement>("SELECT * FROM payrolls WHERE id = ? AND hr_id = ?")
        .bind(id)
        .bind(hr_id)
        .fetch_optional(pool)
        .await
}

/// Generate payroll for one employee-month
#[utoipa::path(
    post,
    path = "/api/v1/payroll",
    request_body = GeneratePayroll,
    responses(
        (status = 201, description = "Payroll generated", body = PayrollStatement),
        (status = 400, description = "Invalid month or year"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Payroll already generated for this month")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn generate_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<GeneratePayroll>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;
    let hr_id = auth.user_id;

    if payload.year < 1970 || payload.year > 9999 {
        return Err(ApiError::Validation("Year is out of range".into()));
    }
    let (period_start, period_end) = month_bounds(payload.year as i32, payload.month)
        .ok_or_else(|| ApiError::Validation("Month must be between 1 and 12".into()))?;

    let employee = employee::find_scoped(pool.get_ref(), payload.employee_id, hr_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Employee not found".into()))?;

    let present_days: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM attendance
        WHERE employee_id = ? AND hr_id = ? AND date BETWEEN ? AND ? AND status = ?
        "#,
    )
    .bind(employee.id)
    .bind(hr_id)
    .bind(period_start)
    .bind(period_end)
    .bind(AttendanceStatus::Present)
    .fetch_one(pool.get_ref())
    .await?;

    let overtime_hours: f64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(overtime_hours), 0) FROM attendance
        WHERE employee_id = ? AND hr_id = ? AND date BETWEEN ? AND ?
        "#,
    )
    .bind(employee.id)
    .bind(hr_id)
    .bind(period_start)
    .bind(period_end)
    .fetch_one(pool.get_ref())
    .await?;

    let leave_days =
        leave::approved_days_overlapping(pool.get_ref(), employee.id, hr_id, period_start, period_end)
            .await?;

    let breakdown = compute(&PayrollInputs {
        basic_salary: employee.salary,
        present_days,
        leave_days,
        overtime_hours,
    });

    // no existence pre-check: the (employee, month, year) unique key is the
    // only authority, so concurrent generations cannot both succeed
    let result = sqlx::query(
        r#"
        INSERT INTO payrolls
        (employee_id, hr_id, month, year, basic_salary, allowances, bonuses, overtime_pay,
         total_earnings, tax, provident_fund, insurance, leave_deductions, other_deductions,
         total_deductions, net_salary, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee.id)
    .bind(hr_id)
    .bind(payload.month)
    .bind(payload.year)
    .bind(breakdown.basic_salary)
    .bind(breakdown.allowances)
    .bind(breakdown.bonuses)
    .bind(breakdown.overtime_pay)
    .bind(breakdown.total_earnings)
    .bind(breakdown.tax)
    .bind(breakdown.provident_fund)
    .bind(breakdown.insurance)
    .bind(breakdown.leave_deductions)
    .bind(breakdown.other_deductions)
    .bind(breakdown.total_deductions)
    .bind(breakdown.net_salary)
    .bind(PayrollStatus::Generated)
    .execute(pool.get_ref())
    .await;

    let id = match result {
        Ok(r) => r.last_insert_id(),
        Err(e) if is_duplicate_entry(&e) => {
            return Err(ApiError::Conflict(
                "Payroll already generated for this month".into(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    let statement = fetch_statement(pool.get_ref(), id, hr_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payroll not found".into()))?;

    info!(
        employee_id = employee.id,
        month = payload.month,
        year = payload.year,
        net_salary = statement.net_salary,
        "Payroll generated"
    );
    Ok(HttpResponse::Created().json(json!({
        "message": "Payroll generated successfully",
        "data": statement
    })))
}

/// List payrolls
#[utoipa::path(
    get,
    path = "/api/v1/payroll",
    params(PayrollFilter),
    responses(
        (status = 200, description = "Paginated payroll list", body = PayrollListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list_payrolls(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<PayrollFilter>,
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
    if let Some(month) = query.month {
        where_sql.push_str(" AND month = ?");
        args.push(QueryArg::U64(month as u64));
    }
    if let Some(year) = query.year {
        where_sql.push_str(" AND year = ?");
        args.push(QueryArg::U64(year as u64));
    }
    if let Some(status) = query.status {
        where_sql.push_str(" AND status = ?");
        args.push(QueryArg::Str(status.to_string()));
    }

    let count_sql = format!("SELECT COUNT(*) FROM payrolls{}", where_sql);
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
        "SELECT * FROM payrolls{} ORDER BY year DESC, month DESC LIMIT ? OFFSET ?",
        where_sql
    );
    let mut data_q = sqlx::query_as::<_, PayrollStatement>(&data_sql);
    for arg in &args {
        data_q = match arg {
            QueryArg::U64(v) => data_q.bind(*v),
            QueryArg::Str(s) => data_q.bind(s.clone()),
            QueryArg::Date(d) => data_q.bind(*d),
        };
    }
    let statements = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(PayrollListResponse {
        data: statements,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/// Get payroll
#[utoipa::path(
    get,
    path = "/api/v1/payroll/{id}",
    params(("id" = u64, Path, description = "Payroll ID")),
    responses(
        (status = 200, description = "Payroll statement", body = PayrollStatement),
        (status = 404, description = "Payroll not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn get_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let statement = fetch_statement(pool.get_ref(), path.into_inner(), auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payroll not found".into()))?;

    Ok(HttpResponse::Ok().json(statement))
}

/// Update payroll
#[utoipa::path(
    put,
    path = "/api/v1/payroll/{id}",
    params(("id" = u64, Path, description = "Payroll ID")),
    request_body = UpdatePayroll,
    responses(
        (status = 200, description = "Payroll updated", body = PayrollStatement),
        (status = 404, description = "Payroll not found"),
        (status = 409, description = "Payroll already processed")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn update_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdatePayroll>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;
    let hr_id = auth.user_id;
    let payroll_id = path.into_inner();

    let current = fetch_statement(pool.get_ref(), payroll_id, hr_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payroll not found".into()))?;

    // statements are frozen once they leave the editable part of the
    // lifecycle
    if matches!(current.status, PayrollStatus::Paid | PayrollStatus::Cancelled) {
        return Err(ApiError::Conflict("Payroll already processed".into()));
    }

    let basic_salary = body.basic_salary.unwrap_or(current.basic_salary);
    let allowances = body.allowances.unwrap_or(current.allowances);
    let bonuses = body.bonuses.unwrap_or(current.bonuses);
    let overtime_pay = body.overtime_pay.unwrap_or(current.overtime_pay);
    let total_earnings = body.total_earnings.unwrap_or(current.total_earnings);
    let tax = body.tax.unwrap_or(current.tax);
    let provident_fund = body.provident_fund.unwrap_or(current.provident_fund);
    let insurance = body.insurance.unwrap_or(current.insurance);
    let leave_deductions = body.leave_deductions.unwrap_or(current.leave_deductions);
    let other_deductions = body.other_deductions.unwrap_or(current.other_deductions);
    let total_deductions = body.total_deductions.unwrap_or(current.total_deductions);
    let notes = body.notes.clone().or(current.notes);

    // either side moving drags the net with it
    let net_salary = round2(total_earnings - total_deductions);

    sqlx::query(
        r#"
        UPDATE payrolls
        SET basic_salary = ?, allowances = ?, bonuses = ?, overtime_pay = ?, total_earnings = ?,
            tax = ?, provident_fund = ?, insurance = ?, leave_deductions = ?, other_deductions = ?,
            total_deductions = ?, net_salary = ?, notes = ?
        WHERE id = ? AND hr_id = ?
        "#,
    )
    .bind(basic_salary)
    .bind(allowances)
    .bind(bonuses)
    .bind(overtime_pay)
    .bind(total_earnings)
    .bind(tax)
    .bind(provident_fund)
    .bind(insurance)
    .bind(leave_deductions)
    .bind(other_deductions)
    .bind(total_deductions)
    .bind(net_salary)
    .bind(&notes)
    .bind(payroll_id)
    .bind(hr_id)
    .execute(pool.get_ref())
    .await?;

    let statement = fetch_statement(pool.get_ref(), payroll_id, hr_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payroll not found".into()))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Payroll updated successfully",
        "data": statement
    })))
}

/// Mark payroll as paid
#[utoipa::path(
    put,
    path = "/api/v1/payroll/{id}/mark-paid",
    params(("id" = u64, Path, description = "Payroll ID")),
    request_body = MarkPaid,
    responses(
        (status = 200, description = "Payroll marked as paid", body = PayrollStatement),
        (status = 404, description = "Payroll not found"),
        (status = 409, description = "Payroll already processed")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn mark_paid(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: Option<web::Json<MarkPaid>>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;
    let hr_id = auth.user_id;
    let payroll_id = path.into_inner();

    let payment_method = payload
        .as_ref()
        .and_then(|p| p.payment_method)
        .unwrap_or_default();
    let transaction_id = payload.as_ref().and_then(|p| p.transaction_id.clone());
    let now = Local::now().naive_local();

    let result = sqlx::query(
        r#"
        UPDATE payrolls
        SET status = ?, paid_date = ?, payment_method = ?, transaction_id = ?
        WHERE id = ? AND hr_id = ? AND status IN (?, ?)
        "#,
    )
    .bind(PayrollStatus::Paid)
    .bind(now)
    .bind(payment_method)
    .bind(&transaction_id)
    .bind(payroll_id)
    .bind(hr_id)
    .bind(PayrollStatus::Draft)
    .bind(PayrollStatus::Generated)
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(match fetch_statement(pool.get_ref(), payroll_id, hr_id).await? {
            Some(_) => ApiError::Conflict("Payroll already processed".into()),
            None => ApiError::NotFound("Payroll not found".into()),
        });
    }

    let statement = fetch_statement(pool.get_ref(), payroll_id, hr_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payroll not found".into()))?;

    info!(payroll_id, %payment_method, "Payroll marked as paid");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Payroll marked as paid",
        "data": statement
    })))
}

/// Delete payroll
#[utoipa::path(
    delete,
    path = "/api/v1/payroll/{id}",
    params(("id" = u64, Path, description = "Payroll ID")),
    responses(
        (status = 200, description = "Payroll deleted"),
        (status = 404, description = "Payroll not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn delete_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let result = sqlx::query("DELETE FROM payrolls WHERE id = ? AND hr_id = ?")
        .bind(path.into_inner())
        .bind(auth.user_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Payroll not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Payroll deleted successfully" })))
}

/// Payroll statistics
#[utoipa::path(
    get,
    path = "/api/v1/payroll/statistics",
    params(PayrollStatsQuery),
    responses(
        (status = 200, description = "Counts and total net salary paid", body = PayrollStats)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn payroll_statistics(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<PayrollStatsQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;
    let hr_id = auth.user_id;

    let mut where_sql = String::from(" WHERE hr_id = ?");
    let mut args: Vec<QueryArg> = vec![QueryArg::U64(hr_id)];
    if let Some(year) = query.year {
        where_sql.push_str(" AND year = ?");
        args.push(QueryArg::U64(year as u64));
    }

    let counts_sql = format!(
        "SELECT status, COUNT(*) FROM payrolls{} GROUP BY status",
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

    let mut total_payrolls = 0;
    let mut paid_payrolls = 0;
    let mut pending_payrolls = 0;
    for (status, count) in rows {
        total_payrolls += count;
        match status.as_str() {
            "Paid" => paid_payrolls = count,
            "Generated" => pending_payrolls = count,
            _ => {}
        }
    }

    let paid_sql = format!(
        "SELECT COALESCE(SUM(net_salary), 0) FROM payrolls{} AND status = ?",
        where_sql
    );
    let mut paid_q = sqlx::query_scalar::<_, f64>(&paid_sql);
    for arg in &args {
        paid_q = match arg {
            QueryArg::U64(v) => paid_q.bind(*v),
            QueryArg::Str(s) => paid_q.bind(s.clone()),
            QueryArg::Date(d) => paid_q.bind(*d),
        };
    }
    let total_salary_paid = paid_q
        .bind(PayrollStatus::Paid)
        .fetch_one(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(PayrollStats {
        total_payrolls,
        paid_payrolls,
        pending_payrolls,
        total_salary_paid: round2(total_salary_paid),
    }))
}
