use crate::{
    auth::auth::AuthUser,
    error::{ApiError, is_duplicate_entry},
    model::employee::{Employee, EmploymentStatus},
    utils::db_utils::{QueryArg, build_scoped_update_sql, execute_update},
};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use std::str::FromStr;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateEmployee {
    /// Generated as EMP-xxxxx when omitted
    pub employee_code: Option<String>,
    #[schema(example = "John")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "john.doe@company.com", format = "email")]
    pub email: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub job_title: Option<String>,
    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub hire_date: NaiveDate,
    #[schema(example = 3000.0)]
    pub salary: f64,
}

#[derive(Deserialize, IntoParams)]
pub struct EmployeeFilter {
    pub department: Option<String>,
    pub status: Option<EmploymentStatus>,
    /// Matches against name and email
    pub search: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// Scoped directory lookup used by every ledger before touching an
/// employee's records.
pub(crate) async fn find_scoped(
    pool: &MySqlPool,
    employee_id: u64,
    hr_id: u64,
) -> Result<Option<Employee>, sqlx::Error> {
    sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ? AND hr_id = ?")
        .bind(employee_id)
        .bind(hr_id)
        .fetch_optional(pool)
        .await
}

/// Directory side effect consumed by leave approval.
pub(crate) async fn set_employment_status(
    pool: &MySqlPool,
    employee_id: u64,
    status: EmploymentStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE employees SET employment_status = ? WHERE id = ?")
        .bind(status)
        .bind(employee_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Create employee
#[utoipa::path(
    post,
    path = "/api/v1/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Missing or malformed fields"),
        (status = 409, description = "Employee code already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;
    let hr_id = auth.user_id;

    for (field, value) in [
        ("first_name", &payload.first_name),
        ("last_name", &payload.last_name),
        ("email", &payload.email),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::Validation(format!("{} is required", field)));
        }
    }

    let employee_code = match &payload.employee_code {
        Some(code) => code.clone(),
        None => {
            let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
                .fetch_one(pool.get_ref())
                .await?;
            format!("EMP-{:05}", count + 1)
        }
    };

    let result = sqlx::query(
        r#"
        INSERT INTO employees
        (hr_id, employee_code, first_name, last_name, email, phone, department, job_title, hire_date, salary, employment_status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(hr_id)
    .bind(&employee_code)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(&payload.department)
    .bind(&payload.job_title)
    .bind(payload.hire_date)
    .bind(payload.salary)
    .bind(EmploymentStatus::Active)
    .execute(pool.get_ref())
    .await;

    let id = match result {
        Ok(r) => r.last_insert_id(),
        Err(e) if is_duplicate_entry(&e) => {
            return Err(ApiError::Conflict("Employee code already exists".into()));
        }
        Err(e) => return Err(e.into()),
    };

    let employee = find_scoped(pool.get_ref(), id, hr_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Employee not found".into()))?;

    info!(employee_id = id, %employee_code, "Employee created");
    Ok(HttpResponse::Created().json(json!({
        "message": "Employee created successfully",
        "data": employee
    })))
}

/// List employees
#[utoipa::path(
    get,
    path = "/api/v1/employees",
    params(EmployeeFilter),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeFilter>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;
    let hr_id = auth.user_id;

    let per_page = query.per_page.unwrap_or(15).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE hr_id = ?");
    let mut args: Vec<QueryArg> = vec![QueryArg::U64(hr_id)];

    if let Some(department) = &query.department {
        where_sql.push_str(" AND department = ?");
        args.push(QueryArg::Str(department.clone()));
    }

    if let Some(status) = query.status {
        where_sql.push_str(" AND employment_status = ?");
        args.push(QueryArg::Str(status.to_string()));
    }

    if let Some(search) = &query.search {
        where_sql.push_str(" AND (first_name LIKE ? OR last_name LIKE ? OR email LIKE ?)");
        let like = format!("%{}%", search);
        args.push(QueryArg::Str(like.clone()));
        args.push(QueryArg::Str(like.clone()));
        args.push(QueryArg::Str(like));
    }

    let count_sql = format!("SELECT COUNT(*) FROM employees{}", where_sql);
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
        "SELECT * FROM employees{} ORDER BY id DESC LIMIT ? OFFSET ?",
        where_sql
    );
    let mut data_q = sqlx::query_as::<_, Employee>(&data_sql);
    for arg in &args {
        data_q = match arg {
            QueryArg::U64(v) => data_q.bind(*v),
            QueryArg::Str(s) => data_q.bind(s.clone()),
            QueryArg::Date(d) => data_q.bind(*d),
        };
    }
    let employees = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/// Get employee by id
#[utoipa::path(
    get,
    path = "/api/v1/employees/{id}",
    params(("id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let employee = find_scoped(pool.get_ref(), path.into_inner(), auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Employee not found".into()))?;

    Ok(HttpResponse::Ok().json(employee))
}

const EMPLOYEE_PATCH_COLUMNS: &[&str] = &[
    "employee_code",
    "first_name",
    "last_name",
    "email",
    "phone",
    "department",
    "job_title",
    "hire_date",
    "salary",
    "employment_status",
];

/// Update employee
#[utoipa::path(
    put,
    path = "/api/v1/employees/{id}",
    params(("id" = u64, Path, description = "Employee ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 400, description = "Invalid patch"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;
    let hr_id = auth.user_id;
    let employee_id = path.into_inner();

    if let Some(status) = body.get("employment_status") {
        let s = status
            .as_str()
            .ok_or_else(|| ApiError::Validation("employment_status must be a string".into()))?;
        EmploymentStatus::from_str(s).map_err(|_| {
            ApiError::Validation(format!("Invalid employment status '{}'", s))
        })?;
    }

    find_scoped(pool.get_ref(), employee_id, hr_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Employee not found".into()))?;

    let update =
        build_scoped_update_sql("employees", &body, EMPLOYEE_PATCH_COLUMNS, employee_id, hr_id)?;
    execute_update(pool.get_ref(), update).await?;

    let employee = find_scoped(pool.get_ref(), employee_id, hr_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Employee not found".into()))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee updated successfully",
        "data": employee
    })))
}

/// Delete employee
#[utoipa::path(
    delete,
    path = "/api/v1/employees/{id}",
    params(("id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee deleted"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let result = sqlx::query("DELETE FROM employees WHERE id = ? AND hr_id = ?")
        .bind(path.into_inner())
        .bind(auth.user_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Employee not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Employee deleted successfully" })))
}
