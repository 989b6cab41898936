use crate::api::attendance::{
    AttendanceListResponse, AttendanceStats, CheckInRequest, CheckOutRequest, GeoLocation,
};
use crate::api::employee::{CreateEmployee, EmployeeListResponse};
use crate::api::leave::{
    CreateLeave, LeaveListResponse, LeaveStats, RejectLeave, UpdateLeave,
};
use crate::api::payroll::{
    GeneratePayroll, MarkPaid, PayrollListResponse, PayrollStats, UpdatePayroll,
};
use crate::api::reports::{
    AttendanceSnapshot, DashboardReport, EmployeeHeadcount, LeaveSnapshot, PayrollSnapshot,
};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::employee::{Employee, EmploymentStatus};
use crate::model::leave::{LeaveRequest, LeaveStatus, LeaveType};
use crate::model::payroll::{PaymentMethod, PayrollStatement, PayrollStatus};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HR Operations API",
        version = "1.0.0",
        description = r#"
## HR back-office API

Employee records, attendance, leave, and payroll management scoped to the
authenticated HR account.

### 🔹 Key Features
- **Employee Directory**
  - Create, update, list, and view employee profiles
- **Attendance**
  - Daily check-in/check-out with derived working and overtime hours
- **Leave**
  - Apply, approve/reject, and track approved leave days
- **Payroll**
  - Generate reconciled monthly statements and mark them paid
- **Reports**
  - Cross-ledger dashboard roll-up

### 🔐 Security
All endpoints require **JWT Bearer authentication** with an HR or Admin role.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    modifiers(&SecurityAddon),
    paths(
        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::list_attendance,
        crate::api::attendance::get_attendance,
        crate::api::attendance::update_attendance,
        crate::api::attendance::delete_attendance,
        crate::api::attendance::attendance_statistics,

        crate::api::leave::apply_leave,
        crate::api::leave::leave_list,
        crate::api::leave::get_leave,
        crate::api::leave::approve_leave,
        crate::api::leave::reject_leave,
        crate::api::leave::update_leave,
        crate::api::leave::delete_leave,
        crate::api::leave::leave_statistics,

        crate::api::payroll::generate_payroll,
        crate::api::payroll::list_payrolls,
        crate::api::payroll::get_payroll,
        crate::api::payroll::update_payroll,
        crate::api::payroll::mark_paid,
        crate::api::payroll::delete_payroll,
        crate::api::payroll::payroll_statistics,

        crate::api::reports::dashboard
    ),
    components(
        schemas(
            Employee,
            EmploymentStatus,
            CreateEmployee,
            EmployeeListResponse,

            AttendanceRecord,
            AttendanceStatus,
            CheckInRequest,
            CheckOutRequest,
            GeoLocation,
            AttendanceListResponse,
            AttendanceStats,

            LeaveRequest,
            LeaveStatus,
            LeaveType,
            CreateLeave,
            RejectLeave,
            UpdateLeave,
            LeaveListResponse,
            LeaveStats,

            PayrollStatement,
            PayrollStatus,
            PaymentMethod,
            GeneratePayroll,
            UpdatePayroll,
            MarkPaid,
            PayrollListResponse,
            PayrollStats,

            DashboardReport,
            EmployeeHeadcount,
            AttendanceSnapshot,
            LeaveSnapshot,
            PayrollSnapshot
        )
    ),
    tags(
        (name = "Employee", description = "Employee directory APIs"),
        (name = "Attendance", description = "Attendance ledger APIs"),
        (name = "Leave", description = "Leave ledger APIs"),
        (name = "Payroll", description = "Payroll engine APIs"),
        (name = "Reports", description = "Cross-ledger reporting APIs"),
    )
)]
pub struct ApiDoc;
