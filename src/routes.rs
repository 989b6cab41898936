use crate::{
    api::{attendance, employee, leave, payroll, reports},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let protected_limiter = build_limiter(config.rate_protected_per_min);

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(protected_limiter)
            .service(
                web::scope("/employees")
                    // /employees
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employees/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(employee::get_employee))
                            .route(web::put().to(employee::update_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    // /attendance/check-in, /attendance/check-out
                    .service(
                        web::resource("/check-in").route(web::post().to(attendance::check_in)),
                    )
                    .service(
                        web::resource("/check-out").route(web::post().to(attendance::check_out)),
                    )
                    // /attendance/statistics
                    .service(
                        web::resource("/statistics")
                            .route(web::get().to(attendance::attendance_statistics)),
                    )
                    // /attendance
                    .service(web::resource("").route(web::get().to(attendance::list_attendance)))
                    // /attendance/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(attendance::get_attendance))
                            .route(web::put().to(attendance::update_attendance))
                            .route(web::delete().to(attendance::delete_attendance)),
                    ),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::post().to(leave::apply_leave))
                            .route(web::get().to(leave::leave_list)),
                    )
                    // /leave/statistics
                    .service(
                        web::resource("/statistics")
                            .route(web::get().to(leave::leave_statistics)),
                    )
                    // /leave/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(leave::get_leave))
                            .route(web::put().to(leave::update_leave))
                            .route(web::delete().to(leave::delete_leave)),
                    )
                    // /leave/{id}/approve, /leave/{id}/reject
                    .service(
                        web::resource("/{id}/approve").route(web::put().to(leave::approve_leave)),
                    )
                    .service(
                        web::resource("/{id}/reject").route(web::put().to(leave::reject_leave)),
                    ),
            )
            .service(
                web::scope("/payroll")
                    // /payroll
                    .service(
                        web::resource("")
                            .route(web::post().to(payroll::generate_payroll))
                            .route(web::get().to(payroll::list_payrolls)),
                    )
                    // /payroll/statistics
                    .service(
                        web::resource("/statistics")
                            .route(web::get().to(payroll::payroll_statistics)),
                    )
                    // /payroll/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(payroll::get_payroll))
                            .route(web::put().to(payroll::update_payroll))
                            .route(web::delete().to(payroll::delete_payroll)),
                    )
                    // /payroll/{id}/mark-paid
                    .service(
                        web::resource("/{id}/mark-paid").route(web::put().to(payroll::mark_paid)),
                    ),
            )
            .service(
                web::scope("/reports")
                    .service(
                        web::resource("/dashboard").route(web::get().to(reports::dashboard)),
                    ),
            ),
    );
}
