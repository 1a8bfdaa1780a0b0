//! HTTP inbound adapter exposing the timetable REST API under `/api/v1`.

pub mod classrooms;
pub mod dto;
pub mod error;
pub mod grid;
pub mod health;
pub mod login;
pub mod memberships;
pub mod organisations;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
pub mod teachers;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;

use actix_web::web;

/// Register extractor error handlers and every `/api/v1` route.
///
/// Mount inside a scope that already carries the session middleware.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .app_data(web::PathConfig::default().error_handler(error::path_error_handler))
        .app_data(web::QueryConfig::default().error_handler(error::query_error_handler))
        .service(login::login)
        .service(login::logout)
        .service(teachers::register_teacher)
        .service(teachers::get_teacher)
        .service(organisations::create_organisation)
        .service(organisations::list_organisations)
        .service(organisations::get_organisation)
        .service(organisations::update_organisation)
        .service(organisations::delete_organisation)
        .service(organisations::update_organisation_shape)
        .service(organisations::get_organisation_stats)
        .service(classrooms::create_classroom)
        .service(classrooms::get_classroom)
        .service(classrooms::update_classroom)
        .service(classrooms::remove_classroom)
        .service(grid::set_grid_cell)
        .service(memberships::list_teachers)
        .service(memberships::add_membership)
        .service(memberships::update_membership)
        .service(memberships::remove_membership)
        .service(memberships::get_teacher_schedule);
}
