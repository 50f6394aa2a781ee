//! API routes

use crate::api::handlers::{
    // Employee management (HR-scoped)
    list_employees, create_employee, get_employee, update_employee, delete_employee,
    deactivate_employee, reactivate_employee, employee_stats,
    // Module management
    list_modules, create_module, get_module, update_module, update_module_status,
    delete_module, module_stats, list_published_modules,
    // Profiles
    hr_get_profile, hr_update_profile, employee_get_profile, employee_update_profile,
    // System
    health_check,
    AppState,
};
use crate::auth::handlers::{
    hr_register, hr_login, hr_forgot_password, hr_reset_password, hr_change_password,
    hr_current_profile, employee_login, verify_setup_token, employee_set_password,
    employee_change_password,
};
use crate::auth::middleware::{authorize, GuardPolicy};
use axum::{
    extract::Request,
    middleware::{self, Next},
    routing::{get, patch, post, put},
    Router,
};

/// Build the API routes
pub fn build_api_routes(state: AppState) -> Router {
    let hr_guard = {
        let state = state.clone();
        middleware::from_fn(move |request: Request, next: Next| {
            let state = state.clone();
            async move { authorize(state, GuardPolicy::hr(), request, next).await }
        })
    };

    let employee_guard = {
        let state = state.clone();
        middleware::from_fn(move |request: Request, next: Next| {
            let state = state.clone();
            async move { authorize(state, GuardPolicy::employee(), request, next).await }
        })
    };

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/hr/register", post(hr_register))
        .route("/api/hr/login", post(hr_login))
        .route("/api/hr/forgot-password", post(hr_forgot_password))
        .route("/api/hr/reset-password", post(hr_reset_password))
        .route("/api/employee/login", post(employee_login))
        .route("/api/employee/set-password", post(employee_set_password))
        .route("/api/employee/verify-password-token/:token", get(verify_setup_token))
        // Health check (public)
        .route("/api/health", get(health_check))
        .route("/health", get(health_check));

    // HR-only routes
    let hr_routes = Router::new()
        .route("/api/hr/profile", get(hr_current_profile))
        .route("/api/hr/change-password", post(hr_change_password))
        .route("/api/hr/profile/:id", get(hr_get_profile).put(hr_update_profile))
        // Employee management
        .route("/api/hr/employees", get(list_employees).post(create_employee))
        .route("/api/hr/employees/stats", get(employee_stats))
        .route(
            "/api/hr/employees/:id",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
        .route("/api/hr/employees/:id/deactivate", put(deactivate_employee))
        .route("/api/hr/employees/:id/reactivate", put(reactivate_employee))
        // Module management
        .route("/api/hr/modules", get(list_modules).post(create_module))
        .route("/api/hr/modules/stats", get(module_stats))
        .route(
            "/api/hr/modules/:id",
            get(get_module).put(update_module).delete(delete_module),
        )
        .route("/api/hr/modules/:id/status", patch(update_module_status))
        .layer(hr_guard);

    // Employee-only routes
    let employee_routes = Router::new()
        .route("/api/modules", get(list_published_modules))
        .route(
            "/api/employee/profile",
            get(employee_get_profile).put(employee_update_profile),
        )
        .route("/api/employee/change-password", post(employee_change_password))
        .layer(employee_guard);

    // Combine route groups
    public_routes
        .merge(hr_routes)
        .merge(employee_routes)
        .with_state(state)
}
