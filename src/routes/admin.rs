use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Account management, restricted to the `admin` role. The router is wrapped in
/// the admin middleware, which rejects editors with 403 before any handler runs;
/// the handlers take `AdminUser` as well so the check holds wherever they are mounted.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(handlers::users::list_users).post(handlers::users::create_user))
        // DELETE refuses to remove the caller's own account.
        .route(
            "/api/users/{id}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
}
