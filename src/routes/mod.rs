pub mod contact;
pub mod products;
pub mod users;

use axum::routing::{get, patch, post, put};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Users
        .route(
            "/api/users",
            get(users::get_profile).patch(users::update_profile),
        )
        .route("/api/users/register", post(users::register))
        .route("/api/users/login", post(users::login))
        .route("/api/users/logout", get(users::logout))
        .route("/api/users/loginstatus", get(users::login_status))
        .route(
            "/api/users/changepassword",
            patch(users::change_password),
        )
        .route("/api/users/forgotpassword", post(users::forgot_password))
        .route(
            "/api/users/resetpassword/{reset_token}",
            put(users::reset_password),
        )
        // Products
        .route(
            "/api/products",
            get(products::list).post(products::create),
        )
        .route(
            "/api/products/{id}",
            get(products::get)
                .patch(products::update)
                .delete(products::delete),
        )
        // Contact
        .route("/api/contactus", post(contact::send))
}
