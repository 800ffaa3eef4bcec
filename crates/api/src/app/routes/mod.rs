use axum::{
    routing::{get, post},
    Router,
};

pub mod auth;
pub mod houses;
pub mod system;
pub mod users;

/// Every endpoint. Authorization is per handler, through the `Authorized`
/// extractor.
pub fn router() -> Router {
    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .route("/login", post(auth::login))
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/", get(users::list_users).post(users::create_user))
        .route("/users/me", get(users::me))
        .route("/users/:id", get(users::get_user).delete(users::delete_user))
        .route("/houses", get(houses::list_houses).post(houses::create_house))
        .route("/houses/", get(houses::list_houses).post(houses::create_house))
        .route(
            "/houses/:key",
            get(houses::get_house)
                .put(houses::update_house)
                .delete(houses::delete_house),
        )
        .route("/houses/:key/members", post(houses::add_member))
        .route("/houses/:key/members/", post(houses::add_member))
}
