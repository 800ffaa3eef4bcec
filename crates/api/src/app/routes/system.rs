use axum::{http::StatusCode, Json};

pub async fn root() -> Json<&'static str> {
    Json("Valar Morghulis")
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}
