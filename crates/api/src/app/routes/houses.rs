//! House endpoints. Reads are public; writes need `houses:write`.
//!
//! `GET`/`PUT` address a house by name, `DELETE` and member creation by id.

use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Extension, Json,
};

use westeros_core::HouseId;
use westeros_houses::{Character, CharacterData, House, HouseData};
use westeros_infra::store::Page;

use crate::app::errors::{domain_error_to_response, json_error, store_error_to_response, ApiResult};
use crate::app::services::AppServices;
use crate::context::HousesWrite;
use crate::middleware::Authorized;

const HOUSE_TAKEN: &str = "House already registered";
const HOUSE_NOT_FOUND: &str = "House not found";

fn parse_house_id(raw: &str) -> ApiResult<HouseId> {
    raw.parse::<HouseId>()
        .map_err(|e| json_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
}

pub async fn create_house(
    _auth: Authorized<HousesWrite>,
    Extension(services): Extension<Arc<AppServices>>,
    Json(data): Json<HouseData>,
) -> ApiResult<(StatusCode, Json<House>)> {
    data.validate().map_err(domain_error_to_response)?;

    let existing = services
        .houses
        .get_by_name(&data.name)
        .await
        .map_err(|e| store_error_to_response(e, HOUSE_TAKEN, HOUSE_NOT_FOUND))?;
    if existing.is_some() {
        return Err(json_error(StatusCode::BAD_REQUEST, HOUSE_TAKEN));
    }

    let house = services
        .houses
        .create(data)
        .await
        .map_err(|e| store_error_to_response(e, HOUSE_TAKEN, HOUSE_NOT_FOUND))?;

    tracing::info!(house_id = %house.id, name = %house.name, "house created");
    Ok((StatusCode::CREATED, Json(house)))
}

pub async fn list_houses(
    Extension(services): Extension<Arc<AppServices>>,
    Query(page): Query<Page>,
) -> ApiResult<Json<Vec<House>>> {
    services
        .houses
        .list(page)
        .await
        .map(Json)
        .map_err(|e| store_error_to_response(e, HOUSE_TAKEN, HOUSE_NOT_FOUND))
}

pub async fn get_house(
    Extension(services): Extension<Arc<AppServices>>,
    Path(name): Path<String>,
) -> ApiResult<Json<House>> {
    services
        .houses
        .get_by_name(&name)
        .await
        .map_err(|e| store_error_to_response(e, HOUSE_TAKEN, HOUSE_NOT_FOUND))?
        .map(Json)
        .ok_or_else(|| json_error(StatusCode::NOT_FOUND, HOUSE_NOT_FOUND))
}

pub async fn update_house(
    _auth: Authorized<HousesWrite>,
    Extension(services): Extension<Arc<AppServices>>,
    Path(name): Path<String>,
    Json(data): Json<HouseData>,
) -> ApiResult<Json<House>> {
    data.validate().map_err(domain_error_to_response)?;

    let current = services
        .houses
        .get_by_name(&name)
        .await
        .map_err(|e| store_error_to_response(e, HOUSE_TAKEN, HOUSE_NOT_FOUND))?
        .ok_or_else(|| json_error(StatusCode::NOT_FOUND, HOUSE_NOT_FOUND))?;

    let updated = services
        .houses
        .update(current.id, data)
        .await
        .map_err(|e| store_error_to_response(e, HOUSE_TAKEN, HOUSE_NOT_FOUND))?
        .ok_or_else(|| json_error(StatusCode::NOT_FOUND, HOUSE_NOT_FOUND))?;

    tracing::info!(house_id = %updated.id, name = %updated.name, "house updated");
    Ok(Json(updated))
}

pub async fn delete_house(
    _auth: Authorized<HousesWrite>,
    Extension(services): Extension<Arc<AppServices>>,
    Path(key): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_house_id(&key)?;

    let removed = services
        .houses
        .delete(id)
        .await
        .map_err(|e| store_error_to_response(e, HOUSE_TAKEN, HOUSE_NOT_FOUND))?;
    if removed == 0 {
        return Err(json_error(StatusCode::NOT_FOUND, HOUSE_NOT_FOUND));
    }

    tracing::info!(house_id = %id, "house deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_member(
    _auth: Authorized<HousesWrite>,
    Extension(services): Extension<Arc<AppServices>>,
    Path(key): Path<String>,
    Json(data): Json<CharacterData>,
) -> ApiResult<(StatusCode, Json<Character>)> {
    let house_id = parse_house_id(&key)?;
    data.validate().map_err(domain_error_to_response)?;

    let character = services
        .houses
        .add_member(house_id, data)
        .await
        .map_err(|e| store_error_to_response(e, HOUSE_TAKEN, HOUSE_NOT_FOUND))?;

    tracing::info!(house_id = %house_id, character_id = %character.id, "member added");
    Ok((StatusCode::CREATED, Json(character)))
}
