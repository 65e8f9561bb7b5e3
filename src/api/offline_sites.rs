use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::RequireAdmin;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::offline_site::{OfflineSiteCreate, OfflineSiteResponse, OfflineSiteUpdate};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_active_sites).post(create_site))
        .route("/admin/all", get(list_all_sites))
        .route("/:site_id", get(get_site).put(update_site).delete(delete_site))
}

async fn list_active_sites(
    State(state): State<AppState>,
) -> Result<Json<Vec<OfflineSiteResponse>>, ApiError> {
    let sites = repositories::offline_sites::list(state.db(), true)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list offline sites"))?;

    Ok(Json(sites.into_iter().map(OfflineSiteResponse::from_db).collect()))
}

async fn list_all_sites(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<OfflineSiteResponse>>, ApiError> {
    let sites = repositories::offline_sites::list(state.db(), false)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list offline sites"))?;

    Ok(Json(sites.into_iter().map(OfflineSiteResponse::from_db).collect()))
}

/// Inactive sites are hidden from the public listing and lookups.
async fn get_site(
    Path(site_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<OfflineSiteResponse>, ApiError> {
    let site = repositories::offline_sites::find_by_id(state.db(), &site_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch offline site"))?
        .filter(|site| site.is_active)
        .ok_or_else(|| ApiError::NotFound("Offline site not found".to_string()))?;

    Ok(Json(OfflineSiteResponse::from_db(site)))
}

async fn create_site(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(payload): Json<OfflineSiteCreate>,
) -> Result<(StatusCode, Json<OfflineSiteResponse>), ApiError> {
    payload.validate().map_err(ApiError::validation)?;

    let site = repositories::offline_sites::create(
        state.db(),
        repositories::offline_sites::CreateOfflineSite {
            id: &Uuid::new_v4().to_string(),
            name: payload.name.trim(),
            name_ar: payload.name_ar.trim(),
            address: payload.address.trim(),
            city: payload.city.trim(),
            phone: payload.phone.trim(),
            email: payload.email.as_deref().map(str::trim),
            map_link: payload.map_link.as_deref().map(str::trim),
            is_active: payload.is_active,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create offline site"))?;

    tracing::info!(
        admin_id = %admin.user_id,
        site_id = %site.id,
        action = "offline_site_create",
        "Admin created offline site"
    );

    Ok((StatusCode::CREATED, Json(OfflineSiteResponse::from_db(site))))
}

async fn update_site(
    Path(site_id): Path<String>,
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(payload): Json<OfflineSiteUpdate>,
) -> Result<Json<OfflineSiteResponse>, ApiError> {
    payload.validate().map_err(ApiError::validation)?;

    let site = repositories::offline_sites::update(
        state.db(),
        &site_id,
        repositories::offline_sites::UpdateOfflineSite {
            name: payload.name,
            name_ar: payload.name_ar,
            address: payload.address,
            city: payload.city,
            phone: payload.phone,
            email: payload.email,
            map_link: payload.map_link,
            is_active: payload.is_active,
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update offline site"))?
    .ok_or_else(|| ApiError::NotFound("Offline site not found".to_string()))?;

    tracing::info!(
        admin_id = %admin.user_id,
        site_id = %site_id,
        action = "offline_site_update",
        "Admin updated offline site"
    );

    Ok(Json(OfflineSiteResponse::from_db(site)))
}

async fn delete_site(
    Path(site_id): Path<String>,
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::offline_sites::delete(state.db(), &site_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete offline site"))?;
    if !deleted {
        return Err(ApiError::NotFound("Offline site not found".to_string()));
    }

    tracing::info!(
        admin_id = %admin.user_id,
        site_id = %site_id,
        action = "offline_site_delete",
        "Admin deleted offline site"
    );

    Ok(StatusCode::NO_CONTENT)
}
