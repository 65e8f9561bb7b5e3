use sqlx::PgPool;

use crate::db::models::OfflineSite;

const COLUMNS: &str = "\
    id, name, name_ar, address, city, phone, email, map_link, is_active, created_at, updated_at";

pub(crate) struct CreateOfflineSite<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) name_ar: &'a str,
    pub(crate) address: &'a str,
    pub(crate) city: &'a str,
    pub(crate) phone: &'a str,
    pub(crate) email: Option<&'a str>,
    pub(crate) map_link: Option<&'a str>,
    pub(crate) is_active: bool,
    pub(crate) created_at: time::PrimitiveDateTime,
}

#[derive(Default)]
pub(crate) struct UpdateOfflineSite {
    pub(crate) name: Option<String>,
    pub(crate) name_ar: Option<String>,
    pub(crate) address: Option<String>,
    pub(crate) city: Option<String>,
    pub(crate) phone: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) map_link: Option<String>,
    pub(crate) is_active: Option<bool>,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateOfflineSite<'_>,
) -> Result<OfflineSite, sqlx::Error> {
    sqlx::query_as::<_, OfflineSite>(&format!(
        "INSERT INTO offline_sites (
            id, name, name_ar, address, city, phone, email, map_link, is_active,
            created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$10)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.name_ar)
    .bind(params.address)
    .bind(params.city)
    .bind(params.phone)
    .bind(params.email)
    .bind(params.map_link)
    .bind(params.is_active)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<OfflineSite>, sqlx::Error> {
    sqlx::query_as::<_, OfflineSite>(&format!("SELECT {COLUMNS} FROM offline_sites WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(
    pool: &PgPool,
    only_active: bool,
) -> Result<Vec<OfflineSite>, sqlx::Error> {
    sqlx::query_as::<_, OfflineSite>(&format!(
        "SELECT {COLUMNS} FROM offline_sites
         WHERE ($1 = FALSE OR is_active = TRUE)
         ORDER BY created_at DESC"
    ))
    .bind(only_active)
    .fetch_all(pool)
    .await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateOfflineSite,
    updated_at: time::PrimitiveDateTime,
) -> Result<Option<OfflineSite>, sqlx::Error> {
    sqlx::query_as::<_, OfflineSite>(&format!(
        "UPDATE offline_sites SET
            name = COALESCE($1, name),
            name_ar = COALESCE($2, name_ar),
            address = COALESCE($3, address),
            city = COALESCE($4, city),
            phone = COALESCE($5, phone),
            email = COALESCE($6, email),
            map_link = COALESCE($7, map_link),
            is_active = COALESCE($8, is_active),
            updated_at = $9
         WHERE id = $10
         RETURNING {COLUMNS}"
    ))
    .bind(params.name)
    .bind(params.name_ar)
    .bind(params.address)
    .bind(params.city)
    .bind(params.phone)
    .bind(params.email)
    .bind(params.map_link)
    .bind(params.is_active)
    .bind(updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM offline_sites WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
