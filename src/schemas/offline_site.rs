use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::OfflineSite;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct OfflineSiteCreate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[serde(alias = "nameAr")]
    #[validate(length(min = 1, message = "name_ar must not be empty"))]
    pub(crate) name_ar: String,
    #[validate(length(min = 1, message = "address must not be empty"))]
    pub(crate) address: String,
    #[validate(length(min = 1, message = "city must not be empty"))]
    pub(crate) city: String,
    #[validate(length(min = 1, message = "phone must not be empty"))]
    pub(crate) phone: String,
    #[serde(default)]
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: Option<String>,
    #[serde(default)]
    #[serde(alias = "mapLink")]
    pub(crate) map_link: Option<String>,
    #[serde(default = "default_true")]
    #[serde(alias = "isActive")]
    pub(crate) is_active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct OfflineSiteUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    #[serde(alias = "nameAr")]
    #[validate(length(min = 1, message = "name_ar must not be empty"))]
    pub(crate) name_ar: Option<String>,
    #[serde(default)]
    pub(crate) address: Option<String>,
    #[serde(default)]
    pub(crate) city: Option<String>,
    #[serde(default)]
    pub(crate) phone: Option<String>,
    #[serde(default)]
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: Option<String>,
    #[serde(default)]
    #[serde(alias = "mapLink")]
    pub(crate) map_link: Option<String>,
    #[serde(default)]
    #[serde(alias = "isActive")]
    pub(crate) is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct OfflineSiteResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) name_ar: String,
    pub(crate) address: String,
    pub(crate) city: String,
    pub(crate) phone: String,
    pub(crate) email: Option<String>,
    pub(crate) map_link: Option<String>,
    pub(crate) is_active: bool,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl OfflineSiteResponse {
    pub(crate) fn from_db(site: OfflineSite) -> Self {
        Self {
            id: site.id,
            name: site.name,
            name_ar: site.name_ar,
            address: site.address,
            city: site.city,
            phone: site.phone,
            email: site.email,
            map_link: site.map_link,
            is_active: site.is_active,
            created_at: format_primitive(site.created_at),
            updated_at: format_primitive(site.updated_at),
        }
    }
}

fn default_true() -> bool {
    true
}
