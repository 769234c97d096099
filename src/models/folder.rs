// Folder model: purely organizational grouping of QR codes

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::schema::folders;
use crate::utils::validation::deserialize_some;

lazy_static! {
    static ref FOLDER_COLOR_REGEX: Regex =
        Regex::new(r"^#[0-9a-fA-F]{6}$").expect("folder color regex is valid");
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = folders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Folder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = folders)]
pub struct NewFolder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = folders)]
pub struct UpdateFolder {
    pub name: Option<String>,
    pub color: Option<Option<String>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateFolderRequest {
    #[validate(length(min = 1, max = 100, message = "Folder name must be 1-100 characters"))]
    pub name: String,

    #[validate(regex(path = "FOLDER_COLOR_REGEX", message = "Color must look like #1a2b3c"))]
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateFolderRequest {
    #[validate(length(min = 1, max = 100, message = "Folder name must be 1-100 characters"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub color: Option<Option<String>>,
}

impl UpdateFolderRequest {
    /// `validator` cannot see through the nested option, so the color is checked here
    pub fn validate_color(&self) -> Result<(), String> {
        match &self.color {
            Some(Some(color)) if !FOLDER_COLOR_REGEX.is_match(color) => {
                Err("Color must look like #1a2b3c".to_string())
            },
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FolderResponse {
    pub id: Uuid,
    pub name: String,
    pub color: Option<String>,
    pub qr_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    pub fn to_response(&self, qr_count: i64) -> FolderResponse {
        FolderResponse {
            id: self.id,
            name: self.name.clone(),
            color: self.color.clone(),
            qr_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
