// Folder management; folders only group codes and never own their lifecycle

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use std::collections::HashMap;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::db::DieselPool;
use crate::models::folder::UpdateFolder;
use crate::models::{CreateFolderRequest, Folder, FolderResponse, NewFolder, UpdateFolderRequest};
use crate::schema::{folders, qr_codes};
use crate::utils::service_error::{ServiceError, ServiceResult};
use crate::utils::validation::trim_and_validate_field;

#[derive(Clone)]
pub struct FolderService {
    pool: DieselPool,
}

impl FolderService {
    pub fn new(pool: DieselPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        user_id: Uuid,
        request: CreateFolderRequest,
    ) -> ServiceResult<FolderResponse> {
        request.validate()?;
        let name = trim_and_validate_field(&request.name, true)
            .map_err(|e| ServiceError::ValidationError(format!("name: {}", e)))?;

        let mut conn = self.pool.get().await?;
        let now = Utc::now();

        let folder: Folder = diesel::insert_into(folders::table)
            .values(&NewFolder {
                id: Uuid::new_v4(),
                user_id,
                name,
                color: request.color,
                created_at: now,
                updated_at: now,
            })
            .returning(Folder::as_returning())
            .get_result(&mut conn)
            .await?;

        info!("Created folder {} for user {}", folder.id, user_id);
        Ok(folder.to_response(0))
    }

    /// All of the user's folders with the number of codes in each
    pub async fn list(&self, user_id: Uuid) -> ServiceResult<Vec<FolderResponse>> {
        let mut conn = self.pool.get().await?;

        let user_folders: Vec<Folder> = folders::table
            .filter(folders::user_id.eq(user_id))
            .order(folders::name.asc())
            .select(Folder::as_select())
            .load(&mut conn)
            .await?;

        let counts: HashMap<Uuid, i64> = qr_codes::table
            .filter(qr_codes::user_id.eq(user_id))
            .filter(qr_codes::folder_id.is_not_null())
            .group_by(qr_codes::folder_id)
            .select((qr_codes::folder_id, diesel::dsl::count_star()))
            .load::<(Option<Uuid>, i64)>(&mut conn)
            .await?
            .into_iter()
            .filter_map(|(folder_id, count)| folder_id.map(|id| (id, count)))
            .collect();

        Ok(user_folders
            .iter()
            .map(|folder| folder.to_response(counts.get(&folder.id).copied().unwrap_or(0)))
            .collect())
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        user_id: Uuid,
        folder_id: Uuid,
        request: UpdateFolderRequest,
    ) -> ServiceResult<FolderResponse> {
        request.validate()?;
        request
            .validate_color()
            .map_err(ServiceError::ValidationError)?;

        let name = match request.name {
            Some(name) => Some(
                trim_and_validate_field(&name, true)
                    .map_err(|e| ServiceError::ValidationError(format!("name: {}", e)))?,
            ),
            None => None,
        };

        let mut conn = self.pool.get().await?;

        let folder: Folder = diesel::update(
            folders::table
                .filter(folders::id.eq(folder_id))
                .filter(folders::user_id.eq(user_id)),
        )
        .set(&UpdateFolder {
            name,
            color: request.color,
            updated_at: Utc::now(),
        })
        .returning(Folder::as_returning())
        .get_result(&mut conn)
        .await?;

        let qr_count: i64 = qr_codes::table
            .filter(qr_codes::folder_id.eq(folder.id))
            .count()
            .get_result(&mut conn)
            .await?;

        Ok(folder.to_response(qr_count))
    }

    /// Delete a folder; its codes survive with `folder_id` nulled by the FK
    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: Uuid, folder_id: Uuid) -> ServiceResult<()> {
        let mut conn = self.pool.get().await?;

        let deleted = diesel::delete(
            folders::table
                .filter(folders::id.eq(folder_id))
                .filter(folders::user_id.eq(user_id)),
        )
        .execute(&mut conn)
        .await?;

        if deleted == 0 {
            return Err(ServiceError::NotFound);
        }

        info!("Deleted folder {} for user {}", folder_id, user_id);
        Ok(())
    }
}
