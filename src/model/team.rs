//! Team members shown on the about page, each with an ordered list of skills and an optional portrait.

use super::core::{non_blank, validation_message, ServiceError, DEFAULT_MAX_LENGTH};
use super::util::{extension_of, UploadStore};
use crate::config;
use crate::imaging::{self, ProcessOutcome};
use anyhow::Ok as AnyOk;
use chrono::{DateTime, Utc};
use log::{info, warn};
use poem_openapi::Object;
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, Transaction};
use validator::Validate;

pub const TEAM_SUBDIR: &str = "team";

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct TeamMemberRow {
    pub id: i64,
    pub name: String,
    pub position: String,
    pub description: Option<String>,
    pub photo: Option<String>,
    pub order_position: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct TeamMember {
    pub id: i64,
    pub name: String,
    pub position: String,
    pub description: Option<String>,
    pub photo: Option<String>,
    pub photo_url: Option<String>,
    pub order_position: i32,
    pub is_active: bool,
    pub skills: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object, Validate)]
pub struct TeamMemberPayload {
    #[validate(length(min = 1, max = "DEFAULT_MAX_LENGTH", message = "Name is required."))]
    pub name: String,

    #[validate(length(min = 1, max = "DEFAULT_MAX_LENGTH", message = "Position is required."))]
    pub position: String,

    pub description: Option<String>,

    #[oai(default)]
    pub order_position: i32,

    #[oai(default = "default_true")]
    pub is_active: bool,

    #[oai(default)]
    pub skills: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl TeamMemberPayload {
    /// Trim the text fields, then validate, so a blank name fails like an empty one.
    pub fn checked(&self) -> Result<TeamMemberPayload, anyhow::Error> {
        let payload = TeamMemberPayload {
            name: self.name.trim().to_string(),
            position: self.position.trim().to_string(),
            description: non_blank(self.description.clone()),
            ..self.clone()
        };

        match payload.validate() {
            Ok(_) => AnyOk(payload),
            Err(e) => Err(ServiceError::invalid(&validation_message(&e))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object, Validate)]
pub struct TeamMemberUpdate {
    #[validate(length(min = 1, max = "DEFAULT_MAX_LENGTH", message = "Name cannot be empty."))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = "DEFAULT_MAX_LENGTH", message = "Position cannot be empty."))]
    pub position: Option<String>,

    pub description: Option<String>,
    pub order_position: Option<i32>,
    pub is_active: Option<bool>,
    pub skills: Option<Vec<String>>,
}

impl TeamMemberUpdate {
    pub fn checked(&self) -> Result<TeamMemberUpdate, anyhow::Error> {
        let payload = TeamMemberUpdate {
            name: self.name.as_deref().map(|v| v.trim().to_string()),
            position: self.position.as_deref().map(|v| v.trim().to_string()),
            ..self.clone()
        };

        match payload.validate() {
            Ok(_) => AnyOk(payload),
            Err(e) => Err(ServiceError::invalid(&validation_message(&e))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct TeamPhotoUploaded {
    pub member: TeamMember,
    pub process_result: ProcessOutcome,
}

/// Trimmed, non-empty skills in their given order.
pub fn clean_skills(skills: &[String]) -> Vec<String> {
    skills
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// `team_<id>_<YYYYmmdd_HHMMSS>.<ext>`
pub fn team_photo_filename(member_id: i64, original_name: Option<&str>) -> String {
    let ext = original_name
        .and_then(extension_of)
        .map(|e| imaging::output_extension(&e))
        .unwrap_or("jpg");
    format!(
        "team_{}_{}.{}",
        member_id,
        Utc::now().format("%Y%m%d_%H%M%S"),
        ext
    )
}

async fn replace_skills(
    tx: &mut Transaction<'_, Postgres>,
    member_id: i64,
    skills: &[String],
) -> Result<(), anyhow::Error> {
    sqlx::query("DELETE FROM eventhub_team_skill WHERE member_id = $1")
        .bind(member_id)
        .execute(&mut *tx)
        .await?;

    for (i, skill) in clean_skills(skills).iter().enumerate() {
        sqlx::query("INSERT INTO eventhub_team_skill (member_id, skill, position) VALUES ($1, $2, $3)")
            .bind(member_id)
            .bind(skill)
            .bind(i as i32 + 1)
            .execute(&mut *tx)
            .await?;
    }

    AnyOk(())
}

impl TeamMemberRow {
    async fn into_member(self, pool: &sqlx::PgPool) -> Result<TeamMember, anyhow::Error> {
        let skills = sqlx::query_as::<_, (String,)>(
            "SELECT skill FROM eventhub_team_skill WHERE member_id = $1 ORDER BY position ASC, id ASC",
        )
        .bind(self.id)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|r| r.0)
        .collect();

        AnyOk(TeamMember {
            photo_url: self.photo.as_deref().map(config::upload_url),
            id: self.id,
            name: self.name,
            position: self.position,
            description: self.description,
            photo: self.photo,
            order_position: self.order_position,
            is_active: self.is_active,
            skills,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }

    async fn get(pool: &sqlx::PgPool, id: i64) -> Result<TeamMemberRow, anyhow::Error> {
        let row = sqlx::query_as::<_, TeamMemberRow>("SELECT * FROM eventhub_team_member WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        match row {
            Some(row) => AnyOk(row),
            None => Err(ServiceError::not_found(&format!("Team member {}", id))),
        }
    }
}

impl TeamMember {
    pub async fn get(pool: &sqlx::PgPool, id: i64) -> Result<TeamMember, anyhow::Error> {
        TeamMemberRow::get(pool, id).await?.into_member(pool).await
    }

    pub async fn list(pool: &sqlx::PgPool, active_only: bool) -> Result<Vec<TeamMember>, anyhow::Error> {
        let rows = sqlx::query_as::<_, TeamMemberRow>(
            "SELECT * FROM eventhub_team_member WHERE (NOT $1 OR is_active) ORDER BY order_position ASC, created_at DESC",
        )
        .bind(active_only)
        .fetch_all(pool)
        .await?;

        let mut members = Vec::with_capacity(rows.len());
        for row in rows {
            members.push(row.into_member(pool).await?);
        }

        AnyOk(members)
    }

    pub async fn create(
        pool: &sqlx::PgPool,
        payload: &TeamMemberPayload,
    ) -> Result<TeamMember, anyhow::Error> {
        let payload = payload.checked()?;

        let mut tx = pool.begin().await?;
        let id = sqlx::query_as::<_, (i64,)>(
            "INSERT INTO eventhub_team_member (name, position, description, order_position, is_active) VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(&payload.name)
        .bind(&payload.position)
        .bind(&payload.description)
        .bind(payload.order_position)
        .bind(payload.is_active)
        .fetch_one(&mut tx)
        .await?
        .0;

        replace_skills(&mut tx, id, &payload.skills).await?;
        tx.commit().await?;

        info!("Created team member {} ({})", payload.name, id);
        TeamMember::get(pool, id).await
    }

    pub async fn update(
        pool: &sqlx::PgPool,
        id: i64,
        payload: &TeamMemberUpdate,
    ) -> Result<TeamMember, anyhow::Error> {
        let payload = payload.checked()?;

        let mut tx = pool.begin().await?;
        let updated = sqlx::query_as::<_, (i64,)>(
            "UPDATE eventhub_team_member SET name = COALESCE($1, name), position = COALESCE($2, position), description = COALESCE($3, description), order_position = COALESCE($4, order_position), is_active = COALESCE($5, is_active), updated_at = now() WHERE id = $6 RETURNING id",
        )
        .bind(&payload.name)
        .bind(&payload.position)
        .bind(&payload.description)
        .bind(payload.order_position)
        .bind(payload.is_active)
        .bind(id)
        .fetch_optional(&mut tx)
        .await?;

        if updated.is_none() {
            return Err(ServiceError::not_found(&format!("Team member {}", id)));
        }

        if let Some(skills) = &payload.skills {
            replace_skills(&mut tx, id, skills).await?;
        }
        tx.commit().await?;

        TeamMember::get(pool, id).await
    }

    pub async fn delete(
        pool: &sqlx::PgPool,
        store: &UploadStore,
        id: i64,
    ) -> Result<(), anyhow::Error> {
        let row = TeamMemberRow::get(pool, id).await?;
        sqlx::query("DELETE FROM eventhub_team_member WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        if let Some(photo) = &row.photo {
            store.delete_quietly(photo);
        }

        info!("Deleted team member {} ({})", row.name, id);
        AnyOk(())
    }

    /// Store and normalise a new portrait, replacing the previous one.
    pub async fn upload_photo(
        pool: &sqlx::PgPool,
        store: &UploadStore,
        id: i64,
        original_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<TeamPhotoUploaded, anyhow::Error> {
        let row = TeamMemberRow::get(pool, id).await?;

        let relative_path = store.save_as(TEAM_SUBDIR, &team_photo_filename(id, original_name), bytes)?;
        let outcome = match imaging::process_portrait_file(&store.path_of(&relative_path)) {
            Ok(outcome) => outcome,
            Err(e) => {
                store.delete_quietly(&relative_path);
                return Err(ServiceError::invalid(&format!("The file is not a readable image: {}", e)));
            }
        };

        sqlx::query("UPDATE eventhub_team_member SET photo = $1, updated_at = now() WHERE id = $2")
            .bind(&relative_path)
            .bind(id)
            .execute(pool)
            .await?;

        if let Some(old) = row.photo.as_deref() {
            if old != relative_path {
                store.delete_quietly(old);
            }
        }

        AnyOk(TeamPhotoUploaded {
            member: TeamMember::get(pool, id).await?,
            process_result: outcome,
        })
    }

    pub async fn delete_photo(
        pool: &sqlx::PgPool,
        store: &UploadStore,
        id: i64,
    ) -> Result<TeamMember, anyhow::Error> {
        let row = TeamMemberRow::get(pool, id).await?;
        let photo = match row.photo {
            Some(photo) => photo,
            None => return Err(ServiceError::invalid("The team member has no photo.")),
        };

        sqlx::query("UPDATE eventhub_team_member SET photo = NULL, updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        if let Err(e) = store.delete(&photo) {
            warn!("Photo {} of team member {} was not removed: {}", photo, id, e);
        }

        TeamMember::get(pool, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_skills() {
        let skills = vec![
            " Marathon ".to_string(),
            "".to_string(),
            "   ".to_string(),
            "Coaching".to_string(),
        ];
        assert_eq!(clean_skills(&skills), vec!["Marathon", "Coaching"]);
    }

    #[test]
    fn test_team_photo_filename() {
        let name = team_photo_filename(4, Some("me.JPEG"));
        assert!(name.starts_with("team_4_"));
        assert!(name.ends_with(".jpg"));
        assert!(team_photo_filename(4, Some("me.png")).ends_with(".png"));
    }

    fn payload(name: &str, position: &str) -> TeamMemberPayload {
        TeamMemberPayload {
            name: name.to_string(),
            position: position.to_string(),
            description: Some("  ".to_string()),
            order_position: 0,
            is_active: true,
            skills: vec![],
        }
    }

    #[test]
    fn test_payload_validation() {
        assert!(payload("", "Coach").checked().is_err());
        // Whitespace-only values are as empty as "".
        assert!(payload("   ", "Coach").checked().is_err());
        assert!(payload("Rina", " \t ").checked().is_err());

        let checked = payload("  Rina ", " Coach ").checked().unwrap();
        assert_eq!(checked.name, "Rina");
        assert_eq!(checked.position, "Coach");
        assert_eq!(checked.description, None);

        let update = TeamMemberUpdate {
            name: None,
            position: Some("".to_string()),
            description: None,
            order_position: None,
            is_active: None,
            skills: None,
        };
        assert!(update.checked().is_err());

        let blank = TeamMemberUpdate {
            position: Some("    ".to_string()),
            ..update.clone()
        };
        assert!(blank.checked().is_err());

        let renamed = TeamMemberUpdate {
            name: Some(" Budi ".to_string()),
            position: None,
            ..update
        };
        assert_eq!(renamed.checked().unwrap().name.as_deref(), Some("Budi"));
    }

    #[test]
    fn test_gif_portrait_is_processed_under_jpg_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf());

        let img = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            120,
            80,
            image::Rgba([0, 120, 200, 255]),
        ));
        let mut gif: Vec<u8> = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut gif), image::ImageFormat::Gif)
            .unwrap();

        let filename = team_photo_filename(9, Some("me.gif"));
        assert!(filename.ends_with(".jpg"));
        let relative_path = store.save_as(TEAM_SUBDIR, &filename, &gif).unwrap();

        let outcome = imaging::process_portrait_file(&store.path_of(&relative_path)).unwrap();
        assert_eq!(outcome.original_size.width, 120);
        assert_eq!(outcome.new_size.width, imaging::PORTRAIT_SIZE);
        let written = store.read(&relative_path).unwrap();
        assert_eq!(image::guess_format(&written).unwrap(), image::ImageFormat::Jpeg);
    }

    #[tokio::test]
    #[ignore]
    async fn test_team_member_lifecycle() {
        let _ = crate::init_logger("eventhub-test", log::LevelFilter::Debug);
        let pool = crate::setup_test_db().await;
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf());

        let mut new_member = payload(" Rina ", "Coach");
        new_member.skills = vec![" Trail ".to_string(), "".to_string(), "Pacing".to_string()];
        let member = TeamMember::create(&pool, &new_member).await.unwrap();
        assert_eq!(member.name, "Rina");
        assert_eq!(member.skills, vec!["Trail", "Pacing"]);

        assert!(
            TeamMember::upload_photo(&pool, &store, member.id, Some("x.jpg"), b"not an image")
                .await
                .is_err()
        );

        let mut png: Vec<u8> = Vec::new();
        image::DynamicImage::ImageRgb8(image::RgbImage::new(50, 100))
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let uploaded = TeamMember::upload_photo(&pool, &store, member.id, Some("p.png"), &png)
            .await
            .unwrap();
        let photo = uploaded.member.photo.clone().unwrap();
        assert!(store.exists(&photo));
        assert_eq!(uploaded.process_result.action, "cropped_and_resized");

        TeamMember::delete(&pool, &store, member.id).await.unwrap();
        assert!(!store.exists(&photo));
        assert!(TeamMember::get(&pool, member.id).await.is_err());
    }
}
