//! Categories, classes (events), their ticket tiers, participant registrations and the featured list.

use super::core::{validation_message, ServiceError, DEFAULT_MAX_LENGTH, TICKET_NAME_MAX_LENGTH};
use super::util::MAX_GALLERY_FILES;
use crate::config;
use anyhow::Ok as AnyOk;
use chrono::{DateTime, Utc};
use log::{debug, info};
use poem_openapi::Object;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json as SqlJson;
use sqlx::{Postgres, Transaction};
use validator::Validate;

pub const DEFAULT_CLASS_DURATION: &str = "2 jam";
pub const PUBLIC_CLASS_LIMIT: i64 = 50;
pub const PUBLIC_CLASS_MAX_LIMIT: i64 = 100;

const CLASS_SELECT: &str = "SELECT c.*, cat.name AS category FROM eventhub_class c JOIN eventhub_category cat ON cat.id = c.category_id";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ClassRow {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
    pub category: String,
    pub description: String,
    pub schedule: String,
    pub venue: String,
    pub fee: f64,
    pub quota: i32,
    pub photo: Option<String>,
    pub payment_qr: Option<String>,
    pub gallery: SqlJson<Vec<String>>,
    pub link_url: Option<String>,
    pub is_external_link: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClassRow {
    /// Every stored file that belongs to the class.
    pub fn files(&self) -> Vec<String> {
        let mut files: Vec<String> = self.gallery.0.clone();
        files.extend(self.photo.clone());
        files.extend(self.payment_qr.clone());
        files
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object, sqlx::FromRow)]
pub struct TicketTier {
    #[oai(read_only)]
    pub id: i64,
    pub class_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub benefits: Option<String>,
    pub is_popular: bool,
    pub is_active: bool,
    #[oai(read_only)]
    pub created_at: DateTime<Utc>,
    #[oai(read_only)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object, sqlx::FromRow)]
pub struct Participant {
    pub id: i64,
    pub class_id: i64,
    pub user_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct ClassDetail {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
    pub category: String,
    pub description: String,
    pub schedule: String,
    pub venue: String,
    pub fee: f64,
    pub quota: i32,
    pub photo: Option<String>,
    pub photo_url: Option<String>,
    pub payment_qr: Option<String>,
    pub payment_qr_url: Option<String>,
    pub gallery: Vec<String>,
    pub gallery_urls: Vec<String>,
    pub link_url: Option<String>,
    pub is_external_link: bool,
    pub participants: Vec<Participant>,
    pub ticket_tiers: Vec<TicketTier>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct PublicClass {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub description: String,
    pub schedule: String,
    pub venue: String,
    pub fee: f64,
    pub quota: i32,
    pub duration: String,
    pub photo_url: Option<String>,
    pub payment_qr_url: Option<String>,
    pub gallery_urls: Vec<String>,
    pub link_url: Option<String>,
    pub is_external_link: bool,
    pub ticket_tiers: Vec<TicketTier>,
    pub created_at: DateTime<Utc>,
}

impl PublicClass {
    /// Stand-in returned for an unknown id so event pages still render.
    pub fn placeholder(id: i64) -> Self {
        PublicClass {
            id,
            name: format!("Event {}", id),
            category: "Unknown".to_string(),
            description: "".to_string(),
            schedule: "".to_string(),
            venue: "".to_string(),
            fee: 0.0,
            quota: 0,
            duration: DEFAULT_CLASS_DURATION.to_string(),
            photo_url: None,
            payment_qr_url: None,
            gallery_urls: vec![],
            link_url: None,
            is_external_link: false,
            ticket_tiers: vec![],
            created_at: Utc::now(),
        }
    }
}

impl From<ClassDetail> for PublicClass {
    fn from(detail: ClassDetail) -> Self {
        PublicClass {
            id: detail.id,
            name: detail.name,
            category: detail.category,
            description: detail.description,
            schedule: detail.schedule,
            venue: detail.venue,
            fee: detail.fee,
            quota: detail.quota,
            duration: DEFAULT_CLASS_DURATION.to_string(),
            photo_url: detail.photo_url,
            payment_qr_url: detail.payment_qr_url,
            gallery_urls: detail.gallery_urls,
            link_url: detail.link_url,
            is_external_link: detail.is_external_link,
            ticket_tiers: detail.ticket_tiers,
            created_at: detail.created_at,
        }
    }
}

/// Text fields of a class as submitted by the admin forms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct ClassInput {
    #[validate(length(min = 1, max = "DEFAULT_MAX_LENGTH", message = "Class name is required."))]
    pub name: String,

    #[validate(length(min = 1, max = "DEFAULT_MAX_LENGTH", message = "Category is required."))]
    pub category: String,

    #[validate(length(min = 1, message = "Description is required."))]
    pub description: String,

    #[validate(length(min = 1, max = "DEFAULT_MAX_LENGTH", message = "Schedule is required."))]
    pub schedule: String,

    #[validate(length(min = 1, max = "DEFAULT_MAX_LENGTH", message = "Venue is required."))]
    pub venue: String,

    #[validate(range(min = 0.0, message = "Fee cannot be negative."))]
    pub fee: f64,

    #[validate(range(min = 0, message = "Quota cannot be negative."))]
    pub quota: i32,

    pub link_url: Option<String>,
    pub is_external_link: bool,
}

impl ClassInput {
    pub fn checked(mut self) -> Result<Self, anyhow::Error> {
        self.name = self.name.trim().to_string();
        self.category = self.category.trim().to_string();
        self.description = self.description.trim().to_string();
        self.schedule = self.schedule.trim().to_string();
        self.venue = self.venue.trim().to_string();
        self.link_url = super::core::non_blank(self.link_url);

        if let Err(e) = self.validate() {
            return Err(ServiceError::invalid(&validation_message(&e)));
        }

        AnyOk(self)
    }
}

/// What to do with a single stored file on update.
#[derive(Debug, Clone, PartialEq)]
pub enum FileChange {
    Keep,
    Remove,
    Replace(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTicketTier {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub benefits: String,
    pub is_popular: bool,
}

/// The three tiers every new class starts with, priced from the class fee.
pub fn default_tiers(fee: f64) -> Vec<NewTicketTier> {
    vec![
        NewTicketTier {
            name: "Reguler".to_string(),
            description: "Paket standar untuk peserta".to_string(),
            price: fee,
            benefits: "Akses kelas lengkap, Materi pembelajaran, Sertifikat elektronik, Akses grup WhatsApp".to_string(),
            is_popular: true,
        },
        NewTicketTier {
            name: "Premium".to_string(),
            description: "Paket lengkap dengan benefit eksklusif".to_string(),
            price: fee * 1.5,
            benefits: "Akses kelas lengkap, Materi pembelajaran premium, Sertifikat fisik, Konsultasi private, Akses grup eksklusif, Merchandise eksklusif".to_string(),
            is_popular: false,
        },
        NewTicketTier {
            name: "Early Bird".to_string(),
            description: "Paket spesial untuk pendaftar awal".to_string(),
            price: fee * 0.8,
            benefits: "Akses kelas lengkap, Materi pembelajaran, Sertifikat elektronik, Bonus e-book materi".to_string(),
            is_popular: false,
        },
    ]
}

impl Category {
    pub async fn list(pool: &sqlx::PgPool) -> Result<Vec<Category>, anyhow::Error> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT * FROM eventhub_category ORDER BY name ASC")
                .fetch_all(pool)
                .await?;

        AnyOk(categories)
    }

    pub async fn find_or_create(
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
    ) -> Result<i64, anyhow::Error> {
        let id = sqlx::query_as::<_, (i64,)>(
            "INSERT INTO eventhub_category (name) VALUES ($1) ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name RETURNING id",
        )
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;

        AnyOk(id.0)
    }

    /// Delete a category that no class refers to.
    pub async fn delete_by_name(pool: &sqlx::PgPool, name: &str) -> Result<(), anyhow::Error> {
        let category =
            sqlx::query_as::<_, Category>("SELECT * FROM eventhub_category WHERE name = $1")
                .bind(name)
                .fetch_optional(pool)
                .await?;

        let category = match category {
            Some(c) => c,
            None => return Err(ServiceError::not_found(&format!("Category {}", name))),
        };

        let used = sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM eventhub_class WHERE category_id = $1",
        )
        .bind(category.id)
        .fetch_one(pool)
        .await?;

        if used.0 > 0 {
            return Err(ServiceError::conflict(&format!(
                "Category is still used by {} class(es)",
                used.0
            )));
        }

        sqlx::query("DELETE FROM eventhub_category WHERE id = $1")
            .bind(category.id)
            .execute(pool)
            .await?;

        info!("Deleted category {}", name);
        AnyOk(())
    }
}

impl ClassRow {
    pub async fn get(pool: &sqlx::PgPool, id: i64) -> Result<ClassRow, anyhow::Error> {
        let sql_str = format!("{} WHERE c.id = $1", CLASS_SELECT);
        let row = sqlx::query_as::<_, ClassRow>(&sql_str)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        match row {
            Some(row) => AnyOk(row),
            None => Err(ServiceError::not_found(&format!("Class {}", id))),
        }
    }

    pub async fn list(
        pool: &sqlx::PgPool,
        category: Option<&str>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ClassRow>, anyhow::Error> {
        let sql_str = format!(
            "{} WHERE ($1::TEXT IS NULL OR cat.name = $1) ORDER BY c.created_at DESC, c.id DESC LIMIT $2 OFFSET $3",
            CLASS_SELECT
        );
        let rows = sqlx::query_as::<_, ClassRow>(&sql_str)
            .bind(category)
            .bind(limit)
            .bind(offset.unwrap_or(0))
            .fetch_all(pool)
            .await?;

        AnyOk(rows)
    }

    async fn into_detail(self, pool: &sqlx::PgPool) -> Result<ClassDetail, anyhow::Error> {
        let ticket_tiers = TicketTier::for_class(pool, self.id).await?;
        let participants = Participant::for_class(pool, self.id).await?;
        let gallery = self.gallery.0;

        AnyOk(ClassDetail {
            id: self.id,
            name: self.name,
            category_id: self.category_id,
            category: self.category,
            description: self.description,
            schedule: self.schedule,
            venue: self.venue,
            fee: self.fee,
            quota: self.quota,
            photo_url: self.photo.as_deref().map(config::upload_url),
            photo: self.photo,
            payment_qr_url: self.payment_qr.as_deref().map(config::upload_url),
            payment_qr: self.payment_qr,
            gallery_urls: gallery.iter().map(|g| config::upload_url(g)).collect(),
            gallery,
            link_url: self.link_url,
            is_external_link: self.is_external_link,
            participants,
            ticket_tiers,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl ClassDetail {
    pub async fn get(pool: &sqlx::PgPool, id: i64) -> Result<ClassDetail, anyhow::Error> {
        ClassRow::get(pool, id).await?.into_detail(pool).await
    }

    pub async fn list(pool: &sqlx::PgPool) -> Result<Vec<ClassDetail>, anyhow::Error> {
        let rows = ClassRow::list(pool, None, None, None).await?;
        let mut details = Vec::with_capacity(rows.len());
        for row in rows {
            details.push(row.into_detail(pool).await?);
        }

        AnyOk(details)
    }

    /// Insert a class with its default tiers, creating the category when it is new.
    pub async fn create(
        pool: &sqlx::PgPool,
        input: ClassInput,
        photo: Option<String>,
        payment_qr: Option<String>,
        gallery: Vec<String>,
    ) -> Result<ClassDetail, anyhow::Error> {
        let input = input.checked()?;
        let gallery: Vec<String> = gallery.into_iter().take(MAX_GALLERY_FILES).collect();

        let mut tx = pool.begin().await?;
        let category_id = Category::find_or_create(&mut tx, &input.category).await?;

        let class_id = sqlx::query_as::<_, (i64,)>(
            "INSERT INTO eventhub_class (name, category_id, description, schedule, venue, fee, quota, photo, payment_qr, gallery, link_url, is_external_link) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING id",
        )
        .bind(&input.name)
        .bind(category_id)
        .bind(&input.description)
        .bind(&input.schedule)
        .bind(&input.venue)
        .bind(input.fee)
        .bind(input.quota)
        .bind(&photo)
        .bind(&payment_qr)
        .bind(SqlJson(&gallery))
        .bind(&input.link_url)
        .bind(input.is_external_link)
        .fetch_one(&mut tx)
        .await?
        .0;

        for tier in default_tiers(input.fee) {
            sqlx::query(
                "INSERT INTO eventhub_ticket_tier (class_id, name, description, price, benefits, is_popular, is_active) VALUES ($1, $2, $3, $4, $5, $6, TRUE)",
            )
            .bind(class_id)
            .bind(&tier.name)
            .bind(&tier.description)
            .bind(tier.price)
            .bind(&tier.benefits)
            .bind(tier.is_popular)
            .execute(&mut tx)
            .await?;
        }

        tx.commit().await?;
        info!("Created class {} ({}) in {}", input.name, class_id, input.category);

        ClassDetail::get(pool, class_id).await
    }

    /// Update a class, returning the detail and the files that are no longer referenced.
    pub async fn update(
        pool: &sqlx::PgPool,
        id: i64,
        input: ClassInput,
        photo: FileChange,
        gallery: Option<Vec<String>>,
    ) -> Result<(ClassDetail, Vec<String>), anyhow::Error> {
        let input = input.checked()?;
        let current = ClassRow::get(pool, id).await?;
        let mut obsolete: Vec<String> = vec![];

        let new_photo = match photo {
            FileChange::Keep => current.photo.clone(),
            FileChange::Remove => {
                obsolete.extend(current.photo.clone());
                None
            }
            FileChange::Replace(path) => {
                obsolete.extend(current.photo.clone());
                Some(path)
            }
        };

        let new_gallery = match gallery {
            Some(files) => {
                obsolete.extend(current.gallery.0.clone());
                files.into_iter().take(MAX_GALLERY_FILES).collect()
            }
            None => current.gallery.0.clone(),
        };

        let mut tx = pool.begin().await?;
        let category_id = Category::find_or_create(&mut tx, &input.category).await?;

        sqlx::query(
            "UPDATE eventhub_class SET name = $1, category_id = $2, description = $3, schedule = $4, venue = $5, fee = $6, quota = $7, photo = $8, gallery = $9, link_url = $10, is_external_link = $11, updated_at = now() WHERE id = $12",
        )
        .bind(&input.name)
        .bind(category_id)
        .bind(&input.description)
        .bind(&input.schedule)
        .bind(&input.venue)
        .bind(input.fee)
        .bind(input.quota)
        .bind(&new_photo)
        .bind(SqlJson(&new_gallery))
        .bind(&input.link_url)
        .bind(input.is_external_link)
        .bind(id)
        .execute(&mut tx)
        .await?;

        tx.commit().await?;
        debug!("Updated class {}, {} obsolete file(s)", id, obsolete.len());

        AnyOk((ClassDetail::get(pool, id).await?, obsolete))
    }

    /// Delete a class, tiers and participants go with it. Returns the removed row for file cleanup.
    pub async fn delete(pool: &sqlx::PgPool, id: i64) -> Result<ClassRow, anyhow::Error> {
        let row = ClassRow::get(pool, id).await?;
        sqlx::query("DELETE FROM eventhub_class WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        info!("Deleted class {} ({})", row.name, id);
        AnyOk(row)
    }
}

impl PublicClass {
    pub async fn list(
        pool: &sqlx::PgPool,
        category: Option<&str>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<PublicClass>, anyhow::Error> {
        let limit = limit
            .unwrap_or(PUBLIC_CLASS_LIMIT)
            .clamp(1, PUBLIC_CLASS_MAX_LIMIT);
        let offset = offset.unwrap_or(0).max(0);

        let rows = ClassRow::list(pool, category, Some(limit), Some(offset)).await?;
        let mut classes = Vec::with_capacity(rows.len());
        for row in rows {
            let mut public: PublicClass = row.into_detail(pool).await?.into();
            public.ticket_tiers.retain(|t| t.is_active);
            classes.push(public);
        }

        AnyOk(classes)
    }

    /// The class, or a placeholder when it does not exist.
    pub async fn get(pool: &sqlx::PgPool, id: i64) -> Result<PublicClass, anyhow::Error> {
        match ClassDetail::get(pool, id).await {
            Ok(detail) => {
                let mut public: PublicClass = detail.into();
                public.ticket_tiers.retain(|t| t.is_active);
                AnyOk(public)
            }
            Err(e) => match e.downcast_ref::<ServiceError>() {
                Some(ServiceError::NotFound { .. }) => AnyOk(PublicClass::placeholder(id)),
                _ => Err(e),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object, Validate)]
pub struct TicketTierPayload {
    pub class_id: i64,

    #[validate(length(min = 1, max = "TICKET_NAME_MAX_LENGTH", message = "The length of name should be between 1 and 100."))]
    pub name: String,

    pub description: Option<String>,

    #[validate(range(min = 0.0, message = "Price cannot be negative."))]
    pub price: f64,

    pub benefits: Option<String>,

    #[oai(default)]
    pub is_popular: bool,

    #[oai(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object, Validate)]
pub struct TicketTierUpdate {
    #[validate(length(min = 1, max = "TICKET_NAME_MAX_LENGTH", message = "The length of name should be between 1 and 100."))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0.0, message = "Price cannot be negative."))]
    pub price: Option<f64>,
    pub benefits: Option<String>,
    pub is_popular: Option<bool>,
    pub is_active: Option<bool>,
}

impl TicketTierPayload {
    pub fn checked(&self) -> Result<TicketTierPayload, anyhow::Error> {
        let payload = TicketTierPayload {
            name: self.name.trim().to_string(),
            ..self.clone()
        };

        match payload.validate() {
            Ok(_) => AnyOk(payload),
            Err(e) => Err(ServiceError::invalid(&validation_message(&e))),
        }
    }
}

impl TicketTierUpdate {
    pub fn checked(&self) -> Result<TicketTierUpdate, anyhow::Error> {
        let payload = TicketTierUpdate {
            name: self.name.as_deref().map(|v| v.trim().to_string()),
            ..self.clone()
        };

        match payload.validate() {
            Ok(_) => AnyOk(payload),
            Err(e) => Err(ServiceError::invalid(&validation_message(&e))),
        }
    }
}

impl TicketTier {
    pub async fn for_class(
        pool: &sqlx::PgPool,
        class_id: i64,
    ) -> Result<Vec<TicketTier>, anyhow::Error> {
        let tiers = sqlx::query_as::<_, TicketTier>(
            "SELECT * FROM eventhub_ticket_tier WHERE class_id = $1 ORDER BY price ASC, id ASC",
        )
        .bind(class_id)
        .fetch_all(pool)
        .await?;

        AnyOk(tiers)
    }

    pub async fn get(pool: &sqlx::PgPool, id: i64) -> Result<TicketTier, anyhow::Error> {
        let tier = sqlx::query_as::<_, TicketTier>("SELECT * FROM eventhub_ticket_tier WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        match tier {
            Some(tier) => AnyOk(tier),
            None => Err(ServiceError::not_found(&format!("Ticket tier {}", id))),
        }
    }

    pub async fn insert(
        pool: &sqlx::PgPool,
        payload: &TicketTierPayload,
    ) -> Result<TicketTier, anyhow::Error> {
        let payload = payload.checked()?;
        ClassRow::get(pool, payload.class_id).await?;

        let tier = sqlx::query_as::<_, TicketTier>(
            "INSERT INTO eventhub_ticket_tier (class_id, name, description, price, benefits, is_popular, is_active) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(payload.class_id)
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(payload.price)
        .bind(&payload.benefits)
        .bind(payload.is_popular)
        .bind(payload.is_active)
        .fetch_one(pool)
        .await?;

        AnyOk(tier)
    }

    pub async fn update(
        pool: &sqlx::PgPool,
        id: i64,
        payload: &TicketTierUpdate,
    ) -> Result<TicketTier, anyhow::Error> {
        let payload = payload.checked()?;

        let tier = sqlx::query_as::<_, TicketTier>(
            "UPDATE eventhub_ticket_tier SET name = COALESCE($1, name), description = COALESCE($2, description), price = COALESCE($3, price), benefits = COALESCE($4, benefits), is_popular = COALESCE($5, is_popular), is_active = COALESCE($6, is_active), updated_at = now() WHERE id = $7 RETURNING *",
        )
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(payload.price)
        .bind(&payload.benefits)
        .bind(payload.is_popular)
        .bind(payload.is_active)
        .bind(id)
        .fetch_optional(pool)
        .await?;

        match tier {
            Some(tier) => AnyOk(tier),
            None => Err(ServiceError::not_found(&format!("Ticket tier {}", id))),
        }
    }

    pub async fn toggle_active(pool: &sqlx::PgPool, id: i64) -> Result<TicketTier, anyhow::Error> {
        let tier = sqlx::query_as::<_, TicketTier>(
            "UPDATE eventhub_ticket_tier SET is_active = NOT is_active, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        match tier {
            Some(tier) => AnyOk(tier),
            None => Err(ServiceError::not_found(&format!("Ticket tier {}", id))),
        }
    }

    pub async fn delete(pool: &sqlx::PgPool, id: i64) -> Result<TicketTier, anyhow::Error> {
        let tier = sqlx::query_as::<_, TicketTier>(
            "DELETE FROM eventhub_ticket_tier WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        match tier {
            Some(tier) => AnyOk(tier),
            None => Err(ServiceError::not_found(&format!("Ticket tier {}", id))),
        }
    }
}

impl Participant {
    pub async fn for_class(
        pool: &sqlx::PgPool,
        class_id: i64,
    ) -> Result<Vec<Participant>, anyhow::Error> {
        let participants = sqlx::query_as::<_, Participant>(
            "SELECT * FROM eventhub_participant WHERE class_id = $1 ORDER BY registered_at ASC",
        )
        .bind(class_id)
        .fetch_all(pool)
        .await?;

        AnyOk(participants)
    }

    /// Register a user for a class, honouring the quota when it is set.
    pub async fn register(
        pool: &sqlx::PgPool,
        class_id: i64,
        user_id: i64,
    ) -> Result<Participant, anyhow::Error> {
        let class = ClassRow::get(pool, class_id).await?;
        let user = super::user::User::get(pool, user_id).await?;

        let mut tx = pool.begin().await?;
        // Serialise registrations per class so the quota check holds.
        sqlx::query("SELECT id FROM eventhub_class WHERE id = $1 FOR UPDATE")
            .bind(class_id)
            .execute(&mut tx)
            .await?;

        let existing = sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM eventhub_participant WHERE class_id = $1 AND user_id = $2",
        )
        .bind(class_id)
        .bind(user_id)
        .fetch_one(&mut tx)
        .await?;
        if existing.0 > 0 {
            return Err(ServiceError::conflict("You are already registered for this class."));
        }

        if class.quota > 0 {
            let taken = sqlx::query_as::<_, (i64,)>(
                "SELECT COUNT(*) FROM eventhub_participant WHERE class_id = $1",
            )
            .bind(class_id)
            .fetch_one(&mut tx)
            .await?;
            if taken.0 >= class.quota as i64 {
                return Err(ServiceError::conflict("The class is full."));
            }
        }

        let name = user.full_name.clone().unwrap_or(user.username.clone());
        let participant = sqlx::query_as::<_, Participant>(
            "INSERT INTO eventhub_participant (class_id, user_id, name, email, phone) VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(class_id)
        .bind(user_id)
        .bind(&name)
        .bind(&user.email)
        .bind(&user.phone)
        .fetch_one(&mut tx)
        .await?;

        tx.commit().await?;
        info!("User {} registered for class {}", user.username, class.name);
        AnyOk(participant)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct FeaturedEvents {
    pub selected_events: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct FeaturedEventsPayload {
    pub selected_events: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct FeaturedEventsSaved {
    pub message: String,
    pub count: u64,
    pub selected_events: Vec<i64>,
}

/// Keep the values that read as integers: numbers or numeric strings.
pub fn parse_event_ids(values: &[Value]) -> Vec<i64> {
    values
        .iter()
        .filter_map(|v| match v {
            Value::Number(n) => n.as_i64().or(n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        })
        .collect()
}

impl FeaturedEvents {
    pub async fn get(pool: &sqlx::PgPool) -> Result<FeaturedEvents, anyhow::Error> {
        let row = sqlx::query_as::<_, (SqlJson<Vec<i64>>,)>(
            "SELECT selected_events FROM eventhub_featured_events WHERE id = 1",
        )
        .fetch_optional(pool)
        .await?;

        AnyOk(FeaturedEvents {
            selected_events: row.map(|r| r.0 .0).unwrap_or_default(),
        })
    }

    pub async fn save(pool: &sqlx::PgPool, ids: Vec<i64>) -> Result<FeaturedEvents, anyhow::Error> {
        sqlx::query(
            "INSERT INTO eventhub_featured_events (id, selected_events, updated_at) VALUES (1, $1, now()) ON CONFLICT (id) DO UPDATE SET selected_events = EXCLUDED.selected_events, updated_at = now()",
        )
        .bind(SqlJson(&ids))
        .execute(pool)
        .await?;

        AnyOk(FeaturedEvents {
            selected_events: ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::util::short_hex;
    use serde_json::json;

    fn input() -> ClassInput {
        ClassInput {
            name: " Night Run ".to_string(),
            category: "Running".to_string(),
            description: "5K around the city".to_string(),
            schedule: "Sabtu, 19:00".to_string(),
            venue: "GBK".to_string(),
            fee: 150000.0,
            quota: 100,
            link_url: Some(" ".to_string()),
            is_external_link: false,
        }
    }

    #[test]
    fn test_default_tiers_pricing() {
        let tiers = default_tiers(100000.0);
        assert_eq!(tiers.len(), 3);
        assert_eq!(tiers[0].name, "Reguler");
        assert_eq!(tiers[0].price, 100000.0);
        assert!(tiers[0].is_popular);
        assert_eq!(tiers[1].name, "Premium");
        assert_eq!(tiers[1].price, 150000.0);
        assert_eq!(tiers[2].name, "Early Bird");
        assert_eq!(tiers[2].price, 80000.0);
        assert_eq!(tiers.iter().filter(|t| t.is_popular).count(), 1);
    }

    #[test]
    fn test_class_input_checked() {
        let checked = input().checked().unwrap();
        assert_eq!(checked.name, "Night Run");
        assert_eq!(checked.link_url, None);

        let mut negative = input();
        negative.fee = -1.0;
        assert!(negative.checked().is_err());

        let mut blank = input();
        blank.venue = "   ".to_string();
        assert!(blank.checked().is_err());
    }

    #[test]
    fn test_parse_event_ids() {
        let values = vec![json!(3), json!("7"), json!(" 9 "), json!("x"), json!(2.0), json!(2.5), json!(null)];
        assert_eq!(parse_event_ids(&values), vec![3, 7, 9, 2]);
    }

    #[test]
    fn test_placeholder_class() {
        let placeholder = PublicClass::placeholder(42);
        assert_eq!(placeholder.name, "Event 42");
        assert_eq!(placeholder.category, "Unknown");
        assert_eq!(placeholder.duration, "2 jam");
        assert!(placeholder.ticket_tiers.is_empty());
    }

    #[test]
    fn test_class_row_files() {
        let now = Utc::now();
        let row = ClassRow {
            id: 1,
            name: "n".to_string(),
            category_id: 1,
            category: "c".to_string(),
            description: "".to_string(),
            schedule: "".to_string(),
            venue: "".to_string(),
            fee: 0.0,
            quota: 0,
            photo: Some("classes/a.jpg".to_string()),
            payment_qr: None,
            gallery: SqlJson(vec!["gallery/b.jpg".to_string()]),
            link_url: None,
            is_external_link: false,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(row.files(), vec!["gallery/b.jpg", "classes/a.jpg"]);
    }

    #[test]
    fn test_ticket_tier_payload_trimmed_before_validation() {
        let payload = TicketTierPayload {
            class_id: 1,
            name: "   ".to_string(),
            description: None,
            price: 10.0,
            benefits: None,
            is_popular: false,
            is_active: true,
        };
        assert!(payload.checked().is_err());

        let padded = TicketTierPayload {
            name: "  VIP  ".to_string(),
            ..payload.clone()
        };
        assert_eq!(padded.checked().unwrap().name, "VIP");

        let negative = TicketTierPayload {
            name: "VIP".to_string(),
            price: -5.0,
            ..payload
        };
        assert!(negative.checked().is_err());

        let update = TicketTierUpdate {
            name: Some(" \t ".to_string()),
            description: None,
            price: None,
            benefits: None,
            is_popular: None,
            is_active: None,
        };
        assert!(update.checked().is_err());

        let renamed = TicketTierUpdate {
            name: Some(" Early ".to_string()),
            ..update
        };
        assert_eq!(renamed.checked().unwrap().name.as_deref(), Some("Early"));
    }

    fn is_conflict(e: &anyhow::Error) -> bool {
        matches!(e.downcast_ref::<ServiceError>(), Some(ServiceError::Conflict { .. }))
    }

    async fn new_user(pool: &sqlx::PgPool) -> i64 {
        let user = crate::model::user::User::register(
            pool,
            crate::model::user::RegisterPayload {
                username: format!("runner_{}", short_hex()),
                password: "secret12".to_string(),
                full_name: None,
                email: None,
                phone: None,
                address: None,
            },
        )
        .await
        .unwrap();
        user.id
    }

    fn class_input(category: &str, quota: i32) -> ClassInput {
        ClassInput {
            category: category.to_string(),
            quota,
            ..input()
        }
    }

    #[tokio::test]
    #[ignore]
    async fn test_create_class_persists_default_tiers() {
        let _ = crate::init_logger("eventhub-test", log::LevelFilter::Debug);
        let pool = crate::setup_test_db().await;
        let category = format!("Trail {}", short_hex());

        let class = ClassDetail::create(&pool, class_input(&category, 0), None, None, vec![])
            .await
            .unwrap();
        assert_eq!(class.name, "Night Run");
        assert_eq!(class.category, category);

        let tiers = TicketTier::for_class(&pool, class.id).await.unwrap();
        let prices: Vec<(String, f64)> = tiers.iter().map(|t| (t.name.clone(), t.price)).collect();
        assert_eq!(
            prices,
            vec![
                ("Early Bird".to_string(), 120000.0),
                ("Reguler".to_string(), 150000.0),
                ("Premium".to_string(), 225000.0),
            ]
        );
        assert!(tiers.iter().all(|t| t.is_active));

        let public = PublicClass::get(&pool, class.id).await.unwrap();
        assert_eq!(public.ticket_tiers.len(), 3);

        ClassDetail::delete(&pool, class.id).await.unwrap();
        Category::delete_by_name(&pool, &category).await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    async fn test_category_in_use_cannot_be_deleted() {
        let _ = crate::init_logger("eventhub-test", log::LevelFilter::Debug);
        let pool = crate::setup_test_db().await;
        let category = format!("Yoga {}", short_hex());

        let class = ClassDetail::create(&pool, class_input(&category, 0), None, None, vec![])
            .await
            .unwrap();
        let err = Category::delete_by_name(&pool, &category).await.unwrap_err();
        assert!(is_conflict(&err));

        ClassDetail::delete(&pool, class.id).await.unwrap();
        Category::delete_by_name(&pool, &category).await.unwrap();
        let err = Category::delete_by_name(&pool, &category).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ServiceError>(),
            Some(ServiceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    #[ignore]
    async fn test_register_rejects_duplicate_and_full_class() {
        let _ = crate::init_logger("eventhub-test", log::LevelFilter::Debug);
        let pool = crate::setup_test_db().await;
        let category = format!("Run {}", short_hex());

        let class = ClassDetail::create(&pool, class_input(&category, 1), None, None, vec![])
            .await
            .unwrap();
        let first = new_user(&pool).await;
        let second = new_user(&pool).await;

        let participant = Participant::register(&pool, class.id, first).await.unwrap();
        assert_eq!(participant.user_id, first);

        let duplicate = Participant::register(&pool, class.id, first).await.unwrap_err();
        assert!(is_conflict(&duplicate));

        let full = Participant::register(&pool, class.id, second).await.unwrap_err();
        assert!(is_conflict(&full));
        assert_eq!(full.to_string(), "The class is full.");

        assert_eq!(Participant::for_class(&pool, class.id).await.unwrap().len(), 1);
        ClassDetail::delete(&pool, class.id).await.unwrap();
        Category::delete_by_name(&pool, &category).await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    async fn test_featured_events_round_trip() {
        let _ = crate::init_logger("eventhub-test", log::LevelFilter::Debug);
        let pool = crate::setup_test_db().await;
        let previous = FeaturedEvents::get(&pool).await.unwrap();

        let ids = parse_event_ids(&[json!(5), json!("8"), json!("nope")]);
        FeaturedEvents::save(&pool, ids).await.unwrap();
        assert_eq!(
            FeaturedEvents::get(&pool).await.unwrap().selected_events,
            vec![5, 8]
        );

        FeaturedEvents::save(&pool, previous.selected_events.clone()).await.unwrap();
        assert_eq!(FeaturedEvents::get(&pool).await.unwrap(), previous);
    }
}
