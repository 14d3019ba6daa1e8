//! Contact page (hero plus contact items) and the footer contact block.

use super::content::ContentReset;
use super::core::{is_valid_email, non_blank, ServiceError};
use anyhow::Ok as AnyOk;
use chrono::{DateTime, Utc};
use log::{info, warn};
use poem_openapi::Object;
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, Transaction};

pub const DEFAULT_HERO_TITLE: &str = "Hubungi Kami";
pub const DEFAULT_HERO_SUBTITLE: &str = "Kami Siap Membantu Anda";
pub const DEFAULT_HERO_DESCRIPTION: &str = "Punya pertanyaan, saran, atau ingin berkolaborasi? Tim kami siap membantu Anda dengan solusi terbaik untuk kebutuhan event lari Anda.";

pub const DEFAULT_FOOTER_EMAIL: &str = "info@gastronomirun.com";
pub const DEFAULT_FOOTER_PHONE: &str = "(021) 1234-5678";
pub const DEFAULT_FOOTER_ADDRESS: &str = "Jakarta Running Center, Indonesia";
pub const DEFAULT_FOOTER_DESCRIPTION: &str = "Gastronomi Run adalah bagian dari komitmen untuk merealisasikan kemajuan urban dan industri olahraga di Indonesia. Kami menyediakan layanan yang terbaik dan inovatif untuk semua orang.";
pub const DEFAULT_FOOTER_COPYRIGHT: &str = "© 2024 Gastronomi Run. All rights reserved.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct ContactHero {
    pub title: String,
    pub subtitle: String,
    pub description: String,
}

impl Default for ContactHero {
    fn default() -> Self {
        ContactHero {
            title: DEFAULT_HERO_TITLE.to_string(),
            subtitle: DEFAULT_HERO_SUBTITLE.to_string(),
            description: DEFAULT_HERO_DESCRIPTION.to_string(),
        }
    }
}

impl ContactHero {
    fn checked(self) -> Result<Self, anyhow::Error> {
        let hero = ContactHero {
            title: self.title.trim().to_string(),
            subtitle: self.subtitle.trim().to_string(),
            description: self.description.trim().to_string(),
        };

        if hero.title.is_empty() || hero.subtitle.is_empty() || hero.description.is_empty() {
            return Err(ServiceError::invalid(
                "Title, subtitle and description are required.",
            ));
        }

        AnyOk(hero)
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
struct ContactItemRow {
    id: i64,
    icon: String,
    title: String,
    action_url: Option<String>,
    order_position: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct ContactItem {
    pub id: i64,
    pub icon: String,
    pub title: String,
    pub action_url: Option<String>,
    pub order_position: i32,
    pub is_active: bool,
    pub details: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct ContactPage {
    pub hero: ContactHero,
    pub contact_items: Vec<ContactItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct ContactItemPayload {
    pub icon: String,
    pub title: String,
    pub action_url: Option<String>,
    #[oai(default)]
    pub order_position: i32,
    #[oai(default = "default_true")]
    pub is_active: bool,
    #[oai(default)]
    pub details: Vec<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct ContactItemUpdate {
    pub icon: Option<String>,
    pub title: Option<String>,
    pub action_url: Option<String>,
    pub order_position: Option<i32>,
    pub is_active: Option<bool>,
    pub details: Option<Vec<String>>,
}

struct DefaultItem {
    icon: &'static str,
    title: &'static str,
    action_url: Option<&'static str>,
    details: &'static [&'static str],
}

const DEFAULT_ITEMS: [DefaultItem; 4] = [
    DefaultItem {
        icon: "Mail",
        title: "Email",
        action_url: Some("mailto:info@gastronomirun.com"),
        details: &["info@gastronomirun.com", "support@gastronomirun.com"],
    },
    DefaultItem {
        icon: "Phone",
        title: "Telepon",
        action_url: Some("tel:+622112345678"),
        details: &["(021) 1234-5678", "0812-3456-7890"],
    },
    DefaultItem {
        icon: "MapPin",
        title: "Alamat",
        action_url: Some("https://maps.google.com"),
        details: &[
            "Jakarta Running Center",
            "Jl. Sudirman No. 123",
            "Jakarta Selatan, 12190",
        ],
    },
    DefaultItem {
        icon: "Clock",
        title: "Jam Operasional",
        action_url: None,
        details: &[
            "Senin - Jumat: 08:00 - 17:00",
            "Sabtu: 08:00 - 12:00",
            "Minggu: Tutup",
        ],
    },
];

/// The built-in contact page, used when nothing is stored or the store is unreachable.
pub fn default_contact_page() -> ContactPage {
    ContactPage {
        hero: ContactHero::default(),
        contact_items: DEFAULT_ITEMS
            .iter()
            .enumerate()
            .map(|(i, item)| ContactItem {
                id: i as i64 + 1,
                icon: item.icon.to_string(),
                title: item.title.to_string(),
                action_url: item.action_url.map(str::to_string),
                order_position: i as i32 + 1,
                is_active: true,
                details: item.details.iter().map(|d| d.to_string()).collect(),
                created_at: None,
                updated_at: None,
            })
            .collect(),
    }
}

/// Trimmed details, blanks dropped.
pub fn clean_details(details: &[String]) -> Vec<String> {
    details
        .iter()
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect()
}

async fn replace_details(
    tx: &mut Transaction<'_, Postgres>,
    item_id: i64,
    details: &[String],
) -> Result<(), anyhow::Error> {
    sqlx::query("DELETE FROM eventhub_contact_detail WHERE item_id = $1")
        .bind(item_id)
        .execute(&mut *tx)
        .await?;

    for (i, detail) in clean_details(details).iter().enumerate() {
        sqlx::query("INSERT INTO eventhub_contact_detail (item_id, detail, position) VALUES ($1, $2, $3)")
            .bind(item_id)
            .bind(detail)
            .bind(i as i32 + 1)
            .execute(&mut *tx)
            .await?;
    }

    AnyOk(())
}

async fn insert_defaults(tx: &mut Transaction<'_, Postgres>) -> Result<(), anyhow::Error> {
    let hero = ContactHero::default();
    sqlx::query(
        "INSERT INTO eventhub_contact_hero (id, title, subtitle, description) VALUES (1, $1, $2, $3) ON CONFLICT (id) DO NOTHING",
    )
    .bind(&hero.title)
    .bind(&hero.subtitle)
    .bind(&hero.description)
    .execute(&mut *tx)
    .await?;

    for (i, item) in DEFAULT_ITEMS.iter().enumerate() {
        let id = sqlx::query_as::<_, (i64,)>(
            "INSERT INTO eventhub_contact_item (icon, title, action_url, order_position, is_active) VALUES ($1, $2, $3, $4, TRUE) RETURNING id",
        )
        .bind(item.icon)
        .bind(item.title)
        .bind(item.action_url)
        .bind(i as i32 + 1)
        .fetch_one(&mut *tx)
        .await?
        .0;

        let details: Vec<String> = item.details.iter().map(|d| d.to_string()).collect();
        replace_details(tx, id, &details).await?;
    }

    AnyOk(())
}

async fn fetch_hero(pool: &sqlx::PgPool) -> Result<Option<ContactHero>, anyhow::Error> {
    let hero = sqlx::query_as::<_, (String, String, String)>(
        "SELECT title, subtitle, description FROM eventhub_contact_hero WHERE id = 1",
    )
    .fetch_optional(pool)
    .await?
    .map(|(title, subtitle, description)| ContactHero {
        title,
        subtitle,
        description,
    });

    AnyOk(hero)
}

async fn fetch_items(pool: &sqlx::PgPool, active_only: bool) -> Result<Vec<ContactItem>, anyhow::Error> {
    let rows = sqlx::query_as::<_, ContactItemRow>(
        "SELECT * FROM eventhub_contact_item WHERE (NOT $1 OR is_active) ORDER BY order_position ASC, id ASC",
    )
    .bind(active_only)
    .fetch_all(pool)
    .await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        items.push(row.with_details(pool).await?);
    }

    AnyOk(items)
}

impl ContactItemRow {
    async fn with_details(self, pool: &sqlx::PgPool) -> Result<ContactItem, anyhow::Error> {
        let details = sqlx::query_as::<_, (String,)>(
            "SELECT detail FROM eventhub_contact_detail WHERE item_id = $1 ORDER BY position ASC, id ASC",
        )
        .bind(self.id)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|r| r.0)
        .collect();

        AnyOk(ContactItem {
            id: self.id,
            icon: self.icon,
            title: self.title,
            action_url: self.action_url,
            order_position: self.order_position,
            is_active: self.is_active,
            details,
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
        })
    }
}

impl ContactPage {
    /// Hero plus active items; the default hero is stored when it is missing.
    pub async fn get(pool: &sqlx::PgPool) -> Result<ContactPage, anyhow::Error> {
        let hero = match fetch_hero(pool).await? {
            Some(hero) => hero,
            None => {
                let hero = ContactHero::default();
                ContactHero::save(pool, hero.clone()).await?;
                hero
            }
        };

        AnyOk(ContactPage {
            hero,
            contact_items: fetch_items(pool, true).await?,
        })
    }

    /// Never fails: any storage problem yields the built-in page.
    pub async fn get_public(pool: &sqlx::PgPool) -> ContactPage {
        let stored = async {
            let hero = fetch_hero(pool).await?.unwrap_or_default();
            let contact_items = fetch_items(pool, true).await?;
            AnyOk(ContactPage { hero, contact_items })
        };

        match stored.await {
            Ok(page) => page,
            Err(e) => {
                warn!("Serving the default contact page: {}", e);
                default_contact_page()
            }
        }
    }

    pub async fn reset(pool: &sqlx::PgPool) -> Result<ContentReset, anyhow::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM eventhub_contact_item")
            .execute(&mut tx)
            .await?;
        sqlx::query("DELETE FROM eventhub_contact_hero")
            .execute(&mut tx)
            .await?;
        insert_defaults(&mut tx).await?;
        tx.commit().await?;

        info!("Contact page was reset to the defaults");
        AnyOk(ContentReset {
            message: "Contact data was reset to the defaults.".to_string(),
            reset_at: Utc::now(),
        })
    }
}

impl ContactHero {
    pub async fn save(pool: &sqlx::PgPool, hero: ContactHero) -> Result<ContactHero, anyhow::Error> {
        let hero = hero.checked()?;
        sqlx::query(
            "INSERT INTO eventhub_contact_hero (id, title, subtitle, description) VALUES (1, $1, $2, $3) ON CONFLICT (id) DO UPDATE SET title = EXCLUDED.title, subtitle = EXCLUDED.subtitle, description = EXCLUDED.description, updated_at = now()",
        )
        .bind(&hero.title)
        .bind(&hero.subtitle)
        .bind(&hero.description)
        .execute(pool)
        .await?;

        AnyOk(hero)
    }
}

impl ContactItem {
    pub async fn list(pool: &sqlx::PgPool) -> Result<Vec<ContactItem>, anyhow::Error> {
        fetch_items(pool, false).await
    }

    pub async fn get(pool: &sqlx::PgPool, id: i64) -> Result<ContactItem, anyhow::Error> {
        let row = sqlx::query_as::<_, ContactItemRow>("SELECT * FROM eventhub_contact_item WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        match row {
            Some(row) => row.with_details(pool).await,
            None => Err(ServiceError::not_found(&format!("Contact item {}", id))),
        }
    }

    pub async fn create(
        pool: &sqlx::PgPool,
        payload: &ContactItemPayload,
    ) -> Result<ContactItem, anyhow::Error> {
        let icon = payload.icon.trim();
        let title = payload.title.trim();
        if icon.is_empty() || title.is_empty() {
            return Err(ServiceError::invalid("Icon and title are required."));
        }

        let mut tx = pool.begin().await?;
        let id = sqlx::query_as::<_, (i64,)>(
            "INSERT INTO eventhub_contact_item (icon, title, action_url, order_position, is_active) VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(icon)
        .bind(title)
        .bind(non_blank(payload.action_url.clone()))
        .bind(payload.order_position)
        .bind(payload.is_active)
        .fetch_one(&mut tx)
        .await?
        .0;

        replace_details(&mut tx, id, &payload.details).await?;
        tx.commit().await?;

        ContactItem::get(pool, id).await
    }

    pub async fn update(
        pool: &sqlx::PgPool,
        id: i64,
        payload: &ContactItemUpdate,
    ) -> Result<ContactItem, anyhow::Error> {
        let blank = |v: &Option<String>| v.as_deref().map(|s| s.trim().is_empty()).unwrap_or(false);
        if blank(&payload.icon) || blank(&payload.title) {
            return Err(ServiceError::invalid("Icon and title cannot be empty."));
        }

        let mut tx = pool.begin().await?;
        let updated = sqlx::query_as::<_, (i64,)>(
            "UPDATE eventhub_contact_item SET icon = COALESCE($1, icon), title = COALESCE($2, title), action_url = COALESCE($3, action_url), order_position = COALESCE($4, order_position), is_active = COALESCE($5, is_active), updated_at = now() WHERE id = $6 RETURNING id",
        )
        .bind(payload.icon.as_deref().map(str::trim))
        .bind(payload.title.as_deref().map(str::trim))
        .bind(&payload.action_url)
        .bind(payload.order_position)
        .bind(payload.is_active)
        .bind(id)
        .fetch_optional(&mut tx)
        .await?;

        if updated.is_none() {
            return Err(ServiceError::not_found(&format!("Contact item {}", id)));
        }

        if let Some(details) = &payload.details {
            replace_details(&mut tx, id, details).await?;
        }
        tx.commit().await?;

        ContactItem::get(pool, id).await
    }

    pub async fn delete(pool: &sqlx::PgPool, id: i64) -> Result<(), anyhow::Error> {
        let result = sqlx::query("DELETE FROM eventhub_contact_item WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::not_found(&format!("Contact item {}", id)));
        }

        AnyOk(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct SocialMedia {
    #[oai(default)]
    pub facebook: String,
    #[oai(default)]
    pub instagram: String,
    #[oai(default)]
    pub twitter: String,
    #[oai(default)]
    pub youtube: String,
}

impl SocialMedia {
    pub fn count(&self) -> usize {
        [&self.facebook, &self.instagram, &self.twitter, &self.youtube]
            .iter()
            .filter(|url| !url.trim().is_empty())
            .count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct FooterContact {
    pub email: String,
    pub phone: String,
    pub address: String,
    #[oai(default)]
    pub description: String,
    pub copyright: String,
    pub social_media: SocialMedia,
}

impl Default for FooterContact {
    fn default() -> Self {
        let social = |network: &str| format!("https://{}.com/gastronomirun", network);
        FooterContact {
            email: DEFAULT_FOOTER_EMAIL.to_string(),
            phone: DEFAULT_FOOTER_PHONE.to_string(),
            address: DEFAULT_FOOTER_ADDRESS.to_string(),
            description: DEFAULT_FOOTER_DESCRIPTION.to_string(),
            copyright: DEFAULT_FOOTER_COPYRIGHT.to_string(),
            social_media: SocialMedia {
                facebook: social("facebook"),
                instagram: social("instagram"),
                twitter: social("twitter"),
                youtube: social("youtube"),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
struct FooterContactRow {
    email: String,
    phone: String,
    address: String,
    description: String,
    copyright: String,
    facebook: String,
    instagram: String,
    twitter: String,
    youtube: String,
    updated_at: DateTime<Utc>,
}

impl From<FooterContactRow> for FooterContact {
    fn from(row: FooterContactRow) -> Self {
        let description = if row.description.trim().is_empty() {
            DEFAULT_FOOTER_DESCRIPTION.to_string()
        } else {
            row.description
        };
        let copyright = if row.copyright.trim().is_empty() {
            DEFAULT_FOOTER_COPYRIGHT.to_string()
        } else {
            row.copyright
        };

        FooterContact {
            email: row.email,
            phone: row.phone,
            address: row.address,
            description,
            copyright,
            social_media: SocialMedia {
                facebook: row.facebook,
                instagram: row.instagram,
                twitter: row.twitter,
                youtube: row.youtube,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct FooterContactSaved {
    pub message: String,
    pub data: FooterContact,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct FooterSummary {
    pub has_email: bool,
    pub has_phone: bool,
    pub has_address: bool,
    pub has_description: bool,
    pub has_copyright: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct FooterContactStats {
    pub total_entries: i64,
    pub last_updated: Option<DateTime<Utc>>,
    pub has_data: bool,
    pub summary: FooterSummary,
    pub social_media_count: usize,
}

impl FooterContact {
    fn checked(self) -> Result<Self, anyhow::Error> {
        let trimmed = |s: String| s.trim().to_string();
        let footer = FooterContact {
            email: trimmed(self.email),
            phone: trimmed(self.phone),
            address: trimmed(self.address),
            description: trimmed(self.description),
            copyright: trimmed(self.copyright),
            social_media: SocialMedia {
                facebook: trimmed(self.social_media.facebook),
                instagram: trimmed(self.social_media.instagram),
                twitter: trimmed(self.social_media.twitter),
                youtube: trimmed(self.social_media.youtube),
            },
        };

        if footer.email.is_empty() {
            return Err(ServiceError::invalid("Email is required."));
        }
        if footer.phone.is_empty() {
            return Err(ServiceError::invalid("Phone is required."));
        }
        if footer.address.is_empty() {
            return Err(ServiceError::invalid("Address is required."));
        }
        if footer.copyright.is_empty() {
            return Err(ServiceError::invalid("Copyright is required."));
        }
        if !is_valid_email(&footer.email) {
            return Err(ServiceError::invalid("Email is not valid."));
        }

        AnyOk(footer)
    }

    async fn fetch(pool: &sqlx::PgPool) -> Result<Option<FooterContactRow>, anyhow::Error> {
        let row = sqlx::query_as::<_, FooterContactRow>(
            "SELECT email, phone, address, description, copyright, facebook, instagram, twitter, youtube, updated_at FROM eventhub_footer_contact WHERE id = 1",
        )
        .fetch_optional(pool)
        .await?;
        AnyOk(row)
    }

    /// The stored footer or the defaults.
    pub async fn get(pool: &sqlx::PgPool) -> Result<FooterContact, anyhow::Error> {
        AnyOk(Self::fetch(pool).await?.map(FooterContact::from).unwrap_or_default())
    }

    pub async fn get_public(pool: &sqlx::PgPool) -> FooterContact {
        match Self::get(pool).await {
            Ok(footer) => footer,
            Err(e) => {
                warn!("Serving the default footer contact: {}", e);
                FooterContact::default()
            }
        }
    }

    pub async fn save(pool: &sqlx::PgPool, footer: FooterContact) -> Result<FooterContactSaved, anyhow::Error> {
        let footer = footer.checked()?;
        let existed = Self::fetch(pool).await?.is_some();

        let updated_at = sqlx::query_as::<_, (DateTime<Utc>,)>(
            "INSERT INTO eventhub_footer_contact (id, email, phone, address, description, copyright, facebook, instagram, twitter, youtube) \
             VALUES (1, $1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (id) DO UPDATE SET email = EXCLUDED.email, phone = EXCLUDED.phone, address = EXCLUDED.address, \
             description = EXCLUDED.description, copyright = EXCLUDED.copyright, facebook = EXCLUDED.facebook, \
             instagram = EXCLUDED.instagram, twitter = EXCLUDED.twitter, youtube = EXCLUDED.youtube, updated_at = now() \
             RETURNING updated_at",
        )
        .bind(&footer.email)
        .bind(&footer.phone)
        .bind(&footer.address)
        .bind(&footer.description)
        .bind(&footer.copyright)
        .bind(&footer.social_media.facebook)
        .bind(&footer.social_media.instagram)
        .bind(&footer.social_media.twitter)
        .bind(&footer.social_media.youtube)
        .fetch_one(pool)
        .await?
        .0;

        let message = if existed {
            "Footer contact was updated."
        } else {
            "Footer contact was saved."
        };

        AnyOk(FooterContactSaved {
            message: message.to_string(),
            data: footer,
            updated_at,
        })
    }

    pub async fn reset(pool: &sqlx::PgPool) -> Result<ContentReset, anyhow::Error> {
        sqlx::query("DELETE FROM eventhub_footer_contact")
            .execute(pool)
            .await?;

        info!("Footer contact was reset to the defaults");
        AnyOk(ContentReset {
            message: "Footer contact was reset to the defaults.".to_string(),
            reset_at: Utc::now(),
        })
    }

    pub async fn stats(pool: &sqlx::PgPool) -> Result<FooterContactStats, anyhow::Error> {
        let (total_entries,) = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM eventhub_footer_contact")
            .fetch_one(pool)
            .await?;
        let row = Self::fetch(pool).await?;
        let last_updated = row.as_ref().map(|r| r.updated_at);
        let has_data = row.is_some();
        let footer = row.map(FooterContact::from);

        let filled = |f: fn(&FooterContact) -> &str| {
            footer.as_ref().map(|v| !f(v).trim().is_empty()).unwrap_or(false)
        };

        AnyOk(FooterContactStats {
            total_entries,
            last_updated,
            has_data,
            summary: FooterSummary {
                has_email: filled(|f| f.email.as_str()),
                has_phone: filled(|f| f.phone.as_str()),
                has_address: filled(|f| f.address.as_str()),
                has_description: filled(|f| f.description.as_str()),
                has_copyright: filled(|f| f.copyright.as_str()),
            },
            social_media_count: footer.as_ref().map(|f| f.social_media.count()).unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup_test_db;

    #[test]
    fn test_default_contact_page() {
        let page = default_contact_page();
        assert_eq!(page.hero.title, "Hubungi Kami");
        assert_eq!(page.contact_items.len(), 4);
        assert_eq!(page.contact_items[2].details.len(), 3);
        assert_eq!(page.contact_items[3].action_url, None);
        assert_eq!(page.contact_items[3].order_position, 4);
    }

    #[test]
    fn test_hero_requires_all_fields() {
        let hero = ContactHero {
            title: "Hi".to_string(),
            subtitle: "  ".to_string(),
            description: "desc".to_string(),
        };
        assert!(hero.checked().is_err());
        assert!(ContactHero::default().checked().is_ok());
    }

    #[test]
    fn test_clean_details() {
        let details = vec![" a ".to_string(), "".to_string(), "b".to_string()];
        assert_eq!(clean_details(&details), vec!["a", "b"]);
    }

    #[test]
    fn test_footer_validation() {
        assert!(FooterContact::default().checked().is_ok());

        let mut footer = FooterContact::default();
        footer.copyright = " ".to_string();
        assert!(footer.checked().is_err());

        let mut footer = FooterContact::default();
        footer.email = "not-an-email".to_string();
        assert!(footer.checked().is_err());
    }

    #[test]
    fn test_social_media_count() {
        let mut footer = FooterContact::default();
        assert_eq!(footer.social_media.count(), 4);
        footer.social_media.twitter = "".to_string();
        assert_eq!(footer.social_media.count(), 3);
        assert_eq!(
            footer.social_media.facebook,
            "https://facebook.com/gastronomirun"
        );
    }

    #[tokio::test]
    #[ignore]
    async fn test_contact_reset_restores_defaults() {
        let pool = setup_test_db().await;
        ContactPage::reset(&pool).await.unwrap();

        let page = ContactPage::get(&pool).await.unwrap();
        assert_eq!(page.hero, ContactHero::default());
        assert_eq!(page.contact_items.len(), 4);

        FooterContact::reset(&pool).await.unwrap();
        let stats = FooterContact::stats(&pool).await.unwrap();
        assert!(!stats.has_data);
        assert_eq!(FooterContact::get(&pool).await.unwrap(), FooterContact::default());
    }

    #[tokio::test]
    #[ignore]
    async fn test_footer_save_reset_and_stats() {
        let _ = crate::init_logger("eventhub-test", log::LevelFilter::Debug);
        let pool = setup_test_db().await;
        FooterContact::reset(&pool).await.unwrap();

        let mut footer = FooterContact::default();
        footer.email = "  halo@gastronomirun.com ".to_string();
        footer.social_media.twitter = "".to_string();
        let saved = FooterContact::save(&pool, footer).await.unwrap();
        assert_eq!(saved.data.email, "halo@gastronomirun.com");

        let stats = FooterContact::stats(&pool).await.unwrap();
        assert!(stats.has_data);
        assert_eq!(stats.total_entries, 1);
        assert!(stats.summary.has_email);
        assert_eq!(stats.social_media_count, 3);
        assert_eq!(FooterContact::get(&pool).await.unwrap(), saved.data);

        let mut invalid = FooterContact::default();
        invalid.email = "nope".to_string();
        assert!(FooterContact::save(&pool, invalid).await.is_err());

        FooterContact::reset(&pool).await.unwrap();
        let stats = FooterContact::stats(&pool).await.unwrap();
        assert!(!stats.has_data);
        assert_eq!(stats.total_entries, 0);
        assert_eq!(FooterContact::get_public(&pool).await, FooterContact::default());
    }
}
