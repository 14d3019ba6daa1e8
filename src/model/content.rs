//! Section/key/value content behind the about, services and partners pages.
//!
//! Each page has a fixed layout that maps the fields the frontend reads (`hero_title`, `services`,
//! ...) to a stored `(section, key)` pair. Missing rows fall back to the layout default, so a page
//! renders even on an empty database.

use super::core::ServiceError;
use super::slide::{Slide, SlideKind, SlideStats};
use super::util::{extension_of, short_hex, UploadStore, MB};
use anyhow::Ok as AnyOk;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use poem_openapi::{Enum, Object};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub const PARTNER_LOGO_SUBDIR: &str = "uploads/partner";
pub const PARTNER_LOGO_URL_PREFIX: &str = "/static/uploads/partner/";
pub const PARTNER_LOGO_MAX_SIZE: usize = 5 * MB;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Enum)]
#[oai(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Page {
    About,
    Services,
    Partners,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Text,
    Array,
    Object,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Array => "array",
            ContentType::Object => "object",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(ContentType::Text),
            "array" => Some(ContentType::Array),
            "object" => Some(ContentType::Object),
            _ => None,
        }
    }

    /// Value written when an update leaves the field out.
    fn blank(&self) -> Value {
        match self {
            ContentType::Text => Value::String("".to_string()),
            ContentType::Array => json!([]),
            ContentType::Object => json!({}),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub field: &'static str,
    pub section: &'static str,
    pub key: &'static str,
    pub content_type: ContentType,
    pub default: Value,
}

fn field(
    field: &'static str,
    section: &'static str,
    key: &'static str,
    content_type: ContentType,
    default: Value,
) -> FieldSpec {
    FieldSpec {
        field,
        section,
        key,
        content_type,
        default,
    }
}

fn default_contact_info() -> Value {
    json!({
        "email": "info@gastronomirun.com",
        "phone": "(021) 1234-5678",
        "address": "Jakarta Running Center, Indonesia",
        "social_media": {
            "facebook": "https://facebook.com/gastronomirun",
            "instagram": "https://instagram.com/gastronomirun",
            "twitter": "https://twitter.com/gastronomirun",
            "youtube": "https://youtube.com/gastronomirun"
        }
    })
}

fn default_services() -> Value {
    json!([
        {
            "icon": "Activity",
            "title": "Event Organization",
            "description": "Menyelenggarakan berbagai jenis event lari dengan rute yang menarik melalui kota-kota besar Indonesia.",
            "features": ["Rute terukur & aman", "Pendaftaran online", "Tim medis standby"]
        },
        {
            "icon": "Utensils",
            "title": "Culinary Experience",
            "description": "Mengintegrasikan pengalaman kuliner lokal dalam setiap event untuk memperkaya petualangan peserta.",
            "features": ["Food tasting", "Local cuisine", "Nutrition guidance"]
        },
        {
            "icon": "Trophy",
            "title": "Race Package",
            "description": "Paket lengkap termasuk jersey, medali finisher, timing chip, dan souvenir eksklusif.",
            "features": ["Quality merchandise", "Finisher medal", "Digital certificate"]
        },
        {
            "icon": "Users",
            "title": "Community Building",
            "description": "Membangun komunitas pelari yang solid dengan regular training sessions dan gathering.",
            "features": ["Weekly runs", "Training programs", "Social events"]
        }
    ])
}

fn default_target_audience() -> Value {
    json!([
        {
            "title": "Untuk Pelari",
            "icon": "Users",
            "description": "Kami menyediakan event lari berkualitas dengan rute yang menarik, sistem pendaftaran yang mudah, dan pengalaman yang memuaskan. Setiap event dirancang untuk memberikan pengalaman terbaik bagi pelari dari berbagai level.",
            "features": ["Event berkualitas", "Rute menarik", "Pendaftaran mudah", "Pengalaman memuaskan"]
        },
        {
            "title": "Untuk Event Organizer & Brand",
            "icon": "Award",
            "description": "Kami adalah partner terpercaya untuk menyelenggarakan event lari yang tepat sasaran dengan desain yang kreatif dan profesional. Kami membantu brand dan event organizer meningkatkan reach mereka melalui platform dan jaringan yang luas.",
            "features": ["Partner terpercaya", "Desain kreatif", "Platform luas", "Jaringan kuat"]
        }
    ])
}

fn default_partners() -> Value {
    let partners = [
        ("Nike", "Official Running Partner", "sponsor", "https://nike.com"),
        ("Adidas", "Sports Equipment Partner", "sponsor", "https://adidas.com"),
        ("Garmin", "Wearable Technology Partner", "sponsor", "https://garmin.com"),
        ("Compressport", "Compression Wear Partner", "sponsor", "https://compressport.com"),
        ("Runner's World", "Running Magazine Media Partner", "media", "https://runnersworld.com"),
        ("Jogja Running Club", "Community Running Partner", "community", "https://jogjarunningclub.com"),
    ];

    Value::Array(
        partners
            .iter()
            .enumerate()
            .map(|(i, (name, description, category, website))| {
                json!({
                    "name": name,
                    "description": description,
                    "category": category,
                    "logo": "",
                    "website": website,
                    "order": i + 1
                })
            })
            .collect(),
    )
}

static ABOUT_LAYOUT: Lazy<Vec<FieldSpec>> = Lazy::new(|| {
    vec![
        field("hero_title", "hero", "title", ContentType::Text, json!("")),
        field("hero_subtitle", "hero", "subtitle", ContentType::Text, json!("")),
        field("hero_description", "hero", "description", ContentType::Text, json!("")),
        field("services", "services", "items", ContentType::Array, json!([])),
        field("statistics", "statistics", "items", ContentType::Array, json!([])),
        field("contact_info", "contact", "info", ContentType::Object, json!({})),
    ]
});

static SERVICES_LAYOUT: Lazy<Vec<FieldSpec>> = Lazy::new(|| {
    vec![
        field("hero_title", "hero", "title", ContentType::Text, json!("LAYANAN KAMI")),
        field(
            "hero_subtitle",
            "hero",
            "subtitle",
            ContentType::Text,
            json!("Solusi Lengkap untuk Pengalaman Lari Terbaik"),
        ),
        field(
            "hero_description",
            "hero",
            "description",
            ContentType::Text,
            json!("Dari event organization hingga community building, kami menyediakan semua yang Anda butuhkan untuk pengalaman lari yang tak terlupakan."),
        ),
        field("services", "services", "items", ContentType::Array, default_services()),
        field(
            "target_audience",
            "target_audience",
            "items",
            ContentType::Array,
            default_target_audience(),
        ),
        field("contact_info", "contact", "info", ContentType::Object, default_contact_info()),
    ]
});

static PARTNERS_LAYOUT: Lazy<Vec<FieldSpec>> = Lazy::new(|| {
    vec![
        field("hero_title", "hero", "title", ContentType::Text, json!("Partner & Sponsorship")),
        field(
            "hero_subtitle",
            "hero",
            "subtitle",
            ContentType::Text,
            json!("Berkolaborasi untuk Kesuksesan Bersama"),
        ),
        field("partners", "partners", "items", ContentType::Array, default_partners()),
    ]
});

impl Page {
    pub fn as_str(&self) -> &'static str {
        match self {
            Page::About => "about",
            Page::Services => "services",
            Page::Partners => "partners",
        }
    }

    pub fn layout(&self) -> &'static [FieldSpec] {
        match self {
            Page::About => &ABOUT_LAYOUT,
            Page::Services => &SERVICES_LAYOUT,
            Page::Partners => &PARTNERS_LAYOUT,
        }
    }

    /// Sections in layout order, without duplicates.
    pub fn sections(&self) -> Vec<&'static str> {
        let mut sections: Vec<&'static str> = vec![];
        for spec in self.layout() {
            if !sections.contains(&spec.section) {
                sections.push(spec.section);
            }
        }
        sections
    }

    pub fn slide_kind(&self) -> Option<SlideKind> {
        match self {
            Page::About => Some(SlideKind::About),
            Page::Services => Some(SlideKind::Services),
            Page::Partners => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object, sqlx::FromRow)]
pub struct PageContentRow {
    pub id: i64,
    pub page: String,
    pub section: String,
    pub section_key: String,
    pub content_type: String,
    pub content_value: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct SectionUpdate {
    pub section: String,
    #[oai(default)]
    pub data: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct SectionUpdated {
    pub message: String,
    pub section: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct ContentReset {
    pub message: String,
    pub reset_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct SectionCount {
    pub section: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct PageStats {
    pub page: String,
    pub total_items: i64,
    pub sections: Vec<SectionCount>,
    // `has_<section>_data`, set only for the sections in the page layout.
    #[oai(skip_serializing_if_is_none)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_hero_data: Option<bool>,
    #[oai(skip_serializing_if_is_none)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_services_data: Option<bool>,
    #[oai(skip_serializing_if_is_none)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_statistics_data: Option<bool>,
    #[oai(skip_serializing_if_is_none)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_contact_data: Option<bool>,
    #[oai(skip_serializing_if_is_none)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_target_audience_data: Option<bool>,
    #[oai(skip_serializing_if_is_none)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_partners_data: Option<bool>,
    pub slides: Option<SlideStats>,
    pub last_updated: Option<DateTime<Utc>>,
    pub generated_at: DateTime<Utc>,
}

impl PageStats {
    /// Shape per-section row counts `(section, count, last update)` into the stats object.
    pub fn build(
        page: Page,
        counts: Vec<(String, i64, Option<DateTime<Utc>>)>,
        slides: Option<SlideStats>,
    ) -> PageStats {
        let sections = page.sections();
        let flag = |section: &str| {
            if sections.contains(&section) {
                Some(counts.iter().any(|(s, n, _)| s == section && *n > 0))
            } else {
                None
            }
        };

        PageStats {
            page: page.as_str().to_string(),
            total_items: counts.iter().map(|(_, n, _)| n).sum(),
            last_updated: counts.iter().filter_map(|(_, _, t)| *t).max(),
            has_hero_data: flag("hero"),
            has_services_data: flag("services"),
            has_statistics_data: flag("statistics"),
            has_contact_data: flag("contact"),
            has_target_audience_data: flag("target_audience"),
            has_partners_data: flag("partners"),
            sections: counts
                .into_iter()
                .map(|(section, count, _)| SectionCount { section, count })
                .collect(),
            slides,
            generated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Enum)]
#[oai(rename_all = "lowercase")]
pub enum BulkOperation {
    Export,
    Import,
    Validate,
}

fn parse_stored(content_type: &str, raw: Option<&str>) -> Value {
    match ContentType::parse(content_type) {
        Some(ContentType::Array) | Some(ContentType::Object) => match raw {
            Some(raw) if !raw.is_empty() => match serde_json::from_str::<Value>(raw) {
                Ok(v) => v,
                Err(e) => {
                    debug!("Stored value is not valid json ({}), returning it as text", e);
                    Value::String(raw.to_string())
                }
            },
            _ => json!([]),
        },
        _ => Value::String(raw.unwrap_or("").to_string()),
    }
}

fn serialize_value(content_type: ContentType, value: &Value) -> String {
    match (content_type, value) {
        (ContentType::Text, Value::String(s)) => s.clone(),
        (ContentType::Text, Value::Null) => "".to_string(),
        _ => value.to_string(),
    }
}

/// Build the frontend object for a page from its stored rows.
pub fn format_page(page: Page, rows: &[PageContentRow]) -> Map<String, Value> {
    let mut out = Map::new();
    for spec in page.layout() {
        let stored = rows
            .iter()
            .find(|r| r.section == spec.section && r.section_key == spec.key);
        let value = match stored {
            Some(row) => parse_stored(&row.content_type, row.content_value.as_deref()),
            None => spec.default.clone(),
        };
        out.insert(spec.field.to_string(), value);
    }
    out
}

/// Logo paths saved by older admin screens are bare file names or lack the leading slash.
pub fn normalize_logo(logo: &str) -> String {
    let logo = logo.trim();
    if logo.is_empty() || logo.starts_with("http://") || logo.starts_with("https://") || logo.starts_with('/') {
        logo.to_string()
    } else if logo.starts_with("static/uploads/partner/") {
        format!("/{}", logo)
    } else if !logo.contains('/') {
        format!("{}{}", PARTNER_LOGO_URL_PREFIX, logo)
    } else {
        logo.to_string()
    }
}

fn normalize_partner_logos(content: &mut Map<String, Value>) {
    if let Some(Value::Array(partners)) = content.get_mut("partners") {
        for partner in partners.iter_mut() {
            if let Some(Value::String(logo)) = partner.get_mut("logo") {
                *logo = normalize_logo(logo);
            }
        }
    }
}

pub async fn rows(pool: &sqlx::PgPool, page: Page) -> Result<Vec<PageContentRow>, anyhow::Error> {
    let rows = sqlx::query_as::<_, PageContentRow>(
        "SELECT * FROM eventhub_page_content WHERE page = $1 ORDER BY section ASC, section_key ASC",
    )
    .bind(page.as_str())
    .fetch_all(pool)
    .await?;

    AnyOk(rows)
}

pub async fn get_page(pool: &sqlx::PgPool, page: Page) -> Result<Map<String, Value>, anyhow::Error> {
    AnyOk(format_page(page, &rows(pool, page).await?))
}

/// Page content as served to visitors.
pub async fn get_public_page(
    pool: &sqlx::PgPool,
    page: Page,
) -> Result<Map<String, Value>, anyhow::Error> {
    let mut content = get_page(pool, page).await?;
    if page == Page::Partners {
        normalize_partner_logos(&mut content);
    }
    AnyOk(content)
}

async fn upsert(
    executor: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    page: Page,
    section: &str,
    key: &str,
    content_type: &str,
    value: Option<&str>,
) -> Result<(), anyhow::Error> {
    sqlx::query(
        "INSERT INTO eventhub_page_content (page, section, section_key, content_type, content_value) VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (page, section, section_key) DO UPDATE SET content_type = EXCLUDED.content_type, content_value = EXCLUDED.content_value, updated_at = now()",
    )
    .bind(page.as_str())
    .bind(section)
    .bind(key)
    .bind(content_type)
    .bind(value)
    .execute(&mut *executor)
    .await?;

    AnyOk(())
}

/// Write every field of one layout section. Unknown sections are accepted without writes.
pub async fn update_section(
    pool: &sqlx::PgPool,
    page: Page,
    payload: &SectionUpdate,
) -> Result<SectionUpdated, anyhow::Error> {
    let section = payload.section.trim();
    if section.is_empty() {
        return Err(ServiceError::invalid("Section is required."));
    }

    let specs: Vec<&FieldSpec> = page.layout().iter().filter(|s| s.section == section).collect();
    if specs.is_empty() {
        warn!("Ignoring update of unknown section {} on {}", section, page.as_str());
    }

    let mut tx = pool.begin().await?;
    for spec in specs {
        let value = match payload.data.get(spec.field) {
            Some(v) if !v.is_null() => v.clone(),
            _ => spec.content_type.blank(),
        };
        let serialized = serialize_value(spec.content_type, &value);
        upsert(&mut tx, page, spec.section, spec.key, spec.content_type.as_str(), Some(serialized.as_str())).await?;
    }
    tx.commit().await?;

    info!("Updated section {} of page {}", section, page.as_str());
    AnyOk(SectionUpdated {
        message: format!("Section {} updated", section),
        section: section.to_string(),
        updated_at: Utc::now(),
    })
}

/// Drop stored rows so the defaults apply again.
pub async fn reset(
    pool: &sqlx::PgPool,
    page: Page,
    section: Option<&str>,
) -> Result<ContentReset, anyhow::Error> {
    let result = sqlx::query(
        "DELETE FROM eventhub_page_content WHERE page = $1 AND ($2::TEXT IS NULL OR section = $2)",
    )
    .bind(page.as_str())
    .bind(section)
    .execute(pool)
    .await?;

    info!(
        "Reset {} row(s) of page {}",
        result.rows_affected(),
        page.as_str()
    );
    let message = match section {
        Some(section) => format!("Section {} was reset to its defaults", section),
        None => format!("All {} content was reset to its defaults", page.as_str()),
    };

    AnyOk(ContentReset {
        message,
        reset_at: Utc::now(),
    })
}

pub async fn stats(pool: &sqlx::PgPool, page: Page) -> Result<PageStats, anyhow::Error> {
    let counts = sqlx::query_as::<_, (String, i64, Option<DateTime<Utc>>)>(
        "SELECT section, COUNT(*), MAX(updated_at) FROM eventhub_page_content WHERE page = $1 GROUP BY section ORDER BY section",
    )
    .bind(page.as_str())
    .fetch_all(pool)
    .await?;

    let slides = match page.slide_kind() {
        Some(kind) => Some(Slide::stats(pool, kind).await?),
        None => None,
    };

    AnyOk(PageStats::build(page, counts, slides))
}

/// Export, import or validate the stored rows of a page.
pub async fn bulk(
    pool: &sqlx::PgPool,
    page: Page,
    operation: BulkOperation,
    data: Option<Value>,
) -> Result<Value, anyhow::Error> {
    match operation {
        BulkOperation::Export => {
            let rows = rows(pool, page).await?;
            AnyOk(json!({
                "operation": "export",
                "page": page.as_str(),
                "data": rows.iter().map(|r| json!({
                    "section": r.section,
                    "section_key": r.section_key,
                    "content_type": r.content_type,
                    "content_value": r.content_value,
                })).collect::<Vec<Value>>(),
                "exported_at": Utc::now().to_rfc3339(),
            }))
        }
        BulkOperation::Import => {
            let items = match data.as_ref().and_then(|d| d.get("data")).and_then(Value::as_array) {
                Some(items) => items.clone(),
                None => return Err(ServiceError::invalid("Import needs a data array.")),
            };

            let mut imported = 0u64;
            let mut skipped = 0u64;
            let mut tx = pool.begin().await?;
            for item in items.iter() {
                let section = item.get("section").and_then(Value::as_str);
                let key = item.get("section_key").and_then(Value::as_str);
                let content_type = item
                    .get("content_type")
                    .and_then(Value::as_str)
                    .and_then(ContentType::parse);
                let value = match item.get("content_value") {
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(Value::Null) | None => None,
                    Some(other) => Some(other.to_string()),
                };

                // A null value is stored as NULL and reads back as the empty value of its type.
                match (section, key, content_type) {
                    (Some(section), Some(key), Some(content_type))
                        if !section.is_empty() && !key.is_empty() =>
                    {
                        upsert(&mut tx, page, section, key, content_type.as_str(), value.as_deref()).await?;
                        imported += 1;
                    }
                    _ => {
                        warn!("Skipping malformed import item: {}", item);
                        skipped += 1;
                    }
                }
            }
            tx.commit().await?;

            AnyOk(json!({
                "operation": "import",
                "imported": imported,
                "skipped": skipped,
                "imported_at": Utc::now().to_rfc3339(),
            }))
        }
        BulkOperation::Validate => {
            let rows = rows(pool, page).await?;
            let mut required = Map::new();
            for section in page.sections() {
                required.insert(
                    section.to_string(),
                    Value::Bool(rows.iter().any(|r| r.section == section)),
                );
            }
            let is_valid = required.values().all(|v| v == &Value::Bool(true));

            AnyOk(json!({
                "operation": "validate",
                "results": {
                    "required_data": required,
                    "is_valid": is_valid,
                },
                "validated_at": Utc::now().to_rfc3339(),
            }))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct PartnerLogoUploaded {
    pub message: String,
    pub image_url: String,
    pub filename: String,
    pub file_size: u64,
    pub partner_index: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct PartnerLogoFile {
    pub filename: String,
    pub size: u64,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct PartnerLogoListing {
    pub directory: String,
    pub exists: bool,
    pub file_count: u64,
    pub files: Vec<PartnerLogoFile>,
}

/// `partner_<YYYYmmdd_HHMMSS>_<hex8>.<ext>`, unknown extensions become `jpg`.
pub fn partner_logo_filename(original_name: Option<&str>) -> String {
    let ext = match original_name.and_then(extension_of).as_deref() {
        Some(".jpg") | Some(".jpeg") => "jpg",
        Some(".png") => "png",
        Some(".gif") => "gif",
        Some(".webp") => "webp",
        Some(".svg") => "svg",
        _ => "jpg",
    };
    format!(
        "partner_{}_{}.{}",
        Utc::now().format("%Y%m%d_%H%M%S"),
        short_hex(),
        ext
    )
}

pub fn save_partner_logo(
    store: &UploadStore,
    original_name: Option<&str>,
    bytes: &[u8],
    partner_index: Option<i32>,
) -> Result<PartnerLogoUploaded, anyhow::Error> {
    if bytes.len() > PARTNER_LOGO_MAX_SIZE {
        return Err(ServiceError::invalid("The logo must not exceed 5MB."));
    }

    let filename = partner_logo_filename(original_name);
    store.save_as(PARTNER_LOGO_SUBDIR, &filename, bytes)?;
    info!("Saved partner logo {}", filename);

    AnyOk(PartnerLogoUploaded {
        message: "Logo uploaded".to_string(),
        image_url: format!("{}{}", PARTNER_LOGO_URL_PREFIX, filename),
        filename,
        file_size: bytes.len() as u64,
        partner_index,
    })
}

pub fn list_partner_logos(store: &UploadStore) -> Result<PartnerLogoListing, anyhow::Error> {
    let dir = store.dir_of(PARTNER_LOGO_SUBDIR);
    let mut files = vec![];

    if dir.is_dir() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let filename = entry.file_name().to_string_lossy().to_string();
            files.push(PartnerLogoFile {
                url: format!("{}{}", PARTNER_LOGO_URL_PREFIX, filename),
                filename,
                size: metadata.len(),
            });
        }
    }
    files.sort_by(|a, b| a.filename.cmp(&b.filename));

    AnyOk(PartnerLogoListing {
        directory: dir.to_string_lossy().to_string(),
        exists: dir.is_dir(),
        file_count: files.len() as u64,
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(section: &str, key: &str, content_type: &str, value: Option<&str>) -> PageContentRow {
        let now = Utc::now();
        PageContentRow {
            id: 1,
            page: "services".to_string(),
            section: section.to_string(),
            section_key: key.to_string(),
            content_type: content_type.to_string(),
            content_value: value.map(|v| v.to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_format_page_defaults() {
        let services = format_page(Page::Services, &[]);
        assert_eq!(services["hero_title"], json!("LAYANAN KAMI"));
        assert_eq!(services["services"].as_array().unwrap().len(), 4);
        assert_eq!(services["target_audience"].as_array().unwrap().len(), 2);
        assert_eq!(
            services["contact_info"]["email"],
            json!("info@gastronomirun.com")
        );

        let about = format_page(Page::About, &[]);
        assert_eq!(about["hero_title"], json!(""));
        assert_eq!(about["statistics"], json!([]));
        assert_eq!(about["contact_info"], json!({}));

        let partners = format_page(Page::Partners, &[]);
        let list = partners["partners"].as_array().unwrap();
        assert_eq!(list.len(), 6);
        assert_eq!(list[0]["name"], json!("Nike"));
        assert_eq!(list[5]["category"], json!("community"));
        assert_eq!(list[5]["order"], json!(6));
    }

    #[test]
    fn test_format_page_stored_values() {
        let rows = vec![
            row("hero", "title", "text", Some("Layanan")),
            row("services", "items", "array", Some(r#"[{"title":"Only"}]"#)),
            row("target_audience", "items", "array", Some("not json")),
            row("contact", "info", "object", None),
        ];
        let content = format_page(Page::Services, &rows);
        assert_eq!(content["hero_title"], json!("Layanan"));
        assert_eq!(content["services"], json!([{"title": "Only"}]));
        assert_eq!(content["target_audience"], json!("not json"));
        assert_eq!(content["contact_info"], json!([]));
        // Untouched fields keep the default.
        assert_eq!(
            content["hero_subtitle"],
            json!("Solusi Lengkap untuk Pengalaman Lari Terbaik")
        );
    }

    #[test]
    fn test_serialize_value() {
        assert_eq!(serialize_value(ContentType::Text, &json!("Hi")), "Hi");
        assert_eq!(serialize_value(ContentType::Text, &Value::Null), "");
        assert_eq!(serialize_value(ContentType::Array, &json!([1, 2])), "[1,2]");
        assert_eq!(serialize_value(ContentType::Object, &json!({})), "{}");
    }

    #[test]
    fn test_normalize_logo() {
        assert_eq!(normalize_logo("nike.png"), "/static/uploads/partner/nike.png");
        assert_eq!(
            normalize_logo("static/uploads/partner/nike.png"),
            "/static/uploads/partner/nike.png"
        );
        assert_eq!(
            normalize_logo("/static/uploads/partner/nike.png"),
            "/static/uploads/partner/nike.png"
        );
        assert_eq!(normalize_logo("https://cdn.example/nike.png"), "https://cdn.example/nike.png");
        assert_eq!(normalize_logo(""), "");
        assert_eq!(normalize_logo("images/nike.png"), "images/nike.png");
    }

    #[test]
    fn test_normalize_partner_logos() {
        let mut content = format_page(Page::Partners, &[]);
        content["partners"][0]["logo"] = json!("nike.svg");
        normalize_partner_logos(&mut content);
        assert_eq!(
            content["partners"][0]["logo"],
            json!("/static/uploads/partner/nike.svg")
        );
        assert_eq!(content["partners"][1]["logo"], json!(""));
    }

    #[test]
    fn test_page_sections() {
        assert_eq!(
            Page::About.sections(),
            vec!["hero", "services", "statistics", "contact"]
        );
        assert_eq!(Page::Partners.sections(), vec!["hero", "partners"]);
        assert_eq!(Page::Partners.slide_kind(), None);
    }

    #[test]
    fn test_partner_logo_storage() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf());

        let uploaded = save_partner_logo(&store, Some("logo.bmp"), b"img", Some(2)).unwrap();
        assert!(uploaded.filename.starts_with("partner_"));
        assert!(uploaded.filename.ends_with(".jpg"));
        assert!(uploaded.image_url.starts_with("/static/uploads/partner/"));
        assert_eq!(uploaded.file_size, 3);

        let listing = list_partner_logos(&store).unwrap();
        assert!(listing.exists);
        assert_eq!(listing.file_count, 1);
        assert_eq!(listing.files[0].filename, uploaded.filename);

        let too_big = vec![0u8; PARTNER_LOGO_MAX_SIZE + 1];
        assert!(save_partner_logo(&store, Some("a.png"), &too_big, None).is_err());
    }

    #[test]
    fn test_page_stats_flags_are_top_level() {
        let now = Utc::now();
        let stats = PageStats::build(
            Page::About,
            vec![
                ("hero".to_string(), 3, Some(now)),
                ("statistics".to_string(), 1, None),
            ],
            None,
        );
        assert_eq!(stats.total_items, 4);
        assert_eq!(stats.last_updated, Some(now));
        assert_eq!(stats.has_hero_data, Some(true));
        assert_eq!(stats.has_services_data, Some(false));
        assert_eq!(stats.has_partners_data, None);

        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["has_hero_data"], json!(true));
        assert_eq!(value["has_contact_data"], json!(false));
        assert!(value.get("has_partners_data").is_none());
        assert!(value.get("has_target_audience_data").is_none());
        assert!(value.get("flags").is_none());

        let partners = PageStats::build(Page::Partners, vec![], None);
        assert_eq!(partners.has_partners_data, Some(false));
        assert_eq!(partners.has_services_data, None);
    }

    #[tokio::test]
    #[ignore]
    async fn test_update_section_and_bulk_import() {
        let _ = crate::init_logger("eventhub-test", log::LevelFilter::Debug);
        let pool = crate::setup_test_db().await;
        reset(&pool, Page::About, None).await.unwrap();

        // Missing and null fields store the empty value of their type.
        let update = SectionUpdate {
            section: " hero ".to_string(),
            data: json!({"hero_title": "Tentang Kami", "hero_subtitle": null}),
        };
        let updated = update_section(&pool, Page::About, &update).await.unwrap();
        assert_eq!(updated.section, "hero");
        let page = get_page(&pool, Page::About).await.unwrap();
        assert_eq!(page["hero_title"], json!("Tentang Kami"));
        assert_eq!(page["hero_subtitle"], json!(""));
        assert_eq!(page["hero_description"], json!(""));

        let services = SectionUpdate {
            section: "services".to_string(),
            data: json!({"services": null}),
        };
        update_section(&pool, Page::About, &services).await.unwrap();
        assert_eq!(get_page(&pool, Page::About).await.unwrap()["services"], json!([]));

        let unknown = SectionUpdate {
            section: "sidebar".to_string(),
            data: json!({"x": 1}),
        };
        update_section(&pool, Page::About, &unknown).await.unwrap();
        let blank = SectionUpdate {
            section: "  ".to_string(),
            data: json!({}),
        };
        assert!(update_section(&pool, Page::About, &blank).await.is_err());

        let imported = bulk(
            &pool,
            Page::About,
            BulkOperation::Import,
            Some(json!({"data": [
                {"section": "statistics", "section_key": "items", "content_type": "array", "content_value": null},
                {"section": "contact", "section_key": "info", "content_type": "object", "content_value": {"email": "a@b.co"}},
                {"section": "", "section_key": "items", "content_type": "array", "content_value": "[]"},
                {"section": "hero", "section_key": "title", "content_type": "blob", "content_value": "x"},
            ]})),
        )
        .await
        .unwrap();
        assert_eq!(imported["imported"], json!(2));
        assert_eq!(imported["skipped"], json!(2));

        let page = get_page(&pool, Page::About).await.unwrap();
        assert_eq!(page["statistics"], json!([]));
        assert_eq!(page["contact_info"], json!({"email": "a@b.co"}));

        let validated = bulk(&pool, Page::About, BulkOperation::Validate, None).await.unwrap();
        assert_eq!(validated["results"]["is_valid"], json!(true));

        let stats = stats(&pool, Page::About).await.unwrap();
        assert_eq!(stats.has_statistics_data, Some(true));
        assert_eq!(stats.total_items, 6);

        reset(&pool, Page::About, None).await.unwrap();
        assert!(bulk(&pool, Page::About, BulkOperation::Import, None).await.is_err());
    }
}
