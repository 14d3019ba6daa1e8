//! Banner slides for the home (hero), about and services pages. All three galleries share one table keyed by kind.

use super::core::ServiceError;
use super::util::{extension_of, short_hex, UploadStore};
use crate::config;
use crate::imaging::{
    self, CropMode, Orientation, ProcessOutcome, SLIDE_ASPECT_RATIO, SLIDE_TARGET_HEIGHT,
    SLIDE_TARGET_WIDTH,
};
use anyhow::Ok as AnyOk;
use chrono::{DateTime, Utc};
use log::{info, warn};
use poem_openapi::{Enum, Object};
use serde::{Deserialize, Serialize};

pub const PUBLIC_SLIDE_LIMIT: i64 = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Enum)]
#[oai(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SlideKind {
    Hero,
    About,
    Services,
}

impl SlideKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlideKind::Hero => "hero",
            SlideKind::About => "about",
            SlideKind::Services => "services",
        }
    }

    /// Directory below the upload root.
    pub fn subdir(&self) -> &'static str {
        match self {
            SlideKind::Hero => "slider",
            SlideKind::About => "about",
            SlideKind::Services => "services",
        }
    }

    fn filename_prefix(&self) -> &'static str {
        match self {
            SlideKind::Hero => "",
            SlideKind::About => "about_",
            SlideKind::Services => "services_",
        }
    }

    pub fn all() -> [SlideKind; 3] {
        [SlideKind::Hero, SlideKind::About, SlideKind::Services]
    }
}

/// `<prefix><YYYYmmdd_HHMMSS>_<user_id>_<hex8>.<ext>`
pub fn slide_filename(kind: SlideKind, user_id: i64, original_name: Option<&str>) -> String {
    let ext = original_name
        .and_then(extension_of)
        .map(|e| imaging::output_extension(&e))
        .unwrap_or("jpg");
    format!(
        "{}{}_{}_{}.{}",
        kind.filename_prefix(),
        Utc::now().format("%Y%m%d_%H%M%S"),
        user_id,
        short_hex(),
        ext
    )
}

/// CSS hints for the public slider.
pub fn display_hints(orientation: &str) -> (&'static str, &'static str) {
    match Orientation::parse(orientation) {
        Orientation::Portrait => ("slider-portrait", "contain"),
        Orientation::Landscape => ("slider-landscape", "cover"),
        _ => ("slider-default", "cover"),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Slide {
    pub id: i64,
    pub kind: String,
    pub filename: String,
    pub original_name: Option<String>,
    pub description: Option<String>,
    pub order_position: i32,
    pub is_active: bool,
    pub orientation: String,
    pub image_width: Option<i32>,
    pub image_height: Option<i32>,
    pub crop_mode: String,
    pub processed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct SlideView {
    pub id: i64,
    pub kind: String,
    pub filename: String,
    pub original_name: Option<String>,
    pub description: Option<String>,
    pub order_position: i32,
    pub is_active: bool,
    pub orientation: String,
    pub image_width: Option<i32>,
    pub image_height: Option<i32>,
    pub crop_mode: String,
    pub processed: bool,
    pub url: String,
    pub aspect_ratio: f64,
    pub target_width: u32,
    pub target_height: u32,
    pub css_class: String,
    pub object_fit: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Slide> for SlideView {
    fn from(slide: Slide) -> Self {
        let (css_class, object_fit) = display_hints(&slide.orientation);
        SlideView {
            url: config::upload_url(&slide.relative_path()),
            id: slide.id,
            kind: slide.kind,
            filename: slide.filename,
            original_name: slide.original_name,
            description: slide.description,
            order_position: slide.order_position,
            is_active: slide.is_active,
            orientation: slide.orientation,
            image_width: slide.image_width,
            image_height: slide.image_height,
            crop_mode: slide.crop_mode,
            processed: slide.processed,
            aspect_ratio: SLIDE_ASPECT_RATIO,
            target_width: SLIDE_TARGET_WIDTH,
            target_height: SLIDE_TARGET_HEIGHT,
            css_class: css_class.to_string(),
            object_fit: object_fit.to_string(),
            created_at: slide.created_at,
            updated_at: slide.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct SlideUploaded {
    pub slide: SlideView,
    /// Missing when the image could not be processed, the slide is kept unprocessed.
    pub process_result: Option<ProcessOutcome>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct SlideUpdate {
    pub description: Option<String>,
    pub order_position: Option<i32>,
    pub is_active: Option<bool>,
    pub crop_mode: Option<String>,
    pub reprocess: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct OrientationCounts {
    pub portrait: i64,
    pub landscape: i64,
    pub square: i64,
    pub unknown: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct SlideStats {
    pub kind: String,
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    pub processed: i64,
    pub unprocessed: i64,
    pub orientations: OrientationCounts,
    pub target_width: u32,
    pub target_height: u32,
    pub aspect_ratio: f64,
}

impl Slide {
    pub fn relative_path(&self) -> String {
        match SlideKind::all().iter().find(|k| k.as_str() == self.kind) {
            Some(kind) => format!("{}/{}", kind.subdir(), self.filename),
            None => self.filename.clone(),
        }
    }

    pub async fn list(pool: &sqlx::PgPool, kind: SlideKind) -> Result<Vec<Slide>, anyhow::Error> {
        let slides = sqlx::query_as::<_, Slide>(
            "SELECT * FROM eventhub_slide WHERE kind = $1 ORDER BY order_position ASC, created_at DESC",
        )
        .bind(kind.as_str())
        .fetch_all(pool)
        .await?;

        AnyOk(slides)
    }

    pub async fn list_active(
        pool: &sqlx::PgPool,
        kind: SlideKind,
    ) -> Result<Vec<Slide>, anyhow::Error> {
        let slides = sqlx::query_as::<_, Slide>(
            "SELECT * FROM eventhub_slide WHERE kind = $1 AND is_active ORDER BY order_position ASC, created_at DESC LIMIT $2",
        )
        .bind(kind.as_str())
        .bind(PUBLIC_SLIDE_LIMIT)
        .fetch_all(pool)
        .await?;

        AnyOk(slides)
    }

    pub async fn get(pool: &sqlx::PgPool, kind: SlideKind, id: i64) -> Result<Slide, anyhow::Error> {
        let slide = sqlx::query_as::<_, Slide>(
            "SELECT * FROM eventhub_slide WHERE kind = $1 AND id = $2",
        )
        .bind(kind.as_str())
        .bind(id)
        .fetch_optional(pool)
        .await?;

        match slide {
            Some(slide) => AnyOk(slide),
            None => Err(ServiceError::not_found(&format!("Slide {}", id))),
        }
    }

    /// Run the image through the banner pipeline and persist orientation and final size.
    pub async fn process(
        &self,
        pool: &sqlx::PgPool,
        store: &UploadStore,
        mode: CropMode,
    ) -> Result<(Slide, ProcessOutcome), anyhow::Error> {
        let path = store.path_of(&self.relative_path());
        let outcome = imaging::process_slide_file(&path, mode)?;

        let slide = sqlx::query_as::<_, Slide>(
            "UPDATE eventhub_slide SET orientation = $1, image_width = $2, image_height = $3, crop_mode = $4, processed = TRUE, updated_at = now() WHERE id = $5 RETURNING *",
        )
        .bind(&outcome.orientation)
        .bind(outcome.new_size.width as i32)
        .bind(outcome.new_size.height as i32)
        .bind(mode.as_str())
        .bind(self.id)
        .fetch_one(pool)
        .await?;

        AnyOk((slide, outcome))
    }

    /// All slides of a kind, processing the ones that were stored but never processed.
    pub async fn list_processed(
        pool: &sqlx::PgPool,
        store: &UploadStore,
        kind: SlideKind,
    ) -> Result<Vec<Slide>, anyhow::Error> {
        let mut slides = Slide::list(pool, kind).await?;
        for slide in slides.iter_mut() {
            if slide.processed || !store.exists(&slide.relative_path()) {
                continue;
            }

            let mode = CropMode::parse(&slide.crop_mode);
            match slide.process(pool, store, mode).await {
                Ok((updated, _)) => *slide = updated,
                Err(e) => warn!("Failed to process slide {}: {}", slide.id, e),
            }
        }

        AnyOk(slides)
    }

    pub async fn upload(
        pool: &sqlx::PgPool,
        store: &UploadStore,
        kind: SlideKind,
        user_id: i64,
        original_name: Option<&str>,
        bytes: &[u8],
        description: Option<String>,
        order_position: i32,
        crop_mode: &str,
    ) -> Result<SlideUploaded, anyhow::Error> {
        let mode = CropMode::parse(crop_mode);
        let filename = slide_filename(kind, user_id, original_name);
        let relative_path = store.save_as(kind.subdir(), &filename, bytes)?;

        let inserted = sqlx::query_as::<_, Slide>(
            "INSERT INTO eventhub_slide (kind, filename, original_name, description, order_position, crop_mode) VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(kind.as_str())
        .bind(&filename)
        .bind(original_name)
        .bind(super::core::non_blank(description))
        .bind(order_position)
        .bind(mode.as_str())
        .fetch_one(pool)
        .await;

        let slide = match inserted {
            Ok(slide) => slide,
            Err(e) => {
                store.delete_quietly(&relative_path);
                return Err(e.into());
            }
        };

        let (slide, process_result) = match slide.process(pool, store, mode).await {
            Ok((slide, outcome)) => (slide, Some(outcome)),
            Err(e) => {
                warn!("Stored slide {} but processing failed: {}", slide.id, e);
                (slide, None)
            }
        };

        info!("Uploaded {} slide {} ({})", kind.as_str(), slide.id, filename);
        AnyOk(SlideUploaded {
            slide: slide.into(),
            process_result,
        })
    }

    pub async fn update(
        pool: &sqlx::PgPool,
        store: &UploadStore,
        kind: SlideKind,
        id: i64,
        payload: &SlideUpdate,
    ) -> Result<SlideUploaded, anyhow::Error> {
        let crop_mode = payload.crop_mode.as_deref().map(|m| CropMode::parse(m).as_str());
        let slide = sqlx::query_as::<_, Slide>(
            "UPDATE eventhub_slide SET description = COALESCE($1, description), order_position = COALESCE($2, order_position), is_active = COALESCE($3, is_active), crop_mode = COALESCE($4, crop_mode), updated_at = now() WHERE kind = $5 AND id = $6 RETURNING *",
        )
        .bind(&payload.description)
        .bind(payload.order_position)
        .bind(payload.is_active)
        .bind(crop_mode)
        .bind(kind.as_str())
        .bind(id)
        .fetch_optional(pool)
        .await?;

        let slide = match slide {
            Some(slide) => slide,
            None => return Err(ServiceError::not_found(&format!("Slide {}", id))),
        };

        if payload.reprocess.unwrap_or(false) {
            return Slide::reprocess(pool, store, kind, id, None).await;
        }

        AnyOk(SlideUploaded {
            slide: slide.into(),
            process_result: None,
        })
    }

    /// Process the stored file again, with the given mode or the stored one.
    pub async fn reprocess(
        pool: &sqlx::PgPool,
        store: &UploadStore,
        kind: SlideKind,
        id: i64,
        crop_mode: Option<&str>,
    ) -> Result<SlideUploaded, anyhow::Error> {
        let slide = Slide::get(pool, kind, id).await?;
        if !store.exists(&slide.relative_path()) {
            return Err(ServiceError::not_found(&format!(
                "Image file {}",
                slide.filename
            )));
        }

        let mode = CropMode::parse(crop_mode.unwrap_or(&slide.crop_mode));
        let (slide, outcome) = slide.process(pool, store, mode).await?;

        AnyOk(SlideUploaded {
            slide: slide.into(),
            process_result: Some(outcome),
        })
    }

    pub async fn delete(
        pool: &sqlx::PgPool,
        store: &UploadStore,
        kind: SlideKind,
        id: i64,
    ) -> Result<Slide, anyhow::Error> {
        let slide = sqlx::query_as::<_, Slide>(
            "DELETE FROM eventhub_slide WHERE kind = $1 AND id = $2 RETURNING *",
        )
        .bind(kind.as_str())
        .bind(id)
        .fetch_optional(pool)
        .await?;

        match slide {
            Some(slide) => {
                store.delete_quietly(&slide.relative_path());
                info!("Deleted {} slide {}", kind.as_str(), id);
                AnyOk(slide)
            }
            None => Err(ServiceError::not_found(&format!("Slide {}", id))),
        }
    }

    pub async fn stats(pool: &sqlx::PgPool, kind: SlideKind) -> Result<SlideStats, anyhow::Error> {
        let row = sqlx::query_as::<_, (i64, i64, i64, i64, i64, i64, i64)>(
            "SELECT COUNT(*),
                    COUNT(*) FILTER (WHERE is_active),
                    COUNT(*) FILTER (WHERE processed),
                    COUNT(*) FILTER (WHERE orientation = 'portrait'),
                    COUNT(*) FILTER (WHERE orientation = 'landscape'),
                    COUNT(*) FILTER (WHERE orientation = 'square'),
                    COUNT(*) FILTER (WHERE orientation NOT IN ('portrait', 'landscape', 'square'))
             FROM eventhub_slide WHERE kind = $1",
        )
        .bind(kind.as_str())
        .fetch_one(pool)
        .await?;

        let (total, active, processed, portrait, landscape, square, unknown) = row;
        AnyOk(SlideStats {
            kind: kind.as_str().to_string(),
            total,
            active,
            inactive: total - active,
            processed,
            unprocessed: total - processed,
            orientations: OrientationCounts {
                portrait,
                landscape,
                square,
                unknown,
            },
            target_width: SLIDE_TARGET_WIDTH,
            target_height: SLIDE_TARGET_HEIGHT,
            aspect_ratio: SLIDE_ASPECT_RATIO,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_hints() {
        assert_eq!(display_hints("portrait"), ("slider-portrait", "contain"));
        assert_eq!(display_hints("landscape"), ("slider-landscape", "cover"));
        assert_eq!(display_hints("square"), ("slider-default", "cover"));
        assert_eq!(display_hints(""), ("slider-default", "cover"));
    }

    #[test]
    fn test_slide_filename() {
        let hero = slide_filename(SlideKind::Hero, 12, Some("Banner.PNG"));
        assert!(hero.ends_with(".png"));
        assert!(hero.contains("_12_"));
        assert!(hero.chars().next().unwrap().is_ascii_digit());

        let about = slide_filename(SlideKind::About, 3, Some("photo.webp"));
        assert!(about.starts_with("about_"));
        assert!(about.ends_with(".jpg"));

        let services = slide_filename(SlideKind::Services, 3, None);
        assert!(services.starts_with("services_"));
        assert!(services.ends_with(".jpg"));
    }

    #[test]
    fn test_relative_path_and_view() {
        let now = Utc::now();
        let slide = Slide {
            id: 1,
            kind: "about".to_string(),
            filename: "about_x.jpg".to_string(),
            original_name: None,
            description: None,
            order_position: 0,
            is_active: true,
            orientation: "portrait".to_string(),
            image_width: Some(1200),
            image_height: Some(600),
            crop_mode: "smart".to_string(),
            processed: true,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(slide.relative_path(), "about/about_x.jpg");

        let view: SlideView = slide.into();
        assert!(view.url.ends_with("/uploads/about/about_x.jpg"));
        assert_eq!(view.css_class, "slider-portrait");
        assert_eq!(view.object_fit, "contain");
        assert_eq!(view.target_width, 1200);
    }

    fn gif_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            width,
            height,
            image::Rgba([30, 60, 90, 255]),
        ));
        let mut buf: Vec<u8> = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Gif)
            .unwrap();
        buf
    }

    #[test]
    fn test_gif_slide_is_processed_under_jpg_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf());

        let filename = slide_filename(SlideKind::Hero, 1, Some("banner.gif"));
        assert!(filename.ends_with(".jpg"));
        let relative_path = store
            .save_as(SlideKind::Hero.subdir(), &filename, &gif_bytes(500, 500))
            .unwrap();

        let outcome =
            imaging::process_slide_file(&store.path_of(&relative_path), CropMode::Fit).unwrap();
        assert_eq!(outcome.action, "fitted_with_padding");
        assert_eq!(outcome.orientation, "square");
        let written = store.read(&relative_path).unwrap();
        assert_eq!(image::guess_format(&written).unwrap(), image::ImageFormat::Jpeg);
    }

    #[tokio::test]
    #[ignore]
    async fn test_upload_then_process_on_list() {
        let _ = crate::init_logger("eventhub-test", log::LevelFilter::Debug);
        let pool = crate::setup_test_db().await;
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf());

        let uploaded = Slide::upload(
            &pool,
            &store,
            SlideKind::About,
            1,
            Some("team.gif"),
            &gif_bytes(300, 600),
            Some("Tim".to_string()),
            1,
            "smart",
        )
        .await
        .unwrap();
        let outcome = uploaded.process_result.unwrap();
        assert_eq!(outcome.action, "cropped_and_resized");
        assert!(uploaded.slide.processed);
        assert_eq!(uploaded.slide.orientation, "portrait");
        assert_eq!(uploaded.slide.image_width, Some(SLIDE_TARGET_WIDTH as i32));

        // Bytes that do not decode are kept, unprocessed.
        let broken = Slide::upload(
            &pool,
            &store,
            SlideKind::About,
            1,
            Some("later.jpg"),
            b"not yet an image",
            None,
            2,
            "fit",
        )
        .await
        .unwrap();
        assert!(broken.process_result.is_none());
        assert!(!broken.slide.processed);

        let slide = Slide::get(&pool, SlideKind::About, broken.slide.id).await.unwrap();
        std::fs::write(store.path_of(&slide.relative_path()), gif_bytes(800, 400)).unwrap();

        let listed = Slide::list_processed(&pool, &store, SlideKind::About).await.unwrap();
        let fixed = listed.iter().find(|s| s.id == slide.id).unwrap();
        assert!(fixed.processed);
        assert_eq!(fixed.crop_mode, "fit");
        assert_eq!(fixed.orientation, "landscape");

        for id in [uploaded.slide.id, slide.id] {
            Slide::delete(&pool, &store, SlideKind::About, id).await.unwrap();
        }
        assert!(!store.exists(&slide.relative_path()));
    }
}
