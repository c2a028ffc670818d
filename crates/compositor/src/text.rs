//! Font and logo assets, text measurement and glyph drawing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::{imageops::FilterType, Rgba, RgbaImage};
use rusttype::{point, Font, Scale};

use photomark_common::AssetConfig;
use photomark_model::FontWeight;

use crate::draw::blend;

/// Advance per character, in em, when no font is loaded.
pub const FALLBACK_ADVANCE_EM: f32 = 0.6;

/// Regular-weight fonts tried after the configured paths.
pub const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub const SYSTEM_BOLD_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// Measured size of a field's content in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextExtent {
    pub width: u32,
    pub height: u32,
}

/// Measures field content for layout.
pub trait FieldMeasure {
    fn text_extent(&self, text: &str, size: f32, weight: FontWeight) -> TextExtent;

    /// Size of the brand logo scaled to `height`, or `None` if no logo
    /// exists for `brand`.
    fn logo_extent(&self, brand: &str, height: f32) -> Option<TextExtent>;
}

/// Fonts and brand logos available to the compositor.
pub struct FontAssets {
    regular: Option<Font<'static>>,
    bold: Option<Font<'static>>,
    logo_dir: Option<PathBuf>,
    logos: Mutex<HashMap<String, Option<RgbaImage>>>,
}

impl std::fmt::Debug for FontAssets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontAssets")
            .field("regular", &self.regular.is_some())
            .field("bold", &self.bold.is_some())
            .field("logo_dir", &self.logo_dir)
            .finish()
    }
}

impl FontAssets {
    /// Load fonts from the configured paths, then the system locations.
    pub fn load(config: &AssetConfig) -> Self {
        let regular = first_font(
            config
                .font_paths
                .iter()
                .map(PathBuf::as_path)
                .chain(SYSTEM_FONT_PATHS.iter().map(Path::new)),
        );
        let bold = first_font(
            config
                .bold_font_paths
                .iter()
                .map(PathBuf::as_path)
                .chain(SYSTEM_BOLD_FONT_PATHS.iter().map(Path::new)),
        );

        if regular.is_none() {
            tracing::warn!("No usable font found; overlay text will not be drawn");
        }

        Self {
            regular,
            bold,
            logo_dir: config.logo_dir.clone(),
            logos: Mutex::new(HashMap::new()),
        }
    }

    /// No fonts and no logos. Layout uses fallback metrics.
    pub fn none() -> Self {
        Self {
            regular: None,
            bold: None,
            logo_dir: None,
            logos: Mutex::new(HashMap::new()),
        }
    }

    pub fn has_font(&self) -> bool {
        self.regular.is_some()
    }

    /// Font for `weight`, plus whether bold must be synthesized.
    fn font_for(&self, weight: FontWeight) -> Option<(&Font<'static>, bool)> {
        match weight {
            FontWeight::Bold => match &self.bold {
                Some(font) => Some((font, false)),
                None => self.regular.as_ref().map(|f| (f, true)),
            },
            FontWeight::Normal => self.regular.as_ref().map(|f| (f, false)),
        }
    }

    /// Logo for `brand` at its native size, loaded once per brand.
    pub fn logo(&self, brand: &str) -> Option<RgbaImage> {
        let dir = self.logo_dir.as_ref()?;
        let key = logo_key(brand);
        let mut cache = self.logos.lock().unwrap_or_else(|e| e.into_inner());
        cache
            .entry(key.clone())
            .or_insert_with(|| {
                let path = dir.join(format!("{key}.png"));
                match image::open(&path) {
                    Ok(img) => Some(img.to_rgba8()),
                    Err(e) => {
                        tracing::warn!(brand = %brand, path = %path.display(), error = %e, "Brand logo unavailable");
                        None
                    }
                }
            })
            .clone()
    }

    /// Logo for `brand` scaled to `height` pixels, keeping aspect ratio.
    pub fn scaled_logo(&self, brand: &str, height: f32) -> Option<RgbaImage> {
        let logo = self.logo(brand)?;
        let extent = scaled_extent(logo.width(), logo.height(), height)?;
        Some(image::imageops::resize(
            &logo,
            extent.width,
            extent.height,
            FilterType::Lanczos3,
        ))
    }

    /// Draw `text` with its top-left at `(x, y)`. Returns `false` when no
    /// font is loaded and nothing was drawn.
    pub fn draw_text(
        &self,
        img: &mut RgbaImage,
        text: &str,
        x: i32,
        y: i32,
        size: f32,
        weight: FontWeight,
        color: Rgba<u8>,
    ) -> bool {
        let Some((font, synth_bold)) = self.font_for(weight) else {
            return false;
        };
        draw_glyphs(img, font, text, x, y, size, color);
        if synth_bold {
            draw_glyphs(img, font, text, x + 1, y, size, color);
        }
        true
    }
}

impl FieldMeasure for FontAssets {
    fn text_extent(&self, text: &str, size: f32, weight: FontWeight) -> TextExtent {
        let height = size.ceil() as u32;
        match self.font_for(weight) {
            Some((font, synth_bold)) => TextExtent {
                width: glyph_width(font, text, size) + u32::from(synth_bold),
                height,
            },
            None => fallback_extent(text, size),
        }
    }

    fn logo_extent(&self, brand: &str, height: f32) -> Option<TextExtent> {
        let logo = self.logo(brand)?;
        scaled_extent(logo.width(), logo.height(), height)
    }
}

/// Fixed metrics: `0.6 em` per character, one em tall.
pub fn fallback_extent(text: &str, size: f32) -> TextExtent {
    let chars = text.chars().count() as f32;
    TextExtent {
        width: (chars * size * FALLBACK_ADVANCE_EM).ceil() as u32,
        height: size.ceil() as u32,
    }
}

fn scaled_extent(width: u32, height: u32, target_height: f32) -> Option<TextExtent> {
    if width == 0 || height == 0 || target_height < 1.0 {
        return None;
    }
    let h = target_height.round() as u32;
    let w = ((width as f32 * h as f32) / height as f32).round().max(1.0) as u32;
    Some(TextExtent {
        width: w,
        height: h,
    })
}

fn logo_key(brand: &str) -> String {
    brand
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn first_font<'a>(paths: impl Iterator<Item = &'a Path>) -> Option<Font<'static>> {
    for path in paths {
        let Ok(data) = std::fs::read(path) else {
            continue;
        };
        if let Some(font) = Font::try_from_vec(data) {
            tracing::debug!(path = %path.display(), "Loaded font");
            return Some(font);
        }
        tracing::warn!(path = %path.display(), "Unreadable font file");
    }
    None
}

fn glyph_width(font: &Font<'_>, text: &str, size: f32) -> u32 {
    let scale = Scale::uniform(size);
    let v = font.v_metrics(scale);
    let glyphs: Vec<_> = font.layout(text, scale, point(0.0, v.ascent)).collect();
    match (glyphs.first(), glyphs.last()) {
        (Some(first), Some(last)) => {
            let end = last.position().x + last.unpositioned().h_metrics().advance_width;
            (end - first.position().x).ceil().max(0.0) as u32
        }
        _ => 0,
    }
}

fn draw_glyphs(
    img: &mut RgbaImage,
    font: &Font<'_>,
    text: &str,
    x: i32,
    y: i32,
    size: f32,
    color: Rgba<u8>,
) {
    let scale = Scale::uniform(size);
    let v = font.v_metrics(scale);
    let (w, h) = (img.width() as i32, img.height() as i32);

    for glyph in font.layout(text, scale, point(x as f32, y as f32 + v.ascent)) {
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, v| {
            let px = bb.min.x + gx as i32;
            let py = bb.min.y + gy as i32;
            if px < 0 || py < 0 || px >= w || py >= h {
                return;
            }
            let coverage = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
            blend(img.get_pixel_mut(px as u32, py as u32), color, coverage);
        });
    }
}
