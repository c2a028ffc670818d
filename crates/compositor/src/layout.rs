//! Layout resolution: overlay settings to positioned fields.
//!
//! Pure and synchronous. Text is measured through [`FieldMeasure`] so the
//! same settings resolve identically on every render path.

use chrono::NaiveDateTime;

use photomark_model::{
    CustomLayout, DisplayItem, ExifData, FontWeight, LayoutMode, OverlaySettings,
};

use crate::draw::PixelRect;
use crate::text::{FieldMeasure, TextExtent};

/// Extra space between stacked preset lines, added to the font size.
pub const LINE_GAP: f32 = 4.0;

/// What a field draws.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldContent {
    Text(String),
    /// Brand logo asset for the given make.
    Logo(String),
}

/// One positioned overlay field.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    pub item: DisplayItem,
    pub content: FieldContent,

    /// Content bounds; text is drawn with its top-left here.
    pub bounds: PixelRect,

    /// Background panel: `bounds` grown by the background padding.
    pub panel: PixelRect,

    pub font_size: f32,
    pub weight: FontWeight,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLayout {
    pub mode: LayoutMode,
    pub fields: Vec<ResolvedField>,
}

impl ResolvedLayout {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter_map(|f| match &f.content {
                FieldContent::Text(t) => Some(t.as_str()),
                FieldContent::Logo(_) => None,
            })
            .collect()
    }
}

/// Content for `item`, or `None` when the metadata has no value for it.
pub fn field_content(item: DisplayItem, exif: &ExifData) -> Option<FieldContent> {
    let text = match item {
        DisplayItem::Brand => non_empty(exif.make.as_deref())?,
        DisplayItem::Model => non_empty(exif.model.as_deref())?,
        DisplayItem::Aperture => format!("f/{:.1}", exif.f_number.filter(|f| *f > 0.0)?),
        DisplayItem::ShutterSpeed => format_shutter(exif.exposure_time?)?,
        DisplayItem::Iso => format!("ISO {}", exif.iso?),
        DisplayItem::Timestamp => format_timestamp(exif.date_time_original.as_deref()?)?,
        DisplayItem::Location => {
            let gps = exif.gps?;
            format_location(gps.latitude, gps.longitude)
        }
        DisplayItem::BrandLogo => {
            return non_empty(exif.make.as_deref()).map(FieldContent::Logo);
        }
    };
    Some(FieldContent::Text(text))
}

fn non_empty(s: Option<&str>) -> Option<String> {
    let s = s?.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// `1/250s` below one second, `2s` or `2.5s` otherwise.
pub fn format_shutter(seconds: f64) -> Option<String> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return None;
    }
    if seconds < 1.0 {
        return Some(format!("1/{}s", (1.0 / seconds).round() as u64));
    }
    if seconds.fract() == 0.0 {
        Some(format!("{}s", seconds as u64))
    } else {
        Some(format!("{seconds:.1}s"))
    }
}

/// EXIF `YYYY:MM:DD HH:MM:SS` as `YYYY-MM-DD HH:MM:SS`. Unparseable values
/// are shown as stored.
pub fn format_timestamp(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Some(
        NaiveDateTime::parse_from_str(raw, "%Y:%m:%d %H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|_| raw.to_string()),
    )
}

pub fn format_location(latitude: f64, longitude: f64) -> String {
    let ns = if latitude < 0.0 { 'S' } else { 'N' };
    let ew = if longitude < 0.0 { 'W' } else { 'E' };
    format!(
        "{:.4}°{ns}, {:.4}°{ew}",
        latitude.abs(),
        longitude.abs()
    )
}

fn measure(
    content: &FieldContent,
    size: f32,
    weight: FontWeight,
    measurer: &dyn FieldMeasure,
) -> Option<TextExtent> {
    match content {
        FieldContent::Text(text) => Some(measurer.text_extent(text, size, weight)),
        FieldContent::Logo(brand) => measurer.logo_extent(brand, size),
    }
}

/// Resolve `settings` against an image of `width × height`.
pub fn resolve_layout(
    settings: &OverlaySettings,
    exif: &ExifData,
    width: u32,
    height: u32,
    measurer: &dyn FieldMeasure,
) -> ResolvedLayout {
    let settings = settings.normalized();
    let fields = match settings.layout_mode {
        LayoutMode::Preset => resolve_preset(&settings, exif, width, height, measurer),
        LayoutMode::Custom => resolve_custom(&settings, exif, width, height, measurer),
    };
    ResolvedLayout {
        mode: settings.layout_mode,
        fields,
    }
}

fn resolve_preset(
    settings: &OverlaySettings,
    exif: &ExifData,
    width: u32,
    height: u32,
    measurer: &dyn FieldMeasure,
) -> Vec<ResolvedField> {
    let size = settings.font.size;
    let weight = settings.font.weight;
    let pad = settings.background.padding.round() as u32;
    let pitch = size + LINE_GAP;

    let lines: Vec<(DisplayItem, FieldContent, TextExtent)> = settings
        .display_items
        .enabled()
        .filter_map(|item| {
            let content = field_content(item, exif)?;
            let extent = measure(&content, size, weight, measurer)?;
            Some((item, content, extent))
        })
        .collect();
    let Some(last) = lines.last() else {
        return Vec::new();
    };

    let offset = |i: usize| (i as f32 * pitch).round() as i32;
    let block_height = offset(lines.len() - 1) + last.2.height as i32;

    let position = settings.position;
    let block_top = if position.is_bottom() {
        height as i32 - pad as i32 - block_height
    } else {
        pad as i32
    };

    lines
        .into_iter()
        .enumerate()
        .map(|(i, (item, content, extent))| {
            let x = if position.is_right() {
                width as i32 - pad as i32 - extent.width as i32
            } else {
                pad as i32
            };
            let bounds = PixelRect::new(x, block_top + offset(i), extent.width, extent.height);
            ResolvedField {
                item,
                content,
                bounds,
                panel: bounds.inflate(pad),
                font_size: size,
                weight,
                color: settings.font.color.clone(),
            }
        })
        .collect()
}

fn resolve_custom(
    settings: &OverlaySettings,
    exif: &ExifData,
    width: u32,
    height: u32,
    measurer: &dyn FieldMeasure,
) -> Vec<ResolvedField> {
    let synthesized;
    let layout = match &settings.custom_layout {
        Some(layout) => layout,
        None => {
            synthesized = CustomLayout::synthesize(&settings.display_items, &settings.font);
            &synthesized
        }
    };
    let pad = settings.background.padding.round() as u32;
    let weight = settings.font.weight;

    layout
        .elements
        .iter()
        .filter(|el| el.visible && settings.display_items.is_enabled(el.item))
        .filter_map(|el| {
            let content = field_content(el.item, exif)?;
            let size = el.style.font_size;
            let extent = measure(&content, size, weight, measurer)?;
            let pos = layout.effective_position(el);
            let bounds = PixelRect::new(
                pos.x.round() as i32,
                pos.y.round() as i32,
                extent.width,
                extent.height,
            );
            if !bounds.intersects_image(width, height) {
                tracing::debug!(item = el.item.key(), "Custom element outside image, dropped");
                return None;
            }
            Some(ResolvedField {
                item: el.item,
                content,
                bounds,
                panel: bounds.inflate(pad),
                font_size: size,
                weight,
                color: el.style.color.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use photomark_model::{DisplayItems, ElementPosition, GpsCoordinates, OverlayPosition};

    /// Fixed-width measurer: 10 px per character, one em tall.
    struct Fixed;

    impl FieldMeasure for Fixed {
        fn text_extent(&self, text: &str, size: f32, _: FontWeight) -> TextExtent {
            TextExtent {
                width: text.chars().count() as u32 * 10,
                height: size.ceil() as u32,
            }
        }

        fn logo_extent(&self, _: &str, height: f32) -> Option<TextExtent> {
            Some(TextExtent {
                width: 2 * height as u32,
                height: height as u32,
            })
        }
    }

    fn canon() -> ExifData {
        ExifData {
            make: Some("Canon".into()),
            model: Some("EOS R5".into()),
            ..ExifData::default()
        }
    }

    fn brand_model(position: OverlayPosition) -> OverlaySettings {
        OverlaySettings {
            position,
            display_items: DisplayItems::only(&[DisplayItem::Brand, DisplayItem::Model]),
            ..OverlaySettings::default()
        }
    }

    #[test]
    fn test_bottom_right_block_is_inset_by_padding() {
        let settings = brand_model(OverlayPosition::BottomRight);
        let layout = resolve_layout(&settings, &canon(), 1920, 1080, &Fixed);

        assert_eq!(layout.texts(), vec!["Canon", "EOS R5"]);
        let [brand, model] = [&layout.fields[0], &layout.fields[1]];
        // Right-aligned against x = 1920 - 10.
        assert_eq!(brand.bounds.right(), 1910);
        assert_eq!(model.bounds.right(), 1910);
        // Lines are font size + 4 apart; block bottom sits at 1080 - 10.
        assert_eq!(model.bounds.y - brand.bounds.y, 20);
        assert_eq!(model.bounds.bottom(), 1070);
        assert_eq!(brand.panel, brand.bounds.inflate(10));
    }

    #[test]
    fn test_top_left_block() {
        let settings = brand_model(OverlayPosition::TopLeft);
        let layout = resolve_layout(&settings, &canon(), 800, 600, &Fixed);
        assert_eq!((layout.fields[0].bounds.x, layout.fields[0].bounds.y), (10, 10));
        assert_eq!((layout.fields[1].bounds.x, layout.fields[1].bounds.y), (10, 30));
    }

    #[test]
    fn test_fields_without_values_are_omitted() {
        let settings = OverlaySettings {
            display_items: DisplayItems::only(&[
                DisplayItem::Brand,
                DisplayItem::Iso,
                DisplayItem::Location,
            ]),
            ..OverlaySettings::default()
        };
        let layout = resolve_layout(&settings, &canon(), 800, 600, &Fixed);
        assert_eq!(layout.texts(), vec!["Canon"]);
        assert!(resolve_layout(&settings, &ExifData::default(), 800, 600, &Fixed).is_empty());
    }

    #[test]
    fn test_field_formatting() {
        let exif = ExifData {
            f_number: Some(2.8),
            exposure_time: Some(0.004),
            iso: Some(400),
            date_time_original: Some("2024:03:15 14:30:00".into()),
            gps: Some(GpsCoordinates {
                latitude: -33.8568,
                longitude: 151.2153,
                altitude: None,
            }),
            ..canon()
        };
        let text = |item| match field_content(item, &exif) {
            Some(FieldContent::Text(t)) => t,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(text(DisplayItem::Aperture), "f/2.8");
        assert_eq!(text(DisplayItem::ShutterSpeed), "1/250s");
        assert_eq!(text(DisplayItem::Iso), "ISO 400");
        assert_eq!(text(DisplayItem::Timestamp), "2024-03-15 14:30:00");
        assert_eq!(text(DisplayItem::Location), "33.8568°S, 151.2153°E");
        assert_eq!(
            field_content(DisplayItem::BrandLogo, &exif),
            Some(FieldContent::Logo("Canon".into()))
        );
        assert_eq!(format_shutter(2.0).unwrap(), "2s");
        assert_eq!(format_shutter(1.5).unwrap(), "1.5s");
        assert_eq!(format_shutter(0.0), None);
    }

    #[test]
    fn test_custom_elements_use_own_position_and_style() {
        let mut settings = brand_model(OverlayPosition::BottomRight);
        settings.switch_layout_mode(LayoutMode::Custom);
        {
            let layout = settings.custom_layout.as_mut().unwrap();
            layout.elements[1].position = ElementPosition { x: 103.0, y: 47.0 };
            layout.elements[1].style.font_size = 30.0;
            layout.elements[1].style.color = "#FF0000".into();
        }

        let layout = resolve_layout(&settings, &canon(), 800, 600, &Fixed);
        assert_eq!(layout.fields.len(), 2);
        assert_eq!((layout.fields[0].bounds.x, layout.fields[0].bounds.y), (10, 10));
        let model = &layout.fields[1];
        assert_eq!((model.bounds.x, model.bounds.y), (103, 47));
        assert_eq!(model.bounds.height, 30);
        assert_eq!(model.color, "#FF0000");

        settings.custom_layout.as_mut().unwrap().snap_to_grid = true;
        let snapped = resolve_layout(&settings, &canon(), 800, 600, &Fixed);
        assert_eq!((snapped.fields[1].bounds.x, snapped.fields[1].bounds.y), (100, 40));
    }

    #[test]
    fn test_custom_drops_hidden_disabled_and_offscreen() {
        let mut settings = brand_model(OverlayPosition::TopLeft);
        settings.switch_layout_mode(LayoutMode::Custom);
        let layout = settings.custom_layout.as_mut().unwrap();
        layout.elements[0].position = ElementPosition { x: 5000.0, y: 10.0 };

        let resolved = resolve_layout(&settings, &canon(), 800, 600, &Fixed);
        assert_eq!(resolved.texts(), vec!["EOS R5"]);

        // Partially outside stays (clipped when drawn).
        settings.custom_layout.as_mut().unwrap().elements[0].position =
            ElementPosition { x: 780.0, y: 10.0 };
        let resolved = resolve_layout(&settings, &canon(), 800, 600, &Fixed);
        assert_eq!(resolved.texts(), vec!["Canon", "EOS R5"]);

        settings.custom_layout.as_mut().unwrap().elements[1].visible = false;
        settings.display_items.set(DisplayItem::Brand, false);
        assert!(resolve_layout(&settings, &canon(), 800, 600, &Fixed).is_empty());
    }

    #[test]
    fn test_custom_mode_without_layout_synthesizes_on_the_fly() {
        let mut settings = brand_model(OverlayPosition::TopLeft);
        settings.layout_mode = LayoutMode::Custom;
        let layout = resolve_layout(&settings, &canon(), 800, 600, &Fixed);
        assert_eq!(layout.fields[1].bounds.y, 35);
        assert!(settings.custom_layout.is_none());
    }

    proptest::proptest! {
        #[test]
        fn test_preset_block_stays_inside_padding(
            width in 200u32..4000,
            height in 200u32..4000,
            corner in 0usize..4,
        ) {
            let position = [
                OverlayPosition::TopLeft,
                OverlayPosition::TopRight,
                OverlayPosition::BottomLeft,
                OverlayPosition::BottomRight,
            ][corner];
            let layout = resolve_layout(&brand_model(position), &canon(), width, height, &Fixed);
            proptest::prop_assert_eq!(layout.fields.len(), 2);
            for field in &layout.fields {
                proptest::prop_assert!(field.bounds.x >= 10 && field.bounds.y >= 10);
                proptest::prop_assert!(field.bounds.right() <= width as i32 - 10);
                proptest::prop_assert!(field.bounds.bottom() <= height as i32 - 10);
            }
        }
    }
}
