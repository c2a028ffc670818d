//! Overlay settings: what metadata to draw and how.
//!
//! JSON uses the front-end naming (camelCase keys, kebab-case positions).
//! The backend boundary has its own naming, see [`crate::wire`].

use serde::{Deserialize, Serialize};

use crate::custom_layout::CustomLayout;

/// Smallest font size accepted for overlay text, in pixels.
pub const FONT_SIZE_MIN: f32 = 8.0;
/// Largest font size accepted for overlay text, in pixels.
pub const FONT_SIZE_MAX: f32 = 72.0;

/// Instruction for what metadata to draw and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlaySettings {
    /// Preset corner anchoring or free-form element positions.
    #[serde(default)]
    pub layout_mode: LayoutMode,

    /// Anchor corner (preset mode only).
    pub position: OverlayPosition,

    /// Text styling.
    pub font: FontSettings,

    /// Panel drawn behind each text field.
    pub background: BackgroundSettings,

    /// Which fields are emitted.
    pub display_items: DisplayItems,

    /// Per-element layout, present once custom mode has been entered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_layout: Option<CustomLayout>,
}

/// Overlay layout mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    #[default]
    Preset,
    Custom,
}

/// Corner anchor for preset layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OverlayPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

impl OverlayPosition {
    pub fn is_right(self) -> bool {
        matches!(self, Self::TopRight | Self::BottomRight)
    }

    pub fn is_bottom(self) -> bool {
        matches!(self, Self::BottomLeft | Self::BottomRight)
    }
}

/// Text styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSettings {
    /// Font family name (informational; the loaded font asset is used).
    pub family: String,

    /// Size in pixels, clamped to `[8, 72]`.
    pub size: f32,

    /// Text color (`#RRGGBB`, `#RRGGBBAA`, `rgb()`, `rgba()`).
    pub color: String,

    pub weight: FontWeight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// Panel drawn behind overlay text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundSettings {
    pub color: String,

    /// Panel opacity `[0.0, 1.0]`.
    pub opacity: f32,

    /// Space between text bounds and panel edge, and between the block and
    /// the image edge in preset mode.
    pub padding: f32,

    pub border_radius: f32,
}

/// Toggles for each overlay field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayItems {
    pub brand: bool,
    pub model: bool,
    pub aperture: bool,
    pub shutter_speed: bool,
    pub iso: bool,
    pub timestamp: bool,
    pub location: bool,
    pub brand_logo: bool,
}

/// One overlay field. Declaration order is the fixed field order used for
/// preset stacking and custom element synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DisplayItem {
    Brand,
    Model,
    Aperture,
    ShutterSpeed,
    Iso,
    Timestamp,
    Location,
    BrandLogo,
}

impl DisplayItem {
    /// All fields in field order.
    pub const ALL: [DisplayItem; 8] = [
        DisplayItem::Brand,
        DisplayItem::Model,
        DisplayItem::Aperture,
        DisplayItem::ShutterSpeed,
        DisplayItem::Iso,
        DisplayItem::Timestamp,
        DisplayItem::Location,
        DisplayItem::BrandLogo,
    ];

    /// The `displayItems` key for this field.
    pub fn key(self) -> &'static str {
        match self {
            Self::Brand => "brand",
            Self::Model => "model",
            Self::Aperture => "aperture",
            Self::ShutterSpeed => "shutterSpeed",
            Self::Iso => "iso",
            Self::Timestamp => "timestamp",
            Self::Location => "location",
            Self::BrandLogo => "brandLogo",
        }
    }
}

impl DisplayItems {
    /// Everything off.
    pub const NONE: DisplayItems = DisplayItems {
        brand: false,
        model: false,
        aperture: false,
        shutter_speed: false,
        iso: false,
        timestamp: false,
        location: false,
        brand_logo: false,
    };

    pub fn is_enabled(&self, item: DisplayItem) -> bool {
        match item {
            DisplayItem::Brand => self.brand,
            DisplayItem::Model => self.model,
            DisplayItem::Aperture => self.aperture,
            DisplayItem::ShutterSpeed => self.shutter_speed,
            DisplayItem::Iso => self.iso,
            DisplayItem::Timestamp => self.timestamp,
            DisplayItem::Location => self.location,
            DisplayItem::BrandLogo => self.brand_logo,
        }
    }

    pub fn set(&mut self, item: DisplayItem, enabled: bool) {
        let slot = match item {
            DisplayItem::Brand => &mut self.brand,
            DisplayItem::Model => &mut self.model,
            DisplayItem::Aperture => &mut self.aperture,
            DisplayItem::ShutterSpeed => &mut self.shutter_speed,
            DisplayItem::Iso => &mut self.iso,
            DisplayItem::Timestamp => &mut self.timestamp,
            DisplayItem::Location => &mut self.location,
            DisplayItem::BrandLogo => &mut self.brand_logo,
        };
        *slot = enabled;
    }

    /// Enabled fields in field order.
    pub fn enabled(&self) -> impl Iterator<Item = DisplayItem> + '_ {
        DisplayItem::ALL
            .into_iter()
            .filter(move |item| self.is_enabled(*item))
    }

    /// Build a set with exactly the given fields enabled.
    pub fn only(items: &[DisplayItem]) -> Self {
        let mut set = Self::NONE;
        for item in items {
            set.set(*item, true);
        }
        set
    }
}

impl Default for DisplayItems {
    fn default() -> Self {
        Self {
            brand: true,
            model: true,
            aperture: true,
            shutter_speed: true,
            iso: true,
            timestamp: true,
            location: false,
            brand_logo: false,
        }
    }
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            family: "DejaVu Sans".to_string(),
            size: 16.0,
            color: "#FFFFFF".to_string(),
            weight: FontWeight::Normal,
        }
    }
}

impl Default for BackgroundSettings {
    fn default() -> Self {
        Self {
            color: "#000000".to_string(),
            opacity: 0.6,
            padding: 10.0,
            border_radius: 5.0,
        }
    }
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            layout_mode: LayoutMode::Preset,
            position: OverlayPosition::BottomRight,
            font: FontSettings::default(),
            background: BackgroundSettings::default(),
            display_items: DisplayItems::default(),
            custom_layout: None,
        }
    }
}

impl OverlaySettings {
    /// Copy with every numeric field clamped to its documented range.
    pub fn normalized(&self) -> Self {
        let mut out = self.clone();
        out.font.size = clamp_font_size(out.font.size);
        out.background.opacity = clamp_unit(out.background.opacity);
        out.background.padding = non_negative(out.background.padding);
        out.background.border_radius = non_negative(out.background.border_radius);
        if let Some(layout) = out.custom_layout.as_mut() {
            layout.normalize();
        }
        out
    }

    /// Switch layout mode. Entering custom mode for the first time
    /// synthesizes one element per enabled field; later entries only add
    /// elements for fields enabled since.
    pub fn switch_layout_mode(&mut self, mode: LayoutMode) {
        if mode == LayoutMode::Custom {
            match self.custom_layout.as_mut() {
                Some(layout) => layout.sync_with(&self.display_items, &self.font),
                None => {
                    self.custom_layout =
                        Some(CustomLayout::synthesize(&self.display_items, &self.font));
                }
            }
        }
        self.layout_mode = mode;
    }
}

pub fn clamp_font_size(size: f32) -> f32 {
    if size.is_nan() {
        return FONT_SIZE_MIN;
    }
    size.clamp(FONT_SIZE_MIN, FONT_SIZE_MAX)
}

pub(crate) fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

pub(crate) fn non_negative(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.max(0.0)
}
