//! Decorative frame settings.

use serde::{Deserialize, Serialize};

use crate::overlay::{clamp_unit, non_negative};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSettings {
    pub enabled: bool,
    pub style: FrameStyle,

    /// Border color.
    pub color: String,

    /// Border width in pixels.
    pub width: f32,

    /// Border opacity `[0.0, 1.0]`.
    pub opacity: f32,

    /// Style-specific extras; each style reads the subset it needs.
    #[serde(default)]
    pub custom_properties: FrameCustomProperties,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FrameStyle {
    /// Solid border, optional rounded corners.
    #[default]
    Simple,
    /// Border plus blurred drop shadow.
    Shadow,
    /// Dark border with sprocket holes along top and bottom.
    Film,
    /// Wide caption band at the bottom.
    Polaroid,
    /// Tinted translucent border, no shadow.
    Vintage,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameCustomProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow_blur: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow_offset: Option<ShadowOffset>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowOffset {
    pub x: f32,
    pub y: f32,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            style: FrameStyle::Simple,
            color: "#FFFFFF".to_string(),
            width: 20.0,
            opacity: 1.0,
            custom_properties: FrameCustomProperties::default(),
        }
    }
}

impl FrameSettings {
    /// Copy with width, opacity and style extras clamped to valid ranges.
    pub fn normalized(&self) -> Self {
        let mut out = self.clone();
        out.width = non_negative(out.width);
        out.opacity = clamp_unit(out.opacity);
        let props = &mut out.custom_properties;
        props.corner_radius = props.corner_radius.map(non_negative);
        props.shadow_blur = props.shadow_blur.map(non_negative);
        out
    }

    /// Whether drawing this frame changes the image at all.
    pub fn is_visible(&self) -> bool {
        self.enabled && (self.width > 0.0 || self.style == FrameStyle::Film)
    }
}

impl FrameStyle {
    pub const ALL: [FrameStyle; 5] = [
        FrameStyle::Simple,
        FrameStyle::Shadow,
        FrameStyle::Film,
        FrameStyle::Polaroid,
        FrameStyle::Vintage,
    ];
}
