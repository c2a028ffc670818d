//! Backend boundary naming.
//!
//! The native renderer speaks snake_case keys and PascalCase enum tags
//! (`"BottomRight"`, `"ShutterSpeed"`), where the front end uses camelCase
//! keys and kebab/lowercase tags. Every translation between the two lives
//! here. Enum tables are declared once through `wire_enum!`, which derives
//! both directions from the same rows so they cannot drift apart.

use serde::{Deserialize, Serialize};

use crate::custom_layout::{CustomLayout, CustomLayoutElement, ElementPosition, ElementStyle};
use crate::format::OutputFormat;
use crate::frame::{FrameCustomProperties, FrameSettings, FrameStyle, ShadowOffset};
use crate::metadata::{ExifData, GpsCoordinates};
use crate::overlay::{
    BackgroundSettings, DisplayItem, DisplayItems, FontSettings, FontWeight, LayoutMode,
    OverlayPosition, OverlaySettings,
};

macro_rules! wire_enum {
    ($(#[$meta:meta])* $wire:ident <=> $domain:ident { $($w:ident <=> $d:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $wire {
            $($w),+
        }

        impl From<$domain> for $wire {
            fn from(value: $domain) -> Self {
                match value {
                    $($domain::$d => $wire::$w),+
                }
            }
        }

        impl From<$wire> for $domain {
            fn from(value: $wire) -> Self {
                match value {
                    $($wire::$w => $domain::$d),+
                }
            }
        }
    };
}

wire_enum!(WireLayoutMode <=> LayoutMode {
    Preset <=> Preset,
    Custom <=> Custom,
});

wire_enum!(WirePosition <=> OverlayPosition {
    TopLeft <=> TopLeft,
    TopRight <=> TopRight,
    BottomLeft <=> BottomLeft,
    BottomRight <=> BottomRight,
});

wire_enum!(WireFontWeight <=> FontWeight {
    Normal <=> Normal,
    Bold <=> Bold,
});

wire_enum!(WireDisplayItem <=> DisplayItem {
    Brand <=> Brand,
    Model <=> Model,
    Aperture <=> Aperture,
    ShutterSpeed <=> ShutterSpeed,
    Iso <=> Iso,
    Timestamp <=> Timestamp,
    Location <=> Location,
    BrandLogo <=> BrandLogo,
});

wire_enum!(WireFrameStyle <=> FrameStyle {
    Simple <=> Simple,
    Shadow <=> Shadow,
    Film <=> Film,
    Polaroid <=> Polaroid,
    Vintage <=> Vintage,
});

wire_enum!(WireOutputFormat <=> OutputFormat {
    Jpeg <=> Jpeg,
    Png <=> Png,
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireOverlaySettings {
    pub layout_mode: WireLayoutMode,
    pub position: WirePosition,
    pub font: WireFont,
    pub background: WireBackground,
    pub display_items: WireDisplayItems,
    pub custom_layout: Option<WireCustomLayout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireFont {
    pub family: String,
    pub size: f32,
    pub color: String,
    pub weight: WireFontWeight,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireBackground {
    pub color: String,
    pub opacity: f32,
    pub padding: f32,
    pub border_radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireDisplayItems {
    pub brand: bool,
    pub model: bool,
    pub aperture: bool,
    pub shutter_speed: bool,
    pub iso: bool,
    pub timestamp: bool,
    pub location: bool,
    pub brand_logo: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireCustomLayout {
    pub elements: Vec<WireLayoutElement>,
    pub grid_enabled: bool,
    pub grid_size: f32,
    pub snap_to_grid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireLayoutElement {
    pub id: String,
    pub element_type: WireDisplayItem,
    pub x: f32,
    pub y: f32,
    pub visible: bool,
    pub font_size: f32,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireFrameSettings {
    pub enabled: bool,
    pub style: WireFrameStyle,
    pub color: String,
    pub width: f32,
    pub opacity: f32,
    pub corner_radius: Option<f32>,
    pub shadow_blur: Option<f32>,
    pub shadow_offset_x: Option<f32>,
    pub shadow_offset_y: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireExif {
    pub make: Option<String>,
    pub model: Option<String>,
    pub lens_model: Option<String>,
    pub f_number: Option<f64>,
    pub exposure_time: Option<f64>,
    pub iso: Option<u32>,
    pub focal_length: Option<f64>,
    pub date_time_original: Option<String>,
    pub gps_latitude: Option<f64>,
    pub gps_longitude: Option<f64>,
    pub gps_altitude: Option<f64>,
}

/// Arguments of a backend render call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRenderRequest {
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub overlay_settings: WireOverlaySettings,
    pub frame_settings: WireFrameSettings,
    pub exif: WireExif,
    pub format: WireOutputFormat,
    pub quality: f32,
}

impl From<&OverlaySettings> for WireOverlaySettings {
    fn from(s: &OverlaySettings) -> Self {
        Self {
            layout_mode: s.layout_mode.into(),
            position: s.position.into(),
            font: WireFont {
                family: s.font.family.clone(),
                size: s.font.size,
                color: s.font.color.clone(),
                weight: s.font.weight.into(),
            },
            background: WireBackground {
                color: s.background.color.clone(),
                opacity: s.background.opacity,
                padding: s.background.padding,
                border_radius: s.background.border_radius,
            },
            display_items: s.display_items.into(),
            custom_layout: s.custom_layout.as_ref().map(WireCustomLayout::from),
        }
    }
}

impl From<WireOverlaySettings> for OverlaySettings {
    fn from(w: WireOverlaySettings) -> Self {
        Self {
            layout_mode: w.layout_mode.into(),
            position: w.position.into(),
            font: FontSettings {
                family: w.font.family,
                size: w.font.size,
                color: w.font.color,
                weight: w.font.weight.into(),
            },
            background: BackgroundSettings {
                color: w.background.color,
                opacity: w.background.opacity,
                padding: w.background.padding,
                border_radius: w.background.border_radius,
            },
            display_items: w.display_items.into(),
            custom_layout: w.custom_layout.map(CustomLayout::from),
        }
    }
}

impl From<DisplayItems> for WireDisplayItems {
    fn from(d: DisplayItems) -> Self {
        Self {
            brand: d.brand,
            model: d.model,
            aperture: d.aperture,
            shutter_speed: d.shutter_speed,
            iso: d.iso,
            timestamp: d.timestamp,
            location: d.location,
            brand_logo: d.brand_logo,
        }
    }
}

impl From<WireDisplayItems> for DisplayItems {
    fn from(w: WireDisplayItems) -> Self {
        Self {
            brand: w.brand,
            model: w.model,
            aperture: w.aperture,
            shutter_speed: w.shutter_speed,
            iso: w.iso,
            timestamp: w.timestamp,
            location: w.location,
            brand_logo: w.brand_logo,
        }
    }
}

impl From<&CustomLayout> for WireCustomLayout {
    fn from(l: &CustomLayout) -> Self {
        Self {
            elements: l
                .elements
                .iter()
                .map(|el| WireLayoutElement {
                    id: el.id.clone(),
                    element_type: el.item.into(),
                    x: el.position.x,
                    y: el.position.y,
                    visible: el.visible,
                    font_size: el.style.font_size,
                    color: el.style.color.clone(),
                })
                .collect(),
            grid_enabled: l.grid_enabled,
            grid_size: l.grid_size,
            snap_to_grid: l.snap_to_grid,
        }
    }
}

impl From<WireCustomLayout> for CustomLayout {
    fn from(w: WireCustomLayout) -> Self {
        Self {
            elements: w
                .elements
                .into_iter()
                .map(|el| CustomLayoutElement {
                    id: el.id,
                    item: el.element_type.into(),
                    position: ElementPosition { x: el.x, y: el.y },
                    visible: el.visible,
                    style: ElementStyle {
                        font_size: el.font_size,
                        color: el.color,
                    },
                })
                .collect(),
            grid_enabled: w.grid_enabled,
            grid_size: w.grid_size,
            snap_to_grid: w.snap_to_grid,
        }
    }
}

impl From<&FrameSettings> for WireFrameSettings {
    fn from(f: &FrameSettings) -> Self {
        let props = &f.custom_properties;
        Self {
            enabled: f.enabled,
            style: f.style.into(),
            color: f.color.clone(),
            width: f.width,
            opacity: f.opacity,
            corner_radius: props.corner_radius,
            shadow_blur: props.shadow_blur,
            shadow_offset_x: props.shadow_offset.map(|o| o.x),
            shadow_offset_y: props.shadow_offset.map(|o| o.y),
        }
    }
}

impl From<WireFrameSettings> for FrameSettings {
    fn from(w: WireFrameSettings) -> Self {
        let shadow_offset = match (w.shadow_offset_x, w.shadow_offset_y) {
            (Some(x), Some(y)) => Some(ShadowOffset { x, y }),
            _ => None,
        };
        Self {
            enabled: w.enabled,
            style: w.style.into(),
            color: w.color,
            width: w.width,
            opacity: w.opacity,
            custom_properties: FrameCustomProperties {
                corner_radius: w.corner_radius,
                shadow_blur: w.shadow_blur,
                shadow_offset,
            },
        }
    }
}

impl From<&ExifData> for WireExif {
    fn from(e: &ExifData) -> Self {
        Self {
            make: e.make.clone(),
            model: e.model.clone(),
            lens_model: e.lens_model.clone(),
            f_number: e.f_number,
            exposure_time: e.exposure_time,
            iso: e.iso,
            focal_length: e.focal_length,
            date_time_original: e.date_time_original.clone(),
            gps_latitude: e.gps.map(|g| g.latitude),
            gps_longitude: e.gps.map(|g| g.longitude),
            gps_altitude: e.gps.and_then(|g| g.altitude),
        }
    }
}

impl From<WireExif> for ExifData {
    fn from(w: WireExif) -> Self {
        let gps = match (w.gps_latitude, w.gps_longitude) {
            (Some(latitude), Some(longitude)) => Some(GpsCoordinates {
                latitude,
                longitude,
                altitude: w.gps_altitude,
            }),
            _ => None,
        };
        Self {
            make: w.make,
            model: w.model,
            lens_model: w.lens_model,
            f_number: w.f_number,
            exposure_time: w.exposure_time,
            iso: w.iso,
            focal_length: w.focal_length,
            date_time_original: w.date_time_original,
            gps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_wire_json_naming() {
        let mut overlay = OverlaySettings::default();
        overlay.switch_layout_mode(LayoutMode::Custom);
        let json = serde_json::to_value(WireOverlaySettings::from(&overlay)).unwrap();

        assert_eq!(json["layout_mode"], "Custom");
        assert_eq!(json["position"], "BottomRight");
        assert_eq!(json["display_items"]["shutter_speed"], true);
        assert_eq!(json["background"]["border_radius"], 5.0);
        assert_eq!(json["custom_layout"]["elements"][3]["element_type"], "ShutterSpeed");
        assert_eq!(json["custom_layout"]["snap_to_grid"], false);
    }

    #[test]
    fn test_frame_defaults_round_trip() {
        let frame = FrameSettings::default();
        let back = FrameSettings::from(WireFrameSettings::from(&frame));
        assert_eq!(back, frame);
    }

    fn arb_item() -> impl Strategy<Value = DisplayItem> {
        (0usize..DisplayItem::ALL.len()).prop_map(|i| DisplayItem::ALL[i])
    }

    fn arb_items() -> impl Strategy<Value = DisplayItems> {
        proptest::collection::vec(arb_item(), 0..8).prop_map(|v| DisplayItems::only(&v))
    }

    fn arb_element() -> impl Strategy<Value = CustomLayoutElement> {
        (arb_item(), -500.0f32..5000.0, -500.0f32..5000.0, any::<bool>(), 8.0f32..72.0, "#[0-9A-F]{6}")
            .prop_map(|(item, x, y, visible, font_size, color)| CustomLayoutElement {
                id: item.key().to_string(),
                item,
                position: ElementPosition { x, y },
                visible,
                style: ElementStyle { font_size, color },
            })
    }

    fn arb_layout() -> impl Strategy<Value = Option<CustomLayout>> {
        proptest::option::of(
            (
                proptest::collection::vec(arb_element(), 0..8),
                any::<bool>(),
                10.0f32..50.0,
                any::<bool>(),
            )
                .prop_map(|(elements, grid_enabled, grid_size, snap_to_grid)| CustomLayout {
                    elements,
                    grid_enabled,
                    grid_size,
                    snap_to_grid,
                }),
        )
    }

    fn arb_overlay() -> impl Strategy<Value = OverlaySettings> {
        (
            prop_oneof![Just(LayoutMode::Preset), Just(LayoutMode::Custom)],
            prop_oneof![
                Just(OverlayPosition::TopLeft),
                Just(OverlayPosition::TopRight),
                Just(OverlayPosition::BottomLeft),
                Just(OverlayPosition::BottomRight),
            ],
            ("[A-Za-z ]{1,12}", 8.0f32..72.0, "#[0-9A-F]{6}", any::<bool>()),
            ("#[0-9A-F]{6}", 0.0f32..1.0, 0.0f32..40.0, 0.0f32..20.0),
            arb_items(),
            arb_layout(),
        )
            .prop_map(|(layout_mode, position, font, bg, display_items, custom_layout)| {
                OverlaySettings {
                    layout_mode,
                    position,
                    font: FontSettings {
                        family: font.0,
                        size: font.1,
                        color: font.2,
                        weight: if font.3 { FontWeight::Bold } else { FontWeight::Normal },
                    },
                    background: BackgroundSettings {
                        color: bg.0,
                        opacity: bg.1,
                        padding: bg.2,
                        border_radius: bg.3,
                    },
                    display_items,
                    custom_layout,
                }
            })
    }

    fn arb_frame() -> impl Strategy<Value = FrameSettings> {
        (
            any::<bool>(),
            (0usize..FrameStyle::ALL.len()).prop_map(|i| FrameStyle::ALL[i]),
            "#[0-9A-F]{6}",
            0.0f32..200.0,
            0.0f32..1.0,
            proptest::option::of(0.0f32..50.0),
            proptest::option::of(0.0f32..50.0),
            proptest::option::of((-30.0f32..30.0, -30.0f32..30.0)),
        )
            .prop_map(
                |(enabled, style, color, width, opacity, corner_radius, shadow_blur, offset)| {
                    FrameSettings {
                        enabled,
                        style,
                        color,
                        width,
                        opacity,
                        custom_properties: FrameCustomProperties {
                            corner_radius,
                            shadow_blur,
                            shadow_offset: offset.map(|(x, y)| ShadowOffset { x, y }),
                        },
                    }
                },
            )
    }

    proptest! {
        #[test]
        fn prop_overlay_round_trips_through_wire_json(overlay in arb_overlay()) {
            let wire = WireOverlaySettings::from(&overlay);
            let json = serde_json::to_string(&wire).unwrap();
            let parsed: WireOverlaySettings = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(OverlaySettings::from(parsed), overlay);
        }

        #[test]
        fn prop_frame_round_trips_through_wire_json(frame in arb_frame()) {
            let wire = WireFrameSettings::from(&frame);
            let json = serde_json::to_string(&wire).unwrap();
            let parsed: WireFrameSettings = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(FrameSettings::from(parsed), frame);
        }

        #[test]
        fn prop_exif_round_trips(
            make in proptest::option::of("[A-Za-z]{1,10}"),
            f_number in proptest::option::of(0.7f64..64.0),
            iso in proptest::option::of(50u32..102400),
            gps in proptest::option::of((-90.0f64..90.0, -180.0f64..180.0, proptest::option::of(-100.0f64..9000.0))),
        ) {
            let exif = ExifData {
                make,
                f_number,
                iso,
                gps: gps.map(|(latitude, longitude, altitude)| GpsCoordinates { latitude, longitude, altitude }),
                ..ExifData::default()
            };
            prop_assert_eq!(ExifData::from(WireExif::from(&exif)), exif);
        }
    }
}
