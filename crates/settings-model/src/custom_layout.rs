//! Free-form overlay layout: one positioned element per display item.

use serde::{Deserialize, Serialize};

use crate::overlay::{clamp_font_size, DisplayItem, DisplayItems, FontSettings};

/// X coordinate of synthesized elements.
pub const STACK_ORIGIN_X: f32 = 10.0;
/// Y coordinate of the first synthesized element.
pub const STACK_ORIGIN_Y: f32 = 10.0;
/// Vertical distance between synthesized elements.
pub const STACK_SPACING: f32 = 25.0;

pub const GRID_SIZE_MIN: f32 = 10.0;
pub const GRID_SIZE_MAX: f32 = 50.0;
pub const GRID_SIZE_DEFAULT: f32 = 20.0;

/// Per-element layout used when `layoutMode = custom`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomLayout {
    pub elements: Vec<CustomLayoutElement>,

    /// Whether the editor shows the grid.
    #[serde(default)]
    pub grid_enabled: bool,

    /// Grid pitch in image pixels, clamped to `[10, 50]`.
    #[serde(default = "default_grid_size")]
    pub grid_size: f32,

    /// Round element positions to the grid when drawing.
    #[serde(default)]
    pub snap_to_grid: bool,
}

/// One independently positioned overlay field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomLayoutElement {
    /// Stable identifier; synthesized elements use the display item key.
    pub id: String,

    /// Which field this element draws.
    #[serde(rename = "type")]
    pub item: DisplayItem,

    /// Top-left corner of the field's text, in image pixels.
    pub position: ElementPosition,

    #[serde(default = "default_true")]
    pub visible: bool,

    pub style: ElementStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementPosition {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementStyle {
    pub font_size: f32,
    pub color: String,
}

fn default_grid_size() -> f32 {
    GRID_SIZE_DEFAULT
}

fn default_true() -> bool {
    true
}

impl CustomLayoutElement {
    fn stacked(item: DisplayItem, slot: usize, font: &FontSettings) -> Self {
        Self {
            id: item.key().to_string(),
            item,
            position: ElementPosition {
                x: STACK_ORIGIN_X,
                y: STACK_ORIGIN_Y + STACK_SPACING * slot as f32,
            },
            visible: true,
            style: ElementStyle {
                font_size: font.size,
                color: font.color.clone(),
            },
        }
    }
}

impl CustomLayout {
    /// Stack one element per enabled item at `x = 10`, `y = 10 + 25·i`,
    /// in field order.
    pub fn synthesize(items: &DisplayItems, font: &FontSettings) -> Self {
        let elements = items
            .enabled()
            .enumerate()
            .map(|(slot, item)| CustomLayoutElement::stacked(item, slot, font))
            .collect();

        Self {
            elements,
            grid_enabled: false,
            grid_size: GRID_SIZE_DEFAULT,
            snap_to_grid: false,
        }
    }

    /// Append elements for enabled items that have none yet. Existing
    /// elements keep their positions; new ones take the next stack slots.
    pub fn sync_with(&mut self, items: &DisplayItems, font: &FontSettings) {
        let missing: Vec<DisplayItem> = items
            .enabled()
            .filter(|item| self.element(*item).is_none())
            .collect();

        for item in missing {
            let slot = self.elements.len();
            self.elements
                .push(CustomLayoutElement::stacked(item, slot, font));
        }
    }

    /// The element drawing `item`, if any.
    pub fn element(&self, item: DisplayItem) -> Option<&CustomLayoutElement> {
        self.elements.iter().find(|el| el.item == item)
    }

    pub fn element_mut(&mut self, item: DisplayItem) -> Option<&mut CustomLayoutElement> {
        self.elements.iter_mut().find(|el| el.item == item)
    }

    /// Where `element` is drawn, after optional grid snapping.
    pub fn effective_position(&self, element: &CustomLayoutElement) -> ElementPosition {
        if !self.snap_to_grid {
            return element.position;
        }
        let grid = clamp_grid_size(self.grid_size);
        ElementPosition {
            x: snap_to_grid(element.position.x, grid),
            y: snap_to_grid(element.position.y, grid),
        }
    }

    pub(crate) fn normalize(&mut self) {
        self.grid_size = clamp_grid_size(self.grid_size);
        for element in &mut self.elements {
            element.style.font_size = clamp_font_size(element.style.font_size);
        }
    }
}

/// Round `value` to the nearest multiple of `grid`.
pub fn snap_to_grid(value: f32, grid: f32) -> f32 {
    if grid <= 0.0 {
        return value;
    }
    (value / grid).round() * grid
}

pub fn clamp_grid_size(size: f32) -> f32 {
    if size.is_nan() {
        return GRID_SIZE_DEFAULT;
    }
    size.clamp(GRID_SIZE_MIN, GRID_SIZE_MAX)
}
