use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

use crate::analysis::NodeCategory;
use crate::util::stable_hash;

/// Fixed palette: one colour per well-known extension, grey for libraries.
const TS_COLOR: Color32 = Color32::from_rgb(255, 152, 0);
const JS_COLOR: Color32 = Color32::from_rgb(66, 133, 244);
const TSX_COLOR: Color32 = Color32::from_rgb(236, 64, 122);
const JSX_COLOR: Color32 = Color32::from_rgb(38, 166, 154);
const LIBRARY_COLOR: Color32 = Color32::from_rgb(158, 158, 158);

/// Fallback cycle for extensions outside the fixed palette.
const EXTRA_COLORS: [Color32; 6] = [
    Color32::from_rgb(171, 71, 188),
    Color32::from_rgb(255, 112, 67),
    Color32::from_rgb(124, 179, 66),
    Color32::from_rgb(38, 198, 218),
    Color32::from_rgb(255, 213, 79),
    Color32::from_rgb(141, 110, 99),
];

pub fn category_color(category: &NodeCategory) -> Color32 {
    match category {
        NodeCategory::Library(_) => LIBRARY_COLOR,
        NodeCategory::File(ext) => match ext.as_str() {
            ".ts" => TS_COLOR,
            ".js" => JS_COLOR,
            ".tsx" => TSX_COLOR,
            ".jsx" => JSX_COLOR,
            other => EXTRA_COLORS[(stable_hash(other) % EXTRA_COLORS.len() as u64) as usize],
        },
    }
}

pub fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

/// Adds an emissive term on top of a base colour, saturating per channel.
pub fn add_emissive(base: Color32, emissive: Color32) -> Color32 {
    Color32::from_rgba_unmultiplied(
        base.r().saturating_add(emissive.r()),
        base.g().saturating_add(emissive.g()),
        base.b().saturating_add(emissive.b()),
        base.a(),
    )
}

pub fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0) as u8;
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

pub fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + pan;

    let mut x = origin.x.rem_euclid(step);
    while x < rect.right() {
        painter.line_segment(
            [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        x += step;
    }

    let mut y = origin.y.rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment(
            [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        y += step;
    }
}

pub fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

/// Phong-ish sphere impression from flat primitives: lit core, specular
/// dot offset toward the light, darker rim.
pub fn draw_sphere(painter: &Painter, center: Pos2, radius: f32, color: Color32) {
    painter.circle_filled(center, radius, color);

    let highlight_offset = Vec2::new(-radius * 0.35, -radius * 0.35);
    painter.circle_filled(
        center + highlight_offset,
        radius * 0.4,
        Color32::from_rgba_unmultiplied(255, 255, 255, 48),
    );

    painter.circle_stroke(
        center,
        radius,
        Stroke::new(1.0, Color32::from_rgba_unmultiplied(10, 10, 10, 180)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions_use_fixed_colors() {
        assert_eq!(
            category_color(&NodeCategory::File(".ts".to_owned())),
            TS_COLOR
        );
        assert_eq!(
            category_color(&NodeCategory::File(".js".to_owned())),
            JS_COLOR
        );
        assert_eq!(
            category_color(&NodeCategory::File(".tsx".to_owned())),
            TSX_COLOR
        );
        assert_eq!(
            category_color(&NodeCategory::File(".jsx".to_owned())),
            JSX_COLOR
        );
        assert_eq!(
            category_color(&NodeCategory::Library("lodash".to_owned())),
            LIBRARY_COLOR
        );
    }

    #[test]
    fn unknown_extensions_get_a_stable_fallback() {
        let first = category_color(&NodeCategory::File(".rs".to_owned()));
        let second = category_color(&NodeCategory::File(".rs".to_owned()));
        assert_eq!(first, second);
    }

    #[test]
    fn emissive_addition_saturates() {
        let lit = add_emissive(Color32::from_rgb(250, 10, 10), Color32::from_rgb(20, 20, 20));
        assert_eq!(lit.r(), 255);
        assert_eq!(lit.g(), 30);
    }
}
