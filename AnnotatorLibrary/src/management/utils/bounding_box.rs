use serde::{Deserialize, Serialize};

/// Pixel-space box as drawn in the browser editor. `x_center`/`y_center`
/// are measured from the image origin, all fields in image pixels.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BoundingBox {
    pub class_id: u32,
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn meets_minimum_size(&self, min_box_size: u32) -> bool {
        self.width >= min_box_size as f64 && self.height >= min_box_size as f64
    }

    pub fn normalize(&self, image_width: u32, image_height: u32) -> NormalizedLabel {
        NormalizedLabel {
            class_id: self.class_id,
            x_center: self.x_center / image_width as f64,
            y_center: self.y_center / image_height as f64,
            width: self.width / image_width as f64,
            height: self.height / image_height as f64,
        }
    }
}

/// The same box with every coordinate divided by the matching image
/// dimension. Values are not clamped, a box reaching past the image edge
/// produces values outside [0, 1].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NormalizedLabel {
    pub class_id: u32,
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedLabel {
    pub fn denormalize(&self, image_width: u32, image_height: u32) -> BoundingBox {
        BoundingBox {
            class_id: self.class_id,
            x_center: self.x_center * image_width as f64,
            y_center: self.y_center * image_height as f64,
            width: self.width * image_width as f64,
            height: self.height * image_height as f64,
        }
    }

    pub fn in_unit_range(&self) -> bool {
        [self.x_center, self.y_center, self.width, self.height]
            .iter()
            .all(|value| (0.0..=1.0).contains(value))
    }

    pub fn to_label_line(&self) -> String {
        format!("{} {} {} {} {}", self.class_id, self.x_center, self.y_center, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_divides_by_image_dimensions() {
        let pixel_box = BoundingBox { class_id: 0, x_center: 100.0, y_center: 50.0, width: 40.0, height: 20.0 };
        let label = pixel_box.normalize(200, 100);
        assert_eq!(label, NormalizedLabel { class_id: 0, x_center: 0.5, y_center: 0.5, width: 0.2, height: 0.2 });
    }

    #[test]
    fn denormalization_reproduces_pixel_values_exactly() {
        let pixel_box = BoundingBox { class_id: 2, x_center: 100.0, y_center: 50.0, width: 40.0, height: 20.0 };
        let round_trip = pixel_box.normalize(200, 100).denormalize(200, 100);
        assert_eq!(round_trip, pixel_box);
    }

    #[test]
    fn box_at_threshold_is_retained() {
        let pixel_box = BoundingBox { class_id: 0, x_center: 10.0, y_center: 10.0, width: 5.0, height: 5.0 };
        assert!(pixel_box.meets_minimum_size(5));
    }

    #[test]
    fn box_below_threshold_is_degenerate() {
        let narrow = BoundingBox { class_id: 0, x_center: 10.0, y_center: 10.0, width: 4.0, height: 50.0 };
        let short = BoundingBox { class_id: 0, x_center: 10.0, y_center: 10.0, width: 50.0, height: 4.0 };
        assert!(!narrow.meets_minimum_size(5));
        assert!(!short.meets_minimum_size(5));
    }

    #[test]
    fn label_line_is_space_separated() {
        let label = NormalizedLabel { class_id: 3, x_center: 0.5, y_center: 0.5, width: 0.2, height: 0.2 };
        assert_eq!(label.to_label_line(), "3 0.5 0.5 0.2 0.2");
    }

    #[test]
    fn oversized_box_escapes_unit_range() {
        let pixel_box = BoundingBox { class_id: 0, x_center: 190.0, y_center: 50.0, width: 60.0, height: 20.0 };
        let label = pixel_box.normalize(200, 100);
        assert!(!label.in_unit_range());
    }
}
