//! Mutable solidity field that agents query and carve.

use tikmings_core::{TerrainRect, TerrainView};

/// Packed bitset recording which pixels of the level are solid.
///
/// Every query outside `[0, width) × [0, height)` reports open space and every
/// mutation is clipped to the field, so callers never need to bounds-check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerrainField {
    width: u32,
    height: u32,
    words: Vec<u64>,
}

impl TerrainField {
    /// Creates an empty field with the provided dimensions.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let capacity = TerrainView::words_per_row(width).saturating_mul(height as usize);
        Self {
            width,
            height,
            words: vec![0; capacity],
        }
    }

    /// Builds a field from typed level geometry.
    ///
    /// Solid materials are rasterised into the bitset. Hazard rectangles are
    /// returned separately in declaration order and leave the bitset untouched.
    #[must_use]
    pub fn load_geometry(width: u32, height: u32, rects: &[TerrainRect]) -> (Self, Vec<TerrainRect>) {
        let mut field = Self::new(width, height);
        let mut hazards = Vec::new();
        for rect in rects {
            if rect.kind.is_hazard() {
                hazards.push(*rect);
            } else {
                field.add_rect(rect.x, rect.y, rect.width, rect.height);
            }
        }
        (field, hazards)
    }

    /// Width of the field in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the field in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether the pixel at `(x, y)` is solid.
    #[must_use]
    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        self.view().is_solid(x, y)
    }

    /// Reports whether the pixel containing the continuous point is solid.
    #[must_use]
    pub fn solid_at(&self, x: f32, y: f32) -> bool {
        self.is_solid(pixel(x), pixel(y))
    }

    /// Reports whether any pixel in column `x` between rows `top` and
    /// `bottom` (both inclusive, in either order) is solid.
    #[must_use]
    pub fn column_has_solid(&self, x: f32, top: f32, bottom: f32) -> bool {
        let column = pixel(x);
        let (first, last) = ordered(pixel(top), pixel(bottom));
        (first..=last).any(|row| self.is_solid(column, row))
    }

    /// Reports whether any pixel in row `y` between columns `from` and `to`
    /// (both inclusive, in either order) is solid.
    #[must_use]
    pub fn row_has_solid(&self, y: f32, from: f32, to: f32) -> bool {
        let row = pixel(y);
        let (first, last) = ordered(pixel(from), pixel(to));
        (first..=last).any(|column| self.is_solid(column, row))
    }

    /// Clears every pixel within Euclidean distance `radius` of `(cx, cy)`.
    ///
    /// Repeating the call with the same arguments leaves the field unchanged.
    pub fn remove_circle(&mut self, cx: f32, cy: f32, radius: f32) {
        if !(radius >= 0.0) {
            return;
        }
        let Some((left, right)) = clip_span(cx - radius, cx + radius, self.width) else {
            return;
        };
        let Some((top, bottom)) = clip_span(cy - radius, cy + radius, self.height) else {
            return;
        };

        let limit = radius * radius;
        for y in top..=bottom {
            let dy = y as f32 - cy;
            for x in left..=right {
                let dx = x as f32 - cx;
                if dx * dx + dy * dy <= limit {
                    self.set(x as i32, y as i32, false);
                }
            }
        }
    }

    /// Marks the axis-aligned rectangle solid, clipped to the field.
    pub fn add_rect(&mut self, x: i32, y: i32, width: u32, height: u32) {
        let left = i64::from(x).max(0);
        let top = i64::from(y).max(0);
        let right = (i64::from(x) + i64::from(width)).min(i64::from(self.width));
        let bottom = (i64::from(y) + i64::from(height)).min(i64::from(self.height));

        for row in top..bottom {
            for column in left..right {
                self.set(column as i32, row as i32, true);
            }
        }
    }

    /// Captures a read-only view of the bitset.
    #[must_use]
    pub fn view(&self) -> TerrainView<'_> {
        TerrainView::new(&self.words, self.width, self.height)
    }

    /// Number of solid pixels in the field.
    #[must_use]
    pub fn solid_count(&self) -> u64 {
        self.view().solid_count()
    }

    fn set(&mut self, x: i32, y: i32, solid: bool) {
        let Some((index, mask)) = TerrainView::locate(self.width, self.height, x, y) else {
            return;
        };
        if let Some(word) = self.words.get_mut(index) {
            if solid {
                *word |= mask;
            } else {
                *word &= !mask;
            }
        }
    }
}

/// Converts a continuous coordinate into the pixel that contains it.
pub(crate) fn pixel(value: f32) -> i32 {
    value.floor() as i32
}

fn ordered(a: i32, b: i32) -> (i32, i32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Integer span `[ceil(low), floor(high)]` clipped to `[0, limit)`.
fn clip_span(low: f32, high: f32, limit: u32) -> Option<(u32, u32)> {
    if limit == 0 {
        return None;
    }
    let first = low.ceil().max(0.0);
    let last = high.floor().min((limit - 1) as f32);
    if first > last {
        return None;
    }
    Some((first as u32, last as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tikmings_core::TerrainKind;

    fn solid_block(width: u32, height: u32) -> TerrainField {
        let mut field = TerrainField::new(width, height);
        field.add_rect(0, 0, width, height);
        field
    }

    #[test]
    fn queries_outside_the_field_are_open() {
        let field = solid_block(80, 40);
        for (x, y) in [(-1, 0), (0, -1), (80, 0), (0, 40), (i32::MAX, 5), (-500, -500)] {
            assert!(!field.is_solid(x, y), "({x}, {y}) must not be solid");
        }
        assert!(field.is_solid(79, 39));
    }

    #[test]
    fn remove_circle_clears_the_whole_disc() {
        let mut field = solid_block(100, 100);
        field.remove_circle(50.0, 40.0, 12.0);

        for y in 20..=60 {
            for x in 30..=70 {
                let dx = x as f32 - 50.0;
                let dy = y as f32 - 40.0;
                if (dx * dx + dy * dy).sqrt() <= 12.0 {
                    assert!(!field.is_solid(x, y), "({x}, {y}) survived the carve");
                }
            }
        }
        assert!(field.is_solid(50, 53));
        assert!(field.is_solid(37, 40));
    }

    #[test]
    fn remove_circle_is_idempotent() {
        let mut field = solid_block(64, 64);
        field.remove_circle(20.5, 30.25, 9.0);
        let once = field.clone();
        field.remove_circle(20.5, 30.25, 9.0);

        assert_eq!(field, once);
        assert!(field.solid_count() < 64 * 64);
    }

    #[test]
    fn mutations_clip_to_the_field() {
        let mut field = solid_block(30, 30);
        field.remove_circle(0.0, 0.0, 5.0);
        field.remove_circle(-100.0, -100.0, 5.0);
        assert!(!field.is_solid(0, 0));
        assert!(field.is_solid(29, 29));

        let mut empty = TerrainField::new(30, 30);
        empty.add_rect(-5, 25, 10, 100);
        assert_eq!(empty.solid_count(), 5 * 5);
        assert!(empty.is_solid(4, 29));
        assert!(!empty.is_solid(5, 29));
    }

    #[test]
    fn negative_radius_leaves_field_intact() {
        let mut field = solid_block(10, 10);
        field.remove_circle(5.0, 5.0, -1.0);
        field.remove_circle(5.0, 5.0, f32::NAN);
        assert_eq!(field.solid_count(), 100);
    }

    #[test]
    fn geometry_splits_solids_from_hazards() {
        let rects = [
            TerrainRect::new(0, 90, 100, 10, TerrainKind::Floor),
            TerrainRect::new(10, 50, 20, 5, TerrainKind::Platform),
            TerrainRect::new(40, 60, 10, 10, TerrainKind::Earth),
            TerrainRect::new(60, 80, 20, 10, TerrainKind::Water),
            TerrainRect::new(0, 0, 5, 5, TerrainKind::Pit),
            TerrainRect::new(5, 0, 5, 5, TerrainKind::PitEmpty),
        ];
        let (field, hazards) = TerrainField::load_geometry(100, 100, &rects);

        assert_eq!(field.solid_count(), 1000 + 100 + 100);
        assert_eq!(hazards, rects[3..].to_vec());
        assert!(!field.is_solid(65, 85), "water does not become solid");
    }

    #[test]
    fn probes_scan_inclusive_spans_in_either_order() {
        let mut field = TerrainField::new(40, 40);
        field.add_rect(10, 20, 1, 1);

        assert!(field.column_has_solid(10.7, 25.0, 20.0));
        assert!(!field.column_has_solid(10.7, 21.0, 30.0));
        assert!(field.row_has_solid(20.2, 0.0, 10.0));
        assert!(!field.row_has_solid(20.2, 11.0, 39.0));
        assert!(field.solid_at(10.99, 20.5));
    }
}
