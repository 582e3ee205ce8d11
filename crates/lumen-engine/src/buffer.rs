//! Double-buffered hand-off grid between the lighting pass and a renderer.

use lumen_light::LightCell;
use lumen_world::Rect2;

/// The renderer-facing light grid. The engine swaps a finished frame in
/// under the owning mutex; the renderer reads cells and drains the dirty
/// region at its own pace.
#[derive(Clone, Debug)]
pub struct RenderBuffer {
    pub w: i32,
    pub h: i32,
    pub cells: Vec<LightCell>,
    dirty: Option<Rect2>,
}

impl RenderBuffer {
    pub fn new(w: i32, h: i32) -> Self {
        Self {
            w,
            h,
            cells: vec![LightCell::BRIGHT; (w.max(0) * h.max(0)) as usize],
            dirty: None,
        }
    }

    #[inline]
    pub fn idx(&self, x: i32, y: i32) -> usize {
        (x * self.h + y) as usize
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> LightCell {
        self.cells[self.idx(x, y)]
    }

    pub fn resize(&mut self, w: i32, h: i32) {
        self.w = w;
        self.h = h;
        self.cells = vec![LightCell::BRIGHT; (w.max(0) * h.max(0)) as usize];
        self.invalidate_all();
    }

    pub fn invalidate_all(&mut self) {
        self.dirty = Some(Rect2::from_extent(0, 0, self.w, self.h));
    }

    /// Widens the dirty region to cover `rect`.
    pub fn invalidate_rect(&mut self, rect: Rect2) {
        if rect.is_empty() {
            return;
        }
        self.dirty = Some(match self.dirty {
            None => rect,
            Some(d) => Rect2::new(
                lumen_world::Coord2::new(d.min.x.min(rect.min.x), d.min.y.min(rect.min.y)),
                lumen_world::Coord2::new(d.max.x.max(rect.max.x), d.max.y.max(rect.max.y)),
            ),
        });
    }

    /// Hands the accumulated dirty region to the renderer and resets it.
    pub fn take_dirty(&mut self) -> Option<Rect2> {
        self.dirty.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dirty_region_unions_and_drains() {
        let mut buf = RenderBuffer::new(10, 10);
        assert!(buf.take_dirty().is_none());
        buf.invalidate_rect(Rect2::from_extent(1, 1, 2, 2));
        buf.invalidate_rect(Rect2::from_extent(5, 5, 2, 2));
        let d = buf.take_dirty().unwrap();
        assert!(d.contains(1, 1));
        assert!(d.contains(6, 6));
        assert!(buf.take_dirty().is_none());
    }

    #[test]
    fn resize_marks_everything_dirty() {
        let mut buf = RenderBuffer::new(4, 4);
        buf.resize(8, 8);
        assert_eq!(buf.cells.len(), 64);
        assert_eq!(buf.take_dirty(), Some(Rect2::from_extent(0, 0, 8, 8)));
    }
}
