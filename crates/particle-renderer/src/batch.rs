//! CPU-side recording of one frame's draw calls
//!
//! Draw calls are grouped into runs of the same primitive so the GPU pass can
//! replay them in submission order with one draw per run.

use crate::instance::{CircleInstance, LineVertex, RectInstance};
use glam::Vec2;
use particle_physics::{Bounds, Rgba};
use particle_simulation::{DrawSurface, Shadow};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchKind {
    Rects,
    Lines,
    Circles,
}

/// Contiguous run of one primitive kind
///
/// `start..end` indexes instances for rects and circles and vertices for lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Batch {
    pub kind: BatchKind,
    pub start: u32,
    pub end: u32,
}

pub struct FrameBatch {
    size: Bounds,
    shadow: Shadow,
    rects: Vec<RectInstance>,
    circles: Vec<CircleInstance>,
    line_vertices: Vec<LineVertex>,
    batches: Vec<Batch>,
}

impl FrameBatch {
    pub fn new(size: Bounds) -> Self {
        Self {
            size,
            shadow: Shadow::NONE,
            rects: Vec::new(),
            circles: Vec::new(),
            line_vertices: Vec::new(),
            batches: Vec::new(),
        }
    }

    /// Forget recorded draws; the shadow setting persists like a canvas context's
    pub fn clear(&mut self) {
        self.rects.clear();
        self.circles.clear();
        self.line_vertices.clear();
        self.batches.clear();
    }

    pub fn resize(&mut self, size: Bounds) {
        self.size = size;
    }

    pub fn rects(&self) -> &[RectInstance] {
        &self.rects
    }

    pub fn circles(&self) -> &[CircleInstance] {
        &self.circles
    }

    pub fn line_vertices(&self) -> &[LineVertex] {
        &self.line_vertices
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    fn extend(&mut self, kind: BatchKind, start: usize, end: usize) {
        let (start, end) = (start as u32, end as u32);
        if let Some(last) = self.batches.last_mut() {
            if last.kind == kind && last.end == start {
                last.end = end;
                return;
            }
        }
        self.batches.push(Batch { kind, start, end });
    }
}

impl DrawSurface for FrameBatch {
    fn size(&self) -> Bounds {
        self.size
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Rgba) {
        let start = self.rects.len();
        self.rects.push(RectInstance {
            origin: origin.to_array(),
            size: size.to_array(),
            color: color.to_linear(),
        });
        self.extend(BatchKind::Rects, start, self.rects.len());
    }

    /// Lines are rasterized one pixel wide whatever `width` is requested
    fn stroke_line(&mut self, from: Vec2, to: Vec2, _width: f32, color: Rgba) {
        let start = self.line_vertices.len();
        let color = color.to_linear();
        self.line_vertices.push(LineVertex {
            position: from.to_array(),
            color,
        });
        self.line_vertices.push(LineVertex {
            position: to.to_array(),
            color,
        });
        self.extend(BatchKind::Lines, start, self.line_vertices.len());
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        let start = self.circles.len();
        self.circles.push(CircleInstance {
            center: center.to_array(),
            radius,
            glow: self.shadow.blur.max(0.0),
            color: color.to_linear(),
            glow_color: self.shadow.color.to_linear(),
        });
        self.extend(BatchKind::Circles, start, self.circles.len());
    }

    fn set_shadow(&mut self, blur: f32, color: Rgba) {
        self.shadow = Shadow { blur, color };
    }
}
