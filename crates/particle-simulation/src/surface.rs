//! Drawing surface the engine renders into
//!
//! The interface mirrors a 2D canvas context: immediate fills and strokes
//! plus a sticky shadow (glow) setting applied to subsequent fills.

use glam::Vec2;
use particle_physics::{Bounds, Rgba};

pub trait DrawSurface {
    /// Pixel dimensions of the surface
    fn size(&self) -> Bounds;

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Rgba);

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba);

    /// Filled circle, glowing with the current shadow setting
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba);

    /// Set the glow applied to later fills; a blur of `0.0` disables it
    fn set_shadow(&mut self, blur: f32, color: Rgba);
}

/// Shadow setting active when a shape was drawn
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shadow {
    pub blur: f32,
    pub color: Rgba,
}

impl Shadow {
    pub const NONE: Shadow = Shadow {
        blur: 0.0,
        color: Rgba::TRANSPARENT,
    };
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    FillRect {
        origin: Vec2,
        size: Vec2,
        color: Rgba,
    },
    StrokeLine {
        from: Vec2,
        to: Vec2,
        width: f32,
        color: Rgba,
    },
    FillCircle {
        center: Vec2,
        radius: f32,
        color: Rgba,
        shadow: Shadow,
    },
}

/// Surface that records every draw call instead of rasterizing it
#[derive(Clone, Debug)]
pub struct RecordingSurface {
    bounds: Bounds,
    shadow: Shadow,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            shadow: Shadow::NONE,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Shadow setting that the next fill would use
    pub fn shadow(&self) -> Shadow {
        self.shadow
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn resize(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    pub fn line_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::StrokeLine { .. }))
            .count()
    }

    pub fn circle_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::FillCircle { .. }))
            .count()
    }
}

impl DrawSurface for RecordingSurface {
    fn size(&self) -> Bounds {
        self.bounds
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Rgba) {
        self.commands
            .push(DrawCommand::FillRect { origin, size, color });
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba) {
        self.commands.push(DrawCommand::StrokeLine {
            from,
            to,
            width,
            color,
        });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.commands.push(DrawCommand::FillCircle {
            center,
            radius,
            color,
            shadow: self.shadow,
        });
    }

    fn set_shadow(&mut self, blur: f32, color: Rgba) {
        self.shadow = Shadow { blur, color };
    }
}
