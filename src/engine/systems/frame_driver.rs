use std::time::{ Duration, Instant };

use crate::engine::config::CameraConfig;

/// What the render loop should do this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameAction {
    /// Texture loads are still in flight; try again next tick.
    Skip,
    /// Animation is stopped; nothing is drawn.
    Paused,
    Render {
        /// Time since the previous rendered tick, zero on the first one.
        elapsed: Duration,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zoom {
    In,
    Out,
}

/// Input and clock state between ticks: the animation toggle, held zoom
/// keys, the drag gesture and the orbit radius.
#[derive(Debug, Clone)]
pub struct FrameDriver {
    animating: bool,
    zoom_in: bool,
    zoom_out: bool,
    drag_from: Option<[f64; 2]>,
    angles: [f32; 2],
    radius: f32,
    min_radius: f32,
    max_radius: f32,
    zoom_step: f32,
    last_tick: Option<Instant>,
}

impl FrameDriver {
    pub fn new(camera: &CameraConfig) -> Self {
        Self {
            animating: true,
            zoom_in: false,
            zoom_out: false,
            drag_from: None,
            angles: [0.0, 0.0],
            radius: camera.radius.clamp(camera.min_radius, camera.max_radius),
            min_radius: camera.min_radius,
            max_radius: camera.max_radius,
            zoom_step: camera.zoom_step,
            last_tick: None,
        }
    }

    pub fn tick(&mut self, now: Instant, resources_ready: bool) -> FrameAction {
        if !resources_ready {
            return FrameAction::Skip;
        }
        if !self.animating {
            return FrameAction::Paused;
        }

        if self.zoom_in {
            self.radius = (self.radius - self.zoom_step).max(self.min_radius);
        } else if self.zoom_out {
            self.radius = (self.radius + self.zoom_step).min(self.max_radius);
        }

        let elapsed = match self.last_tick {
            Some(last) => now.saturating_duration_since(last),
            None => Duration::ZERO,
        };
        self.last_tick = Some(now);

        FrameAction::Render { elapsed }
    }

    /// Flips the animation clock. Resuming restarts elapsed time from zero.
    pub fn toggle_animation(&mut self) -> bool {
        self.animating = !self.animating;
        self.last_tick = None;
        log::debug!("animation {}", if self.animating { "resumed" } else { "paused" });
        self.animating
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    /// Marks a zoom key as held or released.
    pub fn set_zoom(&mut self, zoom: Zoom, held: bool) {
        match zoom {
            Zoom::In => {
                self.zoom_in = held;
            }
            Zoom::Out => {
                self.zoom_out = held;
            }
        }
    }

    pub fn begin_drag(&mut self, x: f64, y: f64) {
        self.drag_from = Some([x, y]);
    }

    /// Accumulates pointer motion into the total rotation angles, in
    /// degrees. Returns the new totals, or `None` when no drag is active.
    pub fn drag_to(&mut self, x: f64, y: f64) -> Option<[f32; 2]> {
        let [prev_x, prev_y] = self.drag_from?;
        self.drag_from = Some([x, y]);

        self.angles[0] -= (y - prev_y) as f32;
        self.angles[1] -= (x - prev_x) as f32;
        Some(self.angles)
    }

    pub fn end_drag(&mut self) {
        self.drag_from = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_from.is_some()
    }

    pub fn angles(&self) -> [f32; 2] {
        self.angles
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }
}
