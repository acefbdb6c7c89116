//! World-viewport mapping and pointer-driven pan/zoom.
//!
//! The transform keeps the world coordinate at the viewport centre
//! (`origin`), a zoom scalar measured in world units across the
//! viewport width, and the last known viewport size in physical
//! pixels. Screen positions are exchanged as UV fractions in [0,1]²
//! with `y` up, matching the synthesized shader's vertex UV.
//!
//! Pan and zoom are suppressed while GUI widgets hold the pointer or
//! keyboard, and for one extra frame after they let go, so releasing a
//! text field never doubles as a canvas click.

/// Per-frame pointer snapshot handed in by the GUI host.
#[derive(Clone, Copy, Debug, Default)]
pub struct PointerState {
    /// Canvas-relative UV, `y` up; `None` when the pointer is elsewhere.
    pub uv: Option<(f64, f64)>,
    /// Primary button held with the press originating on the canvas.
    pub primary_down: bool,
    /// Wheel movement in notches; positive zooms out.
    pub wheel_steps: f64,
    /// A GUI widget is active, focused or hovered this frame.
    pub gui_active: bool,
}

#[derive(Clone, Copy, Debug)]
struct DragAnchor {
    uv: (f64, f64),
    origin: (f64, f64),
}

#[derive(Clone, Copy, Debug)]
pub struct ViewTransform {
    /// World coordinate at the viewport centre.
    origin: (f64, f64),
    /// World units spanned by the viewport width.
    zoom: f64,
    viewport_px: (u32, u32),
    drag: Option<DragAnchor>,
    gui_active_last_frame: bool,
}

impl ViewTransform {
    pub fn new() -> Self {
        Self {
            origin: (0.0, 0.0),
            zoom: 5.0,
            viewport_px: (1, 1),
            drag: None,
            gui_active_last_frame: false,
        }
    }

    pub fn set_viewport(&mut self, width_px: u32, height_px: u32) {
        self.viewport_px = (width_px.max(1), height_px.max(1));
    }

    pub fn origin(&self) -> (f64, f64) {
        self.origin
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport_px
    }

    /// World units spanned by the viewport, aspect-corrected.
    pub fn view_size(&self) -> (f64, f64) {
        let (width, height) = self.viewport_px;
        (self.zoom, self.zoom * f64::from(height) / f64::from(width))
    }

    /// Bottom-left world corner; the `viewStart` uniform.
    pub fn view_start(&self) -> (f64, f64) {
        let size = self.view_size();
        (self.origin.0 - size.0 * 0.5, self.origin.1 - size.1 * 0.5)
    }

    /// World units spanned by one pixel; the base "near" tolerance.
    pub fn epsilon(&self) -> f64 {
        self.zoom / f64::from(self.viewport_px.0)
    }

    /// World coordinate under the given canvas UV.
    pub fn world_at(&self, uv: (f64, f64)) -> (f64, f64) {
        let size = self.view_size();
        (
            self.origin.0 + (uv.0 - 0.5) * size.0,
            self.origin.1 + (uv.1 - 0.5) * size.1,
        )
    }

    /// Applies one frame of pointer input.
    pub fn update(&mut self, input: &PointerState) {
        let blocked = input.gui_active || self.gui_active_last_frame;
        self.gui_active_last_frame = input.gui_active;
        if blocked {
            self.drag = None;
            return;
        }

        let Some(uv) = input.uv else {
            self.drag = None;
            return;
        };

        if input.wheel_steps != 0.0 {
            let anchor_world = self.world_at(uv);
            // Guard against a giant wheel delta collapsing the zoom
            // through zero.
            let factor = (1.0 + input.wheel_steps * 0.1).max(0.1);
            self.zoom *= factor;
            let size = self.view_size();
            self.origin = (
                anchor_world.0 - (uv.0 - 0.5) * size.0,
                anchor_world.1 - (uv.1 - 0.5) * size.1,
            );
        }

        if input.primary_down {
            match self.drag {
                None => {
                    self.drag = Some(DragAnchor {
                        uv,
                        origin: self.origin,
                    });
                }
                Some(anchor) => {
                    let size = self.view_size();
                    self.origin = (
                        anchor.origin.0 + (anchor.uv.0 - uv.0) * size.0,
                        anchor.origin.1 + (anchor.uv.1 - uv.1) * size.1,
                    );
                }
            }
        } else {
            self.drag = None;
        }
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform() -> ViewTransform {
        let mut view = ViewTransform::new();
        view.set_viewport(1000, 500);
        view
    }

    fn drag(view: &mut ViewTransform, uv: (f64, f64)) {
        view.update(&PointerState {
            uv: Some(uv),
            primary_down: true,
            ..Default::default()
        });
    }

    fn release(view: &mut ViewTransform) {
        view.update(&PointerState {
            uv: Some((0.5, 0.5)),
            ..Default::default()
        });
    }

    #[test]
    fn view_size_is_aspect_corrected() {
        let view = transform();
        assert_eq!(view.view_size(), (5.0, 2.5));
        assert_eq!(view.view_start(), (-2.5, -1.25));
        assert_eq!(view.epsilon(), 5.0 / 1000.0);
    }

    #[test]
    fn pan_follows_the_pointer() {
        let mut view = transform();
        drag(&mut view, (0.5, 0.5));
        drag(&mut view, (0.7, 0.5));
        // Pointer moved right, world slides left under it.
        assert!((view.origin().0 - (-1.0)).abs() < 1e-12);
        assert_eq!(view.origin().1, 0.0);
    }

    #[test]
    fn pan_round_trip_restores_origin() {
        let mut view = transform();
        let before = view.origin();
        drag(&mut view, (0.2, 0.3));
        drag(&mut view, (0.8, 0.9));
        drag(&mut view, (0.2, 0.3));
        release(&mut view);
        let after = view.origin();
        assert!((after.0 - before.0).abs() < 1e-12);
        assert!((after.1 - before.1).abs() < 1e-12);
    }

    #[test]
    fn separate_drags_use_fresh_anchors() {
        let mut view = transform();
        drag(&mut view, (0.5, 0.5));
        drag(&mut view, (0.6, 0.5));
        release(&mut view);
        let between = view.origin();
        drag(&mut view, (0.5, 0.5));
        drag(&mut view, (0.5, 0.5));
        // A new press with no motion must not jump back.
        assert_eq!(view.origin(), between);
    }

    #[test]
    fn zoom_preserves_the_anchor_point() {
        let mut view = transform();
        let uv = (0.25, 0.75);
        let before = view.world_at(uv);
        view.update(&PointerState {
            uv: Some(uv),
            wheel_steps: -3.0,
            ..Default::default()
        });
        let after = view.world_at(uv);
        assert!(view.zoom() < 5.0);
        assert!((after.0 - before.0).abs() < 1e-9);
        assert!((after.1 - before.1).abs() < 1e-9);
    }

    #[test]
    fn zoom_factor_never_collapses_through_zero() {
        let mut view = transform();
        view.update(&PointerState {
            uv: Some((0.5, 0.5)),
            wheel_steps: -1000.0,
            ..Default::default()
        });
        assert!(view.zoom() > 0.0);
    }

    #[test]
    fn gui_activity_suppresses_input_for_an_extra_frame() {
        let mut view = transform();
        let origin = view.origin();
        view.update(&PointerState {
            uv: Some((0.5, 0.5)),
            primary_down: true,
            gui_active: true,
            ..Default::default()
        });
        // The frame right after a widget releases is still blocked.
        drag(&mut view, (0.1, 0.1));
        assert_eq!(view.origin(), origin);
        // The frame after that pans again.
        drag(&mut view, (0.3, 0.3));
        drag(&mut view, (0.4, 0.4));
        assert_ne!(view.origin(), origin);
    }

    #[test]
    fn epsilon_tracks_viewport_resizes() {
        let mut view = transform();
        view.set_viewport(2000, 500);
        assert_eq!(view.epsilon(), 5.0 / 2000.0);
    }
}
