//! Glue between the session state and the GPU: owns the program
//! manager and the uniform store, rebuilds the fragment program when
//! the equation set changes, and refreshes per-frame uniforms.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use renderer::{synthesize, CurveSpec, ProgramManager, UniformStore, UniformValue, VERTEX_SHADER};

use crate::view::ViewTransform;

pub struct RenderState {
    programs: ProgramManager,
    uniforms: UniformStore,
    graph_thickness: f32,
    dump_path: Option<PathBuf>,
}

impl RenderState {
    pub fn new(graph_thickness: f32, dump_path: Option<PathBuf>) -> Result<Self> {
        let mut uniforms = UniformStore::new();
        uniforms.declare("viewStart", UniformValue::Vec2([-2.5, -2.5]))?;
        uniforms.declare("viewSize", UniformValue::Vec2([5.0, 5.0]))?;
        uniforms.declare("EPSILON", UniformValue::Double(0.005))?;
        uniforms.declare("iResolution", UniformValue::Vec2([1.0, 1.0]))?;
        uniforms.declare("iTime", UniformValue::Float(0.0))?;
        uniforms.declare("iMouse", UniformValue::Vec2([0.0; 2]))?;
        Ok(Self {
            programs: ProgramManager::new(),
            uniforms,
            graph_thickness,
            dump_path,
        })
    }

    /// Synthesizes a fragment shader for `curves` and swaps it in. A
    /// compile or link failure is logged and the previous program keeps
    /// drawing; only synthesis and dump-file errors abort the frame.
    pub fn rebuild(&mut self, gl: &glow::Context, curves: &[CurveSpec]) -> Result<()> {
        let fragment = synthesize(curves, self.graph_thickness)?;
        tracing::debug!(curves = curves.len(), "synthesized fragment shader");
        tracing::trace!("{fragment}");
        if let Some(path) = &self.dump_path {
            fs::write(path, &fragment)
                .with_context(|| format!("writing shader dump to {}", path.display()))?;
        }

        match self.programs.compile_and_link(gl, VERTEX_SHADER, &fragment) {
            Ok(compiled) => {
                self.programs.replace_active(gl, compiled);
                if let Some(active) = self.programs.active() {
                    self.uniforms.resolve_locations(gl, active.program());
                }
            }
            Err(err) => {
                tracing::error!(%err, "fragment rebuild failed; keeping previous program");
            }
        }
        Ok(())
    }

    /// Pushes the current view into the uniform store; values reach the
    /// GPU on the next [`RenderState::draw`].
    pub fn update_view_uniforms(
        &mut self,
        view: &ViewTransform,
        time: f32,
        mouse: [f32; 2],
    ) -> Result<()> {
        let (sx, sy) = view.view_start();
        let (w, h) = view.view_size();
        let (px, py) = view.viewport();
        self.uniforms
            .set("viewStart", UniformValue::Vec2([sx as f32, sy as f32]))?;
        self.uniforms
            .set("viewSize", UniformValue::Vec2([w as f32, h as f32]))?;
        self.uniforms
            .set("EPSILON", UniformValue::Double(view.epsilon()))?;
        self.uniforms
            .set("iResolution", UniformValue::Vec2([px as f32, py as f32]))?;
        self.uniforms.set("iTime", UniformValue::Float(time))?;
        self.uniforms.set("iMouse", UniformValue::Vec2(mouse))?;
        Ok(())
    }

    /// Binds the active program, pushes every uniform, and draws the
    /// full-screen triangle. A frame before the first rebuild has no
    /// program and draws nothing.
    pub fn draw(&self, gl: &glow::Context) {
        if let Some(program) = self.programs.active() {
            program.bind(gl);
            self.uniforms.push_all(gl);
            program.draw(gl);
        }
    }

    pub fn destroy(&mut self, gl: &glow::Context) {
        self.programs.destroy(gl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declares_the_synthesizer_uniform_contract() {
        let state = RenderState::new(2.0, None).expect("render state");
        for name in ["viewStart", "viewSize", "iResolution", "iMouse"] {
            assert!(state.uniforms.vec2(name).is_ok(), "uniform {name} is not vec2");
        }
        assert!(state.uniforms.double("EPSILON").is_ok());
        assert!(state.uniforms.float("iTime").is_ok());
    }

    #[test]
    fn view_uniforms_track_the_transform() {
        let mut state = RenderState::new(2.0, None).expect("render state");
        let mut view = ViewTransform::new();
        view.set_viewport(800, 400);
        state
            .update_view_uniforms(&view, 1.25, [3.0, 4.0])
            .expect("uniform update");

        let size = state.uniforms.vec2("viewSize").expect("viewSize");
        assert_eq!(size, [5.0, 2.5]);
        let start = state.uniforms.vec2("viewStart").expect("viewStart");
        assert_eq!(start, [-2.5, -1.25]);
        let epsilon = state.uniforms.double("EPSILON").expect("EPSILON");
        assert!((epsilon - 5.0 / 800.0).abs() < 1e-12);
        assert_eq!(state.uniforms.float("iTime").expect("iTime"), 1.25);
        assert_eq!(state.uniforms.vec2("iMouse").expect("iMouse"), [3.0, 4.0]);
    }
}
