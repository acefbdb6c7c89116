//! Renderer crate for graphpaper.
//!
//! The crate owns everything between a list of simplified curve ASTs
//! and colored pixels: synthesizing a fragment program from the curves,
//! compiling and swapping GL programs, and bridging CPU-side parameter
//! values to the uniforms of whichever program is currently active.
//! The per-frame flow driven by the GUI crate is:
//!
//! ```text
//!   curves ──▶ synthesize() ──▶ ProgramManager::compile_and_link()
//!                                      │ replace_active()
//!                                      ▼
//!   UniformStore::resolve_locations() ─▶ push_all() ─▶ CompiledProgram::draw()
//! ```
//!
//! Everything runs on the thread that owns the GL context; the resolve-
//! then-push ordering is what keeps uniform locations from going stale
//! across relinks, so callers must rebuild locations after every swap.

mod program;
mod synth;
mod uniforms;

pub use program::{CompiledProgram, ProgramError, ProgramManager, ShaderStage};
pub use synth::{grid_spacing, synthesize, CurvePlot, CurveSpec, SynthError, VERTEX_SHADER};
pub use uniforms::{UniformError, UniformStore, UniformType, UniformValue};
