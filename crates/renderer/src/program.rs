//! GL program lifetime management.
//!
//! `ProgramManager` owns at most one active [`CompiledProgram`] at a
//! time. Compilation and linking of a replacement can fail without
//! disturbing the active program; the swap in `replace_active` releases
//! the superseded program's GPU objects only once the replacement is
//! confirmed valid, so a frame never observes zero usable programs and
//! superseded programs never leak.

use std::fmt;

use glow::HasContext;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("failed to allocate GPU object: {0}")]
    Allocate(String),

    #[error("{stage} shader compilation failed:\n{log}")]
    Compile { stage: ShaderStage, log: String },

    #[error("program link failed:\n{log}")]
    Link { log: String },
}

/// A linked program plus the vertex-array object it draws with.
pub struct CompiledProgram {
    program: glow::Program,
    vertex_array: glow::VertexArray,
    fragment_source: String,
    generation: u64,
}

impl CompiledProgram {
    pub fn program(&self) -> glow::Program {
        self.program
    }

    /// The synthesized source this program was built from, kept for
    /// diagnostics and dump-to-file support.
    pub fn fragment_source(&self) -> &str {
        &self.fragment_source
    }

    /// Monotonic counter distinguishing relinks of the same uniforms.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn bind(&self, gl: &glow::Context) {
        unsafe {
            gl.use_program(Some(self.program));
        }
    }

    /// Draws the full-screen triangle. The program must be bound and
    /// uniforms pushed first.
    pub fn draw(&self, gl: &glow::Context) {
        unsafe {
            gl.bind_vertex_array(Some(self.vertex_array));
            gl.draw_arrays(glow::TRIANGLES, 0, 3);
            gl.bind_vertex_array(None);
        }
    }

    fn release(self, gl: &glow::Context) {
        unsafe {
            gl.delete_program(self.program);
            gl.delete_vertex_array(self.vertex_array);
        }
    }
}

#[derive(Default)]
pub struct ProgramManager {
    active: Option<CompiledProgram>,
    next_generation: u64,
}

impl ProgramManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&CompiledProgram> {
        self.active.as_ref()
    }

    /// Compiles both stages and links them. Failure leaves the active
    /// program untouched and surfaces the driver's diagnostic text.
    pub fn compile_and_link(
        &mut self,
        gl: &glow::Context,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<CompiledProgram, ProgramError> {
        let program = unsafe { gl.create_program() }.map_err(ProgramError::Allocate)?;

        let vertex = match compile_shader(gl, ShaderStage::Vertex, vertex_source) {
            Ok(shader) => shader,
            Err(err) => {
                unsafe { gl.delete_program(program) };
                return Err(err);
            }
        };
        let fragment = match compile_shader(gl, ShaderStage::Fragment, fragment_source) {
            Ok(shader) => shader,
            Err(err) => {
                unsafe {
                    gl.delete_shader(vertex);
                    gl.delete_program(program);
                }
                return Err(err);
            }
        };

        unsafe {
            gl.attach_shader(program, vertex);
            gl.attach_shader(program, fragment);
            gl.link_program(program);
            let linked = gl.get_program_link_status(program);
            gl.detach_shader(program, vertex);
            gl.detach_shader(program, fragment);
            gl.delete_shader(vertex);
            gl.delete_shader(fragment);
            if !linked {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(ProgramError::Link { log });
            }
        }

        // Vertex positions live in the shader; the VAO carries no buffers.
        let vertex_array = match unsafe { gl.create_vertex_array() } {
            Ok(vao) => vao,
            Err(log) => {
                unsafe { gl.delete_program(program) };
                return Err(ProgramError::Allocate(log));
            }
        };

        let generation = self.next_generation;
        self.next_generation += 1;

        Ok(CompiledProgram {
            program,
            vertex_array,
            fragment_source: fragment_source.to_string(),
            generation,
        })
    }

    /// Installs a freshly linked program, releasing the previous one.
    pub fn replace_active(&mut self, gl: &glow::Context, next: CompiledProgram) {
        tracing::debug!(
            generation = next.generation,
            "activating fragment program ({} bytes)",
            next.fragment_source.len()
        );
        if let Some(previous) = self.active.take() {
            previous.release(gl);
        }
        self.active = Some(next);
    }

    /// Releases all GPU objects; called once at shutdown.
    pub fn destroy(&mut self, gl: &glow::Context) {
        if let Some(active) = self.active.take() {
            active.release(gl);
        }
    }
}

fn compile_shader(
    gl: &glow::Context,
    stage: ShaderStage,
    source: &str,
) -> Result<glow::Shader, ProgramError> {
    let kind = match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    };
    unsafe {
        let shader = gl.create_shader(kind).map_err(ProgramError::Allocate)?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        if !gl.get_shader_compile_status(shader) {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            return Err(ProgramError::Compile { stage, log });
        }
        Ok(shader)
    }
}
