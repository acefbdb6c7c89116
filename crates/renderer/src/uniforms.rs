//! Named-parameter bridge between CPU values and GL program uniforms.
//!
//! Types:
//!
//! - `UniformValue` / `UniformType` form a closed tagged union over the
//!   GL scalar and vector types the synthesized programs can declare.
//! - `UniformError` classifies the programmer-error conditions: double
//!   declaration, undeclared lookup, and typed-access mismatch.
//! - `UniformStore` maps unique names to a declared type, a cached
//!   location, and the current value.
//!
//! A cached location is only meaningful for the program it was resolved
//! against. `resolve_locations` must run after every relink and before
//! the next `push_all`, or pushes would silently hit stale slots.

use std::collections::BTreeMap;
use std::fmt;

use glow::HasContext;
use thiserror::Error;

/// The closed set of value types a uniform slot can hold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Double(f64),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniformType {
    Int,
    Float,
    Double,
    Vec2,
    Vec3,
    Vec4,
}

impl UniformValue {
    pub fn ty(&self) -> UniformType {
        match self {
            UniformValue::Int(_) => UniformType::Int,
            UniformValue::Float(_) => UniformType::Float,
            UniformValue::Double(_) => UniformType::Double,
            UniformValue::Vec2(_) => UniformType::Vec2,
            UniformValue::Vec3(_) => UniformType::Vec3,
            UniformValue::Vec4(_) => UniformType::Vec4,
        }
    }
}

impl fmt::Display for UniformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UniformType::Int => "int",
            UniformType::Float => "float",
            UniformType::Double => "double",
            UniformType::Vec2 => "vec2",
            UniformType::Vec3 => "vec3",
            UniformType::Vec4 => "vec4",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum UniformError {
    #[error("uniform `{0}` declared twice")]
    AlreadyDeclared(String),

    #[error("uniform `{0}` was never declared")]
    Undeclared(String),

    #[error("uniform `{name}` is declared {declared}, requested as {requested}")]
    TypeMismatch {
        name: String,
        declared: UniformType,
        requested: UniformType,
    },
}

struct Slot {
    value: UniformValue,
    /// Valid only for the program last passed to `resolve_locations`.
    location: Option<glow::UniformLocation>,
}

/// Heterogeneous table of named shader parameters.
///
/// Iteration order is the name order (`BTreeMap`), so pushes happen in
/// a deterministic sequence independent of declaration order.
#[derive(Default)]
pub struct UniformStore {
    slots: BTreeMap<String, Slot>,
}

impl UniformStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a parameter with its declared type and initial value.
    pub fn declare(&mut self, name: &str, initial: UniformValue) -> Result<(), UniformError> {
        if self.slots.contains_key(name) {
            return Err(UniformError::AlreadyDeclared(name.to_string()));
        }
        self.slots.insert(
            name.to_string(),
            Slot {
                value: initial,
                location: None,
            },
        );
        Ok(())
    }

    /// Updates a parameter; the value type must match the declared type.
    pub fn set(&mut self, name: &str, value: UniformValue) -> Result<(), UniformError> {
        let slot = self
            .slots
            .get_mut(name)
            .ok_or_else(|| UniformError::Undeclared(name.to_string()))?;
        if slot.value.ty() != value.ty() {
            return Err(UniformError::TypeMismatch {
                name: name.to_string(),
                declared: slot.value.ty(),
                requested: value.ty(),
            });
        }
        slot.value = value;
        Ok(())
    }

    /// Current value of a parameter, whatever its type.
    pub fn value(&self, name: &str) -> Result<UniformValue, UniformError> {
        self.slots
            .get(name)
            .map(|slot| slot.value)
            .ok_or_else(|| UniformError::Undeclared(name.to_string()))
    }

    pub fn float(&self, name: &str) -> Result<f32, UniformError> {
        match self.value(name)? {
            UniformValue::Float(v) => Ok(v),
            other => Err(self.mismatch(name, other, UniformType::Float)),
        }
    }

    pub fn int(&self, name: &str) -> Result<i32, UniformError> {
        match self.value(name)? {
            UniformValue::Int(v) => Ok(v),
            other => Err(self.mismatch(name, other, UniformType::Int)),
        }
    }

    pub fn double(&self, name: &str) -> Result<f64, UniformError> {
        match self.value(name)? {
            UniformValue::Double(v) => Ok(v),
            other => Err(self.mismatch(name, other, UniformType::Double)),
        }
    }

    pub fn vec2(&self, name: &str) -> Result<[f32; 2], UniformError> {
        match self.value(name)? {
            UniformValue::Vec2(v) => Ok(v),
            other => Err(self.mismatch(name, other, UniformType::Vec2)),
        }
    }

    pub fn vec3(&self, name: &str) -> Result<[f32; 3], UniformError> {
        match self.value(name)? {
            UniformValue::Vec3(v) => Ok(v),
            other => Err(self.mismatch(name, other, UniformType::Vec3)),
        }
    }

    pub fn vec4(&self, name: &str) -> Result<[f32; 4], UniformError> {
        match self.value(name)? {
            UniformValue::Vec4(v) => Ok(v),
            other => Err(self.mismatch(name, other, UniformType::Vec4)),
        }
    }

    fn mismatch(&self, name: &str, held: UniformValue, requested: UniformType) -> UniformError {
        UniformError::TypeMismatch {
            name: name.to_string(),
            declared: held.ty(),
            requested,
        }
    }

    /// Looks up every declared name in the given program. Names the
    /// program does not declare resolve to a no-op slot; synthesized
    /// programs legitimately omit uniforms they never read.
    pub fn resolve_locations(&mut self, gl: &glow::Context, program: glow::Program) {
        for (name, slot) in &mut self.slots {
            slot.location = unsafe { gl.get_uniform_location(program, name) };
        }
    }

    /// Transmits every resolved parameter to the bound program.
    ///
    /// `Double` values are transmitted as `f32`: the synthesized
    /// programs are float-typed throughout and `glow` exposes the
    /// GLES-compatible uniform surface only.
    pub fn push_all(&self, gl: &glow::Context) {
        for slot in self.slots.values() {
            let Some(location) = &slot.location else {
                continue;
            };
            unsafe {
                match slot.value {
                    UniformValue::Int(v) => gl.uniform_1_i32(Some(location), v),
                    UniformValue::Float(v) => gl.uniform_1_f32(Some(location), v),
                    UniformValue::Double(v) => gl.uniform_1_f32(Some(location), v as f32),
                    UniformValue::Vec2(v) => gl.uniform_2_f32(Some(location), v[0], v[1]),
                    UniformValue::Vec3(v) => gl.uniform_3_f32(Some(location), v[0], v[1], v[2]),
                    UniformValue::Vec4(v) => {
                        gl.uniform_4_f32(Some(location), v[0], v[1], v[2], v[3])
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> UniformStore {
        let mut store = UniformStore::new();
        store
            .declare("EPSILON", UniformValue::Float(0.01))
            .expect("declare");
        store
            .declare("viewStart", UniformValue::Vec2([-2.5, -2.5]))
            .expect("declare");
        store
    }

    #[test]
    fn declares_and_reads_back() {
        let store = store();
        assert_eq!(store.float("EPSILON"), Ok(0.01));
        assert_eq!(store.vec2("viewStart"), Ok([-2.5, -2.5]));
    }

    #[test]
    fn rejects_duplicate_declaration() {
        let mut store = store();
        assert_eq!(
            store.declare("EPSILON", UniformValue::Float(0.0)),
            Err(UniformError::AlreadyDeclared("EPSILON".into()))
        );
    }

    #[test]
    fn set_updates_matching_type() {
        let mut store = store();
        store
            .set("EPSILON", UniformValue::Float(0.25))
            .expect("set");
        assert_eq!(store.float("EPSILON"), Ok(0.25));
    }

    #[test]
    fn set_rejects_type_mismatch() {
        let mut store = store();
        assert_eq!(
            store.set("EPSILON", UniformValue::Int(1)),
            Err(UniformError::TypeMismatch {
                name: "EPSILON".into(),
                declared: UniformType::Float,
                requested: UniformType::Int,
            })
        );
        // The stored value is untouched after a rejected set.
        assert_eq!(store.float("EPSILON"), Ok(0.01));
    }

    #[test]
    fn typed_get_rejects_mismatch() {
        let store = store();
        assert_eq!(
            store.vec3("viewStart"),
            Err(UniformError::TypeMismatch {
                name: "viewStart".into(),
                declared: UniformType::Vec2,
                requested: UniformType::Vec3,
            })
        );
    }

    #[test]
    fn undeclared_names_error() {
        let mut store = store();
        assert_eq!(
            store.set("missing", UniformValue::Float(0.0)),
            Err(UniformError::Undeclared("missing".into()))
        );
        assert_eq!(
            store.value("missing"),
            Err(UniformError::Undeclared("missing".into()))
        );
    }
}
