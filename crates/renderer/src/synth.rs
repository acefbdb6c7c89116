//! Fragment-program synthesis.
//!
//! `synthesize` is a pure function from a list of curves plus a line
//! thickness to GLSL source: a fixed prologue (uniforms, world-position
//! mapping, adaptive grid and axes), one conditional block per curve in
//! list order, and a fixed epilogue. Later curves overwrite earlier
//! ones, so overlapping loci resolve to the last entry's color. The
//! output is byte-stable for identical inputs; nothing here touches the
//! GPU.

use thiserror::Error;

use symbolic::{differentiate, glsl_number, CodegenError, Expr};

/// How a curve is rendered.
pub enum CurvePlot {
    /// A relation `f(x, y) = 0`, carried as the difference expression.
    Implicit(Expr),
    /// An explicit `y = f(x)`, carried as `f`.
    Explicit(Expr),
}

/// One curve the synthesized program should draw.
pub struct CurveSpec {
    pub color: [f32; 3],
    pub plot: CurvePlot,
}

#[derive(Debug, Error)]
pub enum SynthError {
    /// The curve's AST references a variable its form does not allow.
    /// Callers must only pass validated, simplified ASTs, so this is a
    /// contract violation rather than a user-facing failure.
    #[error("curve {index}: {source}")]
    Codegen {
        index: usize,
        #[source]
        source: CodegenError,
    },
}

/// Fixed full-screen triangle; `v_uv` spans [0,1]² across the viewport.
pub const VERTEX_SHADER: &str = r"#version 330 core
out vec2 v_uv;

const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    vec2 pos = positions[gl_VertexID];
    v_uv = pos * 0.5 + vec2(0.5, 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

/// GLSL prologue shared by every synthesized program: uniform
/// declarations, screen-UV to world mapping, and the grid/axis shading.
///
/// The grid picks a power-of-two spacing whose on-screen size lands in
/// roughly [10, 40] px: double while too small, then halve while too
/// large, both loops bounded so degenerate zooms still terminate.
/// [`grid_spacing`] mirrors the loop CPU-side for the tests.
const PROLOGUE: &str = r"#version 330 core
in vec2 v_uv;
out vec4 fragColor;

uniform vec2 viewStart;
uniform vec2 viewSize;
uniform float EPSILON;
uniform vec2 iResolution;
uniform float iTime;
uniform vec2 iMouse;

void main() {
    float x = viewStart.x + v_uv.x * viewSize.x;
    float y = viewStart.y + v_uv.y * viewSize.y;

    float pixelsPerUnit = iResolution.x / viewSize.x;
    float spacing = 1.0;
    for (int i = 0; i < 64; ++i) {
        if (spacing * pixelsPerUnit >= 10.0) break;
        spacing *= 2.0;
    }
    for (int i = 0; i < 64; ++i) {
        if (spacing * pixelsPerUnit <= 40.0) break;
        spacing *= 0.5;
    }

    vec3 col = vec3(1.0);
    if (mod(x, spacing) < EPSILON || mod(y, spacing) < EPSILON) {
        col = vec3(0.85);
    }
    if (mod(x, spacing * 5.0) < EPSILON || mod(y, spacing * 5.0) < EPSILON) {
        col = vec3(0.65);
    }
    if (abs(x) < EPSILON * 1.5 || abs(y) < EPSILON * 1.5) {
        col = vec3(0.2);
    }
";

const EPILOGUE: &str = r"
    fragColor = vec4(col, 1.0);
}
";

/// Synthesizes the fragment program for the given curves.
///
/// Callers must pass simplified, variable-validated ASTs; the only
/// failure mode is a codegen precondition violation.
pub fn synthesize(curves: &[CurveSpec], graph_thickness: f32) -> Result<String, SynthError> {
    let mut source = String::with_capacity(PROLOGUE.len() + EPILOGUE.len() + curves.len() * 160);
    source.push_str(PROLOGUE);

    let thickness = float_literal(graph_thickness);
    for (index, curve) in curves.iter().enumerate() {
        let assign = color_assignment(curve.color);
        let block = match &curve.plot {
            CurvePlot::Implicit(difference) => {
                let value = difference
                    .to_glsl(&["x", "y"])
                    .map_err(|source| SynthError::Codegen { index, source })?;
                format!(
                    "\n    {{\n        float val = {value};\n        if (abs(val) < EPSILON * {thickness}) {{\n            {assign}\n        }}\n    }}\n"
                )
            }
            CurvePlot::Explicit(function) => {
                let value = function
                    .to_glsl(&["x"])
                    .map_err(|source| SynthError::Codegen { index, source })?;
                match explicit_slope(function) {
                    Some(derivative) => {
                        let slope = derivative
                            .to_glsl(&["x"])
                            .map_err(|source| SynthError::Codegen { index, source })?;
                        format!(
                            "\n    {{\n        float val = {value};\n        float slope = {slope};\n        if (abs(y - val) < EPSILON * {thickness} * max(abs(slope), 1.0)) {{\n            {assign}\n        }}\n    }}\n"
                        )
                    }
                    // No usable derivative: constant-width band. The curve
                    // thins out visually on steep sections, which is the
                    // accepted approximation.
                    None => format!(
                        "\n    {{\n        float val = {value};\n        if (abs(y - val) < EPSILON * {thickness}) {{\n            {assign}\n        }}\n    }}\n"
                    ),
                }
            }
        };
        source.push_str(&block);
    }

    source.push_str(EPILOGUE);
    Ok(source)
}

fn explicit_slope(function: &Expr) -> Option<Expr> {
    differentiate(function, "x").map(|derivative| derivative.simplified())
}

fn color_assignment(color: [f32; 3]) -> String {
    format!(
        "col = vec3({}, {}, {});",
        float_literal(color[0]),
        float_literal(color[1]),
        float_literal(color[2])
    )
}

/// Shared with the expression code generator so constants embedded by
/// the synthesizer and by curve ASTs format identically.
fn float_literal(value: f32) -> String {
    glsl_number(f64::from(value))
}

/// CPU mirror of the prologue's spacing search, used as a test oracle
/// and kept in lockstep with the GLSL above.
pub fn grid_spacing(pixels_per_unit: f64) -> f64 {
    let mut spacing = 1.0f64;
    for _ in 0..64 {
        if spacing * pixels_per_unit >= 10.0 {
            break;
        }
        spacing *= 2.0;
    }
    for _ in 0..64 {
        if spacing * pixels_per_unit <= 40.0 {
            break;
        }
        spacing *= 0.5;
    }
    spacing
}

#[cfg(test)]
mod tests {
    use super::*;
    use symbolic::{parse, Parsed};

    fn implicit(text: &str) -> CurveSpec {
        let Parsed::Equation(eq) = parse(text).expect("parse").simplified() else {
            panic!("expected equation: {text}");
        };
        CurveSpec {
            color: [1.0, 0.0, 1.0],
            plot: CurvePlot::Implicit(eq.difference().simplified()),
        }
    }

    fn explicit(text: &str) -> CurveSpec {
        let Parsed::Expression(expr) = parse(text).expect("parse").simplified() else {
            panic!("expected expression: {text}");
        };
        CurveSpec {
            color: [0.0, 0.5, 1.0],
            plot: CurvePlot::Explicit(expr),
        }
    }

    #[test]
    fn declares_the_uniform_contract() {
        let source = synthesize(&[], 2.0).expect("synthesize");
        for declaration in [
            "uniform vec2 viewStart;",
            "uniform vec2 viewSize;",
            "uniform float EPSILON;",
            "uniform vec2 iResolution;",
            "uniform float iTime;",
            "uniform vec2 iMouse;",
        ] {
            assert!(source.contains(declaration), "missing `{declaration}`");
        }
    }

    #[test]
    fn is_a_pure_function_of_its_inputs() {
        let first = synthesize(&[implicit("x^2+y^2=4"), explicit("x^3")], 2.0).expect("synthesize");
        let second =
            synthesize(&[implicit("x^2+y^2=4"), explicit("x^3")], 2.0).expect("synthesize");
        assert_eq!(first, second);
    }

    #[test]
    fn equivalent_rebuilt_entries_round_trip() {
        // Removing an entry and re-adding equal text/color yields the
        // same source once the list orders match again.
        let original = synthesize(&[implicit("x^2+y^2=4")], 2.0).expect("synthesize");
        let readded = synthesize(&[implicit("x^2+y^2=4")], 2.0).expect("synthesize");
        assert_eq!(original, readded);
    }

    #[test]
    fn entry_order_changes_the_source() {
        let curves = [implicit("x^2+y^2=4"), explicit("x^3")];
        let reversed = [explicit("x^3"), implicit("x^2+y^2=4")];
        let forward = synthesize(&curves, 2.0).expect("synthesize");
        let backward = synthesize(&reversed, 2.0).expect("synthesize");
        assert_ne!(forward, backward);
        // Later entries are emitted later, so the last one wins a pixel.
        let circle = forward.find("(x*x)+(y*y)").expect("circle block");
        let cubic = forward.find("(x*x*x)").expect("cubic block");
        assert!(circle < cubic);
    }

    #[test]
    fn implicit_circle_band_matches_direct_evaluation() {
        let curve = implicit("x^2+y^2=4");
        let source = synthesize(std::slice::from_ref(&curve), 2.0).expect("synthesize");
        assert!(source.contains("(((x*x)+(y*y))-4.0)"));
        assert!(source.contains("EPSILON * 2.0"));
        assert!(source.contains("col = vec3(1.0, 0.0, 1.0);"));

        // Oracle: evaluate the difference expression directly.
        let CurvePlot::Implicit(difference) = &curve.plot else {
            unreachable!();
        };
        let epsilon = 0.01;
        let thickness = 2.0;
        let on_curve = difference
            .eval(&[("x", 2.0), ("y", 0.0)])
            .expect("eval")
            .abs();
        let off_curve = difference
            .eval(&[("x", 0.0), ("y", 0.0)])
            .expect("eval")
            .abs();
        assert!(on_curve < epsilon * thickness);
        assert!(off_curve >= epsilon * thickness);
    }

    #[test]
    fn explicit_band_widens_with_slope() {
        let curve = explicit("x^3");
        let source = synthesize(std::slice::from_ref(&curve), 2.0).expect("synthesize");
        assert!(source.contains("float slope ="));
        assert!(source.contains("max(abs(slope), 1.0)"));

        let CurvePlot::Explicit(function) = &curve.plot else {
            unreachable!();
        };
        let derivative = explicit_slope(function).expect("derivative");
        let epsilon = 0.01;
        let thickness = 2.0;
        let band = |x: f64| {
            let slope = derivative.eval(&[("x", x)]).expect("eval");
            epsilon * thickness * slope.abs().max(1.0)
        };
        // 27x wider at x=3 than on the flat at x=0.
        assert!((band(3.0) - 27.0 * epsilon * thickness).abs() < 1e-12);
        assert!((band(0.0) - epsilon * thickness).abs() < 1e-12);
    }

    #[test]
    fn non_differentiable_functions_fall_back_to_fixed_band() {
        let source = synthesize(&[explicit("floor(x)")], 2.0).expect("synthesize");
        assert!(!source.contains("float slope ="));
        assert!(source.contains("abs(y - val) < EPSILON * 2.0)"));
    }

    #[test]
    fn invalid_variables_are_a_synth_error() {
        let err = synthesize(&[explicit("x+z")], 2.0).expect_err("must fail");
        let SynthError::Codegen { index, .. } = err;
        assert_eq!(index, 0);
    }

    #[test]
    fn fractional_thickness_stays_a_float_literal() {
        let source = synthesize(&[explicit("floor(x)")], 1.5).expect("synthesize");
        assert!(source.contains("EPSILON * 1.5"));
    }

    #[test]
    fn grid_spacing_lands_between_10_and_40_px() {
        let viewport_width = 1000.0f64;
        let mut zoom = 1e-6f64;
        while zoom <= 1e6 {
            let pixels_per_unit = viewport_width / zoom;
            let spacing = grid_spacing(pixels_per_unit);
            let on_screen = spacing * pixels_per_unit;
            assert!(
                (10.0..=40.0).contains(&on_screen),
                "zoom {zoom}: spacing {spacing} -> {on_screen} px"
            );
            zoom *= 10.0;
        }
    }

    #[test]
    fn grid_spacing_survives_degenerate_zoom() {
        assert!(grid_spacing(f64::MIN_POSITIVE) > 0.0);
        assert!(grid_spacing(f64::MAX).is_finite());
    }
}
