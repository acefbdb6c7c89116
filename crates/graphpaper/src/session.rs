//! Per-equation entry state and the edit-driven rebuild policy.
//!
//! Each entry keeps its raw text, the parse outcome, and the reduced
//! AST the shader synthesizer consumes. The session owns the entry
//! list (order is draw order; the last matching entry wins a pixel)
//! and a frame-scoped dirty flag: any committed reparse, color edit,
//! addition or removal marks the session dirty, and the application
//! rebuilds the fragment program once per frame at most.

use renderer::{CurvePlot, CurveSpec};
use symbolic::{parse, Equation, Expr, Parsed};

/// New entries start magenta.
pub const DEFAULT_COLOR: [f32; 3] = [1.0, 0.0, 1.0];

/// Outcome of parsing an entry's text.
///
/// A bare expression over `x` alone is an explicit `y = f(x)`; one
/// that also mentions `y` is treated as the implicit relation
/// `f(x, y) = 0`. Anything with other free variables is invalid.
#[derive(Clone, Debug, PartialEq)]
pub enum ParseState {
    Empty,
    Invalid,
    Equation(Equation),
    Function(Expr),
}

impl ParseState {
    fn simplified(&self) -> ParseState {
        match self {
            ParseState::Equation(eq) => ParseState::Equation(eq.simplified()),
            ParseState::Function(f) => ParseState::Function(f.simplified()),
            other => other.clone(),
        }
    }
}

pub struct GraphEntry {
    pub id: u64,
    pub color: [f32; 3],
    pub text: String,
    pub parsed: ParseState,
    /// Re-derived from `parsed` after every successful reparse and
    /// cleared together with it on failure.
    pub simplified: ParseState,
    pub focused: bool,
}

impl GraphEntry {
    fn new(id: u64, text: String) -> Self {
        let mut entry = Self {
            id,
            color: DEFAULT_COLOR,
            text,
            parsed: ParseState::Empty,
            simplified: ParseState::Empty,
            focused: false,
        };
        entry.reparse();
        entry
    }

    /// Re-derives both ASTs from the current text.
    pub fn reparse(&mut self) {
        self.parsed = if self.text.is_empty() {
            ParseState::Empty
        } else {
            match parse(&self.text) {
                Ok(parsed) => classify(parsed),
                Err(err) => {
                    tracing::debug!(entry = self.id, %err, "entry does not parse");
                    ParseState::Invalid
                }
            }
        };
        self.simplified = self.parsed.simplified();
    }

    /// The curve this entry contributes, if any.
    pub fn curve(&self) -> Option<CurveSpec> {
        match &self.simplified {
            ParseState::Equation(eq) => Some(CurveSpec {
                color: self.color,
                plot: CurvePlot::Implicit(eq.difference().simplified()),
            }),
            ParseState::Function(f) => Some(CurveSpec {
                color: self.color,
                plot: CurvePlot::Explicit(f.clone()),
            }),
            ParseState::Empty | ParseState::Invalid => None,
        }
    }

    /// Reduced notation shown under the input field.
    pub fn notation(&self) -> Option<String> {
        match &self.simplified {
            ParseState::Equation(eq) => Some(eq.to_string()),
            ParseState::Function(f) => Some(format!("y = {f}")),
            ParseState::Empty | ParseState::Invalid => None,
        }
    }
}

fn classify(parsed: Parsed) -> ParseState {
    let allowed = |expr: &Expr| {
        expr.free_variables()
            .iter()
            .all(|name| name == "x" || name == "y")
    };
    match parsed {
        Parsed::Equation(eq) => {
            if allowed(&eq.lhs) && allowed(&eq.rhs) {
                ParseState::Equation(eq)
            } else {
                ParseState::Invalid
            }
        }
        Parsed::Expression(expr) => {
            if !allowed(&expr) {
                ParseState::Invalid
            } else if expr.free_variables().contains("y") {
                ParseState::Equation(Equation {
                    lhs: expr,
                    rhs: Expr::Number(0.0),
                })
            } else {
                ParseState::Function(expr)
            }
        }
    }
}

#[derive(Default)]
pub struct GraphSession {
    entries: Vec<GraphEntry>,
    next_id: u64,
    dirty: bool,
}

impl GraphSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[GraphEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut GraphEntry> {
        self.entries.iter_mut()
    }

    /// Appends an entry committed in the new-entry slot.
    pub fn push_entry(&mut self, text: String) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(GraphEntry::new(id, text));
        self.dirty = true;
        id
    }

    /// Drops entries whose text is empty, unless they still hold input
    /// focus; the user should not fight the editor mid-edit.
    pub fn prune_empty(&mut self) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|entry| !(entry.text.is_empty() && !entry.focused));
        let removed = self.entries.len() != before;
        if removed {
            self.dirty = true;
        }
        removed
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Clears and returns the frame's dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Curves for the synthesizer, in draw order.
    pub fn curves(&self) -> Vec<CurveSpec> {
        self.entries.iter().filter_map(GraphEntry::curve).collect()
    }
}
