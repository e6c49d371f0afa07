use crate::StateRole;
use serde::{Deserialize, Serialize};

/// Attribute whose presence marks a node as already annotated.
pub const MARKER_KEY: &str = "shape";

/// How a role is encoded in a node's attribute list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerStyle {
    /// The start state gets a distinguished shape glyph.
    #[default]
    Shape,
    /// The start state keeps the plain circle and gets an external `start`
    /// label next to it.
    ExternalLabel,
}

impl MarkerStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Shape => "shape",
            Self::ExternalLabel => "external_label",
        }
    }

    pub fn marker(self, role: StateRole) -> Marker {
        let attrs: &'static [(&'static str, &'static str)] = match (self, role) {
            (_, StateRole::Plain) => &[("shape", "circle")],
            (_, StateRole::Accepting) => &[("shape", "doublecircle")],
            (Self::Shape, StateRole::Start) => &[("shape", "Mcircle")],
            (Self::Shape, StateRole::StartAndAccepting) => {
                &[("shape", "doublecircle"), ("style", "diagonals")]
            }
            (Self::ExternalLabel, StateRole::Start) => {
                &[("shape", "circle"), ("xlabel", "\"start\"")]
            }
            (Self::ExternalLabel, StateRole::StartAndAccepting) => {
                &[("shape", "doublecircle"), ("xlabel", "\"start\"")]
            }
        };
        Marker { attrs }
    }
}

/// The attributes encoding one role. Always leads with [`MARKER_KEY`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Marker {
    attrs: &'static [(&'static str, &'static str)],
}

impl Marker {
    pub fn attrs(&self) -> &'static [(&'static str, &'static str)] {
        self.attrs
    }

    /// Text spliced in front of the closing `]`, in the engine's
    /// `key = value ` spacing.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (key, value) in self.attrs {
            out.push_str(key);
            out.push_str(" = ");
            out.push_str(value);
            out.push(' ');
        }
        out
    }
}
