use crate::{
    Diagnostic, GraphDescription, Severity, Splice, Statement, VizError, apply_splices,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const RANKDIR_KEY: &str = "rankdir";
pub const LAYOUT_CONFLICT_RULE: &str = "layout_directive_conflict";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RankDir {
    #[default]
    #[serde(rename = "LR")]
    LeftToRight,
    #[serde(rename = "TB")]
    TopToBottom,
    #[serde(rename = "RL")]
    RightToLeft,
    #[serde(rename = "BT")]
    BottomToTop,
}

impl RankDir {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LeftToRight => "LR",
            Self::TopToBottom => "TB",
            Self::RightToLeft => "RL",
            Self::BottomToTop => "BT",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayoutOutcome {
    Inserted,
    AlreadyPresent,
    /// A rank direction exists in a form the injector does not own; the
    /// description is left untouched.
    Conflict(String),
}

impl LayoutOutcome {
    pub fn diagnostic(&self) -> Option<Diagnostic> {
        match self {
            Self::Conflict(found) => Some(Diagnostic::new(
                LAYOUT_CONFLICT_RULE,
                Severity::Warning,
                format!("existing layout directive '{found}' kept; injection skipped"),
            )),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LayoutDirectiveInjector {
    rankdir: RankDir,
}

impl LayoutDirectiveInjector {
    pub fn new(rankdir: RankDir) -> Self {
        Self { rankdir }
    }

    pub fn directive(&self) -> String {
        format!("{RANKDIR_KEY} = {}", self.rankdir.as_str())
    }

    pub fn inspect(&self, description: &GraphDescription<'_>) -> LayoutOutcome {
        let source = description.source();
        let mut matching = 0;
        for statement in description.statements() {
            match statement {
                Statement::Attribute(attr) if attr.key == RANKDIR_KEY => {
                    if attr.value == self.rankdir.as_str() {
                        matching += 1;
                    } else {
                        return LayoutOutcome::Conflict(source[attr.span.clone()].to_string());
                    }
                }
                Statement::Defaults(defaults) if defaults.attrs.contains_key(RANKDIR_KEY) => {
                    return LayoutOutcome::Conflict(source[defaults.span.clone()].to_string());
                }
                _ => {}
            }
        }

        match matching {
            0 => LayoutOutcome::Inserted,
            1 => LayoutOutcome::AlreadyPresent,
            count => LayoutOutcome::Conflict(format!("{count} '{}' statements", self.directive())),
        }
    }

    pub fn inject(&self, source: &str) -> Result<(String, LayoutOutcome), VizError> {
        let description = GraphDescription::parse(source)?;
        let outcome = self.inspect(&description);
        match &outcome {
            LayoutOutcome::Inserted => {
                let splice = Splice::new(
                    description.closing_line_start(),
                    format!("    {}\n", self.directive()),
                );
                debug!(directive = %self.directive(), "layout directive injected");
                Ok((apply_splices(source, vec![splice]), outcome))
            }
            LayoutOutcome::AlreadyPresent => Ok((source.to_string(), outcome)),
            LayoutOutcome::Conflict(found) => {
                warn!(found = %found, "layout directive conflict; injection skipped");
                Ok((source.to_string(), outcome))
            }
        }
    }
}
