use crate::{MarkerStyle, RankDir, VizError};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VizConfig {
    pub marker_style: MarkerStyle,
    pub rankdir: RankDir,
    /// Re-check the annotated description before handing it out.
    pub validate_output: bool,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            marker_style: MarkerStyle::Shape,
            rankdir: RankDir::LeftToRight,
            validate_output: true,
        }
    }
}

impl VizConfig {
    pub fn from_json_str(source: &str) -> Result<Self, VizError> {
        serde_json::from_str(source).map_err(|error| VizError::Config(error.to_string()))
    }

    pub fn from_json_file(path: &Path) -> Result<Self, VizError> {
        let source = std::fs::read_to_string(path).map_err(|error| {
            VizError::Config(format!("could not read '{}': {error}", path.display()))
        })?;
        Self::from_json_str(&source)
    }
}
