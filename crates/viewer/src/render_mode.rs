use serde::{Deserialize, Serialize};

/// How the image is fitted to the viewport.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// The image covers the viewport and may be cropped.
    #[default]
    Fill,
    /// The whole image is visible and may be letterboxed.
    Letterbox,
}

impl RenderMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RenderMode::Fill => "fill",
            RenderMode::Letterbox => "letterbox",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fill" => Some(RenderMode::Fill),
            "letterbox" => Some(RenderMode::Letterbox),
            _ => None,
        }
    }
}
