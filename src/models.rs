use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Good,
    Bad,
}

impl Rating {
    /// Caption shown on the home page strip.
    pub fn strip_caption(self) -> &'static str {
        match self {
            Rating::Good => "Healthy choice",
            Rating::Bad => "Could be better",
        }
    }

    /// Caption shown on the full log page.
    pub fn log_caption(self) -> &'static str {
        match self {
            Rating::Good => "Healthy choice",
            Rating::Bad => "Could improve",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rating::Good => write!(f, "good"),
            Rating::Bad => write!(f, "bad"),
        }
    }
}

impl FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "good" => Ok(Rating::Good),
            "bad" => Ok(Rating::Bad),
            _ => Err(format!("invalid rating '{s}', expected 'good' or 'bad'")),
        }
    }
}

/// One logged meal. Never modified after it is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodEntry {
    pub id: String,
    /// Encoded snapshot, usually a `data:image/jpeg;base64,...` URI.
    pub image: String,
    pub rating: Rating,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

#[derive(Debug, Deserialize)]
pub struct CaptureRequest {
    #[serde(default)]
    pub image: String,
    pub rating: Rating,
}

#[derive(Debug, Deserialize)]
pub struct CaptureForm {
    #[serde(default)]
    pub image: String,
    pub rating: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FoodLogResponse {
    pub entries: Vec<FoodEntry>,
}

#[derive(Debug, Serialize)]
pub struct EntryView {
    pub id: String,
    pub image: String,
    pub rating: Rating,
    pub timestamp: i64,
    pub time: String,
    pub caption: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TodayResponse {
    pub entries: Vec<EntryView>,
}

#[derive(Debug, Serialize)]
pub struct GroupView {
    pub label: String,
    pub entries: Vec<EntryView>,
}

#[derive(Debug, Serialize)]
pub struct GroupsResponse {
    pub groups: Vec<GroupView>,
}

#[derive(Debug, Deserialize)]
pub struct WorkoutCompleteRequest {
    pub workout: String,
    pub points: Option<u32>,
    pub feedback: Option<String>,
}
