use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{RecordStatus, string_enum};

string_enum! {
    #[derive(Default)]
    pub enum AboutUsSection {
        #[default]
        History => "historia",
        Mission => "mision",
        Vision => "vision",
        Values => "valores",
    }
}

/// A block of the "about us" page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AboutUs {
    pub id: u64,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub section: AboutUsSection,
    pub order: i64,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
