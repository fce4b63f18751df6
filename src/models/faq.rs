use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{RecordStatus, string_enum};

string_enum! {
    /// FAQ grouping shown as tabs by the storefront.
    #[derive(Default)]
    pub enum FaqCategory {
        #[default]
        General => "general",
        Products => "productos",
        Workshops => "talleres",
        Shipping => "envios",
    }
}

/// Frequently asked question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Faq {
    pub id: u64,
    pub question: String,
    pub answer: String,
    pub category: FaqCategory,
    pub order: i64,
    pub featured: bool,
    pub status: RecordStatus,
    pub views_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Faq {
    pub fn is_active(&self) -> bool {
        self.status == RecordStatus::Active
    }

    /// Case-insensitive substring match on question or answer.
    pub fn matches(&self, needle_lower: &str) -> bool {
        self.question.to_lowercase().contains(needle_lower)
            || self.answer.to_lowercase().contains(needle_lower)
    }
}
