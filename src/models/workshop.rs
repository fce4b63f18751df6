use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::string_enum;

string_enum! {
    /// Workshop skill level.
    #[derive(Default)]
    pub enum Difficulty {
        #[default]
        Beginner => "principiante",
        Intermediate => "intermedio",
        Advanced => "avanzado",
    }
}

string_enum! {
    #[derive(Default)]
    pub enum WorkshopStatus {
        #[default]
        Active => "active",
        Inactive => "inactive",
        Full => "full",
        Cancelled => "cancelled",
    }
}

/// Location used when a workshop is created without one.
pub const DEFAULT_LOCATION: &str = "TEJElANAS, Laguna de Zapallar";

/// A scheduled knitting/crochet workshop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workshop {
    pub id: u64,
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// Minutes.
    pub duration: i64,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub max_participants: i64,
    pub current_participants: i64,
    pub location: String,
    pub instructor: Option<String>,
    pub image_url: Option<String>,
    pub difficulty_level: Difficulty,
    pub materials_included: bool,
    pub requirements: Option<String>,
    pub status: WorkshopStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workshop {
    pub fn is_full(&self) -> bool {
        self.current_participants >= self.max_participants
    }

    /// Takes place today or later.
    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.date >= today
    }

    /// Active and with free places.
    pub fn is_available(&self) -> bool {
        self.status == WorkshopStatus::Active && !self.is_full()
    }

    pub fn available_spots(&self) -> i64 {
        (self.max_participants - self.current_participants).max(0)
    }

    /// Label shown to customers.
    pub fn status_display(&self, today: NaiveDate) -> &'static str {
        if self.status == WorkshopStatus::Cancelled {
            "Cancelado"
        } else if self.is_full() {
            "Completo"
        } else if !self.is_upcoming(today) {
            "Finalizado"
        } else {
            "Disponible"
        }
    }
}

/// Upcoming workshop presented as a bookable service.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceItem {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration: i64,
    pub max_participants: i64,
    pub current_participants: i64,
    pub available_spots: i64,
    pub status_display: &'static str,
}

impl ServiceItem {
    pub fn new(workshop: &Workshop, today: NaiveDate) -> Self {
        Self {
            id: workshop.id,
            name: workshop.title.clone(),
            description: workshop.description.clone(),
            price: workshop.price,
            date: workshop.date,
            time: workshop.time,
            duration: workshop.duration,
            max_participants: workshop.max_participants,
            current_participants: workshop.current_participants,
            available_spots: workshop.available_spots(),
            status_display: workshop.status_display(today),
        }
    }
}
