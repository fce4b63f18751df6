//! Unit tests for domain models.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::json;

// Note: These tests can be run with: cargo test --test model_tests

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Product, category and FAQ model tests
mod catalog_tests {
    use super::*;
    use std::str::FromStr;
    use tejelanas_api::models::{
        Category, Faq, FaqCategory, Product, ProductSummary, ProductWithCategory, RecordStatus,
        money,
    };

    fn product() -> Product {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        Product {
            id: 1,
            name: "Lana Merino Natural".to_string(),
            description: None,
            price: money(Decimal::from(15990)),
            stock: 25,
            category_id: 1,
            image_url: None,
            weight: Some(money(Decimal::from_str("0.1").unwrap())),
            color: Some("Natural".to_string()),
            material: Some("Merino".to_string()),
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_money_pins_two_decimals() {
        assert_eq!(money(Decimal::from(15990)).to_string(), "15990.00");
        assert_eq!(money(Decimal::from_str("12.345").unwrap()).to_string(), "12.35");
        assert_eq!(money(Decimal::from_str("7.1").unwrap()).to_string(), "7.10");
    }

    #[test]
    fn test_product_serializes_decimals_as_strings() {
        let value = serde_json::to_value(product()).unwrap();

        assert_eq!(value["price"], "15990.00");
        assert_eq!(value["weight"], "0.10");
        assert_eq!(value["status"], "active");
        assert_eq!(value["created_at"], "2025-06-01T12:00:00Z");
    }

    #[test]
    fn test_product_with_category_is_flattened() {
        let category = Category {
            id: 1,
            name: "Lanas Premium".to_string(),
            description: None,
            status: RecordStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(ProductWithCategory {
            product: product(),
            category: Some(category),
        })
        .unwrap();

        assert_eq!(value["id"], 1);
        assert_eq!(value["name"], "Lana Merino Natural");
        assert_eq!(value["category"]["name"], "Lanas Premium");
    }

    #[test]
    fn test_product_summary_keeps_listing_fields() {
        let summary = ProductSummary::from(&product());
        let value = serde_json::to_value(summary).unwrap();

        assert_eq!(value["price"], "15990.00");
        assert!(value.get("description").is_none());
        assert!(value.get("material").is_none());
    }

    #[test]
    fn test_faq_category_wire_values() {
        assert_eq!(FaqCategory::VALUES, &["general", "productos", "talleres", "envios"]);
        assert_eq!("envios".parse::<FaqCategory>().unwrap(), FaqCategory::Shipping);
        assert!("shipping".parse::<FaqCategory>().is_err());
        assert_eq!(serde_json::to_value(FaqCategory::Workshops).unwrap(), json!("talleres"));
    }

    #[test]
    fn test_faq_search_is_case_insensitive() {
        let faq = Faq {
            id: 1,
            question: "¿Hacen envíos a regiones?".to_string(),
            answer: "Sí, enviamos por Chilexpress.".to_string(),
            category: FaqCategory::Shipping,
            order: 1,
            featured: true,
            status: RecordStatus::Active,
            views_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(faq.matches("regiones"));
        assert!(faq.matches("chilexpress"));
        assert!(!faq.matches("lana"));
    }
}

/// Workshop model tests
mod workshop_tests {
    use super::*;
    use tejelanas_api::models::{
        DEFAULT_LOCATION, Difficulty, ServiceItem, Workshop, WorkshopStatus, money,
    };

    fn workshop(on: NaiveDate, booked: i64) -> Workshop {
        Workshop {
            id: 7,
            title: "Crochet Básico".to_string(),
            description: None,
            date: on,
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            duration: 120,
            price: money(Decimal::from(25000)),
            max_participants: 8,
            current_participants: booked,
            location: DEFAULT_LOCATION.to_string(),
            instructor: None,
            image_url: None,
            difficulty_level: Difficulty::Beginner,
            materials_included: true,
            requirements: None,
            status: WorkshopStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_workshop_serialization_formats() {
        let value = serde_json::to_value(workshop(date(2025, 6, 16), 3)).unwrap();

        assert_eq!(value["date"], "2025-06-16");
        assert_eq!(value["time"], "10:00:00");
        assert_eq!(value["price"], "25000.00");
        assert_eq!(value["difficulty_level"], "principiante");
        assert_eq!(value["status"], "active");
    }

    #[test]
    fn test_status_display() {
        let today = date(2025, 6, 1);

        assert_eq!(workshop(date(2025, 6, 16), 3).status_display(today), "Disponible");
        assert_eq!(workshop(date(2025, 6, 1), 3).status_display(today), "Disponible");
        assert_eq!(workshop(date(2025, 6, 16), 8).status_display(today), "Completo");
        assert_eq!(workshop(date(2025, 5, 31), 3).status_display(today), "Finalizado");

        let mut cancelled = workshop(date(2025, 6, 16), 8);
        cancelled.status = WorkshopStatus::Cancelled;
        assert_eq!(cancelled.status_display(today), "Cancelado");
    }

    #[test]
    fn test_availability() {
        let mut w = workshop(date(2025, 6, 16), 5);
        assert!(w.is_available());
        assert_eq!(w.available_spots(), 3);

        w.current_participants = 10;
        assert!(!w.is_available());
        assert_eq!(w.available_spots(), 0);

        w.current_participants = 0;
        w.status = WorkshopStatus::Inactive;
        assert!(!w.is_available());
    }

    #[test]
    fn test_service_item_from_workshop() {
        let today = date(2025, 6, 1);
        let item = ServiceItem::new(&workshop(date(2025, 6, 16), 6), today);
        let value = serde_json::to_value(item).unwrap();

        assert_eq!(value["name"], "Crochet Básico");
        assert_eq!(value["available_spots"], 2);
        assert_eq!(value["status_display"], "Disponible");
        assert!(value.get("location").is_none());
    }
}

/// API envelope tests
mod api_tests {
    use tejelanas_api::models::{ApiResponse, HealthResponse, StatsResponse, paginate};

    #[test]
    fn test_data_envelope() {
        let value = serde_json::to_value(
            ApiResponse::data(vec![1, 2, 3]).with_message("Productos obtenidos exitosamente"),
        )
        .unwrap();

        assert_eq!(value["success"], true);
        assert_eq!(value["message"], "Productos obtenidos exitosamente");
        assert_eq!(value["data"], serde_json::json!([1, 2, 3]));
        assert!(value.get("response_time").is_none());
    }

    #[test]
    fn test_message_only_envelope() {
        let value =
            serde_json::to_value(ApiResponse::<()>::message_only("Taller eliminado exitosamente"))
                .unwrap();

        assert_eq!(value["success"], true);
        assert!(value.get("data").is_none());
    }

    #[test]
    fn test_paginate_middle_page() {
        let (items, page) = paginate((1..=25).collect::<Vec<_>>(), 2, 10);

        assert_eq!(items, (11..=20).collect::<Vec<_>>());
        assert_eq!(page.current_page, 2);
        assert_eq!(page.last_page, 3);
        assert_eq!(page.total, 25);
        assert_eq!(page.from, Some(11));
        assert_eq!(page.to, Some(20));
    }

    #[test]
    fn test_paginate_past_the_end() {
        let (items, page) = paginate(vec!["a", "b"], 5, 10);

        assert!(items.is_empty());
        assert_eq!(page.last_page, 1);
        assert_eq!(page.from, None);
        assert_eq!(page.to, None);
    }

    #[test]
    fn test_health_and_stats_serialization() {
        let health = HealthResponse {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
            timestamp: chrono::Utc::now(),
        };
        let value = serde_json::to_value(health).unwrap();
        assert_eq!(value["status"], "healthy");

        let stats = StatsResponse {
            categories: 4,
            products: 4,
            workshops: 2,
            faqs: 4,
            about_us: 3,
            cache_entries: 0,
            uptime_seconds: 12,
        };
        let value = serde_json::to_value(stats).unwrap();
        assert_eq!(value["about_us"], 3);
        assert_eq!(value["uptime_seconds"], 12);
    }
}

/// Configuration tests
mod config_tests {
    use std::time::Duration;
    use tejelanas_api::Config;
    use tejelanas_api::config::AuthMode;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.rate_limit_max_requests, 100);
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.auth_mode, AuthMode::AllowList);
        assert!(config.seed_data);
    }

    #[test]
    fn test_server_addr() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };

        assert_eq!(config.server_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_disabled_middleware() {
        let config = Config {
            rate_limit_max_requests: 0,
            cache_ttl: Duration::ZERO,
            ..Config::default()
        };

        assert!(!config.rate_limiting_enabled());
        assert!(!config.response_cache_enabled());
        assert!(config.validate().is_ok());
    }
}
