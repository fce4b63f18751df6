//! Demonstration data loaded when `SEED_DATA` is on.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;

use super::CatalogData;
use crate::models::{
    AboutUs, AboutUsSection, Category, Difficulty, Faq, FaqCategory, Product, RecordStatus,
    Workshop, WorkshopStatus, money,
};

const CATEGORIES: [(&str, &str); 4] = [
    ("Lanas Premium", "Lanas de alta calidad importadas"),
    ("Hilos de Algodón", "Hilos 100% algodón natural"),
    ("Accesorios", "Agujas, patrones y herramientas"),
    ("Productos Terminados", "Prendas y artículos listos"),
];

struct SeedProduct {
    name: &'static str,
    description: &'static str,
    price: i64,
    stock: i64,
    category_id: u64,
    color: Option<&'static str>,
    material: &'static str,
}

const PRODUCTS: [SeedProduct; 4] = [
    SeedProduct {
        name: "Lana Merino Azul",
        description: "Lana 100% merino, perfecta para prendas delicadas",
        price: 15990,
        stock: 25,
        category_id: 1,
        color: Some("Azul"),
        material: "100% Merino",
    },
    SeedProduct {
        name: "Hilo Algodón Blanco",
        description: "Hilo de algodón egipcio, ideal para prendas de verano",
        price: 8990,
        stock: 40,
        category_id: 2,
        color: Some("Blanco"),
        material: "100% Algodón",
    },
    SeedProduct {
        name: "Agujas Bambú Set",
        description: "Set de agujas de bambú, números 3-10",
        price: 25990,
        stock: 15,
        category_id: 3,
        color: None,
        material: "Bambú",
    },
    SeedProduct {
        name: "Chaleco Tejido a Mano",
        description: "Hermoso chaleco tejido en lana alpaca",
        price: 45990,
        stock: 5,
        category_id: 4,
        color: Some("Beige"),
        material: "100% Alpaca",
    },
];

struct SeedWorkshop {
    title: &'static str,
    description: &'static str,
    days_ahead: u64,
    hour: u32,
    duration: i64,
    price: i64,
    max_participants: i64,
    current_participants: i64,
    location: &'static str,
    instructor: &'static str,
    difficulty: Difficulty,
    requirements: &'static str,
}

const WORKSHOPS: [SeedWorkshop; 2] = [
    SeedWorkshop {
        title: "Taller de Tejido Básico",
        description: "Aprende las técnicas fundamentales del tejido a dos agujas. Perfecto para principiantes.",
        days_ahead: 15,
        hour: 14,
        duration: 180,
        price: 25000,
        max_participants: 8,
        current_participants: 3,
        location: "Taller Tejelanas Vivi - Sala Principal",
        instructor: "Viviana González",
        difficulty: Difficulty::Beginner,
        requirements: "No se requiere experiencia previa",
    },
    SeedWorkshop {
        title: "Técnicas Avanzadas de Crochet",
        description: "Domina las técnicas más complejas del crochet y crea piezas únicas.",
        days_ahead: 25,
        hour: 10,
        duration: 240,
        price: 35000,
        max_participants: 6,
        current_participants: 1,
        location: "Taller Tejelanas Vivi - Sala Avanzada",
        instructor: "Carmen Silva",
        difficulty: Difficulty::Advanced,
        requirements: "Conocimientos básicos de crochet",
    },
];

const ABOUT_US: [(&str, &str, AboutUsSection); 3] = [
    (
        "Nuestra Historia",
        "Tejelanas Vivi nació del amor por las fibras naturales y la tradición del tejido. Desde 2015, nos dedicamos a promover este hermoso arte, conectando a personas con la creatividad y la paciencia que requiere crear con las manos.",
        AboutUsSection::History,
    ),
    (
        "Nuestra Misión",
        "Preservar y enseñar las técnicas tradicionales del tejido, mientras innovamos con nuevos diseños y materiales sostenibles. Creemos en el poder terapéutico y creativo del tejido.",
        AboutUsSection::Mission,
    ),
    (
        "Nuestra Visión",
        "Ser la comunidad de tejido más reconocida de Chile, donde cada persona pueda desarrollar su creatividad y encontrar su pasión por las manualidades.",
        AboutUsSection::Vision,
    ),
];

const FAQS: [(&str, &str, FaqCategory, bool); 4] = [
    (
        "¿Cuál es el tiempo de entrega de los productos?",
        "Los tiempos de entrega varían entre 3-5 días hábiles en Santiago y 5-7 días hábiles en regiones. Los productos personalizados pueden tomar hasta 10 días.",
        FaqCategory::Shipping,
        true,
    ),
    (
        "¿Los talleres incluyen todos los materiales?",
        "Sí, todos nuestros talleres incluyen los materiales necesarios para completar el proyecto del día. Solo necesitas traer ganas de aprender.",
        FaqCategory::Workshops,
        true,
    ),
    (
        "¿Hacen productos personalizados?",
        "Por supuesto. Ofrecemos servicios de tejido personalizado. Contáctanos para discutir tu proyecto específico y recibir una cotización.",
        FaqCategory::Products,
        false,
    ),
    (
        "¿Cuáles son los métodos de pago aceptados?",
        "Aceptamos transferencias bancarias, tarjetas de débito y crédito, y pagos en efectivo en nuestro taller físico.",
        FaqCategory::General,
        false,
    ),
];

pub(super) fn load(data: &mut CatalogData, today: NaiveDate, now: DateTime<Utc>) {
    for (name, description) in CATEGORIES {
        data.categories.insert_with(|id| Category {
            id,
            name: name.to_string(),
            description: Some(description.to_string()),
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
        });
    }

    for seed in &PRODUCTS {
        data.products.insert_with(|id| Product {
            id,
            name: seed.name.to_string(),
            description: Some(seed.description.to_string()),
            price: money(Decimal::from(seed.price)),
            stock: seed.stock,
            category_id: seed.category_id,
            image_url: None,
            weight: None,
            color: seed.color.map(str::to_string),
            material: Some(seed.material.to_string()),
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
        });
    }

    for seed in &WORKSHOPS {
        let date = today
            .checked_add_days(Days::new(seed.days_ahead))
            .unwrap_or(today);
        data.workshops.insert_with(|id| Workshop {
            id,
            title: seed.title.to_string(),
            description: Some(seed.description.to_string()),
            date,
            time: NaiveTime::from_hms_opt(seed.hour, 0, 0).unwrap_or_default(),
            duration: seed.duration,
            price: money(Decimal::from(seed.price)),
            max_participants: seed.max_participants,
            current_participants: seed.current_participants,
            location: seed.location.to_string(),
            instructor: Some(seed.instructor.to_string()),
            image_url: None,
            difficulty_level: seed.difficulty,
            materials_included: true,
            requirements: Some(seed.requirements.to_string()),
            status: WorkshopStatus::Active,
            created_at: now,
            updated_at: now,
        });
    }

    for (order, (title, content, section)) in (1..).zip(ABOUT_US) {
        data.about_us.insert_with(|id| AboutUs {
            id,
            title: title.to_string(),
            content: content.to_string(),
            image_url: None,
            section,
            order,
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
        });
    }

    for (order, (question, answer, category, featured)) in (1..).zip(FAQS) {
        data.faqs.insert_with(|id| Faq {
            id,
            question: question.to_string(),
            answer: answer.to_string(),
            category,
            order,
            featured,
            status: RecordStatus::Active,
            views_count: 0,
            created_at: now,
            updated_at: now,
        });
    }
}
