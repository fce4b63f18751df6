mod about_us;
mod api;
mod category;
mod faq;
mod product;
mod workshop;

pub use about_us::{AboutUs, AboutUsSection};
pub use api::{ApiResponse, HealthResponse, Pagination, StatsResponse, paginate};
pub use category::{Category, CategoryRef, CategoryWithCount};
pub use faq::{Faq, FaqCategory};
pub use product::{Product, ProductListing, ProductSummary, ProductWithCategory, money};
pub use workshop::{DEFAULT_LOCATION, Difficulty, ServiceItem, Workshop, WorkshopStatus};

/// Define a lowercase string enum with `FromStr`, `as_str` and the list of
/// accepted values (used by `in:` validation rules).
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant ),+
        }

        impl $name {
            /// Accepted wire values, in declaration order.
            pub const VALUES: &'static [&'static str] = &[$($text),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    other => Err(format!("unknown {}: {other}", stringify!($name))),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use string_enum;

string_enum! {
    /// Publication status shared by categories, products, FAQs and about-us sections.
    #[derive(Default)]
    pub enum RecordStatus {
        #[default]
        Active => "active",
        Inactive => "inactive",
    }
}
