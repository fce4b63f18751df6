//! Request validation with per-field Spanish messages.
//!
//! Bodies (JSON objects) and query strings go through the same [`Validator`].
//! Every check records failures instead of returning early, so a single
//! response lists all invalid fields, and [`Validator::finish`] turns them
//! into [`AppError::Validation`].
//!
//! Numbers may arrive as JSON numbers or numeric strings; query strings only
//! carry strings.
//!
//! ```rust,ignore
//! let mut v = Validator::new(&body).message("name.required", "El nombre es obligatorio");
//! let name = v.required_string("name", Some(MAX_NAME_LENGTH));
//! let status = v.optional_in("status", RecordStatus::VALUES);
//! v.finish()?;
//! ```

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult, ValidationErrors};

// =============================================================================
// Validation Constants
// =============================================================================

/// Maximum length for names and titles.
pub const MAX_NAME_LENGTH: usize = 255;

/// Maximum length for category descriptions.
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;

/// Maximum length for short product attributes such as color.
pub const MAX_SHORT_TEXT_LENGTH: usize = 100;

/// Largest page size accepted by list endpoints.
pub const MAX_PER_PAGE: u64 = 100;

/// Convert query parameters into the object shape the validator reads.
pub fn query_object(params: &HashMap<String, String>) -> Map<String, Value> {
    params
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect()
}

/// Collects field errors while extracting typed values.
///
/// `required_*` methods return a placeholder on failure; the placeholder is
/// never observable because [`Validator::finish`] fails whenever a field did.
pub struct Validator<'a> {
    input: &'a Map<String, Value>,
    messages: HashMap<&'static str, &'static str>,
    errors: ValidationErrors,
}

impl<'a> Validator<'a> {
    pub fn new(input: &'a Map<String, Value>) -> Self {
        Self {
            input,
            messages: HashMap::new(),
            errors: ValidationErrors::new(),
        }
    }

    /// Override the message for `field.rule` (e.g. `name.unique`).
    pub fn message(mut self, key: &'static str, message: &'static str) -> Self {
        self.messages.insert(key, message);
        self
    }

    /// Record a failure of `rule` on `field`, using the custom message if any.
    pub fn fail(&mut self, field: &str, rule: &str, default: String) {
        let message = self
            .messages
            .get(format!("{field}.{rule}").as_str())
            .map_or(default, |m| (*m).to_string());
        self.errors.entry(field.to_string()).or_default().push(message);
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// `Ok` when nothing failed, otherwise the collected errors.
    pub fn finish(self) -> AppResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors))
        }
    }

    /// Raw value unless absent or null.
    fn present(&self, field: &str) -> Option<&'a Value> {
        self.input.get(field).filter(|v| !v.is_null())
    }

    /// Absent, null and blank strings all count as missing for `required`.
    fn filled(&self, field: &str) -> Option<&'a Value> {
        self.present(field).filter(|v| match v {
            Value::String(s) => !s.trim().is_empty(),
            Value::Array(a) => !a.is_empty(),
            _ => true,
        })
    }

    fn require(&mut self, field: &str) -> Option<&'a Value> {
        let value = self.filled(field);
        if value.is_none() {
            self.fail(field, "required", format!("El campo {field} es obligatorio."));
        }
        value
    }

    /// Value of an optional field. Present-but-null is reported as `type_rule`
    /// unless the field is nullable.
    fn optional(&mut self, field: &str, nullable: bool, type_rule: &str, type_message: &str) -> Option<&'a Value> {
        match self.input.get(field) {
            None => None,
            Some(Value::Null) if nullable => None,
            Some(Value::Null) => {
                self.fail(field, type_rule, format!("El campo {field} {type_message}"));
                None
            }
            Some(value) => Some(value),
        }
    }

    // -------------------------------------------------------------------------
    // Strings
    // -------------------------------------------------------------------------

    fn check_string(&mut self, field: &str, value: &Value, max: Option<usize>) -> Option<String> {
        let Value::String(s) = value else {
            self.fail(field, "string", format!("El campo {field} debe ser una cadena de texto."));
            return None;
        };
        if let Some(max) = max
            && s.chars().count() > max
        {
            self.fail(
                field,
                "max",
                format!("El campo {field} no puede tener más de {max} caracteres."),
            );
            return None;
        }
        Some(s.clone())
    }

    pub fn required_string(&mut self, field: &str, max: Option<usize>) -> String {
        self.require(field)
            .and_then(|v| self.check_string(field, v, max))
            .unwrap_or_default()
    }

    /// `nullable|string`: absent and null both give `None`.
    pub fn nullable_string(&mut self, field: &str, max: Option<usize>) -> Option<String> {
        let value = self.optional(field, true, "string", "debe ser una cadena de texto.")?;
        self.check_string(field, value, max)
    }

    /// `string` without `nullable`: null is an error.
    pub fn optional_string(&mut self, field: &str, max: Option<usize>) -> Option<String> {
        let value = self.optional(field, false, "string", "debe ser una cadena de texto.")?;
        self.check_string(field, value, max)
    }

    pub fn nullable_url(&mut self, field: &str) -> Option<String> {
        let value = self.nullable_string(field, None)?;
        if is_url(&value) {
            Some(value)
        } else {
            self.fail(field, "url", format!("El campo {field} debe ser una URL válida."));
            None
        }
    }

    // -------------------------------------------------------------------------
    // Enumerations
    // -------------------------------------------------------------------------

    fn check_in<T: FromStr>(&mut self, field: &str, value: &Value, allowed: &[&str]) -> Option<T> {
        let parsed = value
            .as_str()
            .filter(|s| allowed.contains(s))
            .and_then(|s| s.parse().ok());
        if parsed.is_none() {
            self.fail(field, "in", format!("El campo {field} seleccionado es inválido."));
        }
        parsed
    }

    pub fn required_in<T: FromStr + Default>(&mut self, field: &str, allowed: &[&str]) -> T {
        self.require(field)
            .and_then(|v| self.check_in(field, v, allowed))
            .unwrap_or_default()
    }

    pub fn optional_in<T: FromStr>(&mut self, field: &str, allowed: &[&str]) -> Option<T> {
        let value = self.optional(field, false, "in", "seleccionado es inválido.")?;
        self.check_in(field, value, allowed)
    }

    // -------------------------------------------------------------------------
    // Numbers
    // -------------------------------------------------------------------------

    fn check_decimal(&mut self, field: &str, value: &Value, min: Option<Decimal>) -> Option<Decimal> {
        let Some(number) = as_decimal(value) else {
            self.fail(field, "numeric", format!("El campo {field} debe ser un número."));
            return None;
        };
        if let Some(min) = min
            && number < min
        {
            self.fail(field, "min", format!("El campo {field} debe ser al menos {min}."));
            return None;
        }
        Some(number)
    }

    pub fn required_decimal(&mut self, field: &str, min: Option<Decimal>) -> Decimal {
        self.require(field)
            .and_then(|v| self.check_decimal(field, v, min))
            .unwrap_or_default()
    }

    pub fn nullable_decimal(&mut self, field: &str, min: Option<Decimal>) -> Option<Decimal> {
        let value = self.optional(field, true, "numeric", "debe ser un número.")?;
        self.check_decimal(field, value, min)
    }

    fn check_integer(&mut self, field: &str, value: &Value, min: Option<i64>, max: Option<i64>) -> Option<i64> {
        let Some(number) = as_integer(value) else {
            self.fail(field, "integer", format!("El campo {field} debe ser un número entero."));
            return None;
        };
        if let Some(min) = min
            && number < min
        {
            self.fail(field, "min", format!("El campo {field} debe ser al menos {min}."));
            return None;
        }
        if let Some(max) = max
            && number > max
        {
            self.fail(field, "max", format!("El campo {field} no puede ser mayor que {max}."));
            return None;
        }
        Some(number)
    }

    pub fn required_integer(&mut self, field: &str, min: Option<i64>, max: Option<i64>) -> i64 {
        self.require(field)
            .and_then(|v| self.check_integer(field, v, min, max))
            .unwrap_or_default()
    }

    pub fn optional_integer(&mut self, field: &str, min: Option<i64>, max: Option<i64>) -> Option<i64> {
        let value = self.optional(field, false, "integer", "debe ser un número entero.")?;
        self.check_integer(field, value, min, max)
    }

    // -------------------------------------------------------------------------
    // Booleans, dates and times
    // -------------------------------------------------------------------------

    /// Accepts `true`, `false`, `0`, `1`, `"0"` and `"1"`.
    pub fn optional_boolean(&mut self, field: &str) -> Option<bool> {
        let value = self.optional(field, false, "boolean", "debe ser verdadero o falso.")?;
        let parsed = match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            },
            Value::String(s) => match s.as_str() {
                "0" => Some(false),
                "1" => Some(true),
                _ => None,
            },
            _ => None,
        };
        if parsed.is_none() {
            self.fail(field, "boolean", format!("El campo {field} debe ser verdadero o falso."));
        }
        parsed
    }

    /// `required|date` in `YYYY-MM-DD`, optionally `after_or_equal` a day.
    pub fn required_date(&mut self, field: &str, not_before: Option<NaiveDate>) -> NaiveDate {
        let Some(value) = self.require(field) else {
            return NaiveDate::default();
        };
        let Some(date) = value
            .as_str()
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
        else {
            self.fail(field, "date", format!("El campo {field} no es una fecha válida."));
            return NaiveDate::default();
        };
        if let Some(floor) = not_before
            && date < floor
        {
            self.fail(
                field,
                "after_or_equal",
                format!("El campo {field} debe ser una fecha posterior o igual a hoy."),
            );
        }
        date
    }

    /// `required|date_format:H:i`.
    pub fn required_time(&mut self, field: &str) -> NaiveTime {
        let Some(value) = self.require(field) else {
            return NaiveTime::default();
        };
        match value.as_str().and_then(parse_hour_minute) {
            Some(time) => time,
            None => {
                self.fail(
                    field,
                    "date_format",
                    format!("El campo {field} no coincide con el formato H:i."),
                );
                NaiveTime::default()
            }
        }
    }
}

/// Strict `HH:MM`.
fn parse_hour_minute(s: &str) -> Option<NaiveTime> {
    let (h, m) = s.split_once(':')?;
    if h.len() != 2 || m.len() != 2 {
        return None;
    }
    NaiveTime::from_hms_opt(h.parse().ok()?, m.parse().ok()?, 0)
}

fn as_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => {
            let s = s.trim();
            let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            s.parse().ok()
        }
        _ => None,
    }
}

/// `http(s)://host[...]` with no whitespace.
fn is_url(s: &str) -> bool {
    let Some(rest) = s
        .strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"))
    else {
        return false;
    };
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    !host.is_empty() && !s.chars().any(char::is_whitespace)
}

/// Parse a route id. Non-numeric and zero ids match no record.
pub fn parse_id(raw: &str) -> Option<u64> {
    raw.parse::<u64>().ok().filter(|id| *id > 0)
}
