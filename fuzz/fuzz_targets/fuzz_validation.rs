//! Fuzz testing for request validation.
//!
//! Feeds arbitrary bytes to the validator as a JSON body and as route ids.
//! Validation must never panic: every input ends in `Ok` or a list of
//! field errors.
//!
//! # Running the Fuzz Tests
//!
//! ```bash
//! # Install cargo-fuzz (requires nightly)
//! cargo +nightly install cargo-fuzz
//!
//! # Run the validation fuzz target
//! cargo +nightly fuzz run fuzz_validation
//!
//! # Run with a time limit (e.g., 60 seconds)
//! cargo +nightly fuzz run fuzz_validation -- -max_total_time=60
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use serde_json::Value;
use tejelanas_api::models::{FaqCategory, RecordStatus};
use tejelanas_api::validation::{MAX_NAME_LENGTH, Validator, parse_id};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    // Route ids
    let _ = parse_id(s);

    // Bodies: every rule against every field of an arbitrary object
    let Ok(Value::Object(body)) = serde_json::from_str::<Value>(s) else {
        return;
    };
    let mut v = Validator::new(&body);
    for field in body.keys() {
        let _ = v.required_string(field, Some(MAX_NAME_LENGTH));
        let _ = v.nullable_url(field);
        let _ = v.optional_in::<RecordStatus>(field, RecordStatus::VALUES);
        let _ = v.required_in::<FaqCategory>(field, FaqCategory::VALUES);
        let _ = v.nullable_decimal(field, None);
        let _ = v.optional_integer(field, Some(0), None);
        let _ = v.optional_boolean(field);
        let _ = v.required_date(field, None);
        let _ = v.required_time(field);
    }
    let _ = v.finish();
});
