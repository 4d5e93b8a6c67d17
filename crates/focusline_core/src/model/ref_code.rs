//! Human-readable item ref codes (`OBJ-7K2QD`).

use crate::model::item::ItemContext;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

/// Prefix used when no context is known.
pub const GENERIC_REF_PREFIX: &str = "ITM";
const SUFFIX_LEN: usize = 5;
const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

static REF_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{3}-[A-Z0-9]{5}$").expect("valid ref code regex"));

/// Generates `<prefix>-<suffix>` with a random uppercase suffix.
pub fn generate_ref_code(context: Option<ItemContext>) -> String {
    let prefix = context.map_or(GENERIC_REF_PREFIX, ItemContext::ref_prefix);
    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();
    format!("{prefix}-{suffix}")
}

pub fn is_valid_ref_code(value: &str) -> bool {
    REF_CODE_RE.is_match(value)
}
