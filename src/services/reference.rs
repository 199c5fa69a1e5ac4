use chrono::Utc;

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const SUFFIX_LEN: u32 = 3;
const MAX_REFERENCE_LEN: usize = 64;
pub const MAX_PREFIX_LEN: usize = 16;

/// Human-readable booking reference: `{prefix}-{millis in base 36}-{3 random base-36 chars}`.
/// Uniqueness is enforced by the store, not here.
pub fn generate(prefix: &str) -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let suffix = rand::random::<u64>() % 36u64.pow(SUFFIX_LEN);
    format_reference(prefix, millis, suffix)
}

pub fn format_reference(prefix: &str, millis: u64, suffix: u64) -> String {
    format!(
        "{prefix}-{}-{:0>width$}",
        to_base36(millis),
        to_base36(suffix),
        width = SUFFIX_LEN as usize
    )
}

pub fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }

    let mut digits = vec![];
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// Prefixes are upper-case ASCII letters and digits so every generated
/// reference passes `is_well_formed`.
pub fn is_valid_prefix(prefix: &str) -> bool {
    !prefix.is_empty()
        && prefix.len() <= MAX_PREFIX_LEN
        && prefix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
}

/// Cheap shape check before a reference from a URL is sent to the store.
pub fn is_well_formed(reference: &str) -> bool {
    !reference.is_empty()
        && reference.len() <= MAX_REFERENCE_LEN
        && reference
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
}
