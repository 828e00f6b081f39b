//! Safe-ish conversions between rust and sql types.

pub fn i64_to_u64(i: i64) -> Result<u64, String> {
    u64::try_from(i).map_err(|_| format!("{i} is negative and cannot be converted to u64"))
}

pub fn u64_to_i64(i: u64) -> Result<i64, String> {
    i64::try_from(i).map_err(|_| format!("{i} exceeds i64::MAX and cannot be converted to i64"))
}

/// Tasks store their order requirement as `"Y"`/`"N"`. Only `"N"` skips the order check.
#[must_use]
pub fn deserialize_check_order(flag: &str) -> bool {
    !flag.trim().eq_ignore_ascii_case("N")
}
