use {super::*, primitive_types::U256};

/// Difficulty base unit: targets are expressed relative to 2^48.
pub const BASE_TARGET_BITS: u32 = 48;

/// One vardiff retarget step in the exponent domain, ln(2).
pub const LOG_STEP: f64 = 0.693147181;

pub fn base_target() -> U256 {
    U256::one() << BASE_TARGET_BITS
}

/// Integer share target for a worker mining at `basediff`.
pub fn target_from_basediff(basediff: f64) -> U256 {
    assert!(
        basediff.is_finite() && basediff > 0.0,
        "basediff must be finite and > 0"
    );

    U256::from((basediff * (1u64 << BASE_TARGET_BITS) as f64) as u128)
}

/// Human-readable difficulty ratio of a scored hash value. Reporting
/// only; never part of an accept/reject decision.
pub fn ratio_to_f64(hash_int: U256) -> f64 {
    to_f64(hash_int) / (1u64 << BASE_TARGET_BITS) as f64
}

fn to_f64(value: U256) -> f64 {
    value
        .0
        .iter()
        .rev()
        .fold(0.0, |acc, limb| acc * 2f64.powi(64) + *limb as f64)
}
