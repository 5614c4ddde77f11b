//! Integer arithmetic primitives.
//!
//! Every proportional allocation in the engine is `floor(a * b / denom)`
//! where the numerator may exceed 64 bits. Intermediates are `u128`;
//! division truncates toward zero. No floating point.

/// `floor(a * b / denom)` with a 128-bit intermediate.
///
/// Panics on a zero denominator or a quotient that does not fit in `u64`;
/// both indicate a bug state upstream (callers guard their denominators and
/// proportional quotients are bounded by their numerators).
pub fn mul_div_floor(a: u64, b: u64, denom: u64) -> u64 {
    assert!(denom != 0, "mul_div_floor: division by zero ({a} * {b} / 0)");
    let quotient = u128::from(a) * u128::from(b) / u128::from(denom);
    u64::try_from(quotient).unwrap_or_else(|_| {
        panic!("mul_div_floor: {a} * {b} / {denom} does not fit in u64")
    })
}

/// Whether `portion` is at least `percent` integer percent of `total`.
///
/// `percent == 0` is trivially satisfied; a zero `portion` never satisfies
/// a positive `percent`. Otherwise the comparison is
/// `floor(100 * portion / total) >= percent`.
pub fn at_least_integer_percent(portion: u64, total: u64, percent: u32) -> bool {
    if percent == 0 {
        return true;
    }
    if portion == 0 {
        return false;
    }
    100u128 * u128::from(portion) / u128::from(total) >= u128::from(percent)
}
