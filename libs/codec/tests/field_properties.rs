use cnab_codec::{int, money};
use proptest::prelude::*;

proptest! {
    /// Any zero-padded, fixed-width digit string round-trips through `int`
    /// without error and without leading-zero truncation surprises.
    #[test]
    fn int_of_zero_padded_digits_never_errors(n in 0i64..1_000_000_000) {
        let raw = format!("{n:013}");
        prop_assert_eq!(int(&raw, 0, raw.len()).unwrap(), n);
    }

    /// Money is always `int / 10^scale`, exactly — never a float rounding
    /// artifact, regardless of the magnitude fed in.
    #[test]
    fn money_is_exact_for_any_cents_value(cents in 0i64..1_000_000_000_000) {
        let raw = format!("{cents:015}");
        let decimal = money(&raw, 0, raw.len(), 2).unwrap();
        prop_assert_eq!(decimal * rust_decimal::Decimal::from(100), rust_decimal::Decimal::from(cents));
    }
}
