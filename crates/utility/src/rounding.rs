/// Rounds to the nearest integer, breaking exact `.5` ties towards the
/// nearest even integer (banker's rounding), matching the `round_half_to_even`
/// rounding the simulation core uses for headway and loop-time calculations.
pub fn round_half_to_even(value: f64) -> i64 {
    let floor = value.floor();
    let diff = value - floor;
    let floor_i = floor as i64;

    if diff < 0.5 {
        floor_i
    } else if diff > 0.5 {
        floor_i + 1
    } else if floor_i % 2 == 0 {
        floor_i
    } else {
        floor_i + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_round_to_even() {
        assert_eq!(round_half_to_even(2.5), 2);
        assert_eq!(round_half_to_even(3.5), 4);
        assert_eq!(round_half_to_even(-2.5), -2);
    }

    #[test]
    fn non_ties_round_normally() {
        assert_eq!(round_half_to_even(2.4), 2);
        assert_eq!(round_half_to_even(2.6), 3);
    }
}
