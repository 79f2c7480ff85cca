/// Round to `places` decimals, halves away from zero.
pub fn round_half_away_from_zero(value: f64, places: u32) -> f64 {
    let ratio = 10f64.powi(places as i32);
    (value * ratio).round() / ratio
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_accumulated_float_noise_down() {
        assert_eq!(round_half_away_from_zero(0.02160000000000082, 2), 0.02);
    }

    #[test]
    fn halves_round_away_from_zero() {
        assert_eq!(round_half_away_from_zero(0.125, 2), 0.13);
        assert_eq!(round_half_away_from_zero(-0.125, 2), -0.13);
        assert_eq!(round_half_away_from_zero(2.5, 0), 3.0);
    }

    #[test]
    fn exact_values_are_unchanged() {
        assert_eq!(round_half_away_from_zero(0.2, 2), 0.2);
        assert_eq!(round_half_away_from_zero(0.0, 2), 0.0);
        assert_eq!(round_half_away_from_zero(19.0, 2), 19.0);
    }
}
