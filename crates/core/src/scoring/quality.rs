//! Data quality scoring and status classification.
//!
//! Every domain computer grades its inputs the same way: the quality
//! score is the percentage of required fields populated, and the status
//! thresholds are shared across domains so "success" means the same
//! thing everywhere.

use super::model::CalculationStatus;

/// Quality at or above this is a full success.
pub const SUCCESS_THRESHOLD: i32 = 80;

/// Quality at or above this (but below success) is a partial result.
pub const PARTIAL_THRESHOLD: i32 = 50;

/// Percentage of required fields populated, rounded to the nearest
/// integer and clamped to 0-100.
pub fn data_quality_score(present: usize, required: usize) -> i32 {
    if required == 0 {
        return 0;
    }
    let pct = (present as f64 / required as f64) * 100.0;
    (pct.round() as i32).clamp(0, 100)
}

/// Classify a quality score into a calculation status.
pub fn status_for_quality(quality: i32) -> CalculationStatus {
    if quality >= SUCCESS_THRESHOLD {
        CalculationStatus::Success
    } else if quality >= PARTIAL_THRESHOLD {
        CalculationStatus::Partial
    } else {
        CalculationStatus::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eight_of_ten_is_eighty_and_success() {
        let quality = data_quality_score(8, 10);
        assert_eq!(quality, 80);
        assert_eq!(status_for_quality(quality), CalculationStatus::Success);
    }

    #[test]
    fn test_four_of_ten_is_forty_and_failed() {
        let quality = data_quality_score(4, 10);
        assert_eq!(quality, 40);
        assert_eq!(status_for_quality(quality), CalculationStatus::Failed);
    }

    #[test]
    fn test_partial_band_boundaries() {
        assert_eq!(status_for_quality(50), CalculationStatus::Partial);
        assert_eq!(status_for_quality(79), CalculationStatus::Partial);
        assert_eq!(status_for_quality(80), CalculationStatus::Success);
        assert_eq!(status_for_quality(49), CalculationStatus::Failed);
    }

    #[test]
    fn test_rounding_to_nearest_integer() {
        // 5/8 = 62.5% rounds to 63.
        assert_eq!(data_quality_score(5, 8), 63);
        // 1/3 = 33.33% rounds to 33.
        assert_eq!(data_quality_score(1, 3), 33);
    }

    #[test]
    fn test_zero_required_fields_is_zero_quality() {
        assert_eq!(data_quality_score(0, 0), 0);
        assert_eq!(status_for_quality(0), CalculationStatus::Failed);
    }
}
