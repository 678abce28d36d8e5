use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Size-delta log attached to every transformation result. Immutable once
/// produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinificationReport {
  #[serde(rename = "timeTakenInMilliseconds")]
  pub time_taken_in_milliseconds: f64,
  #[serde(rename = "originalLength")]
  pub original_length: usize,
  #[serde(rename = "cleanedLength")]
  pub cleaned_length: usize,
  #[serde(rename = "bytesSaved")]
  pub bytes_saved: usize,
  #[serde(rename = "percentageReducedOfOriginal")]
  pub percentage_reduced_of_original: usize,
}

impl MinificationReport {
  pub fn new(original_length: usize, cleaned_length: usize, elapsed: Duration) -> Self {
    let bytes_saved = original_length.saturating_sub(cleaned_length);
    // empty input reports 0% rather than dividing by zero
    let percentage_reduced_of_original = if original_length > 0 {
      ((bytes_saved as f64 / original_length as f64) * 100f64).round() as usize
    } else {
      0
    };
    MinificationReport {
      time_taken_in_milliseconds: elapsed.as_secs_f64() * 1000f64,
      original_length,
      cleaned_length,
      bytes_saved,
      percentage_reduced_of_original,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_report_arithmetic() {
    let report = MinificationReport::new(200, 150, Duration::from_millis(2));
    assert_eq!(report.bytes_saved, 50);
    assert_eq!(report.percentage_reduced_of_original, 25);
  }

  #[test]
  fn test_report_rounds_percentage() {
    let report = MinificationReport::new(3, 2, Duration::ZERO);
    // 33.33% rounds down
    assert_eq!(report.percentage_reduced_of_original, 33);
    let report = MinificationReport::new(3, 1, Duration::ZERO);
    // 66.66% rounds up
    assert_eq!(report.percentage_reduced_of_original, 67);
  }

  #[test]
  fn test_empty_input_is_defined() {
    let report = MinificationReport::new(0, 0, Duration::ZERO);
    assert_eq!(report.bytes_saved, 0);
    assert_eq!(report.percentage_reduced_of_original, 0);
  }

  #[test]
  fn test_serialized_field_names() {
    let report = MinificationReport::new(10, 5, Duration::ZERO);
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["bytesSaved"], 5);
    assert_eq!(value["percentageReducedOfOriginal"], 50);
    assert_eq!(value["originalLength"], 10);
    assert_eq!(value["cleanedLength"], 5);
  }
}
