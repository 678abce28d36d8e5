use simple_string_patterns::*;

/// Lenient boolean reading of env flag strings such as `1`, `yes` or `off`.
pub trait IsTruthy where Self: SimpleMatch {
  fn is_truthy(&self) -> Option<bool>;

  fn smart_cast_bool(&self, default_value: bool) -> bool {
    self.is_truthy().unwrap_or(default_value)
  }
}

impl IsTruthy for str {
  fn is_truthy(&self) -> Option<bool> {
    let test_str = self.trim().to_lowercase();
    match test_str.as_str() {
      "0" | "false" | "no" | "off" | "n" | "f" | "" => Some(false),
      "1" | "true" | "yes" | "on" | "y" | "t" => Some(true),
      _ => if test_str.is_numeric() {
        if let Some(fnum) = test_str.to_first_number::<f64>() {
          Some(fnum > 0f64)
        } else {
          None
        }
      } else {
        None
      }
    }
  }
}
