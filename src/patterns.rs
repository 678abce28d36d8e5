use regex::{Error, Regex};

fn build_regex(pattern: &str, case_insensitive: bool) -> Result<Regex, Error> {
  let mut parts: Vec<&str> = vec![];
  if case_insensitive {
    parts.push("(?i)");
  }
  parts.push(pattern);
  let regex_str = parts.concat();
  Regex::new(&regex_str)
}

pub trait PatternMatch {
  fn pattern_match_opt(&self, pattern: &str, case_insensitive: bool) -> Option<bool>;

  fn pattern_match(&self, pattern: &str, case_insensitive: bool) -> bool;
}

impl PatternMatch for str {
  fn pattern_match_opt(&self, pattern: &str, case_insensitive: bool) -> Option<bool> {
    if let Ok(re) = build_regex(pattern, case_insensitive) {
      Some(re.is_match(self))
    } else {
      None
    }
  }

  fn pattern_match(&self, pattern: &str, case_insensitive: bool) -> bool {
    self.pattern_match_opt(pattern, case_insensitive).unwrap_or(false)
  }
}

/// Build an anchored regex from a glob-style whitelist entry, where `*`
/// matches any run of characters and everything else is literal.
pub fn glob_to_regex(glob: &str) -> String {
  let mut parts: Vec<String> = vec!["^".to_owned()];
  for (index, segment) in glob.split('*').enumerate() {
    if index > 0 {
      parts.push(".*".to_owned());
    }
    if !segment.is_empty() {
      parts.push(regex::escape(segment));
    }
  }
  parts.push("$".to_owned());
  parts.concat()
}

pub trait MatchesGlob {
  fn matches_glob(&self, glob: &str) -> bool;
}

impl MatchesGlob for str {
  fn matches_glob(&self, glob: &str) -> bool {
    if !glob.contains('*') {
      return self == glob;
    }
    self.pattern_match(&glob_to_regex(glob), false)
  }
}
