use crate::patterns::MatchesGlob;
use crate::scanner::DocumentMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
  Present,
  Absent,
  /// The matcher cannot confidently evaluate this selector; it must be kept.
  Unknown,
}

/// Split a selector list on top-level commas, ignoring commas inside
/// strings, parens and attribute brackets.
pub fn split_selector_list(raw: &str) -> Vec<&str> {
  let bytes = raw.as_bytes();
  let mut parts: Vec<&str> = vec![];
  let mut depth = 0usize;
  let mut quote: Option<u8> = None;
  let mut start = 0;
  for (index, &byte) in bytes.iter().enumerate() {
    if let Some(q) = quote {
      if byte == q {
        quote = None;
      }
      continue;
    }
    match byte {
      b'"' | b'\'' => quote = Some(byte),
      b'(' | b'[' => depth += 1,
      b')' | b']' => depth = depth.saturating_sub(1),
      b',' if depth == 0 => {
        parts.push(&raw[start..index]);
        start = index + 1;
      }
      _ => (),
    }
  }
  parts.push(&raw[start..]);
  parts
    .into_iter()
    .filter(|part| !part.trim().is_empty())
    .collect()
}

fn is_ident_byte(byte: u8) -> bool {
  byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' || byte > 127
}

/// Collect the `.class` / `#id` tokens a selector refers to. The second
/// return value flags constructs the matcher does not evaluate (attribute
/// selectors, CSS escapes).
pub fn referenced_names(selector: &str) -> (Vec<String>, bool) {
  let bytes = selector.as_bytes();
  let mut names: Vec<String> = vec![];
  let mut unknown = false;
  let mut index = 0;
  while index < bytes.len() {
    match bytes[index] {
      b'"' | b'\'' => {
        let quote = bytes[index];
        index += 1;
        while index < bytes.len() && bytes[index] != quote {
          index += 1;
        }
        index += 1;
      }
      b'(' => {
        // pseudo-class arguments are not evaluated
        let mut depth = 1usize;
        index += 1;
        while index < bytes.len() && depth > 0 {
          match bytes[index] {
            b'(' => depth += 1,
            b')' => depth -= 1,
            _ => (),
          }
          index += 1;
        }
      }
      b'[' => {
        unknown = true;
        while index < bytes.len() && bytes[index] != b']' {
          index += 1;
        }
        index += 1;
      }
      b'\\' => {
        unknown = true;
        index += 2;
      }
      b'.' | b'#' => {
        let prefix = bytes[index] as char;
        let start = index + 1;
        index = start;
        while index < bytes.len() && is_ident_byte(bytes[index]) {
          index += 1;
        }
        if index > start {
          let mut token = String::with_capacity(index - start + 1);
          token.push(prefix);
          token.push_str(&selector[start..index]);
          names.push(token);
        }
      }
      _ => index += 1,
    }
  }
  (names, unknown)
}

/// Judge a single selector against the scanned document. Pseudo suffixes are
/// stripped by the tokenizer (`.ghost:hover` is judged by `.ghost`); tag-only
/// and universal selectors come back `Unknown` since mail clients inject
/// wrapper markup the scan never saw.
pub fn selector_presence(selector: &str, map: &DocumentMap) -> Presence {
  let (names, unknown) = referenced_names(selector);
  if unknown {
    return Presence::Unknown;
  }
  if names.is_empty() {
    return Presence::Unknown;
  }
  for token in &names {
    let found = match token.as_bytes()[0] {
      b'.' => map.has_class(&token[1..]),
      _ => map.has_id(&token[1..]),
    };
    if !found {
      return Presence::Absent;
    }
  }
  Presence::Present
}

/// A selector is whitelisted when its full text or any referenced token
/// matches a glob entry.
pub fn is_whitelisted(selector: &str, whitelist: &[String]) -> bool {
  if whitelist.is_empty() {
    return false;
  }
  let trimmed = selector.trim();
  let (names, _) = referenced_names(selector);
  whitelist.iter().any(|entry| {
    trimmed.matches_glob(entry) || names.iter().any(|token| token.matches_glob(entry))
  })
}
