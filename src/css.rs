use crate::scanner::find_from;

/// At-rules whose bodies hold ordinary rules and may be purged recursively.
const NESTED_AT_KEYWORDS: [&'static str; 2] = ["media", "supports"];

#[derive(Debug, Clone, PartialEq)]
pub enum CssNode {
  /// Whitespace between rules, or anything that failed to parse and must
  /// pass through byte-for-byte.
  Raw(String),
  /// A `/* ... */` span, delimiters included.
  Comment(String),
  /// `<!--` / `-->` CSS-hiding markers left behind by old email templates.
  HidingMarker(String),
  /// `@import ...;`-style statement, terminator included.
  AtStatement(String),
  /// At-rule whose body is opaque to the purger (`@font-face`, `@keyframes`).
  AtRaw { prelude: String, body: String },
  /// `@media`/`@supports` block; children are purged like top-level rules.
  AtNested { prelude: String, children: Vec<CssNode> },
  /// Selector list plus declaration block (braces included in `body`).
  Rule { selectors: String, body: String },
}

/// Tokenize a stylesheet into rule-level nodes. Never fails: anything
/// malformed is reported through `warnings` and carried as `Raw` so the
/// caller can emit it untouched.
pub fn parse_css(css: &str, warnings: &mut Vec<String>) -> Vec<CssNode> {
  let bytes = css.as_bytes();
  let mut nodes: Vec<CssNode> = vec![];
  let mut index = 0;
  while index < bytes.len() {
    let byte = bytes[index];
    if byte.is_ascii_whitespace() {
      let start = index;
      while index < bytes.len() && bytes[index].is_ascii_whitespace() {
        index += 1;
      }
      nodes.push(CssNode::Raw(css[start..index].to_owned()));
      continue;
    }
    if bytes[index..].starts_with(b"/*") {
      match find_from(bytes, index + 2, b"*/") {
        Some(end) => {
          nodes.push(CssNode::Comment(css[index..end + 2].to_owned()));
          index = end + 2;
        }
        None => {
          warnings.push("unterminated CSS comment; block left unmodified".to_owned());
          nodes.push(CssNode::Raw(css[index..].to_owned()));
          index = bytes.len();
        }
      }
      continue;
    }
    if bytes[index..].starts_with(b"<!--") {
      nodes.push(CssNode::HidingMarker("<!--".to_owned()));
      index += 4;
      continue;
    }
    if bytes[index..].starts_with(b"-->") {
      nodes.push(CssNode::HidingMarker("-->".to_owned()));
      index += 3;
      continue;
    }
    if byte == b'@' {
      match parse_at_rule(css, index, warnings) {
        Some((node, next)) => {
          nodes.push(node);
          index = next;
        }
        None => {
          nodes.push(CssNode::Raw(css[index..].to_owned()));
          index = bytes.len();
        }
      }
      continue;
    }
    // selector text runs to the opening brace
    match scan_to_block(bytes, index) {
      Some(brace) => match match_block(bytes, brace) {
        Some(block_end) => {
          nodes.push(CssNode::Rule {
            selectors: css[index..brace].to_owned(),
            body: css[brace..block_end].to_owned(),
          });
          index = block_end;
        }
        None => {
          warnings.push("unbalanced braces in style rule; block left unmodified".to_owned());
          nodes.push(CssNode::Raw(css[index..].to_owned()));
          index = bytes.len();
        }
      },
      None => {
        // trailing text with no block, e.g. a stray semicolon
        nodes.push(CssNode::Raw(css[index..].to_owned()));
        index = bytes.len();
      }
    }
  }
  nodes
}

fn parse_at_rule(css: &str, from: usize, warnings: &mut Vec<String>) -> Option<(CssNode, usize)> {
  let bytes = css.as_bytes();
  let mut index = from + 1;
  while index < bytes.len() && bytes[index] != b'{' && bytes[index] != b';' {
    index = skip_string(bytes, index).unwrap_or(index + 1);
  }
  if index >= bytes.len() {
    return None;
  }
  if bytes[index] == b';' {
    return Some((CssNode::AtStatement(css[from..index + 1].to_owned()), index + 1));
  }
  let prelude = css[from..index].to_owned();
  let block_end = match match_block(bytes, index) {
    Some(end) => end,
    None => {
      warnings.push(format!(
        "unbalanced braces after `{}`; block left unmodified",
        prelude.trim()
      ));
      return None;
    }
  };
  let keyword = at_keyword(&prelude);
  let node = if NESTED_AT_KEYWORDS.contains(&keyword.as_str()) {
    let children = parse_css(&css[index + 1..block_end - 1], warnings);
    CssNode::AtNested { prelude, children }
  } else {
    CssNode::AtRaw {
      prelude,
      body: css[index..block_end].to_owned(),
    }
  };
  Some((node, block_end))
}

fn at_keyword(prelude: &str) -> String {
  prelude
    .trim_start_matches('@')
    .chars()
    .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '-')
    .collect::<String>()
    .to_lowercase()
}

/// Find the opening brace of the next declaration block, skipping strings,
/// parens and brackets in the selector text.
fn scan_to_block(bytes: &[u8], from: usize) -> Option<usize> {
  let mut index = from;
  while index < bytes.len() {
    match bytes[index] {
      b'{' => return Some(index),
      b'"' | b'\'' => index = skip_string(bytes, index).unwrap_or(bytes.len()),
      _ => index += 1,
    }
  }
  None
}

/// Given the index of a `{`, return the index just past its matching `}`,
/// ignoring braces inside strings and comments.
pub fn match_block(bytes: &[u8], brace: usize) -> Option<usize> {
  let mut depth = 0usize;
  let mut index = brace;
  while index < bytes.len() {
    match bytes[index] {
      b'{' => {
        depth += 1;
        index += 1;
      }
      b'}' => {
        depth -= 1;
        index += 1;
        if depth == 0 {
          return Some(index);
        }
      }
      b'"' | b'\'' => index = skip_string(bytes, index)?,
      b'/' if bytes[index..].starts_with(b"/*") => {
        index = find_from(bytes, index + 2, b"*/").map(|end| end + 2)?;
      }
      _ => index += 1,
    }
  }
  None
}

/// If `from` sits on a quote, return the index just past the closing quote.
fn skip_string(bytes: &[u8], from: usize) -> Option<usize> {
  let quote = bytes[from];
  if quote != b'"' && quote != b'\'' {
    return Some(from + 1);
  }
  let mut index = from + 1;
  while index < bytes.len() {
    if bytes[index] == b'\\' {
      index += 2;
    } else if bytes[index] == quote {
      return Some(index + 1);
    } else {
      index += 1;
    }
  }
  None
}

/// Remove `/* ... */` spans outside strings; anything unterminated is kept
/// verbatim.
pub fn strip_block_comments(text: &str) -> String {
  let bytes = text.as_bytes();
  let mut out = String::with_capacity(text.len());
  let mut segment_start = 0;
  let mut index = 0;
  while index < bytes.len() {
    if bytes[index..].starts_with(b"/*") {
      if let Some(end) = find_from(bytes, index + 2, b"*/") {
        out.push_str(&text[segment_start..index]);
        index = end + 2;
        segment_start = index;
      } else {
        index = bytes.len();
      }
      continue;
    }
    if bytes[index] == b'"' || bytes[index] == b'\'' {
      index = skip_string(bytes, index).unwrap_or(bytes.len());
      continue;
    }
    index += 1;
  }
  out.push_str(&text[segment_start..]);
  out
}
