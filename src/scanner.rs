use std::collections::HashSet;

/// Elements whose raw content is never rewritten by the crusher.
pub const VERBATIM_TAGS: [&'static str; 3] = ["pre", "textarea", "script"];

pub fn is_hspace(byte: u8) -> bool {
  byte == b' ' || byte == b'\t'
}

pub fn is_linebreak(byte: u8) -> bool {
  byte == b'\n' || byte == b'\r'
}

pub fn starts_with_ci(haystack: &[u8], needle: &[u8]) -> bool {
  haystack.len() >= needle.len()
    && haystack
      .iter()
      .zip(needle.iter())
      .all(|(a, b)| a.eq_ignore_ascii_case(b))
}

pub fn find_from(haystack: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
  if needle.is_empty() || from >= haystack.len() {
    return None;
  }
  (from..haystack.len()).find(|&index| haystack[index..].starts_with(needle))
}

pub fn find_from_ci(haystack: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
  if needle.is_empty() || from >= haystack.len() {
    return None;
  }
  (from..haystack.len()).find(|&index| starts_with_ci(&haystack[index..], needle))
}

fn is_name_byte(byte: u8) -> bool {
  byte.is_ascii_alphanumeric() || byte == b'-'
}

/// Read the element name after a `<`, returning the lowercased name and
/// whether the tag is a closing one. A non-tag `<` yields an empty name.
pub fn read_tag_name(bytes: &[u8], lt_index: usize) -> (String, bool) {
  let mut index = lt_index + 1;
  let closing = index < bytes.len() && bytes[index] == b'/';
  if closing {
    index += 1;
  }
  let start = index;
  if index >= bytes.len() || !bytes[index].is_ascii_alphabetic() {
    return (String::new(), closing);
  }
  while index < bytes.len() && is_name_byte(bytes[index]) {
    index += 1;
  }
  let name = String::from_utf8_lossy(&bytes[start..index]).to_lowercase();
  (name, closing)
}

/// Everything the purger needs to know about a document: which class and id
/// tokens appear anywhere in the markup, and where the inline style blocks
/// sit (byte spans of their content).
#[derive(Debug, Default, Clone)]
pub struct DocumentMap {
  pub classes: HashSet<String>,
  pub ids: HashSet<String>,
  pub style_spans: Vec<(usize, usize)>,
}

impl DocumentMap {
  pub fn has_class(&self, name: &str) -> bool {
    self.classes.contains(name)
  }

  pub fn has_id(&self, name: &str) -> bool {
    self.ids.contains(name)
  }
}

fn has_backend_marker(token: &str, backend: &[String]) -> bool {
  backend.iter().any(|marker| token.contains(marker.as_str()))
}

fn insert_tokens(set: &mut HashSet<String>, value: &str, backend: &[String]) {
  for token in value.split_whitespace() {
    // templating placeholders are not literal names
    if !has_backend_marker(token, backend) {
      set.insert(token.to_owned());
    }
  }
}

/// One pass over the markup collecting present class/id tokens and style
/// spans. Comment interiors are not skipped wholesale: conditional comments
/// render in some mail clients, so the markup between their markers still
/// counts as used. Script bodies are skipped.
pub fn scan_document(html: &str, backend: &[String]) -> DocumentMap {
  let bytes = html.as_bytes();
  let mut map = DocumentMap::default();
  let mut index = 0;
  while index < bytes.len() {
    if bytes[index] != b'<' {
      index += 1;
      continue;
    }
    // `<!--[if mso]>` and doctype-style declarations end at the next `>`,
    // leaving any markup between conditional markers visible to the scan
    if starts_with_ci(&bytes[index..], b"<!") || starts_with_ci(&bytes[index..], b"<?") {
      index = match find_from(bytes, index + 2, b">") {
        Some(gt) => gt + 1,
        None => bytes.len(),
      };
      continue;
    }
    let (name, closing) = read_tag_name(bytes, index);
    if name.is_empty() {
      index += 1;
      continue;
    }
    if closing {
      index = match find_from(bytes, index + 2, b">") {
        Some(gt) => gt + 1,
        None => bytes.len(),
      };
      continue;
    }
    let (tag_end, self_closed) = scan_tag_attributes(bytes, index + 1 + name.len(), &mut map, backend);
    index = tag_end;
    if self_closed {
      continue;
    }
    if name == "style" {
      let close = find_from_ci(bytes, index, b"</style");
      let content_end = close.unwrap_or(bytes.len());
      map.style_spans.push((index, content_end));
      index = content_end;
    } else if name == "script" {
      let close = find_from_ci(bytes, index, b"</script");
      index = close.unwrap_or(bytes.len());
    }
  }
  map
}

/// Walk attribute pairs until the closing `>`. Returns the index just past
/// the tag and whether it was self-closing.
fn scan_tag_attributes(
  bytes: &[u8],
  from: usize,
  map: &mut DocumentMap,
  backend: &[String],
) -> (usize, bool) {
  let mut index = from;
  let mut self_closed = false;
  while index < bytes.len() {
    let byte = bytes[index];
    if byte == b'>' {
      return (index + 1, self_closed);
    }
    if byte.is_ascii_whitespace() {
      index += 1;
      continue;
    }
    if byte == b'/' {
      self_closed = true;
      index += 1;
      continue;
    }
    self_closed = false;
    // attribute name
    let name_start = index;
    while index < bytes.len()
      && !bytes[index].is_ascii_whitespace()
      && bytes[index] != b'='
      && bytes[index] != b'>'
      && bytes[index] != b'/'
    {
      index += 1;
    }
    let attr_name = String::from_utf8_lossy(&bytes[name_start..index]).to_lowercase();
    while index < bytes.len() && bytes[index].is_ascii_whitespace() {
      index += 1;
    }
    if index >= bytes.len() || bytes[index] != b'=' {
      continue;
    }
    index += 1;
    while index < bytes.len() && bytes[index].is_ascii_whitespace() {
      index += 1;
    }
    if index >= bytes.len() {
      break;
    }
    let value_start;
    let value_end;
    if bytes[index] == b'"' || bytes[index] == b'\'' {
      let quote = bytes[index];
      value_start = index + 1;
      value_end = find_from(bytes, value_start, &[quote]).unwrap_or(bytes.len());
      index = (value_end + 1).min(bytes.len());
    } else {
      value_start = index;
      while index < bytes.len() && !bytes[index].is_ascii_whitespace() && bytes[index] != b'>' {
        index += 1;
      }
      value_end = index;
    }
    let value = String::from_utf8_lossy(&bytes[value_start..value_end]).to_string();
    match attr_name.as_str() {
      "class" => insert_tokens(&mut map.classes, &value, backend),
      "id" => insert_tokens(&mut map.ids, &value, backend),
      _ => (),
    }
  }
  (bytes.len(), self_closed)
}
