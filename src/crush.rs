use serde::Serialize;
use std::time::Instant;

use crate::options::{CrushOptions, CrushParams};
use crate::report::MinificationReport;
use crate::scanner::{
  find_from, find_from_ci, is_hspace, is_linebreak, read_tag_name, starts_with_ci, VERBATIM_TAGS,
};

#[derive(Debug, Clone, Serialize)]
pub struct CrushOutcome {
  pub result: String,
  pub log: MinificationReport,
}

/// Strip comments, line breaks and indentation from an HTML string. Accepts
/// any text, never fails, and the output is never longer than the input.
pub fn crush(html: &str, params: &CrushParams) -> CrushOutcome {
  let started = Instant::now();
  let opts = params.normalized();
  let result = crush_with_options(html, &opts);
  tracing::debug!(
    original = html.len(),
    cleaned = result.len(),
    "crush pass complete"
  );
  CrushOutcome {
    log: MinificationReport::new(html.len(), result.len(), started.elapsed()),
    result,
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
  Text,
  Tag,
  Style,
}

/// Single-pass scanner shared with the purger's comment stripping. The
/// states keep comment-shaped bytes inside tags intact and stop attribute
/// values from fusing when line breaks go away.
pub(crate) fn crush_with_options(html: &str, opts: &CrushOptions) -> String {
  if opts.is_noop() {
    return html.to_owned();
  }
  let bytes = html.as_bytes();
  let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
  let mut state = State::Text;
  let mut tag_name = String::new();
  let mut closing = false;
  let mut quote: Option<u8> = None;
  let mut line_len = 0usize;
  let mut index = 0;
  while index < bytes.len() {
    let byte = bytes[index];
    match state {
      State::Text => {
        if byte == b'<' {
          if opts.remove_html_comments && bytes[index..].starts_with(b"<!--") {
            // TODO: spare `<!--[if mso]>` conditional comments once callers can flag them
            if let Some(end) = find_from(bytes, index + 4, b"-->") {
              index = end + 3;
              continue;
            }
            // unterminated comment: pass through verbatim
          }
          let (name, is_closing) = read_tag_name(bytes, index);
          let tag_like = !name.is_empty()
            || starts_with_ci(&bytes[index..], b"<!")
            || starts_with_ci(&bytes[index..], b"<?")
            || bytes[index..].starts_with(b"</");
          if tag_like {
            tag_name = name;
            closing = is_closing;
            quote = None;
            state = State::Tag;
          }
          out.push(byte);
          line_len += 1;
          index += 1;
          continue;
        }
        if opts.remove_css_comments && bytes[index..].starts_with(b"/*") {
          if let Some(end) = find_from(bytes, index + 2, b"*/") {
            index = end + 2;
            continue;
          }
        }
        if is_linebreak(byte) {
          index = collapse_newline(bytes, index, &mut out, &mut line_len, opts, false);
          continue;
        }
        out.push(byte);
        line_len += 1;
        index += 1;
      }
      State::Tag => {
        if let Some(q) = quote {
          if byte == q {
            quote = None;
          }
          out.push(byte);
          line_len += 1;
          index += 1;
          continue;
        }
        if byte == b'"' || byte == b'\'' {
          quote = Some(byte);
          out.push(byte);
          line_len += 1;
          index += 1;
          continue;
        }
        if is_linebreak(byte) {
          index = collapse_newline(bytes, index, &mut out, &mut line_len, opts, true);
          continue;
        }
        if byte == b'>' {
          let self_closed = index > 0 && bytes[index - 1] == b'/';
          out.push(byte);
          line_len += 1;
          index += 1;
          if closing || self_closed {
            state = State::Text;
          } else if tag_name == "style" {
            state = State::Style;
          } else if VERBATIM_TAGS.contains(&tag_name.as_str()) {
            index = copy_verbatim_content(bytes, index, &tag_name, &mut out, &mut line_len);
            state = State::Text;
          } else {
            state = State::Text;
          }
          continue;
        }
        out.push(byte);
        line_len += 1;
        index += 1;
      }
      State::Style => {
        if let Some(q) = quote {
          if byte == q && (index == 0 || bytes[index - 1] != b'\\') {
            quote = None;
          }
          out.push(byte);
          line_len += 1;
          index += 1;
          continue;
        }
        if byte == b'"' || byte == b'\'' {
          quote = Some(byte);
          out.push(byte);
          line_len += 1;
          index += 1;
          continue;
        }
        if opts.remove_css_comments && bytes[index..].starts_with(b"/*") {
          if let Some(end) = find_from(bytes, index + 2, b"*/") {
            index = end + 2;
            continue;
          }
        }
        if opts.remove_html_comments {
          // bare CSS-hiding markers, not comment spans
          if bytes[index..].starts_with(b"<!--") {
            index += 4;
            continue;
          }
          if bytes[index..].starts_with(b"-->") {
            index += 3;
            continue;
          }
        }
        if starts_with_ci(&bytes[index..], b"</style") {
          tag_name = "style".to_owned();
          closing = true;
          quote = None;
          state = State::Tag;
          out.push(byte);
          line_len += 1;
          index += 1;
          continue;
        }
        if is_linebreak(byte) {
          index = collapse_newline(bytes, index, &mut out, &mut line_len, opts, false);
          continue;
        }
        out.push(byte);
        line_len += 1;
        index += 1;
      }
    }
  }
  String::from_utf8(out).unwrap_or_else(|_| html.to_owned())
}

/// Handle a line break according to the active options. Returns the index to
/// resume scanning from. Inside a tag the break becomes a single space so
/// attributes stay separated; elsewhere it vanishes, re-emitting a newline
/// once the running line reaches `lineLengthLimit`.
fn collapse_newline(
  bytes: &[u8],
  from: usize,
  out: &mut Vec<u8>,
  line_len: &mut usize,
  opts: &CrushOptions,
  in_tag: bool,
) -> usize {
  if opts.remove_line_breaks {
    let mut next = from;
    while next < bytes.len() && is_linebreak(bytes[next]) {
      next += 1;
    }
    while next < bytes.len() && is_hspace(bytes[next]) {
      next += 1;
    }
    if in_tag {
      let needs_space = !out.last().map_or(true, |last| {
        is_hspace(*last) || *last == b'<' || *last == b'/'
      });
      if needs_space {
        out.push(b' ');
        *line_len += 1;
      }
    } else if let Some(limit) = opts.line_length_limit {
      if *line_len >= limit {
        out.push(b'\n');
        *line_len = 0;
      }
    }
    return next;
  }
  if opts.remove_indentations {
    let mut next = from;
    while next < bytes.len() && is_linebreak(bytes[next]) {
      out.push(bytes[next]);
      next += 1;
    }
    while next < bytes.len() && is_hspace(bytes[next]) {
      next += 1;
    }
    *line_len = 0;
    return next;
  }
  out.push(bytes[from]);
  *line_len = 0;
  from + 1
}

/// Copy `<pre>`/`<textarea>`/`<script>` content untouched, up to (not
/// including) the closing tag.
fn copy_verbatim_content(
  bytes: &[u8],
  from: usize,
  tag_name: &str,
  out: &mut Vec<u8>,
  line_len: &mut usize,
) -> usize {
  let close_pattern = ["</", tag_name].concat();
  let end = find_from_ci(bytes, from, close_pattern.as_bytes()).unwrap_or(bytes.len());
  let chunk = &bytes[from..end];
  out.extend_from_slice(chunk);
  *line_len = match chunk.iter().rposition(|b| *b == b'\n') {
    Some(pos) => chunk.len() - pos - 1,
    None => *line_len + chunk.len(),
  };
  end
}

#[cfg(test)]
mod tests {
  use super::*;

  fn comment_params() -> CrushParams {
    CrushParams {
      remove_html_comments: Some(true),
      ..Default::default()
    }
  }

  #[test]
  fn test_removes_html_comments() {
    let outcome = crush("<p>x</p><!-- c -->", &comment_params());
    assert_eq!(outcome.result, "<p>x</p>");
    assert_eq!(outcome.log.bytes_saved, 10);
  }

  #[test]
  fn test_comment_spanning_lines() {
    let outcome = crush("a<!-- one\ntwo -->b", &comment_params());
    assert_eq!(outcome.result, "ab");
  }

  #[test]
  fn test_unterminated_comment_is_kept() {
    let outcome = crush("<p>x</p><!-- oops", &comment_params());
    assert_eq!(outcome.result, "<p>x</p><!-- oops");
  }

  #[test]
  fn test_removes_css_comments_in_bare_css() {
    let params = CrushParams {
      remove_css_comments: Some(true),
      ..Default::default()
    };
    let outcome = crush("a{color:/*x*/red}", &params);
    assert_eq!(outcome.result, "a{color:red}");
  }

  #[test]
  fn test_removes_css_comments_in_style_block() {
    let params = CrushParams {
      remove_css_comments: Some(true),
      ..Default::default()
    };
    let outcome = crush("<style>a{/* note */color:red}</style>", &params);
    assert_eq!(outcome.result, "<style>a{color:red}</style>");
  }

  #[test]
  fn test_comment_bytes_inside_attributes_survive() {
    let params = CrushParams {
      remove_html_comments: Some(true),
      remove_css_comments: Some(true),
      ..Default::default()
    };
    let html = r#"<a title="not /* a */ comment" href="x?q=--%3E">y</a>"#;
    let outcome = crush(html, &params);
    assert_eq!(outcome.result, html);
  }

  #[test]
  fn test_collapses_line_breaks() {
    let params = CrushParams {
      remove_line_breaks: Some(true),
      ..Default::default()
    };
    let outcome = crush("a\n  b", &params);
    assert_eq!(outcome.result, "ab");
  }

  #[test]
  fn test_line_break_inside_tag_becomes_space() {
    let params = CrushParams {
      remove_line_breaks: Some(true),
      ..Default::default()
    };
    let outcome = crush("<div\n  class=\"x\">y</div>", &params);
    assert_eq!(outcome.result, "<div class=\"x\">y</div>");
  }

  #[test]
  fn test_remove_indentations_keeps_newlines() {
    let params = CrushParams {
      remove_indentations: Some(true),
      ..Default::default()
    };
    let outcome = crush("a\n  b\n\tc", &params);
    assert_eq!(outcome.result, "a\nb\nc");
  }

  #[test]
  fn test_line_length_limit_reinserts_breaks() {
    let params = CrushParams {
      remove_line_breaks: Some(true),
      line_length_limit: Some(8),
      ..Default::default()
    };
    let outcome = crush("aaaabbbb\ncccc\ndddd", &params);
    assert_eq!(outcome.result, "aaaabbbb\nccccdddd");
  }

  #[test]
  fn test_pre_content_is_verbatim() {
    let params = CrushParams {
      remove_line_breaks: Some(true),
      remove_html_comments: Some(true),
      ..Default::default()
    };
    let html = "<pre>one\n  two <!-- keep --></pre>\n<p>x</p>";
    let outcome = crush(html, &params);
    assert_eq!(outcome.result, "<pre>one\n  two <!-- keep --></pre><p>x</p>");
  }

  #[test]
  fn test_noop_returns_input() {
    let outcome = crush("a\n  b<!-- c -->", &CrushParams::default());
    assert_eq!(outcome.result, "a\n  b<!-- c -->");
    assert_eq!(outcome.log.bytes_saved, 0);
    assert_eq!(outcome.log.percentage_reduced_of_original, 0);
  }

  #[test]
  fn test_empty_input_is_defined() {
    let outcome = crush("", &CrushParams::all());
    assert_eq!(outcome.result, "");
    assert_eq!(outcome.log.percentage_reduced_of_original, 0);
  }

  #[test]
  fn test_idempotent_and_never_grows() {
    let html = "<div>\n  <p>text</p> <!-- note -->\n  <style>\n    .a{/*x*/color:red}\n  </style>\n</div>";
    let param_sets = [
      CrushParams::all(),
      comment_params(),
      CrushParams {
        remove_line_breaks: Some(true),
        line_length_limit: Some(12),
        ..Default::default()
      },
    ];
    for params in param_sets {
      let once = crush(html, &params);
      assert!(once.result.len() <= html.len());
      let twice = crush(&once.result, &params);
      assert_eq!(once.result, twice.result);
    }
  }

  #[test]
  fn test_report_matches_lengths() {
    let html = "<p>x</p>  <!-- gone -->";
    let outcome = crush(html, &comment_params());
    assert_eq!(outcome.log.original_length, html.len());
    assert_eq!(outcome.log.cleaned_length, outcome.result.len());
    assert_eq!(
      outcome.log.bytes_saved,
      html.len() - outcome.result.len()
    );
  }
}
