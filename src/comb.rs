use serde::Serialize;
use std::time::Instant;

use crate::crush::crush_with_options;
use crate::css::{parse_css, strip_block_comments, CssNode};
use crate::options::{CombOptions, CombParams, CrushOptions};
use crate::report::MinificationReport;
use crate::scanner::{scan_document, DocumentMap};
use crate::selectors::{is_whitelisted, selector_presence, split_selector_list, Presence};

#[derive(Debug, Clone, Serialize)]
pub struct CombOutcome {
  pub result: String,
  #[serde(rename = "applicableOpts")]
  pub applicable_opts: CombOptions,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub warnings: Vec<String>,
  pub log: MinificationReport,
}

/// Drop CSS rules whose selectors match nothing in the markup, then strip
/// comments per the flags. Malformed CSS never aborts the pass: the affected
/// block is kept verbatim and a warning recorded.
pub fn comb(html: &str, params: &CombParams) -> CombOutcome {
  let started = Instant::now();
  let opts = params.normalized();
  let mut warnings: Vec<String> = vec![];
  let map = scan_document(html, &opts.backend);
  // non-style chunks only need the comment states of the crusher
  let comment_opts = CrushOptions {
    remove_html_comments: opts.remove_html_comments,
    remove_css_comments: opts.remove_css_comments,
    remove_line_breaks: false,
    remove_indentations: false,
    line_length_limit: None,
  };
  let mut result = String::with_capacity(html.len());
  let mut cursor = 0;
  for (start, end) in &map.style_spans {
    result.push_str(&crush_with_options(&html[cursor..*start], &comment_opts));
    result.push_str(&rewrite_stylesheet(&html[*start..*end], &map, &opts, &mut warnings));
    cursor = *end;
  }
  result.push_str(&crush_with_options(&html[cursor..], &comment_opts));
  for warning in &warnings {
    tracing::warn!("{}", warning);
  }
  CombOutcome {
    log: MinificationReport::new(html.len(), result.len(), started.elapsed()),
    result,
    applicable_opts: opts,
    warnings,
  }
}

fn rewrite_stylesheet(
  css: &str,
  map: &DocumentMap,
  opts: &CombOptions,
  warnings: &mut Vec<String>,
) -> String {
  let nodes = parse_css(css, warnings);
  let mut out = String::with_capacity(css.len());
  write_nodes(&nodes, map, opts, &mut out);
  out
}

fn write_nodes(nodes: &[CssNode], map: &DocumentMap, opts: &CombOptions, out: &mut String) {
  for node in nodes {
    match node {
      CssNode::Raw(text) => out.push_str(text),
      CssNode::Comment(text) => {
        if !opts.remove_css_comments {
          out.push_str(text);
        }
      }
      CssNode::HidingMarker(text) => {
        if !opts.remove_html_comments {
          out.push_str(text);
        }
      }
      CssNode::AtStatement(text) => out.push_str(text),
      CssNode::AtRaw { prelude, body } => {
        out.push_str(prelude);
        out.push_str(body);
      }
      CssNode::AtNested { prelude, children } => {
        let mut inner = String::new();
        write_nodes(children, map, opts, &mut inner);
        // an at-block purged down to whitespace goes away entirely
        if !inner.trim().is_empty() {
          out.push_str(prelude);
          out.push('{');
          out.push_str(&inner);
          out.push('}');
        }
      }
      CssNode::Rule { selectors, body } => {
        let list = split_selector_list(selectors);
        let total = list.len();
        let kept: Vec<&str> = list
          .into_iter()
          .filter(|selector| retain_selector(selector, map, opts))
          .collect();
        if kept.is_empty() {
          continue;
        }
        if kept.len() == total {
          out.push_str(selectors);
        } else {
          let trimmed: Vec<&str> = kept.iter().map(|selector| selector.trim()).collect();
          out.push_str(&trimmed.join(","));
        }
        if opts.remove_css_comments {
          out.push_str(&strip_block_comments(body));
        } else {
          out.push_str(body);
        }
      }
    }
  }
}

fn retain_selector(selector: &str, map: &DocumentMap, opts: &CombOptions) -> bool {
  match selector_presence(selector, map) {
    Presence::Present | Presence::Unknown => true,
    Presence::Absent => is_whitelisted(selector, &opts.whitelist),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const STYLED_PAGE: &str = concat!(
    "<html><head><style>",
    ".unused{color:red}.used{color:blue}",
    "</style></head>",
    "<body><div class=\"used\">Test</div></body></html>"
  );

  #[test]
  fn test_purges_unused_selectors() {
    let outcome = comb(STYLED_PAGE, &CombParams::default());
    assert!(!outcome.result.contains(".unused"));
    assert!(outcome.result.contains(".used{color:blue}"));
    assert!(outcome.result.contains("class=\"used\""));
    assert!(outcome.warnings.is_empty());
  }

  #[test]
  fn test_whitelist_keeps_unused_selectors() {
    let params = CombParams {
      whitelist: Some(vec![".unused".to_owned()]),
      ..Default::default()
    };
    let outcome = comb(STYLED_PAGE, &params);
    assert!(outcome.result.contains(".unused{color:red}"));
  }

  #[test]
  fn test_whitelist_glob() {
    let html = "<style>.module-x{color:red}.ghost{color:red}</style><p class=\"a\">x</p>";
    let params = CombParams {
      whitelist: Some(vec![".module-*".to_owned()]),
      ..Default::default()
    };
    let outcome = comb(html, &params);
    assert!(outcome.result.contains(".module-x"));
    assert!(!outcome.result.contains(".ghost"));
  }

  #[test]
  fn test_partial_purge_of_selector_list() {
    let html = "<style>.used,.ghost,.other{color:red}</style><p class=\"used\">x</p>";
    let outcome = comb(html, &CombParams::default());
    assert!(outcome.result.contains(".used{color:red}"));
    assert!(!outcome.result.contains(".ghost"));
    assert!(!outcome.result.contains(".other"));
  }

  #[test]
  fn test_rule_dropped_when_all_selectors_unmatched() {
    let html = "<style>.a,.b{color:red}</style><p>x</p>";
    let outcome = comb(html, &CombParams::default());
    assert!(!outcome.result.contains("color:red"));
    assert!(outcome.result.contains("<style></style>"));
  }

  #[test]
  fn test_conservative_selectors_are_kept() {
    let html = "<style>td{padding:0}[data-x]{color:red}.used:hover{color:red}</style><p class=\"used\">x</p>";
    let outcome = comb(html, &CombParams::default());
    assert!(outcome.result.contains("td{padding:0}"));
    assert!(outcome.result.contains("[data-x]{color:red}"));
    assert!(outcome.result.contains(".used:hover"));
  }

  #[test]
  fn test_purges_inside_media_blocks() {
    let html = "<style>@media screen{.ghost{color:red}}@media print{.used{color:red}}</style><p class=\"used\">x</p>";
    let outcome = comb(html, &CombParams::default());
    assert!(!outcome.result.contains("@media screen"));
    assert!(outcome.result.contains("@media print{.used{color:red}}"));
  }

  #[test]
  fn test_malformed_css_left_untouched_with_warning() {
    let html = "<style>.ok{color:red}.broken{color:blue</style><p class=\"ok\">x</p>";
    let outcome = comb(html, &CombParams::default());
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.result.contains(".ok{color:red}"));
    // the unparseable remainder passes through byte-for-byte
    assert!(outcome.result.contains(".broken{color:blue"));
  }

  #[test]
  fn test_comment_stripping_flags() {
    let html = "<!-- head --><style>/* css */.used{color:red}</style><p class=\"used\">x</p><!-- tail -->";
    let params = CombParams {
      remove_html_comments: Some(true),
      remove_css_comments: Some(true),
      ..Default::default()
    };
    let outcome = comb(html, &params);
    assert!(!outcome.result.contains("head"));
    assert!(!outcome.result.contains("tail"));
    assert!(!outcome.result.contains("css"));
    assert!(outcome.result.contains(".used{color:red}"));
  }

  #[test]
  fn test_applicable_opts_echo_normalized() {
    let params = CombParams {
      whitelist: Some(vec![".keep".to_owned()]),
      uglify: Some(true),
      ..Default::default()
    };
    let outcome = comb("<p>x</p>", &params);
    assert_eq!(outcome.applicable_opts.whitelist, vec![".keep".to_owned()]);
    assert!(outcome.applicable_opts.uglify);
    assert!(!outcome.applicable_opts.remove_html_comments);
    let value = serde_json::to_value(&outcome).unwrap();
    assert!(value["applicableOpts"]["removeCSSComments"].is_boolean());
  }

  #[test]
  fn test_backend_markers_protect_placeholders() {
    let html = "<style>.static{color:red}</style><div class=\"{{ dynamic }} static\">x</div>";
    let params = CombParams {
      backend: Some(vec!["{{".to_owned(), "}}".to_owned()]),
      ..Default::default()
    };
    let outcome = comb(html, &params);
    assert!(outcome.result.contains(".static"));
  }

  #[test]
  fn test_never_grows_and_pure() {
    let inputs = ["", "<p>x</p>", STYLED_PAGE, "not html at all /* x */"];
    for input in inputs {
      let first = comb(input, &CombParams::default());
      let second = comb(input, &CombParams::default());
      assert!(first.result.len() <= input.len());
      assert_eq!(first.result, second.result);
    }
  }
}
