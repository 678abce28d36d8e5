use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// Loose caller-facing options for the crusher. Every field may be omitted;
/// unset fields leave the related content untouched.
#[skip_serializing_none]
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CrushParams {
  #[serde(rename = "removeHTMLComments")]
  pub remove_html_comments: Option<bool>,
  #[serde(rename = "removeCSSComments")]
  pub remove_css_comments: Option<bool>,
  #[serde(rename = "removeLineBreaks")]
  pub remove_line_breaks: Option<bool>,
  #[serde(rename = "removeIndentations")]
  pub remove_indentations: Option<bool>,
  #[serde(rename = "lineLengthLimit")]
  pub line_length_limit: Option<usize>,
}

impl CrushParams {
  pub fn normalized(&self) -> CrushOptions {
    CrushOptions {
      remove_html_comments: self.remove_html_comments.unwrap_or(false),
      remove_css_comments: self.remove_css_comments.unwrap_or(false),
      remove_line_breaks: self.remove_line_breaks.unwrap_or(false),
      remove_indentations: self.remove_indentations.unwrap_or(false),
      // zero means unlimited, as does leaving the field unset
      line_length_limit: self.line_length_limit.filter(|limit| *limit > 0),
    }
  }

  pub fn all() -> Self {
    CrushParams {
      remove_html_comments: Some(true),
      remove_css_comments: Some(true),
      remove_line_breaks: Some(true),
      remove_indentations: Some(true),
      line_length_limit: None,
    }
  }
}

/// Validated crusher options with defaults filled in.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct CrushOptions {
  #[serde(rename = "removeHTMLComments")]
  pub remove_html_comments: bool,
  #[serde(rename = "removeCSSComments")]
  pub remove_css_comments: bool,
  #[serde(rename = "removeLineBreaks")]
  pub remove_line_breaks: bool,
  #[serde(rename = "removeIndentations")]
  pub remove_indentations: bool,
  #[serde(rename = "lineLengthLimit", skip_serializing_if = "Option::is_none")]
  pub line_length_limit: Option<usize>,
}

impl CrushOptions {
  pub fn is_noop(&self) -> bool {
    !self.remove_html_comments
      && !self.remove_css_comments
      && !self.remove_line_breaks
      && !self.remove_indentations
  }
}

/// Loose caller-facing options for the selector purger.
#[skip_serializing_none]
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CombParams {
  pub whitelist: Option<Vec<String>>,
  pub backend: Option<Vec<String>>,
  pub uglify: Option<bool>,
  #[serde(rename = "removeHTMLComments")]
  pub remove_html_comments: Option<bool>,
  #[serde(rename = "removeCSSComments")]
  pub remove_css_comments: Option<bool>,
}

impl CombParams {
  pub fn normalized(&self) -> CombOptions {
    let clean_list = |entries: &Option<Vec<String>>| -> Vec<String> {
      entries
        .clone()
        .unwrap_or_default()
        .into_iter()
        .map(|entry| entry.trim().to_owned())
        .filter(|entry| !entry.is_empty())
        .collect()
    };
    CombOptions {
      whitelist: clean_list(&self.whitelist),
      backend: clean_list(&self.backend),
      uglify: self.uglify.unwrap_or(false),
      remove_html_comments: self.remove_html_comments.unwrap_or(false),
      remove_css_comments: self.remove_css_comments.unwrap_or(false),
    }
  }
}

/// Validated purger options, echoed back on the result as `applicableOpts`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CombOptions {
  pub whitelist: Vec<String>,
  pub backend: Vec<String>,
  pub uglify: bool,
  #[serde(rename = "removeHTMLComments")]
  pub remove_html_comments: bool,
  #[serde(rename = "removeCSSComments")]
  pub remove_css_comments: bool,
}
