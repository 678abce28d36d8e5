mod comb;
mod crush;
mod css;
pub mod is_truthy;
mod options;
mod patterns;
mod report;
mod scanner;
mod selectors;

pub use comb::{comb, CombOutcome};
pub use crush::{crush, CrushOutcome};
pub use options::{CombOptions, CombParams, CrushOptions, CrushParams};
pub use report::MinificationReport;

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct MinifyOutcome {
  pub result: String,
  #[serde(rename = "combLog")]
  pub comb_log: MinificationReport,
  #[serde(rename = "crushLog")]
  pub crush_log: MinificationReport,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub warnings: Vec<String>,
}

/// Full minification pass the templating engine runs on rendered markup:
/// purge unused CSS first, then crush comments and whitespace.
pub fn minify(html: &str, comb_params: &CombParams, crush_params: &CrushParams) -> MinifyOutcome {
  let combed = comb(html, comb_params);
  let crushed = crush(&combed.result, crush_params);
  MinifyOutcome {
    result: crushed.result,
    comb_log: combed.log,
    crush_log: crushed.log,
    warnings: combed.warnings,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn rendered_email() -> String {
    concat!(
      "<html>\n",
      "  <head>\n",
      "    <style>\n",
      "      /* palette */\n",
      "      .unused { color: red; }\n",
      "      .used { color: blue; }\n",
      "    </style>\n",
      "  </head>\n",
      "  <body>\n",
      "    <!-- rendered by the engine -->\n",
      "    <div class=\"section\">\n",
      "      <div class=\"column\">\n",
      "        <div class=\"used\">Test</div>\n",
      "      </div>\n",
      "    </div>\n",
      "  </body>\n",
      "</html>\n"
    )
    .to_owned()
  }

  #[test]
  fn test_minify_without_errors() {
    let html = rendered_email();
    let outcome = minify(&html, &CombParams::default(), &CrushParams::all());
    assert!(!outcome.result.is_empty());
    assert!(outcome.result.len() < html.len());
    assert!(outcome.warnings.is_empty());
    assert!(!outcome.result.contains('\n'));
    assert!(!outcome.result.contains("<!--"));
  }

  #[test]
  fn test_minify_purges_css_when_enabled() {
    let html = rendered_email();
    let outcome = minify(&html, &CombParams::default(), &CrushParams::all());
    assert!(!outcome.result.contains("unused"));
    assert!(outcome.result.contains(".used"));
    assert!(outcome.result.contains("class=\"used\""));
  }

  #[test]
  fn test_logs_chain_across_stages() {
    let html = rendered_email();
    let outcome = minify(&html, &CombParams::default(), &CrushParams::all());
    assert_eq!(outcome.comb_log.original_length, html.len());
    assert_eq!(
      outcome.comb_log.cleaned_length,
      outcome.crush_log.original_length
    );
    assert_eq!(outcome.crush_log.cleaned_length, outcome.result.len());
  }
}
