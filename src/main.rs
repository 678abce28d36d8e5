use chrono::Local;
use serde::Serialize;
use serde_json::json;
use simple_string_patterns::*;
use std::time::Instant;

use mailcrush::is_truthy::IsTruthy;
use mailcrush::{minify, CombParams, CrushParams, MinifyOutcome};

const DEFAULT_ITERATIONS: usize = 100;

fn get_iterations() -> usize {
    if let Ok(num_ref) = dotenv::var("BENCH_ITERATIONS") {
        if let Some(num) = num_ref.to_first_number::<f64>() {
            if num >= 1f64 {
                num as usize
            } else {
                DEFAULT_ITERATIONS
            }
        } else {
            DEFAULT_ITERATIONS
        }
    } else {
        DEFAULT_ITERATIONS
    }
}

fn json_output_enabled() -> bool {
    if let Ok(flag_ref) = dotenv::var("BENCH_JSON") {
        flag_ref.smart_cast_bool(false)
    } else {
        false
    }
}

fn small_sample() -> String {
    concat!(
        "<html>\n",
        "  <body>\n",
        "    <div class=\"section\">\n",
        "      <div class=\"column\">\n",
        "        <div class=\"text\">Hello World</div>\n",
        "      </div>\n",
        "    </div>\n",
        "  </body>\n",
        "</html>\n"
    )
    .to_owned()
}

fn medium_sample() -> String {
    concat!(
        "<html>\n",
        "  <head>\n",
        "    <title>Sample Email</title>\n",
        "    <style>\n",
        "      /* layout */\n",
        "      .section { width: 100%; }\n",
        "      .column { display: inline-block; }\n",
        "      .button { background-color: #0066cc; }\n",
        "      .promo-banner { display: none; }\n",
        "    </style>\n",
        "  </head>\n",
        "  <body>\n",
        "    <!-- preheader -->\n",
        "    <div class=\"section\">\n",
        "      <div class=\"column\">\n",
        "        <img src=\"https://example.com/logo.png\" alt=\"Logo\" />\n",
        "        <div class=\"text\">Welcome to Our Newsletter</div>\n",
        "        <a class=\"button\" href=\"https://example.com\">Click Here</a>\n",
        "      </div>\n",
        "    </div>\n",
        "    <div class=\"section\">\n",
        "      <div class=\"column\">\n",
        "        <div class=\"text\">Lorem ipsum dolor sit amet, consectetur adipiscing elit.</div>\n",
        "      </div>\n",
        "    </div>\n",
        "  </body>\n",
        "</html>\n"
    )
    .to_owned()
}

fn large_sample() -> String {
    let mut sections = String::new();
    for index in 0..10 {
        sections.push_str(&format!(
            concat!(
                "    <div class=\"section\">\n",
                "      <div class=\"column\">\n",
                "        <div class=\"heading\">Section {num}</div>\n",
                "        <hr class=\"divider\" />\n",
                "        <!-- section {num} body -->\n",
                "        <div class=\"text\">\n",
                "          Lorem ipsum dolor sit amet, consectetur adipiscing elit.\n",
                "          Sed do eiusmod tempor incididunt ut labore et dolore magna aliqua.\n",
                "        </div>\n",
                "        <img src=\"https://example.com/image{num}.jpg\" alt=\"Image {num}\" />\n",
                "        <a class=\"button\" href=\"https://example.com/page{num}\">Learn More</a>\n",
                "      </div>\n",
                "    </div>\n"
            ),
            num = index + 1
        ));
    }
    format!(
        concat!(
            "<html>\n",
            "  <head>\n",
            "    <title>Large Email Template</title>\n",
            "    <style>\n",
            "      /* shared */\n",
            "      .section {{ width: 100%; }}\n",
            "      .column {{ display: inline-block; }}\n",
            "      .heading {{ font-size: 20px; font-weight: bold; }}\n",
            "      .divider {{ border-color: #cccccc; }}\n",
            "      .text {{ font-size: 14px; color: #333333; }}\n",
            "      .button {{ background-color: #0066cc; }}\n",
            "      .legacy-footer {{ display: none; }}\n",
            "      .legacy-header {{ display: none; }}\n",
            "      @media screen and (max-width: 600px) {{\n",
            "        .column {{ display: block; }}\n",
            "        .sidebar {{ display: none; }}\n",
            "      }}\n",
            "    </style>\n",
            "  </head>\n",
            "  <body>\n",
            "{sections}",
            "  </body>\n",
            "</html>\n"
        ),
        sections = sections
    )
}

struct BenchCase {
    label: &'static str,
    comb_params: CombParams,
    crush_params: CrushParams,
}

fn bench_cases() -> Vec<BenchCase> {
    vec![
        BenchCase {
            label: "comments only",
            comb_params: CombParams::default(),
            crush_params: CrushParams {
                remove_html_comments: Some(true),
                remove_css_comments: Some(true),
                ..Default::default()
            },
        },
        BenchCase {
            label: "full crush",
            comb_params: CombParams::default(),
            crush_params: CrushParams::all(),
        },
        BenchCase {
            label: "purge only",
            comb_params: CombParams {
                remove_html_comments: Some(true),
                remove_css_comments: Some(true),
                ..Default::default()
            },
            crush_params: CrushParams::default(),
        },
        BenchCase {
            label: "purge + crush",
            comb_params: CombParams {
                remove_html_comments: Some(true),
                remove_css_comments: Some(true),
                ..Default::default()
            },
            crush_params: CrushParams::all(),
        },
    ]
}

#[derive(Debug, Clone, Serialize)]
struct CaseResult {
    document: String,
    configuration: String,
    iterations: usize,
    #[serde(rename = "minMs")]
    min_ms: f64,
    #[serde(rename = "meanMs")]
    mean_ms: f64,
    #[serde(rename = "medianMs")]
    median_ms: f64,
    #[serde(rename = "maxMs")]
    max_ms: f64,
    #[serde(rename = "originalLength")]
    original_length: usize,
    #[serde(rename = "cleanedLength")]
    cleaned_length: usize,
    #[serde(rename = "bytesSaved")]
    bytes_saved: usize,
    #[serde(rename = "percentageReducedOfOriginal")]
    percentage: usize,
    warnings: usize,
}

fn run_case(doc_label: &str, html: &str, case: &BenchCase, iterations: usize) -> CaseResult {
    let mut times: Vec<f64> = Vec::with_capacity(iterations);
    let mut last: Option<MinifyOutcome> = None;
    for _ in 0..iterations {
        let started = Instant::now();
        let outcome = minify(html, &case.comb_params, &case.crush_params);
        times.push(started.elapsed().as_secs_f64() * 1000f64);
        last = Some(outcome);
    }
    times.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mean_ms = times.iter().sum::<f64>() / times.len() as f64;
    let median_ms = times[times.len() / 2];
    let (cleaned_length, warnings) = match &last {
        Some(outcome) => (outcome.result.len(), outcome.warnings.len()),
        None => (html.len(), 0),
    };
    let bytes_saved = html.len() - cleaned_length;
    let percentage = if html.len() > 0 {
        ((bytes_saved as f64 / html.len() as f64) * 100f64).round() as usize
    } else {
        0
    };
    tracing::debug!(doc = doc_label, case = case.label, mean_ms, "case complete");
    CaseResult {
        document: doc_label.to_owned(),
        configuration: case.label.to_owned(),
        iterations,
        min_ms: times.first().copied().unwrap_or(0f64),
        mean_ms,
        median_ms,
        max_ms: times.last().copied().unwrap_or(0f64),
        original_length: html.len(),
        cleaned_length,
        bytes_saved,
        percentage,
        warnings,
    }
}

fn print_table(results: &[CaseResult], iterations: usize) {
    println!(
        "minifier benchmark — {} — {} iterations per case",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        iterations
    );
    println!(
        "{:<8} {:<15} {:>9} {:>9} {:>9} {:>9} {:>8} {:>8} {:>6} {:>5}",
        "doc", "configuration", "min ms", "mean ms", "med ms", "max ms", "in B", "out B", "saved", "pct"
    );
    for row in results {
        println!(
            "{:<8} {:<15} {:>9.4} {:>9.4} {:>9.4} {:>9.4} {:>8} {:>8} {:>6} {:>4}%",
            row.document,
            row.configuration,
            row.min_ms,
            row.mean_ms,
            row.median_ms,
            row.max_ms,
            row.original_length,
            row.cleaned_length,
            row.bytes_saved,
            row.percentage
        );
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let iterations = get_iterations();
    let documents = [
        ("small", small_sample()),
        ("medium", medium_sample()),
        ("large", large_sample()),
    ];
    let mut results: Vec<CaseResult> = vec![];
    for (doc_label, html) in &documents {
        for case in bench_cases() {
            results.push(run_case(doc_label, html, &case, iterations));
        }
    }
    if json_output_enabled() {
        let report = json!({
            "generatedAt": Local::now().to_rfc3339(),
            "iterations": iterations,
            "results": results,
        });
        println!("{}", report);
    } else {
        print_table(&results, iterations);
    }
}
