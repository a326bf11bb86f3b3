//! CLI output formatting.
//!
//! Text by default. With `--json` every call emits one
//! `{"type": ..., "payload": ...}` object per line so a cycle can be piped
//! into other tools. `--quiet` hides informational text but never warnings,
//! errors, or JSON.

use std::fmt::Display;
use std::sync::{OnceLock, RwLock};

use rust_decimal::Decimal;
use serde_json::{json, Value};
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Flags shared by every subcommand.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    pub json: bool,
    pub quiet: bool,
}

impl OutputConfig {
    #[must_use]
    pub const fn new(json: bool, quiet: bool) -> Self {
        Self { json, quiet }
    }
}

static MODE: OnceLock<RwLock<OutputConfig>> = OnceLock::new();

fn mode() -> OutputConfig {
    let cell = MODE.get_or_init(|| RwLock::new(OutputConfig::default()));
    cell.read().map_or_else(|poisoned| *poisoned.into_inner(), |m| *m)
}

/// Informational output: JSON line, text, or nothing when quiet.
fn info(kind: &str, payload: Value, text: impl FnOnce()) {
    let mode = mode();
    if mode.json {
        println!("{}", json!({ "type": kind, "payload": payload }));
    } else if !mode.quiet {
        text();
    }
}

pub fn configure(config: OutputConfig) {
    let cell = MODE.get_or_init(|| RwLock::new(OutputConfig::default()));
    match cell.write() {
        Ok(mut current) => *current = config,
        Err(poisoned) => *poisoned.into_inner() = config,
    }
}

#[must_use]
pub fn is_json() -> bool {
    mode().json
}

pub fn header(version: &str) {
    info("header", json!({ "app": "yieldlord", "version": version }), || {
        println!("yieldlord {version}\n");
    });
}

pub fn section(title: &str) {
    info("section", json!({ "title": title }), || println!("{title}"));
}

/// Print `label: value`, aligned.
pub fn field(label: &str, value: impl Display) {
    let value = value.to_string();
    info("field", json!({ "label": label, "value": value }), || {
        println!("  {label:<14} {value}");
    });
}

pub fn success(message: &str) {
    info("success", json!({ "message": message }), || println!("  ✓ {message}"));
}

pub fn warning(message: &str) {
    if is_json() {
        println!("{}", json!({ "type": "warning", "payload": { "message": message } }));
    } else {
        println!("  ⚠ {message}");
    }
}

pub fn error(message: &str) {
    if is_json() {
        eprintln!("{}", json!({ "type": "error", "payload": { "message": message } }));
    } else {
        eprintln!("  × {message}");
    }
}

/// Structured result; JSON mode only.
pub fn json_output(payload: Value) {
    println!("{}", json!({ "type": "result", "payload": payload }));
}

pub fn render_table<T: Tabled>(rows: impl IntoIterator<Item = T>) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Print rows as a table. Text mode only.
pub fn table<T: Tabled>(rows: impl IntoIterator<Item = T>) {
    let mode = mode();
    if !mode.json && !mode.quiet {
        println!("{}", render_table(rows));
    }
}

/// Fractional rate as a percentage with two decimals (`0.0523` -> `5.23%`).
#[must_use]
pub fn percent(rate: Decimal) -> String {
    format!("{}%", (rate * Decimal::ONE_HUNDRED).round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Asset")]
        asset: &'static str,
        #[tabled(rename = "APY")]
        apy: String,
    }

    #[test]
    fn table_renders_headers_and_rows() {
        let rendered = render_table(vec![Row {
            asset: "fUSDC",
            apy: percent(dec!(0.052)),
        }]);
        assert!(rendered.contains("Asset"));
        assert!(rendered.contains("fUSDC"));
        assert!(rendered.contains("5.20%"));
    }

    #[test]
    fn percent_rounds_to_basis_points() {
        assert_eq!(percent(dec!(0.05234)), "5.23%");
        assert_eq!(percent(Decimal::ZERO), "0%");
    }
}
