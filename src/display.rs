//! Display and formatting utilities for flowplan.
//!
//! This module renders decoded reports into the plain-text results panel
//! shown by the command line tool.

use std::fmt;

use crate::decoder::{FlowMap, Report};

/// Rounds `value` to `places` decimals, without producing negative zero.
///
/// # Example
///
/// ```
/// use flowplan::display::round_to;
///
/// assert_eq!(round_to(2.345, 1), 2.3);
/// assert_eq!(round_to(-0.0001, 2).to_string(), "0");
/// ```
pub fn round_to(value: f64, places: u32) -> f64 {
    let scale = 10f64.powi(places as i32);
    let rounded = (value * scale).round() / scale;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Formats an amount with a fixed number of decimals.
///
/// # Example
///
/// ```
/// use flowplan::display::format_amount;
///
/// assert_eq!(format_amount(12.0, 2), "12.00");
/// assert_eq!(format_amount(0.004, 2), "0.00");
/// assert_eq!(format_amount(1234.56, 1), "1234.6");
/// ```
pub fn format_amount(value: f64, places: u32) -> String {
    format!("{:.*}", places as usize, round_to(value, places))
}

const RULE: &str = "----------------------------------------------------------------";

fn section(f: &mut fmt::Formatter<'_>, title: &str, flows: &FlowMap) -> fmt::Result {
    writeln!(f, "[{}]", title)?;
    writeln!(f, "{}", RULE)?;
    if flows.is_empty() {
        writeln!(f, "  (none)")?;
    }
    for (name, amount) in flows {
        writeln!(f, "  {}: {}", name, format_amount(*amount, 2))?;
    }
    writeln!(f)
}

/// The text results panel of a report.
///
/// Flow sections list entries alphabetically with two decimals; the power
/// and cost summary uses one decimal. A report that was not solved to
/// optimality renders as its status line only.
pub struct ReportPanel<'a>(pub &'a Report);

impl fmt::Display for ReportPanel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(f, "Status: {}", report.status)?;
        if !report.is_optimal() {
            return Ok(());
        }
        writeln!(f)?;

        section(f, "ITEMS INPUT", &report.items_input)?;
        section(f, "ITEMS OUTPUT", &report.items_output)?;
        section(f, "RESOURCES NEEDED", &report.resources_needed)?;
        section(f, "ITEMS NEEDED", &report.items_needed)?;
        section(f, "RECIPES USED", &report.recipes_used)?;

        let a = &report.aggregates;
        let summary = [
            ("Power Produced", report.power_produced),
            ("Power Used", a.power_use),
            ("Items", a.item_use),
            ("Buildings", a.buildings),
            ("Resources", a.resources),
            ("Buildings*", a.buildings_scaled),
            ("Resources*", a.resources_scaled),
            ("Sink Points", a.sink_points),
        ];
        writeln!(f, "[SUMMARY]")?;
        writeln!(f, "{}", RULE)?;
        for (label, value) in summary {
            writeln!(f, "  {:<16}{}", format!("{}:", label), format_amount(value, 1))?;
        }
        Ok(())
    }
}

/// Renders a report as the text results panel.
///
/// # Arguments
///
/// * `report` - A decoded report, optimal or not
///
/// # Returns
///
/// The panel text, ending with a newline.
pub fn render_report(report: &Report) -> String {
    ReportPanel(report).to_string()
}

/// Prints a report to stdout.
pub fn display_report(report: &Report) {
    println!();
    println!("+================================================================+");
    println!("|                PRODUCTION OPTIMIZATION RESULTS                 |");
    println!("+================================================================+");
    println!();
    print!("{}", render_report(report));
    println!();
}

/// Prints the per-item production breakdown of a report.
pub fn display_flows(report: &Report) {
    if report.products_map.is_empty() {
        return;
    }
    println!("[PRODUCTION BREAKDOWN]");
    println!("{}", RULE);
    for (item, producers) in &report.products_map {
        println!("  {}", item);
        for (recipe, rate) in producers {
            println!("    <- {:<40} {:>12}", recipe, format_amount(*rate, 2));
        }
    }
    println!();
}
