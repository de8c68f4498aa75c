//! Plain-text rendering of the allocation table.

use des_components::ResultRow;
use std::fmt::Write;

const HEADERS: [&str; 3] = [
    "Service Station",
    "Average Service Time (seconds)",
    "Required Servers",
];

/// Render rows as a `|`-separated table with a header line and a rule.
///
/// Every column is at least as wide as its header.
pub fn render(rows: &[ResultRow]) -> String {
    let cells: Vec<[String; 3]> = rows
        .iter()
        .map(|row| {
            [
                row.station.to_string(),
                format_secs(row.service_time_secs),
                row.servers.to_string(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for line in &cells {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &HEADERS.map(String::from), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("-+-"));
    for line in &cells {
        push_line(&mut out, line, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String; 3], widths: &[usize; 3]) {
    let _ = writeln!(
        out,
        "{:<w0$} | {:>w1$} | {:>w2$}",
        cells[0],
        cells[1],
        cells[2],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2],
    );
}

/// Whole seconds print without a fractional part
fn format_secs(secs: f64) -> String {
    if secs.fract() == 0.0 {
        format!("{secs:.0}")
    } else {
        secs.to_string()
    }
}
