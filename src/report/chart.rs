//! SVG chart rendering.
//!
//! Two fixed layouts: a grouped bar chart of per-year category totals
//! and a faceted scatter chart of library counts per source.

use crate::models::{CategoryOrder, LibraryTable, YearCategorySum};
use std::collections::HashMap;
use std::fmt::Write;

/// ColorBrewer Set2.
const PALETTE: [&str; 8] = [
    "#66c2a5", "#fc8d62", "#8da0cb", "#e78ac3", "#a6d854", "#ffd92f", "#e5c494", "#b3b3b3",
];

const FONT: &str = "font-family=\"sans-serif\"";

fn color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Escape text for use in SVG content and attributes.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Smallest 1/2/5 x 10^k value at or above `max` (at least 1).
pub fn nice_ceiling(max: u64) -> u64 {
    if max <= 1 {
        return 1;
    }
    let mut magnitude = 1u64;
    while let Some(next) = magnitude.checked_mul(10) {
        if next > max {
            break;
        }
        magnitude = next;
    }
    for step in [1, 2, 5, 10] {
        let candidate = magnitude.saturating_mul(step);
        if candidate >= max {
            return candidate;
        }
    }
    magnitude.saturating_mul(10)
}

/// Vertical axis with five gridlines from 0 to `top`.
struct YAxis {
    top: u64,
    y0: f64,
    height: f64,
}

impl YAxis {
    fn new(max: u64, y0: f64, height: f64) -> Self {
        Self {
            top: nice_ceiling(max),
            y0,
            height,
        }
    }

    fn y(&self, value: u64) -> f64 {
        self.y0 + self.height - (value as f64 / self.top as f64) * self.height
    }

    fn draw(&self, svg: &mut String, x0: f64, width: f64) {
        for i in 0..=4u64 {
            let value = (u128::from(self.top) * u128::from(i) / 4) as u64;
            let y = self.y(value);
            let _ = writeln!(
                svg,
                r##"<line x1="{x0:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="#dddddd"/>"##,
                x0 + width
            );
            let _ = writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" {FONT} font-size="11" text-anchor="end">{value}</text>"#,
                x0 - 6.0,
                y + 4.0
            );
        }
    }
}

fn open(svg: &mut String, width: u32, height: u32) {
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
}

fn title(svg: &mut String, x: f64, y: f64, size: u32, text: &str) {
    let _ = writeln!(
        svg,
        r#"<text x="{x:.1}" y="{y:.1}" {FONT} font-size="{size}" text-anchor="middle">{}</text>"#,
        escape(text)
    );
}

fn legend(svg: &mut String, x: f64, y: f64, heading: &str, labels: &[&str]) {
    let _ = writeln!(
        svg,
        r#"<text x="{x:.1}" y="{y:.1}" {FONT} font-size="13" font-weight="bold">{}</text>"#,
        escape(heading)
    );
    for (i, label) in labels.iter().enumerate() {
        let row_y = y + 20.0 + i as f64 * 20.0;
        let _ = writeln!(
            svg,
            r#"<rect x="{x:.1}" y="{:.1}" width="12" height="12" fill="{}"/>"#,
            row_y - 10.0,
            color(i)
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{row_y:.1}" {FONT} font-size="12">{}</text>"#,
            x + 18.0,
            escape(label)
        );
    }
}

/// Grouped bar chart: years on X, one bar per category in `order`.
pub fn grouped_bar_chart(summary: &[YearCategorySum], order: &CategoryOrder, heading: &str) -> String {
    const WIDTH: u32 = 960;
    const HEIGHT: u32 = 480;
    let (left, right, top, bottom) = (80.0, 220.0, 60.0, 60.0);
    let plot_w = WIDTH as f64 - left - right;
    let plot_h = HEIGHT as f64 - top - bottom;

    let mut years: Vec<i32> = summary.iter().map(|s| s.year).collect();
    years.sort_unstable();
    years.dedup();

    let values: HashMap<(i32, &str), u64> = summary
        .iter()
        .map(|s| ((s.year, s.category.as_str()), s.total_count))
        .collect();
    let max = summary.iter().map(|s| s.total_count).max().unwrap_or(0);
    let axis = YAxis::new(max, top, plot_h);

    let mut svg = String::new();
    open(&mut svg, WIDTH, HEIGHT);
    title(&mut svg, left + plot_w / 2.0, 30.0, 18, heading);
    axis.draw(&mut svg, left, plot_w);

    let group_w = plot_w / years.len().max(1) as f64;
    let bar_w = group_w * 0.8 / order.len().max(1) as f64;

    for (i, year) in years.iter().enumerate() {
        let group_x = left + i as f64 * group_w + group_w * 0.1;
        for (rank, category) in order.iter().enumerate() {
            let value = values.get(&(*year, category)).copied().unwrap_or(0);
            let y = axis.y(value);
            let _ = writeln!(
                svg,
                r#"<rect x="{:.1}" y="{y:.1}" width="{:.1}" height="{:.1}" fill="{}"><title>{} {}: {}</title></rect>"#,
                group_x + rank as f64 * bar_w,
                bar_w,
                top + plot_h - y,
                color(rank),
                escape(category),
                year,
                value
            );
        }
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" {FONT} font-size="12" text-anchor="middle">{year}</text>"#,
            left + (i as f64 + 0.5) * group_w,
            top + plot_h + 20.0
        );
    }

    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" {FONT} font-size="14" text-anchor="middle">Year</text>"#,
        left + plot_w / 2.0,
        HEIGHT as f64 - 15.0
    );
    let _ = writeln!(
        svg,
        r#"<text x="20" y="{:.1}" {FONT} font-size="14" text-anchor="middle" transform="rotate(-90 20 {:.1})">Number of Datasets</text>"#,
        top + plot_h / 2.0,
        top + plot_h / 2.0
    );

    let labels: Vec<&str> = order.iter().collect();
    legend(&mut svg, left + plot_w + 30.0, top + 10.0, "Dataset Type", &labels);

    svg.push_str("</svg>\n");
    svg
}

/// Scatter chart faceted by source, colored by species.
///
/// Each facet has its own Y scale.
pub fn faceted_scatter(table: &LibraryTable) -> String {
    let (facet_w, facet_h) = (300.0, 280.0);
    let (left, gap, top, bottom, legend_w) = (70.0, 60.0, 60.0, 60.0, 200.0);

    let sources = table.sources();
    let species = table.species();
    let facets = sources.len().max(1);

    let width = (left + facets as f64 * (facet_w + gap) + legend_w) as u32;
    let height = (top + facet_h + bottom) as u32;

    let (min_year, max_year) = table
        .records()
        .iter()
        .fold(None, |acc: Option<(i32, i32)>, r| match acc {
            None => Some((r.year, r.year)),
            Some((lo, hi)) => Some((lo.min(r.year), hi.max(r.year))),
        })
        .unwrap_or((0, 0));
    let span = (max_year - min_year).max(1) as f64;

    let mut svg = String::new();
    open(&mut svg, width, height);

    for (f, source) in sources.iter().enumerate() {
        let x0 = left + f as f64 * (facet_w + gap);
        let rows: Vec<_> = table.records().iter().filter(|r| r.source == *source).collect();
        let max = rows.iter().map(|r| r.lib_count).max().unwrap_or(0);
        let axis = YAxis::new(max, top, facet_h);

        let _ = writeln!(
            svg,
            r##"<rect x="{x0:.1}" y="{top:.1}" width="{facet_w:.1}" height="{facet_h:.1}" fill="none" stroke="#333333"/>"##
        );
        title(&mut svg, x0 + facet_w / 2.0, top - 12.0, 14, source);
        axis.draw(&mut svg, x0, facet_w);

        let x_of = |year: i32| x0 + 10.0 + (year - min_year) as f64 / span * (facet_w - 20.0);
        for year in [min_year, max_year] {
            let _ = writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" {FONT} font-size="11" text-anchor="middle">{year}</text>"#,
                x_of(year),
                top + facet_h + 18.0
            );
        }

        for r in rows {
            let idx = species.iter().position(|s| *s == r.species).unwrap_or(0);
            let _ = writeln!(
                svg,
                r#"<circle cx="{:.1}" cy="{:.1}" r="4" fill="{}"><title>{} {} {}: {}</title></circle>"#,
                x_of(r.year),
                axis.y(r.lib_count),
                color(idx),
                escape(&r.species),
                escape(&r.source),
                r.year,
                r.lib_count
            );
        }
    }

    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" {FONT} font-size="14" text-anchor="middle">Year</text>"#,
        left + facets as f64 * (facet_w + gap) / 2.0,
        height as f64 - 12.0
    );
    let _ = writeln!(
        svg,
        r#"<text x="18" y="{:.1}" {FONT} font-size="14" text-anchor="middle" transform="rotate(-90 18 {:.1})">Library Count</text>"#,
        top + facet_h / 2.0,
        top + facet_h / 2.0
    );

    legend(
        &mut svg,
        left + facets as f64 * (facet_w + gap),
        top + 10.0,
        "Species",
        &species,
    );

    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{category_order, yearly_summary};
    use crate::models::{CountRecord, LibraryRecord, ResultTable};

    #[test]
    fn test_nice_ceiling() {
        assert_eq!(nice_ceiling(0), 1);
        assert_eq!(nice_ceiling(1), 1);
        assert_eq!(nice_ceiling(7), 10);
        assert_eq!(nice_ceiling(12), 20);
        assert_eq!(nice_ceiling(40), 50);
        assert_eq!(nice_ceiling(100), 100);
        assert_eq!(nice_ceiling(501), 1000);
        assert_eq!(nice_ceiling(10_000_000_000_000_000_000), 10_000_000_000_000_000_000);
        assert_eq!(nice_ceiling(15_000_000_000_000_000_000), u64::MAX);
        assert_eq!(nice_ceiling(u64::MAX), u64::MAX);
    }

    #[test]
    fn test_scatter_with_huge_count() {
        let table = crate::report::tsv::parse_library_table(
            "Year\tSpecies\tSource\tlib_count\n2020\tZ\tg\t15000000000000000000\n",
        )
        .unwrap();
        let svg = faceted_scatter(&table);
        assert_eq!(svg.matches("<circle").count(), 1);
        assert!(svg.contains(&format!(">{}</text>", u64::MAX)));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_bar_chart_legend_follows_order() {
        let table: ResultTable = vec![
            CountRecord::new(2022, "microarray", 1),
            CountRecord::new(2022, "sequencing", 10),
            CountRecord::new(2023, "sequencing", 5),
        ]
        .into_iter()
        .collect();
        let order = category_order(&table);
        let svg = grouped_bar_chart(&yearly_summary(&table), &order, "GEO <Zea mays>");

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("GEO &lt;Zea mays&gt;"));
        let seq = svg.find(">sequencing</text>").unwrap();
        let micro = svg.find(">microarray</text>").unwrap();
        assert!(seq < micro);
        // Two years x two categories, one missing cell drawn at zero height.
        assert_eq!(svg.matches("<rect x=").count(), 4 + 2);
    }

    #[test]
    fn test_bar_chart_empty() {
        let svg = grouped_bar_chart(&[], &CategoryOrder::default(), "empty");
        assert!(svg.contains("</svg>"));
    }

    #[test]
    fn test_scatter_facets_per_source() {
        let row = |year, species: &str, source: &str, lib_count| LibraryRecord {
            year,
            species: species.to_string(),
            source: source.to_string(),
            lib_count,
        };
        let table: LibraryTable = vec![
            row(2010, "Zea mays", "transcriptomic", 10),
            row(2010, "Zea mays", "genomic", 4),
            row(2011, "Oryza sativa", "transcriptomic", 30),
        ]
        .into_iter()
        .collect();

        let svg = faceted_scatter(&table);
        assert_eq!(svg.matches("<circle").count(), 3);
        assert!(svg.contains(">transcriptomic</text>"));
        assert!(svg.contains(">genomic</text>"));
        assert!(svg.contains(">Oryza sativa</text>"));
        assert!(svg.contains("Library Count"));
    }
}
