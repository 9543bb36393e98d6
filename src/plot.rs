// src/plot.rs

use anyhow::{anyhow, Result};
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::ranged1d::{Ranged, ValueFormatter};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::table::{Gender, NameRecord};

/// Which column of a name table is plotted against year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMetric {
    Fraction,
    Count,
    Rank,
}

impl HistoryMetric {
    pub fn y_label(&self) -> &'static str {
        match self {
            HistoryMetric::Fraction => "Gender name fraction",
            HistoryMetric::Count => "Number of occurrences",
            HistoryMetric::Rank => "Gender rank of name",
        }
    }

    fn value<R: NameRecord>(&self, row: &R) -> f64 {
        match self {
            HistoryMetric::Fraction => row.f(),
            HistoryMetric::Count => row.n() as f64,
            HistoryMetric::Rank => row.rank() as f64,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlotOptions {
    pub log_scale: bool,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    /// Break each line at missing years so gaps render as
    /// discontinuities instead of being bridged by a straight segment.
    pub break_gaps: bool,
    /// Names drawn with a wider, marked underlay beneath their series.
    /// Only applies to rank plots.
    pub highlight: Vec<String>,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            log_scale: true,
            year_min: None,
            year_max: None,
            break_gaps: false,
            highlight: Vec::new(),
        }
    }
}

struct HistorySeries {
    name: String,
    label: String,
    segments: Vec<Vec<(i32, f64)>>,
}

/// Split a year-sorted point list at missing years.
fn split_at_gaps(points: &[(i32, f64)], break_gaps: bool) -> Vec<Vec<(i32, f64)>> {
    if !break_gaps {
        return vec![points.to_vec()];
    }
    let mut segments = Vec::new();
    let mut current: Vec<(i32, f64)> = Vec::new();
    for &(year, value) in points {
        if let Some(&(prev_year, _)) = current.last() {
            if year != prev_year + 1 {
                segments.push(std::mem::take(&mut current));
            }
        }
        current.push((year, value));
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Draw a history of `metric` for each (name, gender) pair onto `area`.
///
/// The two lists zip together; if their lengths differ the extra elements
/// of the longer one are dropped. Each pair becomes one labeled line of
/// the metric against year, colored from the palette in pair order.
pub fn history_plot<DB, R>(
    area: &DrawingArea<DB, Shift>,
    names: &[&str],
    genders: &[Gender],
    rows: &[R],
    metric: HistoryMetric,
    opts: &PlotOptions,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
    R: NameRecord,
{
    let mut series = Vec::new();
    for (&name, &gender) in names.iter().zip(genders.iter()) {
        let mut points: Vec<(i32, f64)> = rows
            .iter()
            .filter(|r| r.name() == name && r.gender() == gender)
            .map(|r| (r.year(), metric.value(r)))
            .collect();
        points.sort_by_key(|p| p.0);
        series.push(HistorySeries {
            name: name.to_string(),
            label: format!("{} ({})", name, gender),
            segments: split_at_gaps(&points, opts.break_gaps),
        });
    }

    let all_points: Vec<(i32, f64)> = series
        .iter()
        .flat_map(|s| s.segments.iter().flatten().copied())
        .collect();
    if all_points.is_empty() {
        return Err(anyhow!("no matching rows to plot"));
    }

    let data_x_min = all_points.iter().map(|p| p.0).min().unwrap_or(0);
    let data_x_max = all_points.iter().map(|p| p.0).max().unwrap_or(0);
    let x_min = opts.year_min.unwrap_or(data_x_min);
    let mut x_max = opts.year_max.unwrap_or(data_x_max);
    if x_max <= x_min {
        x_max = x_min + 1;
    }

    let mut y_min = all_points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let mut y_max = all_points
        .iter()
        .map(|p| p.1)
        .fold(f64::NEG_INFINITY, f64::max);
    if y_min == y_max {
        y_max = y_min + 1.0;
    }
    y_max *= 1.05;
    if opts.log_scale && y_min <= 0.0 {
        y_min = f64::EPSILON;
    }

    if opts.log_scale {
        let mut chart = ChartBuilder::on(area)
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, (y_min..y_max).log_scale())
            .map_err(|e| anyhow!("building chart: {}", e))?;
        draw_series_set(&mut chart, &series, metric, opts)
    } else {
        let mut chart = ChartBuilder::on(area)
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(|e| anyhow!("building chart: {}", e))?;
        draw_series_set(&mut chart, &series, metric, opts)
    }
}

fn draw_series_set<'a, DB, X, Y>(
    chart: &mut ChartContext<'a, DB, Cartesian2d<X, Y>>,
    series: &[HistorySeries],
    metric: HistoryMetric,
    opts: &PlotOptions,
) -> Result<()>
where
    DB: DrawingBackend + 'a,
    DB::ErrorType: 'static,
    X: Ranged<ValueType = i32> + ValueFormatter<i32>,
    Y: Ranged<ValueType = f64> + ValueFormatter<f64>,
{
    chart
        .configure_mesh()
        .x_desc("Year")
        .y_desc(metric.y_label())
        .draw()
        .map_err(|e| anyhow!("drawing mesh: {}", e))?;

    // highlight underlays go down first so the normal lines sit on top
    if metric == HistoryMetric::Rank && !opts.highlight.is_empty() {
        for (i, s) in series.iter().enumerate() {
            if !opts.highlight.iter().any(|h| *h == s.name) {
                continue;
            }
            let color = Palette99::pick(i).to_rgba();
            for segment in &s.segments {
                chart
                    .draw_series(LineSeries::new(
                        segment.iter().copied(),
                        color.stroke_width(5),
                    ))
                    .map_err(|e| anyhow!("drawing highlight line: {}", e))?;
                chart
                    .draw_series(
                        segment
                            .iter()
                            .map(|&(x, y)| Circle::new((x, y), 5, color.filled())),
                    )
                    .map_err(|e| anyhow!("drawing highlight markers: {}", e))?;
            }
        }
    }

    for (i, s) in series.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        let style = color.stroke_width(2);
        let mut labeled = false;
        for segment in &s.segments {
            let drawn = chart
                .draw_series(LineSeries::new(segment.iter().copied(), style))
                .map_err(|e| anyhow!("drawing line for {}: {}", s.label, e))?;
            // label only the first segment so broken lines keep one
            // legend entry
            if !labeled {
                drawn.label(s.label.clone()).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 16, y)], style)
                });
                labeled = true;
            }
        }
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(|e| anyhow!("drawing legend: {}", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::NationalRow;

    fn row(name: &str, year: i32, n: u64, f: f64, rank: u32) -> NationalRow {
        NationalRow {
            name: name.to_string(),
            gender: Gender::M,
            n,
            year,
            f,
            rank,
        }
    }

    fn fixture() -> Vec<NationalRow> {
        vec![
            row("Alex", 1990, 60, 0.6, 1),
            row("Alex", 1991, 55, 0.55, 1),
            // 1992 missing on purpose
            row("Alex", 1993, 50, 0.5, 2),
            row("Sam", 1990, 40, 0.4, 2),
            row("Sam", 1991, 45, 0.45, 2),
        ]
    }

    fn render(metric: HistoryMetric, opts: &PlotOptions) -> Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (640, 480)).into_drawing_area();
            root.fill(&WHITE).map_err(|e| anyhow!("{}", e))?;
            history_plot(
                &root,
                &["Alex", "Sam"],
                &[Gender::M, Gender::M],
                &fixture(),
                metric,
                opts,
            )?;
            root.present().map_err(|e| anyhow!("{}", e))?;
        }
        Ok(svg)
    }

    #[test]
    fn renders_fraction_history_with_log_scale() -> Result<()> {
        let svg = render(HistoryMetric::Fraction, &PlotOptions::default())?;
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Gender name fraction"));
        assert!(svg.contains("Year"));
        Ok(())
    }

    #[test]
    fn renders_linear_count_history() -> Result<()> {
        let opts = PlotOptions {
            log_scale: false,
            ..PlotOptions::default()
        };
        let svg = render(HistoryMetric::Count, &opts)?;
        assert!(svg.contains("Number of occurrences"));
        Ok(())
    }

    #[test]
    fn renders_rank_history_with_highlight() -> Result<()> {
        let opts = PlotOptions {
            highlight: vec!["Alex".to_string()],
            ..PlotOptions::default()
        };
        let svg = render(HistoryMetric::Rank, &opts)?;
        assert!(svg.contains("Gender rank of name"));
        Ok(())
    }

    #[test]
    fn year_bounds_are_honored() -> Result<()> {
        let opts = PlotOptions {
            year_min: Some(1985),
            year_max: Some(1995),
            ..PlotOptions::default()
        };
        assert!(render(HistoryMetric::Fraction, &opts).is_ok());
        Ok(())
    }

    #[test]
    fn gap_splitting_breaks_at_missing_years() {
        let points = vec![(1990, 1.0), (1991, 2.0), (1993, 3.0)];
        let segments = split_at_gaps(&points, true);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], vec![(1990, 1.0), (1991, 2.0)]);
        assert_eq!(segments[1], vec![(1993, 3.0)]);

        let joined = split_at_gaps(&points, false);
        assert_eq!(joined.len(), 1);
    }

    #[test]
    fn mismatched_list_lengths_drop_extras() -> Result<()> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (320, 240)).into_drawing_area();
            // one gender for two names: only Alex is drawn
            history_plot(
                &root,
                &["Alex", "Sam"],
                &[Gender::M],
                &fixture(),
                HistoryMetric::Fraction,
                &PlotOptions::default(),
            )?;
        }
        assert!(svg.contains("Alex (M)"));
        assert!(!svg.contains("Sam (M)"));
        Ok(())
    }

    #[test]
    fn no_matching_rows_is_an_error() {
        let mut svg = String::new();
        let root = SVGBackend::with_string(&mut svg, (320, 240)).into_drawing_area();
        let result = history_plot(
            &root,
            &["Nobody"],
            &[Gender::M],
            &fixture(),
            HistoryMetric::Fraction,
            &PlotOptions::default(),
        );
        assert!(result.is_err());
    }
}
