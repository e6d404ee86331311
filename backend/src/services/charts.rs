//! Chart rendering to SVG with plotters.
//!
//! Every chart is drawn into an in-memory SVG string; no files are written.
//! Selection problems (unknown columns, text columns on a numeric axis, too
//! many pie slices) are reported as `InvalidSelection` before anything is
//! drawn, and drawing failures map to `Render`.

use std::collections::BTreeSet;

use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::{Deserialize, Serialize};

use crate::error::{render_error, DashboardError, Result};
use crate::forecast::correlogram::{acf, confidence_band, pacf};
use crate::models::{ChartKind, Column, DType, PlotOptions, Series, Table};
use crate::services::correlation::{correlation_matrix, CorrelationMatrix};

const COLOR_BLUE: RGBColor = RGBColor(59, 130, 246);
const COLOR_EMERALD: RGBColor = RGBColor(16, 185, 129);
const COLOR_AMBER: RGBColor = RGBColor(245, 158, 11);
const COLOR_ROSE: RGBColor = RGBColor(244, 63, 94);
const COLOR_PURPLE: RGBColor = RGBColor(139, 92, 246);
const COLOR_PINK: RGBColor = RGBColor(236, 72, 153);
const COLOR_TEAL: RGBColor = RGBColor(20, 184, 166);
const COLOR_ORANGE: RGBColor = RGBColor(249, 115, 22);
const COLOR_LIME: RGBColor = RGBColor(132, 204, 22);
const COLOR_SLATE: RGBColor = RGBColor(100, 116, 139);
const COLOR_GRAY_LIGHT: RGBColor = RGBColor(229, 231, 235);

const CHART_COLORS: [RGBColor; 10] = [
    COLOR_BLUE,
    COLOR_EMERALD,
    COLOR_AMBER,
    COLOR_ROSE,
    COLOR_PURPLE,
    COLOR_PINK,
    COLOR_TEAL,
    COLOR_ORANGE,
    COLOR_LIME,
    COLOR_SLATE,
];

const FONT: &str = "sans-serif";

type DrawResult = std::result::Result<(), DrawingAreaErrorKind<std::io::Error>>;

/// Size and limits for rendered charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSettings {
    pub width: u32,
    pub height: u32,
    /// Largest number of distinct values a pie chart accepts.
    pub pie_max_slices: usize,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            width: 960,
            height: 540,
            pie_max_slices: 20,
        }
    }
}

/// A rendered chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub title: String,
    pub kind: String,
    pub svg: String,
}

/// One named line of an overlay chart; `None` values leave a gap.
struct Trace<'a> {
    label: &'a str,
    points: Vec<(f64, Option<f64>)>,
}

/// Render the plotting activity's chart for `plot`.
pub fn render(table: &Table, plot: &PlotOptions, settings: &ChartSettings) -> Result<Figure> {
    match plot.kind {
        ChartKind::Area | ChartKind::Line | ChartKind::Bar => {
            render_columns(table, &plot.columns, plot.kind, settings)
        }
        ChartKind::Pie => {
            let [name] = plot.columns.as_slice() else {
                return Err(DashboardError::invalid_selection(
                    "a pie chart needs exactly one column",
                ));
            };
            render_pie(table.require_column(name)?, settings)
        }
        ChartKind::Scatter => {
            let x = plot.x_axis.as_deref().ok_or_else(|| {
                DashboardError::invalid_selection("choose a column for the X axis")
            })?;
            let y = plot.y_axis.as_deref().ok_or_else(|| {
                DashboardError::invalid_selection("choose a column for the Y axis")
            })?;
            render_scatter(table, x, y, settings)
        }
        ChartKind::Correlation => render_correlation(table, settings),
        ChartKind::Distribution => render_distribution(table, &plot.columns, settings),
    }
}

/// Area, line or bar chart with one series per column over the row index.
pub fn render_columns(
    table: &Table,
    columns: &[String],
    kind: ChartKind,
    settings: &ChartSettings,
) -> Result<Figure> {
    let selected = table.select(columns)?;
    let data = selected
        .iter()
        .map(|c| numeric_values(c).map(|v| (c.name(), v)))
        .collect::<Result<Vec<_>>>()?;

    let (y_lo, y_hi) = value_range(data.iter().flat_map(|(_, v)| v.iter().flatten().copied()))
        .ok_or_else(|| DashboardError::invalid_selection("selected columns have no values"))?;
    let rows = table.height();
    let title = format!("{} chart", kind);

    let svg = match kind {
        ChartKind::Bar => {
            let (y_lo, y_hi) = padded(y_lo.min(0.0), y_hi.max(0.0));
            render_svg(settings, |root| {
                draw_bars(root, &title, &data, rows, (y_lo, y_hi))
            })?
        }
        _ => {
            let traces: Vec<Trace> = data
                .iter()
                .map(|(name, values)| Trace {
                    label: name,
                    points: values.iter().enumerate().map(|(i, v)| (i as f64, *v)).collect(),
                })
                .collect();
            let x_range = (0.0, rows.saturating_sub(1).max(1) as f64);
            let fill = kind == ChartKind::Area;
            render_svg(settings, |root| {
                draw_traces(root, &title, &traces, x_range, padded(y_lo, y_hi), fill)
            })?
        }
    };

    Ok(Figure {
        title,
        kind: kind.to_string(),
        svg,
    })
}

/// Pie chart of the distinct values of one column.
pub fn render_pie(column: &Column, settings: &ChartSettings) -> Result<Figure> {
    let counts = column.value_counts();
    if counts.is_empty() {
        return Err(DashboardError::invalid_selection(format!(
            "column '{}' has no values to chart",
            column.name()
        )));
    }
    if counts.len() > settings.pie_max_slices {
        return Err(DashboardError::invalid_selection(format!(
            "column '{}' has {} distinct values; a pie chart allows at most {}",
            column.name(),
            counts.len(),
            settings.pie_max_slices
        )));
    }

    let title = format!("{} value counts", column.name());
    let total: usize = counts.iter().map(|(_, n)| n).sum();

    let svg = render_svg(settings, |root| {
        let (w, h) = root.dim_in_pixel();
        root.draw_text(
            &title,
            &TextStyle::from((FONT, 24).into_font()).color(&BLACK),
            (20, 15),
        )?;

        let radius = (w.min(h) as f64 * 0.35).max(10.0);
        let center = ((w as f64 * 0.35) as i32, (h as f64 * 0.55) as i32);
        let mut start_angle = -90.0;
        for (i, (_, count)) in counts.iter().enumerate() {
            let sweep = *count as f64 / total as f64 * 360.0;
            root.draw(&Polygon::new(
                pie_slice(center, radius, start_angle, sweep),
                slice_color(i).filled(),
            ))?;
            start_angle += sweep;
        }

        let legend_x = (w as f64 * 0.7) as i32;
        let row_height = ((h as i32 - 80) / counts.len() as i32).clamp(12, 28);
        for (i, (label, count)) in counts.iter().enumerate() {
            let y = 60 + i as i32 * row_height;
            root.draw(&Rectangle::new(
                [(legend_x, y), (legend_x + 14, y + 14)],
                slice_color(i).filled(),
            ))?;
            root.draw_text(
                &format!("{} ({:.1}%)", label, *count as f64 / total as f64 * 100.0),
                &TextStyle::from((FONT, 13).into_font()),
                (legend_x + 22, y),
            )?;
        }
        Ok(())
    })?;

    Ok(Figure {
        title,
        kind: ChartKind::Pie.to_string(),
        svg,
    })
}

/// Position of each row on one scatter axis.
///
/// Numeric and boolean columns plot their values. Text columns are treated as
/// ordered categories: each distinct value sits at its rank among the sorted
/// values, so ISO dates read left to right.
struct ScatterAxis {
    positions: Vec<Option<f64>>,
    categories: Vec<String>,
}

impl ScatterAxis {
    fn from_column(column: &Column) -> Result<Self> {
        if let Some(positions) = column.as_f64() {
            return Ok(Self {
                positions,
                categories: Vec::new(),
            });
        }
        if column.dtype() != DType::Text {
            return Err(non_numeric(column));
        }

        let labels: Vec<Option<String>> = (0..column.len()).map(|row| column.label(row)).collect();
        let categories: Vec<String> = labels
            .iter()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let positions = labels
            .iter()
            .map(|label| {
                label
                    .as_ref()
                    .and_then(|l| categories.binary_search(l).ok())
                    .map(|rank| rank as f64)
            })
            .collect();

        Ok(Self {
            positions,
            categories,
        })
    }

    fn is_categorical(&self) -> bool {
        !self.categories.is_empty()
    }

    /// Tick label for a category axis; ticks between ranks stay blank.
    fn category_label(&self, value: f64) -> String {
        let rank = value.round();
        if (value - rank).abs() > 1e-6 || rank < 0.0 {
            return String::new();
        }
        self.categories
            .get(rank as usize)
            .cloned()
            .unwrap_or_default()
    }

    fn tick_count(&self) -> usize {
        if self.is_categorical() {
            self.categories.len().clamp(2, 12)
        } else {
            10
        }
    }
}

/// Scatter plot of two independently chosen columns.
///
/// Numeric and boolean axes plot values; text axes plot the rank of each
/// value among the column's sorted distinct values.
pub fn render_scatter(table: &Table, x: &str, y: &str, settings: &ChartSettings) -> Result<Figure> {
    let x_axis = ScatterAxis::from_column(table.require_column(x)?)?;
    let y_axis = ScatterAxis::from_column(table.require_column(y)?)?;
    let points: Vec<(f64, f64)> = x_axis
        .positions
        .iter()
        .zip(y_axis.positions.iter())
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();

    let x_range = value_range(points.iter().map(|p| p.0));
    let y_range = value_range(points.iter().map(|p| p.1));
    let (Some((x_lo, x_hi)), Some((y_lo, y_hi))) = (x_range, y_range) else {
        return Err(DashboardError::invalid_selection(format!(
            "'{}' and '{}' have no rows where both are present",
            x, y
        )));
    };
    let title = format!("{} vs {}", y, x);
    let x_label = |v: &f64| x_axis.category_label(*v);
    let y_label = |v: &f64| y_axis.category_label(*v);

    let svg = render_svg(settings, |root| {
        let (x_lo, x_hi) = padded(x_lo, x_hi);
        let (y_lo, y_hi) = padded(y_lo, y_hi);
        let mut chart = ChartBuilder::on(root)
            .caption(&title, (FONT, 24).into_font())
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

        let mut mesh = chart.configure_mesh();
        mesh.x_desc(x)
            .y_desc(y)
            .x_labels(x_axis.tick_count())
            .y_labels(y_axis.tick_count())
            .axis_desc_style((FONT, 14));
        if x_axis.is_categorical() {
            mesh.x_label_formatter(&x_label);
        }
        if y_axis.is_categorical() {
            mesh.y_label_formatter(&y_label);
        }
        mesh.draw()?;

        chart.draw_series(
            points
                .iter()
                .map(|&(a, b)| Circle::new((a, b), 3, COLOR_BLUE.mix(0.7).filled())),
        )?;
        Ok(())
    })?;

    Ok(Figure {
        title,
        kind: ChartKind::Scatter.to_string(),
        svg,
    })
}

/// Annotated heatmap of the correlation matrix of every numeric column.
///
/// The column selection is ignored.
pub fn render_correlation(table: &Table, settings: &ChartSettings) -> Result<Figure> {
    let matrix = correlation_matrix(table);
    if matrix.is_empty() {
        return Err(DashboardError::invalid_selection(
            "the table has no numeric columns to correlate",
        ));
    }
    let title = "Correlation".to_string();
    let svg = render_svg(settings, |root| draw_heatmap(root, &title, &matrix))?;

    Ok(Figure {
        title,
        kind: ChartKind::Correlation.to_string(),
        svg,
    })
}

/// Histogram density with a Gaussian kernel estimate for each column.
pub fn render_distribution(
    table: &Table,
    columns: &[String],
    settings: &ChartSettings,
) -> Result<Figure> {
    let selected = table.select(columns)?;
    let mut samples: Vec<(&str, Vec<f64>)> = Vec::with_capacity(selected.len());
    for column in selected {
        let observed = column.observed_f64().ok_or_else(|| non_numeric(column))?;
        if observed.is_empty() {
            return Err(DashboardError::invalid_selection(format!(
                "column '{}' has no values",
                column.name()
            )));
        }
        samples.push((column.name(), observed));
    }

    let (lo, hi) = value_range(samples.iter().flat_map(|(_, v)| v.iter().copied()))
        .map(|(lo, hi)| padded(lo, hi))
        .ok_or_else(|| DashboardError::invalid_selection("selected columns have no values"))?;
    let largest = samples.iter().map(|(_, v)| v.len()).max().unwrap_or(1);
    let bins = ((largest as f64).sqrt().ceil() as usize).clamp(5, 50);
    let width = (hi - lo) / bins as f64;

    let densities: Vec<(&str, Vec<f64>, Vec<(f64, f64)>)> = samples
        .iter()
        .map(|(name, values)| (*name, histogram(values, lo, width, bins), kde(values, lo, hi)))
        .collect();
    let y_hi = densities
        .iter()
        .flat_map(|(_, hist, curve)| hist.iter().copied().chain(curve.iter().map(|p| p.1)))
        .fold(0.0_f64, f64::max)
        .max(f64::EPSILON)
        * 1.1;

    let title = "Distribution".to_string();
    let svg = render_svg(settings, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(&title, (FONT, 24).into_font())
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(lo..hi, 0.0..y_hi)?;
        chart.configure_mesh().y_desc("density").draw()?;

        for (i, (name, hist, curve)) in densities.iter().enumerate() {
            let color = CHART_COLORS[i % CHART_COLORS.len()];
            chart.draw_series(hist.iter().enumerate().map(|(b, d)| {
                let x0 = lo + b as f64 * width;
                Rectangle::new([(x0, 0.0), (x0 + width, *d)], color.mix(0.3).filled())
            }))?;
            chart
                .draw_series(LineSeries::new(curve.iter().copied(), color.stroke_width(2)))?
                .label(*name)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }
        draw_legend(&mut chart)
    })?;

    Ok(Figure {
        title,
        kind: ChartKind::Distribution.to_string(),
        svg,
    })
}

/// Train and test parts of a split drawn on one axis.
pub fn render_split(train: &Series, test: &Series, settings: &ChartSettings) -> Result<Figure> {
    render_series_overlay(
        &format!("{} train/test split", train.name),
        "split",
        &[(train, "y_train"), (test, "y_test")],
        settings,
    )
}

/// Training data, held-out data and prediction drawn on one axis.
pub fn render_forecast(
    train: &Series,
    test: &Series,
    prediction: &Series,
    settings: &ChartSettings,
) -> Result<Figure> {
    render_series_overlay(
        &format!("{} forecast", train.name),
        "forecast",
        &[(train, "y_train"), (test, "y_test"), (prediction, "y_pred")],
        settings,
    )
}

fn render_series_overlay(
    title: &str,
    kind: &str,
    series: &[(&Series, &str)],
    settings: &ChartSettings,
) -> Result<Figure> {
    let traces: Vec<Trace> = series
        .iter()
        .map(|(s, label)| Trace {
            label,
            points: s
                .positions()
                .zip(s.values.iter())
                .map(|(x, v)| (x as f64, *v))
                .collect(),
        })
        .collect();

    let x_range = value_range(traces.iter().flat_map(|t| t.points.iter().map(|p| p.0)));
    let y_range = value_range(
        traces
            .iter()
            .flat_map(|t| t.points.iter().filter_map(|p| p.1)),
    );
    let (Some((x_lo, x_hi)), Some((y_lo, y_hi))) = (x_range, y_range) else {
        return Err(DashboardError::InsufficientData { needed: 1, got: 0 });
    };

    let svg = render_svg(settings, |root| {
        draw_traces(root, title, &traces, padded(x_lo, x_hi), padded(y_lo, y_hi), false)
    })?;

    Ok(Figure {
        title: title.to_string(),
        kind: kind.to_string(),
        svg,
    })
}

/// Line plot of a series above its ACF and PACF up to `lags` lags.
///
/// The lag count is clamped to `len - 1`; gaps are interpolated first.
pub fn render_time_series_diagnostics(
    series: &Series,
    lags: usize,
    settings: &ChartSettings,
) -> Result<Figure> {
    let values = series.interpolated()?;
    if values.len() < 2 {
        return Err(DashboardError::InsufficientData {
            needed: 2,
            got: values.len(),
        });
    }
    let lags = lags.min(values.len() - 1);
    let rho = acf(&values, lags);
    let partial = pacf(&values, lags);
    let band = confidence_band(values.len());

    let title = format!("{} time series, ACF and PACF", series.name);
    let trace = Trace {
        label: &series.name,
        points: series
            .positions()
            .zip(series.values.iter())
            .map(|(x, v)| (x as f64, *v))
            .collect(),
    };
    let (y_lo, y_hi) = value_range(values.iter().copied()).unwrap_or((0.0, 1.0));
    let x_range = padded(series.offset as f64, (series.offset + values.len() - 1) as f64);

    let svg = render_svg(settings, |root| {
        let (_, h) = root.dim_in_pixel();
        let (upper, lower) = root.split_vertically(h / 2);
        let (left, right) = lower.split_horizontally(lower.dim_in_pixel().0 / 2);

        draw_traces(&upper, &title, &[trace], x_range, padded(y_lo, y_hi), false)?;
        draw_correlogram(&left, "Autocorrelation", &rho, band)?;
        draw_correlogram(&right, "Partial Autocorrelation", &partial, band)?;
        Ok(())
    })?;

    Ok(Figure {
        title,
        kind: "diagnostics".to_string(),
        svg,
    })
}

/// Create an SVG canvas, let `draw` paint it and return the document.
fn render_svg<F>(settings: &ChartSettings, draw: F) -> Result<String>
where
    F: FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> DrawResult,
{
    let mut svg = String::new();
    {
        let root =
            SVGBackend::with_string(&mut svg, (settings.width, settings.height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;
        draw(&root).map_err(render_error)?;
        root.present().map_err(render_error)?;
    }
    Ok(svg)
}

fn draw_traces(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    title: &str,
    traces: &[Trace],
    (x_lo, x_hi): (f64, f64),
    (y_lo, y_hi): (f64, f64),
    fill: bool,
) -> DrawResult {
    let mut chart = ChartBuilder::on(area)
        .caption(title, (FONT, 20).into_font())
        .margin(15)
        .x_label_area_size(35)
        .y_label_area_size(60)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;
    chart.configure_mesh().draw()?;

    for (i, trace) in traces.iter().enumerate() {
        let color = CHART_COLORS[i % CHART_COLORS.len()];
        let mut labelled = false;
        for run in contiguous_runs(&trace.points) {
            let anno = if fill {
                chart.draw_series(
                    AreaSeries::new(run, y_lo, color.mix(0.25)).border_style(color.stroke_width(2)),
                )?
            } else if run.len() == 1 {
                chart.draw_series(run.into_iter().map(|p| Circle::new(p, 2, color.filled())))?
            } else {
                chart.draw_series(LineSeries::new(run, color.stroke_width(2)))?
            };
            if !labelled {
                anno.label(trace.label)
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
                labelled = true;
            }
        }
    }

    draw_legend(&mut chart)
}

fn draw_bars(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    title: &str,
    data: &[(&str, Vec<Option<f64>>)],
    rows: usize,
    (y_lo, y_hi): (f64, f64),
) -> DrawResult {
    let mut chart = ChartBuilder::on(area)
        .caption(title, (FONT, 20).into_font())
        .margin(15)
        .x_label_area_size(35)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5..(rows as f64 - 0.5).max(0.5), y_lo..y_hi)?;
    chart.configure_mesh().disable_x_mesh().draw()?;

    let group = 0.8;
    let bar_width = group / data.len() as f64;
    for (j, (name, values)) in data.iter().enumerate() {
        let color = CHART_COLORS[j % CHART_COLORS.len()];
        chart
            .draw_series(values.iter().enumerate().filter_map(|(i, v)| {
                let v = (*v)?;
                let x0 = i as f64 - group / 2.0 + j as f64 * bar_width;
                Some(Rectangle::new([(x0, 0.0), (x0 + bar_width, v)], color.filled()))
            }))?
            .label(*name)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    draw_legend(&mut chart)
}

fn draw_heatmap(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    title: &str,
    matrix: &CorrelationMatrix,
) -> DrawResult {
    let n = matrix.columns.len();
    let names = &matrix.columns;
    let label = |v: &SegmentValue<usize>| match v {
        SegmentValue::CenterOf(i) => names.get(*i).cloned().unwrap_or_default(),
        _ => String::new(),
    };

    let mut chart = ChartBuilder::on(area)
        .caption(title, (FONT, 20).into_font())
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(100)
        .build_cartesian_2d((0..n).into_segmented(), (0..n).into_segmented())?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n + 1)
        .y_labels(n + 1)
        .x_label_formatter(&label)
        .y_label_formatter(&label)
        .draw()?;

    let annotation = TextStyle::from((FONT, 12).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
    for (i, row) in matrix.values.iter().enumerate() {
        // First column at the top, as in a printed matrix.
        let y = n - 1 - i;
        for (j, r) in row.iter().enumerate() {
            chart.draw_series(std::iter::once(Rectangle::new(
                [
                    (SegmentValue::Exact(j), SegmentValue::Exact(y)),
                    (SegmentValue::Exact(j + 1), SegmentValue::Exact(y + 1)),
                ],
                heat_color(*r).filled(),
            )))?;
            let text = if r.is_finite() {
                format!("{:.2}", r)
            } else {
                "nan".to_string()
            };
            chart.draw_series(std::iter::once(Text::new(
                text,
                (SegmentValue::CenterOf(j), SegmentValue::CenterOf(y)),
                annotation.clone(),
            )))?;
        }
    }
    Ok(())
}

fn draw_correlogram(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    title: &str,
    values: &[f64],
    band: f64,
) -> DrawResult {
    let max_lag = values.len().saturating_sub(1).max(1) as f64;
    let mut chart = ChartBuilder::on(area)
        .caption(title, (FONT, 18).into_font())
        .margin(15)
        .x_label_area_size(30)
        .y_label_area_size(45)
        .build_cartesian_2d(-0.5..max_lag + 0.5, -1.1..1.1)?;
    chart.configure_mesh().disable_x_mesh().draw()?;

    if band.is_finite() {
        chart.draw_series(std::iter::once(Rectangle::new(
            [(-0.5, -band), (max_lag + 0.5, band)],
            COLOR_BLUE.mix(0.15).filled(),
        )))?;
    }
    chart.draw_series(std::iter::once(PathElement::new(
        vec![(-0.5, 0.0), (max_lag + 0.5, 0.0)],
        BLACK,
    )))?;
    chart.draw_series(values.iter().enumerate().map(|(lag, r)| {
        PathElement::new(vec![(lag as f64, 0.0), (lag as f64, *r)], COLOR_SLATE)
    }))?;
    chart.draw_series(
        values
            .iter()
            .enumerate()
            .map(|(lag, r)| Circle::new((lag as f64, *r), 3, COLOR_BLUE.filled())),
    )?;
    Ok(())
}

fn draw_legend<'a, X, Y>(
    chart: &mut ChartContext<'a, SVGBackend<'a>, Cartesian2d<X, Y>>,
) -> DrawResult
where
    X: Ranged,
    Y: Ranged,
{
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
}

/// Numeric (or 0/1 boolean) values of a column, rejecting text.
fn numeric_values(column: &Column) -> Result<Vec<Option<f64>>> {
    column.as_f64().ok_or_else(|| non_numeric(column))
}

fn non_numeric(column: &Column) -> DashboardError {
    DashboardError::invalid_selection(format!(
        "column '{}' has type {} and cannot be plotted on a numeric axis",
        column.name(),
        column.dtype()
    ))
}

fn value_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Widen a range by 5% on each side; a degenerate range becomes `v ± 1`.
fn padded(lo: f64, hi: f64) -> (f64, f64) {
    let span = hi - lo;
    if span <= f64::EPSILON * lo.abs().max(1.0) {
        (lo - 1.0, hi + 1.0)
    } else {
        (lo - span * 0.05, hi + span * 0.05)
    }
}

/// Split points into runs without missing values.
fn contiguous_runs(points: &[(f64, Option<f64>)]) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for &(x, y) in points {
        match y.filter(|v| v.is_finite()) {
            Some(y) => current.push((x, y)),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Density-normalised histogram over `bins` equal bins starting at `lo`.
fn histogram(values: &[f64], lo: f64, width: f64, bins: usize) -> Vec<f64> {
    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    let scale = values.len() as f64 * width;
    counts.into_iter().map(|c| c as f64 / scale).collect()
}

/// Gaussian kernel density estimate on 200 points with Scott's bandwidth.
///
/// Empty for samples without spread.
fn kde(values: &[f64], lo: f64, hi: f64) -> Vec<(f64, f64)> {
    let n = values.len() as f64;
    if values.len() < 2 {
        return Vec::new();
    }
    let mean = values.iter().sum::<f64>() / n;
    let std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt();
    if std <= 0.0 {
        return Vec::new();
    }
    let bandwidth = 1.06 * std * n.powf(-0.2);
    let norm = 1.0 / (n * bandwidth * (2.0 * std::f64::consts::PI).sqrt());

    (0..200)
        .map(|i| {
            let x = lo + (hi - lo) * i as f64 / 199.0;
            let density = values
                .iter()
                .map(|v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                .sum::<f64>()
                * norm;
            (x, density)
        })
        .collect()
}

/// Points outlining a pie slice starting at `start_angle` degrees.
fn pie_slice(center: (i32, i32), radius: f64, start_angle: f64, sweep: f64) -> Vec<(i32, i32)> {
    let steps = ((sweep / 2.0).ceil() as usize).max(2);
    let mut points = Vec::with_capacity(steps + 2);
    points.push(center);
    for i in 0..=steps {
        let rad = (start_angle + sweep * i as f64 / steps as f64).to_radians();
        points.push((
            center.0 + (radius * rad.cos()) as i32,
            center.1 + (radius * rad.sin()) as i32,
        ));
    }
    points
}

fn slice_color(i: usize) -> RGBColor {
    CHART_COLORS[i % CHART_COLORS.len()]
}

/// Diverging blue (-1) / white (0) / red (+1) scale; gray for NaN.
fn heat_color(r: f64) -> RGBColor {
    if !r.is_finite() {
        return COLOR_GRAY_LIGHT;
    }
    let t = r.clamp(-1.0, 1.0);
    let blend = |from: u8, to: u8, w: f64| (from as f64 + (to as f64 - from as f64) * w) as u8;
    if t >= 0.0 {
        RGBColor(255, blend(255, 59, t), blend(255, 48, t))
    } else {
        RGBColor(blend(255, 33, -t), blend(255, 102, -t), 255)
    }
}
