//! Workflow controller: one selection and upload in, one rendered view out.
//!
//! The controller is a flat dispatch on the selected activity. Each checked
//! option is an independent step; a step either contributes all of its blocks
//! or a single error block, and a failing step never stops the ones after it.
//! Nothing is kept between calls except the shared parse cache.

use tracing::{debug, info, warn};

use crate::api::{ColumnInfo, DatasetSummary, TableBlock, View, ViewBlock};
use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use crate::forecast::forecasting_pipeline;
use crate::models::{
    Activity, EdaOptions, ModelKind, ModelOptions, PlotOptions, Selection, Series, ShapeView,
    Table, LAG_WINDOW_RANGE, MIN_PREVIEW_ROWS, SEASONAL_PERIOD_RANGE,
};
use crate::services::cache::TableCache;
use crate::services::{charts, splitter, summary};

/// Rows of the selected columns shown in the model-building activity.
pub const DEFAULT_PREVIEW_ROWS: usize = 100;

const ABOUT: [&str; 2] = [
    "Time Series ML: upload a CSV file to explore it, chart its columns and fit an \
     automatic seasonal ARIMA forecaster on one of them.",
    "Stack: Rust, axum, polars, plotters, anofox-forecast.",
];

/// Parse (or fetch from cache) an upload and describe its columns.
pub fn load_dataset(content: &[u8], cache: &TableCache) -> Result<DatasetSummary> {
    let (dataset_id, table) = cache.get_or_parse(content)?;
    Ok(DatasetSummary {
        dataset_id,
        rows: table.height(),
        columns: table
            .columns()
            .iter()
            .map(|c| ColumnInfo {
                name: c.name().to_string(),
                dtype: c.dtype(),
            })
            .collect(),
    })
}

/// Render the view for `selection` over `upload`.
///
/// Never fails: every problem becomes an error block in the returned view.
pub fn render_view(
    selection: &Selection,
    upload: Option<&[u8]>,
    cache: &TableCache,
    config: &DashboardConfig,
) -> View {
    info!(activity = %selection.activity, "Rendering view");
    let mut view = View::new(selection.activity);
    view.push(ViewBlock::heading(selection.activity.label()));

    if let Err(err) = validate_parameters(selection) {
        fail(&mut view, "Parameters", &err);
        return view;
    }

    if selection.activity == Activity::About {
        for line in ABOUT {
            view.push(ViewBlock::text(line));
        }
        return view;
    }

    let Some(content) = upload else {
        fail(
            &mut view,
            "Upload",
            &DashboardError::invalid_selection("choose a CSV file to continue"),
        );
        return view;
    };

    let table = match cache.get_or_parse(content) {
        Ok((key, table)) => {
            debug!(dataset = %key, rows = table.height(), columns = table.width(), "Dataset ready");
            table
        }
        Err(err) => {
            fail(&mut view, "Load", &err);
            return view;
        }
    };

    match selection.activity {
        Activity::ExploratoryDataAnalysis => {
            explore(&mut view, &table, &selection.eda, selection.lag_window, config)
        }
        Activity::PlottingAndVisualization => {
            plot(&mut view, &table, selection.plot.as_ref(), config)
        }
        Activity::BuildingModel => build_model(
            &mut view,
            &table,
            &selection.model,
            selection.seasonal_period,
            config,
        ),
        Activity::About => {}
    }

    view
}

/// Slider values must lie within the ranges the sidebar offers.
pub fn validate_parameters(selection: &Selection) -> Result<()> {
    if !LAG_WINDOW_RANGE.contains(&selection.lag_window) {
        return Err(DashboardError::invalid_selection(format!(
            "lag window {} is outside {}..={}",
            selection.lag_window,
            LAG_WINDOW_RANGE.start(),
            LAG_WINDOW_RANGE.end()
        )));
    }
    if !SEASONAL_PERIOD_RANGE.contains(&selection.seasonal_period) {
        return Err(DashboardError::invalid_selection(format!(
            "seasonal period {} is outside {}..={}",
            selection.seasonal_period,
            SEASONAL_PERIOD_RANGE.start(),
            SEASONAL_PERIOD_RANGE.end()
        )));
    }
    Ok(())
}

fn explore(view: &mut View, table: &Table, eda: &EdaOptions, lags: usize, config: &DashboardConfig) {
    if let Some(rows) = eda.show_dataset {
        step(view, "Show Dataset", || {
            let rows = rows.clamp(MIN_PREVIEW_ROWS, table.height().max(MIN_PREVIEW_ROWS));
            Ok(vec![ViewBlock::Table(
                TableBlock::from(summary::head(table, rows)).titled("Dataset"),
            )])
        });
    }

    if eda.show_columns {
        step(view, "Columns", || {
            Ok(vec![ViewBlock::text(format!(
                "Columns: {}",
                table.column_names().join(", ")
            ))])
        });
    }

    if eda.column_types {
        step(view, "Column types", || {
            let types = summary::column_types(table);
            Ok(vec![ViewBlock::Table(
                TableBlock::from(types.as_slice()).titled("Column types"),
            )])
        });
    }

    if let Some(shape_view) = eda.shape {
        step(view, "Shape of Dataset", || {
            let (rows, columns) = summary::shape(table);
            let text = match shape_view {
                ShapeView::Rows => format!("Number of Rows: {}", rows),
                ShapeView::Columns => format!("Number of Columns: {}", columns),
                ShapeView::Shape => format!("({}, {})", rows, columns),
            };
            Ok(vec![ViewBlock::text(text)])
        });
    }

    if eda.null_values {
        step(view, "Check null values", || {
            let report = summary::null_report(table);
            if report.is_empty() {
                return Ok(vec![ViewBlock::text("No missing values.")]);
            }
            Ok(vec![ViewBlock::Table(
                TableBlock::from(&report).titled("Null values"),
            )])
        });
    }

    if eda.summary {
        step(view, "Show Data Summary", || {
            let stats = summary::describe(table);
            if stats.is_empty() {
                return Ok(vec![ViewBlock::text("No numeric columns to summarise.")]);
            }
            Ok(vec![
                ViewBlock::text("Datatypes Summary"),
                ViewBlock::Table(TableBlock::from(&stats)),
            ])
        });
    }

    if let Some(columns) = &eda.time_series {
        step(view, "Time series, ACF and PACF", || {
            let first = columns.first().ok_or_else(|| {
                DashboardError::invalid_selection("choose a column to plot as a time series")
            })?;
            table.select(columns)?;
            let series = table.series(first)?;
            let figure = charts::render_time_series_diagnostics(&series, lags, &config.charts)?;
            Ok(vec![ViewBlock::Figure(figure)])
        });
    }
}

fn plot(view: &mut View, table: &Table, options: Option<&PlotOptions>, config: &DashboardConfig) {
    step(view, "Plot", || {
        let options = options
            .ok_or_else(|| DashboardError::invalid_selection("select a type of plot"))?;
        let figure = charts::render(table, options, &config.charts)?;
        Ok(vec![ViewBlock::Figure(figure)])
    });
}

fn build_model(
    view: &mut View,
    table: &Table,
    options: &ModelOptions,
    seasonal_period: usize,
    config: &DashboardConfig,
) {
    let selected = match table.select(&options.columns) {
        Ok(selected) => selected,
        Err(err) => {
            fail(view, "Select Columns", &err);
            return;
        }
    };
    view.push(ViewBlock::Table(
        TableBlock::from(summary::head_of(&selected, DEFAULT_PREVIEW_ROWS))
            .titled("Selected columns"),
    ));

    // The first selected column is the modelled series.
    let series = || table.series(selected[0].name());

    if options.train_test_split {
        step(view, "Train/Test Split", || {
            let (train, test) = splitter::split(&series()?)?;
            let figure = charts::render_split(&train, &test, &config.charts)?;
            Ok(vec![
                ViewBlock::text(format!("Train Shape: ({},)", train.len())),
                ViewBlock::text(format!("Test Shape: ({},)", test.len())),
                ViewBlock::Figure(figure),
            ])
        });
    }

    if let Some(model) = options.train {
        step(view, "Training a Model", || {
            let series: Series = series()?;
            match model {
                ModelKind::AutoArima => {
                    let (train, test) = splitter::split(&series)?;
                    let outcome = forecasting_pipeline(
                        &train,
                        &test,
                        seasonal_period,
                        &config.forecast,
                        &config.charts,
                    )?;
                    Ok(vec![
                        ViewBlock::text(format!("Selected model: {}", outcome.order)),
                        ViewBlock::text(format!(
                            "{}: {:.3} ({} candidate models evaluated)",
                            outcome.criterion, outcome.score, outcome.candidates_tried
                        )),
                        ViewBlock::Figure(outcome.figure),
                    ])
                }
            }
        });
    }
}

/// Run one step; its blocks are added only if the whole step succeeds.
fn step<F>(view: &mut View, name: &str, run: F)
where
    F: FnOnce() -> Result<Vec<ViewBlock>>,
{
    match run() {
        Ok(blocks) => {
            debug!(step = name, blocks = blocks.len(), "Step rendered");
            view.blocks.extend(blocks);
        }
        Err(err) => fail(view, name, &err),
    }
}

fn fail(view: &mut View, step: &str, err: &DashboardError) {
    warn!(step, code = err.code(), error = %err, "Step failed");
    view.push(ViewBlock::error(step, err));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChartKind;

    fn sales_csv(rows: usize) -> Vec<u8> {
        let mut csv = String::from("day,sales,region\n");
        for i in 0..rows {
            let phase = 2.0 * std::f64::consts::PI * i as f64 / 24.0;
            let sales = 50.0 + 0.1 * i as f64 + 5.0 * phase.sin();
            let region = ["north", "south"][i % 2];
            if i % 20 == 3 {
                csv.push_str(&format!("{},,{}\n", i, region));
            } else {
                csv.push_str(&format!("{},{:.3},{}\n", i, sales, region));
            }
        }
        csv.into_bytes()
    }

    fn texts(view: &View) -> Vec<String> {
        view.texts().map(String::from).collect()
    }

    #[test]
    fn test_about_needs_no_upload() {
        let view = render_view(
            &Selection::new(Activity::About),
            None,
            &TableCache::default(),
            &DashboardConfig::default(),
        );
        assert!(!view.has_errors());
        assert!(texts(&view).iter().any(|t| t.contains("Stack")));
    }

    #[test]
    fn test_missing_upload_is_reported() {
        let view = render_view(
            &Selection::new(Activity::ExploratoryDataAnalysis),
            None,
            &TableCache::default(),
            &DashboardConfig::default(),
        );
        assert_eq!(view.errors().count(), 1);
        assert_eq!(view.blocks.len(), 2);
    }

    #[test]
    fn test_out_of_range_slider_is_rejected() {
        let selection = Selection::new(Activity::BuildingModel).with_seasonal_period(12);
        let err = validate_parameters(&selection).unwrap_err();
        assert_eq!(err.code(), "INVALID_SELECTION");

        let selection = Selection::new(Activity::ExploratoryDataAnalysis).with_lag_window(61);
        assert!(validate_parameters(&selection).is_err());
    }

    #[test]
    fn test_parse_failure_becomes_load_error() {
        let view = render_view(
            &Selection::new(Activity::ExploratoryDataAnalysis),
            Some(b"   "),
            &TableCache::default(),
            &DashboardConfig::default(),
        );
        match view.errors().next() {
            Some(ViewBlock::Error { step, code, .. }) => {
                assert_eq!(step, "Load");
                assert_eq!(code, "PARSE_ERROR");
            }
            other => panic!("expected a load error, got {:?}", other),
        };
    }

    #[test]
    fn test_eda_steps_render_in_order() {
        let csv = sales_csv(40);
        let selection = Selection::new(Activity::ExploratoryDataAnalysis).with_eda(EdaOptions {
            show_dataset: Some(2),
            show_columns: true,
            column_types: true,
            shape: Some(ShapeView::Rows),
            null_values: true,
            summary: true,
            time_series: None,
        });
        let view = render_view(
            &selection,
            Some(&csv),
            &TableCache::default(),
            &DashboardConfig::default(),
        );

        assert!(!view.has_errors());
        let tables: Vec<_> = view.tables().collect();
        // Preview is clamped up to the minimum row count.
        assert_eq!(tables[0].rows.len(), MIN_PREVIEW_ROWS);
        assert_eq!(tables[2].rows.len(), 1);
        let texts = texts(&view);
        assert!(texts.contains(&"Columns: day, sales, region".to_string()));
        assert!(texts.contains(&"Number of Rows: 40".to_string()));
        assert!(texts.contains(&"Datatypes Summary".to_string()));
    }

    #[test]
    fn test_failing_step_does_not_stop_later_steps() {
        let csv = sales_csv(40);
        let selection = Selection::new(Activity::ExploratoryDataAnalysis).with_eda(EdaOptions {
            show_columns: true,
            time_series: Some(vec!["region".to_string()]),
            ..EdaOptions::default()
        });
        let view = render_view(
            &selection,
            Some(&csv),
            &TableCache::default(),
            &DashboardConfig::default(),
        );
        assert_eq!(view.errors().count(), 1);
        assert_eq!(texts(&view).len(), 1);

        let selection = Selection::new(Activity::ExploratoryDataAnalysis).with_eda(EdaOptions {
            time_series: Some(vec!["sales".to_string()]),
            ..EdaOptions::default()
        });
        let view = render_view(
            &selection,
            Some(&csv),
            &TableCache::default(),
            &DashboardConfig::default(),
        );
        assert!(!view.has_errors());
        assert_eq!(view.figures().next().map(|f| f.kind.as_str()), Some("diagnostics"));
    }

    #[test]
    fn test_plot_without_kind_is_an_error() {
        let csv = sales_csv(10);
        let cache = TableCache::default();
        let config = DashboardConfig::default();

        let view = render_view(
            &Selection::new(Activity::PlottingAndVisualization),
            Some(&csv),
            &cache,
            &config,
        );
        assert!(view.has_errors());

        let selection = Selection::new(Activity::PlottingAndVisualization).with_plot(PlotOptions {
            kind: ChartKind::Line,
            columns: vec!["sales".to_string()],
            x_axis: None,
            y_axis: None,
        });
        let view = render_view(&selection, Some(&csv), &cache, &config);
        assert!(!view.has_errors());
        assert_eq!(view.figures().count(), 1);
    }

    #[test]
    fn test_model_without_columns_stops() {
        let csv = sales_csv(10);
        let selection = Selection::new(Activity::BuildingModel).with_model(ModelOptions {
            columns: Vec::new(),
            train_test_split: true,
            train: Some(ModelKind::AutoArima),
        });
        let view = render_view(
            &selection,
            Some(&csv),
            &TableCache::default(),
            &DashboardConfig::default(),
        );
        assert_eq!(view.errors().count(), 1);
        assert_eq!(view.figures().count(), 0);
    }

    #[test]
    fn test_split_and_training() {
        let csv = sales_csv(100);
        let selection = Selection::new(Activity::BuildingModel).with_model(ModelOptions {
            columns: vec!["sales".to_string()],
            train_test_split: true,
            train: Some(ModelKind::AutoArima),
        });
        let view = render_view(
            &selection,
            Some(&csv),
            &TableCache::default(),
            &DashboardConfig::default(),
        );

        assert!(!view.has_errors(), "{:?}", view.errors().collect::<Vec<_>>());
        let texts = texts(&view);
        assert!(texts.contains(&"Train Shape: (75,)".to_string()));
        assert!(texts.contains(&"Test Shape: (25,)".to_string()));
        assert!(texts.iter().any(|t| t.starts_with("Selected model: ARIMA(")));
        assert_eq!(view.figures().count(), 2);
        assert_eq!(view.tables().next().map(|t| t.rows.len()), Some(100));
    }

    #[test]
    fn test_short_series_fails_in_fitting_stage() {
        let csv = sales_csv(40);
        let selection = Selection::new(Activity::BuildingModel).with_model(ModelOptions {
            columns: vec!["sales".to_string()],
            train_test_split: false,
            train: Some(ModelKind::AutoArima),
        });
        let view = render_view(
            &selection,
            Some(&csv),
            &TableCache::default(),
            &DashboardConfig::default(),
        );
        match view.errors().next() {
            Some(ViewBlock::Error { stage, code, .. }) => {
                assert_eq!(*stage, Some(crate::error::ForecastStage::Fitting));
                assert_eq!(code, "FIT_ERROR");
            }
            other => panic!("expected a fitting error, got {:?}", other),
        };
    }

    #[test]
    fn test_all_empty_column_is_insufficient_data() {
        let csv = b"day,notes\n1,\n2,\n3,\n4,\n";
        let selection = Selection::new(Activity::BuildingModel).with_model(ModelOptions {
            columns: vec!["notes".to_string()],
            train_test_split: true,
            train: Some(ModelKind::AutoArima),
        });
        let view = render_view(
            &selection,
            Some(&csv[..]),
            &TableCache::default(),
            &DashboardConfig::default(),
        );
        let codes: Vec<&str> = view
            .errors()
            .filter_map(|block| match block {
                ViewBlock::Error { code, .. } => Some(code.as_str()),
                _ => None,
            })
            .collect();
        assert!(!codes.is_empty());
        assert!(codes.iter().all(|code| *code == "INSUFFICIENT_DATA"), "{:?}", codes);
    }

    #[test]
    fn test_load_dataset_summarises_columns() {
        let cache = TableCache::default();
        let summary = load_dataset(&sales_csv(12), &cache).unwrap();
        assert_eq!(summary.rows, 12);
        assert_eq!(summary.columns.len(), 3);
        assert_eq!(summary.columns[0].name, "day");
        assert_eq!(cache.len(), 1);
    }
}
