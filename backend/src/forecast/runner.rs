//! Forecast runner: fit, forecast, render.
//!
//! [`ForecastRunner`] walks `Idle -> Fitting -> Fitted -> Forecasting -> Done`
//! and parks in `Failed` with the stage that broke. The free functions
//! [`fit`], [`forecast`] and [`forecasting_pipeline`] are the stateless entry
//! points the workflow uses.

use anofox_forecast::core::TimeSeries;
use anofox_forecast::models::arima::AutoARIMA;
use anofox_forecast::models::Forecaster;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{DashboardError, ForecastStage, Result};
use crate::forecast::model::{AutoArimaConfig, InformationCriterion, ModelOrder};
use crate::models::Series;
use crate::services::charts::{self, ChartSettings, Figure};

/// Lifecycle of a [`ForecastRunner`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum RunnerState {
    Idle,
    Fitting,
    Fitted,
    Forecasting,
    Done,
    Failed {
        stage: ForecastStage,
        message: String,
    },
}

/// A model selected and fitted on a training series.
#[derive(Debug, Clone)]
pub struct FittedModel {
    pub series_name: String,
    /// Source position just past the last training observation.
    pub next_position: usize,
    /// Period requested by the caller.
    pub seasonal_period: usize,
    pub order: ModelOrder,
    pub criterion: InformationCriterion,
    /// Criterion value of the selected model.
    pub score: f64,
    /// Number of candidate models that could be estimated.
    pub candidates: usize,
    model: AutoARIMA,
}

impl FittedModel {
    pub fn order(&self) -> ModelOrder {
        self.order
    }
}

/// Period handed to the order search for `n` training observations.
///
/// Seasonal candidates need three full cycles. Between two and three cycles
/// the search falls back to non-seasonal models.
fn search_period(seasonal_period: usize, n: usize) -> usize {
    if seasonal_period > 1 && n >= 3 * seasonal_period {
        seasonal_period
    } else {
        0
    }
}

/// Hourly index for the library's timestamped series.
fn positional_series(values: Vec<f64>) -> Result<TimeSeries> {
    let timestamps: Vec<DateTime<Utc>> = (0..values.len())
        .map(|i| DateTime::<Utc>::UNIX_EPOCH + Duration::hours(i as i64))
        .collect();
    Ok(TimeSeries::univariate(timestamps, values)?)
}

/// Select and fit a model on `train` with seasonal period `seasonal_period`.
///
/// At least two full seasonal cycles of training data are required. Gaps in
/// the training series are filled by linear interpolation.
pub fn fit(train: &Series, seasonal_period: usize, config: &AutoArimaConfig) -> Result<FittedModel> {
    let needed = 2 * seasonal_period;
    if train.len() < needed {
        return Err(DashboardError::fit(format!(
            "seasonal period {} needs at least {} training observations, got {}",
            seasonal_period,
            needed,
            train.len()
        )));
    }

    let values = train.interpolated()?;
    let period = search_period(seasonal_period, values.len());
    if period != seasonal_period && seasonal_period > 1 {
        info!(
            seasonal_period,
            observations = values.len(),
            "Fewer than three seasonal cycles, searching non-seasonal models"
        );
    }

    let series = positional_series(values)?;
    let mut model = AutoARIMA::with_config(config.to_library(period));
    model.fit(&series)?;

    let order = model
        .selected_full_order()
        .map(ModelOrder::from)
        .ok_or_else(|| DashboardError::fit("order search selected no model"))?;
    let scores = model.model_scores();
    let score = scores.first().map(|(_, score)| *score).unwrap_or(f64::NAN);
    let candidates = scores.len();

    debug!(%order, score, candidates, "Order search finished");

    Ok(FittedModel {
        series_name: train.name.clone(),
        next_position: train.offset + train.len(),
        seasonal_period,
        order,
        criterion: config.criterion,
        score,
        candidates,
        model,
    })
}

/// Predict the `horizon` observations that follow the training series.
pub fn forecast(model: &FittedModel, horizon: usize) -> Result<Series> {
    if horizon == 0 {
        return Ok(Series::from_values(model.series_name.clone(), Vec::new())
            .with_offset(model.next_position));
    }
    let values = model.model.predict(horizon)?.primary().to_vec();
    if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
        return Err(DashboardError::fit(format!(
            "{} produced a non-finite prediction at step {}",
            model.order,
            pos + 1
        )));
    }
    Ok(Series::from_values(model.series_name.clone(), values).with_offset(model.next_position))
}

/// Stateful wrapper around [`fit`] and [`forecast`].
#[derive(Debug)]
pub struct ForecastRunner {
    config: AutoArimaConfig,
    state: RunnerState,
    model: Option<FittedModel>,
}

impl ForecastRunner {
    pub fn new(config: AutoArimaConfig) -> Self {
        Self {
            config,
            state: RunnerState::Idle,
            model: None,
        }
    }

    pub fn state(&self) -> &RunnerState {
        &self.state
    }

    pub fn model(&self) -> Option<&FittedModel> {
        self.model.as_ref()
    }

    pub fn fit(&mut self, train: &Series, seasonal_period: usize) -> Result<&FittedModel> {
        self.state = RunnerState::Fitting;
        self.model = None;
        match fit(train, seasonal_period, &self.config) {
            Ok(model) => {
                self.state = RunnerState::Fitted;
                Ok(self.model.insert(model))
            }
            Err(err) => Err(self.fail(ForecastStage::Fitting, err)),
        }
    }

    /// Forecast from the fitted model. Only valid in `Fitted` or `Done`.
    pub fn forecast(&mut self, horizon: usize) -> Result<Series> {
        let model = match (&self.state, self.model.as_ref()) {
            (RunnerState::Fitted | RunnerState::Done, Some(model)) => model,
            _ => {
                return Err(DashboardError::fit(format!(
                    "cannot forecast from state {:?}; fit a model first",
                    self.state
                )))
            }
        };

        self.state = RunnerState::Forecasting;
        match forecast(model, horizon) {
            Ok(series) => {
                self.state = RunnerState::Done;
                Ok(series)
            }
            Err(err) => Err(self.fail(ForecastStage::Forecasting, err)),
        }
    }

    fn fail(&mut self, stage: ForecastStage, err: DashboardError) -> DashboardError {
        warn!(%stage, error = %err, "Forecast runner failed");
        self.state = RunnerState::Failed {
            stage,
            message: err.to_string(),
        };
        err
    }
}

/// Everything the view shows after a successful pipeline run.
#[derive(Debug, Clone)]
pub struct ForecastOutcome {
    pub order: ModelOrder,
    pub criterion: InformationCriterion,
    pub score: f64,
    pub candidates_tried: usize,
    pub prediction: Series,
    pub figure: Figure,
}

/// Fit on `train`, forecast `test.len()` steps and draw train, test and
/// prediction together.
///
/// Errors carry the stage that failed.
pub fn forecasting_pipeline(
    train: &Series,
    test: &Series,
    seasonal_period: usize,
    config: &AutoArimaConfig,
    chart: &ChartSettings,
) -> Result<ForecastOutcome> {
    let mut runner = ForecastRunner::new(config.clone());

    let model = runner
        .fit(train, seasonal_period)
        .map_err(|e| e.in_stage(ForecastStage::Fitting))?;
    let (order, criterion, score, candidates_tried) =
        (model.order, model.criterion, model.score, model.candidates);

    let prediction = runner
        .forecast(test.len())
        .map_err(|e| e.in_stage(ForecastStage::Forecasting))?;

    let figure = charts::render_forecast(train, test, &prediction, chart)
        .map_err(|e| e.in_stage(ForecastStage::Rendering))?;

    info!(
        %order,
        horizon = prediction.len(),
        "Forecast pipeline finished"
    );

    Ok(ForecastOutcome {
        order,
        criterion,
        score,
        candidates_tried,
        prediction,
        figure,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seasonal_series(n: usize, period: usize) -> Series {
        let values = (0..n)
            .map(|i| {
                let phase = 2.0 * std::f64::consts::PI * i as f64 / period as f64;
                100.0 + 0.2 * i as f64 + 10.0 * phase.sin() + ((i * 7) % 5) as f64 * 0.3
            })
            .collect();
        Series::from_values("sales", values)
    }

    #[test]
    fn fit_requires_two_seasonal_cycles() {
        let train = seasonal_series(47, 24);
        let err = fit(&train, 24, &AutoArimaConfig::default()).unwrap_err();
        assert_eq!(err.code(), "FIT_ERROR");
        assert!(err.to_string().contains("at least 48"));
    }

    #[test]
    fn forecast_has_requested_horizon_and_offset() {
        let train = seasonal_series(75, 24);
        let model = fit(&train, 24, &AutoArimaConfig::default()).unwrap();
        let prediction = forecast(&model, 25).unwrap();

        assert_eq!(prediction.len(), 25);
        assert_eq!(prediction.offset, 75);
        assert_eq!(prediction.name, "sales");
    }

    #[test]
    fn forecast_is_deterministic() {
        let train = seasonal_series(72, 24);
        let config = AutoArimaConfig::default();
        let a = forecast(&fit(&train, 24, &config).unwrap(), 10).unwrap();
        let b = forecast(&fit(&train, 24, &config).unwrap(), 10).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fit_interpolates_gaps() {
        let mut train = seasonal_series(60, 24);
        train.values[10] = None;
        train.values[30] = None;
        assert!(fit(&train, 24, &AutoArimaConfig::default()).is_ok());
    }

    #[test]
    fn fit_uses_seasonal_search_with_three_cycles() {
        let model = fit(&seasonal_series(75, 24), 24, &AutoArimaConfig::default()).unwrap();
        assert_eq!(model.order.s, 24);
        assert_eq!(model.criterion, InformationCriterion::Aic);
        assert!(model.score.is_finite());
        assert!(model.candidates >= 1);
    }

    #[test]
    fn fit_falls_back_to_non_seasonal_below_three_cycles() {
        assert_eq!(search_period(24, 71), 0);
        assert_eq!(search_period(24, 72), 24);
        assert_eq!(search_period(1, 100), 0);

        let model = fit(&seasonal_series(50, 24), 24, &AutoArimaConfig::default()).unwrap();
        assert_eq!(model.seasonal_period, 24);
        assert!(!model.order.is_seasonal());
    }

    #[test]
    fn short_non_seasonal_fit_reports_insufficient_data() {
        let err = fit(&seasonal_series(6, 3), 3, &AutoArimaConfig::default()).unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_DATA");
    }

    #[test]
    fn runner_walks_through_states() {
        let mut runner = ForecastRunner::new(AutoArimaConfig::default());
        assert_eq!(runner.state(), &RunnerState::Idle);

        runner.fit(&seasonal_series(50, 24), 24).unwrap();
        assert_eq!(runner.state(), &RunnerState::Fitted);

        assert_eq!(runner.forecast(5).unwrap().len(), 5);
        assert_eq!(runner.state(), &RunnerState::Done);
    }

    #[test]
    fn runner_records_failed_stage() {
        let mut runner = ForecastRunner::new(AutoArimaConfig::default());
        assert!(runner.fit(&seasonal_series(10, 24), 24).is_err());
        assert!(matches!(
            runner.state(),
            RunnerState::Failed {
                stage: ForecastStage::Fitting,
                ..
            }
        ));
        assert!(runner.model().is_none());
    }

    #[test]
    fn runner_rejects_forecast_before_fit() {
        let mut runner = ForecastRunner::new(AutoArimaConfig::default());
        let err = runner.forecast(3).unwrap_err();
        assert_eq!(err.code(), "FIT_ERROR");
        assert_eq!(runner.state(), &RunnerState::Idle);
    }

    #[test]
    fn pipeline_reports_fitting_stage() {
        let series = seasonal_series(20, 24);
        let (train, test) = crate::services::splitter::split(&series).unwrap();
        let err = forecasting_pipeline(
            &train,
            &test,
            24,
            &AutoArimaConfig::default(),
            &ChartSettings::default(),
        )
        .unwrap_err();

        assert_eq!(err.stage(), Some(ForecastStage::Fitting));
        assert_eq!(err.code(), "FIT_ERROR");
    }

    #[test]
    fn pipeline_produces_figure_and_prediction() {
        let series = seasonal_series(100, 24);
        let (train, test) = crate::services::splitter::split(&series).unwrap();
        let outcome = forecasting_pipeline(
            &train,
            &test,
            24,
            &AutoArimaConfig::default(),
            &ChartSettings::default(),
        )
        .unwrap();

        assert_eq!(outcome.prediction.len(), test.len());
        assert_eq!(outcome.order.s, 24);
        assert!(outcome.candidates_tried >= 1);
        assert!(outcome.figure.svg.contains("<svg"));
    }
}
