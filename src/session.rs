//! Everything shown for the currently selected model, bundled so that
//! selecting another model resets all of it at once.

use crate::data::ModelMetadata;
use crate::error::{ExpressionError, SchemaError, SessionError};
use crate::evaluator::TransformEvaluator;
use crate::form::{Field, FormErrors, FormState, render_form};
use crate::gateway::ModelGateway;
use crate::output::{ChartLine, ChartView, discover};
use crate::runner::{ModelRunner, RunOutcome};
use crate::trace::TraceFormatter;
use std::sync::Arc;
use tracing::debug;

/// The result of a submit attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// The form did not validate; nothing was sent.
    Invalid(FormErrors),
    Completed(RunOutcome),
}

pub struct ModelSession {
    model: ModelMetadata,
    form: FormState,
    runner: ModelRunner,
    chart: Option<ChartView>,
    evaluator: TransformEvaluator,
}

impl ModelSession {
    pub fn new(
        model: ModelMetadata,
        gateway: Arc<dyn ModelGateway>,
        evaluator: TransformEvaluator,
    ) -> Result<Self, SchemaError> {
        let form = FormState::new(model.input.clone())?;
        let runner = ModelRunner::new(gateway, model.slug.clone());
        Ok(Self {
            model,
            form,
            runner,
            chart: None,
            evaluator,
        })
    }

    /// Switches to another model. The form, run settings, outcome and chart
    /// all start over.
    pub fn select(&mut self, model: ModelMetadata) -> Result<(), SchemaError> {
        debug!(from = %self.model.slug, to = %model.slug, "selecting model");
        self.form = FormState::new(model.input.clone())?;
        self.runner.reset(model.slug.clone());
        self.chart = None;
        self.model = model;
        Ok(())
    }

    pub fn model(&self) -> &ModelMetadata {
        &self.model
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormState {
        &mut self.form
    }

    pub fn fields(&self) -> Result<Field, SchemaError> {
        render_form(&self.form)
    }

    pub fn runner(&self) -> &ModelRunner {
        &self.runner
    }

    pub fn chart(&self) -> Option<&ChartView> {
        self.chart.as_ref()
    }

    pub fn chart_mut(&mut self) -> Option<&mut ChartView> {
        self.chart.as_mut()
    }

    /// Validates the form and, when it passes, runs the model with a snapshot
    /// of the values. A successful run prepares the chart view.
    pub async fn submit(&mut self) -> Result<Submission, SessionError> {
        let values = match self.form.submit() {
            Ok(values) => values,
            Err(errors) => return Ok(Submission::Invalid(errors)),
        };
        self.chart = None;
        let outcome = self.runner.run(values).await?;
        if let RunOutcome::Success(result) = &outcome {
            let keys = discover(&self.model.output, result)?;
            self.chart = Some(ChartView::new(keys, self.evaluator));
        }
        Ok(Submission::Completed(outcome))
    }

    /// The error panel text of a failed run.
    pub fn error_panel(&self) -> Option<String> {
        match self.runner.outcome()? {
            RunOutcome::Failure(error) => Some(TraceFormatter::format_run_error(&error)),
            RunOutcome::Success(_) => None,
        }
    }

    /// The chart line for the latest successful run, named after the model.
    pub fn chart_line(&self) -> Option<Result<ChartLine, ExpressionError>> {
        let chart = self.chart.as_ref()?;
        match self.runner.outcome()? {
            RunOutcome::Success(result) => Some(chart.line(self.model.label(), &result)),
            RunOutcome::Failure(_) => None,
        }
    }
}
