use super::keys::ChartKey;
use crate::error::ExpressionError;
use crate::evaluator::{Scope, TransformEvaluator, scope::read_number};
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;

/// One plotted sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub timestamp: Option<DateTime<Utc>>,
    pub value: f64,
}

/// A named series of points, one per result series element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartLine {
    pub name: String,
    pub points: Vec<ChartPoint>,
}

/// The chart tab of a successful run: key search, y-axis key selection and
/// the optional transform expression.
#[derive(Debug, Clone)]
pub struct ChartView {
    keys: Vec<ChartKey>,
    search: String,
    selected: Option<String>,
    transform: String,
    evaluator: TransformEvaluator,
}

impl ChartView {
    pub fn new(keys: Vec<ChartKey>, evaluator: TransformEvaluator) -> Self {
        Self {
            keys,
            search: String::new(),
            selected: None,
            transform: String::new(),
            evaluator,
        }
    }

    pub fn keys(&self) -> &[ChartKey] {
        &self.keys
    }

    /// The chart tab is only offered when there is something to plot.
    pub fn has_chart_tab(&self) -> bool {
        !self.keys.is_empty()
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
    }

    /// Keys matching the current search text.
    pub fn filtered_keys(&self) -> Vec<&ChartKey> {
        self.keys.iter().filter(|k| k.matches(&self.search)).collect()
    }

    /// Selects the y-axis key by its math path. Unknown paths clear the
    /// selection and return `false`.
    pub fn select_key(&mut self, math_path: &str) -> bool {
        let found = self.keys.iter().any(|k| k.math_path == math_path);
        self.selected = found.then(|| math_path.to_string());
        found
    }

    pub fn selected_key(&self) -> Option<&ChartKey> {
        let selected = self.selected.as_deref()?;
        self.keys.iter().find(|k| k.math_path == selected)
    }

    pub fn set_transform(&mut self, text: impl Into<String>) {
        self.transform = text.into();
    }

    pub fn transform(&self) -> &str {
        &self.transform
    }

    pub fn is_transform_valid(&self) -> bool {
        self.evaluator.validate(&self.transform, &self.keys)
    }

    /// Builds the plotted line for a run result.
    ///
    /// With a valid, non-blank transform each point is the transform evaluated
    /// against that element's values; otherwise it is the raw value of the
    /// selected key (zero when nothing is selected or the value is missing).
    pub fn line(&self, name: &str, result: &Value) -> Result<ChartLine, ExpressionError> {
        let compiled = if self.transform.trim().is_empty() || !self.is_transform_valid() {
            None
        } else {
            Some(self.evaluator.compile(&self.transform)?)
        };
        let selected = self.selected_key();

        let elements = match result.get("series") {
            Some(Value::Array(elements)) => elements.as_slice(),
            _ => &[],
        };
        let mut points = Vec::with_capacity(elements.len());
        for element in elements {
            let output = element.get("output").unwrap_or(&Value::Null);
            let value = match &compiled {
                Some(compiled) => {
                    let scope = Scope::from_series_output(&self.keys, output, selected);
                    self.evaluator
                        .evaluate(compiled, &scope)?
                        .map(|n| n.to_f64())
                        .unwrap_or(0.0)
                }
                None => selected
                    .map(|key| read_number(output, &key.relative_path).to_f64())
                    .unwrap_or(0.0),
            };
            points.push(ChartPoint {
                timestamp: sample_time(element),
                value,
            });
        }

        Ok(ChartLine {
            name: name.to_string(),
            points,
        })
    }
}

// `sampleTimestamp` is in seconds.
fn sample_time(element: &Value) -> Option<DateTime<Utc>> {
    let seconds = element.get("sampleTimestamp")?.as_i64()?;
    Utc.timestamp_opt(seconds, 0).single()
}
