use serde::Serialize;
use serde_json::Value;

use crate::error::PredictionError;

pub const TABLE_HEADERS: [&str; 3] = ["Disease", "Probability", "Prediction"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold(f64);

impl Threshold {
    pub const DEFAULT: f64 = 0.5;

    pub fn new(value: f64) -> Result<Self, PredictionError> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(PredictionError::InvalidThreshold(value.to_string()))
        }
    }

    /// Parses the slider value as submitted by the form. Blank means default.
    pub fn from_form(text: &str) -> Result<Self, PredictionError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Self::default());
        }
        let value = text
            .parse::<f64>()
            .map_err(|_| PredictionError::InvalidThreshold(format!("{text:?}")))?;
        Self::new(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Prediction {
    Positive,
    Negative,
    Error,
}

impl Prediction {
    pub fn from_probability(probability: f64, threshold: Threshold) -> Self {
        if probability >= threshold.value() {
            Prediction::Positive
        } else {
            Prediction::Negative
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    #[serde(rename = "Disease")]
    pub disease: String,
    #[serde(rename = "Probability")]
    pub probability: f64,
    #[serde(rename = "Prediction")]
    pub prediction: Prediction,
}

impl ResultRow {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            disease: message.into(),
            probability: 0.0,
            prediction: Prediction::Error,
        }
    }
}

/// Disease label to probability, in the order the endpoint sent them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbabilityMap(Vec<(String, f64)>);

impl ProbabilityMap {
    pub fn from_json(value: Value) -> Result<Self, PredictionError> {
        let object = match value {
            Value::Object(object) => object,
            other => {
                return Err(PredictionError::Parse(format!(
                    "expected a JSON object of label to probability, got {}",
                    json_type_name(&other)
                )))
            }
        };

        let mut entries = Vec::with_capacity(object.len());
        for (label, raw) in object {
            let probability = coerce_probability(&raw).ok_or_else(|| {
                PredictionError::Parse(format!("probability for {label:?} is not a number: {raw}"))
            })?;
            if !probability.is_finite() {
                return Err(PredictionError::Parse(format!(
                    "probability for {label:?} is not finite: {raw}"
                )));
            }
            entries.push((label, probability));
        }
        Ok(Self(entries))
    }

    pub fn from_bytes(body: &[u8]) -> Result<Self, PredictionError> {
        let value: Value = serde_json::from_slice(body)?;
        Self::from_json(value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Labels each entry against the threshold, highest probability first.
    /// Equal probabilities keep their response order.
    pub fn into_rows(self, threshold: Threshold) -> Vec<ResultRow> {
        let mut rows: Vec<ResultRow> = self
            .0
            .into_iter()
            .map(|(disease, probability)| ResultRow {
                prediction: Prediction::from_probability(probability, threshold),
                disease,
                probability,
            })
            .collect();
        rows.sort_by(|a, b| b.probability.total_cmp(&a.probability));
        rows
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ProbabilityMap {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(label, p)| (label.into(), p)).collect())
    }
}

// Same leniency as a float cast: numbers, numeric strings, booleans.
fn coerce_probability(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorInfo {
    pub kind: &'static str,
    pub message: String,
}

/// What the page renders: either ranked rows or a single error row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultTable {
    pub headers: [&'static str; 3],
    pub rows: Vec<ResultRow>,
    pub error: Option<ErrorInfo>,
}

impl From<Result<Vec<ResultRow>, PredictionError>> for ResultTable {
    fn from(outcome: Result<Vec<ResultRow>, PredictionError>) -> Self {
        match outcome {
            Ok(rows) => Self {
                headers: TABLE_HEADERS,
                rows,
                error: None,
            },
            Err(err) => {
                let message = err.to_string();
                Self {
                    headers: TABLE_HEADERS,
                    rows: vec![ResultRow::error(message.clone())],
                    error: Some(ErrorInfo {
                        kind: err.kind(),
                        message,
                    }),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn threshold(value: f64) -> Threshold {
        Threshold::new(value).expect("threshold")
    }

    #[test]
    fn rows_are_ranked_and_labeled() {
        let map = ProbabilityMap::from_json(json!({"Cardiomegaly": 0.3, "Pneumonia": 0.82}))
            .expect("map");
        let rows = map.into_rows(threshold(0.5));

        assert_eq!(
            rows,
            vec![
                ResultRow {
                    disease: "Pneumonia".to_string(),
                    probability: 0.82,
                    prediction: Prediction::Positive,
                },
                ResultRow {
                    disease: "Cardiomegaly".to_string(),
                    probability: 0.3,
                    prediction: Prediction::Negative,
                },
            ]
        );
    }

    #[test]
    fn probability_equal_to_threshold_is_positive() {
        let rows = ProbabilityMap::from_iter([("Edema", 0.42)]).into_rows(threshold(0.42));
        assert_eq!(rows[0].prediction, Prediction::Positive);

        let rows = ProbabilityMap::from_iter([("Edema", 0.0)]).into_rows(threshold(0.0));
        assert_eq!(rows[0].prediction, Prediction::Positive);

        let rows = ProbabilityMap::from_iter([("Edema", 0.99)]).into_rows(threshold(1.0));
        assert_eq!(rows[0].prediction, Prediction::Negative);
    }

    #[test]
    fn rows_never_increase() {
        let map = ProbabilityMap::from_iter([
            ("A", 0.1),
            ("B", 0.9),
            ("C", 0.5),
            ("D", 0.5),
            ("E", 0.0),
            ("F", 1.0),
        ]);
        let rows = map.into_rows(Threshold::default());
        assert!(rows
            .windows(2)
            .all(|pair| pair[0].probability >= pair[1].probability));
        let ties: Vec<&str> = rows
            .iter()
            .filter(|row| row.probability == 0.5)
            .map(|row| row.disease.as_str())
            .collect();
        assert_eq!(ties, vec!["C", "D"]);
    }

    #[test]
    fn response_order_is_kept_before_sorting() {
        let map = ProbabilityMap::from_bytes(br#"{"Zeta": 0.2, "Alpha": 0.2}"#).expect("map");
        let rows = map.into_rows(Threshold::default());
        assert_eq!(rows[0].disease, "Zeta");
        assert_eq!(rows[1].disease, "Alpha");
    }

    #[test]
    fn probabilities_are_coerced_to_float() {
        let map = ProbabilityMap::from_json(json!({"Effusion": "0.75", "Mass": 1, "Nodule": false}))
            .expect("map");
        let rows = map.into_rows(Threshold::default());
        assert_eq!(rows[0].disease, "Mass");
        assert_eq!(rows[0].probability, 1.0);
        assert_eq!(rows[1].probability, 0.75);
        assert_eq!(rows[2].probability, 0.0);
    }

    #[test]
    fn out_of_range_probabilities_pass_through() {
        let rows = ProbabilityMap::from_iter([("Hernia", 1.7), ("Fibrosis", -0.2)])
            .into_rows(Threshold::default());
        assert_eq!(rows[0].probability, 1.7);
        assert_eq!(rows[0].prediction, Prediction::Positive);
        assert_eq!(rows[1].probability, -0.2);
        assert_eq!(rows[1].prediction, Prediction::Negative);
    }

    #[test]
    fn non_numeric_probability_is_a_parse_error() {
        let err = ProbabilityMap::from_json(json!({"Pneumonia": "high"})).unwrap_err();
        assert_eq!(err.kind(), "parse");
        assert!(err.to_string().contains("Pneumonia"));

        let err = ProbabilityMap::from_json(json!({"Pneumonia": null})).unwrap_err();
        assert_eq!(err.kind(), "parse");
    }

    #[test]
    fn non_finite_probability_is_a_parse_error() {
        for raw in ["NaN", "inf", "-infinity"] {
            let err = ProbabilityMap::from_json(json!({"Pneumonia": 0.82, "Edema": raw}))
                .unwrap_err();
            assert_eq!(err.kind(), "parse");
            assert!(err.to_string().contains("Edema"));
        }
    }

    #[test]
    fn non_object_payload_is_a_parse_error() {
        let err = ProbabilityMap::from_json(json!([0.1, 0.2])).unwrap_err();
        assert!(matches!(err, PredictionError::Parse(_)));

        let err = ProbabilityMap::from_bytes(b"<html>oops</html>").unwrap_err();
        assert!(matches!(err, PredictionError::Parse(_)));
    }

    #[test]
    fn threshold_bounds() {
        assert!(Threshold::new(0.0).is_ok());
        assert!(Threshold::new(1.0).is_ok());
        assert!(Threshold::new(1.01).is_err());
        assert!(Threshold::new(-0.01).is_err());
        assert!(Threshold::new(f64::NAN).is_err());
        assert_eq!(Threshold::from_form("").expect("blank").value(), 0.5);
        assert_eq!(Threshold::from_form(" 0.25 ").expect("padded").value(), 0.25);
        assert_eq!(
            Threshold::from_form("abc").unwrap_err().kind(),
            "invalid_threshold"
        );
    }

    #[test]
    fn error_outcome_becomes_single_error_row() {
        let table = ResultTable::from(Err(PredictionError::NoInput));
        assert_eq!(table.rows, vec![ResultRow::error("No image uploaded")]);
        assert_eq!(table.rows[0].probability, 0.0);
        assert_eq!(table.error.as_ref().map(|e| e.kind), Some("no_input"));
    }

    #[test]
    fn table_serializes_with_display_columns() {
        let table = ResultTable::from(Ok(vec![ResultRow {
            disease: "Pneumonia".to_string(),
            probability: 0.82,
            prediction: Prediction::Positive,
        }]));
        let value = serde_json::to_value(&table).expect("serialize");
        assert_eq!(
            value,
            json!({
                "headers": ["Disease", "Probability", "Prediction"],
                "rows": [{"Disease": "Pneumonia", "Probability": 0.82, "Prediction": "Positive"}],
                "error": null
            })
        );
    }
}
