//! The normalized row schema and its ingestion boundary.
//!
//! Accepted document shapes:
//!
//! - a bare JSON array of row objects
//! - an object with a single `rows` array (other top-level keys are metadata)
//!
//! Row objects may use any key from the alias table in [`crate::field`].
//! Anything else is rejected with [`KernelError::UnsupportedShape`].

use crate::error::KernelError;
use crate::field::FieldKind;
use crate::tags::normalize_bracket_stages;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// One FMEA record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    /// Position in the input document. Stable across sorting.
    pub id: usize,
    #[serde(default)]
    pub component: String,
    #[serde(default)]
    pub function: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_order: Option<u32>,
    #[serde(default)]
    pub effect: String,
    #[serde(default)]
    pub severity: Option<i64>,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub cause: String,
    #[serde(default)]
    pub mechanism: String,
    #[serde(default)]
    pub prevention: String,
    #[serde(default)]
    pub occurrence: Option<i64>,
    #[serde(default)]
    pub detection: String,
    #[serde(default)]
    pub detection_rating: Option<i64>,
}

impl Row {
    /// Text of a free-text field; `None` for score fields.
    pub fn text(&self, kind: FieldKind) -> Option<&str> {
        match kind {
            FieldKind::Component => Some(&self.component),
            FieldKind::Function => Some(&self.function),
            FieldKind::Effect => Some(&self.effect),
            FieldKind::Mode => Some(&self.mode),
            FieldKind::Cause => Some(&self.cause),
            FieldKind::Mechanism => Some(&self.mechanism),
            FieldKind::Prevention => Some(&self.prevention),
            FieldKind::Detection => Some(&self.detection),
            FieldKind::FunctionOrder
            | FieldKind::Severity
            | FieldKind::Occurrence
            | FieldKind::DetectionRating => None,
        }
    }

    /// Numeric value of a score field; `None` when absent or not a score.
    pub fn score(&self, kind: FieldKind) -> Option<i64> {
        match kind {
            FieldKind::Severity => self.severity,
            FieldKind::Occurrence => self.occurrence,
            FieldKind::DetectionRating => self.detection_rating,
            FieldKind::FunctionOrder => self.function_order.map(i64::from),
            _ => None,
        }
    }

    fn set_text(&mut self, kind: FieldKind, value: String) {
        match kind {
            FieldKind::Component => self.component = value,
            FieldKind::Function => self.function = value,
            FieldKind::Effect => self.effect = value,
            FieldKind::Mode => self.mode = value,
            FieldKind::Cause => self.cause = value,
            FieldKind::Mechanism => self.mechanism = value,
            FieldKind::Prevention => self.prevention = normalize_bracket_stages(&value),
            FieldKind::Detection => self.detection = normalize_bracket_stages(&value),
            FieldKind::FunctionOrder
            | FieldKind::Severity
            | FieldKind::Occurrence
            | FieldKind::DetectionRating => {}
        }
    }

    fn set_score(&mut self, kind: FieldKind, value: Option<i64>) {
        match kind {
            FieldKind::Severity => self.severity = value,
            FieldKind::Occurrence => self.occurrence = value,
            FieldKind::DetectionRating => self.detection_rating = value,
            FieldKind::FunctionOrder => {
                self.function_order = value.and_then(|v| u32::try_from(v).ok())
            }
            _ => {}
        }
    }
}

/// An ordered collection of rows, as produced by ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSet {
    pub rows: Vec<Row>,
}

impl RowSet {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn from_json_str(text: &str, origin: &str) -> Result<Self, KernelError> {
        let value: Value =
            serde_json::from_str(text).map_err(|source| KernelError::ParseJson {
                path: origin.to_string(),
                source,
            })?;
        Self::from_json_value(&value)
    }

    /// Normalize a parsed document into typed rows.
    pub fn from_json_value(value: &Value) -> Result<Self, KernelError> {
        let items = match value {
            Value::Array(items) => items,
            Value::Object(map) => match map.get("rows") {
                Some(Value::Array(items)) => items,
                Some(_) => {
                    return Err(KernelError::UnsupportedShape(
                        "`rows` must be an array of row objects".to_string(),
                    ));
                }
                None => {
                    let keys: Vec<&str> = map.keys().map(String::as_str).collect();
                    return Err(KernelError::UnsupportedShape(format!(
                        "expected a top-level array or an object with `rows`, found keys [{}]",
                        keys.join(", ")
                    )));
                }
            },
            other => {
                return Err(KernelError::UnsupportedShape(format!(
                    "expected a top-level array or object, found {}",
                    json_kind(other)
                )));
            }
        };

        let rows = items
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(fields) => row_from_object(index, fields),
                other => Err(KernelError::UnsupportedShape(format!(
                    "row {index} is {}, expected an object",
                    json_kind(other)
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(rows = rows.len(), "ingested row document");
        Ok(Self { rows })
    }

    /// Canonical-key JSON document (`{"rows": [...]}`).
    pub fn to_canonical_json(&self) -> Value {
        serde_json::json!({ "rows": self.rows })
    }
}

fn row_from_object(index: usize, fields: &Map<String, Value>) -> Result<Row, KernelError> {
    let mut row = Row {
        id: index,
        ..Row::default()
    };
    let mut sod: Option<&str> = None;

    for (key, value) in fields {
        if key == "SOD" {
            sod = value.as_str();
            continue;
        }
        let Some(kind) = FieldKind::resolve_alias(key) else {
            tracing::debug!(row = index, key = %key, "ignoring unknown row key");
            continue;
        };
        if kind.is_score() || kind == FieldKind::FunctionOrder {
            row.set_score(kind, score_value(index, kind, value)?);
        } else {
            row.set_text(kind, text_value(index, kind, value)?);
        }
    }

    if let Some((s, o, d)) = sod.and_then(parse_sod) {
        row.severity.get_or_insert(s);
        row.occurrence.get_or_insert(o);
        row.detection_rating.get_or_insert(d);
    }
    Ok(row)
}

fn text_value(index: usize, kind: FieldKind, value: &Value) -> Result<String, KernelError> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    KernelError::UnsupportedShape(format!(
                        "row {index} field `{kind}` has a non-string list entry"
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|lines| lines.join("\n")),
        other => Err(KernelError::UnsupportedShape(format!(
            "row {index} field `{kind}` is {}, expected text",
            json_kind(other)
        ))),
    }
}

/// Scores accept numbers and numeric strings. Unparseable text becomes
/// `None`, which validation reports as a missing score.
fn score_value(index: usize, kind: FieldKind, value: &Value) -> Result<Option<i64>, KernelError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(number) => Ok(number
            .as_i64()
            .or_else(|| number.as_f64().map(|f| f.round() as i64))),
        Value::String(text) if text.trim().is_empty() => Ok(None),
        Value::String(text) => {
            let parsed = text.trim().parse::<i64>().ok();
            if parsed.is_none() {
                tracing::warn!(row = index, field = %kind, value = %text, "score is not numeric");
            }
            Ok(parsed)
        }
        other => Err(KernelError::UnsupportedShape(format!(
            "row {index} field `{kind}` is {}, expected a number",
            json_kind(other)
        ))),
    }
}

/// Parse `S9xO3xD4` or the short `9x3x4` form.
pub fn parse_sod(text: &str) -> Option<(i64, i64, i64)> {
    static SOD_RE: OnceLock<Option<Regex>> = OnceLock::new();
    let re = SOD_RE
        .get_or_init(|| Regex::new(r"^S?(\d+)[xX]O?(\d+)[xX]D?(\d+)$").ok())
        .as_ref()?;
    let caps = re.captures(text.trim())?;
    let s = caps.get(1)?.as_str().parse().ok()?;
    let o = caps.get(2)?.as_str().parse().ok()?;
    let d = caps.get(3)?.as_str().parse().ok()?;
    Some((s, o, d))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn aliases_from_every_convention_land_on_one_row() {
        let doc = json!([{
            "part": "권선",
            "B": "전류를 흘린다",
            "고장영향": "통전 불가\n(출력 상실)",
            "심각도": "8",
            "E": "부족: 단선",
            "원인": "제작: 브레이징 불량",
            "G": "가열 부족 -> 접합 불량 -> 단선",
            "H": "[설계] 도면 검토",
            "O": 3,
            "검출방법": "시험: 저항 측정",
            "D": 4,
            "item_no": 17
        }]);
        let set = RowSet::from_json_value(&doc).unwrap();
        let row = &set.rows[0];
        assert_eq!(row.component, "권선");
        assert_eq!(row.severity, Some(8));
        assert_eq!(row.mode, "부족: 단선");
        assert_eq!(row.prevention, "설계: 도면 검토");
        assert_eq!(row.detection_rating, Some(4));
    }

    #[test]
    fn rows_wrapper_is_accepted_and_other_shapes_rejected() {
        let wrapped = json!({"rows": [{"기능": "지지"}], "category": "권선"});
        assert_eq!(RowSet::from_json_value(&wrapped).unwrap().len(), 1);

        let items = json!({"items": [{"기능": "지지"}]});
        let err = RowSet::from_json_value(&items).unwrap_err();
        assert!(matches!(err, KernelError::UnsupportedShape(_)));

        let scalar = json!("rows");
        assert!(RowSet::from_json_value(&scalar).is_err());

        let bad_row = json!([["not", "an", "object"]]);
        assert!(RowSet::from_json_value(&bad_row).is_err());
    }

    #[test]
    fn sod_string_fills_missing_scores() {
        let doc = json!([{"SOD": "S9xO3xD4", "O": 2}]);
        let row = &RowSet::from_json_value(&doc).unwrap().rows[0];
        assert_eq!(row.severity, Some(9));
        assert_eq!(row.occurrence, Some(2));
        assert_eq!(row.detection_rating, Some(4));
        assert_eq!(parse_sod("7x2x5"), Some((7, 2, 5)));
        assert_eq!(parse_sod("S7-O2-D5"), None);
    }

    #[test]
    fn ids_follow_input_order() {
        let doc = json!([{"기능": "a"}, {"기능": "b"}]);
        let set = RowSet::from_json_value(&doc).unwrap();
        let ids: Vec<usize> = set.rows.iter().map(|row| row.id).collect();
        assert_eq!(ids, vec![0, 1]);
    }
}
