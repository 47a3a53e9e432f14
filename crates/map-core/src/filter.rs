//! Altitude filter compilation and layer visibility projection.
//!
//! Filters are boolean expression trees in the MapLibre style-spec form. The
//! altitude filter keeps a feature when its band `[lower, upper]` overlaps the
//! selected range, reading each bound with a coalesce fallback to the other
//! bound (then 0) so features that report only one bound stay matchable.

use std::cmp::Ordering;

use advisory_common::{AltitudeRange, Category, Properties, VisibilitySet};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};
use tracing::debug;

use crate::engine::{MapEngine, Visibility};
use crate::error::{MapError, MapResult};
use crate::handle::{LoadedSignal, MapHandle};

/// A filter expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// True when every operand is true.
    All(Vec<Expression>),
    LessOrEqual(Box<Expression>, Box<Expression>),
    GreaterOrEqual(Box<Expression>, Box<Expression>),
    /// First operand that does not evaluate to null.
    Coalesce(Vec<Expression>),
    /// Feature attribute lookup; null when absent.
    Get(String),
    Literal(Value),
}

impl Expression {
    pub fn get(prop: impl Into<String>) -> Self {
        Expression::Get(prop.into())
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn le(lhs: Expression, rhs: Expression) -> Self {
        Expression::LessOrEqual(Box::new(lhs), Box::new(rhs))
    }

    pub fn ge(lhs: Expression, rhs: Expression) -> Self {
        Expression::GreaterOrEqual(Box::new(lhs), Box::new(rhs))
    }

    /// Evaluate against a feature's attributes.
    pub fn evaluate(&self, properties: Option<&Properties>) -> Value {
        match self {
            Expression::All(operands) => {
                Value::Bool(operands.iter().all(|e| e.evaluate(properties) == Value::Bool(true)))
            }
            Expression::LessOrEqual(lhs, rhs) => Value::Bool(matches!(
                compare(&lhs.evaluate(properties), &rhs.evaluate(properties)),
                Some(Ordering::Less | Ordering::Equal)
            )),
            Expression::GreaterOrEqual(lhs, rhs) => Value::Bool(matches!(
                compare(&lhs.evaluate(properties), &rhs.evaluate(properties)),
                Some(Ordering::Greater | Ordering::Equal)
            )),
            Expression::Coalesce(operands) => operands
                .iter()
                .map(|e| e.evaluate(properties))
                .find(|v| !v.is_null())
                .unwrap_or(Value::Null),
            Expression::Get(prop) => properties
                .and_then(|p| p.get(prop))
                .cloned()
                .unwrap_or(Value::Null),
            Expression::Literal(value) => value.clone(),
        }
    }

    /// Whether a feature with these attributes passes the filter.
    pub fn matches(&self, properties: Option<&Properties>) -> bool {
        self.evaluate(properties) == Value::Bool(true)
    }

    /// Style-spec JSON array form.
    pub fn to_json(&self) -> Value {
        match self {
            Expression::All(operands) => {
                let mut array = vec![json!("all")];
                array.extend(operands.iter().map(Expression::to_json));
                Value::Array(array)
            }
            Expression::LessOrEqual(lhs, rhs) => json!(["<=", lhs.to_json(), rhs.to_json()]),
            Expression::GreaterOrEqual(lhs, rhs) => json!([">=", lhs.to_json(), rhs.to_json()]),
            Expression::Coalesce(operands) => {
                let mut array = vec![json!("coalesce")];
                array.extend(operands.iter().map(Expression::to_json));
                Value::Array(array)
            }
            Expression::Get(prop) => json!(["get", prop]),
            Expression::Literal(value) => value.clone(),
        }
    }

    /// Parse the style-spec JSON array form.
    pub fn from_json(value: &Value) -> MapResult<Self> {
        let Value::Array(items) = value else {
            return Ok(Expression::Literal(value.clone()));
        };
        let Some((op, args)) = items.split_first() else {
            return Err(MapError::InvalidExpression("empty expression".to_string()));
        };
        let op = op
            .as_str()
            .ok_or_else(|| MapError::InvalidExpression(format!("operator must be a string: {}", op)))?;

        let parse_all = |args: &[Value]| -> MapResult<Vec<Expression>> {
            args.iter().map(Expression::from_json).collect()
        };

        match (op, args) {
            ("all", args) => Ok(Expression::All(parse_all(args)?)),
            ("coalesce", args) => Ok(Expression::Coalesce(parse_all(args)?)),
            ("<=", [lhs, rhs]) => Ok(Expression::le(Self::from_json(lhs)?, Self::from_json(rhs)?)),
            (">=", [lhs, rhs]) => Ok(Expression::ge(Self::from_json(lhs)?, Self::from_json(rhs)?)),
            ("get", [Value::String(prop)]) => Ok(Expression::Get(prop.clone())),
            (op, args) => Err(MapError::InvalidExpression(format!(
                "unsupported operator '{}' with {} arguments",
                op,
                args.len()
            ))),
        }
    }
}

fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

impl Serialize for Expression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Expression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Expression::from_json(&value).map_err(D::Error::custom)
    }
}

/// Compile the altitude overlap filter for one attribute pair.
///
/// ```text
/// all(
///   coalesce(get(lower), get(upper), 0) <= max,
///   coalesce(get(upper), get(lower), 0) >= min
/// )
/// ```
pub fn build_altitude_filter(lower_prop: &str, upper_prop: &str, min: u32, max: u32) -> Expression {
    let lower = Expression::Coalesce(vec![
        Expression::get(lower_prop),
        Expression::get(upper_prop),
        Expression::literal(0),
    ]);
    let upper = Expression::Coalesce(vec![
        Expression::get(upper_prop),
        Expression::get(lower_prop),
        Expression::literal(0),
    ]);
    Expression::All(vec![
        Expression::le(lower, Expression::literal(max)),
        Expression::ge(upper, Expression::literal(min)),
    ])
}

/// Altitude filter for a category's configured attribute pair.
pub fn category_filter(category: Category, range: AltitudeRange) -> Expression {
    let (lower, upper) = category.spec().filter_altitude_props;
    build_altitude_filter(lower, upper, range.min(), range.max())
}

/// Layer visibility for a category: visible iff it is in the set.
pub fn project_visibility(category: Category, visible: &VisibilitySet) -> Visibility {
    if visible.contains(category) {
        Visibility::Visible
    } else {
        Visibility::None
    }
}

/// Push visibility and altitude filter to every existing category layer.
///
/// Hidden layers still receive their filter. Layers not created yet are
/// skipped; they are picked up on the next call after reconciliation.
/// Returns false when the map is not loaded or no longer live.
pub fn apply_filter_inputs<E: MapEngine>(
    handle: &MapHandle<E>,
    loaded: &LoadedSignal,
    visible: &VisibilitySet,
    range: AltitudeRange,
) -> MapResult<bool> {
    if !loaded.is_loaded() {
        return Ok(false);
    }

    let applied = handle.with(|engine| -> MapResult<()> {
        for category in Category::ALL {
            let layer_id = category.spec().layer_id;
            if !engine.has_layer(layer_id) {
                debug!(layer = layer_id, "Layer not created yet; filter deferred");
                continue;
            }
            engine.set_visibility(layer_id, project_visibility(category, visible))?;
            engine.set_filter(layer_id, category_filter(category, range))?;
        }
        Ok(())
    });

    match applied {
        Some(result) => result.map(|_| true),
        None => Ok(false),
    }
}
