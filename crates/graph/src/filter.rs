// Expressions use the JSON array form `["==", "sequence_id", "abc"]`,
// `["in", "creator_id", "a", "b"]`, `["all", expr, ...]`.

use std::cmp::Ordering;
use std::sync::Arc;

use serde_json::Value;

use crate::node::Node;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FilterKey {
    CameraType,
    CapturedAt,
    CreatorId,
    Id,
    MergeId,
    QualityScore,
    SequenceId,
}

impl FilterKey {
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "camera_type" => FilterKey::CameraType,
            "captured_at" => FilterKey::CapturedAt,
            "creator_id" => FilterKey::CreatorId,
            "id" => FilterKey::Id,
            "merge_id" => FilterKey::MergeId,
            "quality_score" => FilterKey::QualityScore,
            "sequence_id" => FilterKey::SequenceId,
            _ => return None,
        })
    }

    fn value_of(self, node: &Node) -> FilterValue {
        let text = |s: Option<&str>| s.map_or(FilterValue::Null, |s| FilterValue::String(s.to_string()));
        match self {
            FilterKey::CameraType => text(node.camera_type().map(|c| c.as_str())),
            FilterKey::CapturedAt => node
                .captured_at()
                .map_or(FilterValue::Null, |t| FilterValue::Number(t.millis() as f64)),
            FilterKey::CreatorId => text(node.creator_id()),
            FilterKey::Id => text(Some(node.key())),
            FilterKey::MergeId => text(node.merge_id()),
            FilterKey::QualityScore => node
                .quality_score()
                .map_or(FilterValue::Null, FilterValue::Number),
            FilterKey::SequenceId => text(Some(node.sequence_id())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl FilterValue {
    fn from_json(value: &Value) -> Result<Self, FilterError> {
        Ok(match value {
            Value::Null => FilterValue::Null,
            Value::Bool(b) => FilterValue::Bool(*b),
            Value::Number(n) => FilterValue::Number(
                n.as_f64()
                    .ok_or_else(|| FilterError::new(format!("unsupported number {n}")))?,
            ),
            Value::String(s) => FilterValue::String(s.clone()),
            other => return Err(FilterError::new(format!("unsupported value {other}"))),
        })
    }

    /// Ordering between values of the same kind; `None` across kinds.
    fn partial_cmp_same_kind(&self, other: &FilterValue) -> Option<Ordering> {
        match (self, other) {
            (FilterValue::Number(a), FilterValue::Number(b)) => a.partial_cmp(b),
            (FilterValue::String(a), FilterValue::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "==" => CompareOp::Eq,
            "!=" => CompareOp::Ne,
            "<" => CompareOp::Lt,
            "<=" => CompareOp::Le,
            ">" => CompareOp::Gt,
            ">=" => CompareOp::Ge,
            _ => return None,
        })
    }

    fn apply(self, lhs: &FilterValue, rhs: &FilterValue) -> bool {
        match self {
            CompareOp::Eq => lhs == rhs,
            CompareOp::Ne => lhs != rhs,
            CompareOp::Lt => lhs.partial_cmp_same_kind(rhs) == Some(Ordering::Less),
            CompareOp::Le => matches!(
                lhs.partial_cmp_same_kind(rhs),
                Some(Ordering::Less | Ordering::Equal)
            ),
            CompareOp::Gt => lhs.partial_cmp_same_kind(rhs) == Some(Ordering::Greater),
            CompareOp::Ge => matches!(
                lhs.partial_cmp_same_kind(rhs),
                Some(Ordering::Greater | Ordering::Equal)
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    Compare {
        op: CompareOp,
        key: FilterKey,
        value: FilterValue,
    },
    In {
        negate: bool,
        key: FilterKey,
        values: Vec<FilterValue>,
    },
    All(Vec<FilterExpr>),
}

impl FilterExpr {
    pub fn from_json_str(payload: &str) -> Result<Self, FilterError> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|e| FilterError::new(format!("invalid JSON: {e}")))?;
        Self::from_json(&value)
    }

    pub fn from_json(value: &Value) -> Result<Self, FilterError> {
        let items = value
            .as_array()
            .ok_or_else(|| FilterError::new("filter must be an array"))?;
        let op = items
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| FilterError::new("filter must start with an operator"))?;

        if op == "all" {
            let inner = items[1..]
                .iter()
                .map(FilterExpr::from_json)
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(FilterExpr::All(inner));
        }

        let key_name = items
            .get(1)
            .and_then(Value::as_str)
            .ok_or_else(|| FilterError::new(format!("operator {op} needs a property")))?;
        let key = FilterKey::parse(key_name)
            .ok_or_else(|| FilterError::new(format!("unknown property {key_name}")))?;

        if op == "in" || op == "!in" {
            let values = items[2..]
                .iter()
                .map(FilterValue::from_json)
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(FilterExpr::In {
                negate: op == "!in",
                key,
                values,
            });
        }

        let op = CompareOp::parse(op)
            .ok_or_else(|| FilterError::new(format!("unknown operator {op}")))?;
        if items.len() != 3 {
            return Err(FilterError::new("comparison needs exactly one value"));
        }
        Ok(FilterExpr::Compare {
            op,
            key,
            value: FilterValue::from_json(&items[2])?,
        })
    }

    pub fn matches(&self, node: &Node) -> bool {
        match self {
            FilterExpr::Compare { op, key, value } => op.apply(&key.value_of(node), value),
            FilterExpr::In {
                negate,
                key,
                values,
            } => {
                let v = key.value_of(node);
                values.contains(&v) != *negate
            }
            FilterExpr::All(inner) => inner.iter().all(|e| e.matches(node)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterError {
    message: String,
}

impl FilterError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FilterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid filter: {}", self.message)
    }
}

impl std::error::Error for FilterError {}

/// Predicate deciding which nodes may appear as edge targets.
#[derive(Clone)]
pub struct NodeFilter {
    predicate: Option<Arc<dyn Fn(&Node) -> bool + Send + Sync>>,
}

impl NodeFilter {
    pub fn allow_all() -> Self {
        Self { predicate: None }
    }

    pub fn from_fn(f: impl Fn(&Node) -> bool + Send + Sync + 'static) -> Self {
        Self {
            predicate: Some(Arc::new(f)),
        }
    }

    pub fn from_expr(expr: FilterExpr) -> Self {
        Self::from_fn(move |node| expr.matches(node))
    }

    pub fn is_allow_all(&self) -> bool {
        self.predicate.is_none()
    }

    pub fn matches(&self, node: &Node) -> bool {
        self.predicate.as_ref().is_none_or(|p| p(node))
    }
}

impl Default for NodeFilter {
    fn default() -> Self {
        Self::allow_all()
    }
}

impl std::fmt::Debug for NodeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeFilter")
            .field("allow_all", &self.is_allow_all())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{CompareOp, FilterExpr, FilterKey, FilterValue, NodeFilter};
    use crate::node::{Node, NodeId, SpatialData};
    use formats::{CoreImageContract, LngLatContract, SpatialImageContract};
    use foundation::geo::LngLatAlt;

    fn node(key: &str, sequence: &str, creator: &str, captured_at: i64) -> Node {
        let mut node = Node::from_core(
            NodeId(0),
            &CoreImageContract {
                id: key.into(),
                geometry: LngLatContract { lat: 0.0, lng: 0.0 },
                computed_geometry: None,
                sequence_id: sequence.into(),
            },
        );
        let spatial = SpatialImageContract {
            id: key.into(),
            altitude: None,
            atomic_scale: None,
            camera_parameters: None,
            camera_type: Some("spherical".into()),
            captured_at,
            computed_altitude: None,
            computed_compass_angle: None,
            computed_rotation: None,
            compass_angle: 0.0,
            creator_id: Some(creator.into()),
            exif_orientation: None,
            height: 1,
            width: 2,
            merge_id: None,
            mesh_url: None,
            quality_score: Some(0.75),
        };
        node.make_full(
            SpatialData::from_contract(&spatial, 2.0),
            LngLatAlt::default(),
        );
        node
    }

    #[test]
    fn parses_comparisons() {
        let expr = FilterExpr::from_json_str(r#"["==", "sequence_id", "s1"]"#).unwrap();
        assert_eq!(
            expr,
            FilterExpr::Compare {
                op: CompareOp::Eq,
                key: FilterKey::SequenceId,
                value: FilterValue::String("s1".into()),
            }
        );
        assert!(expr.matches(&node("a", "s1", "u", 0)));
        assert!(!expr.matches(&node("a", "s2", "u", 0)));
    }

    #[test]
    fn numeric_ordering_and_all() {
        let expr = FilterExpr::from_json_str(
            r#"["all", [">=", "captured_at", 100], ["<", "quality_score", 0.8], ["==", "camera_type", "spherical"]]"#,
        )
        .unwrap();
        assert!(expr.matches(&node("a", "s", "u", 100)));
        assert!(!expr.matches(&node("a", "s", "u", 99)));
        // Ordering across kinds never matches.
        let expr = FilterExpr::from_json_str(r#"["<", "creator_id", 5]"#).unwrap();
        assert!(!expr.matches(&node("a", "s", "u", 0)));
        assert!(FilterExpr::from_json_str(r#"["all"]"#).unwrap().matches(&node("a", "s", "u", 0)));
    }

    #[test]
    fn membership_and_null() {
        let expr = FilterExpr::from_json_str(r#"["in", "creator_id", "u1", "u2"]"#).unwrap();
        assert!(expr.matches(&node("a", "s", "u2", 0)));
        assert!(!expr.matches(&node("a", "s", "u3", 0)));
        let expr = FilterExpr::from_json_str(r#"["!in", "id", "a"]"#).unwrap();
        assert!(!expr.matches(&node("a", "s", "u", 0)));
        let expr = FilterExpr::from_json_str(r#"["==", "merge_id", null]"#).unwrap();
        assert!(expr.matches(&node("a", "s", "u", 0)));
    }

    #[test]
    fn rejects_malformed_expressions() {
        for bad in [
            r#"{}"#,
            r#"[]"#,
            r#"["==", "unknown", 1]"#,
            r#"["~=", "id", "a"]"#,
            r#"["==", "id"]"#,
            r#"["==", "id", [1]]"#,
        ] {
            assert!(FilterExpr::from_json_str(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn node_filter_wraps_closures() {
        let n = node("a", "s", "u", 0);
        assert!(NodeFilter::allow_all().matches(&n));
        assert!(NodeFilter::default().is_allow_all());
        let f = NodeFilter::from_fn(|node| node.key() != "a");
        assert!(!f.matches(&n));
        let f = NodeFilter::from_expr(FilterExpr::from_json_str(r#"["==", "id", "a"]"#).unwrap());
        assert!(f.matches(&n));
    }
}
