use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use crate::error::{OmsError, Result};

/// Inclusive span of run numbers. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RunRangeRepr")]
pub struct RunRange {
    start: u64,
    end: u64,
}

/// Unchecked wire form of [`RunRange`].
#[derive(Deserialize)]
struct RunRangeRepr {
    start: u64,
    end: u64,
}

impl TryFrom<RunRangeRepr> for RunRange {
    type Error = OmsError;

    fn try_from(repr: RunRangeRepr) -> Result<Self> {
        RunRange::new(repr.start, repr.end)
    }
}

impl RunRange {
    pub fn new(start: u64, end: u64) -> Result<Self> {
        if start > end {
            return Err(OmsError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A range covering exactly one run.
    pub fn single(run: u64) -> Self {
        Self {
            start: run,
            end: run,
        }
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    /// `end - start`, the quantity compared against a level's range limit.
    pub fn span(&self) -> u64 {
        self.end - self.start
    }
}

impl From<u64> for RunRange {
    fn from(run: u64) -> Self {
        RunRange::single(run)
    }
}

impl TryFrom<(u64, u64)> for RunRange {
    type Error = OmsError;

    fn try_from((start, end): (u64, u64)) -> Result<Self> {
        RunRange::new(start, end)
    }
}

impl fmt::Display for RunRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Run-number argument of a single query.
///
/// Mirrors the loosely-typed argument OMS scripts pass around: nothing, a
/// single run, or a pair. Anything else ends up as `Unrecognized` and the
/// query proceeds without a run filter.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RunSelector {
    /// No run-number filter.
    #[default]
    All,
    Single(u64),
    /// Inclusive bounds, forwarded as `GE` / `LE` without reordering.
    Range(u64, u64),
    Unrecognized(JsonValue),
}

impl From<u64> for RunSelector {
    fn from(run: u64) -> Self {
        RunSelector::Single(run)
    }
}

impl From<(u64, u64)> for RunSelector {
    fn from((start, end): (u64, u64)) -> Self {
        RunSelector::Range(start, end)
    }
}

impl From<RunRange> for RunSelector {
    fn from(range: RunRange) -> Self {
        RunSelector::Range(range.start, range.end)
    }
}

impl<T: Into<RunSelector>> From<Option<T>> for RunSelector {
    fn from(value: Option<T>) -> Self {
        value.map_or(RunSelector::All, Into::into)
    }
}

impl From<&[u64]> for RunSelector {
    fn from(runs: &[u64]) -> Self {
        match runs {
            [start, end] => RunSelector::Range(*start, *end),
            other => RunSelector::Unrecognized(JsonValue::from(other.to_vec())),
        }
    }
}

impl From<Vec<u64>> for RunSelector {
    fn from(runs: Vec<u64>) -> Self {
        RunSelector::from(runs.as_slice())
    }
}

impl From<JsonValue> for RunSelector {
    fn from(value: JsonValue) -> Self {
        match &value {
            JsonValue::Null => RunSelector::All,
            JsonValue::Number(n) => match n.as_u64() {
                Some(run) => RunSelector::Single(run),
                None => RunSelector::Unrecognized(value),
            },
            JsonValue::Array(items) if items.len() == 2 => {
                match (items[0].as_u64(), items[1].as_u64()) {
                    (Some(start), Some(end)) => RunSelector::Range(start, end),
                    _ => RunSelector::Unrecognized(value),
                }
            }
            _ => RunSelector::Unrecognized(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_run_range_rejects_inverted_bounds() {
        assert!(matches!(
            RunRange::new(20, 10),
            Err(OmsError::InvalidRange { start: 20, end: 10 })
        ));
        let range = RunRange::new(10, 20).unwrap();
        assert_eq!(range.span(), 10);
    }

    #[test]
    fn test_deserialize_validates_bounds() {
        let range: RunRange = serde_json::from_str(r#"{"start":10,"end":20}"#).unwrap();
        assert_eq!(range, RunRange::new(10, 20).unwrap());

        let err = serde_json::from_str::<RunRange>(r#"{"start":20,"end":10}"#).unwrap_err();
        assert!(err.to_string().contains("start 20 is greater than end 10"), "{}", err);
    }

    #[test]
    fn test_single_run_is_degenerate_range() {
        let range = RunRange::from(355_100);
        assert_eq!((range.start(), range.end()), (355_100, 355_100));
        assert_eq!(range.span(), 0);
    }

    #[test]
    fn test_selector_conversions() {
        assert_eq!(RunSelector::from(None::<u64>), RunSelector::All);
        assert_eq!(RunSelector::from(Some(42u64)), RunSelector::Single(42));
        assert_eq!(RunSelector::from((10u64, 20u64)), RunSelector::Range(10, 20));
        assert_eq!(RunSelector::from(vec![10u64, 20]), RunSelector::Range(10, 20));
        assert!(matches!(RunSelector::from(vec![1u64, 2, 3]), RunSelector::Unrecognized(_)));
    }

    #[test]
    fn test_selector_from_json() {
        assert_eq!(RunSelector::from(json!(null)), RunSelector::All);
        assert_eq!(RunSelector::from(json!(7)), RunSelector::Single(7));
        assert_eq!(RunSelector::from(json!([1, 5])), RunSelector::Range(1, 5));
        assert_eq!(
            RunSelector::from(json!("355100")),
            RunSelector::Unrecognized(json!("355100"))
        );
        assert_eq!(RunSelector::from(json!(-3)), RunSelector::Unrecognized(json!(-3)));
        assert!(matches!(RunSelector::from(json!([1, "x"])), RunSelector::Unrecognized(_)));
    }
}
