use crate::error::{JmxError, JmxResult};
use serde::{Deserialize, Serialize};

/// Annotation-index bounds for edge trimming.
///
/// `start` is the first annotation kept; `end` is the last one kept, counted
/// from the end of the sequence (`-1` is the final annotation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimMargins {
    pub start: usize,
    pub end: isize,
}

impl TrimMargins {
    /// Keeps everything; trimming with these margins is the identity.
    pub const NONE: TrimMargins = TrimMargins { start: 0, end: -1 };

    pub fn new(start: usize, end: isize) -> Self {
        Self { start, end }
    }
}

impl Default for TrimMargins {
    fn default() -> Self {
        Self { start: 10, end: -5 }
    }
}

/// Detections and annotations left after trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trimmed {
    pub detections: Vec<i64>,
    pub annotations: Vec<i64>,
}

/// Drops leading/trailing annotations and every detection outside the window
/// spanning half an interval before the first kept annotation to half an
/// interval after the last kept one.
pub fn trim_after_detection(
    detections: &[i64],
    annotations: &[i64],
    margins: TrimMargins,
) -> JmxResult<Trimmed> {
    if margins == TrimMargins::NONE {
        return Ok(Trimmed {
            detections: detections.to_vec(),
            annotations: annotations.to_vec(),
        });
    }

    let len = annotations.len();
    let invalid = JmxError::InvalidTrimBounds {
        start: margins.start,
        end: margins.end,
        len,
    };
    let last = len as isize + margins.end;
    if margins.start < 1 || margins.end > -2 || last < 0 || (last as usize) < margins.start {
        return Err(invalid);
    }
    let first = margins.start;
    let last = last as usize;

    let lower = (annotations[first - 1] + annotations[first]) / 2;
    let upper = (annotations[last] + annotations[last + 1]) / 2;

    Ok(Trimmed {
        detections: detections
            .iter()
            .copied()
            .filter(|&d| d >= lower && d <= upper)
            .collect(),
        annotations: annotations[first..=last].to_vec(),
    })
}
