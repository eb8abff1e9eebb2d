// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Folio OCR pipeline.

use serde::{Deserialize, Serialize};

/// Confidence assumed for fragments whose engine reported none.
pub const IMPLICIT_CONFIDENCE: f32 = 1.0;

/// Where a fragment sits in the source image.
///
/// The pipeline never interprets regions; they are carried through to the
/// result so callers can draw overlays or crop.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Region {
    /// Engine reported no geometry.
    #[default]
    Unknown,
    /// Axis-aligned box in pixel coordinates of the image the engine saw.
    Rect {
        left: i32,
        top: i32,
        width: u32,
        height: u32,
    },
    /// Arbitrary polygon, vertices in drawing order.
    Polygon { points: Vec<(f32, f32)> },
}

impl Region {
    /// Smallest box enclosing both regions. `Unknown` is the identity.
    pub fn union(&self, other: &Region) -> Region {
        match (self.bounds(), other.bounds()) {
            (None, None) => Region::Unknown,
            (Some(a), None) | (None, Some(a)) => a.into_rect(),
            (Some(a), Some(b)) => Bounds {
                min_x: a.min_x.min(b.min_x),
                min_y: a.min_y.min(b.min_y),
                max_x: a.max_x.max(b.max_x),
                max_y: a.max_y.max(b.max_y),
            }
            .into_rect(),
        }
    }

    fn bounds(&self) -> Option<Bounds> {
        match self {
            Region::Unknown => None,
            Region::Rect {
                left,
                top,
                width,
                height,
            } => Some(Bounds {
                min_x: *left as f32,
                min_y: *top as f32,
                max_x: *left as f32 + *width as f32,
                max_y: *top as f32 + *height as f32,
            }),
            Region::Polygon { points } if points.is_empty() => None,
            Region::Polygon { points } => {
                let mut b = Bounds {
                    min_x: f32::INFINITY,
                    min_y: f32::INFINITY,
                    max_x: f32::NEG_INFINITY,
                    max_y: f32::NEG_INFINITY,
                };
                for &(x, y) in points {
                    b.min_x = b.min_x.min(x);
                    b.min_y = b.min_y.min(y);
                    b.max_x = b.max_x.max(x);
                    b.max_y = b.max_y.max(y);
                }
                Some(b)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    fn into_rect(self) -> Region {
        let left = self.min_x.floor() as i32;
        let top = self.min_y.floor() as i32;
        Region::Rect {
            left,
            top,
            width: (self.max_x.ceil() as i32 - left).max(0) as u32,
            height: (self.max_y.ceil() as i32 - top).max(0) as u32,
        }
    }
}

/// One unit of recognized text as reported by a recognition engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionFragment {
    pub region: Region,
    /// Recognized text; may be empty.
    pub text: String,
    /// Engine confidence normalized to [0, 1]. `None` when the engine does
    /// not report one.
    pub confidence: Option<f32>,
}

impl RecognitionFragment {
    pub fn new(region: Region, text: impl Into<String>, confidence: Option<f32>) -> Self {
        Self {
            region,
            text: text.into(),
            confidence,
        }
    }

    /// Fragment from a text-only engine.
    pub fn text_only(text: impl Into<String>) -> Self {
        Self::new(Region::Unknown, text, None)
    }

    /// Confidence used for filtering; a missing value counts as
    /// [`IMPLICIT_CONFIDENCE`].
    pub fn effective_confidence(&self) -> f32 {
        self.confidence.unwrap_or(IMPLICIT_CONFIDENCE)
    }
}

/// The pipeline's output for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrResult {
    /// Resolved absolute path of the source image.
    pub path: String,
    /// Retained fragment texts joined by newlines, trimmed. Empty when
    /// nothing was retained.
    pub text: String,
    /// Fragments that passed the confidence filter, in engine order.
    pub fragments: Vec<RecognitionFragment>,
}

impl OcrResult {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_confidence_counts_as_one() {
        let frag = RecognitionFragment::text_only("capítulo");
        assert_eq!(frag.effective_confidence(), 1.0);
        assert_eq!(frag.region, Region::Unknown);
    }

    #[test]
    fn union_of_rects() {
        let a = Region::Rect {
            left: 10,
            top: 20,
            width: 30,
            height: 10,
        };
        let b = Region::Rect {
            left: 5,
            top: 25,
            width: 10,
            height: 40,
        };
        assert_eq!(
            a.union(&b),
            Region::Rect {
                left: 5,
                top: 20,
                width: 35,
                height: 45
            }
        );
    }

    #[test]
    fn union_with_unknown_is_identity() {
        let a = Region::Rect {
            left: 1,
            top: 2,
            width: 3,
            height: 4,
        };
        assert_eq!(Region::Unknown.union(&a), a);
        assert_eq!(a.union(&Region::Unknown), a);
        assert_eq!(Region::Unknown.union(&Region::Unknown), Region::Unknown);
    }

    #[test]
    fn polygon_bounds_become_rect() {
        let poly = Region::Polygon {
            points: vec![(1.5, 2.0), (9.2, 2.0), (9.2, 7.5), (1.5, 7.5)],
        };
        assert_eq!(
            poly.union(&Region::Unknown),
            Region::Rect {
                left: 1,
                top: 2,
                width: 9,
                height: 6
            }
        );
    }

    #[test]
    fn result_serializes_region_tag() {
        let result = OcrResult {
            path: "/tmp/p.png".into(),
            text: "HOLA".into(),
            fragments: vec![RecognitionFragment::new(
                Region::Rect {
                    left: 0,
                    top: 0,
                    width: 4,
                    height: 4,
                },
                "HOLA",
                Some(0.95),
            )],
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains(r#""kind":"rect""#), "{json}");
        let back: OcrResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
