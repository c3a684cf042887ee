//! Sample and stroke model.
//!
//! A [`Stroke`] is one continuous pen-down-to-pen-up gesture: an ordered list
//! of [`Sample`]s plus opaque rendering attributes the engine never touches.
//!
//! Stroke identity is carried by [`StrokeId`], which is allocated by the input
//! capture layer through a [`StrokeIdAllocator`]. Two strokes with identical
//! samples are still different jobs if their ids differ, and a smoothed stroke
//! keeps the id of the stroke it was produced from.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Lowest pressure any pipeline stage will emit.
pub const MIN_PRESSURE: f32 = 0.1;

/// Highest pressure any pipeline stage will emit.
pub const MAX_PRESSURE: f32 = 1.0;

/// Clamps a raw pressure reading into the pipeline's valid range.
///
/// NaN readings are treated as the minimum pressure.
#[inline]
pub fn clamp_pressure(pressure: f32) -> f32 {
    if pressure.is_nan() {
        return MIN_PRESSURE;
    }
    pressure.clamp(MIN_PRESSURE, MAX_PRESSURE)
}

/// A single (x, y, pressure) reading along a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub pressure: f32,
}

impl Sample {
    /// Creates a sample, clamping pressure into `[MIN_PRESSURE, MAX_PRESSURE]`.
    pub fn new(x: f64, y: f64, pressure: f32) -> Self {
        Self {
            x,
            y,
            pressure: clamp_pressure(pressure),
        }
    }

    /// Euclidean distance to another sample (pressure is ignored).
    #[inline]
    pub fn distance(&self, other: &Sample) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Linear interpolation of position and pressure.
    #[inline]
    pub fn lerp(&self, other: &Sample, t: f64) -> Sample {
        let pressure = self.pressure + (other.pressure - self.pressure) * t as f32;
        Sample::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            pressure,
        )
    }

    /// Returns true if both coordinates and the pressure are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.pressure.is_finite()
    }
}

/// Opaque stroke identity used for cancellation and deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StrokeId(u64);

impl StrokeId {
    /// Wraps a raw id. Prefer [`StrokeIdAllocator::next_id`] for new strokes.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id value.
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for StrokeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stroke-{}", self.0)
    }
}

/// Monotonic stroke id allocator.
///
/// Owned by the input capture layer; cheap to share behind an `Arc`.
#[derive(Debug)]
pub struct StrokeIdAllocator {
    next: AtomicU64,
}

impl StrokeIdAllocator {
    /// Creates an allocator whose first id is 1.
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Creates an allocator starting at the given raw id.
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Hands out the next unused id.
    pub fn next_id(&self) -> StrokeId {
        StrokeId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for StrokeIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Rendering attributes carried through the engine untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeAttributes {
    /// RGBA color.
    pub color: [u8; 4],
    /// Nominal stroke width in canvas units.
    pub width: f32,
    /// Highlighter strokes render translucent and behind ink.
    pub is_highlighter: bool,
}

impl Default for StrokeAttributes {
    fn default() -> Self {
        Self {
            color: [0, 0, 0, 255],
            width: 2.0,
            is_highlighter: false,
        }
    }
}

/// One continuous gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub id: StrokeId,
    pub samples: Vec<Sample>,
    #[serde(default)]
    pub attributes: StrokeAttributes,
}

impl Stroke {
    /// Creates a stroke with default attributes.
    pub fn new(id: StrokeId, samples: Vec<Sample>) -> Self {
        Self {
            id,
            samples,
            attributes: StrokeAttributes::default(),
        }
    }

    /// Sets the rendering attributes.
    pub fn with_attributes(mut self, attributes: StrokeAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Builds a new stroke sharing this stroke's identity and attributes.
    pub fn with_samples(&self, samples: Vec<Sample>) -> Stroke {
        Stroke {
            id: self.id,
            samples,
            attributes: self.attributes.clone(),
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the stroke has no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Total polyline length.
    pub fn arc_length(&self) -> f64 {
        self.samples.windows(2).map(|w| w[0].distance(&w[1])).sum()
    }
}
