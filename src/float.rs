use num_traits::{Float as NumFloat, FloatConst, FromPrimitive};

use crate::element::Element;

/// Marker trait for floating-point elements (`f32`, `f64`).
///
/// Only these can carry derivative buffers; integer elements are value-only
/// and live behind [`Bare`](crate::Bare).
pub trait Float: Element + NumFloat + FloatConst + FromPrimitive {}

impl Float for f32 {}
impl Float for f64 {}
