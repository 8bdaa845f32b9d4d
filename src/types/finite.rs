//! Serializers that keep output arrays index-aligned
//!
//! Non-finite values are written as explicit nulls rather than dropped, so
//! sibling arrays such as `distance` and `delta` always have equal length.

use serde::Serializer;

pub(crate) fn finite<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.is_finite() { serializer.serialize_some(value) } else { serializer.serialize_none() }
}

pub(crate) fn finite_vec<S>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(values.iter().map(|v| v.is_finite().then_some(*v)))
}
