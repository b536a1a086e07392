//! Error types for scene construction and GPU resource acquisition.
//!
//! Construction errors are raised synchronously by the mesh factory and abort
//! scene assembly. Acquisition errors come from the display surface or the GPU
//! and are handed back to whoever hosts the scene.

use thiserror::Error;

/// Invalid parameters passed to the procedural mesh factory.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstructionError {
    /// A size, radius or height was zero, negative or not finite.
    #[error("{what} must be positive and finite, got {value}")]
    NonPositiveDimension { what: &'static str, value: f32 },

    /// A primitive was asked for fewer segments than it can be built from.
    #[error("{what} needs at least {min} segments, got {value}")]
    TooFewSegments {
        what: &'static str,
        min: u32,
        value: u32,
    },

    /// A step, sensitivity or starting value that is NaN or infinite.
    #[error("{what} must be finite, got {value}")]
    NonFinite { what: &'static str, value: f32 },

    /// A random placement range or camera bound with nothing in it.
    #[error("{what} range {start}..{end} is empty")]
    EmptyRange {
        what: &'static str,
        start: f32,
        end: f32,
    },
}

/// The display surface or GPU could not be initialized.
#[derive(Error, Debug)]
pub enum ResourceAcquisitionError {
    #[error("could not create a surface for the window: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no compatible graphics adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("could not open the graphics device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("the surface reports no supported texture formats")]
    NoSurfaceFormat,

    #[error("could not create the window: {0}")]
    Window(#[from] winit::error::OsError),
}

/// Everything that can abort scene initialization.
#[derive(Error, Debug)]
pub enum ForestError {
    #[error("scene construction failed: {0}")]
    Construction(#[from] ConstructionError),

    #[error("resource acquisition failed: {0}")]
    ResourceAcquisition(#[from] ResourceAcquisitionError),
}

/// Rejects zero, negative and non-finite dimensions.
pub(crate) fn ensure_positive(what: &'static str, value: f32) -> std::result::Result<f32, ConstructionError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConstructionError::NonPositiveDimension { what, value })
    }
}

pub(crate) fn ensure_finite(what: &'static str, value: f32) -> std::result::Result<f32, ConstructionError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConstructionError::NonFinite { what, value })
    }
}

pub(crate) fn ensure_segments(
    what: &'static str,
    min: u32,
    value: u32,
) -> std::result::Result<u32, ConstructionError> {
    if value >= min {
        Ok(value)
    } else {
        Err(ConstructionError::TooFewSegments { what, min, value })
    }
}

pub(crate) fn ensure_range(
    what: &'static str,
    range: &std::ops::Range<f32>,
) -> std::result::Result<std::ops::Range<f32>, ConstructionError> {
    if range.start.is_finite() && range.end.is_finite() && range.start < range.end {
        Ok(range.clone())
    } else {
        Err(ConstructionError::EmptyRange {
            what,
            start: range.start,
            end: range.end,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_and_nan() {
        assert!(ensure_positive("size", 0.0).is_err());
        assert!(ensure_positive("size", -1.0).is_err());
        assert!(ensure_positive("size", f32::NAN).is_err());
        assert!(ensure_positive("size", f32::INFINITY).is_err());
        assert_eq!(ensure_positive("size", 0.5), Ok(0.5));
    }

    #[test]
    fn construction_error_message_names_the_parameter() {
        let err = ensure_positive("rock size", -2.0).unwrap_err();
        assert_eq!(err.to_string(), "rock size must be positive and finite, got -2");
    }

    #[test]
    fn empty_ranges_are_rejected() {
        assert!(ensure_range("rock size", &(1.0..1.0)).is_err());
        assert!(ensure_range("rock size", &(2.0..1.0)).is_err());
        assert_eq!(ensure_range("rock size", &(0.5..1.5)), Ok(0.5..1.5));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        assert_eq!(ensure_finite("wheel sensitivity", -0.5), Ok(-0.5));
        assert!(matches!(
            ensure_finite("wheel sensitivity", f32::NAN),
            Err(ConstructionError::NonFinite { .. })
        ));
        assert!(ensure_finite("wheel sensitivity", f32::NEG_INFINITY).is_err());
    }

    #[test]
    fn construction_error_converts_into_forest_error() {
        let err: ForestError = ensure_segments("cone", 3, 2).unwrap_err().into();
        assert!(matches!(err, ForestError::Construction(_)));
    }
}
