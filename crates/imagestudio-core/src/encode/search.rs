//! Quality selection, including the bounded target-size search.
//!
//! # Algorithm
//!
//! With a byte ceiling set, quality is found by bisection over [0, 1] for a
//! fixed 12 iterations:
//!
//! ```text
//! min = 0, max = 1, best = 0.1
//! repeat 12 times:
//!     mid = (min + max) / 2
//!     if size(encode(mid)) <= target { best = mid; min = mid } else { max = mid }
//! ```
//!
//! The search assumes encoded size never shrinks as quality grows. That is
//! not checked; an encoder that breaks it gets a worse but still terminating
//! answer. An unreachable ceiling is not an error: the result at quality 0.1
//! is returned with its real size and the caller decides what to do with it.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{resolve_format, EncodeError, EncodeFormat, RasterEncoder, TargetFormat};
use crate::decode::{Raster, SourceFormat, WidthSpec};

/// Bisection steps of the target-size search.
pub const SEARCH_ITERATIONS: u32 = 12;

/// Quality used when no probe fits under the target.
pub const FALLBACK_QUALITY: f64 = 0.1;

/// One encode job.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EncodeRequest {
    pub width_spec: WidthSpec,
    pub format: TargetFormat,
    /// Quality in (0, 1]. Ignored by PNG.
    pub quality: f64,
    /// Byte ceiling. `None` or zero encodes once at `quality`.
    pub target_size_bytes: Option<u64>,
}

impl Default for EncodeRequest {
    fn default() -> Self {
        Self {
            width_spec: WidthSpec::default(),
            format: TargetFormat::Original,
            quality: 0.8,
            target_size_bytes: None,
        }
    }
}

impl EncodeRequest {
    /// The byte ceiling, if one is actually in effect.
    pub fn size_target(&self) -> Option<u64> {
        self.target_size_bytes.filter(|&t| t > 0)
    }
}

/// An encoded output and what it took to get there.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeResult {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: EncodeFormat,
    /// Quality the bytes were produced at.
    pub quality: f64,
    pub size_bytes: u64,
}

impl EncodeResult {
    fn new(bytes: Vec<u8>, raster: &Raster, format: EncodeFormat, quality: f64) -> Self {
        let size_bytes = bytes.len() as u64;
        Self {
            bytes,
            width: raster.width,
            height: raster.height,
            format,
            quality,
            size_bytes,
        }
    }
}

/// Encode `raster` once at a fixed quality.
pub fn encode_at<E: RasterEncoder + ?Sized>(
    encoder: &E,
    raster: &Raster,
    format: EncodeFormat,
    quality: f64,
) -> Result<EncodeResult, EncodeError> {
    let bytes = encoder.encode(raster, format, quality)?;
    Ok(EncodeResult::new(bytes, raster, format, quality))
}

/// Find the highest quality whose output fits in `target_bytes`.
///
/// The bytes of the best fitting probe are returned as-is. If nothing fits,
/// one more encode is made at [`FALLBACK_QUALITY`].
///
/// # Errors
///
/// Only encoder failures are reported. Missing the target is not an error.
pub fn search_quality<E: RasterEncoder + ?Sized>(
    encoder: &E,
    raster: &Raster,
    format: EncodeFormat,
    target_bytes: u64,
) -> Result<EncodeResult, EncodeError> {
    let mut min = 0.0_f64;
    let mut max = 1.0_f64;
    let mut best: Option<(f64, Vec<u8>)> = None;

    for iteration in 0..SEARCH_ITERATIONS {
        let mid = (min + max) / 2.0;
        let bytes = encoder.encode(raster, format, mid)?;
        let size = bytes.len() as u64;
        let fits = size <= target_bytes;
        debug!(iteration, quality = mid, size, target_bytes, fits, "quality probe");

        if fits {
            best = Some((mid, bytes));
            min = mid;
        } else {
            max = mid;
        }
    }

    match best {
        Some((quality, bytes)) => Ok(EncodeResult::new(bytes, raster, format, quality)),
        None => {
            let result = encode_at(encoder, raster, format, FALLBACK_QUALITY)?;
            warn!(
                target_bytes,
                achieved = result.size_bytes,
                "size target unreachable, using fallback quality"
            );
            Ok(result)
        }
    }
}

/// Encode a raster that was loaded as `source` according to `request`.
///
/// Resizing is not done here; `request.width_spec` has already been applied
/// by the caller.
pub fn encode_raster<E: RasterEncoder + ?Sized>(
    encoder: &E,
    raster: &Raster,
    source: SourceFormat,
    request: &EncodeRequest,
) -> Result<EncodeResult, EncodeError> {
    let target = request.size_target();
    let format = resolve_format(request.format, source, target.is_some());

    match target {
        Some(bytes) => search_quality(encoder, raster, format, bytes),
        None => encode_at(encoder, raster, format, request.quality),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::ImageCodec;
    use crate::test_support::gradient_raster;
    use std::cell::{Cell, RefCell};

    /// Produces `max(floor, quality * scale)` zero bytes and records every call.
    struct LinearEncoder {
        scale: f64,
        floor: usize,
        calls: Cell<u32>,
        qualities: RefCell<Vec<f64>>,
    }

    impl LinearEncoder {
        fn new(scale: f64) -> Self {
            Self::with_floor(scale, 0)
        }

        fn with_floor(scale: f64, floor: usize) -> Self {
            Self {
                scale,
                floor,
                calls: Cell::new(0),
                qualities: RefCell::new(Vec::new()),
            }
        }
    }

    impl RasterEncoder for LinearEncoder {
        fn encode(
            &self,
            _raster: &Raster,
            _format: EncodeFormat,
            quality: f64,
        ) -> Result<Vec<u8>, EncodeError> {
            self.calls.set(self.calls.get() + 1);
            self.qualities.borrow_mut().push(quality);
            let len = ((quality * self.scale).floor() as usize).max(self.floor);
            Ok(vec![0; len])
        }
    }

    struct FailingEncoder;

    impl RasterEncoder for FailingEncoder {
        fn encode(&self, _: &Raster, format: EncodeFormat, _: f64) -> Result<Vec<u8>, EncodeError> {
            Err(EncodeError::EncodingFailed {
                format: if format == EncodeFormat::Jpeg { "JPEG" } else { "other" },
                message: "rejected".to_string(),
            })
        }
    }

    fn raster() -> Raster {
        Raster::filled(4, 4, [0, 0, 0, 255])
    }

    #[test]
    fn test_search_converges_under_target() {
        let k = 4_096_000.0;
        let enc = LinearEncoder::new(k);

        let result = search_quality(&enc, &raster(), EncodeFormat::Jpeg, 1_000_000).unwrap();

        assert!(result.size_bytes <= 1_000_000);
        assert!(1_000_000 - result.size_bytes <= 1_000 + 1);
        assert_eq!(enc.calls.get(), SEARCH_ITERATIONS);
    }

    #[test]
    fn test_first_step_is_half_quality() {
        let enc = LinearEncoder::new(1000.0);
        search_quality(&enc, &raster(), EncodeFormat::Jpeg, 600).unwrap();

        let probes = enc.qualities.borrow();
        assert_eq!(probes[0], 0.5);
        assert_eq!(probes[1], 0.75);
        assert_eq!(probes[2], 0.625);
    }

    #[test]
    fn test_unreachable_target_falls_back() {
        // 80 KB at q = 0.1 and nothing smaller
        let enc = LinearEncoder::with_floor(800_000.0, 80_000);

        let result = search_quality(&enc, &raster(), EncodeFormat::Jpeg, 50 * 1024).unwrap();

        assert_eq!(result.quality, FALLBACK_QUALITY);
        assert_eq!(result.size_bytes, 80_000);
        assert_eq!(enc.calls.get(), SEARCH_ITERATIONS + 1);
    }

    #[test]
    fn test_reuses_best_fitting_bytes() {
        let enc = LinearEncoder::new(1000.0);
        let result = search_quality(&enc, &raster(), EncodeFormat::Jpeg, 2000).unwrap();

        // every probe fits, so best is the last one and no extra encode happens
        assert_eq!(enc.calls.get(), SEARCH_ITERATIONS);
        assert_eq!(result.quality, 1.0 - 0.5f64.powi(SEARCH_ITERATIONS as i32));
        assert_eq!(result.size_bytes, result.bytes.len() as u64);
    }

    #[test]
    fn test_search_propagates_encoder_failure() {
        let result = search_quality(&FailingEncoder, &raster(), EncodeFormat::Jpeg, 100);
        assert!(matches!(result, Err(EncodeError::EncodingFailed { .. })));
    }

    #[test]
    fn test_request_without_target_encodes_once() {
        let enc = LinearEncoder::new(1000.0);
        let request = EncodeRequest {
            quality: 0.42,
            ..EncodeRequest::default()
        };

        let result = encode_raster(&enc, &raster(), SourceFormat::Jpeg, &request).unwrap();

        assert_eq!(enc.calls.get(), 1);
        assert_eq!(result.quality, 0.42);
        assert_eq!(result.format, EncodeFormat::Jpeg);
        assert_eq!((result.width, result.height), (4, 4));
    }

    #[test]
    fn test_zero_target_means_no_search() {
        let enc = LinearEncoder::new(1000.0);
        let request = EncodeRequest {
            target_size_bytes: Some(0),
            ..EncodeRequest::default()
        };

        let result = encode_raster(&enc, &raster(), SourceFormat::Png, &request).unwrap();

        assert_eq!(enc.calls.get(), 1);
        assert_eq!(result.format, EncodeFormat::Png);
    }

    #[test]
    fn test_target_on_png_source_switches_to_jpeg() {
        let enc = LinearEncoder::new(1000.0);
        let request = EncodeRequest {
            target_size_bytes: Some(500),
            ..EncodeRequest::default()
        };

        let result = encode_raster(&enc, &raster(), SourceFormat::Png, &request).unwrap();

        assert_eq!(result.format, EncodeFormat::Jpeg);
        assert!(result.size_bytes <= 500);
    }

    #[test]
    fn test_real_codec_meets_reachable_target() {
        let raster = gradient_raster(256, 256);
        let loose = ImageCodec.encode(&raster, EncodeFormat::Jpeg, 0.9).unwrap().len() as u64;

        let result = search_quality(&ImageCodec, &raster, EncodeFormat::Jpeg, loose).unwrap();

        assert!(result.size_bytes <= loose);
        assert!(result.quality >= 0.5);
        assert_eq!(&result.bytes[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_webp_target_keeps_webp() {
        let raster = gradient_raster(128, 128);
        let full = ImageCodec.encode(&raster, EncodeFormat::Webp, 1.0).unwrap().len() as u64;
        let coarse = ImageCodec.encode(&raster, EncodeFormat::Webp, 0.1).unwrap().len() as u64;
        assert!(coarse < full);

        let request = EncodeRequest {
            format: TargetFormat::Webp,
            target_size_bytes: Some((full + coarse) / 2),
            ..EncodeRequest::default()
        };
        let result = encode_raster(&ImageCodec, &raster, SourceFormat::Png, &request).unwrap();

        assert_eq!(result.format, EncodeFormat::Webp);
        assert!(result.size_bytes <= (full + coarse) / 2);
        assert!(result.quality < 1.0);
        assert_eq!(&result.bytes[8..12], b"WEBP");
    }
}
