//! High-level image operations.
//!
//! These functions combine the backend with the exporters' needs: every image
//! a page references is decoded up front, in parallel, and the export only
//! continues once every decode has either produced pixels or failed.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::source::ImageSource;
use image::DynamicImage;
use rayon::prelude::*;

/// Result of one decode within a batch, tagged with the caller's key.
#[derive(Debug)]
pub struct Decoded<K> {
    pub key: K,
    pub result: Result<DynamicImage, BackendError>,
}

/// Decode every source in parallel and wait for all of them.
///
/// Failures are returned alongside successes rather than short-circuiting:
/// one bad image must not sink the batch. Output order matches input order.
pub fn decode_all<K>(backend: &impl ImageBackend, jobs: Vec<(K, ImageSource)>) -> Vec<Decoded<K>>
where
    K: Send,
{
    jobs.into_par_iter()
        .map(|(key, source)| {
            let result = backend.decode(&source);
            if let Err(e) = &result {
                tracing::debug!(error = %e, bytes = source.len(), "decode failed");
            }
            Decoded { key, result }
        })
        .collect()
}

/// Read the dimensions of every source in parallel. Output order matches input order.
pub fn identify_all<K>(
    backend: &impl ImageBackend,
    jobs: Vec<(K, ImageSource)>,
) -> Vec<(K, Result<Dimensions, BackendError>)>
where
    K: Send,
{
    jobs.into_par_iter()
        .map(|(key, source)| {
            let result = backend.identify(&source);
            (key, result)
        })
        .collect()
}
