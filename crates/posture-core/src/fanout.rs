//! Parallel fan-out for plugins that run several independent detections

use crate::error::Result;
use rayon::prelude::*;

/// One independent detection inside a plugin
pub type Detection<'a, T> = Box<dyn FnOnce() -> Result<Vec<T>> + Send + 'a>;

/// Run detections on the rayon pool and flatten their results.
///
/// Results keep submission order: all of the first detection's findings come
/// before the second's. Fails with the first failing detection's error.
pub fn fan_out<T: Send>(detections: Vec<Detection<'_, T>>) -> Result<Vec<T>> {
    let results: Vec<Result<Vec<T>>> = detections
        .into_par_iter()
        .map(|detection| detection())
        .collect();

    let mut findings = Vec::new();
    for result in results {
        findings.extend(result?);
    }
    Ok(findings)
}
