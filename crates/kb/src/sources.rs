//! Source URI handling.
//!
//! Object-storage URIs are converted to HTTPS form before being surfaced
//! to the caller; duplicates are removed while preserving first-seen order.

use crate::types::CandidateHit;
use std::collections::HashSet;

/// Convert an `s3://bucket/key` URI to its HTTPS form.
///
/// The mapping is deterministic: the same bucket and key always yield the
/// same URL. Non-s3 URIs pass through unchanged.
pub fn to_https_url(uri: &str, region: &str) -> String {
    let Some(rest) = uri.strip_prefix("s3://") else {
        return uri.to_string();
    };

    match rest.split_once('/') {
        Some((bucket, key)) => {
            format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, key)
        }
        // Bucket-only URI
        None => format!("https://{}.s3.{}.amazonaws.com", rest, region),
    }
}

/// Collect the de-duplicated HTTPS source URLs for the admitted hits.
pub fn collect_source_urls(hits: &[CandidateHit], region: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for hit in hits {
        if hit.source.is_empty() {
            continue;
        }

        let url = to_https_url(&hit.source, region);
        if seen.insert(url.clone()) {
            urls.push(url);
        }
    }

    urls
}
