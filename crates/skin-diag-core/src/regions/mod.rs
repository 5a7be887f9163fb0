//! Region sanitizing and construction from photo findings.

mod build;
mod sanitize;

pub use build::{build_regions, region_style, BuiltRegion, RegionSet, MAX_REGIONS};
pub use sanitize::{
    sanitize_bbox, sanitize_corners, sanitize_heatmap, sanitize_polygon, Sanitized,
    SanitizedPolygon, BBOX_CLIP, CANONICAL_GRID, HEATMAP_CLIP, MAX_SOURCE_GRID, MIN_EXTENT,
};

/// Counts equal keys, keeping first-seen order.
pub(crate) fn count_by<K: PartialEq>(keys: impl IntoIterator<Item = K>) -> Vec<(K, usize)> {
    let mut out: Vec<(K, usize)> = Vec::new();
    for key in keys {
        match out.iter_mut().find(|(k, _)| *k == key) {
            Some((_, n)) => *n += 1,
            None => out.push((key, 1)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_by_keeps_insertion_order() {
        let counts = count_by(["b", "a", "b", "c", "a", "b"]);
        assert_eq!(counts, vec![("b", 3), ("a", 2), ("c", 1)]);
    }
}
