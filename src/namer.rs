//! Resolve colors to names from a [`ColorTable`].
//!
//! Two strategies share the same nearest-entry rule: Euclidean distance in
//! RGB space, exact ties going to the earliest table row.

use std::collections::HashMap;

use palette::Srgb;

use crate::cluster::ColorCluster;
use crate::color_table::{ColorTable, PaletteEntry};

/// Order of the vote strategy's top-k window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VoteOrder {
    /// Fewest votes first. This is what the `/detect_color_2` endpoint has
    /// always returned, and stays the default so responses do not change.
    #[default]
    Ascending,
    /// Most votes first, matching the centroid strategy.
    Descending,
}

/// A table entry together with the number of pixels that voted for it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaletteVote<'a> {
    pub entry: &'a PaletteEntry,
    /// Row of `entry` in the table.
    pub index: usize,
    pub votes: usize,
}

/// Row index of the table entry closest to `rgb` (0..255 channels).
pub fn nearest_index(table: &ColorTable, rgb: [f32; 3]) -> usize {
    let mut best_idx = 0;
    let mut best_dist = f32::INFINITY;
    for (idx, entry) in table.entries().iter().enumerate() {
        let dist = distance_sq(rgb, entry.rgb);
        if dist < best_dist {
            best_dist = dist;
            best_idx = idx;
        }
    }
    best_idx
}

/// Closest table entry to an 8-bit color.
pub fn nearest_entry(table: &ColorTable, rgb: Srgb<u8>) -> &PaletteEntry {
    &table.entries()[nearest_index(table, to_channels(rgb))]
}

/// One table entry per cluster centroid, in the clusters' order.
pub fn name_clusters<'a>(clusters: &[ColorCluster], table: &'a ColorTable) -> Vec<&'a PaletteEntry> {
    clusters
        .iter()
        .map(|c| &table.entries()[nearest_index(table, c.channels())])
        .collect()
}

/// Classify every pixel to its nearest entry and return the `k` entries with
/// the most votes.
///
/// Entries with no votes never appear. The window is chosen by votes
/// (descending, earlier row first on ties) and then arranged per `order`.
pub fn vote_colors<'a>(
    pixels: &[Srgb<u8>],
    k: usize,
    table: &'a ColorTable,
    order: VoteOrder,
) -> Vec<PaletteVote<'a>> {
    let mut votes = vec![0usize; table.len()];

    // Identical pixels always land on the same entry; classify each color once.
    let mut counts: HashMap<[u8; 3], usize> = HashMap::new();
    for p in pixels {
        *counts.entry([p.red, p.green, p.blue]).or_insert(0) += 1;
    }
    for (rgb, count) in counts {
        let idx = nearest_index(table, rgb.map(f32::from));
        votes[idx] += count;
    }

    let mut ranked: Vec<PaletteVote<'a>> = votes
        .iter()
        .enumerate()
        .filter(|(_, v)| **v > 0)
        .map(|(index, &votes)| PaletteVote {
            entry: &table.entries()[index],
            index,
            votes,
        })
        .collect();

    ranked.sort_by(|a, b| b.votes.cmp(&a.votes));
    ranked.truncate(k);

    if order == VoteOrder::Ascending {
        ranked.sort_by(|a, b| a.votes.cmp(&b.votes));
    }
    log::debug!(
        "vote window: {:?}",
        ranked.iter().map(|v| (v.index, v.votes)).collect::<Vec<_>>()
    );
    ranked
}

fn to_channels(rgb: Srgb<u8>) -> [f32; 3] {
    [rgb.red as f32, rgb.green as f32, rgb.blue as f32]
}

#[inline(always)]
fn distance_sq(a: [f32; 3], b: Srgb<u8>) -> f32 {
    let dr = a[0] - b.red as f32;
    let dg = a[1] - b.green as f32;
    let db = a[2] - b.blue as f32;
    dr * dr + dg * dg + db * db
}
