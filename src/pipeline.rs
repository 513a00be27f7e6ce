//! Image-to-names profiling: clustering or voting, naming, then rendering.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cluster::{self, ClusterOptions, MAX_CENTROIDS};
use crate::color_table::ColorTable;
use crate::error::{ProfileError, Result};
use crate::format::enumerate_names;
use crate::grid::PixelGrid;
use crate::namer::{self, VoteOrder};

/// Number of colors reported when the caller does not ask for a count.
pub const DEFAULT_K: usize = 3;

/// Largest `k` the centroid strategy accepts (`2 * k` centroids).
pub const MAX_CENTROID_K: usize = MAX_CENTROIDS / 2;

/// How pixels become names.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Cluster, then name each centroid (`/detect_color`).
    #[default]
    Centroid,
    /// Name every pixel and count votes (`/detect_color_2`).
    Vote,
}

impl FromStr for Strategy {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "centroid" | "kmeans" => Ok(Strategy::Centroid),
            "vote" | "pixel" => Ok(Strategy::Vote),
            other => Err(ProfileError::InvalidParameter(format!(
                "unknown strategy '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Centroid => f.write_str("centroid"),
            Strategy::Vote => f.write_str("vote"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProfileOptions {
    /// Base seed for clustering. `None` draws one from the OS per call.
    pub seed: Option<u64>,
    pub cluster: ClusterOptions,
    pub vote_order: VoteOrder,
    /// Shrink decoded images so the longest side is at most this many pixels.
    pub downscale: Option<u32>,
}

impl ProfileOptions {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_vote_order(mut self, order: VoteOrder) -> Self {
        self.vote_order = order;
        self
    }

    pub fn with_downscale(mut self, longest_side: u32) -> Self {
        self.downscale = Some(longest_side);
        self
    }
}

/// Parse the requested color count as sent by clients (a query string value).
///
/// A missing value means [`DEFAULT_K`]. Anything other than a positive
/// integer is rejected.
pub fn parse_k(raw: Option<&str>) -> Result<usize> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_K);
    };
    match raw.trim().parse::<usize>() {
        Ok(0) => Err(ProfileError::InvalidParameter(
            "k must be at least 1".into(),
        )),
        Ok(k) => Ok(k),
        Err(_) => Err(ProfileError::InvalidParameter(format!(
            "k must be a positive integer, got '{raw}'"
        ))),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedColor {
    pub name: String,
    /// Cluster centroid (centroid strategy) or table color (vote strategy).
    pub rgb: [u8; 3],
    /// Cluster population or vote count.
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColorProfile {
    pub strategy: Strategy,
    pub colors: Vec<RankedColor>,
    /// Narratable rendering of the names, e.g. `"Red, Green, and Blue"`.
    pub description: String,
}

impl ColorProfile {
    fn new(strategy: Strategy, colors: Vec<RankedColor>) -> Self {
        let description = enumerate_names(
            &colors.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
        );
        Self {
            strategy,
            colors,
            description,
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.colors.iter().map(|c| c.name.as_str()).collect()
    }

    /// Centroid colors; only the centroid strategy reports them.
    pub fn rgbs(&self) -> Option<Vec<[u8; 3]>> {
        match self.strategy {
            Strategy::Centroid => Some(self.colors.iter().map(|c| c.rgb).collect()),
            Strategy::Vote => None,
        }
    }

    pub fn to_response(&self) -> ColorResponse {
        ColorResponse {
            colors: self.description.clone(),
            rgb: self.rgbs(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// JSON body returned by the color endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorResponse {
    pub colors: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rgb: Option<Vec<[u8; 3]>>,
}

/// Profile the `k` most dominant colors of `grid`.
///
/// The centroid strategy orders by cluster population, most first. The vote
/// strategy orders its window per [`ProfileOptions::vote_order`]. An empty
/// grid gives an empty profile.
pub fn profile_colors(
    grid: &PixelGrid,
    k: usize,
    strategy: Strategy,
    table: &ColorTable,
    options: &ProfileOptions,
) -> Result<ColorProfile> {
    validate_k(k, strategy)?;

    if grid.is_empty() {
        log::warn!("profiling an empty image, returning no colors");
        return Ok(ColorProfile::new(strategy, Vec::new()));
    }

    let colors: Vec<RankedColor> = match strategy {
        Strategy::Centroid => {
            let seed = resolve_seed(options)?;
            let clusters = cluster::extract_clusters(grid.pixels(), k, seed, &options.cluster);
            let entries = namer::name_clusters(&clusters, table);
            clusters
                .iter()
                .zip(entries)
                .map(|(cluster, entry)| {
                    let rgb = cluster.rgb();
                    RankedColor {
                        name: entry.name.clone(),
                        rgb: [rgb.red, rgb.green, rgb.blue],
                        count: cluster.population,
                    }
                })
                .collect()
        }
        Strategy::Vote => namer::vote_colors(grid.pixels(), k, table, options.vote_order)
            .into_iter()
            .map(|vote| RankedColor {
                name: vote.entry.name.clone(),
                rgb: [vote.entry.rgb.red, vote.entry.rgb.green, vote.entry.rgb.blue],
                count: vote.votes,
            })
            .collect(),
    };

    let profile = ColorProfile::new(strategy, colors);
    log::debug!(
        "{strategy} profile of {} pixels (k={k}): {}",
        grid.len(),
        profile.description
    );
    Ok(profile)
}

/// Name of the single most dominant color, or `None` for an empty grid.
pub fn dominant_color_name(
    grid: &PixelGrid,
    table: &ColorTable,
    options: &ProfileOptions,
) -> Result<Option<RankedColor>> {
    if grid.is_empty() {
        return Ok(None);
    }
    let seed = resolve_seed(options)?;
    Ok(
        cluster::dominant_color(grid.pixels(), seed, &options.cluster).map(|cluster| {
            let rgb = cluster.rgb();
            let entry = &table.entries()[namer::nearest_index(table, cluster.channels())];
            RankedColor {
                name: entry.name.clone(),
                rgb: [rgb.red, rgb.green, rgb.blue],
                count: cluster.population,
            }
        }),
    )
}

fn validate_k(k: usize, strategy: Strategy) -> Result<()> {
    if k == 0 {
        return Err(ProfileError::InvalidParameter(
            "k must be at least 1".into(),
        ));
    }
    if strategy == Strategy::Centroid && k > MAX_CENTROID_K {
        return Err(ProfileError::InvalidParameter(format!(
            "k must be at most {MAX_CENTROID_K} for centroid matching, got {k}"
        )));
    }
    Ok(())
}

fn resolve_seed(options: &ProfileOptions) -> Result<u64> {
    match options.seed {
        Some(seed) => Ok(seed),
        None => Ok(getrandom::u64()?),
    }
}
