/*!
 * Deterministic display colors for clusters.
 *
 * Colors come from a 20 entry categorical palette. The identities are put in order first, so the
 * same set of identities always maps to the same colors no matter what order they arrive in.
 */

use crate::record::RecordSet;
use std::{cmp::Ordering, collections::BTreeMap};

/// The alpha channel used for every cluster color.
pub const CLUSTER_ALPHA: u8 = 160;

/// The "tab20" categorical palette, as RGB.
const PALETTE: [[u8; 3]; 20] = [
    [0x1f, 0x77, 0xb4],
    [0xae, 0xc7, 0xe8],
    [0xff, 0x7f, 0x0e],
    [0xff, 0xbb, 0x78],
    [0x2c, 0xa0, 0x2c],
    [0x98, 0xdf, 0x8a],
    [0xd6, 0x27, 0x28],
    [0xff, 0x98, 0x96],
    [0x94, 0x67, 0xbd],
    [0xc5, 0xb0, 0xd5],
    [0x8c, 0x56, 0x4b],
    [0xc4, 0x9c, 0x94],
    [0xe3, 0x77, 0xc2],
    [0xf7, 0xb6, 0xd2],
    [0x7f, 0x7f, 0x7f],
    [0xc7, 0xc7, 0xc7],
    [0xbc, 0xbd, 0x22],
    [0xdb, 0xdb, 0x8d],
    [0x17, 0xbe, 0xcf],
    [0x9e, 0xda, 0xe5],
];

static_assertions::const_assert!(PALETTE.len() >= 2);
static_assertions::const_assert!(CLUSTER_ALPHA > 0);

/// An 8 bit per channel color with transparency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Rgba { r, g, b, a }
    }

    /// The channels in r, g, b, a order.
    pub fn channels(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// The color as a KML color string, which is hex in aabbggrr order.
    pub fn kml_hex(&self) -> String {
        format!("{:02x}{:02x}{:02x}{:02x}", self.a, self.b, self.g, self.r)
    }
}

/**
 * A mapping from cluster identity to its color.
 */
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorPalette(BTreeMap<String, Rgba>);

impl ColorPalette {
    /**
     * Build a palette for a set of identities.
     *
     * The identities are sorted numerically if they are all integers and lexically otherwise,
     * then each gets the next color. Up to 20 identities are spread evenly over the palette and
     * are all distinct, beyond that the palette repeats. Duplicate identities are ignored.
     */
    pub fn generate<S: AsRef<str>>(identities: &[S]) -> Self {
        let ordered = order_identities(identities);
        let n = ordered.len();

        let colors = ordered
            .into_iter()
            .enumerate()
            .map(|(i, id)| {
                let [r, g, b] = PALETTE[palette_index(i, n)];
                (id, Rgba::new(r, g, b, CLUSTER_ALPHA))
            })
            .collect();

        ColorPalette(colors)
    }

    /// Build a palette for the clusters present in a RecordSet.
    pub fn for_records(records: &RecordSet) -> Self {
        Self::generate(&cluster_identities(records))
    }

    pub fn get(&self, identity: &str) -> Option<Rgba> {
        self.0.get(identity).copied()
    }

    /// Look up the color of a numeric cluster id.
    pub fn get_cluster(&self, cluster_id: usize) -> Option<Rgba> {
        self.get(&cluster_id.to_string())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Rgba)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Set the color of every clustered record, records without a cluster get none.
    pub fn apply_to(&self, records: &mut RecordSet) {
        for rec in records.iter_mut() {
            rec.color = rec.cluster_id.and_then(|id| self.get_cluster(id));
        }
    }
}

/**
 * Keeps the most recently generated palette around.
 *
 * The palette is only generated again when the set of identities changes, for instance after
 * re-clustering with a different number of clusters.
 */
#[derive(Debug, Default)]
pub struct ColorAssigner {
    identities: Vec<String>,
    palette: ColorPalette,
}

impl ColorAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the palette for this set of identities.
    pub fn palette_for<S: AsRef<str>>(&mut self, identities: &[S]) -> &ColorPalette {
        let ordered = order_identities(identities);

        if ordered != self.identities || self.palette.len() != ordered.len() {
            log::debug!("generating colors for {} clusters", ordered.len());
            self.palette = ColorPalette::generate(&ordered);
            self.identities = ordered;
        }

        &self.palette
    }
}

/// The distinct cluster ids of a RecordSet as strings, ascending.
pub fn cluster_identities(records: &RecordSet) -> Vec<String> {
    let mut ids: Vec<usize> = records.iter().filter_map(|r| r.cluster_id).collect();
    ids.sort_unstable();
    ids.dedup();
    ids.into_iter().map(|id| id.to_string()).collect()
}

fn order_identities<S: AsRef<str>>(identities: &[S]) -> Vec<String> {
    let mut ordered: Vec<String> = identities.iter().map(|s| s.as_ref().to_owned()).collect();

    let all_numeric = ordered.iter().all(|s| s.parse::<i64>().is_ok());
    if all_numeric {
        ordered.sort_by(|a, b| compare_numeric(a, b));
    } else {
        ordered.sort();
    }
    ordered.dedup();

    ordered
}

fn compare_numeric(left: &str, right: &str) -> Ordering {
    match (left.parse::<i64>(), right.parse::<i64>()) {
        (Ok(l), Ok(r)) => l.cmp(&r).then_with(|| left.cmp(right)),
        _ => left.cmp(right),
    }
}

/// Which palette entry the i-th of n identities gets.
fn palette_index(i: usize, n: usize) -> usize {
    let size = PALETTE.len();

    if n > size {
        i % size
    } else if n <= 1 {
        0
    } else {
        // Evenly spaced positions in [0, 1] mapped onto the palette.
        ((i * size) / (n - 1)).min(size - 1)
    }
}
