//! Static 3D point index with per-entry normals.
//!
//! Entries are collected by a [`SpatialIndexBuilder`] and become queryable
//! once [`balance`](SpatialIndexBuilder::balance)d. Each entry carries an
//! integer payload (an index into some external array) and optionally a normal.

use crate::float_types::Real;
use hashbrown::HashMap;
use kiddo::{KdTree, SquaredEuclidean};
use nalgebra::{Point3, Rotation3, Vector3};

/// Weight applied to the squared distance of an entry lying behind the query normal.
const BEHIND_PENALTY: Real = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Entry {
    index: usize,
    co: Point3<Real>,
    normal: Option<Vector3<Real>>,
}

/// A query hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest {
    /// Payload given at insertion time
    pub index: usize,
    /// Distance to the query, including the normal penalty when one applied
    pub dist: Real,
    pub co: Point3<Real>,
    pub normal: Option<Vector3<Real>>,
}

#[derive(Debug, Clone, Default)]
pub struct SpatialIndexBuilder {
    entries: Vec<Entry>,
}

impl SpatialIndexBuilder {
    pub fn with_capacity(capacity: usize) -> Self {
        SpatialIndexBuilder {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, index: usize, co: Point3<Real>, normal: Option<Vector3<Real>>) {
        self.entries.push(Entry { index, co, normal });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze the entries into a queryable index.
    ///
    /// Entries at the same position share one tree point, so any number of
    /// coincident entries is accepted.
    pub fn balance(self) -> SpatialIndex {
        let frame = skew_frame();
        let mut buckets: Vec<Vec<usize>> = Vec::new();
        let mut by_key: HashMap<[u64; 3], usize> = HashMap::with_capacity(self.entries.len());
        let mut tree: KdTree<Real, 3> = KdTree::with_capacity(self.entries.len().max(1));

        for (slot, entry) in self.entries.iter().enumerate() {
            let key = to_key(&frame, &entry.co);
            let bucket = *by_key.entry(key.map(exact_bits)).or_insert_with(|| {
                tree.add(&key, buckets.len() as u64);
                buckets.push(Vec::new());
                buckets.len() - 1
            });
            buckets[bucket].push(slot);
        }

        SpatialIndex {
            entries: self.entries,
            buckets,
            tree,
            frame,
        }
    }
}

/// Balanced, read-only spatial index.
pub struct SpatialIndex {
    entries: Vec<Entry>,
    /// Entry slots per tree point, ascending
    buckets: Vec<Vec<usize>>,
    tree: KdTree<Real, 3>,
    frame: Rotation3<Real>,
}

// Axis aligned geometry puts many points on the same coordinate plane, which
// kiddo cannot split. Points are stored in a fixed rotated frame instead;
// distances are unaffected.
fn skew_frame() -> Rotation3<Real> {
    Rotation3::from_euler_angles(0.613, 0.377, 0.829)
}

#[inline]
fn to_key(frame: &Rotation3<Real>, co: &Point3<Real>) -> [Real; 3] {
    let p = frame * co;
    [p.x, p.y, p.z]
}

/// Bit pattern identifying a coordinate, with -0.0 folded onto 0.0.
#[inline]
fn exact_bits(c: Real) -> u64 {
    u64::from((c + 0.0).to_bits())
}

impl SpatialIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn hit(&self, slot: usize, dist_sq: Real) -> Nearest {
        let entry = &self.entries[slot];
        Nearest {
            index: entry.index,
            dist: dist_sq.sqrt(),
            co: entry.co,
            normal: entry.normal,
        }
    }

    #[inline]
    fn slots(&self, item: u64) -> &[usize] {
        self.buckets
            .get(item as usize)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Closest entry to `co`, or `None` for an empty index.
    ///
    /// Of several entries at the closest position the first inserted wins.
    pub fn find_nearest(&self, co: &Point3<Real>) -> Option<Nearest> {
        if self.entries.is_empty() {
            return None;
        }
        let found = self.tree.nearest_one::<SquaredEuclidean>(&to_key(&self.frame, co));
        let slot = *self.slots(found.item).first()?;
        let dist_sq = (self.entries[slot].co - co).norm_squared();
        Some(self.hit(slot, dist_sq))
    }

    /// Up to `n` entries ordered by increasing distance to `co`.
    ///
    /// With a query `normal`, entries lying behind it (`(entry - co) . normal < 0`)
    /// have their squared distance multiplied by ten, which favours candidates
    /// in front of the query. Ties are broken by insertion order.
    pub fn find_n_nearest(
        &self,
        n: usize,
        co: &Point3<Real>,
        normal: Option<&Vector3<Real>>,
    ) -> Vec<Nearest> {
        if n == 0 || self.entries.is_empty() {
            return Vec::new();
        }
        let key = to_key(&self.frame, co);
        let penalized = |slot: usize| {
            let d = self.entries[slot].co - co;
            let dist_sq = d.norm_squared();
            match normal {
                Some(nor) if d.dot(nor) < 0.0 => dist_sq * BEHIND_PENALTY,
                _ => dist_sq,
            }
        };

        // the n closest positions hold at least n entries (or all of them),
        // so their worst penalized distance bounds the n-th best
        let seed: Vec<usize> = self
            .tree
            .nearest_n::<SquaredEuclidean>(&key, n.min(self.buckets.len()))
            .into_iter()
            .flat_map(|hit| self.slots(hit.item).iter().copied())
            .collect();
        let bound = seed.iter().map(|&slot| penalized(slot)).fold(0.0, Real::max);
        let radius = bound * (1.0 + 1e-6) + Real::EPSILON;

        let mut ranked: Vec<(Real, usize)> = self
            .tree
            .within::<SquaredEuclidean>(&key, radius)
            .into_iter()
            .flat_map(|hit| self.slots(hit.item).iter().copied())
            .chain(seed)
            .map(|slot| (penalized(slot), slot))
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        ranked.dedup_by_key(|entry| entry.1);
        ranked.truncate(n);

        ranked
            .into_iter()
            .map(|(dist_sq, slot)| self.hit(slot, dist_sq))
            .collect()
    }
}
