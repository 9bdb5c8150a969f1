//! Dispatch policy for device reductions.
//!
//! ## Purpose
//!
//! This module chooses one of the three reduction strategies, and its tiling,
//! from the element count and the resolved group capacity of the device.
//!
//! ## Design notes
//!
//! * **Tiers**: Tiny inputs run as one sequential task, medium inputs fit in a
//!   single group's local memory when the group is large enough, and large
//!   inputs need several groups combined over multiple passes.
//! * **Local-memory budget**: The device's maximum group size is shrunk so a
//!   staging area of `local_memory_factor * size_of::<T>()` bytes per item
//!   fits in local memory. The factor of 2 is a pessimistic margin for memory
//!   the compiled kernel uses itself.
//! * **Tunable**: Thresholds and the tile table are configuration with the
//!   published defaults. The table brackets were tuned empirically against
//!   particular group-memory sizes.
//!
//! ## Invariants
//!
//! * `n > 0`.
//! * Every selected tile has a power-of-two group size no larger than the
//!   resolved group size (tree tiles are clamped down when needed).
//! * A tree tile consumes at least two elements per group.

// External dependencies
use core::mem::size_of;
use log::debug;

// Internal dependencies
use crate::device::Capabilities;

// ============================================================================
// Tile
// ============================================================================

/// Shape of one cooperative group: items per group and elements per item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    /// Items per cooperative group.
    pub work_group_size: usize,

    /// Input elements transformed by each item.
    pub iters_per_work_item: usize,
}

impl Tile {
    /// Create a tile.
    pub const fn new(work_group_size: usize, iters_per_work_item: usize) -> Self {
        Self {
            work_group_size,
            iters_per_work_item,
        }
    }

    /// Number of input elements one group consumes.
    #[inline]
    pub fn size_per_group(&self) -> usize {
        self.work_group_size * self.iters_per_work_item
    }

    /// Number of groups needed for `n` elements.
    #[inline]
    pub fn groups_for(&self, n: usize) -> usize {
        n.div_ceil(self.size_per_group())
    }

    /// Number of items needed for `n` elements.
    #[inline]
    pub fn items_for(&self, n: usize) -> usize {
        n.div_ceil(self.iters_per_work_item)
    }

    /// Same group size, with enough elements per item for one group to cover `n`.
    #[inline]
    pub fn covering(&self, n: usize) -> Self {
        Self {
            work_group_size: self.work_group_size,
            iters_per_work_item: self
                .iters_per_work_item
                .max(n.div_ceil(self.work_group_size)),
        }
    }

    /// Whether the group size is a non-zero power of two and items do work.
    pub fn is_valid(&self) -> bool {
        self.work_group_size.is_power_of_two() && self.iters_per_work_item > 0
    }
}

/// One row of the single-group tile table: inputs up to `max_n` use `tile`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileBracket {
    /// Largest element count of this bracket (inclusive).
    pub max_n: usize,

    /// Tile used for the bracket.
    pub tile: Tile,
}

impl TileBracket {
    /// Create a bracket.
    pub const fn new(max_n: usize, work_group_size: usize, iters_per_work_item: usize) -> Self {
        Self {
            max_n,
            tile: Tile::new(work_group_size, iters_per_work_item),
        }
    }
}

// ============================================================================
// Defaults
// ============================================================================

/// Inputs up to this size run as a single sequential task.
pub const SEQUENTIAL_THRESHOLD: usize = 64;

/// Inputs up to this size may run within one group.
pub const SINGLE_GROUP_LIMIT: usize = 65536;

/// Smallest resolved group size that enables the single-group strategy.
pub const MIN_SINGLE_GROUP_SIZE: usize = 512;

/// Local-memory bytes reserved per item, as a multiple of the accumulator size.
pub const LOCAL_MEMORY_FACTOR: usize = 2;

/// Single-group tile table.
pub const SMALL_TILE_TABLE: [TileBracket; 6] = [
    TileBracket::new(128, 128, 1),
    TileBracket::new(256, 256, 1),
    TileBracket::new(512, 256, 2),
    TileBracket::new(1024, 256, 4),
    TileBracket::new(2048, 256, 8),
    TileBracket::new(4096, 256, 16),
];

/// Single-group tile for inputs above the last table bracket.
pub const SMALL_FALLBACK_TILE: Tile = Tile::new(256, 32);

/// Tile of every tree pass.
pub const TREE_TILE: Tile = Tile::new(256, 32);

// ============================================================================
// Strategy
// ============================================================================

/// Reduction strategy chosen by the dispatch policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// One single-threaded task over the whole input.
    Sequential,

    /// One cooperative group using group-local memory.
    SingleGroup(Tile),

    /// Multi-pass reduction across many groups.
    Tree(Tile),
}

impl Strategy {
    /// Short name used in logs and kernel labels.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::SingleGroup(_) => "single_group",
            Self::Tree(_) => "tree",
        }
    }

    /// Tile of the strategy, if it launches groups.
    pub fn tile(&self) -> Option<Tile> {
        match self {
            Self::Sequential => None,
            Self::SingleGroup(tile) | Self::Tree(tile) => Some(*tile),
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Thresholds and tiles driving strategy selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReduceConfig {
    /// Inputs up to this size run sequentially.
    pub sequential_threshold: usize,

    /// Inputs up to this size may run within one group.
    pub single_group_limit: usize,

    /// Resolved group size required for the single-group strategy.
    pub min_single_group_size: usize,

    /// Local-memory bytes per item, in units of `size_of::<T>()`.
    pub local_memory_factor: usize,

    /// Single-group tiles by size bracket, ascending.
    pub tile_table: Vec<TileBracket>,

    /// Single-group tile above the last bracket.
    pub fallback_tile: Tile,

    /// Tile of every tree pass.
    pub tree_tile: Tile,

    /// Identity of the compiled unit, forwarded to devices that cache kernels.
    pub kernel_name: Option<&'static str>,
}

impl Default for ReduceConfig {
    fn default() -> Self {
        Self {
            sequential_threshold: SEQUENTIAL_THRESHOLD,
            single_group_limit: SINGLE_GROUP_LIMIT,
            min_single_group_size: MIN_SINGLE_GROUP_SIZE,
            local_memory_factor: LOCAL_MEMORY_FACTOR,
            tile_table: SMALL_TILE_TABLE.to_vec(),
            fallback_tile: SMALL_FALLBACK_TILE,
            tree_tile: TREE_TILE,
            kernel_name: None,
        }
    }
}

impl ReduceConfig {
    /// Device group size after shrinking to the local-memory budget for `T`.
    pub fn resolve_work_group_size<T, C: Capabilities + ?Sized>(&self, device: &C) -> usize {
        let max = device.max_work_group_size();
        let bytes_per_item = self.local_memory_factor * size_of::<T>().max(1);
        device.max_local_allocation_size(bytes_per_item, max)
    }

    /// Single-group tile for `n` elements.
    pub fn small_tile(&self, n: usize) -> Tile {
        self.tile_table
            .iter()
            .find(|bracket| n <= bracket.max_n)
            .map(|bracket| bracket.tile)
            .unwrap_or(self.fallback_tile)
    }

    /// Tree tile, clamped to what a group of `resolved` items can run.
    ///
    /// The clamped tile always consumes at least two elements per group, so
    /// every pass shrinks the problem.
    pub fn tree_tile_for(&self, resolved: usize) -> Tile {
        if resolved >= self.tree_tile.work_group_size {
            return self.tree_tile;
        }
        let clamped = if resolved == 0 {
            1
        } else {
            1usize << resolved.ilog2()
        };
        // A one-item group must still fold at least two elements per pass.
        let iters = if clamped == 1 {
            self.tree_tile.iters_per_work_item.max(2)
        } else {
            self.tree_tile.iters_per_work_item
        };
        Tile::new(clamped, iters)
    }

    /// Choose the strategy for `n` elements of accumulator type `T` on `device`.
    pub fn select_strategy<T, C: Capabilities + ?Sized>(&self, n: usize, device: &C) -> Strategy {
        debug_assert!(n > 0, "reduction over an empty range");

        if n <= self.sequential_threshold {
            debug!("{}: n={n} -> sequential", device.name());
            return Strategy::Sequential;
        }

        let resolved = self.resolve_work_group_size::<T, C>(device);

        let strategy = if n <= self.single_group_limit && resolved >= self.min_single_group_size {
            Strategy::SingleGroup(self.small_tile(n))
        } else {
            Strategy::Tree(self.tree_tile_for(resolved))
        };

        debug!(
            "{}: n={n}, group size {resolved} -> {} {:?}",
            device.name(),
            strategy.name(),
            strategy.tile()
        );
        strategy
    }
}
