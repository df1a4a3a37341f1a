use super::side::Side;

/// Seed counts for both sides in a single vector, laid out as
/// `[north hole 1..=n, north store, south hole 1..=n, south store]`.
/// Holes are addressed 1-indexed from each side's own perspective, with
/// hole 1 farthest from that side's store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    n_holes: usize,
    seeds: Vec<u32>,
}

impl Board {
    /// Create a starting board with `n_stones` seeds in every hole
    pub fn new(n_holes: usize, n_stones: u32) -> Self {
        let mut seeds = vec![n_stones; 2 * (n_holes + 1)];
        seeds[n_holes] = 0;
        seeds[2 * n_holes + 1] = 0;
        Board { n_holes, seeds }
    }

    /// Build a board from an explicit seed vector in board layout order
    pub fn from_seeds(n_holes: usize, seeds: &[u32]) -> Self {
        assert_eq!(
            seeds.len(),
            2 * (n_holes + 1),
            "seed vector must cover both sides' holes and stores"
        );
        Board {
            n_holes,
            seeds: seeds.to_vec(),
        }
    }

    pub fn n_holes(&self) -> usize {
        self.n_holes
    }

    fn hole_index(&self, side: Side, hole: usize) -> usize {
        assert!(
            hole >= 1 && hole <= self.n_holes,
            "hole {} out of range 1..={}",
            hole,
            self.n_holes
        );
        match side {
            Side::North => hole - 1,
            Side::South => self.n_holes + 1 + (hole - 1),
        }
    }

    fn store_index(&self, side: Side) -> usize {
        match side {
            Side::North => self.n_holes,
            Side::South => 2 * self.n_holes + 1,
        }
    }

    /// Seeds in a single hole (1-indexed from the given side)
    pub fn seeds(&self, side: Side, hole: usize) -> u32 {
        self.seeds[self.hole_index(side, hole)]
    }

    pub fn set_seeds(&mut self, side: Side, hole: usize, seeds: u32) {
        let idx = self.hole_index(side, hole);
        self.seeds[idx] = seeds;
    }

    pub fn add_seeds(&mut self, side: Side, hole: usize, delta: u32) {
        let idx = self.hole_index(side, hole);
        self.seeds[idx] += delta;
    }

    /// Seeds in a side's store
    pub fn store(&self, side: Side) -> u32 {
        self.seeds[self.store_index(side)]
    }

    pub fn add_to_store(&mut self, side: Side, delta: u32) {
        let idx = self.store_index(side);
        self.seeds[idx] += delta;
    }

    /// One side's view of the board: `[hole 1 .. hole n, store]`.
    /// Concatenating both sides' views forms the model observation.
    pub fn holes(&self, side: Side) -> Vec<u32> {
        let mut view: Vec<u32> = (1..=self.n_holes).map(|h| self.seeds(side, h)).collect();
        view.push(self.store(side));
        view
    }

    /// Total seeds still sitting in a side's holes (store excluded)
    pub fn seeds_in_holes(&self, side: Side) -> u32 {
        (1..=self.n_holes).map(|h| self.seeds(side, h)).sum()
    }

    /// Whether all of a side's holes are empty
    pub fn side_empty(&self, side: Side) -> bool {
        self.seeds_in_holes(side) == 0
    }

    /// Whether sowing from this hole is legal for the side
    pub fn is_valid_move(&self, side: Side, hole: usize) -> bool {
        hole >= 1 && hole <= self.n_holes && self.seeds(side, hole) > 0
    }

    /// All legal holes for the side, 1-indexed
    pub fn valid_moves(&self, side: Side) -> Vec<usize> {
        (1..=self.n_holes)
            .filter(|&h| self.seeds(side, h) > 0)
            .collect()
    }
}
