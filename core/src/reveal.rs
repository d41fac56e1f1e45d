use alloc::collections::{BTreeSet, VecDeque};
use alloc::vec::Vec;

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RevealOutcome {
    NoChange,
    Revealed,
    HitMine,
    Won,
}

/// Cells resolved by a single reveal pass, in resolution order.
#[derive(Clone, Debug, PartialEq)]
pub struct Reveal {
    pub outcome: RevealOutcome,
    pub cells: Vec<CellReport>,
    pub cells_remaining: CellCount,
}

/// Flood-fill over a [`Grid`].
///
/// Works off an explicit queue so large empty regions never recurse. Seeds are
/// processed in the order given, expansions after them. A mine ends the pass
/// on the spot, leaving whatever was cleared before it in place.
#[derive(Clone, Debug, Default)]
pub struct RevealEngine {
    to_visit: VecDeque<Coord2>,
    visited: BTreeSet<Coord2>,
}

impl RevealEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reveals `seeds` on `grid` and everything they cascade into.
    ///
    /// Coordinates are all checked before the grid is touched. Already
    /// cleared cells are skipped silently and produce no report.
    pub fn run(
        &mut self,
        grid: &mut Grid,
        seeds: &[Coord2],
        cells_remaining: CellCount,
    ) -> Result<Reveal> {
        for &coords in seeds {
            grid.validate_coords(coords)?;
        }

        self.to_visit.clear();
        self.visited.clear();
        self.to_visit.extend(seeds.iter().copied());

        let mut outcome = RevealOutcome::NoChange;
        let mut cells = Vec::new();
        let mut remaining = cells_remaining;

        while let Some(coords) = self.to_visit.pop_front() {
            if !self.visited.insert(coords) {
                continue;
            }

            match grid.state_at(coords) {
                CellState::Cleared => continue,
                CellState::Mine => {
                    cells.push(CellReport::mine(coords, grid.mine_count_around(coords)));
                    outcome = RevealOutcome::HitMine;
                    break;
                }
                CellState::Empty => {
                    grid.set_cleared(coords)?;
                    remaining = remaining.saturating_sub(1);

                    let surrounding = grid.mine_count_around(coords);
                    cells.push(CellReport::cleared(coords, surrounding));

                    if remaining == 0 {
                        outcome = RevealOutcome::Won;
                        break;
                    }
                    outcome = RevealOutcome::Revealed;

                    if surrounding == 0 {
                        let visited = &self.visited;
                        self.to_visit.extend(
                            grid.neighbors(coords)
                                .filter(|&pos| grid.state_at(pos) == CellState::Empty)
                                .filter(|pos| !visited.contains(pos)),
                        );
                    }
                }
            }
        }

        self.to_visit.clear();
        log::trace!(
            "reveal of {} seed(s) resolved {} cell(s): {:?}",
            seeds.len(),
            cells.len(),
            outcome
        );

        Ok(Reveal {
            outcome,
            cells,
            cells_remaining: remaining,
        })
    }
}
