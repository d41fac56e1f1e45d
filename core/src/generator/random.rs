use ndarray::Array2;

use super::*;

/// Purely random placement of exactly `config.mines` mines, reproducible from the seed.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomLayoutGenerator {
    seed: u64,
}

impl RandomLayoutGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl LayoutGenerator for RandomLayoutGenerator {
    fn generate(self, config: GameConfig) -> Grid {
        use rand::prelude::*;

        let total_cells = config.total_cells();
        let mut mines: Array2<bool> = Array2::default(config.size.to_nd_index());

        // optimize for full boards, validated configs never get here
        if config.mines >= total_cells {
            log::warn!(
                "Minefield already full, generated anyway, requested {} but only fits {}",
                config.mines,
                total_cells
            );
            mines.fill(true);
            return Grid::from_mine_mask(&mines);
        }

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut free_cells = total_cells;
        let mut mines_placed = 0;

        for cell in mines.iter_mut() {
            if mines_placed == config.mines {
                break;
            }
            // selection sampling, every subset of the right size is equally likely
            let still_needed = config.mines - mines_placed;
            if rng.random_range(0..free_cells) < still_needed {
                *cell = true;
                mines_placed += 1;
            }
            free_cells -= 1;
        }

        let grid = Grid::from_mine_mask(&mines);
        if grid.mine_count() != config.mines {
            log::warn!(
                "Generated minefield count mismatch, actual: {}, requested: {}",
                grid.mine_count(),
                config.mines
            );
        }
        grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn places_exact_mine_count() {
        for seed in 0..32 {
            let config = GameConfig::try_new((9, 7), 20).unwrap();
            let grid = RandomLayoutGenerator::new(seed).generate(config);

            assert_eq!(grid.size(), (9, 7));
            assert_eq!(grid.mine_count(), 20);
        }
    }

    #[test]
    fn same_seed_same_layout() {
        let config = GameConfig::try_new((16, 16), 40).unwrap();

        let a = RandomLayoutGenerator::new(42).generate(config);
        let b = RandomLayoutGenerator::new(42).generate(config);

        assert_eq!(a, b);
    }

    #[test]
    fn two_by_two_board_has_one_mine() {
        let config = GameConfig::try_new((2, 2), 1).unwrap();
        let grid = RandomLayoutGenerator::new(7).generate(config);

        let mines = grid.layout().iter().filter(|cell| cell.is_mine()).count();
        assert_eq!(mines, 1);
    }
}
