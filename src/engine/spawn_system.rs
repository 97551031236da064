use std::collections::HashSet;

use crate::grid::in_bounds;
use crate::rng::RandomSource;
use crate::types::{BonusItem, Direction, Food, FoodKind, Vec2};

const FALLBACK_HEAD: Vec2 = Vec2::new(1, 1);
const FALLBACK_DIR: Direction = Direction::Right;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedSnake {
    pub body: Vec<Vec2>,
    pub dir: Direction,
}

pub fn find_free_cell<R>(grid_size: i32, occupied: &HashSet<Vec2>, rng: &mut R) -> Option<Vec2>
where
    R: RandomSource + ?Sized,
{
    let mut free = Vec::new();
    for y in 0..grid_size {
        for x in 0..grid_size {
            let cell = Vec2::new(x, y);
            if !occupied.contains(&cell) {
                free.push(cell);
            }
        }
    }
    if free.is_empty() {
        return None;
    }
    Some(free[rng.pick_index(free.len())])
}

pub fn straight_body(head: Vec2, dir: Direction, length: usize) -> Vec<Vec2> {
    let delta = dir.delta();
    (0..length as i32)
        .map(|i| Vec2::new(head.x - delta.x * i, head.y - delta.y * i))
        .collect()
}

/// Random straight placement that neither crosses the wrap seam nor touches
/// `occupied`. After `attempts` failed trials this returns a one-cell snake
/// at (1, 1) heading right, overlap or not.
pub fn place_snake<R>(
    grid_size: i32,
    occupied: &HashSet<Vec2>,
    length: usize,
    attempts: u32,
    rng: &mut R,
) -> PlacedSnake
where
    R: RandomSource + ?Sized,
{
    for _ in 0..attempts {
        let dir = Direction::ALL[rng.pick_index(Direction::ALL.len())];
        let head = Vec2::new(
            rng.pick_index(grid_size as usize) as i32,
            rng.pick_index(grid_size as usize) as i32,
        );
        let body = straight_body(head, dir, length);
        if !body.iter().all(|cell| in_bounds(*cell, grid_size)) {
            continue;
        }
        if body.iter().any(|cell| occupied.contains(cell)) {
            continue;
        }
        return PlacedSnake { body, dir };
    }
    PlacedSnake {
        body: vec![FALLBACK_HEAD],
        dir: FALLBACK_DIR,
    }
}

pub fn pick_food_kind<R>(shield_chance: f32, rng: &mut R) -> FoodKind
where
    R: RandomSource + ?Sized,
{
    if shield_chance > 0.0 && rng.bool(shield_chance) {
        FoodKind::Shield
    } else {
        FoodKind::Apple
    }
}

pub fn spawn_food<R>(
    grid_size: i32,
    occupied: &HashSet<Vec2>,
    shield_chance: f32,
    rng: &mut R,
) -> Option<Food>
where
    R: RandomSource + ?Sized,
{
    let pos = find_free_cell(grid_size, occupied, rng)?;
    let kind = pick_food_kind(shield_chance, rng);
    Some(Food { pos, kind })
}

pub fn maybe_spawn_bonus<R>(
    grid_size: i32,
    occupied: &HashSet<Vec2>,
    spawn_chance: f32,
    lifetime_ticks: u32,
    rng: &mut R,
) -> Option<BonusItem>
where
    R: RandomSource + ?Sized,
{
    if !rng.bool(spawn_chance) {
        return None;
    }
    let pos = find_free_cell(grid_size, occupied, rng)?;
    Some(BonusItem {
        pos,
        ticks_left: lifetime_ticks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{Rng, SequenceRng};

    fn all_cells_but(grid_size: i32, keep: &[Vec2]) -> HashSet<Vec2> {
        let mut occupied = HashSet::new();
        for y in 0..grid_size {
            for x in 0..grid_size {
                let cell = Vec2::new(x, y);
                if !keep.contains(&cell) {
                    occupied.insert(cell);
                }
            }
        }
        occupied
    }

    #[test]
    fn full_board_has_no_free_cell() {
        let occupied = all_cells_but(4, &[]);
        let mut rng = Rng::new(1);
        assert_eq!(find_free_cell(4, &occupied, &mut rng), None);
        assert_eq!(spawn_food(4, &occupied, 0.5, &mut rng), None);
    }

    #[test]
    fn single_free_cell_is_always_found() {
        let only = Vec2::new(2, 3);
        let occupied = all_cells_but(5, &[only]);
        let mut rng = Rng::new(42);
        for _ in 0..20 {
            assert_eq!(find_free_cell(5, &occupied, &mut rng), Some(only));
        }
    }

    #[test]
    fn free_cells_are_scanned_row_major() {
        let occupied = HashSet::new();
        let mut first = SequenceRng::new(vec![0.0]);
        assert_eq!(find_free_cell(3, &occupied, &mut first), Some(Vec2::new(0, 0)));
        // Index 5 of a 3x3 row-major scan is (2, 1).
        let mut sixth = SequenceRng::new(vec![5.5 / 9.0]);
        assert_eq!(find_free_cell(3, &occupied, &mut sixth), Some(Vec2::new(2, 1)));
    }

    #[test]
    fn free_cell_choice_reaches_every_region() {
        let occupied = HashSet::new();
        let mut rng = Rng::new(2024);
        let mut quadrants = [0u32; 4];
        for _ in 0..4_000 {
            let cell = find_free_cell(10, &occupied, &mut rng).expect("empty board has cells");
            let q = (cell.x >= 5) as usize + 2 * (cell.y >= 5) as usize;
            quadrants[q] += 1;
        }
        for count in quadrants {
            assert!((800..1_200).contains(&count), "skewed quadrants: {quadrants:?}");
        }
    }

    #[test]
    fn placed_snake_is_straight_in_bounds_and_clear() {
        let mut rng = Rng::new(77);
        let mut occupied = HashSet::new();
        for x in 0..20 {
            occupied.insert(Vec2::new(x, 10));
        }
        for _ in 0..200 {
            let placed = place_snake(20, &occupied, 3, 400, &mut rng);
            assert_eq!(placed.body.len(), 3);
            assert_eq!(placed.body, straight_body(placed.body[0], placed.dir, 3));
            for cell in &placed.body {
                assert!(in_bounds(*cell, 20));
                assert!(!occupied.contains(cell));
            }
        }
    }

    #[test]
    fn saturated_board_falls_back_near_origin() {
        let occupied = all_cells_but(6, &[]);
        let mut rng = Rng::new(3);
        let placed = place_snake(6, &occupied, 3, 50, &mut rng);
        assert_eq!(placed.body, vec![Vec2::new(1, 1)]);
        assert_eq!(placed.dir, Direction::Right);
    }

    #[test]
    fn straight_body_trails_opposite_the_heading() {
        assert_eq!(
            straight_body(Vec2::new(5, 5), Direction::Up, 3),
            vec![Vec2::new(5, 5), Vec2::new(5, 6), Vec2::new(5, 7)]
        );
    }

    #[test]
    fn food_kind_follows_shield_chance() {
        let mut rng = SequenceRng::new(vec![0.1]);
        assert_eq!(pick_food_kind(0.15, &mut rng), FoodKind::Shield);
        let mut rng = SequenceRng::new(vec![0.2]);
        assert_eq!(pick_food_kind(0.15, &mut rng), FoodKind::Apple);
        let mut rng = SequenceRng::new(vec![0.0]);
        assert_eq!(pick_food_kind(0.0, &mut rng), FoodKind::Apple);
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn bonus_spawn_is_gated_by_its_chance() {
        let occupied = HashSet::new();
        let mut miss = SequenceRng::new(vec![0.9]);
        assert_eq!(maybe_spawn_bonus(10, &occupied, 0.3, 12, &mut miss), None);
        assert_eq!(miss.draws(), 1);

        let mut hit = SequenceRng::new(vec![0.1, 0.0]);
        let bonus = maybe_spawn_bonus(10, &occupied, 0.3, 12, &mut hit).expect("bonus spawns");
        assert_eq!(bonus.pos, Vec2::new(0, 0));
        assert_eq!(bonus.ticks_left, 12);
    }
}
