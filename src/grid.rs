use crate::types::{Direction, Vec2};

pub fn wrap(pos: Vec2, grid_size: i32) -> Vec2 {
    Vec2 {
        x: pos.x.rem_euclid(grid_size),
        y: pos.y.rem_euclid(grid_size),
    }
}

pub fn offset(pos: Vec2, dir: Direction) -> Vec2 {
    let delta = dir.delta();
    Vec2 {
        x: pos.x + delta.x,
        y: pos.y + delta.y,
    }
}

pub fn next_head(body: &[Vec2], dir: Direction, grid_size: i32) -> Vec2 {
    wrap(offset(body[0], dir), grid_size)
}

pub fn toroidal_distance(a: Vec2, b: Vec2, grid_size: i32) -> i32 {
    let dx = (a.x - b.x).abs();
    let dy = (a.y - b.y).abs();
    dx.min(grid_size - dx) + dy.min(grid_size - dy)
}

pub fn in_bounds(pos: Vec2, grid_size: i32) -> bool {
    pos.x >= 0 && pos.y >= 0 && pos.x < grid_size && pos.y < grid_size
}

pub fn advance_body(body: &[Vec2], next_head: Vec2, grow: bool) -> Vec<Vec2> {
    let keep = if grow {
        body.len()
    } else {
        body.len().saturating_sub(1)
    };
    let mut next = Vec::with_capacity(keep + 1);
    next.push(next_head);
    next.extend_from_slice(&body[..keep]);
    next
}

pub fn blocking_body(body: &[Vec2], grow: bool) -> &[Vec2] {
    if grow {
        body
    } else {
        &body[..body.len().saturating_sub(1)]
    }
}
