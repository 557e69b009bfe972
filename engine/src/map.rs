// ═══════════════════════════════════════════════════════════════════════
// Adventure map — tiles, terrain and the region graph
// ═══════════════════════════════════════════════════════════════════════

use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    pub terrain: Terrain,
    pub region: RegionId,
    pub object: MapObject,
    pub hero: Option<HeroId>,
    /// Bit per color; set while the tile is still hidden from that color.
    pub fog: u8,
}

impl Tile {
    pub fn new(terrain: Terrain, region: RegionId) -> Self {
        Tile { terrain, region, object: MapObject::None, hero: None, fog: 0xff }
    }

    pub fn is_fog(&self, color: Color) -> bool {
        self.fog & color.bit() != 0
    }

    /// Passable, with nothing standing on it.
    pub fn is_open(&self) -> bool {
        self.terrain.is_passable() && self.hero.is_none() && self.object == MapObject::None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub neighbours: Vec<RegionId>,
    pub tile_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Map {
    pub width: u32,
    pub height: u32,
    pub tiles: Vec<Tile>,
    pub regions: Vec<Region>,
}

/// The 8 compass directions as (dx, dy).
const DIRECTIONS: [(i32, i32); 8] = [(-1, -1), (0, -1), (1, -1), (-1, 0), (1, 0), (-1, 1), (0, 1), (1, 1)];

impl Map {
    pub fn new(width: u32, height: u32, terrain: Terrain) -> Self {
        let tiles = (0..width * height).map(|_| Tile::new(terrain, RegionId(0))).collect();
        Map { width, height, tiles, regions: Vec::new() }
    }

    pub fn size(&self) -> usize {
        self.tiles.len()
    }

    pub fn position(&self, x: u32, y: u32) -> Position {
        Position(y * self.width + x)
    }

    pub fn xy(&self, position: Position) -> (i32, i32) {
        ((position.0 % self.width) as i32, (position.0 / self.width) as i32)
    }

    pub fn is_valid(&self, position: Position) -> bool {
        position.index() < self.tiles.len()
    }

    pub fn tile(&self, position: Position) -> Option<&Tile> {
        self.tiles.get(position.index())
    }

    pub fn tile_mut(&mut self, position: Position) -> Option<&mut Tile> {
        self.tiles.get_mut(position.index())
    }

    pub fn region_of(&self, position: Position) -> Option<RegionId> {
        self.tile(position).map(|t| t.region)
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id.index())
    }

    pub fn region_neighbours(&self, id: RegionId) -> &[RegionId] {
        self.region(id).map(|r| r.neighbours.as_slice()).unwrap_or(&[])
    }

    /// Adjacent positions together with a diagonal flag.
    pub fn neighbours(&self, position: Position) -> impl Iterator<Item = (Position, bool)> + '_ {
        let (x, y) = self.xy(position);
        DIRECTIONS.iter().filter_map(move |&(dx, dy)| {
            let (nx, ny) = (x + dx, y + dy);
            if nx < 0 || ny < 0 || nx >= self.width as i32 || ny >= self.height as i32 {
                return None;
            }
            Some((self.position(nx as u32, ny as u32), dx != 0 && dy != 0))
        })
    }

    /// Straight-line tile distance: the longer axis plus half the shorter one.
    pub fn approximate_distance(&self, a: Position, b: Position) -> u32 {
        let (ax, ay) = self.xy(a);
        let (bx, by) = self.xy(b);
        let dx = (ax - bx).unsigned_abs();
        let dy = (ay - by).unsigned_abs();
        dx.max(dy) + dx.min(dy) / 2
    }

    /// Chebyshev distance in tiles.
    pub fn tile_distance(&self, a: Position, b: Position) -> u32 {
        let (ax, ay) = self.xy(a);
        let (bx, by) = self.xy(b);
        (ax - bx).unsigned_abs().max((ay - by).unsigned_abs())
    }

    /// All positions within `radius` tiles of `center`.
    pub fn positions_in_radius(&self, center: Position, radius: u32) -> impl Iterator<Item = Position> + '_ {
        let (cx, cy) = self.xy(center);
        let r = radius as i32;
        (cy - r..=cy + r).flat_map(move |y| {
            (cx - r..=cx + r).filter_map(move |x| {
                if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
                    None
                } else {
                    Some(self.position(x as u32, y as u32))
                }
            })
        })
    }

    /// Rebuild region records and adjacency from tile assignments.
    /// Two regions are neighbours when passable tiles of both touch.
    pub fn rebuild_regions(&mut self) {
        let count = self.tiles.iter().map(|t| t.region.index() + 1).max().unwrap_or(0);
        let mut neighbours: Vec<BTreeSet<RegionId>> = vec![BTreeSet::new(); count];
        let mut tile_counts = vec![0u32; count];

        for idx in 0..self.tiles.len() {
            let pos = Position(idx as u32);
            let tile = &self.tiles[idx];
            tile_counts[tile.region.index()] += 1;
            if !tile.terrain.is_passable() {
                continue;
            }
            for (other, _) in self.neighbours(pos) {
                let other_tile = &self.tiles[other.index()];
                if other_tile.region != tile.region && other_tile.terrain.is_passable() {
                    neighbours[tile.region.index()].insert(other_tile.region);
                }
            }
        }

        self.regions = neighbours
            .into_iter()
            .enumerate()
            .map(|(i, n)| Region { id: RegionId(i as u32), neighbours: n.into_iter().collect(), tile_count: tile_counts[i] })
            .collect();
    }
}
