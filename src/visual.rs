use crate::base::*;
use crate::choke_point::*;
use crate::constants::*;
use crate::grid::*;
use crate::location::*;
use crate::map::*;

pub trait MapVisualizer {
    fn mini_tile(&mut self, position: WalkPosition, mini_tile: &MiniTile);

    fn choke_point(&mut self, choke_point: &ChokePoint);

    fn base(&mut self, base: &Base);
}

/// Feeds every mini tile, then every choke point, then every base of `map` to `visualizer`.
pub fn render_map(map: &Map, visualizer: &mut dyn MapVisualizer) {
    for (position, mini_tile) in map.grid().mini_tiles() {
        visualizer.mini_tile(position, mini_tile);
    }

    for choke_point in map.choke_points() {
        visualizer.choke_point(choke_point);
    }

    for base in map.bases() {
        visualizer.base(base);
    }
}

/// Text dump of a map, one character per mini tile.
///
/// `~` sea, `o` lake, `#` blocked, `.` too small to be an area, area ids as
/// `1`-`9` then `a`-`z` then `+`, `*` choke point geometry, `B` base footprint.
pub struct AsciiVisualizer {
    size: WalkPosition,
    cells: Vec<char>,
}

impl AsciiVisualizer {
    pub fn new(size: WalkPosition) -> AsciiVisualizer {
        AsciiVisualizer {
            size,
            cells: vec![' '; (size.x.max(0) * size.y.max(0)) as usize],
        }
    }

    fn set(&mut self, w: WalkPosition, glyph: char) {
        if w.x >= 0 && w.y >= 0 && w.x < self.size.x && w.y < self.size.y {
            self.cells[(w.y * self.size.x + w.x) as usize] = glyph;
        }
    }

    pub fn glyph(&self, w: WalkPosition) -> Option<char> {
        if w.x >= 0 && w.y >= 0 && w.x < self.size.x && w.y < self.size.y {
            Some(self.cells[(w.y * self.size.x + w.x) as usize])
        } else {
            None
        }
    }

    pub fn render(&self) -> String {
        let mut output = String::with_capacity(self.cells.len() + self.size.y.max(0) as usize);
        for row in self.cells.chunks(self.size.x.max(1) as usize) {
            output.extend(row.iter());
            output.push('\n');
        }
        output
    }
}

fn area_glyph(id: i32) -> char {
    match id {
        1..=9 => (b'0' + id as u8) as char,
        10..=35 => (b'a' + (id - 10) as u8) as char,
        _ => '+',
    }
}

impl MapVisualizer for AsciiVisualizer {
    fn mini_tile(&mut self, position: WalkPosition, mini_tile: &MiniTile) {
        let glyph = match mini_tile.kind() {
            MiniTileKind::Sea => '~',
            MiniTileKind::Lake => 'o',
            MiniTileKind::Terrain if mini_tile.blocked() => '#',
            MiniTileKind::Terrain if mini_tile.area_id() < 0 => '.',
            MiniTileKind::Terrain => area_glyph(mini_tile.area_id()),
        };
        self.set(position, glyph);
    }

    fn choke_point(&mut self, choke_point: &ChokePoint) {
        for &w in choke_point.geometry() {
            self.set(w, '*');
        }
    }

    fn base(&mut self, base: &Base) {
        let top_left = WalkPosition::from(base.location());
        for dy in 0..base.footprint().y * TILE_WALK_SIZE {
            for dx in 0..base.footprint().x * TILE_WALK_SIZE {
                self.set(top_left.offset(dx, dy), 'B');
            }
        }
    }
}
