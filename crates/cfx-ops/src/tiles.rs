//! Tile sets: which pixel indices belong to which tile.
//!
//! Tile grids start at a configurable offset from the top-left corner, so
//! the first row and column of tiles may be partially outside the image.
//! Indices outside the image are simply omitted.

/// Pixel indices per tile.
pub type TileSet = Vec<Vec<usize>>;

fn cells(width: usize, height: usize, x0: i64, y0: i64, w: i64, h: i64) -> Vec<usize> {
    let mut hold = Vec::new();
    for y in y0.max(0)..(y0 + h).min(height as i64) {
        for x in x0.max(0)..(x0 + w).min(width as i64) {
            hold.push(y as usize * width + x as usize);
        }
    }
    hold
}

/// Clamped tile geometry for [`image_tiles`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    /// Tile width, at least 1.
    pub tile_width: u32,
    /// Tile height, at least 1.
    pub tile_height: u32,
    /// Horizontal grid offset, below `tile_width`.
    pub offset_x: u32,
    /// Vertical grid offset, below `tile_height`.
    pub offset_y: u32,
}

impl TileGrid {
    /// Clamps raw parameters against the image size.
    pub fn new(width: usize, height: usize, tile_width: u32, tile_height: u32, offset_x: u32, offset_y: u32) -> Self {
        let tile_width = tile_width.clamp(1, (width as u32).max(1));
        let tile_height = tile_height.clamp(1, (height as u32).max(1));
        Self {
            tile_width,
            tile_height,
            offset_x: offset_x.min(tile_width - 1),
            offset_y: offset_y.min(tile_height - 1),
        }
    }

    /// Workstore key for this grid over a `width x height` image.
    pub fn key(&self, width: usize, height: usize) -> String {
        format!(
            "imagetileset-{width}-{height}-{}-{}-{}-{}",
            self.tile_width, self.tile_height, self.offset_x, self.offset_y
        )
    }
}

/// Partitions the image into `tile_width x tile_height` tiles.
///
/// Every pixel lands in exactly one tile; empty tiles are dropped.
///
/// ```rust
/// use cfx_ops::tiles::{image_tiles, TileGrid};
///
/// let grid = TileGrid::new(4, 2, 2, 2, 1, 0);
/// let tiles = image_tiles(4, 2, &grid);
/// assert_eq!(tiles, vec![vec![0, 4], vec![1, 2, 5, 6], vec![3, 7]]);
/// ```
pub fn image_tiles(width: usize, height: usize, grid: &TileGrid) -> TileSet {
    let (tw, th) = (grid.tile_width as i64, grid.tile_height as i64);
    let mut tiles = Vec::new();
    let mut y = grid.offset_y as i64 - th;
    while y < height as i64 {
        let mut x = grid.offset_x as i64 - tw;
        while x < width as i64 {
            let hold = cells(width, height, x, y, tw, th);
            if !hold.is_empty() {
                tiles.push(hold);
            }
            x += tw;
        }
        y += th;
    }
    tiles
}

fn last_in_span(tile: u32, gutter: u32) -> u32 {
    (tile as u64 + gutter as u64 - 1).min(u32::MAX as u64) as u32
}

/// Clamped geometry for [`alpha_tiles`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlphaGrid {
    /// Tile width, at least 1.
    pub tile_width: u32,
    /// Tile height, at least 1.
    pub tile_height: u32,
    /// Gutter width.
    pub gutter_width: u32,
    /// Gutter height.
    pub gutter_height: u32,
    /// Horizontal offset, below `tile_width + gutter_width`.
    pub offset_x: u32,
    /// Vertical offset, below `tile_height + gutter_height`.
    pub offset_y: u32,
}

impl AlphaGrid {
    /// Clamps raw parameters.
    pub fn new(tile_width: u32, tile_height: u32, gutter_width: u32, gutter_height: u32, offset_x: u32, offset_y: u32) -> Self {
        let tile_width = tile_width.max(1);
        let tile_height = tile_height.max(1);
        Self {
            tile_width,
            tile_height,
            gutter_width,
            gutter_height,
            offset_x: offset_x.min(last_in_span(tile_width, gutter_width)),
            offset_y: offset_y.min(last_in_span(tile_height, gutter_height)),
        }
    }

    /// Workstore key for this grid over a `width x height` image.
    pub fn key(&self, width: usize, height: usize) -> String {
        format!(
            "alphatileset-{width}-{height}-{}-{}-{}-{}-{}-{}",
            self.tile_width, self.tile_height, self.gutter_width, self.gutter_height, self.offset_x, self.offset_y
        )
    }
}

/// Splits the image into repeating tile/gutter cells.
///
/// Each cell contributes four entries in a fixed order: the tile, the
/// gutter below it, the gutter to its right, and the corner gutter. Entries
/// may be empty so that `index % 4` always identifies the region kind.
pub fn alpha_tiles(width: usize, height: usize, grid: &AlphaGrid) -> TileSet {
    let (tw, th) = (grid.tile_width as i64, grid.tile_height as i64);
    let (gw, gh) = (grid.gutter_width as i64, grid.gutter_height as i64);
    let (aw, ah) = (tw + gw, th + gh);
    let mut tiles = Vec::new();
    let mut y = grid.offset_y as i64 - ah;
    while y < height as i64 {
        let mut x = grid.offset_x as i64 - aw;
        while x < width as i64 {
            tiles.push(cells(width, height, x, y, tw, th));
            tiles.push(cells(width, height, x, y + th, tw, gh));
            tiles.push(cells(width, height, x + tw, y, gw, th));
            tiles.push(cells(width, height, x + tw, y + th, gw, gh));
            x += aw;
        }
        y += ah;
    }
    tiles
}
