//! Tile-grid world model: blocks, tiles, flows, buildings, and the map
//! access trait the lighting engine reads through.
#![forbid(unsafe_code)]

/// Tiles per block edge. Blocks are square.
pub const BLOCK_DIM: i32 = 16;
/// Liquid depth saturates at this value.
pub const MAX_FLOW: u8 = 7;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Coord2 {
    pub x: i32,
    pub y: i32,
}

impl Coord2 {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Half-open rectangle over tile or display coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect2 {
    pub min: Coord2,
    pub max: Coord2,
}

impl Rect2 {
    #[inline]
    pub const fn new(min: Coord2, max: Coord2) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn from_extent(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self::new(Coord2::new(x, y), Coord2::new(x + w, y + h))
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min.x && x < self.max.x && y >= self.min.y && y < self.max.y
    }
}

/// Terrain shape of one tile. Determines how light crosses it laterally and
/// how sunlight passes through it vertically.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TileShape {
    #[default]
    Empty,
    Floor,
    Wall,
    Ramp,
    RampTop,
    StairUp,
    StairDown,
    StairUpDown,
    /// Streambed under a brook surface; lets no sunlight through.
    BrookBed,
}

impl TileShape {
    /// Thin horizontal cover: sunlight crosses one seventh of a tile of the
    /// material when passing a level boundary here.
    #[inline]
    pub fn is_floor_like(self) -> bool {
        matches!(self, TileShape::Floor | TileShape::Ramp | TileShape::StairUp)
    }

    /// Open to the level below.
    #[inline]
    pub fn is_open(self) -> bool {
        matches!(
            self,
            TileShape::Empty | TileShape::RampTop | TileShape::StairDown | TileShape::StairUpDown
        )
    }

    /// A staircase connecting downward.
    #[inline]
    pub fn is_stair_through(self) -> bool {
        matches!(self, TileShape::StairDown | TileShape::StairUpDown)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiquidKind {
    Water,
    Magma,
}

/// Per-tile designation bits the engine cares about.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Designation {
    /// Unrevealed tiles are fully dark and block all rays.
    pub hidden: bool,
    pub liquid: Option<LiquidKind>,
    /// Liquid depth, `0..=MAX_FLOW`.
    pub flow: u8,
}

/// Material identity as a `(type, index)` pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MatPair {
    pub mat_type: i32,
    pub mat_index: i32,
}

impl MatPair {
    #[inline]
    pub const fn new(mat_type: i32, mat_index: i32) -> Self {
        Self {
            mat_type,
            mat_index,
        }
    }

    #[inline]
    pub fn key(self) -> (i32, i32) {
        (self.mat_type, self.mat_index)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Tile {
    pub shape: TileShape,
    pub material: MatPair,
    /// Liquid here is frozen over; light treats the tile as ice.
    pub frozen: bool,
    pub designation: Designation,
}

/// Kind of a transient flow cloud sitting on a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowKind {
    Fire,
    Dragonfire,
    Other,
}

/// One flow cloud inside a block; coordinates are block-local.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Flow {
    pub x: u8,
    pub y: u8,
    pub kind: FlowKind,
    pub density: i32,
}

/// One plant inside a block. `index` selects the plant raw material.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Plant {
    pub x: u8,
    pub y: u8,
    pub index: i32,
    pub growth: i32,
}

/// A material spattered over a block, with per-subtile amounts.
#[derive(Clone, Debug, PartialEq)]
pub struct Spatter {
    pub material: MatPair,
    pub amount: [[i16; 16]; 16],
}

/// A 16x16 column slice of the map at one z level.
#[derive(Clone, Debug, PartialEq)]
pub struct MapBlock {
    pub tiles: [Tile; 256],
    pub flows: Vec<Flow>,
    pub plants: Vec<Plant>,
    pub spatters: Vec<Spatter>,
}

impl Default for MapBlock {
    fn default() -> Self {
        Self {
            tiles: [Tile::default(); 256],
            flows: Vec::new(),
            plants: Vec::new(),
            spatters: Vec::new(),
        }
    }
}

impl MapBlock {
    #[inline]
    fn idx(x: i32, y: i32) -> usize {
        (x * BLOCK_DIM + y) as usize
    }

    /// Block-local tile access, `x` and `y` in `0..BLOCK_DIM`.
    #[inline]
    pub fn tile(&self, x: i32, y: i32) -> &Tile {
        &self.tiles[Self::idx(x, y)]
    }

    #[inline]
    pub fn tile_mut(&mut self, x: i32, y: i32) -> &mut Tile {
        &mut self.tiles[Self::idx(x, y)]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildingKind {
    Door { closed: bool },
    Plain,
}

impl BuildingKind {
    #[inline]
    pub fn is_closed(self) -> bool {
        matches!(self, BuildingKind::Door { closed: true })
    }
}

/// A placed building occupying one or more tiles. Light treats only the
/// corner tile as the building's location.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Building {
    /// Lookup key: `(type, subtype, custom type)`.
    pub key: (i32, i32, i32),
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub complete: bool,
    pub powered: bool,
    pub kind: BuildingKind,
    pub material: MatPair,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Creature {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub citizen: bool,
    pub conscious: bool,
}

/// Read access to the world state the lighting pass consumes. One frame
/// reads everything through this; implementations must be cheap to query
/// per tile.
pub trait MapSource {
    /// Map extent in blocks, `(x, y)`.
    fn block_counts(&self) -> (i32, i32);
    fn z_count(&self) -> i32;
    fn block_at(&self, bx: i32, by: i32, bz: i32) -> Option<&MapBlock>;

    /// Map tile coordinate of the top-left displayed tile.
    fn window(&self) -> Coord2;
    /// Z level currently displayed.
    fn z_level(&self) -> i32;
    /// Display-space rectangle covered by the map view.
    fn viewport(&self) -> Rect2;
    /// Full display grid dimensions, `(w, h)`.
    fn display_dims(&self) -> (i32, i32);

    fn cursor(&self) -> Option<(i32, i32, i32)>;
    fn creatures(&self) -> &[Creature];
    fn buildings(&self) -> &[Building];
    fn time_tick(&self) -> i32;

    /// Tile access in map coordinates; `None` outside the map.
    fn tile_at(&self, x: i32, y: i32, z: i32) -> Option<&Tile> {
        let (bx, by) = (x.div_euclid(BLOCK_DIM), y.div_euclid(BLOCK_DIM));
        let block = self.block_at(bx, by, z)?;
        Some(block.tile(x.rem_euclid(BLOCK_DIM), y.rem_euclid(BLOCK_DIM)))
    }
}

/// In-memory [`MapSource`] backed by a dense block grid. Used by the demo
/// and the tests.
#[derive(Clone, Debug)]
pub struct MemoryWorld {
    blocks_x: i32,
    blocks_y: i32,
    levels: i32,
    blocks: Vec<MapBlock>,
    pub window: Coord2,
    pub z_level: i32,
    pub viewport: Rect2,
    pub display_dims: (i32, i32),
    pub cursor: Option<(i32, i32, i32)>,
    pub creatures: Vec<Creature>,
    pub buildings: Vec<Building>,
    pub tick: i32,
}

impl MemoryWorld {
    /// A world of `blocks_x * blocks_y` blocks per level and `levels` z
    /// levels, all tiles empty. The viewport defaults to the whole top
    /// level at display origin.
    pub fn new(blocks_x: i32, blocks_y: i32, levels: i32) -> Self {
        let count = (blocks_x * blocks_y * levels) as usize;
        let w = blocks_x * BLOCK_DIM;
        let h = blocks_y * BLOCK_DIM;
        Self {
            blocks_x,
            blocks_y,
            levels,
            blocks: vec![MapBlock::default(); count],
            window: Coord2::new(0, 0),
            z_level: levels - 1,
            viewport: Rect2::from_extent(0, 0, w, h),
            display_dims: (w, h),
            cursor: None,
            creatures: Vec::new(),
            buildings: Vec::new(),
            tick: 0,
        }
    }

    fn block_index(&self, bx: i32, by: i32, bz: i32) -> Option<usize> {
        if bx < 0 || by < 0 || bz < 0 || bx >= self.blocks_x || by >= self.blocks_y || bz >= self.levels
        {
            return None;
        }
        Some(((bz * self.blocks_y + by) * self.blocks_x + bx) as usize)
    }

    pub fn block_mut(&mut self, bx: i32, by: i32, bz: i32) -> Option<&mut MapBlock> {
        let idx = self.block_index(bx, by, bz)?;
        Some(&mut self.blocks[idx])
    }

    /// Tile access in map coordinates. Panics outside the map; the world
    /// builder knows its own extent.
    pub fn tile_mut(&mut self, x: i32, y: i32, z: i32) -> &mut Tile {
        let (bx, by) = (x.div_euclid(BLOCK_DIM), y.div_euclid(BLOCK_DIM));
        let (lx, ly) = (x.rem_euclid(BLOCK_DIM), y.rem_euclid(BLOCK_DIM));
        self.block_mut(bx, by, z)
            .unwrap_or_else(|| panic!("tile ({x}, {y}, {z}) outside the map"))
            .tile_mut(lx, ly)
    }

    pub fn set_shape(&mut self, x: i32, y: i32, z: i32, shape: TileShape) {
        self.tile_mut(x, y, z).shape = shape;
    }

    pub fn set_material(&mut self, x: i32, y: i32, z: i32, material: MatPair) {
        self.tile_mut(x, y, z).material = material;
    }

    /// Floods every tile of level `z` with one shape and material.
    pub fn fill_level(&mut self, z: i32, shape: TileShape, material: MatPair) {
        for x in 0..self.blocks_x * BLOCK_DIM {
            for y in 0..self.blocks_y * BLOCK_DIM {
                let t = self.tile_mut(x, y, z);
                t.shape = shape;
                t.material = material;
            }
        }
    }
}

impl MapSource for MemoryWorld {
    fn block_counts(&self) -> (i32, i32) {
        (self.blocks_x, self.blocks_y)
    }

    fn z_count(&self) -> i32 {
        self.levels
    }

    fn block_at(&self, bx: i32, by: i32, bz: i32) -> Option<&MapBlock> {
        let idx = self.block_index(bx, by, bz)?;
        Some(&self.blocks[idx])
    }

    fn window(&self) -> Coord2 {
        self.window
    }

    fn z_level(&self) -> i32 {
        self.z_level
    }

    fn viewport(&self) -> Rect2 {
        self.viewport
    }

    fn display_dims(&self) -> (i32, i32) {
        self.display_dims
    }

    fn cursor(&self) -> Option<(i32, i32, i32)> {
        self.cursor
    }

    fn creatures(&self) -> &[Creature] {
        &self.creatures
    }

    fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    fn time_tick(&self) -> i32 {
        self.tick
    }
}
