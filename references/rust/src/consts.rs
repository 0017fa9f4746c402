use crate::common::BitField;

pub const TILE_HEADER_SIZE: usize = 72;
pub const NODE_RECORD_SIZE: usize = 40;
pub const DIRECTED_EDGE_SIZE: usize = 48;

/// Size of the fixed version slot, terminator included.
pub const MAX_VERSION_SIZE: usize = 16;

/// Highest local edge index a node can address.
pub const MAX_LOCAL_EDGE_INDEX: u32 = 7;

/// Multiplier from a quantized heading byte to degrees.
pub const HEADING_EXPAND_FACTOR: f64 = 359.0 / 255.0;
pub const HEADING_SHRINK_FACTOR: f64 = 255.0 / 359.0;

pub(crate) const OFFSET_INTERNAL_VERSION: usize = 0;
pub(crate) const OFFSET_DATE_CREATED: usize = 8;
pub(crate) const OFFSET_VERSION: usize = 16;
pub(crate) const OFFSET_NODE_COUNT: usize = 32;
pub(crate) const OFFSET_DIRECTED_EDGE_COUNT: usize = 36;
pub(crate) const OFFSET_EDGEINFO: usize = 40;
pub(crate) const OFFSET_TEXTLIST: usize = 44;
pub(crate) const OFFSET_EXITLIST: usize = 48;
pub(crate) const OFFSET_ADMIN: usize = 52;
pub(crate) const OFFSET_MERLIST: usize = 56;
pub(crate) const OFFSET_TIMEDRES: usize = 60;
pub(crate) const OFFSET_TRANSIT: usize = 64;

pub(crate) const NODE_OFFSET_LNG: usize = 0;
pub(crate) const NODE_OFFSET_LAT: usize = 4;
pub(crate) const NODE_OFFSET_ATTRIBUTES: usize = 8;
pub(crate) const NODE_OFFSET_FLAGS: usize = 16;
pub(crate) const NODE_OFFSET_HEADINGS: usize = 24;
pub(crate) const NODE_OFFSET_STOP: usize = 32;

// Attribute word.
pub(crate) const EDGE_INDEX: BitField = BitField::new(0, 21);
pub(crate) const EDGE_COUNT: BitField = BitField::new(21, 7);
pub(crate) const BEST_ROAD_CLASS: BitField = BitField::new(28, 3);
pub(crate) const ACCESS: BitField = BitField::new(31, 12);
pub(crate) const INTERSECTION: BitField = BitField::new(43, 5);
pub(crate) const ADMIN_INDEX: BitField = BitField::new(48, 12);

// Flag word.
pub(crate) const TIMEZONE: BitField = BitField::new(0, 9);
pub(crate) const LOCAL_DRIVEABILITY: BitField = BitField::new(9, 16);
pub(crate) const DENSITY: BitField = BitField::new(25, 4);
pub(crate) const NODE_TYPE: BitField = BitField::new(29, 4);
pub(crate) const LOCAL_EDGE_COUNT: BitField = BitField::new(33, 3);
pub(crate) const PARENT: BitField = BitField::new(36, 1);
pub(crate) const CHILD: BitField = BitField::new(37, 1);
pub(crate) const MODE_CHANGE: BitField = BitField::new(38, 1);
pub(crate) const TRAFFIC_SIGNAL: BitField = BitField::new(39, 1);

pub(crate) const DRIVEABILITY_SLOT_BITS: u32 = 2;
pub(crate) const HEADING_SLOT_BITS: u32 = 8;

/// First name-consistency bit for each smaller local index of a pair.
pub(crate) const CONTINUITY_LOOKUP: [u32; 7] = [0, 7, 13, 18, 22, 25, 27];
