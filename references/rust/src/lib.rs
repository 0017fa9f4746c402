use std::fmt;

use thiserror::Error;

mod common;
pub mod consts;
mod decoder;
mod encoder;
mod header;
mod node;
mod report;

pub use consts::{
    DIRECTED_EDGE_SIZE, HEADING_EXPAND_FACTOR, MAX_LOCAL_EDGE_INDEX, MAX_VERSION_SIZE,
    NODE_RECORD_SIZE, TILE_HEADER_SIZE,
};
pub use decoder::{decode_tile, inspect_tile, TileView};
pub use encoder::{encode_tile, EncodedTile, TileEncodeInput, TileSections};
pub use header::{Section, TileHeader, TileHeaderBuilder};
pub use node::{NodeRecord, NodeRecordBuilder, NodeStop};
pub use report::{
    AccessReport, AdminInfo, AdministrativeReport, NodeContext, NodeReport, TimeZoneInfo,
};

/// Importance class of a road. Lower codes are more important.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum RoadClass {
    #[default]
    Motorway,
    Trunk,
    Primary,
    Secondary,
    TertiaryUnclassified,
    Residential,
    ServiceOther,
}

impl RoadClass {
    pub fn code(self) -> u8 {
        match self {
            Self::Motorway => 0,
            Self::Trunk => 1,
            Self::Primary => 2,
            Self::Secondary => 3,
            Self::TertiaryUnclassified => 4,
            Self::Residential => 5,
            Self::ServiceOther => 6,
        }
    }

    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::Motorway),
            1 => Ok(Self::Trunk),
            2 => Ok(Self::Primary),
            3 => Ok(Self::Secondary),
            4 => Ok(Self::TertiaryUnclassified),
            5 => Ok(Self::Residential),
            6 => Ok(Self::ServiceOther),
            _ => Err(TileError::new(
                TileErrorCode::InvalidFieldValue,
                format!("Invalid road class code {code}."),
            )),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Motorway => "motorway",
            Self::Trunk => "trunk",
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::TertiaryUnclassified => "tertiary",
            Self::Residential => "residential",
            Self::ServiceOther => "service_other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IntersectionType {
    #[default]
    Regular,
    /// Two edges meeting where nothing else does.
    False,
    DeadEnd,
    Fork,
}

impl IntersectionType {
    pub fn code(self) -> u8 {
        match self {
            Self::Regular => 0,
            Self::False => 1,
            Self::DeadEnd => 2,
            Self::Fork => 3,
        }
    }

    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::Regular),
            1 => Ok(Self::False),
            2 => Ok(Self::DeadEnd),
            3 => Ok(Self::Fork),
            _ => Err(TileError::new(
                TileErrorCode::InvalidFieldValue,
                format!("Invalid intersection type code {code}."),
            )),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::False => "false",
            Self::DeadEnd => "dead-end",
            Self::Fork => "fork",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeType {
    #[default]
    StreetIntersection,
    Gate,
    Bollard,
    TollBooth,
    RailStop,
    BusStop,
    MultiUseTransitStop,
    BikeShare,
    Parking,
}

impl NodeType {
    pub fn code(self) -> u8 {
        match self {
            Self::StreetIntersection => 0,
            Self::Gate => 1,
            Self::Bollard => 2,
            Self::TollBooth => 3,
            Self::RailStop => 4,
            Self::BusStop => 5,
            Self::MultiUseTransitStop => 6,
            Self::BikeShare => 7,
            Self::Parking => 8,
        }
    }

    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::StreetIntersection),
            1 => Ok(Self::Gate),
            2 => Ok(Self::Bollard),
            3 => Ok(Self::TollBooth),
            4 => Ok(Self::RailStop),
            5 => Ok(Self::BusStop),
            6 => Ok(Self::MultiUseTransitStop),
            7 => Ok(Self::BikeShare),
            8 => Ok(Self::Parking),
            _ => Err(TileError::new(
                TileErrorCode::InvalidFieldValue,
                format!("Invalid node type code {code}."),
            )),
        }
    }

    /// Transit stops carry a stop index in place of name consistency bits.
    pub fn is_transit(self) -> bool {
        matches!(
            self,
            Self::RailStop | Self::BusStop | Self::MultiUseTransitStop
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StreetIntersection => "street_intersection",
            Self::Gate => "gate",
            Self::Bollard => "bollard",
            Self::TollBooth => "toll_booth",
            Self::RailStop => "rail_stop",
            Self::BusStop => "bus_stop",
            Self::MultiUseTransitStop => "multi_use_transit_stop",
            Self::BikeShare => "bike_share",
            Self::Parking => "parking",
        }
    }
}

/// Which way a local edge may be travelled, seen from its start node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Traversability {
    #[default]
    None,
    Forward,
    Backward,
    Both,
}

impl Traversability {
    pub fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Forward => 1,
            Self::Backward => 2,
            Self::Both => 3,
        }
    }

    pub(crate) fn from_bits(bits: u64) -> Self {
        match bits & 0x3 {
            0 => Self::None,
            1 => Self::Forward,
            2 => Self::Backward,
            _ => Self::Both,
        }
    }
}

/// Per-mode access bitmask. Bit positions are part of the persisted format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Access {
    bits: u16,
}

impl Access {
    pub const NONE: Access = Access { bits: 0 };
    pub const AUTO: u16 = 0x01;
    pub const PEDESTRIAN: u16 = 0x02;
    pub const BICYCLE: u16 = 0x04;
    pub const TRUCK: u16 = 0x08;
    pub const EMERGENCY: u16 = 0x10;
    pub const TAXI: u16 = 0x20;
    pub const BUS: u16 = 0x40;
    pub const HOV: u16 = 0x80;
    pub const ALL: u16 = 0xff;

    pub fn new(bits: u16) -> Result<Self> {
        if bits & !Self::ALL != 0 {
            return Err(TileError::new(
                TileErrorCode::InvalidFieldValue,
                format!("Access mask {bits:#x} sets undefined mode bits."),
            ));
        }
        Ok(Self { bits })
    }

    pub fn has(&self, mode: u16) -> bool {
        self.bits & mode != 0
    }

    pub fn set(&mut self, mode: u16) {
        self.bits |= mode & Self::ALL;
    }

    pub fn bits(&self) -> u16 {
        self.bits
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileErrorCode {
    InvalidHeaderLength,
    UnsupportedVersion,
    InvalidFieldValue,
    LocalIndexOutOfRange,
    NodeRoleMismatch,
    InvalidSectionOffset,
    InvalidPayloadLength,
}

impl TileErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidHeaderLength => "INVALID_HEADER_LENGTH",
            Self::UnsupportedVersion => "UNSUPPORTED_VERSION",
            Self::InvalidFieldValue => "INVALID_FIELD_VALUE",
            Self::LocalIndexOutOfRange => "LOCAL_INDEX_OUT_OF_RANGE",
            Self::NodeRoleMismatch => "NODE_ROLE_MISMATCH",
            Self::InvalidSectionOffset => "INVALID_SECTION_OFFSET",
            Self::InvalidPayloadLength => "INVALID_PAYLOAD_LENGTH",
        }
    }
}

impl fmt::Display for TileErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct TileError {
    pub code: TileErrorCode,
    pub message: String,
}

impl TileError {
    pub fn new(code: TileErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TileError>;
