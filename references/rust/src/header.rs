//! Fixed-size tile header and the builder that assembles it.
//!
//! ## Wire layout (72 bytes, little-endian)
//!
//! ```text
//! internal_version:    i64       [0..8]
//! date_created:        u64       [8..16]
//! version:             [u8; 16]  [16..32]   NUL terminated
//! node_count:          u32       [32..36]
//! directed_edge_count: u32       [36..40]
//! edgeinfo_offset:     u32       [40..44]
//! textlist_offset:     u32       [44..48]
//! exitlist_offset:     u32       [48..52]
//! admin_offset:        u32       [52..56]
//! merlist_offset:      u32       [56..60]
//! timedres_offset:     u32       [60..64]
//! transit_offset:      u32       [64..68]
//! reserved:            u32       [68..72]
//! ```

use crate::common::{read_array, read_i64_le, read_u32_le, read_u64_le};
use crate::consts::{
    DIRECTED_EDGE_SIZE, MAX_VERSION_SIZE, NODE_RECORD_SIZE, OFFSET_ADMIN, OFFSET_DATE_CREATED,
    OFFSET_DIRECTED_EDGE_COUNT, OFFSET_EDGEINFO, OFFSET_EXITLIST, OFFSET_INTERNAL_VERSION,
    OFFSET_MERLIST, OFFSET_NODE_COUNT, OFFSET_TEXTLIST, OFFSET_TIMEDRES, OFFSET_TRANSIT,
    OFFSET_VERSION, TILE_HEADER_SIZE,
};
use crate::{Result, TileError, TileErrorCode};

/// Variable-length sections that follow the node and directed edge arrays,
/// in the order they are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    EdgeInfo,
    TextList,
    ExitList,
    Admin,
    /// Multi-edge restrictions.
    MerList,
    TimedRes,
    Transit,
}

impl Section {
    pub const ALL: [Section; 7] = [
        Section::EdgeInfo,
        Section::TextList,
        Section::ExitList,
        Section::Admin,
        Section::MerList,
        Section::TimedRes,
        Section::Transit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EdgeInfo => "edgeinfo",
            Self::TextList => "textlist",
            Self::ExitList => "exitlist",
            Self::Admin => "admin",
            Self::MerList => "merlist",
            Self::TimedRes => "timedres",
            Self::Transit => "transit",
        }
    }

    fn wire_offset(self) -> usize {
        match self {
            Self::EdgeInfo => OFFSET_EDGEINFO,
            Self::TextList => OFFSET_TEXTLIST,
            Self::ExitList => OFFSET_EXITLIST,
            Self::Admin => OFFSET_ADMIN,
            Self::MerList => OFFSET_MERLIST,
            Self::TimedRes => OFFSET_TIMEDRES,
            Self::Transit => OFFSET_TRANSIT,
        }
    }
}

/// Read-only tile header. Assemble new ones with [`TileHeaderBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TileHeader {
    internal_version: i64,
    date_created: u64,
    version: [u8; MAX_VERSION_SIZE],
    node_count: u32,
    directed_edge_count: u32,
    section_offsets: [u32; 7],
}

impl TileHeader {
    pub fn internal_version(&self) -> i64 {
        self.internal_version
    }

    pub fn date_created(&self) -> u64 {
        self.date_created
    }

    /// Version text up to the first NUL.
    pub fn version(&self) -> &str {
        std::str::from_utf8(version_text(&self.version)).unwrap_or_default()
    }

    /// The raw version slot, terminator and padding included.
    pub fn version_bytes(&self) -> &[u8; MAX_VERSION_SIZE] {
        &self.version
    }

    pub fn node_count(&self) -> u32 {
        self.node_count
    }

    pub fn directed_edge_count(&self) -> u32 {
        self.directed_edge_count
    }

    pub fn edgeinfo_offset(&self) -> u32 {
        self.section_offset(Section::EdgeInfo)
    }

    pub fn textlist_offset(&self) -> u32 {
        self.section_offset(Section::TextList)
    }

    pub fn exitlist_offset(&self) -> u32 {
        self.section_offset(Section::ExitList)
    }

    pub fn admin_offset(&self) -> u32 {
        self.section_offset(Section::Admin)
    }

    pub fn merlist_offset(&self) -> u32 {
        self.section_offset(Section::MerList)
    }

    pub fn timedres_offset(&self) -> u32 {
        self.section_offset(Section::TimedRes)
    }

    pub fn transit_offset(&self) -> u32 {
        self.section_offset(Section::Transit)
    }

    pub fn section_offset(&self, section: Section) -> u32 {
        self.section_offsets[section as usize]
    }

    /// Byte offset where the node array starts.
    pub fn nodes_offset(&self) -> usize {
        TILE_HEADER_SIZE
    }

    /// Byte offset where the directed edge array starts.
    pub fn directed_edges_offset(&self) -> u64 {
        TILE_HEADER_SIZE as u64 + u64::from(self.node_count) * NODE_RECORD_SIZE as u64
    }

    /// First byte past the fixed header and the node/edge arrays.
    pub fn arrays_end(&self) -> u64 {
        self.directed_edges_offset()
            + u64::from(self.directed_edge_count) * DIRECTED_EDGE_SIZE as u64
    }

    /// Checks that every present section starts after the node/edge arrays and
    /// that present offsets never decrease. Zero marks an absent section.
    pub fn validate_offsets(&self) -> Result<()> {
        let arrays_end = self.arrays_end();
        let mut previous: Option<(Section, u32)> = None;
        for section in Section::ALL {
            let offset = self.section_offset(section);
            if offset == 0 {
                continue;
            }
            if u64::from(offset) < arrays_end {
                return Err(TileError::new(
                    TileErrorCode::InvalidSectionOffset,
                    format!(
                        "{} offset {offset} overlaps node/edge arrays ending at {arrays_end}.",
                        section.as_str()
                    ),
                ));
            }
            if let Some((prev_section, prev_offset)) = previous {
                if offset < prev_offset {
                    return Err(TileError::new(
                        TileErrorCode::InvalidSectionOffset,
                        format!(
                            "{} offset {offset} precedes {} offset {prev_offset}.",
                            section.as_str(),
                            prev_section.as_str()
                        ),
                    ));
                }
            }
            previous = Some((section, offset));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; TILE_HEADER_SIZE] {
        let mut bytes = [0_u8; TILE_HEADER_SIZE];
        bytes[OFFSET_INTERNAL_VERSION..OFFSET_INTERNAL_VERSION + 8]
            .copy_from_slice(&self.internal_version.to_le_bytes());
        bytes[OFFSET_DATE_CREATED..OFFSET_DATE_CREATED + 8]
            .copy_from_slice(&self.date_created.to_le_bytes());
        bytes[OFFSET_VERSION..OFFSET_VERSION + MAX_VERSION_SIZE].copy_from_slice(&self.version);
        bytes[OFFSET_NODE_COUNT..OFFSET_NODE_COUNT + 4]
            .copy_from_slice(&self.node_count.to_le_bytes());
        bytes[OFFSET_DIRECTED_EDGE_COUNT..OFFSET_DIRECTED_EDGE_COUNT + 4]
            .copy_from_slice(&self.directed_edge_count.to_le_bytes());
        for section in Section::ALL {
            let at = section.wire_offset();
            bytes[at..at + 4].copy_from_slice(&self.section_offset(section).to_le_bytes());
        }
        bytes
    }

    /// Parses the first [`TILE_HEADER_SIZE`] bytes. No version gate and no
    /// layout checks; see [`crate::decode_tile`] for those.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < TILE_HEADER_SIZE {
            return Err(TileError::new(
                TileErrorCode::InvalidHeaderLength,
                format!(
                    "Buffer of {} bytes is shorter than the {TILE_HEADER_SIZE} byte tile header.",
                    bytes.len()
                ),
            ));
        }

        let version: [u8; MAX_VERSION_SIZE] = read_array(bytes, OFFSET_VERSION)?;
        if !version.contains(&0) {
            return Err(TileError::new(
                TileErrorCode::InvalidFieldValue,
                "Version slot is not NUL terminated.",
            ));
        }
        if std::str::from_utf8(version_text(&version)).is_err() {
            return Err(TileError::new(
                TileErrorCode::InvalidFieldValue,
                "Version string is not valid UTF-8.",
            ));
        }

        let mut section_offsets = [0_u32; 7];
        for section in Section::ALL {
            section_offsets[section as usize] = read_u32_le(bytes, section.wire_offset())?;
        }

        Ok(Self {
            internal_version: read_i64_le(bytes, OFFSET_INTERNAL_VERSION)?,
            date_created: read_u64_le(bytes, OFFSET_DATE_CREATED)?,
            version,
            node_count: read_u32_le(bytes, OFFSET_NODE_COUNT)?,
            directed_edge_count: read_u32_le(bytes, OFFSET_DIRECTED_EDGE_COUNT)?,
            section_offsets,
        })
    }
}

fn version_text(slot: &[u8; MAX_VERSION_SIZE]) -> &[u8] {
    let end = slot.iter().position(|b| *b == 0).unwrap_or(slot.len());
    &slot[..end]
}

/// Mutable constructor for [`TileHeader`].
///
/// Setters store values verbatim. Cross-field checks run once, in
/// [`TileHeaderBuilder::build`], before any bytes are emitted.
#[derive(Debug, Clone, Default)]
pub struct TileHeaderBuilder {
    header: TileHeader,
}

impl TileHeaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing header, e.g. to rewrite one section offset.
    pub fn from_header(header: TileHeader) -> Self {
        Self { header }
    }

    pub fn set_internal_version(&mut self, version: i64) -> &mut Self {
        self.header.internal_version = version;
        self
    }

    pub fn set_date_created(&mut self, date: u64) -> &mut Self {
        self.header.date_created = date;
        self
    }

    /// Copies at most `MAX_VERSION_SIZE - 1` bytes, cut back to a character
    /// boundary, and always leaves the slot NUL terminated.
    pub fn set_version(&mut self, version: &str) -> &mut Self {
        let mut len = version.len().min(MAX_VERSION_SIZE - 1);
        while !version.is_char_boundary(len) {
            len -= 1;
        }
        let mut slot = [0_u8; MAX_VERSION_SIZE];
        slot[..len].copy_from_slice(&version.as_bytes()[..len]);
        self.header.version = slot;
        self
    }

    pub fn set_node_count(&mut self, count: u32) -> &mut Self {
        self.header.node_count = count;
        self
    }

    pub fn set_directed_edge_count(&mut self, count: u32) -> &mut Self {
        self.header.directed_edge_count = count;
        self
    }

    pub fn set_edgeinfo_offset(&mut self, offset: u32) -> &mut Self {
        self.set_section_offset(Section::EdgeInfo, offset)
    }

    /// Offset to the name list.
    pub fn set_textlist_offset(&mut self, offset: u32) -> &mut Self {
        self.set_section_offset(Section::TextList, offset)
    }

    pub fn set_exitlist_offset(&mut self, offset: u32) -> &mut Self {
        self.set_section_offset(Section::ExitList, offset)
    }

    pub fn set_admin_offset(&mut self, offset: u32) -> &mut Self {
        self.set_section_offset(Section::Admin, offset)
    }

    pub fn set_merlist_offset(&mut self, offset: u32) -> &mut Self {
        self.set_section_offset(Section::MerList, offset)
    }

    pub fn set_timedres_offset(&mut self, offset: u32) -> &mut Self {
        self.set_section_offset(Section::TimedRes, offset)
    }

    /// Offset to the transit departures / schedule.
    pub fn set_transit_offset(&mut self, offset: u32) -> &mut Self {
        self.set_section_offset(Section::Transit, offset)
    }

    pub fn set_section_offset(&mut self, section: Section, offset: u32) -> &mut Self {
        self.header.section_offsets[section as usize] = offset;
        self
    }

    /// Validates section offsets against the node/edge counts and returns
    /// the finished header.
    pub fn build(&self) -> Result<TileHeader> {
        if let Err(err) = self.header.validate_offsets() {
            tracing::warn!(error = %err, "rejecting tile header");
            return Err(err);
        }
        Ok(self.header)
    }
}
