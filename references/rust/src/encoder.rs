use crate::consts::{DIRECTED_EDGE_SIZE, NODE_RECORD_SIZE, TILE_HEADER_SIZE};
use crate::header::Section;
use crate::{NodeRecord, Result, TileError, TileErrorCode, TileHeader, TileHeaderBuilder};

/// Raw bytes of the variable-length sections. `None` leaves a section absent
/// (offset 0); `Some(&[])` records an empty but present section.
#[derive(Debug, Clone, Copy, Default)]
pub struct TileSections<'a> {
    pub edgeinfo: Option<&'a [u8]>,
    pub textlist: Option<&'a [u8]>,
    pub exitlist: Option<&'a [u8]>,
    pub admin: Option<&'a [u8]>,
    pub merlist: Option<&'a [u8]>,
    pub timedres: Option<&'a [u8]>,
    pub transit: Option<&'a [u8]>,
}

impl<'a> TileSections<'a> {
    pub fn get(&self, section: Section) -> Option<&'a [u8]> {
        match section {
            Section::EdgeInfo => self.edgeinfo,
            Section::TextList => self.textlist,
            Section::ExitList => self.exitlist,
            Section::Admin => self.admin,
            Section::MerList => self.merlist,
            Section::TimedRes => self.timedres,
            Section::Transit => self.transit,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TileEncodeInput<'a> {
    pub internal_version: i64,
    pub date_created: u64,
    pub version: &'a str,
    pub nodes: &'a [NodeRecord],
    /// Directed edge records, opaque here; must be a whole number of records.
    pub directed_edges: &'a [u8],
    pub sections: TileSections<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncodedTile {
    pub bytes: Vec<u8>,
    pub header: TileHeader,
}

/// Lays out `[header][nodes][directed edges][sections...]` and fills in the
/// header counts and section offsets.
pub fn encode_tile(input: TileEncodeInput<'_>) -> Result<EncodedTile> {
    if !input.directed_edges.len().is_multiple_of(DIRECTED_EDGE_SIZE) {
        return Err(TileError::new(
            TileErrorCode::InvalidPayloadLength,
            format!(
                "Directed edge bytes ({}) are not a multiple of {DIRECTED_EDGE_SIZE}.",
                input.directed_edges.len()
            ),
        ));
    }
    let node_count = count_to_u32(input.nodes.len(), "node")?;
    let directed_edge_count =
        count_to_u32(input.directed_edges.len() / DIRECTED_EDGE_SIZE, "directed edge")?;

    let sections_len: usize = Section::ALL
        .iter()
        .filter_map(|section| input.sections.get(*section))
        .map(<[u8]>::len)
        .sum();
    let mut bytes = Vec::with_capacity(
        TILE_HEADER_SIZE
            + input.nodes.len() * NODE_RECORD_SIZE
            + input.directed_edges.len()
            + sections_len,
    );
    bytes.resize(TILE_HEADER_SIZE, 0);

    let mut record = [0_u8; NODE_RECORD_SIZE];
    for node in input.nodes {
        node.write_to(&mut record);
        bytes.extend_from_slice(&record);
    }
    bytes.extend_from_slice(input.directed_edges);

    let mut builder = TileHeaderBuilder::new();
    builder
        .set_internal_version(input.internal_version)
        .set_date_created(input.date_created)
        .set_version(input.version)
        .set_node_count(node_count)
        .set_directed_edge_count(directed_edge_count);

    for section in Section::ALL {
        let Some(section_bytes) = input.sections.get(section) else {
            continue;
        };
        let offset = u32::try_from(bytes.len()).map_err(|_| {
            TileError::new(
                TileErrorCode::InvalidSectionOffset,
                format!("{} section starts past the u32 offset range.", section.as_str()),
            )
        })?;
        builder.set_section_offset(section, offset);
        bytes.extend_from_slice(section_bytes);
    }

    let header = builder.build()?;
    bytes[..TILE_HEADER_SIZE].copy_from_slice(&header.to_bytes());

    tracing::debug!(
        node_count,
        directed_edge_count,
        tile_bytes = bytes.len(),
        version = header.version(),
        "encoded graph tile"
    );

    Ok(EncodedTile { bytes, header })
}

fn count_to_u32(count: usize, what: &str) -> Result<u32> {
    u32::try_from(count).map_err(|_| {
        TileError::new(
            TileErrorCode::InvalidFieldValue,
            format!("Too many {what} records for one tile: {count}."),
        )
    })
}
