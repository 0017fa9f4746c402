use crate::consts::{DIRECTED_EDGE_SIZE, NODE_RECORD_SIZE, TILE_HEADER_SIZE};
use crate::header::Section;
use crate::{NodeRecord, Result, TileError, TileErrorCode, TileHeader};

/// Borrowed, validated view over a tile buffer.
#[derive(Debug, Clone, Copy)]
pub struct TileView<'a> {
    header: TileHeader,
    bytes: &'a [u8],
}

/// Header only: no version gate and no layout checks.
pub fn inspect_tile(bytes: &[u8]) -> Result<TileHeader> {
    TileHeader::from_bytes(bytes)
}

/// Parses and validates a tile. A tile built by a different internal version
/// is rejected, since nothing but that field describes the byte layout.
pub fn decode_tile(bytes: &[u8], expected_internal_version: i64) -> Result<TileView<'_>> {
    let header = TileHeader::from_bytes(bytes)?;

    if header.internal_version() != expected_internal_version {
        tracing::warn!(
            found = header.internal_version(),
            expected = expected_internal_version,
            "tile internal version mismatch"
        );
        return Err(TileError::new(
            TileErrorCode::UnsupportedVersion,
            format!(
                "Unsupported tile internal version {}, expected {expected_internal_version}.",
                header.internal_version()
            ),
        ));
    }

    let arrays_end = header.arrays_end();
    if (bytes.len() as u64) < arrays_end {
        return Err(TileError::new(
            TileErrorCode::InvalidPayloadLength,
            format!(
                "Tile of {} bytes is shorter than its node/edge arrays ({arrays_end} bytes).",
                bytes.len()
            ),
        ));
    }

    header.validate_offsets()?;
    for section in Section::ALL {
        let offset = header.section_offset(section) as usize;
        if offset > bytes.len() {
            return Err(TileError::new(
                TileErrorCode::InvalidSectionOffset,
                format!(
                    "{} offset {offset} is past the end of a {} byte tile.",
                    section.as_str(),
                    bytes.len()
                ),
            ));
        }
    }

    tracing::debug!(
        node_count = header.node_count(),
        directed_edge_count = header.directed_edge_count(),
        tile_bytes = bytes.len(),
        "decoded graph tile"
    );

    Ok(TileView { header, bytes })
}

impl<'a> TileView<'a> {
    pub fn header(&self) -> &TileHeader {
        &self.header
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn node(&self, index: u32) -> Result<NodeRecord> {
        if index >= self.header.node_count() {
            return Err(TileError::new(
                TileErrorCode::InvalidFieldValue,
                format!(
                    "Node index {index} out of range for {} nodes.",
                    self.header.node_count()
                ),
            ));
        }
        let start = TILE_HEADER_SIZE + index as usize * NODE_RECORD_SIZE;
        NodeRecord::from_bytes(&self.bytes[start..start + NODE_RECORD_SIZE])
    }

    pub fn nodes(&self) -> impl Iterator<Item = Result<NodeRecord>> + '_ {
        (0..self.header.node_count()).map(move |index| self.node(index))
    }

    /// The whole directed edge array.
    pub fn directed_edges(&self) -> &'a [u8] {
        let start = self.header.directed_edges_offset() as usize;
        &self.bytes[start..self.header.arrays_end() as usize]
    }

    pub fn directed_edge(&self, index: u32) -> Result<&'a [u8]> {
        if index >= self.header.directed_edge_count() {
            return Err(TileError::new(
                TileErrorCode::InvalidFieldValue,
                format!(
                    "Directed edge index {index} out of range for {} edges.",
                    self.header.directed_edge_count()
                ),
            ));
        }
        let start = index as usize * DIRECTED_EDGE_SIZE;
        Ok(&self.directed_edges()[start..start + DIRECTED_EDGE_SIZE])
    }

    /// Bytes of a present section, running up to the next present section or
    /// the end of the tile. `None` for an absent section.
    pub fn section(&self, section: Section) -> Option<&'a [u8]> {
        let start = self.header.section_offset(section);
        if start == 0 {
            return None;
        }
        let end = Section::ALL
            .iter()
            .skip_while(|s| **s != section)
            .skip(1)
            .map(|s| self.header.section_offset(*s))
            .find(|offset| *offset != 0)
            .map_or(self.bytes.len(), |offset| offset as usize);
        self.bytes.get(start as usize..end)
    }
}
