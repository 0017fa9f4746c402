//! Bit-packed per-node record.
//!
//! ## Wire layout (40 bytes, little-endian)
//!
//! ```text
//! lng:        f32  [0..4]
//! lat:        f32  [4..8]
//! attributes: u64  [8..16]   edge_index:21 edge_count:7 best_road_class:3
//!                            access:12 intersection:5 admin_index:12 spare:4
//! flags:      u64  [16..24]  timezone:9 local_driveability:8x2 density:4
//!                            node_type:4 local_edge_count-1:3 parent:1
//!                            child:1 mode_change:1 traffic_signal:1 spare:24
//! headings:   u64  [24..32]  8 slots x 8 bits, slot i at bit 8*i
//! stop:       u32  [32..36]  stop index (transit) or name consistency mask
//! reserved:   u32  [36..40]
//! ```

use crate::common::{check_local_index, read_f32_le, read_u32_le, read_u64_le, BitField};
use crate::consts::{
    ACCESS, ADMIN_INDEX, BEST_ROAD_CLASS, CHILD, CONTINUITY_LOOKUP, DENSITY,
    DRIVEABILITY_SLOT_BITS, EDGE_COUNT, EDGE_INDEX, HEADING_EXPAND_FACTOR, HEADING_SHRINK_FACTOR,
    HEADING_SLOT_BITS, INTERSECTION, LOCAL_DRIVEABILITY, LOCAL_EDGE_COUNT, MAX_LOCAL_EDGE_INDEX,
    MODE_CHANGE, NODE_OFFSET_ATTRIBUTES, NODE_OFFSET_FLAGS, NODE_OFFSET_HEADINGS, NODE_OFFSET_LAT,
    NODE_OFFSET_LNG, NODE_OFFSET_STOP, NODE_RECORD_SIZE, NODE_TYPE, PARENT, TIMEZONE,
    TRAFFIC_SIGNAL,
};
use crate::{
    Access, IntersectionType, NodeType, Result, RoadClass, TileError, TileErrorCode,
    Traversability,
};

const HEADINGS: BitField = BitField::new(0, 64);
const NAME_CONSISTENCY_BITS: u32 = 28;

/// The shared stop slot, tagged by node role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStop {
    /// Street nodes: one bit per unordered pair of local edges.
    NameConsistency(u32),
    /// Transit stops: index used for schedule lookups.
    StopIndex(u32),
}

impl Default for NodeStop {
    fn default() -> Self {
        Self::NameConsistency(0)
    }
}

impl NodeStop {
    fn raw(self) -> u32 {
        match self {
            Self::NameConsistency(mask) | Self::StopIndex(mask) => mask,
        }
    }
}

/// One graph node. Plain value; the all-zero record is the default.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NodeRecord {
    lng: f32,
    lat: f32,
    attributes: u64,
    flags: u64,
    headings: u64,
    stop: u32,
}

impl NodeRecord {
    pub fn lng(&self) -> f32 {
        self.lng
    }

    pub fn lat(&self) -> f32 {
        self.lat
    }

    /// `(longitude, latitude)`.
    pub fn position(&self) -> (f32, f32) {
        (self.lng, self.lat)
    }

    /// Index in this tile of the first outbound directed edge.
    pub fn edge_index(&self) -> u32 {
        EDGE_INDEX.extract(self.attributes) as u32
    }

    pub fn edge_count(&self) -> u32 {
        EDGE_COUNT.extract(self.attributes) as u32
    }

    /// Best road class of any outbound edge.
    pub fn best_road_class(&self) -> RoadClass {
        // Codes are checked whenever a record is built or parsed.
        RoadClass::from_code(BEST_ROAD_CLASS.extract(self.attributes) as u8).unwrap_or_default()
    }

    /// Modes allowed to pass through the node.
    pub fn access(&self) -> Access {
        Access {
            bits: ACCESS.extract(self.attributes) as u16,
        }
    }

    pub fn intersection_type(&self) -> IntersectionType {
        IntersectionType::from_code(INTERSECTION.extract(self.attributes) as u8)
            .unwrap_or_default()
    }

    /// Index of the administrative info within the owning tile.
    pub fn admin_index(&self) -> u32 {
        ADMIN_INDEX.extract(self.attributes) as u32
    }

    /// Index into the global timezone region table.
    pub fn timezone(&self) -> u32 {
        TIMEZONE.extract(self.flags) as u32
    }

    /// Driveability of the local edge at `local_index`.
    pub fn local_driveability(&self, local_index: u32) -> Result<Traversability> {
        let slot = LOCAL_DRIVEABILITY.slot(local_index, DRIVEABILITY_SLOT_BITS)?;
        Ok(Traversability::from_bits(slot.extract(self.flags)))
    }

    /// Relative point density at the node.
    pub fn density(&self) -> u32 {
        DENSITY.extract(self.flags) as u32
    }

    pub fn node_type(&self) -> NodeType {
        NodeType::from_code(NODE_TYPE.extract(self.flags) as u8).unwrap_or_default()
    }

    pub fn is_transit(&self) -> bool {
        self.node_type().is_transit()
    }

    /// Number of edges on the local level, `1..=MAX_LOCAL_EDGE_INDEX + 1`.
    pub fn local_edge_count(&self) -> u32 {
        LOCAL_EDGE_COUNT.extract(self.flags) as u32 + 1
    }

    /// Parent transit stop.
    pub fn parent(&self) -> bool {
        PARENT.extract(self.flags) != 0
    }

    /// Child transit stop.
    pub fn child(&self) -> bool {
        CHILD.extract(self.flags) != 0
    }

    /// Whether a change of travel mode is allowed here, e.g. at a transit
    /// stop, bike share or parking.
    pub fn mode_change(&self) -> bool {
        MODE_CHANGE.extract(self.flags) != 0
    }

    pub fn traffic_signal(&self) -> bool {
        TRAFFIC_SIGNAL.extract(self.flags) != 0
    }

    /// Heading in whole degrees `[0, 360)` of the local edge at `local_index`.
    pub fn heading(&self, local_index: u32) -> Result<u32> {
        let slot = HEADINGS.slot(local_index, HEADING_SLOT_BITS)?;
        Ok(expand_heading(slot.extract(self.headings)))
    }

    /// Raw quantized heading byte of the local edge at `local_index`.
    pub fn heading_raw(&self, local_index: u32) -> Result<u8> {
        let slot = HEADINGS.slot(local_index, HEADING_SLOT_BITS)?;
        Ok(slot.extract(self.headings) as u8)
    }

    pub fn stop(&self) -> NodeStop {
        if self.is_transit() {
            NodeStop::StopIndex(self.stop)
        } else {
            NodeStop::NameConsistency(self.stop)
        }
    }

    /// Transit stop index, used for schedule lookups.
    pub fn stop_index(&self) -> Result<u32> {
        match self.stop() {
            NodeStop::StopIndex(index) => Ok(index),
            NodeStop::NameConsistency(_) => Err(TileError::new(
                TileErrorCode::NodeRoleMismatch,
                format!(
                    "Stop index requested on a {} node.",
                    self.node_type().as_str()
                ),
            )),
        }
    }

    /// Whether the names of local edges `from` and `to` are consistent.
    /// Pairs past the last local edge index are never consistent.
    pub fn name_consistency(&self, from: u32, to: u32) -> Result<bool> {
        let mask = match self.stop() {
            NodeStop::NameConsistency(mask) => mask,
            NodeStop::StopIndex(_) => {
                return Err(TileError::new(
                    TileErrorCode::NodeRoleMismatch,
                    format!(
                        "Name consistency requested on a {} node.",
                        self.node_type().as_str()
                    ),
                ))
            }
        };
        if from == to {
            return Ok(true);
        }
        Ok(match continuity_bit(from, to) {
            Some(bit) => mask & (1_u32 << bit) != 0,
            None => false,
        })
    }

    pub fn write_to(&self, out: &mut [u8; NODE_RECORD_SIZE]) {
        out[NODE_OFFSET_LNG..NODE_OFFSET_LNG + 4].copy_from_slice(&self.lng.to_le_bytes());
        out[NODE_OFFSET_LAT..NODE_OFFSET_LAT + 4].copy_from_slice(&self.lat.to_le_bytes());
        out[NODE_OFFSET_ATTRIBUTES..NODE_OFFSET_ATTRIBUTES + 8]
            .copy_from_slice(&self.attributes.to_le_bytes());
        out[NODE_OFFSET_FLAGS..NODE_OFFSET_FLAGS + 8].copy_from_slice(&self.flags.to_le_bytes());
        out[NODE_OFFSET_HEADINGS..NODE_OFFSET_HEADINGS + 8]
            .copy_from_slice(&self.headings.to_le_bytes());
        out[NODE_OFFSET_STOP..NODE_OFFSET_STOP + 4].copy_from_slice(&self.stop.to_le_bytes());
        out[NODE_OFFSET_STOP + 4..].fill(0);
    }

    pub fn to_bytes(&self) -> [u8; NODE_RECORD_SIZE] {
        let mut out = [0_u8; NODE_RECORD_SIZE];
        self.write_to(&mut out);
        out
    }

    /// Parses one record from the start of `bytes`, rejecting enum codes,
    /// access bits and name consistency bits with no meaning.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < NODE_RECORD_SIZE {
            return Err(TileError::new(
                TileErrorCode::InvalidHeaderLength,
                format!(
                    "Buffer of {} bytes is shorter than a {NODE_RECORD_SIZE} byte node record.",
                    bytes.len()
                ),
            ));
        }

        let attributes = read_u64_le(bytes, NODE_OFFSET_ATTRIBUTES)?;
        let flags = read_u64_le(bytes, NODE_OFFSET_FLAGS)?;
        RoadClass::from_code(BEST_ROAD_CLASS.extract(attributes) as u8)?;
        IntersectionType::from_code(INTERSECTION.extract(attributes) as u8)?;
        let node_type = NodeType::from_code(NODE_TYPE.extract(flags) as u8)?;
        Access::new(ACCESS.extract(attributes) as u16)?;

        let stop = read_u32_le(bytes, NODE_OFFSET_STOP)?;
        if !node_type.is_transit() && stop >> NAME_CONSISTENCY_BITS != 0 {
            return Err(TileError::new(
                TileErrorCode::InvalidFieldValue,
                format!(
                    "Name consistency mask {stop:#x} on a {} node sets unused bits.",
                    node_type.as_str()
                ),
            ));
        }

        Ok(Self {
            lng: read_f32_le(bytes, NODE_OFFSET_LNG)?,
            lat: read_f32_le(bytes, NODE_OFFSET_LAT)?,
            attributes,
            flags,
            headings: read_u64_le(bytes, NODE_OFFSET_HEADINGS)?,
            stop,
        })
    }
}

/// Bit holding the name consistency of an unordered pair of distinct local
/// edges, or `None` when either index is past the last local edge.
pub(crate) fn continuity_bit(from: u32, to: u32) -> Option<u32> {
    let (low, high) = if from < to { (from, to) } else { (to, from) };
    if low == high || high > MAX_LOCAL_EDGE_INDEX {
        return None;
    }
    Some(CONTINUITY_LOOKUP[low as usize] + (high - low - 1))
}

fn expand_heading(quantized: u64) -> u32 {
    (quantized as f64 * HEADING_EXPAND_FACTOR).round() as u32
}

fn shrink_heading(degrees: u32) -> u64 {
    (f64::from(degrees % 360) * HEADING_SHRINK_FACTOR).round() as u64
}

/// Encoder for [`NodeRecord`]. Every setter range-checks its input against
/// the packed field it writes.
#[derive(Debug, Clone, Default)]
pub struct NodeRecordBuilder {
    record: NodeRecord,
    stop: NodeStop,
}

impl NodeRecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_record(record: NodeRecord) -> Self {
        Self {
            record,
            stop: record.stop(),
        }
    }

    pub fn set_position(&mut self, lng: f32, lat: f32) -> Result<&mut Self> {
        if !lng.is_finite() || !lat.is_finite() {
            return Err(TileError::new(
                TileErrorCode::InvalidFieldValue,
                format!("Node position must be finite, got ({lng}, {lat})."),
            ));
        }
        self.record.lng = lng;
        self.record.lat = lat;
        Ok(self)
    }

    pub fn set_edge_index(&mut self, edge_index: u32) -> Result<&mut Self> {
        self.record.attributes =
            EDGE_INDEX.insert(self.record.attributes, u64::from(edge_index), "edge_index")?;
        Ok(self)
    }

    pub fn set_edge_count(&mut self, edge_count: u32) -> Result<&mut Self> {
        self.record.attributes =
            EDGE_COUNT.insert(self.record.attributes, u64::from(edge_count), "edge_count")?;
        Ok(self)
    }

    pub fn set_best_road_class(&mut self, road_class: RoadClass) -> Result<&mut Self> {
        self.record.attributes = BEST_ROAD_CLASS.insert(
            self.record.attributes,
            u64::from(road_class.code()),
            "best_road_class",
        )?;
        Ok(self)
    }

    pub fn set_access(&mut self, access: Access) -> Result<&mut Self> {
        Access::new(access.bits())?;
        self.record.attributes =
            ACCESS.insert(self.record.attributes, u64::from(access.bits()), "access")?;
        Ok(self)
    }

    pub fn set_intersection_type(&mut self, intersection: IntersectionType) -> Result<&mut Self> {
        self.record.attributes = INTERSECTION.insert(
            self.record.attributes,
            u64::from(intersection.code()),
            "intersection_type",
        )?;
        Ok(self)
    }

    pub fn set_admin_index(&mut self, admin_index: u32) -> Result<&mut Self> {
        self.record.attributes =
            ADMIN_INDEX.insert(self.record.attributes, u64::from(admin_index), "admin_index")?;
        Ok(self)
    }

    pub fn set_timezone(&mut self, timezone: u32) -> Result<&mut Self> {
        self.record.flags = TIMEZONE.insert(self.record.flags, u64::from(timezone), "timezone")?;
        Ok(self)
    }

    pub fn set_local_driveability(
        &mut self,
        local_index: u32,
        traversability: Traversability,
    ) -> Result<&mut Self> {
        let slot = LOCAL_DRIVEABILITY.slot(local_index, DRIVEABILITY_SLOT_BITS)?;
        self.record.flags = slot.insert(
            self.record.flags,
            u64::from(traversability.code()),
            "local_driveability",
        )?;
        Ok(self)
    }

    pub fn set_density(&mut self, density: u32) -> Result<&mut Self> {
        self.record.flags = DENSITY.insert(self.record.flags, u64::from(density), "density")?;
        Ok(self)
    }

    pub fn set_node_type(&mut self, node_type: NodeType) -> Result<&mut Self> {
        self.record.flags =
            NODE_TYPE.insert(self.record.flags, u64::from(node_type.code()), "node_type")?;
        Ok(self)
    }

    /// Stores `count - 1`; `count` must be in `1..=MAX_LOCAL_EDGE_INDEX + 1`.
    pub fn set_local_edge_count(&mut self, count: u32) -> Result<&mut Self> {
        if count == 0 || count > MAX_LOCAL_EDGE_INDEX + 1 {
            return Err(TileError::new(
                TileErrorCode::InvalidFieldValue,
                format!(
                    "local_edge_count must be in 1..={}, got {count}.",
                    MAX_LOCAL_EDGE_INDEX + 1
                ),
            ));
        }
        self.record.flags = LOCAL_EDGE_COUNT.insert(
            self.record.flags,
            u64::from(count - 1),
            "local_edge_count",
        )?;
        Ok(self)
    }

    pub fn set_parent(&mut self, parent: bool) -> &mut Self {
        self.set_flag(PARENT, parent)
    }

    pub fn set_child(&mut self, child: bool) -> &mut Self {
        self.set_flag(CHILD, child)
    }

    pub fn set_mode_change(&mut self, mode_change: bool) -> &mut Self {
        self.set_flag(MODE_CHANGE, mode_change)
    }

    pub fn set_traffic_signal(&mut self, traffic_signal: bool) -> &mut Self {
        self.set_flag(TRAFFIC_SIGNAL, traffic_signal)
    }

    fn set_flag(&mut self, field: BitField, value: bool) -> &mut Self {
        let bit = u64::from(value) << field.shift;
        self.record.flags = (self.record.flags & !(1_u64 << field.shift)) | bit;
        self
    }

    /// Quantizes `degrees` (taken mod 360) into the 8 bit slot for `local_index`.
    pub fn set_heading(&mut self, local_index: u32, degrees: u32) -> Result<&mut Self> {
        self.set_heading_raw(local_index, shrink_heading(degrees) as u8)
    }

    pub fn set_heading_raw(&mut self, local_index: u32, quantized: u8) -> Result<&mut Self> {
        let slot = HEADINGS.slot(local_index, HEADING_SLOT_BITS)?;
        self.record.headings = slot.insert(self.record.headings, u64::from(quantized), "heading")?;
        Ok(self)
    }

    /// Marks the stop slot as a transit stop index.
    pub fn set_stop_index(&mut self, stop_index: u32) -> &mut Self {
        self.stop = NodeStop::StopIndex(stop_index);
        self
    }

    pub fn set_name_consistency(
        &mut self,
        from: u32,
        to: u32,
        consistent: bool,
    ) -> Result<&mut Self> {
        check_local_index(from)?;
        check_local_index(to)?;
        let mask = match self.stop {
            NodeStop::NameConsistency(mask) => mask,
            NodeStop::StopIndex(_) => {
                return Err(TileError::new(
                    TileErrorCode::NodeRoleMismatch,
                    "Name consistency cannot share the slot with a stop index.",
                ))
            }
        };
        let Some(bit) = continuity_bit(from, to) else {
            return Ok(self);
        };
        debug_assert!(bit < NAME_CONSISTENCY_BITS);
        let mask = if consistent {
            mask | (1 << bit)
        } else {
            mask & !(1 << bit)
        };
        self.stop = NodeStop::NameConsistency(mask);
        Ok(self)
    }

    /// Finishes the record; the stop slot must match the node role.
    pub fn build(&self) -> Result<NodeRecord> {
        let transit = self.record.is_transit();
        match (self.stop, transit) {
            (NodeStop::StopIndex(_), false) => {
                return Err(TileError::new(
                    TileErrorCode::NodeRoleMismatch,
                    format!(
                        "A {} node cannot carry a transit stop index.",
                        self.record.node_type().as_str()
                    ),
                ))
            }
            (NodeStop::NameConsistency(mask), true) if mask != 0 => {
                return Err(TileError::new(
                    TileErrorCode::NodeRoleMismatch,
                    format!(
                        "A {} node cannot carry name consistency bits.",
                        self.record.node_type().as_str()
                    ),
                ))
            }
            _ => {}
        }
        let mut record = self.record;
        record.stop = self.stop.raw();
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn street_node() -> NodeRecordBuilder {
        let mut builder = NodeRecordBuilder::new();
        builder
            .set_position(13.404954, 52.520008)
            .unwrap()
            .set_edge_index(1_234_567)
            .unwrap()
            .set_edge_count(5)
            .unwrap()
            .set_best_road_class(RoadClass::Secondary)
            .unwrap()
            .set_access(Access::new(Access::AUTO | Access::PEDESTRIAN | Access::HOV).unwrap())
            .unwrap()
            .set_intersection_type(IntersectionType::Fork)
            .unwrap()
            .set_admin_index(4095)
            .unwrap()
            .set_timezone(311)
            .unwrap()
            .set_density(9)
            .unwrap()
            .set_node_type(NodeType::TollBooth)
            .unwrap()
            .set_local_edge_count(5)
            .unwrap()
            .set_traffic_signal(true)
            .set_mode_change(true);
        builder
    }

    #[test]
    fn default_record_is_all_zero() {
        let record = NodeRecord::default();
        assert_eq!(record.to_bytes(), [0_u8; NODE_RECORD_SIZE]);
        assert_eq!(record.local_edge_count(), 1);
        assert_eq!(record.node_type(), NodeType::StreetIntersection);
        assert_eq!(record.name_consistency(0, 1), Ok(false));
    }

    #[test]
    fn scalar_fields_roundtrip() {
        let record = street_node().build().unwrap();
        let decoded = NodeRecord::from_bytes(&record.to_bytes()).unwrap();

        assert_eq!(decoded, record);
        assert_eq!(decoded.position(), (13.404954, 52.520008));
        assert_eq!(decoded.edge_index(), 1_234_567);
        assert_eq!(decoded.edge_count(), 5);
        assert_eq!(decoded.best_road_class(), RoadClass::Secondary);
        assert_eq!(decoded.access().bits(), 0x83);
        assert_eq!(decoded.intersection_type(), IntersectionType::Fork);
        assert_eq!(decoded.admin_index(), 4095);
        assert_eq!(decoded.timezone(), 311);
        assert_eq!(decoded.density(), 9);
        assert_eq!(decoded.node_type(), NodeType::TollBooth);
        assert_eq!(decoded.local_edge_count(), 5);
        assert!(!decoded.parent());
        assert!(!decoded.child());
        assert!(decoded.mode_change());
        assert!(decoded.traffic_signal());
        assert!(!decoded.is_transit());
    }

    #[test]
    fn scalar_fields_roundtrip_at_their_maximums() {
        let mut builder = NodeRecordBuilder::new();
        builder
            .set_edge_index((1 << 21) - 1)
            .unwrap()
            .set_edge_count(127)
            .unwrap()
            .set_admin_index(4095)
            .unwrap()
            .set_timezone(511)
            .unwrap()
            .set_density(15)
            .unwrap()
            .set_best_road_class(RoadClass::ServiceOther)
            .unwrap()
            .set_local_edge_count(8)
            .unwrap();
        let record = builder.build().unwrap();
        let decoded = NodeRecord::from_bytes(&record.to_bytes()).unwrap();

        assert_eq!(decoded, record);
        assert_eq!(decoded.edge_index(), (1 << 21) - 1);
        assert_eq!(decoded.edge_count(), 127);
        assert_eq!(decoded.admin_index(), 4095);
        assert_eq!(decoded.timezone(), 511);
        assert_eq!(decoded.density(), 15);
        assert_eq!(decoded.best_road_class(), RoadClass::ServiceOther);
        assert_eq!(decoded.local_edge_count(), 8);
        assert_eq!(decoded.node_type(), NodeType::StreetIntersection);
    }

    #[test]
    fn setters_reject_values_wider_than_their_fields() {
        let mut builder = NodeRecordBuilder::new();
        let cases = [
            builder.set_edge_index(1 << 21).map(|_| ()),
            builder.set_edge_count(128).map(|_| ()),
            builder.set_admin_index(4096).map(|_| ()),
            builder.set_timezone(512).map(|_| ()),
            builder.set_density(16).map(|_| ()),
            builder.set_local_edge_count(0).map(|_| ()),
            builder.set_local_edge_count(9).map(|_| ()),
            builder.set_position(f32::NAN, 0.0).map(|_| ()),
        ];
        for result in cases {
            assert_eq!(result.unwrap_err().code, TileErrorCode::InvalidFieldValue);
        }
        assert_eq!(builder.build().unwrap(), NodeRecord::default());
    }

    #[test]
    fn local_edge_count_identity() {
        for count in 1..=MAX_LOCAL_EDGE_INDEX + 1 {
            let mut builder = NodeRecordBuilder::new();
            builder.set_local_edge_count(count).unwrap();
            let record = builder.build().unwrap();
            assert_eq!(LOCAL_EDGE_COUNT.extract(record.flags), u64::from(count - 1));
            assert_eq!(record.local_edge_count(), count);
        }
    }

    #[test]
    fn driveability_slots_are_independent() {
        let values = [
            Traversability::Forward,
            Traversability::Backward,
            Traversability::Both,
        ];
        for i in 0..=MAX_LOCAL_EDGE_INDEX {
            for j in 0..=MAX_LOCAL_EDGE_INDEX {
                if i == j {
                    continue;
                }
                for value in values {
                    let mut builder = street_node();
                    builder.set_local_driveability(j, Traversability::Both).unwrap();
                    builder.set_local_driveability(i, value).unwrap();
                    let record = builder.build().unwrap();
                    assert_eq!(record.local_driveability(i).unwrap(), value);
                    assert_eq!(record.local_driveability(j).unwrap(), Traversability::Both);

                    // Neighbouring fields in the same word are untouched.
                    assert_eq!(record.timezone(), 311);
                    assert_eq!(record.density(), 9);
                }
            }
        }
    }

    #[test]
    fn local_index_past_last_slot_is_rejected() {
        let record = street_node().build().unwrap();
        assert_eq!(
            record.local_driveability(8).unwrap_err().code,
            TileErrorCode::LocalIndexOutOfRange
        );
        assert_eq!(
            record.heading(8).unwrap_err().code,
            TileErrorCode::LocalIndexOutOfRange
        );
        let mut builder = NodeRecordBuilder::new();
        assert!(builder.set_heading(8, 90).is_err());
        assert!(builder.set_local_driveability(8, Traversability::Both).is_err());
        assert!(builder.set_name_consistency(0, 8, true).is_err());
    }

    #[test]
    fn headings_decode_from_raw_slots() {
        let mut builder = NodeRecordBuilder::new();
        builder.set_local_edge_count(4).unwrap();
        for (index, raw) in [10_u8, 64, 128, 192].into_iter().enumerate() {
            builder.set_heading_raw(index as u32, raw).unwrap();
        }
        let record = builder.build().unwrap();

        assert_eq!(LOCAL_EDGE_COUNT.extract(record.flags), 3);
        assert_eq!(record.local_edge_count(), 4);
        let headings: Vec<u32> = (0..4).map(|i| record.heading(i).unwrap()).collect();
        assert_eq!(headings, vec![14, 90, 180, 270]);
        assert!(headings.iter().all(|h| *h < 360));
    }

    #[test]
    fn heading_quantization_error_is_within_one_step() {
        for degrees in 0..360_u32 {
            let mut builder = NodeRecordBuilder::new();
            builder.set_heading(3, degrees).unwrap();
            let decoded = builder.build().unwrap().heading(3).unwrap();
            let diff = (i64::from(decoded) - i64::from(degrees)).rem_euclid(360);
            let circular = diff.min(360 - diff) as f64;
            assert!(circular <= HEADING_EXPAND_FACTOR, "{degrees} decoded as {decoded}");
        }
    }

    #[test]
    fn heading_is_monotonic_in_raw_value() {
        let mut previous = 0;
        for raw in 0..=255_u8 {
            let mut builder = NodeRecordBuilder::new();
            builder.set_heading_raw(0, raw).unwrap();
            let heading = builder.build().unwrap().heading(0).unwrap();
            assert!(heading >= previous, "raw {raw} decoded as {heading} after {previous}");
            assert!(heading < 360);
            previous = heading;
        }
        assert_eq!(previous, 359);

        let mut builder = NodeRecordBuilder::new();
        builder.set_heading(7, 359).unwrap();
        assert_eq!(builder.build().unwrap().heading_raw(7).unwrap(), 255);
    }

    #[test]
    fn heading_slots_are_independent() {
        let mut builder = NodeRecordBuilder::new();
        for index in 0..8 {
            builder.set_heading_raw(index, 0xff).unwrap();
        }
        builder.set_heading_raw(4, 0).unwrap();
        let record = builder.build().unwrap();
        for index in 0..8 {
            let expected = if index == 4 { 0 } else { 0xff };
            assert_eq!(record.heading_raw(index).unwrap(), expected);
        }
    }

    #[test]
    fn continuity_bits_are_unique_per_pair() {
        let mut bits = HashSet::new();
        for from in 0..=MAX_LOCAL_EDGE_INDEX {
            for to in from + 1..=MAX_LOCAL_EDGE_INDEX {
                let bit = continuity_bit(from, to).unwrap();
                assert_eq!(continuity_bit(to, from), Some(bit));
                assert!(bit < NAME_CONSISTENCY_BITS);
                bits.insert(bit);
            }
        }
        assert_eq!(bits.len(), 28);
        assert_eq!(continuity_bit(0, 1), Some(0));
        assert_eq!(continuity_bit(6, 7), Some(27));
    }

    #[test]
    fn name_consistency_is_symmetric_and_reflexive() {
        let mut builder = street_node();
        builder
            .set_name_consistency(0, 3, true)
            .unwrap()
            .set_name_consistency(7, 2, true)
            .unwrap()
            .set_name_consistency(5, 6, true)
            .unwrap()
            .set_name_consistency(5, 6, false)
            .unwrap();
        let record = NodeRecord::from_bytes(&builder.build().unwrap().to_bytes()).unwrap();

        for from in 0..=MAX_LOCAL_EDGE_INDEX {
            assert_eq!(record.name_consistency(from, from), Ok(true));
            for to in 0..=MAX_LOCAL_EDGE_INDEX {
                assert_eq!(
                    record.name_consistency(from, to),
                    record.name_consistency(to, from)
                );
            }
        }
        assert_eq!(record.name_consistency(3, 0), Ok(true));
        assert_eq!(record.name_consistency(2, 7), Ok(true));
        assert_eq!(record.name_consistency(5, 6), Ok(false));
        assert_eq!(record.name_consistency(1, 4), Ok(false));
    }

    #[test]
    fn name_consistency_past_last_index_is_false() {
        let mut builder = NodeRecordBuilder::new();
        for from in 0..8 {
            for to in from + 1..8 {
                builder.set_name_consistency(from, to, true).unwrap();
            }
        }
        let record = builder.build().unwrap();
        assert_eq!(record.stop(), NodeStop::NameConsistency((1 << 28) - 1));
        assert_eq!(record.name_consistency(0, 8), Ok(false));
        assert_eq!(record.name_consistency(9, 2), Ok(false));
        assert_eq!(record.name_consistency(u32::MAX, 0), Ok(false));
    }

    #[test]
    fn stop_slot_follows_node_role() {
        let mut builder = NodeRecordBuilder::new();
        builder
            .set_node_type(NodeType::BusStop)
            .unwrap()
            .set_stop_index(77_000)
            .set_parent(true);
        let stop = builder.build().unwrap();
        assert!(stop.is_transit());
        assert!(stop.parent());
        assert_eq!(stop.stop_index(), Ok(77_000));
        assert_eq!(
            stop.name_consistency(0, 1).unwrap_err().code,
            TileErrorCode::NodeRoleMismatch
        );

        let street = street_node().build().unwrap();
        assert_eq!(
            street.stop_index().unwrap_err().code,
            TileErrorCode::NodeRoleMismatch
        );
    }

    #[test]
    fn build_rejects_stop_slot_for_wrong_role() {
        let mut builder = street_node();
        builder.set_stop_index(5);
        assert_eq!(
            builder.build().unwrap_err().code,
            TileErrorCode::NodeRoleMismatch
        );

        let mut builder = NodeRecordBuilder::new();
        builder
            .set_name_consistency(1, 2, true)
            .unwrap()
            .set_node_type(NodeType::RailStop)
            .unwrap();
        assert_eq!(
            builder.build().unwrap_err().code,
            TileErrorCode::NodeRoleMismatch
        );

        let mut builder = NodeRecordBuilder::new();
        builder.set_stop_index(3);
        assert_eq!(
            builder.set_name_consistency(0, 1, true).unwrap_err().code,
            TileErrorCode::NodeRoleMismatch
        );
    }

    #[test]
    fn from_bytes_rejects_undefined_codes() {
        let mut bytes = NodeRecord::default().to_bytes();
        bytes[NODE_OFFSET_FLAGS..NODE_OFFSET_FLAGS + 8]
            .copy_from_slice(&(15_u64 << NODE_TYPE.shift).to_le_bytes());
        assert_eq!(
            NodeRecord::from_bytes(&bytes).unwrap_err().code,
            TileErrorCode::InvalidFieldValue
        );

        let mut bytes = NodeRecord::default().to_bytes();
        bytes[NODE_OFFSET_ATTRIBUTES..NODE_OFFSET_ATTRIBUTES + 8]
            .copy_from_slice(&(0x100_u64 << ACCESS.shift).to_le_bytes());
        assert!(NodeRecord::from_bytes(&bytes).is_err());

        assert_eq!(
            NodeRecord::from_bytes(&bytes[..NODE_RECORD_SIZE - 1])
                .unwrap_err()
                .code,
            TileErrorCode::InvalidHeaderLength
        );
    }

    #[test]
    fn from_bytes_rejects_unused_name_consistency_bits() {
        let mut bytes = street_node().build().unwrap().to_bytes();
        bytes[NODE_OFFSET_STOP..NODE_OFFSET_STOP + 4].copy_from_slice(&(1_u32 << 28).to_le_bytes());
        assert_eq!(
            NodeRecord::from_bytes(&bytes).unwrap_err().code,
            TileErrorCode::InvalidFieldValue
        );

        // The same bits are an ordinary stop index on a transit node.
        let mut builder = NodeRecordBuilder::new();
        builder
            .set_node_type(NodeType::MultiUseTransitStop)
            .unwrap()
            .set_stop_index(u32::MAX);
        let stop = builder.build().unwrap();
        let decoded = NodeRecord::from_bytes(&stop.to_bytes()).unwrap();
        assert_eq!(decoded.stop_index(), Ok(u32::MAX));
    }

    #[test]
    fn builder_edits_existing_record() {
        let record = street_node().build().unwrap();
        let mut builder = NodeRecordBuilder::from_record(record);
        builder.set_edge_count(6).unwrap();
        let edited = builder.build().unwrap();
        assert_eq!(edited.edge_count(), 6);
        assert_eq!(edited.edge_index(), record.edge_index());
    }
}
