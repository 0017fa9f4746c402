//! Debug/export view of a node, with the admin and timezone indexes resolved
//! through the owning tile container.

use serde::Serialize;

use crate::{Access, NodeRecord, Result, TileError, TileErrorCode};

/// Administrative region names and codes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdminInfo {
    pub country_iso: String,
    pub country_text: String,
    pub state_iso: String,
    pub state_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimeZoneInfo {
    pub posix: String,
    pub standard_name: String,
    /// Set only for zones that observe daylight saving time.
    pub dst_name: Option<String>,
}

/// Lookups a node report needs from the tile that owns the node.
/// Unknown indexes resolve to `None` and are left out of the report.
pub trait NodeContext {
    fn admin_info(&self, admin_index: u32) -> Option<AdminInfo>;
    fn time_zone(&self, timezone_index: u32) -> Option<TimeZoneInfo>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessReport {
    pub bicycle: bool,
    pub bus: bool,
    pub car: bool,
    pub emergency: bool,
    #[serde(rename = "HOV")]
    pub hov: bool,
    pub pedestrian: bool,
    pub taxi: bool,
    pub truck: bool,
}

impl From<Access> for AccessReport {
    fn from(access: Access) -> Self {
        Self {
            bicycle: access.has(Access::BICYCLE),
            bus: access.has(Access::BUS),
            car: access.has(Access::AUTO),
            emergency: access.has(Access::EMERGENCY),
            hov: access.has(Access::HOV),
            pedestrian: access.has(Access::PEDESTRIAN),
            taxi: access.has(Access::TAXI),
            truck: access.has(Access::TRUCK),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AdministrativeReport {
    #[serde(rename = "iso_3166-1", skip_serializing_if = "Option::is_none")]
    pub country_iso: Option<String>,
    #[serde(rename = "country", skip_serializing_if = "Option::is_none")]
    pub country_text: Option<String>,
    #[serde(rename = "iso_3166-2", skip_serializing_if = "Option::is_none")]
    pub state_iso: Option<String>,
    #[serde(rename = "state", skip_serializing_if = "Option::is_none")]
    pub state_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone_posix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard_time_zone_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daylight_savings_time_zone_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeReport {
    pub lon: f64,
    pub lat: f64,
    pub best_road_class: &'static str,
    pub edge_count: u32,
    pub access: AccessReport,
    pub intersection_type: &'static str,
    pub administrative: AdministrativeReport,
    pub child: bool,
    pub density: u32,
    pub local_edge_count: u32,
    pub mode_change: bool,
    pub parent: bool,
    pub traffic_signal: bool,
    #[serde(rename = "type")]
    pub node_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_index: Option<u32>,
}

impl NodeReport {
    pub fn to_json(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(|err| {
            TileError::new(
                TileErrorCode::InvalidFieldValue,
                format!("Could not render node report: {err}"),
            )
        })
    }
}

impl NodeRecord {
    pub fn report(&self, context: &dyn NodeContext) -> NodeReport {
        let mut administrative = AdministrativeReport::default();
        if let Some(admin) = context.admin_info(self.admin_index()) {
            administrative.country_iso = Some(admin.country_iso);
            administrative.country_text = Some(admin.country_text);
            administrative.state_iso = Some(admin.state_iso);
            administrative.state_text = Some(admin.state_text);
        }
        if let Some(tz) = context.time_zone(self.timezone()) {
            administrative.time_zone_posix = Some(tz.posix);
            administrative.standard_time_zone_name = Some(tz.standard_name);
            administrative.daylight_savings_time_zone_name = tz.dst_name;
        }

        NodeReport {
            lon: round6(self.lng()),
            lat: round6(self.lat()),
            best_road_class: self.best_road_class().as_str(),
            edge_count: self.edge_count(),
            access: self.access().into(),
            intersection_type: self.intersection_type().as_str(),
            administrative,
            child: self.child(),
            density: self.density(),
            local_edge_count: self.local_edge_count(),
            mode_change: self.mode_change(),
            parent: self.parent(),
            traffic_signal: self.traffic_signal(),
            node_type: self.node_type().as_str(),
            stop_index: self.stop_index().ok(),
        }
    }
}

fn round6(value: f32) -> f64 {
    (f64::from(value) * 1e6).round() / 1e6
}
