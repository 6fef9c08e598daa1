//! The parsed data model: header, global properties, entities, scenes,
//! frames, and the top-level `AcmiData` document.

use std::collections::HashMap;

use acmi_common::{Instant, TimeSpan};

/// First two lines of an ACMI file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Header {
    pub file_type: String,
    pub file_version: String,
}

/// File versions this decoder accepts.
pub const SUPPORTED_VERSIONS: [&str; 2] = ["2.1", "2.2"];

impl Header {
    pub fn is_valid(&self) -> bool {
        self.file_type == "text/acmi/tacview" && SUPPORTED_VERSIONS.contains(&self.file_version.as_str())
    }
}

/// A simple insertion-order-preserving string map, used for
/// `GlobalProperties::additional_props`. Iteration order must follow
/// insertion order; a `HashMap`/`BTreeMap` would not preserve it.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrderedProps {
    order: Vec<String>,
    values: HashMap<String, String>,
}

impl OrderedProps {
    pub fn new() -> Self {
        OrderedProps::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        if !self.values.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.values.insert(key, value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order.iter().map(move |k| (k.as_str(), self.values[k].as_str()))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Global (entity id `0`) properties.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlobalProperties {
    pub reference_time: Option<Instant>,
    pub reference_longitude: f64,
    pub reference_latitude: f64,
    pub data_source: Option<String>,
    pub data_recorder: Option<String>,
    pub recording_time: Option<Instant>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub category: Option<String>,
    pub briefing: Option<String>,
    pub debriefing: Option<String>,
    pub comments: Option<String>,
    pub additional_props: OrderedProps,
}

/// Position + optional orientation of one entity at one instant.
///
/// Longitude/latitude/altitude are always resolved to a concrete value
/// (inherited from the prior scene, or defaulted) since a sample always
/// needs a position. Orientation angles stay `Option`: `None` means no `T=`
/// field has ever supplied an angle for this entity, which the trajectory
/// builder uses to decide whether a sample carries orientation at all.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transform {
    pub longitude: f64,
    pub latitude: f64,
    /// Altitude above the WGS84 ellipsoid, metres (MSL value plus geoid height).
    pub altitude: f64,
    pub roll: Option<f64>,
    pub pitch: Option<f64>,
    pub yaw: Option<f64>,
}

/// A scene: the current transform of every live entity, ordered by first
/// insertion for deterministic iteration.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scene {
    order: Vec<u64>,
    map: HashMap<u64, Transform>,
}

impl Scene {
    pub fn new() -> Self {
        Scene::default()
    }

    pub fn insert(&mut self, id: u64, transform: Transform) {
        if !self.map.contains_key(&id) {
            self.order.push(id);
        }
        self.map.insert(id, transform);
    }

    pub fn remove(&mut self, id: u64) -> Option<Transform> {
        if let Some(pos) = self.order.iter().position(|&x| x == id) {
            self.order.remove(pos);
        }
        self.map.remove(&id)
    }

    pub fn get(&self, id: u64) -> Option<&Transform> {
        self.map.get(&id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.map.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &Transform)> {
        self.order.iter().map(move |id| (*id, &self.map[id]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// A scene snapshot valid from `time_stamp` until the next frame's timestamp.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame {
    /// Seconds since `GlobalProperties::reference_time`.
    pub time_stamp: f64,
    pub scene: Scene,
}

/// Metadata and lifecycle of one recorded entity.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityProps {
    pub id: u64,
    pub time_span: TimeSpan,
    pub name: Option<String>,
    pub types: Option<Vec<String>>,
    pub callsign: Option<String>,
    pub pilot: Option<String>,
    pub group: Option<String>,
    pub country: Option<String>,
    pub coalition: Option<String>,
    pub color: Option<String>,
}

impl EntityProps {
    pub fn new(id: u64) -> Self {
        EntityProps { id, ..Default::default() }
    }
}

/// Top-level parsed document.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AcmiData {
    pub is_valid: bool,
    pub header: Header,
    pub global: GlobalProperties,
    pub time_span: TimeSpan,
    pub entities: HashMap<u64, EntityProps>,
    pub frames: Vec<Frame>,
}

impl AcmiData {
    /// One-line human summary, used by the `acmi-dump` CLI.
    pub fn summary(&self) -> String {
        format!(
            "valid={} entities={} frames={} span=[{:?}, {:?}]",
            self.is_valid,
            self.entities.len(),
            self.frames.len(),
            self.time_span.start,
            self.time_span.end,
        )
    }
}
