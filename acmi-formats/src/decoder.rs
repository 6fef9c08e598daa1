//! Logical line → header field / global property / frame-time marker /
//! entity upsert / entity destroy.

use std::collections::HashSet;

use acmi_common::{AcmiError, GeoidGrid, Instant};

use crate::model::{AcmiData, EntityProps, Frame, Header, Scene, Transform};
use crate::scanner::LogicalLine;
use acmi_common::TimeSpan;

/// Parses the two header lines. Unlike content errors, these never throw —
/// the façade inspects `Header::is_valid()` and, if false, skips the content
/// loop entirely.
pub fn parse_header(lines: &[String]) -> Header {
    let mut header = Header::default();
    if let Some(l) = lines.first() {
        if let Some((key, value)) = l.split_once('=') {
            if key == "FileType" {
                header.file_type = value.to_string();
            }
        }
    }
    if let Some(l) = lines.get(1) {
        if let Some((key, value)) = l.split_once('=') {
            if key == "FileVersion" {
                header.file_version = value.to_string();
            }
        }
    }
    header
}

/// Stateful decoder: owns parsing scratch state and the document under
/// construction. One instance per `parse` call; no process-wide mutable
/// state.
pub struct Decoder<'g> {
    ref_time: Option<Instant>,
    ref_long: f64,
    ref_lat: f64,
    current_time_stamp: f64,
    current_scene: Scene,
    frames: Vec<Frame>,
    pending_destroy: Vec<u64>,
    kept: HashSet<u64>,
    seen: HashSet<u64>,
    filter: Vec<String>,
    geoid: Option<&'g GeoidGrid>,
    data: AcmiData,
}

impl<'g> Decoder<'g> {
    pub fn new(header: Header, filter: Vec<String>, geoid: Option<&'g GeoidGrid>) -> Self {
        let is_valid = header.is_valid();
        let mut data = AcmiData::default();
        data.header = header;
        data.is_valid = is_valid;

        Decoder {
            ref_time: None,
            ref_long: 0.0,
            ref_lat: 0.0,
            current_time_stamp: 0.0,
            current_scene: Scene::new(),
            frames: Vec::new(),
            pending_destroy: Vec::new(),
            kept: HashSet::new(),
            seen: HashSet::new(),
            filter,
            geoid,
            data,
        }
    }

    pub fn is_header_valid(&self) -> bool {
        self.data.header.is_valid()
    }

    /// Dispatches one logical line by its prefix.
    pub fn process_line(&mut self, line: &LogicalLine) {
        let text = line.text.as_str();

        if text.starts_with("0,Event") {
            return;
        }
        if let Some(rest) = text.strip_prefix("0,") {
            self.handle_global(rest);
        } else if let Some(rest) = text.strip_prefix('#') {
            self.handle_time_marker(rest);
        } else if let Some(rest) = text.strip_prefix('-') {
            self.handle_removal(rest);
        } else if let Some((id_str, rest)) = text.split_once(',') {
            match u64::from_str_radix(id_str.trim(), 16) {
                Ok(id) => self.handle_upsert(id, rest),
                Err(_) => {
                    let reason = AcmiError::MalformedRecord(format!("bad entity id: {id_str}"));
                    tracing::warn!(%reason, line = line.line_no, "skipping malformed line");
                    self.data.is_valid = false;
                }
            }
        } else {
            let reason = AcmiError::MalformedRecord(text.to_string());
            tracing::warn!(%reason, line = line.line_no, "line matched no known record shape");
            self.data.is_valid = false;
        }
    }

    fn handle_global(&mut self, rest: &str) {
        let fields = split_fields(rest);
        if fields.iter().any(|f| !f.contains('=')) {
            let reason = AcmiError::MalformedRecord(format!("global property missing '=': {rest}"));
            tracing::warn!(%reason, "skipping malformed global property line");
            self.data.is_valid = false;
            return;
        }
        for field in &fields {
            let (key, value) = field.split_once('=').unwrap();
            match key {
                "ReferenceTime" => match value.parse::<Instant>() {
                    Ok(t) => {
                        self.ref_time = Some(t);
                        self.data.global.reference_time = Some(t);
                    }
                    Err(_) => {
                        let reason = AcmiError::MalformedRecord(format!("bad ReferenceTime: {value}"));
                        tracing::warn!(%reason, "ignoring unparsable ReferenceTime");
                        self.data.is_valid = false;
                    }
                },
                "RecordingTime" => match value.parse::<Instant>() {
                    Ok(t) => self.data.global.recording_time = Some(t),
                    Err(_) => {
                        let reason = AcmiError::MalformedRecord(format!("bad RecordingTime: {value}"));
                        tracing::warn!(%reason, "ignoring unparsable RecordingTime");
                        self.data.is_valid = false;
                    }
                },
                "ReferenceLongitude" => match value.parse::<f64>() {
                    Ok(v) => {
                        self.ref_long = v;
                        self.data.global.reference_longitude = v;
                    }
                    Err(_) => {
                        let reason = AcmiError::MalformedRecord(format!("bad ReferenceLongitude: {value}"));
                        tracing::warn!(%reason, "ignoring unparsable ReferenceLongitude");
                        self.data.is_valid = false;
                    }
                },
                "ReferenceLatitude" => match value.parse::<f64>() {
                    Ok(v) => {
                        self.ref_lat = v;
                        self.data.global.reference_latitude = v;
                    }
                    Err(_) => {
                        let reason = AcmiError::MalformedRecord(format!("bad ReferenceLatitude: {value}"));
                        tracing::warn!(%reason, "ignoring unparsable ReferenceLatitude");
                        self.data.is_valid = false;
                    }
                },
                "DataSource" => self.data.global.data_source = Some(value.to_string()),
                "DataRecorder" => self.data.global.data_recorder = Some(value.to_string()),
                "Author" => self.data.global.author = Some(value.to_string()),
                "Title" => self.data.global.title = Some(value.to_string()),
                "Category" => self.data.global.category = Some(value.to_string()),
                "Briefing" => self.data.global.briefing = Some(value.to_string()),
                "Debriefing" => self.data.global.debriefing = Some(value.to_string()),
                "Comments" => self.data.global.comments = Some(value.to_string()),
                other => self.data.global.additional_props.insert(other, value),
            }
        }
    }

    fn handle_time_marker(&mut self, rest: &str) {
        let t: f64 = match rest.trim().parse::<f64>() {
            Ok(v) if v >= 0.0 => v,
            _ => {
                let reason = AcmiError::MalformedRecord(format!("bad time marker: {rest}"));
                tracing::warn!(%reason, "ignoring invalid time marker, keeping previous time stamp");
                self.data.is_valid = false;
                return;
            }
        };

        // Push the *old* snapshot (with any still-pending destructions from
        // the previous marker still present — they belong to that frame)
        // before applying this marker's own pending destructions, so a
        // removal takes effect starting at the *next* frame, not the one
        // during which it was requested.
        if t != self.current_time_stamp {
            self.frames.push(Frame { time_stamp: self.current_time_stamp, scene: self.current_scene.clone() });
            self.current_time_stamp = t;
        }

        for id in std::mem::take(&mut self.pending_destroy) {
            self.current_scene.remove(id);
        }
    }

    fn handle_removal(&mut self, rest: &str) {
        let id = match u64::from_str_radix(rest.trim(), 16) {
            Ok(v) => v,
            Err(_) => {
                let reason = AcmiError::MalformedRecord(format!("bad removal id: {rest}"));
                tracing::warn!(%reason, "ignoring malformed removal line");
                self.data.is_valid = false;
                return;
            }
        };

        if let Some(entity) = self.data.entities.get_mut(&id) {
            entity.time_span.end = self.abs_time(self.current_time_stamp);
        }
        if self.kept.contains(&id) {
            self.pending_destroy.push(id);
        }
    }

    fn handle_upsert(&mut self, id: u64, rest: &str) {
        let fields = split_fields(rest);
        if fields.iter().any(|f| !f.contains('=')) {
            let reason = AcmiError::MalformedRecord(format!("entity {id:x} property missing '=': {rest}"));
            tracing::warn!(%reason, "skipping malformed upsert line");
            self.data.is_valid = false;
            return;
        }

        let transform_value = fields.iter().find_map(|f| {
            let (key, value) = f.split_once('=').unwrap();
            (key == "T").then_some(value)
        });
        if let Some(value) = transform_value {
            if !transform_tokens_valid(value) {
                let reason = AcmiError::MalformedRecord(format!("entity {id:x} bad T= tokens: {value}"));
                tracing::warn!(%reason, "skipping upsert with unparsable transform");
                self.data.is_valid = false;
                return;
            }
        }

        let is_new = !self.seen.contains(&id);
        self.seen.insert(id);
        let mut entity = self.data.entities.remove(&id).unwrap_or_else(|| {
            let mut e = EntityProps::new(id);
            e.time_span = TimeSpan::new(self.abs_time(self.current_time_stamp), None);
            e
        });

        for field in &fields {
            let (key, value) = field.split_once('=').unwrap();
            match key {
                "Name" => entity.name = Some(value.to_string()),
                "Type" => entity.types = Some(value.split('+').map(str::to_string).collect()),
                "CallSign" => entity.callsign = Some(value.to_string()),
                "Pilot" => entity.pilot = Some(value.to_string()),
                "Group" => entity.group = Some(value.to_string()),
                "Country" => entity.country = Some(value.to_string()),
                "Coalition" => entity.coalition = Some(value.to_string()),
                "Color" => entity.color = Some(value.to_string()),
                "destroyed" if value == "1" => {
                    entity.time_span.end = self.abs_time(self.current_time_stamp);
                }
                _ => {}
            }
        }

        if is_new {
            let blocked = match &entity.types {
                Some(types) => types.iter().any(|t| self.filter.iter().any(|f| f == t)),
                None => self.filter.iter().any(|f| f == "Untyped"),
            };
            if !blocked {
                self.kept.insert(id);
            }
        }

        if self.kept.contains(&id) {
            if let Some(value) = transform_value {
                let existing = self.current_scene.get(id).copied();
                let transform = self.decode_transform(existing, value);
                self.current_scene.insert(id, transform);
            }
            self.data.entities.insert(id, entity);
        }
    }

    fn decode_transform(&self, existing: Option<Transform>, value: &str) -> Transform {
        let tokens: Vec<&str> = value.split('|').collect();
        let token = |i: usize| -> Option<f64> {
            tokens.get(i).and_then(|t| {
                let t = t.trim();
                if t.is_empty() { None } else { t.parse::<f64>().ok() }
            })
        };

        let longitude = match token(0) {
            Some(off) => self.ref_long + off,
            None => existing.map(|e| e.longitude).unwrap_or(self.ref_long),
        };
        let latitude = match token(1) {
            Some(off) => self.ref_lat + off,
            None => existing.map(|e| e.latitude).unwrap_or(self.ref_lat),
        };
        let altitude = match token(2) {
            Some(msl) => msl + self.geoid_height(latitude, longitude),
            None => existing.map(|e| e.altitude).unwrap_or_else(|| self.geoid_height(latitude, longitude)),
        };

        // Slots 3,4 (u,v) are ignored; roll/pitch/yaw are always the last
        // three of a 6-or-9-slot row.
        let (roll_idx, pitch_idx, yaw_idx) = match tokens.len() {
            n if n >= 9 => (6, 7, 8),
            n if n >= 6 => (3, 4, 5),
            _ => (usize::MAX, usize::MAX, usize::MAX),
        };

        let angle = |idx: usize, prior: Option<f64>| -> Option<f64> {
            if idx == usize::MAX {
                return prior;
            }
            match tokens.get(idx) {
                Some(t) if !t.trim().is_empty() => t.trim().parse::<f64>().ok().map(f64::to_radians),
                _ => prior,
            }
        };

        let roll = angle(roll_idx, existing.and_then(|e| e.roll));
        let pitch = angle(pitch_idx, existing.and_then(|e| e.pitch));
        let yaw = angle(yaw_idx, existing.and_then(|e| e.yaw));

        Transform { longitude, latitude, altitude, roll, pitch, yaw }
    }

    fn geoid_height(&self, lat_deg: f64, lon_deg: f64) -> f64 {
        self.geoid.map(|g| g.height_at(lat_deg, lon_deg)).unwrap_or(0.0)
    }

    fn abs_time(&self, t: f64) -> Option<Instant> {
        self.ref_time.map(|r| r + seconds_to_duration(t))
    }

    /// Pushes the in-flight frame, computes `timeSpan`, backfills unset
    /// entity `timeSpan.end`, and returns the finished document.
    pub fn finish(mut self) -> AcmiData {
        self.frames.push(Frame { time_stamp: self.current_time_stamp, scene: self.current_scene.clone() });

        let first_non_empty = self.frames.iter().find(|f| !f.scene.is_empty());
        let last = self.frames.last();

        self.data.time_span = match (self.ref_time, first_non_empty, last) {
            (Some(rt), Some(first), Some(last)) => {
                TimeSpan::new(Some(rt + seconds_to_duration(first.time_stamp)), Some(rt + seconds_to_duration(last.time_stamp)))
            }
            _ => TimeSpan::default(),
        };

        if !self.data.time_span.is_valid() {
            tracing::warn!(reason = %AcmiError::InvalidTimeSpan, "no valid reference time or non-empty frames");
            self.data.is_valid = false;
        }

        let end = self.data.time_span.end;
        for entity in self.data.entities.values_mut() {
            if entity.time_span.end.is_none() {
                entity.time_span.end = end;
            }
        }

        self.data.frames = self.frames;
        self.data
    }
}

fn seconds_to_duration(t: f64) -> chrono::Duration {
    chrono::Duration::milliseconds((t * 1000.0).round() as i64)
}

fn transform_tokens_valid(value: &str) -> bool {
    value.split('|').all(|t| {
        let t = t.trim();
        t.is_empty() || t.parse::<f64>().is_ok()
    })
}

/// Splits on commas not preceded by a backslash. The backslash is kept
/// verbatim in the returned value; the leading `\` is not stripped.
fn split_fields(s: &str) -> Vec<&str> {
    let bytes = s.as_bytes();
    let mut fields = Vec::new();
    let mut start = 0;
    for i in 0..bytes.len() {
        if bytes[i] == b',' && !(i > 0 && bytes[i - 1] == b'\\') {
            fields.push(&s[start..i]);
            start = i + 1;
        }
    }
    fields.push(&s[start..]);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use acmi_common::CancellationToken;

    fn run(input: &str, filter: &[&str]) -> AcmiData {
        let token = CancellationToken::new();
        let (header_lines, lines) = crate::scanner::scan(input, &token).unwrap();
        let header = parse_header(&header_lines);
        let filter: Vec<String> = filter.iter().map(|s| s.to_string()).collect();
        let mut decoder = Decoder::new(header, filter, None);
        for line in &lines {
            decoder.process_line(line);
        }
        decoder.finish()
    }

    const S1: &str = "FileType=text/acmi/tacview\nFileVersion=2.2\n0,ReferenceTime=2024-01-01T00:00:00Z\n0,ReferenceLongitude=0\n0,ReferenceLatitude=0\n#0\na,T=0|0|0,Name=x,Type=Air+FixedWing\n#1\na,T=0.0001|0|100\n";

    #[test]
    fn test_s1_minimal_file() {
        let data = run(S1, &[]);
        assert!(data.is_valid);
        assert_eq!(1, data.entities.len());
        assert_eq!(2, data.frames.len());

        let first = &data.frames[0];
        let t0 = first.scene.get(0xa).unwrap();
        assert_eq!(0.0, t0.altitude);

        let second = &data.frames[1];
        let t1 = second.scene.get(0xa).unwrap();
        assert_eq!(100.0, t1.altitude);
        assert!((t1.longitude - 0.0001).abs() < 1e-12);
    }

    #[test]
    fn test_s2_filter_excludes_entity() {
        let data = run(S1, &["Air"]);
        assert_eq!(0, data.entities.len());
        for frame in &data.frames {
            assert!(frame.scene.is_empty());
        }
    }

    #[test]
    fn test_s3_line_continuation() {
        let input = "h1\nh2\n0,ReferenceTime=2024-01-01T00:00:00Z\n#0\na,Name=first\\\nsecond\n";
        let data = run(input, &[]);
        assert_eq!("first\nsecond", data.entities.get(&0xa).unwrap().name.as_deref().unwrap());
    }

    #[test]
    fn test_s4_escaped_comma_preserved_in_value() {
        let input = "h1\nh2\n#0\na,Name=a\\,b,Pilot=p\n";
        let data = run(input, &[]);
        let e = data.entities.get(&0xa).unwrap();
        assert_eq!("a\\,b", e.name.as_deref().unwrap());
        assert_eq!("p", e.pilot.as_deref().unwrap());
    }

    #[test]
    fn test_s5_repeated_time_marker_single_frame() {
        let input = "h1\nh2\n#1\na,Name=x\n#1\nb,Name=y\n#2\n";
        let data = run(input, &[]);
        let at_one = data.frames.iter().filter(|f| f.time_stamp == 1.0).count();
        assert_eq!(1, at_one);
    }

    #[test]
    fn test_s6_removal_ordering() {
        let input = "h1\nh2\n0,ReferenceTime=2024-01-01T00:00:00Z\n#1\na,T=0|0|0,Name=x\n#2\n-a\n#3\n";
        let data = run(input, &[]);
        let frame_at_2 = data.frames.iter().find(|f| f.time_stamp == 2.0).unwrap();
        assert!(frame_at_2.scene.get(0xa).is_some());
        let frame_at_3 = data.frames.iter().find(|f| f.time_stamp == 3.0).unwrap();
        assert!(frame_at_3.scene.get(0xa).is_none());

        let entity = data.entities.get(&0xa).unwrap();
        let expected_end = data.global.reference_time.unwrap() + chrono::Duration::seconds(2);
        assert_eq!(Some(expected_end), entity.time_span.end);
    }

    #[test]
    fn test_reference_decoding_round_trip() {
        let input = "h1\nh2\n0,ReferenceLongitude=12.5\n0,ReferenceLatitude=-3.25\n#0\na,T=0.25|0.75|0\n";
        let data = run(input, &[]);
        let t = data.frames[0].scene.get(0xa).unwrap();
        assert_eq!(12.75, t.longitude);
        assert_eq!(-2.5, t.latitude);
    }

    #[test]
    fn test_malformed_field_sets_invalid_but_continues() {
        let input = "h1\nh2\n#0\na,NoEquals\n#1\nb,Name=y\n";
        let data = run(input, &[]);
        assert!(!data.is_valid);
        assert!(data.entities.contains_key(&0xb));
    }
}
