//! Shared data shapes for obsws components.
//!
//! This crate holds the typed notification payloads delivered to event
//! subscribers and the reply shapes returned by the request façade in
//! `obsws-rpc`. Field names follow the broadcast server's wire format, which
//! mixes kebab-case and camelCase keys.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Deserialize a Vec that may be null or missing (both become empty vec)
fn deserialize_null_as_empty_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let opt: Option<Vec<T>> = Option::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

fn default_true() -> bool {
    true
}

/// Lifecycle of an output (stream, recording, replay buffer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputState {
    Starting,
    Started,
    Stopping,
    Stopped,
}

impl OutputState {
    /// Parse the state suffix of an update type such as `StreamStarting`.
    #[must_use]
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "Starting" => Some(Self::Starting),
            "Started" => Some(Self::Started),
            "Stopping" => Some(Self::Stopping),
            "Stopped" => Some(Self::Stopped),
            _ => None,
        }
    }

    /// Whether the output is producing data or about to.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Starting | Self::Started)
    }
}

impl fmt::Display for OutputState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Starting => "starting",
            Self::Started => "started",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Output state change, with the output's timecode when the server sent one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputChange {
    pub state: OutputState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timecode: Option<String>,
}

impl OutputChange {
    #[must_use]
    pub fn new(state: OutputState) -> Self {
        Self {
            state,
            timecode: None,
        }
    }

    #[must_use]
    pub fn with_timecode(mut self, timecode: Option<String>) -> Self {
        self.timecode = timecode;
        self
    }
}

/// A source placed inside a scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneItem {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(rename = "type", default)]
    pub source_type: String,
    /// Whether the item is visible
    #[serde(default = "default_true")]
    pub render: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub volume: f64,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub cx: f64,
    #[serde(default)]
    pub cy: f64,
    #[serde(
        rename = "parentGroupName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_group_name: Option<String>,
    #[serde(
        rename = "groupChildren",
        default,
        deserialize_with = "deserialize_null_as_empty_vec",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub group_children: Vec<SceneItem>,
}

/// A scene and its ordered sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_null_as_empty_vec")]
    pub sources: Vec<SceneItem>,
}

impl Scene {
    /// Find a source in this scene by name, searching inside groups.
    #[must_use]
    pub fn find_item(&self, name: &str) -> Option<&SceneItem> {
        fn walk<'a>(items: &'a [SceneItem], name: &str) -> Option<&'a SceneItem> {
            items.iter().find_map(|item| {
                if item.name == name {
                    Some(item)
                } else {
                    walk(&item.group_children, name)
                }
            })
        }
        walk(&self.sources, name)
    }
}

/// Reply to `GetSceneList`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SceneList {
    pub current_scene: String,
    #[serde(default, deserialize_with = "deserialize_null_as_empty_vec")]
    pub scenes: Vec<Scene>,
}

/// Reply to `GetVersion`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct VersionInfo {
    #[serde(default)]
    pub version: f64,
    pub obs_websocket_version: String,
    pub obs_studio_version: String,
    /// Comma separated list of request types the server understands
    #[serde(default)]
    pub available_requests: String,
}

impl VersionInfo {
    pub fn available_requests(&self) -> impl Iterator<Item = &str> {
        self.available_requests
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn supports(&self, request_type: &str) -> bool {
        self.available_requests().any(|r| r == request_type)
    }
}

/// Reply to `GetStreamingStatus`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StreamingStatus {
    pub streaming: bool,
    pub recording: bool,
    #[serde(default)]
    pub recording_paused: bool,
    #[serde(default)]
    pub preview_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_timecode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rec_timecode: Option<String>,
}

/// Reply to `GetStudioModeStatus`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StudioModeStatus {
    pub studio_mode: bool,
}

// ---------------------------------------------------------------------------
// Notification payloads
// ---------------------------------------------------------------------------

/// Program or preview scene changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SceneSwitched {
    pub scene_name: String,
    #[serde(default, deserialize_with = "deserialize_null_as_empty_vec")]
    pub sources: Vec<SceneItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenesChanged {
    #[serde(default, deserialize_with = "deserialize_null_as_empty_vec")]
    pub scenes: Vec<Scene>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneCollectionChanged {
    pub scene_collection: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileChanged {
    pub profile: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TransitionSwitched {
    pub transition_name: String,
}

/// Durations are in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TransitionDurationChanged {
    pub old_duration: u64,
    pub new_duration: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TransitionBegin {
    pub name: String,
    #[serde(rename = "type", default)]
    pub transition_type: String,
    #[serde(default)]
    pub duration: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_scene: Option<String>,
    pub to_scene: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StudioModeSwitched {
    pub new_state: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SceneItemRef {
    pub source_name: String,
    pub item_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SourceOrderChanged {
    pub scene_name: String,
    #[serde(default, deserialize_with = "deserialize_null_as_empty_vec")]
    pub scene_items: Vec<SceneItemRef>,
}

/// Scene item added to or removed from a scene
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SceneItemChanged {
    pub scene_name: String,
    pub item_name: String,
    #[serde(default)]
    pub item_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SceneItemVisibilityChanged {
    pub scene_name: String,
    pub item_name: String,
    #[serde(default)]
    pub item_id: i64,
    pub item_visible: bool,
}

/// Periodic stream statistics, sent every 2 seconds while streaming
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StreamStatus {
    pub streaming: bool,
    pub recording: bool,
    pub replay_buffer_active: bool,
    pub bytes_per_sec: u64,
    pub kbits_per_sec: u64,
    pub strain: f64,
    pub total_stream_time: u64,
    pub num_total_frames: u64,
    pub num_dropped_frames: u64,
    pub fps: f64,
    pub render_total_frames: u64,
    pub render_missed_frames: u64,
    pub output_total_frames: u64,
    pub output_skipped_frames: u64,
    pub average_frame_time: f64,
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub free_disk_space: f64,
    pub preview_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_timecode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rec_timecode: Option<String>,
}

impl StreamStatus {
    /// Fraction of frames dropped so far, 0.0 when nothing was sent.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // frame counters stay far below 2^52
    pub fn dropped_ratio(&self) -> f64 {
        if self.num_total_frames == 0 {
            0.0
        } else {
            self.num_dropped_frames as f64 / self.num_total_frames as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Heartbeat {
    pub pulse: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_profile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_scene: Option<String>,
    pub streaming: bool,
    pub total_stream_time: u64,
    pub total_stream_bytes: u64,
    pub total_stream_frames: u64,
    pub recording: bool,
    pub total_record_time: u64,
    pub total_record_bytes: u64,
    pub total_record_frames: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_timecode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rec_timecode: Option<String>,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Events delivered to subscribers.
///
/// `Connected` and `Disconnected` are produced locally by the session; every
/// other variant is decoded from a server notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ObsEvent {
    Connected,
    Disconnected,
    SceneSwitched(SceneSwitched),
    ScenesChanged(ScenesChanged),
    SceneCollectionChanged(SceneCollectionChanged),
    SceneCollectionListChanged,
    TransitionSwitched(TransitionSwitched),
    TransitionListChanged,
    TransitionDurationChanged(TransitionDurationChanged),
    TransitionBegin(TransitionBegin),
    ProfileChanged(ProfileChanged),
    ProfileListChanged,
    StreamingStateChanged(OutputChange),
    RecordingStateChanged(OutputChange),
    ReplayBufferStateChanged(OutputChange),
    StreamStatus(StreamStatus),
    Heartbeat(Heartbeat),
    PreviewSceneChanged(SceneSwitched),
    StudioModeSwitched(StudioModeSwitched),
    SourceOrderChanged(SourceOrderChanged),
    SceneItemAdded(SceneItemChanged),
    SceneItemRemoved(SceneItemChanged),
    SceneItemVisibilityChanged(SceneItemVisibilityChanged),
    Exiting,
}

impl ObsEvent {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Connected => EventKind::Connected,
            Self::Disconnected => EventKind::Disconnected,
            Self::SceneSwitched(_) => EventKind::SceneSwitched,
            Self::ScenesChanged(_) => EventKind::ScenesChanged,
            Self::SceneCollectionChanged(_) => EventKind::SceneCollectionChanged,
            Self::SceneCollectionListChanged => EventKind::SceneCollectionListChanged,
            Self::TransitionSwitched(_) => EventKind::TransitionSwitched,
            Self::TransitionListChanged => EventKind::TransitionListChanged,
            Self::TransitionDurationChanged(_) => EventKind::TransitionDurationChanged,
            Self::TransitionBegin(_) => EventKind::TransitionBegin,
            Self::ProfileChanged(_) => EventKind::ProfileChanged,
            Self::ProfileListChanged => EventKind::ProfileListChanged,
            Self::StreamingStateChanged(_) => EventKind::StreamingStateChanged,
            Self::RecordingStateChanged(_) => EventKind::RecordingStateChanged,
            Self::ReplayBufferStateChanged(_) => EventKind::ReplayBufferStateChanged,
            Self::StreamStatus(_) => EventKind::StreamStatus,
            Self::Heartbeat(_) => EventKind::Heartbeat,
            Self::PreviewSceneChanged(_) => EventKind::PreviewSceneChanged,
            Self::StudioModeSwitched(_) => EventKind::StudioModeSwitched,
            Self::SourceOrderChanged(_) => EventKind::SourceOrderChanged,
            Self::SceneItemAdded(_) => EventKind::SceneItemAdded,
            Self::SceneItemRemoved(_) => EventKind::SceneItemRemoved,
            Self::SceneItemVisibilityChanged(_) => EventKind::SceneItemVisibilityChanged,
            Self::Exiting => EventKind::Exiting,
        }
    }
}

/// Subscription key, one per [`ObsEvent`] variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Connected,
    Disconnected,
    SceneSwitched,
    ScenesChanged,
    SceneCollectionChanged,
    SceneCollectionListChanged,
    TransitionSwitched,
    TransitionListChanged,
    TransitionDurationChanged,
    TransitionBegin,
    ProfileChanged,
    ProfileListChanged,
    StreamingStateChanged,
    RecordingStateChanged,
    ReplayBufferStateChanged,
    StreamStatus,
    Heartbeat,
    PreviewSceneChanged,
    StudioModeSwitched,
    SourceOrderChanged,
    SceneItemAdded,
    SceneItemRemoved,
    SceneItemVisibilityChanged,
    Exiting,
}

impl EventKind {
    pub const ALL: [EventKind; 24] = [
        Self::Connected,
        Self::Disconnected,
        Self::SceneSwitched,
        Self::ScenesChanged,
        Self::SceneCollectionChanged,
        Self::SceneCollectionListChanged,
        Self::TransitionSwitched,
        Self::TransitionListChanged,
        Self::TransitionDurationChanged,
        Self::TransitionBegin,
        Self::ProfileChanged,
        Self::ProfileListChanged,
        Self::StreamingStateChanged,
        Self::RecordingStateChanged,
        Self::ReplayBufferStateChanged,
        Self::StreamStatus,
        Self::Heartbeat,
        Self::PreviewSceneChanged,
        Self::StudioModeSwitched,
        Self::SourceOrderChanged,
        Self::SceneItemAdded,
        Self::SceneItemRemoved,
        Self::SceneItemVisibilityChanged,
        Self::Exiting,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::SceneSwitched => "scene_switched",
            Self::ScenesChanged => "scenes_changed",
            Self::SceneCollectionChanged => "scene_collection_changed",
            Self::SceneCollectionListChanged => "scene_collection_list_changed",
            Self::TransitionSwitched => "transition_switched",
            Self::TransitionListChanged => "transition_list_changed",
            Self::TransitionDurationChanged => "transition_duration_changed",
            Self::TransitionBegin => "transition_begin",
            Self::ProfileChanged => "profile_changed",
            Self::ProfileListChanged => "profile_list_changed",
            Self::StreamingStateChanged => "streaming_state_changed",
            Self::RecordingStateChanged => "recording_state_changed",
            Self::ReplayBufferStateChanged => "replay_buffer_state_changed",
            Self::StreamStatus => "stream_status",
            Self::Heartbeat => "heartbeat",
            Self::PreviewSceneChanged => "preview_scene_changed",
            Self::StudioModeSwitched => "studio_mode_switched",
            Self::SourceOrderChanged => "source_order_changed",
            Self::SceneItemAdded => "scene_item_added",
            Self::SceneItemRemoved => "scene_item_removed",
            Self::SceneItemVisibilityChanged => "scene_item_visibility_changed",
            Self::Exiting => "exiting",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown event kind: {s}"))
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)] // Exact float comparisons are intentional in tests
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scene_item_defaults() {
        let item: SceneItem = serde_json::from_value(json!({"name": "Camera"})).unwrap();
        assert_eq!(item.name, "Camera");
        assert!(item.render, "Missing render flag means visible");
        assert!(item.group_children.is_empty());
        assert!(item.parent_group_name.is_none());
    }

    #[test]
    fn test_scene_item_wire_names() {
        let item: SceneItem = serde_json::from_value(json!({
            "id": 7,
            "name": "Group",
            "type": "group",
            "render": false,
            "volume": 1.0,
            "groupChildren": [{"name": "Inner", "parentGroupName": "Group"}]
        }))
        .unwrap();
        assert_eq!(item.id, 7);
        assert_eq!(item.source_type, "group");
        assert!(!item.render);
        assert_eq!(item.volume, 1.0);
        assert_eq!(item.group_children.len(), 1);
        assert_eq!(
            item.group_children[0].parent_group_name.as_deref(),
            Some("Group")
        );
    }

    #[test]
    fn test_null_sources_become_empty() {
        let scene: Scene =
            serde_json::from_value(json!({"name": "Main", "sources": null})).unwrap();
        assert!(scene.sources.is_empty());
    }

    #[test]
    fn test_scene_find_item_in_group() {
        let scene: Scene = serde_json::from_value(json!({
            "name": "Main",
            "sources": [
                {"name": "Mic"},
                {"name": "Overlay", "type": "group", "groupChildren": [{"name": "Logo"}]}
            ]
        }))
        .unwrap();
        assert_eq!(scene.find_item("Logo").map(|i| i.name.as_str()), Some("Logo"));
        assert!(scene.find_item("Missing").is_none());
    }

    #[test]
    fn test_scene_list_kebab_keys() {
        let list: SceneList = serde_json::from_value(json!({
            "current-scene": "Intro",
            "scenes": [{"name": "Intro", "sources": []}, {"name": "Outro"}]
        }))
        .unwrap();
        assert_eq!(list.current_scene, "Intro");
        assert_eq!(list.scenes.len(), 2);
    }

    #[test]
    fn test_version_info_available_requests() {
        let info: VersionInfo = serde_json::from_value(json!({
            "version": 1.1,
            "obs-websocket-version": "4.9.1",
            "obs-studio-version": "27.2.4",
            "available-requests": "GetVersion,GetAuthRequired, Authenticate"
        }))
        .unwrap();
        assert!(info.supports("Authenticate"));
        assert!(info.supports("GetVersion"));
        assert!(!info.supports("Nope"));
        assert_eq!(info.available_requests().count(), 3);
    }

    #[test]
    fn test_output_state_from_suffix() {
        assert_eq!(OutputState::from_suffix("Started"), Some(OutputState::Started));
        assert_eq!(OutputState::from_suffix("Stopped"), Some(OutputState::Stopped));
        assert_eq!(OutputState::from_suffix("Paused"), None);
        assert!(OutputState::Starting.is_active());
        assert!(!OutputState::Stopping.is_active());
    }

    #[test]
    fn test_stream_status_partial_payload() {
        let status: StreamStatus = serde_json::from_value(json!({
            "streaming": true,
            "kbits-per-sec": 2500,
            "num-total-frames": 200,
            "num-dropped-frames": 5,
            "fps": 29.97
        }))
        .unwrap();
        assert!(status.streaming);
        assert!(!status.recording);
        assert_eq!(status.kbits_per_sec, 2500);
        assert_eq!(status.fps, 29.97);
        assert_eq!(status.dropped_ratio(), 0.025);
    }

    #[test]
    fn test_stream_status_dropped_ratio_no_frames() {
        assert_eq!(StreamStatus::default().dropped_ratio(), 0.0);
    }

    #[test]
    fn test_scene_collection_uses_camel_case() {
        let changed: SceneCollectionChanged =
            serde_json::from_value(json!({"sceneCollection": "Podcast"})).unwrap();
        assert_eq!(changed.scene_collection, "Podcast");
    }

    #[test]
    fn test_event_kind_matches_variant() {
        let event = ObsEvent::StreamingStateChanged(OutputChange::new(OutputState::Started));
        assert_eq!(event.kind(), EventKind::StreamingStateChanged);
        assert_eq!(ObsEvent::Exiting.kind(), EventKind::Exiting);
    }

    #[test]
    fn test_event_serializes_adjacently_tagged() {
        let event = ObsEvent::StudioModeSwitched(StudioModeSwitched { new_state: true });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "studio_mode_switched");
        assert_eq!(value["data"]["new-state"], true);

        let value = serde_json::to_value(ObsEvent::Connected).unwrap();
        assert_eq!(value, json!({"event": "connected"}));
    }

    #[test]
    fn test_output_change_serializes_timecode_when_present() {
        let change = OutputChange::new(OutputState::Stopping)
            .with_timecode(Some("00:12:03.400".to_string()));
        let value = serde_json::to_value(ObsEvent::StreamingStateChanged(change)).unwrap();
        assert_eq!(value["data"]["state"], "stopping");
        assert_eq!(value["data"]["timecode"], "00:12:03.400");

        let value =
            serde_json::to_value(OutputChange::new(OutputState::Started)).unwrap();
        assert_eq!(value, json!({"state": "started"}));
    }

    #[test]
    fn test_event_kind_from_str() {
        assert_eq!(
            "scene_switched".parse::<EventKind>().unwrap(),
            EventKind::SceneSwitched
        );
        assert!("SceneSwitched".parse::<EventKind>().is_err());
    }

    #[test]
    fn test_event_kind_names_are_unique() {
        let mut names: Vec<_> = EventKind::ALL.iter().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), EventKind::ALL.len());
    }
}
