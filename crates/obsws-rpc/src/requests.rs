//! Typed wrappers for common requests.
//!
//! Each method only builds the request fields and decodes the reply; all of
//! the correlation, timeout and error handling lives in [`ObsClient::send`].

use obsws_types::{Scene, SceneList, StreamingStatus, StudioModeStatus, VersionInfo};
use serde_json::json;

use crate::client::ObsClient;
use crate::error::Result;
use crate::protocol::Fields;

impl ObsClient {
    /// # Errors
    ///
    /// Returns any error from [`ObsClient::send`] or reply decoding.
    pub async fn get_version(&self) -> Result<VersionInfo> {
        self.request("GetVersion", Fields::new()).await
    }

    /// The scene currently shown on program output.
    ///
    /// # Errors
    ///
    /// Returns any error from [`ObsClient::send`] or reply decoding.
    pub async fn get_current_scene(&self) -> Result<Scene> {
        self.request("GetCurrentScene", Fields::new()).await
    }

    /// # Errors
    ///
    /// Returns `Error::Protocol` if the scene does not exist.
    pub async fn set_current_scene(&self, scene_name: &str) -> Result<()> {
        self.call("SetCurrentScene", json!({ "scene-name": scene_name }))
            .await
    }

    /// # Errors
    ///
    /// Returns any error from [`ObsClient::send`] or reply decoding.
    pub async fn get_scene_list(&self) -> Result<SceneList> {
        self.request("GetSceneList", Fields::new()).await
    }

    /// Show or hide a source. `scene_name` defaults to the current scene.
    ///
    /// # Errors
    ///
    /// Returns `Error::Protocol` if the scene or source does not exist.
    pub async fn set_scene_item_visible(
        &self,
        scene_name: Option<&str>,
        source: &str,
        visible: bool,
    ) -> Result<()> {
        let mut fields = Fields::new();
        if let Some(scene_name) = scene_name {
            fields.insert("scene-name".to_string(), json!(scene_name));
        }
        fields.insert("source".to_string(), json!(source));
        fields.insert("render".to_string(), json!(visible));
        self.call("SetSceneItemRender", fields).await
    }

    /// # Errors
    ///
    /// Returns any error from [`ObsClient::send`] or reply decoding.
    pub async fn get_streaming_status(&self) -> Result<StreamingStatus> {
        self.request("GetStreamingStatus", Fields::new()).await
    }

    /// # Errors
    ///
    /// Returns any error from [`ObsClient::send`].
    pub async fn start_stop_streaming(&self) -> Result<()> {
        self.call("StartStopStreaming", Fields::new()).await
    }

    /// # Errors
    ///
    /// Returns `Error::Protocol` if streaming is already active.
    pub async fn start_streaming(&self) -> Result<()> {
        self.call("StartStreaming", Fields::new()).await
    }

    /// # Errors
    ///
    /// Returns `Error::Protocol` if streaming is not active.
    pub async fn stop_streaming(&self) -> Result<()> {
        self.call("StopStreaming", Fields::new()).await
    }

    /// # Errors
    ///
    /// Returns any error from [`ObsClient::send`].
    pub async fn start_stop_recording(&self) -> Result<()> {
        self.call("StartStopRecording", Fields::new()).await
    }

    /// # Errors
    ///
    /// Returns any error from [`ObsClient::send`] or reply decoding.
    pub async fn get_studio_mode_status(&self) -> Result<bool> {
        let status: StudioModeStatus = self.request("GetStudioModeStatus", Fields::new()).await?;
        Ok(status.studio_mode)
    }

    /// # Errors
    ///
    /// Returns any error from [`ObsClient::send`].
    pub async fn toggle_studio_mode(&self) -> Result<()> {
        self.call("ToggleStudioMode", Fields::new()).await
    }

    /// Enable or disable the periodic `Heartbeat` notification.
    ///
    /// # Errors
    ///
    /// Returns any error from [`ObsClient::send`].
    pub async fn set_heartbeat(&self, enable: bool) -> Result<()> {
        self.call("SetHeartbeat", json!({ "enable": enable })).await
    }
}
