use regulations_logging::regs_debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::types::{CreateResponse, RawTaskStatus, VersionLookup};
use crate::upload::build_form;
use crate::{
    ActionResponse, CancelStatus, ClientError, ClientSettings, FailureKind, RegulationVersion,
    ResourceRecord, TaskId, TaskStatus, UploadRequest,
};

/// HTTP contract of the regulations backend.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// `POST /create/`: uploads files and metadata, returns the new task id.
    async fn create_task(&self, request: &UploadRequest) -> Result<TaskId, ClientError>;

    /// `GET /task_progress/{task_id}`.
    async fn task_progress(&self, task_id: TaskId) -> Result<TaskStatus, ClientError>;

    /// `GET /cancel_task/{task_id}`.
    async fn cancel_task(&self, task_id: TaskId) -> Result<CancelStatus, ClientError>;

    /// `POST /search/` with a flat field map.
    async fn search(&self, query: &[(String, String)]) -> Result<Vec<ResourceRecord>, ClientError>;

    /// `POST /update/`.
    async fn update_regulation(
        &self,
        exist_name: &str,
        xml: &str,
    ) -> Result<ActionResponse, ClientError>;

    /// `GET /regulations/{exist_name}?version={version}`.
    async fn regulation_version(
        &self,
        exist_name: &str,
        version: u32,
    ) -> Result<RegulationVersion, ClientError>;

    /// `DELETE /delete/{exist_name}`.
    async fn delete_regulation(&self, exist_name: &str) -> Result<ActionResponse, ClientError>;
}

#[derive(Serialize)]
struct UpdateBody<'a> {
    exist_name: &'a str,
    xml_regulation: &'a str,
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: ClientSettings,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ClientError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        regs_debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        read_json(response).await
    }

    async fn post_json<B, T>(&self, url: Url, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        regs_debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(response).await
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn create_task(&self, request: &UploadRequest) -> Result<TaskId, ClientError> {
        let url = self.settings.endpoint(&["create", ""])?;
        let form = build_form(request).await?;
        regs_debug!("POST {} files={}", url, request.files.len());
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let created: CreateResponse = read_json(response).await?;
        Ok(created.task_id)
    }

    async fn task_progress(&self, task_id: TaskId) -> Result<TaskStatus, ClientError> {
        let url = self
            .settings
            .endpoint(&["task_progress", &task_id.to_string()])?;
        let raw: RawTaskStatus = self.get_json(url).await?;
        raw.into_task_status()
    }

    async fn cancel_task(&self, task_id: TaskId) -> Result<CancelStatus, ClientError> {
        let url = self
            .settings
            .endpoint(&["cancel_task", &task_id.to_string()])?;
        let raw: RawTaskStatus = self.get_json(url).await?;
        raw.into_cancel_status()
    }

    async fn search(&self, query: &[(String, String)]) -> Result<Vec<ResourceRecord>, ClientError> {
        let url = self.settings.endpoint(&["search", ""])?;
        let body: serde_json::Map<String, serde_json::Value> = query
            .iter()
            .map(|(key, value)| (key.clone(), serde_json::Value::String(value.clone())))
            .collect();
        self.post_json(url, &body).await
    }

    async fn update_regulation(
        &self,
        exist_name: &str,
        xml: &str,
    ) -> Result<ActionResponse, ClientError> {
        let url = self.settings.endpoint(&["update", ""])?;
        let body = UpdateBody {
            exist_name,
            xml_regulation: xml,
        };
        self.post_json(url, &body).await
    }

    async fn regulation_version(
        &self,
        exist_name: &str,
        version: u32,
    ) -> Result<RegulationVersion, ClientError> {
        let mut url = self.settings.endpoint(&["regulations", exist_name])?;
        url.query_pairs_mut()
            .append_pair("version", &version.to_string());
        match self.get_json::<VersionLookup>(url).await? {
            VersionLookup::Found(found) => Ok(found),
            VersionLookup::Missing(message) => Err(ClientError::new(FailureKind::Backend, message)),
        }
    }

    async fn delete_regulation(&self, exist_name: &str) -> Result<ActionResponse, ClientError> {
        let url = self.settings.endpoint(&["delete", exist_name])?;
        regs_debug!("DELETE {}", url);
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::new(
            FailureKind::HttpStatus(status.as_u16()),
            status.to_string(),
        ));
    }
    let bytes = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&bytes).map_err(|err| ClientError::new(FailureKind::Decode, err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        return ClientError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_builder() {
        return ClientError::new(FailureKind::InvalidUrl, err.to_string());
    }
    ClientError::new(FailureKind::Network, err.to_string())
}
