use charchat_contracts::api::{
    error_detail, CharacterPhotoRecord, ChatReply, ChatRequest, ImageGenerationRequest,
    ImageGenerationResponse, MeResponse, SetMainPhotosRequest,
};
use charchat_contracts::characters::{CharacterPayload, CharacterRecord};
use charchat_contracts::endpoints;
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response as HttpResponse};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::config::{normalize_base_url, ClientConfig};
use crate::error::ClientError;

const ERROR_BODY_MAX_CHARS: usize = 512;

/// Everything the client asks of the backend.
///
/// `token` is the bearer credential; endpoints that also serve anonymous
/// visitors take it as an `Option`.
pub trait Backend {
    fn whoami(&self, token: &str) -> Result<MeResponse, ClientError>;
    fn list_models(&self) -> Result<Vec<Value>, ClientError>;
    fn chat(&self, token: Option<&str>, request: &ChatRequest) -> Result<ChatReply, ClientError>;
    fn list_characters(&self, token: Option<&str>) -> Result<Vec<CharacterRecord>, ClientError>;
    fn create_character(
        &self,
        token: &str,
        payload: &CharacterPayload,
    ) -> Result<Value, ClientError>;
    fn update_character(
        &self,
        token: &str,
        name: &str,
        payload: &CharacterPayload,
    ) -> Result<Value, ClientError>;
    fn delete_character(&self, token: &str, name: &str) -> Result<(), ClientError>;
    fn character_photos(&self, name: &str) -> Result<Vec<CharacterPhotoRecord>, ClientError>;
    fn set_main_photos(
        &self,
        token: &str,
        request: &SetMainPhotosRequest,
    ) -> Result<Value, ClientError>;
    fn generate_image(
        &self,
        token: &str,
        request: &ImageGenerationRequest,
    ) -> Result<ImageGenerationResponse, ClientError>;
    fn fallback_settings(&self) -> Result<Value, ClientError>;
}

/// `Backend` over blocking HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    http: HttpClient,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let base_url = normalize_base_url(&config.base_url)?;
        let http = HttpClient::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| ClientError::Config(format!("http client setup failed: {err}")))?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> Option<String> {
        endpoints::join(&self.base_url, path)
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
    ) -> Result<RequestBuilder, ClientError> {
        let url = self.endpoint(path).ok_or_else(|| {
            ClientError::Config(format!("invalid endpoint path: {path:?}"))
        })?;
        debug!(%method, %url, authorized = token.is_some(), "backend request");
        let mut builder = self
            .http
            .request(method, url)
            .header("x-request-id", format!("req_{}", Uuid::new_v4().simple()));
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    fn get_json<T>(&self, path: &str, token: Option<&str>) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        let response = send(self.request(Method::GET, path, token)?)?;
        decode_json_response(response)
    }

    fn send_json<Req, Res>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        payload: &Req,
    ) -> Result<Res, ClientError>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let response = send(self.request(method, path, token)?.json(payload))?;
        decode_json_response(response)
    }
}

impl Backend for HttpBackend {
    fn whoami(&self, token: &str) -> Result<MeResponse, ClientError> {
        self.get_json(endpoints::WHOAMI, Some(token))
    }

    fn list_models(&self) -> Result<Vec<Value>, ClientError> {
        self.get_json(endpoints::MODELS, None)
    }

    fn chat(&self, token: Option<&str>, request: &ChatRequest) -> Result<ChatReply, ClientError> {
        self.send_json(Method::POST, endpoints::CHAT, token, request)
    }

    fn list_characters(&self, token: Option<&str>) -> Result<Vec<CharacterRecord>, ClientError> {
        self.get_json(endpoints::CHARACTERS, token)
    }

    fn create_character(
        &self,
        token: &str,
        payload: &CharacterPayload,
    ) -> Result<Value, ClientError> {
        self.send_json(
            Method::POST,
            endpoints::CHARACTER_CREATE,
            Some(token),
            payload,
        )
    }

    fn update_character(
        &self,
        token: &str,
        name: &str,
        payload: &CharacterPayload,
    ) -> Result<Value, ClientError> {
        self.send_json(
            Method::PUT,
            &endpoints::character_path(name),
            Some(token),
            payload,
        )
    }

    fn delete_character(&self, token: &str, name: &str) -> Result<(), ClientError> {
        let response = send(self.request(
            Method::DELETE,
            &endpoints::character_path(name),
            Some(token),
        )?)?;
        decode_json_response::<Value>(response).map(|_| ())
    }

    fn character_photos(&self, name: &str) -> Result<Vec<CharacterPhotoRecord>, ClientError> {
        self.get_json(&endpoints::character_photos_path(name), None)
    }

    fn set_main_photos(
        &self,
        token: &str,
        request: &SetMainPhotosRequest,
    ) -> Result<Value, ClientError> {
        self.send_json(
            Method::POST,
            endpoints::SET_MAIN_PHOTOS,
            Some(token),
            request,
        )
    }

    fn generate_image(
        &self,
        token: &str,
        request: &ImageGenerationRequest,
    ) -> Result<ImageGenerationResponse, ClientError> {
        self.send_json(
            Method::POST,
            endpoints::GENERATE_IMAGE,
            Some(token),
            request,
        )
    }

    fn fallback_settings(&self) -> Result<Value, ClientError> {
        self.get_json(endpoints::FALLBACK_SETTINGS, None)
    }
}

fn send(builder: RequestBuilder) -> Result<HttpResponse, ClientError> {
    builder.send().map_err(|err| ClientError::Transport {
        message: err.to_string(),
    })
}

/// Maps a status and body to the client error taxonomy.
pub fn classify_failure(status: u16, body: &str) -> ClientError {
    let detail = error_detail(body);
    if status == 401 || status == 403 {
        return ClientError::Unauthorized { status, detail };
    }
    let trimmed = body.trim();
    ClientError::Http {
        status,
        detail,
        body: if trimmed.is_empty() {
            "<empty>".to_string()
        } else {
            truncate_text(trimmed, ERROR_BODY_MAX_CHARS)
        },
    }
}

fn decode_json_response<T>(response: HttpResponse) -> Result<T, ClientError>
where
    T: DeserializeOwned,
{
    let status = response.status();
    let body = response.text().map_err(|err| ClientError::Transport {
        message: err.to_string(),
    })?;
    if !status.is_success() {
        debug!(status = status.as_u16(), "backend request failed");
        return Err(classify_failure(status.as_u16(), &body));
    }
    let payload = if body.trim().is_empty() {
        "null"
    } else {
        body.as_str()
    };
    serde_json::from_str(payload).map_err(|err| ClientError::Decode {
        message: err.to_string(),
    })
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}
