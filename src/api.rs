// API client module: a small blocking HTTP client for the Pinry v2 REST
// API. Every request carries the `Authorization: Token <token>` header
// installed on the underlying reqwest client.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use reqwest::blocking::{multipart, Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::config::{parse_host, Config};
use crate::error::{PinryError, Result};

const API_PREFIX: &str = "/api/v2/";

/// Blocking client bound to one Pinry instance and token.
pub struct PinryClient {
    client: Client,
    pinry_url: Url,
    profile_url: Url,
    pin_creation_url: Url,
    image_creation_url: Url,
    board_add_url: Url,
    board_list_url: Url,
    /// Board name -> board id, filled lazily from the auto-complete endpoint.
    cached_boards: Option<HashMap<String, u64>>,
}

/// Where the image for a new pin comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PinSource {
    /// Remote image fetched by the server.
    #[serde(rename = "url")]
    Url(String),
    /// Image previously uploaded through the images endpoint.
    #[serde(rename = "image_by_id")]
    ImageById(u64),
}

/// JSON body for `POST /api/v2/pins/`.
#[derive(Debug, Clone, Serialize)]
pub struct PinRequest {
    pub description: String,
    pub referer: String,
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub source: PinSource,
}

/// The fields of a created pin that the CLI uses.
#[derive(Debug, Deserialize)]
pub struct PinResponse {
    pub id: u64,
    pub resource_link: String,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct BoardSummary {
    id: u64,
    name: String,
}

/// Positional argument of `add`: a remote url or a local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinTarget {
    Url(String),
    File(PathBuf),
}

impl PinTarget {
    /// Anything starting with `http` is treated as a url.
    pub fn parse(file_or_url: &str) -> Self {
        if file_or_url.starts_with("http") {
            PinTarget::Url(file_or_url.to_string())
        } else {
            PinTarget::File(PathBuf::from(file_or_url))
        }
    }
}

/// Split a comma separated tag list, dropping blank entries.
pub fn parse_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

impl PinryClient {
    /// Create a client for the instance at `pinry_url`, e.g.
    /// `https://pin.example.com/`.
    pub fn new(pinry_url: &str, token: &str) -> Result<Self> {
        let pinry_url = parse_host(pinry_url)?;
        let api_prefix = join(&pinry_url, API_PREFIX)?;

        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(&format!("Token {}", token))
            .map_err(|e| PinryError::InvalidToken(e.to_string()))?;
        headers.insert(AUTHORIZATION, value);

        let client = Client::builder().default_headers(headers).build()?;

        Ok(PinryClient {
            client,
            profile_url: join(&pinry_url, "/api/v2/profile/users/")?,
            pin_creation_url: join(&api_prefix, "pins/")?,
            image_creation_url: join(&api_prefix, "images/")?,
            board_add_url: join(&api_prefix, "boards/")?,
            board_list_url: join(&api_prefix, "boards-auto-complete/")?,
            pinry_url,
            cached_boards: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.pinry_url, &config.token)
    }

    pub fn pinry_url(&self) -> &Url {
        &self.pinry_url
    }

    /// A token is valid when the profile endpoint answers 200 with at
    /// least one user.
    pub fn is_token_valid(&self) -> Result<bool> {
        debug!(url = %self.profile_url, "checking token");
        let res = self.client.get(self.profile_url.clone()).send()?;
        if res.status() != StatusCode::OK {
            debug!(status = %res.status(), "profile request rejected");
            return Ok(false);
        }
        let users: serde_json::Value = res.json()?;
        Ok(users != serde_json::Value::Array(Vec::new()))
    }

    /// Board name -> id map, fetched on first use.
    pub fn boards(&mut self) -> Result<&HashMap<String, u64>> {
        if self.cached_boards.is_none() {
            self.update_board_cache()?;
        }
        Ok(self.cached_boards.get_or_insert_with(HashMap::new))
    }

    fn update_board_cache(&mut self) -> Result<()> {
        debug!(url = %self.board_list_url, "fetching boards");
        let res = self.client.get(self.board_list_url.clone()).send()?;
        if !res.status().is_success() {
            return Err(PinryError::UnexpectedStatus {
                url: self.board_list_url.to_string(),
                status: res.status(),
            });
        }
        let boards: Vec<BoardSummary> = res.json()?;
        self.cached_boards = Some(boards.into_iter().map(|b| (b.name, b.id)).collect());
        Ok(())
    }

    /// Create each named board, then refresh the board cache.
    pub fn create_boards<I, S>(&mut self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref();
            info!(board = name, "creating board");
            let res = self
                .client
                .post(self.board_add_url.clone())
                .json(&serde_json::json!({ "name": name }))
                .send()?;
            if !res.status().is_success() {
                let status = res.status();
                return Err(PinryError::BoardCreationFailed {
                    name: name.to_string(),
                    status,
                    body: body_text(res),
                });
            }
        }
        self.update_board_cache()
    }

    /// Create the board unless a board with that name already exists.
    pub fn ensure_board(&mut self, name: &str) -> Result<()> {
        if self.boards()?.contains_key(name) {
            return Ok(());
        }
        self.create_boards([name])
    }

    /// Upload a local image and return the id the server assigned to it.
    pub fn upload_image(&self, file_path: &Path) -> Result<u64> {
        if !file_path.is_file() {
            return Err(PinryError::ImageNotFound(file_path.to_path_buf()));
        }
        let data = fs::read(file_path)?;
        let file_name = file_path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("image")
            .to_string();

        let mut part = multipart::Part::bytes(data).file_name(file_name);
        if let Some(mime) = guess_mime(file_path) {
            part = part.mime_str(mime)?;
        }
        let form = multipart::Form::new().part("image", part);

        info!(path = %file_path.display(), "uploading image");
        let res = self
            .client
            .post(self.image_creation_url.clone())
            .multipart(form)
            .send()?;
        if res.status() != StatusCode::CREATED {
            let status = res.status();
            return Err(PinryError::UploadFailed {
                path: file_path.to_path_buf(),
                status,
                body: body_text(res),
            });
        }
        let image: ImageResponse = res.json()?;
        debug!(image_id = image.id, "image uploaded");
        Ok(image.id)
    }

    /// Create a pin and optionally attach it to `board_name`. Returns the
    /// pin's resource link.
    pub fn create_pin(&mut self, data: &PinRequest, board_name: Option<&str>) -> Result<String> {
        debug!(url = %self.pin_creation_url, ?data, "creating pin");
        let res = self
            .client
            .post(self.pin_creation_url.clone())
            .json(data)
            .send()?;
        if res.status() != StatusCode::CREATED {
            let status = res.status();
            return Err(PinryError::PinCreationFailed {
                payload: serde_json::to_string(data)?,
                status,
                body: body_text(res),
            });
        }
        let pin: PinResponse = res.json()?;
        info!(pin_id = pin.id, "pin created");

        if let Some(board) = board_name {
            self.add_pin_to_board(pin.id, board)?;
        }
        Ok(pin.resource_link)
    }

    /// PATCH the board so that it includes the pin.
    pub fn add_pin_to_board(&mut self, pin_id: u64, board_name: &str) -> Result<()> {
        let board_id = *self
            .boards()?
            .get(board_name)
            .ok_or_else(|| PinryError::BoardNotFound(board_name.to_string()))?;
        let board_url = join(&self.board_add_url, &format!("{}/", board_id))?;

        debug!(url = %board_url, pin_id, "adding pin to board");
        let res = self
            .client
            .patch(board_url)
            .json(&serde_json::json!({ "pins_to_add": [pin_id] }))
            .send()?;
        if res.status() != StatusCode::OK {
            return Err(PinryError::BoardAttachFailed {
                board: board_name.to_string(),
                pin_id,
                status: res.status(),
            });
        }
        Ok(())
    }

    /// Upload `file_path`, then pin the uploaded image.
    pub fn create_with_file_upload(
        &mut self,
        description: &str,
        referer: &str,
        file_path: &Path,
        tags: Vec<String>,
        board_name: Option<&str>,
    ) -> Result<String> {
        let image_id = self.upload_image(file_path)?;
        let data = PinRequest {
            description: description.to_string(),
            referer: referer.to_string(),
            tags,
            source: PinSource::ImageById(image_id),
        };
        self.create_pin(&data, board_name)
    }

    /// Pin a remote image by url.
    pub fn create(
        &mut self,
        description: &str,
        referer: &str,
        url: &str,
        board_name: Option<&str>,
        tags: Vec<String>,
    ) -> Result<String> {
        let data = PinRequest {
            description: description.to_string(),
            referer: referer.to_string(),
            tags,
            source: PinSource::Url(url.to_string()),
        };
        self.create_pin(&data, board_name)
    }
}

fn join(base: &Url, path: &str) -> Result<Url> {
    base.join(path).map_err(|e| PinryError::InvalidUrl {
        url: format!("{}{}", base, path),
        reason: e.to_string(),
    })
}

fn body_text(res: Response) -> String {
    res.text().unwrap_or_default()
}

fn guess_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_ignore_host_path() {
        let client = PinryClient::new("https://pin.example.com/some/path", "tok").unwrap();
        assert_eq!(
            client.pin_creation_url.as_str(),
            "https://pin.example.com/api/v2/pins/"
        );
        assert_eq!(
            client.image_creation_url.as_str(),
            "https://pin.example.com/api/v2/images/"
        );
        assert_eq!(
            client.board_list_url.as_str(),
            "https://pin.example.com/api/v2/boards-auto-complete/"
        );
        assert_eq!(
            client.profile_url.as_str(),
            "https://pin.example.com/api/v2/profile/users/"
        );
        assert_eq!(
            join(&client.board_add_url, "7/").unwrap().as_str(),
            "https://pin.example.com/api/v2/boards/7/"
        );
    }

    #[test]
    fn new_rejects_bad_host() {
        assert!(matches!(
            PinryClient::new("not a url", "tok"),
            Err(PinryError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn new_rejects_unprintable_token() {
        assert!(matches!(
            PinryClient::new("https://pin.example.com", "bad\ntoken"),
            Err(PinryError::InvalidToken(_))
        ));
    }

    #[test]
    fn url_pin_payload() {
        let data = PinRequest {
            description: "a cat".into(),
            referer: "https://ref.example.com".into(),
            tags: vec!["cat".into(), "cute".into()],
            source: PinSource::Url("https://img.example.com/cat.png".into()),
        };
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "description": "a cat",
                "referer": "https://ref.example.com",
                "tags": ["cat", "cute"],
                "url": "https://img.example.com/cat.png",
            })
        );
    }

    #[test]
    fn uploaded_pin_payload() {
        let data = PinRequest {
            description: String::new(),
            referer: String::new(),
            tags: Vec::new(),
            source: PinSource::ImageById(42),
        };
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["image_by_id"], 42);
        assert!(value.get("url").is_none());
    }

    #[test]
    fn target_detection() {
        assert_eq!(
            PinTarget::parse("https://img.example.com/a.png"),
            PinTarget::Url("https://img.example.com/a.png".into())
        );
        assert_eq!(
            PinTarget::parse("http://img.example.com/a.png"),
            PinTarget::Url("http://img.example.com/a.png".into())
        );
        assert_eq!(
            PinTarget::parse("./photos/a.png"),
            PinTarget::File(PathBuf::from("./photos/a.png"))
        );
    }

    #[test]
    fn tags_are_split_and_trimmed() {
        assert_eq!(parse_tags("cat, cute ,,dog"), vec!["cat", "cute", "dog"]);
        assert!(parse_tags("").is_empty());
    }

    #[test]
    fn mime_from_extension() {
        assert_eq!(guess_mime(Path::new("a.JPG")), Some("image/jpeg"));
        assert_eq!(guess_mime(Path::new("a.png")), Some("image/png"));
        assert_eq!(guess_mime(Path::new("a")), None);
    }

    #[test]
    fn missing_image_fails_before_request() {
        let client = PinryClient::new("http://127.0.0.1:9", "tok").unwrap();
        let err = client
            .upload_image(Path::new("/definitely/not/here.png"))
            .unwrap_err();
        assert!(matches!(err, PinryError::ImageNotFound(_)));
        assert!(err.to_string().contains("not found"));
    }
}
