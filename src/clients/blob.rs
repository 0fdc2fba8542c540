use crate::{AppError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use sha2::Sha256;
use std::time::Duration;
use url::Url;

const STORAGE_API_VERSION: &str = "2021-08-06";
const TIMEOUT_SECS: u64 = 30;

const DEV_ACCOUNT_NAME: &str = "devstoreaccount1";
const DEV_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const DEV_BLOB_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";

/// Source of the raw dashboard snapshot.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn fetch(&self, container: &str, blob: &str) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Credential {
    SharedKey { account: String, key: String },
    Sas(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionString {
    pub blob_endpoint: Url,
    pub credential: Credential,
}

impl ConnectionString {
    pub fn parse(raw: &str) -> Result<Self> {
        let mut protocol = "https".to_string();
        let mut suffix = "core.windows.net".to_string();
        let mut account = None;
        let mut key = None;
        let mut endpoint = None;
        let mut sas = None;
        let mut dev_storage = false;

        for part in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, value) = part.split_once('=').ok_or_else(|| {
                AppError::InvalidConfig(format!("Malformed connection string segment: {}", name_only(part)))
            })?;
            match name {
                "DefaultEndpointsProtocol" => protocol = value.to_string(),
                "EndpointSuffix" => suffix = value.to_string(),
                "AccountName" => account = Some(value.to_string()),
                "AccountKey" => key = Some(value.to_string()),
                "BlobEndpoint" => endpoint = Some(value.to_string()),
                "SharedAccessSignature" => sas = Some(value.trim_start_matches('?').to_string()),
                "UseDevelopmentStorage" => dev_storage = value.eq_ignore_ascii_case("true"),
                _ => {}
            }
        }

        if dev_storage {
            return Ok(Self {
                blob_endpoint: parse_endpoint(DEV_BLOB_ENDPOINT)?,
                credential: Credential::SharedKey {
                    account: DEV_ACCOUNT_NAME.to_string(),
                    key: DEV_ACCOUNT_KEY.to_string(),
                },
            });
        }

        let blob_endpoint = match (&endpoint, &account) {
            (Some(endpoint), _) => parse_endpoint(endpoint)?,
            (None, Some(account)) => {
                parse_endpoint(&format!("{}://{}.blob.{}", protocol, account, suffix))?
            }
            (None, None) => {
                return Err(AppError::InvalidConfig(
                    "Connection string needs AccountName or BlobEndpoint".to_string(),
                ))
            }
        };

        let credential = match (account, key, sas) {
            (_, _, Some(sas)) => Credential::Sas(sas),
            (Some(account), Some(key), None) => Credential::SharedKey { account, key },
            _ => {
                return Err(AppError::InvalidConfig(
                    "Connection string needs AccountKey or SharedAccessSignature".to_string(),
                ))
            }
        };

        Ok(Self {
            blob_endpoint,
            credential,
        })
    }

    pub fn blob_url(&self, container: &str, blob: &str) -> Result<Url> {
        let mut url = self.blob_endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::InvalidConfig("Blob endpoint cannot be a base URL".to_string()))?
            .pop_if_empty()
            .push(container)
            .extend(blob.split('/'));
        if let Credential::Sas(token) = &self.credential {
            url.set_query(Some(token));
        }
        Ok(url)
    }
}

// Never echo the value: it may hold the account key.
fn name_only(segment: &str) -> &str {
    segment.split('=').next().unwrap_or("")
}

fn parse_endpoint(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| AppError::InvalidConfig(format!("Invalid blob endpoint: {}", e)))
}

/// Builds the Shared Key string-to-sign for a body-less GET.
pub fn string_to_sign(account: &str, url: &Url, ms_date: &str) -> String {
    // VERB followed by eleven empty standard headers.
    let mut out = String::from("GET\n");
    out.push_str(&"\n".repeat(11));
    out.push_str(&format!("x-ms-date:{}\n", ms_date));
    out.push_str(&format!("x-ms-version:{}\n", STORAGE_API_VERSION));

    // Path-style endpoints (Azurite) repeat the account here; that is expected.
    out.push_str(&format!("/{}{}", account, url.path()));

    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.to_lowercase(), v.into_owned()))
        .collect();
    params.sort();
    for (k, v) in params {
        out.push_str(&format!("\n{}:{}", k, v));
    }
    out
}

pub fn sign(key: &str, string_to_sign: &str) -> Result<String> {
    let key_bytes = STANDARD
        .decode(key)
        .map_err(|e| AppError::InvalidConfig(format!("AccountKey is not valid base64: {}", e)))?;
    let mut mac = Hmac::<Sha256>::new_from_slice(&key_bytes)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to initialise HMAC: {}", e)))?;
    mac.update(string_to_sign.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

pub struct AzureBlobClient {
    client: Client,
    conn_str: String,
}

impl AzureBlobClient {
    /// The connection string is parsed per download so a malformed value is
    /// reported to the user like any other load failure.
    pub fn new(conn_str: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            conn_str: conn_str.to_string(),
        })
    }

    pub async fn download(&self, container: &str, blob: &str) -> Result<Vec<u8>> {
        let connection = ConnectionString::parse(&self.conn_str)?;
        let url = connection.blob_url(container, blob)?;
        let ms_date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();

        let mut request = self
            .client
            .get(url.clone())
            .header("x-ms-date", &ms_date)
            .header("x-ms-version", STORAGE_API_VERSION);

        if let Credential::SharedKey { account, key } = &connection.credential {
            let signature = sign(key, &string_to_sign(account, &url, &ms_date))?;
            request = request.header("Authorization", format!("SharedKey {}:{}", account, signature));
        }

        tracing::debug!("Downloading blob {}/{}", container, blob);

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Blob request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Storage(format!(
                "Blob service returned {}: {}",
                status, error_text
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to read blob body: {}", e)))?;

        tracing::info!("Downloaded {} bytes from {}/{}", bytes.len(), container, blob);
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl BlobStore for AzureBlobClient {
    async fn fetch(&self, container: &str, blob: &str) -> Result<Vec<u8>> {
        self.download(container, blob).await
    }
}
