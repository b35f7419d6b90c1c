use crate::adapters::http;
use crate::domain::model::{RawDataset, YearEntry};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use encoding_rs::{Encoding, UTF_8};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

/// Downloads a yearly CSV into memory and declares its text encoding.
pub struct DatasetFetcher {
    client: Client,
    fallback_encoding: &'static Encoding,
}

impl DatasetFetcher {
    pub fn new(client: Client, fallback_encoding: &'static Encoding) -> Self {
        Self {
            client,
            fallback_encoding,
        }
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Ok(Self::new(
            http::build_client(config)?,
            config.fallback_encoding(),
        ))
    }

    pub async fn fetch(&self, entry: &YearEntry) -> Result<RawDataset> {
        tracing::info!("⬇️  Downloading {} from {}", entry.label, entry.source_url);
        self.fetch_url(&entry.source_url).await
    }

    pub async fn fetch_url(&self, url: &str) -> Result<RawDataset> {
        let mut response = http::get(&self.client, url).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // Content-Length 只是提示, 不拿來預先配置
        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| EtlError::fetch(url, format!("Failed to read response body: {}", e)))?
        {
            bytes.extend_from_slice(&chunk);
        }

        let encoding = detect_encoding(&bytes, content_type.as_deref(), self.fallback_encoding);
        tracing::info!(
            "📦 Downloaded {} bytes, encoding {}",
            bytes.len(),
            encoding.name()
        );

        Ok(RawDataset {
            source_url: url.to_string(),
            bytes,
            encoding,
        })
    }
}

/// Order: byte-order mark, declared charset, valid UTF-8, fallback.
///
/// A declared UTF-8 charset is ignored when the body is not valid UTF-8; the
/// portal has served regional files under a UTF-8 header.
pub fn detect_encoding(
    bytes: &[u8],
    content_type: Option<&str>,
    fallback: &'static Encoding,
) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding;
    }

    let is_utf8 = std::str::from_utf8(bytes).is_ok();

    if let Some(declared) = content_type.and_then(charset_from_content_type) {
        if declared != UTF_8 || is_utf8 {
            return declared;
        }
        tracing::warn!("Response declares UTF-8 but is not valid UTF-8, using {}", fallback.name());
    }

    if is_utf8 {
        UTF_8
    } else {
        fallback
    }
}

fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        Encoding::for_label(value.trim().trim_matches('"').as_bytes())
    })
}
