use crate::Result;
use bytes::Bytes;
use log::debug;
use serde::Deserialize;
use std::{collections::HashMap, sync::Arc, time::Duration};

const fn mb(size_in_mb: u64) -> u64 {
    size_in_mb * 1024 * 1024
}

/// Thin client over the Figma REST endpoints the translator consumes.
///
/// Every request carries the `X-Figma-Token` header. The agent speaks
/// HTTP/1.1 only and bounds each call by a 60 s timeout; elapse surfaces as
/// a transport error the caller maps onto the request id.
#[derive(Clone)]
pub struct FigmaApi {
    client: Arc<ureq::Agent>,
    base_url: String,
}

impl Default for FigmaApi {
    fn default() -> Self {
        Self::with_base_url(Self::BASE_URL.to_owned())
    }
}

impl FigmaApi {
    const X_FIGMA_TOKEN: &str = "X-Figma-Token";
    const BASE_URL: &str = "https://api.figma.com";
    const TIMEOUT: Duration = Duration::from_secs(60);

    /// A client pointed at a non-default host. Loopback fixtures use this.
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: Arc::new(
                ureq::Agent::config_builder()
                    .timeout_connect(Some(Duration::from_secs(15)))
                    .timeout_global(Some(Self::TIMEOUT))
                    .max_idle_connections(10)
                    .max_idle_connections_per_host(3)
                    .build()
                    .into(),
            ),
            base_url,
        }
    }

    /// The whole project document, vector geometry included. Returned raw:
    /// the caller owns checksum comparison and deferred JSON decoding.
    pub fn get_file(&self, access_token: &str, project: &str) -> Result<Bytes> {
        debug!(target: "Figma API", "get_file called for: {project}");
        let buf = self
            .client
            .get(format!(
                "{base_url}/v1/files/{project}?geometry=paths",
                base_url = self.base_url,
            ))
            .header(Self::X_FIGMA_TOKEN, access_token)
            .call()?
            .body_mut()
            .with_config()
            .limit(mb(1024))
            .read_to_vec()?;
        debug!(target: "Figma API", "get_file done for: {project}");
        Ok(Bytes::from(buf))
    }

    /// The image-fill catalog: imageRef -> signed download url.
    pub fn get_image_catalog(
        &self,
        access_token: &str,
        project: &str,
    ) -> Result<ImageCatalogResponse> {
        debug!(target: "Figma API", "get_image_catalog called for: {project}");
        let response = self
            .client
            .get(format!(
                "{base_url}/v1/files/{project}/images",
                base_url = self.base_url,
            ))
            .header(Self::X_FIGMA_TOKEN, access_token)
            .call()?
            .body_mut()
            .with_config()
            .limit(mb(50))
            .read_json::<ImageCatalogResponse>()
            .map_err(payload)?;
        if response.error {
            return Err(crate::Error::Payload(format!(
                "image catalog refused: status {status}",
                status = response.status.unwrap_or_default()
            )));
        }
        debug!(target: "Figma API", "get_image_catalog done for: {project}");
        Ok(response)
    }

    /// Raw per-node JSON for the given ids, geometry included.
    pub fn get_nodes(&self, access_token: &str, project: &str, ids: &[String]) -> Result<Bytes> {
        debug!(target: "Figma API", "get_nodes called for: {project}/{ids:?}");
        let buf = self
            .client
            .get(format!(
                "{base_url}/v1/files/{project}/nodes",
                base_url = self.base_url,
            ))
            .header(Self::X_FIGMA_TOKEN, access_token)
            .query("ids", ids.join(","))
            .query("geometry", "paths")
            .call()?
            .body_mut()
            .with_config()
            .limit(mb(1024))
            .read_to_vec()?;
        debug!(target: "Figma API", "get_nodes done for: {project}");
        Ok(Bytes::from(buf))
    }

    /// Server-side rasterization of the given node ids.
    pub fn render(&self, access_token: &str, project: &str, ids: &[String]) -> Result<RenderResponse> {
        debug!(target: "Figma API", "render called for: {project}/{ids:?}");
        let response = self
            .client
            .get(format!(
                "{base_url}/v1/images/{project}",
                base_url = self.base_url,
            ))
            .header(Self::X_FIGMA_TOKEN, access_token)
            .query("ids", ids.join(","))
            .query("use_absolute_bounds", "true")
            .call()?
            .body_mut()
            .with_config()
            .limit(mb(50))
            .read_json::<RenderResponse>()
            .map_err(payload)?;
        if let Some(err) = &response.err {
            return Err(crate::Error::Payload(format!("render refused: {err}")));
        }
        debug!(target: "Figma API", "render done for: {project}");
        Ok(response)
    }

    /// Bytes behind a signed url (image fills and finished renderings).
    pub fn download(&self, access_token: &str, url: &str) -> Result<Bytes> {
        debug!(target: "Figma API", "download called for: {url}");
        let buf = self
            .client
            .get(url)
            .header(Self::X_FIGMA_TOKEN, access_token)
            .call()?
            .body_mut()
            .with_config()
            .limit(mb(50))
            .read_to_vec()?;
        debug!(target: "Figma API", "download done for: {url}");
        Ok(Bytes::from(buf))
    }
}

fn payload(e: ureq::Error) -> crate::Error {
    crate::Error::Payload(e.to_string())
}

// region: GET file images

#[derive(Debug, Deserialize)]
pub struct ImageCatalogResponse {
    #[serde(default)]
    pub error: bool,
    pub status: Option<u32>,
    #[serde(default)]
    pub meta: ImageCatalogMeta,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImageCatalogMeta {
    #[serde(default)]
    pub images: HashMap<String, String>,
}

// endregion: GET file images

// region: GET images (renderings)

#[derive(Debug, Clone, Deserialize)]
pub struct RenderResponse {
    pub err: Option<String>,
    #[serde(default)]
    pub images: HashMap<String, Option<String>>,
}

// endregion: GET images (renderings)

#[cfg(test)]
#[allow(non_snake_case)]
mod test {
    use super::*;

    #[test]
    fn catalog_response__EXPECT__images_map_decoded() {
        // Given
        let body = r#"{"error":false,"status":200,"meta":{"images":{"ref1":"https://x/u1"}}}"#;

        // When
        let response: ImageCatalogResponse = serde_json::from_str(body).unwrap();

        // Then
        assert!(!response.error);
        assert_eq!(
            response.meta.images.get("ref1").map(String::as_str),
            Some("https://x/u1")
        );
    }

    #[test]
    fn render_response_with_null_url__EXPECT__entry_present_but_none() {
        // Given
        let body = r#"{"err":null,"images":{"1:2":"https://x/r1","3:4":null}}"#;

        // When
        let response: RenderResponse = serde_json::from_str(body).unwrap();

        // Then
        assert!(response.err.is_none());
        assert_eq!(
            response.images.get("1:2").cloned().flatten().as_deref(),
            Some("https://x/r1")
        );
        assert_eq!(response.images.get("3:4").cloned().flatten(), None);
    }

    #[test]
    fn catalog_without_meta__EXPECT__defaults_to_empty_map() {
        // Given
        let body = r#"{"error":true,"status":403}"#;

        // When
        let response: ImageCatalogResponse = serde_json::from_str(body).unwrap();

        // Then
        assert!(response.error);
        assert!(response.meta.images.is_empty());
    }
}
