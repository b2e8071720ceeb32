//! GameStream host catalog

use super::{RemoteCatalog, RemoteItem, SourceKind};
use crate::LibraryError;
use crate::xml::{extract_attribute, extract_blocks, extract_tag};
use async_trait::async_trait;
use std::path::Path;

/// HTTPS port of the GameStream pairing and app list service
const HTTPS_PORT: u16 = 47984;

/// Parse an `/applist` reply into remote items
fn parse_app_list(doc: &str) -> Result<Vec<RemoteItem>, LibraryError> {
    let status = extract_attribute(doc, "root", "status_code").ok_or_else(|| {
        LibraryError::unavailable("gamestream", "reply has no status code")
    })?;

    if status != "200" {
        let message = extract_attribute(doc, "root", "status_message").unwrap_or_default();
        return Err(LibraryError::unavailable(
            "gamestream",
            format!("host returned status {} {}", status, message).trim_end(),
        ));
    }

    let mut items = Vec::new();
    for block in extract_blocks(doc, "App") {
        let (Some(id), Some(title)) = (extract_tag(block, "ID"), extract_tag(block, "AppTitle"))
        else {
            tracing::warn!("Skipping GameStream app entry without id or title");
            continue;
        };
        items.push(RemoteItem { id, title });
    }
    Ok(items)
}

/// Apps published by a paired GameStream host
pub struct GameStreamCatalog {
    client: reqwest::Client,
    host: String,
    client_id: String,
}

impl GameStreamCatalog {
    /// Build a catalog authenticating with the paired client's PEM cert and key
    pub fn from_pem_files(
        host: String,
        client_id: String,
        cert: &Path,
        key: &Path,
    ) -> Result<Self, LibraryError> {
        let mut pem = std::fs::read(cert).map_err(|e| {
            LibraryError::unavailable("gamestream", format!("{}: {}", cert.display(), e))
        })?;
        pem.push(b'\n');
        pem.extend(std::fs::read(key).map_err(|e| {
            LibraryError::unavailable("gamestream", format!("{}: {}", key.display(), e))
        })?);

        let identity = reqwest::Identity::from_pem(&pem)
            .map_err(|e| LibraryError::unavailable("gamestream", format!("invalid identity: {}", e)))?;

        // Hosts serve a self-signed certificate pinned at pairing time
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .identity(identity)
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(Self {
            client,
            host,
            client_id,
        })
    }
}

#[async_trait]
impl RemoteCatalog for GameStreamCatalog {
    fn kind(&self) -> SourceKind {
        SourceKind::GameStream
    }

    async fn list_owned_items(&self) -> Result<Vec<RemoteItem>, LibraryError> {
        let url = format!("https://{}:{}/applist", self.host, HTTPS_PORT);
        tracing::debug!("Requesting app list from {}", url);

        let body = self
            .client
            .get(&url)
            .query(&[("uniqueid", self.client_id.as_str())])
            .send()
            .await
            .map_err(|e| LibraryError::unavailable("gamestream", e))?
            .text()
            .await
            .map_err(|e| LibraryError::unavailable("gamestream", e))?;

        parse_app_list(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_app_list() {
        let doc = r#"<?xml version="1.0" encoding="utf-8"?>
<root status_code="200">
<App>
<AppTitle>Steam</AppTitle>
<ID>1093255277</ID>
<IsHdrSupported>0</IsHdrSupported>
</App>
<App>
<AppTitle>Hades &amp; Friends</AppTitle>
<ID>42</ID>
</App>
</root>"#;

        let items = parse_app_list(doc).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "1093255277");
        assert_eq!(items[0].title, "Steam");
        assert_eq!(items[1].title, "Hades & Friends");
    }

    #[test]
    fn test_unauthorized_host_is_unavailable() {
        let doc = r#"<root status_code="401" status_message="The client is not authorized. Certificate verification failed."/>"#;
        match parse_app_list(doc) {
            Err(LibraryError::SourceUnavailable {
                source_kind,
                reason,
            }) => {
                assert_eq!(source_kind, "gamestream");
                assert!(reason.contains("401"));
            }
            other => panic!("expected SourceUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_status_is_unavailable() {
        assert!(parse_app_list("<html></html>").is_err());
    }

    #[test]
    fn test_incomplete_entries_are_skipped() {
        let doc = r#"<root status_code="200"><App><ID>1</ID></App><App><AppTitle>Ok</AppTitle><ID>2</ID></App></root>"#;
        let items = parse_app_list(doc).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "2");
    }

    #[test]
    fn test_missing_cert_is_unavailable() {
        let result = GameStreamCatalog::from_pem_files(
            "192.168.1.20".into(),
            "0123456789ABCDEF".into(),
            Path::new("/nonexistent/client.pem"),
            Path::new("/nonexistent/key.pem"),
        );
        assert!(matches!(
            result,
            Err(LibraryError::SourceUnavailable { .. })
        ));
    }
}
