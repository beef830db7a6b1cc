//! REST adapter for persistence and reference data.
//!
//! - `POST   {base}/{resource}` creates a row and answers with the stored record
//! - `PUT    {base}/{resource}/{id}` overwrites a row
//! - `DELETE {base}/{resource}/{id}` removes a row
//! - `GET    {base}/{resource}?scope={scope}` lists `{id, name}` options
//! - `GET    {base}/{resource}?{parentLink}={reportId}` lists the persisted rows of a report
//!
//! Response records pass through [`normalize`](crate::normalize) before ids,
//! option names and row fields are read, since endpoints disagree on key
//! casing.

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use rowsync_api::{Fields, OptionItem, RowId, Value};
use rowsync_core::{PersistenceService, ReferenceDataSource, Result, SnapshotRow};
use std::sync::Arc;
use tracing::{debug, error};

use crate::config::RowsyncConfig;
use crate::normalize::normalize_json;
use crate::registry::PersistenceRegistry;

/// Longest response body quoted in an error message
const MAX_ERROR_BODY: usize = 500;

#[derive(Debug)]
struct Inner {
    base_url: String,
    client: reqwest::Client,
    config: RowsyncConfig,
}

/// HTTP client shared by every section resource.
#[derive(Debug, Clone)]
pub struct RestClient {
    inner: Arc<Inner>,
}

impl RestClient {
    pub fn from_config(config: &RowsyncConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        {
            builder = builder.timeout(config.timeout());
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            inner: Arc::new(Inner {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                client,
                config: config.clone(),
            }),
        })
    }

    /// Persistence service for one section, using the configured resource
    /// path.
    pub fn resource(&self, section: &str) -> RestResource {
        RestResource {
            client: self.clone(),
            resource: self.inner.config.resource_for(section).to_string(),
        }
    }

    /// A registry with a REST resource for each of `sections`.
    pub fn registry<'a>(&self, sections: impl IntoIterator<Item = &'a str>) -> PersistenceRegistry {
        let mut registry = PersistenceRegistry::new();
        for section in sections {
            registry.register(section, Arc::new(self.resource(section)));
        }
        registry
    }

    fn url(&self, resource: &str, id: Option<&RowId>) -> String {
        match id {
            Some(id) => format!("{}/{}/{}", self.inner.base_url, resource, id),
            None => format!("{}/{}", self.inner.base_url, resource),
        }
    }

    fn describe_error(e: &reqwest::Error, url: &str, operation: &str) -> String {
        let kind = if e.is_timeout() {
            "timeout"
        } else if e.is_request() {
            "request error"
        } else if e.is_decode() {
            "decode error"
        } else {
            "transport error"
        };
        format!("Failed to {} {}: {}: {}", operation, url, kind, e)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
        operation: &str,
    ) -> anyhow::Result<String> {
        let response = request.send().await.map_err(|e| {
            let message = Self::describe_error(&e, url, operation);
            error!("{}", message);
            anyhow!(message)
        })?;
        handle_response(response, url).await
    }
}

async fn handle_response(response: reqwest::Response, url: &str) -> anyhow::Result<String> {
    let status = response.status();
    let text = response
        .text()
        .await
        .with_context(|| format!("Failed to read response body from {}", url))?;

    if !status.is_success() {
        let body = if text.len() > MAX_ERROR_BODY {
            let cut = (0..=MAX_ERROR_BODY)
                .rev()
                .find(|i| text.is_char_boundary(*i))
                .unwrap_or(0);
            format!("{}... (truncated)", &text[..cut])
        } else {
            text
        };
        anyhow::bail!("HTTP {} error from {}: {}", status.as_u16(), url, body);
    }
    Ok(text)
}

/// Read the id of a created record. Accepts a record object with any id
/// casing, or a bare id.
pub fn parse_created_id(body: &str) -> anyhow::Result<RowId> {
    let json: serde_json::Value =
        serde_json::from_str(body).context("Create response is not JSON")?;
    let id = match normalize_json(json.clone()) {
        Some(fields) => fields.get("id").and_then(Value::to_id_string),
        None => Value::from_json_value(json).to_id_string(),
    };
    id.map(RowId::new)
        .ok_or_else(|| anyhow!("Create response carries no id: {}", body))
}

/// Read an option list. Entries without an id or a name are skipped.
pub fn parse_options(body: &str) -> anyhow::Result<Vec<OptionItem>> {
    let json: serde_json::Value =
        serde_json::from_str(body).context("Options response is not JSON")?;
    let serde_json::Value::Array(entries) = json else {
        anyhow::bail!("Options response is not a list");
    };
    Ok(entries
        .into_iter()
        .filter_map(normalize_json)
        .filter_map(|fields| {
            let id = fields.get("id").filter(|v| !v.is_blank())?.clone();
            let name = fields.get("name")?.as_string()?.to_string();
            Some(OptionItem { id, name })
        })
        .collect())
}

/// Read the persisted rows of a list response into snapshot rows.
///
/// Keys are normalized and the id is taken out of the fields. A record
/// without an id is rejected, since loading it would turn it into a new row.
pub fn parse_snapshot(body: &str) -> anyhow::Result<Vec<SnapshotRow>> {
    let json: serde_json::Value =
        serde_json::from_str(body).context("Row list response is not JSON")?;
    let serde_json::Value::Array(entries) = json else {
        anyhow::bail!("Row list response is not a list");
    };
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let mut fields = normalize_json(entry)
                .ok_or_else(|| anyhow!("Row {} of list response is not an object", index))?;
            let id = fields
                .remove("id")
                .and_then(|v| v.to_id_string())
                .ok_or_else(|| anyhow!("Row {} of list response carries no id", index))?;
            Ok(SnapshotRow::persisted(id, fields))
        })
        .collect()
}

fn to_json(fields: &Fields) -> anyhow::Result<serde_json::Value> {
    serde_json::to_value(fields).context("Failed to encode row fields")
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl ReferenceDataSource for RestClient {
    async fn fetch(&self, key: &str, scope: Option<&str>) -> Result<Vec<OptionItem>> {
        let resource = self.inner.config.resource_for(key);
        let url = self.url(resource, None);
        let mut request = self.inner.client.get(&url);
        if let Some(scope) = scope {
            request = request.query(&[("scope", scope)]);
        }
        let body = self.send(request, &url, "fetch options from").await?;
        let options = parse_options(&body)?;
        debug!("Fetched {} options from {}", options.len(), url);
        Ok(options)
    }
}

/// Persistence of one section's rows through [`RestClient`].
#[derive(Debug, Clone)]
pub struct RestResource {
    client: RestClient,
    resource: String,
}

impl RestResource {
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Load the persisted rows of this resource, narrowed to one report when
    /// `parent` names the link field and the report id. The result is ready
    /// for [`Section::hydrate`](crate::Section::hydrate) or `reload`.
    pub async fn list(&self, parent: Option<(&str, &RowId)>) -> Result<Vec<SnapshotRow>> {
        let url = self.client.url(&self.resource, None);
        let mut request = self.client.inner.client.get(&url);
        if let Some((link, report_id)) = parent {
            request = request.query(&[(link, report_id.as_str())]);
        }
        let body = self.client.send(request, &url, "list rows from").await?;
        let rows = parse_snapshot(&body)?;
        debug!("Listed {} rows from {}", rows.len(), url);
        Ok(rows)
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl PersistenceService for RestResource {
    async fn create(&self, fields: Fields) -> Result<RowId> {
        let url = self.client.url(&self.resource, None);
        let request = self.client.inner.client.post(&url).json(&to_json(&fields)?);
        let body = self.client.send(request, &url, "create row at").await?;
        let id = parse_created_id(&body)?;
        debug!("Created row {} at {}", id, url);
        Ok(id)
    }

    async fn update(&self, id: &RowId, fields: Fields) -> Result<()> {
        let url = self.client.url(&self.resource, Some(id));
        let request = self.client.inner.client.put(&url).json(&to_json(&fields)?);
        self.client.send(request, &url, "update row at").await?;
        Ok(())
    }

    async fn delete(&self, id: &RowId) -> Result<()> {
        let url = self.client.url(&self.resource, Some(id));
        let request = self.client.inner.client.delete(&url);
        self.client.send(request, &url, "delete row at").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> RestClient {
        let config = RowsyncConfig::new("http://localhost:9000/api/")
            .with_resource("cm_material_used", "CMMaterialUsed");
        RestClient::from_config(&config).unwrap()
    }

    #[test]
    fn test_urls_use_configured_resources() {
        let client = client();
        let resource = client.resource("cm_material_used");
        assert_eq!(resource.resource(), "CMMaterialUsed");
        assert_eq!(
            client.url(resource.resource(), Some(&RowId::from("17"))),
            "http://localhost:9000/api/CMMaterialUsed/17"
        );
        assert_eq!(
            client.url(client.resource("time_sync").resource(), None),
            "http://localhost:9000/api/time_sync"
        );
    }

    #[test]
    fn test_registry_covers_requested_sections() {
        let registry = client().registry(["cm_material_used", "time_sync"]);
        assert!(registry.has_service("cm_material_used"));
        assert!(registry.has_service("time_sync"));
        assert!(!registry.has_service("asa_firewall"));
    }

    #[test]
    fn test_created_id_in_any_casing() {
        assert_eq!(parse_created_id(r#"{"ID": 12, "ItemDescription": "fuse"}"#).unwrap().as_str(), "12");
        assert_eq!(parse_created_id(r#"{"id": "a-7"}"#).unwrap().as_str(), "a-7");
        assert_eq!(parse_created_id("42").unwrap().as_str(), "42");
        assert!(parse_created_id(r#"{"name": "no id"}"#).is_err());
        assert!(parse_created_id("not json").is_err());
    }

    #[test]
    fn test_snapshot_rows_are_normalized_and_keep_their_ids() {
        let rows = parse_snapshot(
            r#"[
                {"ID": 3, "ServerName": "SRV01", "ResultStatusID": 1},
                {"id": "4", "serverName": "SRV02", "ServerName": "stale", "resultStatusId": 2}
            ]"#,
        )
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, Some(RowId::from("3")));
        assert_eq!(
            rows[0].fields,
            Fields::from([("serverName", Value::from("SRV01")), ("resultStatusId", Value::Integer(1))])
        );
        assert_eq!(rows[1].id, Some(RowId::from("4")));
        assert_eq!(rows[1].fields.get("serverName"), Some(&Value::from("SRV02")));
        assert!(!rows[1].fields.contains("id"));
    }

    #[test]
    fn test_snapshot_rejects_rows_without_id() {
        assert!(parse_snapshot(r#"[{"ServerName": "SRV01"}]"#).is_err());
        assert!(parse_snapshot(r#"[42]"#).is_err());
        assert!(parse_snapshot(r#"{"ID": 1}"#).is_err());
        assert!(parse_snapshot("[]").unwrap().is_empty());
    }

    #[test]
    fn test_options_skip_incomplete_entries() {
        let options = parse_options(
            r#"[{"Id": 1, "Name": "Good"}, {"id": 2, "name": "Bad"}, {"Name": "orphan"}, {"ID": 3}]"#,
        )
        .unwrap();
        assert_eq!(
            options,
            vec![OptionItem::new(1, "Good"), OptionItem::new(2, "Bad")]
        );
        assert!(parse_options(r#"{"id": 1}"#).is_err());
    }
}
