//! Tool Shed REST client.
//!
//! Find or create the repository for a tool, then upload the archive as a
//! new changeset revision.

use crate::error::{PublishError, PublishResult};
use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Category new repositories are filed under when the registry has it
pub const TOOLFACTORY_CATEGORY: &str = "ToolFactory generated tools";

const API_KEY_HEADER: &str = "x-api-key";

/// Repository entry from `/api/repositories`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Encoded repository id
    pub id: String,
    /// Repository name
    pub name: String,
    /// Owner user name
    #[serde(default)]
    pub owner: String,
}

/// Category entry from `/api/categories`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Encoded category id
    pub id: String,
    /// Category name
    pub name: String,
}

/// Body for creating a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRepository {
    /// Repository name
    pub name: String,
    /// Short description
    pub synopsis: String,
    /// Long description
    pub description: String,
    /// Repository type
    #[serde(rename = "type")]
    pub repo_type: String,
    /// Registry URL recorded on the repository
    pub remote_repository_url: String,
    /// Category ids
    #[serde(rename = "category_ids[]", skip_serializing_if = "Option::is_none")]
    pub category_ids: Option<String>,
}

/// What a publish did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    /// Repository the archive went to
    pub repository_id: String,
    /// Whether the repository was created by this publish
    pub created: bool,
}

/// Blocking Tool Shed client
#[derive(Debug)]
pub struct ToolShedClient {
    base_url: String,
    api_key: SecretString,
    client: Client,
}

impl ToolShedClient {
    /// Client for the registry at `base_url`
    ///
    /// # Errors
    ///
    /// Returns `Http` if the HTTP client cannot be built
    pub fn new(base_url: &str, api_key: SecretString) -> PublishResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(120)).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    /// Absolute URL for an API path
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(API_KEY_HEADER, self.api_key.expose_secret())
    }

    /// All repositories
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or a non-success status
    pub fn repositories(&self) -> PublishResult<Vec<Repository>> {
        let url = self.url("repositories");
        let response = self.authed(self.client.get(&url)).send()?;
        Ok(checked("GET", &url, response)?.json()?)
    }

    /// Repository named `name` owned by `owner`
    ///
    /// # Errors
    ///
    /// Returns error if the listing fails
    pub fn find_repository(&self, name: &str, owner: &str) -> PublishResult<Option<Repository>> {
        Ok(find_named(self.repositories()?, name, owner))
    }

    /// All categories
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or a non-success status
    pub fn categories(&self) -> PublishResult<Vec<Category>> {
        let url = self.url("categories");
        let response = self.authed(self.client.get(&url)).send()?;
        Ok(checked("GET", &url, response)?.json()?)
    }

    /// Create a repository
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, a non-success status or a reply
    /// without an id
    pub fn create_repository(&self, repo: &NewRepository) -> PublishResult<Repository> {
        let url = self.url("repositories");
        let response = self.authed(self.client.post(&url)).json(repo).send()?;
        let created: serde_json::Value = checked("POST", &url, response)?.json()?;
        let id = created
            .get("id")
            .and_then(serde_json::Value::as_str)
            .ok_or(PublishError::MissingField("repository id"))?;
        tracing::info!(name = %repo.name, id = %id, "repository created");
        Ok(Repository {
            id: id.to_string(),
            name: repo.name.clone(),
            owner: created
                .get("owner")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }

    /// Upload an archive as a new changeset revision
    ///
    /// # Errors
    ///
    /// Returns `Io` if the archive cannot be read, otherwise transport or
    /// status errors
    pub fn upload(&self, repository_id: &str, archive: &Path) -> PublishResult<()> {
        let url = self.url(&format!("repositories/{}/changeset_revision", repository_id));
        let form = multipart::Form::new()
            .text("commit_message", "Uploaded by toolforge")
            .file("file", archive)
            .map_err(|e| PublishError::Io {
                path: archive.to_path_buf(),
                source: e,
            })?;
        let response = self.authed(self.client.post(&url)).multipart(form).send()?;
        checked("POST", &url, response)?;
        tracing::info!(repository = %repository_id, archive = %archive.display(), "changeset uploaded");
        Ok(())
    }

    /// Find or create the repository for a tool and upload its archive
    ///
    /// # Errors
    ///
    /// Returns the first failing registry call
    pub fn publish(
        &self,
        tool_name: &str,
        owner: &str,
        description: &str,
        archive: &Path,
    ) -> PublishResult<PublishOutcome> {
        let (repository_id, created) = match self.find_repository(tool_name, owner)? {
            Some(repo) => (repo.id, false),
            None => {
                let repo = NewRepository {
                    name: tool_name.to_string(),
                    synopsis: format!("Synopsis:{}", description),
                    description: description.to_string(),
                    repo_type: "unrestricted".to_string(),
                    remote_repository_url: self.base_url.clone(),
                    category_ids: category_id(&self.categories()?, TOOLFACTORY_CATEGORY),
                };
                (self.create_repository(&repo)?.id, true)
            }
        };
        self.upload(&repository_id, archive)?;
        Ok(PublishOutcome {
            repository_id,
            created,
        })
    }
}

fn checked(method: &'static str, url: &str, response: Response) -> PublishResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    tracing::warn!(url = %url, status = status.as_u16(), "registry request rejected");
    Err(PublishError::Status {
        method,
        url: url.to_string(),
        status: status.as_u16(),
        body: body.trim().to_string(),
    })
}

fn find_named(repos: Vec<Repository>, name: &str, owner: &str) -> Option<Repository> {
    repos
        .into_iter()
        .find(|r| r.name == name && (owner.is_empty() || r.owner.is_empty() || r.owner == owner))
}

/// Id of the category called `name`, ignoring surrounding whitespace
#[must_use]
pub fn category_id(categories: &[Category], name: &str) -> Option<String> {
    categories
        .iter()
        .find(|c| c.name.trim() == name.trim())
        .map(|c| c.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ToolShedClient {
        ToolShedClient::new("http://localhost:9009/", SecretString::from("k".to_string())).unwrap()
    }

    #[test]
    fn test_url_joins_cleanly() {
        let c = client();
        assert_eq!(c.url("repositories"), "http://localhost:9009/api/repositories");
        assert_eq!(
            c.url("/repositories/abc/changeset_revision"),
            "http://localhost:9009/api/repositories/abc/changeset_revision"
        );
    }

    #[test]
    fn test_debug_hides_api_key() {
        let c = ToolShedClient::new("http://x", SecretString::from("s3cr3t".to_string())).unwrap();
        assert!(!format!("{:?}", c).contains("s3cr3t"));
    }

    #[test]
    fn test_parse_listing_and_find() {
        let repos: Vec<Repository> = serde_json::from_str(
            r#"[{"id":"a1","name":"rev","owner":"fubar","extra":1},
                {"id":"b2","name":"rev","owner":"other"}]"#,
        )
        .unwrap();
        assert_eq!(find_named(repos.clone(), "rev", "other").map(|r| r.id), Some("b2".to_string()));
        assert_eq!(find_named(repos.clone(), "rev", "").map(|r| r.id), Some("a1".to_string()));
        assert!(find_named(repos, "cat", "fubar").is_none());
    }

    #[test]
    fn test_category_lookup_trims() {
        let cats = vec![
            Category {
                id: "c1".to_string(),
                name: "Other".to_string(),
            },
            Category {
                id: "c2".to_string(),
                name: " ToolFactory generated tools ".to_string(),
            },
        ];
        assert_eq!(category_id(&cats, TOOLFACTORY_CATEGORY), Some("c2".to_string()));
        assert_eq!(category_id(&cats[..1], TOOLFACTORY_CATEGORY), None);
    }

    #[test]
    fn test_new_repository_body() {
        let body = serde_json::to_value(NewRepository {
            name: "rev".to_string(),
            synopsis: "Synopsis:x".to_string(),
            description: "x".to_string(),
            repo_type: "unrestricted".to_string(),
            remote_repository_url: "http://x".to_string(),
            category_ids: None,
        })
        .unwrap();
        assert_eq!(body["type"], "unrestricted");
        assert!(body.get("category_ids[]").is_none());
    }

    #[test]
    fn test_unreachable_registry_is_http_error() {
        let c = ToolShedClient::new("http://127.0.0.1:9", SecretString::from("k".to_string())).unwrap();
        assert!(matches!(c.repositories().unwrap_err(), PublishError::Http(_)));
    }
}
