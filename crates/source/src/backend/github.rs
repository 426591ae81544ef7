//! GitHub repository source, read through the REST API.

use crate::error::{ErrorKind, Result};
use crate::path::normalize;
use crate::{EntryKind, SourceEntry, SourceFetcher};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use exn::{OptionExt, ResultExt};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use time::UtcDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::instrument;

#[derive(Deserialize)]
struct ContentItem {
    name: String,
    path: String,
    sha: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct CommitItem {
    commit: CommitDetail,
}

#[derive(Deserialize)]
struct CommitDetail {
    committer: Option<Signature>,
}

#[derive(Deserialize)]
struct Signature {
    date: String,
}

#[derive(Deserialize)]
struct Blob {
    content: String,
    encoding: String,
}

/// A GitHub repository (`owner/name`), read-only.
///
/// Revisions are git blob SHAs. No request is ever retried; a failed fetch
/// aborts the caller's import of that file.
///
/// ```no_run
/// use cce_source::backend::GitHubSource;
///
/// # fn example() -> cce_source::error::Result<()> {
/// let source = GitHubSource::new("cce", "https://api.github.com", "NYPL/catalog_of_copyright_entries_project", None)?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct GitHubSource {
    name: String,
    client: Client,
    api_url: String,
    repo: String,
}
impl GitHubSource {
    pub fn new(
        name: impl Into<String>,
        api_url: impl Into<String>,
        repo: impl Into<String>,
        token: Option<&str>,
    ) -> Result<Self> {
        let repo = repo.into();
        if repo.split('/').filter(|s| !s.is_empty()).count() != 2 {
            exn::bail!(ErrorKind::Configuration("repository must be given as owner/name"));
        }
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static("2022-11-28"));
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .or_raise(|| ErrorKind::Configuration("token is not a valid header value"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .or_raise(|| ErrorKind::Configuration("could not build HTTP client"))?;
        Ok(Self {
            name: name.into(),
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            repo,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/repos/{}/{}", self.api_url, self.repo, endpoint)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<T> {
        let response = self
            .client
            .get(self.url(endpoint))
            .query(query)
            .send()
            .await
            .map_err(|e| ErrorKind::Network(e.to_string()))?;
        match response.status() {
            StatusCode::NOT_FOUND => exn::bail!(ErrorKind::NotFound(endpoint.to_string())),
            status if !status.is_success() => exn::bail!(ErrorKind::Status {
                status: status.as_u16(),
                path: endpoint.to_string(),
            }),
            _ => {},
        }
        response.json::<T>().await.or_raise(|| ErrorKind::InvalidResponse("malformed JSON body"))
    }
}

#[async_trait]
impl SourceFetcher for GitHubSource {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(source = %self.name))]
    async fn list_directory(&self, path: &str) -> Result<Vec<SourceEntry>> {
        let path = normalize(path)?;
        let items: Vec<ContentItem> = self.get_json(&format!("contents/{path}"), &[]).await?;
        let mut entries = items
            .into_iter()
            .map(|item| {
                let kind = match item.kind.as_str() {
                    "dir" => EntryKind::Dir,
                    _ => EntryKind::File,
                };
                SourceEntry::new(item.name, item.path, item.sha, kind)
            })
            .collect::<Vec<_>>();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    #[instrument(skip(self), fields(source = %self.name))]
    async fn latest_change_time(&self, path: &str) -> Result<UtcDateTime> {
        let path = normalize(path)?;
        let commits: Vec<CommitItem> = self.get_json("commits", &[("path", &path), ("per_page", "1")]).await?;
        let date = commits
            .into_iter()
            .next()
            .and_then(|c| c.commit.committer)
            .map(|s| s.date)
            .ok_or_raise(|| ErrorKind::NotFound(path.clone()))?;
        UtcDateTime::parse(&date, &Rfc3339).or_raise(|| ErrorKind::InvalidResponse("commit date is not RFC 3339"))
    }

    #[instrument(skip(self), fields(source = %self.name))]
    async fn get_blob(&self, revision: &str) -> Result<Vec<u8>> {
        if revision.is_empty() || !revision.chars().all(|c| c.is_ascii_hexdigit()) {
            exn::bail!(ErrorKind::NotFound(revision.to_string()));
        }
        let blob: Blob = self.get_json(&format!("git/blobs/{revision}"), &[]).await?;
        if blob.encoding != "base64" {
            exn::bail!(ErrorKind::InvalidResponse("blob is not base64 encoded"));
        }
        // The API wraps base64 payloads at 60 columns.
        let compact: String = blob.content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        BASE64.decode(compact).or_raise(|| ErrorKind::InvalidResponse("blob content is not valid base64"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("NYPL/cce-renewals", true)]
    #[case("NYPL", false)]
    #[case("a/b/c", false)]
    #[case("", false)]
    fn test_repository_format(#[case] repo: &str, #[case] valid: bool) {
        assert_eq!(GitHubSource::new("test", "https://api.github.com", repo, None).is_ok(), valid);
    }

    #[test]
    fn test_url_building() {
        let source = GitHubSource::new("test", "https://example.com/api/", "owner/name", Some("secret")).unwrap();
        assert_eq!(source.url("contents/xml"), "https://example.com/api/repos/owner/name/contents/xml");
    }

    #[test]
    fn test_blob_payload_decodes() {
        let json = r#"{"sha":"abc","encoding":"base64","content":"PGhl\nYWRl\ncj4=\n"}"#;
        let blob: Blob = serde_json::from_str(json).unwrap();
        let compact: String = blob.content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        assert_eq!(BASE64.decode(compact).unwrap(), b"<header>");
    }

    #[tokio::test]
    async fn test_rejects_non_hex_revision() {
        let source = GitHubSource::new("test", "https://api.github.com", "owner/name", None).unwrap();
        let err = source.get_blob("../../etc").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }
}
