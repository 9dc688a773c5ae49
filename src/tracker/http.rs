//! Blocking HTTP client for the tracker's REST surface.
//!
//! Speaks the v2 REST API: issue fetch, transitions list/apply, comments,
//! issue links, JQL search, and issue creation. Calls are synchronous with
//! no retry and no client-side timeout; a hang in the tracker blocks the
//! operation, which is an accepted limitation of this tool. Searches read a
//! single page capped at [`MAX_SEARCH_RESULTS`] hits, so a working set past
//! that size is truncated rather than paged.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;

use crate::config::TrackerConfig;
use crate::tracker::{IssueTracker, NewTask, ParentRef, TrackerTask, Transition};
use crate::{Error, Result};

/// Fields requested on every issue read.
const ISSUE_FIELDS: &str = "summary,description,status,parent,assignee,issuelinks";

/// Single-page search cap; results past this many are not fetched.
pub const MAX_SEARCH_RESULTS: u32 = 100;

/// REST client over one tracker instance.
pub struct HttpTracker {
    base_url: String,
    auth_header: String,
}

impl HttpTracker {
    /// Build a client from validated configuration.
    pub fn new(config: &TrackerConfig) -> Self {
        let credentials = format!("{}:{}", config.email, config.api_token);
        Self {
            base_url: format!("{}/rest/api/2", config.base_url.trim_end_matches('/')),
            auth_header: format!("Basic {}", BASE64.encode(credentials)),
        }
    }

    fn get(&self, path: &str) -> Result<ureq::Response> {
        let url = format!("{}{}", self.base_url, path);
        ureq::get(&url)
            .set("Authorization", &self.auth_header)
            .set("Accept", "application/json")
            .call()
            .map_err(|e| map_http_error(path, e))
    }

    fn post(&self, path: &str, body: serde_json::Value) -> Result<ureq::Response> {
        let url = format!("{}{}", self.base_url, path);
        ureq::post(&url)
            .set("Authorization", &self.auth_header)
            .set("Accept", "application/json")
            .send_json(body)
            .map_err(|e| map_http_error(path, e))
    }
}

/// Map a ureq error to the crate taxonomy: 404 means the entity does not
/// resolve, everything else is transport-level.
fn map_http_error(path: &str, err: ureq::Error) -> Error {
    match err {
        ureq::Error::Status(404, _) => Error::NotFound(path.to_string()),
        ureq::Error::Status(code, resp) => {
            let body = resp.into_string().unwrap_or_default();
            Error::Transport(format!("HTTP {} on {}: {}", code, path, body))
        }
        other => Error::Transport(other.to_string()),
    }
}

// Wire-format structs, only the fields this tool reads.

#[derive(Debug, Deserialize)]
struct RawIssue {
    key: String,
    fields: RawFields,
}

#[derive(Debug, Deserialize)]
struct RawFields {
    summary: String,
    description: Option<String>,
    status: RawStatus,
    parent: Option<RawParent>,
    assignee: Option<RawUser>,
    #[serde(default)]
    issuelinks: Vec<RawLink>,
}

#[derive(Debug, Deserialize)]
struct RawStatus {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawParent {
    key: String,
    fields: RawParentFields,
}

#[derive(Debug, Deserialize)]
struct RawParentFields {
    summary: String,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    #[serde(rename = "displayName")]
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct RawLink {
    #[serde(rename = "type")]
    link_type: RawLinkType,
    #[serde(rename = "inwardIssue")]
    inward: Option<RawLinkedIssue>,
    #[serde(rename = "outwardIssue")]
    outward: Option<RawLinkedIssue>,
}

#[derive(Debug, Deserialize)]
struct RawLinkType {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawLinkedIssue {
    key: String,
}

#[derive(Debug, Deserialize)]
struct RawTransitions {
    transitions: Vec<RawTransition>,
}

#[derive(Debug, Deserialize)]
struct RawTransition {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawSearchResults {
    #[serde(default)]
    issues: Vec<RawIssue>,
}

#[derive(Debug, Deserialize)]
struct RawCreated {
    key: String,
}

impl From<RawIssue> for TrackerTask {
    fn from(raw: RawIssue) -> Self {
        let mut blocked_by = Vec::new();
        let mut blocks = Vec::new();
        for link in raw.fields.issuelinks {
            if !link.link_type.name.eq_ignore_ascii_case("Blocks") {
                continue;
            }
            // Inward side of a Blocks link is "is blocked by".
            if let Some(inward) = link.inward {
                blocked_by.push(inward.key);
            }
            if let Some(outward) = link.outward {
                blocks.push(outward.key);
            }
        }

        TrackerTask {
            id: raw.key,
            summary: raw.fields.summary,
            description: raw.fields.description,
            status: raw.fields.status.name,
            parent: raw.fields.parent.map(|p| ParentRef {
                id: p.key,
                summary: p.fields.summary,
            }),
            assignee: raw.fields.assignee.map(|u| u.display_name),
            blocked_by,
            blocks,
        }
    }
}

impl IssueTracker for HttpTracker {
    fn get_task(&self, id: &str) -> Result<TrackerTask> {
        let resp = self.get(&format!("/issue/{}?fields={}", id, ISSUE_FIELDS))?;
        let raw: RawIssue = resp
            .into_json()
            .map_err(|e| Error::Transport(format!("parsing issue {}: {}", id, e)))?;
        Ok(raw.into())
    }

    fn list_transitions(&self, id: &str) -> Result<Vec<Transition>> {
        let resp = self.get(&format!("/issue/{}/transitions", id))?;
        let raw: RawTransitions = resp
            .into_json()
            .map_err(|e| Error::Transport(format!("parsing transitions for {}: {}", id, e)))?;
        Ok(raw
            .transitions
            .into_iter()
            .map(|t| Transition {
                name: t.name,
                handle: t.id,
            })
            .collect())
    }

    fn apply_transition(&self, id: &str, handle: &str) -> Result<()> {
        self.post(
            &format!("/issue/{}/transitions", id),
            serde_json::json!({ "transition": { "id": handle } }),
        )?;
        Ok(())
    }

    fn add_comment(&self, id: &str, body: &str) -> Result<()> {
        self.post(
            &format!("/issue/{}/comment", id),
            serde_json::json!({ "body": body }),
        )?;
        Ok(())
    }

    fn create_link(&self, blocker: &str, blocked: &str) -> Result<()> {
        self.post(
            "/issueLink",
            serde_json::json!({
                "type": { "name": "Blocks" },
                "inwardIssue": { "key": blocker },
                "outwardIssue": { "key": blocked },
            }),
        )?;
        Ok(())
    }

    fn search(&self, filter: &str) -> Result<Vec<TrackerTask>> {
        let resp = self.get(&format!(
            "/search?jql={}&fields={}&maxResults={}",
            urlencoding::encode(filter),
            ISSUE_FIELDS,
            MAX_SEARCH_RESULTS
        ))?;
        let raw: RawSearchResults = resp
            .into_json()
            .map_err(|e| Error::Transport(format!("parsing search results: {}", e)))?;
        Ok(raw.issues.into_iter().map(Into::into).collect())
    }

    fn create_task(&self, spec: &NewTask) -> Result<String> {
        let mut fields = serde_json::json!({
            "summary": spec.summary,
            "issuetype": { "name": spec.issue_type },
        });
        if let Some(desc) = &spec.description {
            fields["description"] = serde_json::json!(desc);
        }
        if let Some(parent) = &spec.parent {
            fields["parent"] = serde_json::json!({ "key": parent });
        }

        let resp = self.post("/issue", serde_json::json!({ "fields": fields }))?;
        let raw: RawCreated = resp
            .into_json()
            .map_err(|e| Error::Transport(format!("parsing create response: {}", e)))?;
        Ok(raw.key)
    }
}
