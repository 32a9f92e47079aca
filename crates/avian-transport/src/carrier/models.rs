//! ============================================
//! File: crates/avian-transport/src/carrier/models.rs
//! ============================================
//! Purpose: Wire models for the microblog REST API used as carrier
//!
//! Main Data Structures:
//!   - CreatePostRequest/Response: Publishing one post
//!   - AddRulesRequest/DeleteRulesRequest/RulesResponse: Filtered stream rules
//!   - StreamEnvelope: One line of the filtered stream
//!
//! ⚠️ Important Note for Next Developer:
//!   - Responses are parsed leniently; unknown fields are ignored and most
//!     fields are optional because the API omits them on partial errors
//!
//! Last Modified: v0.1.0 - Initial carrier models
//! ============================================

use serde::{Deserialize, Serialize};

/// Body of `POST /2/tweets`.
#[derive(Debug, Serialize)]
pub struct CreatePostRequest<'a> {
    /// Post text
    pub text: &'a str,
}

/// Response of `POST /2/tweets`.
#[derive(Debug, Deserialize)]
pub struct CreatePostResponse {
    /// Created post
    pub data: PostData,
}

/// A post as the API returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct PostData {
    /// Post id
    pub id: String,
    /// Post text
    #[serde(default)]
    pub text: String,
}

/// One filtered stream rule to add.
#[derive(Debug, Serialize)]
pub struct RuleSpec<'a> {
    /// Rule expression; a bare keyword matches posts containing it
    pub value: &'a str,
    /// Free-form tag echoed back with matches
    pub tag: &'a str,
}

/// Body of `POST /2/tweets/search/stream/rules` adding rules.
#[derive(Debug, Serialize)]
pub struct AddRulesRequest<'a> {
    /// Rules to add
    pub add: Vec<RuleSpec<'a>>,
}

/// Rule ids to delete.
#[derive(Debug, Serialize)]
pub struct RuleIds<'a> {
    /// Ids of rules to delete
    pub ids: Vec<&'a str>,
}

/// Body of `POST /2/tweets/search/stream/rules` deleting rules.
#[derive(Debug, Serialize)]
pub struct DeleteRulesRequest<'a> {
    /// Rules to delete
    pub delete: RuleIds<'a>,
}

/// Response of the rules endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct RulesResponse {
    /// Rules created
    #[serde(default)]
    pub data: Vec<Rule>,
    /// Per-rule problems (e.g. duplicates)
    #[serde(default)]
    pub errors: Vec<ApiProblem>,
}

/// A registered rule.
#[derive(Debug, Clone, Deserialize)]
pub struct Rule {
    /// Rule id
    pub id: String,
    /// Rule expression
    #[serde(default)]
    pub value: String,
}

/// A problem object as reported by the API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiProblem {
    /// Id of the object concerned, if any (duplicate rules report the
    /// existing rule id here)
    #[serde(default)]
    pub id: Option<String>,
    /// Problem title
    #[serde(default)]
    pub title: Option<String>,
    /// Human-readable detail
    #[serde(default)]
    pub detail: Option<String>,
}

impl RulesResponse {
    /// Returns the id of the rule that now covers the requested keyword,
    /// whether freshly created or already present.
    pub fn rule_id(&self) -> Option<&str> {
        self.data
            .first()
            .map(|rule| rule.id.as_str())
            .or_else(|| self.errors.iter().find_map(|e| e.id.as_deref()))
    }
}

/// One line of the filtered stream.
#[derive(Debug, Default, Deserialize)]
pub struct StreamEnvelope {
    /// Matching post
    #[serde(default)]
    pub data: Option<PostData>,
    /// Operational problems the stream reports in-band
    #[serde(default)]
    pub errors: Vec<ApiProblem>,
}
