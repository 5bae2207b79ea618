//! Problem-bank CRUD bindings. Thin wrappers over the pipeline.

use bytes::Bytes;
use qbank_http::{ApiClient, Result, UploadTask};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Markdown,
    Latex,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Problem {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub content_type: ContentType,
    pub options: BTreeMap<String, String>,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution_type: Option<ContentType>,
    pub difficulty: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<i32>,
    pub is_published: bool,
    pub review_status: ReviewStatus,
    #[serde(default)]
    pub total_attempts: i64,
    #[serde(default)]
    pub correct_attempts: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct CreateProblem {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,
    pub options: BTreeMap<String, String>,
    pub correct_answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution_type: Option<ContentType>,
    pub difficulty: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct UpdateProblem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_status: Option<ReviewStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProblemListResponse {
    pub problems: Vec<Problem>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

/// A problem as served for practice: the answer and solution are
/// withheld by the server.
#[derive(Clone, Debug, Deserialize)]
pub struct PracticeProblem {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub content_type: ContentType,
    pub options: BTreeMap<String, String>,
    pub difficulty: u8,
    #[serde(default)]
    pub estimated_time: Option<i32>,
    #[serde(default)]
    pub knowledge_points: Option<Vec<serde_json::Value>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProblemStats {
    pub total: i64,
    pub published: i64,
    pub pending_review: i64,
    #[serde(default)]
    pub by_difficulty: BTreeMap<String, i64>,
    #[serde(default)]
    pub by_source_type: BTreeMap<String, i64>,
}

/// Query parameters for the list endpoint.
#[derive(Clone, Debug, Default)]
pub struct ProblemQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub difficulty: Option<u8>,
    pub source_type: Option<String>,
    pub is_published: Option<bool>,
    pub review_status: Option<ReviewStatus>,
    pub search: Option<String>,
}

impl ProblemQuery {
    fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page".into(), page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".into(), limit.to_string()));
        }
        if let Some(difficulty) = self.difficulty {
            pairs.push(("difficulty".into(), difficulty.to_string()));
        }
        if let Some(source_type) = &self.source_type {
            pairs.push(("source_type".into(), source_type.clone()));
        }
        if let Some(is_published) = self.is_published {
            pairs.push(("is_published".into(), is_published.to_string()));
        }
        if let Some(status) = self.review_status {
            let value = match status {
                ReviewStatus::Pending => "pending",
                ReviewStatus::Approved => "approved",
                ReviewStatus::Rejected => "rejected",
            };
            pairs.push(("review_status".into(), value.into()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search".into(), search.clone()));
        }
        pairs
    }
}

pub async fn list(client: &ApiClient, query: &ProblemQuery) -> Result<ProblemListResponse> {
    client
        .get_query("/api/v1/problems/", query.to_pairs())
        .await
}

pub async fn get(client: &ApiClient, id: i64) -> Result<Problem> {
    client.get_json(&format!("/api/v1/problems/{id}")).await
}

pub async fn create(client: &ApiClient, problem: &CreateProblem) -> Result<Problem> {
    client.post_json("/api/v1/problems/", problem).await
}

pub async fn update(client: &ApiClient, id: i64, changes: &UpdateProblem) -> Result<Problem> {
    client
        .put_json(&format!("/api/v1/problems/{id}"), changes)
        .await
}

pub async fn delete(client: &ApiClient, id: i64) -> Result<()> {
    client.delete(&format!("/api/v1/problems/{id}")).await
}

pub async fn publish(client: &ApiClient, id: i64, publish: bool) -> Result<()> {
    client
        .post_unit(
            &format!("/api/v1/problems/{id}/publish"),
            &serde_json::json!({ "publish": publish }),
        )
        .await
}

pub async fn stats(client: &ApiClient) -> Result<ProblemStats> {
    client.get_json("/api/v1/problems/stats/summary").await
}

pub async fn search(client: &ApiClient, keyword: &str, limit: Option<u32>) -> Result<Vec<Problem>> {
    let mut pairs = Vec::new();
    if let Some(limit) = limit {
        pairs.push(("limit".to_string(), limit.to_string()));
    }
    client
        .get_query(&format!("/api/v1/problems/search/{keyword}"), pairs)
        .await
}

pub async fn random_practice(
    client: &ApiClient,
    count: Option<u32>,
    difficulty: &[u8],
) -> Result<Vec<PracticeProblem>> {
    let mut pairs = Vec::new();
    if let Some(count) = count {
        pairs.push(("count".to_string(), count.to_string()));
    }
    for d in difficulty {
        pairs.push(("difficulty".to_string(), d.to_string()));
    }
    client
        .get_query("/api/v1/problems/practice/random", pairs)
        .await
}

pub async fn record_attempt(client: &ApiClient, id: i64, is_correct: bool) -> Result<()> {
    client
        .post_unit(
            &format!("/api/v1/problems/{id}/attempt"),
            &serde_json::json!({ "is_correct": is_correct }),
        )
        .await
}

/// Upload a problem attachment; progress is observable on the returned
/// task's stream.
pub fn upload_image(client: &ApiClient, id: i64, file_name: &str, content: Bytes) -> UploadTask {
    client.upload(
        &format!("/api/v1/problems/{id}/image"),
        "file",
        file_name,
        content,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pairs_skip_unset_fields() {
        let query = ProblemQuery {
            page: Some(2),
            limit: Some(20),
            review_status: Some(ReviewStatus::Pending),
            ..Default::default()
        };
        let pairs = query.to_pairs();
        assert_eq!(
            pairs,
            vec![
                ("page".to_string(), "2".to_string()),
                ("limit".to_string(), "20".to_string()),
                ("review_status".to_string(), "pending".to_string()),
            ]
        );
    }

    #[test]
    fn test_practice_problem_decodes_without_answer_fields() {
        let problem: PracticeProblem = serde_json::from_value(serde_json::json!({
            "id": 3,
            "title": "Quadratics",
            "content": "Solve x^2 = 4",
            "content_type": "latex",
            "options": {"A": "2", "B": "-2", "C": "both"},
            "difficulty": 2
        }))
        .unwrap();
        assert_eq!(problem.content_type, ContentType::Latex);
        assert!(problem.estimated_time.is_none());
    }

    #[test]
    fn test_update_serializes_only_changes() {
        let changes = UpdateProblem {
            is_published: Some(true),
            ..Default::default()
        };
        let value = serde_json::to_value(&changes).unwrap();
        assert_eq!(value, serde_json::json!({"is_published": true}));
    }
}
