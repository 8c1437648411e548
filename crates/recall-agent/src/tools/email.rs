use std::sync::LazyLock;

use recall_agent_core::tool::{Error as ToolError, Tool, ToolResult};
use regex::Regex;
use reqwest::{Client, Url};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

const DEFAULT_SERVICE_URL: &str = "http://localhost:3001";
const DEFAULT_PAGE: u32 = 1;
const DEFAULT_LIMIT: u32 = 50;

static SENDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]+)" <([^>]+)>"#).unwrap());

#[derive(Deserialize, JsonSchema)]
pub struct EmailParameters {
    #[schemars(description = "1-based page of unread emails, default to 1.")]
    page: Option<String>,
    #[schemars(description = "Emails per page, default to 50.")]
    limit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UnreadEmails {
    emails: Vec<EmailSummary>,
    pagination: Pagination,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmailSummary {
    subject: Option<String>,
    from: Option<String>,
    date: String,
    snippet: Option<String>,
    #[serde(default)]
    has_attachments: bool,
    #[serde(default)]
    size: u64,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    limit: u32,
    total: u32,
}

#[derive(Deserialize)]
struct ServiceError {
    error: String,
}

/// A tool for summarizing unread emails, backed by a mail service.
pub struct EmailTool {
    client: Client,
    service_url: String,
    parameter_schema: Value,
}

impl EmailTool {
    /// Creates an email tool talking to the mail service at `service_url`.
    #[inline]
    pub fn new<S: Into<String>>(service_url: S) -> Self {
        EmailTool {
            client: Client::new(),
            service_url: service_url.into().trim_end_matches('/').to_owned(),
            parameter_schema: schema_for!(EmailParameters).to_value(),
        }
    }
}

impl Default for EmailTool {
    #[inline]
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_URL)
    }
}

impl Tool for EmailTool {
    type Input = EmailParameters;

    fn name(&self) -> &str {
        "email"
    }

    fn description(&self) -> &str {
        "Check unread emails and summarize them"
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: EmailParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let client = self.client.clone();
        let service_url = self.service_url.clone();
        async move {
            let page = parse_count("page", input.page, DEFAULT_PAGE)?;
            let limit = parse_count("limit", input.limit, DEFAULT_LIMIT)?;
            let unread = fetch_unread(&client, &service_url, page, limit).await?;
            Ok(summarize(&unread))
        }
    }
}

fn parse_count(
    name: &str,
    value: Option<String>,
    default: u32,
) -> Result<u32, ToolError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().parse::<u32>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(ToolError::invalid_input()
            .with_reason(format!("{name} must be a positive integer"))),
    }
}

async fn fetch_unread(
    client: &Client,
    service_url: &str,
    page: u32,
    limit: u32,
) -> Result<UnreadEmails, ToolError> {
    let url = Url::parse_with_params(
        &format!("{service_url}/api/emails/unread"),
        [("page", page.to_string()), ("limit", limit.to_string())],
    )
    .map_err(check_error)?;
    let resp = client.get(url).send().await.map_err(check_error)?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        debug!("mail service responded with {status}: {body}");
        let reason = serde_json::from_str::<ServiceError>(&body)
            .map(|err| err.error)
            .unwrap_or_else(|_| format!("server responded with {status}"));
        return Err(check_error(reason));
    }
    resp.json().await.map_err(check_error)
}

#[inline]
fn check_error<E: std::fmt::Display>(err: E) -> ToolError {
    ToolError::execution_error().with_reason(format!("Error checking emails: {err}"))
}

fn summarize(unread: &UnreadEmails) -> String {
    let blocks: Vec<_> = unread.emails.iter().filter_map(format_email).collect();
    if blocks.is_empty() {
        return "No unread emails found.".to_owned();
    }
    let mut summary =
        format!("Found {} unread email(s):\n\n{}", blocks.len(), blocks.join("\n\n"));
    if unread.pagination.total > unread.pagination.limit {
        summary.push_str(
            "\n\nNote: There are more unread emails. You can request the next page to see more.",
        );
    }
    summary
}

/// Emails without a subject or a sender are left out.
fn format_email(email: &EmailSummary) -> Option<String> {
    let subject = email.subject.as_deref().filter(|s| !s.is_empty())?;
    let from = email.from.as_deref().filter(|s| !s.is_empty())?;

    let mut block = format!(
        "- From: {}\n  Subject: {subject}\n  Date: {}",
        sender_name(from),
        email.date
    );
    if email.has_attachments {
        block.push_str("\n  📎 Has attachments");
    }
    block.push_str(&format!("\n  Size: {:.1} KB", email.size as f64 / 1024.0));
    if let Some(snippet) = email.snippet.as_deref().filter(|s| !s.is_empty()) {
        block.push_str(&format!("\n  Preview: {snippet}"));
    }
    Some(block)
}

fn sender_name(from: &str) -> &str {
    SENDER
        .captures(from)
        .and_then(|caps| caps.get(1))
        .map_or(from, |name| name.as_str())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn unread(emails: Value, total: u32) -> UnreadEmails {
        serde_json::from_value(json!({
            "emails": emails,
            "pagination": { "page": 1, "limit": 2, "total": total, "totalPages": 1 }
        }))
        .unwrap()
    }

    #[test]
    fn test_summarize() {
        let unread = unread(
            json!([
                {
                    "id": "7",
                    "subject": "Urgent Meeting",
                    "from": "\"Jane Doe\" <jane@company.com>",
                    "date": "2024-05-01T09:30:00.000Z",
                    "snippet": "Please join at 10",
                    "hasAttachments": true,
                    "size": 2048
                },
                {
                    "id": "8",
                    "subject": "Project Update",
                    "from": "team@company.com",
                    "date": "2024-05-01T10:00:00.000Z",
                    "hasAttachments": false,
                    "size": 1536
                },
                {
                    "id": "9",
                    "from": "nobody@company.com",
                    "date": "2024-05-01T11:00:00.000Z",
                    "hasAttachments": false,
                    "size": 10
                }
            ]),
            2,
        );
        assert_eq!(
            summarize(&unread),
            "Found 2 unread email(s):\n\
             \n\
             - From: Jane Doe\n  \
             Subject: Urgent Meeting\n  \
             Date: 2024-05-01T09:30:00.000Z\n  \
             📎 Has attachments\n  \
             Size: 2.0 KB\n  \
             Preview: Please join at 10\n\
             \n\
             - From: team@company.com\n  \
             Subject: Project Update\n  \
             Date: 2024-05-01T10:00:00.000Z\n  \
             Size: 1.5 KB"
        );
    }

    #[test]
    fn test_summarize_empty_and_more_pages() {
        assert_eq!(summarize(&unread(json!([]), 0)), "No unread emails found.");
        let incomplete = unread(
            json!([
                { "from": "a@b.c", "date": "today", "size": 10 },
                { "subject": "", "from": "a@b.c", "date": "today", "size": 10 },
                { "subject": "Hi", "date": "today", "size": 10 }
            ]),
            3,
        );
        assert_eq!(summarize(&incomplete), "No unread emails found.");

        let unread = unread(
            json!([{
                "id": "1",
                "subject": "Hi",
                "from": "a@b.c",
                "date": "today",
                "hasAttachments": false,
                "size": 0
            }]),
            5,
        );
        assert!(summarize(&unread).ends_with(
            "\n\nNote: There are more unread emails. You can request the next page to see more."
        ));
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("page", None, 1), Ok(1));
        assert_eq!(parse_count("page", Some(" 3 ".to_owned()), 1), Ok(3));
        let err = parse_count("limit", Some("0".to_owned()), 50).unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: limit must be a positive integer");
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let tool = EmailTool::new("http://127.0.0.1:9/");
        let input = EmailParameters {
            page: Some("1".to_owned()),
            limit: None,
        };
        let err = tool.execute(input).await.unwrap_err();
        assert!(err.to_string().starts_with("Error checking emails: "));
    }
}
