use serde_json::{Value, json};

pub const FETCH_ISSUE: &str = "get_jira_ticket";
pub const CREATE_PAGE: &str = "create_confluence_page";
pub const CREATE_OR_UPDATE_PAGE: &str = "create_test_plan_from_jira";

pub const SERVER_INSTRUCTIONS: &str = "Fetch the Jira ticket with get_jira_ticket before drafting a document. \
Publish new pages with create_confluence_page. Use create_test_plan_from_jira to publish a test plan: \
it updates the page with the same title in the space instead of creating a duplicate. \
Page bodies must be Confluence storage-format HTML.";

/// Declared tools, in the order they are advertised.
pub fn tool_definitions() -> Vec<Value> {
    vec![
        json!({
            "name": FETCH_ISSUE,
            "description": "Get details for a Jira ticket by issue key, including child stories and subtasks",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "issue_key": {
                        "type": "string",
                        "description": "Jira issue key (e.g., PROJ-123)"
                    }
                },
                "required": ["issue_key"]
            }
        }),
        json!({
            "name": CREATE_PAGE,
            "description": "Create a new page in Confluence with specified content",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "space_key": {
                        "type": "string",
                        "description": "Confluence space key where the page will be created"
                    },
                    "title": { "type": "string", "description": "Title for the new page" },
                    "body": { "type": "string", "description": "HTML content for the page body" }
                },
                "required": ["space_key", "title", "body"]
            }
        }),
        json!({
            "name": CREATE_OR_UPDATE_PAGE,
            "description": "Create or update a Confluence page with a test plan based on Jira ticket data",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "issue_key": {
                        "type": "string",
                        "description": "Jira issue key the test plan is based on"
                    },
                    "space_key": {
                        "type": "string",
                        "description": "Confluence space where the page should be created"
                    },
                    "title": { "type": "string", "description": "Title for the Confluence page" },
                    "body": {
                        "type": "string",
                        "description": "Complete test plan content in HTML format"
                    }
                },
                "required": ["issue_key", "space_key", "title", "body"]
            }
        }),
    ]
}
