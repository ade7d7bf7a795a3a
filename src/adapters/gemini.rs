//! Gemini structuring adapter.
//!
//! Calls `generateContent` with a JSON response schema so the model answers
//! with machine-readable output.
//!
//! Endpoint: POST `<endpoint>/models/<model>:generateContent`
//! Auth: `x-goog-api-key` header

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::Structurer;
use crate::config::LlmSettings;
use crate::domain::{Group, InventoryItem, Label, LabelAssignment, Record};

/// Location the model is told to use when nothing in the candidate list fits
pub const ERROR_LOCATION: &str = "error";

/// Structurer backed by the Gemini REST API
pub struct GeminiStructurer {
    api_key: String,
    settings: LlmSettings,
    generate_description: bool,
    client: reqwest::Client,
}

/// One location block as returned by the model
#[derive(Debug, Deserialize)]
struct Addition {
    location: String,
    #[serde(default)]
    items: Vec<StructuredItem>,
}

#[derive(Debug, Deserialize)]
struct StructuredItem {
    name: String,
    #[serde(default = "default_quantity")]
    quantity: i64,
    #[serde(default)]
    description: String,
}

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

impl GeminiStructurer {
    pub fn new(api_key: String, settings: LlmSettings, generate_description: bool) -> Self {
        Self {
            api_key,
            settings,
            generate_description,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.endpoint, self.settings.model
        )
    }

    /// Send a prompt and return the model's text answer
    async fn generate(&self, prompt: &str, schema: Value) -> Result<String> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema,
            }
        });

        let response = self
            .client
            .post(self.api_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to reach Gemini")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini error ({}): {}", status, text);
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        extract_text(parsed)
    }
}

/// Concatenate the text parts of the first candidate
fn extract_text(response: GenerateResponse) -> Result<String> {
    let content = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .context("Gemini returned no candidates")?;

    Ok(content.parts.into_iter().map(|p| p.text).collect())
}

/// Build the prompt that splits a transcript into locations and items
pub fn intake_prompt(transcript: &str, candidate_paths: &[String], generate_description: bool) -> String {
    let description_rule = if generate_description {
        "Write a short description for each item where you can."
    } else {
        "Leave the description field empty."
    };

    format!(
        r#"Below is speech-recognition text made of one or more parts. Each part starts with a location followed by items separated by the word "next".
Every item mentioned after location A and before location B belongs to location A.
Write locations as slash-separated paths from the outermost container to the innermost, e.g. "Box 5 in Cabinet inside Pantry" becomes "Pantry/Cabinet/Box 5".
Keep the location as spoken unless the speaker explicitly changes it.
Capitalize names nicely. Quantity is 1 unless stated otherwise.
Fix obvious speech-recognition mistakes in item names.
{description_rule}

Each location must be one of the following paths; if none fits use "{error}":
{paths}

Text:
{transcript}
"#,
        description_rule = description_rule,
        error = ERROR_LOCATION,
        paths = serde_json::to_string(candidate_paths).unwrap_or_default(),
        transcript = transcript,
    )
}

/// Build the prompt asking for label assignments
pub fn labeling_prompt(items: &[InventoryItem], labels: &[Label]) -> String {
    let item_lines: Vec<String> = items
        .iter()
        .map(|i| format!("ID: <{}> Name: {}: {}", i.id, i.name, i.description))
        .collect();
    let label_lines: Vec<String> = labels
        .iter()
        .map(|l| format!("<{}> with description {}", l.name, l.description))
        .collect();

    format!(
        r#"Here is a list of items:
{items}
END OF LIST

Label the items using the labels below. Return each item's ID together with the names of the labels you assign.
Assign every label that fits; assign none if nothing fits.
Return IDs and label names exactly as written, without the surrounding < and >, and without descriptions.
Labels:
{labels}
END OF LIST
"#,
        items = item_lines.join("\n"),
        labels = label_lines.join("\n"),
    )
}

fn intake_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "location": { "type": "STRING" },
                "items": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "name": { "type": "STRING" },
                            "quantity": { "type": "INTEGER" },
                            "description": { "type": "STRING" }
                        },
                        "required": ["name", "quantity", "description"]
                    }
                }
            },
            "required": ["location", "items"]
        }
    })
}

fn labeling_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "id": { "type": "STRING" },
                "labels": { "type": "ARRAY", "items": { "type": "STRING" } }
            },
            "required": ["id"]
        }
    })
}

/// Decode the intake answer into groups of `{name, quantity, description}` records
pub fn parse_groups(answer: &str) -> Result<Vec<Group>> {
    let additions: Vec<Addition> =
        serde_json::from_str(answer).context("Model answer is not the expected location list")?;

    Ok(additions
        .into_iter()
        .map(|addition| {
            let records = addition
                .items
                .into_iter()
                .map(|item| {
                    Record::new()
                        .with("name", item.name)
                        .with("quantity", item.quantity.to_string())
                        .with("description", item.description)
                })
                .collect();
            Group::new(addition.location, records)
        })
        .collect())
}

/// Decode the labeling answer
pub fn parse_assignments(answer: &str) -> Result<Vec<LabelAssignment>> {
    serde_json::from_str(answer).context("Model answer is not the expected label list")
}

#[async_trait]
impl Structurer for GeminiStructurer {
    async fn structure(&self, transcript: &str, candidate_paths: &[String]) -> Result<Vec<Group>> {
        let prompt = intake_prompt(transcript, candidate_paths, self.generate_description);
        let answer = self.generate(&prompt, intake_schema()).await?;
        parse_groups(&answer)
    }

    async fn label_items(
        &self,
        items: &[InventoryItem],
        labels: &[Label],
    ) -> Result<Vec<LabelAssignment>> {
        let prompt = labeling_prompt(items, labels);
        let answer = self.generate(&prompt, labeling_schema()).await?;
        parse_assignments(&answer)
    }
}
