//! Conversational language understanding client.
//!
//! Calls the `analyze-conversations` endpoint of a deployed CLU project and
//! maps the prediction onto [`RecognizedIntent`].

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::CluConfig;
use crate::error::NluError;

use super::{Intent, IntentRecognizer, RecognizedEntity, RecognizedIntent};

const API_VERSION: &str = "2023-04-01";

/// CLU-backed recognizer. Constructed without settings it reports itself
/// as unconfigured.
pub struct CluRecognizer {
    config: Option<CluConfig>,
    client: reqwest::Client,
}

impl CluRecognizer {
    pub fn new(config: Option<CluConfig>) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(config: &CluConfig) -> String {
        format!(
            "https://{}/language/:analyze-conversations?api-version={API_VERSION}",
            config.host_name.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl IntentRecognizer for CluRecognizer {
    fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    async fn recognize(&self, text: &str) -> Result<RecognizedIntent, NluError> {
        let config = self.config.as_ref().ok_or(NluError::NotConfigured)?;
        let endpoint = Self::endpoint(config);
        let body = AnalyzeRequest::new(text, config);

        let response = self
            .client
            .post(&endpoint)
            .header("Ocp-Apim-Subscription-Key", config.api_key.expose_secret())
            .header("Apim-Request-Id", Uuid::new_v4().to_string())
            .json(&body)
            .send()
            .await
            .map_err(|e| NluError::RequestFailed {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(NluError::AuthFailed {
                    status: status.as_u16(),
                });
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(std::time::Duration::from_secs);
                return Err(NluError::RateLimited { retry_after });
            }
            s if !s.is_success() => {
                return Err(NluError::RequestFailed {
                    endpoint,
                    reason: format!("HTTP {s}"),
                });
            }
            _ => {}
        }

        let raw = response.text().await.map_err(|e| NluError::InvalidResponse {
            reason: e.to_string(),
        })?;
        let parsed: AnalyzeResponse = serde_json::from_str(&raw)?;
        let recognized = parsed.into_recognized();
        tracing::debug!(
            intent = %recognized.top_intent,
            entities = recognized.entities.len(),
            "CLU prediction"
        );
        Ok(recognized)
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest<'a> {
    kind: &'static str,
    analysis_input: AnalysisInput<'a>,
    parameters: Parameters<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisInput<'a> {
    conversation_item: ConversationItem<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConversationItem<'a> {
    id: &'static str,
    participant_id: &'static str,
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Parameters<'a> {
    project_name: &'a str,
    deployment_name: &'a str,
    string_index_type: &'static str,
}

impl<'a> AnalyzeRequest<'a> {
    fn new(text: &'a str, config: &'a CluConfig) -> Self {
        Self {
            kind: "Conversation",
            analysis_input: AnalysisInput {
                conversation_item: ConversationItem {
                    id: "1",
                    participant_id: "user",
                    text,
                },
            },
            parameters: Parameters {
                project_name: &config.project_name,
                deployment_name: &config.deployment_name,
                string_index_type: "TextElement_V8",
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    result: AnalyzeResult,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResult {
    prediction: Prediction,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    #[serde(default)]
    top_intent: String,
    #[serde(default)]
    entities: Vec<WireEntity>,
}

#[derive(Debug, Deserialize)]
struct WireEntity {
    category: String,
    text: String,
    #[serde(default)]
    offset: usize,
    #[serde(default)]
    length: usize,
    #[serde(default)]
    resolutions: Vec<Resolution>,
}

#[derive(Debug, Deserialize)]
struct Resolution {
    #[serde(default)]
    timex: Option<String>,
}

impl AnalyzeResponse {
    fn into_recognized(self) -> RecognizedIntent {
        let prediction = self.result.prediction;
        RecognizedIntent {
            top_intent: Intent::from_label(&prediction.top_intent),
            entities: prediction
                .entities
                .into_iter()
                .map(|e| RecognizedEntity {
                    timex: e.resolutions.into_iter().find_map(|r| r.timex),
                    category: e.category,
                    text: e.text,
                    offset: e.offset,
                    length: e.length,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn config() -> CluConfig {
        CluConfig {
            api_key: SecretString::from("key"),
            host_name: "example.cognitiveservices.azure.com/".to_string(),
            project_name: "FlightBooking".to_string(),
            deployment_name: "production".to_string(),
        }
    }

    #[test]
    fn endpoint_uses_host_name() {
        assert_eq!(
            CluRecognizer::endpoint(&config()),
            "https://example.cognitiveservices.azure.com/language/:analyze-conversations?api-version=2023-04-01"
        );
    }

    #[test]
    fn request_body_shape() {
        let config = config();
        let body = serde_json::to_value(AnalyzeRequest::new("book a bus", &config)).unwrap();
        assert_eq!(body["kind"], "Conversation");
        assert_eq!(body["analysisInput"]["conversationItem"]["text"], "book a bus");
        assert_eq!(body["parameters"]["projectName"], "FlightBooking");
        assert_eq!(body["parameters"]["deploymentName"], "production");
    }

    #[test]
    fn parses_prediction() {
        let raw = r#"{
            "kind": "ConversationResult",
            "result": {
                "query": "fly to Paris tomorrow",
                "prediction": {
                    "topIntent": "BookFlight",
                    "projectKind": "Conversation",
                    "intents": [{"category": "BookFlight", "confidenceScore": 0.97}],
                    "entities": [
                        {"category": "to", "text": "Paris", "offset": 7, "length": 5, "confidenceScore": 1},
                        {"category": "airport", "text": "Paris", "offset": 7, "length": 5, "confidenceScore": 1,
                         "extraInformation": [{"extraInformationKind": "ListKey", "key": "CDG"}]},
                        {"category": "travelDate", "text": "tomorrow", "offset": 13, "length": 8, "confidenceScore": 1,
                         "resolutions": [{"resolutionKind": "DateTimeResolution", "dateTimeSubKind": "Date", "timex": "2026-10-17", "value": "2026-10-17"}]}
                    ]
                }
            }
        }"#;
        let parsed: AnalyzeResponse = serde_json::from_str(raw).unwrap();
        let recognized = parsed.into_recognized();
        assert_eq!(recognized.top_intent, Intent::BookFlight);
        assert_eq!(recognized.to_entities().airport.as_deref(), Some("Paris"));
        assert_eq!(recognized.travel_date().as_deref(), Some("2026-10-17"));
    }

    #[tokio::test]
    async fn unconfigured_recognizer_refuses() {
        let recognizer = CluRecognizer::new(None);
        assert!(!recognizer.is_configured());
        assert!(matches!(
            recognizer.recognize("hello").await,
            Err(NluError::NotConfigured)
        ));
    }
}
