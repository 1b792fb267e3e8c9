//! OpenAI-backed semantic search and contextual chat over the object catalog.

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        CreateChatCompletionRequestArgs, ResponseFormat, ResponseFormatJsonSchema,
    },
    Client,
};
use serde::Deserialize;
use serde_json::{json, Value};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::{
    ChatMessage, ChatResponse, ObjectDto, SearchResponse, SearchResult,
};
use crate::error::{ObjectDesignError, Result};
use crate::store::Store;

const SEARCH_SYSTEM_PROMPT: &str = "You are an intelligent search assistant that helps find \
relevant objects based on user queries. Respond with JSON only.";

const CHAT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant for an Object Design System. \
Provide clear, informative responses about objects, their properties, relationships, and \
hierarchies.";

#[derive(Deserialize)]
struct RankedMatch {
    object_id: String,
    relevance: f64,
    reasoning: String,
}

#[derive(Deserialize)]
struct RankedResponse {
    #[serde(default)]
    results: Vec<RankedMatch>,
    #[serde(default)]
    query_analysis: Option<String>,
}

#[derive(Clone)]
pub struct AiService {
    model: String,
    client: Client<OpenAIConfig>,
}

impl AiService {
    pub fn new(api_key: String, model: Option<String>, base_url: Option<String>) -> Self {
        let model = model.unwrap_or_else(|| "gpt-5".to_string());
        let base_url = base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string());
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);
        Self {
            model,
            client: Client::with_config(config),
        }
    }

    fn build_system_message(content: &str) -> Result<ChatCompletionRequestMessage> {
        let message = ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()
            .map_err(|e| ObjectDesignError::Runtime(e.to_string()))?;
        Ok(ChatCompletionRequestMessage::System(message))
    }

    fn build_user_message(content: String) -> Result<ChatCompletionRequestMessage> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(ChatCompletionRequestUserMessageContent::Text(content))
            .build()
            .map_err(|e| ObjectDesignError::Runtime(e.to_string()))?;
        Ok(ChatCompletionRequestMessage::User(message))
    }

    fn extract_text(
        response: &async_openai::types::chat::CreateChatCompletionResponse,
    ) -> Result<String> {
        let message = response
            .choices
            .first()
            .ok_or_else(|| ObjectDesignError::Runtime("No choices returned".to_string()))?
            .message
            .content
            .clone()
            .unwrap_or_default();
        Ok(message)
    }

    fn catalog_digest(objects: &[ObjectDto]) -> Value {
        Value::Array(
            objects
                .iter()
                .map(|obj| {
                    json!({
                        "id": obj.id,
                        "name": obj.name,
                        "description": obj.description,
                        "type": obj.kind,
                        "attributes": obj.attributes,
                    })
                })
                .collect(),
        )
    }

    fn ranking_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "results": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "object_id": {"type": "string"},
                            "relevance": {"type": "number"},
                            "reasoning": {"type": "string"}
                        },
                        "required": ["object_id", "relevance", "reasoning"],
                        "additionalProperties": false
                    }
                },
                "query_analysis": {"type": "string"}
            },
            "required": ["results", "query_analysis"],
            "additionalProperties": false
        })
    }

    /// Ranks the stored objects against a free-text query. Ids the model
    /// returns that do not resolve to a stored object are dropped.
    pub async fn search_objects(&self, query: &str, store: &Store) -> Result<SearchResponse> {
        let objects = store.list_objects().await?;
        let prompt = format!(
            "Analyze this search query: \"{}\"\n\nAvailable objects:\n{}\n\nFind the most \
             relevant objects based on the query. Consider object names, descriptions, \
             attributes, and content.",
            query,
            serde_json::to_string_pretty(&Self::catalog_digest(&objects))?,
        );

        let messages = vec![
            Self::build_system_message(SEARCH_SYSTEM_PROMPT)?,
            Self::build_user_message(prompt)?,
        ];

        let response_format = ResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                name: "object_search".to_string(),
                description: None,
                schema: Some(Self::ranking_schema()),
                strict: Some(true),
            },
        };

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.clone())
            .messages(messages)
            .response_format(response_format)
            .build()
            .map_err(|e| ObjectDesignError::Runtime(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| ObjectDesignError::Http(e.to_string()))?;

        let content = Self::extract_text(&response)?;
        let ranked: RankedResponse = serde_json::from_str(&content)
            .map_err(|e| ObjectDesignError::Serialization(e.to_string()))?;

        let results = ranked
            .results
            .into_iter()
            .filter_map(|matched| {
                objects
                    .iter()
                    .find(|obj| obj.id == matched.object_id)
                    .cloned()
                    .map(|object| SearchResult {
                        object,
                        relevance: matched.relevance,
                        reasoning: matched.reasoning,
                    })
            })
            .collect();

        Ok(SearchResponse {
            results,
            query: query.to_string(),
            reasoning: ranked
                .query_analysis
                .unwrap_or_else(|| "No analysis provided".to_string()),
        })
    }

    /// Chat turn with the stored objects and the session transcript as
    /// context. An unknown or absent session id starts a fresh session.
    pub async fn chat_with_context(
        &self,
        message: &str,
        session_id: Option<&str>,
        store: &Store,
    ) -> Result<ChatResponse> {
        let session = match session_id {
            Some(id) if Uuid::parse_str(id).is_ok() => store.get_chat_session(id).await?,
            _ => None,
        };
        let session = match session {
            Some(session) => session,
            None => {
                let id = Uuid::new_v4().to_string();
                store.create_chat_session(&id).await?
            }
        };

        let objects = store.list_objects().await?;
        let prompt = format!(
            "You are an AI assistant for an Object Design System. Help users with questions \
             about objects, their relationships, and hierarchies.\n\nAvailable objects:\n{}\n\n\
             Previous conversation:\n{}\n\nCurrent user message: \"{}\"\n\nProvide a helpful \
             response about the objects or system. If the user is asking about specific \
             objects, reference them by name and provide details.",
            serde_json::to_string_pretty(&Self::catalog_digest(&objects))?,
            serde_json::to_string_pretty(&session.messages)?,
            message,
        );

        let messages = vec![
            Self::build_system_message(CHAT_SYSTEM_PROMPT)?,
            Self::build_user_message(prompt)?,
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.clone())
            .messages(messages)
            .build()
            .map_err(|e| ObjectDesignError::Runtime(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| ObjectDesignError::Http(e.to_string()))?;

        let reply = match Self::extract_text(&response) {
            Ok(text) if !text.is_empty() => text,
            _ => "I couldn't generate a response.".to_string(),
        };

        let now = OffsetDateTime::now_utc();
        let timestamp = now
            .format(&Rfc3339)
            .map_err(|e| ObjectDesignError::Runtime(e.to_string()))?;
        let ts = now.unix_timestamp();

        let mut transcript = session.messages;
        transcript.push(ChatMessage {
            id: format!("{}-{}-user", Uuid::new_v4(), ts),
            role: "user".to_string(),
            content: message.to_string(),
            timestamp: timestamp.clone(),
        });
        transcript.push(ChatMessage {
            id: format!("{}-{}-assistant", Uuid::new_v4(), ts),
            role: "assistant".to_string(),
            content: reply.clone(),
            timestamp,
        });
        store.set_chat_messages(&session.id, &transcript).await?;

        Ok(ChatResponse {
            message: reply,
            session_id: session.id,
        })
    }
}
