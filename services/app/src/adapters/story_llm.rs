//! services/app/src/adapters/story_llm.rs
//!
//! This module contains the adapter for the story-weaving LLM.
//! It implements the `StorySynthesisService` port from the `core` crate.

const SYSTEM_INSTRUCTIONS: &str =
    "You are an award-winning children's book author. Write compelling, connected stories.";

const DEFAULT_TONE: &str = "The tone should be magical, warm, and engaging.";

const EMPTY_NOTE_PLACEHOLDER: &str =
    "No specific note, fit this image into the ongoing story seamlessly.";

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessageContentPartImageArgs,
        ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequestArgs, ImageDetail, ImageUrlArgs, ResponseFormat,
        ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use serde::Deserialize;
use storyweaver_core::{
    domain::{StoryImage, StoryPage, StoryResponse, User},
    ports::{PortError, PortResult, StorySynthesisService},
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `StorySynthesisService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiStoryAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiStoryAdapter {
    /// Creates a new `OpenAiStoryAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// The instructional preamble ahead of the image sequence.
    fn preamble(image_count: usize, user: Option<&User>) -> String {
        let user_context = match user {
            Some(user) if !user.age.is_empty() => format!(
                "The story is written for {}, who is {} years old. Adjust the vocabulary and tone to be appropriate and engaging for this age.",
                user.name, user.age
            ),
            _ => DEFAULT_TONE.to_string(),
        };

        format!(
            r#"You are a master novelist creating a cohesive picture book.
I will provide a sequence of {image_count} images.
For each image, I may also provide a "Context Note".

Your Task:
1. Write a continuous, flowing story that links these images together.
2. CRITICAL: Ensure smooth narrative transitions between pages. The end of page 1 must flow naturally into page 2.
3. If there are gaps in logic between images, invent creative narrative bridges to connect them.
4. {user_context}
5. Do not merely describe the image visually (e.g., "In this image there is a cat"). Instead, weave it into the plot (e.g., "Suddenly, a small tabby cat emerged from the shadows...").

Here is the sequence:"#
        )
    }

    /// The strict response schema declared to the service: a title plus
    /// exactly one indexed segment per input image.
    fn response_schema(image_count: usize) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "title": {
                    "type": "string",
                    "description": "A creative title for the story book"
                },
                "pages": {
                    "type": "array",
                    "description": format!(
                        "The story segments. Must be exactly one segment per image provided ({} in total).",
                        image_count
                    ),
                    "items": {
                        "type": "object",
                        "properties": {
                            "imageIndex": {
                                "type": "integer",
                                "description": "The 0-based index of the image this text belongs to"
                            },
                            "storySegment": {
                                "type": "string",
                                "description": "The narrative text for this page. Approx 2-3 sentences."
                            }
                        },
                        "required": ["imageIndex", "storySegment"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["title", "pages"],
            "additionalProperties": false
        })
    }
}

//=========================================================================================
// Wire Shapes
//=========================================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoryPageRecord {
    image_index: u32,
    story_segment: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoryResponseRecord {
    title: String,
    #[serde(default)]
    pages: Vec<StoryPageRecord>,
}

impl StoryResponseRecord {
    fn to_domain(self) -> StoryResponse {
        StoryResponse {
            title: self.title,
            pages: self
                .pages
                .into_iter()
                .map(|p| StoryPage {
                    image_index: p.image_index,
                    story_segment: p.story_segment,
                })
                .collect(),
        }
    }
}

//=========================================================================================
// `StorySynthesisService` Trait Implementation
//=========================================================================================

#[async_trait]
impl StorySynthesisService for OpenAiStoryAdapter {
    /// Weaves one story from the ordered image sequence: a single request
    /// interleaving the inlined images with their labeled context notes,
    /// answered against the strict schema above. Any transport or parse
    /// failure fails the whole call - no partial story, no retry.
    async fn generate_story(
        &self,
        images: &[StoryImage],
        user: Option<&User>,
    ) -> PortResult<StoryResponse> {
        if images.is_empty() {
            return Err(PortError::Unexpected(
                "Cannot weave a story from an empty sequence".to_string(),
            ));
        }

        // Prepare the prompt parts: the preamble, then each image followed
        // by its labeled context note.
        let mut parts: Vec<ChatCompletionRequestUserMessageContentPart> = Vec::new();
        parts.push(
            ChatCompletionRequestMessageContentPartTextArgs::default()
                .text(Self::preamble(images.len(), user))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        );
        for (i, image) in images.iter().enumerate() {
            parts.push(
                ChatCompletionRequestMessageContentPartImageArgs::default()
                    .image_url(
                        ImageUrlArgs::default()
                            .url(image.data_url())
                            .detail(ImageDetail::Auto)
                            .build()
                            .map_err(|e| PortError::Unexpected(e.to_string()))?,
                    )
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?
                    .into(),
            );
            let note = if image.note.is_empty() {
                EMPTY_NOTE_PLACEHOLDER
            } else {
                image.note.as_str()
            };
            parts.push(
                ChatCompletionRequestMessageContentPartTextArgs::default()
                    .text(format!("[Image {} Context]: {}", i, note))
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?
                    .into(),
            );
        }

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(SYSTEM_INSTRUCTIONS)
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(parts)
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?
                    .into(),
            ])
            .response_format(ResponseFormat::JsonSchema {
                json_schema: ResponseFormatJsonSchema {
                    name: "story_response".to_string(),
                    description: Some(
                        "A titled picture-book story with one segment per image".to_string(),
                    ),
                    schema: Some(Self::response_schema(images.len())),
                    strict: Some(true),
                },
            })
            .temperature(0.7)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let text = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| PortError::Unexpected("No response from the story model".to_string()))?;

        let record: StoryResponseRecord = serde_json::from_str(&text)
            .map_err(|e| PortError::Unexpected(format!("Malformed story response: {}", e)))?;
        Ok(record.to_domain())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use uuid::Uuid;

    fn user(name: &str, age: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: "reader@example.com".to_string(),
            name: name.to_string(),
            age: age.to_string(),
            phone_number: None,
        }
    }

    #[test]
    fn preamble_personalizes_when_the_age_is_known() {
        let u = user("Mira", "8");
        let text = OpenAiStoryAdapter::preamble(3, Some(&u));
        assert!(text.contains("sequence of 3 images"));
        assert!(text.contains("Mira"));
        assert!(text.contains("8 years old"));
    }

    #[test]
    fn preamble_uses_the_default_tone_without_a_user() {
        let text = OpenAiStoryAdapter::preamble(2, None);
        assert!(text.contains(DEFAULT_TONE));

        let anonymous = user("", "");
        let text = OpenAiStoryAdapter::preamble(2, Some(&anonymous));
        assert!(text.contains(DEFAULT_TONE));
    }

    #[test]
    fn response_record_parses_the_declared_schema() {
        let raw = r#"{
            "title": "The Long Journey",
            "pages": [
                {"imageIndex": 0, "storySegment": "Once upon a time..."},
                {"imageIndex": 1, "storySegment": "And then..."}
            ]
        }"#;
        let record: StoryResponseRecord = serde_json::from_str(raw).unwrap();
        let response = record.to_domain();
        assert_eq!(response.title, "The Long Journey");
        assert_eq!(response.pages.len(), 2);
        assert_eq!(response.pages[1].image_index, 1);
    }

    #[test]
    fn data_url_parts_carry_the_mime_type() {
        let image = StoryImage::new(Bytes::from_static(b"fake"), "image/jpeg", "a.jpg");
        assert!(image.data_url().starts_with("data:image/jpeg;base64,"));
    }
}
