//! Testing utilities for docflow workspace
//!
//! Shared test doubles and fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use docflow_gateway::{GenerationError, TextGenerationGateway};
use docflow_mask::{DetectedEntities, EntityRecognizer, MaskingError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub mod fixtures;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub system: Option<String>,
    pub prompt: String,
}

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Echo,
    Fail,
}

#[derive(Debug)]
struct Rule {
    needles: Vec<String>,
    reply: Reply,
}

#[derive(Debug, Default)]
struct Script {
    rules: Vec<Rule>,
    calls: Vec<RecordedCall>,
}

/// Gateway answering from prompt-substring rules
///
/// The first rule whose needles all occur in the prompt answers. Prompts
/// matching no rule fail with a 404 status so missing scripts show up as
/// errors. Clones share rules and the call log.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGateway {
    script: Arc<Mutex<Script>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer prompts containing `needle` with `reply`
    #[must_use]
    pub fn respond_to(self, needle: &str, reply: &str) -> Self {
        self.respond_when(&[needle], reply)
    }

    /// Answer prompts containing every needle with `reply`
    #[must_use]
    pub fn respond_when(self, needles: &[&str], reply: &str) -> Self {
        self.push(needles, Reply::Text(reply.to_string()))
    }

    /// Answer prompts containing `needle` with the prompt itself
    #[must_use]
    pub fn echo_on(self, needle: &str) -> Self {
        self.push(&[needle], Reply::Echo)
    }

    /// Fail prompts containing `needle`
    #[must_use]
    pub fn fail_on(self, needle: &str) -> Self {
        self.push(&[needle], Reply::Fail)
    }

    /// Fail prompts containing every needle
    #[must_use]
    pub fn fail_when(self, needles: &[&str]) -> Self {
        self.push(needles, Reply::Fail)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Number of recorded prompts containing `needle`
    pub fn count_calls(&self, needle: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.prompt.contains(needle))
            .count()
    }

    fn push(self, needles: &[&str], reply: Reply) -> Self {
        self.lock().rules.push(Rule {
            needles: needles.iter().map(|n| (*n).to_string()).collect(),
            reply,
        });
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl TextGenerationGateway for ScriptedGateway {
    async fn generate(
        &self,
        system_instruction: Option<&str>,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        let mut script = self.lock();
        script.calls.push(RecordedCall {
            system: system_instruction.map(str::to_string),
            prompt: prompt.to_string(),
        });
        let reply = script
            .rules
            .iter()
            .find(|rule| rule.needles.iter().all(|n| prompt.contains(n.as_str())))
            .map(|rule| rule.reply.clone());
        match reply {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Echo) => Ok(prompt.to_string()),
            Some(Reply::Fail) => Err(GenerationError::Status {
                provider: "scripted",
                status: 503,
                body: "scripted failure".to_string(),
            }),
            None => Err(GenerationError::Status {
                provider: "scripted",
                status: 404,
                body: "no scripted reply for prompt".to_string(),
            }),
        }
    }
}

/// Recognizer returning fixed entities
#[derive(Debug, Clone, Default)]
pub struct StaticRecognizer {
    entities: DetectedEntities,
    failure: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl StaticRecognizer {
    pub fn new(entities: DetectedEntities) -> Self {
        Self {
            entities,
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_people(mut self, names: &[&str]) -> Self {
        self.entities.people.extend(names.iter().map(|n| (*n).to_string()));
        self
    }

    #[must_use]
    pub fn with_organizations(mut self, names: &[&str]) -> Self {
        self.entities
            .organizations
            .extend(names.iter().map(|n| (*n).to_string()));
        self
    }

    #[must_use]
    pub fn with_locations(mut self, names: &[&str]) -> Self {
        self.entities.locations.extend(names.iter().map(|n| (*n).to_string()));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntityRecognizer for StaticRecognizer {
    async fn detect(&self, _text: &str) -> Result<DetectedEntities, MaskingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(message) => Err(MaskingError::CollaboratorFailed {
                status: "exit status: 1".to_string(),
                message: message.clone(),
            }),
            None => Ok(self.entities.clone()),
        }
    }
}
