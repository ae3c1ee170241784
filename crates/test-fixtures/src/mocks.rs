//! Deterministic collaborators for tests: embedding gateway, text generator, extractor.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use sift_core::errors::{EmbeddingError, SiftError, SiftResult};
use sift_core::models::{ExtractedEntity, ExtractedRelation, ExtractionResult};
use sift_core::traits::{IEmbeddingGateway, IEntityExtractor, ITextGenerator};

/// Embedding gateway returning pinned vectors for known texts and a
/// bag-of-words hash embedding for everything else.
pub struct MockGateway {
    dims: usize,
    pinned: Mutex<HashMap<String, Vec<f32>>>,
    available: AtomicBool,
    calls: AtomicUsize,
}

impl MockGateway {
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            pinned: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always return `vector` for `text`, in both document and query mode.
    pub fn pin(&self, text: &str, vector: Vec<f32>) {
        self.pinned.lock().unwrap().insert(text.to_string(), vector);
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        if let Some(v) = self.pinned.lock().unwrap().get(text) {
            return v.clone();
        }
        bag_of_words(text, self.dims)
    }
}

impl IEmbeddingGateway for MockGateway {
    fn embed_texts(&self, texts: &[String]) -> SiftResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.is_available() {
            return Err(EmbeddingError::ProviderUnavailable {
                provider: "mock".into(),
            }
            .into());
        }
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }

    fn embed_query(&self, text: &str) -> SiftResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.is_available() {
            return Err(EmbeddingError::ProviderUnavailable {
                provider: "mock".into(),
            }
            .into());
        }
        Ok(self.vector_for(text))
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn model_name(&self) -> &str {
        "mock-embedding"
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

/// Normalized hashed bag of lower-cased words.
pub fn bag_of_words(text: &str, dims: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; dims];
    for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        let hash = blake3::hash(word.to_lowercase().as_bytes());
        let bytes = hash.as_bytes();
        let idx = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize % dims;
        v[idx] += 1.0;
    }
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    v
}

/// Text generator that replays a fixed answer, or fails.
pub struct MockGenerator {
    response: Mutex<Option<String>>,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    pub fn replying(response: impl Into<String>) -> Self {
        Self {
            response: Mutex::new(Some(response.into())),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl ITextGenerator for MockGenerator {
    fn generate(&self, prompt: &str) -> SiftResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.response
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| SiftError::InvalidArgument {
                reason: "mock generator configured to fail".into(),
            })
    }
}

/// Extractor answering from a content → result table; unknown content yields nothing.
#[derive(Default)]
pub struct MockExtractor {
    answers: Mutex<HashMap<String, ExtractionResult>>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register entities `(name, type, relevance)` and relations `(from, to, type)` for `content`.
    pub fn answer(
        &self,
        content: &str,
        entities: &[(&str, &str, f64)],
        relations: &[(&str, &str, &str)],
    ) {
        let result = ExtractionResult {
            entities: entities
                .iter()
                .map(|(name, kind, relevance)| ExtractedEntity {
                    name: name.to_string(),
                    entity_type: kind.to_string(),
                    description: String::new(),
                    relevance: *relevance,
                })
                .collect(),
            relations: relations
                .iter()
                .map(|(from, to, kind)| ExtractedRelation {
                    from: from.to_string(),
                    to: to.to_string(),
                    relation_type: kind.to_string(),
                })
                .collect(),
        };
        self.answers.lock().unwrap().insert(content.to_string(), result);
    }
}

impl IEntityExtractor for MockExtractor {
    fn extract(&self, content: &str) -> SiftResult<ExtractionResult> {
        Ok(self
            .answers
            .lock()
            .unwrap()
            .get(content)
            .cloned()
            .unwrap_or_default())
    }
}
