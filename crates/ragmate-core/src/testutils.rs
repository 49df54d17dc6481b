//! Test utilities for RagMate.
//!
//! Provides a scripted text generator and result fixtures.

use crate::generation::{GenerationError, GenerationOptions, TextGenerator};
use crate::{QueryResult, SourceFile};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Generator answering prompts by substring match.
///
/// Rules are checked in insertion order; the first rule whose marker occurs
/// in the prompt supplies the response. Unmatched prompts fail.
#[derive(Default)]
pub struct MockGenerator {
    rules: Vec<(String, String)>,
    fail: bool,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A generator whose every call fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Answer prompts containing `marker` with `response`.
    pub fn respond_to(mut self, marker: &str, response: &str) -> Self {
        self.rules.push((marker.to_string(), response.to_string()));
        self
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every prompt received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        if self.fail {
            return Err(GenerationError::Request("mock failure".to_string()));
        }
        self.rules
            .iter()
            .find(|(marker, _)| prompt.contains(marker.as_str()))
            .map(|(_, response)| response.clone())
            .ok_or(GenerationError::EmptyResponse)
    }
}

/// Build a result record.
pub fn result(path: &str, content: &str, relevance: f64) -> QueryResult {
    QueryResult {
        file_path: path.to_string(),
        content: content.to_string(),
        relevance,
        dependencies: vec![],
        exports: vec![],
    }
}

/// A small TypeScript codebase with an auth module.
pub fn auth_codebase() -> Vec<SourceFile> {
    vec![
        SourceFile::new(
            "src/auth/login.ts",
            "import { hash } from './crypto';\nimport jwt from 'jsonwebtoken';\n\nexport async function login(user: string, password: string) {\n  return jwt.sign({ user }, hash(password));\n}\n",
        ),
        SourceFile::new(
            "src/auth/crypto.ts",
            "import { createHash } from 'crypto';\n\nexport function hash(value: string) {\n  return createHash('sha256').update(value).digest('hex');\n}\n",
        ),
        SourceFile::new(
            "docs/auth.md",
            "# Authentication\n\nUsers log in with a password and receive a JWT.\n",
        ),
        SourceFile::new(
            "scripts/seed.py",
            "import os\n\ndef seed_users():\n    pass\n",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_generator_routing() {
        let gen = MockGenerator::new()
            .respond_to("alpha", "first")
            .respond_to("beta", "second");

        let opts = GenerationOptions::text();
        assert_eq!(gen.generate("... beta ...", &opts).await.unwrap(), "second");
        assert_eq!(gen.generate("alpha and beta", &opts).await.unwrap(), "first");
        assert!(gen.generate("gamma", &opts).await.is_err());
        assert_eq!(gen.calls(), 3);
        assert_eq!(gen.prompts()[0], "... beta ...");
    }

    #[tokio::test]
    async fn test_failing_generator() {
        let gen = MockGenerator::failing().respond_to("alpha", "never");
        assert!(gen.generate("alpha", &GenerationOptions::json()).await.is_err());
        assert_eq!(gen.calls(), 1);
    }
}
