//! Mock LLM provider for deterministic testing

use async_trait::async_trait;
use linkedclaims_domain::traits::LlmProvider;
use linkedclaims_domain::ProviderError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Matcher {
    Exact(String),
    Contains(String),
}

impl Matcher {
    fn matches(&self, prompt: &str) -> bool {
        match self {
            Matcher::Exact(p) => p == prompt,
            Matcher::Contains(needle) => prompt.contains(needle.as_str()),
        }
    }
}

#[derive(Debug)]
struct Rule {
    matcher: Matcher,
    // Replies are consumed front to back; the last one repeats.
    script: VecDeque<Result<String, ProviderError>>,
    delay: Option<Duration>,
}

impl Rule {
    fn next(&mut self) -> Option<Result<String, ProviderError>> {
        if self.script.len() > 1 {
            self.script.pop_front()
        } else {
            self.script.front().cloned()
        }
    }
}

/// Mock LLM provider for deterministic testing
///
/// This provider returns pre-configured responses without making any network
/// calls. Responses can be keyed on the exact prompt or on a substring of it,
/// which is handy since real prompts embed the chunk text.
///
/// # Examples
///
/// ```
/// use linkedclaims_llm::MockProvider;
/// use linkedclaims_domain::traits::LlmProvider;
/// use linkedclaims_domain::ProviderError;
///
/// # #[tokio::main]
/// # async fn main() {
/// let mut provider = MockProvider::default();
/// provider.add_response("prompt1", "response1");
/// provider.fail_containing("page 3", ProviderError::Transient("429".into()));
///
/// assert_eq!(provider.generate("prompt1", 64).await.unwrap(), "response1");
/// assert!(provider.generate("text of page 3", 64).await.is_err());
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    model: String,
    default_response: String,
    rules: Arc<Mutex<Vec<Rule>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    call_count: Arc<AtomicUsize>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            model: "mock".to_string(),
            default_response: response.into(),
            rules: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Set the reported model name
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn push_rule(&mut self, matcher: Matcher, script: Vec<Result<String, ProviderError>>) {
        lock(&self.rules).push(Rule {
            matcher,
            script: script.into(),
            delay: None,
        });
    }

    /// Add a specific response for a given prompt
    pub fn add_response(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        self.push_rule(Matcher::Exact(prompt.into()), vec![Ok(response.into())]);
    }

    /// Configure to return an error for a specific prompt
    pub fn add_error(&mut self, prompt: impl Into<String>, error: ProviderError) {
        self.push_rule(Matcher::Exact(prompt.into()), vec![Err(error)]);
    }

    /// Respond to every prompt containing `needle`
    pub fn respond_containing(&mut self, needle: impl Into<String>, response: impl Into<String>) {
        self.push_rule(Matcher::Contains(needle.into()), vec![Ok(response.into())]);
    }

    /// Fail every prompt containing `needle`
    pub fn fail_containing(&mut self, needle: impl Into<String>, error: ProviderError) {
        self.push_rule(Matcher::Contains(needle.into()), vec![Err(error)]);
    }

    /// Play a sequence of outcomes for prompts containing `needle`
    ///
    /// Each call consumes one outcome; the last outcome repeats once the
    /// sequence is exhausted.
    pub fn script_containing(
        &mut self,
        needle: impl Into<String>,
        outcomes: Vec<Result<String, ProviderError>>,
    ) {
        if outcomes.is_empty() {
            return;
        }
        self.push_rule(Matcher::Contains(needle.into()), outcomes);
    }

    /// Delay replies to prompts containing `needle`
    ///
    /// Applies to the most recently added rule for the same needle, or adds a
    /// delayed default response if none exists.
    pub fn delay_containing(&mut self, needle: impl Into<String>, delay: Duration) {
        let needle = needle.into();
        let mut rules = lock(&self.rules);
        let existing = rules.iter_mut().rev().find(
            |r| matches!(&r.matcher, Matcher::Contains(n) if *n == needle),
        );
        match existing {
            Some(rule) => rule.delay = Some(delay),
            None => rules.push(Rule {
                matcher: Matcher::Contains(needle),
                script: VecDeque::from(vec![Ok(self.default_response.clone())]),
                delay: Some(delay),
            }),
        }
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        self.call_count.store(0, Ordering::SeqCst);
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("[]")
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn generate(&self, prompt: &str, _max_tokens: u32) -> Result<String, ProviderError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        lock(&self.prompts).push(prompt.to_string());

        let (outcome, delay) = {
            let mut rules = lock(&self.rules);
            match rules.iter_mut().find(|r| r.matcher.matches(prompt)) {
                Some(rule) => (rule.next(), rule.delay),
                None => (None, None),
            }
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        outcome.unwrap_or_else(|| Ok(self.default_response.clone()))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
