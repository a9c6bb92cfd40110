// TestDependencies - mock implementations for testing
//
// Provides mock services that can be injected into ServerDeps for tests.
// Every mock records its calls so tests can assert on what was (not) invoked.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::{
    BaseAI, BaseEmbeddingService, BaseGeocoder, BaseSearchStore, BaseUsageStore, ChatPrompt,
    Embedding, ServerDeps,
};
use crate::common::{Coordinates, NeedId, ProviderId, SearchSessionId};
use crate::config::SearchSettings;
use crate::domains::crisis::CrisisKeyword;
use crate::domains::needs::NeedMatch;
use crate::domains::providers::{HostProfile, ProviderWithRelations};
use crate::domains::search::{NewSearchSession, SlidingWindowLimiter, METERS_PER_MILE};

// =============================================================================
// Mock AI (chat completion)
// =============================================================================

pub struct MockAI {
    responses: Arc<Mutex<Vec<Result<String, String>>>>,
    calls: Arc<Mutex<Vec<ChatPrompt>>>,
}

impl MockAI {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a text response to the queue
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push(Ok(response.into()));
        self
    }

    /// Queue a failure
    pub fn with_error(self, message: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push(Err(message.into()));
        self
    }

    /// Get all prompts that were sent to the AI
    pub fn calls(&self) -> Vec<ChatPrompt> {
        self.calls.lock().unwrap().clone()
    }

    /// Get the last prompt sent to the AI
    pub fn last_prompt(&self) -> Option<ChatPrompt> {
        self.calls.lock().unwrap().last().cloned()
    }

    /// Check if a user prompt containing the given text was sent
    pub fn was_called_with(&self, text: &str) -> bool {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .any(|p| p.user.contains(text))
    }

    /// Get the number of times the AI was called
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockAI {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseAI for MockAI {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String> {
        // Record the call
        self.calls.lock().unwrap().push(prompt.clone());

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Ok("Mock AI response".to_string());
        }
        responses.remove(0).map_err(|e| anyhow!(e))
    }
}

// =============================================================================
// Mock Embedding Service
// =============================================================================

pub struct MockEmbeddingService {
    // Returns a fixed embedding vector for all inputs
    fixed_embedding: Vec<f32>,
    total_tokens: i64,
    fail: bool,
    // Track all texts that embeddings were generated for
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockEmbeddingService {
    pub fn new() -> Self {
        // Return a simple 1536-dimensional vector for testing
        Self {
            fixed_embedding: vec![0.1; 1536],
            total_tokens: 8,
            fail: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.fixed_embedding = embedding;
        self
    }

    pub fn with_total_tokens(mut self, total_tokens: i64) -> Self {
        self.total_tokens = total_tokens;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Get all texts that embeddings were generated for
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockEmbeddingService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseEmbeddingService for MockEmbeddingService {
    async fn generate(&self, text: &str) -> Result<Embedding> {
        self.calls.lock().unwrap().push(text.to_string());

        if self.fail {
            return Err(anyhow!("mock embedding failure"));
        }

        Ok(Embedding {
            vector: self.fixed_embedding.clone(),
            total_tokens: self.total_tokens,
        })
    }

    fn model_name(&self) -> &str {
        "mock-embedding"
    }
}

// =============================================================================
// Mock Geocoder
// =============================================================================

pub struct MockGeocoder {
    known: HashMap<String, Coordinates>,
    fail: bool,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self {
            known: HashMap::new(),
            fail: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_postal_code(mut self, postal_code: &str, coordinates: Coordinates) -> Self {
        self.known.insert(postal_code.to_string(), coordinates);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseGeocoder for MockGeocoder {
    async fn geocode_postal_code(&self, postal_code: &str) -> Result<Option<Coordinates>> {
        self.calls.lock().unwrap().push(postal_code.to_string());

        if self.fail {
            return Err(anyhow!("mock geocoder failure"));
        }
        Ok(self.known.get(postal_code).copied())
    }
}

// =============================================================================
// Mock Search Store
// =============================================================================

/// Arguments captured from a provider fetch
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderFetchArgs {
    pub need_ids: Vec<NeedId>,
    pub within: Option<Vec<ProviderId>>,
    pub limit: i64,
}

#[derive(Default)]
struct StoreCalls {
    host_lookups: Vec<ProviderId>,
    excluded_term_lookups: Vec<ProviderId>,
    match_needs: usize,
    nearby_radii_miles: Vec<u32>,
    provider_fetches: Vec<ProviderFetchArgs>,
    crisis_lookups: usize,
}

pub struct MockSearchStore {
    hosts: HashMap<ProviderId, HostProfile>,
    excluded_terms: HashMap<ProviderId, Vec<String>>,
    need_matches: Vec<NeedMatch>,
    nearby: HashMap<u32, Vec<ProviderId>>,
    failing_radii: HashSet<u32>,
    providers: Vec<ProviderWithRelations>,
    crisis_keywords: Vec<CrisisKeyword>,
    fail_match_needs: bool,
    fail_provider_fetch: bool,
    fail_crisis: bool,
    calls: Arc<Mutex<StoreCalls>>,
}

impl MockSearchStore {
    pub fn new() -> Self {
        Self {
            hosts: HashMap::new(),
            excluded_terms: HashMap::new(),
            need_matches: Vec::new(),
            nearby: HashMap::new(),
            failing_radii: HashSet::new(),
            providers: Vec::new(),
            crisis_keywords: Vec::new(),
            fail_match_needs: false,
            fail_provider_fetch: false,
            fail_crisis: false,
            calls: Arc::new(Mutex::new(StoreCalls::default())),
        }
    }

    pub fn with_host(mut self, host: HostProfile) -> Self {
        self.hosts.insert(host.id, host);
        self
    }

    pub fn with_excluded_terms(mut self, host_id: ProviderId, terms: &[&str]) -> Self {
        self.excluded_terms
            .insert(host_id, terms.iter().map(|t| t.to_lowercase()).collect());
        self
    }

    /// Returned as-is from every similarity search
    pub fn with_need_matches(mut self, matches: Vec<NeedMatch>) -> Self {
        self.need_matches = matches;
        self
    }

    /// Provider ids found within `miles` of any point
    pub fn with_nearby(mut self, miles: u32, ids: Vec<ProviderId>) -> Self {
        self.nearby.insert(miles, ids);
        self
    }

    pub fn with_failing_radius(mut self, miles: u32) -> Self {
        self.failing_radii.insert(miles);
        self
    }

    pub fn with_provider(mut self, provider: ProviderWithRelations) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn with_crisis_keyword(mut self, keyword: CrisisKeyword) -> Self {
        self.crisis_keywords.push(keyword);
        self
    }

    pub fn failing_match_needs(mut self) -> Self {
        self.fail_match_needs = true;
        self
    }

    pub fn failing_provider_fetch(mut self) -> Self {
        self.fail_provider_fetch = true;
        self
    }

    pub fn failing_crisis_lookup(mut self) -> Self {
        self.fail_crisis = true;
        self
    }

    pub fn host_lookups(&self) -> Vec<ProviderId> {
        self.calls.lock().unwrap().host_lookups.clone()
    }

    pub fn excluded_term_lookups(&self) -> Vec<ProviderId> {
        self.calls.lock().unwrap().excluded_term_lookups.clone()
    }

    pub fn match_needs_calls(&self) -> usize {
        self.calls.lock().unwrap().match_needs
    }

    /// Radii (in whole miles) of every nearby query, in call order
    pub fn nearby_calls(&self) -> Vec<u32> {
        self.calls.lock().unwrap().nearby_radii_miles.clone()
    }

    pub fn provider_fetches(&self) -> Vec<ProviderFetchArgs> {
        self.calls.lock().unwrap().provider_fetches.clone()
    }

    pub fn crisis_lookups(&self) -> usize {
        self.calls.lock().unwrap().crisis_lookups
    }
}

impl Default for MockSearchStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseSearchStore for MockSearchStore {
    async fn find_host(&self, id: ProviderId) -> Result<Option<HostProfile>> {
        self.calls.lock().unwrap().host_lookups.push(id);
        Ok(self.hosts.get(&id).cloned())
    }

    async fn host_excluded_terms(&self, id: ProviderId) -> Result<Vec<String>> {
        self.calls.lock().unwrap().excluded_term_lookups.push(id);
        Ok(self.excluded_terms.get(&id).cloned().unwrap_or_default())
    }

    async fn match_needs(
        &self,
        _embedding: &[f32],
        _threshold: f64,
        _limit: i64,
    ) -> Result<Vec<NeedMatch>> {
        self.calls.lock().unwrap().match_needs += 1;

        if self.fail_match_needs {
            return Err(anyhow!("mock need match failure"));
        }
        Ok(self.need_matches.clone())
    }

    async fn provider_ids_within(
        &self,
        _center: Coordinates,
        radius_meters: f64,
    ) -> Result<Vec<ProviderId>> {
        let miles = (radius_meters / METERS_PER_MILE).round() as u32;
        self.calls.lock().unwrap().nearby_radii_miles.push(miles);

        if self.failing_radii.contains(&miles) {
            return Err(anyhow!("mock nearby failure at {} miles", miles));
        }
        Ok(self.nearby.get(&miles).cloned().unwrap_or_default())
    }

    async fn find_providers_for_needs(
        &self,
        need_ids: &[NeedId],
        within: Option<&[ProviderId]>,
        limit: i64,
    ) -> Result<Vec<ProviderWithRelations>> {
        self.calls
            .lock()
            .unwrap()
            .provider_fetches
            .push(ProviderFetchArgs {
                need_ids: need_ids.to_vec(),
                within: within.map(<[ProviderId]>::to_vec),
                limit,
            });

        if self.fail_provider_fetch {
            return Err(anyhow!("mock provider fetch failure"));
        }

        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .providers
            .iter()
            .filter(|p| p.provider.provider_status == "active")
            .filter(|p| p.needs.iter().any(|n| need_ids.contains(&n.id)))
            .filter(|p| within.map_or(true, |ids| ids.contains(&p.provider.id)))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn active_crisis_keywords(&self) -> Result<Vec<CrisisKeyword>> {
        self.calls.lock().unwrap().crisis_lookups += 1;

        if self.fail_crisis {
            return Err(anyhow!("mock crisis keyword failure"));
        }
        Ok(self.crisis_keywords.clone())
    }
}

// =============================================================================
// Mock Usage Store
// =============================================================================

pub struct MockUsageStore {
    fail: bool,
    sessions: Arc<Mutex<Vec<(SearchSessionId, NewSearchSession)>>>,
    session_increments: Arc<Mutex<Vec<(SearchSessionId, i64)>>>,
    host_increments: Arc<Mutex<Vec<(ProviderId, i64)>>>,
}

impl MockUsageStore {
    pub fn new() -> Self {
        Self {
            fail: false,
            sessions: Arc::new(Mutex::new(Vec::new())),
            session_increments: Arc::new(Mutex::new(Vec::new())),
            host_increments: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every write fails
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn sessions(&self) -> Vec<(SearchSessionId, NewSearchSession)> {
        self.sessions.lock().unwrap().clone()
    }

    pub fn session_increments(&self) -> Vec<(SearchSessionId, i64)> {
        self.session_increments.lock().unwrap().clone()
    }

    pub fn host_increments(&self) -> Vec<(ProviderId, i64)> {
        self.host_increments.lock().unwrap().clone()
    }
}

impl Default for MockUsageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseUsageStore for MockUsageStore {
    async fn create_session(&self, session: &NewSearchSession) -> Result<SearchSessionId> {
        if self.fail {
            return Err(anyhow!("mock session insert failure"));
        }

        let id = SearchSessionId::new();
        self.sessions.lock().unwrap().push((id, session.clone()));
        Ok(id)
    }

    async fn increment_session_usage(&self, id: SearchSessionId, tokens: i64) -> Result<()> {
        if self.fail {
            return Err(anyhow!("mock session increment failure"));
        }

        self.session_increments.lock().unwrap().push((id, tokens));
        Ok(())
    }

    async fn increment_host_usage(&self, id: ProviderId, tokens: i64) -> Result<()> {
        if self.fail {
            return Err(anyhow!("mock host increment failure"));
        }

        self.host_increments.lock().unwrap().push((id, tokens));
        Ok(())
    }
}

// =============================================================================
// TestDependencies - Builder for test dependencies
// =============================================================================

#[derive(Clone)]
pub struct TestDependencies {
    pub store: Arc<MockSearchStore>,
    pub usage: Arc<MockUsageStore>,
    pub embedding_service: Arc<MockEmbeddingService>,
    pub ai: Arc<MockAI>,
    pub geocoder: Arc<MockGeocoder>,
    pub rate_limiter: Arc<SlidingWindowLimiter>,
    pub settings: SearchSettings,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MockSearchStore::new()),
            usage: Arc::new(MockUsageStore::new()),
            embedding_service: Arc::new(MockEmbeddingService::new()),
            ai: Arc::new(MockAI::new()),
            geocoder: Arc::new(MockGeocoder::new()),
            rate_limiter: Arc::new(SlidingWindowLimiter::per_minute()),
            settings: SearchSettings::default(),
        }
    }

    pub fn mock_store(mut self, store: MockSearchStore) -> Self {
        self.store = Arc::new(store);
        self
    }

    pub fn mock_usage(mut self, usage: MockUsageStore) -> Self {
        self.usage = Arc::new(usage);
        self
    }

    pub fn mock_embeddings(mut self, embedding_service: MockEmbeddingService) -> Self {
        self.embedding_service = Arc::new(embedding_service);
        self
    }

    pub fn mock_ai(mut self, ai: MockAI) -> Self {
        self.ai = Arc::new(ai);
        self
    }

    pub fn mock_geocoder(mut self, geocoder: MockGeocoder) -> Self {
        self.geocoder = Arc::new(geocoder);
        self
    }

    pub fn settings(mut self, settings: SearchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Build ServerDeps sharing these mocks, so assertions see every call.
    pub fn to_server_deps(&self) -> ServerDeps {
        ServerDeps::new(
            self.store.clone(),
            self.usage.clone(),
            self.embedding_service.clone(),
            self.ai.clone(),
            self.geocoder.clone(),
            self.settings.clone(),
        )
        .with_rate_limiter(self.rate_limiter.clone())
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
