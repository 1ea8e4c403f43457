//! Mock implementations for testing
//!
//! These mocks enable integration testing of sessions without real I/O.

use super::traits::*;
use super::{SessionManager, SseEvent, SubmitError};
use crate::config::{Config, ServiceStatus};
use crate::providers::{
    AuditReport, ChatReply, ChatRequest, ProviderError, SearchHit, SearchQuery,
};
use crate::state_machine::{Event, MenuOption};
use crate::store::SessionView;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

// ============================================================================
// Scripted responses
// ============================================================================

enum Scripted<T> {
    Reply(Result<T, ProviderError>),
    Panic,
}

/// Queue of canned outcomes shared by the mocks
struct Script<T> {
    queue: Mutex<VecDeque<Scripted<T>>>,
    delay: Option<Duration>,
}

impl<T> Script<T> {
    fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            delay: None,
        }
    }

    fn push(&self, item: Scripted<T>) {
        self.queue.lock().unwrap().push_back(item);
    }

    async fn next(&self, what: &str) -> Result<T, ProviderError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        // Pop before panicking so the lock is not poisoned
        let item = self.queue.lock().unwrap().pop_front();
        match item {
            Some(Scripted::Reply(result)) => result,
            Some(Scripted::Panic) => panic!("scripted {what} panic"),
            None => Err(ProviderError::network(format!("No mock {what} queued"))),
        }
    }
}

// ============================================================================
// Mock Audit Provider
// ============================================================================

pub struct MockAudit {
    script: Script<AuditReport>,
    /// URLs audited, in call order
    pub calls: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl MockAudit {
    pub fn new() -> Self {
        Self {
            script: Script::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Hold every call for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.script.delay = Some(delay);
        self
    }

    pub fn queue_report(&self, report: AuditReport) {
        self.script.push(Scripted::Reply(Ok(report)));
    }

    pub fn queue_error(&self, error: ProviderError) {
        self.script.push(Scripted::Reply(Err(error)));
    }

    pub fn queue_panic(&self) {
        self.script.push(Scripted::Panic);
    }

    pub fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditProvider for MockAudit {
    async fn audit(&self, url: &str) -> Result<AuditReport, ProviderError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.script.next("audit").await
    }
}

// ============================================================================
// Mock Search Provider
// ============================================================================

pub struct MockSearch {
    script: Script<Vec<SearchHit>>,
    pub queries: Mutex<Vec<SearchQuery>>,
}

#[allow(dead_code)]
impl MockSearch {
    pub fn new() -> Self {
        Self {
            script: Script::new(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_hits(&self, hits: Vec<SearchHit>) {
        self.script.push(Scripted::Reply(Ok(hits)));
    }

    pub fn queue_error(&self, error: ProviderError) {
        self.script.push(Scripted::Reply(Err(error)));
    }

    pub fn recorded_queries(&self) -> Vec<SearchQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for MockSearch {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, ProviderError> {
        self.queries.lock().unwrap().push(query.clone());
        self.script.next("search").await
    }
}

// ============================================================================
// Mock Chat Provider
// ============================================================================

pub struct MockChat {
    script: Script<ChatReply>,
    model_id: String,
    /// Record of all requests made
    pub requests: Mutex<Vec<ChatRequest>>,
}

#[allow(dead_code)]
impl MockChat {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            script: Script::new(),
            model_id: model_id.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_text(&self, text: impl Into<String>) {
        self.script.push(Scripted::Reply(Ok(ChatReply {
            text: text.into(),
            ..ChatReply::default()
        })));
    }

    pub fn queue_error(&self, error: ProviderError) {
        self.script.push(Scripted::Reply(Err(error)));
    }

    pub fn recorded_requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatProvider for MockChat {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatReply, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        self.script.next("chat").await
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// Mock Reachability Checker
// ============================================================================

/// Answers from a queue, then falls back to a fixed verdict
pub struct MockReachability {
    verdicts: Mutex<VecDeque<bool>>,
    default: bool,
    pub checked: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl MockReachability {
    pub fn new(default: bool) -> Self {
        Self {
            verdicts: Mutex::new(VecDeque::new()),
            default,
            checked: Mutex::new(Vec::new()),
        }
    }

    pub fn queue(&self, reachable: bool) {
        self.verdicts.lock().unwrap().push_back(reachable);
    }

    pub fn recorded_urls(&self) -> Vec<String> {
        self.checked.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReachabilityChecker for MockReachability {
    async fn is_reachable(&self, url: &str) -> bool {
        self.checked.lock().unwrap().push(url.to_string());
        self.verdicts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.default)
    }
}

// ============================================================================
// Mock Backend Set
// ============================================================================

/// One of each mock, shared with the `Providers` handed to the runtime
#[derive(Clone)]
pub struct MockBackends {
    pub audit: Arc<MockAudit>,
    pub search: Arc<MockSearch>,
    pub chat: Arc<MockChat>,
    pub reachability: Arc<MockReachability>,
}

#[allow(dead_code)]
impl MockBackends {
    pub fn new() -> Self {
        Self {
            audit: Arc::new(MockAudit::new()),
            search: Arc::new(MockSearch::new()),
            chat: Arc::new(MockChat::new("test-model")),
            reachability: Arc::new(MockReachability::new(true)),
        }
    }

    pub fn with_audit(mut self, audit: MockAudit) -> Self {
        self.audit = Arc::new(audit);
        self
    }

    pub fn providers(&self) -> Providers {
        let audit: Arc<dyn AuditProvider> = self.audit.clone();
        let search: Arc<dyn SearchProvider> = self.search.clone();
        let chat: Arc<dyn ChatProvider> = self.chat.clone();
        let reachability: Arc<dyn ReachabilityChecker> = self.reachability.clone();
        Providers::new(audit, search, chat, reachability)
    }
}

impl Default for MockBackends {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration with no credentials and a fixed contact link
pub fn test_config(status: ServiceStatus) -> Config {
    let mut config = Config::from_lookup(|_| None);
    config.status = status;
    config.contact_url = "https://wa.me/0".to_string();
    config
}

// ============================================================================
// Test Session
// ============================================================================

/// A live session driven through the `SessionManager`
pub struct TestSession {
    pub manager: Arc<SessionManager>,
    pub backends: MockBackends,
    pub session_id: String,
    events: broadcast::Receiver<SseEvent>,
}

#[allow(dead_code)]
impl TestSession {
    pub async fn start(backends: MockBackends) -> Self {
        Self::start_with(backends, test_config(ServiceStatus::Online)).await
    }

    pub async fn start_with(backends: MockBackends, config: Config) -> Self {
        let manager = Arc::new(SessionManager::new(backends.providers(), &config));
        let handle = manager.create_session().await;
        let session_id = handle.context.session_id.clone();
        let events = handle.broadcast_tx.subscribe();
        Self {
            manager,
            backends,
            session_id,
            events,
        }
    }

    pub async fn send_text(&self, text: &str) -> Result<(), SubmitError> {
        self.manager
            .submit(
                &self.session_id,
                Event::UserText {
                    text: text.to_string(),
                },
            )
            .await
    }

    pub async fn choose(&self, option: MenuOption) -> Result<(), SubmitError> {
        self.manager
            .submit(&self.session_id, Event::OptionSelected { option })
            .await
    }

    /// Wait until the queued user event has been fully processed
    pub async fn wait_for_idle(&self, timeout: Duration) -> bool {
        let Some(handle) = self.manager.get(&self.session_id).await else {
            return false;
        };
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if !handle.is_busy() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    /// Send text and wait for the reply to settle
    pub async fn say(&self, text: &str) {
        self.send_text(text).await.expect("input rejected");
        assert!(self.wait_for_idle(Duration::from_secs(2)).await, "session stuck");
    }

    /// Select an option and wait for the reply to settle
    pub async fn pick(&self, option: MenuOption) {
        self.choose(option).await.expect("option rejected");
        assert!(self.wait_for_idle(Duration::from_secs(2)).await, "session stuck");
    }

    pub async fn view(&self) -> SessionView {
        self.manager
            .get(&self.session_id)
            .await
            .expect("session exists")
            .view()
    }

    /// Events broadcast since the last drain
    pub fn drain_events(&mut self) -> Vec<SseEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::AuditIssue;
    use crate::state_machine::{replies, TransitionError, WaitingFor};
    use crate::store::{MessageContent, MessageKind, Role};

    const SUBJECT: &str = "https://example.com";

    fn texts(view: &SessionView) -> Vec<String> {
        view.messages
            .iter()
            .filter_map(|m| m.content.as_text().map(str::to_string))
            .collect()
    }

    fn hit(position: u32, link: &str) -> SearchHit {
        SearchHit {
            position,
            title: format!("Result {position}"),
            link: link.to_string(),
            snippet: String::new(),
        }
    }

    fn report_with_issue() -> AuditReport {
        AuditReport {
            overall: 61,
            performance: 45,
            seo: 80,
            best_practices: 70,
            accessibility: 50,
            issues: vec![AuditIssue {
                title: "Largest Contentful Paint".to_string(),
                description: "LCP terlalu lambat".to_string(),
                score: 20,
                display_value: Some("5.1 s".to_string()),
                remediation: vec![],
            }],
        }
    }

    /// A session that has passed the URL step
    async fn session_at_menu(backends: MockBackends) -> TestSession {
        let session = TestSession::start(backends).await;
        session.say("example.com").await;
        session
    }

    #[tokio::test]
    async fn test_mock_chat_queue() {
        let chat = MockChat::new("test-model");
        chat.queue_text("Halo");
        let request = ChatRequest::new(vec![]);

        let reply = chat.complete(&request).await.unwrap();
        assert_eq!(reply.text, "Halo");
        assert_eq!(chat.recorded_requests().len(), 1);

        // Exhausted queue reads as a network failure
        let err = chat.complete(&request).await.unwrap_err();
        assert!(err.kind.is_transport());
    }

    #[tokio::test]
    async fn test_session_starts_with_greeting() {
        let session = TestSession::start(MockBackends::new()).await;
        let view = session.view().await;

        assert_eq!(view.phase, "awaiting_url");
        assert_eq!(texts(&view), vec![replies::GREETING, replies::ASK_URL]);
        assert_eq!(view.messages[1].kind, MessageKind::Input);
        assert!(view.options.is_empty());
        assert!(!view.is_typing);
    }

    #[tokio::test]
    async fn test_url_flow_presents_menu() {
        let session = session_at_menu(MockBackends::new()).await;
        let view = session.view().await;

        assert_eq!(view.phase, "menu");
        assert_eq!(view.subject_url.as_deref(), Some(SUBJECT));
        assert_eq!(session.backends.reachability.recorded_urls(), vec![SUBJECT]);

        let last = view.messages.last().unwrap();
        assert_eq!(last.kind, MessageKind::Options);
        assert_eq!(last.options.len(), 3);
        assert_eq!(view.options.len(), 3);

        // The typed URL is echoed as a user message
        assert!(view
            .messages
            .iter()
            .any(|m| m.role == Role::User && m.content.as_text() == Some("example.com")));
    }

    #[tokio::test]
    async fn test_unreachable_url_asks_again() {
        let backends = MockBackends::new();
        backends.reachability.queue(false);
        let session = TestSession::start(backends).await;

        session.say("tidak-ada.example").await;
        let view = session.view().await;
        assert_eq!(view.phase, "awaiting_url");
        assert!(view.subject_url.is_none());
        assert_eq!(texts(&view).last().map(String::as_str), Some(replies::INVALID_URL));

        // Second attempt succeeds
        session.say("example.com").await;
        assert_eq!(session.view().await.phase, "menu");
    }

    #[tokio::test]
    async fn test_audit_notice_retracted_on_success() {
        let backends = MockBackends::new();
        backends.audit.queue_report(report_with_issue());
        let mut session = session_at_menu(backends).await;
        session.drain_events();

        session.pick(MenuOption::AuditQuality).await;

        let events = session.drain_events();
        let notice_id = events
            .iter()
            .find_map(|e| match e {
                SseEvent::Message { message }
                    if message.content.as_text() == Some(replies::AUDIT_WAIT) =>
                {
                    Some(message.id)
                }
                _ => None,
            })
            .expect("wait notice shown");
        assert!(events
            .iter()
            .any(|e| matches!(e, SseEvent::Retract { id } if *id == notice_id)));

        let view = session.view().await;
        assert!(!texts(&view).contains(&replies::AUDIT_WAIT.to_string()));
        assert!(view
            .messages
            .iter()
            .any(|m| matches!(&m.content, MessageContent::AuditReport { url, .. } if url == SUBJECT)));
        // Issues found: escalation with the contact link
        assert!(view
            .messages
            .iter()
            .any(|m| matches!(&m.content, MessageContent::Contact { href, .. } if href == "https://wa.me/0")));
        assert_eq!(view.phase, "menu");
        assert_eq!(session.backends.audit.recorded_calls(), vec![SUBJECT]);
    }

    #[tokio::test]
    async fn test_audit_without_issues_skips_escalation() {
        let backends = MockBackends::new();
        backends.audit.queue_report(AuditReport::default());
        let session = session_at_menu(backends).await;

        session.pick(MenuOption::AuditQuality).await;

        let view = session.view().await;
        assert!(!view
            .messages
            .iter()
            .any(|m| matches!(m.content, MessageContent::Contact { .. })));
        assert_eq!(texts(&view).last().map(String::as_str), Some(replies::MENU_AGAIN));
    }

    #[tokio::test]
    async fn test_audit_notice_retracted_on_failure() {
        let backends = MockBackends::new();
        backends
            .audit
            .queue_error(ProviderError::server_error("HTTP 500"));
        let session = session_at_menu(backends).await;

        session.pick(MenuOption::AuditQuality).await;

        let view = session.view().await;
        let texts = texts(&view);
        assert!(!texts.contains(&replies::AUDIT_WAIT.to_string()));
        assert_eq!(texts.last().map(String::as_str), Some(replies::APOLOGY));
        assert_eq!(view.phase, "menu");
    }

    #[tokio::test]
    async fn test_network_failure_uses_network_apology() {
        let backends = MockBackends::new();
        backends.audit.queue_error(ProviderError::network("timeout"));
        let session = session_at_menu(backends).await;

        session.pick(MenuOption::AuditQuality).await;

        let view = session.view().await;
        assert_eq!(
            texts(&view).last().map(String::as_str),
            Some(replies::APOLOGY_NETWORK)
        );
    }

    #[tokio::test]
    async fn test_provider_panic_is_a_failure() {
        let backends = MockBackends::new();
        backends.audit.queue_panic();
        backends.audit.queue_report(AuditReport::default());
        let session = session_at_menu(backends).await;

        session.pick(MenuOption::AuditQuality).await;

        let view = session.view().await;
        let texts = texts(&view);
        assert!(!texts.contains(&replies::AUDIT_WAIT.to_string()));
        assert_eq!(texts.last().map(String::as_str), Some(replies::APOLOGY));
        assert_eq!(view.phase, "menu");

        // Runtime survived the panic
        session.pick(MenuOption::AuditQuality).await;
        let view = session.view().await;
        assert!(view
            .messages
            .iter()
            .any(|m| matches!(m.content, MessageContent::AuditReport { .. })));
    }

    #[tokio::test]
    async fn test_seo_found_on_first_page() {
        let backends = MockBackends::new();
        backends.search.queue_hits(vec![
            hit(1, "https://other.com"),
            hit(2, "https://www.example.com/produk"),
        ]);
        let session = session_at_menu(backends).await;

        session.pick(MenuOption::SeoPerformance).await;
        assert_eq!(session.view().await.waiting_for, WaitingFor::SeoKeyword);

        session.say("sepatu lari").await;

        let view = session.view().await;
        assert!(texts(&view)
            .iter()
            .any(|t| t.contains("posisi ke-2") && t.contains("sepatu lari")));
        assert_eq!(view.phase, "menu");
        assert_eq!(
            session.backends.search.recorded_queries(),
            vec![SearchQuery::new("sepatu lari", 1)]
        );
    }

    #[tokio::test]
    async fn test_seo_not_found_offers_next_page_then_escalates() {
        let backends = MockBackends::new();
        backends.search.queue_hits(vec![hit(1, "https://other.com")]);
        backends.search.queue_hits(vec![hit(11, "https://another.com")]);
        let session = session_at_menu(backends).await;

        session.pick(MenuOption::SeoPerformance).await;
        session.say("sepatu lari").await;

        let view = session.view().await;
        assert_eq!(view.phase, "awaiting_next_page");
        assert_eq!(view.options.len(), 1);
        assert_eq!(view.options[0].key, MenuOption::NextPage);
        assert_eq!(
            texts(&view).last().map(String::as_str),
            Some(replies::NOT_FOUND_FIRST_PAGE)
        );

        session.pick(MenuOption::NextPage).await;

        let view = session.view().await;
        assert_eq!(view.phase, "menu");
        assert!(texts(&view).contains(&replies::NOT_FOUND.to_string()));
        assert!(texts(&view).contains(&replies::SEARCH_ESCALATION.to_string()));
        assert!(view
            .messages
            .iter()
            .any(|m| matches!(m.content, MessageContent::Contact { .. })));
        assert_eq!(
            session.backends.search.recorded_queries(),
            vec![
                SearchQuery::new("sepatu lari", 1),
                SearchQuery::new("sepatu lari", 2)
            ]
        );

        // Only one extra page is offered
        assert_eq!(
            session.choose(MenuOption::NextPage).await,
            Err(SubmitError::Rejected(TransitionError::OptionNotOffered(
                MenuOption::NextPage
            )))
        );
    }

    #[tokio::test]
    async fn test_brand_query_uses_generative_backend() {
        let backends = MockBackends::new();
        backends.chat.queue_text("**Brand A**\nPopuler.");
        let session = session_at_menu(backends).await;

        session.pick(MenuOption::BrandAiSearch).await;
        assert_eq!(session.view().await.phase, "awaiting_brand_query");

        session.say("sepatu lari terbaik").await;

        let view = session.view().await;
        let requests = session.backends.chat.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].turns[1].content.contains("sepatu lari terbaik"));
        assert!(requests[0].turns[1].content.contains(SUBJECT));
        assert!(view
            .messages
            .iter()
            .any(|m| m.kind == MessageKind::Result
                && m.content.as_text() == Some("**Brand A**\nPopuler.")));
        assert_eq!(view.phase, "menu");
    }

    #[tokio::test]
    async fn test_free_text_trigger_selects_option() {
        let backends = MockBackends::new();
        backends.audit.queue_report(AuditReport::default());
        let session = session_at_menu(backends).await;

        session.say("tolong audit website saya").await;

        assert_eq!(session.backends.audit.recorded_calls(), vec![SUBJECT]);
        assert!(session.backends.chat.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_refusal_after_two_misses() {
        let backends = MockBackends::new();
        backends.chat.queue_text("Maaf, kami tidak bisa memesan pizza.");
        backends.chat.queue_text("Kami juga tidak bisa memesan tiket.");
        let session = session_at_menu(backends).await;

        session.say("pesan pizza").await;
        session.say("pesan tiket").await;
        assert_eq!(session.backends.chat.recorded_requests().len(), 2);

        session.say("pesan taksi").await;

        // Third miss is refused without consulting the generative backend
        assert_eq!(session.backends.chat.recorded_requests().len(), 2);
        let view = session.view().await;
        let texts = texts(&view);
        assert!(texts.contains(&replies::REFUSAL.to_string()));
        assert_eq!(texts.last().map(String::as_str), Some(replies::MENU_AGAIN));
        assert_eq!(view.phase, "menu");
    }

    #[tokio::test]
    async fn test_greeting_in_menu_is_not_a_miss() {
        let backends = MockBackends::new();
        let session = session_at_menu(backends).await;

        session.say("halo").await;

        let view = session.view().await;
        assert_eq!(texts(&view).last().map(String::as_str), Some(replies::MENU_GREETING));
        assert!(session.backends.chat.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_submit_while_busy_is_rejected() {
        let backends =
            MockBackends::new().with_audit(MockAudit::new().with_delay(Duration::from_millis(200)));
        backends.audit.queue_report(AuditReport::default());
        let session = session_at_menu(backends).await;

        session.choose(MenuOption::AuditQuality).await.unwrap();
        assert_eq!(session.send_text("halo").await, Err(SubmitError::Busy));
        assert_eq!(
            session.choose(MenuOption::SeoPerformance).await,
            Err(SubmitError::Busy)
        );

        assert!(session.wait_for_idle(Duration::from_secs(2)).await);
        assert_eq!(session.backends.audit.recorded_calls().len(), 1);
        session.say("halo").await;
    }

    #[tokio::test]
    async fn test_invalid_input_rejected_synchronously() {
        let session = TestSession::start(MockBackends::new()).await;

        assert_eq!(
            session.choose(MenuOption::AuditQuality).await,
            Err(SubmitError::Rejected(TransitionError::OptionNotOffered(
                MenuOption::AuditQuality
            )))
        );
        assert_eq!(
            session.send_text("   ").await,
            Err(SubmitError::Rejected(TransitionError::EmptyInput))
        );

        // Rejections leave the session idle and unchanged
        let handle = session.manager.get(&session.session_id).await.unwrap();
        assert!(!handle.is_busy());
        assert_eq!(session.view().await.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_offline_session_rejects_input() {
        let session =
            TestSession::start_with(MockBackends::new(), test_config(ServiceStatus::Offline)).await;
        let view = session.view().await;

        assert_eq!(view.phase, "offline");
        assert_eq!(texts(&view), vec![replies::OFFLINE, replies::OFFLINE_APOLOGY]);
        assert_eq!(
            session.send_text("example.com").await,
            Err(SubmitError::Rejected(TransitionError::Offline))
        );
        assert!(session.backends.reachability.recorded_urls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let session = TestSession::start(MockBackends::new()).await;
        let err = session
            .manager
            .submit("missing", Event::UserText { text: "x".to_string() })
            .await;
        assert_eq!(err, Err(SubmitError::NotFound));
        assert!(session.manager.subscribe("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_close_and_idle_eviction() {
        let backends = MockBackends::new();
        let mut config = test_config(ServiceStatus::Online);
        config.session_idle_ttl = Duration::ZERO;
        let manager = Arc::new(SessionManager::new(backends.providers(), &config));

        let first = manager.create_session().await;
        let second = manager.create_session().await;
        assert_eq!(manager.session_count().await, 2);

        assert!(manager.close(&first.context.session_id).await);
        assert!(!manager.close(&first.context.session_id).await);

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(manager.evict_idle().await, 1);
        assert!(manager.get(&second.context.session_id).await.is_none());
    }

    #[tokio::test]
    async fn test_fresh_sessions_survive_sweep() {
        let session = TestSession::start(MockBackends::new()).await;
        assert_eq!(session.manager.evict_idle().await, 0);
        assert_eq!(session.manager.session_count().await, 1);
    }
}
