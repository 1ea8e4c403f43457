//! Property-based tests for the state machine
//!
//! A driver feeds random user steps and backend outcomes through `transition`
//! and checks the dialogue invariants after every step.

use super::state::*;
use super::transition::*;
use super::*;
use crate::providers::{AuditIssue, AuditReport, ChatReply, ProviderError, ProviderErrorKind, SearchHit};
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

const SUBJECT: &str = "https://example.com";

fn test_context() -> ConvContext {
    ConvContext::new("test-session", true, "https://wa.me/0")
}

#[derive(Debug, Clone)]
enum Step {
    Text(String),
    Choose(MenuOption),
    /// Resolve the pending call; the flag picks reachable / found / issues
    Succeed(bool),
    Fail(ProviderErrorKind),
}

fn outcome_event(call: CallKind, flag: bool) -> Event {
    match call {
        CallKind::Reachability => Event::ReachabilityChecked {
            url: SUBJECT.to_string(),
            reachable: flag,
        },
        CallKind::Audit => Event::AuditCompleted {
            report: AuditReport {
                issues: if flag {
                    vec![AuditIssue {
                        title: "Slow".to_string(),
                        description: String::new(),
                        score: 50,
                        display_value: None,
                        remediation: vec![],
                    }]
                } else {
                    vec![]
                },
                ..AuditReport::default()
            },
        },
        CallKind::Search => Event::SearchCompleted {
            hits: vec![SearchHit {
                position: 3,
                title: "hit".to_string(),
                link: if flag {
                    "https://www.example.com/x".to_string()
                } else {
                    "https://other.com".to_string()
                },
                snippet: String::new(),
            }],
        },
        CallKind::Brand | CallKind::Fallback => Event::ReplyGenerated {
            reply: ChatReply {
                text: "jawaban".to_string(),
                ..ChatReply::default()
            },
        },
    }
}

fn pending_call(state: &ConvState) -> Option<CallKind> {
    match &state.phase {
        Phase::Requesting { call, .. } => Some(*call),
        _ => None,
    }
}

fn requests(effects: &[Effect]) -> Vec<&ProviderCall> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Request { call, .. } => Some(call),
            Effect::Append(_) => None,
        })
        .collect()
}

fn started() -> ConvState {
    transition(&ConvState::default(), &test_context(), Event::SessionStarted)
        .unwrap()
        .new_state
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("halo".to_string()),
        Just("selamat pagi".to_string()),
        Just("audit dong".to_string()),
        Just("cek ranking".to_string()),
        Just("brand saya".to_string()),
        Just("example.com".to_string()),
        Just("   ".to_string()),
        "[a-z]{1,8}( [a-z]{1,8}){0,2}",
    ]
}

fn arb_option() -> impl Strategy<Value = MenuOption> {
    prop_oneof![
        Just(MenuOption::AuditQuality),
        Just(MenuOption::SeoPerformance),
        Just(MenuOption::BrandAiSearch),
        Just(MenuOption::NextPage),
    ]
}

fn arb_error_kind() -> impl Strategy<Value = ProviderErrorKind> {
    prop_oneof![
        Just(ProviderErrorKind::Network),
        Just(ProviderErrorKind::RateLimit),
        Just(ProviderErrorKind::ServerError),
        Just(ProviderErrorKind::Auth),
        Just(ProviderErrorKind::Decode),
    ]
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => arb_text().prop_map(Step::Text),
        2 => arb_option().prop_map(Step::Choose),
        3 => any::<bool>().prop_map(Step::Succeed),
        1 => arb_error_kind().prop_map(Step::Fail),
    ]
}

fn to_event(state: &ConvState, step: &Step) -> Event {
    match (step, pending_call(state)) {
        (Step::Text(text), _) => Event::UserText { text: text.clone() },
        (Step::Choose(option), _) => Event::OptionSelected { option: *option },
        (Step::Succeed(flag), Some(call)) => outcome_event(call, *flag),
        (Step::Succeed(_), None) => Event::AuditCompleted {
            report: AuditReport::default(),
        },
        (Step::Fail(kind), _) => Event::ProviderFailed {
            error: ProviderError::new(*kind, "forced"),
        },
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Per-step invariants across random dialogues
    #[test]
    fn prop_dialogue_invariants(steps in proptest::collection::vec(arb_step(), 0..40)) {
        let ctx = test_context();
        let mut state = started();

        for step in steps {
            let event = to_event(&state, &step);
            let was_user_text = matches!(event, Event::UserText { .. });
            let was_busy = state.is_busy();

            match transition(&state, &ctx, event) {
                Ok(result) => {
                    let new = &result.new_state;
                    let calls = requests(&result.effects);

                    // At most one backend call, and only when entering a request
                    prop_assert!(calls.len() <= 1);
                    prop_assert_eq!(calls.len() == 1, new.is_busy());

                    // Subject URL is set once and never changes
                    if let Some(url) = &state.subject_url {
                        prop_assert_eq!(new.subject_url.as_ref(), Some(url));
                    }

                    // errorCount only grows, by one, on the fallback path
                    prop_assert!(new.error_count >= state.error_count);
                    if new.error_count > state.error_count {
                        prop_assert_eq!(new.error_count, state.error_count + 1);
                        prop_assert!(was_user_text);
                        prop_assert_eq!(pending_call(new), Some(CallKind::Fallback));
                    }

                    // Nothing is expected while a call is in flight
                    if new.is_busy() {
                        prop_assert_eq!(new.waiting_for(), WaitingFor::None);
                    }

                    // A settled call never leaves the session busy
                    if was_busy {
                        prop_assert!(!new.is_busy());
                    }

                    state = result.new_state;
                }
                Err(TransitionError::Busy) => prop_assert!(was_busy),
                Err(_) => {}
            }
        }
    }

    // Without a subject URL, text never selects an option
    #[test]
    fn prop_text_before_subject_is_url_candidate(text in "[a-zA-Z .]{1,30}") {
        prop_assume!(!text.trim().is_empty());
        let state = started();
        let result = transition(&state, &test_context(), Event::UserText { text }).unwrap();
        prop_assert_eq!(pending_call(&result.new_state), Some(CallKind::Reachability));
        prop_assert!(result.new_state.subject_url.is_none());
    }

    // At the miss threshold the generative fallback is never consulted
    #[test]
    fn prop_refusal_after_threshold(extra in 0u32..5, word in "[b-d]{3,8}") {
        let state = ConvState {
            phase: Phase::Menu,
            subject_url: Some(SUBJECT.to_string()),
            error_count: MISS_THRESHOLD + extra,
            ..ConvState::default()
        };
        let result = transition(&state, &test_context(), Event::UserText { text: word }).unwrap();
        prop_assert!(requests(&result.effects).is_empty());
        prop_assert_eq!(result.new_state.error_count, state.error_count);
    }

    // Provider failures return to the phase the request started from
    #[test]
    fn prop_failure_reverts(kind in arb_error_kind(), resume_idx in 0usize..4) {
        let resume = [
            Phase::Menu,
            Phase::AwaitingSeoKeyword,
            Phase::AwaitingBrandQuery,
            Phase::AwaitingNextPage,
        ][resume_idx].clone();
        let state = ConvState {
            phase: Phase::requesting(CallKind::Search, resume.clone()),
            subject_url: Some(SUBJECT.to_string()),
            error_count: 1,
            ..ConvState::default()
        };
        let event = Event::ProviderFailed { error: ProviderError::new(kind, "x") };
        let result = transition(&state, &test_context(), event).unwrap();
        prop_assert_eq!(result.new_state.phase, resume);
        prop_assert_eq!(result.new_state.error_count, 1);
        prop_assert_eq!(result.effects.len(), 1);
    }
}
