//! Pure state transition function

use super::classify::{classify, Classification};
use super::effect::ProviderCall;
use super::replies;
use super::state::{CallKind, MenuOption, Phase, SearchContext};
use super::{ConvContext, ConvState, Effect, Event};
use crate::providers::{AuditReport, ChatReply, ProviderError, SearchHit};
use crate::store::OutboundMessage;
use thiserror::Error;

/// Misses after which the generative fallback is no longer consulted
pub const MISS_THRESHOLD: u32 = 2;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    fn append(self, message: OutboundMessage) -> Self {
        self.with_effect(Effect::append(message))
    }

    fn append_all(self, messages: impl IntoIterator<Item = OutboundMessage>) -> Self {
        self.with_effects(messages.into_iter().map(Effect::append))
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Assistant is busy, wait for the current request to finish")]
    Busy,
    #[error("Service is offline")]
    Offline,
    #[error("Input is empty")]
    EmptyInput,
    #[error("Option '{}' is not offered right now", .0.key())]
    OptionNotOffered(MenuOption),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Given the same inputs this always produces the same outputs, with no I/O.
/// Backend calls are returned as effects; their outcome comes back as a new
/// event.
pub fn transition(
    state: &ConvState,
    context: &ConvContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (&state.phase, event) {
        // ============================================================
        // Session start
        // ============================================================
        (Phase::Starting, Event::SessionStarted) if context.online => {
            Ok(TransitionResult::new(state.with_phase(Phase::AwaitingUrl))
                .append(OutboundMessage::text(replies::GREETING))
                .append(OutboundMessage::input_prompt(replies::ASK_URL)))
        }

        (Phase::Starting, Event::SessionStarted) => {
            Ok(TransitionResult::new(state.with_phase(Phase::Offline))
                .append(OutboundMessage::text(replies::OFFLINE))
                .append(OutboundMessage::text(replies::OFFLINE_APOLOGY)))
        }

        // ============================================================
        // Input rejection
        // ============================================================
        (Phase::Offline, event) if event.is_user_input() => Err(TransitionError::Offline),

        (Phase::Requesting { .. }, event) if event.is_user_input() => Err(TransitionError::Busy),

        (_, Event::UserText { text }) if text.trim().is_empty() => Err(TransitionError::EmptyInput),

        (_, Event::OptionSelected { option }) if !state.offered_options().contains(&option) => {
            Err(TransitionError::OptionNotOffered(option))
        }

        // ============================================================
        // Free text
        // ============================================================

        // Before a subject URL exists every text is a URL candidate
        (Phase::AwaitingUrl, Event::UserText { text }) => {
            let url = normalize_url(&text);
            Ok(TransitionResult::new(
                state.with_phase(Phase::requesting(CallKind::Reachability, Phase::AwaitingUrl)),
            )
            .append(OutboundMessage::user(text.trim()))
            .with_effect(Effect::request(ProviderCall::CheckReachability { url })))
        }

        // A pending next-page offer is dropped by any free text
        (Phase::Menu | Phase::AwaitingNextPage, Event::UserText { text }) => {
            handle_menu_text(state, &text)
        }

        // The keyword is taken verbatim, never reclassified
        (Phase::AwaitingSeoKeyword, Event::UserText { text }) => {
            let search = SearchContext {
                query: text.trim().to_string(),
                page_number: 1,
            };
            let query = search.to_query();
            let new_state = ConvState {
                phase: Phase::requesting(CallKind::Search, Phase::AwaitingSeoKeyword),
                search: Some(search),
                ..state.clone()
            };
            Ok(TransitionResult::new(new_state)
                .append(OutboundMessage::user(text.trim()))
                .with_effect(Effect::request(ProviderCall::Search { query })))
        }

        (Phase::AwaitingBrandQuery, Event::UserText { text }) => {
            let subject_url = require_subject(state)?;
            let request = replies::brand_request(text.trim(), subject_url);
            Ok(TransitionResult::new(
                state.with_phase(Phase::requesting(CallKind::Brand, Phase::AwaitingBrandQuery)),
            )
            .append(OutboundMessage::user(text.trim()))
            .with_effect(Effect::request(ProviderCall::Generate { request })))
        }

        // ============================================================
        // Option selection (offered options only, checked above)
        // ============================================================
        (Phase::Menu | Phase::AwaitingNextPage, Event::OptionSelected { option }) => {
            let result = select_option(state, option, state.phase.clone())?;
            Ok(prepend_user(result, option.label()))
        }

        // ============================================================
        // Provider outcomes
        // ============================================================
        (
            Phase::Requesting {
                call: CallKind::Reachability,
                ..
            },
            Event::ReachabilityChecked { url, reachable },
        ) => Ok(handle_reachability(state, url, reachable)),

        (
            Phase::Requesting {
                call: CallKind::Audit,
                ..
            },
            Event::AuditCompleted { report },
        ) => handle_audit(state, context, report),

        (
            Phase::Requesting {
                call: CallKind::Search,
                ..
            },
            Event::SearchCompleted { hits },
        ) => handle_search(state, context, &hits),

        (
            Phase::Requesting {
                call: call @ (CallKind::Brand | CallKind::Fallback),
                ..
            },
            Event::ReplyGenerated { reply },
        ) => Ok(handle_reply(state, *call, reply)),

        (Phase::Requesting { call, resume }, Event::ProviderFailed { error }) => {
            Ok(handle_failure(state, *call, resume, &error))
        }

        (phase, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {} on {event:?}",
            phase.name()
        ))),
    }
}

fn require_subject(state: &ConvState) -> Result<&str, TransitionError> {
    state
        .subject_url
        .as_deref()
        .ok_or_else(|| TransitionError::InvalidTransition("No subject URL set".to_string()))
}

/// Echo the user's choice ahead of the effects it produced
fn prepend_user(mut result: TransitionResult, text: &str) -> TransitionResult {
    result
        .effects
        .insert(0, Effect::append(OutboundMessage::user(text)));
    result
}

fn handle_menu_text(state: &ConvState, text: &str) -> Result<TransitionResult, TransitionError> {
    let text = text.trim();
    let result = match classify(text) {
        Classification::Greeting => TransitionResult::new(state.with_phase(Phase::Menu))
            .append(replies::menu(replies::MENU_GREETING)),

        Classification::Option(option) => select_option(state, option, Phase::Menu)?,

        Classification::Unclassified if state.error_count >= MISS_THRESHOLD => {
            TransitionResult::new(state.with_phase(Phase::Menu))
                .append(OutboundMessage::text(replies::REFUSAL))
                .append(replies::menu(replies::MENU_AGAIN))
        }

        Classification::Unclassified => {
            let new_state = ConvState {
                phase: Phase::requesting(CallKind::Fallback, Phase::Menu),
                error_count: state.error_count + 1,
                ..state.clone()
            };
            TransitionResult::new(new_state).with_effect(Effect::request(ProviderCall::Generate {
                request: replies::fallback_request(text),
            }))
        }
    };
    Ok(prepend_user(result, text))
}

/// Effects of choosing a menu option. `resume` is where a failed call returns.
fn select_option(
    state: &ConvState,
    option: MenuOption,
    resume: Phase,
) -> Result<TransitionResult, TransitionError> {
    match option {
        MenuOption::AuditQuality => {
            let url = require_subject(state)?.to_string();
            Ok(
                TransitionResult::new(state.with_phase(Phase::requesting(CallKind::Audit, resume)))
                    .with_effect(Effect::request_with_notice(
                        ProviderCall::Audit { url },
                        OutboundMessage::text(replies::AUDIT_WAIT),
                    )),
            )
        }

        MenuOption::SeoPerformance => {
            Ok(TransitionResult::new(state.with_phase(Phase::AwaitingSeoKeyword))
                .append(OutboundMessage::input_prompt(replies::ASK_SEO_KEYWORD)))
        }

        MenuOption::BrandAiSearch => {
            Ok(TransitionResult::new(state.with_phase(Phase::AwaitingBrandQuery))
                .append(OutboundMessage::input_prompt(replies::ASK_BRAND_QUERY))
                .append(OutboundMessage::text(replies::BRAND_QUERY_HINT)))
        }

        MenuOption::NextPage => {
            let search = state.search.as_ref().ok_or_else(|| {
                TransitionError::InvalidTransition("No search to continue".to_string())
            })?;
            Ok(TransitionResult::new(
                state.with_phase(Phase::requesting(CallKind::Search, resume)),
            )
            .with_effect(Effect::request(ProviderCall::Search {
                query: search.to_query(),
            })))
        }
    }
}

fn handle_reachability(state: &ConvState, url: String, reachable: bool) -> TransitionResult {
    if !reachable {
        return TransitionResult::new(state.with_phase(Phase::AwaitingUrl))
            .append(OutboundMessage::input_prompt(replies::INVALID_URL));
    }
    let new_state = ConvState {
        phase: Phase::Menu,
        subject_url: state.subject_url.clone().or(Some(url)),
        ..state.clone()
    };
    TransitionResult::new(new_state).append(replies::menu(replies::MENU_PROMPT))
}

fn handle_audit(
    state: &ConvState,
    context: &ConvContext,
    report: AuditReport,
) -> Result<TransitionResult, TransitionError> {
    let url = require_subject(state)?.to_string();
    let has_issues = report.has_issues();
    let mut result = TransitionResult::new(state.with_phase(Phase::Menu))
        .append(OutboundMessage::audit_report(url, report));
    if has_issues {
        result = result.append_all(replies::escalation(
            replies::AUDIT_ESCALATION,
            &context.contact_url,
        ));
    }
    Ok(result.append(replies::menu(replies::MENU_AGAIN)))
}

fn handle_search(
    state: &ConvState,
    context: &ConvContext,
    hits: &[SearchHit],
) -> Result<TransitionResult, TransitionError> {
    let subject_url = require_subject(state)?;
    let search = state
        .search
        .as_ref()
        .ok_or_else(|| TransitionError::InvalidTransition("No search in progress".to_string()))?;

    let listing = replies::search_results(&search.query, search.page_number, hits);

    if let Some(position) = find_position(subject_url, hits) {
        return Ok(TransitionResult::new(state.with_phase(Phase::Menu))
            .append(listing)
            .append(replies::found_at(position, &search.query))
            .append(replies::menu(replies::MENU_AGAIN)));
    }

    // One extra page is offered, no more
    if search.page_number <= 1 {
        let new_state = ConvState {
            phase: Phase::AwaitingNextPage,
            search: Some(SearchContext {
                query: search.query.clone(),
                page_number: 2,
            }),
            ..state.clone()
        };
        return Ok(TransitionResult::new(new_state)
            .append(listing)
            .append(replies::next_page_offer()));
    }

    Ok(TransitionResult::new(state.with_phase(Phase::Menu))
        .append(listing)
        .append(OutboundMessage::text(replies::NOT_FOUND))
        .append_all(replies::escalation(
            replies::SEARCH_ESCALATION,
            &context.contact_url,
        ))
        .append(replies::menu(replies::MENU_AGAIN)))
}

fn handle_reply(state: &ConvState, call: CallKind, reply: ChatReply) -> TransitionResult {
    let (body, prompt) = if call == CallKind::Brand {
        (OutboundMessage::result_text(reply.text), replies::MENU_AGAIN)
    } else {
        (OutboundMessage::text(reply.text), replies::MENU_FALLBACK)
    };
    TransitionResult::new(state.with_phase(Phase::Menu))
        .append(body)
        .append(replies::menu(prompt))
}

fn handle_failure(
    state: &ConvState,
    call: CallKind,
    resume: &Phase,
    error: &ProviderError,
) -> TransitionResult {
    if call == CallKind::Reachability {
        return TransitionResult::new(state.with_phase(Phase::AwaitingUrl))
            .append(OutboundMessage::input_prompt(replies::INVALID_URL));
    }
    TransitionResult::new(state.with_phase(resume.clone())).append(replies::apology(error.kind))
}

// ============================================================================
// URL helpers
// ============================================================================

/// Prefix `https://` unless the text already carries an http(s) scheme
pub fn normalize_url(text: &str) -> String {
    let text = text.trim();
    let lower = text.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        text.to_string()
    } else {
        format!("https://{text}")
    }
}

/// Hostname, lowercased, without a leading `www.`
pub fn host_key(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").map_or_else(|| host.clone(), str::to_string))
}

/// Ranking position of the first result on the subject's host
pub fn find_position(subject_url: &str, hits: &[SearchHit]) -> Option<u32> {
    let subject = host_key(subject_url)?;
    hits.iter()
        .find(|hit| host_key(&hit.link).as_deref() == Some(subject.as_str()))
        .map(|hit| hit.position)
}
