//! Conversation state machine.
//!
//! Sequences resolver → selector → scoring/inference → summary, owns the
//! per-session mutable state, and escalates to a human after repeated failed
//! understanding. Each turn interprets the message against the current
//! expected input type locally before the tiered resolver is consulted.

pub mod interpreter;

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use willow_common::{
    Answer, AnswerValue, ConcernCategory, PatternStore, Question, ScoredItem, SessionStage,
};

use crate::classifier::{ClassifierContext, TextCompletion};
use crate::config::Config;
use crate::questions::build_question_set;
use crate::reflex::infer_latent_categories;
use crate::report::{compose, AssessmentReport};
use crate::resolver::TieredResolver;
use crate::scoring::{aggregate_categories, score_item};
use interpreter::{
    interpret_follow_up, interpret_questioning, parse_age, FollowUpIntent, LocalInterpretation,
};

/// Age assumed when the parent never states one
const DEFAULT_CHILD_AGE: u8 = 4;

/// Per-session mutable state, owned exclusively by the engine's transitions.
///
/// Discarded at session end; nothing here persists except what the resolver
/// writes to the pattern store and the final report handed to the caller.
#[derive(Debug)]
pub struct SessionState {
    pub stage: SessionStage,
    pub child_age: Option<u8>,
    pub identified_categories: Vec<ConcernCategory>,
    queued_categories: VecDeque<ConcernCategory>,
    /// Every question asked this session, across batteries
    pub questions: Vec<Question>,
    pub current_question_index: usize,
    pub answers: Vec<Answer>,
    used_question_texts: HashSet<String>,
    pub uncertain_turn_count: u32,
    pub last_report: Option<AssessmentReport>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            stage: SessionStage::Initial,
            child_age: None,
            identified_categories: Vec::new(),
            queued_categories: VecDeque::new(),
            questions: Vec::new(),
            current_question_index: 0,
            answers: Vec::new(),
            used_question_texts: HashSet::new(),
            uncertain_turn_count: 0,
            last_report: None,
        }
    }

    fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_question_index)
    }

    fn age(&self) -> u8 {
        self.child_age.unwrap_or(DEFAULT_CHILD_AGE)
    }
}

/// One turn's output for the presentation layer
#[derive(Debug, Clone)]
pub struct TurnOutput {
    pub message: String,
    pub stage: SessionStage,
    /// Render Yes/No/Sometimes affordances
    pub quick_replies: bool,
}

impl TurnOutput {
    fn new(message: impl Into<String>, stage: SessionStage) -> Self {
        Self {
            message: message.into(),
            stage,
            quick_replies: stage.wants_quick_replies(),
        }
    }
}

/// The conversation engine: one instance serves many sequential sessions
pub struct SessionEngine {
    resolver: TieredResolver,
    store: Arc<PatternStore>,
    config: Config,
}

impl SessionEngine {
    pub fn new(
        store: Arc<PatternStore>,
        completion: Arc<dyn TextCompletion>,
        config: Config,
    ) -> Self {
        let resolver = TieredResolver::new(store.clone(), completion, config.resolver.clone());
        Self {
            resolver,
            store,
            config,
        }
    }

    /// Start a fresh session (also the explicit restart after escalation)
    pub fn new_session(&self) -> SessionState {
        SessionState::new()
    }

    /// Process one message and advance the session.
    pub async fn handle_message(&self, state: &mut SessionState, message: &str) -> TurnOutput {
        // Escalated is absorbing for the automated flow
        if state.stage == SessionStage::Escalated {
            return TurnOutput::new(ESCALATED_MESSAGE, SessionStage::Escalated);
        }

        if state.child_age.is_none() {
            if let Some(age) = parse_age(message) {
                state.child_age = Some(age);
            }
        }

        match state.stage {
            SessionStage::Initial | SessionStage::Clarifying => {
                self.handle_intake(state, message).await
            }
            SessionStage::Questioning => self.handle_questioning(state, message).await,
            // Diagnosing auto-advances within the same turn, so a message
            // arriving here is treated as a recommending follow-up.
            SessionStage::Diagnosing | SessionStage::Recommending => {
                self.handle_recommending(state, message).await
            }
            SessionStage::Escalated => unreachable!("handled above"),
        }
    }

    /// Explicit correction flow: re-answering a question overwrites only here
    pub fn correct_answer(&self, state: &mut SessionState, question_id: uuid::Uuid, value: AnswerValue) {
        if let Some(existing) = state.answers.iter_mut().find(|a| a.question_id == question_id) {
            info!("Correcting answer for question {}", question_id);
            existing.value = value;
        }
    }

    /// Initial / clarifying: find at least one concern category
    async fn handle_intake(&self, state: &mut SessionState, message: &str) -> TurnOutput {
        let categories = willow_common::detect_categories(message);

        if let Some((&first, rest)) = categories.split_first() {
            state.identified_categories = categories.clone();
            state.uncertain_turn_count = 0;
            state.queued_categories.extend(rest.iter().copied());
            return self.start_battery(state, first).await;
        }

        // No category: let the resolver tell us what the message was
        let classification = self.resolver.classify(message, &self.context_for(state)).await;

        if classification.is_unknown() {
            state.uncertain_turn_count += 1;
            if self.escalated(state) {
                return TurnOutput::new(ESCALATED_MESSAGE, SessionStage::Escalated);
            }
            state.stage = SessionStage::Clarifying;
            return TurnOutput::new(CLARIFY_PROMPT, SessionStage::Clarifying);
        }

        state.uncertain_turn_count = 0;
        state.stage = SessionStage::Clarifying;
        let reply = match canned_reply(&classification.response_type) {
            Some(text) => format!("{}\n\n{}", text, CLARIFY_PROMPT),
            None => CLARIFY_PROMPT.to_string(),
        };
        TurnOutput::new(reply, SessionStage::Clarifying)
    }

    /// Questioning: expected input is a Yes/No/Sometimes variant
    async fn handle_questioning(&self, state: &mut SessionState, message: &str) -> TurnOutput {
        match interpret_questioning(message) {
            LocalInterpretation::Answer(value) => {
                state.uncertain_turn_count = 0;
                self.record_answer(state, value);
                self.advance(state).await
            }
            LocalInterpretation::MetaQuestion => {
                state.uncertain_turn_count = 0;
                let repeat = self.repeat_current(state);
                TurnOutput::new(
                    format!("{}\n\n{}", META_ANSWER, repeat),
                    SessionStage::Questioning,
                )
            }
            LocalInterpretation::NewConcern(categories) => {
                state.uncertain_turn_count = 0;
                let mut added = Vec::new();
                for cat in categories {
                    let known = state.identified_categories.contains(&cat)
                        || state.queued_categories.contains(&cat);
                    if !known {
                        state.queued_categories.push_back(cat);
                        added.push(cat.display_name());
                    }
                }
                let ack = if added.is_empty() {
                    "That area is already on our list.".to_string()
                } else {
                    format!("Noted - we'll also look at {} after this set.", added.join(", "))
                };
                let repeat = self.repeat_current(state);
                TurnOutput::new(format!("{}\n\n{}", ack, repeat), SessionStage::Questioning)
            }
            LocalInterpretation::Unrecognized => {
                let classification =
                    self.resolver.classify(message, &self.context_for(state)).await;
                if classification.is_unknown() {
                    state.uncertain_turn_count += 1;
                    if self.escalated(state) {
                        return TurnOutput::new(ESCALATED_MESSAGE, SessionStage::Escalated);
                    }
                    let repeat = self.repeat_current(state);
                    return TurnOutput::new(
                        format!("Sorry, I didn't catch that. {}", repeat),
                        SessionStage::Questioning,
                    );
                }
                state.uncertain_turn_count = 0;
                let repeat = self.repeat_current(state);
                let reply = match canned_reply(&classification.response_type) {
                    Some(text) => format!("{}\n\n{}", text, repeat),
                    None => repeat,
                };
                TurnOutput::new(reply, SessionStage::Questioning)
            }
        }
    }

    /// Recommending: follow-ups routed through the secondary classification
    async fn handle_recommending(&self, state: &mut SessionState, message: &str) -> TurnOutput {
        match interpret_follow_up(message) {
            FollowUpIntent::Exercises => {
                state.uncertain_turn_count = 0;
                TurnOutput::new(self.exercise_reply(state), SessionStage::Recommending)
            }
            FollowUpIntent::ReflexInfo => {
                state.uncertain_turn_count = 0;
                TurnOutput::new(self.reflex_info_reply(state), SessionStage::Recommending)
            }
            FollowUpIntent::Report => {
                state.uncertain_turn_count = 0;
                let summary = state
                    .last_report
                    .as_ref()
                    .map(|r| r.summary.clone())
                    .unwrap_or_else(|| "We haven't completed an assessment yet.".to_string());
                TurnOutput::new(summary, SessionStage::Recommending)
            }
            FollowUpIntent::Callback => {
                state.uncertain_turn_count = 0;
                TurnOutput::new(CALLBACK_REPLY, SessionStage::Recommending)
            }
            FollowUpIntent::NewConcern(categories) => {
                state.uncertain_turn_count = 0;
                let fresh: Vec<ConcernCategory> = categories
                    .into_iter()
                    .filter(|c| !state.identified_categories.contains(c))
                    .collect();
                match fresh.first() {
                    Some(&first) => {
                        state.identified_categories.extend(&fresh);
                        state.queued_categories.extend(fresh.into_iter().skip(1));
                        self.start_battery(state, first).await
                    }
                    None => TurnOutput::new(
                        "We covered that area already - ask for the report to see the details.",
                        SessionStage::Recommending,
                    ),
                }
            }
            FollowUpIntent::Other => {
                let classification =
                    self.resolver.classify(message, &self.context_for(state)).await;
                if classification.is_unknown() {
                    state.uncertain_turn_count += 1;
                    if self.escalated(state) {
                        return TurnOutput::new(ESCALATED_MESSAGE, SessionStage::Escalated);
                    }
                    return TurnOutput::new(
                        "I'm not sure I follow - would you like exercises, the report, or a callback?",
                        SessionStage::Recommending,
                    );
                }
                state.uncertain_turn_count = 0;
                let reply = canned_reply(&classification.response_type)
                    .unwrap_or("Happy to help - ask for exercises, the report, or a callback.");
                TurnOutput::new(reply, SessionStage::Recommending)
            }
        }
    }

    /// Build a battery for a category and emit its first question.
    ///
    /// Bank retrieval is bounded by the configured budget; on timeout the
    /// static progression set is used instead.
    async fn start_battery(&self, state: &mut SessionState, category: ConcernCategory) -> TurnOutput {
        if !state.identified_categories.contains(&category) {
            state.identified_categories.push(category);
        }

        let age = state.age();
        let store = self.store.clone();
        let budget = Duration::from_secs(self.config.engine.question_build_timeout_secs);

        let fetch = tokio::task::spawn_blocking(move || store.fetch_bank(category, age));
        let bank = match tokio::time::timeout(budget, fetch).await {
            Ok(Ok(Ok(bank))) => bank,
            Ok(Ok(Err(e))) => {
                warn!("Bank fetch failed, using static set: {}", e);
                Vec::new()
            }
            Ok(Err(e)) => {
                warn!("Bank fetch task failed, using static set: {}", e);
                Vec::new()
            }
            Err(_) => {
                warn!("Bank fetch exceeded {}s budget, using static set", budget.as_secs());
                Vec::new()
            }
        };

        let battery = build_question_set(category, age, &bank, &mut state.used_question_texts);
        info!(
            "Battery for {} (age {}): {} questions",
            category,
            age,
            battery.len()
        );

        if battery.is_empty() {
            // Every candidate was already used this session; nothing to ask
            return self.diagnose(state);
        }

        state.current_question_index = state.questions.len();
        state.questions.extend(battery);
        state.stage = SessionStage::Questioning;

        let first = match state.current_question() {
            Some(question) => question.text.clone(),
            None => return self.diagnose(state),
        };
        TurnOutput::new(
            format!(
                "Let's go through some quick questions about {}. Answer Yes, No, or Sometimes.\n\n{}",
                category.display_name(),
                first
            ),
            SessionStage::Questioning,
        )
    }

    fn record_answer(&self, state: &mut SessionState, value: AnswerValue) {
        if let Some(question) = state.current_question() {
            let question_id = question.id;
            // Immutable once recorded; corrections go through correct_answer
            if !state.answers.iter().any(|a| a.question_id == question_id) {
                state.answers.push(Answer { question_id, value });
            }
        }
    }

    /// Move to the next question, the next queued battery, or diagnosis
    async fn advance(&self, state: &mut SessionState) -> TurnOutput {
        state.current_question_index += 1;

        if let Some(question) = state.current_question() {
            return TurnOutput::new(question.text.clone(), SessionStage::Questioning);
        }

        if let Some(next_category) = state.queued_categories.pop_front() {
            let intro = self.start_battery(state, next_category).await;
            return TurnOutput::new(
                format!("Thanks, that set is done.\n\n{}", intro.message),
                intro.stage,
            );
        }

        self.diagnose(state)
    }

    /// Score everything, infer findings, compose the report, and advance
    /// through diagnosing into recommending.
    fn diagnose(&self, state: &mut SessionState) -> TurnOutput {
        state.stage = SessionStage::Diagnosing;

        let scored: Vec<ScoredItem> = state
            .answers
            .iter()
            .filter_map(|answer| {
                state
                    .questions
                    .iter()
                    .find(|q| q.id == answer.question_id)
                    .map(|q| score_item(q, answer.value))
            })
            .collect();

        let category_scores =
            aggregate_categories(&scored, self.config.engine.strength_percentage_floor);
        let findings = infer_latent_categories(&scored);
        let report = compose(category_scores, findings);

        let message = format!(
            "{}\n\nWould you like exercises to try at home, more detail on any pattern, or a callback from our team?",
            report.summary
        );
        state.last_report = Some(report);
        state.stage = SessionStage::Recommending;

        TurnOutput::new(message, SessionStage::Recommending)
    }

    fn repeat_current(&self, state: &SessionState) -> String {
        state
            .current_question()
            .map(|q| q.text.clone())
            .unwrap_or_else(|| CLARIFY_PROMPT.to_string())
    }

    fn escalated(&self, state: &mut SessionState) -> bool {
        if state.uncertain_turn_count >= self.config.engine.escalation_threshold {
            warn!(
                "Escalating after {} consecutive unresolved turns",
                state.uncertain_turn_count
            );
            state.stage = SessionStage::Escalated;
            true
        } else {
            false
        }
    }

    fn context_for(&self, state: &SessionState) -> ClassifierContext {
        ClassifierContext {
            stage: Some(state.stage),
            identified_categories: state
                .identified_categories
                .iter()
                .map(|c| c.to_string())
                .collect(),
            child_age: state.child_age,
        }
    }

    fn exercise_reply(&self, state: &SessionState) -> String {
        match state.last_report.as_ref().filter(|r| !r.findings.is_empty()) {
            Some(report) => {
                let mut lines = vec!["Here are starting points for the patterns we saw:".to_string()];
                lines.extend(report.recommendations.iter().cloned());
                lines.join("\n")
            }
            None => "General movement play is a great start - crawling games, balance walks, and ball play a few minutes a day.".to_string(),
        }
    }

    fn reflex_info_reply(&self, state: &SessionState) -> String {
        match state.last_report.as_ref().filter(|r| !r.findings.is_empty()) {
            Some(report) => {
                let mut lines =
                    vec!["Retained reflexes are early movement patterns that normally fade in infancy. The ones your answers pointed to:".to_string()];
                for f in &report.findings {
                    lines.push(format!(
                        "- {}: {}% of related answers, {} priority",
                        f.label, f.retention_percentage, f.severity
                    ));
                }
                lines.join("\n")
            }
            None => "Retained reflexes are early movement patterns that normally fade in infancy; when they linger they can affect coordination, attention, and learning.".to_string(),
        }
    }
}

const CLARIFY_PROMPT: &str = "Could you tell me a little about what you've noticed? For example, how your child talks, moves, eats, or behaves.";

const META_ANSWER: &str = "These questions help us understand where your child is right now. There are no right or wrong answers - just reply Yes, No, or Sometimes.";

const CALLBACK_REPLY: &str = "Of course - leave your phone number and a good time, and one of our team will call you back.";

const ESCALATED_MESSAGE: &str = "I'm having trouble following, and I don't want to guess about your child. Let me hand you over to one of our specialists - leave your number and we'll call you back.";

/// Canned replies keyed by response type
fn canned_reply(response_type: &str) -> Option<&'static str> {
    match response_type {
        "pricing" => Some("The initial screening is free; a full assessment with a written program is paid - our team can share current pricing."),
        "about" => Some("I ask a few questions about your child's everyday skills, then map the answers to developmental areas and suggest next steps."),
        "callback" => Some(CALLBACK_REPLY),
        "report" => Some("I can prepare a summary report once we've been through the questions."),
        "exercises" => Some("I can suggest exercises once we've finished the questions and know which areas need them."),
        "reflex_info" => Some("Retained reflexes are early movement patterns that normally fade in infancy; when they linger they can affect coordination, attention, and learning."),
        "greeting" => Some("Hello! I help parents make sense of their child's development."),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingCompletion {
        calls: AtomicUsize,
    }

    impl CountingCompletion {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TextCompletion for CountingCompletion {
        async fn submit(&self, _system: &str, _user: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(anyhow!("offline"))
        }
    }

    fn engine(completion: Arc<CountingCompletion>) -> SessionEngine {
        let store = Arc::new(PatternStore::in_memory().unwrap());
        SessionEngine::new(store, completion, Config::default())
    }

    #[tokio::test]
    async fn test_initial_concern_starts_questioning() {
        let e = engine(CountingCompletion::new());
        let mut state = e.new_session();

        let out = e.handle_message(&mut state, "my son is 3 and not talking").await;
        assert_eq!(out.stage, SessionStage::Questioning);
        assert!(out.quick_replies);
        assert_eq!(state.child_age, Some(3));
        assert_eq!(state.identified_categories, vec![ConcernCategory::Communication]);
        assert!(!state.questions.is_empty());
    }

    #[tokio::test]
    async fn test_initial_without_category_clarifies() {
        let e = engine(CountingCompletion::new());
        let mut state = e.new_session();

        let out = e.handle_message(&mut state, "hello").await;
        assert_eq!(out.stage, SessionStage::Clarifying);
        assert!(!out.quick_replies);
        // greeting resolved via keyword tier; not an uncertain turn
        assert_eq!(state.uncertain_turn_count, 0);
    }

    #[tokio::test]
    async fn test_nope_not_really_is_an_answer_without_classifier() {
        let completion = CountingCompletion::new();
        let e = engine(completion.clone());
        let mut state = e.new_session();

        e.handle_message(&mut state, "my son is 3 and not talking").await;
        let answered_before = state.answers.len();
        let out = e.handle_message(&mut state, "nope not really").await;

        assert_eq!(state.answers.len(), answered_before + 1);
        assert_eq!(state.answers.last().unwrap().value, AnswerValue::No);
        assert_eq!(out.stage, SessionStage::Questioning);
        assert_eq!(completion.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_full_battery_reaches_recommending() {
        let e = engine(CountingCompletion::new());
        let mut state = e.new_session();

        e.handle_message(&mut state, "my daughter is 4, worried about her speech").await;
        let total = state.questions.len();
        let mut last = None;
        for _ in 0..total {
            last = Some(e.handle_message(&mut state, "yes").await);
        }

        let out = last.unwrap();
        assert_eq!(out.stage, SessionStage::Recommending);
        assert!(state.last_report.is_some());
        assert_eq!(state.answers.len(), total);
    }

    #[tokio::test]
    async fn test_meta_question_repeats_without_advancing() {
        let e = engine(CountingCompletion::new());
        let mut state = e.new_session();

        e.handle_message(&mut state, "my son is 3 and not talking").await;
        let index_before = state.current_question_index;
        let out = e.handle_message(&mut state, "why are you asking this?").await;

        assert_eq!(state.current_question_index, index_before);
        assert!(out.message.contains("no right or wrong answers"));
        assert!(out.message.contains(&state.questions[index_before].text));
    }

    #[tokio::test]
    async fn test_new_concern_is_queued_not_dropped() {
        let e = engine(CountingCompletion::new());
        let mut state = e.new_session();

        e.handle_message(&mut state, "my son is 3 and not talking").await;
        let index_before = state.current_question_index;
        let out = e
            .handle_message(&mut state, "also he keeps having tantrums")
            .await;

        assert_eq!(state.current_question_index, index_before);
        assert!(state.queued_categories.contains(&ConcernCategory::Conduct));
        assert!(out.message.contains("behaviour"));
    }

    #[tokio::test]
    async fn test_escalates_exactly_on_third_unresolved_turn() {
        let e = engine(CountingCompletion::new());
        let mut state = e.new_session();
        e.handle_message(&mut state, "my son is 3 and not talking").await;

        let out1 = e.handle_message(&mut state, "qwerty asdf").await;
        assert_eq!(out1.stage, SessionStage::Questioning);
        let out2 = e.handle_message(&mut state, "zxcv uiop").await;
        assert_eq!(out2.stage, SessionStage::Questioning);
        let out3 = e.handle_message(&mut state, "hjkl vbnm").await;
        assert_eq!(out3.stage, SessionStage::Escalated);
    }

    #[tokio::test]
    async fn test_resolved_turn_resets_uncertain_count() {
        let e = engine(CountingCompletion::new());
        let mut state = e.new_session();
        e.handle_message(&mut state, "my son is 3 and not talking").await;

        e.handle_message(&mut state, "qwerty asdf").await;
        e.handle_message(&mut state, "zxcv uiop").await;
        // A clean answer resets the streak
        e.handle_message(&mut state, "yes").await;
        let out = e.handle_message(&mut state, "qwerty again").await;
        assert_eq!(out.stage, SessionStage::Questioning);
        assert_eq!(state.uncertain_turn_count, 1);
    }

    #[tokio::test]
    async fn test_escalated_is_absorbing() {
        let e = engine(CountingCompletion::new());
        let mut state = e.new_session();
        e.handle_message(&mut state, "my son is 3 and not talking").await;
        for msg in ["qwerty", "asdf", "zxcv"] {
            e.handle_message(&mut state, msg).await;
        }
        assert_eq!(state.stage, SessionStage::Escalated);

        let out = e.handle_message(&mut state, "yes").await;
        assert_eq!(out.stage, SessionStage::Escalated);
        // Restart is explicit
        let fresh = e.new_session();
        assert_eq!(fresh.stage, SessionStage::Initial);
    }

    #[tokio::test]
    async fn test_recommending_follow_ups() {
        let e = engine(CountingCompletion::new());
        let mut state = e.new_session();
        e.handle_message(&mut state, "my son is 3 and not talking").await;
        let total = state.questions.len();
        for _ in 0..total {
            e.handle_message(&mut state, "yes").await;
        }
        assert_eq!(state.stage, SessionStage::Recommending);

        let out = e.handle_message(&mut state, "can we get exercises for home").await;
        assert_eq!(out.stage, SessionStage::Recommending);

        let out = e.handle_message(&mut state, "show me the report").await;
        assert!(out.message.contains("Here is what your answers show"));
    }

    #[tokio::test]
    async fn test_correction_flow_overwrites() {
        let e = engine(CountingCompletion::new());
        let mut state = e.new_session();
        e.handle_message(&mut state, "my son is 3 and not talking").await;
        e.handle_message(&mut state, "yes").await;

        let answered = state.answers[0].clone();
        assert_eq!(answered.value, AnswerValue::Yes);
        e.correct_answer(&mut state, answered.question_id, AnswerValue::No);
        assert_eq!(state.answers[0].value, AnswerValue::No);
    }
}
