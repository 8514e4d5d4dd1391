//! Conversation State Machine
//!
//! Applies one [`ConversationInput`] at a time to a [`ConversationSession`],
//! appending bot messages and returning a [`NavResponse`]. The machine owns no
//! session state; it holds the shared locale store, the path resolver and the
//! intent classifier.
//!
//! # Dispatch
//!
//! | Phase                     | Input              | Handler              | Next phase                  |
//! |---------------------------|--------------------|----------------------|-----------------------------|
//! | CollectingOrigin          | SelectOrigin       | accept_origin()      | CollectingDestination       |
//! | CollectingDestination     | SelectDestination  | start_route()        | Navigating or unchanged     |
//! | Navigating                | RequestAdvance     | advance()            | Navigating or Arrived       |
//! | Navigating                | ConfirmMilestone   | confirm_milestone()  | Navigating or Arrived       |
//! | Arrived                   | (same turn)        | arrive()             | AwaitingPostArrivalChoice   |
//! | AwaitingPostArrivalChoice | RequestNewRoute    | new_route()          | CollectingDestination       |
//! | AwaitingPostArrivalChoice | EndSession         | end_session()        | CollectingOrigin + reset    |
//! | any                       | SubmitText         | classify, then above | per intent                  |
//! | any                       | SetLocale          | set_locale()         | unchanged                   |
//!
//! Events not listed for the current phase are rejected with a recoverable
//! error and leave the session untouched.
//!
//! A reset armed by `EndSession` is only disarmed by an accepted origin,
//! whether chosen or typed. Every other event leaves it armed.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::intent_classifier::{ClassifierContext, IntentClassifier};
use super::response::{NavResponse, NavResponseKind, ScheduledReset, StepView};
use super::session::{ActiveRoute, ConversationSession};
use super::types::{ConversationInput, ConversationPhase, Intent};
use crate::error::NavError;
use crate::locale::{keys, same_location, LocaleStore, Location};
use crate::navigation::{
    destination_choices, rank_locations, suggest_location, PathResolver, ReversePolicy,
};

/// Delay between the farewell and the automatic reset
pub const DEFAULT_RESET_DELAY: Duration = Duration::from_millis(3000);

/// Result of a handler before it is turned into a response
struct Turn {
    kind: NavResponseKind,
    error: Option<NavError>,
    reset: Option<ScheduledReset>,
}

impl Turn {
    fn new(kind: NavResponseKind) -> Self {
        Self {
            kind,
            error: None,
            reset: None,
        }
    }

    fn rejected(reason: impl Into<String>) -> Self {
        Self::new(NavResponseKind::Error {
            error: reason.into(),
            recoverable: true,
        })
    }

    fn with_error(mut self, error: NavError) -> Self {
        self.error = Some(error);
        self
    }
}

/// Stateless driver of conversation sessions
#[derive(Debug, Clone)]
pub struct ConversationMachine {
    store: Arc<LocaleStore>,
    resolver: PathResolver,
    classifier: IntentClassifier,
    reset_delay: Duration,
}

impl ConversationMachine {
    pub fn new(store: Arc<LocaleStore>) -> Self {
        Self {
            store,
            resolver: PathResolver::default(),
            classifier: IntentClassifier::default(),
            reset_delay: DEFAULT_RESET_DELAY,
        }
    }

    pub fn with_policy(mut self, policy: ReversePolicy) -> Self {
        self.resolver = PathResolver::new(policy);
        self
    }

    pub fn with_classifier(mut self, classifier: IntentClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_reset_delay(mut self, delay: Duration) -> Self {
        self.reset_delay = delay;
        self
    }

    pub fn store(&self) -> &Arc<LocaleStore> {
        &self.store
    }

    pub fn policy(&self) -> ReversePolicy {
        self.resolver.policy()
    }

    pub fn reset_delay(&self) -> Duration {
        self.reset_delay
    }

    // ========================================================================
    // Session lifecycle
    // ========================================================================

    /// Start a session in `locale` (or the default) with the welcome message
    pub fn new_session(&self, locale: &str) -> ConversationSession {
        let code = self.store.effective_code(locale);
        let mut session = ConversationSession::new(code);
        let welcome = self.store.message(&session.locale, keys::WELCOME, &[]);
        session.push_bot(welcome);
        info!(session_id = %session.id, locale = %session.locale, "Session created");
        session
    }

    /// Fire a deferred reset. Returns false when `token` was superseded.
    pub fn apply_reset(&self, session: &mut ConversationSession, token: u64) -> bool {
        if !session.reset_is_current(token) {
            warn!(session_id = %session.id, token, "Stale reset timer ignored");
            return false;
        }
        let welcome = self.store.message(&session.locale, keys::WELCOME, &[]);
        session.reset(welcome);
        info!(session_id = %session.id, "Session reset");
        true
    }

    /// Active locale's locations in declaration order
    pub fn locations(&self, session: &ConversationSession) -> &[Location] {
        self.store.locations(&session.locale)
    }

    /// Choice list for the current phase, ranked against `filter`
    pub fn choices(&self, session: &ConversationSession, filter: &str) -> Vec<Location> {
        let locations = self.locations(session);
        match session.phase {
            ConversationPhase::CollectingOrigin => rank_locations(locations, filter),
            ConversationPhase::CollectingDestination => {
                destination_choices(locations, session.current_location.as_deref(), filter)
            }
            _ => Vec::new(),
        }
    }

    /// Cleaned milestone texts of the active route
    pub fn milestones(&self, session: &ConversationSession) -> Vec<String> {
        session
            .resolved_path
            .as_ref()
            .map(|route| {
                self.store
                    .milestone_marker(&route.locale)
                    .milestones(&route.path.directions)
            })
            .unwrap_or_default()
    }

    // ========================================================================
    // Event dispatch
    // ========================================================================

    /// Apply one inbound event
    pub fn handle(
        &self,
        session: &mut ConversationSession,
        input: ConversationInput,
    ) -> NavResponse {
        let first_new = session.messages.len();

        if let Some(reason) = phase_rejection(session.phase, &input) {
            debug!(
                session_id = %session.id,
                event = input.name(),
                phase = %session.phase,
                "Event rejected"
            );
            return finish(session, Turn::rejected(reason), first_new);
        }

        session.touch();

        let before = session.phase;
        let turn = match input {
            ConversationInput::SelectOrigin { name } => self.select_origin(session, &name),
            ConversationInput::SelectDestination { name } => {
                self.select_destination(session, &name)
            }
            ConversationInput::SubmitText { text } => self.submit_text(session, &text),
            ConversationInput::RequestAdvance => self.request_advance(session),
            ConversationInput::ConfirmMilestone => self.confirm_milestone(session, true),
            ConversationInput::RequestNewRoute => self.new_route(session),
            ConversationInput::EndSession => self.end_session(session, true),
            ConversationInput::SetLocale { code } => self.set_locale(session, &code),
        };

        if session.phase != before {
            debug!(
                session_id = %session.id,
                from = %before,
                to = %session.phase,
                "Phase transition"
            );
        }

        finish(session, turn, first_new)
    }

    // ========================================================================
    // Handlers
    // ========================================================================

    fn say(&self, session: &mut ConversationSession, key: &str, replacements: &[(&str, &str)]) {
        let text = self.store.message(&session.locale, key, replacements);
        session.push_bot(text);
    }

    fn select_origin(&self, session: &mut ConversationSession, name: &str) -> Turn {
        let found = self.store.get(&session.locale).find_location(name).cloned();
        match found {
            Some(location) => {
                session.push_user(location.clone());
                self.accept_origin(session, location)
            }
            None => {
                session.push_user(name);
                self.clarify(session, name)
            }
        }
    }

    fn accept_origin(&self, session: &mut ConversationSession, location: Location) -> Turn {
        // A new conversation supersedes the farewell reset
        if session.cancel_pending_reset() {
            debug!(session_id = %session.id, "Pending reset cancelled");
        }
        session.current_location = Some(location.clone());
        session.destination = None;
        session.phase = ConversationPhase::CollectingDestination;
        self.say(session, keys::GREAT_LOCATION, &[("location", &location)]);
        Turn::new(NavResponseKind::OriginSelected { location })
    }

    fn select_destination(&self, session: &mut ConversationSession, name: &str) -> Turn {
        let found = self.store.get(&session.locale).find_location(name).cloned();
        let Some(location) = found else {
            session.push_user(name);
            return self.clarify(session, name);
        };

        let is_origin = session
            .current_location
            .as_deref()
            .map(|origin| same_location(origin, &location))
            .unwrap_or(false);
        if is_origin {
            return self.already_there(session, location);
        }

        session.push_user(location.clone());
        self.start_route(session, location)
    }

    fn already_there(&self, session: &mut ConversationSession, location: Location) -> Turn {
        self.say(session, keys::ALREADY_THERE, &[]);
        Turn::new(NavResponseKind::AlreadyThere {
            location: location.clone(),
        })
        .with_error(NavError::InvalidDestinationEqualsOrigin { location })
    }

    fn start_route(&self, session: &mut ConversationSession, destination: Location) -> Turn {
        let Some(origin) = session.current_location.clone() else {
            return Turn::rejected("no current location to navigate from");
        };

        let dataset = self.store.get(&session.locale);
        let route = match self.resolver.resolve_in(dataset, &origin, &destination) {
            Ok(route) => route,
            Err(err) => {
                info!(session_id = %session.id, from = %origin, to = %destination, "No path found");
                session.destination = None;
                self.say(
                    session,
                    keys::NO_PATH_FOUND,
                    &[("from", &origin), ("to", &destination)],
                );
                return Turn::new(NavResponseKind::NoPathFound {
                    from: origin,
                    to: destination,
                })
                .with_error(err);
            }
        };

        let total_steps = route.record.step_count();
        let orientation = route.orientation;
        let first = route.record.directions.first().cloned().unwrap_or_default();
        info!(
            session_id = %session.id,
            from = %origin,
            to = %destination,
            steps = total_steps,
            orientation = ?orientation,
            "Route resolved"
        );

        session.destination = Some(destination.clone());
        session.resolved_path = Some(ActiveRoute {
            path: route.record,
            orientation,
            locale: dataset.code.to_lowercase(),
        });
        session.step_index = 0;
        session.waiting_for_milestone = false;
        session.phase = ConversationPhase::Navigating;

        self.say(
            session,
            keys::HELP_GET_FROM,
            &[("from", &origin), ("to", &destination), ("direction", &first)],
        );
        match self.enter_step(session) {
            Some(step) => Turn::new(NavResponseKind::RouteStarted {
                from: origin,
                to: destination,
                total_steps,
                orientation,
                step,
            }),
            None => self.arrive(session),
        }
    }

    /// Apply the milestone rule to the step at `step_index` and prompt for it
    fn enter_step(&self, session: &mut ConversationSession) -> Option<StepView> {
        let route = session.resolved_path.as_ref()?;
        let direction = route.step(session.step_index)?.to_string();
        let marker = self.store.milestone_marker(&route.locale);
        let milestone = marker.is_milestone(&direction);
        let view = StepView {
            index: session.step_index,
            total: route.total_steps(),
            display: marker.clean(&direction),
            direction,
            milestone,
        };

        session.waiting_for_milestone = milestone;
        let prompt = if milestone {
            keys::REACHED_LANDMARK
        } else {
            keys::COMPLETED_STEP
        };
        self.say(session, prompt, &[]);
        Some(view)
    }

    fn request_advance(&self, session: &mut ConversationSession) -> Turn {
        if session.waiting_for_milestone {
            self.say(session, keys::REACHED_LANDMARK, &[]);
            return Turn::rejected("waiting for the landmark to be confirmed");
        }
        self.advance(session)
    }

    fn advance(&self, session: &mut ConversationSession) -> Turn {
        let next = session.step_index + 1;
        let direction = match session.resolved_path.as_ref() {
            Some(route) => route.step(next).map(|s| s.to_string()),
            None => return Turn::rejected("no active route"),
        };

        match direction {
            Some(direction) => {
                session.step_index = next;
                session.push_bot(direction);
                match self.enter_step(session) {
                    Some(step) => Turn::new(NavResponseKind::Step { step }),
                    None => self.arrive(session),
                }
            }
            None => self.arrive(session),
        }
    }

    fn confirm_milestone(&self, session: &mut ConversationSession, echo: bool) -> Turn {
        if !session.waiting_for_milestone {
            self.say(session, keys::COMPLETED_STEP, &[]);
            return Turn::rejected("no landmark is awaiting confirmation");
        }
        if echo {
            let label = self.store.message(&session.locale, keys::REACHED_LANDMARK_BTN, &[]);
            session.push_user(label);
        }
        session.waiting_for_milestone = false;
        self.say(session, keys::CONTINUE_DIRECTION, &[]);
        self.advance(session)
    }

    fn arrive(&self, session: &mut ConversationSession) -> Turn {
        session.phase = ConversationPhase::Arrived;
        let destination = session
            .destination
            .take()
            .or_else(|| session.resolved_path.as_ref().map(|r| r.path.to.clone()))
            .unwrap_or_default();

        self.say(
            session,
            keys::REACHED_DESTINATION,
            &[("destination", &destination)],
        );
        session.current_location = Some(destination.clone());
        session.clear_route();
        session.phase = ConversationPhase::AwaitingPostArrivalChoice;
        info!(session_id = %session.id, destination = %destination, "Arrived");

        Turn::new(NavResponseKind::Arrived { destination })
    }

    fn new_route(&self, session: &mut ConversationSession) -> Turn {
        session.phase = ConversationPhase::CollectingDestination;
        let text = self.store.message(&session.locale, keys::SELECT_DESTINATION, &[]);
        session.push_bot(text.clone());
        Turn::new(NavResponseKind::Prompt { text })
    }

    fn end_session(&self, session: &mut ConversationSession, echo: bool) -> Turn {
        if echo {
            let label = self.store.message(&session.locale, keys::END_NAVIGATION, &[]);
            session.push_user(label);
        }
        self.say(session, keys::THANK_YOU, &[]);

        session.current_location = None;
        session.destination = None;
        session.clear_route();
        session.phase = ConversationPhase::CollectingOrigin;

        let token = session.schedule_reset();
        let delay_ms = u64::try_from(self.reset_delay.as_millis()).unwrap_or(u64::MAX);
        info!(session_id = %session.id, token, delay_ms, "Session ended, reset scheduled");

        let mut turn = Turn::new(NavResponseKind::SessionEnded {
            reset_after_ms: delay_ms,
        });
        turn.reset = Some(ScheduledReset { token, delay_ms });
        turn
    }

    fn set_locale(&self, session: &mut ConversationSession, requested: &str) -> Turn {
        let requested = requested.trim().to_string();
        let fell_back = match self.store.lookup(&requested) {
            Ok(_) => false,
            Err(err) => {
                warn!(session_id = %session.id, "{}", err);
                true
            }
        };
        let code = self.store.effective_code(&requested);
        let previous = std::mem::replace(&mut session.locale, code.clone());

        if previous != code {
            let old = self.store.get(&previous);
            let new = self.store.get(&code);
            let remap = |name: &Option<Location>| -> Option<Location> {
                let name = name.as_ref()?;
                let index = old.location_index(name)?;
                new.locations.get(index).cloned()
            };
            if let Some(location) = remap(&session.current_location) {
                session.current_location = Some(location);
            }
            if let Some(location) = remap(&session.destination) {
                session.destination = Some(location);
            }
            info!(session_id = %session.id, from = %previous, to = %code, "Locale changed");
        }

        let untouched = !session.messages.iter().any(|m| !m.is_bot());
        if previous != code
            && session.phase == ConversationPhase::CollectingOrigin
            && untouched
        {
            self.say(session, keys::WELCOME, &[]);
        }

        let turn = Turn::new(NavResponseKind::LocaleChanged {
            requested: requested.clone(),
            locale: code.clone(),
            fell_back,
        });
        if fell_back {
            turn.with_error(NavError::UnknownLocale {
                code: requested,
                fallback: code,
            })
        } else {
            turn
        }
    }

    fn submit_text(&self, session: &mut ConversationSession, text: &str) -> Turn {
        session.push_user(text);

        let intent = {
            let context = ClassifierContext {
                phase: session.phase,
                waiting_for_milestone: session.waiting_for_milestone,
                origin: session.current_location.as_deref(),
                locations: self.store.locations(&session.locale),
            };
            self.classifier.classify(text, &context)
        };
        debug!(session_id = %session.id, intent = ?intent, "Classified text");

        match intent {
            Intent::Greeting => self.greet(session),
            Intent::SelectOrigin(location) => self.accept_origin(session, location),
            Intent::SelectDestination(location) => self.start_route(session, location),
            Intent::Advance => self.advance(session),
            Intent::MilestoneConfirm => self.confirm_milestone(session, false),
            Intent::RequestNewRoute => self.new_route(session),
            Intent::EndSession => self.end_session(session, false),
            Intent::Unrecognized => self.clarify(session, text),
        }
    }

    fn greet(&self, session: &mut ConversationSession) -> Turn {
        let welcome = self.store.message(&session.locale, keys::WELCOME, &[]);
        let prompt = match session.phase {
            ConversationPhase::CollectingOrigin => Some(keys::SELECT_LOCATION),
            ConversationPhase::CollectingDestination => Some(keys::SELECT_DESTINATION),
            _ => None,
        };
        let text = match prompt {
            Some(key) => format!(
                "{} {}",
                welcome,
                self.store.message(&session.locale, key, &[])
            ),
            None => welcome,
        };
        session.push_bot(text.clone());
        Turn::new(NavResponseKind::Prompt { text })
    }

    /// Emit the phase's clarification for input that matched nothing
    fn clarify(&self, session: &mut ConversationSession, input: &str) -> Turn {
        let input = input.trim();
        let locations = self.store.locations(&session.locale);
        let (key, suggestion) = match session.phase {
            ConversationPhase::CollectingOrigin => (
                keys::LOCATION_NOT_FOUND,
                suggest_location(locations, input, None).cloned(),
            ),
            ConversationPhase::CollectingDestination => (
                keys::DESTINATION_NOT_FOUND,
                suggest_location(locations, input, session.current_location.as_deref()).cloned(),
            ),
            ConversationPhase::Navigating => (keys::USE_NAVIGATION_CONTROLS, None),
            ConversationPhase::Arrived | ConversationPhase::AwaitingPostArrivalChoice => {
                (keys::POST_ARRIVAL_CHOICE, None)
            }
        };

        let mut detail = self.store.message(&session.locale, key, &[("input", input)]);
        if let Some(suggestion) = &suggestion {
            let hint = self.store.message(
                &session.locale,
                keys::DID_YOU_MEAN,
                &[("suggestion", suggestion)],
            );
            detail = format!("{} {}", detail, hint);
        }
        session.push_bot(detail.clone());

        Turn::new(NavResponseKind::Clarification { detail, suggestion }).with_error(
            NavError::UnrecognizedInput {
                input: input.to_string(),
            },
        )
    }
}

fn finish(session: &ConversationSession, turn: Turn, first_new: usize) -> NavResponse {
    let mut response = NavResponse::from_session(session, turn.kind, first_new);
    response.error = turn.error;
    response.scheduled_reset = turn.reset;
    response
}

/// Why `input` cannot be applied in `phase`, if it cannot
fn phase_rejection(phase: ConversationPhase, input: &ConversationInput) -> Option<String> {
    use ConversationPhase::*;

    let accepted = match input {
        ConversationInput::SelectOrigin { .. } => phase == CollectingOrigin,
        ConversationInput::SelectDestination { .. } => phase == CollectingDestination,
        ConversationInput::SubmitText { text } => {
            if text.trim().is_empty() {
                return Some("empty input".to_string());
            }
            true
        }
        ConversationInput::RequestAdvance | ConversationInput::ConfirmMilestone => {
            phase == Navigating
        }
        ConversationInput::RequestNewRoute | ConversationInput::EndSession => {
            phase == AwaitingPostArrivalChoice
        }
        ConversationInput::SetLocale { .. } => true,
    };

    if accepted {
        None
    } else {
        Some(format!("'{}' is not valid while {}", input.name(), phase))
    }
}

// ============================================================================
// Tests
// ============================================================================
