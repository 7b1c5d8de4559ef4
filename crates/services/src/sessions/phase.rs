/// Lifecycle of a quiz session.
///
/// ```text
/// Loading ──Loaded──────▶ InProgress ──SubmitRequested──▶ Submitting ──Aggregated──▶ Submitted
///    │                        ▲                               │
///    └──LoadedEmpty──▶ NoContent                             └──AggregationFailed──┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// Waiting for the sampled question list.
    Loading,
    /// Accepting selections and navigation.
    InProgress,
    /// Last answer committed; results are being computed.
    Submitting,
    /// Results snapshot produced. Terminal.
    Submitted,
    /// The course had no questions. Terminal.
    NoContent,
}

/// Inputs that drive [`SessionPhase`] transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    Loaded,
    LoadedEmpty,
    SubmitRequested,
    Aggregated,
    AggregationFailed,
}

impl SessionPhase {
    /// Transition table. `None` means the event is not valid in this phase.
    #[must_use]
    pub fn on(self, event: SessionEvent) -> Option<SessionPhase> {
        use SessionEvent as E;
        use SessionPhase as P;

        match (self, event) {
            (P::Loading, E::Loaded) => Some(P::InProgress),
            (P::Loading, E::LoadedEmpty) => Some(P::NoContent),
            (P::InProgress, E::SubmitRequested) => Some(P::Submitting),
            (P::Submitting, E::Aggregated) => Some(P::Submitted),
            (P::Submitting, E::AggregationFailed) => Some(P::InProgress),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionPhase::Submitted | SessionPhase::NoContent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHASES: [SessionPhase; 5] = [
        SessionPhase::Loading,
        SessionPhase::InProgress,
        SessionPhase::Submitting,
        SessionPhase::Submitted,
        SessionPhase::NoContent,
    ];

    const EVENTS: [SessionEvent; 5] = [
        SessionEvent::Loaded,
        SessionEvent::LoadedEmpty,
        SessionEvent::SubmitRequested,
        SessionEvent::Aggregated,
        SessionEvent::AggregationFailed,
    ];

    #[test]
    fn happy_path_reaches_submitted() {
        let phase = SessionPhase::Loading
            .on(SessionEvent::Loaded)
            .and_then(|p| p.on(SessionEvent::SubmitRequested))
            .and_then(|p| p.on(SessionEvent::Aggregated));
        assert_eq!(phase, Some(SessionPhase::Submitted));
    }

    #[test]
    fn empty_load_is_terminal() {
        let phase = SessionPhase::Loading.on(SessionEvent::LoadedEmpty).unwrap();
        assert_eq!(phase, SessionPhase::NoContent);
        assert!(phase.is_terminal());
    }

    #[test]
    fn terminal_phases_accept_no_events() {
        for phase in PHASES.into_iter().filter(|p| p.is_terminal()) {
            for event in EVENTS {
                assert_eq!(phase.on(event), None, "{phase:?} accepted {event:?}");
            }
        }
    }

    #[test]
    fn table_has_exactly_five_edges() {
        let edges = PHASES
            .iter()
            .flat_map(|p| EVENTS.iter().filter_map(move |e| p.on(*e)))
            .count();
        assert_eq!(edges, 5);
    }

    #[test]
    fn cannot_submit_before_loading() {
        assert_eq!(SessionPhase::Loading.on(SessionEvent::SubmitRequested), None);
    }
}
