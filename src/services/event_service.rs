//! Event service

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{Event, NewEvent, Principal, Team},
    services::membership_service::load_event,
    state::AppState,
    utils::{sanitize_string, validate_event_window},
};

/// Event service for business logic
pub struct EventService;

impl EventService {
    /// Create a new event
    #[tracing::instrument(skip(state, payload), fields(name = %payload.name))]
    pub async fn create_event(state: &AppState, organizer: Principal, payload: NewEvent) -> AppResult<Event> {
        if !organizer.role.can_organize() {
            return Err(AppError::Forbidden("Only organizers can create events".to_string()));
        }

        payload.validate()?;
        validate_event_window(payload.start_date, payload.end_date, payload.submission_deadline)
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let name = sanitize_string(&payload.name);
        if name.is_empty() {
            return Err(AppError::Validation("Event name cannot be blank".to_string()));
        }

        let event = Event::new(
            name,
            payload.description.as_deref().map(sanitize_string),
            payload.location.as_deref().map(sanitize_string),
            payload.start_date,
            payload.end_date,
            payload.submission_deadline,
        );
        let event = state.store().insert_event(&event).await?;

        info!(event_id = %event.id, organizer_id = %organizer.id, "Event created");
        Ok(event)
    }

    /// Get event by ID
    pub async fn get_event(state: &AppState, event_id: Uuid) -> AppResult<Event> {
        load_event(state, event_id).await
    }

    /// Teams registered on an event, in registration order
    pub async fn teams_for_event(state: &AppState, event_id: Uuid) -> AppResult<Vec<Team>> {
        let event = load_event(state, event_id).await?;
        let mut teams = Vec::with_capacity(event.teams.len());
        for team_id in &event.teams {
            if let Some(team) = state.store().team(*team_id).await? {
                teams.push(team);
            }
        }
        Ok(teams)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::models::EventStatus;
    use crate::test_utils::{engine, Harness};

    fn payload(name: &str) -> NewEvent {
        let start = Utc::now() + Duration::days(3);
        NewEvent {
            name: name.to_string(),
            description: Some("  Build something \u{0007}fun  ".to_string()),
            location: None,
            start_date: start,
            end_date: start + Duration::hours(36),
            submission_deadline: start + Duration::hours(30),
        }
    }

    #[tokio::test]
    async fn test_create_event() {
        let state = engine(EventStatus::Upcoming);
        let organizer = Principal::organizer(Uuid::new_v4());

        let event = EventService::create_event(&state, organizer, payload("  Autumn Hack "))
            .await
            .unwrap();

        assert_eq!(event.name, "Autumn Hack");
        assert_eq!(event.description.as_deref(), Some("Build something fun"));
        assert!(!event.released_judging);
        assert_eq!(EventService::get_event(&state, event.id).await.unwrap().id, event.id);
    }

    #[tokio::test]
    async fn test_create_event_rules() {
        let state = engine(EventStatus::Upcoming);

        let err = EventService::create_event(&state, Principal::participant(Uuid::new_v4()), payload("Hack"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let organizer = Principal::organizer(Uuid::new_v4());
        let mut backwards = payload("Hack");
        backwards.end_date = backwards.start_date - Duration::hours(1);
        let err = EventService::create_event(&state, organizer, backwards).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = EventService::create_event(&state, organizer, payload("   ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_teams_for_event() {
        let h = Harness::new();
        let event = h.event().await;
        let (_, t1) = h.enroll(event.id).await;
        let (_, t2) = h.enroll(event.id).await;

        let teams = EventService::teams_for_event(&h.state, event.id).await.unwrap();
        let ids: Vec<Uuid> = teams.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![t1.id, t2.id]);
    }
}
