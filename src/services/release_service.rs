//! Judging release
//!
//! Releasing an event's judging ranks every submitted project by its average
//! judge score, persists the rankings, sets the event's one-way release latch
//! and then hands result notifications to the notifier in the background.
//!
//! Rankings are dense (1..N) in descending average order. Equal averages keep
//! submission order.

use std::cmp::Ordering;

use futures::future::join_all;
use serde::Serialize;
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    constants::WINNER_RANK_CUTOFF,
    error::{AppError, AppResult},
    models::{Event, Principal, Project},
    notify::{MessageKind, Notification},
    services::{
        coordination::with_retry, judging_service::JudgingService, membership_service::load_event,
    },
    state::AppState,
};

/// One project's place in the final standings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedProject {
    pub project_id: Uuid,
    pub team_id: Uuid,
    pub name: String,
    pub average_score: f64,
    pub ranking: i32,
}

/// Result of a release call
#[derive(Debug)]
pub struct ReleaseOutcome {
    pub event_id: Uuid,
    pub rankings: Vec<RankedProject>,
    /// False when judging had already been released
    pub newly_released: bool,
    /// Background notification hand-off; resolves to the number of
    /// notifications accepted. `None` on repeat calls.
    pub dispatch: Option<JoinHandle<usize>>,
}

/// Release service for business logic
pub struct ReleaseService;

impl ReleaseService {
    /// Rank the event's submitted projects and announce the results.
    ///
    /// Repeat calls return the stored rankings and send nothing.
    #[tracing::instrument(skip(state))]
    pub async fn release_judging(
        state: &AppState,
        organizer: Principal,
        event_id: Uuid,
    ) -> AppResult<ReleaseOutcome> {
        if !organizer.role.can_organize() {
            return Err(AppError::Forbidden(
                "Only organizers can release judging".to_string(),
            ));
        }

        let (event, rankings, newly_released) = {
            let _guard = state.lock_event(event_id).await;
            with_retry(
                state.config().storage_retry_attempts,
                "release_judging",
                move || Self::try_release(state, event_id),
            )
            .await?
        };

        let dispatch = newly_released.then(|| {
            let state = state.clone();
            let rankings = rankings.clone();
            tokio::spawn(async move { dispatch_results(&state, &event, &rankings).await })
        });

        Ok(ReleaseOutcome {
            event_id,
            rankings,
            newly_released,
            dispatch,
        })
    }

    async fn try_release(state: &AppState, event_id: Uuid) -> AppResult<(Event, Vec<RankedProject>, bool)> {
        let store = state.store();
        let mut event = load_event(state, event_id).await?;
        let projects = submitted_projects(state, &event).await?;

        if event.released_judging {
            debug!(%event_id, "Judging already released");
            let rankings = persisted_rankings(state, projects).await?;
            return Ok((event, rankings, false));
        }

        let mut scored = Vec::with_capacity(projects.len());
        for project in projects {
            let average = JudgingService::compute_average(state, project.id).await?;
            scored.push((project, average));
        }
        let mut rankings = rank_projects(&scored);

        for ((mut project, _), ranked) in scored.into_iter().zip(&rankings) {
            debug_assert_eq!(project.id, ranked.project_id);
            if project.ranking != Some(ranked.ranking) {
                project.ranking = Some(ranked.ranking);
                store.update_project(&project).await?;
            }
        }
        rankings.sort_by_key(|r| r.ranking);

        event.released_judging = true;
        let event = store.update_event(&event).await?;

        info!(%event_id, projects = rankings.len(), "Judging released");
        Ok((event, rankings, true))
    }

    /// Stored rankings of a released event, best first
    pub async fn standings(state: &AppState, event_id: Uuid) -> AppResult<Vec<RankedProject>> {
        let event = load_event(state, event_id).await?;
        let projects = submitted_projects(state, &event).await?;
        persisted_rankings(state, projects).await
    }
}

/// Order scored projects by average, highest first, and number them.
///
/// `scored` must be in submission order; the sort is stable, so ties keep it.
/// The returned list is in the same order as `scored`.
pub fn rank_projects(scored: &[(Project, f64)]) -> Vec<RankedProject> {
    let mut order: Vec<usize> = (0..scored.len()).collect();
    order.sort_by(|&a, &b| descending(scored[a].1, scored[b].1));

    let mut ranks = vec![0; scored.len()];
    for (position, index) in order.into_iter().enumerate() {
        ranks[index] = position as i32 + 1;
    }

    scored
        .iter()
        .zip(ranks)
        .map(|((project, average), ranking)| RankedProject {
            project_id: project.id,
            team_id: project.team_id,
            name: project.name.clone(),
            average_score: *average,
            ranking,
        })
        .collect()
}

fn descending(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// Submitted projects in submission order
async fn submitted_projects(state: &AppState, event: &Event) -> AppResult<Vec<Project>> {
    let mut projects = Vec::with_capacity(event.projects.len());
    for project_id in &event.projects {
        match state.store().project(*project_id).await? {
            Some(project) => projects.push(project),
            None => warn!(event_id = %event.id, %project_id, "Submitted project is missing"),
        }
    }
    Ok(projects)
}

async fn persisted_rankings(state: &AppState, projects: Vec<Project>) -> AppResult<Vec<RankedProject>> {
    let mut rankings = Vec::new();
    for project in projects {
        let Some(ranking) = project.ranking else {
            continue;
        };
        let average_score = JudgingService::compute_average(state, project.id).await?;
        rankings.push(RankedProject {
            project_id: project.id,
            team_id: project.team_id,
            name: project.name,
            average_score,
            ranking,
        });
    }
    rankings.sort_by_key(|r| r.ranking);
    Ok(rankings)
}

/// Hand one notification per ranked team member to the notifier.
///
/// Failures are logged and skipped. Returns how many were accepted.
async fn dispatch_results(state: &AppState, event: &Event, rankings: &[RankedProject]) -> usize {
    let notifier = state.notifier();
    let mut delivered = 0;

    for ranked in rankings {
        let members = match state.store().team(ranked.team_id).await {
            Ok(Some(team)) => team.members,
            Ok(None) => {
                warn!(team_id = %ranked.team_id, "Ranked team no longer exists");
                continue;
            }
            Err(e) => {
                warn!(team_id = %ranked.team_id, error = %e, "Could not load ranked team");
                continue;
            }
        };

        let kind = if ranked.ranking <= WINNER_RANK_CUTOFF {
            MessageKind::Winner
        } else {
            MessageKind::Participant
        };

        let sends = members.into_iter().map(|participant_id| {
            let notification = Notification {
                participant_id,
                kind,
                template_data: json!({
                    "event_id": event.id,
                    "event_name": event.name,
                    "project_id": ranked.project_id,
                    "project_name": ranked.name,
                    "ranking": ranked.ranking,
                    "average_score": ranked.average_score,
                }),
            };
            let notifier = &notifier;
            async move { (participant_id, notifier.notify(notification).await) }
        });

        for (participant_id, result) in join_all(sends).await {
            match result {
                Ok(()) => delivered += 1,
                Err(e) => warn!(%participant_id, error = %e, "Failed to hand off notification"),
            }
        }
    }

    info!(event_id = %event.id, delivered, "Result notifications dispatched");
    delivered
}
