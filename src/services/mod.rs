//! Business logic services
//!
//! Every mutating operation on an event runs under that event's lock and is
//! retried as a whole when a compare-and-set write loses to another process.

pub mod coordination;
pub mod enrollment_service;
pub mod event_service;
pub mod join_code;
pub mod judging_service;
pub mod membership_service;
pub mod project_service;
pub mod release_service;

pub use enrollment_service::EnrollmentService;
pub use event_service::EventService;
pub use join_code::allocate_join_code;
pub use judging_service::JudgingService;
pub use membership_service::MembershipService;
pub use project_service::ProjectService;
pub use release_service::{rank_projects, RankedProject, ReleaseOutcome, ReleaseService};
