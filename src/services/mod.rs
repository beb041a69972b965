/// Achievement detection over pre-submission statistics.
pub mod achievements;
/// OpenAPI documentation generation.
pub mod documentation;
/// Core gameplay flow: lifecycle, questions, answers.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Background eviction of finished and abandoned sessions.
pub mod reaper;
/// Deterministic scoring rules.
pub mod scoring;
/// Session creation, lookup, configuration, and scoreboard.
pub mod session_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage connection supervision and degraded mode handling.
pub mod storage_supervisor;
