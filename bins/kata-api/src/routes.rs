use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::handlers;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/questions/daily-challenge", get(handlers::daily_challenge))
        .route("/api/questions/single/:id", get(handlers::get_question))
        .route("/api/questions/submit-solution", post(handlers::submit_solution))
        .route("/api/questions/ai-guidance", post(handlers::ai_guidance))
        .route("/api/questions/:language/:level", get(handlers::list_questions))
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeModel, ScriptedJudge};
    use kata_common::config::Config;
    use kata_common::repository::InMemoryQuestionRepository;

    #[test]
    fn test_router_builds_with_state() {
        let config = Config::from_lookup(|_| None).expect("default config");
        let state = Arc::new(AppState::new(
            &config,
            Arc::new(InMemoryQuestionRepository::new()),
            Arc::new(ScriptedJudge::new()),
            Arc::new(FakeModel::new()),
        ));

        let _app: Router = Router::new().merge(routes()).with_state(state);
    }
}
