//! Home page
//!
//! Shows a login link to anonymous visitors and the pattern form to
//! signed-in users.

use axum::{Form, Router, response::Html, routing::get};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::Deserialize;

use super::views::HomePage;
use crate::AppState;
use crate::auth::CurrentSession;
use crate::metrics::{PATTERN_INPUT_ERRORS_TOTAL, PATTERNS_RENDERED_TOTAL};
use crate::pattern::{build_pattern, parse_line_count};

/// India Standard Time, UTC+05:30 (no daylight saving)
const IST_OFFSET_SECONDS: i32 = 5 * 3600 + 30 * 60;

/// Create home router
///
/// Routes:
/// - GET / - Home page
/// - POST / - Generate a pattern
pub fn home_router() -> Router<AppState> {
    Router::new().route("/", get(show_home).post(submit_pattern))
}

/// Pattern form body
#[derive(Debug, Deserialize)]
struct PatternForm {
    #[serde(default)]
    lines: Option<String>,
}

/// Format `now` as wall-clock time in India
pub fn india_time(now: DateTime<Utc>) -> String {
    let ist = FixedOffset::east_opt(IST_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix());
    now.with_timezone(&ist).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// GET /
async fn show_home(CurrentSession(session): CurrentSession) -> Html<String> {
    let page = HomePage {
        user: session.user.as_ref(),
        india_time: session.user.as_ref().map(|_| india_time(Utc::now())),
        ..HomePage::default()
    };

    Html(page.render())
}

/// POST /
///
/// Anonymous submissions are ignored and get the plain home page.
async fn submit_pattern(
    CurrentSession(session): CurrentSession,
    form: Option<Form<PatternForm>>,
) -> Html<String> {
    let Some(user) = session.user.as_ref() else {
        return Html(HomePage::default().render());
    };

    let raw = form.and_then(|Form(form)| form.lines).unwrap_or_default();
    let mut page = HomePage {
        user: Some(user),
        india_time: Some(india_time(Utc::now())),
        ..HomePage::default()
    };

    match parse_line_count(&raw) {
        Ok(n) => {
            PATTERNS_RENDERED_TOTAL.inc();
            tracing::debug!(lines = n, "Rendering pattern");
            page.pattern_lines = Some(build_pattern(n));
        }
        Err(error) => {
            PATTERN_INPUT_ERRORS_TOTAL
                .with_label_values(&[error.reason()])
                .inc();
            page.error = Some(error.to_string());
        }
    }

    Html(page.render())
}
