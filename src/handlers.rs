use crate::capture::{CaptureError, CaptureSession};
use crate::errors::AppError;
use crate::models::{
    CaptureForm, CaptureRequest, EntryView, FoodEntry, FoodLogResponse, GroupView, GroupsResponse,
    NoticeQuery, Rating, TodayResponse, WorkoutCompleteRequest,
};
use crate::presenter::{TODAY_STRIP_MAX, format_clock_time, group_by_display_date, today_slice};
use crate::state::AppState;
use crate::ui::{Notice, render_food_log, render_index};
use crate::workout::{self, Celebration, WorkoutKind};
use axum::{
    Form, Json,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, Redirect},
};
use chrono::Utc;
use tracing::warn;

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<NoticeQuery>,
) -> Html<String> {
    let log = state.store.load().await;
    let today = today_slice(&log, TODAY_STRIP_MAX);
    let celebration = workout::take_celebration(state.storage(), now_ms()).await;
    let notice = query.notice.as_deref().and_then(Notice::parse);
    Html(render_index(&today, notice, celebration.as_ref()))
}

pub async fn food_log_page(State(state): State<AppState>) -> Html<String> {
    let log = state.store.load().await;
    Html(render_food_log(&group_by_display_date(&log)))
}

pub async fn capture_form(
    State(state): State<AppState>,
    Form(form): Form<CaptureForm>,
) -> Redirect {
    let Ok(rating) = form.rating.parse::<Rating>() else {
        return Redirect::to(Notice::InvalidRating.redirect_path());
    };

    let mut session = CaptureSession::new();
    if let Err(err) = session.capture(form.image) {
        let notice = match err {
            CaptureError::Missing => Notice::NoImage,
            CaptureError::Malformed => Notice::InvalidImage,
        };
        return Redirect::to(notice.redirect_path());
    }
    let Some(entry) = session.rate(rating, now_ms()) else {
        return Redirect::to(Notice::NoImage.redirect_path());
    };

    match state.store.append(entry).await {
        Ok(()) => Redirect::to("/"),
        Err(err) => {
            warn!("food entry from form not saved: {err}");
            Redirect::to(Notice::SaveFailed.redirect_path())
        }
    }
}

pub async fn get_log(State(state): State<AppState>) -> Json<FoodLogResponse> {
    Json(FoodLogResponse {
        entries: state.store.load().await,
    })
}

pub async fn get_today(State(state): State<AppState>) -> Json<TodayResponse> {
    let log = state.store.load().await;
    let entries = today_slice(&log, TODAY_STRIP_MAX)
        .into_iter()
        .map(|entry| to_view(entry, entry.rating.strip_caption()))
        .collect();
    Json(TodayResponse { entries })
}

pub async fn get_groups(State(state): State<AppState>) -> Json<GroupsResponse> {
    let log = state.store.load().await;
    let groups = group_by_display_date(&log)
        .into_iter()
        .map(|group| GroupView {
            label: group.label,
            entries: group
                .entries
                .into_iter()
                .map(|entry| to_view(entry, entry.rating.log_caption()))
                .collect(),
        })
        .collect();
    Json(GroupsResponse { groups })
}

pub async fn capture(
    State(state): State<AppState>,
    Json(payload): Json<CaptureRequest>,
) -> Result<(StatusCode, Json<FoodEntry>), AppError> {
    let mut session = CaptureSession::new();
    session
        .capture(payload.image)
        .map_err(|err| AppError::bad_request(err.to_string()))?;
    let entry = session
        .rate(payload.rating, now_ms())
        .ok_or_else(|| AppError::bad_request("no image captured"))?;

    state.store.append(entry.clone()).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn workout_complete(
    State(state): State<AppState>,
    Json(payload): Json<WorkoutCompleteRequest>,
) -> Result<StatusCode, AppError> {
    let kind = payload
        .workout
        .parse::<WorkoutKind>()
        .map_err(AppError::bad_request)?;

    workout::store_completion(
        state.storage(),
        kind,
        payload.points,
        payload.feedback,
        now_ms(),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn workout_celebration(State(state): State<AppState>) -> Json<Option<Celebration>> {
    Json(workout::take_celebration(state.storage(), now_ms()).await)
}

fn to_view(entry: &FoodEntry, caption: &'static str) -> EntryView {
    EntryView {
        id: entry.id.clone(),
        image: entry.image.clone(),
        rating: entry.rating,
        timestamp: entry.timestamp,
        time: format_clock_time(entry.timestamp),
        caption,
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
