use axum::{
    Extension, Router,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use futures::stream::{self, Stream};
use std::{convert::Infallible, sync::Arc, time::Duration};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use crate::api::AppState;
use crate::domain::UserId;
use crate::domain::events::NotificationEvent;
use crate::services::UserInfo;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/events", get(sse_handler))
}

/// One subscriber's view of the event bus.
struct Feed {
    rx: broadcast::Receiver<NotificationEvent>,
    viewer: UserId,
    is_admin: bool,
}

impl Feed {
    /// Waits for the next event this viewer may see. `None` once the bus closes.
    async fn next_frame(&mut self) -> Option<Event> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.is_visible_to(self.viewer, self.is_admin) => {
                    match Event::default().event(event.kind()).json_data(&event) {
                        Ok(frame) => return Some(frame),
                        Err(e) => warn!(error = %e, "Failed to encode {} event", event.kind()),
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(count)) => {
                    warn!(viewer = %self.viewer, "Event feed lagged by {count} messages");
                    return Some(Event::default().event("lagged").data(count.to_string()));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

/// GET /events
/// Streams lending notifications. Non-admins only receive catalog additions
/// and their own check-outs and check-ins.
async fn sse_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<UserInfo>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let feed = Feed {
        rx: state.event_bus().subscribe(),
        viewer: user.id,
        is_admin: user.is_admin(),
    };
    debug!(viewer = %user.id, admin = feed.is_admin, "Event feed opened");

    let stream = stream::unfold(feed, |mut feed| async move {
        let frame = feed.next_frame().await?;
        Some((Ok(frame), feed))
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
