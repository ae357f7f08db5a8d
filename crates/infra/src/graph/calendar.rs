//! Calendar view and event management for the signed-in user

use chrono::{DateTime, SecondsFormat, Utc};
use graphkit_domain::{CalendarEvent, GraphError, NewCalendarEvent};
use tracing::{info, instrument};

use super::GraphClient;

const PREFER_UTC: &str = "outlook.timezone=\"UTC\"";
const PREFER_PAGE_SIZE: &str = "odata.maxpagesize=50";

impl GraphClient {
    /// Occurrences between `start` and `end`, recurring events expanded.
    /// Times come back in UTC.
    #[instrument(skip(self))]
    pub async fn list_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, GraphError> {
        if end <= start {
            return Err(GraphError::InvalidInput(format!(
                "calendar window end ({end}) must be after start ({start})"
            )));
        }

        let query = [
            ("startDateTime", start.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("endDateTime", end.to_rfc3339_opts(SecondsFormat::Secs, true)),
        ];
        let prefer = format!("{PREFER_UTC}, {PREFER_PAGE_SIZE}");
        self.get_all("/me/calendarView", &query, &[("Prefer", prefer)]).await
    }

    pub async fn create_event(&self, event: &NewCalendarEvent) -> Result<CalendarEvent, GraphError> {
        let created: CalendarEvent = self.post_json("/me/events", event).await?;
        info!(event_id = %created.id, "calendar event created");
        Ok(created)
    }

    pub async fn delete_event(&self, event_id: &str) -> Result<(), GraphError> {
        self.delete(&format!("/me/events/{event_id}")).await?;
        info!(%event_id, "calendar event deleted");
        Ok(())
    }
}
