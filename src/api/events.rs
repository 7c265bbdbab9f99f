use crate::client::ApiClient;
use crate::error::ApiError;
use crate::request::ApiRequest;
use crate::types::{Event, EventInput, EventSummary};

impl ApiClient {
    pub async fn list_events(&self) -> Result<Vec<Event>, ApiError> {
        self.send_json(ApiRequest::get("events/")).await
    }

    pub async fn create_event(&self, input: &EventInput) -> Result<Event, ApiError> {
        self.send_json(ApiRequest::post("events/create/").json(input)?)
            .await
    }

    pub async fn update_event(&self, event_id: i64, input: &EventInput) -> Result<Event, ApiError> {
        self.send_json(ApiRequest::put(format!("events/{event_id}/update/")).json(input)?)
            .await
    }

    pub async fn delete_event(&self, event_id: i64) -> Result<(), ApiError> {
        self.send(ApiRequest::delete(format!("events/{event_id}/delete/")))
            .await?;
        Ok(())
    }

    /// Budget, expense, checklist and attendance roll-up for one event.
    pub async fn event_summary(&self, event_id: i64) -> Result<EventSummary, ApiError> {
        self.send_json(ApiRequest::get(format!("events/{event_id}/summary/")))
            .await
    }
}
