use crate::client::ApiClient;
use crate::error::ApiError;
use crate::request::ApiRequest;
use crate::types::{ChecklistItem, ChecklistItemInput, ChecklistStatus};

impl ApiClient {
    pub async fn list_checklist_items(&self, event_id: i64) -> Result<Vec<ChecklistItem>, ApiError> {
        self.send_json(ApiRequest::get(format!("events/{event_id}/checklist/")))
            .await
    }

    pub async fn create_checklist_item(
        &self,
        event_id: i64,
        input: &ChecklistItemInput,
    ) -> Result<ChecklistItem, ApiError> {
        let request =
            ApiRequest::post(format!("events/{event_id}/checklist/create/")).json(input)?;
        self.send_json(request).await
    }

    pub async fn update_checklist_item(
        &self,
        item_id: i64,
        input: &ChecklistItemInput,
    ) -> Result<ChecklistItem, ApiError> {
        let request = ApiRequest::put(format!("events/checklist/{item_id}/update/")).json(input)?;
        self.send_json(request).await
    }

    /// Re-submits `item` with only its status changed.
    pub async fn set_checklist_status(
        &self,
        item: &ChecklistItem,
        status: ChecklistStatus,
    ) -> Result<ChecklistItem, ApiError> {
        let mut input = ChecklistItemInput::from(item);
        input.status = Some(status);
        self.update_checklist_item(item.id, &input).await
    }

    pub async fn delete_checklist_item(&self, item_id: i64) -> Result<(), ApiError> {
        self.send(ApiRequest::delete(format!(
            "events/checklist/{item_id}/delete/"
        )))
        .await?;
        Ok(())
    }
}
