use crate::client::ApiClient;
use crate::error::ApiError;
use crate::request::ApiRequest;
use crate::types::{BudgetItem, BudgetItemInput};

impl ApiClient {
    pub async fn list_budget_items(&self, event_id: i64) -> Result<Vec<BudgetItem>, ApiError> {
        self.send_json(ApiRequest::get(format!("events/{event_id}/budget-items/")))
            .await
    }

    pub async fn create_budget_item(
        &self,
        event_id: i64,
        input: &BudgetItemInput,
    ) -> Result<BudgetItem, ApiError> {
        let request =
            ApiRequest::post(format!("events/{event_id}/budget-items/create/")).json(input)?;
        self.send_json(request).await
    }

    pub async fn update_budget_item(
        &self,
        item_id: i64,
        input: &BudgetItemInput,
    ) -> Result<BudgetItem, ApiError> {
        let request =
            ApiRequest::put(format!("events/budget-items/{item_id}/update/")).json(input)?;
        self.send_json(request).await
    }

    pub async fn delete_budget_item(&self, item_id: i64) -> Result<(), ApiError> {
        self.send(ApiRequest::delete(format!(
            "events/budget-items/{item_id}/delete/"
        )))
        .await?;
        Ok(())
    }
}
