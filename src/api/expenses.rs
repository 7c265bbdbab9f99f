use crate::client::ApiClient;
use crate::error::ApiError;
use crate::request::ApiRequest;
use crate::types::{Expense, ExpenseInput};

impl ApiClient {
    pub async fn list_expenses(&self, event_id: i64) -> Result<Vec<Expense>, ApiError> {
        self.send_json(ApiRequest::get(format!("events/{event_id}/expenses/")))
            .await
    }

    pub async fn create_expense(
        &self,
        event_id: i64,
        input: &ExpenseInput,
    ) -> Result<Expense, ApiError> {
        let request = ApiRequest::post(format!("events/{event_id}/expenses/create/")).json(input)?;
        self.send_json(request).await
    }

    pub async fn update_expense(
        &self,
        expense_id: i64,
        input: &ExpenseInput,
    ) -> Result<Expense, ApiError> {
        let request = ApiRequest::put(format!("events/expenses/{expense_id}/update/")).json(input)?;
        self.send_json(request).await
    }

    pub async fn delete_expense(&self, expense_id: i64) -> Result<(), ApiError> {
        self.send(ApiRequest::delete(format!(
            "events/expenses/{expense_id}/delete/"
        )))
        .await?;
        Ok(())
    }
}
