use crate::client::ApiClient;
use crate::error::ApiError;
use crate::request::ApiRequest;
use crate::types::{NewTeamMember, Role, TeamMember};

impl ApiClient {
    /// Members of the caller's organization. Empty unless the caller is an
    /// account manager.
    pub async fn list_team(&self) -> Result<Vec<TeamMember>, ApiError> {
        self.send_json(ApiRequest::get("accounts/team/")).await
    }

    pub async fn create_team_member(&self, member: &NewTeamMember) -> Result<TeamMember, ApiError> {
        if member.role == Role::AccountManager {
            return Err(ApiError::InvalidRequest(
                "only Team Lead or Team Member accounts can be created".to_string(),
            ));
        }
        self.send_json(ApiRequest::post("accounts/team/create/").json(member)?)
            .await
    }

    pub async fn delete_team_member(&self, user_id: i64) -> Result<(), ApiError> {
        self.send(ApiRequest::delete(format!("accounts/team/delete/{user_id}/")))
            .await?;
        Ok(())
    }
}
