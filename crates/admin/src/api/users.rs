use fernhouse_core::{User, UserId};
use tracing::instrument;

use super::types::{CountResponse, MessageResponse, UserListResponse};
use super::{AdminClient, ApiError};

impl AdminClient {
    /// One page (1-based) of registered users.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is malformed.
    #[instrument(skip(self, token))]
    pub async fn list_users(&self, token: &str, page: u32) -> Result<Vec<User>, ApiError> {
        let request = self.get(token, "auth/all-users")?.query(&[("page", page)]);
        let response: UserListResponse = self.execute(request).await?;
        Ok(response.users)
    }

    /// Total number of registered users.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is malformed.
    #[instrument(skip_all)]
    pub async fn user_count(&self, token: &str) -> Result<u64, ApiError> {
        let response: CountResponse = self.execute(self.get(token, "auth/users-count")?).await?;
        Ok(response.total)
    }

    /// Delete a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend does not confirm the delete.
    #[instrument(skip(self, token))]
    pub async fn delete_user(&self, token: &str, id: &UserId) -> Result<(), ApiError> {
        let path = format!("auth/delete-user/{}", urlencoding::encode(id.as_str()));
        let _: MessageResponse = self.execute(self.delete(token, &path)?).await?;
        Ok(())
    }
}
