//! User management. Requests run on the primary of the system database.

use std::sync::Arc;

use graphwire_cluster::ClusterRouter;
use graphwire_rpc::proto;
use graphwire_rpc::{DriverResult, ServerStub};
use tracing::info;

#[derive(Debug, Clone)]
pub struct UserManager {
    router: Arc<ClusterRouter>,
}

impl UserManager {
    pub(crate) fn new(router: Arc<ClusterRouter>) -> Self {
        Self { router }
    }

    pub async fn all(&self) -> DriverResult<Vec<User>> {
        let res = self
            .router
            .run_system(|stub: Arc<ServerStub>| async move {
                stub.users_all(proto::UsersAllReq {}).await
            })
            .await?;
        Ok(res
            .users
            .into_iter()
            .map(|info| User::from_proto(self.router.clone(), info))
            .collect())
    }

    pub async fn contains(&self, username: &str) -> DriverResult<bool> {
        let res = self
            .router
            .run_system(|stub: Arc<ServerStub>| {
                let request = proto::UsersContainsReq {
                    username: username.to_string(),
                };
                async move { stub.users_contains(request).await }
            })
            .await?;
        Ok(res.contains)
    }

    pub async fn create(&self, username: &str, password: &str) -> DriverResult<()> {
        self.router
            .run_system(|stub: Arc<ServerStub>| {
                let request = proto::UsersCreateReq {
                    username: username.to_string(),
                    password: password.to_string(),
                };
                async move { stub.users_create(request).await }
            })
            .await?;
        info!(username, "user created");
        Ok(())
    }

    pub async fn delete(&self, username: &str) -> DriverResult<()> {
        self.router
            .run_system(|stub: Arc<ServerStub>| {
                let request = proto::UsersDeleteReq {
                    username: username.to_string(),
                };
                async move { stub.users_delete(request).await }
            })
            .await?;
        info!(username, "user deleted");
        Ok(())
    }

    pub async fn get(&self, username: &str) -> DriverResult<Option<User>> {
        let res = self
            .router
            .run_system(|stub: Arc<ServerStub>| {
                let request = proto::UsersGetReq {
                    username: username.to_string(),
                };
                async move { stub.users_get(request).await }
            })
            .await?;
        Ok(res
            .user
            .map(|info| User::from_proto(self.router.clone(), info)))
    }

    /// Set a user's password without knowing the old one (admin only).
    pub async fn set_password(&self, username: &str, password: &str) -> DriverResult<()> {
        self.router
            .run_system(|stub: Arc<ServerStub>| {
                let request = proto::UsersPasswordSetReq {
                    username: username.to_string(),
                    password: password.to_string(),
                };
                async move { stub.users_password_set(request).await }
            })
            .await?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct User {
    username: String,
    password_expiry_seconds: Option<i64>,
    router: Arc<ClusterRouter>,
}

impl User {
    fn from_proto(router: Arc<ClusterRouter>, info: proto::UserInfo) -> Self {
        Self {
            username: info.username,
            password_expiry_seconds: info.password_expiry_seconds,
            router,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Seconds until the password expires, if it expires at all.
    pub fn password_expiry_seconds(&self) -> Option<i64> {
        self.password_expiry_seconds
    }

    pub async fn password_update(&self, old: &str, new: &str) -> DriverResult<()> {
        self.router
            .run_system(|stub: Arc<ServerStub>| {
                let request = proto::UserPasswordUpdateReq {
                    username: self.username.clone(),
                    password_old: old.to_string(),
                    password_new: new.to_string(),
                };
                async move { stub.user_password_update(request).await }
            })
            .await?;
        info!(username = %self.username, "password updated");
        Ok(())
    }
}
