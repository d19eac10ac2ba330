//! Message-bus surface: request/reply listeners on the shared NATS bus.
//!
//! Two subjects, both on queue group `ms-go-rbac` so replicas share the
//! load. Malformed or failing requests reply `{ok:false, error}`; the
//! subscriber loops never panic.

use std::sync::Arc;

use async_nats::Client;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::services::PrincipalService;

const ASSIGN_ROLE_SUBJECT: &str = "rbac.assign-role";
const CHECK_ROLE_SUBJECT: &str = "rbac.checkRole";
const QUEUE_GROUP: &str = "ms-go-rbac";

#[derive(Debug, Deserialize)]
struct RoleMessage {
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    role: String,
}

#[derive(Debug, Serialize)]
struct BusReply {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl BusReply {
    fn ok(ok: bool) -> Self {
        Self { ok, error: None }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(message.into()),
        }
    }
}

/// Subscribe both subjects and spawn their listener loops.
pub async fn spawn_listeners(client: Client, principals: Arc<PrincipalService>) -> Result<()> {
    let assign_sub = client
        .queue_subscribe(ASSIGN_ROLE_SUBJECT, QUEUE_GROUP.to_string())
        .await
        .map_err(|e| AppError::Bus(e.to_string()))?;
    let check_sub = client
        .queue_subscribe(CHECK_ROLE_SUBJECT, QUEUE_GROUP.to_string())
        .await
        .map_err(|e| AppError::Bus(e.to_string()))?;

    {
        let client = client.clone();
        let principals = principals.clone();
        tokio::spawn(async move {
            let mut sub = assign_sub;
            while let Some(message) = sub.next().await {
                let Some(reply_to) = message.reply.clone() else {
                    continue;
                };
                let reply = handle_assign_role(&principals, &message.payload).await;
                publish_reply(&client, reply_to, &reply).await;
            }
        });
    }

    tokio::spawn(async move {
        let mut sub = check_sub;
        while let Some(message) = sub.next().await {
            let Some(reply_to) = message.reply.clone() else {
                continue;
            };
            let reply = handle_check_role(&principals, &message.payload).await;
            publish_reply(&client, reply_to, &reply).await;
        }
    });

    tracing::info!(
        subjects = ?[ASSIGN_ROLE_SUBJECT, CHECK_ROLE_SUBJECT],
        queue = QUEUE_GROUP,
        "NATS listeners started"
    );
    Ok(())
}

async fn handle_assign_role(principals: &PrincipalService, payload: &[u8]) -> BusReply {
    let request: RoleMessage = match serde_json::from_slice(payload) {
        Ok(request) => request,
        Err(_) => return BusReply::error("invalid payload"),
    };
    let user_id = request.user_id.trim();
    let role = request.role.trim();
    if user_id.is_empty() || role.is_empty() {
        return BusReply::error("user_id and role are required");
    }
    match principals.assign_role(user_id, role).await {
        Ok(()) => BusReply::ok(true),
        Err(err) => BusReply::error(err.to_string()),
    }
}

async fn handle_check_role(principals: &PrincipalService, payload: &[u8]) -> BusReply {
    let request: RoleMessage = match serde_json::from_slice(payload) {
        Ok(request) => request,
        Err(_) => return BusReply::error("invalid payload"),
    };
    match principals
        .check_role(request.user_id.trim(), &request.role)
        .await
    {
        Ok(allowed) => BusReply::ok(allowed),
        Err(err) => BusReply::error(err.to_string()),
    }
}

async fn publish_reply(client: &Client, reply_to: async_nats::Subject, reply: &BusReply) {
    let payload = serde_json::to_vec(reply).unwrap_or_default();
    if let Err(err) = client.publish(reply_to, payload.into()).await {
        tracing::warn!(error = %err, "failed to publish bus reply");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryPolicyStore;

    fn principals() -> Arc<PrincipalService> {
        Arc::new(PrincipalService::new(Arc::new(MemoryPolicyStore::new())))
    }

    #[tokio::test]
    async fn test_assign_role_round_trip() {
        let principals = principals();
        let reply =
            handle_assign_role(&principals, br#"{"user_id":"u1","role":"student"}"#).await;
        assert!(reply.ok);
        assert!(reply.error.is_none());

        let reply = handle_check_role(&principals, br#"{"user_id":"u1","role":"student"}"#).await;
        assert!(reply.ok);
    }

    #[tokio::test]
    async fn test_assign_role_rejects_malformed_payload() {
        let reply = handle_assign_role(&principals(), b"not json").await;
        assert!(!reply.ok);
        assert_eq!(reply.error.as_deref(), Some("invalid payload"));
    }

    #[tokio::test]
    async fn test_assign_role_requires_fields() {
        let reply = handle_assign_role(&principals(), br#"{"user_id":"  ","role":""}"#).await;
        assert!(!reply.ok);
        assert_eq!(reply.error.as_deref(), Some("user_id and role are required"));
    }

    #[tokio::test]
    async fn test_assign_unknown_role_reports_error() {
        let reply =
            handle_assign_role(&principals(), br#"{"user_id":"u1","role":"wizard"}"#).await;
        assert!(!reply.ok);
        assert!(reply.error.is_some());
    }

    #[tokio::test]
    async fn test_check_role_mirrors_allowed() {
        let reply = handle_check_role(&principals(), br#"{"user_id":"u1","role":"admin"}"#).await;
        assert!(!reply.ok);
        assert!(reply.error.is_none());
    }

    #[test]
    fn test_reply_serialization_omits_empty_error() {
        let json = serde_json::to_value(BusReply::ok(true)).unwrap();
        assert_eq!(json, serde_json::json!({"ok": true}));

        let json = serde_json::to_value(BusReply::error("boom")).unwrap();
        assert_eq!(json, serde_json::json!({"ok": false, "error": "boom"}));
    }
}
