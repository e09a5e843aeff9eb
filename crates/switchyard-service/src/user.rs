//! User routes.

use std::time::Duration;

use http::StatusCode;
use switchyard_core::{BoxedHandler, Context};
use switchyard_middleware::Routable;
use switchyard_router::RouteError;

use crate::dto::{ApiResponse, ListQuery, User};
use crate::endpoint;

/// Serves the user list and sign-up.
#[derive(Debug, Clone, Default)]
pub struct UserService {
    users: Vec<User>,
}

impl UserService {
    /// Creates the service with the built-in users.
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: vec![
                User {
                    name: "one".to_string(),
                    age: 10,
                },
                User {
                    name: "two".to_string(),
                    age: 20,
                },
            ],
        }
    }

    /// Lists users. `?delay=<ms>` waits before answering.
    pub async fn list(&self, ctx: &mut Context) {
        let delay = ctx.query::<ListQuery>().unwrap_or_default().delay_ms();
        tracing::debug!(delay_ms = delay, "listing users");

        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        ctx.write_json(StatusCode::OK, &ApiResponse::with_data(&self.users));
    }

    /// Accepts a JSON `{name, age}` body.
    pub async fn sign_up(&self, ctx: &mut Context) {
        let user: User = match ctx.read_json() {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "invalid sign-up body");
                ctx.writer().write_header(StatusCode::BAD_REQUEST);
                return;
            }
        };

        tracing::info!(name = %user.name, "user signed up");
        ctx.write_json(StatusCode::OK, &ApiResponse::success());
    }
}

/// Registers `GET /user/list`, `GET /user/*` and `POST /user/signup`.
///
/// # Errors
///
/// Returns [`RouteError`] if a path is rejected.
pub fn register_user_service(
    router: &mut dyn Routable,
    service: UserService,
) -> Result<(), RouteError> {
    let service = std::sync::Arc::new(service);

    let list: BoxedHandler = endpoint(&service, |svc, ctx| {
        Box::pin(async move { svc.list(ctx).await })
    });
    let sign_up = endpoint(&service, |svc, ctx| {
        Box::pin(async move { svc.sign_up(ctx).await })
    });

    router.get("/user/list", vec![list.clone()])?;
    router.get("/user/*", vec![list])?;
    router.post("/user/signup", vec![sign_up])?;
    Ok(())
}
