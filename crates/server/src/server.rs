use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{accounts, families, forecasts, statistics, transactions, user};
use engine::{Engine, users};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

async fn auth(
    auth_header: TypedHeader<Authorization<Basic>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user: Option<users::Model> = users::Entity::find()
        .filter(users::Column::Username.eq(auth_header.username()))
        .filter(users::Column::Password.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let Some(user) = user else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/accounts", post(accounts::create).get(accounts::list))
        .route(
            "/accounts/{id}",
            axum::routing::patch(accounts::update).delete(accounts::delete),
        )
        .route("/accounts/recompute", post(accounts::recompute))
        .route("/income", post(transactions::income_new))
        .route("/expense", post(transactions::expense_new))
        .route("/transfer", post(transactions::transfer_new))
        .route("/transactions", get(transactions::list))
        .route(
            "/transactions/{id}",
            get(transactions::get_detail)
                .patch(transactions::update)
                .delete(transactions::delete),
        )
        .route(
            "/transactions/{id}/occurrences",
            get(transactions::occurrences),
        )
        .route("/families", post(families::create).get(families::list))
        .route(
            "/families/{family_id}/members",
            get(families::list_members).post(families::upsert_member),
        )
        .route(
            "/families/{family_id}/members/{username}",
            axum::routing::delete(families::remove_member),
        )
        .route("/stats", get(statistics::get_stats))
        .route("/forecast", get(forecasts::get_forecast))
        .route("/user/me", get(user::me))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Engine, db: DatabaseConnection) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode, header};
    use base64::Engine as _;
    use http_body_util::BodyExt;
    use migration::MigratorTrait;
    use sea_orm::{ConnectionTrait, Database, Statement};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;

    async fn test_router() -> Router {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let backend = db.get_database_backend();
        for (username, role) in [("alice", "user"), ("bob", "user"), ("root", "admin")] {
            db.execute(Statement::from_sql_and_values(
                backend,
                "INSERT INTO users (username, password, role) VALUES (?, ?, ?)",
                vec![username.into(), "password".into(), role.into()],
            ))
            .await
            .unwrap();
        }
        let engine = Engine::builder().database(db.clone()).build().await.unwrap();
        router(ServerState {
            engine: Arc::new(engine),
            db,
        })
    }

    fn basic_auth(username: &str) -> String {
        let encoded =
            base64::engine::general_purpose::STANDARD.encode(format!("{username}:password"));
        format!("Basic {encoded}")
    }

    fn request(method: &str, uri: &str, username: &str, body: Option<Value>) -> HttpRequest<Body> {
        let builder = HttpRequest::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, basic_auth(username))
            .header(header::CONTENT_TYPE, "application/json");
        match body {
            Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn rejects_unknown_credentials() {
        let app = test_router().await;
        let response = app
            .oneshot(request("GET", "/user/me", "mallory", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_account_and_record_income() {
        let app = test_router().await;

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/accounts",
                "alice",
                Some(json!({
                    "name": "Checking",
                    "kind": "checking",
                    "opening_balance_minor": 10_000,
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let account_id = json_body(response).await["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/income",
                "alice",
                Some(json!({
                    "account_id": account_id,
                    "amount_minor": 2_500,
                    "occurred_on": "2025-01-10",
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(request("GET", "/stats", "alice", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let stats = json_body(response).await;
        assert_eq!(stats["balance_minor"], 12_500);
    }

    #[tokio::test]
    async fn overdraft_is_policy_checked_but_admins_bypass() {
        let app = test_router().await;

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/accounts",
                "alice",
                Some(json!({"name": "Wallet", "kind": "checking", "opening_balance_minor": 100})),
            ))
            .await
            .unwrap();
        let account_id = json_body(response).await["id"].as_str().unwrap().to_string();

        let overdraw = json!({
            "account_id": account_id,
            "amount_minor": 5_000,
            "occurred_on": "2025-01-10",
        });

        let response = app
            .clone()
            .oneshot(request("POST", "/expense", "alice", Some(overdraw.clone())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        // A corrective entry by an admin is not blocked by the policy check.
        let response = app
            .oneshot(request("POST", "/expense", "root", Some(overdraw)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn strangers_cannot_touch_other_users_accounts() {
        let app = test_router().await;

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/accounts",
                "alice",
                Some(json!({"name": "Private", "kind": "savings"})),
            ))
            .await
            .unwrap();
        let account_id = json_body(response).await["id"].as_str().unwrap().to_string();

        let response = app
            .oneshot(request(
                "POST",
                "/income",
                "bob",
                Some(json!({
                    "account_id": account_id,
                    "amount_minor": 1_000,
                    "occurred_on": "2025-01-10",
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn family_editor_can_write_member_accounts() {
        let app = test_router().await;

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/accounts",
                "alice",
                Some(json!({"name": "Shared", "kind": "checking", "opening_balance_minor": 10_000})),
            ))
            .await
            .unwrap();
        let account_id = json_body(response).await["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/families",
                "alice",
                Some(json!({"name": "Smiths"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let family_id = json_body(response).await["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                &format!("/families/{family_id}/members"),
                "alice",
                Some(json!({"username": "bob", "role": "editor"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(request(
                "POST",
                "/expense",
                "bob",
                Some(json!({
                    "account_id": account_id,
                    "amount_minor": 500,
                    "occurred_on": "2025-01-10",
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
