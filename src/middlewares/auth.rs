use crate::error::{AppError, AppResult};
use crate::utils::JwtService;
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage, HttpRequest,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use std::future::{Ready, ready};
use utoipa::ToSchema;

/// Role carried in the bearer token
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    EventLeader,
}

/// Authenticated caller, stored in request extensions by [`AuthMiddleware`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

// Paths reachable without a bearer token
struct PublicPaths {
    exact_paths: Vec<&'static str>,
    prefix_paths: Vec<&'static str>,
}

impl PublicPaths {
    fn new() -> Self {
        Self {
            exact_paths: vec!["/swagger-ui", "/swagger-ui/", "/api-docs/openapi.json"],
            prefix_paths: vec!["/swagger-ui/", "/api-docs/", "/api/v1/public/", "/webhook/"],
        }
    }

    fn is_public_path(&self, path: &str) -> bool {
        if self.exact_paths.contains(&path) {
            return true;
        }

        self.prefix_paths
            .iter()
            .any(|&prefix| path.starts_with(prefix))
    }
}

/// Minimum role required for a path, by prefix
fn required_role(path: &str) -> Option<UserRole> {
    if path.starts_with("/api/v1/admin") {
        Some(UserRole::Admin)
    } else if path.starts_with("/api/v1/leader") {
        Some(UserRole::EventLeader)
    } else {
        None
    }
}

fn role_allows(role: UserRole, required: Option<UserRole>) -> bool {
    match required {
        None => true,
        Some(UserRole::Admin) => role == UserRole::Admin,
        // admins can do anything a leader can
        Some(UserRole::EventLeader) => true,
    }
}

pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
            public_paths: PublicPaths::new(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
    public_paths: PublicPaths,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // CORS preflight
        if req.method() == Method::OPTIONS {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let path = req.path().to_string();

        if self.public_paths.is_public_path(&path) {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let token = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        let Some(token) = token else {
            return Box::pin(async move { Err(AppError::NotAuthenticated.into()) });
        };

        let claims = match self.jwt_service.verify_access_token(token) {
            Ok(claims) => claims,
            Err(e) => {
                log::debug!("Rejected bearer token on {path}: {e}");
                return Box::pin(async move { Err(AppError::NotAuthenticated.into()) });
            }
        };

        let Ok(user_id) = claims.sub.parse::<i64>() else {
            return Box::pin(async move { Err(AppError::NotAuthenticated.into()) });
        };

        if !role_allows(claims.role, required_role(&path)) {
            log::warn!("User {user_id} ({:?}) denied access to {path}", claims.role);
            return Box::pin(async move { Err(AppError::Forbidden.into()) });
        }

        req.extensions_mut().insert(AuthUser {
            id: user_id,
            role: claims.role,
        });
        let fut = self.service.call(req);
        Box::pin(fut)
    }
}

/// Caller identity set by [`AuthMiddleware`]; missing means the route was not protected
pub fn current_user(req: &HttpRequest) -> AppResult<AuthUser> {
    req.extensions()
        .get::<AuthUser>()
        .copied()
        .ok_or(AppError::NotAuthenticated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use actix_web::{App, HttpResponse, web};

    async fn whoami(req: HttpRequest) -> HttpResponse {
        match current_user(&req) {
            Ok(user) => HttpResponse::Ok().body(user.id.to_string()),
            Err(_) => HttpResponse::Ok().body("anonymous"),
        }
    }

    fn bearer(jwt: &JwtService, id: i64, role: UserRole) -> String {
        format!(
            "Bearer {}",
            jwt.generate_access_token(id, role, 3600).unwrap()
        )
    }

    #[test]
    fn public_paths_match_prefixes() {
        let paths = PublicPaths::new();
        assert!(paths.is_public_path("/api/v1/public/events/retreat"));
        assert!(paths.is_public_path("/webhook/stripe"));
        assert!(paths.is_public_path("/swagger-ui/"));
        assert!(!paths.is_public_path("/api/v1/admin/payments"));
        assert!(!paths.is_public_path("/api/v1/leader/events"));
    }

    #[actix_web::test]
    async fn gates_admin_and_leader_routes() {
        let jwt = JwtService::new("middleware-secret");
        let app = actix_test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt.clone()))
                .route("/api/v1/admin/whoami", web::get().to(whoami))
                .route("/api/v1/leader/whoami", web::get().to(whoami))
                .route("/api/v1/public/whoami", web::get().to(whoami)),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/api/v1/public/whoami")
            .to_request();
        let body = actix_test::call_and_read_body(&app, req).await;
        assert_eq!(body, "anonymous");

        let req = actix_test::TestRequest::get()
            .uri("/api/v1/admin/whoami")
            .to_request();
        let err = actix_test::try_call_service(&app, req).await.err().unwrap();
        assert_eq!(
            err.as_response_error().status_code(),
            StatusCode::UNAUTHORIZED
        );

        let req = actix_test::TestRequest::get()
            .uri("/api/v1/admin/whoami")
            .insert_header(("Authorization", bearer(&jwt, 7, UserRole::EventLeader)))
            .to_request();
        let err = actix_test::try_call_service(&app, req).await.err().unwrap();
        assert_eq!(err.as_response_error().status_code(), StatusCode::FORBIDDEN);

        let req = actix_test::TestRequest::get()
            .uri("/api/v1/leader/whoami")
            .insert_header(("Authorization", bearer(&jwt, 7, UserRole::EventLeader)))
            .to_request();
        let body = actix_test::call_and_read_body(&app, req).await;
        assert_eq!(body, "7");

        let req = actix_test::TestRequest::get()
            .uri("/api/v1/leader/whoami")
            .insert_header(("Authorization", bearer(&jwt, 1, UserRole::Admin)))
            .to_request();
        let body = actix_test::call_and_read_body(&app, req).await;
        assert_eq!(body, "1");
    }
}
