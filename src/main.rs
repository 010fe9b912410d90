use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local;
use env_logger::{Env, Target};
use std::io::Write;

use church_admin_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::{StripeService, TurnstileService},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let config = Config::from_toml().expect("Failed to load configuration");

    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let jwt_service = JwtService::new(&config.jwt.secret);

    let stripe_service = StripeService::new(config.stripe.clone());
    if !stripe_service.is_enabled() {
        log::warn!("STRIPE_WEBHOOK_SECRET not set; card payment webhooks will be refused");
    }
    let turnstile_service =
        TurnstileService::new(config.turnstile.clone()).expect("Failed to build Turnstile client");

    let capacity_policy = config.registration.capacity_policy;
    log::info!("Capacity policy: {capacity_policy:?}");

    let audit_service = AuditService::new(pool.clone());
    let event_service = EventService::new(pool.clone(), capacity_policy, audit_service.clone());
    let member_service = MemberService::new(pool.clone(), audit_service.clone());
    let leader_service = EventLeaderService::new(pool.clone(), audit_service.clone());
    let registration_service =
        RegistrationService::new(pool.clone(), capacity_policy, audit_service.clone());
    let payment_service = PaymentService::new(pool.clone(), audit_service.clone());

    tasks::spawn_all(&config.registration, payment_service.clone());

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .wrap(create_cors())
            .wrap(Logger::default())
            .app_data(web::Data::new(event_service.clone()))
            .app_data(web::Data::new(member_service.clone()))
            .app_data(web::Data::new(leader_service.clone()))
            .app_data(web::Data::new(registration_service.clone()))
            .app_data(web::Data::new(payment_service.clone()))
            .app_data(web::Data::new(stripe_service.clone()))
            .app_data(web::Data::new(turnstile_service.clone()))
            .configure(swagger_config)
            .configure(handlers::webhook_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::public_config)
                    .configure(handlers::admin_config)
                    .configure(handlers::leader_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
