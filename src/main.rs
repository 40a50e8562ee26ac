// src/main.rs

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::middleware::auth::auth_middleware;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).compact().init();

    // Si la configuración falla, la aplicación no debe arrancar.
    let app_state = AppState::new()
        .await
        .expect("Falló la inicialización del estado de la aplicación");

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falló la ejecución de las migraciones");

    tracing::info!("✅ Migraciones ejecutadas");

    // Alta del primer superadmin en una instalación nueva.
    if let (Ok(username), Ok(password)) =
        (std::env::var("ADMIN_USERNAME"), std::env::var("ADMIN_PASSWORD"))
    {
        app_state
            .auth_service
            .bootstrap_admin(&username, &password)
            .await
            .expect("Falló la creación del usuario inicial");
    }

    // Todo lo que no sea login pasa por el middleware de autenticación;
    // los roles se verifican con extractores en cada handler.
    let protegidas = Router::new()
        .route("/auth/me", get(handlers::auth::me))
        .route("/usuarios", post(handlers::auth::create_usuario))
        .route(
            "/clientes",
            post(handlers::clientes::create_cliente).get(handlers::clientes::list_clientes),
        )
        .route("/clientes/importar", post(handlers::clientes::importar_clientes))
        .route("/clientes/{id}", get(handlers::clientes::get_cliente))
        .route("/clientes/{id}/status", post(handlers::clientes::cambiar_status))
        .route("/clientes/{id}/suscripcion", put(handlers::clientes::update_suscripcion))
        .route("/clientes/{id}/recalcular", post(handlers::clientes::recalcular_cliente))
        .route("/clientes/{id}/pagos", get(handlers::clientes::pagos_de_cliente))
        .route("/vigencia/calcular", get(handlers::clientes::calcular_vigencia))
        .route("/pagos", post(handlers::pagos::create_pago))
        .route("/pagos/{id}", put(handlers::pagos::update_pago))
        .route("/pagos/{id}/cancelar", post(handlers::pagos::cancelar_pago))
        .route("/pagos/{id}/factura", post(handlers::pagos::actualizar_factura))
        .route(
            "/conciliacion/transacciones",
            get(handlers::conciliacion::list_transacciones),
        )
        .route(
            "/conciliacion/importar",
            post(handlers::conciliacion::importar_transacciones),
        )
        .route("/conciliacion/{id}/conciliar", post(handlers::conciliacion::conciliar))
        .route(
            "/conciliacion/{id}/preconciliar",
            post(handlers::conciliacion::preconciliar),
        )
        .route("/conciliacion/{id}", delete(handlers::conciliacion::eliminar_transaccion))
        .route(
            "/paquetes",
            post(handlers::paquetes::create_paquete).get(handlers::paquetes::list_paquetes),
        )
        .route("/paquetes/precio", get(handlers::paquetes::precio_paquete))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_middleware));

    let api = Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .merge(protegidas);

    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api", api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .with_state(app_state);

    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr).await.expect("Falló el listener TCP");
    tracing::info!("🚀 Servidor escuchando en {}", addr);
    axum::serve(listener, app).await.expect("Error en el servidor Axum");
}
