// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};

use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::me,
        handlers::auth::create_usuario,

        // --- Clientes ---
        handlers::clientes::create_cliente,
        handlers::clientes::list_clientes,
        handlers::clientes::get_cliente,
        handlers::clientes::cambiar_status,
        handlers::clientes::update_suscripcion,
        handlers::clientes::recalcular_cliente,
        handlers::clientes::pagos_de_cliente,
        handlers::clientes::importar_clientes,
        handlers::clientes::calcular_vigencia,

        // --- Pagos ---
        handlers::pagos::create_pago,
        handlers::pagos::cancelar_pago,
        handlers::pagos::update_pago,
        handlers::pagos::actualizar_factura,

        // --- Conciliación ---
        handlers::conciliacion::list_transacciones,
        handlers::conciliacion::importar_transacciones,
        handlers::conciliacion::conciliar,
        handlers::conciliacion::preconciliar,
        handlers::conciliacion::eliminar_transaccion,

        // --- Paquetes ---
        handlers::paquetes::list_paquetes,
        handlers::paquetes::create_paquete,
        handlers::paquetes::precio_paquete,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            handlers::auth::LoginPayload,
            handlers::auth::CreateUsuarioPayload,

            // --- Clientes ---
            models::clientes::SuscripcionStatus,
            models::clientes::Cliente,
            models::clientes::Suscripcion,
            models::clientes::ClienteDetalle,
            handlers::clientes::CreateClientePayload,
            handlers::clientes::CambiarStatusPayload,
            handlers::clientes::UpdateSuscripcionPayload,

            // --- Pagos ---
            models::pagos::PagoStatus,
            models::pagos::Pago,
            handlers::pagos::CreatePagoPayload,
            handlers::pagos::UpdatePagoPayload,
            handlers::pagos::FacturaPayload,

            // --- Conciliación ---
            models::conciliacion::TransaccionStatus,
            models::conciliacion::BankTransaction,
            models::conciliacion::TransaccionListado,
            handlers::conciliacion::ConciliarPayload,
            handlers::conciliacion::PreconciliarPayload,

            // --- Paquetes ---
            models::paquetes::PaquetePrecio,
            handlers::paquetes::CreatePaquetePayload,

            // --- Importaciones ---
            services::import_service::ImportResult,

            // --- Vigencia ---
            services::vigencia::StatusPago,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticación"),
        (name = "Clientes", description = "Clientes, suscripciones y vigencias"),
        (name = "Pagos", description = "Historial de pagos"),
        (name = "Conciliación", description = "Conciliación bancaria e importación de estados de cuenta"),
        (name = "Paquetes", description = "Catálogo de precios por país")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
