pub mod auth;
pub mod cliente_service;
pub mod conciliacion_service;
pub mod import_service;
pub mod pago_service;
pub mod reporting;
pub mod suscripcion_service;
pub mod vigencia;

pub use auth::AuthService;
pub use cliente_service::ClienteService;
pub use conciliacion_service::ConciliacionService;
pub use import_service::ImportService;
pub use pago_service::PagoService;
pub use suscripcion_service::SuscripcionService;
