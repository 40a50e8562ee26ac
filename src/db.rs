pub mod cliente_repo;
pub use cliente_repo::ClienteRepository;
pub mod pago_repo;
pub use pago_repo::PagoRepository;
pub mod conciliacion_repo;
pub use conciliacion_repo::ConciliacionRepository;
pub mod paquete_repo;
pub use paquete_repo::PaqueteRepository;
pub mod user_repo;
pub use user_repo::UserRepository;
