pub mod auth;
pub mod clientes;
pub mod conciliacion;
pub mod pagos;
pub mod paquetes;
