// src/config.rs

use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{env, str::FromStr, time::Duration};

use rust_decimal::Decimal;

use crate::{
    db::{
        ClienteRepository, ConciliacionRepository, PagoRepository, PaqueteRepository,
        UserRepository,
    },
    services::{
        AuthService, ClienteService, ConciliacionService, ImportService, PagoService,
        SuscripcionService, reporting::TasasConversion,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_secret: String,

    pub auth_service: AuthService,
    pub cliente_service: ClienteService,
    pub suscripcion_service: SuscripcionService,
    pub pago_service: PagoService,
    pub conciliacion_service: ConciliacionService,
    pub import_service: ImportService,

    pub paquete_repo: PaqueteRepository,

    /// Tasas de conversión a MXN para reportes, inyectadas por entorno.
    pub tasas: TasasConversion,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL debe definirse"))?;
        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| anyhow::anyhow!("JWT_SECRET debe definirse"))?;

        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexión con la base de datos establecida");

        let tasas = TasasConversion {
            usd_mxn: tasa_de_env("TASA_USD_MXN", TasasConversion::default().usd_mxn)?,
            cop_mxn: tasa_de_env("TASA_COP_MXN", TasasConversion::default().cop_mxn)?,
        };

        // --- Grafo de dependencias ---
        let user_repo = UserRepository::new(db_pool.clone());
        let cliente_repo = ClienteRepository::new(db_pool.clone());
        let pago_repo = PagoRepository::new(db_pool.clone());
        let paquete_repo = PaqueteRepository::new(db_pool.clone());
        let conciliacion_repo = ConciliacionRepository::new(db_pool.clone());

        let auth_service = AuthService::new(user_repo, jwt_secret.clone());
        let cliente_service = ClienteService::new(cliente_repo.clone(), db_pool.clone());
        let suscripcion_service =
            SuscripcionService::new(cliente_repo.clone(), pago_repo.clone(), db_pool.clone());
        let pago_service = PagoService::new(
            pago_repo.clone(),
            cliente_repo.clone(),
            paquete_repo.clone(),
            suscripcion_service.clone(),
            db_pool.clone(),
        );
        let conciliacion_service = ConciliacionService::new(
            conciliacion_repo.clone(),
            pago_repo.clone(),
            cliente_repo.clone(),
            paquete_repo.clone(),
            suscripcion_service.clone(),
            db_pool.clone(),
        );
        let import_service =
            ImportService::new(cliente_repo, pago_repo, conciliacion_repo, db_pool.clone());

        Ok(Self {
            db_pool,
            jwt_secret,
            auth_service,
            cliente_service,
            suscripcion_service,
            pago_service,
            conciliacion_service,
            import_service,
            paquete_repo,
            tasas,
        })
    }
}

fn tasa_de_env(var: &str, default: Decimal) -> anyhow::Result<Decimal> {
    match env::var(var) {
        Ok(valor) => Decimal::from_str(&valor)
            .map_err(|e| anyhow::anyhow!("{var} inválida ('{valor}'): {e}")),
        Err(_) => Ok(default),
    }
}
