pub mod diesel_pool;
pub mod redirect_store;

pub use diesel_pool::{
    check_diesel_health, create_diesel_pool, mask_connection_string, DieselDatabaseConfig,
    DieselPool, PoolInitError, MIGRATIONS,
};
pub use redirect_store::{DieselRedirectStore, RedirectStore, RedirectTarget, StoreError};
