//! # dcert-store: Certificate Persistence
//!
//! - [`CertificateStore`]: the async store contract.
//! - [`InMemoryCertificateStore`]: `parking_lot`-guarded map for tests and
//!   offline use.
//! - [`PgCertificateStore`]: PostgreSQL via SQLx with embedded migrations.
//!
//! Both implementations apply revocation as a single atomic
//! compare-and-set, so concurrent revocations of one certificate produce
//! exactly one winner.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use error::StoreError;
pub use memory::InMemoryCertificateStore;
pub use postgres::{init_pool, PgCertificateStore};
pub use record::CertificateRecord;
pub use store::CertificateStore;
