//! Machine translation gateway for page-i18n
//!
//! Providers implement [`MachineTranslator`]; the [`Gateway`] chains a
//! primary and a secondary provider, chunks large inputs and never fails:
//! strings nobody could translate come back unchanged.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use page_i18n_mt::{Gateway, GatewayConfig, HttpBatchProvider, MyMemoryProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = Gateway::new(
//!         Arc::new(HttpBatchProvider::new("http://localhost:8080/translate")?),
//!         GatewayConfig::default(),
//!     )
//!     .with_secondary(Arc::new(MyMemoryProvider::new()?));
//!
//!     let texts = vec!["Acasă".to_string(), "Contact".to_string()];
//!     let translated = gateway.translate_batch(&texts, "en").await;
//!     println!("{:?}", translated);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod gateway;
pub mod google_translate;
pub mod http_batch;
pub mod mock;
pub mod mymemory;
pub mod translator;

pub use error::{MtError, MtResult};
pub use gateway::{Gateway, GatewayConfig, GatewayItem, ItemStatus};
pub use google_translate::GoogleTranslateProvider;
pub use http_batch::HttpBatchProvider;
pub use mock::{MockCall, MockMode, MockTranslator};
pub use mymemory::MyMemoryProvider;
pub use translator::{MachineTranslator, normalize_locale, validate_locale};
