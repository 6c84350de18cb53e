//! Service modules for the registration pipeline
//!
//! - **enrichment** - builds the IP and display documents and the integration plan
//! - **storage_uploader** - content-addressed storage contract and HTTP client
//! - **ledger_registrar** - ledger registration contract and HTTP client

pub mod enrichment;
pub mod ledger_registrar;
pub mod storage_uploader;

pub use enrichment::{
    build_display_document, build_integration_document, build_ip_document, RegistrationDocuments,
};
pub use ledger_registrar::{
    to_ledger_hash, GatewayRegistrar, LedgerRegistrar, RegistrationError, RegistrationReceipt,
    RegistrationRequest,
};
pub use storage_uploader::{
    content_hash, PinningServiceUploader, StorageUploader, StoredContent, UploadError, UploadTarget,
};
