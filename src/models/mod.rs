pub mod analytics;
pub mod content;
pub mod folder;
pub mod qr_code;
pub mod scan;
pub mod user;

// Re-export common types
pub use analytics::*;
pub use content::QrContent;
pub use folder::{CreateFolderRequest, Folder, FolderResponse, NewFolder, UpdateFolderRequest};
pub use qr_code::{
    BulkAction, BulkActionRequest, BulkActionResponse, CreateQrCodeRequest, ListQrCodesParams,
    NewQrCode, QrCode, QrCodeListResponse, QrCodeResponse, UpdateQrCode, UpdateQrCodeRequest,
};
pub use scan::{NewScan, Scan};
pub use user::{SubscriptionSnapshot, SubscriptionStatus, User, UserRole};
