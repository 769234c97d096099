// Utility modules for the QR service

pub mod password;
pub mod service_error;
pub mod validation;

pub use password::{hash_access_password, verify_access_password, PasswordError};
pub use service_error::{ServiceError, ServiceResult};
pub use validation::{deserialize_some, trim_and_validate_field, trim_optional_field};
