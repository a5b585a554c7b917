//! Domain models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod attachment;
pub mod name;
pub mod nfc;
pub mod pagination;
pub mod status;
pub mod validation;

pub use attachment::{Attachment, AttachmentKind};
pub use name::{Category, Name};
pub use nfc::NfcTag;
pub use pagination::{Paginated, Pagination, PaginationMeta, PaginationParams};
pub use status::{Condition, StockStatus};
pub use validation::ValidationError;
