//! Service layer: Postgres-backed profile and message services, the Redis
//! profile cache and object storage for images.

pub mod cache;
pub mod messages;
pub mod profiles;
pub mod storage;

pub use cache::RedisCache;
pub use messages::MessageService;
pub use profiles::ProfileService;
pub use storage::{ObjectStorage, SupabaseStorage, UploadFile};
