pub mod direct_upload;
pub mod file_delete;
pub mod file_serve;
pub mod health;
pub mod upload_url;
