pub mod files;
pub mod json_extract;
pub mod password;
