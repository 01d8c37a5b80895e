// Upload backends: pluggable network layer behind each transport.

pub mod http_uploader;
pub mod traits;
