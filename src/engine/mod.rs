// Engine orchestration: the batch coordinator and the per-file transports it drives.

pub mod batch;
pub mod progress;
pub mod request;
pub mod transport;
pub mod uid;
