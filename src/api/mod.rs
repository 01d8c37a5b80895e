// Library entry points for hosts embedding the engine.

pub mod simple;
pub mod upload_api;
