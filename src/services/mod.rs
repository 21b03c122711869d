pub mod analysis;
pub mod gemini;
pub mod pdf;
pub mod poller;
pub mod scratch;
