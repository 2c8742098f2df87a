pub mod http;
pub mod narration;
