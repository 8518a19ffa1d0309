pub mod logging;
pub mod response;
pub mod session_store;
