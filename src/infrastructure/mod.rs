pub mod connectivity;
pub mod mirror;

pub use connectivity::HostConnectivity;
pub use mirror::SqliteMirrorStore;
