pub mod connectivity;
pub mod mirror_store;
pub mod remote_gateway;

pub use connectivity::Connectivity;
pub use mirror_store::MirrorStore;
pub use remote_gateway::RemoteGateway;
