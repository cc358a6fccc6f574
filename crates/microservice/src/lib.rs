//! Composable mock HTTP node for synthetic microservice topologies.
//!
//! Every node reads its request path as a chain of directives:
//!
//! - `/proxy/[scheme://]host[:port]/...` forwards the rest of the path to the next hop
//! - `/fault/<code>[/<percentage>]/...` answers with an injected error, or falls through
//! - `/` answers with a success payload naming the local service
//!
//! Chaining nodes (`/proxy/a:8080/proxy/b:8080/fault/503/20`) builds a topology
//! without any configuration beyond the node's own service name.

pub mod config;
pub mod error;
pub mod proxy;
pub mod routing;
pub mod version;
