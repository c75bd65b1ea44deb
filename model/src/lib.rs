#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Descriptor types consumed by `netpol-core`: pods, namespaces, policies and
//! the label-selector grammar they're built from. This crate does no YAML
//! decoding, no filesystem walking and no cluster-API calls; it only
//! defines the shapes the core's builder accepts.

pub mod labels;
pub mod peer;
pub mod policy;
pub mod selector;
pub mod workload;

pub use labels::Labels;
pub use peer::{IpBlock, Peer, PeerRule};
pub use policy::{PolicyDescriptor, PolicyType};
pub use selector::{Expression, Operator, Selector};
pub use workload::{NamespaceDescriptor, PodDescriptor};
