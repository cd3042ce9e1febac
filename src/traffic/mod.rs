//! Traffic provisioning: ingress-egress pairs, traffic matrices, traffic classes and link capacities.
pub mod class;
pub mod error;
pub mod provisioning;

pub use class::{TrafficClass, TrafficClassId};
pub use error::TrafficError;
pub use provisioning::{
    apply_capacities, compute_uniform_traffic_matrix, generate_ie_pairs, generate_ie_pairs_among,
    generate_traffic_classes, generate_traffic_classes_with, provision_links, ClassProfile, IePair,
    TrafficMatrix,
};
