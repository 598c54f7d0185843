// Application layer: use cases orchestrating the ports

pub mod nearby_business_use_case;
pub mod ports;
pub mod service_area_use_case;

pub use nearby_business_use_case::NearbyBusinessUseCase;
pub use service_area_use_case::{BatchFailure, BatchPolicy, ServiceAreaReport, ServiceAreaUseCase};
