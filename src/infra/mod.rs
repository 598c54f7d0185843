// Infrastructure adapters implementing the application ports

pub mod http_client;
pub mod openrouteservice;
pub mod overpass;
pub mod response_cache;

pub use http_client::ReqwestHttp;
pub use openrouteservice::OrsIsochrones;
pub use overpass::OverpassSource;
pub use response_cache::{CachedIsochrones, CachedPoiSource, ResponseCache};
