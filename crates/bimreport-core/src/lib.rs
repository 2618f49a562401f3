pub mod coerce;
pub mod error;
pub mod layout;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod params;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod settings;
pub mod upload;
pub mod workflow;
