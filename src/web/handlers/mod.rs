pub mod job_handlers;
pub mod recommendation_handlers;
pub mod route_handlers;
pub mod system_handlers;

pub use job_handlers::*;
pub use recommendation_handlers::*;
pub use route_handlers::*;
pub use system_handlers::*;
