// ============================================================================
// Order Domain
// ============================================================================
//
// - Value objects (OrderStatus, Role, StatusFilter, cart/delivery details)
// - Order record as the order API returns it
// - Projection into date groups and the screen view model
// - Status transition guard and the handler that applies transitions
//
// ============================================================================

pub mod value_objects;
pub mod record;
pub mod events;
pub mod errors;
pub mod projection;
pub mod view;
pub mod transition;
pub mod command_handler;

// Re-export for convenience
pub use value_objects::*;
pub use record::*;
pub use events::*;
pub use errors::*;
pub use projection::*;
pub use view::*;
pub use transition::*;
pub use command_handler::*;
