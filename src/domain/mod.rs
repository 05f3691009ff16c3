// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Pure order logic. The only I/O reachable from here is the
// `OrderStatusUpdater` the command handler is given.
//
// ============================================================================

pub mod order;
