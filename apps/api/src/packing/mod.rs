// Pack calculation: the optimizer itself, the pack size store it is fed from,
// and the HTTP handlers that tie the two together.
// The optimizer is pure — handlers read a store snapshot and pass it in.

pub mod handlers;
pub mod optimizer;
pub mod store;
