pub mod attendance;
pub mod mutation;
pub mod staff;
