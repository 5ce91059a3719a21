pub mod automation;
pub mod deals;
pub mod enquiries;
pub mod properties;
pub mod submissions;
pub mod verify;
pub mod whoami;
