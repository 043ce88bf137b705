pub mod forward_use_case;
pub mod ports;
