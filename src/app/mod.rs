pub mod export_use_case;
pub mod normalize_use_case;
pub mod ports;
pub mod quality_gate_use_case;
