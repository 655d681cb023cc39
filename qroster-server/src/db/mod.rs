//! Record store access for qroster-server

pub mod records;
